//! Fixed, versioned field table.
//!
//! Single source of truth for every publishable telemetry key: its
//! Loxone display label, value kind and analog range/unit pattern. The
//! publish router filters selections against it and the XML artifact
//! generator iterates it in table order, which is what makes the
//! generated artifacts deterministic.

/// Bumped whenever the table contents change; exported artifacts are
/// only byte-stable within one version.
pub const FIELD_TABLE_VERSION: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Numeric value; carries range and a Loxone unit pattern.
    Analog,
    /// Boolean flag.
    Digital,
    /// Free-form string metadata.
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    /// Loxone unit pattern, e.g. `<v.1> °C`. Empty for non-analog.
    pub unit: &'static str,
    pub min: f64,
    pub max: f64,
}

const fn analog(
    key: &'static str,
    label: &'static str,
    unit: &'static str,
    min: f64,
    max: f64,
) -> FieldSpec {
    FieldSpec {
        key,
        label,
        kind: FieldKind::Analog,
        unit,
        min,
        max,
    }
}

const fn digital(key: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec {
        key,
        label,
        kind: FieldKind::Digital,
        unit: "",
        min: 0.0,
        max: 1.0,
    }
}

const fn text(key: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec {
        key,
        label,
        kind: FieldKind::Text,
        unit: "",
        min: 0.0,
        max: 0.0,
    }
}

/// All publishable fields, in artifact order. Labels are the German
/// Loxone captions the original integration established.
pub const FIELD_TABLE: &[FieldSpec] = &[
    text("timestamp", "Zeitstempel"),
    text("device", "Gerät"),
    digital("is_online", "Online"),
    analog("outdoor_temp", "Außentemperatur", "<v.1> °C", -20.0, 60.0),
    analog("supply_temp", "Zulufttemperatur", "<v.1> °C", -20.0, 60.0),
    analog("extract_temp", "Ablufttemperatur", "<v.1> °C", -20.0, 60.0),
    analog("exhaust_temp", "Fortlufttemperatur", "<v.1> °C", -20.0, 60.0),
    analog(
        "temp_virt_sup_exit",
        "Virtuelle Zuluftaustritt",
        "<v.1> °C",
        -20.0,
        60.0,
    ),
    analog("outdoor_humidity", "Außenfeuchte", "<v> %", 0.0, 100.0),
    analog("extract_humidity", "Abluftfeuchte", "<v> %", 0.0, 100.0),
    analog(
        "outdoor_humidity_abs",
        "Absolute Außenfeuchte",
        "<v.2> g/m³",
        0.0,
        30.0,
    ),
    analog(
        "extract_humidity_abs",
        "Absolute Abluftfeuchte",
        "<v.2> g/m³",
        0.0,
        30.0,
    ),
    analog("co2", "CO2", "<v> ppm", 0.0, 5000.0),
    analog("co2_indicator", "CO2 Indikator", "<v>", 1.0, 4.0),
    analog("pressure", "Luftdruck", "<v> hPa", 900.0, 1050.0),
    analog("air_density", "Luftdichte", "<v.3> kg/m³", 0.8, 1.3),
    analog("comfort_level", "Komfortstufe", "<v>", 1.0, 5.0),
    analog("operating_mode", "Betriebsmodus", "<v>", 0.0, 8.0),
    analog("hum_red_mode", "Entfeuchtungsstufe", "<v>", 0.0, 3.0),
    analog("supply_fan_rpm", "Zuluftlüfter RPM", "<v> rpm", 0.0, 3000.0),
    analog("extract_fan_rpm", "Abluftlüfter RPM", "<v> rpm", 0.0, 3000.0),
    analog(
        "air_flow_ave",
        "Luftdurchsatz Durchschnitt",
        "<v> m³/h",
        0.0,
        500.0,
    ),
    analog("air_flow", "Luftdurchsatz", "<v> m³/h", 0.0, 500.0),
    analog("fan_speed", "Lüfterstufe", "<v>", 0.0, 8.0),
    analog(
        "supply_filter_ful",
        "Außenluftfilter Verschmutzung",
        "<v>",
        0.0,
        1.0,
    ),
    analog(
        "extract_filter_ful",
        "Fortluftfilter Verschmutzung",
        "<v>",
        0.0,
        1.0,
    ),
    analog(
        "outdoor_filter_indicator",
        "Außenluftfilter Ampel",
        "<v>",
        1.0,
        4.0,
    ),
    analog(
        "exhaust_filter_indicator",
        "Fortluftfilter Ampel",
        "<v>",
        1.0,
        4.0,
    ),
    analog(
        "extract_humidity_indicator",
        "Feuchte Indikator",
        "<v>",
        1.0,
        4.0,
    ),
    analog("supply_vent_pos", "Zuluft Position", "<v> %", 0.0, 100.0),
    analog("extract_vent_pos", "Abluft Position", "<v> %", 0.0, 100.0),
    analog("bypass_vent_pos", "Bypass Position", "<v> %", 0.0, 100.0),
    analog("heat_recovery", "Wärmerückgewinnung", "<v> %", 0.0, 100.0),
    analog("power_recovery", "Kraftrückgewinnung", "<v> %", 0.0, 100.0),
    analog("filter_hours", "Filterstunden", "<v>", 0.0, 10000.0),
    analog("operating_hours", "Betriebsstunden", "<v>", 0.0, 100000.0),
    analog("rssi", "WLAN Signalstärke", "<v> dBm", -100.0, 0.0),
    analog("error_state", "Fehlerstatus", "<v>", 0.0, 255.0),
    digital("has_errors", "Fehler vorhanden"),
    digital("deicing", "Enteisungsmodus"),
    analog("board_version", "Board Version", "<v>", 0.0, 255.0),
];

pub fn field_spec(key: &str) -> Option<&'static FieldSpec> {
    FIELD_TABLE.iter().find(|spec| spec.key == key)
}

pub fn is_known_field(key: &str) -> bool {
    field_spec(key).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_finds_known_keys() {
        let spec = field_spec("co2").unwrap();
        assert_eq!(spec.label, "CO2");
        assert_eq!(spec.kind, FieldKind::Analog);
        assert_eq!(spec.unit, "<v> ppm");

        assert!(is_known_field("supply_temp"));
        assert!(!is_known_field("wifi_rssi"));
    }

    #[test]
    fn keys_are_unique() {
        for (i, spec) in FIELD_TABLE.iter().enumerate() {
            assert!(
                !FIELD_TABLE[i + 1..].iter().any(|other| other.key == spec.key),
                "duplicate field key {}",
                spec.key
            );
        }
    }

    #[test]
    fn table_covers_decoded_frame_keys() {
        let map = crate::frame::decode(&[0u8; 48]).unwrap();
        for (key, _) in map.iter() {
            assert!(is_known_field(key), "decoded key {key} missing from table");
        }
    }
}
