use std::fmt;

use freelox_protocol::{FIELD_TABLE, FieldKind};
use serde::Deserialize;

use crate::errors::ArtifactError;
use crate::models::{ControllerEndpoint, Device};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Virtual UDP inputs: the telemetry fields the controller parses
    /// out of published datagrams.
    Inputs,
    /// Virtual outputs: command requests the controller posts back to
    /// the bridge.
    Outputs,
}

impl ArtifactKind {
    pub fn parse(raw: &str) -> Result<Self, ArtifactError> {
        match raw {
            "inputs" => Ok(Self::Inputs),
            "outputs" => Ok(Self::Outputs),
            other => Err(ArtifactError::UnknownKind(other.to_string())),
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Inputs => write!(f, "inputs"),
            ArtifactKind::Outputs => write!(f, "outputs"),
        }
    }
}

/// Builds the controller's import XML for a device/endpoint pair.
///
/// Output is fully determined by its inputs: fields render in the
/// fixed field-table order regardless of selection order, so identical
/// requests yield byte-identical documents. Selection keys with no
/// field-table entry are silently omitted, matching the publish side.
pub fn generate(
    device: &Device,
    endpoint: &ControllerEndpoint,
    bridge_host: &str,
    bridge_port: u16,
    selection: &[String],
    kind: ArtifactKind,
) -> String {
    match kind {
        ArtifactKind::Inputs => generate_inputs(device, endpoint, bridge_host, selection),
        ArtifactKind::Outputs => generate_outputs(device, endpoint, bridge_host, bridge_port),
    }
}

fn generate_inputs(
    device: &Device,
    endpoint: &ControllerEndpoint,
    bridge_host: &str,
    selection: &[String],
) -> String {
    let mut lines = vec![r#"<?xml version="1.0" encoding="utf-8"?>"#.to_string()];
    lines.push(format!(
        r#"<VirtualInUdp Title="FreeLox-{}" Address="{}" Port="{}">"#,
        xml_escape(&device.name),
        xml_escape(bridge_host),
        endpoint.port
    ));

    // Table order, not selection order, keeps the document stable.
    for spec in FIELD_TABLE {
        if !selection.iter().any(|key| key == spec.key) {
            continue;
        }

        // Datagrams are compact JSON; the check pattern anchors on the
        // device name, then the bare `"key":` pair.
        let check = format!(
            r#"&quot;device&quot;:&quot;{}&quot;\i&quot;{}&quot;:\i\v"#,
            xml_escape(&device.name),
            spec.key
        );

        let line = match spec.kind {
            FieldKind::Analog => format!(
                "\t<VirtualInUdpCmd Title=\"{}\" Check=\"{}\" \
                 Signed=\"false\" Analog=\"true\" SourceValLow=\"0\" DestValLow=\"0\" \
                 SourceValHigh=\"0\" DestValHigh=\"0\" DefVal=\"0\" \
                 MinVal=\"{}\" MaxVal=\"{}\" Unit=\"{}\" HintText=\"\"/>",
                xml_escape(spec.label),
                check,
                fmt_num(spec.min),
                fmt_num(spec.max),
                xml_escape(spec.unit)
            ),
            FieldKind::Digital | FieldKind::Text => format!(
                "\t<VirtualInUdpCmd Title=\"{}\" Check=\"{}\" Analog=\"false\" HintText=\"\"/>",
                xml_escape(spec.label),
                check
            ),
        };
        lines.push(line);
    }

    lines.push("</VirtualInUdp>".to_string());
    lines.join("\n")
}

fn generate_outputs(
    device: &Device,
    endpoint: &ControllerEndpoint,
    bridge_host: &str,
    bridge_port: u16,
) -> String {
    let address = format!("http://{bridge_host}:{bridge_port}");
    let api_path = "/api/command";

    // HTTP headers need CRLF separators.
    let header = format!(
        "Authorization: Bearer {}\r\nContent-Type: application/json",
        endpoint.api_key
    );

    // `<v>` stays unquoted so the controller substitutes a bare number.
    let comfort_post = xml_escape(&format!(
        r#"{{"serial": "{}", "comfortLevel": <v>}}"#,
        device.serial_no
    ));
    let mode_post = xml_escape(&format!(
        r#"{{"serial": "{}", "operatingMode": <v>}}"#,
        device.serial_no
    ));

    let lines = vec![
        r#"<?xml version="1.0" encoding="utf-8"?>"#.to_string(),
        format!(
            r#"<VirtualOut Title="FreeLox-{}" Address="{}" CmdInit="" HintText="" CloseAfterSend="true" CmdSep="">"#,
            xml_escape(&device.name),
            xml_escape(&address)
        ),
        "\t<Info templateType=\"3\" minVersion=\"16011106\"/>".to_string(),
        format!(
            "\t<VirtualOutCmd Title=\"Komfortstufe (1-5)\" Comment=\"Comfort Level\" \
             CmdOnMethod=\"POST\" CmdOn=\"{api_path}\" CmdOnHTTP=\"{}\" CmdOnPost=\"{}\" \
             Analog=\"true\" Repeat=\"0\" RepeatRate=\"0\" HintText=\"Komfort Level 1-5\"/>",
            xml_escape(&header),
            comfort_post
        ),
        format!(
            "\t<VirtualOutCmd Title=\"Betriebsmodus\" Comment=\"Operating Mode\" \
             CmdOnMethod=\"POST\" CmdOn=\"{api_path}\" CmdOnHTTP=\"{}\" CmdOnPost=\"{}\" \
             Analog=\"true\" Repeat=\"0\" RepeatRate=\"0\" HintText=\"Operating Mode\"/>",
            xml_escape(&header),
            mode_post
        ),
        "</VirtualOut>".to_string(),
    ];

    lines.join("\n")
}

fn xml_escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// `-20.0` renders as `-20`, `0.8` stays `0.8`.
fn fmt_num(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn fixture() -> (Device, ControllerEndpoint) {
        let endpoint = ControllerEndpoint {
            id: Uuid::nil(),
            name: "Miniserver".to_string(),
            ip: "192.168.1.10".to_string(),
            port: 5555,
            api_key: "abc123".to_string(),
            enabled: true,
        };
        let device = Device {
            id: "wohnzimmer".to_string(),
            name: "Wohnzimmer".to_string(),
            serial_no: "35076".to_string(),
            credential: "pass".to_string(),
            enabled: true,
            selected_fields: vec!["co2".to_string(), "supply_temp".to_string()],
            assigned_endpoints: vec![endpoint.id],
        };
        (device, endpoint)
    }

    #[test]
    fn identical_inputs_yield_byte_identical_xml() {
        let (device, endpoint) = fixture();
        let selection = vec!["co2".to_string(), "supply_temp".to_string()];

        let a = generate(
            &device,
            &endpoint,
            "192.168.1.5",
            3000,
            &selection,
            ArtifactKind::Inputs,
        );
        let b = generate(
            &device,
            &endpoint,
            "192.168.1.5",
            3000,
            &selection,
            ArtifactKind::Inputs,
        );

        assert_eq!(a, b);
    }

    #[test]
    fn selection_order_does_not_change_output() {
        let (device, endpoint) = fixture();

        let forward = vec!["co2".to_string(), "supply_temp".to_string()];
        let reversed = vec!["supply_temp".to_string(), "co2".to_string()];

        let a = generate(
            &device,
            &endpoint,
            "192.168.1.5",
            3000,
            &forward,
            ArtifactKind::Inputs,
        );
        let b = generate(
            &device,
            &endpoint,
            "192.168.1.5",
            3000,
            &reversed,
            ArtifactKind::Inputs,
        );

        assert_eq!(a, b);
        // Table order puts supply_temp before co2.
        let supply = a.find("Zulufttemperatur").unwrap();
        let co2 = a.find("Title=\"CO2\"").unwrap();
        assert!(supply < co2);
    }

    #[test]
    fn inputs_document_carries_check_patterns_and_units() {
        let (device, endpoint) = fixture();
        let selection = vec!["co2".to_string()];

        let xml = generate(
            &device,
            &endpoint,
            "192.168.1.5",
            3000,
            &selection,
            ArtifactKind::Inputs,
        );

        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="utf-8"?>"#));
        assert!(xml.contains(r#"<VirtualInUdp Title="FreeLox-Wohnzimmer" Address="192.168.1.5" Port="5555">"#));
        assert!(xml.contains(
            r#"Check="&quot;device&quot;:&quot;Wohnzimmer&quot;\i&quot;co2&quot;:\i\v""#
        ));
        assert!(xml.contains(r#"Unit="&lt;v&gt; ppm""#));
        assert!(xml.contains(r#"MinVal="0" MaxVal="5000""#));
        assert!(xml.ends_with("</VirtualInUdp>"));
    }

    #[test]
    fn empty_selection_yields_minimal_document() {
        let (device, endpoint) = fixture();

        let xml = generate(
            &device,
            &endpoint,
            "192.168.1.5",
            3000,
            &[],
            ArtifactKind::Inputs,
        );

        assert_eq!(xml.lines().count(), 3);
        assert!(!xml.contains("VirtualInUdpCmd"));
    }

    #[test]
    fn unknown_selection_keys_are_omitted() {
        let (device, endpoint) = fixture();
        let selection = vec!["co2".to_string(), "wifi_rssi".to_string()];

        let xml = generate(
            &device,
            &endpoint,
            "192.168.1.5",
            3000,
            &selection,
            ArtifactKind::Inputs,
        );

        assert!(xml.contains(r#"Title="CO2""#));
        assert!(!xml.contains("wifi_rssi"));
        assert_eq!(xml.matches("VirtualInUdpCmd").count(), 1);
    }

    #[test]
    fn outputs_document_posts_to_the_command_api() {
        let (device, endpoint) = fixture();

        let xml = generate(
            &device,
            &endpoint,
            "192.168.1.5",
            3000,
            &[],
            ArtifactKind::Outputs,
        );

        assert!(xml.contains(r#"Address="http://192.168.1.5:3000""#));
        assert!(xml.contains("Authorization: Bearer abc123"));
        assert!(xml.contains(
            r#"CmdOnPost="{&quot;serial&quot;: &quot;35076&quot;, &quot;comfortLevel&quot;: &lt;v&gt;}""#
        ));
        assert!(xml.contains("&quot;operatingMode&quot;: &lt;v&gt;"));
        assert!(xml.contains(r#"CmdOn="/api/command""#));
    }

    #[test]
    fn kind_parses_from_query_strings() {
        assert_eq!(ArtifactKind::parse("inputs").unwrap(), ArtifactKind::Inputs);
        assert_eq!(
            ArtifactKind::parse("outputs").unwrap(),
            ArtifactKind::Outputs
        );
        assert!(matches!(
            ArtifactKind::parse("csv"),
            Err(ArtifactError::UnknownKind(_))
        ));
    }
}
