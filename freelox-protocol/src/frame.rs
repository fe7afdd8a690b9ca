//! Decoder for the 48-byte telemetry frame.
//!
//! The frame layout is an external contract with the appliance firmware
//! (recovered by the ioBroker.freeair project): bytes 0..=22 and 47 are
//! direct values, bytes 23..=40 are bit-packed. Decoding is pure; the
//! only whole-decode failure is a structurally short frame. Individual
//! derived fields whose inputs are unavailable are left out of the
//! resulting map instead of failing the decode.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::bits::{low_plus_high, low_plus_high_super, pressure, seg, to_signed};

/// Minimum frame length in bytes.
pub const FRAME_LEN: usize = 48;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("frame too short: {len} bytes, expected at least {FRAME_LEN}")]
    TooShort { len: usize },
}

/// A decoded sensor value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// Sparse map of decoded telemetry fields, keyed by field-table name.
///
/// Backed by a `BTreeMap` so that iteration order, and therefore every
/// serialization of the map, is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMap(pub BTreeMap<String, FieldValue>);

impl FieldMap {
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.0.get(key)
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        match self.0.get(key) {
            Some(FieldValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn float(&self, key: &str) -> Option<f64> {
        match self.0.get(key) {
            Some(FieldValue::Float(v)) => Some(*v),
            Some(FieldValue::Int(v)) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn comfort_level(&self) -> Option<i64> {
        self.int("comfort_level")
    }

    pub fn operating_mode(&self) -> Option<i64> {
        self.int("operating_mode")
    }

    pub fn rssi(&self) -> Option<i64> {
        self.int("rssi")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn put_int(&mut self, key: &str, value: i64) {
        self.0.insert(key.to_owned(), FieldValue::Int(value));
    }

    fn put_float(&mut self, key: &str, value: f64) {
        self.0.insert(key.to_owned(), FieldValue::Float(value));
    }

    fn put_bool(&mut self, key: &str, value: bool) {
        self.0.insert(key.to_owned(), FieldValue::Bool(value));
    }

    fn put_opt_int(&mut self, key: &str, value: Option<i64>) {
        if let Some(value) = value {
            self.put_int(key, value);
        }
    }
}

/// Fan RPM calibration per speed step `[speed %, nominal, maximum]`,
/// used to infer filter pollution from measured RPM.
const FAN_SUPPLY_RPMS: [[f64; 3]; 9] = [
    [20.0, 870.0, 1510.0],
    [30.0, 1000.0, 1640.0],
    [40.0, 1230.0, 1870.0],
    [50.0, 1460.0, 2100.0],
    [60.0, 1690.0, 2410.0],
    [70.0, 1910.0, 2630.0],
    [85.0, 2230.0, 2950.0],
    [100.0, 2540.0, 3260.0],
    [0.0, 0.0, 0.0],
];

const FAN_EXTRACT_RPMS: [[f64; 3]; 9] = [
    [20.0, 920.0, 1560.0],
    [30.0, 1040.0, 1680.0],
    [40.0, 1260.0, 1900.0],
    [50.0, 1480.0, 2200.0],
    [60.0, 1700.0, 2420.0],
    [70.0, 1910.0, 2710.0],
    [85.0, 2210.0, 2930.0],
    [100.0, 2480.0, 3200.0],
    [0.0, 0.0, 0.0],
];

/// 11-bit signed temperature in 1/8 °C steps.
fn temperature(low: u8, high: u8) -> f64 {
    to_signed(low_plus_high(low, high), 11) as f64 / 8.0
}

/// Absolute humidity in g/m³ from relative humidity and temperature
/// (Magnus formula), rounded to 2 decimals.
fn absolute_humidity(rel_hum: f64, temp: f64) -> f64 {
    let vapor_pressure = (rel_hum / 100.0) * 6.1078 * 10f64.powf((7.45 * temp) / (235.0 + temp));
    let abs_hum = (216.7 * vapor_pressure) / (273.15 + temp);
    (abs_hum * 100.0).round() / 100.0
}

/// Air density in kg/m³, rounded to 3 decimals.
fn air_density(pressure_hpa: f64, temp_extract: f64) -> f64 {
    let density = (pressure_hpa * 100.0) / ((temp_extract + 273.15) * 287.058);
    (density * 1000.0).round() / 1000.0
}

/// Traffic-light level (1..=4) for the extract humidity.
fn humidity_indicator(rel_hum: f64) -> i64 {
    match rel_hum {
        h if (30.0..=60.0).contains(&h) => 1,
        h if (20.0..=70.0).contains(&h) => 2,
        h if (10.0..=85.0).contains(&h) => 3,
        _ => 4,
    }
}

/// Traffic-light level (1..=4) for the CO₂ concentration.
fn co2_indicator(co2: f64) -> i64 {
    match co2 {
        c if c <= 1000.0 => 1,
        c if c <= 1700.0 => 2,
        c if c <= 2500.0 => 3,
        _ => 4,
    }
}

/// Filter pollution indicator from measured fan RPM against the
/// calibration table for the configured speed: 1..=4, or 100 for a
/// clogged filter. `None` when the speed has no calibration row.
fn filter_indicator(fan_rpm: u32, fan_speed: u8, table: &[[f64; 3]; 9]) -> Option<i64> {
    let speed = f64::from(fan_speed) * 10.0;
    let rpm = f64::from(fan_rpm);
    for row in table {
        if row[0] < speed {
            continue;
        }
        let diff = row[2] - row[1];
        if rpm < row[1] - diff / 2.0 {
            return Some(100);
        }
        if rpm < row[1] + diff * 0.4 {
            return Some(1);
        }
        if rpm < row[1] + diff * 0.7 {
            return Some(2);
        }
        if rpm < row[1] + diff * 0.95 {
            return Some(3);
        }
        return Some(4);
    }
    None
}

/// Heat recovery efficiency in percent.
fn heat_recovery(temp_extract: f64, temp_outdoor: f64, temp_supply: f64, air_flow: i64) -> i64 {
    if air_flow <= 0 {
        return 0;
    }
    let temp_diff = temp_extract - temp_outdoor;
    if temp_diff <= 0.0 {
        return 0;
    }
    ((temp_supply - temp_outdoor) / temp_diff * 100.0) as i64
}

/// Decodes a decrypted telemetry frame into a sparse field map.
pub fn decode(data: &[u8]) -> Result<FieldMap, DecodeError> {
    if data.len() < FRAME_LEN {
        return Err(DecodeError::TooShort { len: data.len() });
    }

    let outdoor_humidity = f64::from(data[0]);
    let extract_humidity = f64::from(data[1]);

    let supply_temp = temperature(data[2], seg(data[29], 0, 4));
    let outdoor_temp = temperature(data[3], seg(data[32], 0, 4));
    let exhaust_temp = temperature(data[4], seg(data[31], 0, 4));
    let extract_temp = temperature(data[5], seg(data[30], 0, 4));
    let temp_virt_sup_exit = temperature(data[6], seg(data[33], 0, 4));

    let co2 = i64::from(low_plus_high(data[13], seg(data[36], 5, 1))) * 16;
    let pressure_hpa = i64::from(pressure(seg(data[39], 0, 5), seg(data[34], 0, 4)));

    let comfort_level = i64::from(seg(data[29], 4, 3)) + 1;
    let operating_mode = i64::from(seg(data[30], 4, 3));

    let supply_fan_rpm = low_plus_high(data[9], seg(data[37], 0, 5));
    let extract_fan_rpm = low_plus_high(data[7], seg(data[36], 0, 5));
    let fan_speed = seg(data[38], 0, 4);
    let air_flow_ave = i64::from(seg(data[35], 0, 5));
    let air_flow = if fan_speed > 2 {
        i64::from(fan_speed) * 10
    } else {
        air_flow_ave
    };

    let supply_vent_pos = i64::from(seg(data[25], 0, 5));
    let extract_vent_pos = i64::from(seg(data[26], 0, 5));
    let bypass_vent_pos = i64::from(seg(data[28], 0, 5));
    let supply_filter_ful = i64::from(seg(data[34], 5, 1));
    let extract_filter_ful = i64::from(seg(data[34], 6, 1));
    let hum_red_mode = i64::from(seg(data[37], 5, 1));

    let operating_hours =
        i64::from(low_plus_high_super(data[14], data[15], seg(data[40], 0, 4)));
    let filter_hours = i64::from(low_plus_high_super(data[16], data[17], seg(data[40], 4, 2)));

    let error_state = i64::from(seg(data[24], 0, 5));
    let exhaust_defrost = seg(data[24], 5, 2);
    let deicing = seg(data[23], 6, 1) == 1 || exhaust_defrost == 1 || exhaust_defrost == 2;
    let has_errors = error_state != 0 && error_state != 22;

    let recovery = heat_recovery(extract_temp, outdoor_temp, supply_temp, air_flow);
    let power_recovery = if recovery == 0 {
        0
    } else {
        (recovery as f64 * 0.85) as i64
    };

    let mut map = FieldMap::default();
    map.put_float("outdoor_temp", outdoor_temp);
    map.put_float("supply_temp", supply_temp);
    map.put_float("extract_temp", extract_temp);
    map.put_float("exhaust_temp", exhaust_temp);
    map.put_float("temp_virt_sup_exit", temp_virt_sup_exit);
    map.put_int("outdoor_humidity", outdoor_humidity as i64);
    map.put_int("extract_humidity", extract_humidity as i64);
    map.put_float(
        "outdoor_humidity_abs",
        absolute_humidity(outdoor_humidity, outdoor_temp),
    );
    map.put_float(
        "extract_humidity_abs",
        absolute_humidity(extract_humidity, extract_temp),
    );
    map.put_int("co2", co2);
    map.put_int("co2_indicator", co2_indicator(co2 as f64));
    map.put_int("pressure", pressure_hpa);
    map.put_float("air_density", air_density(pressure_hpa as f64, extract_temp));
    map.put_int("comfort_level", comfort_level);
    map.put_int("operating_mode", operating_mode);
    map.put_int("supply_fan_rpm", i64::from(supply_fan_rpm));
    map.put_int("extract_fan_rpm", i64::from(extract_fan_rpm));
    map.put_int("air_flow", air_flow);
    map.put_int("air_flow_ave", air_flow_ave);
    map.put_int("fan_speed", i64::from(fan_speed));
    map.put_int("hum_red_mode", hum_red_mode);
    map.put_int("supply_filter_ful", supply_filter_ful);
    map.put_int("extract_filter_ful", extract_filter_ful);
    map.put_int(
        "extract_humidity_indicator",
        humidity_indicator(extract_humidity),
    );
    map.put_opt_int(
        "outdoor_filter_indicator",
        filter_indicator(supply_fan_rpm, fan_speed, &FAN_SUPPLY_RPMS),
    );
    map.put_opt_int(
        "exhaust_filter_indicator",
        filter_indicator(extract_fan_rpm, fan_speed, &FAN_EXTRACT_RPMS),
    );
    map.put_int("supply_vent_pos", supply_vent_pos);
    map.put_int("extract_vent_pos", extract_vent_pos);
    map.put_int("bypass_vent_pos", bypass_vent_pos);
    map.put_int("heat_recovery", recovery);
    map.put_int("power_recovery", power_recovery);
    map.put_int("filter_hours", filter_hours);
    map.put_int("operating_hours", operating_hours);
    map.put_int("rssi", i64::from(to_signed(u32::from(data[47]), 8)));
    map.put_int("error_state", error_state);
    map.put_bool("has_errors", has_errors);
    map.put_bool("deicing", deicing);
    map.put_int("board_version", i64::from(data[22]));

    Ok(map)
}
