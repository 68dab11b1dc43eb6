//! Wire-format structures for the `{"print": {...}}` report payload.
//!
//! These mirror the JSON keys the printer firmware sends and are never exposed
//! outside the crate. Every field is decoded through one of the lenient
//! helpers below, so a value of the wrong type degrades to the field's default
//! instead of failing the whole report.

use std::net::Ipv4Addr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Decode any value, falling back to `T::default()` when it has the wrong shape.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

/// Decode a string, accepting numbers and booleans in their textual form.
pub(crate) fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

/// Decode a boolean flag. Firmware variants send `true`, `1` or `"1"`.
pub(crate) fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => matches!(s.trim(), "1" | "true" | "TRUE" | "True"),
        _ => false,
    })
}

/// Decode a temperature in degrees Celsius.
///
/// Accepts a JSON number or a numeric string. `null`, junk and non-finite
/// values decode to zero.
pub(crate) fn temperature<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(decimal_value(Value::deserialize(deserializer)?))
}

/// Decode a decimal that may arrive as a number or a numeric string.
pub(crate) fn decimal<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(decimal_value(Value::deserialize(deserializer)?))
}

fn decimal_value(value: Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or_default()
}

/// Decode a packed IPv4 address. Zero and anything unparseable is absent.
pub(crate) fn packed_ip<'de, D>(deserializer: D) -> Result<Option<Ipv4Addr>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_u64().map(|v| v as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    Ok(raw.and_then(crate::report::unpack_ipv4))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WirePrint {
    #[serde(deserialize_with = "text")]
    pub command: String,
    #[serde(deserialize_with = "text")]
    pub sequence_id: String,
    #[serde(deserialize_with = "lenient")]
    pub state: Option<i64>,
    #[serde(deserialize_with = "lenient")]
    pub gcode_state: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub percent: Option<i64>,
    #[serde(deserialize_with = "lenient")]
    pub mc_percent: Option<i64>,
    #[serde(deserialize_with = "text")]
    pub gcode_file: String,
    #[serde(deserialize_with = "text")]
    pub subtask_name: String,
    #[serde(deserialize_with = "text")]
    pub task_id: String,
    #[serde(deserialize_with = "text")]
    pub subtask_id: String,
    #[serde(deserialize_with = "text")]
    pub print_type: String,
    #[serde(deserialize_with = "temperature")]
    pub bed_temper: f64,
    #[serde(deserialize_with = "temperature")]
    pub bed_target_temper: f64,
    #[serde(deserialize_with = "temperature")]
    pub nozzle_temper: f64,
    #[serde(deserialize_with = "temperature")]
    pub nozzle_target_temper: f64,
    #[serde(deserialize_with = "temperature")]
    pub chamber_temper: f64,
    #[serde(deserialize_with = "lenient")]
    pub layer_num: Option<i64>,
    #[serde(deserialize_with = "lenient")]
    pub total_layer_num: Option<i64>,
    #[serde(rename = "3D", deserialize_with = "lenient")]
    pub layer_info: Option<WireLayerInfo>,
    #[serde(deserialize_with = "lenient")]
    pub mc_remaining_time: Option<i64>,
    #[serde(deserialize_with = "lenient")]
    pub remain_time: Option<i64>,
    #[serde(deserialize_with = "text")]
    pub cooling_fan_speed: String,
    #[serde(deserialize_with = "text")]
    pub big_fan1_speed: String,
    #[serde(deserialize_with = "text")]
    pub big_fan2_speed: String,
    #[serde(deserialize_with = "text")]
    pub heatbreak_fan_speed: String,
    #[serde(deserialize_with = "lenient")]
    pub spd_lvl: i64,
    #[serde(deserialize_with = "lenient")]
    pub spd_mag: i64,
    #[serde(deserialize_with = "text")]
    pub nozzle_diameter: String,
    #[serde(deserialize_with = "text")]
    pub nozzle_type: String,
    #[serde(deserialize_with = "text")]
    pub wifi_signal: String,
    #[serde(deserialize_with = "flag")]
    pub sdcard: bool,
    #[serde(deserialize_with = "lenient")]
    pub print_error: i64,
    #[serde(deserialize_with = "lenient")]
    pub home_flag: i64,
    #[serde(deserialize_with = "lenient")]
    pub ams: Option<WireAmsSystem>,
    #[serde(deserialize_with = "lenient")]
    pub device: Option<WireDevice>,
    #[serde(deserialize_with = "lenient")]
    pub job: Option<WireJob>,
    #[serde(deserialize_with = "lenient")]
    pub net: Option<WireNet>,
    #[serde(deserialize_with = "lenient")]
    pub upgrade_state: Option<WireUpgrade>,
    #[serde(deserialize_with = "lenient")]
    pub upload: Option<WireUpload>,
    #[serde(deserialize_with = "lenient")]
    pub hms: Vec<WireHms>,
    #[serde(deserialize_with = "lenient")]
    pub lights_report: Vec<WireLight>,
    #[serde(deserialize_with = "lenient")]
    pub ipcam: Option<WireIpCam>,
    #[serde(deserialize_with = "lenient")]
    pub xcam: Option<WireXCam>,
    #[serde(deserialize_with = "lenient")]
    pub online: Option<WireOnline>,
    #[serde(deserialize_with = "lenient")]
    pub vt_tray: Option<WireTray>,
    #[serde(deserialize_with = "lenient")]
    pub vir_slot: Vec<WireTray>,
    #[serde(deserialize_with = "lenient")]
    pub care: Vec<WireCare>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WireLayerInfo {
    #[serde(deserialize_with = "lenient")]
    pub layer_num: Option<i64>,
    #[serde(deserialize_with = "lenient")]
    pub total_layer_num: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WireAmsSystem {
    #[serde(deserialize_with = "lenient")]
    pub ams: Vec<WireAms>,
    #[serde(deserialize_with = "text")]
    pub ams_exist_bits: String,
    #[serde(deserialize_with = "text")]
    pub tray_exist_bits: String,
    #[serde(deserialize_with = "text")]
    pub tray_now: String,
    #[serde(deserialize_with = "text")]
    pub tray_pre: String,
    #[serde(deserialize_with = "text")]
    pub tray_tar: String,
    #[serde(deserialize_with = "flag")]
    pub insert_flag: bool,
    #[serde(deserialize_with = "flag")]
    pub power_on_flag: bool,
    #[serde(deserialize_with = "lenient")]
    pub version: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WireAms {
    #[serde(deserialize_with = "text")]
    pub id: String,
    #[serde(deserialize_with = "text")]
    pub humidity: String,
    #[serde(deserialize_with = "text")]
    pub humidity_raw: String,
    #[serde(deserialize_with = "temperature")]
    pub temp: f64,
    #[serde(deserialize_with = "lenient")]
    pub dry_time: i64,
    #[serde(deserialize_with = "lenient")]
    pub tray: Vec<WireTray>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WireTray {
    #[serde(deserialize_with = "text")]
    pub id: String,
    #[serde(deserialize_with = "text")]
    pub tray_type: String,
    #[serde(deserialize_with = "text")]
    pub tray_color: String,
    #[serde(deserialize_with = "text")]
    pub tray_sub_brands: String,
    #[serde(deserialize_with = "text")]
    pub tray_id_name: String,
    #[serde(deserialize_with = "text")]
    pub tray_info_idx: String,
    #[serde(deserialize_with = "decimal")]
    pub tray_diameter: f64,
    #[serde(deserialize_with = "text")]
    pub tray_weight: String,
    #[serde(deserialize_with = "lenient")]
    pub remain: i64,
    #[serde(deserialize_with = "lenient")]
    pub total_len: i64,
    #[serde(deserialize_with = "temperature")]
    pub nozzle_temp_min: f64,
    #[serde(deserialize_with = "temperature")]
    pub nozzle_temp_max: f64,
    #[serde(deserialize_with = "lenient")]
    pub state: i64,
    #[serde(deserialize_with = "lenient")]
    pub cols: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WireDevice {
    #[serde(rename = "type", deserialize_with = "lenient")]
    pub device_type: i64,
    #[serde(deserialize_with = "lenient")]
    pub bed: Option<WireHeater>,
    #[serde(deserialize_with = "lenient")]
    pub ctc: Option<WireHeater>,
    #[serde(deserialize_with = "lenient")]
    pub extruder: Option<WireExtruderDevice>,
    #[serde(deserialize_with = "lenient")]
    pub nozzle: Option<WireNozzleDevice>,
    #[serde(deserialize_with = "lenient")]
    pub plate: Option<WirePlate>,
    #[serde(deserialize_with = "lenient")]
    pub laser: Option<WireLaser>,
    #[serde(deserialize_with = "lenient")]
    pub fan: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WireHeater {
    #[serde(deserialize_with = "lenient")]
    pub info: Option<WireHeaterInfo>,
    #[serde(deserialize_with = "lenient")]
    pub state: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WireHeaterInfo {
    #[serde(deserialize_with = "lenient")]
    pub temp: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WireExtruderDevice {
    #[serde(deserialize_with = "lenient")]
    pub info: Vec<WireExtruderInfo>,
    #[serde(deserialize_with = "lenient")]
    pub state: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WireExtruderInfo {
    #[serde(deserialize_with = "lenient")]
    pub id: i64,
    #[serde(deserialize_with = "lenient")]
    pub temp: i64,
    #[serde(deserialize_with = "lenient")]
    pub hnow: i64,
    #[serde(deserialize_with = "lenient")]
    pub htar: i64,
    #[serde(deserialize_with = "lenient")]
    pub snow: i64,
    #[serde(deserialize_with = "lenient")]
    pub stat: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WireNozzleDevice {
    #[serde(deserialize_with = "lenient")]
    pub exist: i64,
    #[serde(deserialize_with = "lenient")]
    pub info: Vec<WireNozzleInfo>,
    #[serde(deserialize_with = "lenient")]
    pub state: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WireNozzleInfo {
    #[serde(deserialize_with = "lenient")]
    pub id: i64,
    #[serde(deserialize_with = "decimal")]
    pub diameter: f64,
    #[serde(rename = "type", deserialize_with = "text")]
    pub nozzle_type: String,
    #[serde(deserialize_with = "lenient")]
    pub wear: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WirePlate {
    #[serde(deserialize_with = "lenient")]
    pub base: i64,
    #[serde(deserialize_with = "lenient")]
    pub mat: i64,
    #[serde(deserialize_with = "text")]
    pub cur_id: String,
    #[serde(deserialize_with = "text")]
    pub tar_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WireLaser {
    #[serde(deserialize_with = "lenient")]
    pub power: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WireJob {
    #[serde(deserialize_with = "lenient")]
    pub cur_stage: Option<WireCurrentStage>,
    #[serde(deserialize_with = "lenient")]
    pub stage: Vec<WireStage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WireCurrentStage {
    #[serde(deserialize_with = "lenient")]
    pub idx: i64,
    #[serde(deserialize_with = "lenient")]
    pub state: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WireStage {
    #[serde(deserialize_with = "lenient")]
    pub idx: i64,
    #[serde(rename = "type", deserialize_with = "lenient")]
    pub stage_type: i64,
    #[serde(deserialize_with = "lenient")]
    pub est_time: i64,
    #[serde(deserialize_with = "decimal")]
    pub heigh: f64,
    #[serde(deserialize_with = "lenient")]
    pub tool: Vec<String>,
    #[serde(deserialize_with = "lenient")]
    pub color: Vec<String>,
    #[serde(deserialize_with = "text")]
    pub platform: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WireNet {
    #[serde(deserialize_with = "lenient")]
    pub conf: i64,
    #[serde(deserialize_with = "lenient")]
    pub info: Vec<WireNetInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WireNetInfo {
    #[serde(deserialize_with = "packed_ip")]
    pub ip: Option<Ipv4Addr>,
    #[serde(deserialize_with = "packed_ip")]
    pub mask: Option<Ipv4Addr>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WireUpgrade {
    #[serde(deserialize_with = "text")]
    pub status: String,
    #[serde(deserialize_with = "text")]
    pub progress: String,
    #[serde(deserialize_with = "lenient")]
    pub new_version_state: i64,
    #[serde(deserialize_with = "text")]
    pub sn: String,
    #[serde(deserialize_with = "text")]
    pub message: String,
    #[serde(deserialize_with = "flag")]
    pub force_upgrade: bool,
    #[serde(deserialize_with = "lenient")]
    pub err_code: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WireUpload {
    #[serde(deserialize_with = "text")]
    pub status: String,
    #[serde(deserialize_with = "lenient")]
    pub progress: i64,
    #[serde(deserialize_with = "text")]
    pub message: String,
    #[serde(deserialize_with = "lenient")]
    pub file_size: i64,
    #[serde(deserialize_with = "lenient")]
    pub finish_size: i64,
    #[serde(deserialize_with = "lenient")]
    pub speed: i64,
    #[serde(deserialize_with = "lenient")]
    pub time_remaining: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WireHms {
    #[serde(deserialize_with = "lenient")]
    pub attr: i64,
    #[serde(deserialize_with = "lenient")]
    pub code: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WireLight {
    #[serde(deserialize_with = "text")]
    pub node: String,
    #[serde(deserialize_with = "text")]
    pub mode: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WireIpCam {
    #[serde(deserialize_with = "text")]
    pub ipcam_record: String,
    #[serde(deserialize_with = "text")]
    pub timelapse: String,
    #[serde(deserialize_with = "text")]
    pub resolution: String,
    #[serde(deserialize_with = "text")]
    pub rtsp_url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WireXCam {
    #[serde(deserialize_with = "flag")]
    pub allow_skip_parts: bool,
    #[serde(deserialize_with = "flag")]
    pub buildplate_marker_detector: bool,
    #[serde(deserialize_with = "flag")]
    pub first_layer_inspector: bool,
    #[serde(deserialize_with = "flag")]
    pub print_halt: bool,
    #[serde(deserialize_with = "flag")]
    pub printing_monitor: bool,
    #[serde(deserialize_with = "flag")]
    pub spaghetti_detector: bool,
    #[serde(deserialize_with = "text")]
    pub halt_print_sensitivity: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WireOnline {
    #[serde(deserialize_with = "flag")]
    pub ahb: bool,
    #[serde(deserialize_with = "flag")]
    pub ext: bool,
    #[serde(deserialize_with = "lenient")]
    pub version: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WireCare {
    #[serde(deserialize_with = "text")]
    pub id: String,
    #[serde(deserialize_with = "text")]
    pub info: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wrong_typed_field_degrades_to_default() {
        let print: WirePrint = serde_json::from_value(json!({
            "spd_lvl": "fast",
            "sdcard": {"nested": true},
            "hms": "not a list",
            "layer_num": 12
        }))
        .unwrap();

        assert_eq!(print.spd_lvl, 0);
        assert!(!print.sdcard);
        assert!(print.hms.is_empty());
        assert_eq!(print.layer_num, Some(12));
    }

    #[test]
    fn test_temperature_accepts_numbers_strings_and_null() {
        let tray: WireTray = serde_json::from_value(json!({
            "nozzle_temp_min": "240",
            "nozzle_temp_max": 270.5
        }))
        .unwrap();
        assert_eq!(tray.nozzle_temp_min, 240.0);
        assert_eq!(tray.nozzle_temp_max, 270.5);

        let print: WirePrint = serde_json::from_value(json!({
            "bed_temper": null,
            "nozzle_temper": "warm"
        }))
        .unwrap();
        assert_eq!(print.bed_temper, 0.0);
        assert_eq!(print.nozzle_temper, 0.0);
    }

    #[test]
    fn test_text_accepts_numbers() {
        let ams: WireAms = serde_json::from_value(json!({"id": 0, "humidity": "3"})).unwrap();
        assert_eq!(ams.id, "0");
        assert_eq!(ams.humidity, "3");
    }

    #[test]
    fn test_flag_variants() {
        let xcam: WireXCam = serde_json::from_value(json!({
            "first_layer_inspector": 1,
            "spaghetti_detector": "true",
            "print_halt": false,
            "printing_monitor": "0"
        }))
        .unwrap();
        assert!(xcam.first_layer_inspector);
        assert!(xcam.spaghetti_detector);
        assert!(!xcam.print_halt);
        assert!(!xcam.printing_monitor);
    }

    #[test]
    fn test_packed_ip_zero_and_string() {
        let info: WireNetInfo = serde_json::from_value(json!({"ip": 0, "mask": "16777215"})).unwrap();
        assert_eq!(info.ip, None);
        assert_eq!(info.mask, Some(Ipv4Addr::new(255, 255, 255, 0)));
    }
}
