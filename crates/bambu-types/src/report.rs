//! The decoded report model.
//!
//! A [`Report`] is an immutable snapshot of one `{"print": {...}}` message. It
//! is built once from the private wire structures and never mutated after.

use core::fmt;
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DecodeError, DecodeResult};
use crate::wire;

/// Unpack a little-endian IPv4 address from the integer form the firmware uses.
///
/// The low byte is the first octet. Only the low 32 bits are significant, so
/// values sent as signed 32-bit integers decode the same as unsigned ones.
/// Zero means "no address" and decodes to `None`, never `0.0.0.0`.
///
/// # Examples
///
/// ```
/// use std::net::Ipv4Addr;
/// use bambu_types::unpack_ipv4;
///
/// assert_eq!(unpack_ipv4(1258596544), Some(Ipv4Addr::new(192, 168, 4, 75)));
/// assert_eq!(unpack_ipv4(0), None);
/// ```
#[must_use]
pub fn unpack_ipv4(raw: i64) -> Option<Ipv4Addr> {
    let bits = raw as u32;
    if bits == 0 {
        return None;
    }
    Some(Ipv4Addr::from(bits.to_le_bytes()))
}

/// Split a packed heater temperature word into `(current, target)` in whole °C.
///
/// The low 16 bits hold the current reading and the next 16 bits the target.
///
/// ```
/// use bambu_types::unpack_extruder_temperature;
///
/// assert_eq!(unpack_extruder_temperature(28), (28, 0));
/// assert_eq!(unpack_extruder_temperature((220 << 16) | 215), (215, 220));
/// ```
#[must_use]
pub fn unpack_extruder_temperature(packed: i64) -> (u16, u16) {
    let current = (packed & 0xFFFF) as u16;
    let target = ((packed >> 16) & 0xFFFF) as u16;
    (current, target)
}

/// One decoded status report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Report {
    /// Message command, normally `"push_status"`.
    pub command: String,
    /// Sequence id echoed by the firmware.
    pub sequence_id: String,
    /// Printer operating state code (see [`crate::PrinterState`]).
    pub state_code: Option<i64>,
    /// Raw G-code state string, if the message carried one.
    pub gcode_state_raw: Option<String>,
    /// Job progress in percent.
    pub progress: i32,
    /// Path of the G-code file being printed.
    pub gcode_file: String,
    /// Subtask (plate) name.
    pub subtask_name: String,
    /// Cloud task id; `"0"` for local jobs.
    pub task_id: String,
    /// Cloud subtask id.
    pub subtask_id: String,
    /// Where the job came from, e.g. `"local"` or `"cloud"`.
    pub print_type: String,
    /// Bed temperature in °C.
    pub bed_temperature: f64,
    /// Bed target temperature in °C.
    pub bed_target_temperature: f64,
    /// Nozzle temperature in °C.
    pub nozzle_temperature: f64,
    /// Nozzle target temperature in °C.
    pub nozzle_target_temperature: f64,
    /// Chamber temperature in °C.
    pub chamber_temperature: f64,
    /// Current layer (top-level value, else the `3D` block).
    pub layer_num: i32,
    /// Total layers (top-level value, else the `3D` block).
    pub total_layer_num: i32,
    /// Estimated remaining time in minutes.
    pub remaining_minutes: i32,
    /// Fan speed readings.
    pub fans: FanSpeeds,
    /// Raw speed level (see [`crate::SpeedProfile`]).
    pub speed_level: i64,
    /// Speed magnitude in percent.
    pub speed_magnitude: i64,
    /// Installed nozzle diameter as text, e.g. `"0.4"`.
    pub nozzle_diameter: String,
    /// Installed nozzle material, e.g. `"hardened_steel"`.
    pub nozzle_type: String,
    /// Wi-Fi signal, e.g. `"-38dBm"`.
    pub wifi_signal: String,
    /// Whether an SD card is inserted.
    pub sdcard: bool,
    /// Print error code; 0 when none.
    pub print_error: i64,
    /// Bit flags for homing and printer options.
    pub home_flag: i64,
    /// AMS block, when present.
    pub ams: Option<AmsSystem>,
    /// Device block, when present.
    pub device: Option<DeviceReport>,
    /// Job stage block, when present.
    pub job: Option<JobReport>,
    /// Network block, when present.
    pub network: Option<NetworkReport>,
    /// Firmware upgrade state, when present.
    pub upgrade: Option<UpgradeState>,
    /// File upload progress, when present.
    pub upload: Option<UploadStatus>,
    /// Active Health Management System entries.
    pub hms: Vec<Hms>,
    /// Chamber and work lights.
    pub lights: Vec<Light>,
    /// Camera settings, when present.
    pub camera: Option<IpCamera>,
    /// AI monitoring switches, when present.
    pub ai_monitoring: Option<AiMonitoring>,
    /// Cloud connectivity, when present.
    pub cloud: Option<CloudStatus>,
    /// External spool holder.
    pub external_spool: Option<Tray>,
    /// Virtual tray slots.
    pub virtual_slots: Vec<Tray>,
    /// Maintenance entries.
    pub care: Vec<CareEntry>,
}

impl Report {
    /// Decode a report from raw MQTT payload bytes.
    ///
    /// Fails only when the payload is not JSON, its root is not an object, or
    /// it has no `print` object. Every field inside `print` is optional and
    /// tolerant of the wrong type.
    ///
    /// # Examples
    ///
    /// ```
    /// use bambu_types::Report;
    ///
    /// let report = Report::from_slice(br#"{"print": {"gcode_state": "RUNNING", "mc_percent": 42}}"#).unwrap();
    /// assert_eq!(report.progress, 42);
    /// assert!(Report::from_slice(br#"{"info": {}}"#).is_err());
    /// ```
    pub fn from_slice(bytes: &[u8]) -> DecodeResult<Self> {
        let root: Value = serde_json::from_slice(bytes)?;
        Self::from_value(root)
    }

    /// Decode a report from a JSON string.
    pub fn from_json_str(json: &str) -> DecodeResult<Self> {
        let root: Value = serde_json::from_str(json)?;
        Self::from_value(root)
    }

    fn from_value(root: Value) -> DecodeResult<Self> {
        let Value::Object(mut root) = root else {
            return Err(DecodeError::NotAnObject);
        };
        let print = match root.remove("print") {
            Some(print @ Value::Object(_)) => print,
            _ => return Err(DecodeError::MissingKey("print")),
        };
        let print: wire::WirePrint = serde_json::from_value(print)?;
        Ok(Self::from_wire(print))
    }

    pub(crate) fn from_wire(print: wire::WirePrint) -> Self {
        let layers = print.layer_info.as_ref();
        let layer_num = print
            .layer_num
            .or_else(|| layers.and_then(|l| l.layer_num))
            .unwrap_or_default();
        let total_layer_num = print
            .total_layer_num
            .or_else(|| layers.and_then(|l| l.total_layer_num))
            .unwrap_or_default();

        Self {
            command: print.command,
            sequence_id: print.sequence_id,
            state_code: print.state,
            gcode_state_raw: print.gcode_state,
            progress: clamp_i32(print.percent.or(print.mc_percent).unwrap_or_default()),
            gcode_file: print.gcode_file,
            subtask_name: print.subtask_name,
            task_id: print.task_id,
            subtask_id: print.subtask_id,
            print_type: print.print_type,
            bed_temperature: print.bed_temper,
            bed_target_temperature: print.bed_target_temper,
            nozzle_temperature: print.nozzle_temper,
            nozzle_target_temperature: print.nozzle_target_temper,
            chamber_temperature: print.chamber_temper,
            layer_num: clamp_i32(layer_num),
            total_layer_num: clamp_i32(total_layer_num),
            remaining_minutes: clamp_i32(
                print
                    .mc_remaining_time
                    .or(print.remain_time)
                    .unwrap_or_default(),
            ),
            fans: FanSpeeds {
                cooling: print.cooling_fan_speed,
                auxiliary: print.big_fan1_speed,
                chamber: print.big_fan2_speed,
                heatbreak: print.heatbreak_fan_speed,
            },
            speed_level: print.spd_lvl,
            speed_magnitude: print.spd_mag,
            nozzle_diameter: print.nozzle_diameter,
            nozzle_type: print.nozzle_type,
            wifi_signal: print.wifi_signal,
            sdcard: print.sdcard,
            print_error: print.print_error,
            home_flag: print.home_flag,
            ams: print.ams.map(AmsSystem::from),
            device: print.device.map(DeviceReport::from),
            job: print.job.map(JobReport::from),
            network: print.net.map(NetworkReport::from),
            upgrade: print.upgrade_state.map(UpgradeState::from),
            upload: print.upload.map(UploadStatus::from),
            hms: print.hms.into_iter().map(Hms::from).collect(),
            lights: print.lights_report.into_iter().map(Light::from).collect(),
            camera: print.ipcam.map(IpCamera::from),
            ai_monitoring: print.xcam.map(AiMonitoring::from),
            cloud: print.online.map(CloudStatus::from),
            external_spool: print.vt_tray.map(Tray::from),
            virtual_slots: print.vir_slot.into_iter().map(Tray::from).collect(),
            care: print.care.into_iter().map(CareEntry::from).collect(),
        }
    }

    /// All extruders reported in the device block, in wire order.
    pub fn extruders(&self) -> &[Extruder] {
        self.device
            .as_ref()
            .map(|d| d.extruders.as_slice())
            .unwrap_or_default()
    }

    /// The first extruder entry, treated as the primary one.
    pub fn primary_extruder(&self) -> Option<&Extruder> {
        self.extruders().first()
    }

    /// AMS units in wire order; empty when no AMS is attached.
    pub fn ams_units(&self) -> &[AmsUnit] {
        self.ams
            .as_ref()
            .map(|a| a.units.as_slice())
            .unwrap_or_default()
    }

    /// Look up a light by node name, e.g. `"chamber_light"`.
    pub fn light(&self, node: &str) -> Option<&Light> {
        self.lights.iter().find(|l| l.node == node)
    }
}

fn clamp_i32(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Fan speed readings as the firmware reports them (0-15 steps, as text).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanSpeeds {
    /// Part cooling fan.
    pub cooling: String,
    /// Auxiliary fan.
    pub auxiliary: String,
    /// Chamber fan.
    pub chamber: String,
    /// Hotend heatbreak fan.
    pub heatbreak: String,
}

/// The AMS (automatic material system) block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AmsSystem {
    /// AMS units in wire order.
    pub units: Vec<AmsUnit>,
    /// Hex bitmask of connected units.
    pub exist_bits: String,
    /// Hex bitmask of trays holding filament.
    pub tray_exist_bits: String,
    /// Currently loaded tray id (`"255"` when none).
    pub tray_now: String,
    /// Previously loaded tray id.
    pub tray_previous: String,
    /// Tray id being loaded.
    pub tray_target: String,
    /// Read RFID tags when a spool is inserted.
    pub insert_flag: bool,
    /// Read RFID tags on power-up.
    pub power_on_flag: bool,
    /// Incremented whenever the AMS block changes.
    pub version: i64,
}

impl From<wire::WireAmsSystem> for AmsSystem {
    fn from(ams: wire::WireAmsSystem) -> Self {
        Self {
            units: ams.ams.into_iter().map(AmsUnit::from).collect(),
            exist_bits: ams.ams_exist_bits,
            tray_exist_bits: ams.tray_exist_bits,
            tray_now: ams.tray_now,
            tray_previous: ams.tray_pre,
            tray_target: ams.tray_tar,
            insert_flag: ams.insert_flag,
            power_on_flag: ams.power_on_flag,
            version: ams.version,
        }
    }
}

/// A single AMS unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AmsUnit {
    /// Unit id, `"0"` for the first unit.
    pub id: String,
    /// Temperature in °C.
    pub temperature: f64,
    /// Humidity as reported, parsed from text; 0 when unparseable.
    pub humidity: i32,
    /// Raw humidity sensor value, kept verbatim.
    pub humidity_raw: String,
    /// Remaining drying time in minutes.
    pub dry_time: i64,
    /// Trays in wire order.
    pub trays: Vec<Tray>,
}

impl From<wire::WireAms> for AmsUnit {
    fn from(ams: wire::WireAms) -> Self {
        Self {
            humidity: ams.humidity.trim().parse().unwrap_or(0),
            id: ams.id,
            temperature: ams.temp,
            humidity_raw: ams.humidity_raw,
            dry_time: ams.dry_time,
            trays: ams.tray.into_iter().map(Tray::from).collect(),
        }
    }
}

/// A filament tray (AMS slot, external spool, or virtual slot).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tray {
    /// Tray id within its unit.
    pub id: String,
    /// Filament type such as `"PLA"` or `"PETG-CF"`.
    pub filament_type: String,
    /// `RRGGBBAA` hex color. Empty when the slot holds no filament.
    pub color: String,
    /// Remaining filament length.
    pub remaining_length: i64,
    /// Total filament length of the spool.
    pub total_length: i64,
    /// Minimum nozzle temperature in °C.
    pub nozzle_temp_min: f64,
    /// Maximum nozzle temperature in °C.
    pub nozzle_temp_max: f64,
    /// Filament brand and product name.
    pub brand: String,
    /// Filament diameter in millimetres.
    pub diameter: f64,
    /// Raw tray state code.
    pub state: i64,
}

impl Tray {
    /// Remaining filament as a whole percentage of the total length.
    ///
    /// Returns 0 when the total length is unknown (zero or negative).
    #[must_use]
    pub fn remaining_percent(&self) -> i32 {
        if self.total_length <= 0 {
            return 0;
        }
        let percent = self.remaining_length as f64 / self.total_length as f64 * 100.0;
        percent as i32
    }

    /// Whether the slot holds filament.
    #[must_use]
    pub fn has_filament(&self) -> bool {
        !self.color.is_empty()
    }
}

impl From<wire::WireTray> for Tray {
    fn from(tray: wire::WireTray) -> Self {
        Self {
            id: tray.id,
            filament_type: tray.tray_type,
            color: tray.tray_color,
            remaining_length: tray.remain,
            total_length: tray.total_len,
            nozzle_temp_min: tray.nozzle_temp_min,
            nozzle_temp_max: tray.nozzle_temp_max,
            brand: tray.tray_sub_brands,
            diameter: tray.tray_diameter,
            state: tray.state,
        }
    }
}

/// The `device` block: heaters, extruders, nozzles and plate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceReport {
    /// Raw device type code.
    pub device_type: i64,
    /// Heated bed.
    pub bed: Option<Heater>,
    /// Chamber temperature controller.
    pub chamber: Option<Heater>,
    /// Extruders in wire order.
    pub extruders: Vec<Extruder>,
    /// Raw extruder block state.
    pub extruder_state: i64,
    /// Installed nozzles.
    pub nozzles: Vec<Nozzle>,
    /// Raw nozzle block state.
    pub nozzle_state: i64,
    /// Build plate, when reported.
    pub plate: Option<Plate>,
    /// Laser module power, when a laser is fitted.
    pub laser_power: Option<i64>,
    /// Raw fan state word.
    pub fan: i64,
}

impl From<wire::WireDevice> for DeviceReport {
    fn from(device: wire::WireDevice) -> Self {
        let (extruders, extruder_state) = device
            .extruder
            .map(|e| (e.info.into_iter().map(Extruder::from).collect(), e.state))
            .unwrap_or_default();
        let (nozzles, nozzle_state) = device
            .nozzle
            .map(|n| (n.info.into_iter().map(Nozzle::from).collect(), n.state))
            .unwrap_or_default();
        Self {
            device_type: device.device_type,
            bed: device.bed.map(Heater::from),
            chamber: device.ctc.map(Heater::from),
            extruders,
            extruder_state,
            nozzles,
            nozzle_state,
            plate: device.plate.map(Plate::from),
            laser_power: device.laser.map(|l| l.power),
            fan: device.fan,
        }
    }
}

/// A heated element reported with a packed temperature word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heater {
    /// Current temperature in whole °C.
    pub current_temperature: u16,
    /// Target temperature in whole °C.
    pub target_temperature: u16,
    /// Raw heater state.
    pub state: i64,
}

impl From<wire::WireHeater> for Heater {
    fn from(heater: wire::WireHeater) -> Self {
        let packed = heater.info.map(|i| i.temp).unwrap_or_default();
        let (current_temperature, target_temperature) = unpack_extruder_temperature(packed);
        Self {
            current_temperature,
            target_temperature,
            state: heater.state,
        }
    }
}

/// One extruder entry from `device.extruder.info`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extruder {
    /// Extruder index.
    pub id: i64,
    /// Current temperature in whole °C.
    pub current_temperature: u16,
    /// Target temperature in whole °C.
    pub target_temperature: u16,
    /// Filament temperature; the same sensor as the current temperature.
    pub filament_temperature: u16,
    /// Raw status code (`stat`).
    pub status: i64,
    /// Heater slot in use (`hnow`).
    pub heater_now: i64,
    /// Heater slot targeted (`htar`).
    pub heater_target: i64,
    /// Nozzle slot in use (`snow`).
    pub nozzle_slot: i64,
}

impl From<wire::WireExtruderInfo> for Extruder {
    fn from(info: wire::WireExtruderInfo) -> Self {
        let (current_temperature, target_temperature) = unpack_extruder_temperature(info.temp);
        Self {
            id: info.id,
            current_temperature,
            target_temperature,
            filament_temperature: current_temperature,
            status: info.stat,
            heater_now: info.hnow,
            heater_target: info.htar,
            nozzle_slot: info.snow,
        }
    }
}

/// One nozzle entry from `device.nozzle.info`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Nozzle {
    /// Nozzle index.
    pub id: i64,
    /// Diameter in millimetres.
    pub diameter: f64,
    /// Nozzle material code.
    pub nozzle_type: String,
    /// Wear in percent.
    pub wear: i64,
}

impl From<wire::WireNozzleInfo> for Nozzle {
    fn from(info: wire::WireNozzleInfo) -> Self {
        Self {
            id: info.id,
            diameter: info.diameter,
            nozzle_type: info.nozzle_type,
            wear: info.wear,
        }
    }
}

/// Build plate detection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plate {
    /// Raw plate base code.
    pub base: i64,
    /// Raw plate material code.
    pub material: i64,
    /// Detected plate id.
    pub current_id: String,
    /// Plate id the job expects.
    pub target_id: String,
}

impl From<wire::WirePlate> for Plate {
    fn from(plate: wire::WirePlate) -> Self {
        Self {
            base: plate.base,
            material: plate.mat,
            current_id: plate.cur_id,
            target_id: plate.tar_id,
        }
    }
}

/// The `job` block: current stage and the stage plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobReport {
    /// Stage being executed.
    pub current_stage: Option<CurrentStage>,
    /// Planned stages in order.
    pub stages: Vec<Stage>,
}

impl From<wire::WireJob> for JobReport {
    fn from(job: wire::WireJob) -> Self {
        Self {
            current_stage: job.cur_stage.map(|s| CurrentStage {
                index: s.idx,
                state: s.state,
            }),
            stages: job.stage.into_iter().map(Stage::from).collect(),
        }
    }
}

/// The stage a job is executing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentStage {
    /// Index into [`JobReport::stages`].
    pub index: i64,
    /// Raw stage state.
    pub state: i64,
}

/// One planned job stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    /// Stage index.
    pub index: i64,
    /// Raw stage type code.
    pub stage_type: i64,
    /// Estimated duration in seconds.
    pub estimated_seconds: i64,
    /// Layer height in millimetres.
    pub height: f64,
    /// Tools used by the stage.
    pub tools: Vec<String>,
    /// Filament colors used by the stage.
    pub colors: Vec<String>,
    /// Build platform name.
    pub platform: String,
}

impl From<wire::WireStage> for Stage {
    fn from(stage: wire::WireStage) -> Self {
        Self {
            index: stage.idx,
            stage_type: stage.stage_type,
            estimated_seconds: stage.est_time,
            height: stage.heigh,
            tools: stage.tool,
            colors: stage.color,
            platform: stage.platform,
        }
    }
}

/// The `net` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkReport {
    /// Raw network configuration word.
    pub config: i64,
    /// Interfaces in wire order.
    pub interfaces: Vec<NetworkInterface>,
}

impl From<wire::WireNet> for NetworkReport {
    fn from(net: wire::WireNet) -> Self {
        Self {
            config: net.conf,
            interfaces: net
                .info
                .into_iter()
                .map(|i| NetworkInterface {
                    ip: i.ip,
                    mask: i.mask,
                })
                .collect(),
        }
    }
}

/// A network interface. Unset addresses are `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInterface {
    /// IPv4 address.
    pub ip: Option<Ipv4Addr>,
    /// Subnet mask.
    pub mask: Option<Ipv4Addr>,
}

impl fmt::Display for NetworkInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.ip, self.mask) {
            (Some(ip), Some(mask)) => write!(f, "{ip}/{mask}"),
            (Some(ip), None) => write!(f, "{ip}"),
            (None, _) => write!(f, "No IP Address"),
        }
    }
}

/// Firmware upgrade state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeState {
    /// Upgrade status text, e.g. `"IDLE"`.
    pub status: String,
    /// Upgrade progress as text.
    pub progress: String,
    /// Whether new firmware is available (raw code).
    pub new_version_state: i64,
    /// Printer serial number.
    pub serial_number: String,
    /// Status message from the firmware.
    pub message: String,
    /// Whether the upgrade is mandatory.
    pub force_upgrade: bool,
    /// Upgrade error code; 0 when none.
    pub error_code: i64,
}

impl From<wire::WireUpgrade> for UpgradeState {
    fn from(upgrade: wire::WireUpgrade) -> Self {
        Self {
            status: upgrade.status,
            progress: upgrade.progress,
            new_version_state: upgrade.new_version_state,
            serial_number: upgrade.sn,
            message: upgrade.message,
            force_upgrade: upgrade.force_upgrade,
            error_code: upgrade.err_code,
        }
    }
}

/// File upload progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadStatus {
    /// Upload status text.
    pub status: String,
    /// Progress in percent.
    pub progress: i64,
    /// Status message.
    pub message: String,
    /// File size in bytes.
    pub file_size: i64,
    /// Bytes transferred so far.
    pub finish_size: i64,
    /// Transfer speed.
    pub speed: i64,
    /// Estimated time remaining in seconds.
    pub time_remaining: i64,
}

impl From<wire::WireUpload> for UploadStatus {
    fn from(upload: wire::WireUpload) -> Self {
        Self {
            status: upload.status,
            progress: upload.progress,
            message: upload.message,
            file_size: upload.file_size,
            finish_size: upload.finish_size,
            speed: upload.speed,
            time_remaining: upload.time_remaining,
        }
    }
}

/// A Health Management System entry. Code and attribute are kept verbatim.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hms {
    /// Error code word.
    pub code: u32,
    /// Attribute word identifying the module.
    pub attribute: u32,
}

impl From<wire::WireHms> for Hms {
    fn from(hms: wire::WireHms) -> Self {
        Self {
            code: hms.code as u32,
            attribute: hms.attr as u32,
        }
    }
}

impl fmt::Display for Hms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HMS_{:08X}_{:08X}", self.attribute, self.code)
    }
}

/// A light node and its mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Light {
    /// Light name, e.g. `"chamber_light"`.
    pub node: String,
    /// `"on"`, `"off"` or `"flashing"`.
    pub mode: String,
}

impl Light {
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.mode.eq_ignore_ascii_case("on")
    }
}

impl From<wire::WireLight> for Light {
    fn from(light: wire::WireLight) -> Self {
        Self {
            node: light.node,
            mode: light.mode,
        }
    }
}

/// Camera recording settings (`ipcam`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpCamera {
    /// Recording setting, `"enable"` or `"disable"`.
    pub recording: String,
    /// Timelapse setting, `"enable"` or `"disable"`.
    pub timelapse: String,
    /// Recording resolution.
    pub resolution: String,
    /// RTSP stream URL, or `"disable"`.
    pub rtsp_url: String,
}

impl From<wire::WireIpCam> for IpCamera {
    fn from(cam: wire::WireIpCam) -> Self {
        Self {
            recording: cam.ipcam_record,
            timelapse: cam.timelapse,
            resolution: cam.resolution,
            rtsp_url: cam.rtsp_url,
        }
    }
}

/// On-board AI monitoring switches (`xcam`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiMonitoring {
    /// Inspect the first layer.
    pub first_layer_inspector: bool,
    /// Detect spaghetti failures.
    pub spaghetti_detector: bool,
    /// Pause the print when a failure is detected.
    pub print_halt: bool,
    /// Monitoring enabled at all.
    pub printing_monitor: bool,
    /// Detection sensitivity, e.g. `"medium"`.
    pub halt_sensitivity: String,
    /// Check the build plate marker.
    pub buildplate_marker_detector: bool,
    /// Allow skipping failed objects.
    pub allow_skip_parts: bool,
}

impl From<wire::WireXCam> for AiMonitoring {
    fn from(xcam: wire::WireXCam) -> Self {
        Self {
            first_layer_inspector: xcam.first_layer_inspector,
            spaghetti_detector: xcam.spaghetti_detector,
            print_halt: xcam.print_halt,
            printing_monitor: xcam.printing_monitor,
            halt_sensitivity: xcam.halt_print_sensitivity,
            buildplate_marker_detector: xcam.buildplate_marker_detector,
            allow_skip_parts: xcam.allow_skip_parts,
        }
    }
}

/// Cloud connectivity flags (`online`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudStatus {
    /// Raw `ahb` flag.
    pub ahb: bool,
    /// Raw `ext` flag.
    pub ext: bool,
    /// Raw status version.
    pub version: i64,
}

impl From<wire::WireOnline> for CloudStatus {
    fn from(online: wire::WireOnline) -> Self {
        Self {
            ahb: online.ahb,
            ext: online.ext,
            version: online.version,
        }
    }
}

/// A maintenance counter from the `care` list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareEntry {
    /// Maintenance item id.
    pub id: String,
    /// Maintenance item details as reported.
    pub info: String,
}

impl From<wire::WireCare> for CareEntry {
    fn from(care: wire::WireCare) -> Self {
        Self {
            id: care.id,
            info: care.info,
        }
    }
}
