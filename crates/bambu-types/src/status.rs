//! Enum views and predicates over a decoded [`Report`].
//!
//! Every lookup here is total: codes the tables do not know map to
//! `Unknown` or `None`, never to an error.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::report::{Hms, NetworkInterface, NetworkReport, Report};

/// Job state as reported in `gcode_state`.
///
/// # Examples
///
/// ```
/// use bambu_types::GCodeState;
///
/// assert_eq!(GCodeState::parse(Some("running")), GCodeState::Running);
/// assert_eq!(GCodeState::parse(Some("WHATEVER")), GCodeState::Unknown);
/// assert_eq!(GCodeState::parse(None), GCodeState::Unknown);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum GCodeState {
    Idle,
    Init,
    Prepare,
    Running,
    Pause,
    Finish,
    Failed,
    Slicing,
    Offline,
    #[default]
    Unknown,
}

impl GCodeState {
    /// Match a raw state string case-insensitively.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return GCodeState::Unknown;
        };
        match raw.trim().to_ascii_uppercase().as_str() {
            "IDLE" => GCodeState::Idle,
            "INIT" => GCodeState::Init,
            "PREPARE" => GCodeState::Prepare,
            "RUNNING" => GCodeState::Running,
            "PAUSE" => GCodeState::Pause,
            "FINISH" => GCodeState::Finish,
            "FAILED" => GCodeState::Failed,
            "SLICING" => GCodeState::Slicing,
            "OFFLINE" => GCodeState::Offline,
            _ => GCodeState::Unknown,
        }
    }
}

impl fmt::Display for GCodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GCodeState::Idle => "Idle",
            GCodeState::Init => "Initializing",
            GCodeState::Prepare => "Preparing",
            GCodeState::Running => "Running",
            GCodeState::Pause => "Paused",
            GCodeState::Finish => "Finished",
            GCodeState::Failed => "Failed",
            GCodeState::Slicing => "Slicing",
            GCodeState::Offline => "Offline",
            GCodeState::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// Printer operating state, from the numeric `state` code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum PrinterState {
    #[default]
    Idle,
    Prepare,
    Running,
    Paused,
    Finishing,
    Finished,
    Failed,
}

impl PrinterState {
    /// Map a state code. Codes outside the table (including 5) are `None`.
    ///
    /// ```
    /// use bambu_types::PrinterState;
    ///
    /// assert_eq!(PrinterState::from_code(6), Some(PrinterState::Finished));
    /// assert_eq!(PrinterState::from_code(5), None);
    /// ```
    #[must_use]
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(PrinterState::Idle),
            1 => Some(PrinterState::Prepare),
            2 => Some(PrinterState::Running),
            3 => Some(PrinterState::Paused),
            4 => Some(PrinterState::Finishing),
            6 => Some(PrinterState::Finished),
            7 => Some(PrinterState::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for PrinterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrinterState::Idle => "Idle",
            PrinterState::Prepare => "Preparing",
            PrinterState::Running => "Printing",
            PrinterState::Paused => "Paused",
            PrinterState::Finishing => "Finishing",
            PrinterState::Finished => "Finished",
            PrinterState::Failed => "Failed",
        };
        f.write_str(name)
    }
}

/// Print speed profile, from `spd_lvl`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum SpeedProfile {
    Silent,
    Standard,
    Sport,
    Ludicrous,
}

impl SpeedProfile {
    /// Map the firmware `spd_lvl` value; unknown levels are `None`.
    #[must_use]
    pub fn from_level(level: i64) -> Option<Self> {
        match level {
            1 => Some(SpeedProfile::Silent),
            2 => Some(SpeedProfile::Standard),
            3 => Some(SpeedProfile::Sport),
            4 => Some(SpeedProfile::Ludicrous),
            _ => None,
        }
    }
}

impl fmt::Display for SpeedProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SpeedProfile::Silent => "Silent",
            SpeedProfile::Standard => "Standard",
            SpeedProfile::Sport => "Sport",
            SpeedProfile::Ludicrous => "Ludicrous",
        };
        f.write_str(name)
    }
}

/// Severity nibble of an HMS code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum HmsSeverity {
    Fatal,
    Serious,
    Common,
    Info,
}

impl HmsSeverity {
    /// Severity nibble of an HMS code word.
    #[must_use]
    pub fn from_code(code: u32) -> Option<Self> {
        match (code >> 16) & 0x0F {
            1 => Some(HmsSeverity::Fatal),
            2 => Some(HmsSeverity::Serious),
            3 => Some(HmsSeverity::Common),
            4 => Some(HmsSeverity::Info),
            _ => None,
        }
    }
}

impl fmt::Display for HmsSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HmsSeverity::Fatal => "Fatal",
            HmsSeverity::Serious => "Serious",
            HmsSeverity::Common => "Common",
            HmsSeverity::Info => "Info",
        };
        f.write_str(name)
    }
}

/// Module byte of an HMS code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum HmsModule {
    MotionController,
    Mainboard,
    Ams,
    Toolhead,
    XCam,
}

impl HmsModule {
    /// Module byte of an HMS code word.
    #[must_use]
    pub fn from_code(code: u32) -> Option<Self> {
        match (code >> 8) & 0xFF {
            0x03 => Some(HmsModule::MotionController),
            0x05 => Some(HmsModule::Mainboard),
            0x07 => Some(HmsModule::Ams),
            0x08 => Some(HmsModule::Toolhead),
            0x0C => Some(HmsModule::XCam),
            _ => None,
        }
    }
}

impl fmt::Display for HmsModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HmsModule::MotionController => "Motion controller",
            HmsModule::Mainboard => "Mainboard",
            HmsModule::Ams => "AMS",
            HmsModule::Toolhead => "Toolhead",
            HmsModule::XCam => "XCam",
        };
        f.write_str(name)
    }
}

impl Hms {
    /// Decoded severity, if the code carries a known one.
    #[must_use]
    pub fn severity(&self) -> Option<HmsSeverity> {
        HmsSeverity::from_code(self.code)
    }

    #[must_use]
    pub fn module(&self) -> Option<HmsModule> {
        HmsModule::from_code(self.code)
    }
}

impl NetworkInterface {
    /// An interface counts as configured once it has an IP address.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.ip.is_some()
    }
}

impl NetworkReport {
    /// Whether any interface has an address.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.interfaces.iter().any(NetworkInterface::is_configured)
    }

    /// Interfaces that have an address, in wire order.
    pub fn active_interfaces(&self) -> impl Iterator<Item = &NetworkInterface> {
        self.interfaces.iter().filter(|i| i.is_configured())
    }
}

impl Report {
    #[must_use]
    pub fn gcode_state(&self) -> GCodeState {
        GCodeState::parse(self.gcode_state_raw.as_deref())
    }

    /// Operating state, or `None` when the code is missing or unmapped.
    #[must_use]
    pub fn printer_state(&self) -> Option<PrinterState> {
        self.state_code.and_then(PrinterState::from_code)
    }

    /// Running or preparing a job.
    #[must_use]
    pub fn is_printing(&self) -> bool {
        matches!(self.gcode_state(), GCodeState::Running | GCodeState::Prepare)
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.gcode_state() == GCodeState::Idle
    }

    /// Last job ended, successfully or not.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self.gcode_state(), GCodeState::Finish | GCodeState::Failed)
    }

    #[must_use]
    pub fn speed_profile(&self) -> Option<SpeedProfile> {
        SpeedProfile::from_level(self.speed_level)
    }

    /// `(current, total)` layer pair.
    #[must_use]
    pub fn layer_progress(&self) -> (i32, i32) {
        (self.layer_num, self.total_layer_num)
    }

    /// Whether the printer reported at least one addressed interface.
    #[must_use]
    pub fn is_network_connected(&self) -> bool {
        self.network
            .as_ref()
            .is_some_and(NetworkReport::is_connected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn report_with_state(raw: Option<&str>) -> Report {
        Report {
            gcode_state_raw: raw.map(str::to_owned),
            ..Report::default()
        }
    }

    #[test]
    fn test_gcode_state_table() {
        let cases = [
            ("IDLE", GCodeState::Idle),
            ("INIT", GCodeState::Init),
            ("PREPARE", GCodeState::Prepare),
            ("RUNNING", GCodeState::Running),
            ("PAUSE", GCodeState::Pause),
            ("FINISH", GCodeState::Finish),
            ("FAILED", GCodeState::Failed),
            ("SLICING", GCodeState::Slicing),
            ("OFFLINE", GCodeState::Offline),
        ];
        for (raw, expected) in cases {
            assert_eq!(report_with_state(Some(raw)).gcode_state(), expected);
            assert_eq!(
                report_with_state(Some(&raw.to_lowercase())).gcode_state(),
                expected
            );
        }
        assert_eq!(report_with_state(Some("BOGUS")).gcode_state(), GCodeState::Unknown);
        assert_eq!(report_with_state(None).gcode_state(), GCodeState::Unknown);
    }

    #[test]
    fn test_predicates() {
        assert!(report_with_state(Some("RUNNING")).is_printing());
        assert!(report_with_state(Some("PREPARE")).is_printing());
        assert!(report_with_state(Some("IDLE")).is_idle());
        assert!(report_with_state(Some("FINISH")).is_complete());
        assert!(report_with_state(Some("FAILED")).is_complete());

        let paused = report_with_state(Some("PAUSE"));
        assert!(!paused.is_printing() && !paused.is_idle() && !paused.is_complete());

        let unknown = report_with_state(None);
        assert!(!unknown.is_printing() && !unknown.is_idle() && !unknown.is_complete());
    }

    #[test]
    fn test_printer_state_codes() {
        for (code, expected) in [
            (0, PrinterState::Idle),
            (1, PrinterState::Prepare),
            (2, PrinterState::Running),
            (3, PrinterState::Paused),
            (4, PrinterState::Finishing),
            (6, PrinterState::Finished),
            (7, PrinterState::Failed),
        ] {
            assert_eq!(PrinterState::from_code(code), Some(expected));
        }
        assert_eq!(PrinterState::from_code(5), None);
        assert_eq!(PrinterState::from_code(-1), None);
        assert_eq!(Report::default().printer_state(), None);
    }

    #[test]
    fn test_speed_profile() {
        assert_eq!(SpeedProfile::from_level(1), Some(SpeedProfile::Silent));
        assert_eq!(SpeedProfile::from_level(2), Some(SpeedProfile::Standard));
        assert_eq!(SpeedProfile::from_level(3), Some(SpeedProfile::Sport));
        assert_eq!(SpeedProfile::from_level(4), Some(SpeedProfile::Ludicrous));
        assert_eq!(SpeedProfile::from_level(99), None);
        assert_eq!(SpeedProfile::from_level(0), None);
    }

    #[test]
    fn test_hms_decoding() {
        let hms = Hms {
            code: 131073,
            attribute: 201327360,
        };
        assert_eq!(hms.severity(), Some(HmsSeverity::Serious));
        assert_eq!(hms.module(), None);

        let ams_fault = Hms {
            code: 0x0001_0700,
            attribute: 0,
        };
        assert_eq!(ams_fault.severity(), Some(HmsSeverity::Fatal));
        assert_eq!(ams_fault.module(), Some(HmsModule::Ams));

        let unknown = Hms {
            code: 0x0009_FF00,
            attribute: 0,
        };
        assert_eq!(unknown.severity(), None);
        assert_eq!(unknown.module(), None);
    }

    #[test]
    fn test_network_projection() {
        let net = NetworkReport {
            config: 0,
            interfaces: vec![
                NetworkInterface {
                    ip: crate::unpack_ipv4(1258596544),
                    mask: crate::unpack_ipv4(16777215),
                },
                NetworkInterface::default(),
            ],
        };
        assert!(net.is_connected());
        assert_eq!(net.active_interfaces().count(), 1);

        let offline = NetworkReport {
            config: 0,
            interfaces: vec![NetworkInterface::default()],
        };
        assert!(!offline.is_connected());
        assert_eq!(offline.active_interfaces().count(), 0);
    }

    proptest! {
        #[test]
        fn prop_state_predicates_are_exclusive(raw in proptest::option::of("[A-Za-z]{0,10}")) {
            let report = report_with_state(raw.as_deref());
            let hits = [report.is_printing(), report.is_idle(), report.is_complete()]
                .into_iter()
                .filter(|b| *b)
                .count();
            prop_assert!(hits <= 1);
            if report.gcode_state() == GCodeState::Unknown {
                prop_assert_eq!(hits, 0);
            }
        }

        #[test]
        fn prop_gcode_state_is_total(raw in proptest::option::of(".*")) {
            // Never panics, always yields some variant.
            let _ = report_with_state(raw.as_deref()).gcode_state();
        }
    }
}
