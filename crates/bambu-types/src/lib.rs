//! Report model for Bambu Lab printers on the local network.
//!
//! This crate turns the JSON status messages a printer publishes over MQTT
//! into an immutable, typed [`Report`], and offers enum and predicate views
//! over it. It does no I/O; see `bambu-core` for the connection side.
//!
//! # Features
//!
//! - Lenient decoding: a malformed field falls back to its default
//! - Typed views for AMS, extruders, network, HMS, lights and more
//! - Total lookup tables for job state, printer state, speed profile and HMS
//!
//! # Example
//!
//! ```
//! use bambu_types::{GCodeState, Report};
//!
//! let payload = br#"{"print": {"gcode_state": "FINISH", "percent": 100, "state": 6}}"#;
//! let report = Report::from_slice(payload).unwrap();
//!
//! assert_eq!(report.gcode_state(), GCodeState::Finish);
//! assert!(report.is_complete());
//! ```

pub mod error;
pub mod report;
pub mod status;
mod wire;

pub use error::{DecodeError, DecodeResult};
pub use report::{
    AiMonitoring, AmsSystem, AmsUnit, CareEntry, CloudStatus, CurrentStage, DeviceReport,
    Extruder, FanSpeeds, Heater, Hms, IpCamera, JobReport, Light, NetworkInterface,
    NetworkReport, Nozzle, Plate, Report, Stage, Tray, UpgradeState, UploadStatus,
    unpack_extruder_temperature, unpack_ipv4,
};
pub use status::{GCodeState, HmsModule, HmsSeverity, PrinterState, SpeedProfile};

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_wrong_typed_field_does_not_abort_report() {
        let report = Report::from_json_str(
            r#"{"print": {"bed_temper": "hot", "nozzle_temper": 215.5, "ams": 7, "hms": [{"code": 1}]}}"#,
        )
        .unwrap();

        assert_eq!(report.bed_temperature, 0.0);
        assert_eq!(report.nozzle_temperature, 215.5);
        assert!(report.ams.is_none());
        assert_eq!(report.hms.len(), 1);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let report = Report::from_json_str(
            r#"{"print": {"something_new": {"deep": [1, 2]}, "mc_percent": 3}, "extra": true}"#,
        )
        .unwrap();
        assert_eq!(report.progress, 3);
    }

    #[test]
    fn test_numeric_string_temperature() {
        let report = Report::from_json_str(r#"{"print": {"chamber_temper": "31.5"}}"#).unwrap();
        assert_eq!(report.chamber_temperature, 31.5);
    }

    #[test]
    fn test_report_serializes_to_json() {
        let report = Report::from_json_str(r#"{"print": {"gcode_state": "IDLE"}}"#).unwrap();
        let json = serde_json::to_string(&report).unwrap();
        let back: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }

    proptest! {
        #[test]
        fn prop_zero_total_length_is_zero_percent(remaining in any::<i64>()) {
            let tray = Tray {
                remaining_length: remaining,
                total_length: 0,
                ..Tray::default()
            };
            prop_assert_eq!(tray.remaining_percent(), 0);
        }

        #[test]
        fn prop_remaining_percent_within_bounds(total in 1i64..1_000_000, frac in 0.0f64..=1.0) {
            let remaining = (total as f64 * frac) as i64;
            let tray = Tray {
                remaining_length: remaining,
                total_length: total,
                ..Tray::default()
            };
            let percent = tray.remaining_percent();
            prop_assert!((0..=100).contains(&percent));
        }

        #[test]
        fn prop_decode_never_panics(data in proptest::collection::vec(any::<u8>(), 0..256)) {
            let _ = Report::from_slice(&data);
        }
    }
}
