//! Printer event system for field-change and connection notifications.
//!
//! A [`Printer`](crate::Printer) publishes one [`PrinterEvent::FieldChanged`]
//! for every observable field whose value differs after a report is applied.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use bambu_types::{AmsUnit, Extruder, PrinterState};

use crate::connection::ConnectionState;

/// Identifies one observable field of a printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum PrinterField {
    BedTemperature,
    NozzleTemperature,
    Progress,
    CurrentFile,
    State,
    CurrentLayer,
    TotalLayers,
    RemainingMinutes,
    AmsUnits,
    Extruder,
}

/// The new value of a field that changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", rename_all = "snake_case")]
#[non_exhaustive]
pub enum FieldChange {
    BedTemperature { value: f64 },
    NozzleTemperature { value: f64 },
    Progress { value: i32 },
    CurrentFile { value: String },
    State { value: PrinterState },
    CurrentLayer { value: i32 },
    TotalLayers { value: i32 },
    RemainingMinutes { value: i32 },
    AmsUnits { value: Vec<AmsUnit> },
    Extruder { value: Option<Extruder> },
}

impl FieldChange {
    /// Which field this change belongs to.
    pub fn field(&self) -> PrinterField {
        match self {
            FieldChange::BedTemperature { .. } => PrinterField::BedTemperature,
            FieldChange::NozzleTemperature { .. } => PrinterField::NozzleTemperature,
            FieldChange::Progress { .. } => PrinterField::Progress,
            FieldChange::CurrentFile { .. } => PrinterField::CurrentFile,
            FieldChange::State { .. } => PrinterField::State,
            FieldChange::CurrentLayer { .. } => PrinterField::CurrentLayer,
            FieldChange::TotalLayers { .. } => PrinterField::TotalLayers,
            FieldChange::RemainingMinutes { .. } => PrinterField::RemainingMinutes,
            FieldChange::AmsUnits { .. } => PrinterField::AmsUnits,
            FieldChange::Extruder { .. } => PrinterField::Extruder,
        }
    }
}

/// Events that can be emitted by printers.
///
/// All events are serializable for logging and IPC.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new event types
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum PrinterEvent {
    /// An observable field took a new value.
    FieldChanged { host: String, change: FieldChange },
    /// The MQTT session moved to a new state.
    ConnectionStateChanged {
        host: String,
        state: ConnectionState,
    },
    /// A report was applied; emitted after its field changes.
    ReportApplied {
        host: String,
        sequence_id: String,
        changed: usize,
    },
}

impl PrinterEvent {
    /// Host of the printer that emitted the event.
    pub fn host(&self) -> &str {
        match self {
            PrinterEvent::FieldChanged { host, .. }
            | PrinterEvent::ConnectionStateChanged { host, .. }
            | PrinterEvent::ReportApplied { host, .. } => host,
        }
    }
}

/// Sender for printer events.
pub type EventSender = broadcast::Sender<PrinterEvent>;

/// Receiver for printer events.
pub type EventReceiver = broadcast::Receiver<PrinterEvent>;

/// Event dispatcher for sending events to multiple receivers.
#[derive(Debug, Clone)]
pub struct EventDispatcher {
    sender: EventSender,
}

impl EventDispatcher {
    /// Create a new event dispatcher.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    /// Send an event.
    pub fn send(&self, event: PrinterEvent) {
        // Ignore error if no receivers
        let _ = self.sender.send(event);
    }

    /// Get the number of active receivers.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = PrinterEvent::FieldChanged {
            host: "192.168.1.50".to_string(),
            change: FieldChange::BedTemperature { value: 60.0 },
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"field_changed\""));
        assert!(json.contains("\"field\":\"bed_temperature\""));

        let back: PrinterEvent = serde_json::from_str(&json).unwrap();
        match back {
            PrinterEvent::FieldChanged { change, .. } => {
                assert_eq!(change, FieldChange::BedTemperature { value: 60.0 });
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_field_change_field() {
        let change = FieldChange::CurrentFile {
            value: "plate_1.gcode".into(),
        };
        assert_eq!(change.field(), PrinterField::CurrentFile);
        assert_eq!(
            FieldChange::Extruder { value: None }.field(),
            PrinterField::Extruder
        );
    }

    #[test]
    fn test_dispatcher_subscribe_and_drop() {
        let dispatcher = EventDispatcher::new(8);
        assert_eq!(dispatcher.receiver_count(), 0);

        let mut rx = dispatcher.subscribe();
        assert_eq!(dispatcher.receiver_count(), 1);

        dispatcher.send(PrinterEvent::ConnectionStateChanged {
            host: "printer".into(),
            state: ConnectionState::Connecting,
        });
        let event = rx.try_recv().unwrap();
        assert_eq!(event.host(), "printer");

        drop(rx);
        assert_eq!(dispatcher.receiver_count(), 0);
        // Sending with no receivers is fine.
        dispatcher.send(PrinterEvent::ReportApplied {
            host: "printer".into(),
            sequence_id: "1".into(),
            changed: 0,
        });
    }
}
