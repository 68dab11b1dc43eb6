//! Integration tests for bambu-core
//!
//! Tests that need a real printer are ignored by default. Run them with:
//! `BAMBU_HOST=192.168.1.50 BAMBU_ACCESS_CODE=12345678 cargo test --package bambu-core -- --ignored --nocapture`

use std::env;
use std::time::{Duration, Instant};

use bambu_core::{
    ConnectionConfig, ConnectionState, Error, FieldChange, MockPrinter, Printer, PrinterDevice,
    PrinterEvent, PrinterField, PrinterState,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

const FIXTURE: &[u8] = include_bytes!("../../bambu-types/tests/fixtures/push_status.json");

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn field_changes(rx: &mut bambu_core::EventReceiver) -> Vec<FieldChange> {
    let mut changes = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let PrinterEvent::FieldChanged { change, .. } = event {
            changes.push(change);
        }
    }
    changes
}

/// Accepts TCP connections and never writes to them.
async fn silent_listener() -> (u16, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    (port, handle)
}

#[tokio::test]
async fn test_defaults_then_single_bed_temperature_change() {
    let printer = MockPrinter::new("192.168.1.50");
    let snapshot = printer.snapshot();
    assert_eq!(snapshot.bed_temperature, 0.0);
    assert_eq!(snapshot.progress, 0);
    assert_eq!(snapshot.state, PrinterState::Idle);

    let mut rx = printer.subscribe();
    printer
        .feed_json(br#"{"print": {"command": "push_status", "bed_temper": 35.5}}"#)
        .unwrap();

    assert_eq!(
        field_changes(&mut rx),
        vec![FieldChange::BedTemperature { value: 35.5 }]
    );
    assert_eq!(printer.snapshot().bed_temperature, 35.5);
}

#[tokio::test]
async fn test_fixture_through_facade() {
    let printer = MockPrinter::new("192.168.1.50");
    let mut rx = printer.subscribe();
    printer.feed_json(FIXTURE).unwrap();

    let snapshot = printer.snapshot();
    assert_eq!(snapshot.state, PrinterState::Finished);
    assert_eq!(snapshot.progress, 100);
    assert_eq!(snapshot.current_layer, 63);
    assert_eq!(snapshot.total_layers, 63);
    assert_eq!(snapshot.ams_units.len(), 1);
    assert_eq!(snapshot.ams_units[0].trays.len(), 4);

    let fields: Vec<PrinterField> = field_changes(&mut rx).iter().map(|c| c.field()).collect();
    assert!(fields.contains(&PrinterField::State));
    assert!(fields.contains(&PrinterField::Progress));
    assert!(fields.contains(&PrinterField::AmsUnits));

    // Re-applying the same report changes nothing.
    assert_eq!(printer.feed_json(FIXTURE).unwrap(), 0);
    assert!(field_changes(&mut rx).is_empty());

    let report = printer.latest_report().unwrap();
    assert!(report.is_complete());
}

#[tokio::test]
async fn test_connect_timeout_against_silent_listener() {
    init_tracing();
    let (port, server) = silent_listener().await;
    let printer = Printer::with_config(
        "127.0.0.1",
        "12345678",
        ConnectionConfig::default().port(port),
    );

    let started = Instant::now();
    let result = printer.connect(Duration::from_secs(2)).await;
    let elapsed = started.elapsed();

    assert!(matches!(result, Err(Error::Timeout { .. })), "got {result:?}");
    assert!(elapsed >= Duration::from_secs(2));
    assert!(elapsed < Duration::from_secs(5), "took {elapsed:?}");
    assert_eq!(printer.connection_state(), ConnectionState::Disconnected);

    printer.dispose().await.unwrap();
    server.abort();
}

#[tokio::test]
async fn test_connect_cancelled() {
    init_tracing();
    let (port, server) = silent_listener().await;
    let printer = Printer::with_config(
        "127.0.0.1",
        "12345678",
        ConnectionConfig::default().port(port),
    );

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let result = printer
        .connect_with_cancel(Duration::from_secs(30), cancel)
        .await;

    assert!(matches!(result, Err(Error::Cancelled)), "got {result:?}");
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(printer.connection_state(), ConnectionState::Disconnected);
    server.abort();
}

#[tokio::test]
async fn test_connection_state_events() {
    let (port, server) = silent_listener().await;
    let printer = Printer::with_config(
        "127.0.0.1",
        "12345678",
        ConnectionConfig::default().port(port),
    );
    let mut rx = printer.subscribe();

    let _ = printer.connect(Duration::from_millis(300)).await;

    let mut states = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let PrinterEvent::ConnectionStateChanged { state, .. } = event {
            states.push(state);
        }
    }
    assert_eq!(
        states,
        vec![ConnectionState::Connecting, ConnectionState::Disconnected]
    );
    server.abort();
}

#[tokio::test]
async fn test_list_files_timeout() {
    let (port, server) = silent_listener().await;
    let printer = Printer::with_config(
        "127.0.0.1",
        "12345678",
        ConnectionConfig::default().ftps_port(port),
    );

    let result = printer.list_files(Duration::from_millis(500)).await;
    match result {
        Err(Error::Timeout { operation, .. }) => assert_eq!(operation, "list_files"),
        other => panic!("expected timeout, got {other:?}"),
    }
    server.abort();
}

// ==================== Hardware tests ====================

fn printer_from_env() -> Printer {
    let host = env::var("BAMBU_HOST").expect("BAMBU_HOST must be set");
    let code = env::var("BAMBU_ACCESS_CODE").expect("BAMBU_ACCESS_CODE must be set");
    let mut config = ConnectionConfig::default();
    if let Ok(serial) = env::var("BAMBU_SERIAL") {
        config = config.serial(serial);
    }
    Printer::with_config(host, code, config)
}

#[tokio::test]
#[ignore = "requires a printer on the local network"]
async fn test_connect_and_read() {
    init_tracing();
    let printer = printer_from_env();

    printer.connect(Duration::from_secs(15)).await.unwrap();
    assert!(printer.is_connected());

    let report = printer.latest_report().expect("first report");
    println!("State: {:?} ({})", report.printer_state(), report.gcode_state());
    println!("Bed: {:.1}°C", printer.bed_temperature());
    println!("Nozzle: {:.1}°C", printer.nozzle_temperature());
    println!("Progress: {}%", printer.progress());

    printer.disconnect().await.unwrap();
    assert_eq!(printer.connection_state(), ConnectionState::Disconnected);
}

#[tokio::test]
#[ignore = "requires a printer on the local network"]
async fn test_list_files_on_printer() {
    let printer = printer_from_env();
    let files = printer.list_files(Duration::from_secs(20)).await.unwrap();
    for file in &files {
        println!("{} ({} bytes)", file.path, file.size);
    }
}
