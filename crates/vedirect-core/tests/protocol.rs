use pretty_assertions::assert_eq;
use std::time::{Duration, Instant};
use vedirect_core::config::ReaderConfig;
use vedirect_core::protocol::{FieldId, MemoryChannel, ProtocolReader, ReadError};

fn test_config() -> ReaderConfig {
    ReaderConfig {
        timeout_ms: 100,
        settle_delay_ms: 0,
        ..Default::default()
    }
}

fn reader_for(lines: &[&str]) -> ProtocolReader<MemoryChannel> {
    ProtocolReader::new(MemoryChannel::from_lines(lines), test_config())
}

/// A frame the way a BMV-712 sends it, one field per line
const BMV_FRAME: &[&str] = &[
    "PID\t0xA381",
    "V\t13250",
    "I\t-1520",
    "P\t-20",
    "CE\t-12400",
    "SOC\t938",
    "TTG\t2820",
    "Alarm\tOFF",
    "PPV\t215",
];

#[test]
fn test_every_field_from_single_line() {
    let cases = [
        (FieldId::StateOfCharge, "SOC\t42", 42),
        (FieldId::BatteryVoltage, "V\t12950", 12950),
        (FieldId::BatteryPower, "P\t-75", -75),
        (FieldId::PvPower, "PPV\t310", 310),
        (FieldId::BatteryCurrent, "I\t-2600", -2600),
        (FieldId::Alarm, "Alarm\tON", 1),
    ];

    for (field, line, expected) in cases {
        let ch = MemoryChannel::new(format!("{}\r\nTRAILING\t1\r\n", line).into_bytes());
        let mut reader = ProtocolReader::new(ch, test_config());
        assert_eq!(reader.read_field(field).unwrap(), expected, "field {}", field);
        // Nothing past the matching newline was consumed
        assert_eq!(reader.transport().remaining(), b"TRAILING\t1\r\n");
    }
}

#[test]
fn test_scenario_voltage_and_alarm() {
    let lines = ["SOC\t42", "V\t12950", "Alarm\tOFF"];

    let mut reader = reader_for(&lines);
    assert_eq!(reader.read_field(FieldId::BatteryVoltage).unwrap(), 12950);

    let mut reader = reader_for(&lines);
    assert_eq!(reader.read_field(FieldId::Alarm).unwrap(), 0);
}

#[test]
fn test_discards_exactly_n_lines() {
    let mut reader = reader_for(BMV_FRAME);
    assert_eq!(reader.read_field(FieldId::StateOfCharge).unwrap(), 938);
    assert_eq!(reader.last_scan().lines_discarded, 5);

    // A budget of six reaches the sixth line, five gives up just before it
    let config = ReaderConfig {
        max_read_lines: 6,
        ..test_config()
    };
    let mut reader = ProtocolReader::new(MemoryChannel::from_lines(BMV_FRAME), config);
    assert_eq!(reader.read_field(FieldId::StateOfCharge).unwrap(), 938);

    let config = ReaderConfig {
        max_read_lines: 5,
        ..test_config()
    };
    let mut reader = ProtocolReader::new(MemoryChannel::from_lines(BMV_FRAME), config);
    assert!(matches!(
        reader.read_field(FieldId::StateOfCharge),
        Err(ReadError::NotFound { label: "SOC", lines: 5 })
    ));
}

#[test]
fn test_first_match_wins() {
    let mut reader = reader_for(&["V\t12000", "I\t0", "V\t13000"]);
    assert_eq!(reader.read_field(FieldId::BatteryVoltage).unwrap(), 12000);
    assert_eq!(reader.read_field(FieldId::BatteryVoltage).unwrap(), 13000);
}

#[test]
fn test_not_found_only_after_full_line_budget() {
    // Live device repeating a frame that lacks PPV
    let frame = b"V\t12800\r\nI\t150\r\nSOC\t700\r\n".to_vec();
    let frame_len = frame.len();
    let config = ReaderConfig {
        max_read_lines: 12,
        ..test_config()
    };
    let mut reader = ProtocolReader::new(MemoryChannel::looping(frame), config);

    let err = reader.read_field(FieldId::PvPower).unwrap_err();
    assert!(matches!(err, ReadError::NotFound { label: "PPV", lines: 12 }));

    let stats = reader.last_scan();
    assert_eq!(stats.lines_discarded, 12);
    // Three lines per frame, so twelve lines are exactly four frames
    assert_eq!(reader.transport().consumed(), frame_len * 4);
}

#[test]
fn test_finite_stream_without_label_times_out() {
    let mut reader = reader_for(&["V\t12800", "I\t150"]);
    let err = reader.read_field(FieldId::PvPower).unwrap_err();
    assert!(matches!(err, ReadError::Timeout { .. }));
    assert_eq!(reader.last_scan().lines_discarded, 2);
}

#[test]
fn test_silent_stream_times_out_on_schedule() {
    let config = ReaderConfig {
        timeout_ms: 80,
        ..test_config()
    };
    let mut reader = ProtocolReader::new(MemoryChannel::new(Vec::new()), config);

    let start = Instant::now();
    let err = reader.read_field(FieldId::BatteryVoltage).unwrap_err();
    let elapsed = start.elapsed();

    match err {
        ReadError::Timeout { elapsed_ms } => assert!(elapsed_ms >= 80),
        other => panic!("expected timeout, got {:?}", other),
    }
    assert!(elapsed >= Duration::from_millis(80));
    assert!(elapsed < Duration::from_millis(1000), "took {:?}", elapsed);
}

#[test]
fn test_overlong_line_overruns() {
    let long_line = format!("V\t{}", "9".repeat(38));
    assert_eq!(long_line.len(), 40);

    let mut reader = reader_for(&[long_line.as_str(), "V\t12950"]);
    let err = reader.read_field(FieldId::BatteryVoltage).unwrap_err();
    assert!(matches!(err, ReadError::BufferOverrun { capacity: 30 }));
    // Aborted on the 31st byte
    assert_eq!(reader.last_scan().bytes_read, 31);

    // The next call starts from a clean buffer and skips the overrun's tail
    assert_eq!(reader.read_field(FieldId::BatteryVoltage).unwrap(), 12950);
    assert_eq!(reader.last_scan().lines_discarded, 1);
}

#[test]
fn test_line_at_capacity_is_accepted() {
    let line = format!("V\t{}", "1".repeat(28));
    assert_eq!(line.len(), 30);
    let mut reader = reader_for(&[line.as_str()]);
    // Decodes as a number too large for i32
    assert!(matches!(
        reader.read_field(FieldId::BatteryVoltage),
        Err(ReadError::InvalidValue { field: FieldId::BatteryVoltage, .. })
    ));
}

#[test]
fn test_invalid_value() {
    let mut reader = reader_for(&["SOC\tabc"]);
    match reader.read_field(FieldId::StateOfCharge).unwrap_err() {
        ReadError::InvalidValue { field, value } => {
            assert_eq!(field, FieldId::StateOfCharge);
            assert_eq!(value, "abc");
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_label_without_value_is_invalid() {
    let mut reader = reader_for(&["Alarm"]);
    assert!(matches!(
        reader.read_field(FieldId::Alarm),
        Err(ReadError::InvalidValue { .. })
    ));
}

#[test]
fn test_labels_match_exactly() {
    // "VPV" and "V " must not satisfy a request for "V"
    let mut reader = reader_for(&["VPV\t18000", "V \t1", "v\t2", "V\t12600"]);
    assert_eq!(reader.read_field(FieldId::BatteryVoltage).unwrap(), 12600);
    assert_eq!(reader.last_scan().lines_discarded, 3);
}

#[test]
fn test_replay_gives_same_value() {
    let mut first = reader_for(BMV_FRAME);
    let mut second = reader_for(BMV_FRAME);
    assert_eq!(
        first.read_field(FieldId::BatteryCurrent).unwrap(),
        second.read_field(FieldId::BatteryCurrent).unwrap()
    );

    let mut ch = first.into_inner();
    ch.rewind();
    let mut again = ProtocolReader::new(ch, test_config());
    assert_eq!(again.read_field(FieldId::BatteryCurrent).unwrap(), -1520);
}

#[test]
fn test_frame_with_checksum_byte() {
    // Checksum value bytes are arbitrary, including tabs and newlines
    let mut data = b"\r\nPID\t0x203\r\nChecksum\t\n".to_vec();
    data.extend_from_slice(b"\r\nV\t12700\r\nChecksum\t\t");
    let mut reader = ProtocolReader::new(MemoryChannel::new(data), test_config());
    assert_eq!(reader.read_field(FieldId::BatteryVoltage).unwrap(), 12700);
}

#[test]
fn test_dump_collects_every_line() {
    let config = ReaderConfig {
        max_read_lines: 4,
        ..test_config()
    };
    let mut reader = ProtocolReader::new(MemoryChannel::from_lines(BMV_FRAME), config);

    let mut seen: Vec<String> = Vec::new();
    let mut sink = |line: &str| seen.push(line.to_string());
    let count = reader.dump(&mut sink).unwrap();

    assert_eq!(count, 4);
    assert_eq!(seen, vec!["PID\t0xA381", "V\t13250", "I\t-1520", "P\t-20"]);
}

#[test]
fn test_dump_times_out_when_stream_ends() {
    let mut reader = reader_for(&["V\t1"]);
    let mut seen = 0;
    let mut sink = |_: &str| seen += 1;
    assert!(matches!(
        reader.dump(&mut sink),
        Err(ReadError::Timeout { .. })
    ));
    assert_eq!(seen, 1);
}

#[test]
fn test_read_field_dump_ends_not_found() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let config = ReaderConfig {
        max_read_lines: 3,
        ..test_config()
    };
    let mut reader = ProtocolReader::new(MemoryChannel::looping(b"V\t1\r\n".to_vec()), config);
    assert!(matches!(
        reader.read_field(FieldId::Dump),
        Err(ReadError::NotFound { label: "Dump", lines: 3 })
    ));
}

#[test]
fn test_error_classification() {
    assert!(ReadError::Timeout { elapsed_ms: 1 }.is_transient());
    assert!(!ReadError::NotConnected.is_transient());
    assert!(!ReadError::Timeout { elapsed_ms: 5001 }.to_string().is_empty());
}
