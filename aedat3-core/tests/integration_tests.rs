//! Integration tests for the AEDAT 3.1 decoder using synthesized files.
//!
//! Each test writes a complete file (text header plus binary packets) to a
//! temporary path and decodes it through the public API.

use aedat3_core::{decoder, output, DecodeError, FieldOrder, Packet, PacketReader};
use std::io::Write;
use tempfile::NamedTempFile;

const FILE_HEADER: &[u8] =
    b"#!AER-DAT3.1\r\n#Format: RAW\r\n#Source 1: Dynap-se\r\n#Start-Time: 2016-11-20 10:40:45\r\n#!END-HEADER\r\n";

/// Builds the 28-byte header plus body for one packet.
fn packet_bytes(event_type: u16, event_size: u32, event_capacity: u32, body: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(28 + body.len());
    bytes.extend_from_slice(&event_type.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes()); // event_source
    bytes.extend_from_slice(&event_size.to_le_bytes());
    bytes.extend_from_slice(&4u32.to_le_bytes()); // event_offset
    bytes.extend_from_slice(&0u32.to_le_bytes()); // event_ts_overflow
    bytes.extend_from_slice(&event_capacity.to_le_bytes());
    bytes.extend_from_slice(&event_capacity.to_le_bytes()); // event_number
    bytes.extend_from_slice(&event_capacity.to_le_bytes()); // event_valid
    bytes.extend_from_slice(body);
    bytes
}

/// One 8-byte event record: data word then timestamp, both little-endian.
fn record(data: u32, timestamp: u32) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(8);
    bytes.extend_from_slice(&data.to_le_bytes());
    bytes.extend_from_slice(&timestamp.to_le_bytes());
    bytes
}

/// AER data word for a spike from the given address.
fn aer_data(core_id: u32, chip_id: u32, neuron_id: u32) -> u32 {
    (neuron_id << 12) | (chip_id << 6) | (core_id << 1)
}

/// Writes a synthetic .aedat file and returns its handle.
fn write_aedat_file(packets: &[Vec<u8>]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(FILE_HEADER).unwrap();
    for packet in packets {
        file.write_all(packet).unwrap();
    }
    file.flush().unwrap();
    file
}

#[test]
fn test_decode_synthetic_file() {
    let mut spike_body = Vec::new();
    for i in 0..100u32 {
        spike_body.extend_from_slice(&record(aer_data(i % 4, 4, i), 1000 + i));
    }
    let mut special_body = record(14, 5); // type (14 >> 1) & 0x7F = 7
    special_body.extend_from_slice(&record(0, 16_777_216)); // timestamp wrap

    let file = write_aedat_file(&[
        packet_bytes(0, 8, 2, &special_body),
        packet_bytes(12, 8, 100, &spike_body),
    ]);

    let result = decoder::decode_file(file.path()).expect("Failed to decode file");

    assert_eq!(result.special_events.len(), 2);
    assert_eq!(result.special_events[0].special_type, 7);
    assert_eq!(result.special_events[0].timestamp, 5);
    assert_eq!(result.special_events[1].special_type, 0);

    assert_eq!(result.polarity_events.len(), 100);
    assert_eq!(result.unrecognized_packets, 0);

    let event = &result.polarity_events[37];
    assert_eq!(event.core_id, 1);
    assert_eq!(event.chip_id, 4);
    assert_eq!(event.neuron_id, 37);
    assert_eq!(event.timestamp, 1037);
}

#[test]
fn test_unrecognized_packets_are_skipped_not_fatal() {
    let file = write_aedat_file(&[
        packet_bytes(2, 8, 4, &[0u8; 32]),  // frame packet, not handled
        packet_bytes(12, 8, 1, &record(aer_data(0, 1, 0), 100)),
        packet_bytes(99, 16, 2, &[0u8; 32]), // type from a future format
        packet_bytes(7, 0, 9, &[]), // zero event size, unknown type: empty body
        packet_bytes(0, 8, 1, &record(14, 5)),
    ]);

    let result = decoder::decode_file(file.path()).expect("Failed to decode file");
    assert_eq!(result.unrecognized_packets, 3);
    assert_eq!(result.polarity_events.len(), 1);
    assert_eq!(result.special_events.len(), 1);
}

#[test]
fn test_wide_records_keep_packet_boundaries() {
    // 16-byte records: the decoder must consume the full declared body of
    // every packet so the next header is read at the right offset.
    let mut body = Vec::new();
    for i in 0..8u32 {
        body.extend_from_slice(&record(aer_data(2, 4, i), 500 + i));
        body.extend_from_slice(&[0u8; 8]); // record padding
    }

    let file = write_aedat_file(&[
        packet_bytes(12, 16, 8, &body.clone()),
        packet_bytes(12, 16, 8, &body),
    ]);

    let result = decoder::decode_file(file.path()).expect("Failed to decode file");
    assert_eq!(result.polarity_events.len(), 16);
    assert!(result
        .polarity_events
        .iter()
        .all(|e| e.core_id == 2 && e.chip_id == 4));
}

#[test]
fn test_truncated_file_reports_error() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(FILE_HEADER).unwrap();
    let packet = packet_bytes(12, 8, 4, &record(aer_data(0, 1, 0), 100));
    // Write the header and only one of the four declared records.
    file.write_all(&packet[..28 + 8]).unwrap();
    file.flush().unwrap();

    match decoder::decode_file(file.path()) {
        Err(DecodeError::TruncatedBody {
            expected: 32,
            got: 8,
        }) => {}
        other => panic!("expected truncated body, got {:?}", other),
    }
}

#[test]
fn test_streaming_matches_whole_file_decode() {
    let mut packets = Vec::new();
    for chunk in 0..5u32 {
        let mut body = Vec::new();
        for i in 0..20u32 {
            body.extend_from_slice(&record(aer_data(chunk % 4, 4, i), chunk * 1000 + i));
        }
        packets.push(packet_bytes(12, 8, 20, &body));
    }
    let file = write_aedat_file(&packets);

    let result = decoder::decode_file(file.path()).unwrap();

    let reopened = std::fs::File::open(file.path()).unwrap();
    let mut reader = PacketReader::new(std::io::BufReader::new(reopened));
    reader.skip_header().unwrap();
    let mut streamed = Vec::new();
    for packet in &mut reader {
        match packet.unwrap() {
            Packet::PolarityEvents(events) => streamed.extend(events),
            other => panic!("unexpected packet {:?}", other),
        }
    }

    assert_eq!(streamed, result.polarity_events);
    assert_eq!(streamed.len(), 100);
}

#[test]
fn test_csv_output() {
    let file = write_aedat_file(&[packet_bytes(
        12,
        8,
        2,
        &[record(aer_data(1, 4, 42), 777), record(aer_data(3, 4, 7), 778)].concat(),
    )]);
    let result = decoder::decode_file(file.path()).unwrap();

    let csv_path = std::env::temp_dir().join("aedat3_test_output.csv");
    output::write_csv(&csv_path, &result.polarity_events, FieldOrder::CHNT).unwrap();

    let contents = std::fs::read_to_string(&csv_path).unwrap();
    assert!(contents.starts_with("#core,chip,neuron,timestamp"));
    assert!(contents.contains("1,4,42,777"));
    assert!(contents.contains("3,4,7,778"));

    std::fs::remove_file(&csv_path).ok();
}

#[test]
fn test_binary_output() {
    let file = write_aedat_file(&[packet_bytes(
        12,
        8,
        1,
        &record(aer_data(2, 4, 99), 4242),
    )]);
    let result = decoder::decode_file(file.path()).unwrap();

    let bin_path = std::env::temp_dir().join("aedat3_test_output.bin");
    output::write_binary(&bin_path, &result.polarity_events).unwrap();

    let data = std::fs::read(&bin_path).unwrap();
    assert_eq!(&data[0..8], b"AED3BIN\0");

    let version = u32::from_le_bytes(data[8..12].try_into().unwrap());
    assert_eq!(version, 1);

    let count = u64::from_le_bytes(data[12..20].try_into().unwrap());
    assert_eq!(count, 1);

    assert_eq!(data[20], 2); // core_id
    assert_eq!(data[21], 4); // chip_id
    let neuron = u32::from_le_bytes(data[24..28].try_into().unwrap());
    assert_eq!(neuron, 99);
    let timestamp = u32::from_le_bytes(data[28..32].try_into().unwrap());
    assert_eq!(timestamp, 4242);

    std::fs::remove_file(&bin_path).ok();
}

#[test]
fn test_file_without_packets() {
    let file = write_aedat_file(&[]);
    let result = decoder::decode_file(file.path()).expect("Failed to decode file");
    assert!(result.polarity_events.is_empty());
    assert!(result.special_events.is_empty());
    assert_eq!(result.unrecognized_packets, 0);
}
