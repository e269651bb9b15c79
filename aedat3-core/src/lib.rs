//! AEDAT 3.1 decoder library for Dynap-se neuromorphic processors.
//!
//! This crate provides a streaming decoder for the AEDAT 3.1 file format
//! written by cAER. It supports decoding polarity/AER spike events and
//! special (control/marker) events; packets of any other event type are
//! passed through undecoded so the stream stays readable.
//!
//! # Example
//!
//! ```no_run
//! use aedat3_core::decoder;
//!
//! let result = decoder::decode_file("recording.aedat").unwrap();
//!
//! println!("Decoded {} spike events", result.polarity_events.len());
//! println!("Decoded {} special events", result.special_events.len());
//! ```
//!
//! For streaming use, [`decoder::PacketReader`] yields one decoded packet
//! at a time from any buffered byte source:
//!
//! ```no_run
//! use aedat3_core::decoder::PacketReader;
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! let file = File::open("recording.aedat").unwrap();
//! let mut reader = PacketReader::new(BufReader::new(file));
//! reader.skip_header().unwrap();
//! while let Some(_packet) = reader.next_packet().unwrap() {
//!     // aggregate, filter, render...
//! }
//! ```
//!
//! # Features
//!
//! - Lazy packet-by-packet decoding with clean end-of-stream detection
//! - Self-adapting event stride taken from each packet header
//! - Forward-compatible handling of unknown packet types
//! - Multiple output formats (CSV with custom field order, binary)

pub mod decoder;
pub mod output;
pub mod parser;
pub mod types;

// Re-export commonly used types
pub use decoder::{decode_file, DecodeError, PacketReader};
pub use output::{FieldOrder, OutputError};
pub use types::{
    DecodeResult, Packet, PacketHeader, PolarityEvent, SpecialEvent, SpecialKind,
};
