//! Streaming AEDAT 3.1 packet decoder.
//!
//! This module implements the packet-level scan of an AEDAT 3.1 stream:
//! skip the textual comment header once, then repeatedly read one 28-byte
//! packet header and the body it declares, decoding the body into typed
//! events according to the declared event type.

use crate::parser;
use crate::types::{
    DecodeResult, Packet, PacketHeader, PolarityEvent, SpecialEvent, PACKET_HEADER_SIZE,
    POLARITY_PACKET, SPECIAL_PACKET,
};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during AEDAT 3.1 decoding.
///
/// End of stream is not an error; [`PacketReader::next_packet`] signals it
/// by returning `Ok(None)`.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("truncated packet header: expected 28 bytes, got {got}")]
    TruncatedHeader { got: usize },

    #[error("truncated packet body: expected {expected} bytes, got {got}")]
    TruncatedBody { expected: u64, got: u64 },

    #[error("event size is zero but the packet declares {capacity} events")]
    InvalidEventSize { capacity: u32 },
}

/// Comment line that terminates the textual file header.
pub const END_OF_HEADER: &str = "#!END-HEADER";

/// Upper bound on the body bytes preallocated from a packet header, so a
/// corrupt header cannot trigger a giant allocation before the read fails.
const BODY_PREALLOC_LIMIT: u64 = 1 << 20;

/// Decodes a packet body of special events, walking it in `event_size`-byte
/// strides.
///
/// Each stride holds two little-endian 32-bit words: the special data word
/// and the timestamp. A trailing stride too short to hold both words is
/// silently dropped, matching cAER packet padding. A zero `event_size`
/// produces no events; [`PacketReader`] rejects such headers before this
/// point when they declare a nonzero capacity.
pub fn decode_special_events(body: &[u8], event_size: usize) -> Vec<SpecialEvent> {
    // A zero stride walks nothing and must not loop.
    if event_size == 0 {
        return Vec::new();
    }
    let mut events = Vec::with_capacity(body.len() / event_size);
    let mut offset = 0;
    while offset + event_size <= body.len() {
        if offset + 2 * parser::WORD_SIZE > body.len() {
            break;
        }
        let data = parser::read_word(body, offset);
        let timestamp = parser::read_word(body, offset + parser::WORD_SIZE);
        events.push(SpecialEvent::new(parser::special_get_type(data), timestamp));
        offset += event_size;
    }
    events
}

/// Decodes a packet body of polarity/AER spike events, walking it in
/// `event_size`-byte strides.
///
/// Same stride and zero-size policy as [`decode_special_events`]; the
/// first word carries the bit-packed core/chip/neuron address.
pub fn decode_polarity_events(body: &[u8], event_size: usize) -> Vec<PolarityEvent> {
    if event_size == 0 {
        return Vec::new();
    }
    let mut events = Vec::with_capacity(body.len() / event_size);
    let mut offset = 0;
    while offset + event_size <= body.len() {
        if offset + 2 * parser::WORD_SIZE > body.len() {
            break;
        }
        let data = parser::read_word(body, offset);
        let timestamp = parser::read_word(body, offset + parser::WORD_SIZE);
        events.push(PolarityEvent::new(
            parser::aer_get_core_id(data),
            parser::aer_get_chip_id(data),
            parser::aer_get_neuron_id(data),
            timestamp,
        ));
        offset += event_size;
    }
    events
}

/// Streaming reader over the packets of an AEDAT 3.1 byte source.
///
/// The source is read strictly forward. Each call to
/// [`next_packet`](Self::next_packet) consumes exactly one header and its
/// body and returns the freshly decoded packet; the reader holds no state
/// beyond the underlying source and a terminal flag.
#[derive(Debug)]
pub struct PacketReader<R> {
    reader: R,
    finished: bool,
}

impl<R: BufRead> PacketReader<R> {
    /// Creates a reader over a byte source positioned at the start of the
    /// file (or directly at a packet boundary if there is no text header).
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            finished: false,
        }
    }

    /// Skips the textual comment header.
    ///
    /// Consumes lines while they start with `#`, stopping after the
    /// `#!END-HEADER` line. A line that does not start with `#` terminates
    /// the header without being consumed, so malformed headers degrade to
    /// "no header" instead of eating packet bytes.
    pub fn skip_header(&mut self) -> Result<(), DecodeError> {
        loop {
            let peeked = self.reader.fill_buf()?;
            if peeked.is_empty() || peeked[0] != b'#' {
                break;
            }

            let mut line = String::new();
            self.reader.read_line(&mut line)?;

            if line.trim_end() == END_OF_HEADER {
                break;
            }
        }
        Ok(())
    }

    /// Reads and decodes the next packet.
    ///
    /// Returns `Ok(None)` at end of stream, which is only reached cleanly
    /// at a packet boundary. A partial header or body is reported as an
    /// error, after which the reader produces no further packets.
    pub fn next_packet(&mut self) -> Result<Option<Packet>, DecodeError> {
        if self.finished {
            return Ok(None);
        }

        let header = match self.read_header() {
            Ok(Some(header)) => header,
            Ok(None) => {
                self.finished = true;
                return Ok(None);
            }
            Err(error) => {
                self.finished = true;
                return Err(error);
            }
        };

        let result = self
            .read_body(&header)
            .and_then(|body| dispatch_packet(&header, body));
        match result {
            Ok(packet) => Ok(Some(packet)),
            Err(error) => {
                self.finished = true;
                Err(error)
            }
        }
    }

    /// Reads the fixed-size packet header, distinguishing clean end of
    /// stream (zero bytes) from a truncated header (1 to 27 bytes).
    fn read_header(&mut self) -> Result<Option<PacketHeader>, DecodeError> {
        let mut bytes = [0u8; PACKET_HEADER_SIZE];
        let mut filled = 0;
        while filled < PACKET_HEADER_SIZE {
            let read = self.reader.read(&mut bytes[filled..])?;
            if read == 0 {
                break;
            }
            filled += read;
        }

        match filled {
            0 => Ok(None),
            PACKET_HEADER_SIZE => Ok(Some(parser::parse_packet_header(&bytes))),
            got => Err(DecodeError::TruncatedHeader { got }),
        }
    }

    /// Reads exactly the body the header declares.
    fn read_body(&mut self, header: &PacketHeader) -> Result<Vec<u8>, DecodeError> {
        let expected = header.body_length();
        let mut body = Vec::with_capacity(expected.min(BODY_PREALLOC_LIMIT) as usize);
        let got = (&mut self.reader).take(expected).read_to_end(&mut body)? as u64;
        if got < expected {
            return Err(DecodeError::TruncatedBody { expected, got });
        }
        Ok(body)
    }
}

/// Decodes a packet body according to the header's declared event type.
///
/// Unknown event types are passed through as [`Packet::Unrecognized`]; the
/// format is forward-extensible and the stream must stay decodable past
/// packets this library does not understand. Only the two known types
/// stride over the body, so only they reject a zero event size: a header
/// that declares events that can never be walked has no meaningful
/// decoding. An unrecognized type with the same header passes through
/// with its (empty) body.
fn dispatch_packet(header: &PacketHeader, body: Vec<u8>) -> Result<Packet, DecodeError> {
    let event_size = header.event_size as usize;
    match header.event_type {
        SPECIAL_PACKET | POLARITY_PACKET if event_size == 0 && header.event_capacity != 0 => {
            Err(DecodeError::InvalidEventSize {
                capacity: header.event_capacity,
            })
        }
        SPECIAL_PACKET => Ok(Packet::SpecialEvents(decode_special_events(
            &body, event_size,
        ))),
        POLARITY_PACKET => Ok(Packet::PolarityEvents(decode_polarity_events(
            &body, event_size,
        ))),
        event_type => Ok(Packet::Unrecognized { event_type, body }),
    }
}

impl<R: BufRead> Iterator for PacketReader<R> {
    type Item = Result<Packet, DecodeError>;

    /// Yields packets until end of stream. The iterator is fused: after
    /// end of stream or an error, it keeps returning `None`.
    fn next(&mut self) -> Option<Self::Item> {
        match self.next_packet() {
            Ok(Some(packet)) => Some(Ok(packet)),
            Ok(None) => None,
            Err(error) => Some(Err(error)),
        }
    }
}

/// Decodes a whole AEDAT 3.1 file from disk.
///
/// Skips the text header, then drains the packet stream into aggregate
/// event vectors. Unrecognized packets are counted, not decoded.
pub fn decode_file<P: AsRef<Path>>(path: P) -> Result<DecodeResult, DecodeError> {
    let file = File::open(path.as_ref())?;
    let mut reader = PacketReader::new(BufReader::new(file));
    reader.skip_header()?;

    let mut result = DecodeResult::default();
    while let Some(packet) = reader.next_packet()? {
        match packet {
            Packet::SpecialEvents(events) => result.special_events.extend(events),
            Packet::PolarityEvents(events) => result.polarity_events.extend(events),
            Packet::Unrecognized { .. } => result.unrecognized_packets += 1,
        }
    }
    Ok(result)
}
