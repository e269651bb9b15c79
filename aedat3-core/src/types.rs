//! Core types for AEDAT 3.1 event data.
//!
//! This module defines the packet header, the decoded event structures and
//! the packet sum type produced by the streaming decoder.

/// Size of the fixed packet header preceding every packet body, in bytes.
pub const PACKET_HEADER_SIZE: usize = 28;

/// Event type code of "special" (control/marker) packets.
pub const SPECIAL_PACKET: u16 = 0;

/// Event type code of polarity/AER spike packets produced by Dynap-se.
pub const POLARITY_PACKET: u16 = 12;

/// A decoded special (control/marker) event.
///
/// Special events are non-spike events emitted by cAER, such as timestamp
/// wrap markers or external input edges, distinguished by a 7-bit type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct SpecialEvent {
    /// 7-bit special event type code
    pub special_type: u8,
    /// Timestamp in microseconds
    pub timestamp: u32,
}

impl SpecialEvent {
    /// Creates a new special event.
    #[inline]
    pub fn new(special_type: u8, timestamp: u32) -> Self {
        Self {
            special_type,
            timestamp,
        }
    }

    /// Returns the known special event kind, if the type code is one cAER
    /// defines.
    #[inline]
    pub fn kind(&self) -> Option<SpecialKind> {
        SpecialKind::from_u8(self.special_type)
    }
}

/// A decoded polarity/AER spike event.
///
/// Each spike carries the bit-packed address of the neuron that fired:
/// its core (0-3 on Dynap-se), the chip on the board, and the neuron index
/// within the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct PolarityEvent {
    /// 5-bit core ID within the chip
    pub core_id: u8,
    /// 6-bit chip ID on the board
    pub chip_id: u8,
    /// 20-bit neuron ID within the core
    pub neuron_id: u32,
    /// Timestamp in microseconds
    pub timestamp: u32,
}

impl PolarityEvent {
    /// Creates a new polarity event.
    #[inline]
    pub fn new(core_id: u8, chip_id: u8, neuron_id: u32, timestamp: u32) -> Self {
        Self {
            core_id,
            chip_id,
            neuron_id,
            timestamp,
        }
    }
}

/// Known special event type codes.
///
/// These follow the cAER/libcaer numbering. The decoder itself never
/// interprets the code; this enum exists so consumers can recognize the
/// common markers without memorizing magic numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SpecialKind {
    /// 32-bit timestamp counter wrapped around (0)
    TimestampWrap = 0,
    /// Timestamp counter was reset to zero (1)
    TimestampReset = 1,
    /// Rising edge on the external input (2)
    ExternalInputRisingEdge = 2,
    /// Falling edge on the external input (3)
    ExternalInputFallingEdge = 3,
    /// Pulse on the external input (4)
    ExternalInputPulse = 4,
    /// Rising edge on external input 1 (6)
    ExternalInput1RisingEdge = 6,
    /// Falling edge on external input 1 (7)
    ExternalInput1FallingEdge = 7,
    /// Pulse on external input 1 (8)
    ExternalInput1Pulse = 8,
    /// Rising edge on external input 2 (9)
    ExternalInput2RisingEdge = 9,
    /// Falling edge on external input 2 (10)
    ExternalInput2FallingEdge = 10,
    /// Pulse on external input 2 (11)
    ExternalInput2Pulse = 11,
}

impl SpecialKind {
    /// Attempts to parse a special kind from a 7-bit type code.
    #[inline]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::TimestampWrap),
            1 => Some(Self::TimestampReset),
            2 => Some(Self::ExternalInputRisingEdge),
            3 => Some(Self::ExternalInputFallingEdge),
            4 => Some(Self::ExternalInputPulse),
            6 => Some(Self::ExternalInput1RisingEdge),
            7 => Some(Self::ExternalInput1FallingEdge),
            8 => Some(Self::ExternalInput1Pulse),
            9 => Some(Self::ExternalInput2RisingEdge),
            10 => Some(Self::ExternalInput2FallingEdge),
            11 => Some(Self::ExternalInput2Pulse),
            _ => None,
        }
    }
}

/// The 28-byte header preceding every packet in the stream.
///
/// All fields are little-endian. `event_capacity * event_size` bytes of
/// body follow the header; `event_number` of those slots actually hold
/// events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    /// Event type code (0 = special, 12 = polarity/AER)
    pub event_type: u16,
    /// Source module ID within cAER
    pub event_source: u16,
    /// Size of one event record in bytes
    pub event_size: u32,
    /// Byte offset of the timestamp field within a record
    pub event_offset: u32,
    /// Timestamp overflow counter at capture time
    pub event_ts_overflow: u32,
    /// Maximum number of events the packet can hold
    pub event_capacity: u32,
    /// Number of events actually present
    pub event_number: u32,
    /// Number of valid events
    pub event_valid: u32,
}

impl PacketHeader {
    /// Returns the length of the packet body in bytes.
    ///
    /// Computed in u64 so a hostile header cannot wrap the product.
    #[inline]
    pub fn body_length(&self) -> u64 {
        self.event_capacity as u64 * self.event_size as u64
    }
}

/// One decoded packet from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// A packet of special (control/marker) events
    SpecialEvents(Vec<SpecialEvent>),
    /// A packet of polarity/AER spike events
    PolarityEvents(Vec<PolarityEvent>),
    /// A packet of an event type this decoder does not handle.
    ///
    /// The format is forward-extensible; unknown packet types are passed
    /// through with their raw body so the stream can continue.
    Unrecognized {
        /// Declared event type code
        event_type: u16,
        /// Raw packet body
        body: Vec<u8>,
    },
}

/// Result of decoding a whole AEDAT 3.1 file.
#[derive(Debug, Default)]
pub struct DecodeResult {
    /// Decoded polarity/AER spike events
    pub polarity_events: Vec<PolarityEvent>,
    /// Decoded special events
    pub special_events: Vec<SpecialEvent>,
    /// Number of packets skipped because their event type is not handled
    pub unrecognized_packets: u64,
}
