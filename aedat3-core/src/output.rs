//! Output format writers for decoded AEDAT 3.1 data.
//!
//! Supports CSV for human consumption and a packed binary format for
//! programmatic access.

use crate::types::{PolarityEvent, SpecialEvent};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during output writing.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Field ordering for spike CSV output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldOrder {
    /// core, chip, neuron, t (default)
    #[default]
    CHNT,
    /// t, core, chip, neuron
    TCHN,
    /// Custom order specified by indices
    Custom([usize; 4]),
}

impl std::str::FromStr for FieldOrder {
    type Err = OutputError;

    /// Parses a field order from a format string like "core,chip,neuron,t"
    /// or "t,core,chip,neuron".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<String> = s.split(',').map(|p| p.trim().to_lowercase()).collect();

        if parts.len() != 4 {
            return Err(OutputError::InvalidFormat(
                "Format must have exactly 4 fields: core, chip, neuron, t".to_string(),
            ));
        }

        // Map field names to indices: core=0, chip=1, neuron=2, t=3
        let mut indices = [0usize; 4];
        let mut used = [false; 4];

        for (i, part) in parts.iter().enumerate() {
            let field_idx = match part.as_str() {
                "c" | "core" => 0,
                "chip" => 1,
                "n" | "neuron" => 2,
                "t" | "time" | "timestamp" => 3,
                _ => {
                    return Err(OutputError::InvalidFormat(format!(
                        "Unknown field: {}. Use core, chip, neuron, t",
                        part
                    )))
                }
            };

            if used[field_idx] {
                return Err(OutputError::InvalidFormat(format!(
                    "Duplicate field: {}",
                    part
                )));
            }

            indices[i] = field_idx;
            used[field_idx] = true;
        }

        if indices == [0, 1, 2, 3] {
            Ok(Self::CHNT)
        } else if indices == [3, 0, 1, 2] {
            Ok(Self::TCHN)
        } else {
            Ok(Self::Custom(indices))
        }
    }
}

impl FieldOrder {
    /// Returns the column header string for this field order.
    pub fn header(&self) -> String {
        const NAMES: [&str; 4] = ["core", "chip", "neuron", "timestamp"];
        match self {
            Self::CHNT => NAMES.join(","),
            Self::TCHN => "timestamp,core,chip,neuron".to_string(),
            Self::Custom(indices) => indices
                .iter()
                .map(|&i| NAMES[i])
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

/// CSV output writer for spike events.
pub struct CsvWriter<W: Write> {
    writer: BufWriter<W>,
    field_order: FieldOrder,
}

impl<W: Write> CsvWriter<W> {
    /// Creates a new CSV writer.
    pub fn new(writer: W, field_order: FieldOrder) -> Self {
        Self {
            writer: BufWriter::new(writer),
            field_order,
        }
    }

    /// Writes a comment line naming the columns.
    pub fn write_header(&mut self) -> Result<(), OutputError> {
        writeln!(self.writer, "#{}", self.field_order.header())?;
        Ok(())
    }

    /// Writes a batch of spike events.
    pub fn write_events(&mut self, events: &[PolarityEvent]) -> Result<(), OutputError> {
        for event in events {
            self.write_event(event)?;
        }
        Ok(())
    }

    /// Writes a single spike event.
    #[inline]
    fn write_event(&mut self, event: &PolarityEvent) -> Result<(), OutputError> {
        match self.field_order {
            FieldOrder::CHNT => {
                writeln!(
                    self.writer,
                    "{},{},{},{}",
                    event.core_id, event.chip_id, event.neuron_id, event.timestamp
                )?;
            }
            FieldOrder::TCHN => {
                writeln!(
                    self.writer,
                    "{},{},{},{}",
                    event.timestamp, event.core_id, event.chip_id, event.neuron_id
                )?;
            }
            FieldOrder::Custom(indices) => {
                let values = [
                    event.core_id as u64,
                    event.chip_id as u64,
                    event.neuron_id as u64,
                    event.timestamp as u64,
                ];
                writeln!(
                    self.writer,
                    "{},{},{},{}",
                    values[indices[0]], values[indices[1]], values[indices[2]], values[indices[3]]
                )?;
            }
        }
        Ok(())
    }

    /// Flushes the writer.
    pub fn flush(&mut self) -> Result<(), OutputError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// CSV writer for special events.
pub struct SpecialCsvWriter<W: Write> {
    writer: BufWriter<W>,
}

impl<W: Write> SpecialCsvWriter<W> {
    /// Creates a new special event CSV writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }

    /// Writes a batch of special events.
    pub fn write_events(&mut self, events: &[SpecialEvent]) -> Result<(), OutputError> {
        for event in events {
            writeln!(self.writer, "{},{}", event.special_type, event.timestamp)?;
        }
        Ok(())
    }

    /// Flushes the writer.
    pub fn flush(&mut self) -> Result<(), OutputError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Binary output format for spike events.
///
/// Each event is written as a packed little-endian record:
/// - core_id: u8 (1 byte)
/// - chip_id: u8 (1 byte)
/// - padding: 2 bytes, zero
/// - neuron_id: u32 (4 bytes)
/// - timestamp: u32 (4 bytes)
///   Total: 12 bytes per event
pub struct BinaryWriter<W: Write> {
    writer: BufWriter<W>,
}

impl<W: Write> BinaryWriter<W> {
    /// Creates a new binary writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }

    /// Writes the file header.
    pub fn write_header(&mut self, event_count: u64) -> Result<(), OutputError> {
        // Magic number "AED3BIN\0"
        self.writer.write_all(b"AED3BIN\0")?;
        // Version (u32)
        self.writer.write_all(&1u32.to_le_bytes())?;
        // Event count (u64)
        self.writer.write_all(&event_count.to_le_bytes())?;
        Ok(())
    }

    /// Writes a batch of spike events.
    pub fn write_events(&mut self, events: &[PolarityEvent]) -> Result<(), OutputError> {
        for event in events {
            self.writer.write_all(&[event.core_id, event.chip_id, 0, 0])?;
            self.writer.write_all(&event.neuron_id.to_le_bytes())?;
            self.writer.write_all(&event.timestamp.to_le_bytes())?;
        }
        Ok(())
    }

    /// Flushes the writer.
    pub fn flush(&mut self) -> Result<(), OutputError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Writes spike events to a CSV file.
pub fn write_csv<P: AsRef<Path>>(
    path: P,
    events: &[PolarityEvent],
    field_order: FieldOrder,
) -> Result<(), OutputError> {
    let file = File::create(path)?;
    let mut writer = CsvWriter::new(file, field_order);
    writer.write_header()?;
    writer.write_events(events)?;
    writer.flush()?;
    Ok(())
}

/// Writes special events to a CSV file.
pub fn write_special_csv<P: AsRef<Path>>(
    path: P,
    events: &[SpecialEvent],
) -> Result<(), OutputError> {
    let file = File::create(path)?;
    let mut writer = SpecialCsvWriter::new(file);
    writer.write_events(events)?;
    writer.flush()?;
    Ok(())
}

/// Writes spike events to a binary file.
pub fn write_binary<P: AsRef<Path>>(
    path: P,
    events: &[PolarityEvent],
) -> Result<(), OutputError> {
    let file = File::create(path)?;
    let mut writer = BinaryWriter::new(file);
    writer.write_header(events.len() as u64)?;
    writer.write_events(events)?;
    writer.flush()?;
    Ok(())
}
