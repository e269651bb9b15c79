//! Python bindings for the AEDAT 3.1 decoder with numpy support.
//!
//! This module provides Python bindings using PyO3 that allow efficient
//! decoding of AEDAT 3.1 files with numpy array access to the decoded data.

use aedat3_core::{decoder, Packet, PacketReader, PolarityEvent, SpecialEvent};
use numpy::{IntoPyArray, PyArray1};
use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;
use std::path::PathBuf;

/// Container for decoded spike events with numpy access.
///
/// The data is stored in columnar format (separate arrays for core, chip,
/// neuron, t) which is more efficient for numpy access.
#[pyclass]
pub struct Events {
    /// Core IDs
    core_id: Vec<u8>,
    /// Chip IDs
    chip_id: Vec<u8>,
    /// Neuron IDs
    neuron_id: Vec<u32>,
    /// Timestamps in microseconds
    timestamp: Vec<u32>,
}

#[pymethods]
impl Events {
    /// Returns the number of events.
    fn __len__(&self) -> usize {
        self.core_id.len()
    }

    /// Returns a string representation.
    fn __repr__(&self) -> String {
        format!("Events(count={})", self.core_id.len())
    }

    /// Returns the core IDs as a numpy array.
    #[getter]
    fn core_id<'py>(&self, py: Python<'py>) -> &'py PyArray1<u8> {
        self.core_id.clone().into_pyarray(py)
    }

    /// Returns the chip IDs as a numpy array.
    #[getter]
    fn chip_id<'py>(&self, py: Python<'py>) -> &'py PyArray1<u8> {
        self.chip_id.clone().into_pyarray(py)
    }

    /// Returns the neuron IDs as a numpy array.
    #[getter]
    fn neuron_id<'py>(&self, py: Python<'py>) -> &'py PyArray1<u32> {
        self.neuron_id.clone().into_pyarray(py)
    }

    /// Returns the timestamps as a numpy array (in microseconds).
    #[getter]
    fn timestamp<'py>(&self, py: Python<'py>) -> &'py PyArray1<u32> {
        self.timestamp.clone().into_pyarray(py)
    }

    /// Alias for timestamp (shorter name).
    #[getter]
    fn t<'py>(&self, py: Python<'py>) -> &'py PyArray1<u32> {
        self.timestamp.clone().into_pyarray(py)
    }

    /// Returns all arrays as a dictionary.
    ///
    /// This is useful for creating a pandas DataFrame or structured array.
    fn to_dict<'py>(&self, py: Python<'py>) -> PyResult<PyObject> {
        let dict = PyDict::new(py);
        dict.set_item("core_id", self.core_id.clone().into_pyarray(py))?;
        dict.set_item("chip_id", self.chip_id.clone().into_pyarray(py))?;
        dict.set_item("neuron_id", self.neuron_id.clone().into_pyarray(py))?;
        dict.set_item("timestamp", self.timestamp.clone().into_pyarray(py))?;
        Ok(dict.into())
    }
}

impl Events {
    /// Creates an Events container from a vector of PolarityEvent structs.
    fn from_polarity_events(events: Vec<PolarityEvent>) -> Self {
        let len = events.len();
        let mut core_id = Vec::with_capacity(len);
        let mut chip_id = Vec::with_capacity(len);
        let mut neuron_id = Vec::with_capacity(len);
        let mut timestamp = Vec::with_capacity(len);

        for event in events {
            core_id.push(event.core_id);
            chip_id.push(event.chip_id);
            neuron_id.push(event.neuron_id);
            timestamp.push(event.timestamp);
        }

        Self {
            core_id,
            chip_id,
            neuron_id,
            timestamp,
        }
    }
}

/// Container for decoded special events.
#[pyclass]
pub struct SpecialEvents {
    /// 7-bit special event type codes
    special_type: Vec<u8>,
    /// Timestamps in microseconds
    timestamp: Vec<u32>,
}

#[pymethods]
impl SpecialEvents {
    /// Returns the number of special events.
    fn __len__(&self) -> usize {
        self.special_type.len()
    }

    /// Returns the type codes as a numpy array.
    #[getter]
    fn special_type<'py>(&self, py: Python<'py>) -> &'py PyArray1<u8> {
        self.special_type.clone().into_pyarray(py)
    }

    /// Returns the timestamps as a numpy array.
    #[getter]
    fn timestamp<'py>(&self, py: Python<'py>) -> &'py PyArray1<u32> {
        self.timestamp.clone().into_pyarray(py)
    }
}

impl SpecialEvents {
    fn from_special_events(events: Vec<SpecialEvent>) -> Self {
        let len = events.len();
        let mut special_type = Vec::with_capacity(len);
        let mut timestamp = Vec::with_capacity(len);

        for event in events {
            special_type.push(event.special_type);
            timestamp.push(event.timestamp);
        }

        Self {
            special_type,
            timestamp,
        }
    }
}

/// Decodes an AEDAT 3.1 file and returns the spike events.
///
/// Args:
///     path: Path to the .aedat file
///
/// Returns:
///     Events: Container with core_id, chip_id, neuron_id and timestamp arrays
///
/// Example:
///     >>> import aedat3
///     >>> events = aedat3.decode_file("recording.aedat")
///     >>> print(f"Decoded {len(events)} events")
///     >>> spikes_on_core_zero = events.neuron_id[events.core_id == 0]
#[pyfunction]
fn decode_file(py: Python<'_>, path: &str) -> PyResult<Py<Events>> {
    let path = PathBuf::from(path);

    let result = decoder::decode_file(&path)
        .map_err(|e| PyIOError::new_err(format!("Failed to decode file: {}", e)))?;

    let events = Events::from_polarity_events(result.polarity_events);

    Py::new(py, events)
}

/// Decodes an AEDAT 3.1 file and returns both spike and special events.
///
/// Args:
///     path: Path to the .aedat file
///
/// Returns:
///     tuple: (Events, SpecialEvents)
///
/// Example:
///     >>> import aedat3
///     >>> events, specials = aedat3.decode_file_with_specials("recording.aedat")
///     >>> print(f"Spikes: {len(events)}, Specials: {len(specials)}")
#[pyfunction]
fn decode_file_with_specials(
    py: Python<'_>,
    path: &str,
) -> PyResult<(Py<Events>, Py<SpecialEvents>)> {
    let path = PathBuf::from(path);

    let result = decoder::decode_file(&path)
        .map_err(|e| PyIOError::new_err(format!("Failed to decode file: {}", e)))?;

    let events = Events::from_polarity_events(result.polarity_events);
    let specials = SpecialEvents::from_special_events(result.special_events);

    Ok((Py::new(py, events)?, Py::new(py, specials)?))
}

/// Decodes a headerless AEDAT 3.1 packet stream from memory.
///
/// This is useful for streaming decoding or when the data is already in
/// memory (for instance read from a network socket). The bytes must start
/// at a packet boundary; the textual file header is not expected.
///
/// Args:
///     data: Raw bytes containing AEDAT 3.1 packets
///
/// Returns:
///     Events: Container with decoded spike events
#[pyfunction]
fn decode_bytes(py: Python<'_>, data: &[u8]) -> PyResult<Py<Events>> {
    let mut reader = PacketReader::new(data);
    let mut polarity_events = Vec::new();

    loop {
        match reader.next_packet() {
            Ok(Some(Packet::PolarityEvents(events))) => polarity_events.extend(events),
            Ok(Some(_)) => {}
            Ok(None) => break,
            Err(e) => {
                return Err(PyValueError::new_err(format!(
                    "Failed to decode packets: {}",
                    e
                )))
            }
        }
    }

    let events = Events::from_polarity_events(polarity_events);
    Py::new(py, events)
}

/// AEDAT 3.1 decoder module for Python.
#[pymodule]
fn _aedat3(_py: Python<'_>, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(decode_file, m)?)?;
    m.add_function(wrap_pyfunction!(decode_file_with_specials, m)?)?;
    m.add_function(wrap_pyfunction!(decode_bytes, m)?)?;
    m.add_class::<Events>()?;
    m.add_class::<SpecialEvents>()?;
    Ok(())
}
