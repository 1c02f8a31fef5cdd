//! Byte sinks for serialized reports.

use log::info;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

use crate::serializer::SerializationError;

/// Error types that can occur during data transport (sending).
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub trait Sender: Send {
    /// Write one already framed message
    fn send(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Push buffered data to its destination. May be a no-op.
    fn flush(&mut self) -> Result<(), TransportError>;
}

/// Writes frames to standard output.
#[derive(Default)]
pub struct StdioSender;

impl StdioSender {
    pub fn new() -> Self {
        StdioSender
    }
}

impl Sender for StdioSender {
    fn send(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(data)?;
        stdout.flush()?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        io::stdout().flush()?;
        Ok(())
    }
}

/// Appends frames to a file, created or truncated on construction.
pub struct FileSender {
    writer: BufWriter<File>,
}

impl FileSender {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, TransportError> {
        let path = path.as_ref();
        let file = File::create(path)?;
        info!("Writing reports to {}", path.display());
        Ok(Self { writer: BufWriter::new(file) })
    }
}

impl Sender for FileSender {
    fn send(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.writer.write_all(data)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Discards everything. Used to switch reporting off.
#[derive(Default, Clone, Copy)]
pub struct NullSender;

impl Sender for NullSender {
    fn send(&mut self, _data: &[u8]) -> Result<(), TransportError> {
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}
