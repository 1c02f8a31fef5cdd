use serde::Serialize;
use thiserror::Error;

/// Error types for serialization operations
#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Binary serialization error: {0}")]
    Binary(#[from] bincode::Error),

    #[error("Frame of {0} bytes does not fit a u32 length prefix")]
    FrameTooLarge(usize),
}

/// Object-safe serializer. Every output is a self-delimiting frame so frames
/// can be written back to back to any byte sink.
pub trait Serializer: Send + Sync {
    fn serialize_to_bytes(&self, data: &dyn SerializeObject) -> Result<Vec<u8>, SerializationError>;
}

/// Anything `serde` can serialize, behind a dyn-compatible trait
pub trait SerializeObject {
    fn to_json(&self) -> Result<Vec<u8>, SerializationError>;
    fn to_binary(&self) -> Result<Vec<u8>, SerializationError>;
}

impl<T: Serialize + ?Sized> SerializeObject for T {
    fn to_json(&self) -> Result<Vec<u8>, SerializationError> {
        serde_json::to_vec(self).map_err(SerializationError::Json)
    }

    fn to_binary(&self) -> Result<Vec<u8>, SerializationError> {
        bincode::serialize(self).map_err(SerializationError::Binary)
    }
}

/// One JSON document per line
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn serialize_to_bytes(&self, data: &dyn SerializeObject) -> Result<Vec<u8>, SerializationError> {
        let mut bytes = data.to_json()?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}

/// bincode payload behind a little-endian `u32` length prefix
pub struct BinarySerializer;

impl Serializer for BinarySerializer {
    fn serialize_to_bytes(&self, data: &dyn SerializeObject) -> Result<Vec<u8>, SerializationError> {
        let payload = data.to_binary()?;
        let len = u32::try_from(payload.len()).map_err(|_| SerializationError::FrameTooLarge(payload.len()))?;

        let mut frame = Vec::with_capacity(4 + payload.len());
        frame.extend_from_slice(&len.to_le_bytes());
        frame.extend_from_slice(&payload);
        Ok(frame)
    }
}
