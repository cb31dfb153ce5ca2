//! Registry wire framing: `[magic: 1][schema id: 4, big endian][body]`.

pub const MAGIC_BYTE: u8 = 0;

pub const HEADER_LEN: usize = 5;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WireError {
    #[error("payload too short for wire header: {0} bytes")]
    Truncated(usize),

    #[error("unknown magic byte: {0:#04x}")]
    UnknownMagicByte(u8),
}

/// Frames an already encoded body with the magic byte and schema id.
pub fn encode_frame(schema_id: i32, body: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(HEADER_LEN + body.len());
    data.push(MAGIC_BYTE);
    data.extend(schema_id.to_be_bytes());
    data.extend_from_slice(body);
    data
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireHeader {
    pub schema_id: i32,
}

impl WireHeader {
    /// Splits a framed payload into its header and body.
    pub fn parse(data: &[u8]) -> Result<(Self, &[u8]), WireError> {
        if data.len() < HEADER_LEN {
            return Err(WireError::Truncated(data.len()));
        }

        if data[0] != MAGIC_BYTE {
            return Err(WireError::UnknownMagicByte(data[0]));
        }

        let schema_id: [u8; 4] = [data[1], data[2], data[3], data[4]];
        let schema_id = i32::from_be_bytes(schema_id);

        Ok((Self { schema_id }, &data[HEADER_LEN..]))
    }
}
