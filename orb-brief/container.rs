use crate::descriptor::{DESCRIPTOR_BITS, DESCRIPTOR_BYTES, OrbDescriptor};
use crate::error::{BriefError, BriefResult};

const HEADER_BYTES: usize = 8;

/// Serialized descriptors of one feature.
///
/// ```text
/// u32 LE   descriptor length in bits (256)
/// u32 LE   number of descriptors
/// 32 bytes per descriptor, bit i at byte i / 8, bit position i % 8
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DescriptorContainer {
    descriptors: Vec<OrbDescriptor>,
}

impl DescriptorContainer {
    pub fn new(descriptors: Vec<OrbDescriptor>) -> Self {
        Self { descriptors }
    }

    pub fn descriptors(&self) -> &[OrbDescriptor] {
        &self.descriptors
    }

    pub fn into_descriptors(self) -> Vec<OrbDescriptor> {
        self.descriptors
    }

    pub fn serialized_len(&self) -> usize {
        HEADER_BYTES + self.descriptors.len() * DESCRIPTOR_BYTES
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.serialized_len());
        bytes.extend_from_slice(&(DESCRIPTOR_BITS as u32).to_le_bytes());
        bytes.extend_from_slice(&(self.descriptors.len() as u32).to_le_bytes());
        for descriptor in &self.descriptors {
            bytes.extend_from_slice(&descriptor.to_bytes());
        }
        bytes
    }

    /// Parses a serialized container, rejecting another bit width, truncated or trailing data.
    pub fn from_bytes(bytes: &[u8]) -> BriefResult<Self> {
        let (header, payload) = bytes.split_at_checked(HEADER_BYTES).ok_or_else(|| {
            BriefError::InvalidDescriptorData(format!("{} bytes are too short for the header", bytes.len()))
        })?;

        let bits = read_u32(&header[0..4]);
        if bits as usize != DESCRIPTOR_BITS {
            return Err(BriefError::InvalidDescriptorData(format!(
                "descriptor length {bits} bits, expected {DESCRIPTOR_BITS}"
            )));
        }

        let layers = read_u32(&header[4..8]) as usize;
        let expected = layers.checked_mul(DESCRIPTOR_BYTES);
        if expected != Some(payload.len()) {
            return Err(BriefError::InvalidDescriptorData(format!(
                "{layers} descriptors need {} bytes, got {}",
                layers.saturating_mul(DESCRIPTOR_BYTES),
                payload.len()
            )));
        }

        let descriptors = payload
            .chunks_exact(DESCRIPTOR_BYTES)
            .map(|chunk| {
                let mut descriptor_bytes = [0u8; DESCRIPTOR_BYTES];
                descriptor_bytes.copy_from_slice(chunk);
                OrbDescriptor::from_bytes(&descriptor_bytes)
            })
            .collect();

        Ok(Self { descriptors })
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(bytes);
    u32::from_le_bytes(word)
}
