//! The metadata module holds [GameMetadata], the extra data passed to the factory when a game is
//! created.

use super::FaultError;
use serde::{Deserialize, Serialize};

/// The encoded length of [GameMetadata].
pub const METADATA_LEN: usize = 64;

/// The version word written by the game creator.
pub const DEFAULT_METADATA_VERSION: u64 = 8;

/// The extra data a game is created with. Encoded as two 32 byte words, each holding a big-endian
/// `u64` in its low 8 bytes:
///
/// | bytes    | field          |
/// |----------|----------------|
/// | `0..24`  | zero           |
/// | `24..32` | `version`      |
/// | `32..56` | zero           |
/// | `56..64` | `anchor_block` |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMetadata {
    /// The depth/version word.
    pub version: u64,
    /// The L1 block number checkpointed before the game was created.
    pub anchor_block: u64,
}

impl GameMetadata {
    pub fn new(version: u64, anchor_block: u64) -> Self {
        Self {
            version,
            anchor_block,
        }
    }

    /// Encodes the metadata into its fixed 64 byte layout.
    pub fn encode(&self) -> [u8; METADATA_LEN] {
        let mut buf = [0u8; METADATA_LEN];
        buf[24..32].copy_from_slice(&self.version.to_be_bytes());
        buf[56..64].copy_from_slice(&self.anchor_block.to_be_bytes());
        buf
    }

    /// Decodes metadata from its 64 byte layout. Fails if the buffer has the wrong length or any
    /// reserved byte is set.
    pub fn decode(data: &[u8]) -> Result<Self, FaultError> {
        if data.len() != METADATA_LEN {
            return Err(FaultError::MalformedMetadata(format!(
                "expected {} bytes, got {}",
                METADATA_LEN,
                data.len()
            )));
        }
        if data[0..24].iter().chain(&data[32..56]).any(|b| *b != 0) {
            return Err(FaultError::MalformedMetadata(
                "reserved bytes must be zero".to_string(),
            ));
        }

        let mut word = [0u8; 8];
        word.copy_from_slice(&data[24..32]);
        let version = u64::from_be_bytes(word);
        word.copy_from_slice(&data[56..64]);
        let anchor_block = u64::from_be_bytes(word);

        Ok(Self {
            version,
            anchor_block,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn encodes_fixed_layout() {
        let buf = GameMetadata::new(DEFAULT_METADATA_VERSION, 0x0102_0304).encode();
        assert_eq!(buf.len(), 64);
        assert_eq!(&buf[24..32], &[0, 0, 0, 0, 0, 0, 0, 8]);
        assert_eq!(&buf[56..64], &[0, 0, 0, 0, 1, 2, 3, 4]);
        assert!(buf[..24].iter().all(|b| *b == 0));
        assert!(buf[32..56].iter().all(|b| *b == 0));
    }

    #[test]
    fn decodes_encoded_metadata() {
        let metadata = GameMetadata::new(8, 1234);
        assert_eq!(GameMetadata::decode(&metadata.encode()).unwrap(), metadata);
    }

    #[test]
    fn rejects_malformed_buffers() {
        assert!(matches!(
            GameMetadata::decode(&[0u8; 32]),
            Err(FaultError::MalformedMetadata(_))
        ));

        let mut buf = GameMetadata::new(8, 1).encode();
        buf[40] = 1;
        assert!(matches!(
            GameMetadata::decode(&buf),
            Err(FaultError::MalformedMetadata(_))
        ));
    }
}
