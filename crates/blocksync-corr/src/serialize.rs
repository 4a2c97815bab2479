//! Correspondence file format.
//!
//! Layout:
//!   [magic: 4 bytes "BSC\0"] [version_major: 1] [version_minor: 1]
//!   [flags: 1] [reserved: 1] [correspondence_count: u32 LE]
//!   [payload_length: u32 LE] [json_payload: N bytes] [sha256: 32 bytes]
//!
//! Bit 0 of `flags` is set when the store records a primitive-type
//! repository.

use sha2::{Digest, Sha256};

use crate::error::CorrespondenceError;
use crate::store::CorrespondenceStore;

const MAGIC: [u8; 4] = [0x42, 0x53, 0x43, 0x00];

const VERSION_MAJOR: u8 = 0;
const VERSION_MINOR: u8 = 1;

const FLAG_PRIMITIVES: u8 = 0b0000_0001;

/// Header size (magic + version + flags + reserved + count + payload_len).
const HEADER_SIZE: usize = 4 + 1 + 1 + 1 + 1 + 4 + 4; // 16 bytes

const HASH_SIZE: usize = 32;

/// A correspondence file: header + store.
pub struct CorrespondenceFile {
    pub store: CorrespondenceStore,
}

impl CorrespondenceFile {
    pub fn new(store: CorrespondenceStore) -> Self {
        Self { store }
    }

    /// Serialize to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CorrespondenceError> {
        let json = serde_json::to_vec(&self.store)
            .map_err(|e| CorrespondenceError::Serialization(e.to_string()))?;

        let count = self.store.len() as u32;
        let payload_len = json.len() as u32;
        let flags = if self.store.primitive_repository().is_some() {
            FLAG_PRIMITIVES
        } else {
            0
        };

        let mut buf = Vec::with_capacity(HEADER_SIZE + json.len() + HASH_SIZE);
        buf.extend_from_slice(&MAGIC);
        buf.push(VERSION_MAJOR);
        buf.push(VERSION_MINOR);
        buf.push(flags);
        buf.push(0);
        buf.extend_from_slice(&count.to_le_bytes());
        buf.extend_from_slice(&payload_len.to_le_bytes());
        buf.extend_from_slice(&json);

        let hash = Sha256::digest(&buf);
        buf.extend_from_slice(&hash);

        Ok(buf)
    }

    /// Deserialize from bytes, verifying the checksum and header counts.
    pub fn from_bytes(data: &[u8]) -> Result<Self, CorrespondenceError> {
        if data.len() < HEADER_SIZE + HASH_SIZE {
            return Err(CorrespondenceError::TooShort {
                expected: HEADER_SIZE + HASH_SIZE,
                actual: data.len(),
            });
        }

        if data[0..4] != MAGIC {
            return Err(CorrespondenceError::InvalidMagic);
        }

        let major = data[4];
        let minor = data[5];
        if major != VERSION_MAJOR {
            return Err(CorrespondenceError::UnsupportedVersion { major, minor });
        }
        let flags = data[6];

        let count = u32::from_le_bytes([data[8], data[9], data[10], data[11]]);
        let payload_len = u32::from_le_bytes([data[12], data[13], data[14], data[15]]) as usize;

        let expected_total = HEADER_SIZE + payload_len + HASH_SIZE;
        if data.len() < expected_total {
            return Err(CorrespondenceError::TooShort {
                expected: expected_total,
                actual: data.len(),
            });
        }

        let payload_end = HEADER_SIZE + payload_len;
        let stored_hash = &data[payload_end..payload_end + HASH_SIZE];
        let computed_hash = Sha256::digest(&data[..payload_end]);
        if computed_hash.as_slice() != stored_hash {
            return Err(CorrespondenceError::IntegrityFailed {
                expected: hex_encode(stored_hash),
                actual: hex_encode(computed_hash.as_slice()),
            });
        }

        let mut store: CorrespondenceStore = serde_json::from_slice(&data[HEADER_SIZE..payload_end])
            .map_err(|e| CorrespondenceError::Deserialization(e.to_string()))?;
        store.rebuild_index();

        if store.len() != count as usize {
            return Err(CorrespondenceError::Deserialization(format!(
                "correspondence count mismatch: header says {count}, payload has {}",
                store.len()
            )));
        }
        let has_primitives = flags & FLAG_PRIMITIVES != 0;
        if has_primitives != store.primitive_repository().is_some() {
            return Err(CorrespondenceError::Deserialization(
                "primitive repository flag does not match payload".into(),
            ));
        }

        Ok(Self { store })
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use blocksync_model::{ElementId, ElementKind, ElementRef};

    fn r(kind: ElementKind) -> ElementRef {
        ElementRef::new(ElementId::new(), kind)
    }

    #[test]
    fn empty_store_loads() {
        let file = CorrespondenceFile::new(CorrespondenceStore::new());
        let bytes = file.to_bytes().unwrap();
        assert_eq!(&bytes[0..4], &MAGIC);
        let loaded = CorrespondenceFile::from_bytes(&bytes).unwrap();
        assert!(loaded.store.is_empty());
    }

    #[test]
    fn queries_work_after_load() {
        let mut store = CorrespondenceStore::new();
        let block = r(ElementKind::Block);
        let comp = r(ElementKind::MethodComponent);
        store.link_one(block, comp).unwrap();
        store.set_primitive_repository(r(ElementKind::PrimitiveRepository));

        let bytes = CorrespondenceFile::new(store).to_bytes().unwrap();
        assert_eq!(bytes[6] & FLAG_PRIMITIVES, FLAG_PRIMITIVES);

        let loaded = CorrespondenceFile::from_bytes(&bytes).unwrap().store;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.first_of_kind(block.id, ElementKind::Component), Some(comp));
        assert!(loaded.primitive_repository().is_some());
    }

    #[test]
    fn invalid_magic() {
        let mut data = vec![0x00; 64];
        data[0..4].copy_from_slice(b"BAD\0");
        assert!(matches!(
            CorrespondenceFile::from_bytes(&data),
            Err(CorrespondenceError::InvalidMagic)
        ));
    }

    #[test]
    fn corruption_detected() {
        let mut store = CorrespondenceStore::new();
        store
            .link_one(r(ElementKind::Block), r(ElementKind::MessageComponent))
            .unwrap();
        let mut bytes = CorrespondenceFile::new(store).to_bytes().unwrap();
        bytes[HEADER_SIZE + 1] ^= 0xFF;
        assert!(matches!(
            CorrespondenceFile::from_bytes(&bytes),
            Err(CorrespondenceError::IntegrityFailed { .. })
        ));
    }

    #[test]
    fn unsupported_version() {
        let mut bytes = CorrespondenceFile::new(CorrespondenceStore::new())
            .to_bytes()
            .unwrap();
        bytes[4] = 7;
        assert!(matches!(
            CorrespondenceFile::from_bytes(&bytes),
            Err(CorrespondenceError::UnsupportedVersion { major: 7, .. })
        ));
    }

    #[test]
    fn too_short() {
        let data = MAGIC.to_vec();
        assert!(matches!(
            CorrespondenceFile::from_bytes(&data),
            Err(CorrespondenceError::TooShort { .. })
        ));
    }
}
