// store/src/keys.rs
//
// Key encodings. Numeric ids are stored big-endian so tree iteration
// yields ascending id order, which is what pagination walks. Document
// keys prefix the owning patient id, so one prefix scan lists a
// patient's documents.

use byteorder::{BigEndian, ByteOrder};
use uuid::Uuid;

pub fn id_key(id: u64) -> [u8; 8] {
    let mut buf = [0u8; 8];
    BigEndian::write_u64(&mut buf, id);
    buf
}

pub fn read_id(bytes: &[u8]) -> u64 {
    BigEndian::read_u64(&bytes[..8])
}

pub fn doc_key(patient_id: u64, doc_id: &Uuid) -> [u8; 24] {
    let mut buf = [0u8; 24];
    BigEndian::write_u64(&mut buf[..8], patient_id);
    buf[8..].copy_from_slice(doc_id.as_bytes());
    buf
}

pub fn doc_prefix(patient_id: u64) -> [u8; 8] {
    id_key(patient_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_order_ids_bytewise() {
        assert!(id_key(2).as_slice() < id_key(10).as_slice());
        assert!(id_key(255).as_slice() < id_key(256).as_slice());
    }

    #[test]
    fn should_round_trip_id() {
        assert_eq!(read_id(&id_key(u64::MAX)), u64::MAX);
        assert_eq!(read_id(&id_key(42)), 42);
    }

    #[test]
    fn should_prefix_doc_keys_with_patient_id() {
        let doc = Uuid::new_v4();
        let key = doc_key(7, &doc);
        assert!(key.starts_with(&doc_prefix(7)));
        assert_eq!(read_id(&key), 7);
    }
}
