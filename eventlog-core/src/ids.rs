//! Identifier generation helpers.

use rand::RngCore;
use uuid::Uuid;

/// Generates a fresh server-assignable execution id.
pub fn new_execution_id() -> Uuid {
    Uuid::new_v4()
}

/// Generates an opaque 16-hex-character span id, generated locally rather
/// than requiring a round trip to the server.
pub fn new_span_id() -> String {
    let mut bytes = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_ids_are_16_hex_chars() {
        let id = new_span_id();
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn span_ids_are_not_trivially_repeated() {
        let a = new_span_id();
        let b = new_span_id();
        assert_ne!(a, b);
    }
}
