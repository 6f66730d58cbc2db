//! Compression codec unit tests

#[cfg(test)]
mod tests {
    use town_sync::codec::{decode, encode, CodecError};

    // -----------------------------------------------------------------------
    // Round-trip
    // -----------------------------------------------------------------------

    #[test]
    fn round_trips_empty_input() {
        let encoded = encode(&[]);
        assert_eq!(decode(&encoded).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn round_trips_arbitrary_bytes() {
        let cases: Vec<Vec<u8>> = vec![
            b"hello town".to_vec(),
            vec![0u8; 1],
            (0u8..=255).collect(),
            (0u8..=255).cycle().take(10_000).collect(),
        ];
        for raw in cases {
            let encoded = encode(&raw);
            assert_eq!(decode(&encoded).unwrap(), raw);
        }
    }

    #[test]
    fn round_trips_serialized_snapshot() {
        let json = br#"{"buildings":[{"category":"buildings","model":"house","position":{"x":1.0,"y":0.0,"z":2.0}}],"townName":"Riverton"}"#;
        let encoded = encode(json);
        assert_eq!(decode(&encoded).unwrap(), json.to_vec());
    }

    #[test]
    fn compresses_repetitive_payloads() {
        let raw = vec![b'a'; 50_000];
        let encoded = encode(&raw);
        assert!(encoded.len() < raw.len() / 10);
    }

    // -----------------------------------------------------------------------
    // Corruption
    // -----------------------------------------------------------------------

    #[test]
    fn corrupt_payload_is_a_decode_error() {
        // Claims 8 decompressed bytes but carries truncated garbage.
        let corrupt = [8u8, 0, 0, 0, 0xFF];
        let err = decode(&corrupt).unwrap_err();
        assert!(matches!(err, CodecError::CorruptPayload(_)));
    }

    #[test]
    fn truncated_header_is_a_decode_error() {
        let err = decode(&[1, 2]).unwrap_err();
        assert!(matches!(err, CodecError::CorruptPayload(_)));
    }
}
