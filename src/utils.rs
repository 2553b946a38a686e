//! Helpers shared by tests and benchmarks.

/// Converts bytes to a hexadecimal string.
pub fn hex(bytes: &[u8]) -> String {
    let mut hex = String::new();
    for byte in bytes.iter() {
        hex.push_str(&format!("{:02x}", byte));
    }
    hex
}

/// Converts a hexadecimal string to bytes.
pub fn from_hex(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }

    (0..hex.len())
        .step_by(2)
        .map(|i| match u8::from_str_radix(&hex[i..i + 2], 16) {
            Ok(byte) => Some(byte),
            Err(_) => None,
        })
        .collect()
}

/// Converts a hexadecimal string to bytes, stripping whitespace and/or a `0x`
/// prefix. Commonly used in testing to encode external test vectors without
/// modification.
pub fn from_hex_formatted(hex: &str) -> Option<Vec<u8>> {
    let hex = hex.replace(['\t', '\n', '\r', ' '], "");
    let res = hex.strip_prefix("0x").unwrap_or(&hex);
    from_hex(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex() {
        let b: &[u8] = &[];
        let h = hex(b);
        assert_eq!(h, "");
        assert_eq!(from_hex(&h).unwrap(), b.to_vec());

        let b = &[0x01];
        let h = hex(b);
        assert_eq!(h, "01");
        assert_eq!(from_hex(&h).unwrap(), b.to_vec());

        let b = &[0xde, 0xad, 0xbe, 0xef];
        let h = hex(b);
        assert_eq!(h, "deadbeef");
        assert_eq!(from_hex(&h).unwrap(), b.to_vec());
    }

    #[test]
    fn test_from_hex_invalid() {
        // Odd length
        assert!(from_hex("abc").is_none());

        // Non-hex characters
        assert!(from_hex("zz").is_none());
    }

    #[test]
    fn test_from_hex_formatted() {
        let expected = from_hex("deadbeef").unwrap();
        assert_eq!(from_hex_formatted("0xdeadbeef").unwrap(), expected);
        assert_eq!(from_hex_formatted("de ad\nbe\tef").unwrap(), expected);
    }
}
