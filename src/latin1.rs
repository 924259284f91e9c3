//! Shared helper for the NUL-terminated Latin-1 (ISO-8859-1) text
//! fields found in `.cbp` and `.cbt` records.

/// Decodes up to `field.len()` bytes as Latin-1, stopping at the first
/// NUL (or at the field's end, if none is found).
pub fn decode_nul_terminated(field: &[u8]) -> String {
    let len = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    field[..len].iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stops_at_first_nul() {
        let field = [b'H', b'i', 0, b'X', b'X'];
        assert_eq!(decode_nul_terminated(&field), "Hi");
    }

    #[test]
    fn uses_whole_field_when_no_nul_present() {
        let field = [b'H', b'i'];
        assert_eq!(decode_nul_terminated(&field), "Hi");
    }

    #[test]
    fn high_bytes_map_straight_through_as_latin1() {
        let field = [0xE9, 0x00]; // 'é' in Latin-1
        assert_eq!(decode_nul_terminated(&field), "\u{e9}");
    }
}
