//! Text repair for Yahoo payloads
//!
//! Names coming back from Yahoo are occasionally UTF-8 that was decoded as
//! Latin-1 somewhere upstream ("JosÃ©" instead of "José").

/// Decode a response body: UTF-8 when valid, otherwise Latin-1
pub fn decode_bytes(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

/// Undo UTF-8-read-as-Latin-1 mojibake.
///
/// Strings that are plain ASCII, contain characters outside Latin-1, or do not
/// form valid UTF-8 once narrowed back to bytes are returned unchanged.
pub fn repair_mojibake(s: &str) -> String {
    if s.is_ascii() {
        return s.to_string();
    }

    let bytes: Option<Vec<u8>> = s.chars().map(|c| u8::try_from(u32::from(c)).ok()).collect();
    match bytes.and_then(|b| String::from_utf8(b).ok()) {
        Some(fixed) => fixed,
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repairs_double_encoded_name() {
        assert_eq!(repair_mojibake("JosÃ©"), "José");
        assert_eq!(repair_mojibake("PÃ¤Ã¤rni"), "Päärni");
    }

    #[test]
    fn test_leaves_correct_text_alone() {
        assert_eq!(repair_mojibake("Connor McDavid"), "Connor McDavid");
        // Already-correct Latin-1 range text is not valid UTF-8 once narrowed
        assert_eq!(repair_mojibake("José"), "José");
        // Characters beyond Latin-1 mean the string was never mis-decoded
        assert_eq!(repair_mojibake("Kiril’s"), "Kiril’s");
    }

    #[test]
    fn test_decode_bytes_falls_back_to_latin1() {
        assert_eq!(decode_bytes("Zibanejad".as_bytes()), "Zibanejad");
        assert_eq!(decode_bytes("Stützle".as_bytes()), "Stützle");
        assert_eq!(decode_bytes(&[0x53, 0x74, 0xFC, 0x74, 0x7A, 0x6C, 0x65]), "Stützle");
    }
}
