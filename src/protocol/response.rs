//! Scalar response bodies
//!
//! `listkeys` answers with a JSON array of strings, `myusage` and the counter
//! endpoints with a decimal integer, `flush` with the literal `[]`.

use crate::{CloudCacheError, Result};

/// Literal acknowledgment returned by `flush`
pub const FLUSH_ACK: &str = "[]";

fn body_str<'a>(body: &'a [u8], what: &str) -> Result<&'a str> {
    std::str::from_utf8(body)
        .map(str::trim)
        .map_err(|_| CloudCacheError::InvalidResponse(format!("{what}: body is not UTF-8")))
}

/// Decode a `listkeys` body
pub fn parse_key_list(body: &[u8]) -> Result<Vec<String>> {
    serde_json::from_slice(body)
        .map_err(|e| CloudCacheError::InvalidResponse(format!("key list: {e}")))
}

/// Decode a decimal integer body (`myusage`, `incr`, `decr`)
pub fn parse_integer(body: &[u8]) -> Result<i64> {
    let text = body_str(body, "integer")?;
    if text.is_empty() {
        return Err(CloudCacheError::InvalidResponse(
            "integer: empty body".to_string(),
        ));
    }
    text.parse()
        .map_err(|_| CloudCacheError::InvalidResponse(format!("integer: {text:?}")))
}

/// Decode a `flush` acknowledgment; anything but `[]` is malformed
pub fn parse_flush_ack(body: &[u8]) -> Result<String> {
    let text = body_str(body, "flush")?;
    if text != FLUSH_ACK {
        return Err(CloudCacheError::InvalidResponse(format!(
            "flush: expected {FLUSH_ACK:?}, got {text:?}"
        )));
    }
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_list() {
        assert_eq!(
            parse_key_list(br#"["a","b c","m1"]"#).unwrap(),
            vec!["a".to_string(), "b c".to_string(), "m1".to_string()]
        );
        assert!(parse_key_list(b"[]").unwrap().is_empty());
    }

    #[test]
    fn test_key_list_malformed() {
        assert!(matches!(
            parse_key_list(b"not json"),
            Err(CloudCacheError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_key_list(b""),
            Err(CloudCacheError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_integer() {
        assert_eq!(parse_integer(b"42").unwrap(), 42);
        assert_eq!(parse_integer(b" 7\r\n").unwrap(), 7);
        assert_eq!(parse_integer(b"-3").unwrap(), -3);
    }

    #[test]
    fn test_integer_malformed() {
        assert!(parse_integer(b"").unwrap_err().is_server_error());
        assert!(parse_integer(b"abc").unwrap_err().is_server_error());
        assert!(parse_integer(&[0xff, 0xfe]).unwrap_err().is_server_error());
    }

    #[test]
    fn test_flush_ack() {
        assert_eq!(parse_flush_ack(b"[]\n").unwrap(), FLUSH_ACK);
        assert_eq!(parse_flush_ack(b"[]").unwrap(), FLUSH_ACK);
    }

    #[test]
    fn test_flush_ack_malformed() {
        assert!(matches!(
            parse_flush_ack(b""),
            Err(CloudCacheError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_flush_ack(b"<html>oops</html>"),
            Err(CloudCacheError::InvalidResponse(_))
        ));
        assert!(parse_flush_ack(b"OK").unwrap_err().is_server_error());
    }
}
