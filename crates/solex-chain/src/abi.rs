//! Minimal ABI plumbing: keccak selectors, event topics, and decoding of
//! the assertion library's `TestEvent(bool indexed result, string message)`.
use serde_json::Value;
use sha3::{Digest, Keccak256};

use solex_core::AssertionEvent;

/// Signature of the event every assertion function emits.
pub const TEST_EVENT_SIGNATURE: &str = "TestEvent(bool,string)";

pub fn keccak256_hex(data: &[u8]) -> String {
    let digest = Keccak256::digest(data);
    let mut out = String::with_capacity(64);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// 4-byte function selector for `signature`, hex without prefix.
pub fn selector_hex(signature: &str) -> String {
    keccak256_hex(signature.as_bytes())[..8].to_string()
}

/// topic0 for an event signature, `0x`-prefixed.
pub fn event_topic(signature: &str) -> String {
    format!("0x{}", keccak256_hex(signature.as_bytes()))
}

pub fn test_event_topic() -> String {
    event_topic(TEST_EVENT_SIGNATURE)
}

fn hex_to_bytes(hex: &str) -> Option<Vec<u8>> {
    let hex = hex.strip_prefix("0x").unwrap_or(hex);
    if hex.len() % 2 != 0 {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok())
        .collect()
}

fn word_as_usize(word: &[u8]) -> Option<usize> {
    // offsets and lengths in assertion messages are tiny; the high bytes of
    // the word must be zero
    if word.len() != 32 || word[..24].iter().any(|b| *b != 0) {
        return None;
    }
    let mut value = 0usize;
    for byte in &word[24..] {
        value = (value << 8) | *byte as usize;
    }
    Some(value)
}

/// ABI-decode a single dynamic `string` from event data.
pub fn decode_string_data(data: &str) -> Option<String> {
    let bytes = hex_to_bytes(data)?;
    let offset = word_as_usize(bytes.get(..32)?)?;
    let length_end = offset.checked_add(32)?;
    let length = word_as_usize(bytes.get(offset..length_end)?)?;
    let raw = bytes.get(length_end..length_end.checked_add(length)?)?;
    Some(String::from_utf8_lossy(raw).into_owned())
}

/// Decode one receipt log into an assertion event. Returns `None` for logs
/// that are not `TestEvent`s.
pub fn decode_test_event(log: &Value) -> Option<AssertionEvent> {
    let topics = log.get("topics")?.as_array()?;
    let topic0 = topics.first()?.as_str()?;
    if topic0.to_lowercase() != test_event_topic() {
        return None;
    }

    // the indexed bool lands in topic1 as a full word; nonzero means passed
    let passed = topics
        .get(1)?
        .as_str()?
        .trim_start_matches("0x")
        .bytes()
        .any(|b| b != b'0');

    let message = log
        .get("data")
        .and_then(Value::as_str)
        .and_then(decode_string_data)
        .unwrap_or_default();

    Some(AssertionEvent { passed, message })
}

/// ABI-encode a `(string)` payload the way the EVM does for event data.
/// Test helper for scripting fake receipts.
#[cfg(test)]
pub fn encode_string_data(message: &str) -> String {
    let bytes = message.as_bytes();
    let mut padded_len = bytes.len();
    if padded_len % 32 != 0 {
        padded_len += 32 - padded_len % 32;
    }
    let mut out = String::from("0x");
    out.push_str(&format!("{:064x}", 32));
    out.push_str(&format!("{:064x}", bytes.len()));
    for i in 0..padded_len {
        match bytes.get(i) {
            Some(byte) => out.push_str(&format!("{byte:02x}")),
            None => out.push_str("00"),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_selector_matches_known_value() {
        // the canonical ERC-20 transfer selector
        assert_eq!(selector_hex("transfer(address,uint256)"), "a9059cbb");
    }

    #[test]
    fn test_event_topic_matches_known_value() {
        assert_eq!(
            event_topic("Transfer(address,address,uint256)"),
            "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
    }

    #[test]
    fn test_decode_string_roundtrip() {
        assert_eq!(
            decode_string_data(&encode_string_data("expected 2 but got 1")),
            Some("expected 2 but got 1".to_string())
        );
        assert_eq!(decode_string_data(&encode_string_data("")), Some(String::new()));
        assert_eq!(decode_string_data("0x"), None);
    }

    #[test]
    fn test_decode_test_event() {
        let passed_topic = format!("0x{}", "0".repeat(63)) + "1";
        let failed_topic = format!("0x{}", "0".repeat(64));
        let log = json!({
            "topics": [test_event_topic(), passed_topic],
            "data": encode_string_data("ok")
        });
        assert_eq!(
            decode_test_event(&log),
            Some(AssertionEvent { passed: true, message: "ok".into() })
        );

        let log = json!({
            "topics": [test_event_topic(), failed_topic],
            "data": encode_string_data("balance mismatch")
        });
        assert_eq!(
            decode_test_event(&log),
            Some(AssertionEvent { passed: false, message: "balance mismatch".into() })
        );
    }

    #[test]
    fn test_decode_ignores_foreign_events() {
        let log = json!({
            "topics": [event_topic("Transfer(address,address,uint256)")],
            "data": "0x"
        });
        assert_eq!(decode_test_event(&log), None);
    }
}
