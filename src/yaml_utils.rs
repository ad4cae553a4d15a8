//! Session info text extraction and cleanup
//!
//! iRacing's session YAML has several non-standard issues that need correction
//! before a standard parser accepts it:
//! - Control characters inside the text
//! - Unquoted free-text fields (driver, team and setup names) that may contain
//!   `:`, `#`, quotes or other YAML syntax
//! - Values that start with a comma
//!
//! This module extracts the raw text and cleans it; the result is handed to
//! `serde_yaml_ng` as a generic document.

use std::borrow::Cow;

use crate::{CaptureError, Result};

/// Keys whose values are user-entered text and must always be quoted.
const FREE_TEXT_KEYS: [&str; 5] =
    ["DriverSetupName", "UserName", "TeamName", "AbbrevName", "Initials"];

/// Extract the session info block from a capture buffer.
///
/// The block is cut at the first NUL and decoded as Latin-1. Returns `None`
/// when the header declares no block.
pub fn extract_session_text(data: &[u8], offset: i32, length: i32) -> Result<Option<String>> {
    if offset < 0 {
        return Err(CaptureError::parse(
            "Session info extraction",
            format!("Invalid offset: {}", offset),
        ));
    }
    if length <= 0 || offset == 0 {
        return Ok(None);
    }

    let offset = offset as usize;
    let length = length as usize;

    let block = offset.checked_add(length).and_then(|end| data.get(offset..end)).ok_or_else(|| {
        CaptureError::parse(
            "Session info extraction",
            format!(
                "Session info extends beyond buffer bounds: offset={}, len={}, buffer_size={}",
                offset,
                length,
                data.len()
            ),
        )
    })?;

    let text_len = block.iter().position(|&b| b == 0).unwrap_or(length);
    Ok(Some(block[..text_len].iter().map(|&b| char::from(b)).collect()))
}

/// Clean iRacing session YAML so a standard parser accepts it.
///
/// Removes control characters (keeping `\n`, `\r`, `\t`), quotes free-text
/// name fields and quotes values that begin with a comma. Fails if nothing but
/// whitespace remains.
pub fn preprocess_session_yaml(yaml: &str) -> Result<String> {
    let stripped = strip_control_characters(yaml);

    let mut result = String::with_capacity(stripped.len() + 64);
    for line in stripped.split_inclusive('\n') {
        let (body, ending) = split_line_ending(line);
        result.push_str(&quote_line(body));
        result.push_str(ending);
    }

    if result.trim().is_empty() {
        return Err(CaptureError::parse(
            "YAML preprocessing",
            "YAML is empty after preprocessing",
        ));
    }

    Ok(result)
}

/// Remove control characters, keeping `\n`, `\r` and `\t`.
pub fn strip_control_characters(text: &str) -> String {
    text.chars()
        .filter(|ch| !matches!(ch, '\x00'..='\x08' | '\x0B'..='\x0C' | '\x0E'..='\x1F' | '\x7F'))
        .collect()
}

/// Parse cleaned session YAML into a generic key-value document.
pub fn parse_session_document(yaml: &str) -> Result<serde_yaml_ng::Value> {
    serde_yaml_ng::from_str(yaml)
        .map_err(|e| CaptureError::parse("Session info deserialization", e.to_string()))
}

fn split_line_ending(line: &str) -> (&str, &str) {
    let body = line.trim_end_matches(['\n', '\r']);
    (body, &line[body.len()..])
}

fn quote_line(line: &str) -> Cow<'_, str> {
    let Some(sep) = line.find(": ") else {
        return Cow::Borrowed(line);
    };
    let (key_part, value) = (&line[..sep], &line[sep + 2..]);
    let key = key_part.trim_start().trim_start_matches("- ").trim_start();

    let needs_quotes = FREE_TEXT_KEYS.contains(&key)
        || (value.starts_with(',')
            && !key.is_empty()
            && key.chars().all(|c| c.is_alphanumeric() || c == '_'));

    if !needs_quotes {
        return Cow::Borrowed(line);
    }

    let mut quoted = String::with_capacity(line.len() + 4);
    quoted.push_str(&line[..sep + 2]);
    quoted.push('"');
    for ch in value.chars() {
        if matches!(ch, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    Cow::Owned(quoted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preprocess_removes_control_characters() {
        let input = "WeekendInfo:\n\x00\x01\x02  TrackName: test\x03\x7F";
        let result = preprocess_session_yaml(input).unwrap();
        assert!(!result.contains('\x00'));
        assert!(!result.contains('\x03'));
        assert!(!result.contains('\x7F'));
        assert!(result.contains("WeekendInfo"));
        assert!(result.contains("TrackName: test"));
    }

    #[test]
    fn test_preprocess_keeps_valid_whitespace() {
        let input = "Key:\r\n\t  Value";
        let result = preprocess_session_yaml(input).unwrap();
        assert!(result.contains('\n'));
        assert!(result.contains('\r'));
        assert!(result.contains('\t'));
    }

    #[test]
    fn free_text_fields_are_quoted_and_escaped() {
        let input = "DriverInfo:\n Drivers:\n - CarIdx: 0\n   UserName: Mike \"Flash\" O'Connor: #1\n   TeamName: A\\B\n";
        let result = preprocess_session_yaml(input).unwrap();
        assert!(result.contains(r#"   UserName: "Mike \"Flash\" O'Connor: #1""#));
        assert!(result.contains(r#"   TeamName: "A\\B""#));

        let doc = parse_session_document(&result).unwrap();
        let driver = &doc["DriverInfo"]["Drivers"][0];
        assert_eq!(driver["UserName"].as_str(), Some("Mike \"Flash\" O'Connor: #1"));
        assert_eq!(driver["TeamName"].as_str(), Some("A\\B"));
        assert_eq!(driver["CarIdx"].as_i64(), Some(0));
    }

    #[test]
    fn comma_leading_values_are_quoted() {
        let result = preprocess_session_yaml("CarClassShortName: ,GT4\n").unwrap();
        assert_eq!(result, "CarClassShortName: \",GT4\"\n");
        let doc = parse_session_document(&result).unwrap();
        assert_eq!(doc["CarClassShortName"].as_str(), Some(",GT4"));
    }

    #[test]
    fn strip_keeps_line_structure() {
        assert_eq!(strip_control_characters("a\x01:\tb\r\n\x7F"), "a:\tb\r\n");
        assert!(strip_control_characters("\x02\x1F").is_empty());
    }

    #[test]
    fn empty_after_cleanup_is_an_error() {
        assert!(preprocess_session_yaml("\x00\x01 \n").is_err());
    }

    #[test]
    fn test_extract_with_null_terminator() {
        let data = b"SessionInfo:\n  TrackName: test\0padding";
        let result = extract_session_text(data, 0, data.len() as i32).unwrap();
        assert_eq!(result, None, "offset 0 means no session block");

        let mut shifted = vec![b'x'; 4];
        shifted.extend_from_slice(data);
        let result = extract_session_text(&shifted, 4, data.len() as i32).unwrap();
        assert_eq!(result.as_deref(), Some("SessionInfo:\n  TrackName: test"));
    }

    #[test]
    fn test_extract_decodes_latin1() {
        let data = [b'_', b'N', 0xE9, b'e'];
        let result = extract_session_text(&data, 1, 3).unwrap();
        assert_eq!(result.as_deref(), Some("N\u{e9}e"));
    }

    #[test]
    fn test_extract_bounds_check() {
        let data = b"test";
        assert!(extract_session_text(data, 1, 100).is_err());
        assert!(extract_session_text(data, -1, 2).is_err());
        assert_eq!(extract_session_text(data, 1, 0).unwrap(), None);
    }
}
