// file: src/parser/script.rs
// description: extraction of embedded broker object literals from script bundles
// reference: https://docs.rs/regex, https://docs.rs/serde_json

use crate::error::{PipelineError, Result};
use crate::models::NormalizedBrokerRecord;
use crate::parser::convert::RecordConverter;
use crate::parser::{BrokerScriptExtractor, ExtractedBrokers};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

lazy_static! {
    static ref JSON_PARSE_SINGLE: Regex =
        Regex::new(r#"JSON\.parse\(\s*'((?:[^'\\]|\\.)*)'\s*\)"#)
            .expect("JSON_PARSE_SINGLE regex is valid");

    static ref JSON_PARSE_DOUBLE: Regex =
        Regex::new(r#"JSON\.parse\(\s*"((?:[^"\\]|\\.)*)"\s*\)"#)
            .expect("JSON_PARSE_DOUBLE regex is valid");

    /// `const brokers = [`, `brokerData: {`, `window.BROKER = {`
    static ref BROKER_ASSIGNMENT: Regex =
        Regex::new(r"(?i)[\w$.]*broker[\w$]*\s*[:=]\s*[\[{]")
            .expect("BROKER_ASSIGNMENT regex is valid");

    static ref EXPORT_ASSIGNMENT: Regex =
        Regex::new(r"(?:module\.exports\s*=|export\s+default|window\.__[\w$]+__\s*=)\s*[\[{]")
            .expect("EXPORT_ASSIGNMENT regex is valid");
}

/// Locates broker literals inside a bundle and converts each into a record.
/// `JSON.parse('...')` payloads and object/array literals bound to
/// broker-named identifiers are tried first; export-style assignments are
/// the fallback.
#[derive(Debug, Clone, Default)]
pub struct ScriptLiteralExtractor {
    converter: RecordConverter,
}

impl ScriptLiteralExtractor {
    pub fn new() -> Self {
        Self {
            converter: RecordConverter::new(),
        }
    }

    pub fn extract_literals(&self, script: &str) -> Vec<Value> {
        let mut values = Vec::new();

        for regex in [&*JSON_PARSE_SINGLE, &*JSON_PARSE_DOUBLE] {
            for capture in regex.captures_iter(script) {
                let Some(payload) = capture.get(1) else {
                    continue;
                };
                let decoded = unescape_js_string(payload.as_str());
                match serde_json::from_str::<Value>(&decoded) {
                    Ok(value) => values.push(value),
                    Err(e) => debug!("Skipping unparsable JSON.parse payload: {}", e),
                }
            }
        }

        values.extend(self.literals_after(script, &BROKER_ASSIGNMENT));

        if values.is_empty() {
            values.extend(self.literals_after(script, &EXPORT_ASSIGNMENT));
        }

        values
    }

    fn literals_after(&self, script: &str, regex: &Regex) -> Vec<Value> {
        let mut values = Vec::new();
        let mut resume_at = 0;

        for found in regex.find_iter(script) {
            // the match ends on the opening bracket
            let start = found.end() - 1;
            if start < resume_at {
                continue;
            }
            let Some(end) = balanced_end(script, start) else {
                debug!("Unbalanced literal at byte {}", start);
                continue;
            };

            let literal = &script[start..end];
            match serde_json::from_str::<Value>(&js_literal_to_json(literal)) {
                Ok(value) => {
                    values.push(value);
                    resume_at = end;
                }
                Err(e) => debug!("Skipping literal at byte {}: {}", start, e),
            }
        }

        values
    }
}

impl BrokerScriptExtractor for ScriptLiteralExtractor {
    fn extract(&self, script: &str, source: &str) -> Result<ExtractedBrokers> {
        let literals = self.extract_literals(script);
        if literals.is_empty() {
            return Err(PipelineError::ScriptExtract {
                file: source.to_string(),
                message: "no broker literal found".to_string(),
            });
        }

        let mut records: Vec<NormalizedBrokerRecord> = literals
            .iter()
            .flat_map(RecordConverter::broker_values)
            .filter_map(|value| self.converter.convert(value))
            .collect();

        if records.len() == 1 {
            return Ok(ExtractedBrokers::Single(records.remove(0)));
        }
        Ok(ExtractedBrokers::Many(records))
    }
}

/// Byte index one past the bracket closing the one at `start`, skipping
/// string contents and comments.
fn balanced_end(source: &str, start: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    let mut depth = 0usize;
    let mut i = start;

    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' | b'`' => i = skip_string(bytes, i)?,
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = find_comment_end(bytes, i + 2)?;
            }
            b'[' | b'{' => depth += 1,
            b']' | b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
        i += 1;
    }

    None
}

/// Index of the closing quote of the string opening at `open`.
fn skip_string(bytes: &[u8], open: usize) -> Option<usize> {
    let quote = bytes[open];
    let mut i = open + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return Some(i),
            _ => i += 1,
        }
    }
    None
}

/// Index of the `/` closing a block comment whose body starts at `from`.
fn find_comment_end(bytes: &[u8], from: usize) -> Option<usize> {
    let mut i = from;
    while i + 1 < bytes.len() {
        if bytes[i] == b'*' && bytes[i + 1] == b'/' {
            return Some(i + 1);
        }
        i += 1;
    }
    None
}

/// Rewrites a JavaScript object/array literal as JSON: quotes bare keys,
/// converts single-quoted and template strings, drops comments and trailing
/// commas, and maps `undefined` and bare identifiers to `null`.
pub fn js_literal_to_json(literal: &str) -> String {
    let chars: Vec<char> = literal.chars().collect();
    let mut out = String::with_capacity(literal.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' | '\'' | '`' => {
                let (content, next) = read_js_string(&chars, i);
                out.push_str(&serde_json::to_string(&content).unwrap_or_else(|_| "\"\"".into()));
                i = next;
                continue;
            }
            '/' if chars.get(i + 1) == Some(&'/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
                continue;
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                while i + 1 < chars.len() && !(chars[i] == '*' && chars[i + 1] == '/') {
                    i += 1;
                }
                i += 2;
                continue;
            }
            '}' | ']' => {
                let trimmed_len = out.trim_end().len();
                out.truncate(trimmed_len);
                if out.ends_with(',') {
                    out.pop();
                }
                out.push(c);
            }
            // exponent markers like `1e5` stay part of the number
            c if (c.is_alphabetic() || c == '_' || c == '$')
                && !out.ends_with(|p: char| p.is_ascii_digit() || p == '.') =>
            {
                let begin = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '$') {
                    i += 1;
                }
                let ident: String = chars[begin..i].iter().collect();

                let mut lookahead = i;
                while lookahead < chars.len() && chars[lookahead].is_whitespace() {
                    lookahead += 1;
                }
                let is_key = chars.get(lookahead) == Some(&':');

                if is_key {
                    out.push_str(&serde_json::to_string(&ident).unwrap_or_default());
                } else {
                    match ident.as_str() {
                        "true" | "false" | "null" => out.push_str(&ident),
                        _ => out.push_str("null"),
                    }
                }
                continue;
            }
            _ => out.push(c),
        }
        i += 1;
    }

    out
}

/// Reads the string literal opening at `open`; returns its decoded content
/// and the index just past the closing quote.
fn read_js_string(chars: &[char], open: usize) -> (String, usize) {
    let quote = chars[open];
    let mut raw = String::new();
    let mut i = open + 1;

    while i < chars.len() && chars[i] != quote {
        if chars[i] == '\\' && i + 1 < chars.len() {
            raw.push(chars[i]);
            raw.push(chars[i + 1]);
            i += 2;
            continue;
        }
        raw.push(chars[i]);
        i += 1;
    }

    (unescape_js_string(&raw), (i + 1).min(chars.len()))
}

pub fn unescape_js_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('u') => {
                let hex: String = (0..4).filter_map(|_| chars.next()).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => out.push_str(&format!("\\u{}", hex)),
                }
            }
            Some('x') => {
                let hex: String = (0..2).filter_map(|_| chars.next()).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => out.push_str(&format!("\\x{}", hex)),
                }
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn extract(script: &str) -> Result<ExtractedBrokers> {
        ScriptLiteralExtractor::new().extract(script, "bundle.js")
    }

    #[test]
    fn test_js_literal_normalization() {
        let literal = r#"{name: 'XM', platforms: ["MT4", 'MT5',], // trailing
            /* note */ rating: 4.5, extra: undefined, ref: someVar, ok: true,}"#;
        let value: Value = serde_json::from_str(&js_literal_to_json(literal)).unwrap();

        assert_eq!(
            value,
            json!({"name": "XM", "platforms": ["MT4", "MT5"], "rating": 4.5,
                   "extra": null, "ref": null, "ok": true})
        );
    }

    #[test]
    fn test_quotes_inside_strings_survive() {
        let value: Value =
            serde_json::from_str(&js_literal_to_json(r#"{a: 'it\'s "fine"', b: "x, }"}"#)).unwrap();
        assert_eq!(value, json!({"a": "it's \"fine\"", "b": "x, }"}));
    }

    #[test]
    fn test_many_brokers_from_assignment() {
        let script = r#"
            !function(){ var unrelated = {a: 1}; }();
            const brokerList = [
                {name: "XM", platforms: ["MT4"]},
                {name: "IG", regulations: [{authority: "FCA"}]},
            ];
        "#;

        let records = extract(script).unwrap().into_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name.as_deref(), Some("XM"));
        assert_eq!(records[1].regulations[0].authority, "FCA");
    }

    #[test]
    fn test_single_broker_from_json_parse() {
        let script = r#"window.data = JSON.parse('{"name":"Plus500","features":["CFDs"],"note":"it\'s"}');"#;

        match extract(script).unwrap() {
            ExtractedBrokers::Single(record) => {
                assert_eq!(record.name.as_deref(), Some("Plus500"));
                assert_eq!(record.features.len(), 1);
            }
            other => panic!("expected a single broker, got {:?}", other),
        }
    }

    #[test]
    fn test_wrapped_brokers_key_via_export() {
        let script = r#"export default {brokers: [{name: "A"}, {name: "B"}, {name: "C"}]};"#;
        assert_eq!(extract(script).unwrap().len(), 3);
    }

    #[test]
    fn test_broker_with_data_key_keeps_its_fields() {
        let script = r#"var broker = {name: "XM", regulations: ["CySEC"], data: ["x"], items: {spread: "0.6"}};"#;

        let records = extract(script).unwrap().into_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name.as_deref(), Some("XM"));
        assert_eq!(records[0].regulations.len(), 1);
    }

    #[test]
    fn test_no_literal_is_an_error() {
        let err = extract("console.log('hello');").unwrap_err();
        assert!(err.to_string().contains("no broker literal"));
    }

    #[test]
    fn test_balanced_end_ignores_brackets_in_strings() {
        let src = r#"[{"a": "]"}, '}'] tail"#;
        assert_eq!(balanced_end(src, 0), Some(src.len() - 5));
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape_js_string(r#"a\'b\nA\x42"#), "a'b\nAB");
    }
}
