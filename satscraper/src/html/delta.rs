//! Parser for ASP.NET partial-postback ("delta") responses.
//!
//! A delta response is a flat sequence of `length|type|id|content|`
//! records, where `length` is the size of `content` in UTF-16 code units.
//! The portal sends its refreshed hidden state as `hiddenField` records.

use crate::errors::ParseError;
use crate::http::FormFields;

const STEP_PARSE_DELTA: &str = "parse partial postback";

/// One record of a delta response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaItem {
    /// Record type (e.g. `updatePanel`, `hiddenField`).
    pub kind: String,
    /// Record id (field name for `hiddenField`).
    pub id: String,
    /// Record payload.
    pub content: String,
}

/// Reads delta responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeltaResponseParser;

impl DeltaResponseParser {
    /// Parses every record of a delta response.
    pub fn parse(body: &str) -> Result<Vec<DeltaItem>, ParseError> {
        let body = body.trim();
        let mut items = Vec::new();
        let mut rest = body;

        while !rest.is_empty() {
            let length = read_until_pipe(&mut rest)?;
            let length: usize = length.parse().map_err(|_| {
                ParseError::new(STEP_PARSE_DELTA, format!("invalid record length '{length}'"))
            })?;
            let kind = read_until_pipe(&mut rest)?.to_string();
            let id = read_until_pipe(&mut rest)?.to_string();

            let content_end = utf16_offset(rest, length).ok_or_else(|| {
                ParseError::new(
                    STEP_PARSE_DELTA,
                    format!("record '{kind}|{id}' overruns the response"),
                )
            })?;
            let (content, tail) = rest.split_at(content_end);
            rest = tail.strip_prefix('|').ok_or_else(|| {
                ParseError::new(
                    STEP_PARSE_DELTA,
                    format!("record '{kind}|{id}' is not terminated"),
                )
            })?;

            items.push(DeltaItem {
                kind,
                id,
                content: content.to_string(),
            });
        }

        Ok(items)
    }

    /// Returns the `hiddenField` records as field name → value.
    pub fn hidden_fields(body: &str) -> Result<FormFields, ParseError> {
        Ok(Self::parse(body)?
            .into_iter()
            .filter(|item| item.kind == "hiddenField")
            .map(|item| (item.id, item.content))
            .collect())
    }
}

fn read_until_pipe<'a>(rest: &mut &'a str) -> Result<&'a str, ParseError> {
    let (value, tail) = rest
        .split_once('|')
        .ok_or_else(|| ParseError::new(STEP_PARSE_DELTA, "unterminated record header"))?;
    *rest = tail;
    Ok(value)
}

/// Byte offset in `text` after `units` UTF-16 code units, if `text` is long
/// enough and the offset falls on a character boundary.
fn utf16_offset(text: &str, units: usize) -> Option<usize> {
    let mut counted = 0;
    for (offset, c) in text.char_indices() {
        if counted == units {
            return Some(offset);
        }
        counted += c.len_utf16();
        if counted > units {
            return None;
        }
    }
    (counted == units).then_some(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(kind: &str, id: &str, content: &str) -> String {
        format!("{}|{kind}|{id}|{content}|", content.encode_utf16().count())
    }

    #[test]
    fn test_parse_records() {
        let body = format!(
            "{}{}{}",
            record("updatePanel", "ctl00_MainContent_UpnlBusqueda", "<div>a|b</div>"),
            record("hiddenField", "__VIEWSTATE", "vs-2"),
            record("hiddenField", "__EVENTTARGET", ""),
        );

        let items = DeltaResponseParser::parse(&body).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].content, "<div>a|b</div>");
        assert_eq!(items[1].id, "__VIEWSTATE");
        assert_eq!(items[2].content, "");
    }

    #[test]
    fn test_hidden_fields() {
        let body = format!(
            "{}{}{}",
            record("updatePanel", "panel", "<p>ignored</p>"),
            record("hiddenField", "__VIEWSTATE", "vs-2"),
            record("hiddenField", "__EVENTVALIDATION", "ev-2"),
        );

        let fields = DeltaResponseParser::hidden_fields(&body).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields.get("__VIEWSTATE"), Some(&"vs-2".to_string()));
        assert_eq!(fields.get("__EVENTVALIDATION"), Some(&"ev-2".to_string()));
    }

    #[test]
    fn test_non_ascii_content_is_measured_in_chars() {
        let body = record("hiddenField", "name", "Razón Social");
        let fields = DeltaResponseParser::hidden_fields(&body).unwrap();
        assert_eq!(fields.get("name"), Some(&"Razón Social".to_string()));
    }

    #[test]
    fn test_empty_body_has_no_records() {
        assert!(DeltaResponseParser::parse("  \n").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_bodies() {
        assert!(DeltaResponseParser::parse("<html><body>not a delta</body></html>").is_err());
        assert!(DeltaResponseParser::parse("10|hiddenField|x|short|").is_err());
        assert!(DeltaResponseParser::parse("3|hiddenField").is_err());
        assert!(DeltaResponseParser::parse("3|hiddenField|x|abcd|").is_err());
    }

    #[test]
    fn test_oversized_length_is_parse_error() {
        let err = DeltaResponseParser::hidden_fields("18446744073709551615|hiddenField|__VIEWSTATE|x|")
            .unwrap_err();
        assert_eq!(err.step, STEP_PARSE_DELTA);

        let err = DeltaResponseParser::parse("99999999999999999999999|hiddenField|x|a|").unwrap_err();
        assert_eq!(err.step, STEP_PARSE_DELTA);
    }

    #[test]
    fn test_length_counts_utf16_units() {
        let body = format!(
            "{}{}",
            record("updatePanel", "panel", "<p>Factura \u{1F4C4} pagada</p>"),
            record("hiddenField", "__VIEWSTATE", "vs-2"),
        );
        assert!(body.starts_with("24|"));

        let items = DeltaResponseParser::parse(&body).unwrap();
        assert_eq!(items[0].content, "<p>Factura \u{1F4C4} pagada</p>");
        assert_eq!(items[1].content, "vs-2");

        assert!(DeltaResponseParser::parse("1|updatePanel|p|\u{1F4C4}|").is_err());
    }
}
