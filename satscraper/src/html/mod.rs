//! HTML helpers: form field extraction and partial-postback parsing.

mod delta;
mod form;

pub use delta::{DeltaItem, DeltaResponseParser};
pub use form::{FormExtractor, HtmlForm};

use scraper::Selector;

use crate::errors::ParseError;

/// Rewrites a `utf-16` charset declaration to `utf-8`.
///
/// The portal declares `utf-16` on pages that are actually served as
/// `utf-8`, which confuses HTML parsers that honour the meta tag.
#[must_use]
pub fn normalize_charset(html: &str) -> String {
    html.replace("charset=utf-16", "charset=utf-8")
        .replace("charset=UTF-16", "charset=utf-8")
}

/// Parses a CSS selector, reporting failures as a [`ParseError`] for `step`.
pub(crate) fn selector(step: &str, css: &str) -> Result<Selector, ParseError> {
    Selector::parse(css).map_err(|e| ParseError::new(step, format!("invalid selector '{css}': {e}")))
}

/// Collapses runs of whitespace and trims the result.
pub(crate) fn clean_text<'a>(pieces: impl Iterator<Item = &'a str>) -> String {
    pieces
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
