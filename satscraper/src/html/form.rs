//! Form field extraction.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::selector;
use crate::errors::{InputError, ParseError};
use crate::http::FormFields;

const STEP_EXTRACT_FIELDS: &str = "extract form fields";

/// Protocol for reading the current values of a form.
pub trait FormExtractor: Send + Sync {
    /// Returns field name → current value for every form matched by
    /// `selector`, hidden fields included.
    ///
    /// A selector that matches nothing yields an empty map. Callers that
    /// require the form must treat that as a parse failure.
    fn extract_fields(&self, html: &str, selector: &str) -> Result<FormFields, ParseError>;
}

/// [`FormExtractor`] backed by the `scraper` HTML parser.
///
/// Reads `input`, `select` and `textarea` elements the way a browser would
/// submit them: unchecked radios and checkboxes are left out, as are
/// buttons. Elements without a `name` attribute are reported under the
/// empty-string key.
#[derive(Debug, Clone, Default)]
pub struct HtmlForm {
    exclusions: Vec<Regex>,
}

impl HtmlForm {
    /// Creates an extractor that keeps every field.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an extractor that drops fields whose name matches any of the
    /// given regular expressions.
    pub fn excluding<I, S>(patterns: I) -> Result<Self, InputError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let exclusions = patterns
            .into_iter()
            .map(|pattern| {
                Regex::new(pattern.as_ref())
                    .map_err(|e| InputError::new("exclusion pattern", e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { exclusions })
    }

    /// Whether a field name is dropped by the exclusion list.
    #[must_use]
    pub fn is_excluded(&self, name: &str) -> bool {
        self.exclusions.iter().any(|pattern| pattern.is_match(name))
    }
}

impl FormExtractor for HtmlForm {
    fn extract_fields(&self, html: &str, form_selector: &str) -> Result<FormFields, ParseError> {
        let document = Html::parse_document(html);
        let forms = selector(STEP_EXTRACT_FIELDS, form_selector)?;
        let fields = selector(STEP_EXTRACT_FIELDS, "input, select, textarea")?;
        let options = selector(STEP_EXTRACT_FIELDS, "option")?;

        let mut values = FormFields::new();
        for form in document.select(&forms) {
            for element in form.select(&fields) {
                let name = element.value().attr("name").unwrap_or_default();
                if self.is_excluded(name) {
                    continue;
                }
                if let Some(value) = field_value(element, &options) {
                    values.insert(name.to_string(), value);
                }
            }
        }
        Ok(values)
    }
}

fn field_value(element: ElementRef<'_>, options: &Selector) -> Option<String> {
    let node = element.value();
    match node.name() {
        "input" => {
            let kind = node.attr("type").unwrap_or("text").to_ascii_lowercase();
            match kind.as_str() {
                "submit" | "reset" | "button" | "image" | "file" => None,
                "radio" | "checkbox" => node
                    .attr("checked")
                    .map(|_| node.attr("value").unwrap_or("on").to_string()),
                _ => Some(node.attr("value").unwrap_or_default().to_string()),
            }
        }
        "select" => {
            let mut all = element.select(options).peekable();
            let first = all.peek().copied();
            let chosen = all
                .find(|option| option.value().attr("selected").is_some())
                .or(first)?;
            Some(
                chosen
                    .value()
                    .attr("value")
                    .map_or_else(|| chosen.text().collect::<String>().trim().to_string(), str::to_string),
            )
        }
        "textarea" => Some(element.text().collect()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SEARCH_PAGE: &str = r#"
        <html><body>
        <form id="aspnetForm" method="post">
            <input type="hidden" name="__VIEWSTATE" value="vs-1" />
            <input type="hidden" name="__EVENTVALIDATION" value="ev-1" />
            <input type="text" name="ctl00$MainContent$TxtUUID" />
            <input type="radio" name="ctl00$MainContent$FiltroCentral" value="RdoFolioFiscal" />
            <input type="radio" name="ctl00$MainContent$FiltroCentral" value="RdoFechas" checked="checked" />
            <input type="checkbox" name="seleccionador" value="1" checked />
            <input type="submit" name="ctl00$MainContent$BtnBusqueda" value="Buscar CFDI" />
            <select name="ctl00$MainContent$DdlEstadoComprobante">
                <option value="-1">Seleccione</option>
                <option value="1" selected="selected">Vigente</option>
            </select>
            <select name="ctl00$MainContent$ddlComplementos">
                <option value="-1">Todos</option>
                <option value="8">Nomina</option>
            </select>
            <textarea name="notes">hello</textarea>
        </form>
        <form id="other"><input type="hidden" name="other" value="x" /></form>
        </body></html>
    "#;

    #[test]
    fn test_extracts_fields_like_a_browser() {
        let fields = HtmlForm::new().extract_fields(SEARCH_PAGE, "form#aspnetForm").unwrap();

        let expected: FormFields = [
            ("__EVENTVALIDATION", "ev-1"),
            ("__VIEWSTATE", "vs-1"),
            ("ctl00$MainContent$DdlEstadoComprobante", "1"),
            ("ctl00$MainContent$FiltroCentral", "RdoFechas"),
            ("ctl00$MainContent$TxtUUID", ""),
            ("ctl00$MainContent$ddlComplementos", "-1"),
            ("notes", "hello"),
            ("seleccionador", "1"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        assert_eq!(fields, expected);
    }

    #[test]
    fn test_exclusions_drop_matching_fields() {
        let form = HtmlForm::excluding(["^seleccionador$"]).unwrap();
        let fields = form.extract_fields(SEARCH_PAGE, "form#aspnetForm").unwrap();

        assert!(!fields.contains_key("seleccionador"));
        assert!(fields.contains_key("__VIEWSTATE"));
    }

    #[test]
    fn test_invalid_exclusion_pattern() {
        let err = HtmlForm::excluding(["("]).unwrap_err();
        assert_eq!(err.field, "exclusion pattern");
    }

    #[test]
    fn test_unmatched_selector_yields_empty_map() {
        let fields = HtmlForm::new().extract_fields(SEARCH_PAGE, "#certform").unwrap();
        assert!(fields.is_empty());
    }

    #[test]
    fn test_unnamed_input_uses_empty_key() {
        let html = r#"<form id="certform"><input type="hidden" value="token-123" /></form>"#;
        let fields = HtmlForm::new().extract_fields(html, "#certform").unwrap();

        assert_eq!(fields.get(""), Some(&"token-123".to_string()));
    }
}
