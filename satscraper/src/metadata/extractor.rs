//! Reads the search result table into [`Metadata`] records.

use scraper::{ElementRef, Html};
use std::collections::HashMap;
use tracing::{debug, warn};

use super::{Metadata, MetadataList};
use crate::errors::ParseError;
use crate::html::{clean_text, selector};
use crate::portal::urls;
use crate::query::ResourceType;

const STEP_READ_RESULTS: &str = "read search results";
const RESULT_TABLE: &str = "table#ctl00_MainContent_tblResult";

/// Metadata key → column caption of the result table.
pub const DEFAULT_CAPTIONS: [(&str, &str); 17] = [
    ("uuid", "Folio Fiscal"),
    ("rfcEmisor", "RFC Emisor"),
    ("nombreEmisor", "Nombre o Razón Social del Emisor"),
    ("rfcReceptor", "RFC Receptor"),
    ("nombreReceptor", "Nombre o Razón Social del Receptor"),
    ("fechaEmision", "Fecha de Emisión"),
    ("fechaCertificacion", "Fecha de Certificación"),
    ("pacCertifico", "PAC que Certificó"),
    ("total", "Total"),
    ("efectoComprobante", "Efecto del Comprobante"),
    ("estatusCancelacion", "Estatus de cancelación"),
    ("estadoComprobante", "Estado del Comprobante"),
    ("estatusProcesoCancelacion", "Estatus de Proceso de Cancelación"),
    ("fechaProcesoCancelacion", "Fecha de Proceso de Cancelación"),
    ("rfcACuentaTerceros", "RFC a cuenta de terceros"),
    ("motivoCancelacion", "Motivo"),
    ("folioSustitucion", "Folio de Sustitución"),
];

/// Row button id → resource it downloads.
const LINK_BUTTONS: [(&str, ResourceType); 4] = [
    ("BtnDescarga", ResourceType::Xml),
    ("BtnRI", ResourceType::Pdf),
    ("BtnRecuperaAcuse", ResourceType::CancelRequest),
    ("BtnRecuperaAcuseFinal", ResourceType::CancelVoucher),
];

/// Parses the result table of a search response.
#[derive(Debug, Clone)]
pub struct MetadataExtractor {
    captions: Vec<(String, String)>,
}

impl Default for MetadataExtractor {
    fn default() -> Self {
        Self::with_captions(DEFAULT_CAPTIONS)
    }
}

impl MetadataExtractor {
    /// Creates an extractor with the portal's column captions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an extractor with custom key → caption pairs. Captions are
    /// matched ignoring case and surrounding whitespace.
    #[must_use]
    pub fn with_captions<I, K, C>(captions: I) -> Self
    where
        I: IntoIterator<Item = (K, C)>,
        K: Into<String>,
        C: Into<String>,
    {
        Self {
            captions: captions
                .into_iter()
                .map(|(key, caption)| (key.into(), caption.into().to_lowercase()))
                .collect(),
        }
    }

    /// Extracts one record per data row.
    ///
    /// A page without the result table yields an empty list. Rows whose
    /// UUID does not parse are skipped.
    pub fn extract(&self, html: &str) -> Result<MetadataList, ParseError> {
        let document = Html::parse_document(html);
        let table_selector = selector(STEP_READ_RESULTS, RESULT_TABLE)?;
        let row_selector = selector(STEP_READ_RESULTS, "tr")?;
        let button_selector = selector(STEP_READ_RESULTS, "[onclick]")?;

        let Some(table) = document.select(&table_selector).next() else {
            debug!("result table not found, no results");
            return Ok(MetadataList::default());
        };

        let mut rows = table.select(&row_selector);
        let Some(header) = rows.next() else {
            return Ok(MetadataList::default());
        };
        let columns = self.columns(header);
        let uuid_column = *columns.get("uuid").ok_or_else(|| {
            ParseError::new(STEP_READ_RESULTS, "result table has no UUID column")
        })?;

        let mut list = MetadataList::default();
        for row in rows {
            let values: Vec<String> = cells(row).map(|cell| clean_text(cell.text())).collect();
            if values.is_empty() {
                continue;
            }
            let Some(uuid) = values.get(uuid_column).filter(|v| uuid::Uuid::parse_str(v).is_ok()) else {
                warn!(row = ?values, "skipping result row without a valid UUID");
                continue;
            };

            let mut attributes: HashMap<String, String> = columns
                .iter()
                .filter(|(key, _)| key.as_str() != "uuid")
                .filter_map(|(key, &index)| values.get(index).map(|value| (key.clone(), value.clone())))
                .collect();
            for button in row.select(&button_selector) {
                if let Some((key, link)) = button_link(button) {
                    attributes.insert(key.to_string(), link);
                }
            }

            match Metadata::new(uuid, attributes) {
                Ok(item) => list.insert(item),
                Err(err) => warn!(error = %err, "skipping result row"),
            }
        }

        debug!(count = list.len(), "extracted search results");
        Ok(list)
    }

    fn columns(&self, header: ElementRef<'_>) -> HashMap<String, usize> {
        let captions: Vec<String> = cells(header)
            .map(|cell| clean_text(cell.text()).to_lowercase())
            .collect();

        self.captions
            .iter()
            .filter_map(|(key, caption)| {
                captions
                    .iter()
                    .position(|c| c == caption)
                    .map(|index| (key.clone(), index))
            })
            .collect()
    }
}

fn cells(row: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| matches!(cell.value().name(), "td" | "th"))
}

fn button_link(button: ElementRef<'_>) -> Option<(&'static str, String)> {
    let id = button.value().attr("id")?;
    let (_, resource) = LINK_BUTTONS.iter().find(|(button_id, _)| *button_id == id)?;
    let onclick = button.value().attr("onclick")?;
    let path = onclick.split('\'').nth(1).filter(|p| !p.is_empty())?;

    let link = if path.starts_with("http://") || path.starts_with("https://") {
        path.to_string()
    } else {
        format!("{}{}", urls::SAT_URL_PORTAL_CFDI, path.trim_start_matches('/'))
    };
    Some((resource.key(), link))
}
