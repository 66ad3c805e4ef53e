//! Direction-specific translation of a [`Query`] into search form fields.
//!
//! The search page is an ASP.NET update panel. Switching the filter mode
//! (by UUID or by date) is a postback of its own, so every strategy yields
//! two field sets: the initial filters that select the mode, and the
//! request filters that carry the search itself.

use chrono::{NaiveDateTime, Timelike};

use super::{DownloadType, Query};
use crate::http::FormFields;

const FIELD_FILTER_MODE: &str = "ctl00$MainContent$FiltroCentral";
const FIELD_SCRIPT_MANAGER: &str = "ctl00$ScriptManager1";
const FIELD_SEARCH_BUTTON: &str = "ctl00$MainContent$BtnBusqueda";
const FIELD_UUID: &str = "ctl00$MainContent$TxtUUID";
const FIELD_STATE_VOUCHER: &str = "ctl00$MainContent$DdlEstadoComprobante";
const FIELD_COMPLEMENT: &str = "ctl00$MainContent$ddlComplementos";
const UPDATE_PANEL: &str = "ctl00$MainContent$UpnlBusqueda";

/// Turns a query into the two field sets of the search protocol.
pub trait Filters: Send + Sync {
    /// The query being translated.
    fn query(&self) -> &Query;

    /// Fields of the date filter.
    fn date_filters(&self) -> FormFields;

    /// Name of the counterpart RFC field.
    fn counterpart_rfc_field(&self) -> &'static str;

    /// Radio value of the filter mode.
    fn filter_mode(&self) -> &'static str {
        if self.query().has_uuid() {
            "RdoFolioFiscal"
        } else {
            "RdoFechas"
        }
    }

    /// Fields that switch the search form into the query's filter mode.
    fn initial_filters(&self) -> FormFields {
        let target = format!("ctl00$MainContent${}", self.filter_mode());
        fields([
            ("__ASYNCPOST", "true".to_string()),
            ("__EVENTARGUMENT", String::new()),
            ("__LASTFOCUS", String::new()),
            (FIELD_SCRIPT_MANAGER, format!("{UPDATE_PANEL}|{target}")),
            (FIELD_FILTER_MODE, self.filter_mode().to_string()),
            ("__EVENTTARGET", target),
        ])
    }

    /// Fields that run the search.
    fn request_filters(&self) -> FormFields {
        let query = self.query();
        let mut values = fields([
            ("__ASYNCPOST", "true".to_string()),
            ("__EVENTARGUMENT", String::new()),
            ("__EVENTTARGET", String::new()),
            ("__LASTFOCUS", String::new()),
            (FIELD_SCRIPT_MANAGER, format!("{UPDATE_PANEL}|{FIELD_SEARCH_BUTTON}")),
            (FIELD_SEARCH_BUTTON, "Buscar CFDI".to_string()),
            (FIELD_FILTER_MODE, self.filter_mode().to_string()),
        ]);

        if let Some(uuid) = query.uuid() {
            values.insert(FIELD_UUID.to_string(), uuid.to_string());
            return values;
        }

        values.extend(self.date_filters());
        values.insert(
            FIELD_STATE_VOUCHER.to_string(),
            query.state_voucher().value().to_string(),
        );
        values.insert(FIELD_COMPLEMENT.to_string(), query.complement().value().to_string());
        values.insert(
            self.counterpart_rfc_field().to_string(),
            query.rfc().unwrap_or_default().to_string(),
        );
        values
    }
}

/// Filters for the issued documents search.
#[derive(Debug, Clone, Copy)]
pub struct FiltersIssued<'a> {
    query: &'a Query,
}

impl<'a> FiltersIssued<'a> {
    /// Creates the strategy for `query`.
    #[must_use]
    pub fn new(query: &'a Query) -> Self {
        Self { query }
    }
}

impl Filters for FiltersIssued<'_> {
    fn query(&self) -> &Query {
        self.query
    }

    fn counterpart_rfc_field(&self) -> &'static str {
        "ctl00$MainContent$TxtRfcReceptor"
    }

    fn date_filters(&self) -> FormFields {
        let period = self.query.period();
        let mut values = FormFields::new();
        values.insert("ctl00$MainContent$hfInicialBool".into(), "false".into());
        calendar_fields(&mut values, "ctl00$MainContent$CldFechaInicial2", period.start());
        calendar_fields(&mut values, "ctl00$MainContent$CldFechaFinal2", period.end());
        values
    }
}

/// Filters for the received documents search.
///
/// The received search covers a single day, so only the start date is sent
/// together with the time range. A period ending on a later day searches
/// the start day until its last second.
#[derive(Debug, Clone, Copy)]
pub struct FiltersReceived<'a> {
    query: &'a Query,
}

impl<'a> FiltersReceived<'a> {
    /// Creates the strategy for `query`.
    #[must_use]
    pub fn new(query: &'a Query) -> Self {
        Self { query }
    }
}

impl Filters for FiltersReceived<'_> {
    fn query(&self) -> &Query {
        self.query
    }

    fn counterpart_rfc_field(&self) -> &'static str {
        "ctl00$MainContent$TxtRfcEmisor"
    }

    fn date_filters(&self) -> FormFields {
        let period = self.query.period();
        let start = period.start();
        let (end_hour, end_minute, end_second) = if period.is_single_day() {
            let end = period.end();
            (end.hour(), end.minute(), end.second())
        } else {
            (23, 59, 59)
        };

        fields([
            ("ctl00$MainContent$CldFecha$DdlAnio", start.format("%Y").to_string()),
            ("ctl00$MainContent$CldFecha$DdlMes", start.format("%-m").to_string()),
            ("ctl00$MainContent$CldFecha$DdlDia", start.format("%d").to_string()),
            ("ctl00$MainContent$CldFecha$DdlHora", start.hour().to_string()),
            ("ctl00$MainContent$CldFecha$DdlMinuto", start.minute().to_string()),
            ("ctl00$MainContent$CldFecha$DdlSegundo", start.second().to_string()),
            ("ctl00$MainContent$CldFecha$DdlHoraFin", end_hour.to_string()),
            ("ctl00$MainContent$CldFecha$DdlMinutoFin", end_minute.to_string()),
            ("ctl00$MainContent$CldFecha$DdlSegundoFin", end_second.to_string()),
        ])
    }
}

/// Selects the strategy for the query's direction.
#[must_use]
pub fn filters_for(query: &Query) -> Box<dyn Filters + '_> {
    match query.download_type() {
        DownloadType::Issued => Box::new(FiltersIssued::new(query)),
        DownloadType::Received => Box::new(FiltersReceived::new(query)),
    }
}

fn calendar_fields(values: &mut FormFields, prefix: &str, at: NaiveDateTime) {
    values.insert(format!("{prefix}$Calendario_text"), at.format("%d/%m/%Y").to_string());
    values.insert(format!("{prefix}$DdlHora"), at.hour().to_string());
    values.insert(format!("{prefix}$DdlMinuto"), at.minute().to_string());
    values.insert(format!("{prefix}$DdlSegundo"), at.second().to_string());
}

fn fields<const N: usize>(pairs: [(&str, String); N]) -> FormFields {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}
