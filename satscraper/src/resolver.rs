//! The stateful search protocol.
//!
//! A search takes three round trips on the same endpoint:
//!
//! 1. GET the search page and read its form.
//! 2. POST the form with the initial filters. The portal answers with a
//!    partial postback whose hidden fields reflect the chosen filter mode.
//! 3. POST the form again with the request filters and the refreshed hidden
//!    fields. The answer holds the result table.
//!
//! The hidden state is passed from one step to the next and never kept on
//! the resolver.

use std::sync::Arc;
use tracing::{debug, info};

use crate::errors::{ParseError, Result};
use crate::html::{normalize_charset, DeltaResponseParser, FormExtractor, HtmlForm};
use crate::http::FormFields;
use crate::metadata::{MetadataExtractor, MetadataList};
use crate::portal::{urls, PortalGateway};
use crate::query::{filters_for, DownloadType, Query};
use crate::session::SessionManager;

const SEARCH_FORM_SELECTOR: &str = "form#aspnetForm";
const SEARCH_FORM_EXCLUSIONS: [&str; 1] = ["^seleccionador$"];

const STEP_READ_SEARCH_FORM: &str = "read search form";
const STEP_SELECT_FILTER_MODE: &str = "select filter mode";
const STEP_READ_HIDDEN_STATE: &str = "read refreshed hidden state";
const STEP_RUN_SEARCH: &str = "run search";

/// Runs searches on an authenticated portal session.
#[derive(Clone)]
pub struct QueryResolver {
    gateway: PortalGateway,
    form_extractor: Arc<dyn FormExtractor>,
    metadata_extractor: MetadataExtractor,
}

impl std::fmt::Debug for QueryResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryResolver")
            .field("gateway", &self.gateway)
            .field("metadata_extractor", &self.metadata_extractor)
            .finish_non_exhaustive()
    }
}

impl QueryResolver {
    /// Creates a resolver over the gateway of an authenticated session.
    pub fn new(gateway: PortalGateway) -> Result<Self> {
        Ok(Self {
            gateway,
            form_extractor: Arc::new(HtmlForm::excluding(SEARCH_FORM_EXCLUSIONS)?),
            metadata_extractor: MetadataExtractor::new(),
        })
    }

    /// Creates a resolver sharing the gateway of `session`.
    pub fn from_session(session: &dyn SessionManager) -> Result<Self> {
        Self::new(session.http_gateway()?.clone())
    }

    /// Replaces the form extractor.
    #[must_use]
    pub fn with_form_extractor(mut self, extractor: Arc<dyn FormExtractor>) -> Self {
        self.form_extractor = extractor;
        self
    }

    /// Replaces the result table reader.
    #[must_use]
    pub fn with_metadata_extractor(mut self, extractor: MetadataExtractor) -> Self {
        self.metadata_extractor = extractor;
        self
    }

    /// Gets the gateway.
    #[must_use]
    pub fn gateway(&self) -> &PortalGateway {
        &self.gateway
    }

    /// Search endpoint for a direction.
    #[must_use]
    pub fn search_url(download_type: DownloadType) -> &'static str {
        match download_type {
            DownloadType::Issued => urls::SAT_URL_PORTAL_CFDI_CONSULTA_EMISOR,
            DownloadType::Received => urls::SAT_URL_PORTAL_CFDI_CONSULTA_RECEPTOR,
        }
    }

    /// Runs the search for `query`.
    ///
    /// No request is retried: a transport failure on any step is returned
    /// as is.
    pub async fn resolve(&self, query: &Query) -> Result<MetadataList> {
        let url = Self::search_url(query.download_type());
        let filters = filters_for(query);
        debug!(url, download_type = %query.download_type(), uuid = ?query.uuid(), "resolving query");

        let html = normalize_charset(&self.gateway.get_search_page(url).await?);
        let base = self.read_search_form(&html)?;

        let mut initial = base.clone();
        initial.extend(filters.initial_filters());
        debug!(step = STEP_SELECT_FILTER_MODE, fields = initial.len(), "posting search form");
        let body = self
            .gateway
            .post_ajax_search(STEP_SELECT_FILTER_MODE, url, &initial)
            .await?;
        let hidden_state = read_hidden_state(&body)?;

        let mut search = base;
        search.extend(filters.request_filters());
        search.extend(hidden_state);
        debug!(step = STEP_RUN_SEARCH, fields = search.len(), "posting search form");
        let body = self
            .gateway
            .post_ajax_search(STEP_RUN_SEARCH, url, &search)
            .await?;

        let list = self.metadata_extractor.extract(&body)?;
        info!(url, count = list.len(), "query resolved");
        Ok(list)
    }

    fn read_search_form(&self, html: &str) -> Result<FormFields> {
        let fields = self
            .form_extractor
            .extract_fields(html, SEARCH_FORM_SELECTOR)
            .map_err(|e| ParseError::new(STEP_READ_SEARCH_FORM, e.message))?;
        if fields.is_empty() {
            return Err(ParseError::new(STEP_READ_SEARCH_FORM, "search form not found").into());
        }
        Ok(fields)
    }
}

fn read_hidden_state(body: &str) -> Result<FormFields> {
    let fields = DeltaResponseParser::hidden_fields(body)
        .map_err(|e| ParseError::new(STEP_READ_HIDDEN_STATE, e.message))?;
    if fields.is_empty() {
        return Err(ParseError::new(STEP_READ_HIDDEN_STATE, "response carries no hidden fields").into());
    }
    Ok(fields)
}
