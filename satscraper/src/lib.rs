//! # satscraper
//!
//! A client for the SAT CFDI portal, which has no programmatic API.
//!
//! The crate emulates the two browser workflows the portal offers:
//!
//! - **Login**: a certificate challenge signed with the taxpayer's FIEL, or
//!   a user and password (CIEC) form
//! - **Search**: a three step ASP.NET postback dance that returns the
//!   metadata of issued or received CFDI
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use satscraper::prelude::*;
//!
//! let gateway = PortalGateway::from_gateway(ReqwestGateway::new(GatewayConfig::default())?);
//! let mut session = FielSessionManager::create(credential).with_http_gateway(gateway);
//! session.access_portal_main_page().await?;
//!
//! let query = Query::new(DateTimePeriod::new(start, end)?)
//!     .with_download_type(DownloadType::Received);
//! let list = QueryResolver::from_session(&session)?.resolve(&query).await?;
//! for item in list.filter_with_resource_link(ResourceType::Xml) {
//!     println!("{} {}", item.uuid(), item.resource_link(ResourceType::Xml));
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod credential;
pub mod errors;
pub mod html;
pub mod http;
pub mod metadata;
pub mod portal;
pub mod query;
pub mod resolver;
pub mod session;
pub mod telemetry;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::credential::{Credential, FielSessionData, SignatureAlgorithm};
    pub use crate::errors::{
        CredentialError, InputError, LoginError, LoginErrorKind, ParseError, Result,
        ScraperError, TransportError,
    };
    pub use crate::html::{FormExtractor, HtmlForm};
    pub use crate::http::{GatewayConfig, HttpGateway, ReqwestGateway};
    pub use crate::metadata::{Metadata, MetadataExtractor, MetadataList};
    pub use crate::portal::PortalGateway;
    pub use crate::query::{
        ComplementFilter, DateTimePeriod, DownloadType, Query, ResourceType, StateVoucher,
    };
    pub use crate::resolver::QueryResolver;
    pub use crate::session::{
        CiecSessionData, CiecSessionManager, FielSessionManager, SessionManager, SessionState,
    };
    pub use crate::telemetry::{init_tracing, TelemetryConfig};
}
