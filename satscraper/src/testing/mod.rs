//! Testing utilities for portal workflows.
//!
//! This module provides:
//! - A scripted HTTP gateway that replays canned responses and records requests
//! - A static credential with a fixed signature
//! - Builders for the portal pages the workflows read
//! - Assertions over recorded requests and metadata lists

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{assert_form_contains, assert_metadata_uuids, assert_request_sequence};
pub use fixtures::{challenge_page, delta_record, results_page, search_form_page, ResultRow};
pub use mocks::{RecordedRequest, ScriptedGateway, StaticCredential};
