//! Assertions over recorded requests and metadata.

use super::RecordedRequest;
use crate::metadata::MetadataList;

/// Asserts the method and URL of every recorded request, in order.
pub fn assert_request_sequence(requests: &[RecordedRequest], expected: &[(&str, &str)]) {
    let actual: Vec<(&str, &str)> = requests.iter().map(|r| (r.method(), r.url())).collect();
    assert_eq!(
        actual, expected,
        "Expected request sequence {expected:?}, got {actual:?}"
    );
}

/// Asserts that a POST request carried `field` with `value`.
pub fn assert_form_contains(request: &RecordedRequest, field: &str, value: &str) {
    let form = request
        .form()
        .unwrap_or_else(|| panic!("Expected a POST to {}, got a GET", request.url()));
    assert_eq!(
        form.get(field).map(String::as_str),
        Some(value),
        "Expected field '{field}' = '{value}'. Fields: {:?}",
        form.keys().collect::<Vec<_>>()
    );
}

/// Asserts the UUIDs of a metadata list, in order.
pub fn assert_metadata_uuids(list: &MetadataList, expected: &[&str]) {
    let actual: Vec<&str> = list.iter().map(|m| m.uuid()).collect();
    assert_eq!(actual, expected, "Expected UUIDs {expected:?}, got {actual:?}");
}
