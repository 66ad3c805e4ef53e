//! Search result records.

mod extractor;

pub use extractor::{MetadataExtractor, DEFAULT_CAPTIONS};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::errors::InputError;
use crate::query::ResourceType;

const UUID_KEY: &str = "uuid";

/// One search result, keyed by its lower-cased UUID.
///
/// The UUID always comes from the constructor argument: a `uuid` entry in
/// the attributes is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct Metadata {
    data: BTreeMap<String, String>,
}

impl Metadata {
    /// Creates a record, rejecting an empty UUID.
    pub fn new<I, K, V>(uuid: &str, attributes: I) -> Result<Self, InputError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        if uuid.is_empty() {
            return Err(InputError::empty("UUID"));
        }
        let mut data: BTreeMap<String, String> = attributes
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        data.insert(UUID_KEY.to_string(), uuid.to_lowercase());
        Ok(Self { data })
    }

    /// Lower-cased UUID.
    #[must_use]
    pub fn uuid(&self) -> &str {
        self.data.get(UUID_KEY).map_or("", String::as_str)
    }

    /// Attribute value, or `""` when absent.
    #[must_use]
    pub fn get(&self, key: &str) -> &str {
        self.data.get(key).map_or("", String::as_str)
    }

    /// Whether the attribute is present.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Download link for `resource`, or `""` when the portal offered none.
    #[must_use]
    pub fn resource_link(&self, resource: ResourceType) -> &str {
        self.get(resource.key())
    }

    /// Structured key → value view, `uuid` included.
    #[must_use]
    pub fn to_map(&self) -> &BTreeMap<String, String> {
        &self.data
    }
}

impl TryFrom<BTreeMap<String, String>> for Metadata {
    type Error = InputError;

    fn try_from(mut data: BTreeMap<String, String>) -> Result<Self, Self::Error> {
        let uuid = data.remove(UUID_KEY).unwrap_or_default();
        Self::new(&uuid, data)
    }
}

impl From<Metadata> for BTreeMap<String, String> {
    fn from(metadata: Metadata) -> Self {
        metadata.data
    }
}

/// Insertion-ordered records, unique by UUID.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataList {
    items: Vec<Metadata>,
    index: HashMap<String, usize>,
}

impl MetadataList {
    /// Creates a list from records; later duplicates replace earlier ones.
    #[must_use]
    pub fn new(items: impl IntoIterator<Item = Metadata>) -> Self {
        let mut list = Self::default();
        for item in items {
            list.insert(item);
        }
        list
    }

    /// Adds a record. A record with a known UUID replaces the old one and
    /// keeps its position.
    pub fn insert(&mut self, item: Metadata) {
        if let Some(&position) = self.index.get(item.uuid()) {
            self.items[position] = item;
        } else {
            self.index.insert(item.uuid().to_string(), self.items.len());
            self.items.push(item);
        }
    }

    /// Adds every record of `other`.
    pub fn merge(&mut self, other: MetadataList) {
        for item in other {
            self.insert(item);
        }
    }

    /// Record by UUID, in any case.
    #[must_use]
    pub fn get(&self, uuid: &str) -> Option<&Metadata> {
        self.index
            .get(&uuid.to_lowercase())
            .and_then(|&position| self.items.get(position))
    }

    /// Whether a record with the UUID exists.
    #[must_use]
    pub fn has(&self, uuid: &str) -> bool {
        self.get(uuid).is_some()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates the records in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Metadata> {
        self.items.iter()
    }

    /// Records that carry a link for `resource`.
    #[must_use]
    pub fn filter_with_resource_link(&self, resource: ResourceType) -> Self {
        Self::new(
            self.iter()
                .filter(|item| !item.resource_link(resource).is_empty())
                .cloned(),
        )
    }

    /// Records whose UUID is one of `uuids`, in any case.
    #[must_use]
    pub fn filter_with_uuids<S: AsRef<str>>(&self, uuids: &[S]) -> Self {
        Self::new(
            uuids
                .iter()
                .filter_map(|uuid| self.get(uuid.as_ref()))
                .cloned(),
        )
    }
}

impl IntoIterator for MetadataList {
    type Item = Metadata;
    type IntoIter = std::vec::IntoIter<Metadata>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a MetadataList {
    type Item = &'a Metadata;
    type IntoIter = std::slice::Iter<'a, Metadata>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl FromIterator<Metadata> for MetadataList {
    fn from_iter<T: IntoIterator<Item = Metadata>>(iter: T) -> Self {
        Self::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::assert_metadata_uuids;
    use pretty_assertions::assert_eq;

    const UUID: &str = "B97262E5-704C-4BF7-AE26-9174FEF04D63";

    fn metadata(uuid: &str, total: &str) -> Metadata {
        Metadata::new(uuid, [("total", total)]).unwrap()
    }

    #[test]
    fn test_uuid_is_lowercased_and_attributes_kept() {
        let item = Metadata::new(UUID, [("rfcEmisor", "AAA010101AAA"), ("total", "10.00")]).unwrap();

        assert_eq!(item.uuid(), UUID.to_lowercase());
        assert_eq!(item.get("rfcEmisor"), "AAA010101AAA");
        assert_eq!(item.get("total"), "10.00");
        assert!(item.has("total"));
    }

    #[test]
    fn test_empty_uuid_is_rejected() {
        let err = Metadata::new("", [("uuid", "X")]).unwrap_err();
        assert_eq!(err, InputError::empty("UUID"));
    }

    #[test]
    fn test_uuid_attribute_cannot_override() {
        let item = Metadata::new(UUID, [("uuid", "X")]).unwrap();
        assert_eq!(item.uuid(), UUID.to_lowercase());
    }

    #[test]
    fn test_get_missing_key_is_empty() {
        let item = Metadata::new(UUID, Vec::<(String, String)>::new()).unwrap();
        assert_eq!(item.get("nombreEmisor"), "");
        assert!(!item.has("nombreEmisor"));
        assert_eq!(item.resource_link(ResourceType::Pdf), "");
    }

    #[test]
    fn test_structured_view_round_trip() {
        let item = Metadata::new(UUID, [("total", "10.00"), ("urlXml", "https://x")]).unwrap();
        let view = item.to_map().clone();

        let rebuilt = Metadata::new(&view["uuid"], view.clone()).unwrap();
        assert_eq!(rebuilt, item);

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["uuid"], UUID.to_lowercase());
        let parsed: Metadata = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, item);
    }

    #[test]
    fn test_deserialize_without_uuid_fails() {
        let result: Result<Metadata, _> = serde_json::from_str(r#"{"total":"1"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_list_last_write_wins_in_place() {
        let list = MetadataList::new([
            metadata("aaaaaaaa-0000-0000-0000-000000000001", "1"),
            metadata("aaaaaaaa-0000-0000-0000-000000000002", "2"),
            metadata("AAAAAAAA-0000-0000-0000-000000000001", "3"),
        ]);

        assert_eq!(list.len(), 2);
        assert_metadata_uuids(
            &list,
            &["aaaaaaaa-0000-0000-0000-000000000001", "aaaaaaaa-0000-0000-0000-000000000002"],
        );
        assert_eq!(list.get("AAAAAAAA-0000-0000-0000-000000000001").unwrap().get("total"), "3");
    }

    #[test]
    fn test_list_merge_and_filters() {
        let mut list = MetadataList::new([Metadata::new(
            "aaaaaaaa-0000-0000-0000-000000000001",
            [("urlXml", "https://x/1")],
        )
        .unwrap()]);
        list.merge(MetadataList::new([metadata("aaaaaaaa-0000-0000-0000-000000000002", "2")]));

        assert_eq!(list.len(), 2);
        assert!(list.has("aaaaaaaa-0000-0000-0000-000000000002"));

        let with_xml = list.filter_with_resource_link(ResourceType::Xml);
        assert_metadata_uuids(&with_xml, &["aaaaaaaa-0000-0000-0000-000000000001"]);

        let picked = list.filter_with_uuids(&["AAAAAAAA-0000-0000-0000-000000000002", "missing"]);
        assert_metadata_uuids(&picked, &["aaaaaaaa-0000-0000-0000-000000000002"]);
        assert!(MetadataList::default().is_empty());
    }
}
