//! Search query value objects.
//!
//! A [`Query`] is built once and never mutated: the `with_*` methods consume
//! and return it. The direction-specific translation into portal form fields
//! lives in [`filters`].

pub mod filters;

pub use filters::{filters_for, Filters, FiltersIssued, FiltersReceived};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::InputError;

/// Which side of the document the caller is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadType {
    /// Documents issued by the identity.
    Issued,
    /// Documents received by the identity.
    Received,
}

impl Default for DownloadType {
    fn default() -> Self {
        Self::Issued
    }
}

impl fmt::Display for DownloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Issued => write!(f, "issued"),
            Self::Received => write!(f, "received"),
        }
    }
}

/// Voucher state filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateVoucher {
    /// Any state.
    Any,
    /// Only active vouchers.
    Active,
    /// Only cancelled vouchers.
    Cancelled,
}

impl Default for StateVoucher {
    fn default() -> Self {
        Self::Any
    }
}

impl StateVoucher {
    /// Value of the portal's state dropdown.
    #[must_use]
    pub fn value(self) -> &'static str {
        match self {
            Self::Any => "-1",
            Self::Active => "1",
            Self::Cancelled => "0",
        }
    }
}

/// Complement filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ComplementFilter {
    /// Any complement, or none.
    #[default]
    Any,
    /// A portal complement code (e.g. `nomina12`).
    Code(String),
}

impl ComplementFilter {
    /// Value of the portal's complement dropdown.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Any => "-1",
            Self::Code(code) => code,
        }
    }
}

/// Downloadable resource attached to a result row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    /// The CFDI XML.
    Xml,
    /// The printed representation.
    Pdf,
    /// The cancellation request acknowledgement.
    CancelRequest,
    /// The cancellation voucher.
    CancelVoucher,
}

impl Default for ResourceType {
    fn default() -> Self {
        Self::Xml
    }
}

impl ResourceType {
    /// All resource types.
    pub const ALL: [Self; 4] = [Self::Xml, Self::Pdf, Self::CancelRequest, Self::CancelVoucher];

    /// Metadata key holding the link for this resource.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Xml => "urlXml",
            Self::Pdf => "urlPdf",
            Self::CancelRequest => "urlCancelRequest",
            Self::CancelVoucher => "urlCancelVoucher",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Xml => write!(f, "xml"),
            Self::Pdf => write!(f, "pdf"),
            Self::CancelRequest => write!(f, "cancel_request"),
            Self::CancelVoucher => write!(f, "cancel_voucher"),
        }
    }
}

/// Inclusive date-time range, in portal local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateTimePeriod {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl DateTimePeriod {
    /// Creates a period, rejecting an end before the start.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, InputError> {
        if end < start {
            return Err(InputError::new(
                "period",
                format!("end {end} is before start {start}"),
            ));
        }
        Ok(Self { start, end })
    }

    /// Start of the period.
    #[must_use]
    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// End of the period.
    #[must_use]
    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Whether start and end fall on the same day.
    #[must_use]
    pub fn is_single_day(&self) -> bool {
        self.start.date() == self.end.date()
    }
}

/// What to search for on the portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    period: DateTimePeriod,
    download_type: DownloadType,
    state_voucher: StateVoucher,
    complement: ComplementFilter,
    resource_type: ResourceType,
    rfc: Option<String>,
    uuid: Option<String>,
}

impl Query {
    /// Creates a query for issued documents of any state within `period`.
    #[must_use]
    pub fn new(period: DateTimePeriod) -> Self {
        Self {
            period,
            download_type: DownloadType::default(),
            state_voucher: StateVoucher::default(),
            complement: ComplementFilter::default(),
            resource_type: ResourceType::default(),
            rfc: None,
            uuid: None,
        }
    }

    /// Sets the direction.
    #[must_use]
    pub fn with_download_type(mut self, download_type: DownloadType) -> Self {
        self.download_type = download_type;
        self
    }

    /// Sets the voucher state filter.
    #[must_use]
    pub fn with_state_voucher(mut self, state_voucher: StateVoucher) -> Self {
        self.state_voucher = state_voucher;
        self
    }

    /// Sets the complement filter.
    #[must_use]
    pub fn with_complement(mut self, complement: ComplementFilter) -> Self {
        self.complement = complement;
        self
    }

    /// Sets the resource the caller intends to download.
    #[must_use]
    pub fn with_resource_type(mut self, resource_type: ResourceType) -> Self {
        self.resource_type = resource_type;
        self
    }

    /// Filters by counterpart RFC. An empty value clears the filter.
    #[must_use]
    pub fn with_rfc(mut self, rfc: impl Into<String>) -> Self {
        let rfc = rfc.into();
        self.rfc = (!rfc.is_empty()).then_some(rfc);
        self
    }

    /// Searches one document by UUID instead of by date.
    pub fn with_uuid(mut self, uuid: &str) -> Result<Self, InputError> {
        if uuid.is_empty() {
            return Err(InputError::empty("UUID"));
        }
        uuid::Uuid::parse_str(uuid)
            .map_err(|e| InputError::new("UUID", format!("'{uuid}' is not a UUID: {e}")))?;
        self.uuid = Some(uuid.to_lowercase());
        Ok(self)
    }

    /// Date range.
    #[must_use]
    pub fn period(&self) -> &DateTimePeriod {
        &self.period
    }

    /// Direction.
    #[must_use]
    pub fn download_type(&self) -> DownloadType {
        self.download_type
    }

    /// Voucher state filter.
    #[must_use]
    pub fn state_voucher(&self) -> StateVoucher {
        self.state_voucher
    }

    /// Complement filter.
    #[must_use]
    pub fn complement(&self) -> &ComplementFilter {
        &self.complement
    }

    /// Resource the caller intends to download.
    #[must_use]
    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    /// Counterpart RFC filter.
    #[must_use]
    pub fn rfc(&self) -> Option<&str> {
        self.rfc.as_deref()
    }

    /// UUID filter.
    #[must_use]
    pub fn uuid(&self) -> Option<&str> {
        self.uuid.as_deref()
    }

    /// Whether this query searches by UUID.
    #[must_use]
    pub fn has_uuid(&self) -> bool {
        self.uuid.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_period_rejects_reversed_range() {
        let err = DateTimePeriod::new(at(2, 0, 0, 0), at(1, 0, 0, 0)).unwrap_err();
        assert_eq!(err.field, "period");

        let period = DateTimePeriod::new(at(1, 0, 0, 0), at(1, 0, 0, 0)).unwrap();
        assert!(period.is_single_day());
    }

    #[test]
    fn test_query_defaults() {
        let query = Query::new(DateTimePeriod::new(at(1, 0, 0, 0), at(2, 0, 0, 0)).unwrap());

        assert_eq!(query.download_type(), DownloadType::Issued);
        assert_eq!(query.state_voucher(), StateVoucher::Any);
        assert_eq!(query.complement(), &ComplementFilter::Any);
        assert_eq!(query.resource_type(), ResourceType::Xml);
        assert!(query.rfc().is_none());
        assert!(!query.has_uuid());
    }

    #[test]
    fn test_with_uuid_validates_and_lowercases() {
        let query = Query::new(DateTimePeriod::new(at(1, 0, 0, 0), at(2, 0, 0, 0)).unwrap());

        let query = query
            .with_uuid("B97262E5-704C-4BF7-AE26-9174FEF04D63")
            .unwrap();
        assert_eq!(query.uuid(), Some("b97262e5-704c-4bf7-ae26-9174fef04d63"));

        assert!(query.clone().with_uuid("not-a-uuid").is_err());
        assert_eq!(query.with_uuid("").unwrap_err(), InputError::empty("UUID"));
    }

    #[test]
    fn test_dropdown_values() {
        assert_eq!(StateVoucher::Any.value(), "-1");
        assert_eq!(StateVoucher::Active.value(), "1");
        assert_eq!(StateVoucher::Cancelled.value(), "0");
        assert_eq!(ComplementFilter::Code("nomina12".into()).value(), "nomina12");
        assert_eq!(ResourceType::CancelVoucher.key(), "urlCancelVoucher");
    }

    #[test]
    fn test_empty_rfc_clears_filter() {
        let query = Query::new(DateTimePeriod::new(at(1, 0, 0, 0), at(2, 0, 0, 0)).unwrap())
            .with_rfc("AAA010101AAA")
            .with_rfc("");
        assert!(query.rfc().is_none());
    }
}
