use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::errors::AppError;

/// Declares a closed string enumeration with its wire tags.
///
/// Every generated enum exposes `VALUES` (the accepted tags, in declaration
/// order), `as_str` and `parse`, so the schema tables and serde agree on the
/// spelling of each tag.
macro_rules! choice_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $tag:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $tag)]
                $variant,
            )+
        }

        impl $name {
            pub const VALUES: &'static [&'static str] = &[$($tag),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $tag,)+
                }
            }

            pub fn parse(raw: &str) -> Option<Self> {
                match raw {
                    $($tag => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

// ============ Identifiers ============

/// Opaque 24-character hexadecimal document identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(String);

impl ObjectId {
    pub const LEN: usize = 24;

    /// Parses an identifier, accepting either hex case and storing it lower-case.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.len() == Self::LEN && raw.bytes().all(|b| b.is_ascii_hexdigit()) {
            Some(Self(raw.to_ascii_lowercase()))
        } else {
            None
        }
    }

    /// Generates a fresh identifier: 4-byte big-endian timestamp followed by
    /// 8 random bytes.
    pub fn generate() -> Self {
        let seconds = Utc::now().timestamp().max(0) as u32;
        let random = Uuid::new_v4();

        let mut id = format!("{:08x}", seconds);
        for byte in &random.as_bytes()[..8] {
            id.push_str(&format!("{:02x}", byte));
        }
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ObjectId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ObjectId::parse(&value).ok_or_else(|| format!("invalid object id: {}", value))
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============ Localized text ============

/// A display string that is either a single plain value or a per-locale map.
///
/// Resolution order for a requested locale: the locale itself, `ar`, `en`,
/// then the plain value (empty for map-shaped names).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "RawLocaleText", into = "RawLocaleText")]
pub struct LocaleText {
    primary: String,
    by_locale: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawLocaleText {
    Plain(String),
    Localized(BTreeMap<String, String>),
}

impl From<RawLocaleText> for LocaleText {
    fn from(raw: RawLocaleText) -> Self {
        match raw {
            RawLocaleText::Plain(primary) => LocaleText::plain(primary),
            RawLocaleText::Localized(by_locale) => LocaleText {
                primary: String::new(),
                by_locale,
            },
        }
    }
}

impl From<LocaleText> for RawLocaleText {
    fn from(text: LocaleText) -> Self {
        if text.by_locale.is_empty() {
            RawLocaleText::Plain(text.primary)
        } else {
            RawLocaleText::Localized(text.by_locale)
        }
    }
}

impl LocaleText {
    pub const FALLBACK_LOCALES: [&'static str; 2] = ["ar", "en"];

    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            primary: text.into(),
            by_locale: BTreeMap::new(),
        }
    }

    pub fn localized<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            primary: String::new(),
            by_locale: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn resolve(&self, locale: &str) -> &str {
        std::iter::once(locale)
            .chain(Self::FALLBACK_LOCALES)
            .filter_map(|code| self.by_locale.get(code))
            .map(|value| value.trim())
            .find(|value| !value.is_empty())
            .unwrap_or(self.primary.as_str())
    }
}

// ============ Service catalog ============

choice_enum! {
    /// Catalog visibility of a service.
    ServiceStatus {
        Active => "active",
        Inactive => "inactive",
    }
}

/// A catalog entry offered on the site. Read-only to the intake pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: ObjectId,
    pub name: LocaleText,
    pub status: ServiceStatus,
    #[serde(default)]
    pub display_order: i32,
}

/// Public catalog listing entry with the name resolved for one locale.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceView {
    pub id: ObjectId,
    pub name: String,
    pub display_order: i32,
}

impl Service {
    pub fn view(&self, locale: &str) -> ServiceView {
        ServiceView {
            id: self.id.clone(),
            name: self.name.resolve(locale).to_string(),
            display_order: self.display_order,
        }
    }
}

// ============ Request enumerations ============

choice_enum! {
    /// The four shapes a service request can take. Fixed at creation.
    RequestKind {
        Import => "import",
        Export => "export",
        Logistics => "logistics",
        Suppliers => "suppliers",
    }
}

choice_enum! {
    /// Lifecycle status of a stored request.
    RequestStatus {
        Pending => "pending",
        InProgress => "in_progress",
        Completed => "completed",
        Rejected => "rejected",
    }
}

impl RequestStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RequestStatus::Completed | RequestStatus::Rejected)
    }

    /// Whether an administrator may move a request from `self` to `next`.
    /// Re-applying the current status is always allowed.
    pub fn can_transition_to(self, next: RequestStatus) -> bool {
        use RequestStatus::*;
        if self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        matches!((self, next), (Pending, InProgress) | (InProgress, Completed) | (_, Rejected))
    }
}

choice_enum! {
    /// "How did you hear about us" answer.
    HeardFrom {
        Google => "google",
        SocialMedia => "social_media",
        Friend => "friend",
        Exhibition => "exhibition",
        Other => "other",
    }
}

choice_enum! {
    ShippingMethod {
        Sea => "sea",
        Air => "air",
        Land => "land",
        Express => "express",
    }
}

choice_enum! {
    /// Delivery terms (Incoterms subset offered on the forms).
    DeliveryTerm {
        Exw => "exw",
        Fob => "fob",
        Cif => "cif",
        Dap => "dap",
        Ddp => "ddp",
    }
}

choice_enum! {
    ShipmentType {
        General => "general",
        Refrigerated => "refrigerated",
        Hazardous => "hazardous",
        Fragile => "fragile",
        Bulk => "bulk",
        Container => "container",
    }
}

choice_enum! {
    QualityLevel {
        Economy => "economy",
        Standard => "standard",
        Premium => "premium",
    }
}

choice_enum! {
    /// What a supplier-matching request is looking for.
    SearchType {
        Supplier => "supplier",
        Importer => "importer",
    }
}

// ============ Kind-specific request details ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportDetails {
    pub product_type: String,
    pub product_specifications: String,
    pub estimated_quantity: String,
    /// Country the goods are sourced from.
    pub export_country: String,
    pub destination_country: String,
    pub estimated_value: String,
    pub preferred_shipping_method: ShippingMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_delivery_method: Option<DeliveryTerm>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired_arrival_date: Option<NaiveDate>,
    #[serde(default)]
    pub customs_assistance: bool,
    #[serde(default)]
    pub consultation: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDetails {
    pub product_type: String,
    pub product_specifications: String,
    pub estimated_quantity: String,
    pub export_country: String,
    pub destination_country: String,
    pub preferred_shipping_method: ShippingMethod,
    pub preferred_delivery_method: DeliveryTerm,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub production_capacity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready_date: Option<NaiveDate>,
    #[serde(default)]
    pub quality_certificate: bool,
    #[serde(default)]
    pub packaging_service: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogisticsDetails {
    pub product_type: String,
    pub export_country: String,
    pub origin_city: String,
    pub destination_country: String,
    pub destination_city: String,
    pub shipment_type: ShipmentType,
    pub weight: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_count: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_delivery_method: Option<DeliveryTerm>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready_date: Option<NaiveDate>,
    #[serde(default)]
    pub insurance: bool,
    #[serde(default)]
    pub tracking: bool,
    #[serde(default)]
    pub door_to_door: bool,
    #[serde(default)]
    pub customs_agent: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierDetails {
    pub search_type: SearchType,
    pub product_type: String,
    pub product_specifications: String,
    pub expected_quantity: String,
    pub preferred_country: String,
    pub destination_country: String,
    pub quality_level: QualityLevel,
    #[serde(default)]
    pub factory_visit: bool,
    #[serde(default)]
    pub negotiation: bool,
    #[serde(default)]
    pub sample_service: bool,
}

/// Kind-specific half of a request, tagged by `serviceType` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "serviceType")]
pub enum RequestDetails {
    #[serde(rename = "import")]
    Import(ImportDetails),
    #[serde(rename = "export")]
    Export(ExportDetails),
    #[serde(rename = "logistics")]
    Logistics(LogisticsDetails),
    #[serde(rename = "suppliers")]
    Suppliers(SupplierDetails),
}

impl RequestDetails {
    pub fn kind(&self) -> RequestKind {
        match self {
            RequestDetails::Import(_) => RequestKind::Import,
            RequestDetails::Export(_) => RequestKind::Export,
            RequestDetails::Logistics(_) => RequestKind::Logistics,
            RequestDetails::Suppliers(_) => RequestKind::Suppliers,
        }
    }

    pub fn product_type(&self) -> &str {
        match self {
            RequestDetails::Import(d) => &d.product_type,
            RequestDetails::Export(d) => &d.product_type,
            RequestDetails::Logistics(d) => &d.product_type,
            RequestDetails::Suppliers(d) => &d.product_type,
        }
    }

    pub fn destination_country(&self) -> &str {
        match self {
            RequestDetails::Import(d) => &d.destination_country,
            RequestDetails::Export(d) => &d.destination_country,
            RequestDetails::Logistics(d) => &d.destination_country,
            RequestDetails::Suppliers(d) => &d.destination_country,
        }
    }

    /// Supplier searches have no origin country.
    pub fn export_country(&self) -> Option<&str> {
        match self {
            RequestDetails::Import(d) => Some(&d.export_country),
            RequestDetails::Export(d) => Some(&d.export_country),
            RequestDetails::Logistics(d) => Some(&d.export_country),
            RequestDetails::Suppliers(_) => None,
        }
    }
}

// ============ Validated submission ============

/// Fields shared by every kind, as accepted by the base schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestBase {
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub service_id: ObjectId,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub hear_about_us: Option<HeardFrom>,
}

/// A submission that passed both validation phases.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedRequest {
    pub base: RequestBase,
    pub details: RequestDetails,
}

impl TypedRequest {
    pub fn kind(&self) -> RequestKind {
        self.details.kind()
    }
}

// ============ Stored entity ============

/// The service request as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub service_id: ObjectId,
    pub service_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hear_about_us: Option<HeardFrom>,
    #[serde(flatten)]
    pub details: RequestDetails,
    pub status: RequestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ServiceRequest {
    pub fn kind(&self) -> RequestKind {
        self.details.kind()
    }

    /// Applies an administrator's status/notes change and re-stamps `updatedAt`.
    pub fn apply_admin_update(
        &mut self,
        update: &AdminUpdate,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        if let Some(next) = update.status {
            if !self.status.can_transition_to(next) {
                return Err(AppError::BadRequest(format!(
                    "Cannot change status from {} to {}",
                    self.status, next
                )));
            }
            self.status = next;
        }
        if let Some(notes) = &update.admin_notes {
            let notes = notes.trim();
            self.admin_notes = (!notes.is_empty()).then(|| notes.to_string());
        }
        self.updated_at = now;
        Ok(())
    }
}

/// A stored request together with its document identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRequestRecord {
    pub id: ObjectId,
    #[serde(flatten)]
    pub request: ServiceRequest,
}

// ============ API Request/Response Models ============

/// Query parameters accepted by the intake endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct SubmitQuery {
    pub locale: Option<String>,
}

/// Successful intake response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub success: bool,
    pub request_id: ObjectId,
    pub request: ServiceRequestRecord,
}

/// Admin change to a stored request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUpdate {
    pub status: Option<RequestStatus>,
    pub admin_notes: Option<String>,
}

/// Admin listing filter. Prefix filters are case-insensitive.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestFilter {
    pub status: Option<RequestStatus>,
    pub service_type: Option<RequestKind>,
    pub service_id: Option<String>,
    pub product_type: Option<String>,
    pub destination_country: Option<String>,
    pub export_country: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl RequestFilter {
    pub const DEFAULT_LIMIT: u32 = 10;
    pub const MAX_LIMIT: u32 = 100;

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page() - 1) * u64::from(self.limit())
    }

    /// Trimmed, non-empty value of an optional text filter.
    pub fn term(value: &Option<String>) -> Option<&str> {
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    /// In-process evaluation of the filter, mirroring the SQL the Postgres
    /// store builds.
    pub fn matches(&self, record: &ServiceRequestRecord) -> bool {
        let request = &record.request;

        if self.status.is_some_and(|s| s != request.status) {
            return false;
        }
        if self.service_type.is_some_and(|k| k != request.kind()) {
            return false;
        }
        if let Some(service_id) = Self::term(&self.service_id) {
            if !request.service_id.as_str().eq_ignore_ascii_case(service_id) {
                return false;
            }
        }

        let starts_with = |value: Option<&str>, prefix: &str| {
            value.is_some_and(|v| v.to_lowercase().starts_with(&prefix.to_lowercase()))
        };
        if let Some(prefix) = Self::term(&self.product_type) {
            if !starts_with(Some(request.details.product_type()), prefix) {
                return false;
            }
        }
        if let Some(prefix) = Self::term(&self.destination_country) {
            if !starts_with(Some(request.details.destination_country()), prefix) {
                return false;
            }
        }
        if let Some(prefix) = Self::term(&self.export_country) {
            if !starts_with(request.details.export_country(), prefix) {
                return false;
            }
        }

        if let Some(search) = Self::term(&self.search) {
            let needle = search.to_lowercase();
            let haystack = [
                Some(request.customer_name.as_str()),
                Some(request.email.as_str()),
                Some(request.phone.as_str()),
                Some(request.details.product_type()),
                Some(request.service_name.as_str()),
                request.notes.as_deref(),
            ];
            if !haystack
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&needle))
            {
                return false;
            }
        }

        true
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        Self {
            page,
            limit,
            total,
            pages: total.div_ceil(u64::from(limit.max(1))),
        }
    }
}

/// One page of the admin listing.
#[derive(Debug, Clone, Serialize)]
pub struct RequestPage {
    pub requests: Vec<ServiceRequestRecord>,
    pub pagination: Pagination,
}
