//! Service-request schema registry and validator.
//!
//! One base schema covers the fields every request carries; each request kind
//! adds an extension schema. Schemas are plain tables of [`FieldRule`]s checked
//! in declaration order, and validation stops at the first failing field.
//! Accepted values are cleaned (trimmed, enum tags lower-cased, dates
//! canonicalised) and deserialized into the typed request structs.

use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;

use crate::models::{
    DeliveryTerm, HeardFrom, ObjectId, QualityLevel, RequestBase, RequestDetails, RequestKind,
    SearchType, ShipmentType, ShippingMethod, TypedRequest,
};

/// Simplified RFC 5322 address with a mandatory dotted domain.
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
    )
    .expect("email pattern compiles")
});

/// Free-form quantity: an optional currency or approximation sign, a digit,
/// then digits/punctuation, then an optional unit or description ("5000",
/// "$5,000.50", "~500", "5000 kg monthly").
static QUANTITY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[~+$€£]{0,2}\s?\d[\d\s.,/+\-~$€£%]*(?:\p{L}[\p{L}\d\s.,/+\-~$€£%]*)?$")
        .expect("quantity pattern compiles")
});

/// How a single field is checked and cleaned.
#[derive(Debug, Clone, Copy)]
pub enum FieldCheck {
    /// Trimmed text with a character-count range.
    Text { min: usize, max: usize },
    Email,
    ObjectId,
    /// Textual quantity or amount, never coerced to a number.
    Quantity,
    /// Calendar date, stored as `YYYY-MM-DD`.
    Date,
    /// Boolean option; absent means false.
    Flag,
    /// One of a closed set of lower-case tags.
    OneOf(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: &'static str,
    pub label: &'static str,
    pub required: bool,
    pub check: FieldCheck,
}

const fn required(field: &'static str, label: &'static str, check: FieldCheck) -> FieldRule {
    FieldRule {
        field,
        label,
        required: true,
        check,
    }
}

const fn optional(field: &'static str, label: &'static str, check: FieldCheck) -> FieldRule {
    FieldRule {
        field,
        label,
        required: false,
        check,
    }
}

const NAME: FieldCheck = FieldCheck::Text { min: 2, max: 100 };
const COUNTRY: FieldCheck = FieldCheck::Text { min: 2, max: 100 };
const PRODUCT: FieldCheck = FieldCheck::Text { min: 2, max: 200 };
const SPECIFICATIONS: FieldCheck = FieldCheck::Text { min: 10, max: 2000 };

/// Checked on its own before the catalog lookup.
pub const SERVICE_ID: FieldRule = required("serviceId", "Service id", FieldCheck::ObjectId);

pub const BASE_SCHEMA: &[FieldRule] = &[
    required("customerName", "Customer name", NAME),
    required("email", "Email", FieldCheck::Email),
    required("phone", "Phone", FieldCheck::Text { min: 3, max: 30 }),
    SERVICE_ID,
    // Filled from the catalog when not submitted, so no upper bound.
    optional("serviceName", "Service name", FieldCheck::Text { min: 1, max: usize::MAX }),
    optional("notes", "Notes", FieldCheck::Text { min: 1, max: 2000 }),
    optional(
        "hearAboutUs",
        "How did you hear about us",
        FieldCheck::OneOf(HeardFrom::VALUES),
    ),
];

pub const IMPORT_SCHEMA: &[FieldRule] = &[
    required("productType", "Product type", PRODUCT),
    required("productSpecifications", "Product specifications", SPECIFICATIONS),
    required("estimatedQuantity", "Estimated quantity", FieldCheck::Quantity),
    required("exportCountry", "Source country", COUNTRY),
    required("destinationCountry", "Destination country", COUNTRY),
    required("estimatedValue", "Estimated value", FieldCheck::Quantity),
    required(
        "preferredShippingMethod",
        "Preferred shipping method",
        FieldCheck::OneOf(ShippingMethod::VALUES),
    ),
    optional(
        "preferredDeliveryMethod",
        "Preferred delivery method",
        FieldCheck::OneOf(DeliveryTerm::VALUES),
    ),
    optional("readyDate", "Ready date", FieldCheck::Date),
    optional("desiredArrivalDate", "Desired arrival date", FieldCheck::Date),
    optional("customsAssistance", "Customs assistance", FieldCheck::Flag),
    optional("consultation", "Consultation", FieldCheck::Flag),
];

pub const EXPORT_SCHEMA: &[FieldRule] = &[
    required("productType", "Product type", PRODUCT),
    required("productSpecifications", "Product specifications", SPECIFICATIONS),
    required("estimatedQuantity", "Estimated quantity", FieldCheck::Quantity),
    required("exportCountry", "Export country", COUNTRY),
    required("destinationCountry", "Destination country", COUNTRY),
    required(
        "preferredShippingMethod",
        "Preferred shipping method",
        FieldCheck::OneOf(ShippingMethod::VALUES),
    ),
    required(
        "preferredDeliveryMethod",
        "Preferred delivery method",
        FieldCheck::OneOf(DeliveryTerm::VALUES),
    ),
    optional("productionCapacity", "Production capacity", FieldCheck::Quantity),
    optional("estimatedValue", "Estimated value", FieldCheck::Quantity),
    optional("readyDate", "Ready date", FieldCheck::Date),
    optional("qualityCertificate", "Quality certificate", FieldCheck::Flag),
    optional("packagingService", "Packaging service", FieldCheck::Flag),
];

pub const LOGISTICS_SCHEMA: &[FieldRule] = &[
    required("productType", "Cargo description", PRODUCT),
    required("exportCountry", "Origin country", COUNTRY),
    required("originCity", "Origin city", NAME),
    required("destinationCountry", "Destination country", COUNTRY),
    required("destinationCity", "Destination city", NAME),
    required(
        "shipmentType",
        "Shipment type",
        FieldCheck::OneOf(ShipmentType::VALUES),
    ),
    required("weight", "Weight", FieldCheck::Quantity),
    optional("volume", "Volume", FieldCheck::Quantity),
    optional("packageCount", "Package count", FieldCheck::Quantity),
    optional(
        "preferredDeliveryMethod",
        "Preferred delivery method",
        FieldCheck::OneOf(DeliveryTerm::VALUES),
    ),
    optional("readyDate", "Ready date", FieldCheck::Date),
    optional("insurance", "Insurance", FieldCheck::Flag),
    optional("tracking", "Tracking", FieldCheck::Flag),
    optional("doorToDoor", "Door to door", FieldCheck::Flag),
    optional("customsAgent", "Customs agent", FieldCheck::Flag),
];

pub const SUPPLIERS_SCHEMA: &[FieldRule] = &[
    required("searchType", "Search type", FieldCheck::OneOf(SearchType::VALUES)),
    required("productType", "Product type", PRODUCT),
    required("productSpecifications", "Product specifications", SPECIFICATIONS),
    required("expectedQuantity", "Expected quantity", FieldCheck::Quantity),
    required("preferredCountry", "Preferred country", COUNTRY),
    required("destinationCountry", "Destination country", COUNTRY),
    required(
        "qualityLevel",
        "Quality level",
        FieldCheck::OneOf(QualityLevel::VALUES),
    ),
    optional("factoryVisit", "Factory visit", FieldCheck::Flag),
    optional("negotiation", "Negotiation", FieldCheck::Flag),
    optional("sampleService", "Sample service", FieldCheck::Flag),
];

/// Extension schema for a request kind.
pub fn extension(kind: RequestKind) -> &'static [FieldRule] {
    match kind {
        RequestKind::Import => IMPORT_SCHEMA,
        RequestKind::Export => EXPORT_SCHEMA,
        RequestKind::Logistics => LOGISTICS_SCHEMA,
        RequestKind::Suppliers => SUPPLIERS_SCHEMA,
    }
}

/// The single reason a submission was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Required {
        field: &'static str,
        label: &'static str,
    },
    Invalid {
        field: &'static str,
        message: String,
    },
    InvalidDate {
        field: &'static str,
        label: &'static str,
    },
    /// Cleaned fields could not be mapped onto the typed request.
    Malformed(String),
}

impl ValidationError {
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ValidationError::Required { field, .. }
            | ValidationError::Invalid { field, .. }
            | ValidationError::InvalidDate { field, .. } => Some(*field),
            ValidationError::Malformed(_) => None,
        }
    }

    /// Human-readable message shown to the submitter.
    pub fn message(&self) -> String {
        match self {
            ValidationError::Required { label, .. } => format!("{} is required", label),
            ValidationError::Invalid { message, .. } => message.clone(),
            ValidationError::InvalidDate { label, .. } => {
                format!("{} is not a valid date (e.g. 2026-03-14 or 14/03/2026)", label)
            }
            ValidationError::Malformed(message) => message.clone(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Validates a normalized submission: base schema first, then the kind's
/// extension. Returns the first failure only.
pub fn validate(kind: RequestKind, record: &Map<String, Value>) -> Result<TypedRequest, ValidationError> {
    let base: RequestBase = typed(apply(BASE_SCHEMA, record)?)?;

    let fields = apply(extension(kind), record)?;
    let details = match kind {
        RequestKind::Import => RequestDetails::Import(typed(fields)?),
        RequestKind::Export => RequestDetails::Export(typed(fields)?),
        RequestKind::Logistics => RequestDetails::Logistics(typed(fields)?),
        RequestKind::Suppliers => RequestDetails::Suppliers(typed(fields)?),
    };

    Ok(TypedRequest { base, details })
}

/// Runs every rule of a schema in order, collecting cleaned values.
fn apply(schema: &[FieldRule], record: &Map<String, Value>) -> Result<Map<String, Value>, ValidationError> {
    let mut cleaned = Map::new();
    for rule in schema {
        if let Some(value) = check(rule, record.get(rule.field))? {
            cleaned.insert(rule.field.to_string(), value);
        }
    }
    Ok(cleaned)
}

fn typed<T: DeserializeOwned>(fields: Map<String, Value>) -> Result<T, ValidationError> {
    serde_json::from_value(Value::Object(fields))
        .map_err(|e| ValidationError::Malformed(format!("Submission could not be read: {}", e)))
}

fn invalid(rule: &FieldRule, message: String) -> ValidationError {
    ValidationError::Invalid {
        field: rule.field,
        message,
    }
}

/// Checks one field. `Ok(None)` means an optional field was absent.
pub fn check(rule: &FieldRule, raw: Option<&Value>) -> Result<Option<Value>, ValidationError> {
    let value = match raw {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(value) => Some(value),
    };

    let Some(value) = value else {
        if rule.required {
            return Err(ValidationError::Required {
                field: rule.field,
                label: rule.label,
            });
        }
        return Ok(None);
    };

    let cleaned = match rule.check {
        FieldCheck::Flag => return flag(rule, value).map(Some),
        FieldCheck::Text { min, max } => {
            let text = as_text(rule, value)?;
            let length = text.chars().count();
            if length < min {
                return Err(invalid(
                    rule,
                    format!("{} must be at least {} characters", rule.label, min),
                ));
            }
            if length > max {
                return Err(invalid(
                    rule,
                    format!("{} must be at most {} characters", rule.label, max),
                ));
            }
            text
        }
        FieldCheck::Email => {
            let email = as_text(rule, value)?.to_lowercase();
            if !EMAIL_REGEX.is_match(&email) {
                return Err(invalid(rule, "Please enter a valid email address".to_string()));
            }
            email
        }
        FieldCheck::ObjectId => ObjectId::parse(&as_text(rule, value)?)
            .map(|id| id.to_string())
            .ok_or_else(|| invalid(rule, format!("Invalid {}", rule.label.to_lowercase())))?,
        FieldCheck::Quantity => {
            let text = as_text(rule, value)?;
            if !QUANTITY_REGEX.is_match(&text) {
                return Err(invalid(
                    rule,
                    format!("{} must start with a number (e.g. 5000, $5000 or 5000 kg)", rule.label),
                ));
            }
            text
        }
        FieldCheck::Date => parse_date(&as_text(rule, value)?)
            .map(|date| date.format("%Y-%m-%d").to_string())
            .ok_or(ValidationError::InvalidDate {
                field: rule.field,
                label: rule.label,
            })?,
        FieldCheck::OneOf(values) => {
            let tag = as_text(rule, value)?.to_lowercase();
            if !values.contains(&tag.as_str()) {
                return Err(invalid(
                    rule,
                    format!("{} must be one of: {}", rule.label, values.join(", ")),
                ));
            }
            tag
        }
    };

    Ok(Some(Value::String(cleaned)))
}

fn flag(rule: &FieldRule, value: &Value) -> Result<Value, ValidationError> {
    match value {
        Value::Bool(flag) => Ok(Value::Bool(*flag)),
        Value::String(s) if s.trim().eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
        Value::String(s) if s.trim().eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
        _ => Err(invalid(rule, format!("{} must be true or false", rule.label))),
    }
}

/// Strings are trimmed; numbers are kept in their textual form.
fn as_text(rule: &FieldRule, value: &Value) -> Result<String, ValidationError> {
    match value {
        Value::String(s) => Ok(s.trim().to_string()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(invalid(rule, format!("{} must be text", rule.label))),
    }
}

/// Accepts `YYYY-MM-DD`, an RFC 3339 timestamp, or `DD/MM/YYYY`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| NaiveDate::parse_from_str(raw, "%d/%m/%Y").ok())
}

/// Whether `raw` is a syntactically plausible e-mail address.
pub fn is_valid_email(raw: &str) -> bool {
    EMAIL_REGEX.is_match(&raw.trim().to_lowercase())
}

/// Whether `raw` is an acceptable free-form quantity.
pub fn is_quantity(raw: &str) -> bool {
    QUANTITY_REGEX.is_match(raw.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rule(check: FieldCheck) -> FieldRule {
        required("field", "Field", check)
    }

    #[test]
    fn quantities_accept_free_form_units() {
        assert!(is_quantity("5000"));
        assert!(is_quantity("5,000.50"));
        assert!(is_quantity("5000 kg monthly"));
        assert!(is_quantity("10-20 tons"));
        assert!(is_quantity("٥٠٠ طن"));
        assert!(is_quantity("$5000"));
        assert!(is_quantity("~500"));
        assert!(is_quantity("+1000"));
        assert!(is_quantity("€ 1.200"));
        assert!(!is_quantity("about 500"));
        assert!(!is_quantity("kg"));
        assert!(!is_quantity("$"));
        assert!(!is_quantity("$$$5"));
    }

    #[test]
    fn emails_need_a_dotted_domain() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("  Trader@Example.co.uk "));
        assert!(!is_valid_email("user@localhost"));
        assert!(!is_valid_email("user example.com"));
        assert!(!is_valid_email("@example.com"));
    }

    #[test]
    fn dates_accept_three_layouts() {
        let expected = NaiveDate::from_ymd_opt(2026, 3, 14);
        assert_eq!(parse_date("2026-03-14"), expected);
        assert_eq!(parse_date("2026-03-14T10:00:00Z"), expected);
        assert_eq!(parse_date("14/03/2026"), expected);
        assert_eq!(parse_date("2026-02-30"), None);
        assert_eq!(parse_date("not-a-date"), None);
    }

    #[test]
    fn date_error_names_accepted_layouts() {
        let date = rule(FieldCheck::Date);
        let err = check(&date, Some(&json!("next week"))).unwrap_err();
        assert_eq!(err.message(), "Field is not a valid date (e.g. 2026-03-14 or 14/03/2026)");
        assert_eq!(
            check(&date, Some(&json!("14/03/2026"))).unwrap(),
            Some(json!("2026-03-14"))
        );
    }

    #[test]
    fn flags_accept_booleans_and_strings() {
        let flag = rule(FieldCheck::Flag);
        assert_eq!(check(&flag, Some(&json!(true))).unwrap(), Some(json!(true)));
        assert_eq!(check(&flag, Some(&json!("FALSE"))).unwrap(), Some(json!(false)));
        assert!(check(&flag, Some(&json!("yes"))).is_err());
    }

    #[test]
    fn enum_tags_are_lowercased() {
        let shipping = rule(FieldCheck::OneOf(ShippingMethod::VALUES));
        assert_eq!(check(&shipping, Some(&json!(" Sea "))).unwrap(), Some(json!("sea")));
        let err = check(&shipping, Some(&json!("rocket"))).unwrap_err();
        assert_eq!(err.message(), "Field must be one of: sea, air, land, express");
    }

    #[test]
    fn blank_required_field_is_missing() {
        let text = rule(FieldCheck::Text { min: 2, max: 10 });
        let err = check(&text, Some(&json!("   "))).unwrap_err();
        assert_eq!(err.message(), "Field is required");
    }

    #[test]
    fn numbers_are_kept_as_text() {
        let quantity = rule(FieldCheck::Quantity);
        assert_eq!(check(&quantity, Some(&json!(500))).unwrap(), Some(json!("500")));
    }

    #[test]
    fn every_kind_has_product_and_destination_rules() {
        for kind in [
            RequestKind::Import,
            RequestKind::Export,
            RequestKind::Logistics,
            RequestKind::Suppliers,
        ] {
            let fields: Vec<_> = extension(kind).iter().map(|r| r.field).collect();
            assert!(fields.contains(&"productType"), "{} lacks productType", kind);
            assert!(
                fields.contains(&"destinationCountry"),
                "{} lacks destinationCountry",
                kind
            );
            assert!(
                extension(kind)
                    .iter()
                    .any(|r| r.required && matches!(r.check, FieldCheck::Quantity)),
                "{} lacks a required estimate",
                kind
            );
        }
    }
}
