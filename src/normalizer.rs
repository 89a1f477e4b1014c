//! Field alias normalization.
//!
//! The four intake forms were built at different times and spell some shared
//! concepts differently. Every alias is listed once in [`ALIASES`]; the
//! normalizer copies an alias onto its canonical field only when the canonical
//! field is absent, so running it twice changes nothing.

use serde_json::{Map, Value};

use crate::models::RequestKind;

/// One `alias -> canonical` mapping, scoped to a request kind.
#[derive(Debug, Clone, Copy)]
pub struct FieldAlias {
    pub kind: RequestKind,
    pub alias: &'static str,
    pub canonical: &'static str,
}

const fn alias(kind: RequestKind, alias: &'static str, canonical: &'static str) -> FieldAlias {
    FieldAlias {
        kind,
        alias,
        canonical,
    }
}

pub const ALIASES: &[FieldAlias] = &[
    alias(RequestKind::Import, "sourceCountry", "exportCountry"),
    alias(RequestKind::Export, "originCountry", "exportCountry"),
    alias(RequestKind::Logistics, "fromCountry", "exportCountry"),
    alias(RequestKind::Logistics, "toCountry", "destinationCountry"),
    alias(RequestKind::Logistics, "fromCity", "originCity"),
    alias(RequestKind::Logistics, "toCity", "destinationCity"),
    alias(RequestKind::Logistics, "cargoDescription", "productType"),
    alias(RequestKind::Suppliers, "preferredCountry", "destinationCountry"),
];

pub const SERVICE_NAME_FIELD: &str = "serviceName";

/// A field is absent when missing, `null`, or a blank string.
pub fn is_absent(record: &Map<String, Value>, field: &str) -> bool {
    match record.get(field) {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// Rewrites `raw` so the validator only ever sees canonical field names.
///
/// `service_name` is the looked-up service's resolved display string, used
/// when the submission did not carry a `serviceName` of its own.
pub fn normalize(kind: RequestKind, mut raw: Map<String, Value>, service_name: &str) -> Map<String, Value> {
    for rule in ALIASES.iter().filter(|rule| rule.kind == kind) {
        if is_absent(&raw, rule.canonical) && !is_absent(&raw, rule.alias) {
            if let Some(value) = raw.get(rule.alias).cloned() {
                tracing::debug!(
                    "Normalized {} field '{}' -> '{}'",
                    kind,
                    rule.alias,
                    rule.canonical
                );
                raw.insert(rule.canonical.to_string(), value);
            }
        }
    }

    if is_absent(&raw, SERVICE_NAME_FIELD) {
        raw.insert(
            SERVICE_NAME_FIELD.to_string(),
            Value::String(service_name.to_string()),
        );
    }

    raw
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected a JSON object"),
        }
    }

    #[test]
    fn logistics_aliases_fill_canonical_fields() {
        let raw = object(json!({"fromCountry": "China", "toCountry": "UAE"}));
        let out = normalize(RequestKind::Logistics, raw, "Shipping");
        assert_eq!(out["exportCountry"], "China");
        assert_eq!(out["destinationCountry"], "UAE");
        assert_eq!(out["serviceName"], "Shipping");
    }

    #[test]
    fn canonical_value_is_never_overwritten() {
        let raw = object(json!({"fromCountry": "China", "exportCountry": "Turkey"}));
        let out = normalize(RequestKind::Logistics, raw, "");
        assert_eq!(out["exportCountry"], "Turkey");
    }

    #[test]
    fn blank_canonical_counts_as_absent() {
        let raw = object(json!({"toCountry": "UAE", "destinationCountry": "  "}));
        let out = normalize(RequestKind::Logistics, raw, "");
        assert_eq!(out["destinationCountry"], "UAE");
    }

    #[test]
    fn aliases_are_scoped_to_their_kind() {
        let raw = object(json!({"fromCountry": "China"}));
        let out = normalize(RequestKind::Import, raw, "");
        assert!(out.get("exportCountry").is_none());
    }

    #[test]
    fn submitted_service_name_is_kept() {
        let raw = object(json!({"serviceName": "Custom name"}));
        let out = normalize(RequestKind::Export, raw, "Export");
        assert_eq!(out["serviceName"], "Custom name");
    }

    #[test]
    fn second_pass_is_a_no_op() {
        let raw = object(json!({
            "preferredCountry": "Germany",
            "serviceName": null,
        }));
        let once = normalize(RequestKind::Suppliers, raw, "Suppliers");
        let twice = normalize(RequestKind::Suppliers, once.clone(), "Suppliers");
        assert_eq!(once, twice);
    }
}
