//! Request kind classification.
//!
//! A submission either declares its kind through `serviceType` or the kind is
//! inferred from the target service's display name. Inference is a fixed,
//! ordered list of bilingual substring rules; the first rule whose terms
//! appear in the lower-cased name wins.

use crate::models::{LocaleText, RequestKind};

/// Ordered inference rules. Order is significant: a name mentioning both
/// export and shipping classifies as `export`.
const RULES: &[(RequestKind, &[&str])] = &[
    (RequestKind::Import, &["استيراد", "import"]),
    (RequestKind::Export, &["تصدير", "export"]),
    (
        RequestKind::Logistics,
        &["شحن", "لوجست", "shipping", "logistic", "freight"],
    ),
    (
        RequestKind::Suppliers,
        &["تخليص", "جمرك", "customs", "clearance"],
    ),
];

/// Kind used when no rule matches.
pub const DEFAULT_KIND: RequestKind = RequestKind::Suppliers;

/// Resolves the request kind for a submission.
///
/// A valid explicit tag is returned as-is. Anything else (absent, blank or an
/// unknown tag) falls through to name-based inference.
pub fn classify(explicit: Option<&str>, service_name: &LocaleText, locale: &str) -> RequestKind {
    if let Some(kind) = explicit.and_then(RequestKind::parse) {
        return kind;
    }
    infer(service_name.resolve(locale))
}

/// Name-based inference on an already resolved display string.
pub fn infer(name: &str) -> RequestKind {
    let name = name.to_lowercase();
    RULES
        .iter()
        .find(|(_, terms)| terms.iter().any(|term| name.contains(term)))
        .map(|(kind, _)| *kind)
        .unwrap_or(DEFAULT_KIND)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_each_family_in_both_languages() {
        assert_eq!(infer("استيراد من الصين"), RequestKind::Import);
        assert_eq!(infer("Import from China"), RequestKind::Import);
        assert_eq!(infer("تصدير"), RequestKind::Export);
        assert_eq!(infer("EXPORT services"), RequestKind::Export);
        assert_eq!(infer("خدمات الشحن"), RequestKind::Logistics);
        assert_eq!(infer("Freight forwarding"), RequestKind::Logistics);
        assert_eq!(infer("التخليص الجمركي"), RequestKind::Suppliers);
        assert_eq!(infer("Customs clearance"), RequestKind::Suppliers);
    }

    #[test]
    fn export_wins_over_logistics() {
        assert_eq!(infer("Export shipping"), RequestKind::Export);
        assert_eq!(infer("شحن و تصدير"), RequestKind::Export);
    }

    #[test]
    fn unknown_names_default_to_suppliers() {
        assert_eq!(infer("Find a factory"), RequestKind::Suppliers);
        assert_eq!(infer(""), RequestKind::Suppliers);
    }

    #[test]
    fn explicit_kind_is_kept() {
        let name = LocaleText::plain("Import from China");
        assert_eq!(classify(Some("logistics"), &name, "en"), RequestKind::Logistics);
    }

    #[test]
    fn invalid_explicit_kind_falls_back_to_inference() {
        let name = LocaleText::localized([("ar", "تصدير"), ("en", "Export")]);
        assert_eq!(classify(Some("shipping"), &name, "en"), RequestKind::Export);
        assert_eq!(classify(Some(""), &name, "ar"), RequestKind::Export);
        assert_eq!(classify(None, &name, "ar"), RequestKind::Export);
    }
}
