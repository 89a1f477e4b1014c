use chrono::{DateTime, Utc};

use crate::models::{RequestStatus, Service, ServiceRequest, TypedRequest};

/// Builds the storable entity from a validated submission.
///
/// Sets the bookkeeping fields (`status`, `createdAt`, `updatedAt`) and
/// guarantees a human-readable `serviceName`: the submitted one when present,
/// otherwise the service's display name resolved for `locale`.
pub fn assemble(
    validated: TypedRequest,
    service: &Service,
    locale: &str,
    now: DateTime<Utc>,
) -> ServiceRequest {
    let TypedRequest { base, details } = validated;

    let service_name = base
        .service_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| service.name.resolve(locale).to_string());

    ServiceRequest {
        customer_name: base.customer_name,
        email: base.email,
        phone: base.phone,
        service_id: service.id.clone(),
        service_name,
        notes: base.notes,
        hear_about_us: base.hear_about_us,
        details,
        status: RequestStatus::Pending,
        admin_notes: None,
        created_at: now,
        updated_at: now,
    }
}
