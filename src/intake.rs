use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::assembler::assemble;
use crate::classifier::classify;
use crate::errors::AppError;
use crate::models::{ObjectId, ServiceRequestRecord};
use crate::normalizer::normalize;
use crate::schema::{self, validate};
use crate::storage::{RequestStore, ServiceCatalog};

/// Turns a raw form submission into a stored service request.
///
/// Steps run in a fixed order and stop at the first failure: identifier
/// check, catalog lookup, classification, normalization, validation,
/// assembly, insert. Nothing is written unless every check passed.
#[derive(Clone)]
pub struct IntakePipeline {
    catalog: Arc<dyn ServiceCatalog>,
    store: Arc<dyn RequestStore>,
}

impl IntakePipeline {
    pub fn new(catalog: Arc<dyn ServiceCatalog>, store: Arc<dyn RequestStore>) -> Self {
        Self { catalog, store }
    }

    pub async fn submit(
        &self,
        payload: Value,
        locale: &str,
    ) -> Result<ServiceRequestRecord, AppError> {
        let Value::Object(raw) = payload else {
            return Err(AppError::BadRequest(
                "Request body must be a JSON object".to_string(),
            ));
        };

        let service_id = service_id(&raw)?;
        let service = self
            .catalog
            .find_service(&service_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Service not found".to_string()))?;

        let explicit = raw.get("serviceType").and_then(Value::as_str);
        let kind = classify(explicit, &service.name, locale);
        tracing::debug!(
            "Service {} classified as {} (explicit: {:?})",
            service.id,
            kind,
            explicit
        );

        let normalized = normalize(kind, raw, service.name.resolve(locale));

        let validated = validate(kind, &normalized).map_err(|e| {
            tracing::warn!(
                "Rejected {} request for service {} on field {:?}: {}",
                kind,
                service.id,
                e.field(),
                e
            );
            AppError::Validation(e)
        })?;

        let request = assemble(validated, &service, locale, Utc::now());

        let id = self.store.insert(&request).await.map_err(|e| {
            tracing::error!("Failed to store {} request: {}", kind, e);
            e
        })?;

        tracing::info!(
            "✓ Accepted {} request {} for service {} ({})",
            kind,
            id,
            service.id,
            request.service_name
        );

        Ok(ServiceRequestRecord { id, request })
    }
}

/// Reads and checks `serviceId` ahead of the lookup, with the same rule the
/// base schema applies later.
fn service_id(raw: &Map<String, Value>) -> Result<ObjectId, AppError> {
    let checked = schema::check(&schema::SERVICE_ID, raw.get(schema::SERVICE_ID.field))?;
    checked
        .as_ref()
        .and_then(Value::as_str)
        .and_then(ObjectId::parse)
        .ok_or_else(|| AppError::BadRequest("Invalid service id".to_string()))
}
