//! In-memory catalog and request store shared by the integration suites.
#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use brokerage_intake_api::config::Config;
use brokerage_intake_api::errors::AppError;
use brokerage_intake_api::handlers::AppState;
use brokerage_intake_api::intake::IntakePipeline;
use brokerage_intake_api::models::{
    LocaleText, ObjectId, Pagination, RequestFilter, RequestPage, Service, ServiceRequest,
    ServiceRequestRecord, ServiceStatus,
};
use brokerage_intake_api::storage::{RequestStore, ServiceCatalog};

pub const EXPORT_SERVICE_ID: &str = "65a1b2c3d4e5f60718293a01";
pub const IMPORT_SERVICE_ID: &str = "65a1b2c3d4e5f60718293a02";
pub const LOGISTICS_SERVICE_ID: &str = "65a1b2c3d4e5f60718293a03";
pub const SOURCING_SERVICE_ID: &str = "65a1b2c3d4e5f60718293a04";
pub const RETIRED_SERVICE_ID: &str = "65a1b2c3d4e5f60718293a05";
pub const UNKNOWN_SERVICE_ID: &str = "65a1b2c3d4e5f60718293aff";

pub fn service(id: &str, name: LocaleText, order: i32) -> Service {
    Service {
        id: ObjectId::parse(id).unwrap(),
        name,
        status: ServiceStatus::Active,
        display_order: order,
    }
}

/// A catalog with one service per request kind plus an inactive one.
pub fn catalog() -> MemoryCatalog {
    let mut retired = service(RETIRED_SERVICE_ID, LocaleText::plain("Legacy brokerage"), 9);
    retired.status = ServiceStatus::Inactive;

    MemoryCatalog::new(vec![
        service(EXPORT_SERVICE_ID, LocaleText::localized([("ar", "تصدير")]), 2),
        service(
            IMPORT_SERVICE_ID,
            LocaleText::localized([("ar", "استيراد من الصين"), ("en", "Import from China")]),
            1,
        ),
        service(
            LOGISTICS_SERVICE_ID,
            LocaleText::localized([("ar", "خدمات الشحن"), ("en", "Shipping services")]),
            3,
        ),
        service(
            SOURCING_SERVICE_ID,
            LocaleText::localized([("ar", "البحث عن موردين"), ("en", "Supplier sourcing")]),
            4,
        ),
        retired,
    ])
}

#[derive(Default)]
pub struct MemoryCatalog {
    services: Vec<Service>,
    lookups: Mutex<usize>,
}

impl MemoryCatalog {
    pub fn new(services: Vec<Service>) -> Self {
        Self {
            services,
            lookups: Mutex::new(0),
        }
    }

    /// Number of `find_service` calls so far.
    pub fn lookups(&self) -> usize {
        *self.lookups.lock().unwrap()
    }
}

#[async_trait]
impl ServiceCatalog for MemoryCatalog {
    async fn find_service(&self, id: &ObjectId) -> Result<Option<Service>, AppError> {
        *self.lookups.lock().unwrap() += 1;
        Ok(self.services.iter().find(|s| &s.id == id).cloned())
    }

    async fn active_services(&self) -> Result<Vec<Service>, AppError> {
        let mut active: Vec<Service> = self
            .services
            .iter()
            .filter(|s| s.status == ServiceStatus::Active)
            .cloned()
            .collect();
        active.sort_by_key(|s| s.display_order);
        Ok(active)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<ServiceRequestRecord>>,
}

impl MemoryStore {
    pub fn records(&self) -> Vec<ServiceRequestRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn push(&self, record: ServiceRequestRecord) {
        self.records.lock().unwrap().push(record);
    }
}

#[async_trait]
impl RequestStore for MemoryStore {
    async fn insert(&self, request: &ServiceRequest) -> Result<ObjectId, AppError> {
        let id = ObjectId::generate();
        self.push(ServiceRequestRecord {
            id: id.clone(),
            request: request.clone(),
        });
        Ok(id)
    }

    async fn find(&self, id: &ObjectId) -> Result<Option<ServiceRequestRecord>, AppError> {
        Ok(self.records().into_iter().find(|r| &r.id == id))
    }

    async fn list(&self, filter: &RequestFilter) -> Result<RequestPage, AppError> {
        let mut matching: Vec<ServiceRequestRecord> = self
            .records()
            .into_iter()
            .filter(|r| filter.matches(r))
            .collect();
        matching.sort_by(|a, b| {
            b.request
                .created_at
                .cmp(&a.request.created_at)
                .then_with(|| b.id.as_str().cmp(a.id.as_str()))
        });

        let total = matching.len() as u64;
        let requests = matching
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.limit() as usize)
            .collect();

        Ok(RequestPage {
            requests,
            pagination: Pagination::new(filter.page(), filter.limit(), total),
        })
    }

    async fn replace(&self, record: &ServiceRequestRecord) -> Result<bool, AppError> {
        let mut records = self.records.lock().unwrap();
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &ObjectId) -> Result<bool, AppError> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| &r.id != id);
        Ok(records.len() < before)
    }
}

/// A store whose every write fails like an unreachable database.
pub struct FailingStore;

#[async_trait]
impl RequestStore for FailingStore {
    async fn insert(&self, _request: &ServiceRequest) -> Result<ObjectId, AppError> {
        Err(AppError::DatabaseError(sqlx::Error::PoolTimedOut))
    }

    async fn find(&self, _id: &ObjectId) -> Result<Option<ServiceRequestRecord>, AppError> {
        Err(AppError::DatabaseError(sqlx::Error::PoolTimedOut))
    }

    async fn list(&self, _filter: &RequestFilter) -> Result<RequestPage, AppError> {
        Err(AppError::DatabaseError(sqlx::Error::PoolTimedOut))
    }

    async fn replace(&self, _record: &ServiceRequestRecord) -> Result<bool, AppError> {
        Err(AppError::DatabaseError(sqlx::Error::PoolTimedOut))
    }

    async fn delete(&self, _id: &ObjectId) -> Result<bool, AppError> {
        Err(AppError::DatabaseError(sqlx::Error::PoolTimedOut))
    }
}

pub struct Harness {
    pub catalog: Arc<MemoryCatalog>,
    pub store: Arc<MemoryStore>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            catalog: Arc::new(catalog()),
            store: Arc::new(MemoryStore::default()),
        }
    }

    pub fn pipeline(&self) -> IntakePipeline {
        IntakePipeline::new(self.catalog.clone(), self.store.clone())
    }

    pub fn state(&self) -> Arc<AppState> {
        Arc::new(AppState::new(
            Config::for_tests(),
            self.catalog.clone(),
            self.store.clone(),
        ))
    }
}

// ============ Payload fixtures ============

/// Scenario A: export request against a service named only in Arabic.
pub fn export_payload() -> serde_json::Value {
    serde_json::json!({
        "serviceId": EXPORT_SERVICE_ID,
        "customerName": "Ali",
        "email": "a@b.com",
        "phone": "0100",
        "productType": "textiles",
        "productSpecifications": "cotton, 10 chars+",
        "estimatedQuantity": "500",
        "exportCountry": "Egypt",
        "destinationCountry": "UAE",
        "preferredShippingMethod": "sea",
        "preferredDeliveryMethod": "fob",
        "estimatedValue": "5000"
    })
}

pub fn import_payload() -> serde_json::Value {
    serde_json::json!({
        "serviceId": IMPORT_SERVICE_ID,
        "customerName": "Mona Hassan",
        "email": "Mona@Example.com",
        "phone": "+20 100 555 1234",
        "productType": "LED panels",
        "productSpecifications": "60x60 cm, 40W, 4000K",
        "estimatedQuantity": "2000 units",
        "sourceCountry": "China",
        "destinationCountry": "Egypt",
        "estimatedValue": "15,000 USD",
        "preferredShippingMethod": "Sea",
        "readyDate": "2026-11-01",
        "customsAssistance": "true"
    })
}

/// Scenario C: logistics request using the from/to aliases only.
pub fn logistics_payload() -> serde_json::Value {
    serde_json::json!({
        "serviceId": LOGISTICS_SERVICE_ID,
        "customerName": "Omar",
        "email": "omar@trade.co",
        "phone": "0111",
        "cargoDescription": "Machine parts",
        "fromCountry": "China",
        "fromCity": "Ningbo",
        "toCountry": "UAE",
        "toCity": "Dubai",
        "shipmentType": "container",
        "weight": "12000 kg",
        "insurance": true
    })
}

pub fn sourcing_payload() -> serde_json::Value {
    serde_json::json!({
        "serviceId": SOURCING_SERVICE_ID,
        "customerName": "Sara",
        "email": "sara@shop.com",
        "phone": "0122",
        "searchType": "supplier",
        "productType": "Olive oil",
        "productSpecifications": "Extra virgin, 1L glass bottles",
        "expectedQuantity": "5,000 bottles monthly",
        "preferredCountry": "Tunisia",
        "qualityLevel": "premium",
        "negotiation": true
    })
}

/// Sets one field on a payload fixture.
pub fn with(mut payload: serde_json::Value, field: &str, value: serde_json::Value) -> serde_json::Value {
    payload[field] = value;
    payload
}

/// Removes one field from a payload fixture.
pub fn without(mut payload: serde_json::Value, field: &str) -> serde_json::Value {
    if let Some(map) = payload.as_object_mut() {
        map.remove(field);
    }
    payload
}
