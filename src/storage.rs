use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use crate::errors::{AppError, ResultExt};
use crate::models::{
    LocaleText, ObjectId, Pagination, RequestFilter, RequestPage, Service, ServiceRequest,
    ServiceRequestRecord, ServiceStatus,
};

/// Read access to the services catalog.
#[async_trait]
pub trait ServiceCatalog: Send + Sync {
    async fn find_service(&self, id: &ObjectId) -> Result<Option<Service>, AppError>;

    /// Active services ordered by display order.
    async fn active_services(&self) -> Result<Vec<Service>, AppError>;
}

/// Document collection holding service requests.
///
/// The intake pipeline only ever calls `insert`; the remaining operations
/// serve the admin console.
#[async_trait]
pub trait RequestStore: Send + Sync {
    async fn insert(&self, request: &ServiceRequest) -> Result<ObjectId, AppError>;
    async fn find(&self, id: &ObjectId) -> Result<Option<ServiceRequestRecord>, AppError>;
    async fn list(&self, filter: &RequestFilter) -> Result<RequestPage, AppError>;
    /// Overwrites a stored request. Returns false when the id is unknown.
    async fn replace(&self, record: &ServiceRequestRecord) -> Result<bool, AppError>;
    async fn delete(&self, id: &ObjectId) -> Result<bool, AppError>;
}

/// Fields covered by the admin free-text search.
pub const SEARCH_FIELDS: &[&str] = &[
    "customerName",
    "email",
    "phone",
    "productType",
    "serviceName",
    "notes",
];

/// Fields supporting case-insensitive prefix filters, by document key.
fn prefix_filters(filter: &RequestFilter) -> [(&'static str, &Option<String>); 3] {
    [
        ("productType", &filter.product_type),
        ("destinationCountry", &filter.destination_country),
        ("exportCountry", &filter.export_country),
    ]
}

/// Escapes `LIKE` wildcards so user input matches literally.
pub fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

// ============ Postgres catalog ============

#[derive(Debug, FromRow)]
struct ServiceRow {
    id: String,
    name: Json<LocaleText>,
    status: String,
    display_order: i32,
}

impl TryFrom<ServiceRow> for Service {
    type Error = AppError;

    fn try_from(row: ServiceRow) -> Result<Self, Self::Error> {
        let id = ObjectId::parse(&row.id)
            .ok_or_else(|| AppError::InternalError(format!("Stored service id is malformed: {}", row.id)))?;
        let status = ServiceStatus::parse(&row.status).ok_or_else(|| {
            AppError::InternalError(format!("Service {} has unknown status '{}'", id, row.status))
        })?;

        Ok(Service {
            id,
            name: row.name.0,
            status,
            display_order: row.display_order,
        })
    }
}

/// Services catalog backed by the `services` table.
#[derive(Clone)]
pub struct PgServiceCatalog {
    pool: PgPool,
}

impl PgServiceCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts or replaces a catalog entry. Used by the seeding tool.
    pub async fn upsert(&self, service: &Service) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO services (id, name, status, display_order)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name,
                status = EXCLUDED.status,
                display_order = EXCLUDED.display_order
            "#,
        )
        .bind(service.id.as_str())
        .bind(Json(&service.name))
        .bind(service.status.as_str())
        .bind(service.display_order)
        .execute(&self.pool)
        .await
        .with_context(|| format!("upserting service {}", service.id))?;

        Ok(())
    }
}

#[async_trait]
impl ServiceCatalog for PgServiceCatalog {
    async fn find_service(&self, id: &ObjectId) -> Result<Option<Service>, AppError> {
        let row = sqlx::query_as::<_, ServiceRow>(
            "SELECT id, name, status, display_order FROM services WHERE id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .context("looking up service")?;

        row.map(Service::try_from).transpose()
    }

    async fn active_services(&self) -> Result<Vec<Service>, AppError> {
        let rows = sqlx::query_as::<_, ServiceRow>(
            r#"
            SELECT id, name, status, display_order
            FROM services
            WHERE status = 'active'
            ORDER BY display_order ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("listing active services")?;

        rows.into_iter().map(Service::try_from).collect()
    }
}

// ============ Postgres request store ============

/// Service requests stored as JSONB documents in `service_requests`.
///
/// `service_type`, `status` and `service_id` are copied into columns so the
/// admin filters can use indexes; the document stays the source of truth.
#[derive(Clone)]
pub struct PgRequestStore {
    pool: PgPool,
}

impl PgRequestStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_record(id: String, document: Json<ServiceRequest>) -> Result<ServiceRequestRecord, AppError> {
    let id = ObjectId::parse(&id)
        .ok_or_else(|| AppError::InternalError(format!("Stored request id is malformed: {}", id)))?;
    Ok(ServiceRequestRecord {
        id,
        request: document.0,
    })
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &RequestFilter) {
    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(kind) = filter.service_type {
        query.push(" AND service_type = ").push_bind(kind.as_str());
    }
    if let Some(service_id) = RequestFilter::term(&filter.service_id) {
        query
            .push(" AND service_id = ")
            .push_bind(service_id.to_ascii_lowercase());
    }
    for (field, value) in prefix_filters(filter) {
        if let Some(prefix) = RequestFilter::term(value) {
            query
                .push(format!(" AND document->>'{}' ILIKE ", field))
                .push_bind(format!("{}%", escape_like(prefix)));
        }
    }
    if let Some(search) = RequestFilter::term(&filter.search) {
        let pattern = format!("%{}%", escape_like(search));
        query.push(" AND (");
        for (i, field) in SEARCH_FIELDS.iter().enumerate() {
            if i > 0 {
                query.push(" OR ");
            }
            query
                .push(format!("document->>'{}' ILIKE ", field))
                .push_bind(pattern.clone());
        }
        query.push(")");
    }
}

#[async_trait]
impl RequestStore for PgRequestStore {
    async fn insert(&self, request: &ServiceRequest) -> Result<ObjectId, AppError> {
        let id = ObjectId::generate();
        let document = serde_json::to_value(request)?;

        sqlx::query(
            r#"
            INSERT INTO service_requests (
                id,
                service_type,
                status,
                service_id,
                document,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(id.as_str())
        .bind(request.kind().as_str())
        .bind(request.status.as_str())
        .bind(request.service_id.as_str())
        .bind(document)
        .bind(request.created_at)
        .bind(request.updated_at)
        .execute(&self.pool)
        .await
        .context("inserting service request")?;

        tracing::debug!("✓ Service request {} stored", id);
        Ok(id)
    }

    async fn find(&self, id: &ObjectId) -> Result<Option<ServiceRequestRecord>, AppError> {
        let row = sqlx::query_as::<_, (String, Json<ServiceRequest>)>(
            "SELECT id, document FROM service_requests WHERE id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .context("fetching service request")?;

        row.map(|(id, document)| to_record(id, document)).transpose()
    }

    async fn list(&self, filter: &RequestFilter) -> Result<RequestPage, AppError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM service_requests WHERE TRUE");
        push_filters(&mut count, filter);
        let total: i64 = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .context("counting service requests")?;

        let mut select =
            QueryBuilder::<Postgres>::new("SELECT id, document FROM service_requests WHERE TRUE");
        push_filters(&mut select, filter);
        select
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(i64::from(filter.limit()))
            .push(" OFFSET ")
            .push_bind(filter.offset() as i64);

        let rows = select
            .build_query_as::<(String, Json<ServiceRequest>)>()
            .fetch_all(&self.pool)
            .await
            .context("listing service requests")?;

        let requests = rows
            .into_iter()
            .map(|(id, document)| to_record(id, document))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RequestPage {
            requests,
            pagination: Pagination::new(filter.page(), filter.limit(), total.max(0) as u64),
        })
    }

    async fn replace(&self, record: &ServiceRequestRecord) -> Result<bool, AppError> {
        let document = serde_json::to_value(&record.request)?;

        let result = sqlx::query(
            r#"
            UPDATE service_requests
            SET status = $2, document = $3, updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(record.id.as_str())
        .bind(record.request.status.as_str())
        .bind(document)
        .bind(record.request.updated_at)
        .execute(&self.pool)
        .await
        .with_context(|| format!("updating service request {}", record.id))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: &ObjectId) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM service_requests WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .with_context(|| format!("deleting service request {}", id))?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("UAE"), "UAE");
    }

    #[test]
    fn count_query_includes_every_filter() {
        let filter = RequestFilter {
            status: Some(crate::models::RequestStatus::Pending),
            product_type: Some("tex".to_string()),
            search: Some("ali".to_string()),
            ..Default::default()
        };
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM service_requests WHERE TRUE");
        push_filters(&mut query, &filter);
        let sql = query.sql();
        assert!(sql.contains("AND status = $1"));
        assert!(sql.contains("document->>'productType' ILIKE $2"));
        assert!(sql.contains("document->>'notes' ILIKE $8"));
    }
}
