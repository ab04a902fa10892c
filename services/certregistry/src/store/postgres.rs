//! Postgres-backed implementation of the registry store.
//!
//! # What this module is
//! Implements [`CertificateStore`] and [`AdminStore`] on top of `sqlx` so the
//! registry survives restarts and can be shared by several API replicas.
//!
//! # Key invariants
//! - `certificate_number` and `public_slug` carry UNIQUE constraints; violations
//!   (SQLSTATE 23505) surface as [`StoreError::Conflict`] so the lifecycle layer
//!   can re-roll identities.
//! - Enum columns hold the SCREAMING_SNAKE_CASE wire names and are parsed back
//!   into closed enums on read. Unknown values are treated as corruption.
//! - Lists order by `created_at DESC, id DESC`.
//!
//! # Search
//! Free-text filters use `ILIKE` with `%`, `_` and `\` escaped, so user input is
//! always a literal substring.
//!
//! # Operational notes
//! - Migrations run at connect time via `sqlx::migrate!("./migrations")`; a
//!   failed migration fails startup.
//! - Database URLs may contain credentials; never log `PostgresConfig::url`.
use super::{AdminStore, BreakdownRow, CertificateStore, StoreError, StoreResult};
use crate::config::PostgresConfig;
use crate::model::{AdminUser, Certificate, CertificateStatus, CertificateType};
use crate::query::CertificateFilter;
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

const CERTIFICATE_COLUMNS: &str = "id, certificate_number, public_slug, cert_type, status, \
     organization_name, address, issue_date, expiration_date, qualifications, membership_date, \
     accredited_as, scope, issue_no, initial_accreditation_date, created_at, updated_at";

const ADMIN_COLUMNS: &str = "id, email, name, password_hash, role, created_at";

/// Durable registry store backed by Postgres.
///
/// # Example
/// ```rust,no_run
/// use certregistry::config::PostgresConfig;
/// use certregistry::store::postgres::PostgresStore;
///
/// async fn open(pg: PostgresConfig) {
///     let _ = PostgresStore::connect(&pg).await;
/// }
/// ```
pub struct PostgresStore {
    pool: PgPool,
}

/// Row shape for the `certificates` table.
///
/// Kept apart from [`Certificate`] so enum parsing happens in one place.
#[derive(Debug, Clone, FromRow)]
struct DbCertificate {
    id: Uuid,
    certificate_number: String,
    public_slug: String,
    cert_type: String,
    status: String,
    organization_name: String,
    address: String,
    issue_date: NaiveDate,
    expiration_date: NaiveDate,
    qualifications: Option<String>,
    membership_date: Option<NaiveDate>,
    accredited_as: Option<String>,
    scope: Option<String>,
    issue_no: Option<String>,
    initial_accreditation_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
struct DbAdmin {
    id: Uuid,
    email: String,
    name: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
struct DbBreakdown {
    cert_type: String,
    status: String,
    count: i64,
}

impl PostgresStore {
    /// Connect to Postgres and apply embedded migrations.
    ///
    /// # Errors
    /// - Connection, pool setup, or migration failures.
    pub async fn connect(pg: &PostgresConfig) -> StoreResult<Self> {
        Self::connect_internal(pg, true).await
    }

    /// Connect without running migrations. Intended for tests that manage the
    /// schema themselves.
    #[cfg(feature = "pg-tests")]
    pub async fn connect_without_migrations(pg: &PostgresConfig) -> StoreResult<Self> {
        Self::connect_internal(pg, false).await
    }

    async fn connect_internal(pg: &PostgresConfig, run_migrations: bool) -> StoreResult<Self> {
        // Bound both pool acquisition and new physical connections so a dead
        // database fails requests instead of hanging them.
        let connect_options = PgConnectOptions::from_str(&pg.url)?;
        let pool = tokio::time::timeout(
            Duration::from_millis(pg.connect_timeout_ms),
            PgPoolOptions::new()
                .max_connections(pg.max_connections)
                .acquire_timeout(Duration::from_millis(pg.acquire_timeout_ms))
                .connect_with(connect_options),
        )
        .await
        .map_err(|_| StoreError::Unexpected(anyhow!("postgres connect timed out")))??;

        if run_migrations {
            sqlx::migrate!("./migrations").run(&pool).await?;
        }

        Ok(Self { pool })
    }

    async fn refresh_certificate_gauge(&self) {
        if let Ok(total) = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM certificates")
            .fetch_one(&self.pool)
            .await
        {
            metrics::gauge!("certreg_certificates_total").set(total as f64);
        }
    }
}

#[async_trait]
impl CertificateStore for PostgresStore {
    async fn insert_certificate(&self, certificate: Certificate) -> StoreResult<Certificate> {
        let sql = format!(
            "INSERT INTO certificates ({CERTIFICATE_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17) \
             RETURNING {CERTIFICATE_COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, DbCertificate>(&sql)
            .bind(certificate.id)
            .bind(&certificate.certificate_number)
            .bind(&certificate.public_slug)
            .bind(certificate.cert_type.as_str())
            .bind(certificate.status.as_str())
            .bind(&certificate.organization_name)
            .bind(&certificate.address)
            .bind(certificate.issue_date)
            .bind(certificate.expiration_date)
            .bind(&certificate.qualifications)
            .bind(certificate.membership_date)
            .bind(&certificate.accredited_as)
            .bind(&certificate.scope)
            .bind(&certificate.issue_no)
            .bind(certificate.initial_accreditation_date)
            .bind(certificate.created_at)
            .bind(certificate.updated_at)
            .fetch_one(&self.pool)
            .await;
        let row = match inserted {
            Ok(row) => row,
            Err(err) if is_unique_violation(&err) => {
                return Err(StoreError::Conflict(
                    "certificate identity already in use".into(),
                ));
            }
            Err(err) => return Err(err.into()),
        };
        metrics::counter!("certreg_certificate_changes_total", "op" => "created").increment(1);
        self.refresh_certificate_gauge().await;
        certificate_from_db(row)
    }

    async fn get_certificate(&self, id: Uuid) -> StoreResult<Certificate> {
        let sql = format!("SELECT {CERTIFICATE_COLUMNS} FROM certificates WHERE id = $1");
        let row = sqlx::query_as::<_, DbCertificate>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound("certificate".into()))?;
        certificate_from_db(row)
    }

    async fn find_certificate_by_slug(&self, slug: &str) -> StoreResult<Option<Certificate>> {
        let sql = format!("SELECT {CERTIFICATE_COLUMNS} FROM certificates WHERE public_slug = $1");
        sqlx::query_as::<_, DbCertificate>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?
            .map(certificate_from_db)
            .transpose()
    }

    async fn find_certificate_by_number(&self, number: &str) -> StoreResult<Option<Certificate>> {
        let sql = format!(
            "SELECT {CERTIFICATE_COLUMNS} FROM certificates WHERE certificate_number = $1"
        );
        sqlx::query_as::<_, DbCertificate>(&sql)
            .bind(number)
            .fetch_optional(&self.pool)
            .await?
            .map(certificate_from_db)
            .transpose()
    }

    async fn update_certificate(&self, certificate: Certificate) -> StoreResult<Certificate> {
        let sql = format!(
            "UPDATE certificates SET cert_type = $2, status = $3, organization_name = $4, \
             address = $5, issue_date = $6, expiration_date = $7, qualifications = $8, \
             membership_date = $9, accredited_as = $10, scope = $11, issue_no = $12, \
             initial_accreditation_date = $13, updated_at = $14 \
             WHERE id = $1 RETURNING {CERTIFICATE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, DbCertificate>(&sql)
            .bind(certificate.id)
            .bind(certificate.cert_type.as_str())
            .bind(certificate.status.as_str())
            .bind(&certificate.organization_name)
            .bind(&certificate.address)
            .bind(certificate.issue_date)
            .bind(certificate.expiration_date)
            .bind(&certificate.qualifications)
            .bind(certificate.membership_date)
            .bind(&certificate.accredited_as)
            .bind(&certificate.scope)
            .bind(&certificate.issue_no)
            .bind(certificate.initial_accreditation_date)
            .bind(certificate.updated_at)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound("certificate".into()))?;
        metrics::counter!("certreg_certificate_changes_total", "op" => "updated").increment(1);
        certificate_from_db(row)
    }

    async fn set_certificate_status(
        &self,
        id: Uuid,
        status: CertificateStatus,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Certificate> {
        let sql = format!(
            "UPDATE certificates SET status = $2, updated_at = $3 WHERE id = $1 \
             RETURNING {CERTIFICATE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, DbCertificate>(&sql)
            .bind(id)
            .bind(status.as_str())
            .bind(updated_at)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound("certificate".into()))?;
        metrics::counter!("certreg_certificate_changes_total", "op" => "status").increment(1);
        certificate_from_db(row)
    }

    async fn delete_certificate(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM certificates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("certificate".into()));
        }
        metrics::counter!("certreg_certificate_changes_total", "op" => "deleted").increment(1);
        self.refresh_certificate_gauge().await;
        Ok(())
    }

    async fn list_certificates(
        &self,
        filter: &CertificateFilter,
        offset: u64,
        limit: u64,
    ) -> StoreResult<Vec<Certificate>> {
        let mut builder =
            QueryBuilder::<Postgres>::new(format!("SELECT {CERTIFICATE_COLUMNS} FROM certificates"));
        push_filter(&mut builder, filter);
        builder
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .push(" OFFSET ")
            .push_bind(i64::try_from(offset).unwrap_or(i64::MAX));
        let rows = builder
            .build_query_as::<DbCertificate>()
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(certificate_from_db).collect()
    }

    async fn count_certificates(&self, filter: &CertificateFilter) -> StoreResult<u64> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM certificates");
        push_filter(&mut builder, filter);
        let count: i64 = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn certificate_breakdown(&self) -> StoreResult<Vec<BreakdownRow>> {
        let rows = sqlx::query_as::<_, DbBreakdown>(
            "SELECT cert_type, status, COUNT(*) AS count FROM certificates GROUP BY cert_type, status",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|row| {
                Ok(BreakdownRow {
                    cert_type: parse_cert_type(&row.cert_type)?,
                    status: parse_status(&row.status)?,
                    count: row.count.max(0) as u64,
                })
            })
            .collect()
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn is_durable(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

#[async_trait]
impl AdminStore for PostgresStore {
    async fn upsert_admin(&self, admin: AdminUser) -> StoreResult<AdminUser> {
        let sql = format!(
            "INSERT INTO admin_users ({ADMIN_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT ((lower(email))) DO UPDATE SET name = EXCLUDED.name, \
             password_hash = EXCLUDED.password_hash, role = EXCLUDED.role \
             RETURNING {ADMIN_COLUMNS}"
        );
        let row = sqlx::query_as::<_, DbAdmin>(&sql)
            .bind(admin.id)
            .bind(&admin.email)
            .bind(&admin.name)
            .bind(&admin.password_hash)
            .bind(admin.role.as_str())
            .bind(admin.created_at)
            .fetch_one(&self.pool)
            .await?;
        admin_from_db(row)
    }

    async fn find_admin_by_email(&self, email: &str) -> StoreResult<Option<AdminUser>> {
        let sql = format!("SELECT {ADMIN_COLUMNS} FROM admin_users WHERE lower(email) = lower($1)");
        sqlx::query_as::<_, DbAdmin>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(admin_from_db)
            .transpose()
    }

    async fn get_admin(&self, id: Uuid) -> StoreResult<AdminUser> {
        let sql = format!("SELECT {ADMIN_COLUMNS} FROM admin_users WHERE id = $1");
        let row = sqlx::query_as::<_, DbAdmin>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound("admin".into()))?;
        admin_from_db(row)
    }
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &CertificateFilter) {
    let mut separator = " WHERE ";
    if let Some(cert_type) = filter.cert_type {
        builder
            .push(separator)
            .push("cert_type = ")
            .push_bind(cert_type.as_str());
        separator = " AND ";
    }
    if let Some(status) = filter.status {
        builder
            .push(separator)
            .push("status = ")
            .push_bind(status.as_str());
        separator = " AND ";
    }
    if let Some(term) = filter.search() {
        let pattern = format!("%{}%", escape_like(term));
        builder
            .push(separator)
            .push("(organization_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR certificate_number ILIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        return db_err.code().map(|code| code == "23505").unwrap_or(false);
    }
    false
}

fn certificate_from_db(row: DbCertificate) -> StoreResult<Certificate> {
    Ok(Certificate {
        id: row.id,
        certificate_number: row.certificate_number,
        public_slug: row.public_slug,
        cert_type: parse_cert_type(&row.cert_type)?,
        status: parse_status(&row.status)?,
        organization_name: row.organization_name,
        address: row.address,
        issue_date: row.issue_date,
        expiration_date: row.expiration_date,
        qualifications: row.qualifications,
        membership_date: row.membership_date,
        accredited_as: row.accredited_as,
        scope: row.scope,
        issue_no: row.issue_no,
        initial_accreditation_date: row.initial_accreditation_date,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn admin_from_db(row: DbAdmin) -> StoreResult<AdminUser> {
    Ok(AdminUser {
        id: row.id,
        email: row.email,
        name: row.name,
        password_hash: row.password_hash,
        role: row
            .role
            .parse()
            .map_err(|err| StoreError::Unexpected(anyhow!("{err}")))?,
        created_at: row.created_at,
    })
}

fn parse_cert_type(value: &str) -> StoreResult<CertificateType> {
    value
        .parse()
        .map_err(|err| StoreError::Unexpected(anyhow!("{err}")))
}

fn parse_status(value: &str) -> StoreResult<CertificateStatus> {
    value
        .parse()
        .map_err(|err| StoreError::Unexpected(anyhow!("{err}")))
}
