//! # Product Cache Repository
//!
//! Database operations for cached OpenFoodFacts products.
//!
//! ## Key Operations
//! - Read one or many cached records by code
//! - Upsert a freshly fetched record
//! - Prune records older than a cutoff
//!
//! ## Row Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    One Row Per Product Code                             │
//! │                                                                         │
//! │  upsert(code, record, fetched_at)                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  record.summary() ──► name, brand, image_url, grades, allergens ...   │
//! │  record (JSON)    ──► raw_data                                         │
//! │  fetched_at       ──► last_fetched_at (RFC 3339, UTC, millis)          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT ... ON CONFLICT(code) DO UPDATE                                │
//! │  (created_at survives, everything else is replaced)                    │
//! │                                                                         │
//! │  Reads only ever decode raw_data: the summary columns are for          │
//! │  humans poking at the file with the sqlite3 shell.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use fydo_core::validation::validate_barcode;
use fydo_core::{CachedProduct, ProductRecord};

/// Timestamps are stored with a fixed width so that text comparison in
/// `prune_older_than` orders them chronologically.
fn encode_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn decode_timestamp(raw: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| DbError::InvalidRecord(format!("bad last_fetched_at '{}': {}", raw, e)))
}

/// Raw row as stored in the `products` table.
#[derive(Debug, sqlx::FromRow)]
struct ProductCacheRow {
    code: String,
    raw_data: String,
    last_fetched_at: String,
}

impl ProductCacheRow {
    fn into_cached(self) -> DbResult<CachedProduct> {
        let raw: serde_json::Value = serde_json::from_str(&self.raw_data).map_err(|e| {
            DbError::InvalidRecord(format!("bad raw_data for {}: {}", self.code, e))
        })?;

        Ok(CachedProduct {
            record: ProductRecord::new(raw),
            last_fetched_at: decode_timestamp(&self.last_fetched_at)?,
        })
    }
}

/// Repository for the local product cache.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// repo.upsert("3017620422003", &record, Utc::now()).await?;
/// let cached = repo.get_by_code("3017620422003").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductCacheRepository {
    pool: SqlitePool,
}

impl ProductCacheRepository {
    /// Creates a new ProductCacheRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductCacheRepository { pool }
    }

    /// Gets a cached record by product code.
    ///
    /// Returns `None` when the code has never been cached. Freshness is the
    /// caller's concern.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<CachedProduct>> {
        debug!(code = %code, "Reading product from cache");

        let row = sqlx::query_as::<_, ProductCacheRow>(
            r#"
            SELECT code, raw_data, last_fetched_at
            FROM products
            WHERE code = ?1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ProductCacheRow::into_cached).transpose()
    }

    /// Gets every cached record whose code is in `codes`.
    ///
    /// Unknown codes are skipped; result order follows the table, not `codes`.
    pub async fn get_many(&self, codes: &[String]) -> DbResult<Vec<CachedProduct>> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT code, raw_data, last_fetched_at FROM products WHERE code IN (",
        );
        let mut separated = builder.separated(", ");
        for code in codes {
            separated.push_bind(code.clone());
        }
        separated.push_unseparated(")");

        let rows = builder
            .build_query_as::<ProductCacheRow>()
            .fetch_all(&self.pool)
            .await?;

        debug!(requested = codes.len(), found = rows.len(), "Batch cache read");

        rows.into_iter().map(ProductCacheRow::into_cached).collect()
    }

    /// Inserts or replaces the cached copy of `record` under `code`.
    ///
    /// The row is keyed on the code the caller asked for, not on the code
    /// inside the record: upstream may answer a 12-digit UPC-A request with
    /// its 13-digit EAN form, and the next read comes in with the request.
    ///
    /// ## Errors
    /// `DbError::InvalidRecord` if `code` is not a valid barcode.
    pub async fn upsert(
        &self,
        code: &str,
        record: &ProductRecord,
        fetched_at: DateTime<Utc>,
    ) -> DbResult<()> {
        let code = validate_barcode(code)?;
        let summary = record.summary();
        let raw_data = serde_json::to_string(record.as_json())?;
        let allergens = if summary.allergens.is_empty() {
            None
        } else {
            Some(summary.allergens.join(","))
        };
        let fetched = encode_timestamp(fetched_at);
        let now = encode_timestamp(Utc::now());

        debug!(code = %code, "Upserting product into cache");

        sqlx::query(
            r#"
            INSERT INTO products (
                code, name, brand, image_url, nutriscore_grade, ecoscore_grade,
                nova_group, quantity, ingredients_text, allergens,
                raw_data, last_fetched_at, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)
            ON CONFLICT(code) DO UPDATE SET
                name = excluded.name,
                brand = excluded.brand,
                image_url = excluded.image_url,
                nutriscore_grade = excluded.nutriscore_grade,
                ecoscore_grade = excluded.ecoscore_grade,
                nova_group = excluded.nova_group,
                quantity = excluded.quantity,
                ingredients_text = excluded.ingredients_text,
                allergens = excluded.allergens,
                raw_data = excluded.raw_data,
                last_fetched_at = excluded.last_fetched_at,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&code)
        .bind(&summary.name)
        .bind(&summary.brand)
        .bind(&summary.image_url)
        .bind(&summary.nutriscore_grade)
        .bind(&summary.ecoscore_grade)
        .bind(summary.nova_group)
        .bind(&summary.quantity)
        .bind(&summary.ingredients_text)
        .bind(&allergens)
        .bind(&raw_data)
        .bind(&fetched)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Removes one cached record. Returns true if a row was deleted.
    pub async fn delete(&self, code: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE code = ?1")
            .bind(code)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Removes every record fetched before `cutoff`.
    ///
    /// Returns the number of rows deleted.
    pub async fn prune_older_than(&self, cutoff: DateTime<Utc>) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM products WHERE last_fetched_at < ?1")
            .bind(encode_timestamp(cutoff))
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected();
        debug!(removed, cutoff = %cutoff, "Pruned product cache");
        Ok(removed)
    }

    /// Number of cached records.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
