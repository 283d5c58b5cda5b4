//! PostgreSQL implementation of link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::sync::Arc;

use crate::domain::entities::{ClickEvent, LinkPatch, LinkRecord, NewLinkRecord, OwnerId};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

const LINK_COLUMNS: &str = "l.id, l.original_url, l.short_code, l.custom_slug, l.owner_id, \
     l.click_count, l.is_active, l.expires_at, l.created_at, l.updated_at";

#[derive(FromRow)]
struct LinkRow {
    id: i64,
    original_url: String,
    short_code: String,
    custom_slug: Option<String>,
    owner_id: String,
    click_count: i64,
    is_active: bool,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<LinkRow> for LinkRecord {
    fn from(row: LinkRow) -> Self {
        Self {
            id: row.id,
            original_url: row.original_url,
            short_code: row.short_code,
            custom_slug: row.custom_slug,
            owner_id: OwnerId::new(row.owner_id),
            click_count: row.click_count,
            is_active: row.is_active,
            expires_at: row.expires_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct ClickRow {
    clicked_at: DateTime<Utc>,
    ip: String,
    device_type: String,
    browser: String,
    os: String,
    country: String,
    referrer: String,
}

impl From<ClickRow> for ClickEvent {
    fn from(row: ClickRow) -> Self {
        Self {
            timestamp: row.clicked_at,
            ip: row.ip,
            device_type: row.device_type.parse().unwrap_or_default(),
            browser: row.browser,
            os: row.os,
            country: row.country,
            referrer: row.referrer,
        }
    }
}

/// Builds an `ILIKE` pattern matching `search` literally anywhere.
fn like_pattern(search: Option<String>) -> Option<String> {
    search.map(|s| {
        let escaped = s
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        format!("%{escaped}%")
    })
}

fn link_not_found(id: i64) -> AppError {
    AppError::not_found("Link not found", json!({ "id": id }))
}

/// PostgreSQL repository for link records and clicks.
///
/// Short codes and slugs live together in `link_codes`, whose primary key
/// is the namespace uniqueness constraint. A colliding insert fails with a
/// unique violation, which maps to [`AppError::Conflict`].
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    async fn claim_code(
        tx: &mut Transaction<'_, Postgres>,
        code: &str,
        link_id: i64,
        kind: &str,
    ) -> Result<(), AppError> {
        sqlx::query("INSERT INTO link_codes (code, link_id, kind) VALUES ($1, $2, $3)")
            .bind(code)
            .bind(link_id)
            .bind(kind)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn insert(&self, new_link: NewLinkRecord) -> Result<LinkRecord, AppError> {
        let mut tx = self.pool.begin().await?;

        let row: LinkRow = sqlx::query_as(
            r#"
            INSERT INTO links AS l (original_url, short_code, custom_slug, owner_id, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING l.id, l.original_url, l.short_code, l.custom_slug, l.owner_id,
                      l.click_count, l.is_active, l.expires_at, l.created_at, l.updated_at
            "#,
        )
        .bind(&new_link.original_url)
        .bind(&new_link.short_code)
        .bind(&new_link.custom_slug)
        .bind(new_link.owner_id.as_str())
        .bind(new_link.expires_at)
        .fetch_one(&mut *tx)
        .await?;

        Self::claim_code(&mut tx, &new_link.short_code, row.id, "code").await?;

        if let Some(slug) = &new_link.custom_slug
            && *slug != new_link.short_code
        {
            Self::claim_code(&mut tx, slug, row.id, "slug").await?;
        }

        tx.commit().await?;

        Ok(row.into())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<LinkRecord>, AppError> {
        let sql = format!(
            "SELECT {LINK_COLUMNS} FROM link_codes c JOIN links l ON l.id = c.link_id \
             WHERE c.code = $1"
        );

        let row: Option<LinkRow> = sqlx::query_as(&sql)
            .bind(code)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Into::into))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<LinkRecord>, AppError> {
        let sql = format!("SELECT {LINK_COLUMNS} FROM links l WHERE l.id = $1");

        let row: Option<LinkRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Into::into))
    }

    async fn find_by_owner_and_id(
        &self,
        owner_id: &OwnerId,
        id: i64,
    ) -> Result<Option<LinkRecord>, AppError> {
        let sql = format!("SELECT {LINK_COLUMNS} FROM links l WHERE l.id = $1 AND l.owner_id = $2");

        let row: Option<LinkRow> = sqlx::query_as(&sql)
            .bind(id)
            .bind(owner_id.as_str())
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Into::into))
    }

    async fn list_by_owner(
        &self,
        owner_id: &OwnerId,
        offset: i64,
        limit: i64,
        search: Option<String>,
    ) -> Result<Vec<LinkRecord>, AppError> {
        let sql = format!(
            r#"
            SELECT {LINK_COLUMNS}
            FROM links l
            WHERE l.owner_id = $1
              AND ($2::text IS NULL
                   OR l.original_url ILIKE $2
                   OR l.short_code ILIKE $2
                   OR l.custom_slug ILIKE $2)
            ORDER BY l.created_at DESC, l.id DESC
            LIMIT $3 OFFSET $4
            "#
        );

        let rows: Vec<LinkRow> = sqlx::query_as(&sql)
            .bind(owner_id.as_str())
            .bind(like_pattern(search))
            .bind(limit.max(0))
            .bind(offset.max(0))
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count_by_owner(
        &self,
        owner_id: &OwnerId,
        search: Option<String>,
    ) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM links l
            WHERE l.owner_id = $1
              AND ($2::text IS NULL
                   OR l.original_url ILIKE $2
                   OR l.short_code ILIKE $2
                   OR l.custom_slug ILIKE $2)
            "#,
        )
        .bind(owner_id.as_str())
        .bind(like_pattern(search))
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count)
    }

    async fn update(&self, id: i64, patch: LinkPatch) -> Result<LinkRecord, AppError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {LINK_COLUMNS} FROM links l WHERE l.id = $1 FOR UPDATE");
        let current: LinkRow = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| link_not_found(id))?;

        if let Some(new_slug) = &patch.custom_slug
            && *new_slug != current.custom_slug
        {
            sqlx::query("DELETE FROM link_codes WHERE link_id = $1 AND kind = 'slug'")
                .bind(id)
                .execute(&mut *tx)
                .await?;

            if let Some(slug) = new_slug
                && *slug != current.short_code
            {
                Self::claim_code(&mut tx, slug, id, "slug").await?;
            }
        }

        let (set_slug, slug) = match patch.custom_slug {
            Some(slug) => (true, slug),
            None => (false, None),
        };
        let (set_expiry, expires_at) = match patch.expires_at {
            Some(expires_at) => (true, expires_at),
            None => (false, None),
        };

        let row: LinkRow = sqlx::query_as(
            r#"
            UPDATE links AS l SET
                original_url = COALESCE($2, l.original_url),
                custom_slug  = CASE WHEN $3 THEN $4 ELSE l.custom_slug END,
                is_active    = COALESCE($5, l.is_active),
                expires_at   = CASE WHEN $6 THEN $7 ELSE l.expires_at END,
                updated_at   = NOW()
            WHERE l.id = $1
            RETURNING l.id, l.original_url, l.short_code, l.custom_slug, l.owner_id,
                      l.click_count, l.is_active, l.expires_at, l.created_at, l.updated_at
            "#,
        )
        .bind(id)
        .bind(patch.original_url)
        .bind(set_slug)
        .bind(slug)
        .bind(patch.is_active)
        .bind(set_expiry)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(row.into())
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM links WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_click(&self, id: i64, event: ClickEvent) -> Result<i64, AppError> {
        // One statement: the counter bump and the click row commit together.
        let count: Option<i64> = sqlx::query_scalar(
            r#"
            WITH bumped AS (
                UPDATE links SET click_count = click_count + 1
                WHERE id = $1
                RETURNING id, click_count
            ), logged AS (
                INSERT INTO link_clicks
                    (link_id, clicked_at, ip, device_type, browser, os, country, referrer)
                SELECT id, $2, $3, $4, $5, $6, $7, $8 FROM bumped
            )
            SELECT click_count FROM bumped
            "#,
        )
        .bind(id)
        .bind(event.timestamp)
        .bind(&event.ip)
        .bind(event.device_type.as_str())
        .bind(&event.browser)
        .bind(&event.os)
        .bind(&event.country)
        .bind(&event.referrer)
        .fetch_optional(self.pool.as_ref())
        .await?;

        count.ok_or_else(|| link_not_found(id))
    }

    async fn find_clicks(&self, id: i64) -> Result<Vec<ClickEvent>, AppError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM links WHERE id = $1)")
            .bind(id)
            .fetch_one(self.pool.as_ref())
            .await?;

        if !exists {
            return Err(link_not_found(id));
        }

        let rows: Vec<ClickRow> = sqlx::query_as(
            r#"
            SELECT clicked_at, ip, device_type, browser, os, country, referrer
            FROM link_clicks
            WHERE link_id = $1
            ORDER BY id
            "#,
        )
        .bind(id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }
}
