use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::AdStore;
use crate::error::AppResult;
use crate::filters::AdFilter;
use crate::models::{Ad, AdChanges, NewAd, Tag};

const AD_COLUMNS: &str = "id, title, price, date, tag_id, views";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> AppResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect(database_url)
            .await?;

        tracing::info!("Database connection pool established");

        Ok(Self::new(pool))
    }
}

/// Appends the filter's predicates to a query that already has a `WHERE`.
fn push_filter(query: &mut QueryBuilder<'_, Postgres>, filter: &AdFilter) {
    if let Some(min) = &filter.price.min {
        query.push(" AND price >= ").push_bind(min.clone());
    }
    if let Some(max) = &filter.price.max {
        query.push(" AND price <= ").push_bind(max.clone());
    }
    if !filter.tags.is_empty() {
        query.push(" AND tag_id && ").push_bind(filter.tags.0.clone());
    }
    if let Some(min) = filter.date.min {
        query.push(" AND date >= ").push_bind(min);
    }
    if let Some(max) = filter.date.max {
        query.push(" AND date <= ").push_bind(max);
    }
}

#[async_trait]
impl AdStore for PgStore {
    async fn create_ad(&self, ad: NewAd) -> AppResult<Ad> {
        let ad = sqlx::query_as::<_, Ad>(&format!(
            "
            INSERT INTO ads (title, price, date, tag_id, views)
            VALUES ($1, $2, $3, $4, 0)
            RETURNING {AD_COLUMNS}
            "
        ))
        .bind(ad.title)
        .bind(ad.price)
        .bind(ad.date)
        .bind(ad.tag_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(ad)
    }

    async fn list_ads(&self) -> AppResult<Vec<Ad>> {
        let ads = sqlx::query_as::<_, Ad>(&format!("SELECT {AD_COLUMNS} FROM ads ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;

        Ok(ads)
    }

    async fn get_ad(&self, id: i32) -> AppResult<Option<Ad>> {
        let ad = sqlx::query_as::<_, Ad>(&format!("SELECT {AD_COLUMNS} FROM ads WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(ad)
    }

    async fn update_ad(&self, id: i32, changes: AdChanges) -> AppResult<Option<Ad>> {
        let ad = sqlx::query_as::<_, Ad>(&format!(
            "
            UPDATE ads
            SET
                title = COALESCE($2, title),
                price = COALESCE($3, price),
                date = COALESCE($4, date),
                tag_id = COALESCE($5, tag_id)
            WHERE id = $1
            RETURNING {AD_COLUMNS}
            "
        ))
        .bind(id)
        .bind(changes.title)
        .bind(changes.price)
        .bind(changes.date)
        .bind(changes.tag_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ad)
    }

    async fn delete_ad(&self, id: i32) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM ads WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn increment_views(&self, id: i32) -> AppResult<bool> {
        let result = sqlx::query("UPDATE ads SET views = views + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn search_ads(&self, filter: &AdFilter) -> AppResult<Vec<Ad>> {
        let mut query =
            QueryBuilder::<Postgres>::new(format!("SELECT {AD_COLUMNS} FROM ads WHERE TRUE"));
        push_filter(&mut query, filter);
        query.push(" ORDER BY id");

        let ads = query.build_query_as::<Ad>().fetch_all(&self.pool).await?;

        Ok(ads)
    }

    async fn list_tags(&self) -> AppResult<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>("SELECT id, name FROM tags ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(tags)
    }

    async fn existing_tag_ids(&self, ids: &[i32]) -> AppResult<Vec<i32>> {
        let found = sqlx::query_scalar::<_, i32>("SELECT id FROM tags WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(found)
    }
}
