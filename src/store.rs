use async_trait::async_trait;

use crate::error::AppResult;
use crate::filters::AdFilter;
use crate::models::{Ad, AdChanges, NewAd, Tag};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Data access for ads and tags. Handlers receive it as `web::Data<dyn AdStore>`.
///
/// Listing methods return rows in ascending id order.
#[async_trait]
pub trait AdStore: Send + Sync {
    async fn create_ad(&self, ad: NewAd) -> AppResult<Ad>;

    async fn list_ads(&self) -> AppResult<Vec<Ad>>;

    async fn get_ad(&self, id: i32) -> AppResult<Option<Ad>>;

    /// Returns `None` when no ad has this id.
    async fn update_ad(&self, id: i32, changes: AdChanges) -> AppResult<Option<Ad>>;

    /// Returns `false` when no ad has this id.
    async fn delete_ad(&self, id: i32) -> AppResult<bool>;

    /// Adds one to `views` in a single atomic step. Concurrent calls on the
    /// same id are never lost. Returns `false` when no ad has this id.
    async fn increment_views(&self, id: i32) -> AppResult<bool>;

    async fn search_ads(&self, filter: &AdFilter) -> AppResult<Vec<Ad>>;

    async fn list_tags(&self) -> AppResult<Vec<Tag>>;

    /// The subset of `ids` that name existing tags.
    async fn existing_tag_ids(&self, ids: &[i32]) -> AppResult<Vec<i32>>;
}
