use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::AdStore;
use crate::error::{AppError, AppResult};
use crate::filters::AdFilter;
use crate::models::{Ad, AdChanges, NewAd, Tag};

/// In-process store. One mutex guards all state, so every operation is
/// atomic with respect to the others.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    last_ad_id: i32,
    ads: BTreeMap<i32, Ad>,
    tags: BTreeMap<i32, Tag>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tags(tags: impl IntoIterator<Item = Tag>) -> Self {
        let store = Self::default();
        if let Ok(mut state) = store.state.lock() {
            state.tags = tags.into_iter().map(|tag| (tag.id, tag)).collect();
        }
        store
    }

    /// Seeds tags with ids counting from 1 in the given order.
    pub fn with_tag_names(names: impl IntoIterator<Item = String>) -> Self {
        Self::with_tags(
            names
                .into_iter()
                .zip(1..)
                .map(|(name, id)| Tag { id, name }),
        )
    }

    fn state(&self) -> AppResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| AppError::Internal("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl AdStore for MemoryStore {
    async fn create_ad(&self, ad: NewAd) -> AppResult<Ad> {
        let mut state = self.state()?;
        state.last_ad_id += 1;

        let ad = Ad {
            id: state.last_ad_id,
            title: ad.title,
            price: ad.price,
            date: ad.date,
            tag_id: ad.tag_id,
            views: 0,
        };
        state.ads.insert(ad.id, ad.clone());

        Ok(ad)
    }

    async fn list_ads(&self) -> AppResult<Vec<Ad>> {
        Ok(self.state()?.ads.values().cloned().collect())
    }

    async fn get_ad(&self, id: i32) -> AppResult<Option<Ad>> {
        Ok(self.state()?.ads.get(&id).cloned())
    }

    async fn update_ad(&self, id: i32, changes: AdChanges) -> AppResult<Option<Ad>> {
        let mut state = self.state()?;
        Ok(state.ads.get_mut(&id).map(|ad| {
            changes.apply(ad);
            ad.clone()
        }))
    }

    async fn delete_ad(&self, id: i32) -> AppResult<bool> {
        Ok(self.state()?.ads.remove(&id).is_some())
    }

    async fn increment_views(&self, id: i32) -> AppResult<bool> {
        let mut state = self.state()?;
        match state.ads.get_mut(&id) {
            Some(ad) => {
                // Postgres rejects the same overflow on the INTEGER column.
                ad.views = ad.views.checked_add(1).ok_or_else(|| {
                    AppError::Internal(format!("views counter of ad {id} is out of range"))
                })?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn search_ads(&self, filter: &AdFilter) -> AppResult<Vec<Ad>> {
        Ok(self
            .state()?
            .ads
            .values()
            .filter(|ad| filter.matches(ad))
            .cloned()
            .collect())
    }

    async fn list_tags(&self) -> AppResult<Vec<Tag>> {
        Ok(self.state()?.tags.values().cloned().collect())
    }

    async fn existing_tag_ids(&self, ids: &[i32]) -> AppResult<Vec<i32>> {
        let state = self.state()?;
        Ok(ids
            .iter()
            .copied()
            .filter(|id| state.tags.contains_key(id))
            .collect())
    }
}
