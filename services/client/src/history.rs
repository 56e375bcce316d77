//! Paginated bet history
//!
//! Page 1 replaces the cached list; later pages append, skipping ids already
//! present, so overlapping server pages never duplicate an item. A later page
//! only appends onto a fresh cache loaded with the same filter and page size;
//! otherwise page 1 is loaded instead. Invalidation is lazy: it only marks
//! the cache stale and the consumer decides when to pay for the refetch.

use parking_lot::Mutex;
use shared::api::HistoryQuery;
use shared::MAX_PAGE_SIZE;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use crate::domain::{BetId, BetResult, HistoryFilter, HistoryPage};
use crate::errors::{Result, ValidationError};
use crate::events::{EventBus, GameEvent};
use crate::executor::RequestExecutor;

#[derive(Default)]
struct HistoryCache {
    items: Vec<BetResult>,
    ids: HashSet<BetId>,
    /// Last merged page, 0 when nothing is loaded
    page: u32,
    page_size: u32,
    total_count: u64,
    filter: HistoryFilter,
    stale: bool,
    /// Bumped on every invalidation, to detect ones that race a fetch
    generation: u64,
}

impl HistoryCache {
    fn accepts_append(&self, page: u32, page_size: u32, filter: &HistoryFilter) -> bool {
        page > 1
            && self.page > 0
            && !self.stale
            && self.page_size == page_size
            && &self.filter == filter
    }

    fn merge(&mut self, page: u32, items: Vec<BetResult>) -> usize {
        if page == 1 {
            self.items.clear();
            self.ids.clear();
        }

        let mut skipped = 0;
        for item in items {
            if self.ids.insert(item.bet_id.clone()) {
                self.items.push(item);
            } else {
                skipped += 1;
            }
        }
        skipped
    }

    fn to_page(&self) -> HistoryPage {
        let total_pages = if self.page_size == 0 {
            0
        } else {
            u32::try_from(self.total_count.div_ceil(u64::from(self.page_size))).unwrap_or(u32::MAX)
        };

        HistoryPage {
            items: self.items.clone(),
            page: self.page,
            page_size: self.page_size,
            total_pages,
            total_count: self.total_count,
        }
    }
}

pub struct HistoryPaginator {
    executor: Arc<dyn RequestExecutor>,
    events: EventBus,
    default_page_size: u32,
    cache: Mutex<HistoryCache>,
    /// Serializes loads so pages merge in request order
    loading: tokio::sync::Mutex<()>,
}

impl HistoryPaginator {
    pub fn new(executor: Arc<dyn RequestExecutor>, events: EventBus, default_page_size: u32) -> Self {
        Self {
            executor,
            events,
            default_page_size: default_page_size.clamp(1, MAX_PAGE_SIZE),
            cache: Mutex::new(HistoryCache::default()),
            loading: tokio::sync::Mutex::new(()),
        }
    }

    /// Fetch `page` and merge it into the cached list
    ///
    /// Returns the merged view of everything loaded since the last page 1.
    pub async fn load_page(
        &self,
        page: u32,
        page_size: u32,
        filter: Option<HistoryFilter>,
    ) -> Result<HistoryPage> {
        if page == 0 {
            return Err(ValidationError::InvalidPage { page }.into());
        }
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(ValidationError::InvalidPageSize {
                page_size,
                max: MAX_PAGE_SIZE,
            }
            .into());
        }
        let filter = filter.unwrap_or_default();

        let _loading = self.loading.lock().await;

        let (page, generation) = {
            let cache = self.cache.lock();
            let page = if page == 1 || cache.accepts_append(page, page_size, &filter) {
                page
            } else {
                debug!(requested = page, "History cache not appendable, loading page 1");
                1
            };
            (page, cache.generation)
        };

        let query = HistoryQuery {
            page,
            page_size,
            game_id: filter.game_id.as_ref().map(|g| g.to_string()),
            start_date: filter.start_date,
            end_date: filter.end_date,
        };
        let response = self.executor.bet_history(&query).await?;
        let items: Vec<BetResult> = response.items.into_iter().map(BetResult::from).collect();
        let fetched = items.len();

        let mut cache = self.cache.lock();
        let skipped = cache.merge(page, items);
        cache.page = page;
        cache.page_size = page_size;
        cache.total_count = response.total_count;
        cache.filter = filter;
        if page == 1 {
            cache.stale = cache.generation != generation;
        }

        debug!(page, fetched, skipped, total = response.total_count, "History page merged");
        Ok(cache.to_page())
    }

    /// Load page 1 again with the current filter
    pub async fn refresh(&self) -> Result<HistoryPage> {
        let (page_size, filter) = self.current_query();
        self.load_page(1, page_size, Some(filter)).await
    }

    /// Load the page after the last merged one (page 1 if stale or empty)
    pub async fn load_next(&self) -> Result<HistoryPage> {
        let next = {
            let cache = self.cache.lock();
            if cache.stale { 1 } else { cache.page + 1 }
        };
        let (page_size, filter) = self.current_query();
        self.load_page(next, page_size, Some(filter)).await
    }

    /// Mark the cache stale; the next read refetches page 1
    pub fn invalidate(&self) {
        {
            let mut cache = self.cache.lock();
            cache.stale = true;
            cache.generation += 1;
        }
        self.events.publish(GameEvent::HistoryInvalidated);
    }

    pub fn is_stale(&self) -> bool {
        self.cache.lock().stale
    }

    pub fn has_more(&self) -> bool {
        self.snapshot().has_more()
    }

    /// Current merged view without touching the network
    pub fn snapshot(&self) -> HistoryPage {
        self.cache.lock().to_page()
    }

    /// Most recent cached bet
    pub fn latest(&self) -> Option<BetResult> {
        self.cache.lock().items.first().cloned()
    }

    fn current_query(&self) -> (u32, HistoryFilter) {
        let cache = self.cache.lock();
        let page_size = if cache.page_size == 0 {
            self.default_page_size
        } else {
            cache.page_size
        };
        (page_size, cache.filter.clone())
    }
}
