//! Pagination, sorting and filter state for the domain listing.
//!
//! Every mutation recomputes the [`QueryKey`]; resolving that key through
//! the cache is the only way data moves. While a newer key's fetch is
//! outstanding the last delivered page stays visible as placeholder data;
//! a fetch whose generation no longer matches is discarded for display but
//! still committed to the cache by [`QueryCache`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use crate::constants::{paging, scores};
use crate::error::PipelineError;
use crate::models::domain::{DomainStatus, DomainSummary, PageResult};
use crate::models::query::{QueryKey, SortColumn, SortOrder};
use crate::prefs::PreferenceStore;
use crate::services::query_cache::QueryCache;

/// Filter fields mutated together, the way the filter bar submits them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainFilters {
    pub search: String,
    pub status: Option<DomainStatus>,
    pub score_min: Option<i64>,
    pub score_max: Option<i64>,
    pub reasoning: Option<bool>,
}

/// What a view renders: one page plus the navigation facts derived from it.
#[derive(Debug, Clone)]
pub struct PageView {
    pub items: Vec<DomainSummary>,
    pub total: u64,
    pub total_pages: u64,
    pub page: u64,
    pub page_size: u64,
    pub has_prev: bool,
    pub has_next: bool,
}

/// Result of a refresh: either a page for the key the caller asked about,
/// or notice that the parameters moved on while the fetch was in flight.
#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    Current(PageView),
    Superseded,
}

struct EngineState {
    filters: DomainFilters,
    page: u64,
    page_size: u64,
    sort_by: SortColumn,
    order: SortOrder,
    /// Bumped on every key-changing mutation; fetches carry the value they
    /// started with and are discarded for display on mismatch.
    generation: u64,
    last_page: Option<PageResult>,
}

impl EngineState {
    fn query_key(&self) -> QueryKey {
        QueryKey {
            search: self.filters.search.clone(),
            status: self.filters.status,
            score_min: self.filters.score_min,
            score_max: self.filters.score_max,
            reasoning: self.filters.reasoning,
            page: self.page,
            page_size: self.page_size,
            sort_by: self.sort_by,
            order: self.order,
        }
    }

    fn known_total_pages(&self) -> Option<u64> {
        self.last_page
            .as_ref()
            .map(|p| total_pages(p.total, self.page_size))
    }

    fn view(&self) -> Option<PageView> {
        let result = self.last_page.as_ref()?;
        let total_pages = total_pages(result.total, self.page_size);
        Some(PageView {
            items: result.items.clone(),
            total: result.total,
            total_pages,
            page: self.page,
            page_size: self.page_size,
            has_prev: self.page > 1,
            has_next: self.page < total_pages,
        })
    }
}

/// `ceil(total / page_size)`, floored at 1 for display.
#[must_use]
pub fn total_pages(total: u64, page_size: u64) -> u64 {
    if total == 0 || page_size == 0 {
        1
    } else {
        total.div_ceil(page_size)
    }
}

#[derive(Clone)]
pub struct DomainQueryEngine {
    cache: QueryCache,
    prefs: Arc<dyn PreferenceStore>,
    state: Arc<Mutex<EngineState>>,
}

impl DomainQueryEngine {
    #[must_use]
    pub fn new(cache: QueryCache, prefs: Arc<dyn PreferenceStore>) -> Self {
        let page_size = prefs.page_size();
        Self {
            cache,
            prefs,
            state: Arc::new(Mutex::new(EngineState {
                filters: DomainFilters::default(),
                page: 1,
                page_size,
                sort_by: SortColumn::default(),
                order: SortOrder::default(),
                generation: 0,
                last_page: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The key the next resolve will use, rebuilt from current state.
    #[must_use]
    pub fn query_key(&self) -> QueryKey {
        self.lock().query_key()
    }

    /// Moves to `page`. Out-of-range requests are a no-op, matching the
    /// disabled navigation buttons they correspond to.
    pub fn set_page(&self, page: u64) {
        let mut state = self.lock();
        if page < 1 || page == state.page {
            return;
        }
        if let Some(total_pages) = state.known_total_pages()
            && page > total_pages
        {
            return;
        }
        state.page = page;
        state.generation += 1;
    }

    /// Changes the page size, validated against the fixed allow-list, and
    /// persists the choice. Resets to page 1.
    pub fn set_page_size(&self, page_size: u64) -> Result<(), PipelineError> {
        if !paging::PAGE_SIZE_CHOICES.contains(&page_size) {
            return Err(PipelineError::validation(format!(
                "page size {page_size} is not one of {:?}",
                paging::PAGE_SIZE_CHOICES
            )));
        }
        let mut state = self.lock();
        state.page_size = page_size;
        state.page = 1;
        state.generation += 1;
        drop(state);
        self.prefs
            .set_raw(paging::ITEMS_PER_PAGE_KEY, &page_size.to_string());
        Ok(())
    }

    /// Sorts by `column`: same column flips the order, a new column starts
    /// ascending. Either way the listing snaps back to page 1.
    pub fn set_sort(&self, column: SortColumn) {
        let mut state = self.lock();
        if state.sort_by == column {
            state.order = state.order.flipped();
        } else {
            state.sort_by = column;
            state.order = SortOrder::Ascending;
        }
        state.page = 1;
        state.generation += 1;
    }

    /// Replaces the whole filter set and resets to page 1.
    pub fn set_filters(&self, filters: DomainFilters) -> Result<(), PipelineError> {
        if let (Some(min), Some(max)) = (filters.score_min, filters.score_max)
            && min > max
        {
            return Err(PipelineError::validation(format!(
                "score range {min}..{max} is inverted"
            )));
        }
        for bound in [filters.score_min, filters.score_max].into_iter().flatten() {
            if !(scores::MIN_CONFIDENCE..=scores::MAX_CONFIDENCE).contains(&bound) {
                return Err(PipelineError::validation(format!(
                    "score bound {bound} outside {}..={}",
                    scores::MIN_CONFIDENCE,
                    scores::MAX_CONFIDENCE
                )));
            }
        }
        let mut state = self.lock();
        if state.filters == filters {
            return Ok(());
        }
        state.filters = filters;
        state.page = 1;
        state.generation += 1;
        Ok(())
    }

    /// Resolves the current key through the cache.
    ///
    /// If the parameters changed while the fetch was in flight the result
    /// is reported as superseded; the cache keeps it for the key it was
    /// issued for either way.
    pub async fn refresh(&self) -> Result<RefreshOutcome, PipelineError> {
        let (key, generation) = {
            let state = self.lock();
            (state.query_key(), state.generation)
        };

        let result = self.cache.resolve(&key).await;

        let mut state = self.lock();
        if state.generation != generation {
            return Ok(RefreshOutcome::Superseded);
        }
        let page = result?;
        state.last_page = Some(page);
        Ok(state
            .view()
            .map(RefreshOutcome::Current)
            .unwrap_or(RefreshOutcome::Superseded))
    }

    /// Last delivered page, regardless of whether a newer fetch is still
    /// outstanding. `None` only before the first page ever lands.
    #[must_use]
    pub fn current_view(&self) -> Option<PageView> {
        self.lock().view()
    }

    /// Patches a verified domain into the held page so the listing agrees
    /// with a commit without waiting for the next revalidation.
    pub fn apply_verification(&self, domain_id: i64, status: DomainStatus) {
        let mut state = self.lock();
        if let Some(page) = state.last_page.as_mut()
            && let Some(row) = page.items.iter_mut().find(|d| d.id == domain_id)
        {
            row.status = status;
            row.last_verified_at = Some(Utc::now().to_rfc3339());
        }
    }

    #[must_use]
    pub fn page_size(&self) -> u64 {
        self.lock().page_size
    }

    #[must_use]
    pub fn page(&self) -> u64 {
        self.lock().page
    }
}
