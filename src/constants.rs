pub mod cache {
    use std::time::Duration;

    /// Age below which a cached page is served with no network call.
    pub const STALE_WINDOW: Duration = Duration::from_secs(5 * 60);

    /// Age at which a cached page is dropped instead of revalidated.
    pub const EVICTION_WINDOW: Duration = Duration::from_secs(30 * 60);
}

pub mod paging {
    /// Page sizes the preference store will accept.
    pub const PAGE_SIZE_CHOICES: &[u64] = &[5, 10, 25, 50, 100];

    pub const DEFAULT_PAGE_SIZE: u64 = 10;

    /// Preference key for the persisted page size.
    pub const ITEMS_PER_PAGE_KEY: &str = "items_per_page";
}

pub mod scores {
    pub const MIN_CONFIDENCE: i64 = 0;

    pub const MAX_CONFIDENCE: i64 = 100;
}
