pub mod query_cache;
pub use query_cache::{EntryState, PageFetcher, QueryCache};

pub mod domain_query;
pub use domain_query::{DomainFilters, DomainQueryEngine, PageView, RefreshOutcome};

pub mod verification;
pub use verification::{DraftState, VerificationBackend, VerificationDraft};

pub mod schedule;
pub use schedule::ScheduleOption;

pub mod dispatch;
pub use dispatch::{CrawlAggregate, CrawlDispatchCoordinator, DispatchBackend};

pub mod health;
pub use health::{BulkHealthCheckRunner, HealthProbe, HttpHealthProbe};

pub mod scheduler;
pub use scheduler::RefreshScheduler;
