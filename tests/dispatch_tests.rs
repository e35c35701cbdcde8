//! Tests for the crawl dispatch coordinator: keyword working set,
//! validation-before-network, defensive aggregation and schedule saves.

use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::broadcast;

use judolwatch::error::PipelineError;
use judolwatch::models::keyword::{
    CrawlEngine, KeywordId, KeywordRecord, MultiKeywordResponse,
};
use judolwatch::services::dispatch::{
    CrawlAggregate, CrawlDispatchCoordinator, DispatchBackend,
};
use judolwatch::services::schedule::ScheduleOption;

#[derive(Default)]
struct FakeBackend {
    saved_schedules: Mutex<Vec<(Vec<String>, String, String)>>,
    dispatches: Mutex<Vec<Vec<String>>>,
    response: Mutex<Option<serde_json::Value>>,
}

impl FakeBackend {
    fn with_response(value: serde_json::Value) -> Arc<Self> {
        let backend = Self::default();
        *backend.response.lock().unwrap() = Some(value);
        Arc::new(backend)
    }
}

#[async_trait]
impl DispatchBackend for FakeBackend {
    async fn save_schedule(
        &self,
        keywords: &[String],
        schedule: &str,
        crawl_engine: &str,
    ) -> Result<(), PipelineError> {
        self.saved_schedules.lock().unwrap().push((
            keywords.to_vec(),
            schedule.to_string(),
            crawl_engine.to_string(),
        ));
        Ok(())
    }

    async fn dispatch_crawl(
        &self,
        keywords: &[String],
        _crawl_engine: &str,
        _ai_reasoning: bool,
        _tld_whitelist: Option<&str>,
    ) -> Result<MultiKeywordResponse, PipelineError> {
        self.dispatches.lock().unwrap().push(keywords.to_vec());
        let value = self
            .response
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| serde_json::json!({ "results": [] }));
        serde_json::from_value(value)
            .map_err(|e| PipelineError::Network(format!("bad response: {e}")))
    }
}

fn coordinator(backend: Arc<FakeBackend>) -> CrawlDispatchCoordinator {
    let (bus, _) = broadcast::channel(16);
    CrawlDispatchCoordinator::new(backend, bus)
}

#[tokio::test]
async fn aggregation_treats_malformed_items_as_zero() {
    let backend = FakeBackend::with_response(serde_json::json!({
        "results": [
            { "keyword": "slot gacor", "total_saved": 3, "inference_triggered": 2 },
            { "keyword": "maxwin", "total_saved": "bad" },
        ]
    }));
    let coordinator = coordinator(backend);

    let aggregate = coordinator
        .dispatch_adhoc(
            &["slot gacor".to_string(), "maxwin".to_string()],
            CrawlEngine::Google,
            true,
            &[],
        )
        .await
        .unwrap();

    assert_eq!(aggregate.total_saved, 3);
    assert_eq!(aggregate.total_inference_triggered, 2);
    assert_eq!(aggregate.results.len(), 2);
}

#[tokio::test]
async fn dispatch_with_no_keywords_never_reaches_the_backend() {
    let backend = Arc::new(FakeBackend::default());
    let coordinator = coordinator(backend.clone());

    let err = coordinator
        .dispatch_adhoc(&[], CrawlEngine::Google, false, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Validation(_)));
    assert!(backend.dispatches.lock().unwrap().is_empty());

    let err = coordinator
        .dispatch_adhoc(&["  ".to_string()], CrawlEngine::Google, false, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Validation(_)));
    assert!(backend.dispatches.lock().unwrap().is_empty());
}

#[tokio::test]
async fn save_sends_the_canonical_cron_and_engine() {
    let backend = Arc::new(FakeBackend::default());
    let mut coordinator = coordinator(backend.clone());

    coordinator.set_persisted(vec![KeywordRecord {
        id: 11,
        keyword: "slot gacor".to_string(),
    }]);
    coordinator.add_local("rtp live").unwrap();

    coordinator
        .save_configuration(ScheduleOption::Every2h, CrawlEngine::Baidu)
        .await
        .unwrap();

    let saved = backend.saved_schedules.lock().unwrap();
    assert_eq!(saved.len(), 1);
    let (keywords, cron, engine) = &saved[0];
    assert_eq!(
        keywords.as_slice(),
        &["slot gacor".to_string(), "rtp live".to_string()]
    );
    assert_eq!(cron, "0 */2 * * *");
    assert_eq!(engine, "baidu");
}

#[tokio::test]
async fn save_with_empty_working_set_is_rejected_locally() {
    let backend = Arc::new(FakeBackend::default());
    let coordinator = coordinator(backend.clone());

    let err = coordinator
        .save_configuration(ScheduleOption::Every1h, CrawlEngine::Google)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Validation(_)));
    assert!(backend.saved_schedules.lock().unwrap().is_empty());
}

#[test]
fn local_keywords_are_tracked_until_the_server_takes_over() {
    let backend = Arc::new(FakeBackend::default());
    let mut coordinator = coordinator(backend);

    coordinator.set_persisted(vec![KeywordRecord {
        id: 1,
        keyword: "slot".to_string(),
    }]);

    let local_id = coordinator.add_local("judi online").unwrap();
    assert_eq!(coordinator.unsaved(), 1);
    assert!(local_id.server_id().is_none());

    // Duplicates and empties are refused.
    assert!(coordinator.add_local("judi online").is_err());
    assert!(coordinator.add_local("   ").is_err());

    // A local entry can be withdrawn without any backend involvement.
    let removed = coordinator.remove(local_id).unwrap();
    assert!(!removed.is_persisted());
    assert_eq!(coordinator.unsaved(), 0);

    // After a save the server list replaces the working set wholesale.
    coordinator.add_local("rtp slot").unwrap();
    coordinator.set_persisted(vec![
        KeywordRecord {
            id: 1,
            keyword: "slot".to_string(),
        },
        KeywordRecord {
            id: 2,
            keyword: "rtp slot".to_string(),
        },
    ]);
    assert_eq!(coordinator.unsaved(), 0);
    assert!(coordinator.entries().iter().all(|e| e.is_persisted()));
    assert!(
        coordinator
            .entries()
            .iter()
            .all(|e| matches!(e.id, KeywordId::Saved(_)))
    );
}

#[test]
fn aggregate_of_nothing_is_zero() {
    let aggregate = CrawlAggregate::from_results(vec![]);
    assert_eq!(aggregate.total_saved, 0);
    assert_eq!(aggregate.total_inference_triggered, 0);
}
