//! End-to-end tests through the session coordinator.

#[path = "../common/mod.rs"]
mod common;

use std::sync::{Arc, Mutex};

use common::{hit, notice_collector, settle, MockBackend, RecordingListener};
use zimreader::app::SessionCoordinator;
use zimreader::types::errors::TabError;
use zimreader::types::settings::ClientSettings;
use zimreader::types::tab::{TabContent, TabSet};
use zimreader::types::translation::{TranslationModel, TranslationOutcome};

fn setup_with(
    backend: Arc<MockBackend>,
    settings: ClientSettings,
) -> (SessionCoordinator, Arc<RecordingListener>) {
    let listener = RecordingListener::new();
    let (_notices, sink) = notice_collector();
    let coordinator = SessionCoordinator::new(backend, settings, listener.clone(), sink);
    (coordinator, listener)
}

fn setup(backend: Arc<MockBackend>) -> (SessionCoordinator, Arc<RecordingListener>) {
    setup_with(backend, ClientSettings::default())
}

#[tokio::test]
async fn test_open_open_close_scenario() {
    let (coordinator, _) = setup(MockBackend::new());
    coordinator.open_tab("wiki", "A", "A");
    coordinator.open_tab("wiki", "B", "B");
    coordinator.close_tab("wiki:A");

    let set = coordinator.tabs();
    assert_eq!(set.ids(), vec!["wiki:B"]);
    assert_eq!(coordinator.get_active_tab().unwrap().id, "wiki:B");
}

#[tokio::test]
async fn test_search_result_opens_tab() {
    let backend = MockBackend::new();
    let (coordinator, listener) = setup(backend.clone());

    let feeder = backend.stream_for("cat");
    coordinator.search("cat", None);
    feeder.result(&hit("wiki", "Cat"));
    feeder.end();
    listener.wait_for_finished(1).await;

    let snapshot = coordinator.current_search();
    let id = coordinator.open_result(&snapshot.results[0]);
    assert_eq!(id, "wiki:Cat");
    assert_eq!(coordinator.get_active_tab().unwrap().title, "Cat");

    // clicking the same hit again re-activates
    coordinator.open_tab("wiki", "Other", "Other");
    coordinator.open_result(&snapshot.results[0]);
    assert_eq!(coordinator.tabs().tabs.len(), 2);
    assert_eq!(coordinator.get_active_tab().unwrap().id, "wiki:Cat");
}

#[tokio::test]
async fn test_search_uses_configured_mode_by_default() {
    let backend = MockBackend::new();
    let settings = ClientSettings {
        streaming_search: false,
        ..ClientSettings::default()
    };
    let (coordinator, listener) = setup_with(backend.clone(), settings);

    backend.batch_for("cat").send(Ok(vec![hit("wiki", "A")])).unwrap();
    coordinator.search("cat", None);
    listener.wait_for_finished(1).await;

    assert_eq!(backend.batch_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert_eq!(backend.stream_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_translate_round_trip() {
    let backend = MockBackend::new();
    backend.set_translation("wiki", "Cat", "fr", "Chat");
    let (coordinator, _) = setup(backend.clone());

    let id = coordinator.open_tab("wiki", "Cat", "Cat");
    let outcome = coordinator.translate_tab(&id, "fr").unwrap().await.unwrap();
    assert_eq!(outcome, Ok(TranslationOutcome::Applied));

    let tab = coordinator.get_tab(&id).unwrap();
    assert_eq!(tab.translated_content.as_deref(), Some("Chat"));
    assert_eq!(tab.title, "Cat");
}

#[tokio::test]
async fn test_translate_closed_tab_before_response() {
    let backend = MockBackend::new();
    let reply = backend.translation_for("wiki", "Cat", "fr");
    let (coordinator, _) = setup(backend.clone());

    let id = coordinator.open_tab("wiki", "Cat", "Cat");
    let job = coordinator.translate_tab(&id, "fr").unwrap();
    coordinator.close_tab(&id);

    reply.send(Ok("Chat".to_string())).unwrap();
    assert_eq!(job.await.unwrap(), Ok(TranslationOutcome::Discarded));
    assert_eq!(coordinator.tabs(), TabSet::default());
}

#[tokio::test]
async fn test_translate_unknown_tab_returns_none() {
    let (coordinator, _) = setup(MockBackend::new());
    assert!(coordinator.translate_tab("wiki:missing", "fr").is_none());
}

#[tokio::test]
async fn test_translate_falls_back_to_default_language() {
    let backend = MockBackend::new();
    backend.set_translation("wiki", "Cat", "de", "Katze");
    let settings = ClientSettings {
        default_translation_language: Some("de".to_string()),
        ..ClientSettings::default()
    };
    let (coordinator, _) = setup_with(backend, settings);

    let id = coordinator.open_tab("wiki", "Cat", "Cat");
    coordinator.translate_tab(&id, "").unwrap().await.unwrap().unwrap();
    assert_eq!(
        coordinator.get_tab(&id).unwrap().translated_content.as_deref(),
        Some("Katze")
    );
}

#[tokio::test]
async fn test_tab_content_prefers_translation() {
    let backend = MockBackend::new();
    backend.set_article("wiki", "Cat", "<p>Cat</p>");
    backend.set_translation("wiki", "Cat", "fr", "Chat");
    let (coordinator, _) = setup(backend.clone());

    let id = coordinator.open_tab("wiki", "Cat", "Cat");
    assert_eq!(
        coordinator.tab_content(&id).await.unwrap(),
        TabContent::Article {
            url: "http://mock/article/wiki/Cat".to_string(),
            html: "<p>Cat</p>".to_string(),
        }
    );

    coordinator.translate_tab(&id, "fr").unwrap().await.unwrap().unwrap();
    assert_eq!(
        coordinator.tab_content(&id).await.unwrap(),
        TabContent::Translated {
            html: "<html><body>Chat</body></html>".to_string(),
        }
    );
}

#[tokio::test]
async fn test_tab_content_errors() {
    let (coordinator, _) = setup(MockBackend::new());
    assert_eq!(
        coordinator.tab_content("wiki:missing").await,
        Err(TabError::NotFound("wiki:missing".to_string()))
    );

    let id = coordinator.open_tab("wiki", "Gone", "Gone");
    assert!(matches!(coordinator.tab_content(&id).await, Err(TabError::Backend(_))));
}

#[tokio::test]
async fn test_tab_subscription_sees_mutations() {
    let (coordinator, _) = setup(MockBackend::new());
    let seen: Arc<Mutex<Vec<TabSet>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let sub = coordinator.subscribe_tabs(move |set| sink.lock().unwrap().push(set.clone()));

    coordinator.open_tab("wiki", "A", "A");
    coordinator.select_tab("wiki:A");
    assert!(coordinator.unsubscribe_tabs(sub));
    coordinator.close_tab("wiki:A");

    assert_eq!(seen.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_translation_models_pass_through() {
    let backend = MockBackend::new();
    backend.set_models(vec![TranslationModel {
        from_code: "en".to_string(),
        to_code: "fr".to_string(),
        from_name: "English".to_string(),
        to_name: "French".to_string(),
    }]);
    let (coordinator, _) = setup(backend);

    let models = coordinator.translation_models().await.unwrap();
    assert_eq!(models.len(), 1);
    assert_eq!(models[0].to_name, "French");
}

#[tokio::test]
async fn test_cancel_search_through_coordinator() {
    let backend = MockBackend::new();
    let (coordinator, listener) = setup(backend.clone());

    let feeder = backend.stream_for("cat");
    coordinator.search("cat", Some(true));
    coordinator.cancel_search();
    feeder.result(&hit("wiki", "A"));
    settle().await;

    assert!(listener.snapshots().is_empty());
}
