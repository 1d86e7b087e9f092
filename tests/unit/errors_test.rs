use zimreader::types::errors::*;

// === BackendError Tests ===

#[test]
fn backend_error_display_variants() {
    assert_eq!(
        BackendError::Transport("connection refused".to_string()).to_string(),
        "Transport error: connection refused"
    );
    assert_eq!(
        BackendError::Status { status: 404, url: "http://x/search".to_string() }.to_string(),
        "Unexpected status 404 from http://x/search"
    );
    assert_eq!(
        BackendError::Decode("missing field".to_string()).to_string(),
        "Failed to decode response: missing field"
    );
    assert_eq!(
        BackendError::InvalidUrl("not a url".to_string()).to_string(),
        "Invalid backend URL: not a url"
    );
}

// === StreamError Tests ===

#[test]
fn stream_error_display() {
    assert_eq!(
        StreamError::Transport("reset".to_string()).to_string(),
        "Stream failed: reset"
    );
}

// === TabError Tests ===

#[test]
fn tab_error_not_found_display() {
    let err = TabError::NotFound("wiki:Cat".to_string());
    assert_eq!(err.to_string(), "Tab not found: wiki:Cat");
}

#[test]
fn tab_error_wraps_backend_error() {
    let err: TabError = BackendError::Transport("down".to_string()).into();
    assert_eq!(err.to_string(), "Failed to load article: Transport error: down");
}

#[test]
fn tab_error_implements_error_trait() {
    let err: Box<dyn std::error::Error> = Box::new(TabError::NotFound("id".to_string()));
    assert!(err.source().is_none());
}

// === TranslationError Tests ===

#[test]
fn translation_error_display_variants() {
    assert_eq!(
        TranslationError::MissingLanguage.to_string(),
        "No target language selected"
    );
    assert_eq!(
        TranslationError::Rejected("Translation language pair not found".to_string()).to_string(),
        "Translation failed: Translation language pair not found"
    );
}

#[test]
fn translation_error_from_backend_error() {
    let err: TranslationError = BackendError::Decode("bad json".to_string()).into();
    assert!(matches!(err, TranslationError::Backend(BackendError::Decode(_))));
    let boxed: Box<dyn std::error::Error> = Box::new(err);
    assert!(boxed.source().is_some());
}

// === SettingsError Tests ===

#[test]
fn settings_error_display_variants() {
    assert_eq!(
        SettingsError::IoError("denied".to_string()).to_string(),
        "Settings I/O error: denied"
    );
    assert_eq!(
        SettingsError::InvalidKey("nope".to_string()).to_string(),
        "Invalid settings key: nope"
    );
}
