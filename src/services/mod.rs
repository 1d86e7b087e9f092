// Reader services
// Services talk to the reader backend and drive asynchronous work: search
// sessions, result streams, translations, and settings.

pub mod backend;
pub mod search_session;
pub mod settings_engine;
pub mod stream_consumer;
pub mod translation_overlay;
