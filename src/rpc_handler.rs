//! RPC method handler for the reader's JSON-RPC protocol.
//!
//! Kept apart from `rpc_server.rs` so it can be unit-tested independently.
//! `handle_method` dispatches calls to the `SessionCoordinator`; asynchronous
//! progress (tab changes, search snapshots, notices) is pushed through an
//! `EventForwarder` as `{"event": ..., "data": ...}` messages.
//!
//! Requests that wait on the network run as their own tasks so a stalled
//! backend never holds up the request loop; responses may therefore arrive
//! out of order and are matched by `id`.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::mpsc::UnboundedSender;

use crate::app::SessionCoordinator;
use crate::services::backend::ZimBackend;
use crate::services::search_session::SearchListener;
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::services::translation_overlay::NoticeSink;
use crate::types::search::{SearchOutcome, SearchSnapshot};
use crate::types::tab::TabSet;
use crate::types::translation::Notice;

/// Build a push event message.
pub fn event_message(name: &str, data: impl Serialize) -> Value {
    let data = serde_json::to_value(data).unwrap_or(Value::Null);
    json!({ "event": name, "data": data })
}

/// Forwards core events to the output channel as JSON messages.
#[derive(Clone)]
pub struct EventForwarder {
    tx: UnboundedSender<Value>,
}

impl EventForwarder {
    pub fn new(tx: UnboundedSender<Value>) -> Self {
        Self { tx }
    }

    fn send(&self, message: Value) {
        // receiver gone means the process is shutting down
        let _ = self.tx.send(message);
    }

    pub fn notice_sink(&self) -> NoticeSink {
        let forwarder = self.clone();
        Arc::new(move |notice: Notice| forwarder.send(event_message("notice", notice)))
    }

    pub fn tab_subscriber(&self) -> impl Fn(&TabSet) + Send + Sync + 'static {
        let forwarder = self.clone();
        move |set: &TabSet| forwarder.send(event_message("tabs", set))
    }
}

impl SearchListener for EventForwarder {
    fn on_snapshot(&self, snapshot: SearchSnapshot) {
        self.send(event_message("search", snapshot));
    }

    fn on_finished(&self, query: &str, outcome: SearchOutcome) {
        self.send(event_message(
            "search.finished",
            json!({ "query": query, "outcome": outcome }),
        ));
    }
}

/// Everything a JSON-RPC call can reach.
pub struct RpcContext {
    pub coordinator: SessionCoordinator,
    pub settings: Mutex<SettingsEngine>,
}

impl RpcContext {
    /// Wire a coordinator whose events go to `events`.
    pub fn new(
        backend: Arc<dyn ZimBackend>,
        settings: SettingsEngine,
        events: UnboundedSender<Value>,
    ) -> Self {
        let forwarder = EventForwarder::new(events);
        let coordinator = SessionCoordinator::new(
            backend,
            settings.get_settings().clone(),
            Arc::new(forwarder.clone()),
            forwarder.notice_sink(),
        );
        coordinator.subscribe_tabs(forwarder.tab_subscriber());
        Self {
            coordinator,
            settings: Mutex::new(settings),
        }
    }
}

fn str_param<'a>(params: &'a Value, name: &str) -> Result<&'a str, String> {
    params
        .get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("missing {}", name))
}

/// Methods whose result depends on a backend round trip.
pub fn runs_in_background(method: &str) -> bool {
    matches!(method, "tab.content" | "translate.models")
}

/// Run one request and build its response line.
pub async fn handle_request(ctx: &RpcContext, id: Value, method: &str, params: &Value) -> Value {
    match handle_method(ctx, method, params).await {
        Ok(val) => json!({"id": id, "result": val}),
        Err(err) => json!({"id": id, "error": err}),
    }
}

/// Answer a request on `responses`. Network-bound methods are spawned and
/// answer later; everything else is answered before this returns.
pub async fn dispatch_request(
    ctx: &Arc<RpcContext>,
    responses: &UnboundedSender<Value>,
    id: Value,
    method: &str,
    params: Value,
) {
    if runs_in_background(method) {
        let ctx = ctx.clone();
        let responses = responses.clone();
        let method = method.to_string();
        tokio::spawn(async move {
            let response = handle_request(&ctx, id, &method, &params).await;
            let _ = responses.send(response);
        });
        return;
    }
    let _ = responses.send(handle_request(ctx, id, method, &params).await);
}

/// Dispatch a JSON-RPC method call.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub async fn handle_method(ctx: &RpcContext, method: &str, params: &Value) -> Result<Value, String> {
    let coordinator = &ctx.coordinator;
    match method {
        "ping" => Ok(json!({"pong": true})),

        // ─── Tabs ───
        "tab.open" => {
            let zim_id = str_param(params, "zim_id")?;
            let path = str_param(params, "path")?;
            let title = params.get("title").and_then(|v| v.as_str()).unwrap_or(path);
            let id = coordinator.open_tab(zim_id, path, title);
            Ok(json!({"id": id}))
        }
        "tab.close" => {
            let id = str_param(params, "id")?;
            coordinator.close_tab(id);
            Ok(json!({"ok": true}))
        }
        "tab.select" => {
            let id = str_param(params, "id")?;
            coordinator.select_tab(id);
            Ok(json!({"ok": true}))
        }
        "tab.list" => serde_json::to_value(coordinator.tabs()).map_err(|e| e.to_string()),
        "tab.active" => serde_json::to_value(coordinator.get_active_tab()).map_err(|e| e.to_string()),
        "tab.content" => {
            let id = str_param(params, "id")?;
            let content = coordinator.tab_content(id).await.map_err(|e| e.to_string())?;
            serde_json::to_value(content).map_err(|e| e.to_string())
        }

        // ─── Search ───
        "search.run" => {
            let query = str_param(params, "query")?;
            let streaming = params.get("streaming").and_then(|v| v.as_bool());
            coordinator.search(query, streaming);
            Ok(json!({"started": true}))
        }
        "search.cancel" => {
            coordinator.cancel_search();
            Ok(json!({"ok": true}))
        }
        "search.current" => {
            serde_json::to_value(coordinator.current_search()).map_err(|e| e.to_string())
        }

        // ─── Translation ───
        "translate.tab" => {
            let id = str_param(params, "id")?;
            let to_lang = params.get("to_lang").and_then(|v| v.as_str()).unwrap_or("");
            let started = coordinator.translate_tab(id, to_lang).is_some();
            Ok(json!({"started": started}))
        }
        "translate.models" => {
            let models = coordinator
                .translation_models()
                .await
                .map_err(|e| e.to_string())?;
            serde_json::to_value(models).map_err(|e| e.to_string())
        }

        // ─── Settings ───
        "settings.get" => {
            let engine = ctx.settings.lock().map_err(|e| e.to_string())?;
            serde_json::to_value(engine.get_settings()).map_err(|e| e.to_string())
        }
        "settings.set" => {
            let key = str_param(params, "key")?;
            let value = params.get("value").cloned().ok_or("missing value")?;
            let mut engine = ctx.settings.lock().map_err(|e| e.to_string())?;
            engine.set_value(key, value).map_err(|e| e.to_string())?;
            coordinator.update_settings(engine.get_settings().clone());
            Ok(json!({"ok": true}))
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
