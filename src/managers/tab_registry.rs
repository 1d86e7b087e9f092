//! Tab Registry for the reader.
//!
//! Owns the ordered set of open article tabs and the single active-tab key,
//! and publishes a fresh `TabSet` to subscribers after every mutation.

use tracing::debug;

use crate::types::tab::{Tab, TabSet};

/// Callback invoked with the new tab set after a mutation.
///
/// Runs while the registry is borrowed mutably; it must not call back into
/// the registry.
pub type TabSubscriber = Box<dyn Fn(&TabSet) + Send + Sync>;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Trait defining the tab registry interface.
pub trait TabRegistryTrait {
    fn open_tab(&mut self, zim_id: &str, path: &str, title: &str) -> String;
    fn close_tab(&mut self, tab_id: &str);
    fn select_tab(&mut self, tab_id: &str);
    fn patch_tab_content(&mut self, tab_id: &str, translated_content: &str) -> bool;
    fn get_tab(&self, tab_id: &str) -> Option<&Tab>;
    fn get_active_tab(&self) -> Option<&Tab>;
    fn get_all_tabs(&self) -> &[Tab];
    fn tab_count(&self) -> usize;
    fn snapshot(&self) -> TabSet;
    fn subscribe(&mut self, subscriber: TabSubscriber) -> SubscriptionId;
    fn unsubscribe(&mut self, id: SubscriptionId) -> bool;
}

/// In-memory registry of open article tabs.
pub struct TabRegistry {
    tabs: Vec<Tab>,
    active_tab_id: Option<String>,
    subscribers: Vec<(SubscriptionId, TabSubscriber)>,
    next_subscription: u64,
}

impl TabRegistry {
    pub fn new() -> Self {
        Self {
            tabs: Vec::new(),
            active_tab_id: None,
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    fn find_tab_index(&self, tab_id: &str) -> Option<usize> {
        self.tabs.iter().position(|t| t.id == tab_id)
    }

    fn notify(&self) {
        if self.subscribers.is_empty() {
            return;
        }
        let set = self.snapshot();
        for (_, subscriber) in &self.subscribers {
            subscriber(&set);
        }
    }
}

impl Default for TabRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TabRegistryTrait for TabRegistry {
    /// Open a tab for `(zim_id, path)`, or re-activate it if already open.
    /// Returns the tab's key.
    fn open_tab(&mut self, zim_id: &str, path: &str, title: &str) -> String {
        let id = Tab::key(zim_id, path);
        if self.find_tab_index(&id).is_none() {
            debug!(tab_id = %id, "opening tab");
            self.tabs.push(Tab::new(zim_id, path, title));
        } else {
            debug!(tab_id = %id, "re-activating tab");
        }
        self.active_tab_id = Some(id.clone());
        self.notify();
        id
    }

    /// Close a tab. If it was active, the first remaining tab becomes active.
    fn close_tab(&mut self, tab_id: &str) {
        let Some(idx) = self.find_tab_index(tab_id) else {
            return;
        };
        self.tabs.remove(idx);

        if self.active_tab_id.as_deref() == Some(tab_id) {
            self.active_tab_id = self.tabs.first().map(|t| t.id.clone());
        }
        debug!(tab_id, remaining = self.tabs.len(), "closed tab");
        self.notify();
    }

    fn select_tab(&mut self, tab_id: &str) {
        if self.find_tab_index(tab_id).is_none() {
            return;
        }
        self.active_tab_id = Some(tab_id.to_string());
        self.notify();
    }

    /// Attach translated text to a tab. Returns false when the tab has
    /// already been closed.
    fn patch_tab_content(&mut self, tab_id: &str, translated_content: &str) -> bool {
        let Some(tab) = self.tabs.iter_mut().find(|t| t.id == tab_id) else {
            debug!(tab_id, "dropping content patch for closed tab");
            return false;
        };
        tab.translated_content = Some(translated_content.to_string());
        self.notify();
        true
    }

    fn get_tab(&self, tab_id: &str) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == tab_id)
    }

    fn get_active_tab(&self) -> Option<&Tab> {
        self.active_tab_id
            .as_ref()
            .and_then(|id| self.tabs.iter().find(|t| t.id == *id))
    }

    fn get_all_tabs(&self) -> &[Tab] {
        &self.tabs
    }

    fn tab_count(&self) -> usize {
        self.tabs.len()
    }

    fn snapshot(&self) -> TabSet {
        TabSet {
            tabs: self.tabs.clone(),
            active_id: self.active_tab_id.clone(),
        }
    }

    fn subscribe(&mut self, subscriber: TabSubscriber) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, subscriber));
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }
}
