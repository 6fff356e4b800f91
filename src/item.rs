//! Vault item types and the panel-side item cache.

use serde::{Deserialize, Serialize};

/// One row of a search result. Carries only what the list view needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultItemSummary {
    /// Backend-assigned identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
}

/// Full detail for one selected item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct VaultItemDetail {
    /// Backend-assigned identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Login username, if present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Login password, if present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Current TOTP code, if the item has one configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totp: Option<String>,
    /// Associated URIs, in vault order.
    #[serde(default)]
    pub uris: Vec<String>,
}

/// Holds the last search result set, the current selection, and the last
/// fetched detail.
///
/// Invariant: the cache is non-empty only while the session is unlocked.
/// Any transition away from unlocked must call [`ItemCache::clear`]
/// synchronously with the status change so the panel never shows secret
/// material for a session it no longer believes in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemCache {
    /// Last search results, replaced wholesale on each search.
    pub summaries: Vec<VaultItemSummary>,
    /// Currently selected item id, if any.
    pub selected_id: Option<String>,
    /// Detail for the selected item. `selected_id` may be set with no
    /// detail after a failed fetch; the view renders that as empty.
    pub detail: Option<VaultItemDetail>,
}

impl ItemCache {
    /// Replaces the result set and drops any prior selection and detail.
    ///
    /// A stale selection referring to a no-longer-listed item must never
    /// remain selectable.
    pub fn replace_summaries(&mut self, summaries: Vec<VaultItemSummary>) {
        self.summaries = summaries;
        self.selected_id = None;
        self.detail = None;
    }

    /// Marks an item as selected before its detail has been fetched.
    ///
    /// The previous detail is discarded immediately so a slow fetch can
    /// never display the old item's secrets under the new selection.
    pub fn select(&mut self, id: impl Into<String>) {
        self.selected_id = Some(id.into());
        self.detail = None;
    }

    /// Installs the fetched detail for the current selection.
    pub fn set_detail(&mut self, detail: VaultItemDetail) {
        self.detail = Some(detail);
    }

    /// Drops the detail but keeps the selection marker.
    pub fn clear_detail(&mut self) {
        self.detail = None;
    }

    /// Empties the cache entirely.
    pub fn clear(&mut self) {
        self.summaries.clear();
        self.selected_id = None;
        self.detail = None;
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty() && self.selected_id.is_none() && self.detail.is_none()
    }
}
