//! Zotero API items as the fetcher writes them.
//!
//! Primary items carry a `publication_type` label naming the collection they
//! were listed under. Attachment items point at their parent through
//! `data.parentItem`. When an attachment links to a shared session folder, the
//! fetcher resolves it and stores the folder id in `__folder_id` and its file
//! listing in `__folder_files`.

use serde::Deserialize;
use serde_json::Value;

use crate::normalize::{non_empty, reorder_name};
use crate::zotero::attachments::folder_id_from_url;

pub(crate) const ATTACHMENT: &str = "attachment";

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawZoteroItem {
    pub(crate) key: String,
    pub(crate) publication_type: Option<String>,
    pub(crate) data: RawItemData,
    #[serde(rename = "__folder_id")]
    pub(crate) folder_id: Option<String>,
    #[serde(rename = "__folder_files", default)]
    pub(crate) folder_files: Vec<RawFolderFile>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawItemData {
    pub(crate) item_type: String,
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) creators: Vec<RawCreator>,
    pub(crate) abstract_note: Option<String>,
    pub(crate) date: Option<String>,
    pub(crate) url: Option<String>,
    pub(crate) language: Option<String>,
    pub(crate) rights: Option<String>,
    #[serde(default)]
    pub(crate) tags: Vec<RawTag>,
    pub(crate) parent_item: Option<String>,
}

/// Either a two-field or a single-field creator.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawCreator {
    pub(crate) first_name: Option<String>,
    pub(crate) last_name: Option<String>,
    pub(crate) name: Option<String>,
}

impl RawCreator {
    pub(crate) fn display_name(&self) -> Option<String> {
        if let Some(name) = non_empty(self.name.clone()) {
            return Some(reorder_name(&name));
        }
        let first = self.first_name.as_deref().unwrap_or("").trim();
        let last = self.last_name.as_deref().unwrap_or("").trim();
        let joined = format!("{first} {last}").trim().to_string();
        (!joined.is_empty()).then_some(joined)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawTag {
    pub(crate) tag: String,
}

/// One entry of a resolved session-folder listing.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawFolderFile {
    pub(crate) name: String,
    pub(crate) url: String,
}

/// An attachment with the raw JSON it was read from.
#[derive(Debug, Clone)]
pub(crate) struct Attachment {
    pub(crate) item: RawZoteroItem,
    pub(crate) payload: Value,
}

impl Attachment {
    /// The session folder this attachment links to, if any.
    pub(crate) fn folder_id(&self) -> Option<String> {
        non_empty(self.item.folder_id.clone()).or_else(|| {
            self.item
                .data
                .url
                .as_deref()
                .and_then(folder_id_from_url)
        })
    }
}

impl RawZoteroItem {
    pub(crate) fn is_attachment(&self) -> bool {
        self.data.item_type == ATTACHMENT
    }
}
