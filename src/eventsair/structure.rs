//! EventsAir agenda export structures.
//!
//! Field names follow the export, including its `PresenationTitle` spelling.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct RawEventExport {
    pub(crate) agenda_data: RawAgenda,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct RawAgenda {
    pub(crate) agenda_items: Vec<RawAgendaItem>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct RawAgendaItem {
    pub(crate) speakers: Vec<RawSpeaker>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct RawSpeaker {
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) organization: Option<String>,
    #[serde(rename = "PresenationTitle")]
    pub(crate) presentation_title: String,
    #[serde(default)]
    pub(crate) documents: Vec<RawDocument>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct RawDocument {
    pub(crate) name: String,
    pub(crate) plain_text: Option<String>,
    pub(crate) url: Option<String>,
}

/// Submission details attached to an agenda item.
///
/// Attachments are looked up across all of an item's speakers, and a value
/// found on one speaker carries over to the speakers after it.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct SubmissionDocuments {
    pub(crate) abstract_text: Option<String>,
    pub(crate) keywords: Vec<String>,
    pub(crate) proposal_url: Option<String>,
}

impl SubmissionDocuments {
    pub(crate) fn absorb(&mut self, documents: &[RawDocument]) {
        for document in documents {
            match document.name.as_str() {
                "Abstract" => self.abstract_text = document.plain_text.clone(),
                "Keywords" => {
                    self.keywords = document
                        .plain_text
                        .as_deref()
                        .map(|text| text.split(", ").map(String::from).collect())
                        .unwrap_or_default();
                }
                "Proposal Document" => self.proposal_url = document.url.clone(),
                _ => {}
            }
        }
    }
}
