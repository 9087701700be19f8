//! Normalisation and merging of iPRES conference publication metadata.
//!
//! `dppi` (Digital Preservation Publications Index) reads the raw exports that
//! fetchers pull from each source system and turns them into one canonical,
//! deduplicated stream of [`Publication`] records.
//!
//! # Sources
//!
//! - **Phaidra**: repository objects with Dublin-Core fields ([`PhaidraAdapter`])
//! - **EventsAir**: the event-management agenda export ([`EventsAirAdapter`])
//! - **Zotero**: the reference-manager group library ([`ZoteroAdapter`])
//! - **IDEALS**: OAI-PMH records with resolved handles ([`IdealsAdapter`])
//! - **Ghent spreadsheet**: the 2024 programme sheet ([`GhentAdapter`])
//!
//! # Basic Usage
//!
//! ```rust
//! use dppi::{IdealsAdapter, PublicationAdapter, SourceContext};
//!
//! let input = r#"{"title": ["Data Rescue"], "creator": ["Doe, Jane"], "source_url": "https://hdl.handle.net/2142/1", "pdf_url": "https://example.org/1.pdf"}
//! {"title": ["Data Rescue [presentation]"], "creator": ["Doe, Jane"], "source_url": "https://hdl.handle.net/2142/2", "pdf_url": "https://example.org/2.pdf"}"#;
//!
//! let adapter = IdealsAdapter::new(SourceContext::new("iPRES").with_year(2023));
//! let records: Vec<_> = adapter
//!     .normalise(Box::new(input.as_bytes()))
//!     .unwrap()
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//!
//! assert_eq!(records.len(), 1);
//! assert_eq!(records[0].creators, vec!["Jane Doe"]);
//! assert_eq!(records[0].slides_url.as_deref(), Some("https://hdl.handle.net/2142/2"));
//! ```
//!
//! # Running the whole pipeline
//!
//! ```no_run
//! use dppi::{MergeConfig, Pipeline};
//! use std::path::Path;
//!
//! let summary = Pipeline::new(MergeConfig::new())
//!     .run(Path::new("data/raw"), Path::new("data/ipres"))
//!     .unwrap();
//! println!("wrote {} records", summary.records_written);
//! ```
//!
//! # Error Handling
//!
//! Every fallible operation returns [`Result`], wrapping [`MergeError`].
//! Records that are merely unusable (no creators) are dropped and reported
//! through the injected [`Reporter`]; conditions that indicate a source the
//! code does not understand abort the run.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::io::BufRead;
use thiserror::Error;

pub mod config;
pub mod eventsair;
pub mod ghent;
pub mod graph;
pub mod ideals;
mod jsonl;
pub mod normalize;
pub mod phaidra;
pub mod pipeline;
pub mod reconcile;
mod regex;
pub mod report;
pub mod zotero;

// Reexports
pub use config::{MergeConfig, SourceContext};
pub use eventsair::EventsAirAdapter;
pub use ghent::GhentAdapter;
pub use graph::CoauthorGraph;
pub use ideals::IdealsAdapter;
pub use phaidra::PhaidraAdapter;
pub use pipeline::{Pipeline, PipelineSummary, SourceKind};
pub use report::{MemoryReporter, Reporter, Severity, TracingReporter};
pub use zotero::ZoteroAdapter;

/// License recorded when a source does not state one.
pub const DEFAULT_LICENSE: &str = "CC-BY 4.0 International";

/// A specialized Result type for merge operations.
pub type Result<T> = std::result::Result<T, MergeError>;

/// Errors that stop an adapter or the whole merge run.
#[derive(Error, Debug)]
pub enum MergeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON at line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parse error: {0}")]
    InvalidFormat(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid field value: {field} - {message}")]
    InvalidFieldValue { field: String, message: String },

    /// Two non-presentation records collapse onto the same canonical title.
    #[error("Duplicate title '{title}' (canonical form '{key}')")]
    DuplicateTitle { title: String, key: String },

    /// An attached file follows a naming convention the classifier does not know.
    #[error("Unrecognised attachment filename '{filename}' in {payload}")]
    UnknownAttachment { filename: String, payload: String },
}

impl From<serde_json::Error> for MergeError {
    fn from(err: serde_json::Error) -> Self {
        MergeError::Json {
            line: err.line(),
            source: err,
        }
    }
}

/// Well-known values of [`Publication::publication_type`].
pub mod kind {
    pub const PAPER: &str = "paper";
    pub const POSTER: &str = "poster";
    pub const PRESENTATION: &str = "presentation";
    pub const LIGHTNING_TALK: &str = "lightning talk";
    pub const UNKNOWN: &str = "unknown";
}

/// The canonical record every adapter produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Publication {
    /// Provenance, e.g. `iPRES` or `iPRES/eventsair/12`
    pub source_name: String,
    pub landing_page_url: Option<String>,
    pub document_url: Option<String>,
    pub slides_url: Option<String>,
    pub notes_url: Option<String>,
    pub stream_url: Option<String>,
    #[serde(default)]
    pub submission_url: Option<String>,
    /// Conference year
    pub year: i32,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    /// Three-letter language code once cleaned up
    pub language: String,
    /// Display names in "Given Family" order
    pub creators: Vec<String>,
    pub institutions: Vec<String>,
    pub license: Option<String>,
    /// Size in bytes of the archived object
    pub size: Option<u64>,
    #[serde(rename = "type", default = "default_type")]
    pub publication_type: String,
    pub date: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

fn default_type() -> String {
    kind::PAPER.to_string()
}

impl Publication {
    /// Creates a paper with only the required fields set.
    pub fn new(source_name: &str, year: i32, title: &str, language: &str) -> Self {
        Self {
            source_name: source_name.to_string(),
            landing_page_url: None,
            document_url: None,
            slides_url: None,
            notes_url: None,
            stream_url: None,
            submission_url: None,
            year,
            title: title.to_string(),
            abstract_text: None,
            language: language.to_string(),
            creators: Vec::new(),
            institutions: Vec::new(),
            license: None,
            size: None,
            publication_type: default_type(),
            date: None,
            keywords: Vec::new(),
        }
    }
}

/// Lazy, finite, single-pass stream of records from one adapter run.
pub type Records<'a> = Box<dyn Iterator<Item = Result<Publication>> + 'a>;

/// Trait for source adapters.
pub trait PublicationAdapter {
    /// Maps one raw source document into canonical records.
    ///
    /// # Errors
    ///
    /// Returns `MergeError` straight away when the input cannot be read at
    /// all; per-record failures are yielded by the iterator.
    fn normalise<'a>(&'a self, input: Box<dyn BufRead + 'a>) -> Result<Records<'a>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_merge_error_display() {
        let error = MergeError::DuplicateTitle {
            title: "DATA  Rescue".to_string(),
            key: "data rescue".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Duplicate title 'DATA  Rescue' (canonical form 'data rescue')"
        );
    }

    #[test]
    fn test_publication_serializes_type_and_abstract_names() {
        let mut publication = Publication::new("iPRES", 2023, "Data Rescue", "eng");
        publication.abstract_text = Some("About rescue".to_string());
        let value = serde_json::to_value(&publication).unwrap();
        assert_eq!(value["type"], "paper");
        assert_eq!(value["abstract"], "About rescue");
        assert!(value["slides_url"].is_null());
    }

    #[test]
    fn test_publication_round_trips_date_offset() {
        let line = r#"{"source_name":"iPRES","landing_page_url":null,"document_url":null,"slides_url":null,"notes_url":null,"stream_url":null,"year":2024,"title":"T","abstract":null,"language":"eng","creators":["A"],"institutions":[],"license":null,"size":null,"type":"poster","date":"2024-09-17T10:30:00+01:00","keywords":[]}"#;
        let publication: Publication = serde_json::from_str(line).unwrap();
        assert_eq!(publication.publication_type, "poster");
        assert_eq!(
            publication.date.unwrap().to_rfc3339(),
            "2024-09-17T10:30:00+01:00"
        );
    }
}
