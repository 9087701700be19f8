//! Phaidra repository-object adapter.
//!
//! Reads the JSON-Lines dump of a Phaidra collection, one archived object per
//! line, and maps each object with Dublin-Core fields onto a [`Publication`].
//!
//! # Example
//!
//! ```
//! use dppi::{PhaidraAdapter, PublicationAdapter};
//!
//! let input = r#"{"pid": "o:1", "__source_name": "iPRES", "__year": 2016, "dc_title": ["Tools"], "dc_description": ["x"], "dc_language": ["en"], "dc_creator": ["Doe, Jane (KB)"]}"#;
//!
//! let adapter = PhaidraAdapter::new();
//! let records: Vec<_> = adapter
//!     .normalise(Box::new(input.as_bytes()))
//!     .unwrap()
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(records[0].creators, vec!["Jane Doe"]);
//! assert_eq!(records[0].institutions, vec!["KB"]);
//! ```

mod structure;

use std::io::BufRead;
use std::sync::Arc;

use crate::jsonl::json_lines;
use crate::report::{Reporter, default_reporter};
use crate::{DEFAULT_LICENSE, Publication, PublicationAdapter, Records, Result};
use structure::{RawPhaidraObject, split_creators};

const SOURCE: &str = "phaidra";

/// Adapter for Phaidra JSON-Lines dumps.
#[derive(Clone)]
pub struct PhaidraAdapter {
    reporter: Arc<dyn Reporter>,
    default_license: String,
}

impl Default for PhaidraAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaidraAdapter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            reporter: default_reporter(),
            default_license: DEFAULT_LICENSE.to_string(),
        }
    }

    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// License for objects without `dc_license`.
    #[must_use]
    pub fn with_default_license(mut self, license: &str) -> Self {
        self.default_license = license.to_string();
        self
    }

    /// Maps one object; `Ok(None)` when the object has no creators.
    fn convert(&self, raw: RawPhaidraObject) -> Result<Option<Publication>> {
        let mut publication = raw.to_publication()?;
        publication
            .license
            .get_or_insert_with(|| self.default_license.clone());
        self.reporter.info(
            SOURCE,
            &format!("Processing article \"{}\"", publication.title),
        );

        let Some(raw_creators) = raw.dc_creator.as_deref().filter(|c| !c.is_empty()) else {
            self.reporter.error(
                SOURCE,
                &format!(
                    "No creator for \"{}\" ({}), dropping this record",
                    publication.title, raw.pid
                ),
            );
            return Ok(None);
        };

        let (creators, institutions) = split_creators(raw_creators);
        publication.creators = creators;
        publication.institutions = institutions;
        Ok(Some(publication))
    }
}

impl PublicationAdapter for PhaidraAdapter {
    fn normalise<'a>(&'a self, input: Box<dyn BufRead + 'a>) -> Result<Records<'a>> {
        let records = json_lines::<RawPhaidraObject>(input).filter_map(move |line| {
            line.and_then(|(_, raw)| self.convert(raw)).transpose()
        });
        Ok(Box::new(records))
    }
}
