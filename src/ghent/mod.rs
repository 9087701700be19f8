//! Ghent programme spreadsheet adapter.
//!
//! The iPRES 2024 programme was exported as a UTF-8 CSV with a byte-order
//! mark, one row per programme slot. Rows without authors are section
//! headers, breaks and the like, and are skipped.
//!
//! # Example
//!
//! ```
//! use dppi::{GhentAdapter, PublicationAdapter, SourceContext};
//!
//! let input = "\u{feff}Title,Authors,License,PosterImageLocation,PublicationLocation,PresentationMaterials,SessionVideoLocation,CollaborativeNotesLocation,CompetencyFrameworkBestMatch,ConferenceTheme,Abstract_MARKDOWN,AcceptedFormat,PresentationDate,PresentationStart
//! Coffee,,,,,,,,,,,,,
//! Bits,\"Jane Doe, Rich Roe\",,,,,,,,,,Poster,2024-09-17,10:30";
//!
//! let adapter = GhentAdapter::new(SourceContext::new("iPRES").with_year(2024));
//! let records: Vec<_> = adapter
//!     .normalise(Box::new(input.as_bytes()))
//!     .unwrap()
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(records.len(), 1);
//! assert_eq!(records[0].creators, vec!["Jane Doe", "Rich Roe"]);
//! ```

mod structure;

use std::io::{BufRead, Cursor, Read};
use std::sync::Arc;

use crate::config::SourceContext;
use crate::report::{Reporter, default_reporter};
use crate::{PublicationAdapter, Records, Result};
use structure::RawProgrammeRow;

const SOURCE: &str = "ghent";
const BYTE_ORDER_MARK: char = '\u{feff}';

/// Adapter for the Ghent programme spreadsheet.
#[derive(Clone)]
pub struct GhentAdapter {
    context: SourceContext,
    reporter: Arc<dyn Reporter>,
}

impl GhentAdapter {
    #[must_use]
    pub fn new(context: SourceContext) -> Self {
        Self {
            context,
            reporter: default_reporter(),
        }
    }

    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }
}

impl PublicationAdapter for GhentAdapter {
    fn normalise<'a>(&'a self, mut input: Box<dyn BufRead + 'a>) -> Result<Records<'a>> {
        let year = self.context.year()?;
        let mut text = String::new();
        input.read_to_string(&mut text)?;
        if text.starts_with(BYTE_ORDER_MARK) {
            text.remove(0);
        }

        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(Cursor::new(text));

        let records = reader
            .into_deserialize::<RawProgrammeRow>()
            .filter_map(move |row| match row {
                Ok(row) if !row.is_publication() => {
                    self.reporter.debug(
                        SOURCE,
                        &format!("Skipping row without authors: \"{}\"", row.title),
                    );
                    None
                }
                Ok(row) => Some(row.into_publication(&self.context, year)),
                Err(err) => Some(Err(err.into())),
            });
        Ok(Box::new(records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MergeError, Publication};
    use pretty_assertions::assert_eq;

    const HEADER: &str = "Title,Authors,License,PosterImageLocation,PublicationLocation,PresentationMaterials,SessionVideoLocation,CollaborativeNotesLocation,CompetencyFrameworkBestMatch,ConferenceTheme,Abstract_MARKDOWN,AcceptedFormat,PresentationDate,PresentationStart";

    fn run(input: &str) -> Result<Vec<Publication>> {
        let adapter = GhentAdapter::new(SourceContext::new("iPRES").with_year(2024));
        adapter.normalise(Box::new(input.as_bytes()))?.collect()
    }

    #[test]
    fn test_rows_map_to_publications() {
        let input = format!(
            "\u{feff}{HEADER}\n\
             Opening,,,,,,,,,,,,,\n\
             Bits,\"Jane Doe, Rich Roe\",CC0,,https://ipres2024.pubpub.org/pub/bits,https://slides/1,https://video/1,https://notes/1,Preservation,Resilience,We save bits.,Long Paper,2024-09-17,10:30\n"
        );
        let records = run(&input).unwrap();
        assert_eq!(records.len(), 1);

        let bits = &records[0];
        assert_eq!(bits.title, "Bits");
        assert_eq!(bits.creators, vec!["Jane Doe", "Rich Roe"]);
        assert_eq!(bits.license.as_deref(), Some("CC0"));
        assert_eq!(
            bits.document_url.as_deref(),
            Some("https://ipres2024.pubpub.org/pub/bits/download/pdf")
        );
        assert_eq!(
            bits.landing_page_url.as_deref(),
            Some("https://ipres2024.pubpub.org/pub/bits")
        );
        assert_eq!(bits.slides_url.as_deref(), Some("https://slides/1"));
        assert_eq!(bits.stream_url.as_deref(), Some("https://video/1"));
        assert_eq!(bits.notes_url.as_deref(), Some("https://notes/1"));
        assert_eq!(bits.keywords, vec!["Preservation", "Resilience"]);
        assert_eq!(bits.abstract_text.as_deref(), Some("We save bits."));
        assert_eq!(bits.publication_type, "long paper");
        assert_eq!(
            bits.date.map(|d| d.to_rfc3339()).as_deref(),
            Some("2024-09-17T10:30:00+01:00")
        );
    }

    #[test]
    fn test_missing_license_gets_default() {
        let input = format!("{HEADER}\nBits,Jane Doe,,,,,,,,,,Poster,,\n");
        let records = run(&input).unwrap();
        assert_eq!(records[0].license.as_deref(), Some(crate::DEFAULT_LICENSE));
        assert_eq!(records[0].date, None);
        assert_eq!(records[0].landing_page_url, None);
    }

    #[test]
    fn test_missing_column_propagates() {
        let input = "Title,Authors\nBits,Jane Doe\n";
        assert!(matches!(run(input), Err(MergeError::Csv(_))));
    }
}
