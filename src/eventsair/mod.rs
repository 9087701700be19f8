//! EventsAir event-schedule adapter.
//!
//! The export is one JSON document holding the agenda. Each agenda item lists
//! its speakers, and each speaker carries the submission documents. One record
//! is produced per speaker of every item that has speakers.
//!
//! Records get a synthetic `source_name` numbering the agenda items with
//! speakers from 1 (`iPRES/eventsair/7`), which is the key the Zotero
//! reconciliation joins on.

mod structure;

use std::io::BufRead;
use std::sync::Arc;

use crate::config::SourceContext;
use crate::normalize::non_empty;
use crate::report::{Reporter, default_reporter};
use crate::{Publication, PublicationAdapter, Records, Result, kind};
use structure::{RawEventExport, SubmissionDocuments};

const SOURCE: &str = "eventsair";

/// Title prefixes naming the session format, in the order they are tested.
const FORMAT_PREFIXES: [&str; 6] = [
    "Panel",
    "Tutorial",
    "Workshop",
    "Long Paper",
    "Short Paper",
    "Poster",
];

/// Synthetic source name of the `sequence`-th agenda item with speakers.
pub fn event_source_name(conference: &str, sequence: u32) -> String {
    format!("{conference}/{SOURCE}/{sequence}")
}

/// Recovers the agenda sequence number from a synthetic source name.
pub fn event_sequence(source_name: &str) -> Option<u32> {
    source_name
        .rsplit_once(&format!("/{SOURCE}/"))
        .and_then(|(_, sequence)| sequence.parse().ok())
}

/// Splits a `Short Paper: ` style prefix off a title.
///
/// Matching is case-sensitive on the title as given; the publication type is
/// the lower-cased prefix, or `unknown` when no prefix matches.
pub fn split_format_prefix(title: &str) -> (&str, String) {
    FORMAT_PREFIXES
        .iter()
        .find_map(|prefix| {
            title
                .strip_prefix(*prefix)
                .and_then(|rest| rest.strip_prefix(": "))
                .map(|rest| (rest, prefix.to_lowercase()))
        })
        .unwrap_or((title, kind::UNKNOWN.to_string()))
}

/// Adapter for EventsAir agenda exports.
#[derive(Clone)]
pub struct EventsAirAdapter {
    context: SourceContext,
    reporter: Arc<dyn Reporter>,
}

impl EventsAirAdapter {
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

    fn convert(&self, export: RawEventExport) -> Result<Vec<Publication>> {
        let year = self.context.year()?;
        let license = self.context.license_or_default(None);
        let mut publications = Vec::new();
        let mut sequence = 0;

        for item in export
            .agenda_data
            .agenda_items
            .iter()
            .filter(|item| !item.speakers.is_empty())
        {
            sequence += 1;
            let source_name = event_source_name(&self.context.conference, sequence);
            let mut submission = SubmissionDocuments::default();

            for speaker in &item.speakers {
                submission.absorb(&speaker.documents);

                let (title, publication_type) = split_format_prefix(&speaker.presentation_title);
                let mut publication = Publication::new(&source_name, year, title, "eng");
                publication.publication_type = publication_type;
                publication.creators = vec![
                    format!("{} {}", speaker.first_name.trim(), speaker.last_name.trim())
                        .trim()
                        .to_string(),
                ];
                publication.institutions = non_empty(speaker.organization.clone())
                    .into_iter()
                    .collect();
                publication.license = license.clone();
                publication.document_url = submission.proposal_url.clone();
                publication.abstract_text = submission.abstract_text.clone();
                publication.keywords = submission.keywords.clone();
                publications.push(publication);
            }
        }

        self.reporter.info(
            SOURCE,
            &format!(
                "{} speaker records from {sequence} agenda items",
                publications.len()
            ),
        );
        Ok(publications)
    }
}

impl PublicationAdapter for EventsAirAdapter {
    fn normalise<'a>(&'a self, input: Box<dyn BufRead + 'a>) -> Result<Records<'a>> {
        let export: RawEventExport = serde_json::from_reader(input)?;
        let publications = self.convert(export)?;
        Ok(Box::new(publications.into_iter().map(Ok)))
    }
}
