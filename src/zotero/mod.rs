//! Zotero library adapter.
//!
//! The fetcher dumps a Zotero group library as JSON Lines: primary items,
//! each labelled with the collection it was listed under, and attachment
//! items pointing back at their parent. Nothing guarantees that a parent
//! comes before its attachments, so the input is read in two passes. The
//! first groups attachments under their parents; the second maps primary
//! items lazily.
//!
//! Attachments that link to a shared session folder bring along the folder's
//! file listing. Each file is sorted into a URL slot by its name (see
//! [`attachments`]). When the adapter is given a [`SessionJoin`], the folder id
//! doubles as the session id used to look up the EventsAir agenda item.
//!
//! # Example
//!
//! ```
//! use dppi::{PublicationAdapter, SourceContext, ZoteroAdapter};
//!
//! let input = r#"{"key": "P1", "publication_type": "Poster", "data": {"itemType": "presentation", "title": "Bits", "creators": [{"firstName": "Jane", "lastName": "Doe"}], "date": "2021-10-19"}}
//! {"key": "A1", "data": {"itemType": "attachment", "parentItem": "P1"}, "__folder_id": "f1", "__folder_files": [{"name": "Slides.pdf", "url": "https://files/1"}]}"#;
//!
//! let adapter = ZoteroAdapter::new(SourceContext::new("iPRES"));
//! let records: Vec<_> = adapter
//!     .normalise(Box::new(input.as_bytes()))
//!     .unwrap()
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(records[0].year, 2021);
//! assert_eq!(records[0].publication_type, "poster");
//! assert_eq!(records[0].slides_url.as_deref(), Some("https://files/1"));
//! ```

pub mod attachments;
mod structure;

use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::io::BufRead;
use std::sync::{Arc, LazyLock};

use crate::config::SourceContext;
use crate::jsonl::json_lines;
use crate::normalize::non_empty;
use crate::reconcile::{Claim, SessionClaims, SessionJoin};
use crate::regex::Regex;
use crate::report::{Reporter, default_reporter};
use crate::{MergeError, Publication, PublicationAdapter, Records, Result};
use attachments::{FileRole, apply_listing, assign, recording_in_abstract};
use structure::{Attachment, RawZoteroItem};

const SOURCE: &str = "zotero";
const NOTE: &str = "note";

static YEAR_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d{4})\b").unwrap());

/// Adapter for Zotero JSON-Lines dumps.
#[derive(Clone)]
pub struct ZoteroAdapter {
    context: SourceContext,
    reporter: Arc<dyn Reporter>,
    session_join: Option<SessionJoin>,
}

/// Result of the first pass over the input.
struct Library {
    primaries: Vec<(usize, RawZoteroItem)>,
    attachments: HashMap<String, Vec<Attachment>>,
}

impl ZoteroAdapter {
    #[must_use]
    pub fn new(context: SourceContext) -> Self {
        Self {
            context,
            reporter: default_reporter(),
            session_join: None,
        }
    }

    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Enriches records whose session folder maps onto an agenda item.
    #[must_use]
    pub fn with_session_join(mut self, join: SessionJoin) -> Self {
        self.session_join = Some(join);
        self
    }

    fn collect_library(&self, input: Box<dyn BufRead + '_>) -> Result<Library> {
        let mut primaries = Vec::new();
        let mut seen = HashSet::new();
        let mut attachments: HashMap<String, Vec<Attachment>> = HashMap::new();

        for line in json_lines::<Value>(input) {
            let (line_number, payload) = line?;
            let item: RawZoteroItem =
                serde_json::from_value(payload.clone()).map_err(|source| MergeError::Json {
                    line: line_number,
                    source,
                })?;

            if item.data.item_type == NOTE {
                continue;
            }
            if item.is_attachment() {
                match item.data.parent_item.clone() {
                    Some(parent) => attachments
                        .entry(parent)
                        .or_default()
                        .push(Attachment { item, payload }),
                    None => self.reporter.warn(
                        SOURCE,
                        &format!("Attachment {} has no parent item, ignoring it", item.key),
                    ),
                }
                continue;
            }
            if !seen.insert(item.key.clone()) {
                self.reporter.warn(
                    SOURCE,
                    &format!(
                        "Item {} appears more than once (line {line_number}), keeping the first",
                        item.key
                    ),
                );
                continue;
            }
            primaries.push((line_number, item));
        }

        for parent in attachments.keys().filter(|key| !seen.contains(*key)) {
            self.reporter.warn(
                SOURCE,
                &format!("Attachments refer to unknown item {parent}, ignoring them"),
            );
        }
        Ok(Library {
            primaries,
            attachments,
        })
    }

    fn year(&self, date: Option<&str>) -> Result<i32> {
        let from_date = date
            .and_then(|date| YEAR_REGEX.captures(date))
            .and_then(|captures| captures[1].parse().ok());
        match from_date {
            Some(year) => Ok(year),
            None => self.context.year(),
        }
    }

    /// Maps one primary item; `Ok(None)` when it has no creators.
    fn convert(
        &self,
        line_number: usize,
        item: RawZoteroItem,
        attachments: Vec<Attachment>,
        claims: Option<&mut SessionClaims<'_>>,
    ) -> Result<Option<Publication>> {
        let data = item.data;
        let title = non_empty(data.title)
            .ok_or_else(|| MergeError::MissingField("data.title".to_string()))?;
        let year = self.year(data.date.as_deref())?;
        let language = non_empty(data.language).unwrap_or_else(|| "eng".to_string());

        let mut publication = Publication::new(&self.context.conference, year, title.trim(), &language);
        publication.creators = data
            .creators
            .iter()
            .filter_map(|creator| creator.display_name())
            .collect();
        if publication.creators.is_empty() {
            self.reporter.error(
                SOURCE,
                &format!(
                    "No creator for \"{}\" ({}, line {line_number}), dropping this record",
                    publication.title, item.key
                ),
            );
            return Ok(None);
        }

        publication.landing_page_url = non_empty(data.url);
        publication.abstract_text = non_empty(data.abstract_note);
        publication.keywords = data.tags.into_iter().map(|tag| tag.tag).collect();
        publication.license = self.context.license_or_default(data.rights);
        if let Some(label) = non_empty(item.publication_type) {
            publication.publication_type = label.trim().to_lowercase();
        }

        let mut session_id = None;
        for attachment in &attachments {
            let Some(folder_id) = attachment.folder_id() else {
                continue;
            };
            let files = attachment
                .item
                .folder_files
                .iter()
                .map(|file| (file.name.as_str(), file.url.as_str()));
            apply_listing(&mut publication, files, &attachment.payload)?;
            session_id.get_or_insert(folder_id);
        }

        if let Some((url, bare)) = publication
            .abstract_text
            .as_deref()
            .and_then(recording_in_abstract)
        {
            assign(&mut publication, FileRole::Recording, &url);
            if bare {
                publication.abstract_text = None;
            }
        }

        if let (Some(claims), Some(session_id)) = (claims, session_id) {
            match claims.enrich(&mut publication, &session_id, &self.context.conference) {
                Claim::Enriched(eventsair_id) => self.reporter.debug(
                    SOURCE,
                    &format!(
                        "Enriched \"{}\" from agenda item {eventsair_id} (session {session_id})",
                        publication.title
                    ),
                ),
                Claim::Taken {
                    eventsair_id,
                    holder,
                } => self.reporter.warn(
                    SOURCE,
                    &format!(
                        "Agenda item {eventsair_id} (session {session_id}) already enriched \"{holder}\", leaving \"{}\" as it is",
                        publication.title
                    ),
                ),
                Claim::Unmatched => {}
            }
        }
        Ok(Some(publication))
    }
}

impl PublicationAdapter for ZoteroAdapter {
    fn normalise<'a>(&'a self, input: Box<dyn BufRead + 'a>) -> Result<Records<'a>> {
        let Library {
            primaries,
            mut attachments,
        } = self.collect_library(input)?;

        let mut claims = self.session_join.as_ref().map(SessionJoin::claims);
        let records = primaries
            .into_iter()
            .filter_map(move |(line_number, item)| {
                let attached = attachments.remove(&item.key).unwrap_or_default();
                self.convert(line_number, item, attached, claims.as_mut())
                    .transpose()
            });
        Ok(Box::new(records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eventsair::event_source_name;
    use crate::reconcile::{EventIndex, SessionMapping};
    use crate::report::{MemoryReporter, Severity};
    use pretty_assertions::assert_eq;

    const LIBRARY: &str = r#"{"key": "A1", "data": {"itemType": "attachment", "parentItem": "P1", "url": "https://drive.google.com/drive/folders/s42"}, "__folder_files": [{"name": "Slides_Doe.pdf", "url": "https://files/slides"}, {"name": "Bio.txt", "url": "https://files/bio"}, {"name": "Paper.pdf", "url": "https://files/paper"}]}
{"key": "P1", "publication_type": "Long Paper", "data": {"itemType": "conferencePaper", "title": "Saving Bits", "creators": [{"firstName": "Jane", "lastName": "Doe"}, {"name": "Roe, Rich"}], "abstractNote": "We save bits. Recording: https://youtu.be/xyz", "date": "October 2021", "url": "https://zenodo.org/records/1", "tags": [{"tag": "bits"}]}}
{"key": "N1", "data": {"itemType": "note", "parentItem": "P1"}}
{"key": "P2", "publication_type": "Panel", "data": {"itemType": "presentation", "title": "Nobody", "date": "2021"}}
{"key": "P3", "data": {"itemType": "presentation", "title": "Just a Talk", "creators": [{"lastName": "Poe"}], "abstractNote": "Recording: https://youtu.be/abc", "rights": "CC0"}}
"#;

    fn context() -> SourceContext {
        SourceContext::new("iPRES").with_year(2021)
    }

    fn run(adapter: &ZoteroAdapter, input: &str) -> Result<Vec<Publication>> {
        adapter.normalise(Box::new(input.as_bytes()))?.collect()
    }

    #[test]
    fn test_items_and_attachments() {
        let reporter = MemoryReporter::new();
        let adapter = ZoteroAdapter::new(context()).with_reporter(reporter.clone());
        let records = run(&adapter, LIBRARY).unwrap();
        assert_eq!(records.len(), 2);

        let paper = &records[0];
        assert_eq!(paper.title, "Saving Bits");
        assert_eq!(paper.year, 2021);
        assert_eq!(paper.creators, vec!["Jane Doe", "Rich Roe"]);
        assert_eq!(paper.publication_type, "long paper");
        assert_eq!(paper.slides_url.as_deref(), Some("https://files/slides"));
        assert_eq!(paper.document_url.as_deref(), Some("https://files/paper"));
        assert_eq!(paper.stream_url.as_deref(), Some("https://youtu.be/xyz"));
        assert_eq!(
            paper.abstract_text.as_deref(),
            Some("We save bits. Recording: https://youtu.be/xyz")
        );
        assert_eq!(paper.keywords, vec!["bits"]);
        assert_eq!(paper.license.as_deref(), Some(crate::DEFAULT_LICENSE));

        let talk = &records[1];
        assert_eq!(talk.publication_type, "paper");
        assert_eq!(talk.stream_url.as_deref(), Some("https://youtu.be/abc"));
        assert_eq!(talk.abstract_text, None);
        assert_eq!(talk.license.as_deref(), Some("CC0"));

        let errors = reporter.messages(Severity::Error);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Nobody"));
    }

    #[test]
    fn test_recording_attachment_wins_over_abstract() {
        let input = r#"{"key": "P1", "data": {"itemType": "presentation", "title": "T", "creators": [{"lastName": "Poe"}], "abstractNote": "Recording: https://youtu.be/abc"}}
{"key": "A1", "data": {"itemType": "attachment", "parentItem": "P1"}, "__folder_id": "s1", "__folder_files": [{"name": "Recording.mp4", "url": "https://files/rec"}]}"#;
        let records = run(&ZoteroAdapter::new(context()), input).unwrap();
        assert_eq!(records[0].stream_url.as_deref(), Some("https://files/rec"));
    }

    #[test]
    fn test_unknown_file_name_aborts() {
        let input = r#"{"key": "P1", "data": {"itemType": "presentation", "title": "T", "creators": [{"lastName": "Poe"}]}}
{"key": "A1", "data": {"itemType": "attachment", "parentItem": "P1"}, "__folder_id": "s1", "__folder_files": [{"name": "IMG_0001.jpg", "url": "https://files/img"}]}"#;
        match run(&ZoteroAdapter::new(context()), input) {
            Err(MergeError::UnknownAttachment { filename, payload }) => {
                assert_eq!(filename, "IMG_0001.jpg");
                assert!(payload.contains("\"A1\""));
            }
            other => panic!("expected an unknown attachment error, got {other:?}"),
        }
    }

    #[test]
    fn test_orphan_attachment_and_duplicate_key_warn() {
        let input = r#"{"key": "P1", "data": {"itemType": "presentation", "title": "First", "creators": [{"lastName": "Poe"}]}}
{"key": "P1", "data": {"itemType": "presentation", "title": "Second", "creators": [{"lastName": "Poe"}]}}
{"key": "A9", "data": {"itemType": "attachment", "parentItem": "P9"}}"#;
        let reporter = MemoryReporter::new();
        let adapter = ZoteroAdapter::new(context()).with_reporter(reporter.clone());
        let records = run(&adapter, input).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "First");
        assert_eq!(reporter.messages(Severity::Warning).len(), 2);
    }

    #[test]
    fn test_missing_title_propagates() {
        let input = r#"{"key": "P1", "data": {"itemType": "presentation", "creators": [{"lastName": "Poe"}]}}"#;
        assert!(matches!(
            run(&ZoteroAdapter::new(context()), input),
            Err(MergeError::MissingField(field)) if field == "data.title"
        ));
    }

    #[test]
    fn test_session_join_enriches_matched_records() {
        let mapping = SessionMapping::from_reader("session_id,eventsair_id\ns42,7\n".as_bytes()).unwrap();
        let mut event = Publication::new(&event_source_name("iPRES", 7), 2021, "Saving Bits", "eng");
        event.abstract_text = Some("From the agenda.".to_string());
        event.institutions = vec!["KB".to_string()];
        let join = SessionJoin::new(mapping, EventIndex::from_events([event]));

        let adapter = ZoteroAdapter::new(context()).with_session_join(join);
        let records = run(&adapter, LIBRARY).unwrap();

        assert_eq!(records[0].source_name, "iPRES/eventsair/7");
        assert_eq!(records[0].abstract_text.as_deref(), Some("From the agenda."));
        assert_eq!(records[0].institutions, vec!["KB"]);
        assert_eq!(records[1].source_name, "iPRES");
    }

    #[test]
    fn test_shared_folder_enriches_only_the_first_item() {
        let input = r#"{"key": "P1", "data": {"itemType": "presentation", "title": "First", "creators": [{"lastName": "Poe"}]}}
{"key": "P2", "data": {"itemType": "presentation", "title": "Second", "creators": [{"lastName": "Roe"}]}}
{"key": "A1", "data": {"itemType": "attachment", "parentItem": "P1"}, "__folder_id": "s42"}
{"key": "A2", "data": {"itemType": "attachment", "parentItem": "P2"}, "__folder_id": "s42"}"#;
        let mapping = SessionMapping::from_reader("session_id,eventsair_id\ns42,7\n".as_bytes()).unwrap();
        let mut event = Publication::new(&event_source_name("iPRES", 7), 2021, "Talk", "eng");
        event.abstract_text = Some("Agenda abstract".to_string());
        let join = SessionJoin::new(mapping, EventIndex::from_events([event]));

        let reporter = MemoryReporter::new();
        let adapter = ZoteroAdapter::new(context())
            .with_reporter(reporter.clone())
            .with_session_join(join);
        let records = run(&adapter, input).unwrap();

        let enriched: Vec<_> = records
            .iter()
            .filter(|r| r.source_name == "iPRES/eventsair/7")
            .map(|r| r.title.as_str())
            .collect();
        assert_eq!(enriched, vec!["First"]);
        assert_eq!(records[1].source_name, "iPRES");
        assert_eq!(records[1].abstract_text, None);

        let warnings = reporter.messages(Severity::Warning);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("\"First\"") && warnings[0].contains("\"Second\""));

        let records = run(&adapter, input).unwrap();
        assert_eq!(records[0].source_name, "iPRES/eventsair/7");
    }
}
