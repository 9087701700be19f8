//! IDEALS repository-handle adapter.
//!
//! Each line is an OAI-PMH Dublin-Core record whose handle the fetcher has
//! already dereferenced into a landing page (`source_url`) and a direct PDF
//! link (`pdf_url`).
//!
//! Slide decks are deposited as separate records whose titles end in a
//! presentation marker (` [presentation]` by default). They are folded into
//! their papers with a [`TitleJoin`], so the adapter has to read the whole
//! file before it can yield anything.

use serde::Deserialize;
use std::io::BufRead;
use std::sync::Arc;

use crate::config::SourceContext;
use crate::jsonl::json_lines;
use crate::normalize::reorder_name;
use crate::reconcile::TitleJoin;
use crate::report::{Reporter, default_reporter};
use crate::{MergeError, Publication, PublicationAdapter, Records, Result, kind};

const SOURCE: &str = "ideals";

#[derive(Debug, Clone, Deserialize)]
struct RawIdealsRecord {
    title: Vec<String>,
    #[serde(default)]
    creator: Vec<String>,
    #[serde(default)]
    description: Vec<String>,
    #[serde(default)]
    language: Vec<String>,
    #[serde(default)]
    subject: Vec<String>,
    source_url: String,
    pdf_url: String,
}

/// Adapter for IDEALS JSON-Lines harvests.
#[derive(Clone)]
pub struct IdealsAdapter {
    context: SourceContext,
    reporter: Arc<dyn Reporter>,
}

impl IdealsAdapter {
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

    fn convert(&self, raw: RawIdealsRecord, year: i32) -> Result<Publication> {
        let title = raw
            .title
            .first()
            .ok_or_else(|| MergeError::MissingField("title".to_string()))?;
        let language = raw.language.first().map_or("eng", String::as_str);

        let mut publication = Publication::new(&self.context.conference, year, title, language);
        publication.landing_page_url = Some(raw.source_url);
        publication.document_url = Some(raw.pdf_url);
        publication.abstract_text = raw.description.into_iter().next();
        publication.creators = raw.creator.iter().map(|c| reorder_name(c)).collect();
        publication.keywords = raw.subject;
        // Rights statements vary too much in wording to be worth keeping.
        publication.license = self.context.license_or_default(None);

        if let Some(stripped) = publication
            .title
            .strip_suffix(self.context.presentation_marker.as_str())
        {
            publication.title = stripped.to_string();
            publication.publication_type = kind::PRESENTATION.to_string();
        }
        Ok(publication)
    }

    fn merge(&self, records: Vec<Publication>) -> Result<Vec<Publication>> {
        let (presentations, papers): (Vec<_>, Vec<_>) = records
            .into_iter()
            .partition(|p| p.publication_type == kind::PRESENTATION);

        let mut join = TitleJoin::new();
        for paper in papers {
            join.add_paper(paper)?;
        }

        let mut attached = 0;
        for presentation in presentations {
            let title = presentation.title.clone();
            if join.attach_presentation(presentation) {
                attached += 1;
            } else {
                self.reporter.info(
                    SOURCE,
                    &format!("Presentation \"{title}\" has no paper, keeping it on its own"),
                );
            }
        }
        self.reporter.info(
            SOURCE,
            &format!("Attached {attached} presentations to their papers"),
        );
        Ok(join.into_publications())
    }
}

impl PublicationAdapter for IdealsAdapter {
    fn normalise<'a>(&'a self, input: Box<dyn BufRead + 'a>) -> Result<Records<'a>> {
        let year = self.context.year()?;
        let mut records = Vec::new();
        for line in json_lines::<RawIdealsRecord>(input) {
            let (line_number, raw) = line?;
            let publication = self.convert(raw, year)?;
            if publication.creators.is_empty() {
                self.reporter.error(
                    SOURCE,
                    &format!(
                        "No creator for \"{}\" (line {line_number}), dropping this record",
                        publication.title
                    ),
                );
                continue;
            }
            records.push(publication);
        }

        let merged = self.merge(records)?;
        Ok(Box::new(merged.into_iter().map(Ok)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{MemoryReporter, Severity};
    use pretty_assertions::assert_eq;

    fn line(title: &str, handle: u32) -> String {
        format!(
            r#"{{"title": ["{title}"], "creator": ["Doe, Jane", "Rich Roe"], "description": ["About it"], "subject": ["iPRES", "Rescue"], "source_url": "https://hdl.handle.net/2142/{handle}", "pdf_url": "https://www.ideals.illinois.edu/items/{handle}.pdf"}}"#
        )
    }

    fn run(lines: &[String], reporter: Arc<MemoryReporter>) -> Result<Vec<Publication>> {
        let input = lines.join("\n");
        let adapter = IdealsAdapter::new(SourceContext::new("iPRES").with_year(2023))
            .with_reporter(reporter);
        adapter.normalise(Box::new(input.as_bytes()))?.collect()
    }

    #[test]
    fn test_presentation_folds_into_paper() {
        let lines = vec![
            line("Data Rescue [presentation]", 2),
            line("Data Rescue", 1),
        ];
        let records = run(&lines, MemoryReporter::new()).unwrap();

        assert_eq!(records.len(), 1);
        let paper = &records[0];
        assert_eq!(paper.title, "Data Rescue");
        assert_eq!(paper.publication_type, "paper");
        assert_eq!(paper.landing_page_url.as_deref(), Some("https://hdl.handle.net/2142/1"));
        assert_eq!(paper.slides_url.as_deref(), Some("https://hdl.handle.net/2142/2"));
        assert_eq!(paper.creators, vec!["Jane Doe", "Rich Roe"]);
        assert_eq!(paper.language, "eng");
        assert_eq!(paper.year, 2023);
        assert_eq!(paper.license.as_deref(), Some(crate::DEFAULT_LICENSE));
    }

    #[test]
    fn test_presentation_without_paper_is_kept() {
        let lines = vec![line("Data Rescue", 1), line("Closing Remarks [presentation]", 3)];
        let records = run(&lines, MemoryReporter::new()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].title, "Closing Remarks");
        assert_eq!(records[1].publication_type, kind::PRESENTATION);
        assert_eq!(records[1].slides_url, None);
    }

    #[test]
    fn test_duplicate_paper_titles_abort() {
        let lines = vec![line("Data Rescue", 1), line("DATA  Rescue", 2)];
        let result = run(&lines, MemoryReporter::new());
        assert!(matches!(result, Err(MergeError::DuplicateTitle { .. })));
    }

    #[test]
    fn test_record_without_creators_is_dropped() {
        let lines = vec![
            line("Data Rescue", 1),
            r#"{"title": ["Orphan"], "source_url": "https://hdl/9", "pdf_url": "https://pdf/9"}"#
                .to_string(),
        ];
        let reporter = MemoryReporter::new();
        let records = run(&lines, reporter.clone()).unwrap();
        assert_eq!(records.len(), 1);
        assert!(reporter.messages(Severity::Error)[0].contains("Orphan"));
    }

    #[test]
    fn test_missing_pdf_url_propagates() {
        let lines = vec![r#"{"title": ["No PDF"], "creator": ["A"], "source_url": "https://hdl/9"}"#.to_string()];
        assert!(matches!(
            run(&lines, MemoryReporter::new()),
            Err(MergeError::Json { .. })
        ));
    }
}
