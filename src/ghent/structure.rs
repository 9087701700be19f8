//! Ghent programme spreadsheet rows.

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

use crate::config::SourceContext;
use crate::normalize::non_empty;
use crate::{MergeError, Publication};

const PUBPUB_HOST: &str = "ipres2024.pubpub.org";

/// One row of the programme export. Every column must be present in the
/// header; cells may be empty.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawProgrammeRow {
    #[serde(rename = "Title")]
    pub(crate) title: String,
    #[serde(rename = "Authors")]
    pub(crate) authors: String,
    #[serde(rename = "License")]
    pub(crate) license: String,
    #[serde(rename = "PosterImageLocation")]
    pub(crate) poster_image_location: String,
    #[serde(rename = "PublicationLocation")]
    pub(crate) publication_location: String,
    #[serde(rename = "PresentationMaterials")]
    pub(crate) presentation_materials: String,
    #[serde(rename = "SessionVideoLocation")]
    pub(crate) session_video_location: String,
    #[serde(rename = "CollaborativeNotesLocation")]
    pub(crate) collaborative_notes_location: String,
    #[serde(rename = "CompetencyFrameworkBestMatch")]
    pub(crate) competency_framework_best_match: String,
    #[serde(rename = "ConferenceTheme")]
    pub(crate) conference_theme: String,
    #[serde(rename = "Abstract_MARKDOWN")]
    pub(crate) abstract_markdown: String,
    #[serde(rename = "AcceptedFormat")]
    pub(crate) accepted_format: String,
    #[serde(rename = "PresentationDate")]
    pub(crate) presentation_date: String,
    #[serde(rename = "PresentationStart")]
    pub(crate) presentation_start: String,
}

impl RawProgrammeRow {
    /// Section headers and other non-publication rows have no authors.
    pub(crate) fn is_publication(&self) -> bool {
        !self.authors.trim().is_empty()
    }

    pub(crate) fn into_publication(
        self,
        context: &SourceContext,
        year: i32,
    ) -> Result<Publication, MergeError> {
        let document_url = self.document_url();
        let date = self.date(&context.utc_offset)?;

        let mut publication = Publication::new(&context.conference, year, self.title.trim(), "eng");
        publication.creators = self
            .authors
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect();
        publication.license = context.license_or_default(Some(self.license));
        publication.document_url = document_url;
        publication.landing_page_url = non_empty(Some(self.publication_location));
        publication.slides_url = non_empty(Some(self.presentation_materials));
        publication.stream_url = non_empty(Some(self.session_video_location));
        publication.notes_url = non_empty(Some(self.collaborative_notes_location));
        publication.keywords = vec![self.competency_framework_best_match, self.conference_theme];
        publication.abstract_text = non_empty(Some(self.abstract_markdown));
        if let Some(format) = non_empty(Some(self.accepted_format)) {
            publication.publication_type = format.trim().to_lowercase();
        }
        publication.date = date;
        Ok(publication)
    }

    /// The poster image if there is one, otherwise the publication itself.
    ///
    /// PubPub pages are rewritten to their PDF download endpoint.
    fn document_url(&self) -> Option<String> {
        if let Some(poster) = non_empty(Some(self.poster_image_location.clone())) {
            return Some(poster);
        }
        let location = non_empty(Some(self.publication_location.clone()))?;
        if !location.contains(PUBPUB_HOST) {
            return Some(location);
        }
        Some(if location.ends_with('/') {
            format!("{location}download/pdf")
        } else {
            format!("{location}/download/pdf")
        })
    }

    /// Combines the date and start-time columns, e.g. `2024-09-17` and `10:30`.
    fn date(&self, utc_offset: &str) -> Result<Option<DateTime<FixedOffset>>, MergeError> {
        let day = self.presentation_date.trim();
        let start = self.presentation_start.trim();
        if day.is_empty() || start.is_empty() {
            return Ok(None);
        }
        let timestamp = format!("{day}T{start}:00{utc_offset}");
        DateTime::parse_from_rfc3339(&timestamp)
            .map(Some)
            .map_err(|err| MergeError::InvalidFieldValue {
                field: "PresentationDate".to_string(),
                message: format!("'{timestamp}': {err}"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn row() -> RawProgrammeRow {
        RawProgrammeRow {
            title: "Bits and Pieces".to_string(),
            authors: "Jane Doe, Rich Roe".to_string(),
            license: String::new(),
            poster_image_location: String::new(),
            publication_location: String::new(),
            presentation_materials: String::new(),
            session_video_location: String::new(),
            collaborative_notes_location: String::new(),
            competency_framework_best_match: String::new(),
            conference_theme: String::new(),
            abstract_markdown: String::new(),
            accepted_format: "Long Paper".to_string(),
            presentation_date: "2024-09-17".to_string(),
            presentation_start: "10:30".to_string(),
        }
    }

    #[rstest]
    #[case("https://img/poster.png", "https://ipres2024.pubpub.org/pub/x", Some("https://img/poster.png"))]
    #[case("", "https://ipres2024.pubpub.org/pub/x", Some("https://ipres2024.pubpub.org/pub/x/download/pdf"))]
    #[case("", "https://ipres2024.pubpub.org/pub/x/", Some("https://ipres2024.pubpub.org/pub/x/download/pdf"))]
    #[case("", "https://zenodo.org/records/1", Some("https://zenodo.org/records/1"))]
    #[case("", "", None)]
    fn test_document_url(#[case] poster: &str, #[case] publication: &str, #[case] expected: Option<&str>) {
        let mut raw = row();
        raw.poster_image_location = poster.to_string();
        raw.publication_location = publication.to_string();
        assert_eq!(raw.document_url().as_deref(), expected);
    }

    #[test]
    fn test_date_uses_offset() {
        let date = row().date("+01:00").unwrap().unwrap();
        assert_eq!(date.to_rfc3339(), "2024-09-17T10:30:00+01:00");
    }

    #[test]
    fn test_empty_date_is_none() {
        let mut raw = row();
        raw.presentation_start = String::new();
        assert_eq!(raw.date("+01:00").unwrap(), None);
    }

    #[test]
    fn test_bad_time_is_an_error() {
        let mut raw = row();
        raw.presentation_start = "half past ten".to_string();
        assert!(matches!(
            raw.date("+01:00"),
            Err(MergeError::InvalidFieldValue { .. })
        ));
    }
}
