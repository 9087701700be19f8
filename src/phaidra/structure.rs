//! Phaidra search-index documents.
//!
//! The fetcher writes the Solr documents as they come and adds three fields of
//! its own: `__source_name`, `__year` and `__source_col_id`.

use serde::Deserialize;

use crate::normalize::{non_empty, push_unique, reorder_name, split_institution, strip_conference_suffix};
use crate::{MergeError, Publication, kind};

const LANDING_PAGE_BASE: &str = "https://phaidra.univie.ac.at";
const DOWNLOAD_BASE: &str = "https://services.phaidra.univie.ac.at/api/object";

/// One archived object, with the fields the adapter relies on.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawPhaidraObject {
    pub(crate) pid: String,
    #[serde(rename = "__source_name")]
    pub(crate) source_name: String,
    #[serde(rename = "__year")]
    pub(crate) year: i32,
    pub(crate) dc_title: Vec<String>,
    #[serde(default)]
    pub(crate) dc_description: Vec<String>,
    pub(crate) dc_language: Vec<String>,
    /// Absent on a handful of objects; those are dropped.
    pub(crate) dc_creator: Option<Vec<String>>,
    #[serde(default)]
    pub(crate) dc_license: Vec<String>,
    #[serde(default)]
    pub(crate) keyword_suggest: Vec<String>,
    pub(crate) size: Option<RawSize>,
}

/// Solr returns `size` either as a number or as a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawSize {
    Number(u64),
    Text(String),
}

impl RawSize {
    fn bytes(&self) -> Result<u64, MergeError> {
        match self {
            RawSize::Number(n) => Ok(*n),
            RawSize::Text(text) => {
                text.trim()
                    .parse()
                    .map_err(|_| MergeError::InvalidFieldValue {
                        field: "size".to_string(),
                        message: format!("'{text}' is not a byte count"),
                    })
            }
        }
    }
}

impl RawPhaidraObject {
    /// Maps the object onto a publication without its creators.
    ///
    /// Creators are split out separately by [`split_creators`], because a
    /// missing creator list drops the record rather than failing the run.
    pub(crate) fn to_publication(&self) -> Result<Publication, MergeError> {
        let raw_title = self
            .dc_title
            .first()
            .ok_or_else(|| MergeError::MissingField("dc_title".to_string()))?;
        let language = self
            .dc_language
            .first()
            .ok_or_else(|| MergeError::MissingField("dc_language".to_string()))?;

        let mut publication = Publication::new(&self.source_name, self.year, raw_title, language);
        publication.landing_page_url = Some(format!("{LANDING_PAGE_BASE}/{}", self.pid));
        publication.document_url = Some(format!("{DOWNLOAD_BASE}/{}/download", self.pid));
        publication.abstract_text = self.dc_description.first().cloned();
        publication.license = non_empty(self.dc_license.first().cloned());
        publication.size = self.size.as_ref().map(RawSize::bytes).transpose()?;
        publication.keywords = self
            .keyword_suggest
            .first()
            .map(|joined| joined.split(',').map(String::from).collect())
            .unwrap_or_default();

        classify(&mut publication);
        Ok(publication)
    }
}

/// Applies the abstract sentinels, poster detection and title suffix stripping.
fn classify(publication: &mut Publication) {
    match publication.abstract_text.as_deref() {
        Some("x") => publication.abstract_text = None,
        Some("Lightning Talk") => {
            publication.publication_type = kind::LIGHTNING_TALK.to_string();
            publication.abstract_text = None;
        }
        _ => {}
    }

    if is_poster(&publication.title, publication.abstract_text.as_deref()) {
        publication.publication_type = kind::POSTER.to_string();
    }

    let (title, descriptor) = strip_conference_suffix(&publication.title);
    publication.title = title;
    if let Some(descriptor) = descriptor {
        publication.publication_type = descriptor;
    }
}

fn is_poster(title: &str, abstract_text: Option<&str>) -> bool {
    if title.contains(": Poster ") || title.contains(" (Poster) ") {
        return true;
    }
    abstract_text.is_some_and(|text| {
        let text = text.to_lowercase();
        ["this poster", "the poster", "our poster"]
            .iter()
            .any(|phrase| text.contains(phrase))
    })
}

/// Separates embedded `(Institution)` parts from creator names.
///
/// Institutions keep the order they are first met in and appear once.
pub(crate) fn split_creators(raw_creators: &[String]) -> (Vec<String>, Vec<String>) {
    let mut creators = Vec::with_capacity(raw_creators.len());
    let mut institutions = Vec::new();
    for raw in raw_creators {
        let (name, institution) = split_institution(raw);
        if let Some(institution) = institution {
            push_unique(&mut institutions, institution);
        }
        creators.push(reorder_name(&name));
    }
    (creators, institutions)
}
