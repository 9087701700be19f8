//! Classification of files found in session folders.
//!
//! Session folders follow a file naming convention: the start of each file
//! name says what the file is. A name that fits none of the known prefixes
//! means the convention has moved on, and processing stops until the table
//! below is taught the new prefix.

use crate::regex::Regex;
use std::sync::LazyLock;

use crate::{MergeError, Publication};

static FOLDER_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://drive\.google\.com/drive/(?:u/[0-9]+/)?folders/([A-Za-z0-9_-]+)").unwrap()
});

static RECORDING_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Recording:\s*(https?://\S+)").unwrap());

/// What a file in a session folder is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRole {
    Slides,
    Notes,
    Document,
    Submission,
    Recording,
    /// Known, but not linked from the record
    Skip,
}

/// File name prefixes (lower case) and the role they announce.
const FILE_PREFIXES: [(&str, FileRole); 12] = [
    ("slides", FileRole::Slides),
    ("presentation", FileRole::Slides),
    ("notes", FileRole::Notes),
    ("paper", FileRole::Document),
    ("poster", FileRole::Document),
    ("submission", FileRole::Submission),
    ("proposal", FileRole::Submission),
    ("recording", FileRole::Recording),
    ("video", FileRole::Recording),
    ("abstract", FileRole::Skip),
    ("bio", FileRole::Skip),
    ("photo", FileRole::Skip),
];

/// Looks up the role of a file by its name prefix, ignoring case.
pub fn classify_file(name: &str) -> Option<FileRole> {
    let name = name.trim().to_lowercase();
    FILE_PREFIXES
        .iter()
        .find(|(prefix, _)| name.starts_with(prefix))
        .map(|(_, role)| *role)
}

/// Extracts the folder id from a shared-folder link.
pub fn folder_id_from_url(url: &str) -> Option<String> {
    FOLDER_URL_REGEX
        .captures(url.trim())
        .map(|captures| captures[1].to_string())
}

/// Sets the URL field matching `role`, keeping a value that is already there.
pub(crate) fn assign(publication: &mut Publication, role: FileRole, url: &str) {
    let slot = match role {
        FileRole::Slides => &mut publication.slides_url,
        FileRole::Notes => &mut publication.notes_url,
        FileRole::Document => &mut publication.document_url,
        FileRole::Submission => &mut publication.submission_url,
        FileRole::Recording => &mut publication.stream_url,
        FileRole::Skip => return,
    };
    if slot.is_none() {
        *slot = Some(url.to_string());
    }
}

/// Classifies a whole folder listing onto the record.
///
/// # Errors
///
/// Returns [`MergeError::UnknownAttachment`] for the first file whose name
/// fits no known prefix, carrying the attachment item that listed it.
pub(crate) fn apply_listing<'f, I>(
    publication: &mut Publication,
    files: I,
    payload: &serde_json::Value,
) -> Result<(), MergeError>
where
    I: IntoIterator<Item = (&'f str, &'f str)>,
{
    for (name, url) in files {
        let role = classify_file(name).ok_or_else(|| MergeError::UnknownAttachment {
            filename: name.to_string(),
            payload: payload.to_string(),
        })?;
        assign(publication, role, url);
    }
    Ok(())
}

/// Reads a `Recording: <url>` note out of an abstract.
///
/// Returns the URL, without sentence punctuation after it, and whether the
/// abstract consisted of nothing else.
pub fn recording_in_abstract(abstract_text: &str) -> Option<(String, bool)> {
    let captures = RECORDING_REGEX.captures(abstract_text)?;
    let whole = captures.get(0)?.as_str();
    let bare = abstract_text.trim() == whole.trim();
    let url = captures[1].trim_end_matches(['.', ',', ';', ')']);
    Some((url.to_string(), bare))
}
