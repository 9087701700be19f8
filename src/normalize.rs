//! Text normalization shared by the adapters and the merge step.

use crate::regex::Regex;
use std::sync::LazyLock;

/// `Name (Institution)` as some repositories embed affiliations in creator names.
static INSTITUTION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*) \((.*)\)$").unwrap());

/// `: Long Paper - iPRES 2019 - Amsterdam`, carrying a descriptor.
static DESCRIBED_SUFFIX_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(:|-) ([a-zA-Z ]+) (:|-) (iPres|iPRES) \d{4} (:|-) [a-zA-Z, ]+$").unwrap()
});

/// `- iPRES 2016 Bern`, `: iPRES 2019 – Amsterdam` and the like.
static PLAIN_SUFFIX_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(:|-) (iPres|iPRES|iPES) \d{4} (: |- |– |â€“ |)[a-zA-Z, ]+$").unwrap()
});

static FILE_YEAR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[^0-9])((?:19|20)[0-9]{2})(?:[^0-9]|$)").unwrap());

/// Turns `Family, Given` into `Given Family`.
///
/// Only the first comma separates; names without a comma are only trimmed.
pub fn reorder_name(raw: &str) -> String {
    match raw.split_once(',') {
        Some((family, given)) => format!("{} {}", given.trim(), family.trim())
            .trim()
            .to_string(),
        None => raw.trim().to_string(),
    }
}

/// Join key for titles: lower case with whitespace runs collapsed.
pub fn canonicalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Removes a trailing conference clause from a title.
///
/// The descriptor form is tried first; when it matches, its descriptor is
/// returned lower-cased for use as the publication type. The plain form is
/// then stripped from whatever is left.
pub fn strip_conference_suffix(title: &str) -> (String, Option<String>) {
    let (title, descriptor) = match DESCRIBED_SUFFIX_REGEX.captures(title) {
        Some(captures) => {
            let descriptor = captures[2].trim().to_lowercase();
            let start = captures.get(0).map_or(title.len(), |m| m.start());
            (&title[..start], Some(descriptor))
        }
        None => (title, None),
    };

    let title = match PLAIN_SUFFIX_REGEX.find(title) {
        Some(m) => &title[..m.start()],
        None => title,
    };

    (title.trim_end().to_string(), descriptor)
}

/// Lower-cases keywords and drops the ones every record of a conference carries.
pub fn filter_keywords<I, S>(raw: I, acronym: &str) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let acronym = acronym.to_lowercase();
    let prefixed = format!("{acronym} ");
    let catalogue = format!("conferences -- {acronym} conference ");

    raw.into_iter()
        .map(|keyword| keyword.as_ref().trim().to_lowercase())
        .filter(|keyword| {
            !keyword.is_empty()
                && *keyword != acronym
                && !keyword.starts_with(&prefixed)
                && !keyword.starts_with(&catalogue)
        })
        .collect()
}

/// Maps the two-letter English code to its three-letter form.
pub fn normalize_language(code: &str) -> String {
    match code {
        "en" => "eng".to_string(),
        other => other.to_string(),
    }
}

/// Splits `Name (Institution)` into its parts.
pub fn split_institution(raw: &str) -> (String, Option<String>) {
    match INSTITUTION_REGEX.captures(raw) {
        Some(captures) => (
            captures[1].trim().to_string(),
            Some(captures[2].trim().to_string()),
        ),
        None => (raw.trim().to_string(), None),
    }
}

/// Appends `value` unless it is already present, keeping first-seen order.
pub fn push_unique(values: &mut Vec<String>, value: String) {
    if !values.contains(&value) {
        values.push(value);
    }
}

/// Finds the conference year fetchers embed in file names.
pub fn year_from_file_name(name: &str) -> Option<i32> {
    FILE_YEAR_REGEX
        .captures(name)
        .and_then(|captures| captures[1].parse().ok())
}

/// `None` for blank strings.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
