//! Pipeline driver.
//!
//! Walks an input directory, picks an adapter for each file by its name,
//! cleans up every record the adapter yields and appends it to one combined
//! JSON-Lines stream. Once all files are done, the stream is flattened into
//! CSV.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dppi::{MergeConfig, Pipeline};
//! use std::path::Path;
//!
//! let pipeline = Pipeline::new(MergeConfig::new());
//! let summary = pipeline.run(Path::new("raw"), Path::new("out/publications")).unwrap();
//! println!("{} records written", summary.records_written);
//! ```

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use crate::config::{MergeConfig, SourceContext};
use crate::jsonl::json_lines;
use crate::normalize::{filter_keywords, normalize_language};
use crate::reconcile::{EventIndex, SessionJoin, SessionMapping};
use crate::report::{Reporter, default_reporter};
use crate::{
    EventsAirAdapter, GhentAdapter, IdealsAdapter, PhaidraAdapter, Publication, PublicationAdapter,
    Result, ZoteroAdapter,
};

const SOURCE: &str = "pipeline";

const ZOTERO_SUFFIX: &str = ".zotero.jsonl";
const MAPPING_SUFFIX: &str = ".zotero-mapping.csv";
const EVENTS_SUFFIX: &str = ".zotero-eventsair.json";

/// Column order of the CSV output: every field of [`Publication`], in
/// declaration order, under its serialized name.
pub const CSV_COLUMNS: [&str; 18] = [
    "source_name",
    "landing_page_url",
    "document_url",
    "slides_url",
    "notes_url",
    "stream_url",
    "submission_url",
    "year",
    "title",
    "abstract",
    "language",
    "creators",
    "institutions",
    "license",
    "size",
    "type",
    "date",
    "keywords",
];

/// The kinds of input file the driver knows, by file-name suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Phaidra,
    EventsAir,
    Ideals,
    Ghent,
    Zotero,
    /// Read alongside a Zotero file, never on its own
    Auxiliary,
}

impl SourceKind {
    /// Selects the kind from the end of the file name.
    ///
    /// Returns `None` for files no adapter handles.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        if name.ends_with(MAPPING_SUFFIX) || name.ends_with(EVENTS_SUFFIX) {
            Some(Self::Auxiliary)
        } else if name.ends_with(".phaidra.jsonl") {
            Some(Self::Phaidra)
        } else if name.ends_with(".eventsair.json") {
            Some(Self::EventsAir)
        } else if name.ends_with("ideals.jsonl") {
            Some(Self::Ideals)
        } else if name.ends_with("ghent.csv") {
            Some(Self::Ghent)
        } else if name.ends_with(ZOTERO_SUFFIX) {
            Some(Self::Zotero)
        } else {
            None
        }
    }
}

/// Counts from one pipeline run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSummary {
    pub files_processed: usize,
    pub files_skipped: usize,
    pub records_written: usize,
}

/// Cleanup applied to every record regardless of source.
///
/// Keywords are lower-cased and stripped of the ones that only name the
/// conference, and `en` becomes `eng`. Applying it twice changes nothing.
pub fn common_cleanup(publication: &mut Publication, acronym: &str) {
    publication.keywords = filter_keywords(&publication.keywords, acronym);
    publication.language = normalize_language(&publication.language);
}

/// Merges a directory of raw source files into one record stream.
#[derive(Clone)]
pub struct Pipeline {
    config: MergeConfig,
    reporter: Arc<dyn Reporter>,
}

impl Pipeline {
    #[must_use]
    pub fn new(config: MergeConfig) -> Self {
        Self {
            config,
            reporter: default_reporter(),
        }
    }

    /// Sets the reporter handed to the pipeline and every adapter it creates.
    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Merges `input_dir` into `<output_prefix>.jsonl` and `<output_prefix>.csv`.
    ///
    /// # Errors
    ///
    /// Any adapter error stops the run. The JSON-Lines file may then hold the
    /// records written so far.
    pub fn run(&self, input_dir: &Path, output_prefix: &Path) -> Result<PipelineSummary> {
        let jsonl_path = with_suffix(output_prefix, ".jsonl");
        let csv_path = with_suffix(output_prefix, ".csv");

        let summary = {
            let mut out = BufWriter::new(File::create(&jsonl_path)?);
            let summary = self.merge_into(input_dir, &mut out)?;
            out.flush()?;
            summary
        };
        self.reporter.info(
            SOURCE,
            &format!(
                "Wrote {} records from {} files to {}",
                summary.records_written,
                summary.files_processed,
                jsonl_path.display()
            ),
        );

        write_csv_from_jsonl(&jsonl_path, &csv_path)?;
        Ok(summary)
    }

    /// Merges every recognized file of `input_dir`, in file-name order, into `out`.
    pub fn merge_into<W: Write>(&self, input_dir: &Path, out: &mut W) -> Result<PipelineSummary> {
        let mut paths = fs::read_dir(input_dir)?
            .map(|entry| entry.map(|entry| entry.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        paths.retain(|path| path.is_file());
        paths.sort();

        let mut summary = PipelineSummary::default();
        for path in &paths {
            match SourceKind::from_path(path) {
                Some(SourceKind::Auxiliary) => {
                    self.reporter
                        .debug(SOURCE, &format!("{} is read with its Zotero file", path.display()));
                }
                Some(kind) => {
                    self.reporter
                        .info(SOURCE, &format!("Reading {}...", path.display()));
                    summary.records_written += self.merge_file(path, kind, out)?;
                    summary.files_processed += 1;
                }
                None => {
                    self.reporter
                        .warn(SOURCE, &format!("No code to handle {}!", path.display()));
                    summary.files_skipped += 1;
                }
            }
        }
        Ok(summary)
    }

    /// Runs one adapter over `path` and appends its cleaned records to `out`.
    ///
    /// Returns the number of records written.
    pub fn merge_file<W: Write>(&self, path: &Path, kind: SourceKind, out: &mut W) -> Result<usize> {
        let context = self.config.context_for(path);
        let adapter = self.adapter_for(kind, path, &context)?;
        let input: Box<dyn BufRead> = Box::new(BufReader::new(File::open(path)?));

        let mut written = 0;
        for record in adapter.normalise(input)? {
            let mut publication = record?;
            common_cleanup(&mut publication, self.config.conference());
            serde_json::to_writer(&mut *out, &publication)?;
            out.write_all(b"\n")?;
            written += 1;
        }
        Ok(written)
    }

    fn adapter_for(
        &self,
        kind: SourceKind,
        path: &Path,
        context: &SourceContext,
    ) -> Result<Box<dyn PublicationAdapter>> {
        let reporter = self.reporter.clone();
        let context = context.clone();
        Ok(match kind {
            SourceKind::Phaidra => Box::new(
                PhaidraAdapter::new()
                    .with_reporter(reporter)
                    .with_default_license(&context.default_license),
            ),
            SourceKind::EventsAir => {
                Box::new(EventsAirAdapter::new(context).with_reporter(reporter))
            }
            SourceKind::Ideals => Box::new(IdealsAdapter::new(context).with_reporter(reporter)),
            SourceKind::Ghent => Box::new(GhentAdapter::new(context).with_reporter(reporter)),
            SourceKind::Zotero => {
                let join = self.session_join(path, &context)?;
                Box::new(
                    ZoteroAdapter::new(context)
                        .with_reporter(reporter)
                        .with_session_join(join),
                )
            }
            SourceKind::Auxiliary => {
                return Err(crate::MergeError::InvalidFormat(format!(
                    "{} is not a source file",
                    path.display()
                )));
            }
        })
    }

    /// Loads the mapping table and event export that sit next to a Zotero file.
    fn session_join(&self, zotero_path: &Path, context: &SourceContext) -> Result<SessionJoin> {
        let mapping_path = replace_suffix(zotero_path, ZOTERO_SUFFIX, MAPPING_SUFFIX);
        let events_path = replace_suffix(zotero_path, ZOTERO_SUFFIX, EVENTS_SUFFIX);

        let mapping = SessionMapping::from_path(&mapping_path)?;
        let events_adapter =
            EventsAirAdapter::new(context.clone()).with_reporter(self.reporter.clone());
        let events_input: Box<dyn BufRead> = Box::new(BufReader::new(File::open(&events_path)?));
        let events = events_adapter
            .normalise(events_input)?
            .collect::<Result<Vec<_>>>()?;
        let index = EventIndex::from_events(events);

        self.reporter.info(
            SOURCE,
            &format!(
                "Loaded {} session mappings and {} agenda items for {}",
                mapping.len(),
                index.len(),
                zotero_path.display()
            ),
        );
        Ok(SessionJoin::new(mapping, index))
    }
}

/// Appends `suffix` to the file name of `prefix`.
fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = prefix.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Swaps the trailing `from` of the file name for `to`.
fn replace_suffix(path: &Path, from: &str, to: &str) -> PathBuf {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    let stem = name.strip_suffix(from).unwrap_or(name);
    path.with_file_name(format!("{stem}{to}"))
}

/// Flattens a JSON-Lines file of publications into CSV.
///
/// Columns are [`CSV_COLUMNS`]. List fields are written as JSON arrays and
/// absent values as empty cells. Returns the number of rows written.
///
/// # Errors
///
/// Fails on the first line that is not a valid [`Publication`].
pub fn write_csv_from_jsonl(input: &Path, output: &Path) -> Result<usize> {
    let reader: Box<dyn BufRead> = Box::new(BufReader::new(File::open(input)?));
    let mut writer = csv::Writer::from_path(output)?;
    writer.write_record(CSV_COLUMNS)?;

    let mut rows = 0;
    for line in json_lines::<Publication>(reader) {
        let (_, publication) = line?;
        let value = serde_json::to_value(&publication)?;
        let row = CSV_COLUMNS
            .iter()
            .map(|column| value.get(*column).map_or_else(String::new, csv_cell));
        writer.write_record(row)?;
        rows += 1;
    }
    writer.flush()?;
    Ok(rows)
}

fn csv_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{MemoryReporter, Severity};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use tempfile::tempdir;

    #[rstest]
    #[case("ipres2016.phaidra.jsonl", Some(SourceKind::Phaidra))]
    #[case("ipres2023.eventsair.json", Some(SourceKind::EventsAir))]
    #[case("ipres2023.ideals.jsonl", Some(SourceKind::Ideals))]
    #[case("ipres2024-ghent.csv", Some(SourceKind::Ghent))]
    #[case("ipres2021.zotero.jsonl", Some(SourceKind::Zotero))]
    #[case("ipres2021.zotero-mapping.csv", Some(SourceKind::Auxiliary))]
    #[case("ipres2021.zotero-eventsair.json", Some(SourceKind::Auxiliary))]
    #[case("notes.txt", None)]
    #[case("ipres2016.phaidra.json", None)]
    fn test_source_kind_from_path(#[case] name: &str, #[case] expected: Option<SourceKind>) {
        assert_eq!(SourceKind::from_path(Path::new(name)), expected);
    }

    #[test]
    fn test_common_cleanup_is_idempotent() {
        let mut publication = Publication::new("iPRES", 2016, "T", "en");
        publication.keywords = vec![
            "iPRES".to_string(),
            " Web Archiving ".to_string(),
            "ipres 2016".to_string(),
            "Conferences -- iPRES Conference 2016".to_string(),
            String::new(),
        ];
        common_cleanup(&mut publication, "iPRES");
        assert_eq!(publication.keywords, vec!["web archiving"]);
        assert_eq!(publication.language, "eng");

        let once = publication.clone();
        common_cleanup(&mut publication, "iPRES");
        assert_eq!(publication, once);
    }

    #[test]
    fn test_replace_suffix() {
        assert_eq!(
            replace_suffix(Path::new("raw/ipres2021.zotero.jsonl"), ZOTERO_SUFFIX, MAPPING_SUFFIX),
            PathBuf::from("raw/ipres2021.zotero-mapping.csv")
        );
    }

    #[test]
    fn test_merge_into_skips_unknown_files() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("ipres2016.phaidra.jsonl"),
            r#"{"pid": "o:1", "__source_name": "iPRES", "__year": 2016, "dc_title": ["Tools"], "dc_language": ["en"], "dc_creator": ["Jane Doe"], "keyword_suggest": ["iPRES,Tools"]}"#,
        )
        .unwrap();
        fs::write(dir.path().join("README.txt"), "not a source").unwrap();

        let reporter = MemoryReporter::new();
        let pipeline = Pipeline::new(MergeConfig::new()).with_reporter(reporter.clone());
        let mut out = Vec::new();
        let summary = pipeline.merge_into(dir.path(), &mut out).unwrap();

        assert_eq!(
            summary,
            PipelineSummary {
                files_processed: 1,
                files_skipped: 1,
                records_written: 1,
            }
        );
        let record: Publication = serde_json::from_slice(&out).unwrap();
        assert_eq!(record.language, "eng");
        assert_eq!(record.keywords, vec!["tools"]);
        assert!(reporter.messages(Severity::Warning)[0].contains("README.txt"));
    }

    #[test]
    fn test_write_csv_uses_full_schema() {
        let dir = tempdir().unwrap();
        let jsonl = dir.path().join("merged.jsonl");
        let csv_path = dir.path().join("merged.csv");

        let mut first = Publication::new("iPRES", 2023, "Bits, Bytes", "eng");
        first.creators = vec!["Jane Doe".to_string(), "Rich Roe".to_string()];
        let mut second = Publication::new("iPRES", 2023, "Pieces", "eng");
        second.submission_url = Some("https://files/proposal".to_string());
        second.size = Some(10);
        let lines = [first, second]
            .iter()
            .map(|p| serde_json::to_string(p).unwrap())
            .collect::<Vec<_>>()
            .join("\n");
        fs::write(&jsonl, lines).unwrap();

        assert_eq!(write_csv_from_jsonl(&jsonl, &csv_path).unwrap(), 2);

        let mut reader = csv::Reader::from_path(&csv_path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), CSV_COLUMNS.to_vec());

        let rows = reader.records().collect::<std::result::Result<Vec<_>, _>>().unwrap();
        assert_eq!(&rows[0][8], "Bits, Bytes");
        assert_eq!(&rows[0][11], r#"["Jane Doe","Rich Roe"]"#);
        assert_eq!(&rows[0][6], "");
        assert_eq!(&rows[1][6], "https://files/proposal");
        assert_eq!(&rows[1][14], "10");
    }
}
