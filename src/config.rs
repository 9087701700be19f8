//! Run-wide settings and the per-file context handed to adapters.
//!
//! # Example
//!
//! ```
//! use dppi::config::MergeConfig;
//!
//! let mut config = MergeConfig::new();
//! config.set_conference("iPRES").set_default_license("CC0");
//! assert_eq!(config.conference(), "iPRES");
//! ```

use serde::Deserialize;
use std::path::Path;

use crate::normalize::year_from_file_name;
use crate::{DEFAULT_LICENSE, MergeError, Result};

/// Settings for one merge run.
///
/// Every field has a default, so a JSON config file only needs the keys it
/// changes:
///
/// ```json
/// { "conference": "iPRES", "utc_offset": "+02:00" }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Conference acronym, used for keyword filtering and source names
    conference: String,
    /// License recorded when a source gives none
    default_license: String,
    /// Title suffix marking an IDEALS record as a slide deck
    presentation_marker: String,
    /// Offset appended to spreadsheet presentation times
    utc_offset: String,
    /// Year to use when a file name carries none
    year: Option<i32>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl MergeConfig {
    /// Creates a configuration for iPRES with the default license.
    #[must_use]
    pub fn new() -> Self {
        Self {
            conference: "iPRES".to_string(),
            default_license: DEFAULT_LICENSE.to_string(),
            presentation_marker: " [presentation]".to_string(),
            utc_offset: "+01:00".to_string(),
            year: None,
        }
    }

    /// Reads a JSON configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn set_conference(&mut self, conference: &str) -> &mut Self {
        self.conference = conference.to_string();
        self
    }

    pub fn set_default_license(&mut self, license: &str) -> &mut Self {
        self.default_license = license.to_string();
        self
    }

    pub fn set_presentation_marker(&mut self, marker: &str) -> &mut Self {
        self.presentation_marker = marker.to_string();
        self
    }

    pub fn set_utc_offset(&mut self, offset: &str) -> &mut Self {
        self.utc_offset = offset.to_string();
        self
    }

    pub fn set_year(&mut self, year: i32) -> &mut Self {
        self.year = Some(year);
        self
    }

    pub fn conference(&self) -> &str {
        &self.conference
    }

    /// Builds the context for one input file.
    ///
    /// The year comes from the file name (fetchers write e.g.
    /// `ipres2023.ideals.jsonl`), falling back to the configured year.
    pub fn context_for(&self, path: &Path) -> SourceContext {
        let year = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(year_from_file_name)
            .or(self.year);
        SourceContext {
            conference: self.conference.clone(),
            year,
            default_license: self.default_license.clone(),
            presentation_marker: self.presentation_marker.clone(),
            utc_offset: self.utc_offset.clone(),
        }
    }
}

/// What an adapter knows about the file it is reading.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceContext {
    pub conference: String,
    pub year: Option<i32>,
    pub default_license: String,
    pub presentation_marker: String,
    pub utc_offset: String,
}

impl SourceContext {
    /// Creates a context with the defaults of [`MergeConfig::new`] and no year.
    #[must_use]
    pub fn new(conference: &str) -> Self {
        let mut config = MergeConfig::new();
        config.set_conference(conference);
        SourceContext {
            conference: config.conference,
            year: None,
            default_license: config.default_license,
            presentation_marker: config.presentation_marker,
            utc_offset: config.utc_offset,
        }
    }

    #[must_use]
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// The conference year, which every record needs.
    pub fn year(&self) -> Result<i32> {
        self.year
            .ok_or_else(|| MergeError::MissingField("year".to_string()))
    }

    /// The source's license, or the default when it has none.
    pub fn license_or_default(&self, license: Option<String>) -> Option<String> {
        license
            .filter(|l| !l.trim().is_empty())
            .or_else(|| Some(self.default_license.clone()))
    }
}
