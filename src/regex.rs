//! Picks the regex engine: the full `regex` crate, or `regex_lite` for smaller builds.

#[cfg(feature = "lite")]
pub(crate) use regex_lite::Regex;
#[cfg(all(feature = "regex", not(feature = "lite")))]
pub(crate) use regex::Regex;

#[cfg(not(any(feature = "regex", feature = "lite")))]
compile_error!("dppi needs either the \"regex\" or the \"lite\" feature");
