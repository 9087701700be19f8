//! Line-by-line reading of JSON-Lines input.

use serde::de::DeserializeOwned;
use std::io::BufRead;

use crate::{MergeError, Result};

/// Lazily deserializes each non-blank line, tagging it with its 1-based line number.
pub(crate) fn json_lines<'a, T>(
    input: Box<dyn BufRead + 'a>,
) -> impl Iterator<Item = Result<(usize, T)>> + 'a
where
    T: DeserializeOwned + 'a,
{
    input
        .lines()
        .enumerate()
        .filter_map(|(index, line)| {
            let line_number = index + 1;
            match line {
                Ok(line) if line.trim().is_empty() => None,
                Ok(line) => Some(
                    serde_json::from_str(&line)
                        .map(|value| (line_number, value))
                        .map_err(|source| MergeError::Json {
                            line: line_number,
                            source,
                        }),
                ),
                Err(err) => Some(Err(MergeError::Io(err))),
            }
        })
}
