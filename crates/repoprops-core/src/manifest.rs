//! Manifest loading.
//!
//! One record per line:
//!
//! ```text
//! <repo_ref><DELIM><properties_spec>[<DELIM><settings_spec>]
//! ```
//!
//! `DELIM` is `::` in the primary dialect and `;` in the legacy one.
//! Blank lines and lines starting with `#` are skipped. Malformed lines are
//! logged and skipped; they never abort the load.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::error::{ConfigError, ParseError};

const BOM: char = '\u{feff}';

/// Field delimiter of the manifest dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delimiter {
    /// `::`
    #[default]
    DoubleColon,
    /// `;`, the legacy dialect
    Semicolon,
}

impl Delimiter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Delimiter::DoubleColon => "::",
            Delimiter::Semicolon => ";",
        }
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Delimiter {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "::" => Ok(Delimiter::DoubleColon),
            ";" => Ok(Delimiter::Semicolon),
            other => Err(ParseError::UnknownDelimiter(other.to_string())),
        }
    }
}

/// One manifest record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestRow {
    /// 1-based line number in the source file
    pub line: usize,
    pub repo_ref: String,
    pub properties_spec: String,
    pub settings_spec: String,
}

/// Reads manifests in a given dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestLoader {
    delimiter: Delimiter,
}

impl ManifestLoader {
    pub fn new(delimiter: Delimiter) -> Self {
        Self { delimiter }
    }

    /// Read and parse the manifest at `path`.
    ///
    /// Failing to open or decode the file is fatal; bad lines are not.
    pub fn load(&self, path: &Path) -> Result<Vec<ManifestRow>, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|source| ConfigError::ManifestUnreadable {
                path: path.to_path_buf(),
                source,
            })?;
        let rows = self.parse_str(&content);
        debug!(path = %path.display(), rows = rows.len(), "Loaded manifest");
        Ok(rows)
    }

    /// Parse manifest text, preserving line order.
    pub fn parse_str(&self, content: &str) -> Vec<ManifestRow> {
        let content = content.strip_prefix(BOM).unwrap_or(content);

        content
            .lines()
            .enumerate()
            .filter_map(|(idx, line)| match self.parse_line(idx + 1, line) {
                Ok(row) => row,
                Err(e) => {
                    warn!("Skipping manifest line: {}", e);
                    None
                }
            })
            .collect()
    }

    /// Parse a single line. Blank and comment lines yield `Ok(None)`.
    pub fn parse_line(&self, line: usize, raw: &str) -> Result<Option<ManifestRow>, ParseError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(None);
        }

        let fields: Vec<&str> = trimmed.split(self.delimiter.as_str()).map(str::trim).collect();
        if fields.len() < 2 {
            return Err(ParseError::TooFewFields {
                line,
                delimiter: self.delimiter.to_string(),
                found: fields.len(),
            });
        }
        if fields[0].is_empty() {
            return Err(ParseError::EmptyRepoRef { line });
        }
        if fields.len() > 3 {
            warn!(
                "Line {}: ignoring {} extra field(s) after the settings spec",
                line,
                fields.len() - 3
            );
        }

        Ok(Some(ManifestRow {
            line,
            repo_ref: fields[0].to_string(),
            properties_spec: fields[1].to_string(),
            settings_spec: fields.get(2).map(|s| s.to_string()).unwrap_or_default(),
        }))
    }
}
