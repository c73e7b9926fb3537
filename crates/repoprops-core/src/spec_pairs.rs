//! `k=v(,k=v)*` fragment parsing shared by settings and properties.

use crate::error::ParseError;

/// Result of splitting a spec: well-formed pairs in input order plus the
/// fragments that could not be parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPairs {
    pub pairs: Vec<(String, String)>,
    pub errors: Vec<ParseError>,
}

/// Split `spec` on commas, then each fragment on its first `=`.
///
/// Keys and values are trimmed. Empty fragments are ignored.
pub fn parse_pairs(spec: &str) -> ParsedPairs {
    let mut parsed = ParsedPairs::default();

    for fragment in spec.split(',').map(str::trim) {
        if fragment.is_empty() {
            continue;
        }
        match fragment.split_once('=') {
            Some((key, _)) if key.trim().is_empty() => {
                parsed.errors.push(ParseError::EmptyKey {
                    fragment: fragment.to_string(),
                });
            }
            Some((key, value)) => {
                parsed
                    .pairs
                    .push((key.trim().to_string(), value.trim().to_string()));
            }
            None => parsed.errors.push(ParseError::MissingEquals {
                fragment: fragment.to_string(),
            }),
        }
    }

    parsed
}
