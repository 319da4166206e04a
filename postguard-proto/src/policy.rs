//! The MTA-STS policy document.
//!
//! The document is fetched from `https://mta-sts.<domain>/.well-known/mta-sts.txt`
//! and is a sequence of `key: value` lines, with `mx` repeatable:
//!
//! ```text
//! version: STSv1
//! mode: enforce
//! mx: mta1.example.com
//! mx: *.example.com
//! max_age: 604800
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Policy enforcement mode.
///
/// Defaults to [`PolicyMode::None`]; an unrecognised mode string also
/// reads as `None` rather than failing the parse, matching the
/// forward-compatibility stance taken for unknown keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyMode {
    /// Delivery must use TLS to a policy-listed MX.
    Enforce,
    /// Failures are reported but delivery proceeds.
    Testing,
    /// No active policy.
    #[default]
    None,
}

impl PolicyMode {
    /// The wire string for this mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Enforce => "enforce",
            Self::Testing => "testing",
            Self::None => "none",
        }
    }

    fn from_wire(value: &str) -> Self {
        match value {
            "enforce" => Self::Enforce,
            "testing" => Self::Testing,
            _ => Self::None,
        }
    }
}

impl fmt::Display for PolicyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed MTA-STS policy document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDocument {
    /// Protocol version, `STSv1` unless the document says otherwise.
    pub version: String,
    /// Enforcement mode.
    pub mode: PolicyMode,
    /// Lifetime of the policy in seconds, counted from fetch time.
    pub max_age: Option<u64>,
    /// MX patterns permitted to receive mail for the domain, in
    /// document order. Only meaningful when `mode` is not
    /// [`PolicyMode::None`].
    pub mx: Vec<String>,
}

impl Default for PolicyDocument {
    fn default() -> Self {
        Self {
            version: "STSv1".to_string(),
            mode: PolicyMode::None,
            max_age: None,
            mx: Vec::new(),
        }
    }
}

impl PolicyDocument {
    /// Parses the line-oriented policy text.
    ///
    /// Each non-blank line is split on its first colon; the value keeps
    /// its content verbatim apart from one leading space. Unknown keys
    /// (and lines without a colon) are ignored for forward
    /// compatibility. Repeated `mx` lines append in encounter order;
    /// any other repeated key, last wins.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidMaxAge`] when `max_age` is not a
    /// non-negative integer. Unlike the TXT records, a malformed
    /// document is a hard failure, not absence.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut document = Self::default();

        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.strip_prefix(' ').unwrap_or(value);

            match key {
                "version" => document.version = value.to_string(),
                "mode" => document.mode = PolicyMode::from_wire(value),
                "max_age" => {
                    document.max_age = Some(
                        value
                            .parse()
                            .map_err(|_| ParseError::InvalidMaxAge(value.to_string()))?,
                    );
                }
                "mx" => document.mx.push(value.to_string()),
                _ => {}
            }
        }

        Ok(document)
    }

    /// Serialises the document back to its wire form.
    ///
    /// Emits `version`, `mode`, and `max_age` (when set) as one
    /// `key: value` line each, then one `mx:` line per pattern in list
    /// order. Every line is newline-terminated.
    #[must_use]
    pub fn serialize(&self) -> String {
        let mut out = String::new();

        out.push_str(&format!("version: {}\n", self.version));
        out.push_str(&format!("mode: {}\n", self.mode));
        if let Some(max_age) = self.max_age {
            out.push_str(&format!("max_age: {max_age}\n"));
        }
        for mx in &self.mx {
            out.push_str(&format!("mx: {mx}\n"));
        }

        out
    }

    /// Checks whether an MX hostname is permitted by this policy.
    ///
    /// A leading `*.` pattern matches exactly one additional label, per
    /// RFC 8461 section 4.1. Comparison is case-insensitive.
    #[must_use]
    pub fn matches_mx(&self, host: &str) -> bool {
        let host = host.to_lowercase();

        self.mx.iter().any(|pattern| {
            let pattern = pattern.to_lowercase();
            if let Some(suffix) = pattern.strip_prefix("*.") {
                host.strip_suffix(suffix)
                    .and_then(|prefix| prefix.strip_suffix('.'))
                    .is_some_and(|label| !label.is_empty() && !label.contains('.'))
            } else {
                host == pattern
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "version: STSv1\n\
                          mode: enforce\n\
                          max_age: 604800\n\
                          mx: mta1.example.com\n\
                          mx: mta2.example.com\n";

    #[test]
    fn test_parse_sample() {
        let document = PolicyDocument::parse(SAMPLE).unwrap();
        assert_eq!(document.version, "STSv1");
        assert_eq!(document.mode, PolicyMode::Enforce);
        assert_eq!(document.max_age, Some(604_800));
        assert_eq!(document.mx, vec!["mta1.example.com", "mta2.example.com"]);
    }

    #[test]
    fn test_parse_mx_preserves_document_order() {
        let document =
            PolicyDocument::parse("mx: b.example.com\nmx: a.example.com\n").unwrap();
        assert_eq!(document.mx, vec!["b.example.com", "a.example.com"]);
    }

    #[test]
    fn test_parse_repeated_scalar_key_last_wins() {
        let document = PolicyDocument::parse("mode: testing\nmode: enforce\n").unwrap();
        assert_eq!(document.mode, PolicyMode::Enforce);
    }

    #[test]
    fn test_parse_unknown_keys_ignored() {
        let document = PolicyDocument::parse("version: STSv1\nfuture_key: zap\n").unwrap();
        assert_eq!(document.version, "STSv1");
    }

    #[test]
    fn test_parse_strips_one_leading_space_only() {
        let document = PolicyDocument::parse("mx:  spaced.example.com\n").unwrap();
        assert_eq!(document.mx, vec![" spaced.example.com"]);
    }

    #[test]
    fn test_parse_value_may_contain_colon() {
        let document = PolicyDocument::parse("version: STSv1:extra\n").unwrap();
        assert_eq!(document.version, "STSv1:extra");
    }

    #[test]
    fn test_parse_invalid_max_age() {
        let err = PolicyDocument::parse("max_age: a while\n").unwrap_err();
        assert_eq!(err, ParseError::InvalidMaxAge("a while".to_string()));
    }

    #[test]
    fn test_parse_defaults() {
        let document = PolicyDocument::parse("").unwrap();
        assert_eq!(document.version, "STSv1");
        assert_eq!(document.mode, PolicyMode::None);
        assert_eq!(document.max_age, None);
        assert!(document.mx.is_empty());
    }

    #[test]
    fn test_parse_unknown_mode_reads_as_none() {
        let document = PolicyDocument::parse("mode: aggressive\n").unwrap();
        assert_eq!(document.mode, PolicyMode::None);
    }

    #[test]
    fn test_serialize() {
        let document = PolicyDocument {
            version: "STSv1".to_string(),
            mode: PolicyMode::Enforce,
            max_age: Some(604_800),
            mx: vec!["mta1.example.com".to_string(), "mta2.example.com".to_string()],
        };
        assert_eq!(
            document.serialize(),
            "version: STSv1\nmode: enforce\nmax_age: 604800\nmx: mta1.example.com\nmx: mta2.example.com\n"
        );
    }

    #[test]
    fn test_serialize_omits_absent_max_age() {
        let document = PolicyDocument::default();
        assert_eq!(document.serialize(), "version: STSv1\nmode: none\n");
    }

    #[test]
    fn test_round_trip() {
        let document = PolicyDocument::parse(SAMPLE).unwrap();
        assert_eq!(document.serialize(), SAMPLE);
    }

    #[test]
    fn test_round_trip_normalises_line_order() {
        // Parsing is order-insensitive, so a document with max_age after
        // the mx lines serializes back in canonical order.
        let shuffled = "version: STSv1\n\
                        mode: enforce\n\
                        mx: mta1.example.com\n\
                        mx: mta2.example.com\n\
                        max_age: 604800\n";
        let document = PolicyDocument::parse(shuffled).unwrap();
        assert_eq!(document, PolicyDocument::parse(SAMPLE).unwrap());
        assert_eq!(document.serialize(), SAMPLE);
    }

    #[test]
    fn test_matches_mx_exact() {
        let document = PolicyDocument::parse("mx: mail.example.com\n").unwrap();
        assert!(document.matches_mx("mail.example.com"));
        assert!(document.matches_mx("MAIL.example.COM"));
        assert!(!document.matches_mx("other.example.com"));
    }

    #[test]
    fn test_matches_mx_wildcard_single_label() {
        let document = PolicyDocument::parse("mx: *.example.com\n").unwrap();
        assert!(document.matches_mx("mta1.example.com"));
        assert!(!document.matches_mx("example.com"));
        assert!(!document.matches_mx("deep.mta1.example.com"));
    }
}
