//! Split a filename into its fixed-width numeric prefix, group label and remainder.

use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;

/// Prefix width used by every observed naming scheme.
pub const DEFAULT_PREFIX_WIDTH: usize = 2;

/// Widest prefix that still fits in a `u32`.
pub const MAX_PREFIX_WIDTH: usize = 9;

static RE_DEFAULT_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| prefix_regex(DEFAULT_PREFIX_WIDTH).expect("Failed to compile prefix regex"));

/// Structural components of one filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    /// Value of the leading digit run, `None` if the name does not start with one.
    pub prefix: Option<u32>,
    /// Number of digits actually matched. Zero when there is no prefix.
    pub width: usize,
    /// Leading non-digit run of the remainder stem, trimmed.
    pub group: Option<String>,
    /// Everything after the prefix, or the full name when there is no prefix.
    pub remainder: String,
}

impl ParsedName {
    /// Name without any recognized structure.
    fn unrecognized(name: &str) -> Self {
        Self {
            prefix: None,
            width: 0,
            group: None,
            remainder: name.to_string(),
        }
    }

    /// Rebuild a filename from this remainder with the given prefix value.
    #[must_use]
    pub fn with_prefix(&self, prefix: u32) -> String {
        format_prefixed(prefix, self.width, &self.remainder)
    }
}

/// Parses names with a configurable fixed prefix width.
#[derive(Debug, Clone)]
pub struct PrefixParser {
    width: usize,
    pattern: Regex,
}

impl PrefixParser {
    /// Create a parser for prefixes of exactly `width` digits.
    ///
    /// # Errors
    /// Returns an error if the width is zero or too wide for a `u32` value.
    pub fn new(width: usize) -> Result<Self> {
        if width == 0 || width > MAX_PREFIX_WIDTH {
            anyhow::bail!("Prefix width must be between 1 and {MAX_PREFIX_WIDTH}, got {width}");
        }
        let pattern = if width == DEFAULT_PREFIX_WIDTH {
            RE_DEFAULT_PREFIX.clone()
        } else {
            prefix_regex(width)?
        };
        Ok(Self { width, pattern })
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Largest prefix value representable with this width.
    #[must_use]
    pub const fn max_prefix(&self) -> u32 {
        max_prefix_for_width(self.width)
    }

    /// Parse a single filename.
    ///
    /// Names that do not start with exactly `width` ASCII digits
    /// come back with no prefix, no group and the full name as remainder.
    #[must_use]
    pub fn parse(&self, name: &str) -> ParsedName {
        let Some(captures) = self.pattern.captures(name) else {
            return ParsedName::unrecognized(name);
        };
        let (Some(digits), Some(rest)) = (captures.get(1), captures.get(2)) else {
            return ParsedName::unrecognized(name);
        };
        let Ok(prefix) = digits.as_str().parse::<u32>() else {
            return ParsedName::unrecognized(name);
        };

        let remainder = rest.as_str().to_string();
        ParsedName {
            prefix: Some(prefix),
            width: digits.len(),
            group: group_label(&remainder),
            remainder,
        }
    }
}

impl Default for PrefixParser {
    fn default() -> Self {
        Self {
            width: DEFAULT_PREFIX_WIDTH,
            pattern: RE_DEFAULT_PREFIX.clone(),
        }
    }
}

/// Parse a filename using the default two-digit prefix width.
#[must_use]
pub fn parse(name: &str) -> ParsedName {
    PrefixParser::default().parse(name)
}

/// Derive the group label from a remainder.
///
/// The trailing file extension is ignored so that `cats.jpg` and `cats.png` share the group `cats`.
/// The label is the leading run of non-digit characters with surrounding whitespace trimmed.
#[must_use]
pub fn group_label(remainder: &str) -> Option<String> {
    let stem = match remainder.rsplit_once('.') {
        Some((stem, _extension)) if !stem.is_empty() => stem,
        _ => remainder,
    };
    let label = stem.split(|c: char| c.is_ascii_digit()).next().unwrap_or_default().trim();
    if label.is_empty() { None } else { Some(label.to_string()) }
}

/// Format a prefix value zero-padded to `width` followed by the remainder.
#[must_use]
pub fn format_prefixed(prefix: u32, width: usize, remainder: &str) -> String {
    format!("{prefix:0width$}{remainder}")
}

/// Largest value that fits in `width` decimal digits.
#[must_use]
pub const fn max_prefix_for_width(width: usize) -> u32 {
    if width >= MAX_PREFIX_WIDTH {
        999_999_999
    } else {
        10_u32.pow(width as u32) - 1
    }
}

fn prefix_regex(width: usize) -> Result<Regex> {
    Ok(Regex::new(&format!(r"(?s)^([0-9]{{{width}}})(.*)$"))?)
}
