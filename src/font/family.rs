//! Parsing and serializing `font-family` values.
use core::fmt;

use itertools::Itertools;
use serde::Serialize;

use crate::{
    css::split_top_level,
    error::{Error, Result},
};

/// CSS generic family keywords. These are never quoted.
const GENERIC_FAMILIES: &[&str] = &[
    "serif",
    "sans-serif",
    "monospace",
    "cursive",
    "fantasy",
    "system-ui",
    "ui-serif",
    "ui-sans-serif",
    "ui-monospace",
    "ui-rounded",
    "emoji",
    "math",
    "fangsong",
];

/// A single entry of a `font-family` list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum FamilyName {
    /// A specific family, like `"Courier New"` or `Arial`.
    Title(String),
    /// A generic family keyword, stored lowercase.
    Generic(String),
}

impl FamilyName {
    /// A named family. Generic keywords given here stay named families.
    pub fn title<S: Into<String>>(name: S) -> Self {
        FamilyName::Title(name.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            FamilyName::Title(name) | FamilyName::Generic(name) => name,
        }
    }

    /// Interpret an unquoted identifier sequence.
    fn from_idents(idents: &str) -> Self {
        let joined = idents.split_whitespace().join(" ");
        let lower = joined.to_lowercase();
        if GENERIC_FAMILIES.contains(&lower.as_str()) {
            FamilyName::Generic(lower)
        } else {
            FamilyName::Title(joined)
        }
    }
}

impl AsRef<str> for FamilyName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for FamilyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FamilyName::Generic(name) => write!(f, "{}", name),
            FamilyName::Title(name) => {
                write!(f, "\"")?;
                for ch in name.chars() {
                    match ch {
                        '"' | '\\' => write!(f, "\\{}", ch)?,
                        '\n' => write!(f, "\\a ")?,
                        ch => write!(f, "{}", ch)?,
                    }
                }
                write!(f, "\"")
            }
        }
    }
}

/// Serialize a list as the value of a `font-family` declaration.
pub fn to_css(fonts: &[FamilyName]) -> String {
    fonts.iter().join(", ")
}

/// Parse a `font-family` value into its entries.
pub fn parse(value: &str) -> Result<Vec<FamilyName>> {
    let err = |reason| Error::ParsingFont(value.to_owned(), reason);
    let mut fonts = Vec::new();
    for entry in split_top_level(value, ',') {
        let entry = entry.trim();
        if entry.is_empty() {
            return Err(err("empty family name"));
        }
        let font = match entry.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let (name, rest) = unquote(entry, quote).ok_or_else(|| err("unterminated string"))?;
                if !rest.trim().is_empty() {
                    return Err(err("garbage after quoted family name"));
                }
                FamilyName::Title(name)
            }
            _ => FamilyName::from_idents(entry),
        };
        fonts.push(font);
    }
    Ok(fonts)
}

/// Read a quoted string starting at the beginning of `input`.
///
/// Returns the unescaped content and the remaining input after the closing quote.
pub(crate) fn unquote(input: &str, quote: char) -> Option<(String, &str)> {
    let mut content = String::new();
    let mut chars = input.char_indices().skip(1);
    while let Some((idx, ch)) = chars.next() {
        match ch {
            '\\' => {
                let (_, escaped) = chars.next()?;
                content.push(escaped);
            }
            ch if ch == quote => return Some((content, &input[idx + ch.len_utf8()..])),
            ch => content.push(ch),
        }
    }
    None
}
