//! Classification of font-family lists.
//!
//! The fallback order of a `font-family` list encodes what kind of font the
//! author wanted, so the first entry we know about decides the [`Category`].
use std::collections::HashMap;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

pub mod family;
pub mod shorthand;
#[cfg(test)]
mod tests;

pub use self::family::FamilyName;

/// Keywords per category, all lowercase.
///
/// A keyword must only ever appear once in this table.
const KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Serif,
        &[
            "serif",
            "ui-serif",
            "times new roman",
            "times",
            "georgia",
            "garamond",
        ],
    ),
    (
        Category::SansSerif,
        &[
            "sans-serif",
            "ui-sans-serif",
            "system-ui",
            "ui-rounded",
            "arial",
            "helvetica",
            "verdana",
            "tahoma",
            "trebuchet ms",
        ],
    ),
    (
        Category::Cursive,
        &["cursive", "brush script mt", "comic sans ms"],
    ),
    (Category::Fantasy, &["fantasy", "papyrus", "impact"]),
    (
        Category::Monospace,
        &[
            "monospace",
            "ui-monospace",
            "courier",
            "courier new",
            "consolas",
            "menlo",
            "monaco",
        ],
    ),
    (Category::None, &["emoji", "math", "fangsong"]),
];

lazy_static! {
    /// Inverted [`KEYWORDS`], mapping keywords to their category.
    static ref FONT_MAPPING: HashMap<&'static str, Category> = KEYWORDS
        .iter()
        .flat_map(|(category, keywords)| keywords.iter().map(move |kw| (*kw, *category)))
        .collect();
}

/// The kind of font a font-family list asks for.
#[derive(
    Debug,
    Clone,
    Copy,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumIter,
    Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
#[remain::sorted]
pub enum Category {
    Cursive,
    Fantasy,
    Monospace,
    None,
    SansSerif,
    Serif,
}

impl Category {
    /// Look up a single font-family keyword.
    pub fn of_keyword(keyword: &str) -> Option<Self> {
        FONT_MAPPING
            .get(keyword.trim().to_lowercase().as_str())
            .copied()
    }
}

/// Classify a font-family list.
///
/// The first entry found in the keyword table wins, even if later entries
/// would match as well. Lists without any known entry are [`Category::None`].
pub fn classify<S: AsRef<str>>(fonts: &[S]) -> Category {
    fonts
        .iter()
        .find_map(|font| Category::of_keyword(font.as_ref()))
        .unwrap_or(Category::None)
}
