//! Parser for the `font` shorthand.
//!
//! ```text
//! [ <style> || <variant> || <weight> || <stretch> ]? <size> [ / <line-height> ]? <family>#
//! ```
//!
//! Only the family list is used for overrides, the other parts are kept
//! around for logging.
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Error, Result};

use super::family::{self, FamilyName};

const SYSTEM_FONTS: &[&str] = &[
    "caption",
    "icon",
    "menu",
    "message-box",
    "small-caption",
    "status-bar",
];
const STYLES: &[&str] = &["italic", "oblique"];
const WEIGHTS: &[&str] = &["bold", "bolder", "lighter"];
const STRETCHES: &[&str] = &[
    "ultra-condensed",
    "extra-condensed",
    "condensed",
    "semi-condensed",
    "semi-expanded",
    "expanded",
    "extra-expanded",
    "ultra-expanded",
];
const SIZE_KEYWORDS: &[&str] = &[
    "xx-small",
    "x-small",
    "small",
    "medium",
    "large",
    "x-large",
    "xx-large",
    "xxx-large",
    "larger",
    "smaller",
];
const MATH_FUNCTIONS: &[&str] = &["calc(", "min(", "max(", "clamp(", "var(", "env("];

lazy_static! {
    static ref LENGTH_RE: Regex =
        Regex::new(r"(?i)^[+-]?(\d+\.?\d*|\.\d+)(e[+-]?\d+)?([a-z]+|%)?$").unwrap();
    static ref ANGLE_RE: Regex =
        Regex::new(r"(?i)^[+-]?(\d+\.?\d*|\.\d+)(deg|grad|rad|turn)$").unwrap();
    static ref WEIGHT_RE: Regex = Regex::new(r"^\d+(\.\d+)?$").unwrap();
}

/// A parsed `font` shorthand value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FontShorthand {
    pub style: Option<String>,
    pub variant: Option<String>,
    pub weight: Option<String>,
    pub stretch: Option<String>,
    pub size: String,
    pub line_height: Option<String>,
    pub family: Vec<FamilyName>,
}

/// Parse a `font` shorthand value.
pub fn parse(value: &str) -> Result<FontShorthand> {
    let err = |reason| Error::ParsingFont(value.to_owned(), reason);
    let trimmed = value.trim();
    if SYSTEM_FONTS.contains(&trimmed.to_lowercase().as_str()) {
        return Err(err("system fonts have no family list"));
    }
    let mut font = FontShorthand::default();
    let mut rest = trimmed;
    // Prefix keywords until the size shows up
    loop {
        let (token, after) = next_token(rest);
        if token.is_empty() {
            return Err(err("missing font size"));
        }
        let lower = token.to_lowercase();
        if is_size(&lower) {
            font.size = token.to_owned();
            rest = after;
            break;
        }
        let slot = if lower == "normal" {
            // `normal` fills the first free slot of style, variant, weight, stretch
            [
                &mut font.style,
                &mut font.variant,
                &mut font.weight,
                &mut font.stretch,
            ]
            .into_iter()
            .find(|slot| slot.is_none())
        } else if STYLES.contains(&lower.as_str()) {
            Some(&mut font.style)
        } else if lower == "small-caps" {
            Some(&mut font.variant)
        } else if WEIGHTS.contains(&lower.as_str()) || WEIGHT_RE.is_match(&lower) {
            Some(&mut font.weight)
        } else if STRETCHES.contains(&lower.as_str()) {
            Some(&mut font.stretch)
        } else {
            return Err(err("unexpected token before font size"));
        };
        match slot {
            Some(slot) if slot.is_none() => *slot = Some(token.to_owned()),
            _ => return Err(err("duplicate font property")),
        }
        rest = after;
        // `oblique` may carry an angle
        if lower == "oblique" {
            let (angle, after) = next_token(rest);
            if ANGLE_RE.is_match(angle) {
                font.style = Some(format!("{} {}", token, angle));
                rest = after;
            }
        }
    }
    // Optional line-height
    if let Some(after_slash) = rest.trim_start().strip_prefix('/') {
        let (line_height, after) = next_token(after_slash);
        if line_height.is_empty() {
            return Err(err("missing line height"));
        }
        font.line_height = Some(line_height.to_owned());
        rest = after;
    }
    if rest.trim().is_empty() {
        return Err(err("missing font family"));
    }
    font.family = family::parse(rest)?;
    Ok(font)
}

fn is_size(token: &str) -> bool {
    // Plain numbers other than zero are weights, not sizes
    let is_length = LENGTH_RE.is_match(token) && (!WEIGHT_RE.is_match(token) || token == "0");
    is_length
        || SIZE_KEYWORDS.contains(&token)
        || MATH_FUNCTIONS.iter().any(|f| token.starts_with(f))
}

/// Split off the next whitespace or `/` delimited token.
///
/// Parentheses are kept together, so `calc(1em + 2px)` is one token.
fn next_token(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    let mut depth = 0usize;
    for (idx, ch) in input.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            '/' | ',' if depth == 0 => return (&input[..idx], &input[idx..]),
            ch if ch.is_whitespace() && depth == 0 => return (&input[..idx], &input[idx..]),
            _ => {}
        }
    }
    (input, "")
}
