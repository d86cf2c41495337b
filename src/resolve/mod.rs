//! Turning the font declarations of a rule into a family list.
use tracing::{debug, warn};

use crate::{
    bridge::SerializedRule,
    css::StyleRule,
    error::{Result, ResultExt},
    font::{family, shorthand, FamilyName},
};

#[cfg(test)]
mod tests;

/// Values every property accepts. They never name a font.
pub const CSS_WIDE_KEYWORDS: &[&str] = &["inherit", "initial", "revert", "revert-layer", "unset"];

/// Read access to the computed style of a page.
pub trait ComputedStyle {
    /// Computed value of `property` on the first element matching `selector`,
    /// or on the root element if nothing matches.
    fn computed_style(&self, selector: &str, property: &str) -> Result<String>;
}

/// The font related declarations of a single style rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontDeclarations<'r> {
    pub selector: &'r str,
    pub font: Option<&'r str>,
    pub font_family: Option<&'r str>,
}

impl<'r> From<&'r StyleRule> for FontDeclarations<'r> {
    fn from(rule: &'r StyleRule) -> Self {
        Self {
            selector: &rule.selector_text,
            font: rule.property_value("font"),
            font_family: rule.property_value("font-family"),
        }
    }
}

impl<'r> From<&'r SerializedRule> for FontDeclarations<'r> {
    fn from(rule: &'r SerializedRule) -> Self {
        let non_empty = |value: &'r str| Some(value).filter(|value| !value.is_empty());
        Self {
            selector: &rule.selector,
            font: non_empty(&rule.font),
            font_family: non_empty(&rule.font_family),
        }
    }
}

impl FontDeclarations<'_> {
    pub fn is_empty(&self) -> bool {
        self.font.is_none() && self.font_family.is_none()
    }
}

/// Resolve the effective font family list of a rule.
///
/// `None` if the rule has no declaration that names fonts. A `font-family`
/// longhand always wins over the shorthand.
pub fn resolve<S: ComputedStyle + ?Sized>(
    decls: FontDeclarations<'_>,
    style: &S,
) -> Option<Vec<FamilyName>> {
    let mut fonts = None;
    if let Some(value) = applicable(decls.font) {
        let value = substitute(decls.selector, "font", value, style);
        fonts = shorthand::parse(&value)
            .log_warn()
            .map(|font| font.family);
    }
    if let Some(value) = applicable(decls.font_family) {
        let value = substitute(decls.selector, "font-family", value, style);
        fonts = family::parse(&value).log_warn();
    }
    fonts.filter(|fonts| !fonts.is_empty())
}

/// The declared value, unless it is missing, empty or a CSS-wide keyword.
fn applicable(value: Option<&str>) -> Option<&str> {
    let value = value?.trim();
    let lower = value.to_lowercase();
    if value.is_empty() || CSS_WIDE_KEYWORDS.contains(&lower.as_str()) {
        None
    } else {
        Some(value)
    }
}

/// Ask the page for the computed value if `value` uses custom properties.
fn substitute<S: ComputedStyle + ?Sized>(
    selector: &str,
    property: &str,
    value: &str,
    style: &S,
) -> String {
    if !value.contains("var(") {
        return value.to_owned();
    }
    match style.computed_style(selector, property) {
        Ok(computed) if !computed.trim().is_empty() => {
            debug!("Resolved {:?} to {:?}", value, computed);
            computed
        }
        Ok(_) => {
            debug!("{} of {:?} computed to nothing, using {:?}", property, selector, value);
            value.to_owned()
        }
        Err(why) => {
            warn!("Could not compute {} of {:?}: {}", property, selector, why);
            value.to_owned()
        }
    }
}

