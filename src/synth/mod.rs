//! Writing override rules.
use core::fmt;

use itertools::Itertools;
use serde::Serialize;
use tracing::debug;

use crate::{
    config::FontOptions,
    dom::{Page, SheetId},
    error::Result,
    font::{family, Category, FamilyName},
};


/// A rule putting the replacement font in front of a family list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverrideRule {
    pub selector: String,
    pub category: Category,
    /// The new family list, replacement first.
    pub fonts: Vec<FamilyName>,
}

/// Build the override for `fonts`, if a replacement is configured for `category`.
pub fn synthesize(
    selector: &str,
    fonts: &[FamilyName],
    category: Category,
    options: &FontOptions,
) -> Option<OverrideRule> {
    let replacement = match options.replacement(category) {
        Some(replacement) => replacement,
        None => {
            debug!("No replacement for {} fonts of {:?}", category, selector);
            return None;
        }
    };
    let mut list = Vec::with_capacity(fonts.len() + 1);
    list.push(FamilyName::title(replacement));
    list.extend(fonts.iter().cloned());
    Some(OverrideRule {
        selector: selector.to_owned(),
        category,
        fonts: list,
    })
}

impl fmt::Display for OverrideRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {{ font-family: {} !important; }}",
            self.selector,
            family::to_css(&self.fonts)
        )
    }
}

/// The adopted stylesheet holding all overrides of a page.
///
/// Rules are only ever appended, later overrides win over earlier ones.
#[derive(Debug)]
pub struct OverrideSheet {
    id: SheetId,
    rules: Vec<OverrideRule>,
}

impl OverrideSheet {
    /// Create the sheet and adopt it into the document.
    pub fn adopt(page: &mut Page) -> Self {
        let id = page.create_sheet();
        page.adopt_sheet(id);
        Self {
            id,
            rules: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn id(&self) -> SheetId {
        self.id
    }

    /// Append `rule` at the end of the sheet.
    pub fn append(&mut self, page: &mut Page, rule: OverrideRule) -> Result<usize> {
        let sheet = page.sheet_mut(self.id);
        let index = sheet.insert_rule(&rule.to_string(), sheet.len())?;
        debug!("Override #{}: {}", index, rule);
        self.rules.push(rule);
        Ok(index)
    }

    /// All rules appended so far.
    pub fn rules(&self) -> &[OverrideRule] {
        &self.rules
    }

    /// The sheet as CSS text, one rule per line.
    pub fn to_css(&self, page: &Page) -> String {
        page.sheet(self.id).rules_unchecked().iter().join("\n")
    }
}
