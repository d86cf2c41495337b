use regex::RegexSet;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A set of url patterns. `*` matches anything, everything else is literal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct UrlPatterns {
    patterns: Vec<String>,
    set: RegexSet,
}

impl UrlPatterns {
    /// Matches every url.
    pub fn any() -> Self {
        // A single wildcard is always a valid pattern
        Self::try_from(vec!["*".to_owned()]).unwrap_or_default()
    }

    pub fn is_match(&self, url: &str) -> bool {
        self.set.is_match(url)
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

impl Default for UrlPatterns {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            set: RegexSet::empty(),
        }
    }
}

impl PartialEq for UrlPatterns {
    fn eq(&self, other: &Self) -> bool {
        self.patterns == other.patterns
    }
}

impl TryFrom<Vec<String>> for UrlPatterns {
    type Error = Error;

    fn try_from(patterns: Vec<String>) -> Result<Self> {
        let regexes = patterns.iter().map(|pattern| glob_to_regex(pattern));
        let set = RegexSet::new(regexes).map_err(Error::ParsingUrlPattern)?;
        Ok(Self { patterns, set })
    }
}

impl From<UrlPatterns> for Vec<String> {
    fn from(patterns: UrlPatterns) -> Self {
        patterns.patterns
    }
}

fn glob_to_regex(pattern: &str) -> String {
    let parts: Vec<_> = pattern.split('*').map(regex::escape).collect();
    format!("^{}$", parts.join(".*"))
}
