//! User configuration.
//!
//! Loaded once from a TOML file before the pipeline starts and never changed
//! afterwards.
use serde::{Deserialize, Serialize};
use structopt::clap::arg_enum;
use tracing::{debug, info};

use std::{fs, path::Path};

use crate::{
    error::{Error, ResultExt},
    font::Category,
};

use self::{args::Args, rule::UrlPatterns};

pub mod args;
pub mod rule;
#[cfg(test)]
mod tests;

const DEFAULT_FONT: &str = "Atkinson Hyperlegible Next";
const DEFAULT_MONOSPACE_FONT: &str = "Atkinson Hyperlegible Mono";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub mode: Mode,
    pub replace_unknown_fonts: bool,
    pub url_whitelist: UrlPatterns,
    pub url_blacklist: UrlPatterns,
    #[serde(rename = "font-options")]
    pub font_options: FontOptions,
}

arg_enum! {
    /// How fonts are replaced. Only `js` is implemented.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Mode {
        Css,
        Js,
        Off,
    }
}

/// Replacement font per category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FontOptions {
    pub serif: FontOption,
    pub sans_serif: FontOption,
    pub monospace: FontOption,
    pub fantasy: FontOption,
    pub cursive: FontOption,
}

/// A single replacement, either just the font name or a toggle with a name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FontOption {
    Name(String),
    Toggle { enabled: bool, name: String },
}

impl Config {
    /// Load the configuration at `path`, using defaults if that fails.
    ///
    /// Files ending in `.json` are read as JSON, everything else as TOML.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        Self::load_or_log(path).unwrap_or_else(|| {
            info!("Using the default configuration");
            Self::default()
        })
    }

    fn load_or_log(path: &Path) -> Option<Self> {
        debug!("Reading configuration from {}", path.display());
        let file = fs::read_to_string(path)
            .map_err(Error::ReadingConfig)
            .log_warn()?;
        if path.extension().map_or(false, |ext| ext == "json") {
            serde_json::from_str(&file)
                .map_err(|why| Error::Deserializing(why, "reading the configuration"))
                .log_err()
        } else {
            toml::from_str(&file)
                .map_err(Error::DeserializingConfig)
                .log_err()
        }
    }

    /// Apply overrides given on the command line.
    pub fn with_args(mut self, args: &Args) -> Self {
        if let Some(mode) = args.mode {
            self.mode = mode;
        }
        for (category, name) in &args.replace {
            if let Some(option) = self.font_options.option_mut(*category) {
                *option = FontOption::Name(name.clone());
            }
        }
        self
    }

    /// Whether the pipeline may run on a page with this url.
    pub fn is_url_allowed(&self, url: &str) -> bool {
        self.url_whitelist.is_match(url) && !self.url_blacklist.is_match(url)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            replace_unknown_fonts: false,
            url_whitelist: UrlPatterns::any(),
            url_blacklist: UrlPatterns::default(),
            font_options: FontOptions::default(),
        }
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Js
    }
}

impl FontOptions {
    /// The configured replacement for `category`.
    ///
    /// Fonts that could not be classified are never replaced.
    pub fn replacement(&self, category: Category) -> Option<&str> {
        let option = match category {
            Category::Cursive => &self.cursive,
            Category::Fantasy => &self.fantasy,
            Category::Monospace => &self.monospace,
            Category::SansSerif => &self.sans_serif,
            Category::Serif => &self.serif,
            Category::None => return None,
        };
        option.name()
    }

    fn option_mut(&mut self, category: Category) -> Option<&mut FontOption> {
        match category {
            Category::Cursive => Some(&mut self.cursive),
            Category::Fantasy => Some(&mut self.fantasy),
            Category::Monospace => Some(&mut self.monospace),
            Category::SansSerif => Some(&mut self.sans_serif),
            Category::Serif => Some(&mut self.serif),
            Category::None => None,
        }
    }
}

impl Default for FontOptions {
    fn default() -> Self {
        let font = || FontOption::Name(DEFAULT_FONT.to_owned());
        Self {
            serif: font(),
            sans_serif: font(),
            monospace: FontOption::Name(DEFAULT_MONOSPACE_FONT.to_owned()),
            fantasy: font(),
            cursive: font(),
        }
    }
}

impl FontOption {
    /// The font name, unless the option is disabled or empty.
    pub fn name(&self) -> Option<&str> {
        let name = match self {
            FontOption::Name(name) => name,
            FontOption::Toggle { enabled: false, .. } => return None,
            FontOption::Toggle { name, .. } => name,
        };
        Some(name.trim()).filter(|name| !name.is_empty())
    }
}
