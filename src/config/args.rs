use structopt::{clap::arg_enum, StructOpt};

use std::path::PathBuf;

use crate::{
    error::{Error, Result},
    font::Category,
};

use super::Mode;

#[derive(Debug, StructOpt)]
#[structopt(about = "Replace the fonts of web pages with the ones you can read")]
pub struct Args {
    /// Path to the configuration file.
    #[structopt(long, short, env = "FRANKENFONT_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Overwrite the mode set in the configuration file.
    #[structopt(long, env = "FRANKENFONT_MODE",
                possible_values = &Mode::variants(),
                case_insensitive = true)]
    pub mode: Option<Mode>,

    /// Replace fonts of a category, like `monospace=Fira Code`.
    #[structopt(long, short, value_name = "CATEGORY=FONT", number_of_values = 1,
                parse(try_from_str = parse_replacement))]
    pub replace: Vec<(Category, String)>,

    /// Print JSON instead of CSS.
    #[structopt(long)]
    pub json: bool,

    /// When to use terminal colors.
    #[structopt(long,
                default_value = "Automatic",
                possible_values = &ColorWhen::variants(),
                case_insensitive = true)]
    pub color: ColorWhen,

    #[structopt(subcommand)]
    pub command: Command,
}

arg_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ColorWhen {
        Always,
        Automatic,
        Never,
    }
}

#[derive(Debug, StructOpt)]
pub enum Command {
    /// Build a page from stylesheets and print the font overrides.
    Rewrite(RewriteCommand),
    /// Print the category of a font-family list.
    Classify(ClassifyCommand),
    /// Print the effective configuration.
    Config,
}

#[derive(Debug, StructOpt)]
pub struct RewriteCommand {
    /// Url of the page the stylesheets belong to.
    #[structopt(long, short, default_value = "file:///index.html")]
    pub url: String,

    /// Local stylesheet files or http(s) urls.
    ///
    /// Files are part of the page from the start, urls are linked after
    /// the page loaded.
    #[structopt(name = "STYLESHEET", required = true)]
    pub stylesheets: Vec<String>,

    /// A rule a page script inserts once everything loaded.
    #[structopt(long = "insert-rule", value_name = "RULE", number_of_values = 1)]
    pub insert_rules: Vec<String>,

    /// A rule a page script adds with the legacy `addRule`.
    #[structopt(long = "add-rule", value_name = "RULE", number_of_values = 1)]
    pub add_rules: Vec<String>,

    /// Stylesheet text a page script swaps in with `replaceSync`, before
    /// inserting or adding rules.
    #[structopt(long = "replace-sheet-sync", value_name = "CSS")]
    pub replace_sheet_sync: Option<String>,

    /// Stylesheet text a page script swaps in with `replace`, after all
    /// other changes.
    #[structopt(long = "replace-sheet", value_name = "CSS")]
    pub replace_sheet: Option<String>,

    /// A font a page script sets on a canvas. Only logged.
    #[structopt(long = "canvas-font", value_name = "FONT")]
    pub canvas_font: Option<String>,
}

impl RewriteCommand {
    /// Whether a page script has anything to do.
    pub fn runs_script(&self) -> bool {
        !self.insert_rules.is_empty()
            || !self.add_rules.is_empty()
            || self.replace_sheet_sync.is_some()
            || self.replace_sheet.is_some()
            || self.canvas_font.is_some()
    }
}

#[derive(Debug, StructOpt)]
pub struct ClassifyCommand {
    /// A font-family list, like `"Courier New", monospace`.
    #[structopt(name = "FAMILY-LIST")]
    pub families: String,
}

fn parse_replacement(inp: &str) -> Result<(Category, String)> {
    let invalid = || Error::InvalidReplacement(inp.to_owned());
    let (category, font) = inp.split_once('=').ok_or_else(invalid)?;
    let category = serde_plain::from_str(category.trim()).map_err(|_| invalid())?;
    let font = font.trim();
    if font.is_empty() {
        return Err(invalid());
    }
    Ok((category, font.to_owned()))
}
