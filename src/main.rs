//! # frankenfont
//!
//! Replace the fonts of web pages with fonts you can actually read, without
//! breaking the page.
//!
//! Every `font` and `font-family` declaration of a page is classified by
//! the first font of its fallback list that we know (`serif`, `sans-serif`,
//! `monospace`, ...). For each one an `!important` override is added that
//! puts the configured replacement in front of the original list, so icon
//! fonts and other special fonts keep working.
//!
//! ## Features
//!
//! - [X] Stylesheets present when the page loads.
//! - [X] `<style>` and `<link>` elements added later on.
//! - [X] Stylesheets from other origins, fetched in the background.
//! - [X] Rules added by page scripts via `insertRule`, `addRule`,
//!       `replace` and `replaceSync` (see the `--insert-rule`, `--add-rule`,
//!       `--replace-sheet` and `--replace-sheet-sync` options of `rewrite`).
//! - [X] Font shorthands and custom properties.
//! - [X] JSON Output
//!
//!
//! ## Usage
//!
//! See `frankenfont --help`.
//!
//! - `frankenfont rewrite style.css https://example.org/main.css` prints the
//!   overrides for a page using these stylesheets.
//! - `frankenfont classify '"Courier New", monospace'` prints the category
//!   of a font-family list and its replacement.
//! - `frankenfont config` prints the configuration in use.
//!
//!
//! ## Configuration
//!
//! Copy your `config.toml` to:
//! - `$XDG_CONFIG_DIR/frankenfont/config.toml` on **Linux**,
//! - `$HOME/Library/Application Support/frankenfont/config.toml` on **macOS**,
//! - `{FOLDERID_RoamingAppData}\frankenfont\config.toml` on **Windows**
//!
//! ```toml
//! url_whitelist = ["*"]
//! url_blacklist = ["https://fonts.example.org/*"]
//!
//! [font-options]
//! serif = "Atkinson Hyperlegible Next"
//! monospace = { enabled = true, name = "Atkinson Hyperlegible Mono" }
//! ```

use directories_next::ProjectDirs;
use lazy_static::lazy_static;
use serde::Serialize;
use structopt::StructOpt;
use tracing::{debug, error, warn};
use tracing_subscriber::EnvFilter;

use std::fs;

/// Colorizes the output.
///
/// This will colorize for Stdout based on heuristics and colors
/// from the [`owo_colors`] library.
macro_rules! color {
    ($when:expr, $what:expr; $($fn:ident),+) => {
        {
            use owo_colors::{OwoColorize, Stream};
            use crate::config::args::ColorWhen;
            match $when {
                ColorWhen::Always => {
                    $what $(. $fn())+ .to_string()
                }
                ColorWhen::Automatic => {
                    $what.if_supports_color(Stream::Stdout,
                                            |txt| txt $(. $fn().to_string())+).to_string()
                }
                ColorWhen::Never => {
                    $what.to_string()
                }
            }
        }
    };
}

mod background;
mod bridge;
mod config;
mod css;
mod dom;
mod error;
mod font;
mod pipeline;
mod request;
mod resolve;
mod synth;

use crate::{
    background::Background,
    bridge::Bridge,
    config::{
        args::{Args, ClassifyCommand, Command, RewriteCommand},
        Config,
    },
    css::SheetMutation,
    dom::{Canvas2d, CanvasFont, Element, Page, SheetId},
    error::{pass_debug, Error, Result, ResultExt},
    font::{family, Category, FamilyName},
    request::DefaultApi,
};

lazy_static! {
    static ref DIR: Option<ProjectDirs> = ProjectDirs::from("dev", "frankenfont", "frankenfont");
}

fn main() -> Result<()> {
    let res = real_main();
    match res {
        Ok(_) => {}
        Err(ref why) => error!("{}", why),
    }
    res
}

fn real_main() -> Result<()> {
    // Initialize logger, stdout is reserved for results
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
    let args = Args::from_args();
    let config = pass_debug(load_config(&args).with_args(&args));
    // Match over the user requested command
    match &args.command {
        Command::Rewrite(cmd) => rewrite(&config, &args, cmd),
        Command::Classify(cmd) => classify(&config, &args, cmd),
        Command::Config => print_json(&config),
    }
}

fn load_config(args: &Args) -> Config {
    let default_config_path = || Some(DIR.as_ref()?.config_dir().join("config.toml"));
    match args.config.clone().or_else(default_config_path) {
        Some(path) => Config::load(path),
        None => {
            warn!("Could not detect the configuration directory");
            Config::default()
        }
    }
}

/// Load the stylesheets into a page and print the overrides.
fn rewrite(config: &Config, args: &Args, cmd: &RewriteCommand) -> Result<()> {
    let mut page = Page::new(&cmd.url)?;
    let (remote, local): (Vec<&String>, Vec<&String>) = cmd
        .stylesheets
        .iter()
        .partition(|sheet| sheet.starts_with("http://") || sheet.starts_with("https://"));
    for path in local {
        let text = fs::read_to_string(path).map_err(|why| Error::Io(why, "reading a stylesheet"))?;
        let head = page.head();
        page.append_child(head, Element::new("style").with_text(text));
    }
    let background = Background::<DefaultApi>::create()?;
    let mut observer = match pipeline::activate(config, &mut page, &background) {
        Some(observer) => observer,
        None => return Ok(()),
    };
    for url in remote {
        let head = page.head();
        let link = Element::new("link")
            .with_attr("rel", "stylesheet")
            .with_attr("href", url);
        let link = page.append_child(head, link);
        observer.run_until_idle(&mut page);
        // The page loads its stylesheets itself, no origin restrictions apply here
        if let Some(text) = background.fetch_stylesheet(url).log_warn() {
            page.finish_load(link, &text).log_warn();
        }
        observer.run_until_idle(&mut page);
    }
    if cmd.runs_script() {
        let bridge = Bridge::install(&page);
        let body = page.body();
        let style = page.append_child(body, Element::new("style"));
        observer.run_until_idle(&mut page);
        if let Some(id) = page.element(style).sheet() {
            run_script(&bridge, &mut page, id, cmd);
        }
    }
    observer.run_until_idle(&mut page);
    debug!("Override sheet:\n{}", observer.overrides().to_css(&page));

    let rules = observer.overrides().rules();
    if args.json {
        print_json(&rules)
    } else {
        for rule in rules {
            let (replacement, original) = rule.fonts.split_at(1);
            println!(
                "{} {{ font-family: {}{}{} !important; }}",
                rule.selector,
                color!(args.color, family::to_css(replacement); bright_green, bold),
                if original.is_empty() { "" } else { ", " },
                family::to_css(original)
            );
        }
        Ok(())
    }
}

/// Play a page script changing the stylesheet `id` through the bridge.
fn run_script(bridge: &Bridge, page: &mut Page, id: SheetId, cmd: &RewriteCommand) {
    if let Some(font) = &cmd.canvas_font {
        let mut canvas = bridge.wrap_canvas(Canvas2d::default());
        canvas.set_font(font);
        debug!("Canvas font is now {:?}", canvas.font());
    }
    let mut sheet = bridge.wrap(page.script_sheet(id));
    if let Some(text) = &cmd.replace_sheet_sync {
        sheet.replace_sync(text).log_warn();
    }
    for rule in &cmd.insert_rules {
        let end = sheet.css_rules().map(<[_]>::len).unwrap_or_default();
        sheet.insert_rule(rule, Some(end)).log_warn();
    }
    for rule in &cmd.add_rules {
        split_rule(rule)
            .and_then(|(selector, style)| sheet.add_rule(selector, style, None))
            .log_warn();
    }
    if let Some(text) = &cmd.replace_sheet {
        sheet.replace(text, None).log_warn();
    }
}

/// Split `selector { style }` for `addRule`.
fn split_rule(rule: &str) -> Result<(&str, &str)> {
    let invalid = || Error::InvalidRule(rule.to_owned());
    let (selector, rest) = rule.split_once('{').ok_or_else(invalid)?;
    let style = rest.trim_end().strip_suffix('}').ok_or_else(invalid)?;
    Ok((selector.trim(), style.trim()))
}

#[derive(Debug, Serialize)]
struct Classification<'c> {
    fonts: Vec<FamilyName>,
    category: Category,
    replacement: Option<&'c str>,
}

fn classify(config: &Config, args: &Args, cmd: &ClassifyCommand) -> Result<()> {
    let fonts = family::parse(&cmd.families)?;
    let category = font::classify(&fonts);
    let replacement = config.font_options.replacement(category);
    if args.json {
        print_json(&Classification {
            fonts,
            category,
            replacement,
        })
    } else {
        let replacement = match replacement {
            Some(name) => color!(args.color, name; bright_green),
            None => color!(args.color, "none"; dimmed),
        };
        println!("{} -> {}", color!(args.color, category; bold), replacement);
        Ok(())
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let stdout = std::io::stdout();
    let output = stdout.lock();
    serde_json::to_writer_pretty(output, value)
        .map_err(|why| Error::Serializing(why, "writing results as json"))?;
    println!();
    Ok(())
}
