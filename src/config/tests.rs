use std::fs;

use pretty_assertions::assert_eq;
use structopt::StructOpt;

use super::*;

const CONFIG: &str = r#"
mode = "js"
replace_unknown_fonts = true
url_whitelist = ["https://*.example.org/*"]
url_blacklist = ["https://ads.example.org/*"]

[font-options]
serif = "Georgia"
monospace = { enabled = false, name = "Fira Code" }
cursive = { enabled = true, name = "Comic Neue" }
"#;

#[test]
fn defaults() {
    let config = Config::default();
    assert_eq!(config.mode, Mode::Js);
    assert!(!config.replace_unknown_fonts);
    assert_eq!(config.url_whitelist.patterns(), &["*".to_owned()]);
    assert!(config.url_blacklist.patterns().is_empty());
    let options = &config.font_options;
    assert_eq!(options.replacement(Category::Serif), Some("Atkinson Hyperlegible Next"));
    assert_eq!(
        options.replacement(Category::Monospace),
        Some("Atkinson Hyperlegible Mono")
    );
    assert_eq!(options.replacement(Category::None), None);
}

#[test]
fn parses_both_option_layouts() {
    let config: Config = toml::from_str(CONFIG).unwrap();
    assert!(config.replace_unknown_fonts);
    let options = &config.font_options;
    assert_eq!(options.replacement(Category::Serif), Some("Georgia"));
    assert_eq!(options.replacement(Category::Monospace), None);
    assert_eq!(options.replacement(Category::Cursive), Some("Comic Neue"));
    // Missing options keep their default
    assert_eq!(
        options.replacement(Category::SansSerif),
        Some("Atkinson Hyperlegible Next")
    );
}

#[test]
fn empty_files_are_the_default_config() {
    let config: Config = toml::from_str("").unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn url_rules_use_whitelist_and_blacklist() {
    let config: Config = toml::from_str(CONFIG).unwrap();
    assert!(config.is_url_allowed("https://www.example.org/index.html"));
    assert!(!config.is_url_allowed("https://ads.example.org/banner"));
    assert!(!config.is_url_allowed("https://example.net/"));
    // Dots are literal
    assert!(!config.is_url_allowed("https://www.exampleXorg/"));
    assert!(Config::default().is_url_allowed("file:///index.html"));
}

#[test]
fn unknown_modes_are_rejected() {
    assert!(toml::from_str::<Config>(r#"mode = "magic""#).is_err());
    let config: Config = toml::from_str(r#"mode = "off""#).unwrap();
    assert_eq!(config.mode, Mode::Off);
}

#[test]
fn loads_toml_and_json_files() {
    let dir = tempfile::tempdir().unwrap();
    let toml_path = dir.path().join("config.toml");
    fs::write(&toml_path, CONFIG).unwrap();
    assert_eq!(
        Config::load(&toml_path).font_options.replacement(Category::Serif),
        Some("Georgia")
    );

    let json_path = dir.path().join("config.json");
    fs::write(
        &json_path,
        r#"{ "mode": "css", "font-options": { "fantasy": "Impact" } }"#,
    )
    .unwrap();
    let config = Config::load(&json_path);
    assert_eq!(config.mode, Mode::Css);
    assert_eq!(config.font_options.replacement(Category::Fantasy), Some("Impact"));
}

#[test]
fn broken_or_missing_files_fall_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(Config::load(dir.path().join("missing.toml")), Config::default());
    let broken = dir.path().join("broken.toml");
    fs::write(&broken, "url_whitelist = [\"(\"").unwrap();
    assert_eq!(Config::load(&broken), Config::default());
}

#[test]
fn arguments_override_the_file() {
    let args = Args::from_iter(&[
        "frankenfont",
        "--mode",
        "off",
        "-r",
        "monospace=Fira Code",
        "--replace",
        "none=Ignored",
        "config",
    ]);
    let config = Config::default().with_args(&args);
    assert_eq!(config.mode, Mode::Off);
    assert_eq!(
        config.font_options.replacement(Category::Monospace),
        Some("Fira Code")
    );
    assert_eq!(config.font_options.replacement(Category::None), None);
}

#[test]
fn rejects_malformed_replacements() {
    for &arg in &["monospace", "bogus=Font", "serif= "] {
        let res = Args::from_iter_safe(&["frankenfont", "--replace", arg, "config"]);
        assert!(res.is_err(), "{:?} should be rejected", arg);
    }
}
