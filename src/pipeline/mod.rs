//! Finding font declarations on a page.
//!
//! The [`Observer`] looks at every stylesheet the page has or will get and
//! appends overrides for the font declarations it finds. Stylesheets it may
//! not read are fetched through the background instead.
use tracing::{debug, info, warn};

use crate::{
    background::{self, MessageChannel},
    bridge::{SerializedRule, CSS_RULES_EVENT},
    config::{Config, FontOptions, Mode},
    css::{CssRule, StyleSheet},
    dom::{NodeId, Page, PageEvent, SheetId},
    error::{Error, Result, ResultExt},
    font,
    resolve::{self, ComputedStyle, FontDeclarations},
    synth::{self, OverrideRule, OverrideSheet},
};


/// Start replacing fonts on `page`, if the configuration allows it.
pub fn activate<C: MessageChannel>(
    config: &Config,
    page: &mut Page,
    channel: C,
) -> Option<Observer<C>> {
    match config.mode {
        Mode::Js => {}
        Mode::Css => {
            warn!("Mode `css` is not implemented, not touching {}", page.url());
            return None;
        }
        Mode::Off => {
            info!("Disabled, not touching {}", page.url());
            return None;
        }
    }
    if !config.is_url_allowed(page.url().as_str()) {
        info!("Url {} is not allowed", page.url());
        debug!(
            "Whitelist: {:?}, blacklist: {:?}",
            config.url_whitelist.patterns(),
            config.url_blacklist.patterns()
        );
        return None;
    }
    if config.replace_unknown_fonts {
        info!("`replace_unknown_fonts` is set, but unknown fonts have no replacement");
    }
    info!("Replacing fonts on {}", page.url());
    let overrides = OverrideSheet::adopt(page);
    let bus = page.bus();
    bus.observe_mutations();
    bus.add_listener(CSS_RULES_EVENT);
    let mut observer = Observer {
        options: config.font_options.clone(),
        channel,
        overrides,
        watched_links: Vec::new(),
    };
    observer.handle_existing_sheets(page);
    Some(observer)
}

pub struct Observer<C> {
    options: FontOptions,
    channel: C,
    overrides: OverrideSheet,
    /// Links waiting for their stylesheet to load.
    watched_links: Vec<NodeId>,
}

impl<C: MessageChannel> Observer<C> {
    pub fn overrides(&self) -> &OverrideSheet {
        &self.overrides
    }

    #[cfg(test)]
    pub fn watched_links(&self) -> &[NodeId] {
        &self.watched_links
    }

    /// Handle events until the page has nothing left to report.
    pub fn run_until_idle(&mut self, page: &mut Page) {
        while let Some(event) = page.next_event() {
            self.handle_event(page, event);
        }
    }

    pub fn handle_event(&mut self, page: &mut Page, event: PageEvent) {
        debug!("Handling {:?}", event);
        match event {
            PageEvent::Mutation(nodes) => {
                for node in nodes {
                    self.on_node_inserted(page, node);
                }
            }
            PageEvent::Load(node) => {
                if let Some(pos) = self.watched_links.iter().position(|link| *link == node) {
                    self.watched_links.remove(pos);
                    self.on_link_load(page, node);
                }
            }
            PageEvent::MessageResponse { request, response } => {
                self.on_message_response(page, &request, &response)
            }
            PageEvent::Custom { name, detail } if name == CSS_RULES_EVENT => {
                self.on_bridge_event(page, detail)
            }
            PageEvent::Custom { .. } | PageEvent::ReplaceSettled { .. } => {}
        }
    }

    /// Process every stylesheet the page already has.
    fn handle_existing_sheets(&mut self, page: &mut Page) {
        let sheets = page.style_sheets().to_vec();
        debug!("Found {} existing stylesheet(s)", sheets.len());
        for id in sheets {
            if let Some(owner) = page.sheet(id).owner() {
                page.element_mut(owner).set_attr("crossorigin", "anonymous");
            }
            match self.process_sheet(page, id) {
                Ok(()) => {}
                Err(Error::Security(href)) => debug!("Skipping blocked stylesheet {}", href),
                Err(why) => warn!("Skipping stylesheet: {}", why),
            }
        }
    }

    fn on_node_inserted(&mut self, page: &mut Page, node: NodeId) {
        let element = page.element(node);
        if element.tag() == "style" {
            if let Some(id) = element.sheet() {
                self.process_sheet(page, id).log_warn();
            }
        } else if element.is_stylesheet_link() {
            debug!("Waiting for {:?} to load", element.attr("href"));
            self.watched_links.push(node);
        }
    }

    fn on_link_load(&mut self, page: &mut Page, node: NodeId) {
        let id = match page.element(node).sheet() {
            Some(id) => id,
            None => return,
        };
        match self.process_sheet(page, id) {
            Ok(()) => {}
            Err(Error::Security(href)) => {
                info!("Rules of {} are blocked, asking the background", href);
                let response = self.channel.send_message(&href);
                page.bus().push(PageEvent::MessageResponse {
                    request: href,
                    response,
                });
            }
            Err(why) => warn!("Skipping stylesheet: {}", why),
        }
    }

    fn on_message_response(&mut self, page: &mut Page, url: &str, payload: &str) {
        let text = match background::decode(url, payload) {
            Ok(text) => text,
            Err(why) => {
                warn!("{}", why);
                return;
            }
        };
        let sheet = StyleSheet::parse(&text);
        if let Some(rules) = sheet.css_rules().log_warn() {
            let found = self.collect(page, rules);
            self.append_all(page, found);
        }
    }

    fn on_bridge_event(&mut self, page: &mut Page, detail: serde_json::Value) {
        let records: Vec<SerializedRule> = match serde_json::from_value(detail)
            .map_err(|why| Error::Deserializing(why, "decoding relayed rules"))
            .log_warn()
        {
            Some(records) => records,
            None => return,
        };
        let style: &Page = page;
        let found = records
            .iter()
            .filter_map(|record| self.override_for(FontDeclarations::from(record), style))
            .collect();
        self.append_all(page, found);
    }

    fn process_sheet(&mut self, page: &mut Page, id: SheetId) -> Result<()> {
        let rules = page.sheet(id).css_rules()?;
        let found = self.collect(page, rules);
        self.append_all(page, found);
        Ok(())
    }

    /// Overrides for the top-level style rules among `rules`.
    fn collect(&self, page: &Page, rules: &[CssRule]) -> Vec<OverrideRule> {
        rules
            .iter()
            .filter_map(|rule| match rule {
                CssRule::Style(rule) => Some(rule),
                _ => None,
            })
            .filter_map(|rule| self.override_for(FontDeclarations::from(rule), page))
            .collect()
    }

    fn override_for<S: ComputedStyle + ?Sized>(
        &self,
        decls: FontDeclarations<'_>,
        style: &S,
    ) -> Option<OverrideRule> {
        if decls.is_empty() {
            return None;
        }
        let fonts = resolve::resolve(decls, style)?;
        let category = font::classify(&fonts);
        synth::synthesize(decls.selector, &fonts, category, &self.options)
    }

    fn append_all(&mut self, page: &mut Page, rules: Vec<OverrideRule>) {
        for rule in rules {
            self.overrides.append(page, rule).log_warn();
        }
    }
}
