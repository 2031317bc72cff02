//! Vue single-file components.
//!
//! Only the top-level block structure matters here: `<template>`,
//! `<script>`, `<script setup>` and `<style>`. Script and style bodies are
//! raw text, so the splitter jumps straight to their closing tag instead
//! of looking for nested tags. Templates may nest `<template>` elements,
//! which are tracked by depth.

use crate::languages::SourceLanguage;
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::collections::BTreeMap;

static BLOCK_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<(/?)(template|script|style)\b([^>]*)>").expect("block tag pattern")
});

static SCRIPT_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</script\s*>").expect("script end pattern"));

static STYLE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</style\s*>").expect("style end pattern"));

static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z_:@#.\-]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>/]+)))?"#)
        .expect("attribute pattern")
});

/// One top-level block of a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SfcBlock {
    /// Attribute name -> value (empty for boolean attributes like `setup`).
    pub attrs: BTreeMap<String, String>,
    pub content: String,
}

impl SfcBlock {
    pub fn lang(&self) -> Option<&str> {
        self.attrs.get("lang").map(String::as_str)
    }
}

/// The blocks of a component, in the shape the analysis needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SfcDescriptor {
    pub template: Option<SfcBlock>,
    pub script: Option<SfcBlock>,
    pub script_setup: Option<SfcBlock>,
    pub styles: Vec<SfcBlock>,
}

impl SfcDescriptor {
    /// The `<script setup>` body if present, else the plain `<script>` body.
    pub fn script_content(&self) -> Option<&str> {
        self.script_setup
            .as_ref()
            .or(self.script.as_ref())
            .map(|block| block.content.as_str())
    }
}

/// Splits a component into its top-level blocks.
///
/// Unterminated script or style blocks end the scan; whatever was found
/// before them is kept.
pub fn parse_sfc(source: &str) -> SfcDescriptor {
    let mut descriptor = SfcDescriptor::default();
    let mut pos = 0;
    let mut template_depth = 0usize;
    let mut template_start = 0usize;
    let mut template_attrs = BTreeMap::new();

    while let Some(caps) = BLOCK_TAG.captures_at(source, pos) {
        let Some(whole) = caps.get(0) else { break };
        pos = whole.end();

        let closing = caps.get(1).map_or(false, |m| !m.as_str().is_empty());
        let name = caps
            .get(2)
            .map(|m| m.as_str().to_ascii_lowercase())
            .unwrap_or_default();
        let raw_attrs = caps.get(3).map_or("", |m| m.as_str());

        match (name.as_str(), closing) {
            ("template", false) => {
                if raw_attrs.trim_end().ends_with('/') {
                    continue;
                }
                if template_depth == 0 {
                    template_start = whole.end();
                    template_attrs = parse_attributes(raw_attrs);
                }
                template_depth += 1;
            }
            ("template", true) => {
                if template_depth == 0 {
                    continue;
                }
                template_depth -= 1;
                if template_depth == 0 && descriptor.template.is_none() {
                    descriptor.template = Some(SfcBlock {
                        attrs: std::mem::take(&mut template_attrs),
                        content: source[template_start..whole.start()].to_string(),
                    });
                }
            }
            ("script", false) | ("style", false) if template_depth == 0 => {
                let end_tag = if name == "script" { &SCRIPT_END } else { &STYLE_END };
                let Some(end) = end_tag.find_at(source, whole.end()) else {
                    break;
                };
                let block = SfcBlock {
                    attrs: parse_attributes(raw_attrs),
                    content: source[whole.end()..end.start()].to_string(),
                };
                pos = end.end();

                if name == "style" {
                    descriptor.styles.push(block);
                } else if block.attrs.contains_key("setup") {
                    descriptor.script_setup.get_or_insert(block);
                } else {
                    descriptor.script.get_or_insert(block);
                }
            }
            _ => {}
        }
    }

    descriptor
}

fn parse_attributes(raw: &str) -> BTreeMap<String, String> {
    ATTRIBUTE
        .captures_iter(raw)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str().to_string();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            Some((name, value))
        })
        .collect()
}

pub struct VueComponent;

impl SourceLanguage for VueComponent {
    fn name(&self) -> &'static str {
        "vue"
    }

    fn extensions(&self) -> &[&str] {
        &["vue"]
    }

    fn script_text<'a>(&self, source: &'a str) -> Option<Cow<'a, str>> {
        let descriptor = parse_sfc(source);
        descriptor
            .script_content()
            .filter(|content| !content.trim().is_empty())
            .map(|content| Cow::Owned(content.to_string()))
    }
}
