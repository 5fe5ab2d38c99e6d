use std::collections::{BTreeMap, BTreeSet};

use super::Document;

/// In-memory document. Ordered collections keep equality and output stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryDocument {
    markers: BTreeSet<String>,
    font_size: Option<u16>,
    styles: BTreeMap<String, String>,
    prefers_dark: bool,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// A document whose environment asks for a dark color scheme.
    pub fn with_dark_scheme(prefers_dark: bool) -> Self {
        Self {
            prefers_dark,
            ..Self::default()
        }
    }

    pub fn set_prefers_dark_scheme(&mut self, prefers_dark: bool) {
        self.prefers_dark = prefers_dark;
    }

    pub fn markers(&self) -> impl Iterator<Item = &str> {
        self.markers.iter().map(String::as_str)
    }

    pub fn style_ids(&self) -> impl Iterator<Item = &str> {
        self.styles.keys().map(String::as_str)
    }

    pub fn style_count(&self) -> usize {
        self.styles.len()
    }
}

impl Document for MemoryDocument {
    fn add_marker(&mut self, marker: &str) {
        self.markers.insert(marker.to_string());
    }

    fn remove_marker(&mut self, marker: &str) {
        self.markers.remove(marker);
    }

    fn has_marker(&self, marker: &str) -> bool {
        self.markers.contains(marker)
    }

    fn set_font_size(&mut self, px: u16) {
        self.font_size = Some(px);
    }

    fn font_size(&self) -> Option<u16> {
        self.font_size
    }

    fn upsert_style(&mut self, id: &str, css: &str) {
        self.styles.insert(id.to_string(), css.to_string());
    }

    fn remove_style(&mut self, id: &str) -> bool {
        self.styles.remove(id).is_some()
    }

    fn style(&self, id: &str) -> Option<&str> {
        self.styles.get(id).map(String::as_str)
    }

    fn prefers_dark_scheme(&self) -> bool {
        self.prefers_dark
    }
}
