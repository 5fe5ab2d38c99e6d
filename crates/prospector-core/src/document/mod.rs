//! The presentation surface that visual preferences are applied to.
//!
//! In the browser this is the root element of the page. Here it is the
//! `Document` trait, so the preferences engine can drive any surface that can
//! hold markers, a base font size and identified style blocks.
//! `MemoryDocument` is the in-process implementation.

pub mod memory;
pub mod style;
pub mod visual;

pub use memory::MemoryDocument;
pub use style::{StyleOverride, REDUCED_MOTION};
pub use visual::{apply_visual_preferences, clamp_font_size, MAX_FONT_SIZE, MIN_FONT_SIZE};

/// Root marker for the light theme
pub const LIGHT_MARKER: &str = "light";
/// Root marker for the dark theme
pub const DARK_MARKER: &str = "dark";
/// Root marker for compact layout
pub const COMPACT_MARKER: &str = "compact";

pub trait Document {
    fn add_marker(&mut self, marker: &str);

    fn remove_marker(&mut self, marker: &str);

    fn has_marker(&self, marker: &str) -> bool;

    /// Base font size in pixels.
    fn set_font_size(&mut self, px: u16);

    fn font_size(&self) -> Option<u16>;

    /// Insert the style block with this id, or replace its contents.
    fn upsert_style(&mut self, id: &str, css: &str);

    /// Remove the style block with this id. Returns true if one existed.
    fn remove_style(&mut self, id: &str) -> bool;

    fn style(&self, id: &str) -> Option<&str>;

    /// The environment's color-scheme preference, consulted for `Theme::System`.
    fn prefers_dark_scheme(&self) -> bool;
}
