use tracing::debug;

use crate::preferences::{PreferencesRecord, Theme};

use super::{Document, COMPACT_MARKER, DARK_MARKER, LIGHT_MARKER, REDUCED_MOTION};

/// Smallest rendered base font size in pixels.
pub const MIN_FONT_SIZE: u16 = 12;

/// Largest rendered base font size in pixels.
pub const MAX_FONT_SIZE: u16 = 18;

/// Font size actually rendered. The stored preference keeps the raw value.
pub fn clamp_font_size(size: u16) -> u16 {
    size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
}

/// Reflect the visual subset of `prefs` on `doc`.
///
/// Idempotent: applying the same record twice leaves the document exactly as
/// applying it once.
pub fn apply_visual_preferences<D: Document + ?Sized>(doc: &mut D, prefs: &PreferencesRecord) {
    apply_theme(doc, prefs.theme);
    doc.set_font_size(clamp_font_size(prefs.font_size));

    if prefs.compact_mode {
        doc.add_marker(COMPACT_MARKER);
    } else {
        doc.remove_marker(COMPACT_MARKER);
    }

    REDUCED_MOTION.set(doc, !prefs.animations_enabled);

    debug!(
        theme = ?prefs.theme,
        font_size = prefs.font_size,
        compact = prefs.compact_mode,
        animations = prefs.animations_enabled,
        "Applied visual preferences"
    );
}

fn apply_theme<D: Document + ?Sized>(doc: &mut D, theme: Theme) {
    let dark = match theme {
        Theme::Light => false,
        Theme::Dark => true,
        Theme::System => doc.prefers_dark_scheme(),
    };

    doc.remove_marker(LIGHT_MARKER);
    doc.remove_marker(DARK_MARKER);
    doc.add_marker(if dark { DARK_MARKER } else { LIGHT_MARKER });
}
