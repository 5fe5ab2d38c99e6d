use super::Document;

/// A global style block owned by a single stable id.
///
/// Acquiring writes the block and its root marker; acquiring again rewrites
/// the same block rather than adding another. Releasing removes both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleOverride {
    pub id: &'static str,
    pub marker: &'static str,
    pub css: &'static str,
}

/// Zeroes every animation and transition in the document.
pub const REDUCED_MOTION: StyleOverride = StyleOverride {
    id: "disable-animations",
    marker: "reduce-motion",
    css: "*, *::before, *::after {\n  \
          animation-duration: 0s !important;\n  \
          animation-delay: 0s !important;\n  \
          transition-duration: 0s !important;\n  \
          transition-delay: 0s !important;\n}",
};

impl StyleOverride {
    pub fn acquire<D: Document + ?Sized>(&self, doc: &mut D) {
        doc.upsert_style(self.id, self.css);
        doc.add_marker(self.marker);
    }

    pub fn release<D: Document + ?Sized>(&self, doc: &mut D) {
        doc.remove_style(self.id);
        doc.remove_marker(self.marker);
    }

    pub fn is_active<D: Document + ?Sized>(&self, doc: &D) -> bool {
        doc.style(self.id).is_some()
    }

    /// Acquire or release depending on `active`.
    pub fn set<D: Document + ?Sized>(&self, doc: &mut D, active: bool) {
        if active {
            self.acquire(doc);
        } else {
            self.release(doc);
        }
    }
}
