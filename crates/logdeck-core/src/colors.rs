//! Identity colors.
//!
//! Usernames are folded into a stable `#rrggbb` color so the same person
//! renders the same way for the whole mounted session. This is a visual aid
//! only; collisions are fine.

use std::collections::BTreeMap;

/// Color returned for an empty identity.
pub const DEFAULT_IDENTITY_COLOR: &str = "#dedede";

/// Pure mapping from identity to color: a 32-bit shift-and-subtract hash over
/// UTF-16 code units, low three bytes rendered as hex.
#[must_use]
pub fn identity_color(identity: &str) -> String {
    if identity.is_empty() {
        return DEFAULT_IDENTITY_COLOR.to_string();
    }
    let mut hash: i32 = 0;
    for unit in identity.encode_utf16() {
        hash = i32::from(unit).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash));
    }
    let mut color = String::with_capacity(7);
    color.push('#');
    for shift in [0_u32, 8, 16] {
        let byte = (hash >> shift) & 0xff;
        color.push_str(&format!("{byte:02x}"));
    }
    color
}

/// Per-session memo of username colors. Entries are never evicted; the
/// table is bounded by distinct usernames, not by record count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsernameColorTable {
    colors: BTreeMap<String, String>,
}

impl UsernameColorTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Color for `identity`, computing and remembering it on first sight.
    /// Empty identities get the default color and are not stored.
    pub fn color_for(&mut self, identity: &str) -> String {
        if identity.is_empty() {
            return DEFAULT_IDENTITY_COLOR.to_string();
        }
        self.colors
            .entry(identity.to_string())
            .or_insert_with(|| identity_color(identity))
            .clone()
    }

    #[must_use]
    pub fn get(&self, identity: &str) -> Option<&str> {
        self.colors.get(identity).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.colors
            .iter()
            .map(|(name, color)| (name.as_str(), color.as_str()))
    }
}
