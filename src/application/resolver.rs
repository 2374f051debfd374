// Navigation resolver - maps a navigation coordinate to what should render
//
// Resolution is a pure read over the configuration root. The redirect is
// idempotent: resolving an already-valid coordinate returns it unchanged, so
// render loops are impossible.
use crate::domain::config_root::ConfigRoot;
use crate::domain::navigation;

/// Synthetic sub selected when a section has no visible built-in subs and no
/// custom subs.
pub const FALLBACK_SUB: &str = "dashboard";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Coordinate {
    pub section: String,
    pub sub: String,
}

impl Coordinate {
    pub fn new(section: impl Into<String>, sub: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            sub: sub.into(),
        }
    }
}

/// Resolve a coordinate against the current configuration.
///
/// A visible built-in sub or a custom sub is accepted as-is. A hidden or
/// unknown sub redirects to the first visible built-in sub of the section,
/// then to the first custom sub, then to the synthetic fallback. An unknown
/// section lands on the overview dashboard. Never fails.
pub fn resolve(root: &ConfigRoot, coord: &Coordinate) -> Coordinate {
    let Some(section) = navigation::section(&coord.section) else {
        return Coordinate::new("overview", FALLBACK_SUB);
    };

    if root.custom_sub(&coord.section, &coord.sub).is_some() {
        return coord.clone();
    }
    if section.builtin_sub(&coord.sub).is_some() && !root.is_hidden(&coord.section, &coord.sub) {
        return coord.clone();
    }

    if let Some(sub) = section
        .subs
        .iter()
        .find(|s| !root.is_hidden(section.key, s.id))
    {
        return Coordinate::new(section.key, sub.id);
    }
    if let Some(custom) = root.custom_subs.get(section.key).and_then(|subs| subs.first()) {
        return Coordinate::new(section.key, custom.id.clone());
    }
    Coordinate::new(section.key, FALLBACK_SUB)
}
