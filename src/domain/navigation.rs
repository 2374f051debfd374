// Navigation catalog - build-time section/sub definitions
//
// Sections and their built-in subs are fixed; users can only relabel them or
// hide built-in subs. Custom subs and L3 tabs are user-owned records.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct SubDef {
    pub id: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone)]
pub struct Section {
    pub key: &'static str,
    pub label: &'static str,
    pub subs: &'static [SubDef],
}

impl Section {
    pub fn builtin_sub(&self, id: &str) -> Option<&'static SubDef> {
        self.subs.iter().find(|s| s.id == id)
    }
}

const fn sub(id: &'static str, label: &'static str) -> SubDef {
    SubDef { id, label }
}

pub static SECTIONS: [Section; 5] = [
    Section {
        key: "overview",
        label: "Overview",
        subs: &[sub("dashboard", "Dashboard")],
    },
    Section {
        key: "marketing",
        label: "Marketing",
        subs: &[
            sub("performance", "Performance"),
            sub("goals", "Goals"),
            sub("reports", "Reports"),
        ],
    },
    Section {
        key: "product",
        label: "Product",
        subs: &[
            sub("overview", "Overview"),
            sub("funnel", "Funnel"),
            sub("events", "Events"),
        ],
    },
    Section {
        key: "datastudio",
        label: "Data Studio",
        subs: &[
            sub("upload", "Upload"),
            sub("tables", "Tables"),
            sub("history", "History"),
        ],
    },
    Section {
        key: "settings",
        label: "Settings",
        subs: &[
            sub("general", "General"),
            sub("tabs", "Tabs"),
            sub("team", "Team"),
        ],
    },
];

pub fn section(key: &str) -> Option<&'static Section> {
    SECTIONS.iter().find(|s| s.key == key)
}

/// User-created L2 sub. Fully user-managed, unlike built-in subs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomSub {
    pub id: String,
    pub label: String,
}

/// Page-local tab under a sub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct L3Tab {
    pub id: String,
    pub label: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_lookup() {
        let marketing = section("marketing").unwrap();
        assert!(marketing.builtin_sub("performance").is_some());
        assert!(marketing.builtin_sub("cx_123").is_none());
        assert!(section("nope").is_none());
    }

    #[test]
    fn test_section_keys_unique() {
        let mut keys: Vec<_> = SECTIONS.iter().map(|s| s.key).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), SECTIONS.len());
    }
}
