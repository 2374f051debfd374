// Configuration root - the persisted navigation/dashboard tree
//
// Sole owner of all user-mutable navigation state. Mutated only through the
// ConfigStore, which re-persists the whole root after every change.
use super::binding::DataSourceBinding;
use super::dashboard::Dashboard;
use super::keys::{LeafKey, SubKey};
use super::navigation::{self, CustomSub, L3Tab};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigRoot {
    /// Display label overrides for sections, keyed by section key.
    pub section_labels: BTreeMap<String, String>,
    /// Display label overrides for built-in and custom subs.
    pub sub_labels: BTreeMap<SubKey, String>,
    /// Hidden built-in subs per section. Hiding never deletes data.
    pub hidden_subs: BTreeMap<String, BTreeSet<String>>,
    /// User-created subs per section, in creation order.
    pub custom_subs: BTreeMap<String, Vec<CustomSub>>,
    /// L3 tabs per sub, in creation order.
    pub l3_tabs: BTreeMap<SubKey, Vec<L3Tab>>,
    pub dashboards: BTreeMap<LeafKey, Dashboard>,
    pub data_sources: BTreeMap<SubKey, DataSourceBinding>,
}

impl ConfigRoot {
    pub fn custom_sub(&self, section: &str, sub: &str) -> Option<&CustomSub> {
        self.custom_subs
            .get(section)
            .and_then(|subs| subs.iter().find(|s| s.id == sub))
    }

    /// Whether `sub` names an existing sub of `section`, built-in or custom.
    /// Hidden built-in subs still exist.
    pub fn sub_exists(&self, section: &str, sub: &str) -> bool {
        navigation::section(section)
            .is_some_and(|s| s.builtin_sub(sub).is_some())
            || self.custom_sub(section, sub).is_some()
    }

    pub fn is_hidden(&self, section: &str, sub: &str) -> bool {
        self.hidden_subs
            .get(section)
            .is_some_and(|hidden| hidden.contains(sub))
    }

    pub fn l3_tabs(&self, key: &SubKey) -> &[L3Tab] {
        self.l3_tabs.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn l3_tab(&self, key: &SubKey, tab: &str) -> Option<&L3Tab> {
        self.l3_tabs(key).iter().find(|t| t.id == tab)
    }

    /// Effective display label for a section.
    pub fn section_label(&self, section: &navigation::Section) -> &str {
        self.section_labels
            .get(section.key)
            .map(String::as_str)
            .unwrap_or(section.label)
    }

    /// Effective display label for a sub; `default` is the build-time or
    /// creation-time label.
    pub fn sub_label<'a>(&'a self, key: &SubKey, default: &'a str) -> &'a str {
        self.sub_labels.get(key).map(String::as_str).unwrap_or(default)
    }
}
