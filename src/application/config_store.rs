// Config store - single source of truth for the mutable navigation tree
//
// Every mutation re-persists the whole root (last-write-wins); there is never
// more than one logical writer, so no finer-grained discipline is needed.
use crate::domain::binding::DataSourceBinding;
use crate::domain::config_root::ConfigRoot;
use crate::domain::dashboard::Dashboard;
use crate::domain::keys::{LeafKey, SubKey};
use crate::domain::navigation::{self, CustomSub, L3Tab, Section};
use crate::domain::template;
use std::sync::Arc;

/// Blob storage for the serialized configuration root, kept under a
/// versioned key. A trait so the store can be backed by a file or by memory
/// in tests.
pub trait ConfigStorage: Send + Sync {
    /// The stored blob, if any. Absent and unreadable both mean `None`.
    fn load(&self) -> Option<String>;
    fn save(&self, blob: &str) -> anyhow::Result<()>;
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown navigation target: {0}")]
    NotFound(String),
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    #[error("failed to persist configuration")]
    Persist(#[source] anyhow::Error),
}

pub struct ConfigStore {
    root: ConfigRoot,
    storage: Arc<dyn ConfigStorage>,
}

impl ConfigStore {
    /// Load the root from storage. Malformed blobs are treated as absent and
    /// replaced with defaults on the next persist.
    pub fn load(storage: Arc<dyn ConfigStorage>) -> Self {
        let root = storage
            .load()
            .and_then(|blob| match serde_json::from_str(&blob) {
                Ok(root) => Some(root),
                Err(e) => {
                    tracing::warn!("discarding malformed stored configuration: {e}");
                    None
                }
            })
            .unwrap_or_default();
        Self { root, storage }
    }

    pub fn root(&self) -> &ConfigRoot {
        &self.root
    }

    fn persist(&self) -> Result<(), ConfigError> {
        let blob = serde_json::to_string(&self.root)
            .map_err(|e| ConfigError::Persist(e.into()))?;
        self.storage.save(&blob).map_err(ConfigError::Persist)
    }

    fn require_section(&self, section: &str) -> Result<&'static Section, ConfigError> {
        navigation::section(section)
            .ok_or_else(|| ConfigError::NotFound(format!("section {section}")))
    }

    fn require_sub(&self, section: &str, sub: &str) -> Result<SubKey, ConfigError> {
        self.require_section(section)?;
        if self.root.sub_exists(section, sub) {
            Ok(SubKey::new(section, sub))
        } else {
            Err(ConfigError::NotFound(format!("sub {section}.{sub}")))
        }
    }

    /// Millisecond-stamped id (`cx_<millis>` / `t_<millis>`) with a bump
    /// loop to guarantee uniqueness within the prefix.
    fn fresh_id(prefix: &str, taken: impl Fn(&str) -> bool) -> String {
        let mut stamp = chrono::Utc::now().timestamp_millis();
        loop {
            let id = format!("{prefix}_{stamp}");
            if !taken(&id) {
                return id;
            }
            stamp += 1;
        }
    }

    /* ── labels ────────────────────────────────────────────── */

    /// Override a section's display label. An empty label after trimming is
    /// coerced to the previous value (no error).
    pub fn set_section_label(&mut self, section: &str, label: &str) -> Result<(), ConfigError> {
        self.require_section(section)?;
        let label = label.trim();
        if label.is_empty() {
            return Ok(());
        }
        self.root
            .section_labels
            .insert(section.to_string(), label.to_string());
        self.persist()
    }

    pub fn set_sub_label(
        &mut self,
        section: &str,
        sub: &str,
        label: &str,
    ) -> Result<(), ConfigError> {
        let key = self.require_sub(section, sub)?;
        let label = label.trim();
        if label.is_empty() {
            return Ok(());
        }
        self.root.sub_labels.insert(key, label.to_string());
        self.persist()
    }

    /* ── custom subs ───────────────────────────────────────── */

    /// Create a custom sub and return its id. No dashboard or L3 tab is
    /// materialized; the leaf resolves to a fresh default on first access.
    pub fn add_custom_sub(&mut self, section: &str, label: &str) -> Result<String, ConfigError> {
        self.require_section(section)?;
        let label = label.trim();
        if label.is_empty() {
            return Err(ConfigError::InvalidOperation(
                "custom sub label cannot be empty".to_string(),
            ));
        }

        let id = Self::fresh_id("cx", |id| self.root.sub_exists(section, id));
        self.root
            .custom_subs
            .entry(section.to_string())
            .or_default()
            .push(CustomSub {
                id: id.clone(),
                label: label.to_string(),
            });
        self.persist()?;
        Ok(id)
    }

    /// Delete a custom sub and everything keyed under it: L3 tabs, dashboards
    /// (sub-level and per-tab), the data-source binding, and the label
    /// override. Built-in subs can only be hidden.
    pub fn remove_custom_sub(&mut self, section: &str, sub: &str) -> Result<(), ConfigError> {
        let sec = self.require_section(section)?;
        if sec.builtin_sub(sub).is_some() {
            return Err(ConfigError::InvalidOperation(format!(
                "{section}.{sub} is built in; hide it instead of deleting"
            )));
        }
        if self.root.custom_sub(section, sub).is_none() {
            return Err(ConfigError::NotFound(format!("sub {section}.{sub}")));
        }

        let key = SubKey::new(section, sub);
        self.root.l3_tabs.remove(&key);
        self.root.dashboards.retain(|leaf, _| !leaf.belongs_to(&key));
        self.root.data_sources.remove(&key);
        self.root.sub_labels.remove(&key);
        if let Some(subs) = self.root.custom_subs.get_mut(section) {
            subs.retain(|s| s.id != sub);
            if subs.is_empty() {
                self.root.custom_subs.remove(section);
            }
        }
        self.persist()
    }

    /* ── built-in sub visibility ───────────────────────────── */

    /// Add a built-in sub to the hidden set. Idempotent; deletes nothing.
    pub fn hide_builtin_sub(&mut self, section: &str, sub: &str) -> Result<(), ConfigError> {
        self.require_builtin(section, sub)?;
        self.root
            .hidden_subs
            .entry(section.to_string())
            .or_default()
            .insert(sub.to_string());
        self.persist()
    }

    pub fn show_builtin_sub(&mut self, section: &str, sub: &str) -> Result<(), ConfigError> {
        self.require_builtin(section, sub)?;
        if let Some(hidden) = self.root.hidden_subs.get_mut(section) {
            hidden.remove(sub);
            if hidden.is_empty() {
                self.root.hidden_subs.remove(section);
            }
        }
        self.persist()
    }

    fn require_builtin(&self, section: &str, sub: &str) -> Result<(), ConfigError> {
        let sec = self.require_section(section)?;
        if sec.builtin_sub(sub).is_none() {
            return Err(ConfigError::NotFound(format!("built-in sub {section}.{sub}")));
        }
        Ok(())
    }

    /* ── L3 tabs ───────────────────────────────────────────── */

    /// Create an L3 tab with a fresh id and an initial default dashboard
    /// keyed to it. Returns the tab id.
    pub fn add_l3_tab(
        &mut self,
        section: &str,
        sub: &str,
        label: &str,
    ) -> Result<String, ConfigError> {
        let key = self.require_sub(section, sub)?;
        let label = label.trim();
        if label.is_empty() {
            return Err(ConfigError::InvalidOperation(
                "tab label cannot be empty".to_string(),
            ));
        }

        let id = Self::fresh_id("t", |id| self.root.l3_tab(&key, id).is_some());
        self.root
            .dashboards
            .insert(key.tab_leaf(&id), Dashboard::default_for(template::DEFAULT_TEMPLATE));
        self.root.l3_tabs.entry(key).or_default().push(L3Tab {
            id: id.clone(),
            label: label.to_string(),
        });
        self.persist()?;
        Ok(id)
    }

    /// Delete a tab and the dashboard keyed to it.
    pub fn remove_l3_tab(
        &mut self,
        section: &str,
        sub: &str,
        tab: &str,
    ) -> Result<(), ConfigError> {
        let key = self.require_sub(section, sub)?;
        if self.root.l3_tab(&key, tab).is_none() {
            return Err(ConfigError::NotFound(format!("tab {section}.{sub}.{tab}")));
        }

        self.root.dashboards.remove(&key.tab_leaf(tab));
        if let Some(tabs) = self.root.l3_tabs.get_mut(&key) {
            tabs.retain(|t| t.id != tab);
            if tabs.is_empty() {
                self.root.l3_tabs.remove(&key);
            }
        }
        self.persist()
    }

    /// Rename a tab; an empty label after trimming keeps the previous one.
    pub fn rename_l3_tab(
        &mut self,
        section: &str,
        sub: &str,
        tab: &str,
        label: &str,
    ) -> Result<(), ConfigError> {
        let key = self.require_sub(section, sub)?;
        let label = label.trim();
        let Some(tabs) = self.root.l3_tabs.get_mut(&key) else {
            return Err(ConfigError::NotFound(format!("tab {section}.{sub}.{tab}")));
        };
        let Some(entry) = tabs.iter_mut().find(|t| t.id == tab) else {
            return Err(ConfigError::NotFound(format!("tab {section}.{sub}.{tab}")));
        };
        if label.is_empty() {
            return Ok(());
        }
        entry.label = label.to_string();
        self.persist()
    }

    /* ── dashboards ────────────────────────────────────────── */

    /// Stored dashboard at an exact leaf key, or `None` when nothing has been
    /// saved there yet.
    pub fn get_dashboard(
        &self,
        section: &str,
        sub: &str,
        tab: Option<&str>,
    ) -> Option<&Dashboard> {
        let key = SubKey::new(section, sub);
        let leaf = match tab {
            Some(tab) => key.tab_leaf(tab),
            None => key.leaf(),
        };
        self.root.dashboards.get(&leaf)
    }

    /// Stored dashboard for a leaf, or a fresh default when none exists.
    pub fn dashboard_or_default(&self, leaf: &LeafKey) -> Dashboard {
        self.root
            .dashboards
            .get(leaf)
            .cloned()
            .unwrap_or_else(|| Dashboard::default_for(template::DEFAULT_TEMPLATE))
    }

    /// Upsert: full replace of the dashboard at that key.
    pub fn save_dashboard(
        &mut self,
        section: &str,
        sub: &str,
        tab: Option<&str>,
        dashboard: Dashboard,
    ) -> Result<(), ConfigError> {
        let key = self.require_sub(section, sub)?;
        let leaf = match tab {
            Some(tab) => {
                if self.root.l3_tab(&key, tab).is_none() {
                    return Err(ConfigError::NotFound(format!("tab {section}.{sub}.{tab}")));
                }
                key.tab_leaf(tab)
            }
            None => key.leaf(),
        };
        self.root.dashboards.insert(leaf, dashboard);
        self.persist()
    }

    /* ── data sources ──────────────────────────────────────── */

    pub fn set_sub_data_source(
        &mut self,
        section: &str,
        sub: &str,
        binding: DataSourceBinding,
    ) -> Result<(), ConfigError> {
        let key = self.require_sub(section, sub)?;
        self.root.data_sources.insert(key, binding);
        self.persist()
    }

    pub fn get_sub_data_source(&self, section: &str, sub: &str) -> Option<&DataSourceBinding> {
        self.root.data_sources.get(&SubKey::new(section, sub))
    }

    /// Binding that applies when fetching rows for a leaf: the dashboard's
    /// own override if present, else the sub-level binding, else defaults.
    pub fn effective_binding(&self, leaf: &LeafKey) -> DataSourceBinding {
        if let Some(dashboard) = self.root.dashboards.get(leaf) {
            if let Some(binding) = &dashboard.data_source {
                return binding.clone();
            }
        }
        self.root
            .data_sources
            .get(&leaf.sub_key())
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// In-memory stand-in for the versioned blob store; counts saves so tests
    /// can assert that every mutation persisted the full root.
    #[derive(Default)]
    struct MemoryStorage {
        blob: Mutex<Option<String>>,
        saves: Mutex<usize>,
    }

    impl ConfigStorage for MemoryStorage {
        fn load(&self) -> Option<String> {
            self.blob.lock().unwrap().clone()
        }

        fn save(&self, blob: &str) -> anyhow::Result<()> {
            *self.blob.lock().unwrap() = Some(blob.to_string());
            *self.saves.lock().unwrap() += 1;
            Ok(())
        }
    }

    fn store() -> (ConfigStore, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::default());
        (ConfigStore::load(storage.clone()), storage)
    }

    #[test]
    fn test_malformed_blob_yields_defaults() {
        let storage = Arc::new(MemoryStorage::default());
        *storage.blob.lock().unwrap() = Some("{not json".to_string());
        let store = ConfigStore::load(storage);
        assert_eq!(store.root(), &ConfigRoot::default());
    }

    #[test]
    fn test_section_label_override_and_coercion() {
        let (mut store, storage) = store();
        store.set_section_label("marketing", "Growth").unwrap();
        assert_eq!(
            store.root().section_labels.get("marketing").map(String::as_str),
            Some("Growth")
        );

        // Empty after trim keeps the previous value rather than erroring.
        store.set_section_label("marketing", "   ").unwrap();
        assert_eq!(
            store.root().section_labels.get("marketing").map(String::as_str),
            Some("Growth")
        );

        assert!(matches!(
            store.set_section_label("nope", "X"),
            Err(ConfigError::NotFound(_))
        ));
        assert_eq!(*storage.saves.lock().unwrap(), 1);
    }

    #[test]
    fn test_add_custom_sub_creates_no_dashboard() {
        let (mut store, _) = store();
        let id = store.add_custom_sub("marketing", "My view").unwrap();
        assert!(id.starts_with("cx_"));
        assert!(store.root().custom_sub("marketing", &id).is_some());
        assert!(store.get_dashboard("marketing", &id, None).is_none());

        // The leaf still resolves to a fresh default on first access.
        let leaf = SubKey::new("marketing", id).leaf();
        let dashboard = store.dashboard_or_default(&leaf);
        assert_eq!(dashboard.template, template::DEFAULT_TEMPLATE);
    }

    #[test]
    fn test_fresh_ids_are_unique() {
        let (mut store, _) = store();
        let a = store.add_custom_sub("marketing", "One").unwrap();
        let b = store.add_custom_sub("marketing", "Two").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_remove_custom_sub_cascades_completely() {
        let (mut store, _) = store();
        let sub = store.add_custom_sub("marketing", "Mine").unwrap();
        let t1 = store.add_l3_tab("marketing", &sub, "Tab 1").unwrap();
        let t2 = store.add_l3_tab("marketing", &sub, "Tab 2").unwrap();
        store
            .save_dashboard("marketing", &sub, None, Dashboard::default_for("B"))
            .unwrap();
        store
            .set_sub_data_source("marketing", &sub, DataSourceBinding::default())
            .unwrap();
        store.set_sub_label("marketing", &sub, "Renamed").unwrap();
        assert!(store.get_dashboard("marketing", &sub, Some(&t1)).is_some());
        assert!(store.get_dashboard("marketing", &sub, Some(&t2)).is_some());

        store.remove_custom_sub("marketing", &sub).unwrap();

        let key = SubKey::new("marketing", sub.clone());
        let root = store.root();
        assert!(root.custom_sub("marketing", &sub).is_none());
        assert!(root.l3_tabs(&key).is_empty());
        assert!(root.dashboards.keys().all(|leaf| !leaf.belongs_to(&key)));
        assert!(root.data_sources.get(&key).is_none());
        assert!(root.sub_labels.get(&key).is_none());
    }

    #[test]
    fn test_remove_builtin_sub_is_invalid() {
        let (mut store, _) = store();
        assert!(matches!(
            store.remove_custom_sub("marketing", "performance"),
            Err(ConfigError::InvalidOperation(_))
        ));
        assert!(matches!(
            store.remove_custom_sub("marketing", "cx_404"),
            Err(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn test_hide_show_round_trip_loses_nothing() {
        let (mut store, _) = store();
        store.set_sub_label("marketing", "goals", "Targets").unwrap();
        store
            .save_dashboard("marketing", "goals", None, Dashboard::default_for("C"))
            .unwrap();

        store.hide_builtin_sub("marketing", "goals").unwrap();
        store.hide_builtin_sub("marketing", "goals").unwrap(); // idempotent
        assert!(store.root().is_hidden("marketing", "goals"));

        store.show_builtin_sub("marketing", "goals").unwrap();
        store.show_builtin_sub("marketing", "goals").unwrap(); // idempotent
        assert!(!store.root().is_hidden("marketing", "goals"));

        assert_eq!(
            store.root().sub_labels.get(&SubKey::new("marketing", "goals")).map(String::as_str),
            Some("Targets")
        );
        assert_eq!(
            store.get_dashboard("marketing", "goals", None).map(|d| d.template.as_str()),
            Some("C")
        );
    }

    #[test]
    fn test_hide_requires_builtin_sub() {
        let (mut store, _) = store();
        let custom = store.add_custom_sub("marketing", "Mine").unwrap();
        assert!(matches!(
            store.hide_builtin_sub("marketing", &custom),
            Err(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn test_add_l3_tab_materializes_default_dashboard() {
        let (mut store, _) = store();
        let tab = store.add_l3_tab("marketing", "performance", "Q1").unwrap();
        assert!(tab.starts_with("t_"));

        let dashboard = store
            .get_dashboard("marketing", "performance", Some(&tab))
            .expect("tab dashboard");
        assert_eq!(dashboard.template, template::DEFAULT_TEMPLATE);
        assert_eq!(
            dashboard.widgets.len(),
            template::default_template().slots.len()
        );
    }

    #[test]
    fn test_remove_l3_tab_cascades_its_dashboard() {
        let (mut store, _) = store();
        let tab = store.add_l3_tab("marketing", "performance", "Q1").unwrap();
        store.remove_l3_tab("marketing", "performance", &tab).unwrap();

        let key = SubKey::new("marketing", "performance");
        assert!(store.root().l3_tabs(&key).is_empty());
        assert!(store.get_dashboard("marketing", "performance", Some(&tab)).is_none());

        assert!(matches!(
            store.remove_l3_tab("marketing", "performance", &tab),
            Err(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn test_rename_l3_tab_coerces_empty_label() {
        let (mut store, _) = store();
        let tab = store.add_l3_tab("marketing", "performance", "Q1").unwrap();
        let key = SubKey::new("marketing", "performance");

        store.rename_l3_tab("marketing", "performance", &tab, "Q2").unwrap();
        assert_eq!(store.root().l3_tab(&key, &tab).unwrap().label, "Q2");

        store.rename_l3_tab("marketing", "performance", &tab, "  ").unwrap();
        assert_eq!(store.root().l3_tab(&key, &tab).unwrap().label, "Q2");
    }

    #[test]
    fn test_save_dashboard_requires_existing_tab() {
        let (mut store, _) = store();
        assert!(matches!(
            store.save_dashboard("marketing", "performance", Some("t_404"), Dashboard::default_for("A")),
            Err(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn test_effective_binding_precedence() {
        let (mut store, _) = store();
        let leaf = SubKey::new("marketing", "performance").leaf();

        // No binding anywhere: defaults.
        assert_eq!(store.effective_binding(&leaf), DataSourceBinding::default());

        // Sub-level binding applies.
        let sub_binding = DataSourceBinding {
            table: Some("uploads".to_string()),
            ..Default::default()
        };
        store
            .set_sub_data_source("marketing", "performance", sub_binding.clone())
            .unwrap();
        assert_eq!(store.effective_binding(&leaf), sub_binding);

        // Dashboard-level override wins.
        let mut dashboard = Dashboard::default_for("A");
        dashboard.data_source = Some(DataSourceBinding {
            table: Some("special".to_string()),
            ..Default::default()
        });
        store
            .save_dashboard("marketing", "performance", None, dashboard)
            .unwrap();
        assert_eq!(
            store.effective_binding(&leaf).table_or_default(),
            "special"
        );
    }

    #[test]
    fn test_every_mutation_persists_and_reloads() {
        let (mut store, storage) = store();
        store.set_section_label("product", "Build").unwrap();
        let sub = store.add_custom_sub("product", "Experiments").unwrap();
        let tab = store.add_l3_tab("product", &sub, "A/B").unwrap();
        assert_eq!(*storage.saves.lock().unwrap(), 3);

        // A second store over the same storage sees the same tree.
        let reloaded = ConfigStore::load(storage);
        assert_eq!(reloaded.root(), store.root());
        assert!(reloaded.get_dashboard("product", &sub, Some(&tab)).is_some());
    }
}
