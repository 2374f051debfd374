// Data-source binding - per-sub override of backend table and column names
use super::metrics;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Canonical table when no binding overrides it.
pub const DEFAULT_TABLE: &str = "marketing_perf";

/// Where a leaf's rows come from: an optional backend table override and a
/// metric-id to backend-column remap. Empty entries fall back to the metric's
/// default column from the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSourceBinding {
    pub table: Option<String>,
    pub field_map: BTreeMap<String, String>,
}

impl DataSourceBinding {
    pub fn table_or_default(&self) -> &str {
        match &self.table {
            Some(table) if !table.trim().is_empty() => table,
            _ => DEFAULT_TABLE,
        }
    }

    /// Backend column for a raw metric. `None` for derived or unknown metric
    /// ids, which contribute zero during aggregation.
    pub fn column_for(&self, metric_id: &str) -> Option<&str> {
        if let Some(column) = self.field_map.get(metric_id) {
            let column = column.trim();
            if !column.is_empty() {
                return Some(column);
            }
        }
        metrics::find(metric_id).and_then(|m| m.column)
    }
}
