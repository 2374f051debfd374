// Dashboard engine - per-widget aggregation over raw rows
//
// Rows arrive already date-filtered; the engine resolves metric ids to
// backend columns through the leaf's data-source binding, sums raw metrics,
// and recomputes derived metrics from the relevant sums (never by summing a
// derived value, and never dividing by a zero denominator).
use crate::domain::binding::DataSourceBinding;
use crate::domain::metrics::{self, DATE_COLUMN};
use crate::domain::widget::Widget;
use crate::application::row_store::Row;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

pub const BAR_TOP_N: usize = 10;
pub const DONUT_TOP_N: usize = 6;
pub const TIMESERIES_MAX_DAYS: usize = 60;

/// Bucket name for rows missing the grouping dimension.
pub const NONE_BUCKET: &str = "(none)";

/// Numeric view of a cell; missing, null, and non-numeric cells count as 0.
fn cell_number(row: &Row, column: &str) -> f64 {
    match row.get(column) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Calendar day of a row, from the date column truncated to `YYYY-MM-DD`.
pub fn row_day(row: &Row) -> Option<NaiveDate> {
    let raw = row.get(DATE_COLUMN)?.as_str()?;
    NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()
}

fn group_name(row: &Row, dimension: &str) -> String {
    match row.get(dimension) {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => NONE_BUCKET.to_string(),
    }
}

/// Raw metric ids whose column sums are needed to produce `metric_ids`:
/// the raw metrics themselves plus the numerator/denominator of any derived
/// ones. Unknown ids need nothing and contribute zero.
fn raw_deps(metric_ids: &[String]) -> Vec<String> {
    let mut deps: Vec<String> = Vec::new();
    for id in metric_ids {
        let parts = match metrics::find(id) {
            Some(m) if m.is_derived() => match m.derived_parts() {
                Some((num, den, _)) => vec![num, den],
                None => vec![],
            },
            Some(m) => vec![m.id],
            None => vec![],
        };
        for part in parts {
            if !deps.iter().any(|d| d == part) {
                deps.push(part.to_string());
            }
        }
    }
    deps
}

/// Value of a metric given a way to read the underlying sums.
fn finalize(metric_id: &str, sum_of: impl Fn(&str) -> f64) -> f64 {
    match metrics::find(metric_id) {
        None => 0.0,
        Some(m) => match m.derived_parts() {
            Some((num, den, scale)) => {
                let denominator = sum_of(den);
                if denominator > 0.0 {
                    sum_of(num) / denominator * scale
                } else {
                    0.0
                }
            }
            None => sum_of(metric_id),
        },
    }
}

/// One group with metric values aligned to the requested metric ids.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRow {
    pub name: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grouped {
    pub metrics: Vec<String>,
    pub rows: Vec<GroupRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedValue {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayRow {
    pub day: NaiveDate,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySeries {
    pub metrics: Vec<String>,
    pub days: Vec<DayRow>,
}

/// Table sort state. Clicking the active column toggles direction; clicking
/// another column resets to descending on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSort {
    pub column: String,
    pub descending: bool,
}

impl TableSort {
    /// Initial sort: descending on the first configured metric.
    pub fn initial(metric_ids: &[String]) -> TableSort {
        TableSort {
            column: metric_ids.first().cloned().unwrap_or_default(),
            descending: true,
        }
    }

    pub fn toggled(&self, column: &str) -> TableSort {
        TableSort {
            column: column.to_string(),
            descending: if self.column == column {
                !self.descending
            } else {
                true
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView {
    pub dimension: String,
    pub metrics: Vec<String>,
    pub rows: Vec<GroupRow>,
    pub sort: TableSort,
}

/// Render-ready data for one widget, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WidgetData {
    Kpi {
        metric: String,
        label: String,
        value: f64,
    },
    Timeseries {
        title: String,
        series: DaySeries,
    },
    Bar {
        title: String,
        metric: String,
        groups: Vec<NamedValue>,
    },
    Donut {
        title: String,
        metric: String,
        groups: Vec<NamedValue>,
    },
    Table {
        title: String,
        table: TableView,
    },
}

pub struct DashboardEngine<'a> {
    binding: &'a DataSourceBinding,
}

impl<'a> DashboardEngine<'a> {
    pub fn new(binding: &'a DataSourceBinding) -> Self {
        Self { binding }
    }

    fn sum_metric(&self, rows: &[Row], metric_id: &str) -> f64 {
        match self.binding.column_for(metric_id) {
            Some(column) => rows.iter().map(|r| cell_number(r, column)).sum(),
            None => 0.0,
        }
    }

    /// KPI value: the sum over all rows, or the derived ratio of the global
    /// sums with a divide-by-zero guard.
    pub fn metric_value(&self, rows: &[Row], metric_id: &str) -> f64 {
        finalize(metric_id, |dep| self.sum_metric(rows, dep))
    }

    /// Group rows by a dimension column, preserving encounter order. Missing
    /// dimension values collect under the `(none)` bucket. Derived metrics
    /// are recomputed per group from that group's own sums.
    pub fn group_by(&self, rows: &[Row], dimension: &str, metric_ids: &[String]) -> Grouped {
        let deps = raw_deps(metric_ids);
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut names: Vec<String> = Vec::new();
        let mut sums: Vec<HashMap<String, f64>> = Vec::new();

        for row in rows {
            let name = group_name(row, dimension);
            let idx = match index.get(&name) {
                Some(idx) => *idx,
                None => {
                    index.insert(name.clone(), names.len());
                    names.push(name);
                    sums.push(HashMap::new());
                    names.len() - 1
                }
            };
            for dep in &deps {
                if let Some(column) = self.binding.column_for(dep) {
                    *sums[idx].entry(dep.clone()).or_insert(0.0) += cell_number(row, column);
                }
            }
        }

        let rows = names
            .into_iter()
            .zip(sums)
            .map(|(name, sums)| GroupRow {
                values: metric_ids
                    .iter()
                    .map(|id| finalize(id, |dep| sums.get(dep).copied().unwrap_or(0.0)))
                    .collect(),
                name,
            })
            .collect();

        Grouped {
            metrics: metric_ids.to_vec(),
            rows,
        }
    }

    /// Groups sorted descending by one metric and truncated to `limit`.
    /// Equal values keep their encounter order (stable sort).
    pub fn top_groups(
        &self,
        rows: &[Row],
        dimension: &str,
        metric_id: &str,
        limit: usize,
    ) -> Vec<NamedValue> {
        let grouped = self.group_by(rows, dimension, &[metric_id.to_string()]);
        let mut out: Vec<NamedValue> = grouped
            .rows
            .into_iter()
            .map(|g| NamedValue {
                name: g.name,
                value: g.values.first().copied().unwrap_or(0.0),
            })
            .collect();
        out.sort_by(|a, b| b.value.total_cmp(&a.value));
        out.truncate(limit);
        out
    }

    /// Per-day sums sorted ascending by day, capped to the most recent 60
    /// days. Rows without a parseable date are skipped.
    pub fn daily_series(&self, rows: &[Row], metric_ids: &[String]) -> DaySeries {
        let deps = raw_deps(metric_ids);
        let mut by_day: BTreeMap<NaiveDate, HashMap<String, f64>> = BTreeMap::new();

        for row in rows {
            let Some(day) = row_day(row) else { continue };
            let sums = by_day.entry(day).or_default();
            for dep in &deps {
                if let Some(column) = self.binding.column_for(dep) {
                    *sums.entry(dep.clone()).or_insert(0.0) += cell_number(row, column);
                }
            }
        }

        let mut days: Vec<DayRow> = by_day
            .into_iter()
            .map(|(day, sums)| DayRow {
                day,
                values: metric_ids
                    .iter()
                    .map(|id| finalize(id, |dep| sums.get(dep).copied().unwrap_or(0.0)))
                    .collect(),
            })
            .collect();
        if days.len() > TIMESERIES_MAX_DAYS {
            days.drain(..days.len() - TIMESERIES_MAX_DAYS);
        }

        DaySeries {
            metrics: metric_ids.to_vec(),
            days,
        }
    }

    /// Grouped table sorted per the sort state. The sort column is either the
    /// dimension (lexicographic) or one of the configured metrics; anything
    /// else leaves encounter order.
    pub fn table(
        &self,
        rows: &[Row],
        dimension: &str,
        metric_ids: &[String],
        sort: &TableSort,
    ) -> TableView {
        let mut out = self.group_by(rows, dimension, metric_ids).rows;

        if sort.column == dimension {
            out.sort_by(|a, b| {
                let ord = a.name.cmp(&b.name);
                if sort.descending { ord.reverse() } else { ord }
            });
        } else if let Some(idx) = metric_ids.iter().position(|m| *m == sort.column) {
            out.sort_by(|a, b| {
                let av = a.values.get(idx).copied().unwrap_or(0.0);
                let bv = b.values.get(idx).copied().unwrap_or(0.0);
                let ord = av.total_cmp(&bv);
                if sort.descending { ord.reverse() } else { ord }
            });
        }

        TableView {
            dimension: dimension.to_string(),
            metrics: metric_ids.to_vec(),
            rows: out,
            sort: sort.clone(),
        }
    }

    /// Render-ready data for one widget. The match is exhaustive over the
    /// closed widget set.
    pub fn widget_data(
        &self,
        rows: &[Row],
        widget: &Widget,
        table_sort: Option<&TableSort>,
    ) -> WidgetData {
        match widget {
            Widget::Kpi { metric, label } => {
                let label = if label.trim().is_empty() {
                    metrics::label(metric).to_string()
                } else {
                    label.clone()
                };
                WidgetData::Kpi {
                    metric: metric.clone(),
                    label,
                    value: self.metric_value(rows, metric),
                }
            }
            Widget::Timeseries { metrics, title } => WidgetData::Timeseries {
                title: title.clone(),
                series: self.daily_series(rows, metrics),
            },
            Widget::Bar {
                metric,
                group_by,
                title,
            } => WidgetData::Bar {
                title: title.clone(),
                metric: metric.clone(),
                groups: self.top_groups(rows, group_by, metric, BAR_TOP_N),
            },
            Widget::Donut {
                metric,
                group_by,
                title,
            } => WidgetData::Donut {
                title: title.clone(),
                metric: metric.clone(),
                groups: self.top_groups(rows, group_by, metric, DONUT_TOP_N),
            },
            Widget::Table {
                metrics,
                group_by,
                title,
            } => {
                let sort = table_sort
                    .cloned()
                    .unwrap_or_else(|| TableSort::initial(metrics));
                WidgetData::Table {
                    title: title.clone(),
                    table: self.table(rows, group_by, metrics, &sort),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(value: serde_json::Value) -> Vec<Row> {
        serde_json::from_value(value).unwrap()
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn engine(binding: &DataSourceBinding) -> DashboardEngine<'_> {
        DashboardEngine::new(binding)
    }

    #[test]
    fn test_grouped_sums_ordered_descending() {
        let binding = DataSourceBinding::default();
        let data = rows(json!([
            { "Cost (Channel)": 10, "Channel": "A" },
            { "Cost (Channel)": 20, "Channel": "A" },
            { "Cost (Channel)": 5,  "Channel": "B" }
        ]));

        let top = engine(&binding).top_groups(&data, "Channel", "cost", BAR_TOP_N);
        assert_eq!(
            top,
            vec![
                NamedValue { name: "A".to_string(), value: 30.0 },
                NamedValue { name: "B".to_string(), value: 5.0 },
            ]
        );
    }

    #[test]
    fn test_derived_metric_zero_guard() {
        let binding = DataSourceBinding::default();
        let data = rows(json!([
            { "Cost (Channel)": 0, "Revenue (App+Web)": 50, "Channel": "A" }
        ]));

        let eng = engine(&binding);
        assert_eq!(eng.metric_value(&data, "roas"), 0.0);

        let grouped = eng.group_by(&data, "Channel", &ids(&["roas"]));
        assert_eq!(grouped.rows[0].values, vec![0.0]);
    }

    #[test]
    fn test_derived_metric_recomputed_per_group() {
        let binding = DataSourceBinding::default();
        let data = rows(json!([
            { "Cost (Channel)": 10, "Revenue (App+Web)": 40, "Channel": "A" },
            { "Cost (Channel)": 10, "Revenue (App+Web)": 10, "Channel": "B" }
        ]));

        let grouped = engine(&binding).group_by(&data, "Channel", &ids(&["roas"]));
        // Per-group ratios, not the global 50/20.
        assert_eq!(grouped.rows[0].values, vec![4.0]);
        assert_eq!(grouped.rows[1].values, vec![1.0]);
    }

    #[test]
    fn test_ctr_scales_to_percent() {
        let binding = DataSourceBinding::default();
        let data = rows(json!([
            { "Impressions (Channel)": 200, "Clicks (Channel)": 3 }
        ]));
        assert_eq!(engine(&binding).metric_value(&data, "ctr"), 1.5);
    }

    #[test]
    fn test_unknown_metric_contributes_zero() {
        let binding = DataSourceBinding::default();
        let data = rows(json!([{ "Cost (Channel)": 10, "Channel": "A" }]));
        let eng = engine(&binding);

        assert_eq!(eng.metric_value(&data, "nope"), 0.0);
        let grouped = eng.group_by(&data, "Channel", &ids(&["cost", "nope"]));
        assert_eq!(grouped.rows[0].values, vec![10.0, 0.0]);
    }

    #[test]
    fn test_empty_rows_produce_empty_output() {
        let binding = DataSourceBinding::default();
        let eng = engine(&binding);
        assert_eq!(eng.metric_value(&[], "cost"), 0.0);
        assert!(eng.group_by(&[], "Channel", &ids(&["cost"])).rows.is_empty());
        assert!(eng.daily_series(&[], &ids(&["cost"])).days.is_empty());
    }

    #[test]
    fn test_missing_dimension_uses_none_bucket() {
        let binding = DataSourceBinding::default();
        let data = rows(json!([
            { "Cost (Channel)": 7 },
            { "Cost (Channel)": 3, "Channel": "" },
            { "Cost (Channel)": 5, "Channel": null }
        ]));

        let grouped = engine(&binding).group_by(&data, "Channel", &ids(&["cost"]));
        assert_eq!(grouped.rows.len(), 1);
        assert_eq!(grouped.rows[0].name, NONE_BUCKET);
        assert_eq!(grouped.rows[0].values, vec![15.0]);
    }

    #[test]
    fn test_equal_groups_keep_encounter_order() {
        let binding = DataSourceBinding::default();
        let data = rows(json!([
            { "Cost (Channel)": 5, "Channel": "zeta" },
            { "Cost (Channel)": 5, "Channel": "alpha" },
            { "Cost (Channel)": 9, "Channel": "mid" }
        ]));

        let top = engine(&binding).top_groups(&data, "Channel", "cost", 10);
        let names: Vec<&str> = top.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["mid", "zeta", "alpha"]);
    }

    #[test]
    fn test_bar_and_donut_truncation() {
        let binding = DataSourceBinding::default();
        let data: Vec<Row> = (0..15)
            .map(|i| {
                rows(json!([{ "Cost (Channel)": i, "Channel": format!("ch{i}") }])).remove(0)
            })
            .collect();
        let eng = engine(&binding);

        let bar = eng.widget_data(&data, &Widget::default_for(crate::domain::widget::WidgetKind::Bar), None);
        match bar {
            WidgetData::Bar { groups, .. } => assert_eq!(groups.len(), BAR_TOP_N),
            other => panic!("expected bar data, got {other:?}"),
        }

        let donut = eng.widget_data(&data, &Widget::default_for(crate::domain::widget::WidgetKind::Donut), None);
        match donut {
            WidgetData::Donut { groups, .. } => assert_eq!(groups.len(), DONUT_TOP_N),
            other => panic!("expected donut data, got {other:?}"),
        }
    }

    #[test]
    fn test_table_sort_toggle_semantics() {
        let sort = TableSort::initial(&ids(&["cost", "revenue"]));
        assert_eq!(sort.column, "cost");
        assert!(sort.descending);

        let toggled = sort.toggled("cost");
        assert!(!toggled.descending);
        let back = toggled.toggled("cost");
        assert!(back.descending);

        // A different column resets to descending.
        let other = toggled.toggled("revenue");
        assert_eq!(other.column, "revenue");
        assert!(other.descending);
    }

    #[test]
    fn test_table_sorts_by_metric_and_dimension() {
        let binding = DataSourceBinding::default();
        let data = rows(json!([
            { "Cost (Channel)": 5,  "Channel": "B" },
            { "Cost (Channel)": 20, "Channel": "C" },
            { "Cost (Channel)": 10, "Channel": "A" }
        ]));
        let eng = engine(&binding);
        let metrics = ids(&["cost"]);

        let desc = eng.table(&data, "Channel", &metrics, &TableSort::initial(&metrics));
        let names: Vec<&str> = desc.rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["C", "A", "B"]);

        let asc = eng.table(
            &data,
            "Channel",
            &metrics,
            &TableSort { column: "cost".to_string(), descending: false },
        );
        let names: Vec<&str> = asc.rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A", "C"]);

        let by_name = eng.table(
            &data,
            "Channel",
            &metrics,
            &TableSort { column: "Channel".to_string(), descending: false },
        );
        let names: Vec<&str> = by_name.rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_daily_series_ascending_and_capped() {
        let binding = DataSourceBinding::default();
        let mut data = Vec::new();
        // 70 days, appended newest-first to prove sorting.
        for i in (0..70u32).rev() {
            let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(i as u64);
            data.extend(rows(json!([
                { "Event Date": format!("{day}T09:00:00"), "Cost (Channel)": 1 }
            ])));
        }

        let series = engine(&binding).daily_series(&data, &ids(&["cost"]));
        assert_eq!(series.days.len(), TIMESERIES_MAX_DAYS);
        assert!(series.days.windows(2).all(|w| w[0].day < w[1].day));
        // The oldest 10 days fell off.
        assert_eq!(
            series.days[0].day,
            NaiveDate::from_ymd_opt(2024, 1, 11).unwrap()
        );
    }

    #[test]
    fn test_rows_without_dates_are_skipped() {
        let binding = DataSourceBinding::default();
        let data = rows(json!([
            { "Event Date": "2024-02-01", "Cost (Channel)": 3 },
            { "Cost (Channel)": 99 },
            { "Event Date": "bogus", "Cost (Channel)": 99 }
        ]));

        let series = engine(&binding).daily_series(&data, &ids(&["cost"]));
        assert_eq!(series.days.len(), 1);
        assert_eq!(series.days[0].values, vec![3.0]);
    }

    #[test]
    fn test_binding_remap_changes_summed_column() {
        let mut binding = DataSourceBinding::default();
        binding
            .field_map
            .insert("cost".to_string(), "spend_usd".to_string());
        let data = rows(json!([
            { "spend_usd": 12, "Cost (Channel)": 999, "Channel": "A" }
        ]));

        assert_eq!(engine(&binding).metric_value(&data, "cost"), 12.0);
    }

    #[test]
    fn test_string_cells_coerce_to_numbers() {
        let binding = DataSourceBinding::default();
        let data = rows(json!([
            { "Cost (Channel)": "10.5" },
            { "Cost (Channel)": " 2 " },
            { "Cost (Channel)": "n/a" },
            { "Cost (Channel)": null }
        ]));
        assert_eq!(engine(&binding).metric_value(&data, "cost"), 12.5);
    }

    #[test]
    fn test_kpi_label_falls_back_to_catalog() {
        let binding = DataSourceBinding::default();
        let widget = Widget::Kpi {
            metric: "revenue".to_string(),
            label: String::new(),
        };
        match engine(&binding).widget_data(&[], &widget, None) {
            WidgetData::Kpi { label, value, .. } => {
                assert_eq!(label, "Revenue");
                assert_eq!(value, 0.0);
            }
            other => panic!("expected kpi data, got {other:?}"),
        }
    }
}
