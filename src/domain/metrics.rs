// Metric catalog - static registry of metrics and grouping dimensions
//
// Raw metrics sum a backend column directly; derived metrics (ROAS, CTR) are
// recomputed from the sums of two raw metrics and never summed themselves.
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricFormat {
    Currency,
    Number,
    Roas,
    Percent,
}

#[derive(Debug, Clone)]
pub struct Metric {
    pub id: &'static str,
    pub label: &'static str,
    /// Default backend column; `None` for derived metrics.
    pub column: Option<&'static str>,
    pub format: MetricFormat,
}

impl Metric {
    pub fn is_derived(&self) -> bool {
        self.column.is_none()
    }

    /// `(numerator metric id, denominator metric id, scale)` for derived
    /// metrics. A zero denominator sum must yield 0, not NaN.
    pub fn derived_parts(&self) -> Option<(&'static str, &'static str, f64)> {
        match self.id {
            "roas" => Some(("revenue", "cost", 1.0)),
            "ctr" => Some(("clicks", "impr", 100.0)),
            _ => None,
        }
    }
}

pub static METRICS: [Metric; 10] = [
    Metric {
        id: "cost",
        label: "Ad Spend",
        column: Some("Cost (Channel)"),
        format: MetricFormat::Currency,
    },
    Metric {
        id: "revenue",
        label: "Revenue",
        column: Some("Revenue (App+Web)"),
        format: MetricFormat::Currency,
    },
    Metric {
        id: "roas",
        label: "ROAS",
        column: None,
        format: MetricFormat::Roas,
    },
    Metric {
        id: "installs",
        label: "Installs",
        column: Some("Installs (App)"),
        format: MetricFormat::Number,
    },
    Metric {
        id: "conv",
        label: "Purchases",
        column: Some("Conversions (App+Web)"),
        format: MetricFormat::Number,
    },
    Metric {
        id: "signup",
        label: "Signups",
        column: Some("Signups (App+Web)"),
        format: MetricFormat::Number,
    },
    Metric {
        id: "impr",
        label: "Impressions",
        column: Some("Impressions (Channel)"),
        format: MetricFormat::Number,
    },
    Metric {
        id: "clicks",
        label: "Clicks",
        column: Some("Clicks (Channel)"),
        format: MetricFormat::Number,
    },
    Metric {
        id: "ctr",
        label: "CTR",
        column: None,
        format: MetricFormat::Percent,
    },
    Metric {
        id: "cpc",
        label: "CPC",
        column: Some("CPC (Channel)"),
        format: MetricFormat::Currency,
    },
];

/// Grouping dimensions available to bar/donut/table widgets.
pub static GROUP_DIMENSIONS: [&str; 4] = ["Channel", "Campaign", "Ad Group", "Ad Creative"];

/// Column holding the event date (`YYYY-MM-DD...`).
pub const DATE_COLUMN: &str = "Event Date";

/// Metrics a fresh dashboard cycles through for its KPI slots.
pub static KPI_ROTATION: [&str; 8] = [
    "cost", "revenue", "roas", "installs", "conv", "signup", "impr", "clicks",
];

pub fn find(id: &str) -> Option<&'static Metric> {
    METRICS.iter().find(|m| m.id == id)
}

/// Display label for a metric id; unknown ids fall back to the id itself.
pub fn label(id: &str) -> &str {
    find(id).map(|m| m.label).unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_metrics_have_no_column() {
        for metric in &METRICS {
            assert_eq!(metric.is_derived(), metric.derived_parts().is_some());
        }
    }

    #[test]
    fn test_derived_parts_reference_raw_metrics() {
        for metric in &METRICS {
            if let Some((num, den, _)) = metric.derived_parts() {
                assert!(find(num).is_some_and(|m| !m.is_derived()));
                assert!(find(den).is_some_and(|m| !m.is_derived()));
            }
        }
    }

    #[test]
    fn test_kpi_rotation_entries_exist() {
        for id in &KPI_ROTATION {
            assert!(find(id).is_some());
        }
    }
}
