// Widget model - closed set of widget kinds with kind-specific configuration
//
// Dispatch happens through exhaustive matches on this enum, so adding a kind
// is a compile-time-checked change.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetKind {
    Kpi,
    Timeseries,
    Bar,
    Donut,
    Table,
}

/// A configured widget. The payload shape is tied to the kind, so an
/// incompatible configuration cannot be represented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Widget {
    Kpi {
        metric: String,
        /// Custom display label; empty means "use the metric's label".
        #[serde(default)]
        label: String,
    },
    Timeseries {
        metrics: Vec<String>,
        title: String,
    },
    Bar {
        metric: String,
        group_by: String,
        title: String,
    },
    Donut {
        metric: String,
        group_by: String,
        title: String,
    },
    Table {
        metrics: Vec<String>,
        group_by: String,
        title: String,
    },
}

impl Widget {
    pub fn kind(&self) -> WidgetKind {
        match self {
            Widget::Kpi { .. } => WidgetKind::Kpi,
            Widget::Timeseries { .. } => WidgetKind::Timeseries,
            Widget::Bar { .. } => WidgetKind::Bar,
            Widget::Donut { .. } => WidgetKind::Donut,
            Widget::Table { .. } => WidgetKind::Table,
        }
    }

    pub fn default_for(kind: WidgetKind) -> Widget {
        match kind {
            WidgetKind::Kpi => Widget::Kpi {
                metric: "cost".to_string(),
                label: String::new(),
            },
            WidgetKind::Timeseries => Widget::Timeseries {
                metrics: vec!["cost".to_string(), "revenue".to_string()],
                title: "Daily trend".to_string(),
            },
            WidgetKind::Bar => Widget::Bar {
                metric: "cost".to_string(),
                group_by: "Channel".to_string(),
                title: "Performance by channel".to_string(),
            },
            WidgetKind::Donut => Widget::Donut {
                metric: "cost".to_string(),
                group_by: "Channel".to_string(),
                title: "Share of total".to_string(),
            },
            WidgetKind::Table => Widget::Table {
                metrics: vec![
                    "cost".to_string(),
                    "installs".to_string(),
                    "conv".to_string(),
                    "revenue".to_string(),
                ],
                group_by: "Channel".to_string(),
                title: "Performance table".to_string(),
            },
        }
    }

    /// Changing kind discards the old payload and starts from the new kind's
    /// defaults; keeping the same kind keeps the configuration.
    pub fn switch_kind(&self, kind: WidgetKind) -> Widget {
        if self.kind() == kind {
            self.clone()
        } else {
            Widget::default_for(kind)
        }
    }
}
