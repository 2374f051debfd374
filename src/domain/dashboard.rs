// Dashboard model - widget layout bound to a navigable leaf
use super::binding::DataSourceBinding;
use super::metrics;
use super::template::{self, Slot, Template};
use super::widget::Widget;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub template: String,
    pub widgets: BTreeMap<String, Widget>,
    /// Per-dashboard data-source override; wins over the sub-level binding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<DataSourceBinding>,
}

impl Dashboard {
    /// Fresh dashboard for a template: every slot filled with its default
    /// widget, KPI slots cycling through the KPI rotation. Unknown template
    /// ids fall back to the system default.
    pub fn default_for(template_id: &str) -> Dashboard {
        let template = template::find(template_id).unwrap_or_else(template::default_template);
        let mut widgets = BTreeMap::new();
        let mut kpi_idx = 0usize;

        for slot in template.slots {
            let mut widget = Widget::default_for(slot.default_kind);
            if let Widget::Kpi { metric, label } = &mut widget {
                let id = metrics::KPI_ROTATION[kpi_idx % metrics::KPI_ROTATION.len()];
                *metric = id.to_string();
                *label = metrics::label(id).to_string();
                kpi_idx += 1;
            }
            widgets.insert(slot.id.to_string(), widget);
        }

        Dashboard {
            template: template.id.to_string(),
            widgets,
            data_source: None,
        }
    }

    /// The template this dashboard renders with. A stored id that no longer
    /// exists in the catalog falls back to the default template.
    pub fn layout(&self) -> &'static Template {
        template::find(&self.template).unwrap_or_else(template::default_template)
    }

    /// Widget occupying a slot, or the slot's declared default kind when the
    /// dashboard has no entry for it.
    pub fn widget_for(&self, slot: &Slot) -> Widget {
        self.widgets
            .get(slot.id)
            .cloned()
            .unwrap_or_else(|| Widget::default_for(slot.default_kind))
    }
}
