// Leaf view assembly - one dashboard rendered against filtered rows
use crate::application::engine::{DashboardEngine, TableSort, WidgetData};
use crate::application::row_store::Row;
use crate::domain::binding::DataSourceBinding;
use crate::domain::dashboard::Dashboard;
use crate::domain::keys::LeafKey;
use serde::Serialize;

/// One rendered slot: grid placement plus the widget's computed data.
#[derive(Debug, Clone, Serialize)]
pub struct SlotView {
    pub slot: String,
    pub span: u8,
    pub row: u8,
    pub data: WidgetData,
}

/// Everything the presentation layer needs to paint a leaf.
#[derive(Debug, Clone, Serialize)]
pub struct LeafViewModel {
    pub leaf: LeafKey,
    pub template: String,
    pub slots: Vec<SlotView>,
}

/// Aggregate every slot of a dashboard. Rows are assumed already filtered to
/// the active date range; `table_sort` applies to table widgets.
pub fn build_leaf_view(
    dashboard: &Dashboard,
    binding: &DataSourceBinding,
    rows: &[Row],
    leaf: LeafKey,
    table_sort: Option<&TableSort>,
) -> LeafViewModel {
    let engine = DashboardEngine::new(binding);
    let template = dashboard.layout();

    let slots = template
        .slots
        .iter()
        .map(|slot| {
            let widget = dashboard.widget_for(slot);
            SlotView {
                slot: slot.id.to_string(),
                span: slot.span,
                row: slot.row,
                data: engine.widget_data(rows, &widget, table_sort),
            }
        })
        .collect();

    LeafViewModel {
        leaf,
        template: template.id.to_string(),
        slots,
    }
}
