// Template catalog - static registry of dashboard layout templates
//
// A template is a fixed set of slots; each slot declares the widget kind it
// falls back to when the dashboard has no entry for it.
use super::widget::WidgetKind;

/// Fixed position/size placeholder within a template. Spans are columns of a
/// four-column grid.
#[derive(Debug, Clone)]
pub struct Slot {
    pub id: &'static str,
    pub default_kind: WidgetKind,
    pub span: u8,
    pub row: u8,
}

#[derive(Debug, Clone)]
pub struct Template {
    pub id: &'static str,
    pub name: &'static str,
    pub desc: &'static str,
    pub slots: &'static [Slot],
}

pub const DEFAULT_TEMPLATE: &str = "A";

const fn slot(id: &'static str, default_kind: WidgetKind, span: u8, row: u8) -> Slot {
    Slot {
        id,
        default_kind,
        span,
        row,
    }
}

static TEMPLATE_A_SLOTS: [Slot; 7] = [
    slot("a1", WidgetKind::Kpi, 1, 0),
    slot("a2", WidgetKind::Kpi, 1, 0),
    slot("a3", WidgetKind::Kpi, 1, 0),
    slot("a4", WidgetKind::Kpi, 1, 0),
    slot("a5", WidgetKind::Timeseries, 4, 1),
    slot("a6", WidgetKind::Bar, 2, 2),
    slot("a7", WidgetKind::Table, 2, 2),
];

static TEMPLATE_B_SLOTS: [Slot; 6] = [
    slot("b1", WidgetKind::Kpi, 1, 0),
    slot("b2", WidgetKind::Kpi, 1, 0),
    slot("b3", WidgetKind::Kpi, 1, 0),
    slot("b4", WidgetKind::Donut, 1, 0),
    slot("b5", WidgetKind::Timeseries, 4, 1),
    slot("b6", WidgetKind::Bar, 4, 2),
];

static TEMPLATE_C_SLOTS: [Slot; 7] = [
    slot("c1", WidgetKind::Kpi, 1, 0),
    slot("c2", WidgetKind::Kpi, 1, 0),
    slot("c3", WidgetKind::Kpi, 1, 0),
    slot("c4", WidgetKind::Kpi, 1, 0),
    slot("c5", WidgetKind::Timeseries, 3, 1),
    slot("c6", WidgetKind::Donut, 1, 1),
    slot("c7", WidgetKind::Table, 4, 2),
];

static TEMPLATE_D_SLOTS: [Slot; 9] = [
    slot("d1", WidgetKind::Kpi, 1, 0),
    slot("d2", WidgetKind::Kpi, 1, 0),
    slot("d3", WidgetKind::Kpi, 1, 0),
    slot("d4", WidgetKind::Kpi, 1, 0),
    slot("d5", WidgetKind::Kpi, 1, 1),
    slot("d6", WidgetKind::Kpi, 1, 1),
    slot("d7", WidgetKind::Kpi, 1, 1),
    slot("d8", WidgetKind::Kpi, 1, 1),
    slot("d9", WidgetKind::Timeseries, 4, 2),
];

pub static TEMPLATES: [Template; 4] = [
    Template {
        id: "A",
        name: "Template A",
        desc: "4 KPIs, time series, bar chart + table",
        slots: &TEMPLATE_A_SLOTS,
    },
    Template {
        id: "B",
        name: "Template B",
        desc: "3 KPIs, donut, time series",
        slots: &TEMPLATE_B_SLOTS,
    },
    Template {
        id: "C",
        name: "Template C",
        desc: "4 KPIs, time series + donut, table",
        slots: &TEMPLATE_C_SLOTS,
    },
    Template {
        id: "D",
        name: "Template D",
        desc: "Minimal - 8 KPIs, time series",
        slots: &TEMPLATE_D_SLOTS,
    },
];

pub fn find(id: &str) -> Option<&'static Template> {
    TEMPLATES.iter().find(|t| t.id == id)
}

pub fn default_template() -> &'static Template {
    &TEMPLATES[0]
}
