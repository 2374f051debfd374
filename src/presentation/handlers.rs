// HTTP request handlers
use crate::application::config_store::ConfigError;
use crate::application::date_range::{DateRange, DEFAULT_PRESET_DAYS};
use crate::application::engine::TableSort;
use crate::application::resolver::{self, Coordinate};
use crate::application::view::{build_leaf_view, LeafViewModel};
use crate::domain::binding::DataSourceBinding;
use crate::domain::dashboard::Dashboard;
use crate::domain::keys::SubKey;
use crate::domain::metrics::{self, MetricFormat};
use crate::domain::navigation;
use crate::domain::template;
use crate::domain::widget::WidgetKind;
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Configuration errors mapped onto HTTP statuses.
pub struct ApiError(ConfigError);

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ConfigError::NotFound(_) => StatusCode::NOT_FOUND,
            ConfigError::InvalidOperation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ConfigError::Persist(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("configuration persist failed: {:#}", self.0);
        }
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[derive(Deserialize)]
pub struct LabelBody {
    pub label: String,
}

#[derive(Deserialize)]
pub struct HiddenBody {
    pub hidden: bool,
}

#[derive(Serialize)]
pub struct CreatedBody {
    pub id: String,
}

#[derive(Deserialize)]
pub struct TabQuery {
    pub tab: Option<String>,
}

#[derive(Deserialize)]
pub struct ViewQuery {
    pub tab: Option<String>,
    /// Lookback preset in days; ignored when an explicit start/end is given.
    pub days: Option<u32>,
    pub start: Option<chrono::NaiveDate>,
    pub end: Option<chrono::NaiveDate>,
    pub sort_column: Option<String>,
    pub sort_descending: Option<bool>,
}

#[derive(Serialize)]
pub struct NavTab {
    pub id: String,
    pub label: String,
}

#[derive(Serialize)]
pub struct NavSub {
    pub id: String,
    pub label: String,
    pub custom: bool,
    pub tabs: Vec<NavTab>,
}

#[derive(Serialize)]
pub struct NavSection {
    pub key: String,
    pub label: String,
    pub subs: Vec<NavSub>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

#[derive(Serialize)]
pub struct MetricInfo {
    pub id: &'static str,
    pub label: &'static str,
    pub derived: bool,
    pub format: MetricFormat,
}

#[derive(Serialize)]
pub struct SlotInfo {
    pub id: &'static str,
    pub kind: WidgetKind,
    pub span: u8,
    pub row: u8,
}

#[derive(Serialize)]
pub struct TemplateInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub desc: &'static str,
    pub slots: Vec<SlotInfo>,
}

#[derive(Serialize)]
pub struct CatalogResponse {
    pub metrics: Vec<MetricInfo>,
    pub dimensions: Vec<&'static str>,
    pub templates: Vec<TemplateInfo>,
    pub date_presets: Vec<u32>,
}

/// Static catalogs the widget editor needs: metrics, grouping dimensions,
/// layout templates, and date presets.
pub async fn catalogs() -> Json<CatalogResponse> {
    Json(CatalogResponse {
        metrics: metrics::METRICS
            .iter()
            .map(|m| MetricInfo {
                id: m.id,
                label: m.label,
                derived: m.is_derived(),
                format: m.format,
            })
            .collect(),
        dimensions: metrics::GROUP_DIMENSIONS.to_vec(),
        templates: template::TEMPLATES
            .iter()
            .map(|t| TemplateInfo {
                id: t.id,
                name: t.name,
                desc: t.desc,
                slots: t
                    .slots
                    .iter()
                    .map(|s| SlotInfo {
                        id: s.id,
                        kind: s.default_kind,
                        span: s.span,
                        row: s.row,
                    })
                    .collect(),
            })
            .collect(),
        date_presets: crate::application::date_range::DATE_PRESETS.to_vec(),
    })
}

/// Full navigation tree: sections with effective labels, visible built-in
/// subs, custom subs, and L3 tabs.
pub async fn nav_tree(State(state): State<Arc<AppState>>) -> Json<Vec<NavSection>> {
    let store = state.store.lock().await;
    let root = store.root();

    let sections = navigation::SECTIONS
        .iter()
        .map(|section| {
            let mut subs = Vec::new();
            for sub in section.subs {
                if root.is_hidden(section.key, sub.id) {
                    continue;
                }
                let key = SubKey::new(section.key, sub.id);
                subs.push(NavSub {
                    id: sub.id.to_string(),
                    label: root.sub_label(&key, sub.label).to_string(),
                    custom: false,
                    tabs: tabs_for(root, &key),
                });
            }
            if let Some(custom) = root.custom_subs.get(section.key) {
                for sub in custom {
                    let key = SubKey::new(section.key, &sub.id);
                    subs.push(NavSub {
                        id: sub.id.clone(),
                        label: root.sub_label(&key, &sub.label).to_string(),
                        custom: true,
                        tabs: tabs_for(root, &key),
                    });
                }
            }
            NavSection {
                key: section.key.to_string(),
                label: root.section_label(section).to_string(),
                subs,
            }
        })
        .collect();

    Json(sections)
}

fn tabs_for(root: &crate::domain::config_root::ConfigRoot, key: &SubKey) -> Vec<NavTab> {
    root.l3_tabs(key)
        .iter()
        .map(|t| NavTab {
            id: t.id.clone(),
            label: t.label.clone(),
        })
        .collect()
}

/* ── labels and subs ───────────────────────────────────────── */

pub async fn set_section_label(
    Path(section): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<LabelBody>,
) -> Result<StatusCode, ApiError> {
    state.store.lock().await.set_section_label(&section, &body.label)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_sub_label(
    Path((section, sub)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<LabelBody>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .lock()
        .await
        .set_sub_label(&section, &sub, &body.label)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_custom_sub(
    Path(section): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<LabelBody>,
) -> Result<(StatusCode, Json<CreatedBody>), ApiError> {
    let id = state.store.lock().await.add_custom_sub(&section, &body.label)?;
    Ok((StatusCode::CREATED, Json(CreatedBody { id })))
}

pub async fn remove_custom_sub(
    Path((section, sub)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, ApiError> {
    state.store.lock().await.remove_custom_sub(&section, &sub)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_sub_hidden(
    Path((section, sub)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<HiddenBody>,
) -> Result<StatusCode, ApiError> {
    let mut store = state.store.lock().await;
    if body.hidden {
        store.hide_builtin_sub(&section, &sub)?;
    } else {
        store.show_builtin_sub(&section, &sub)?;
    }
    Ok(StatusCode::NO_CONTENT)
}

/* ── L3 tabs ───────────────────────────────────────────────── */

pub async fn add_l3_tab(
    Path((section, sub)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<LabelBody>,
) -> Result<(StatusCode, Json<CreatedBody>), ApiError> {
    let id = state
        .store
        .lock()
        .await
        .add_l3_tab(&section, &sub, &body.label)?;
    Ok((StatusCode::CREATED, Json(CreatedBody { id })))
}

pub async fn remove_l3_tab(
    Path((section, sub, tab)): Path<(String, String, String)>,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, ApiError> {
    state.store.lock().await.remove_l3_tab(&section, &sub, &tab)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn rename_l3_tab(
    Path((section, sub, tab)): Path<(String, String, String)>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<LabelBody>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .lock()
        .await
        .rename_l3_tab(&section, &sub, &tab, &body.label)?;
    Ok(StatusCode::NO_CONTENT)
}

/* ── dashboards and data sources ───────────────────────────── */

/// Stored dashboard at a leaf, or the default layout when nothing has been
/// saved there yet.
pub async fn get_dashboard(
    Path((section, sub)): Path<(String, String)>,
    Query(query): Query<TabQuery>,
    State(state): State<Arc<AppState>>,
) -> Json<Dashboard> {
    let store = state.store.lock().await;
    let leaf = leaf_key(&section, &sub, query.tab.as_deref());
    Json(store.dashboard_or_default(&leaf))
}

pub async fn save_dashboard(
    Path((section, sub)): Path<(String, String)>,
    Query(query): Query<TabQuery>,
    State(state): State<Arc<AppState>>,
    Json(dashboard): Json<Dashboard>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .lock()
        .await
        .save_dashboard(&section, &sub, query.tab.as_deref(), dashboard)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_data_source(
    Path((section, sub)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Json<DataSourceBinding> {
    let store = state.store.lock().await;
    Json(store.get_sub_data_source(&section, &sub).cloned().unwrap_or_default())
}

pub async fn set_data_source(
    Path((section, sub)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
    Json(binding): Json<DataSourceBinding>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .lock()
        .await
        .set_sub_data_source(&section, &sub, binding)?;
    Ok(StatusCode::NO_CONTENT)
}

/* ── leaf view ─────────────────────────────────────────────── */

#[derive(Serialize)]
pub struct LeafViewResponse {
    /// Resolved coordinate actually rendered; differs from the request when a
    /// redirect fired.
    pub section: String,
    pub sub: String,
    pub view: Option<LeafViewModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Render one leaf: resolve the coordinate, fetch and date-filter rows, and
/// aggregate every widget. A failed fetch keeps the last good view on screen
/// alongside the error message.
pub async fn leaf_view(
    Path((section, sub)): Path<(String, String)>,
    Query(query): Query<ViewQuery>,
    State(state): State<Arc<AppState>>,
) -> Json<LeafViewResponse> {
    let store = state.store.lock().await;
    let resolved = resolver::resolve(store.root(), &Coordinate::new(section, sub));

    let key = SubKey::new(&resolved.section, &resolved.sub);
    // A tab is honored only if it still exists under the resolved sub.
    let leaf = match query.tab.as_deref() {
        Some(tab) if store.root().l3_tab(&key, tab).is_some() => key.tab_leaf(tab),
        _ => key.leaf(),
    };

    let dashboard = store.dashboard_or_default(&leaf);
    let binding = store.effective_binding(&leaf);
    let table = binding.table_or_default().to_string();
    drop(store);

    let tag = state.session.lock().await.navigate(leaf.clone());

    let range = match (query.start, query.end) {
        (Some(start), Some(end)) if start <= end => DateRange { start, end },
        _ => DateRange::preset(
            query.days.unwrap_or(DEFAULT_PRESET_DAYS),
            chrono::Utc::now().date_naive(),
        ),
    };
    let sort = query.sort_column.map(|column| TableSort {
        column,
        descending: query.sort_descending.unwrap_or(true),
    });

    match state.rows.fetch_all(&table).await {
        Ok(rows) => {
            let rows = range.filter(rows);
            let view = build_leaf_view(&dashboard, &binding, &rows, leaf, sort.as_ref());
            let mut session = state.session.lock().await;
            let applied = session.complete(&tag, view.clone());
            Json(LeafViewResponse {
                section: resolved.section,
                sub: resolved.sub,
                view: applied.then_some(view),
                error: None,
            })
        }
        Err(err) => {
            tracing::warn!(table, "row fetch failed: {err:#}");
            let session = state.session.lock().await;
            Json(LeafViewResponse {
                section: resolved.section,
                sub: resolved.sub,
                view: session.last_good().cloned(),
                error: Some(err.to_string()),
            })
        }
    }
}

fn leaf_key(section: &str, sub: &str, tab: Option<&str>) -> crate::domain::keys::LeafKey {
    let key = SubKey::new(section, sub);
    match tab {
        Some(tab) => key.tab_leaf(tab),
        None => key.leaf(),
    }
}

/* ── auth ──────────────────────────────────────────────────── */

#[derive(Deserialize)]
pub struct MagicLinkBody {
    pub email: String,
}

pub async fn request_magic_link(
    State(state): State<Arc<AppState>>,
    Json(body): Json<MagicLinkBody>,
) -> Result<StatusCode, StatusCode> {
    state
        .auth
        .sign_in_with_magic_link(&body.email)
        .await
        .map_err(|err| {
            tracing::warn!("magic link request failed: {err:#}");
            StatusCode::BAD_GATEWAY
        })?;
    Ok(StatusCode::ACCEPTED)
}

#[derive(Deserialize)]
pub struct VerifyBody {
    pub email: String,
    pub token: String,
}

pub async fn verify_magic_link(
    State(state): State<Arc<AppState>>,
    Json(body): Json<VerifyBody>,
) -> Result<StatusCode, StatusCode> {
    state
        .auth
        .verify_token(&body.email, &body.token)
        .await
        .map_err(|err| {
            tracing::warn!("token verification failed: {err:#}");
            StatusCode::UNAUTHORIZED
        })?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn current_session(State(state): State<Arc<AppState>>) -> Response {
    match state.auth.current_session().await {
        Some(session) => Json(serde_json::json!({ "email": session.email })).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

pub async fn sign_out(State(state): State<Arc<AppState>>) -> Result<StatusCode, StatusCode> {
    state.auth.sign_out().await.map_err(|err| {
        tracing::warn!("sign out failed: {err:#}");
        StatusCode::BAD_GATEWAY
    })?;
    Ok(StatusCode::NO_CONTENT)
}
