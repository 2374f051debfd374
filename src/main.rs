// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use axum::{
    routing::{get, post, put},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;

use crate::application::config_store::ConfigStore;
use crate::application::session::NavigationSession;
use crate::infrastructure::file_storage::FileConfigStorage;
use crate::infrastructure::settings::load_backend_config;
use crate::infrastructure::supabase_auth::SupabaseAuth;
use crate::infrastructure::supabase_rows::SupabaseRowStore;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    add_custom_sub, add_l3_tab, catalogs, current_session, get_dashboard, get_data_source,
    health_check, leaf_view, nav_tree, remove_custom_sub, remove_l3_tab, rename_l3_tab,
    request_magic_link, save_dashboard, set_data_source, set_section_label, set_sub_hidden,
    set_sub_label, sign_out, verify_magic_link,
};
use tokio::sync::Mutex;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = load_backend_config()?;

    // Infrastructure layer
    let storage = Arc::new(FileConfigStorage::new(&config.storage.dir));
    let rows = Arc::new(SupabaseRowStore::new(
        config.backend.url.clone(),
        config.backend.anon_key.clone(),
    ));
    let auth = Arc::new(SupabaseAuth::new(
        config.backend.url,
        config.backend.anon_key,
    ));

    // Application state
    let state = Arc::new(AppState {
        store: Mutex::new(ConfigStore::load(storage)),
        session: Mutex::new(NavigationSession::new()),
        rows,
        auth,
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/nav", get(nav_tree))
        .route("/catalogs", get(catalogs))
        .route("/sections/:section/label", put(set_section_label))
        .route("/sections/:section/subs", post(add_custom_sub))
        .route(
            "/sections/:section/subs/:sub",
            axum::routing::delete(remove_custom_sub),
        )
        .route("/sections/:section/subs/:sub/label", put(set_sub_label))
        .route("/sections/:section/subs/:sub/hidden", put(set_sub_hidden))
        .route("/sections/:section/subs/:sub/tabs", post(add_l3_tab))
        .route(
            "/sections/:section/subs/:sub/tabs/:tab",
            put(rename_l3_tab).delete(remove_l3_tab),
        )
        .route(
            "/sections/:section/subs/:sub/dashboard",
            get(get_dashboard).put(save_dashboard),
        )
        .route(
            "/sections/:section/subs/:sub/datasource",
            get(get_data_source).put(set_data_source),
        )
        .route("/view/:section/:sub", get(leaf_view))
        .route("/auth/magic-link", post(request_magic_link))
        .route("/auth/verify", post(verify_magic_link))
        .route("/auth/session", get(current_session))
        .route("/auth/sign-out", post(sign_out))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = "0.0.0.0:8080".parse()?;
    tracing::info!("starting growth-hq service on {addr}");

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
