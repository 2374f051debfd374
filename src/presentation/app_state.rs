// Application state for HTTP handlers
use crate::application::auth::AuthGateway;
use crate::application::config_store::ConfigStore;
use crate::application::row_store::RowStore;
use crate::application::session::NavigationSession;
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct AppState {
    pub store: Mutex<ConfigStore>,
    pub session: Mutex<NavigationSession>,
    pub rows: Arc<dyn RowStore>,
    pub auth: Arc<dyn AuthGateway>,
}
