// Domain layer - navigation tree, dashboards, and catalogs
pub mod binding;
pub mod config_root;
pub mod dashboard;
pub mod keys;
pub mod metrics;
pub mod navigation;
pub mod template;
pub mod widget;
