// Infrastructure layer - External dependencies and adapters
pub mod file_storage;
pub mod settings;
pub mod supabase_auth;
pub mod supabase_rows;
