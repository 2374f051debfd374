// Supabase REST row store implementation
use crate::application::row_store::{Row, RowStore};
use anyhow::{Context, Result};
use async_trait::async_trait;

/// Rows fetched per request; the REST endpoint caps responses, so tables are
/// drained page by page until a short page arrives.
const PAGE_SIZE: usize = 1000;

#[derive(Debug, Clone)]
pub struct SupabaseRowStore {
    url: String,
    anon_key: String,
    client: reqwest::Client,
}

impl SupabaseRowStore {
    pub fn new(url: String, anon_key: String) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            anon_key,
            client: reqwest::Client::new(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!(
            "{}/rest/v1/{}?select=*",
            self.url,
            urlencoding::encode(table)
        )
    }

    async fn fetch_page(&self, table: &str, from: usize) -> Result<Vec<Row>> {
        let response = self
            .client
            .get(self.table_url(table))
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.anon_key))
            .header("Range", format!("{}-{}", from, from + PAGE_SIZE - 1))
            .send()
            .await
            .context("failed to send request to the data backend")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("row fetch failed with status {status}: {body}");
        }

        response
            .json::<Vec<Row>>()
            .await
            .context("failed to parse row page")
    }
}

#[async_trait]
impl RowStore for SupabaseRowStore {
    async fn fetch_all(&self, table: &str) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        let mut from = 0usize;

        loop {
            let page = self.fetch_page(table, from).await?;
            let count = page.len();
            rows.extend(page);
            if count < PAGE_SIZE {
                break;
            }
            from += PAGE_SIZE;
        }

        tracing::debug!(table, rows = rows.len(), "fetched table");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_url_encodes_table_name() {
        let store = SupabaseRowStore::new(
            "https://example.supabase.co/".to_string(),
            "key".to_string(),
        );
        assert_eq!(
            store.table_url("my table"),
            "https://example.supabase.co/rest/v1/my%20table?select=*"
        );
    }
}
