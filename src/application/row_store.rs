// Repository trait for tabular performance rows
use async_trait::async_trait;

/// One backend record: column name to raw value (string/number/null). Cells
/// are coerced to numbers at aggregation time.
pub type Row = serde_json::Map<String, serde_json::Value>;

#[async_trait]
pub trait RowStore: Send + Sync {
    /// Fetch every row of a named table, paging internally; the row count is
    /// unbounded. Errors surface as a display-only message, never a crash.
    async fn fetch_all(&self, table: &str) -> anyhow::Result<Vec<Row>>;
}
