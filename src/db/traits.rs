//! Warehouse trait definitions.
//!
//! This module defines the `Warehouse` trait that abstracts the analytical store the
//! dashboard reads from, so that the query builder and coordinators do not depend on a
//! particular engine.

use crate::filter::BindValue;
use crate::item::Record;
use crate::plan::Statement;
use crate::ArgoError;
use async_trait::async_trait;

/// "Run this query, get back rows."
///
/// Implementations bind `params` to the positional `?` placeholders of `sql` in order and
/// return every row as a JSON object keyed by column name. Any engine error is reported as
/// [ArgoError::UpstreamQueryFailure].
#[async_trait]
pub trait Warehouse: Send + Sync {
    async fn execute(&self, sql: &str, params: &[BindValue]) -> Result<Vec<Record>, ArgoError>;

    async fn execute_statement(&self, statement: &Statement) -> Result<Vec<Record>, ArgoError> {
        self.execute(statement.sql.as_str(), statement.params.as_slice())
            .await
    }
}
