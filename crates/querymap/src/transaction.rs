//! Transaction wrapping for closures.
//!
//! ```ignore
//! use querymap::{table, transactional};
//!
//! let id = transactional(&client, |conn| async move {
//!     let id = table("authors").insert(conn, [("email", "a@example.com")]).await?;
//!     table("audit").insert(conn, [("event", "author created")]).await?;
//!     Ok(id)
//! })
//! .await?;
//! ```

use crate::connection::Connection;
use crate::error::OrmResult;
use std::future::Future;

/// Run `body` inside a transaction on `conn`.
///
/// - Begins before calling `body`.
/// - Commits on `Ok(_)`.
/// - Rolls back on `Err(_)` and returns that same error. A failed rollback is
///   logged; the body's error is still the one returned.
pub async fn transactional<'c, C, F, Fut, T>(conn: &'c C, body: F) -> OrmResult<T>
where
    C: Connection,
    F: FnOnce(&'c C) -> Fut,
    Fut: Future<Output = OrmResult<T>>,
{
    conn.begin().await?;
    tracing::debug!(target: "querymap.tx", "transaction started");

    match body(conn).await {
        Ok(value) => {
            conn.commit().await?;
            tracing::debug!(target: "querymap.tx", "transaction committed");
            Ok(value)
        }
        Err(error) => {
            match conn.rollback().await {
                Ok(()) => {
                    tracing::debug!(target: "querymap.tx", error = %error, "transaction rolled back");
                }
                Err(rollback_err) => {
                    tracing::error!(
                        target: "querymap.tx",
                        error = %error,
                        rollback_error = %rollback_err,
                        "rollback failed"
                    );
                }
            }
            Err(error)
        }
    }
}
