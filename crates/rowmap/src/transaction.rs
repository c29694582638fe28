//! Transaction helpers.
//!
//! Every write operation that touches more than one row runs inside
//! [`transaction!`]: either every row is written or none is.
//!
//! # Example
//!
//! ```ignore
//! use rowmap::{OrmResult, SqliteClient};
//!
//! # async fn demo(client: &mut SqliteClient) -> OrmResult<()> {
//! rowmap::transaction!(client, tx, {
//!     rowmap::delete::<Session, _>(&tx, "expires_at < ?", &rowmap::args![now]).await?;
//!     rowmap::update(&mut tx, &[account], "", &[]).await?;
//!     Ok(())
//! })?;
//! # Ok(()) }
//! ```

/// Runs the given block inside a database transaction.
///
/// - Begins a transaction via [`Database::begin`](crate::Database::begin).
/// - Commits on `Ok(_)`.
/// - Rolls back on `Err(_)`; if the rollback fails too, both errors are
///   reported together.
///
/// The block must evaluate to `rowmap::OrmResult<T>`, and the enclosing
/// function must return a `Result` whose error converts from `OrmError`.
#[macro_export]
macro_rules! transaction {
    ($client:expr, $tx:ident, $body:block) => {{
        #[allow(unused_mut)]
        let mut $tx = $crate::Database::begin($client).await?;

        let __rowmap_tx_body_result: $crate::OrmResult<_> = async { $body }.await;
        match __rowmap_tx_body_result {
            Ok(value) => {
                $crate::TransactionClient::commit($tx).await?;
                Ok(value)
            }
            Err(error) => match $crate::TransactionClient::rollback($tx).await {
                Ok(()) => Err(error),
                Err(rollback_err) => Err($crate::OrmError::Other(format!(
                    "{error} (rollback failed: {rollback_err})"
                ))),
            },
        }
    }};
}
