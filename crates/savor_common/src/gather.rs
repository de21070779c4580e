//! Fan-out-join-filter primitive.
//!
//! Launch N independent fallible futures, await all of them, and keep the
//! successes in input order. Used for batch directory resolution; failures
//! are dropped, not surfaced.

use std::future::Future;

use futures::future::join_all;

/// Run every operation concurrently and collect the `Ok` results,
/// preserving input order.
pub async fn join_successes<T, E, F>(ops: Vec<F>) -> Vec<T>
where
    F: Future<Output = Result<T, E>>,
{
    join_all(ops)
        .await
        .into_iter()
        .filter_map(|result| result.ok())
        .collect()
}
