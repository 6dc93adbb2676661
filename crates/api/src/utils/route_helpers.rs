//! Handler execution helpers
//!
//! Keeps the timing and outcome logging out of every handler body.

use std::future::Future;
use std::time::Instant;

use backoffice_domain::Result as DomainResult;

use crate::error::ApiResult;
use crate::utils::logging::log_route_execution;

/// Run a handler body, log its duration and outcome, and lift the domain
/// error into an [`ApiError`](crate::error::ApiError).
///
/// # Example
///
/// ```rust,ignore
/// async fn list_clientes(State(ctx): State<Arc<AppContext>>) -> ApiResult<Json<Vec<Cliente>>> {
///     execute("clientes::list", || ctx.records.list_clientes()).await.map(Json)
/// }
/// ```
pub async fn execute<F, Fut, T>(route: &str, body: F) -> ApiResult<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = DomainResult<T>>,
{
    let start = Instant::now();
    let result = body().await;

    let outcome = result.as_ref().map(|_| ()).map_err(|err| err.kind());
    log_route_execution(route, start.elapsed(), outcome);

    result.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use backoffice_domain::BackofficeError;

    use super::*;
    use crate::error::ApiError;

    #[tokio::test]
    async fn success_passes_through() {
        let value = execute("test::ok", || async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn domain_error_is_lifted() {
        let result: ApiResult<()> = execute("test::err", || async {
            Err(BackofficeError::Conflict("stale".into()))
        })
        .await;

        assert!(matches!(result, Err(ApiError::Domain(BackofficeError::Conflict(_)))));
    }
}
