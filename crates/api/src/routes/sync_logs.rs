use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use backoffice_domain::{BackofficeError, SyncLogEntry, SyncLogFilter, SyncLogStatus};
use serde::Deserialize;

use crate::caller::Caller;
use crate::context::AppContext;
use crate::error::ApiResult;
use crate::extract::ApiQuery;
use crate::utils::execute;

pub fn router() -> Router<Arc<AppContext>> {
    Router::new().route("/api/sync-logs", get(list_sync_logs))
}

/// Raw query; `status` is parsed by hand so any casing is accepted.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SyncLogQuery {
    #[serde(default)]
    entity_type: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    limit: Option<u32>,
}

impl SyncLogQuery {
    fn into_filter(self) -> Result<SyncLogFilter, BackofficeError> {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<SyncLogStatus>().map_err(BackofficeError::Validation)?),
        };
        let entity_type =
            self.entity_type.map(|value| value.trim().to_string()).filter(|v| !v.is_empty());

        Ok(SyncLogFilter { entity_type, status, limit: self.limit })
    }
}

async fn list_sync_logs(
    State(ctx): State<Arc<AppContext>>,
    _caller: Caller,
    ApiQuery(query): ApiQuery<SyncLogQuery>,
) -> ApiResult<Json<Vec<SyncLogEntry>>> {
    let filter = query.into_filter()?;
    execute("sync_logs::list", || ctx.journal.list(&filter)).await.map(Json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_case_insensitive_and_blanks_are_dropped() {
        let query = SyncLogQuery {
            entity_type: Some("  ".into()),
            status: Some("ERROR".into()),
            limit: Some(10),
        };

        let filter = query.into_filter().unwrap();

        assert_eq!(filter.status, Some(SyncLogStatus::Error));
        assert_eq!(filter.entity_type, None);
        assert_eq!(filter.limit, Some(10));
    }

    #[test]
    fn unknown_status_is_rejected() {
        let query = SyncLogQuery { status: Some("done".into()), ..Default::default() };
        assert!(matches!(query.into_filter(), Err(BackofficeError::Validation(_))));
    }
}
