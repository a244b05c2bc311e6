use crate::error::AppError;
use crate::transport::http::handlers::common::{bearer_token, resolve_resource};
use crate::transport::http::types::{AppState, ResourcePath};
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use futures_util::StreamExt;

/// Server-sent events of the caller's row changes on one resource.
///
/// Each event is named after the change kind (`insert`, `update`, `delete`)
/// and carries the change as JSON.
#[utoipa::path(
    get,
    path = "/api/realtime/{role}/{resource}",
    params(
        ("role" = String, Path, description = "customer, driver, seller or freelancer"),
        ("resource" = String, Path, description = "Resource of the role")
    ),
    responses(
        (status = 200, description = "text/event-stream of change events"),
        (status = 401, description = "No session or wrong role"),
        (status = 404, description = "Unknown resource")
    ),
    security(("bearer" = []))
)]
pub async fn realtime_handler(
    State(state): State<AppState>,
    Path(path): Path<ResourcePath>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let repo = resolve_resource(&state, &path.role, &path.resource)?;
    let changes = repo.stream(bearer_token(&headers).as_ref()).await?;
    tracing::debug!(resource = %repo.spec().key(), "Realtime stream opened");

    let events = changes.map(|change| {
        Event::default()
            .event(change.kind.as_str().to_ascii_lowercase())
            .json_data(&change)
    });
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
