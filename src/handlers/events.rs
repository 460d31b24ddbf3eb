use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::sse::{Event, Sse};
use serde::Deserialize;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::{BroadcastStream, IntervalStream};
use tokio_stream::StreamExt;

use crate::errors::AppError;
use crate::state::AppState;

use super::{authenticate, resolve_token};

#[derive(Deserialize)]
pub struct SseQuery {
    pub token: Option<String>,
}

fn resync() -> Result<Event, Infallible> {
    Ok(Event::default().event("resync").data("{}"))
}

// GET /api/businesses/:business_id/events (SSE)
pub async fn events_stream(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(business_id): Path<String>,
    Query(query): Query<SseQuery>,
) -> Result<Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>>, AppError> {
    // EventSource cannot set headers, so the token may come in the query string.
    let principal = match query.token.as_deref() {
        Some(token) => resolve_token(&state, token).await?,
        None => authenticate(&state, &headers).await?,
    };
    if !principal.is_staff_for_business(&business_id) {
        return Err(AppError::Forbidden);
    }

    let rx = state.hub.subscribe(&business_id);
    tracing::debug!(%business_id, principal = %principal.id, "calendar subscriber connected");

    // Nothing is replayed: a fresh subscriber starts by re-fetching the day.
    let hello = tokio_stream::once(resync());

    let live = BroadcastStream::new(rx).map(|result| match result {
        Ok(event) => {
            let data = serde_json::to_string(&event).unwrap_or_default();
            Ok(Event::default().event("change").data(data))
        }
        Err(BroadcastStreamRecvError::Lagged(missed)) => {
            tracing::warn!(missed, "calendar subscriber lagged");
            resync()
        }
    });

    let keepalive = IntervalStream::new(tokio::time::interval(Duration::from_secs(30)))
        .map(|_| Ok(Event::default().comment("keepalive")));

    Ok(Sse::new(hello.chain(live).merge(keepalive)))
}
