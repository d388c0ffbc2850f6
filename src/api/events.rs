//! `GET /api/events`: done event changes as Server-Sent Events.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::stream::Stream;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, warn};

use super::AppState;

/// Each frame carries the change name as `event:` and the full document as
/// `data:`. There is no replay; a client only sees changes published after
/// it connects.
pub(super) async fn stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.notifier.subscribe();
    debug!(
        subscribers = state.notifier.subscriber_count(),
        "event stream opened"
    );

    let sse_stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(change) => match serde_json::to_string(&change.doc) {
                    Ok(json) => {
                        yield Ok(Event::default().event(change.kind.event_name()).data(json));
                    }
                    Err(e) => {
                        error!(error = %e, "failed to serialize done event; skipping");
                    }
                },
                Err(RecvError::Lagged(n)) => {
                    warn!(lagged = n, "event subscriber lagged; some changes were dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(sse_stream).keep_alive(KeepAlive::new().interval(state.keep_alive))
}
