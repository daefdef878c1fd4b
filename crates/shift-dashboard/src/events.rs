//! Server-sent board events.
//!
//! Each event is named after the board section that changed; the page
//! refetches that section's partial when it sees the name. Every stream
//! ends when the board shuts down, so open tabs never hold up a graceful
//! server shutdown.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::{BroadcastStream, WatchStream};
use tokio_stream::{Stream, StreamExt};
use tracing::debug;

use crate::DashboardState;
use crate::board::{BoardEvent, ShiftBoard};

/// Sent when a slow client missed events and must refetch everything.
pub const RESYNC: &str = "resync";

enum Item {
    Changed(Result<BoardEvent, BroadcastStreamRecvError>),
    Closed,
}

fn event_name(item: Result<BoardEvent, BroadcastStreamRecvError>) -> &'static str {
    match item {
        Ok(event) => event.name(),
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            debug!(skipped, "event stream lagged");
            RESYNC
        }
    }
}

/// Names of board changes, until the board shuts down.
pub(crate) fn event_names(board: &ShiftBoard) -> impl Stream<Item = &'static str> + use<> {
    let changes = BroadcastStream::new(board.subscribe_events()).map(Item::Changed);
    let closing = WatchStream::new(board.closing())
        .filter(|closed| *closed)
        .map(|_| Item::Closed);
    changes.merge(closing).map_while(|item| match item {
        Item::Changed(change) => Some(event_name(change)),
        Item::Closed => {
            debug!("board shut down, closing event stream");
            None
        }
    })
}

pub async fn stream(
    State(state): State<DashboardState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = event_names(&state.board).map(|name| Ok(Event::default().event(name).data(name)));
    Sse::new(events).keep_alive(KeepAlive::default())
}
