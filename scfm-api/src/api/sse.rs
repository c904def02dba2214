//! Server-Sent Events for live release, ticket and distribution updates
//!
//! Artists receive events about their own data; admins receive everything.
//! The session is re-resolved before anything is sent and after lag, so a
//! logout or role change takes effect on an open stream.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Extension,
};
use futures::stream::Stream;
use scfm_common::events::ScfmEvent;
use scfm_common::Error;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::api::auth::SessionToken;
use crate::api::CurrentUser;
use crate::services::accounts;
use crate::AppState;

/// Whether the session still admits an admin, an artist, or nobody
async fn session_role(state: &AppState, token: &str) -> Option<bool> {
    match accounts::authenticate(state, token).await {
        Ok(user) => Some(user.is_admin()),
        Err(Error::Auth(_)) => None,
        Err(e) => {
            warn!("SSE: Session check failed: {}", e);
            None
        }
    }
}

/// GET /api/events
pub async fn event_stream(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Extension(SessionToken(token)): Extension<SessionToken>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!(user_id = %user.id, "SSE client connected");

    let mut rx = state.events.subscribe();
    let user_id = user.id;
    let mut is_admin = user.is_admin();

    let stream = async_stream::stream! {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(15)) => {
                    match session_role(&state, &token).await {
                        Some(admin) => is_admin = admin,
                        None => break,
                    }
                    debug!("SSE: Sending heartbeat");
                    yield Ok(Event::default().comment("heartbeat"));
                }

                received = rx.recv() => {
                    let event = match received {
                        Ok(event) => event,
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(user_id = %user_id, skipped, "SSE: Client lagged, events dropped");
                            // A dropped UserUpdated may have been a ban or demotion
                            match session_role(&state, &token).await {
                                Some(admin) => is_admin = admin,
                                None => break,
                            }
                            continue;
                        }
                        Err(RecvError::Closed) => break,
                    };
                    if !event.visible_to(user_id, is_admin) {
                        continue;
                    }

                    let ban_notice = matches!(
                        &event,
                        ScfmEvent::UserUpdated { user_id: target, is_banned: true, .. } if *target == user_id
                    );
                    match session_role(&state, &token).await {
                        Some(admin) => is_admin = admin,
                        // The ban notice itself is still delivered
                        None if ban_notice => {}
                        None => {
                            info!(user_id = %user_id, "SSE: Session ended, closing stream");
                            break;
                        }
                    }
                    if !event.visible_to(user_id, is_admin) {
                        continue;
                    }

                    let event_type = event.event_type();
                    match serde_json::to_string(&event) {
                        Ok(json) => yield Ok(Event::default().event(event_type).data(json)),
                        Err(e) => warn!("SSE: Failed to serialize event {}: {}", event_type, e),
                    }

                    if ban_notice {
                        info!(user_id = %user_id, "SSE: Closing stream for banned user");
                        break;
                    }
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}
