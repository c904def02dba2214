//! Support ticket workflow
//!
//! Artists see only their own tickets; admins see all of them and may open
//! a ticket on behalf of any user.

use scfm_common::events::ScfmEvent;
use scfm_common::models::{Ticket, TicketStatus, User};
use scfm_common::time::now;
use scfm_common::{Error, Result};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::AppState;

/// Ticket creation payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewTicket {
    pub subject: String,
    pub category: String,
    pub message: String,
    /// Admins only: the user the ticket is for
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

pub async fn create_ticket(state: &AppState, author: &User, input: NewTicket) -> Result<Ticket> {
    let owner = match input.user_id {
        Some(target) if target != author.id => {
            if !author.is_admin() {
                return Err(Error::Forbidden(
                    "only admins can open tickets for other users".to_string(),
                ));
            }
            state
                .repo
                .find_user(target)
                .await?
                .ok_or_else(|| Error::NotFound(format!("user {}", target)))?
        }
        _ => author.clone(),
    };

    let ticket = Ticket::open(&owner, author, &input.subject, &input.category, &input.message, now())?;
    state.repo.create_ticket(&ticket).await?;
    info!(ticket_id = %ticket.id, user_id = %owner.id, category = %ticket.category, "Ticket opened");

    notify(state, &ticket);
    Ok(ticket)
}

/// Own tickets for artists, every ticket for admins
pub async fn list_tickets(state: &AppState, viewer: &User) -> Result<Vec<Ticket>> {
    if viewer.is_admin() {
        state.repo.list_tickets(None).await
    } else {
        state.repo.list_tickets(Some(viewer.id)).await
    }
}

/// Fetch a ticket; tickets of other users look like they do not exist
pub async fn get_ticket(state: &AppState, viewer: &User, ticket_id: Uuid) -> Result<Ticket> {
    let ticket = state
        .repo
        .find_ticket(ticket_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("ticket {}", ticket_id)))?;
    if !ticket.is_visible_to(viewer) {
        return Err(Error::NotFound(format!("ticket {}", ticket_id)));
    }
    Ok(ticket)
}

pub async fn reply(state: &AppState, sender: &User, ticket_id: Uuid, text: &str) -> Result<Ticket> {
    let mut ticket = get_ticket(state, sender, ticket_id).await?;
    ticket.reply(sender, text, now())?;
    ticket.version = state.repo.update_ticket(&ticket).await?;
    info!(ticket_id = %ticket.id, sender_id = %sender.id, status = ticket.status.as_str(), "Ticket reply");

    notify(state, &ticket);
    Ok(ticket)
}

/// Clear the caller's unread flag; a no-op when already read
pub async fn mark_read(state: &AppState, viewer: &User, ticket_id: Uuid) -> Result<Ticket> {
    let mut ticket = get_ticket(state, viewer, ticket_id).await?;
    // Admins reading their own artist-side ticket clear the artist flag
    let side = if ticket.user_id == viewer.id {
        scfm_common::models::Role::Artist
    } else {
        viewer.role
    };
    if ticket.mark_read(side) {
        ticket.version = state.repo.update_ticket(&ticket).await?;
        notify(state, &ticket);
    }
    Ok(ticket)
}

/// Admin status override
pub async fn set_status(state: &AppState, admin: &User, ticket_id: Uuid, status: TicketStatus) -> Result<Ticket> {
    let mut ticket = get_ticket(state, admin, ticket_id).await?;
    ticket.set_status(status, now());
    ticket.version = state.repo.update_ticket(&ticket).await?;
    info!(ticket_id = %ticket.id, admin_id = %admin.id, status = status.as_str(), "Ticket status set");

    notify(state, &ticket);
    Ok(ticket)
}

fn notify(state: &AppState, ticket: &Ticket) {
    state.events.emit_lossy(ScfmEvent::TicketUpdated {
        ticket_id: ticket.id,
        user_id: ticket.user_id,
        status: ticket.status,
        read_by_artist: ticket.read_by_artist,
        read_by_admin: ticket.read_by_admin,
        timestamp: ticket.last_updated,
    });
}
