//! Support tickets
//!
//! Conversation between one artist and the admins. An admin reply marks the
//! ticket Resolved and unread for the artist; an artist reply reopens it and
//! marks it unread for admins. Closed tickets accept no replies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::{Role, User};
use crate::{Error, Result};

pub const CATEGORIES: [&str; 5] = [
    "General Inquiry",
    "Distribution Issue",
    "Financial / Royalties",
    "Account Support",
    "Copyright Claim",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketStatus {
    Open,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "Open",
            TicketStatus::Resolved => "Resolved",
            TicketStatus::Closed => "Closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Open" => Some(TicketStatus::Open),
            "Resolved" => Some(TicketStatus::Resolved),
            "Closed" => Some(TicketStatus::Closed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketMessage {
    pub sender_id: Uuid,
    pub sender_name: String,
    pub text: String,
    pub date: DateTime<Utc>,
    pub is_admin: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    /// Artist the conversation belongs to
    pub user_id: Uuid,
    pub user_name: String,
    pub subject: String,
    pub category: String,
    pub status: TicketStatus,
    pub last_updated: DateTime<Utc>,
    pub messages: Vec<TicketMessage>,
    pub read_by_artist: bool,
    pub read_by_admin: bool,
    pub version: i64,
}

impl Ticket {
    /// Open a ticket for `owner`, started by `author`
    ///
    /// `author` is either the owner themself or an admin writing on their behalf.
    pub fn open(
        owner: &User,
        author: &User,
        subject: &str,
        category: &str,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let subject = subject.trim();
        let text = text.trim();
        if subject.is_empty() {
            return Err(Error::field("subject", "Subject is required."));
        }
        if !CATEGORIES.contains(&category) {
            return Err(Error::field("category", "Unknown ticket category."));
        }
        if text.is_empty() {
            return Err(Error::field("message", "Message is required."));
        }
        if owner.id != author.id && !author.is_admin() {
            return Err(Error::Forbidden(
                "only admins can open tickets for other users".to_string(),
            ));
        }

        let by_admin = author.is_admin() && owner.id != author.id;
        Ok(Self {
            id: Uuid::new_v4(),
            user_id: owner.id,
            user_name: owner.name.clone(),
            subject: subject.to_string(),
            category: category.to_string(),
            status: TicketStatus::Open,
            last_updated: now,
            messages: vec![TicketMessage {
                sender_id: author.id,
                sender_name: author.name.clone(),
                text: text.to_string(),
                date: now,
                is_admin: by_admin,
            }],
            read_by_artist: !by_admin,
            read_by_admin: by_admin,
            version: 0,
        })
    }

    /// Whether `user` may read or reply to this ticket
    pub fn is_visible_to(&self, user: &User) -> bool {
        user.is_admin() || user.id == self.user_id
    }

    /// Append a reply and update status and unread flags
    pub fn reply(&mut self, sender: &User, text: &str, now: DateTime<Utc>) -> Result<()> {
        if self.status == TicketStatus::Closed {
            return Err(Error::TicketClosed);
        }
        if !self.is_visible_to(sender) {
            return Err(Error::Forbidden("not a participant of this ticket".to_string()));
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::field("message", "Message is required."));
        }

        let stamp = crate::time::not_before(now, Some(self.last_updated));
        let as_admin = sender.is_admin() && sender.id != self.user_id;
        self.messages.push(TicketMessage {
            sender_id: sender.id,
            sender_name: sender.name.clone(),
            text: text.to_string(),
            date: stamp,
            is_admin: as_admin,
        });
        if as_admin {
            self.status = TicketStatus::Resolved;
            self.read_by_artist = false;
            self.read_by_admin = true;
        } else {
            self.status = TicketStatus::Open;
            self.read_by_admin = false;
            self.read_by_artist = true;
        }
        self.last_updated = stamp;
        Ok(())
    }

    /// Admin override of the status
    pub fn set_status(&mut self, status: TicketStatus, now: DateTime<Utc>) {
        self.status = status;
        self.last_updated = crate::time::not_before(now, Some(self.last_updated));
    }

    /// Clear the unread flag for the viewer's side of the conversation
    ///
    /// Returns whether anything changed.
    pub fn mark_read(&mut self, role: Role) -> bool {
        let flag = match role {
            Role::Admin => &mut self.read_by_admin,
            Role::Artist => &mut self.read_by_artist,
        };
        let changed = !*flag;
        *flag = true;
        changed
    }
}
