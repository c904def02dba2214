//! Domain models

pub mod artist;
pub mod distribution;
pub mod payment;
pub mod release;
pub mod ticket;
pub mod user;

pub use artist::{Artist, NewArtist};
pub use distribution::DistributionStatus;
pub use payment::PaymentDetails;
pub use release::{
    ArtistRole, Release, ReleaseArtist, ReleaseDraft, ReleaseStatus, RoyaltySplit,
    StatusHistoryEntry, ValidatedRelease,
};
pub use ticket::{Ticket, TicketMessage, TicketStatus};
pub use user::{Credentials, Role, User};
