//! Core domain model for the help desk
//!
//! This crate contains:
//! - A settable virtual clock and the `M/d/yy H:mm` timestamp format
//! - Tag canonicalization (synonyms, preferred capitalization, interning)
//! - Tickets, their lifecycle and event history, and reopened tickets
//! - Technicians and their active workload
//! - The `HelpDesk` facade with load-balanced assignment and aggregate queries

pub mod clock;
pub mod desk;
pub mod error;
pub mod event;
pub mod tag;
pub mod technician;
pub mod ticket;

pub use clock::Clock;
pub use desk::{HelpDesk, TicketView};
pub use error::{Error, Result};
pub use event::Event;
pub use tag::{Tag, TagRegistry};
pub use technician::Technician;
pub use ticket::{Priority, Status, Ticket, TicketId, TicketKey};
