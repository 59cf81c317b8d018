//! Reservation coordination for the gift registry.
//!
//! The store offers single-row atomic writes only, so keeping a gift's
//! `is_reserved` flag consistent with the existence of a reservation
//! row takes a two-phase protocol with a compensating write:
//! 1. Flag the gift reserved
//! 2. Insert the reservation row
//!
//! If step 2 fails, the flag write is compensated. Races between
//! guests are decided by the store's unique constraint on the
//! reservation's gift reference; the loser observes a conflict and
//! compensates. A reconciliation sweep repairs the flag drift that
//! partial failures can leave behind.

pub mod coordinator;
pub mod error;
pub mod invalidation;

pub use coordinator::ReservationCoordinator;
pub use error::{RegistryError, Result};
pub use invalidation::{NoopInvalidator, ProjectionInvalidator};
