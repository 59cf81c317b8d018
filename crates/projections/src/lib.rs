//! Read-side gift list views.
//!
//! The query side of the registry: gifts joined with their reservation
//! (if any), scoped either to an owner's profile or to a public share
//! slug. Results are cached per scope and dropped whenever a
//! coordinator mutation fires the invalidation seam, mirroring the
//! disposable-cache model the write side assumes.

pub mod error;
pub mod list;

pub use error::{ProjectionError, Result};
pub use list::{GiftListView, GiftWithReservation};
