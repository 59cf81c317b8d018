//! Shared identifier types used across the gift registry crates.

mod types;

pub use types::{GiftId, ProfileId, ReservationId};
