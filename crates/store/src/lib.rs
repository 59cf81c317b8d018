//! Gift store contract and implementations.
//!
//! The store is the only holder of authoritative state: gifts,
//! reservations, and profiles all live in remote rows, and every
//! mutation is a round trip. The contract offers single-row atomic
//! operations only; there is no cross-table transaction visible to
//! callers, which is why the registry crate has to coordinate the
//! reserved flag and the reservation row itself.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use common::{GiftId, ProfileId, ReservationId};
pub use error::{Result, StoreError};
pub use memory::InMemoryGiftStore;
pub use postgres::PostgresGiftStore;
pub use store::GiftStore;
