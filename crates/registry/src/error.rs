//! Registry error types.

use common::GiftId;
use domain::ValidationError;
use thiserror::Error;

/// Errors that can occur during reservation and release operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Claimant fields failed local validation; no remote write was
    /// attempted.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The referenced gift does not exist.
    #[error("Gift not found: {0}")]
    GiftNotFound(GiftId),

    /// Another claimant won the race for this gift.
    #[error("Gift {0} was already reserved by another guest")]
    ReservationConflict(GiftId),

    /// Transient store failure; the operation can be retried.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// The compensating write itself failed: the gift is flagged
    /// reserved with no reservation row behind it. Reconciliation is
    /// required before the flag can be trusted again.
    #[error("Gift {gift_id} left flagged reserved without a reservation record")]
    InconsistentState { gift_id: GiftId },
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
