//! Projection invalidation seam.

/// Notified after every successful coordinator mutation so cached
/// gift-list projections (owner-scoped and slug-scoped) are re-read on
/// the next access.
///
/// Invalidation carries no ordering guarantee relative to other
/// sessions' writes; readers tolerate staleness windows.
pub trait ProjectionInvalidator: Send + Sync {
    /// Drops all cached gift-list projections.
    fn invalidate_gift_lists(&self);
}

/// Invalidator that does nothing, for callers without a read cache.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopInvalidator;

impl ProjectionInvalidator for NoopInvalidator {
    fn invalidate_gift_lists(&self) {}
}
