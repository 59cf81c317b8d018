//! Domain layer for the gift registry.
//!
//! This crate provides the records the remote store owns and the value
//! objects the application validates locally:
//! - Gift catalog items with their category and price
//! - Reservations and the claimant validation that gates them
//! - Profiles (list owners) and share-slug generation
//!
//! The store holds the authoritative copy of every record; these types
//! are the shapes that cross the store boundary.

pub mod gift;
pub mod profile;
pub mod reservation;

pub use gift::{Gift, GiftCategory, GiftFilter, GiftUpdate, NewGift, Price};
pub use profile::{NewProfile, Profile, ProfileUpdate, generate_share_slug};
pub use reservation::{Claimant, NewReservation, Reservation, ValidationError};
