//! Reservation records and claimant validation.

use chrono::{DateTime, Utc};
use common::{GiftId, ReservationId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors caught by local validation, before any remote write.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required name field is missing or too short.
    #[error("Field '{field}' must have at least {min} characters")]
    NameTooShort { field: &'static str, min: usize },

    /// The email does not have a plausible `local@domain.tld` shape.
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    /// `is_couple` was set without a usable spouse name.
    #[error("Spouse name must have at least {min} characters when reserving as a couple")]
    SpouseNameRequired { min: usize },
}

const MIN_NAME_LEN: usize = 2;

/// The guest (or guest couple) making a reservation.
///
/// Validation runs entirely locally; a claimant that fails validation
/// never reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claimant {
    pub guest_name: String,
    pub guest_email: String,
    pub is_couple: bool,
    pub spouse_name: Option<String>,
}

impl Claimant {
    /// Creates a single-guest claimant.
    pub fn single(guest_name: impl Into<String>, guest_email: impl Into<String>) -> Self {
        Self {
            guest_name: guest_name.into(),
            guest_email: guest_email.into(),
            is_couple: false,
            spouse_name: None,
        }
    }

    /// Creates a couple claimant.
    pub fn couple(
        guest_name: impl Into<String>,
        guest_email: impl Into<String>,
        spouse_name: impl Into<String>,
    ) -> Self {
        Self {
            guest_name: guest_name.into(),
            guest_email: guest_email.into(),
            is_couple: true,
            spouse_name: Some(spouse_name.into()),
        }
    }

    /// Validates the claimant fields.
    ///
    /// Checks, in order: guest name length, email shape, and the
    /// spouse name when `is_couple` is set.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.guest_name.trim().chars().count() < MIN_NAME_LEN {
            return Err(ValidationError::NameTooShort {
                field: "guest_name",
                min: MIN_NAME_LEN,
            });
        }

        // Padding is trimmed before storage, so it alone is not a
        // rejection reason.
        if !is_plausible_email(self.guest_email.trim()) {
            return Err(ValidationError::InvalidEmail(self.guest_email.clone()));
        }

        if self.is_couple {
            let usable = self
                .spouse_name
                .as_deref()
                .is_some_and(|name| name.trim().chars().count() >= MIN_NAME_LEN);
            if !usable {
                return Err(ValidationError::SpouseNameRequired { min: MIN_NAME_LEN });
            }
        }

        Ok(())
    }

    /// Returns the spouse name only when reserving as a couple.
    ///
    /// A spouse name supplied on a single-guest claimant is dropped
    /// rather than stored.
    pub fn effective_spouse_name(&self) -> Option<&str> {
        if self.is_couple {
            self.spouse_name.as_deref()
        } else {
            None
        }
    }
}

/// Shape check for email addresses.
///
/// Deliberately loose: one `@`, non-empty local part, and a domain
/// containing an interior dot. Deliverability is not our problem.
fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || email.contains(char::is_whitespace) {
        return false;
    }
    match domain.split_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty() && !domain.contains('@'),
        None => false,
    }
}

/// A claimant's commitment to provide a specific gift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub gift_id: GiftId,
    pub guest_name: String,
    pub guest_email: String,
    pub is_couple: bool,
    pub spouse_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields required to insert a reservation row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReservation {
    pub gift_id: GiftId,
    pub guest_name: String,
    pub guest_email: String,
    pub is_couple: bool,
    pub spouse_name: Option<String>,
}

impl NewReservation {
    /// Builds the insert shape from a validated claimant.
    pub fn from_claimant(gift_id: GiftId, claimant: &Claimant) -> Self {
        Self {
            gift_id,
            guest_name: claimant.guest_name.trim().to_string(),
            guest_email: claimant.guest_email.trim().to_string(),
            is_couple: claimant.is_couple,
            spouse_name: claimant
                .effective_spouse_name()
                .map(|name| name.trim().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_claimant_valid() {
        let claimant = Claimant::single("Ana", "ana@x.com");
        assert!(claimant.validate().is_ok());
    }

    #[test]
    fn test_couple_claimant_valid() {
        let claimant = Claimant::couple("Ana", "ana@x.com", "Bruno");
        assert!(claimant.validate().is_ok());
    }

    #[test]
    fn test_guest_name_too_short() {
        let claimant = Claimant::single("A", "ana@x.com");
        assert!(matches!(
            claimant.validate(),
            Err(ValidationError::NameTooShort {
                field: "guest_name",
                ..
            })
        ));
    }

    #[test]
    fn test_invalid_emails_rejected() {
        for email in ["", "ana", "ana@", "@x.com", "ana@x", "ana @x.com", "ana@x."] {
            let claimant = Claimant::single("Ana", email);
            assert!(
                matches!(claimant.validate(), Err(ValidationError::InvalidEmail(_))),
                "expected {email:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_plausible_emails_accepted() {
        for email in ["ana@x.com", "a.b@sub.domain.org", "ana+rsvp@x.co"] {
            let claimant = Claimant::single("Ana", email);
            assert!(claimant.validate().is_ok(), "expected {email:?} to pass");
        }
    }

    #[test]
    fn test_padded_email_passes_validation() {
        // Interior whitespace still fails; padding alone does not,
        // since the insert shape trims it off anyway.
        let claimant = Claimant::single("Ana", " ana@x.com ");
        assert!(claimant.validate().is_ok());

        let record = NewReservation::from_claimant(GiftId::new(), &claimant);
        assert_eq!(record.guest_email, "ana@x.com");
    }

    #[test]
    fn test_couple_requires_spouse_name() {
        let claimant = Claimant {
            guest_name: "Ana".to_string(),
            guest_email: "ana@x.com".to_string(),
            is_couple: true,
            spouse_name: Some("".to_string()),
        };
        assert_eq!(
            claimant.validate(),
            Err(ValidationError::SpouseNameRequired { min: 2 })
        );

        let claimant = Claimant {
            spouse_name: None,
            ..claimant
        };
        assert_eq!(
            claimant.validate(),
            Err(ValidationError::SpouseNameRequired { min: 2 })
        );
    }

    #[test]
    fn test_spouse_name_dropped_for_single_guest() {
        let claimant = Claimant {
            guest_name: "Ana".to_string(),
            guest_email: "ana@x.com".to_string(),
            is_couple: false,
            spouse_name: Some("Bruno".to_string()),
        };
        assert!(claimant.validate().is_ok());

        let record = NewReservation::from_claimant(GiftId::new(), &claimant);
        assert_eq!(record.spouse_name, None);
    }

    #[test]
    fn test_new_reservation_trims_fields() {
        let claimant = Claimant::couple("  Ana  ", " ana@x.com ", " Bruno ");
        let gift_id = GiftId::new();
        let record = NewReservation::from_claimant(gift_id, &claimant);

        assert_eq!(record.gift_id, gift_id);
        assert_eq!(record.guest_name, "Ana");
        assert_eq!(record.guest_email, "ana@x.com");
        assert!(record.is_couple);
        assert_eq!(record.spouse_name.as_deref(), Some("Bruno"));
    }
}
