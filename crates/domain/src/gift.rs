//! Gift records and value objects.

use chrono::{DateTime, Utc};
use common::{GiftId, ProfileId};
use serde::{Deserialize, Serialize};

use crate::reservation::ValidationError;

/// Category a gift belongs to, used for guest-side filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GiftCategory {
    Kitchen,
    Appliances,
    Decor,
    TableAndBar,
    Utilities,
    Other,
}

impl GiftCategory {
    /// All categories, in display order.
    pub const ALL: [GiftCategory; 6] = [
        GiftCategory::Kitchen,
        GiftCategory::Appliances,
        GiftCategory::Decor,
        GiftCategory::TableAndBar,
        GiftCategory::Utilities,
        GiftCategory::Other,
    ];

    /// Returns the category name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            GiftCategory::Kitchen => "Kitchen",
            GiftCategory::Appliances => "Appliances",
            GiftCategory::Decor => "Decor",
            GiftCategory::TableAndBar => "TableAndBar",
            GiftCategory::Utilities => "Utilities",
            GiftCategory::Other => "Other",
        }
    }

    /// Parses a stored category name, falling back to `Other` for
    /// values written by older schema versions.
    pub fn parse_lossy(s: &str) -> Self {
        match s {
            "Kitchen" => GiftCategory::Kitchen,
            "Appliances" => GiftCategory::Appliances,
            "Decor" => GiftCategory::Decor,
            "TableAndBar" => GiftCategory::TableAndBar,
            "Utilities" => GiftCategory::Utilities,
            _ => GiftCategory::Other,
        }
    }
}

impl Default for GiftCategory {
    fn default() -> Self {
        GiftCategory::Other
    }
}

impl std::fmt::Display for GiftCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Price represented in cents to avoid floating point issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price {
    cents: i64,
}

impl Price {
    /// Creates a price from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the whole-currency portion.
    pub fn units(&self) -> i64 {
        self.cents / 100
    }

    /// Returns the cents portion (remainder after whole units).
    pub fn cents_part(&self) -> i64 {
        self.cents.abs() % 100
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cents < 0 {
            write!(f, "-R${},{:02}", self.units().abs(), self.cents_part())
        } else {
            write!(f, "R${},{:02}", self.units(), self.cents_part())
        }
    }
}

/// A catalog item a guest may claim.
///
/// Invariant: `is_reserved` is true if and only if a reservation row
/// referencing this gift exists. The store does not enforce this; the
/// registry coordinators do, through write ordering and compensation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gift {
    pub id: GiftId,
    pub profile_id: ProfileId,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub purchase_link: Option<String>,
    pub category: GiftCategory,
    pub price: Option<Price>,
    pub is_reserved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a gift. The store assigns the ID, the
/// reserved flag (always false on creation), and the timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGift {
    pub profile_id: ProfileId,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub purchase_link: Option<String>,
    pub category: GiftCategory,
    pub price: Option<Price>,
}

impl NewGift {
    /// Validates the gift fields before any remote write.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().chars().count() < 2 {
            return Err(ValidationError::NameTooShort {
                field: "name",
                min: 2,
            });
        }
        Ok(())
    }
}

/// Partial update to a gift's display fields.
///
/// `None` fields are left unchanged; the double-`Option` fields
/// distinguish "leave as is" from "clear the value". The reserved flag
/// is deliberately absent: only the coordinators may touch it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GiftUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub image_url: Option<Option<String>>,
    pub purchase_link: Option<Option<String>>,
    pub category: Option<GiftCategory>,
    pub price: Option<Option<Price>>,
}

/// Filter for listing gifts.
#[derive(Debug, Clone, Copy, Default)]
pub struct GiftFilter {
    /// Restrict to gifts owned by this profile.
    pub profile_id: Option<ProfileId>,
}

impl GiftFilter {
    /// Filter matching every gift.
    pub fn all() -> Self {
        Self::default()
    }

    /// Filter matching gifts owned by the given profile.
    pub fn for_profile(profile_id: ProfileId) -> Self {
        Self {
            profile_id: Some(profile_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_roundtrip() {
        for category in GiftCategory::ALL {
            assert_eq!(GiftCategory::parse_lossy(category.as_str()), category);
        }
    }

    #[test]
    fn test_category_parse_lossy_unknown() {
        assert_eq!(GiftCategory::parse_lossy("Cozinha"), GiftCategory::Other);
        assert_eq!(GiftCategory::parse_lossy(""), GiftCategory::Other);
    }

    #[test]
    fn test_price_display() {
        assert_eq!(Price::from_cents(12990).to_string(), "R$129,90");
        assert_eq!(Price::from_cents(100).to_string(), "R$1,00");
        assert_eq!(Price::from_cents(5).to_string(), "R$0,05");
        assert_eq!(Price::from_cents(-1234).to_string(), "-R$12,34");
    }

    #[test]
    fn test_price_parts() {
        let price = Price::from_cents(4550);
        assert_eq!(price.units(), 45);
        assert_eq!(price.cents_part(), 50);
    }

    #[test]
    fn test_new_gift_name_too_short() {
        let gift = NewGift {
            profile_id: ProfileId::new(),
            name: " a ".to_string(),
            description: None,
            image_url: None,
            purchase_link: None,
            category: GiftCategory::Kitchen,
            price: None,
        };
        assert!(matches!(
            gift.validate(),
            Err(ValidationError::NameTooShort { field: "name", .. })
        ));
    }

    #[test]
    fn test_new_gift_valid() {
        let gift = NewGift {
            profile_id: ProfileId::new(),
            name: "Stand Mixer".to_string(),
            description: Some("500W".to_string()),
            image_url: None,
            purchase_link: Some("https://shop.example/mixer".to_string()),
            category: GiftCategory::Appliances,
            price: Some(Price::from_cents(45000)),
        };
        assert!(gift.validate().is_ok());
    }

    #[test]
    fn test_gift_serialization_roundtrip() {
        let gift = Gift {
            id: GiftId::new(),
            profile_id: ProfileId::new(),
            name: "Toaster".to_string(),
            description: None,
            image_url: None,
            purchase_link: None,
            category: GiftCategory::Appliances,
            price: Some(Price::from_cents(8900)),
            is_reserved: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string(&gift).unwrap();
        let deserialized: Gift = serde_json::from_str(&json).unwrap();
        assert_eq!(gift, deserialized);
    }
}
