//! Profile records and share-slug generation.

use chrono::{DateTime, NaiveDate, Utc};
use common::ProfileId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A list owner: the couple hosting the event.
///
/// The `share_slug` is the public handle guests use to reach the gift
/// list; it is unique across profiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    pub partner_name_1: String,
    pub partner_name_2: Option<String>,
    pub event_name: String,
    pub event_date: Option<NaiveDate>,
    pub share_slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a profile. The slug is generated from the
/// partner names when not supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProfile {
    pub partner_name_1: String,
    pub partner_name_2: Option<String>,
    pub event_name: Option<String>,
    pub event_date: Option<NaiveDate>,
}

impl NewProfile {
    /// Default event name when none is supplied.
    pub const DEFAULT_EVENT_NAME: &'static str = "Kitchen Shower";

    /// Returns the event name, falling back to the default.
    pub fn event_name_or_default(&self) -> &str {
        self.event_name.as_deref().unwrap_or(Self::DEFAULT_EVENT_NAME)
    }
}

/// Partial update to a profile. The slug is never updated through this
/// path; regenerating it would break links guests already hold.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub partner_name_1: Option<String>,
    pub partner_name_2: Option<Option<String>>,
    pub event_name: Option<String>,
    pub event_date: Option<Option<NaiveDate>>,
}

/// Generates a shareable slug from the partner names.
///
/// Lowercases, folds common accented characters to ASCII, collapses
/// everything else to single hyphens, and appends a 4-character random
/// suffix so two couples with the same names get distinct links.
pub fn generate_share_slug(partner_name_1: &str, partner_name_2: Option<&str>) -> String {
    let base = match partner_name_2 {
        Some(name2) => format!("{partner_name_1}-e-{name2}"),
        None => partner_name_1.to_string(),
    };

    let mut slug = String::with_capacity(base.len() + 5);
    let mut last_was_hyphen = true;
    for ch in base.chars().map(fold_accent) {
        let ch = ch.to_ascii_lowercase();
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }

    let suffix = Uuid::new_v4().simple().to_string();
    if slug.is_empty() {
        suffix[..8].to_string()
    } else {
        format!("{slug}-{}", &suffix[..4])
    }
}

/// Maps accented Latin characters to their ASCII base letter.
fn fold_accent(ch: char) -> char {
    match ch {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' | 'É' | 'È' | 'Ê' | 'Ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' | 'Í' | 'Ì' | 'Î' | 'Ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' | 'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' | 'Ú' | 'Ù' | 'Û' | 'Ü' => 'u',
        'ç' | 'Ç' => 'c',
        'ñ' | 'Ñ' => 'n',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip_suffix(slug: &str) -> &str {
        slug.rsplit_once('-').map(|(base, _)| base).unwrap_or(slug)
    }

    #[test]
    fn test_slug_couple_names() {
        let slug = generate_share_slug("Ana", Some("Bruno"));
        assert_eq!(strip_suffix(&slug), "ana-e-bruno");
    }

    #[test]
    fn test_slug_single_name() {
        let slug = generate_share_slug("Ana", None);
        assert_eq!(strip_suffix(&slug), "ana");
    }

    #[test]
    fn test_slug_folds_accents() {
        let slug = generate_share_slug("João", Some("Inês"));
        assert_eq!(strip_suffix(&slug), "joao-e-ines");
    }

    #[test]
    fn test_slug_collapses_punctuation() {
        let slug = generate_share_slug("Ana  Clara", Some("J. Bruno"));
        assert_eq!(strip_suffix(&slug), "ana-clara-e-j-bruno");
    }

    #[test]
    fn test_slug_suffix_makes_slugs_distinct() {
        let a = generate_share_slug("Ana", Some("Bruno"));
        let b = generate_share_slug("Ana", Some("Bruno"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_slug_from_unusable_name_is_not_empty() {
        let slug = generate_share_slug("!!!", None);
        assert_eq!(slug.len(), 8);
        assert!(slug.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_event_name_default() {
        let profile = NewProfile {
            partner_name_1: "Ana".to_string(),
            partner_name_2: None,
            event_name: None,
            event_date: None,
        };
        assert_eq!(profile.event_name_or_default(), "Kitchen Shower");

        let profile = NewProfile {
            event_name: Some("Housewarming".to_string()),
            ..profile
        };
        assert_eq!(profile.event_name_or_default(), "Housewarming");
    }
}
