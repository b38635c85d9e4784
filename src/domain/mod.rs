use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

mod phone;

pub use phone::is_valid_phone;

/// A registry record
///
/// A member is created once and never updated by this crate. The store owns the canonical copy;
/// instances handed out by ports and commands are snapshots.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Member {
    /// Unique identifier for the `Member`
    ///
    /// Generated at creation and never changed afterwards.
    pub id: Uuid,
    /// Card number, unique across all members
    ///
    /// Always set for members created through the registry, since a number is allocated when
    /// the caller does not supply one.
    pub card_no: Option<String>,
    /// Mobile phone number
    ///
    /// Not re-validated on creation, so legacy records may hold a malformed value.
    pub phone: Option<String>,
    /// Membership tier label
    pub level: Option<String>,
    pub name: Option<String>,
    /// Identifier of the member who referred this one
    pub reference: Option<Uuid>,
    pub create_time: DateTime<Utc>,
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "id={},p={},c={},ref={},time={}",
            self.id,
            self.phone.as_deref().unwrap_or_default(),
            self.card_no.as_deref().unwrap_or_default(),
            self.reference.map(|id| id.to_string()).unwrap_or_default(),
            self.create_time.to_rfc3339(),
        )
    }
}

/// Returns `Some(value)` unless the value is empty
///
/// Callers pass optional fields as possibly-empty strings.
pub(crate) fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speculoos::prelude::*;

    #[test]
    fn test_display_omits_missing_fields() {
        let id = Uuid::new_v4();
        let member = Member {
            id,
            card_no: Some("1001".to_string()),
            phone: None,
            level: None,
            name: None,
            reference: None,
            create_time: Utc::now(),
        };

        let res = member.to_string();

        assert_that!(res.starts_with(&format!("id={id},p=,c=1001,ref=,time=")))
            .is_true();
    }

    #[test]
    fn test_non_empty() {
        assert_that!(non_empty("")).is_none();
        assert_that!(non_empty("gold")).is_equal_to(Some("gold".to_string()));
    }
}
