//! Timestamps and userstamps carried by resource nodes.

use chrono::{DateTime, Utc};
use graphsync_store::RowTimestamps;
use serde::{Deserialize, Serialize};

/// Lifecycle times of a resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamps {
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Deletion time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Timestamps {
    /// Builds timestamps from optional values; `None` when every value is
    /// absent.
    pub fn make(
        created_at: Option<DateTime<Utc>>,
        updated_at: Option<DateTime<Utc>>,
        deleted_at: Option<DateTime<Utc>>,
    ) -> Option<Self> {
        let ts = Self {
            created_at,
            updated_at,
            deleted_at,
        };
        (!ts.is_empty()).then_some(ts)
    }

    /// Builds timestamps from a stored row.
    pub fn from_row(row: &RowTimestamps) -> Option<Self> {
        Self::make(row.created_at, row.updated_at, row.deleted_at)
    }

    /// Returns true when no time is set.
    pub fn is_empty(&self) -> bool {
        self.created_at.is_none() && self.updated_at.is_none() && self.deleted_at.is_none()
    }

    /// Converts to row timestamps.
    pub fn to_row(&self) -> RowTimestamps {
        RowTimestamps {
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        }
    }
}

/// A user referenced by ID or by identifier (handle or email).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Userstamp {
    /// Known user ID, zero when only the identifier is known.
    #[serde(default)]
    pub user_id: u64,
    /// Handle, email or decimal ID.
    #[serde(default)]
    pub identifier: String,
}

impl Userstamp {
    /// Creates a stamp from a user ID; zero means unset.
    pub fn from_id(user_id: u64) -> Option<Self> {
        (user_id > 0).then(|| Self {
            user_id,
            identifier: user_id.to_string(),
        })
    }

    /// Creates a stamp from a handle, email or decimal ID; blank means unset.
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return None;
        }
        Some(Self {
            user_id: identifier.parse().unwrap_or_default(),
            identifier: identifier.to_string(),
        })
    }
}

/// Users responsible for a resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Userstamps {
    /// Creating user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<Userstamp>,
    /// Last updating user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<Userstamp>,
    /// Deleting user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_by: Option<Userstamp>,
    /// Owning user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owned_by: Option<Userstamp>,
}

impl Userstamps {
    /// Builds userstamps from user IDs; `None` when every ID is zero.
    pub fn from_ids(
        created_by: u64,
        updated_by: u64,
        deleted_by: u64,
        owned_by: u64,
    ) -> Option<Self> {
        let us = Self {
            created_by: Userstamp::from_id(created_by),
            updated_by: Userstamp::from_id(updated_by),
            deleted_by: Userstamp::from_id(deleted_by),
            owned_by: Userstamp::from_id(owned_by),
        };
        (!us.is_empty()).then_some(us)
    }

    /// Returns true when no stamp is set.
    pub fn is_empty(&self) -> bool {
        self.created_by.is_none()
            && self.updated_by.is_none()
            && self.deleted_by.is_none()
            && self.owned_by.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn empty_timestamps_are_none() {
        assert!(Timestamps::make(None, None, None).is_none());
        assert!(Timestamps::from_row(&RowTimestamps::default()).is_none());
    }

    #[test]
    fn row_conversion_keeps_unset_times() {
        let earlier = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();

        assert_eq!(Timestamps::default().to_row(), RowTimestamps::default());

        let ts = Timestamps::make(None, Some(earlier), None).unwrap();
        let row = ts.to_row();
        assert_eq!(row.created_at, None);
        assert_eq!(row.updated_at, Some(earlier));
        assert_eq!(Timestamps::from_row(&row), Some(ts));
    }

    #[test]
    fn zero_user_ids_are_unset() {
        assert!(Userstamps::from_ids(0, 0, 0, 0).is_none());
        let us = Userstamps::from_ids(7, 0, 0, 7).unwrap();
        assert_eq!(us.created_by.unwrap().identifier, "7");
        assert!(us.updated_by.is_none());
    }

    #[test]
    fn identifier_stamps() {
        assert!(Userstamp::from_identifier("  ").is_none());
        let s = Userstamp::from_identifier("jane@example.com").unwrap();
        assert_eq!(s.user_id, 0);
        assert_eq!(Userstamp::from_identifier("12").unwrap().user_id, 12);
    }
}
