//! Identifier sets.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An ordered set of alternative names for one resource.
///
/// Blank values are dropped and duplicates are kept once, at the position
/// they were first added. Two sets match when they share at least one value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifiers(Vec<String>);

impl Identifiers {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set from the given values.
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ii = Self::new();
        ii.extend(values);
        ii
    }

    /// Creates the identifier set of a stored row: handle, name and the
    /// decimal ID when it is positive.
    pub fn for_row(handle: &str, name: &str, id: u64) -> Self {
        let mut ii = Self::from_values([handle, name]);
        if id > 0 {
            ii.push(id.to_string());
        }
        ii
    }

    /// Adds one value unless it is blank or already present.
    pub fn push(&mut self, value: impl AsRef<str>) {
        let value = value.as_ref().trim();
        if value.is_empty() || self.contains(value) {
            return;
        }
        self.0.push(value.to_string());
    }

    /// Adds values unless blank or already present.
    pub fn extend<I, S>(&mut self, values: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for v in values {
            self.push(v);
        }
    }

    /// Returns true when both sets share at least one value.
    ///
    /// An empty set matches nothing.
    pub fn has_any(&self, other: &Identifiers) -> bool {
        other.0.iter().any(|v| self.contains(v))
    }

    /// Returns true when the set holds `value`.
    pub fn contains(&self, value: &str) -> bool {
        self.0.iter().any(|v| v == value)
    }

    /// Returns the first (most specific) identifier.
    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// Returns the positive numeric identifiers, in order.
    pub fn numeric(&self) -> impl Iterator<Item = u64> + '_ {
        self.0
            .iter()
            .filter_map(|v| v.parse::<u64>().ok())
            .filter(|id| *id > 0)
    }

    /// Iterates over the identifiers.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Returns the number of identifiers.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Identifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.0.join(", "))
    }
}

impl<S: AsRef<str>> FromIterator<S> for Identifiers {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::from_values(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn blanks_and_duplicates_are_dropped() {
        let ii = Identifiers::from_values(["crm", "", "  ", "CRM", "crm"]);
        assert_eq!(ii.iter().collect::<Vec<_>>(), vec!["crm", "CRM"]);
    }

    #[test]
    fn row_identifiers_skip_zero_id() {
        assert_eq!(Identifiers::for_row("crm", "CRM", 0).len(), 2);
        let ii = Identifiers::for_row("crm", "CRM", 42);
        assert_eq!(ii.iter().collect::<Vec<_>>(), vec!["crm", "CRM", "42"]);
        assert_eq!(ii.numeric().collect::<Vec<_>>(), vec![42]);
    }

    #[test]
    fn empty_query_matches_nothing() {
        let ii = Identifiers::from_values(["crm"]);
        assert!(!ii.has_any(&Identifiers::new()));
        assert!(!Identifiers::new().has_any(&ii));
    }

    #[test]
    fn display_lists_values() {
        assert_eq!(Identifiers::from_values(["a", "b"]).to_string(), "{a, b}");
        assert_eq!(Identifiers::new().to_string(), "{}");
    }

    proptest! {
        #[test]
        fn has_any_is_symmetric(
            a in proptest::collection::vec("[a-c]{1,2}", 0..5),
            b in proptest::collection::vec("[a-c]{1,2}", 0..5),
        ) {
            let a = Identifiers::from_values(&a);
            let b = Identifiers::from_values(&b);
            prop_assert_eq!(a.has_any(&b), b.has_any(&a));
        }

        #[test]
        fn set_matches_itself_unless_empty(
            values in proptest::collection::vec("[a-z]{0,3}", 0..5),
        ) {
            let ii = Identifiers::from_values(&values);
            prop_assert_eq!(ii.has_any(&ii), !ii.is_empty());
        }
    }
}
