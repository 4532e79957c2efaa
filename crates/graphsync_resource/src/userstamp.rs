//! User lookup for userstamp resolution.

use crate::stamps::Userstamp;
use graphsync_store::User;
use std::collections::HashMap;

/// Maps user IDs, handles and emails to user IDs.
#[derive(Debug, Clone, Default)]
pub struct UserstampIndex {
    by_key: HashMap<String, u64>,
}

impl UserstampIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an index over the given users.
    pub fn from_users<'a>(users: impl IntoIterator<Item = &'a User>) -> Self {
        let mut idx = Self::new();
        for u in users {
            idx.add(u);
        }
        idx
    }

    /// Adds one user.
    pub fn add(&mut self, user: &User) {
        if user.id == 0 {
            return;
        }
        self.by_key.insert(user.id.to_string(), user.id);
        for key in [&user.handle, &user.email] {
            if !key.is_empty() {
                self.by_key.insert(key.clone(), user.id);
            }
        }
    }

    /// Resolves a stamp to a known user ID.
    pub fn resolve(&self, stamp: &Userstamp) -> Option<u64> {
        if stamp.user_id > 0 {
            if let Some(id) = self.by_key.get(&stamp.user_id.to_string()) {
                return Some(*id);
            }
        }
        self.by_key.get(stamp.identifier.trim()).copied()
    }

    /// Returns the number of indexed keys.
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    /// Returns true when no user is indexed.
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> Vec<User> {
        vec![
            User {
                id: 10,
                handle: "jane".into(),
                email: "jane@example.com".into(),
                name: "Jane".into(),
            },
            User {
                id: 11,
                handle: String::new(),
                email: "bob@example.com".into(),
                name: "Bob".into(),
            },
        ]
    }

    #[test]
    fn resolves_by_id_handle_or_email() {
        let idx = UserstampIndex::from_users(&users());
        assert_eq!(idx.resolve(&Userstamp::from_id(10).unwrap()), Some(10));
        assert_eq!(idx.resolve(&Userstamp::from_identifier("jane").unwrap()), Some(10));
        assert_eq!(
            idx.resolve(&Userstamp::from_identifier("bob@example.com").unwrap()),
            Some(11)
        );
    }

    #[test]
    fn unknown_users_do_not_resolve() {
        let idx = UserstampIndex::from_users(&users());
        assert_eq!(idx.resolve(&Userstamp::from_id(99).unwrap()), None);
        assert_eq!(idx.resolve(&Userstamp::from_identifier("ghost").unwrap()), None);
    }

    #[test]
    fn empty_handles_are_not_indexed() {
        let idx = UserstampIndex::from_users(&users());
        // 10, jane, jane@example.com, 11, bob@example.com
        assert_eq!(idx.len(), 5);
    }
}
