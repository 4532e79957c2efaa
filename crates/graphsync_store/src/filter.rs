//! Search filters and cursor based paging.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque continuation token returned by a paged search.
///
/// A cursor is only meaningful to the store that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageCursor(u64);

impl PageCursor {
    /// Creates a cursor that resumes after the given row ID.
    #[must_use]
    pub const fn after(id: u64) -> Self {
        Self(id)
    }

    /// Returns the last row ID covered by this cursor.
    #[must_use]
    pub const fn last_id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "after:{}", self.0)
    }
}

/// Page size and resume position of a search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paging {
    /// Maximum number of rows per page; zero returns every remaining row.
    pub limit: u32,
    /// Resume position; `None` starts from the first row.
    pub page_cursor: Option<PageCursor>,
}

impl Paging {
    /// Creates paging with the given page size.
    #[must_use]
    pub const fn with_limit(limit: u32) -> Self {
        Self {
            limit,
            page_cursor: None,
        }
    }
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPage<T> {
    /// Rows of this page.
    pub rows: Vec<T>,
    /// Cursor for the next page; `None` when the scan is complete.
    pub next_cursor: Option<PageCursor>,
}

impl<T> SearchPage<T> {
    /// Creates a final page.
    pub fn last(rows: Vec<T>) -> Self {
        Self {
            rows,
            next_cursor: None,
        }
    }
}

/// Filter for namespace searches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceFilter {
    /// Only namespaces with this slug.
    pub slug: Option<String>,
    /// Case-insensitive substring match on slug or name.
    pub query: Option<String>,
    /// Paging.
    pub paging: Paging,
}

/// Filter for module searches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleFilter {
    /// Only modules of this namespace; zero matches any.
    pub namespace_id: u64,
    /// Only modules with this handle.
    pub handle: Option<String>,
    /// Case-insensitive substring match on handle or name.
    pub query: Option<String>,
    /// Paging.
    pub paging: Paging,
}

/// Filter for module field searches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleFieldFilter {
    /// Only fields of these modules.
    pub module_id: Vec<u64>,
}

/// Filter for record searches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    /// Namespace of the module.
    pub namespace_id: u64,
    /// Module whose records are searched.
    pub module_id: u64,
    /// Paging.
    pub paging: Paging,
}

/// Filter for page searches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageFilter {
    /// Only pages of this namespace; zero matches any.
    pub namespace_id: u64,
    /// Only pages with this parent.
    pub parent_id: Option<u64>,
    /// Only pages with this handle.
    pub handle: Option<String>,
    /// Paging.
    pub paging: Paging,
}

/// Filter for chart searches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartFilter {
    /// Only charts of this namespace; zero matches any.
    pub namespace_id: u64,
    /// Only charts with this handle.
    pub handle: Option<String>,
    /// Paging.
    pub paging: Paging,
}

/// Filter for user searches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    /// Case-insensitive substring match on handle, email or name.
    pub query: Option<String>,
    /// Paging.
    pub paging: Paging,
}

pub(crate) fn query_matches(query: Option<&str>, candidates: &[&str]) -> bool {
    match query {
        None => true,
        Some(q) => {
            let q = q.to_lowercase();
            candidates.iter().any(|c| c.to_lowercase().contains(&q))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_display() {
        assert_eq!(PageCursor::after(7).to_string(), "after:7");
        assert_eq!(PageCursor::after(7).last_id(), 7);
    }

    #[test]
    fn paging_defaults_to_everything() {
        let p = Paging::default();
        assert_eq!(p.limit, 0);
        assert!(p.page_cursor.is_none());
        assert_eq!(Paging::with_limit(50).limit, 50);
    }

    #[test]
    fn query_matching_is_case_insensitive() {
        assert!(query_matches(None, &["anything"]));
        assert!(query_matches(Some("CRM"), &["my-crm", "x"]));
        assert!(!query_matches(Some("hr"), &["crm", "sales"]));
    }
}
