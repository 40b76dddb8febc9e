//! Cursor pagination: request normalization, sort clauses, and result pages.
//!
//! A cursor is the identifier of the last row a caller has seen. The next page
//! contains only rows whose identifier is strictly greater than the cursor.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Page size used when a request asks for zero rows.
pub const DEFAULT_PAGE_SIZE: u32 = 5;

/// Upper bound on rows returned by a single page.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Generic sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Sort {
    Desc,
    Asc,
}

/// Columns a listing may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortField {
    Id,
    CreatedAt,
    LastModifiedAt,
}

/// One `(field, direction)` ordering term.
///
/// The textual form is `<field>-<direction>` in kebab-case, e.g. `id-asc` or
/// `created-at-desc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortClause {
    pub field: SortField,
    pub sort: Sort,
}

impl SortClause {
    pub const fn new(field: SortField, sort: Sort) -> Self {
        Self { field, sort }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sort clause: {0}")]
pub struct ParseSortClauseError(pub String);

impl FromStr for SortClause {
    type Err = ParseSortClauseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, sort) = s
            .rsplit_once('-')
            .ok_or_else(|| ParseSortClauseError(s.to_owned()))?;

        let field = match field {
            "id" => SortField::Id,
            "created-at" => SortField::CreatedAt,
            "last-modified-at" => SortField::LastModifiedAt,
            _ => return Err(ParseSortClauseError(s.to_owned())),
        };
        let sort = match sort {
            "asc" => Sort::Asc,
            "desc" => Sort::Desc,
            _ => return Err(ParseSortClauseError(s.to_owned())),
        };

        Ok(Self { field, sort })
    }
}

impl fmt::Display for SortClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = match self.field {
            SortField::Id => "id",
            SortField::CreatedAt => "created-at",
            SortField::LastModifiedAt => "last-modified-at",
        };
        let sort = match self.sort {
            Sort::Asc => "asc",
            Sort::Desc => "desc",
        };
        write!(f, "{field}-{sort}")
    }
}

/// Caller-supplied pagination parameters shared by every listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CursorRequest {
    pub cursor: Option<Uuid>,
    pub count: u32,
    pub sort_clauses: Vec<SortClause>,
}

impl CursorRequest {
    /// Resolve defaults and bounds.
    ///
    /// - `count == 0` becomes [`DEFAULT_PAGE_SIZE`]
    /// - `count > MAX_PAGE_SIZE` is clamped to [`MAX_PAGE_SIZE`]
    /// - no sort clauses means `id ASC`
    /// - clauses that never mention `id` get `id ASC` appended as a tie-breaker
    pub fn normalized(self) -> Self {
        let count = match self.count {
            0 => DEFAULT_PAGE_SIZE,
            n => n.min(MAX_PAGE_SIZE),
        };

        let mut sort_clauses = self.sort_clauses;
        if !sort_clauses.iter().any(|c| c.field == SortField::Id) {
            sort_clauses.push(SortClause::new(SortField::Id, Sort::Asc));
        }

        Self {
            cursor: self.cursor,
            count,
            sort_clauses,
        }
    }
}

/// Rows that can be paged over expose the identifier used as their cursor.
pub trait CursorKey {
    fn cursor_key(&self) -> Uuid;
}

/// One page of a cursor listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CursorPage<T> {
    pub items: Vec<T>,
    /// The cursor that produced this page.
    pub previous_cursor: Option<Uuid>,
    /// Identifier of the last item, `None` when the page is empty.
    pub next_cursor: Option<Uuid>,
}

impl<T: CursorKey> CursorPage<T> {
    pub fn new(request: &CursorRequest, items: Vec<T>) -> Self {
        let next_cursor = items.last().map(CursorKey::cursor_key);
        Self {
            items,
            previous_cursor: request.cursor,
            next_cursor,
        }
    }
}

impl<T> CursorPage<T> {
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Transform the items while keeping both cursors.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> CursorPage<U> {
        CursorPage {
            items: self.items.into_iter().map(f).collect(),
            previous_cursor: self.previous_cursor,
            next_cursor: self.next_cursor,
        }
    }
}
