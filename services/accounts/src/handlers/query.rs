use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tessera_domain::pagination::{CursorPage, CursorRequest, SortClause};

use crate::error::AccountsServiceError;

/// `?cursor=<uuid>&count=<n>&sort[]=created-at-desc&sort[]=id-asc`
#[derive(Debug, Default, Deserialize)]
pub struct CursorQuery {
    pub cursor: Option<Uuid>,
    pub count: Option<u32>,
    #[serde(default)]
    pub sort: Vec<String>,
}

impl TryFrom<CursorQuery> for CursorRequest {
    type Error = AccountsServiceError;

    fn try_from(query: CursorQuery) -> Result<Self, Self::Error> {
        let sort_clauses = query
            .sort
            .iter()
            .map(|s| s.parse::<SortClause>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AccountsServiceError::InvalidInput(e.to_string()))?;
        Ok(CursorRequest {
            cursor: query.cursor,
            count: query.count.unwrap_or(0),
            sort_clauses,
        })
    }
}

/// Parse a raw query string; an absent query string is the first page with
/// defaults.
pub fn cursor_request(raw_query: Option<&str>) -> Result<CursorRequest, AccountsServiceError> {
    let query: CursorQuery = raw_query
        .map(serde_qs::from_str)
        .transpose()
        .map_err(|e| AccountsServiceError::InvalidInput(e.to_string()))?
        .unwrap_or_default();
    query.try_into()
}

#[derive(Debug, Serialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub previous_cursor: Option<String>,
    pub next_cursor: Option<String>,
}

impl<T> PageResponse<T> {
    pub fn from_page<U>(page: CursorPage<U>) -> Self
    where
        T: From<U>,
    {
        Self {
            previous_cursor: page.previous_cursor.map(|c| c.to_string()),
            next_cursor: page.next_cursor.map(|c| c.to_string()),
            items: page.items.into_iter().map(T::from).collect(),
        }
    }
}
