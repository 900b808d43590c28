use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A sortable field: the public `param` value and the SQL expression it
/// maps to. Only expressions from these tables ever reach a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortField {
    pub name: &'static str,
    pub column: &'static str,
}

impl SortField {
    pub const fn new(name: &'static str, column: &'static str) -> Self {
        Self { name, column }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterOrderInfo {
    pub field: SortField,
    pub sort: SortDirection,
}

/// Query-string parameters accepted by every list endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub param: Option<String>,
    pub order: Option<String>,
    pub filter: Option<String>,
}

/// A checked list request handed to a repository.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub order: Option<FilterOrderInfo>,
    pub filter: Option<String>,
}
