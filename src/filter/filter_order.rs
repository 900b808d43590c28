use super::error::FilterError;
use super::types::{FilterOrderInfo, SortDirection, SortField};

pub struct FilterOrder;

impl FilterOrder {
    /// Resolve `param`/`order` against a whitelist. An absent or blank
    /// `param` means no explicit ordering; an unknown one is rejected.
    pub fn validate_and_parse(
        param: Option<&str>,
        order: Option<&str>,
        allowed: &[SortField],
    ) -> Result<Option<FilterOrderInfo>, FilterError> {
        let name = match param.map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => return Ok(None),
        };

        let field = allowed
            .iter()
            .find(|f| f.name == name)
            .copied()
            .ok_or_else(|| FilterError::UnknownSortField(name.to_string()))?;

        Ok(Some(FilterOrderInfo {
            field,
            sort: Self::parse_direction(order),
        }))
    }

    fn parse_direction(order: Option<&str>) -> SortDirection {
        match order {
            Some(dir) if dir.trim().eq_ignore_ascii_case("desc") => SortDirection::Desc,
            _ => SortDirection::Asc,
        }
    }

    /// ORDER BY clause; `tiebreak` keeps results stable for equal keys.
    pub fn generate(info: Option<&FilterOrderInfo>, tiebreak: &str) -> String {
        match info {
            Some(i) => format!(
                " ORDER BY {} {}, {} ASC",
                i.field.column,
                i.sort.to_sql(),
                tiebreak
            ),
            None => format!(" ORDER BY {} ASC", tiebreak),
        }
    }
}
