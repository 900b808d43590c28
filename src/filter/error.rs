use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FilterError {
    #[error("Unknown sort field: {0}")]
    UnknownSortField(String),

    #[error("Filtering is not supported for {0}")]
    FilterNotSupported(&'static str),
}
