use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Invalid phone number: {0}")]
    InvalidPhone(String),
    #[error("Invalid value for {field}: {value}")]
    InvalidChoice { field: &'static str, value: String },
    #[error("Missing value for {0}")]
    MissingField(&'static str),
}

pub type DomainResult<T> = Result<T, DomainError>;
