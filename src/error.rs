use std::{error::Error, fmt::Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    InvalidValue,
    IOError,
    ParseError,
    Unexpected,
}

impl Display for LinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            LinkError::InvalidValue => "Invalid value",
            LinkError::IOError => "IO error",
            LinkError::ParseError => "Parse error",
            LinkError::Unexpected => "Unexpected error",
        };

        write!(f, "{}", msg)
    }
}

impl Error for LinkError {}
