//! Error types for the marker index

use std::fmt;

#[derive(Debug)]
pub enum MarkerIndexError {
    Io(Box<std::io::Error>),
    InvalidName(String),
}

impl fmt::Display for MarkerIndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerIndexError::Io(err) => write!(f, "IO error: {}", err),
            MarkerIndexError::InvalidName(name) => write!(f, "Invalid entry name: {:?}", name),
        }
    }
}

impl std::error::Error for MarkerIndexError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MarkerIndexError::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for MarkerIndexError {
    fn from(err: std::io::Error) -> Self {
        MarkerIndexError::Io(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, MarkerIndexError>;
