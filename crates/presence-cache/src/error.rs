//! Error types for the presence cache service

use std::fmt;

#[derive(Debug)]
pub enum PresenceCacheError {
    Index(marker_index::MarkerIndexError),
    Watch(Box<notify::Error>),
    Io(Box<std::io::Error>),
    Config(String),
}

impl fmt::Display for PresenceCacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresenceCacheError::Index(err) => write!(f, "Marker index error: {}", err),
            PresenceCacheError::Watch(err) => write!(f, "Directory watch error: {}", err),
            PresenceCacheError::Io(err) => write!(f, "IO error: {}", err),
            PresenceCacheError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for PresenceCacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PresenceCacheError::Index(err) => Some(err),
            PresenceCacheError::Watch(err) => Some(err.as_ref()),
            PresenceCacheError::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<marker_index::MarkerIndexError> for PresenceCacheError {
    fn from(err: marker_index::MarkerIndexError) -> Self {
        PresenceCacheError::Index(err)
    }
}

impl From<notify::Error> for PresenceCacheError {
    fn from(err: notify::Error) -> Self {
        PresenceCacheError::Watch(Box::new(err))
    }
}

impl From<std::io::Error> for PresenceCacheError {
    fn from(err: std::io::Error) -> Self {
        PresenceCacheError::Io(Box::new(err))
    }
}

impl From<tracing_subscriber::filter::ParseError> for PresenceCacheError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        PresenceCacheError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PresenceCacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = PresenceCacheError::Config("invalid directive".to_string());
        assert_eq!(format!("{}", err), "Configuration error: invalid directive");
    }

    #[test]
    fn test_index_error_display() {
        let err = PresenceCacheError::Index(marker_index::MarkerIndexError::InvalidName(
            "a/b".to_string(),
        ));
        assert!(format!("{}", err).contains("Invalid entry name"));
    }

    #[test]
    fn test_io_error_conversion() {
        let err: PresenceCacheError =
            std::io::Error::new(std::io::ErrorKind::AddrInUse, "port taken").into();
        assert!(format!("{}", err).contains("port taken"));
    }

    #[test]
    fn test_error_is_debug() {
        let err = PresenceCacheError::Config("test".to_string());
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("Config"));
    }
}
