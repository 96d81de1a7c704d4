use std::fmt;

use mongodb::error::{ErrorKind, WriteFailure};

/// MongoDB duplicate key error code
const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Debug)]
pub enum RepositoryError {
    NotFound(String),
    AlreadyExists(String),
    ValidationError(String),
    DatabaseError(String),
    ConnectionError(String),
    SerializationError(String),
    Generic(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepositoryError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            RepositoryError::AlreadyExists(msg) => write!(f, "Already Exists: {}", msg),
            RepositoryError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            RepositoryError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
            RepositoryError::ConnectionError(msg) => write!(f, "Connection Error: {}", msg),
            RepositoryError::SerializationError(msg) => write!(f, "Serialization Error: {}", msg),
            RepositoryError::Generic(err) => write!(f, "Repository Error: {}", err),
        }
    }
}

impl std::error::Error for RepositoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RepositoryError::Generic(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl RepositoryError {
    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        RepositoryError::NotFound(msg.into())
    }

    pub fn already_exists<T: Into<String>>(msg: T) -> Self {
        RepositoryError::AlreadyExists(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        RepositoryError::ValidationError(msg.into())
    }

    pub fn database<T: Into<String>>(msg: T) -> Self {
        RepositoryError::DatabaseError(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        RepositoryError::SerializationError(msg.into())
    }

    /// Replace the driver text of a duplicate key error with a client-facing message.
    pub fn on_duplicate<T: Into<String>>(self, msg: T) -> Self {
        match self {
            RepositoryError::AlreadyExists(_) => RepositoryError::AlreadyExists(msg.into()),
            other => other,
        }
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == DUPLICATE_KEY_CODE,
        ErrorKind::Command(command_error) => command_error.code == DUPLICATE_KEY_CODE,
        _ => err.to_string().contains("E11000"),
    }
}

impl From<mongodb::error::Error> for RepositoryError {
    fn from(err: mongodb::error::Error) -> Self {
        if is_duplicate_key(&err) {
            return RepositoryError::AlreadyExists(format!("Duplicate key: {}", err));
        }

        match err.kind.as_ref() {
            ErrorKind::Write(_) => RepositoryError::DatabaseError(format!("Write error: {}", err)),
            ErrorKind::Authentication { .. } => {
                RepositoryError::ConnectionError(format!("Authentication failed: {}", err))
            }
            ErrorKind::InvalidArgument { .. } => {
                RepositoryError::ValidationError(format!("Invalid argument: {}", err))
            }
            ErrorKind::Io(_) | ErrorKind::ServerSelection { .. } => {
                RepositoryError::ConnectionError(format!("Connection error: {}", err))
            }
            _ => RepositoryError::Generic(Box::new(err)),
        }
    }
}

impl From<bson::ser::Error> for RepositoryError {
    fn from(err: bson::ser::Error) -> Self {
        RepositoryError::SerializationError(format!("BSON serialization error: {}", err))
    }
}

impl From<bson::de::Error> for RepositoryError {
    fn from(err: bson::de::Error) -> Self {
        RepositoryError::SerializationError(format!("BSON deserialization error: {}", err))
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;
