//! Error handling for the rc0 compiler
//!
//! A single user-visible error entry renders as
//! `file:line:col: message`. The phase-specific kind enumerations live with
//! their phases (parser, analyzer); this type is the common envelope they
//! all flow into.

use crate::source_loc::SourceLocation;
use thiserror::Error;

/// Main compiler error type that encompasses all phases of compilation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompilerError {
    #[error("{file}:{location}: {message}")]
    Lex {
        file: String,
        location: SourceLocation,
        message: String,
    },

    #[error("{file}:{location}: {message}")]
    Parse {
        file: String,
        location: SourceLocation,
        message: String,
    },

    #[error("{file}:{location}: {message}")]
    Semantic {
        file: String,
        location: SourceLocation,
        message: String,
    },

    #[error("IO error: {message}")]
    Io { message: String },

    #[error("internal compiler error: {message}")]
    Internal { message: String },
}

impl CompilerError {
    pub fn lex(file: &str, location: SourceLocation, message: String) -> Self {
        CompilerError::Lex {
            file: file.to_string(),
            location,
            message,
        }
    }

    pub fn parse(file: &str, location: SourceLocation, message: String) -> Self {
        CompilerError::Parse {
            file: file.to_string(),
            location,
            message,
        }
    }

    pub fn semantic(file: &str, location: SourceLocation, message: String) -> Self {
        CompilerError::Semantic {
            file: file.to_string(),
            location,
            message,
        }
    }

    /// Location of the error, if it has one
    pub fn location(&self) -> Option<SourceLocation> {
        match self {
            CompilerError::Lex { location, .. }
            | CompilerError::Parse { location, .. }
            | CompilerError::Semantic { location, .. } => Some(*location),
            CompilerError::Io { .. } | CompilerError::Internal { .. } => None,
        }
    }
}

impl From<std::io::Error> for CompilerError {
    fn from(err: std::io::Error) -> Self {
        CompilerError::Io {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_rendering() {
        let err = CompilerError::parse(
            "main.c0",
            SourceLocation::new(3, 14),
            "statement missing ';'".to_string(),
        );
        assert_eq!(format!("{}", err), "main.c0:3:14: statement missing ';'");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: CompilerError = io.into();
        assert!(matches!(err, CompilerError::Io { .. }));
        assert!(err.location().is_none());
    }
}
