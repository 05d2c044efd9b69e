use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::{Path, PathBuf};

use crate::dtype::{DType, TypeTag};

pub type WeightResult<T> = Result<T, WeightError>;

#[derive(Debug)]
pub enum WeightError {
    IO(PathBuf, io::Error),
    NotFound { name: String, dirs: Vec<PathBuf> },

    Format(FormatError),

    MissingWeight(String),
    DuplicateRecord(String),
    TypeMismatch { name: String, expected: DType, actual: TypeTag },
}

/// The container contents do not match the expected format.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum FormatError {
    InvalidCount(String),
    MissingToken(&'static str),
    InvalidToken(&'static str, String),
    InvalidShape(String, String),
    EmptyRecord(String),
    UnknownType(String, TypeTag),
    Truncated { name: String, expected: usize, offset: u64 },

    InvalidDynamicRange(usize, String),
    DuplicateName(String),
}

/// The error categories callers are expected to distinguish.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ErrorKind {
    Io,
    Format,
    Request,
}

impl WeightError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WeightError::IO(_, _) | WeightError::NotFound { .. } => ErrorKind::Io,
            WeightError::Format(_) => ErrorKind::Format,
            WeightError::MissingWeight(_) | WeightError::DuplicateRecord(_) | WeightError::TypeMismatch { .. } => {
                ErrorKind::Request
            }
        }
    }

    pub fn format_error(&self) -> Option<&FormatError> {
        match self {
            WeightError::Format(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FormatError> for WeightError {
    fn from(e: FormatError) -> Self {
        WeightError::Format(e)
    }
}

pub trait ToWeightResult {
    type T;
    fn to_weight_result(self, path: impl AsRef<Path>) -> WeightResult<Self::T>;
}

impl<T> ToWeightResult for Result<T, io::Error> {
    type T = T;
    fn to_weight_result(self, path: impl AsRef<Path>) -> WeightResult<T> {
        self.map_err(|e| WeightError::IO(path.as_ref().to_owned(), e))
    }
}

impl Display for WeightError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl Error for WeightError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            WeightError::IO(_, e) => Some(e),
            WeightError::Format(e) => Some(e),
            _ => None,
        }
    }
}

impl Display for FormatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl Error for FormatError {}
