//! Error types.

use std::{error::Error, fmt};

use crate::cursor::CursorPosition;

/// An error produced by a [`Registry`](crate::Registry).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// A grammar called a function the registry does not know.
    UnknownFunction {
        /// The name that was looked up.
        name: String,
    },

    /// A function name is not a grammar identifier (`\w+`).
    InvalidName {
        /// The rejected name.
        name: String,
    },

    /// A function with this name is already registered.
    Duplicate {
        /// The name that was registered twice.
        name: String,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use RegistryError::*;
        match self {
            UnknownFunction { name } => write!(f, "unknown function {:?}", name),
            InvalidName { name } => write!(
                f,
                "invalid function name {:?}: names must be word characters only",
                name
            ),
            Duplicate { name } => write!(f, "function {:?} is already registered", name),
        }
    }
}

impl Error for RegistryError {}

/// A top-level parse failure.
///
/// The offset is where the cursor stood after the start rule gave up, not
/// the furthest point any alternative reached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    offset: usize,
    position: CursorPosition,
}

impl ParseError {
    /// Constructs an error for a failure at byte `offset` of `input`.
    pub fn new(input: &str, offset: usize) -> ParseError {
        ParseError {
            offset,
            position: CursorPosition::of(input, offset),
        }
    }

    /// The byte offset of the failure.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The line/column of the failure.
    pub fn position(&self) -> CursorPosition {
        self.position
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "input does not match the grammar at {} (offset {})",
            self.position, self.offset
        )
    }
}

impl Error for ParseError {}
