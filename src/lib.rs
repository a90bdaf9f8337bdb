#![warn(missing_docs)]

//! A grammar-driven, backtracking PEG interpreter.
//!
//! A grammar is written in a small notation of `name = expression` rules,
//! compiled once into a [`Grammar`], and then interpreted against any number
//! of inputs to produce a tree of [`Node`]s. The first rule is the start
//! rule.
//!
//! ```
//! let grammar = grammex::compile(
//!     r"
//!     expr   = term ROOT('+') expr | term
//!     term   = factor ROOT('*') term | factor
//!     factor = '('i expr ')'i | value
//!     value  = '\d+'r
//!     ",
//! );
//!
//! let tree = grammex::parse(&grammar, "1+2*3");
//! assert_eq!(tree.text, "+");
//! assert_eq!(tree.children[0].text, "1");
//! assert_eq!(tree.children[1].text, "*");
//! ```
//!
//! Grammars can call named functions such as `GROUP(...)` or `SAVE(...)`.
//! The default set lives in [`Registry::default`]; build your own
//! [`Registry`] to add more, then compile and parse through it.

use lazy_static::lazy_static;

pub mod ast;
pub use ast::{Kind, Node};

pub mod compiler;
pub use compiler::{compile, Compiler};

pub mod cursor;
pub use cursor::{Cursor, CursorPosition, Mark};

pub mod error;
pub use error::{ParseError, RegistryError};

pub mod grammar;
pub use grammar::{Expr, Grammar, Pattern, Quantifier, Stmt};

pub mod interpreter;
pub use interpreter::{parse, try_parse, Interpreter};

pub mod registry;
pub use registry::{Arity, Function, Registry};

lazy_static! {
    /// The shared default registry behind [`compile`], [`parse`] and
    /// [`try_parse`].
    static ref DEFAULT_REGISTRY: Registry = Registry::default();
}
