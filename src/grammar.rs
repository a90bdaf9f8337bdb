//! The compiled grammar tree.
//!
//! A [`Grammar`] is built once by the [`Compiler`](crate::Compiler) and is
//! read-only afterwards, so one grammar can be shared by any number of
//! interpreters.

use std::{collections::HashMap, fmt};

use regex::Regex;

/// A compiled grammar: an ordered list of rules.
///
/// The first statement is the start rule.
#[derive(Clone, Debug, Default)]
pub struct Grammar {
    stmts: Vec<Stmt>,
    index: HashMap<String, usize>,
}

impl Grammar {
    /// Builds a grammar from its statements.
    ///
    /// When two statements share a name, references resolve to the first.
    pub fn new(stmts: Vec<Stmt>) -> Grammar {
        let mut index = HashMap::with_capacity(stmts.len());
        for (i, stmt) in stmts.iter().enumerate() {
            index.entry(stmt.name.clone()).or_insert(i);
        }
        Grammar { stmts, index }
    }

    /// The statements in source order.
    pub fn stmts(&self) -> &[Stmt] {
        &self.stmts
    }

    /// The start rule, if the grammar is not empty.
    pub fn start(&self) -> Option<&Stmt> {
        self.stmts.first()
    }

    /// Looks up a rule by name.
    pub fn rule(&self, name: &str) -> Option<&Stmt> {
        self.index.get(name).map(|&i| &self.stmts[i])
    }

    /// Check whether the grammar has no rules.
    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }
}

impl PartialEq for Grammar {
    fn eq(&self, other: &Self) -> bool {
        self.stmts == other.stmts
    }
}

/// One rule: `name = expr`.
#[derive(Clone, Debug, PartialEq)]
pub struct Stmt {
    /// The rule name.
    pub name: String,

    /// The rule body.
    pub expr: Expr,
}

/// A grammar expression.
///
/// `And` and `Or` always hold at least two children; the compiler collapses
/// single-element sequences and choices into their only element.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// A rule reference or builtin identifier, e.g. `value` or `EOF`.
    Ident(String),
    /// An ordered sequence, e.g. `a b c`.
    And(Vec<Expr>),
    /// An ordered choice, e.g. `a | b`.
    Or(Vec<Expr>),
    /// A repetition, e.g. `a*`.
    Quantifier(Quantifier, Box<Expr>),
    /// A registered function call, e.g. `GROUP(a b)` or `LOAD()`.
    Function(String, Option<Box<Expr>>),
    /// Matches without emitting, e.g. `'('i`.
    Ignore(Box<Expr>),
    /// Re-tags the first emitted node, e.g. `name:Key`.
    Type(String, Box<Expr>),
    /// A literal terminal, e.g. `'+'`.
    Plain(String),
    /// A regular expression terminal, e.g. `'\d+'r`.
    Regex(Pattern),
}

impl Expr {
    /// Check whether this is a call to the named function.
    pub fn is_call(&self, function: &str) -> bool {
        match self {
            Expr::Function(name, _) => name == function,
            _ => false,
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Or(_) => 0,
            Expr::And(_) => 1,
            Expr::Quantifier(..) => 2,
            Expr::Type(..) => 3,
            _ => 4,
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, min: u8) -> fmt::Result {
        if self.precedence() < min {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

/// Writes the expression back out in grammar notation.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Ident(name) => f.write_str(name),
            Expr::And(items) | Expr::Or(items) => {
                let (sep, min) = match self {
                    Expr::Or(_) => (" | ", 1),
                    _ => (" ", 2),
                };
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(sep)?;
                    }
                    item.fmt_operand(f, min)?;
                }
                Ok(())
            }
            Expr::Quantifier(q, sub) => {
                sub.fmt_operand(f, 3)?;
                write!(f, "{}", q.symbol())
            }
            Expr::Function(name, Some(arg)) => write!(f, "{}({})", name, arg),
            Expr::Function(name, None) => write!(f, "{}()", name),
            Expr::Ignore(sub) => match sub.as_ref() {
                Expr::Plain(text) => write!(f, "'{}'i", escape(text, true)),
                Expr::Regex(p) => write!(f, "'{}'ri", escape(p.source(), false)),
                other => write!(f, "({})i", other),
            },
            Expr::Type(name, sub) => {
                sub.fmt_operand(f, 4)?;
                write!(f, ":{}", name)
            }
            Expr::Plain(text) => write!(f, "'{}'", escape(text, true)),
            Expr::Regex(p) => write!(f, "'{}'r", escape(p.source(), false)),
        }
    }
}

fn escape(body: &str, backslashes: bool) -> String {
    let mut s = String::with_capacity(body.len());
    for c in body.chars() {
        if c == '\'' || (backslashes && c == '\\') {
            s.push('\\');
        }
        s.push(c);
    }
    s
}

/// A postfix repetition operator.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Quantifier {
    /// `?`: zero or one.
    ZeroOrOne,
    /// `*`: zero or more.
    ZeroOrMore,
    /// `+`: one or more.
    OneOrMore,
}

impl Quantifier {
    /// Parses a quantifier symbol.
    pub fn from_char(c: char) -> Option<Quantifier> {
        match c {
            '?' => Some(Quantifier::ZeroOrOne),
            '*' => Some(Quantifier::ZeroOrMore),
            '+' => Some(Quantifier::OneOrMore),
            _ => None,
        }
    }

    /// The quantifier symbol.
    pub fn symbol(self) -> char {
        match self {
            Quantifier::ZeroOrOne => '?',
            Quantifier::ZeroOrMore => '*',
            Quantifier::OneOrMore => '+',
        }
    }
}

/// A regular expression terminal, anchored at the cursor.
#[derive(Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compiles `source` so that it only matches at the start of its input.
    pub fn new(source: &str) -> Result<Pattern, regex::Error> {
        let regex = Regex::new(&format!("^(?:{})", source))?;
        Ok(Pattern {
            source: source.to_owned(),
            regex,
        })
    }

    /// The pattern as written in the grammar.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The anchored, compiled pattern.
    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.source).finish()
    }
}
