//! The grammar compiler: turns grammar notation into a [`Grammar`].
//!
//! The notation, from loosest to tightest binding:
//!
//! ```text
//! stmt    = ident '=' expr
//! expr    = term ('|' term)*
//! term    = postfix postfix*
//! postfix = factor (':' ident)? ('*' | '+' | '?')?
//! factor  = '(' expr ')' | NAME '(' expr? ')' | 'literal' flags | ident
//! flags   = 'r'? 'i'?
//! ```
//!
//! Whitespace, newlines included, may separate any two tokens, so a
//! statement ends wherever the next `ident '='` begins. Compilation never
//! fails outright: it stops at the first statement it cannot read and keeps
//! the statements before it.

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::{
    cursor::Cursor,
    grammar::{Expr, Grammar, Pattern, Quantifier, Stmt},
    registry::{Arity, Registry},
};

lazy_static! {
    static ref IDENT: Regex = Regex::new(r"^\w+").unwrap();
    static ref LITERAL: Regex = Regex::new(r"^'(?:[^'\\]|\\.)*'").unwrap();
}

/// Check whether `name` is usable as a rule or function name.
pub(crate) fn is_identifier(name: &str) -> bool {
    IDENT.find(name).map_or(false, |m| m.end() == name.len())
}

/// A single-use compiler over one grammar text.
pub struct Compiler<'r, 'i> {
    cursor: Cursor<'i>,
    registry: &'r Registry,
}

impl<'r, 'i> Compiler<'r, 'i> {
    /// Prepares to compile `text`, recognising the functions in `registry`.
    pub fn new(text: &'i str, registry: &'r Registry) -> Compiler<'r, 'i> {
        Compiler {
            cursor: Cursor::new(text),
            registry,
        }
    }

    /// Compiles every statement that can be read, in order.
    pub fn compile(self) -> Grammar {
        let mut stmts = Vec::new();
        while let Some(stmt) = self.attempt(Self::stmt) {
            stmts.push(stmt);
        }

        self.skip_ws();
        if self.cursor.has_more() {
            debug!(
                "grammar compilation stopped at {} (offset {}) after {} statement(s)",
                self.cursor.cursor_position(),
                self.cursor.offset(),
                stmts.len()
            );
        }

        Grammar::new(stmts)
    }

    /// Runs `f`, rewinding the cursor if it fails.
    fn attempt<T, F>(&self, f: F) -> Option<T>
    where
        F: FnOnce(&Self) -> Option<T>,
    {
        let mark = self.cursor.mark();
        let val = f(self);
        if val.is_none() {
            self.cursor.rewind(mark);
        }
        val
    }

    fn stmt(&self) -> Option<Stmt> {
        self.skip_ws();
        let name = self.ident()?;
        self.skip_ws();
        self.expect("=")?;
        self.skip_ws();
        let expr = self.expr()?;
        Some(Stmt { name, expr })
    }

    fn expr(&self) -> Option<Expr> {
        let mut alts = vec![self.term()?];
        while let Some(alt) = self.attempt(|c| {
            c.skip_ws();
            c.expect("|")?;
            c.skip_ws();
            c.term()
        }) {
            alts.push(alt);
        }
        Some(collapse(alts, Expr::Or))
    }

    fn term(&self) -> Option<Expr> {
        let mut items = vec![self.postfix()?];
        while let Some(item) = self.attempt(|c| {
            c.skip_ws();
            c.postfix()
        }) {
            items.push(item);
        }
        Some(collapse(items, Expr::And))
    }

    fn postfix(&self) -> Option<Expr> {
        let mut expr = self.factor()?;

        if let Some(ty) = self.attempt(|c| {
            c.expect(":")?;
            c.ident()
        }) {
            expr = Expr::Type(ty, Box::new(expr));
        }

        if let Some(q) = self.attempt(|c| {
            c.cursor.match_while(|ch| ch == ' ' || ch == '\t');
            let q = Quantifier::from_char(c.cursor.peek()?)?;
            c.cursor.advance();
            Some(q)
        }) {
            expr = Expr::Quantifier(q, Box::new(expr));
        }

        Some(expr)
    }

    fn factor(&self) -> Option<Expr> {
        self.attempt(Self::parens)
            .or_else(|| self.attempt(Self::call))
            .or_else(|| self.attempt(Self::literal))
            .or_else(|| self.attempt(Self::reference))
    }

    fn parens(&self) -> Option<Expr> {
        self.expect("(")?;
        self.skip_ws();
        let expr = self.expr()?;
        self.skip_ws();
        self.expect(")")?;
        Some(expr)
    }

    fn call(&self) -> Option<Expr> {
        let name = self.ident()?;
        let arity = self.registry.arity(&name)?;

        self.expect("(")?;
        self.skip_ws();
        let arg = match arity {
            Arity::Zero => None,
            Arity::One => Some(self.expr()?),
            Arity::Optional => self.attempt(Self::expr),
        };
        self.skip_ws();
        self.expect(")")?;

        Some(Expr::Function(name, arg.map(Box::new)))
    }

    fn literal(&self) -> Option<Expr> {
        let start = self.cursor.mark();
        self.cursor.match_regex(&LITERAL)?;
        let quoted = self.cursor.text_since(start);
        let body = &quoted[1..quoted.len() - 1];

        let flags = self.cursor.mark();
        self.cursor.match_regex(&IDENT);
        let (is_regex, ignore) = match self.cursor.text_since(flags) {
            "" => (false, false),
            "r" => (true, false),
            "i" => (false, true),
            "ri" => (true, true),
            _ => return None,
        };

        let expr = if is_regex {
            let source = unescape(body, false);
            if source.is_empty() {
                return None;
            }
            match Pattern::new(&source) {
                Ok(pattern) => Expr::Regex(pattern),
                Err(e) => {
                    debug!("invalid regex literal {:?}: {}", source, e);
                    return None;
                }
            }
        } else {
            let text = unescape(body, true);
            if text.is_empty() {
                return None;
            }
            Expr::Plain(text)
        };

        if ignore {
            Some(Expr::Ignore(Box::new(expr)))
        } else {
            Some(expr)
        }
    }

    /// A rule reference. An identifier followed by `=` is the next rule's
    /// header, not a reference.
    fn reference(&self) -> Option<Expr> {
        let name = self.ident()?;

        let after = self.cursor.mark();
        self.skip_ws();
        let is_header = self.cursor.match_literal("=");
        self.cursor.rewind(after);

        if is_header {
            None
        } else {
            Some(Expr::Ident(name))
        }
    }

    fn ident(&self) -> Option<String> {
        let start = self.cursor.mark();
        self.cursor.match_regex(&IDENT)?;
        Some(self.cursor.text_since(start).to_owned())
    }

    fn expect(&self, lit: &str) -> Option<()> {
        if self.cursor.match_literal(lit) {
            Some(())
        } else {
            None
        }
    }

    fn skip_ws(&self) {
        self.cursor.match_while(char::is_whitespace);
    }
}

fn collapse(mut items: Vec<Expr>, wrap: fn(Vec<Expr>) -> Expr) -> Expr {
    if items.len() == 1 {
        items.remove(0)
    } else {
        wrap(items)
    }
}

/// Resolves `\'` always and `\\` only in plain literals; any other escape is
/// kept as written so regex escapes reach the regex engine intact.
fn unescape(body: &str, backslashes: bool) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\'') => out.push('\''),
            Some('\\') if backslashes => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Compiles grammar text with the default function set.
pub fn compile(text: &str) -> Grammar {
    Compiler::new(text, &crate::DEFAULT_REGISTRY).compile()
}
