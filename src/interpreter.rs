//! The grammar interpreter: backtracking recursive descent over a compiled
//! [`Grammar`].
//!
//! Every expression appends what it emits to an output list and reports
//! success as a `bool`. A failing expression emits nothing and leaves the
//! cursor where it found it.
//!
//! Rule references recurse on the native call stack with no cycle guard, so
//! a rule that reaches itself again without consuming input (left recursion)
//! overflows the stack. Likewise a `*` or `+` whose body can match the empty
//! string loops forever. Both are grammar errors this interpreter does not
//! detect.

use log::{debug, trace, warn};

use crate::{
    ast::{Kind, Node},
    cursor::Cursor,
    error::ParseError,
    grammar::{Expr, Grammar, Quantifier, Stmt},
    registry::{Registry, ROOT},
};

/// Per-parse interpreter state.
///
/// The grammar and registry are only borrowed, so one grammar can serve any
/// number of interpreters, each with its own cursor and backreference
/// register.
pub struct Interpreter<'g, 'i> {
    grammar: &'g Grammar,
    registry: &'g Registry,
    cursor: Cursor<'i>,
    register: String,
}

impl<'g, 'i> Interpreter<'g, 'i> {
    /// Prepares to interpret `grammar` against `input`.
    pub fn new(
        grammar: &'g Grammar,
        registry: &'g Registry,
        input: &'i str,
    ) -> Interpreter<'g, 'i> {
        Interpreter {
            grammar,
            registry,
            cursor: Cursor::new(input),
            register: String::new(),
        }
    }

    /// Runs the start rule.
    ///
    /// Returns the single emitted node, a `Group` of all emitted nodes when
    /// there are zero or several, or an `Error` node at the cursor's offset if
    /// the start rule fails. Trailing unmatched input is not an error.
    pub fn run(mut self) -> Node {
        let grammar = self.grammar;
        let mut out = Vec::new();

        let matched = match grammar.start() {
            Some(stmt) => self.eval_stmt(stmt, &mut out),
            None => false,
        };

        if !matched {
            debug!(
                "parse failed at {} (offset {})",
                self.cursor.cursor_position(),
                self.cursor.offset()
            );
            return Node::error(self.cursor.offset());
        }

        if out.len() == 1 {
            out.remove(0)
        } else {
            Node::group(out, 0)
        }
    }

    /// Runs the start rule, turning an `Error` node into a [`ParseError`].
    ///
    /// # Errors
    ///
    /// Returns an error if the start rule does not match.
    pub fn try_run(self) -> Result<Node, ParseError> {
        let input = self.cursor.input();
        let node = self.run();
        if node.is_error() {
            Err(ParseError::new(input, node.pos))
        } else {
            Ok(node)
        }
    }

    /// The input cursor.
    pub fn cursor(&self) -> &Cursor<'i> {
        &self.cursor
    }

    /// The backreference register.
    pub fn register(&self) -> &str {
        &self.register
    }

    /// Overwrites the backreference register.
    pub fn set_register(&mut self, text: String) {
        self.register = text;
    }

    /// Emits a token ending at the current offset.
    pub fn emit_token(&self, out: &mut Vec<Node>, text: &str) {
        let pos = self.cursor.offset().saturating_sub(text.len());
        out.push(Node::ident(text, pos));
    }

    /// Evaluates one expression at the current position.
    pub fn eval(&mut self, expr: &Expr, out: &mut Vec<Node>) -> bool {
        match expr {
            Expr::And(items) => self.eval_sequence(items, out),
            Expr::Or(alts) => {
                let start = self.cursor.mark();
                for alt in alts {
                    self.cursor.rewind(start);
                    let mut v = Vec::new();
                    if self.eval(alt, &mut v) {
                        out.extend(v);
                        return true;
                    }
                }
                self.cursor.rewind(start);
                false
            }
            Expr::Quantifier(q, sub) => self.eval_quantifier(*q, sub, out),
            Expr::Ident(name) => self.eval_ident(name, out),
            Expr::Function(name, arg) => {
                let registry = self.registry;
                match registry.lookup(name) {
                    Ok(function) => {
                        trace!("call {} at offset {}", expr, self.cursor.offset());
                        function.call(self, arg.as_deref(), out)
                    }
                    Err(e) => {
                        warn!("{}", e);
                        false
                    }
                }
            }
            Expr::Ignore(sub) => {
                let mut discard = Vec::new();
                self.eval(sub, &mut discard)
            }
            Expr::Type(name, sub) => {
                let mut v = Vec::new();
                if !self.eval(sub, &mut v) {
                    return false;
                }
                if let Some(mut first) = v.into_iter().next() {
                    first.kind = Kind::named(name);
                    out.push(first);
                }
                true
            }
            Expr::Plain(text) => {
                if self.cursor.match_literal(text) {
                    self.emit_token(out, text);
                    true
                } else {
                    false
                }
            }
            Expr::Regex(pattern) => {
                let start = self.cursor.mark();
                match self.cursor.match_regex(pattern.regex()) {
                    Some(_) => {
                        let text = self.cursor.text_since(start);
                        self.emit_token(out, text);
                        true
                    }
                    None => false,
                }
            }
        }
    }

    /// Evaluates a rule body. The backreference register is restored to its
    /// entry value once the body returns, whether or not it matched.
    fn eval_stmt(&mut self, stmt: &Stmt, out: &mut Vec<Node>) -> bool {
        trace!("enter rule {} at offset {}", stmt.name, self.cursor.offset());
        let saved = self.register.clone();
        let matched = self.eval(&stmt.expr, out);
        self.register = saved;
        matched
    }

    /// Evaluates a sequence. Emissions of `ROOT(...)` items are held apart:
    /// the first becomes the parent of everything else the sequence emitted.
    fn eval_sequence(&mut self, items: &[Expr], out: &mut Vec<Node>) -> bool {
        let start = self.cursor.mark();
        let mut emitted = Vec::new();
        let mut roots = Vec::new();

        for item in items {
            let target = if item.is_call(ROOT) {
                &mut roots
            } else {
                &mut emitted
            };
            if !self.eval(item, target) {
                self.cursor.rewind(start);
                return false;
            }
        }

        if roots.is_empty() {
            out.extend(emitted);
        } else {
            let parent = roots.remove(0);
            emitted.extend(roots);
            out.push(parent.promote(emitted));
        }
        true
    }

    fn eval_quantifier(&mut self, q: Quantifier, sub: &Expr, out: &mut Vec<Node>) -> bool {
        match q {
            Quantifier::ZeroOrOne => {
                self.eval(sub, out);
                true
            }
            Quantifier::ZeroOrMore => {
                while self.eval(sub, out) {}
                true
            }
            Quantifier::OneOrMore => {
                let mut count = 0;
                while self.eval(sub, out) {
                    count += 1;
                }
                count > 0
            }
        }
    }

    /// A rule reference, or failing that a builtin identifier.
    fn eval_ident(&mut self, name: &str, out: &mut Vec<Node>) -> bool {
        let grammar = self.grammar;
        if let Some(stmt) = grammar.rule(name) {
            return self.eval_stmt(stmt, out);
        }
        self.match_builtin(name) || self.match_builtin_token(name, out)
    }

    /// Builtins that consume input but emit nothing.
    fn match_builtin(&self, name: &str) -> bool {
        let cur = &self.cursor;
        match name {
            "EOF" => cur.is_exhausted(),
            "MORE" => cur.has_more(),
            "ANY" => cur.advance(),
            "WS" => cur.match_char(char::is_whitespace),
            "NL" => cur.match_char(|c| c == '\n'),
            "SP" => cur.match_char(|c| c == ' '),
            "ST" => cur.match_char(|c| c == ' ' || c == '\t'),
            "TB" => cur.match_char(|c| c == '\t'),
            "SKIPLINE" => {
                cur.skip_until(|c| c == '\n');
                cur.match_char(|c| c == '\n') || cur.is_exhausted()
            }
            _ => false,
        }
    }

    /// Builtins that consume input and emit it as a token.
    fn match_builtin_token(&self, name: &str, out: &mut Vec<Node>) -> bool {
        match name {
            "any" => {
                let start = self.cursor.mark();
                if self.cursor.advance() {
                    let text = self.cursor.text_since(start);
                    self.emit_token(out, text);
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }
}

/// Interprets `grammar` against `input` with the default function set.
pub fn parse(grammar: &Grammar, input: &str) -> Node {
    Interpreter::new(grammar, &crate::DEFAULT_REGISTRY, input).run()
}

/// Like [`parse`], but reports failure as a [`ParseError`].
///
/// # Errors
///
/// Returns an error if the start rule does not match.
pub fn try_parse(grammar: &Grammar, input: &str) -> Result<Node, ParseError> {
    Interpreter::new(grammar, &crate::DEFAULT_REGISTRY, input).try_run()
}
