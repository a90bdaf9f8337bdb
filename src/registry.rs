//! The function registry: named extension points callable from grammars.
//!
//! A grammar calls a function with `NAME(expr)`. The compiler only
//! recognises names present in the registry it compiles with, and the
//! interpreter dispatches through the registry it was built with. A registry
//! is populated up front and then borrowed immutably by every interpreter, so
//! registration can never race with lookup.

use std::{collections::HashMap, fmt};

use crate::{
    ast::{join, Node},
    error::RegistryError,
    grammar::{Expr, Grammar},
    Interpreter,
};

/// How many arguments a function takes between its parentheses.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Arity {
    /// `NAME()`.
    Zero,
    /// `NAME(expr)`.
    One,
    /// `NAME()` or `NAME(expr)`.
    Optional,
}

type Callback =
    dyn Fn(&mut Interpreter<'_, '_>, Option<&Expr>, &mut Vec<Node>) -> bool + Send + Sync;

type Builtin = fn(&mut Interpreter<'_, '_>, Option<&Expr>, &mut Vec<Node>) -> bool;

/// A registered function.
pub struct Function {
    arity: Arity,
    callback: Box<Callback>,
}

impl Function {
    /// The argument shape the compiler accepts for this function.
    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// Runs the function at the interpreter's current position.
    ///
    /// Emitted nodes are appended to `out`. On failure nothing is emitted and
    /// the cursor is left where it was.
    pub fn call(
        &self,
        interp: &mut Interpreter<'_, '_>,
        arg: Option<&Expr>,
        out: &mut Vec<Node>,
    ) -> bool {
        (self.callback)(interp, arg, out)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function").field("arity", &self.arity).finish()
    }
}

/// A mapping from function name to behavior.
pub struct Registry {
    functions: HashMap<String, Function>,
}

impl Registry {
    /// Constructs a registry with no functions at all.
    pub fn new() -> Registry {
        Registry {
            functions: HashMap::new(),
        }
    }

    /// Adds a function.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is not a grammar identifier or is already
    /// registered.
    pub fn register<F>(&mut self, name: &str, arity: Arity, f: F) -> Result<(), RegistryError>
    where
        F: Fn(&mut Interpreter<'_, '_>, Option<&Expr>, &mut Vec<Node>) -> bool
            + Send
            + Sync
            + 'static,
    {
        if !crate::compiler::is_identifier(name) {
            return Err(RegistryError::InvalidName { name: name.to_owned() });
        }
        if self.functions.contains_key(name) {
            return Err(RegistryError::Duplicate { name: name.to_owned() });
        }

        self.functions.insert(
            name.to_owned(),
            Function {
                arity,
                callback: Box::new(f),
            },
        );
        Ok(())
    }

    /// Looks up a function by name.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::UnknownFunction` if no such function exists.
    pub fn lookup(&self, name: &str) -> Result<&Function, RegistryError> {
        self.functions
            .get(name)
            .ok_or_else(|| RegistryError::UnknownFunction { name: name.to_owned() })
    }

    /// The arity of a registered function.
    pub fn arity(&self, name: &str) -> Option<Arity> {
        self.functions.get(name).map(Function::arity)
    }

    /// Check whether a function is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Compiles grammar text, recognising this registry's function names.
    pub fn compile(&self, text: &str) -> Grammar {
        crate::Compiler::new(text, self).compile()
    }

    /// Interprets `grammar` against `input` using this registry.
    pub fn parse(&self, grammar: &Grammar, input: &str) -> Node {
        Interpreter::new(grammar, self, input).run()
    }
}

impl Default for Registry {
    /// Constructs a registry seeded with the default functions.
    fn default() -> Registry {
        let defaults: [(&str, Arity, Builtin); 11] = [
            (ROOT, Arity::One, root),
            ("GROUP", Arity::One, group),
            ("FIND", Arity::One, find),
            ("UNTIL", Arity::One, until),
            ("SAVE", Arity::One, save),
            ("LOAD", Arity::Zero, load),
            ("TEXT", Arity::Optional, text),
            ("MATCH", Arity::One, capture),
            ("JOIN", Arity::One, concat),
            ("REVERSE", Arity::One, reverse),
            ("ANYNOT", Arity::One, any_not),
        ];

        let mut registry = Registry::new();
        for &(name, arity, f) in defaults.iter() {
            registry.functions.insert(
                name.to_owned(),
                Function {
                    arity,
                    callback: Box::new(f),
                },
            );
        }
        registry
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.functions.keys().collect();
        names.sort();
        f.debug_struct("Registry").field("functions", &names).finish()
    }
}

/// The name of the root-promotion function, which sequences treat specially.
pub const ROOT: &str = "ROOT";

/// Evaluates the argument into a fresh list.
fn eval_arg(interp: &mut Interpreter<'_, '_>, arg: Option<&Expr>) -> Option<Vec<Node>> {
    let arg = arg?;
    let mut v = Vec::new();
    if interp.eval(arg, &mut v) {
        Some(v)
    } else {
        None
    }
}

/// Promotes the second emitted node to be the parent of the others.
fn promote_second(mut v: Vec<Node>) -> Vec<Node> {
    if v.len() < 2 {
        return v;
    }
    let parent = v.remove(1);
    vec![parent.promote(v)]
}

fn root(interp: &mut Interpreter<'_, '_>, arg: Option<&Expr>, out: &mut Vec<Node>) -> bool {
    match eval_arg(interp, arg) {
        Some(v) => {
            out.extend(promote_second(v));
            true
        }
        None => false,
    }
}

fn group(interp: &mut Interpreter<'_, '_>, arg: Option<&Expr>, out: &mut Vec<Node>) -> bool {
    let start = interp.cursor().offset();
    match eval_arg(interp, arg) {
        Some(v) => {
            out.push(Node::group(v, start));
            true
        }
        None => false,
    }
}

/// Retries `arg` at every position from the cursor up to, but not including,
/// the end of input. On success the cursor is wherever `arg` left it; on
/// failure it is restored.
fn scan(interp: &mut Interpreter<'_, '_>, arg: &Expr, out: &mut Vec<Node>) -> bool {
    let start = interp.cursor().mark();
    while interp.cursor().has_more() {
        let mut v = Vec::new();
        if interp.eval(arg, &mut v) {
            out.extend(v);
            return true;
        }
        interp.cursor().advance();
    }
    interp.cursor().rewind(start);
    false
}

fn find(interp: &mut Interpreter<'_, '_>, arg: Option<&Expr>, out: &mut Vec<Node>) -> bool {
    match arg {
        Some(arg) => scan(interp, arg, out),
        None => false,
    }
}

fn until(interp: &mut Interpreter<'_, '_>, arg: Option<&Expr>, out: &mut Vec<Node>) -> bool {
    let arg = match arg {
        Some(arg) => arg,
        None => return false,
    };

    let start = interp.cursor().mark();
    while interp.cursor().has_more() {
        let stop = interp.cursor().mark();
        if eval_arg(interp, Some(arg)).is_some() {
            interp.cursor().rewind(stop);
            let skipped = interp.cursor().text_since(start);
            interp.emit_token(out, skipped);
            return true;
        }
        interp.cursor().advance();
    }
    interp.cursor().rewind(start);
    false
}

fn save(interp: &mut Interpreter<'_, '_>, arg: Option<&Expr>, out: &mut Vec<Node>) -> bool {
    let start = interp.cursor().mark();
    match eval_arg(interp, arg) {
        Some(v) if !v.is_empty() => {
            interp.set_register(v[0].text.clone());
            out.extend(v);
            true
        }
        Some(_) => {
            interp.cursor().rewind(start);
            false
        }
        None => false,
    }
}

fn load(interp: &mut Interpreter<'_, '_>, _arg: Option<&Expr>, out: &mut Vec<Node>) -> bool {
    let saved = interp.register().to_owned();
    if interp.cursor().match_literal(&saved) {
        interp.emit_token(out, &saved);
        true
    } else {
        false
    }
}

fn text(interp: &mut Interpreter<'_, '_>, arg: Option<&Expr>, out: &mut Vec<Node>) -> bool {
    let injected = match arg {
        Some(Expr::Plain(text)) => text.as_str(),
        _ => "",
    };
    interp.emit_token(out, injected);
    true
}

fn capture(interp: &mut Interpreter<'_, '_>, arg: Option<&Expr>, out: &mut Vec<Node>) -> bool {
    let start = interp.cursor().mark();
    match eval_arg(interp, arg) {
        Some(_) => {
            let span = interp.cursor().text_since(start);
            interp.emit_token(out, span);
            true
        }
        None => false,
    }
}

fn concat(interp: &mut Interpreter<'_, '_>, arg: Option<&Expr>, out: &mut Vec<Node>) -> bool {
    match eval_arg(interp, arg) {
        Some(v) => {
            let joined = join(&v);
            interp.emit_token(out, &joined);
            true
        }
        None => false,
    }
}

fn reverse(interp: &mut Interpreter<'_, '_>, arg: Option<&Expr>, out: &mut Vec<Node>) -> bool {
    match eval_arg(interp, arg) {
        Some(mut v) => {
            v.reverse();
            out.extend(v);
            true
        }
        None => false,
    }
}

fn any_not(interp: &mut Interpreter<'_, '_>, arg: Option<&Expr>, out: &mut Vec<Node>) -> bool {
    let start = interp.cursor().mark();
    if eval_arg(interp, arg).is_some() {
        interp.cursor().rewind(start);
        return false;
    }
    if interp.cursor().advance() {
        let unit = interp.cursor().text_since(start);
        interp.emit_token(out, unit);
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Kind;

    fn run(grammar: &str, input: &str) -> Node {
        let registry = Registry::default();
        let g = registry.compile(grammar);
        registry.parse(&g, input)
    }

    fn texts(node: &Node) -> Vec<&str> {
        node.children.iter().map(|n| n.text.as_str()).collect()
    }

    #[test]
    fn test_register_errors() {
        let mut registry = Registry::default();
        assert_eq!(
            registry.register("GROUP", Arity::One, |_, _, _| true),
            Err(RegistryError::Duplicate { name: "GROUP".into() })
        );
        assert_eq!(
            registry.register("NOT-OK", Arity::One, |_, _, _| true),
            Err(RegistryError::InvalidName { name: "NOT-OK".into() })
        );
        assert!(registry.lookup("NOPE").is_err());
        assert_eq!(registry.arity("LOAD"), Some(Arity::Zero));
        assert!(Registry::new().lookup("GROUP").is_err());
        assert!(registry.contains("UNTIL"));
        assert!(!registry.contains("NOT-OK"));
        assert!(!Registry::new().contains("ROOT"));
    }

    #[test]
    fn test_custom_function() {
        let mut registry = Registry::default();
        registry
            .register("UPPER", Arity::One, |interp, arg, out| {
                let mut v = Vec::new();
                match arg {
                    Some(arg) if interp.eval(arg, &mut v) => {
                        out.extend(v.into_iter().map(|n| Node {
                            text: n.text.to_uppercase(),
                            ..n
                        }));
                        true
                    }
                    _ => false,
                }
            })
            .unwrap();

        let g = registry.compile("root = UPPER('ab'r) 'c'");
        let tree = registry.parse(&g, "abc");
        assert_eq!(texts(&tree), vec!["AB", "c"]);
    }

    #[test]
    fn test_root_promotes_second() {
        let tree = run(r"root = ROOT('\d'r '+' '\d'r)", "1+2");
        assert_eq!(tree.kind, Kind::Expr);
        assert_eq!(tree.text, "+");
        assert_eq!(tree.pos, 1);
        assert_eq!(texts(&tree), vec!["1", "2"]);

        let single = run("root = ROOT('a')", "a");
        assert_eq!(single, Node::ident("a", 0));
    }

    #[test]
    fn test_group() {
        let tree = run("root = GROUP('a')", "a");
        assert_eq!(tree.kind, Kind::Group);
        assert_eq!(texts(&tree), vec!["a"]);

        let empty = run("root = GROUP('a'?)", "");
        assert_eq!(empty.kind, Kind::Group);
        assert!(empty.children.is_empty());
    }

    #[test]
    fn test_find() {
        assert_eq!(run("root = FIND('x')", "abx"), Node::ident("x", 2));
        assert_eq!(run("root = FIND('x')", "abc"), Node::error(0));
    }

    #[test]
    fn test_find_never_tries_end_of_input() {
        assert_eq!(run("root = FIND(EOF)", "ab"), Node::error(0));
        assert_eq!(run("root = FIND('x'?)", ""), Node::error(0));
    }

    #[test]
    fn test_until_stops_before_match() {
        let tree = run("root = UNTIL('x') 'x'", "abx");
        assert_eq!(tree.children, vec![Node::ident("ab", 0), Node::ident("x", 2)]);
        assert_eq!(run("root = UNTIL('x')", "abc"), Node::error(0));
    }

    #[test]
    fn test_until_never_tries_end_of_input() {
        assert_eq!(run("root = UNTIL(EOF)", "ab"), Node::error(0));
        assert_eq!(run("root = UNTIL('x'?)", ""), Node::error(0));
        assert_eq!(run("root = 'a' UNTIL(EOF)? 'b'", "ab").children.len(), 2);
    }

    #[test]
    fn test_save_load() {
        let tree = run(r#"root = SAVE(('\''|'"')) UNTIL(LOAD()) LOAD()"#, r#""hi""#);
        assert_eq!(texts(&tree), vec!["\"", "hi", "\""]);

        assert!(run("root = SAVE('a'i)", "a").is_error());
    }

    #[test]
    fn test_text() {
        let tree = run("root = 'a' TEXT('b') TEXT()", "a");
        assert_eq!(texts(&tree), vec!["a", "b", ""]);
    }

    #[test]
    fn test_match_and_join() {
        assert_eq!(run("root = MATCH('a' 'b'i 'c')", "abc"), Node::ident("abc", 0));
        assert_eq!(run("root = JOIN('a' 'b'i GROUP('c'))", "abc").text, "ac");
    }

    #[test]
    fn test_reverse() {
        let tree = run("root = REVERSE('a' 'b' 'c')", "abc");
        assert_eq!(texts(&tree), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_any_not() {
        let tree = run("root = ANYNOT('x')* 'x'", "aax");
        assert_eq!(
            tree.children,
            vec![Node::ident("a", 0), Node::ident("a", 1), Node::ident("x", 2)]
        );
        assert!(run("root = ANYNOT('x')", "").is_error());
    }
}
