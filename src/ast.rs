//! The result tree produced by interpreting a grammar.

use std::fmt;

/// The kind of a result [`Node`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    /// A token: matched (or injected) text at a position.
    Ident,
    /// A structural container with no text of its own.
    Group,
    /// An operator node built by `ROOT` promotion; the text is the operator.
    Expr,
    /// A failed parse; only the position is meaningful.
    Error,
    /// A node re-tagged by a type annotation such as `'a':Foo`.
    Named(String),
}

impl Kind {
    /// Builds the kind for a type annotation name.
    ///
    /// Annotations that spell one of the built-in kinds map onto it, so
    /// `x:Group` and a real group compare equal.
    pub fn named(name: &str) -> Kind {
        match name {
            "Ident" => Kind::Ident,
            "Group" => Kind::Group,
            "Expr" => Kind::Expr,
            "Error" => Kind::Error,
            _ => Kind::Named(name.to_owned()),
        }
    }

    /// The display name of this kind.
    pub fn as_str(&self) -> &str {
        match self {
            Kind::Ident => "Ident",
            Kind::Group => "Group",
            Kind::Expr => "Expr",
            Kind::Error => "Error",
            Kind::Named(name) => name,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node of the result tree.
///
/// Nodes own their children; the tree has no sharing and no cycles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    /// The node kind.
    pub kind: Kind,

    /// The token text, operator text, or empty for containers.
    pub text: String,

    /// The byte offset in the input where this node's text begins.
    pub pos: usize,

    /// Child nodes, in emission order.
    pub children: Vec<Node>,
}

impl Node {
    /// Constructs a token.
    pub fn ident<S: Into<String>>(text: S, pos: usize) -> Node {
        Node {
            kind: Kind::Ident,
            text: text.into(),
            pos,
            children: Vec::new(),
        }
    }

    /// Constructs a container.
    pub fn group(children: Vec<Node>, pos: usize) -> Node {
        Node {
            kind: Kind::Group,
            text: String::new(),
            pos,
            children,
        }
    }

    /// Constructs a failure marker at `pos`.
    pub fn error(pos: usize) -> Node {
        Node {
            kind: Kind::Error,
            text: String::new(),
            pos,
            children: Vec::new(),
        }
    }

    /// Adds `children` to this node, making it an operator node if it was a
    /// plain token.
    pub fn promote(mut self, children: Vec<Node>) -> Node {
        if self.kind == Kind::Ident {
            self.kind = Kind::Expr;
        }
        self.children.extend(children);
        self
    }

    /// Check whether this node marks a failed parse.
    pub fn is_error(&self) -> bool {
        self.kind == Kind::Error
    }

    /// Check whether this node is a leaf.
    pub fn is_token(&self) -> bool {
        self.children.is_empty() && self.kind != Kind::Group && self.kind != Kind::Error
    }
}

/// Returns the nodes of `tree` flattened up to `depth` levels.
///
/// A `depth` of zero flattens all the way down to the leaves. Leaves are
/// returned as-is, as are nodes at the depth limit.
pub fn flatten(tree: &Node, depth: usize) -> Vec<&Node> {
    fn walk<'a>(node: &'a Node, depth: Option<usize>, out: &mut Vec<&'a Node>) {
        if node.children.is_empty() || depth == Some(0) {
            out.push(node);
            return;
        }
        for child in &node.children {
            walk(child, depth.map(|d| d - 1), out);
        }
    }

    let mut out = Vec::new();
    let limit = if depth == 0 { None } else { Some(depth) };
    walk(tree, limit, &mut out);
    out
}

/// Concatenates the text of `nodes` and all their descendants, depth first.
pub fn join(nodes: &[Node]) -> String {
    fn walk(nodes: &[Node], out: &mut String) {
        for node in nodes {
            out.push_str(&node.text);
            walk(&node.children, out);
        }
    }

    let mut out = String::new();
    walk(nodes, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Node {
        Node::group(
            vec![
                Node::ident("a", 0),
                Node::group(vec![Node::ident("b", 1), Node::ident("c", 2)], 1),
            ],
            0,
        )
    }

    #[test]
    fn test_flatten_all() {
        let tree = sample();
        let texts: Vec<_> = flatten(&tree, 0).iter().map(|n| n.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_flatten_one_level() {
        let tree = sample();
        let flat = flatten(&tree, 1);
        assert_eq!(flat.len(), 2);
        assert_eq!(flat[0].text, "a");
        assert_eq!(flat[1].kind, Kind::Group);
    }

    #[test]
    fn test_join() {
        assert_eq!(join(&[sample()]), "abc");
        assert_eq!(join(&[]), "");
    }

    #[test]
    fn test_promote() {
        let op = Node::ident("+", 1).promote(vec![Node::ident("1", 0), Node::ident("2", 2)]);
        assert_eq!(op.kind, Kind::Expr);
        assert_eq!(op.children.len(), 2);

        let typed = Node {
            kind: Kind::named("Op"),
            ..Node::ident("-", 0)
        };
        assert_eq!(typed.promote(Vec::new()).kind, Kind::Named("Op".into()));
    }

    #[test]
    fn test_is_token() {
        assert!(Node::ident("a", 0).is_token());
        assert!(!Node::group(Vec::new(), 0).is_token());
        assert!(!Node::error(0).is_token());
        assert!(!sample().children[1].is_token());

        let op = Node::ident("+", 1).promote(vec![Node::ident("1", 0)]);
        assert!(!op.is_token());
    }

    #[test]
    fn test_kind_named() {
        assert_eq!(Kind::named("Group"), Kind::Group);
        assert_eq!(Kind::named("Foo").to_string(), "Foo");
    }
}
