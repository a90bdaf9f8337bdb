use grammex::{ast::flatten, compile, parse, Kind, Node};
use rstest::rstest;

const EXPR: &str = r"
    expr   = term ROOT('+') expr | term
    term   = factor ROOT('*') term | factor
    factor = '('i expr ')'i | value
    value  = '\d+'r
";

fn op(text: &str, pos: usize, children: Vec<Node>) -> Node {
    Node {
        kind: Kind::Expr,
        text: text.into(),
        pos,
        children,
    }
}

fn leaf(text: &str, pos: usize) -> Node {
    Node::ident(text, pos)
}

fn emitted(tree: &Node) -> Option<usize> {
    if tree.is_error() {
        None
    } else if tree.kind == Kind::Group {
        Some(tree.children.len())
    } else {
        Some(1)
    }
}

#[test]
fn precedence_climbing() {
    let tree = parse(&compile(EXPR), "6+5*(4+3)*2");

    let expected = op(
        "+",
        1,
        vec![
            leaf("6", 0),
            op(
                "*",
                3,
                vec![
                    leaf("5", 2),
                    op(
                        "*",
                        9,
                        vec![op("+", 6, vec![leaf("4", 5), leaf("3", 7)]), leaf("2", 10)],
                    ),
                ],
            ),
        ],
    );
    assert_eq!(tree, expected);
}

#[test]
fn grammar_is_reusable() {
    let grammar = compile(EXPR);
    assert_eq!(parse(&grammar, "1").text, "1");
    assert_eq!(parse(&grammar, "1*2").text, "*");
    assert!(parse(&grammar, "+").is_error());
}

#[test]
fn grouped_declaration() {
    let grammar = compile(
        r"
        root = ws func
        func = 'func'i ws name '('i GROUP(args) ')'i ws '{'i ws GROUP(body) ws '}'i
        args = name ws name
        body = name '.' name '('i name ')'i
        name = '\w+'r
          ws = '\s+'ri
        ",
    );

    let input = "
        func Say(msg string) {
            fmt.Println(msg)
        }
    ";
    let tree = parse(&grammar, input);

    assert_eq!(tree.kind, Kind::Group);
    assert_eq!(tree.children.len(), 3);
    assert_eq!(tree.children[0].text, "Say");

    let args: Vec<_> = tree.children[1].children.iter().map(|n| n.text.as_str()).collect();
    assert_eq!(args, vec!["msg", "string"]);

    let body: Vec<_> = tree.children[2].children.iter().map(|n| n.text.as_str()).collect();
    assert_eq!(body, vec!["fmt", ".", "Println", "msg"]);

    let leaves: Vec<_> = flatten(&tree, 0).iter().map(|n| n.pos).collect();
    assert!(leaves.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn quoted_span_backreference() {
    let grammar = compile(r#"root = SAVE(('\''|'"')) UNTIL(LOAD())"#);

    let tree = parse(&grammar, "'hi'");
    assert_eq!(tree.children, vec![leaf("'", 0), leaf("hi", 1)]);

    let mixed = parse(&grammar, r#""it's""#);
    assert_eq!(mixed.children[1].text, "it's");

    assert!(parse(&grammar, "'unclosed").is_error());
}

#[test]
fn type_annotation_retags() {
    let tree = parse(&compile("root = 'a':Foo"), "a");
    assert_eq!(tree.kind, Kind::Named("Foo".into()));
    assert_eq!(tree.kind.to_string(), "Foo");
    assert_eq!(tree.text, "a");
}

#[test]
fn compile_is_deterministic() {
    assert_eq!(compile(EXPR), compile(EXPR));
}

#[rstest]
#[case("root = 'a'*", "", Some(0))]
#[case("root = 'a'*", "aaab", Some(3))]
#[case("root = 'a'+", "", None)]
#[case("root = 'a'+", "b", None)]
#[case("root = 'a'+", "aa", Some(2))]
#[case("root = 'a'?", "", Some(0))]
#[case("root = 'a'?", "aa", Some(1))]
#[case("root = ANYNOT('x')*", "aax", Some(2))]
#[case("root = 'a' | 'ab'", "ab", Some(1))]
fn quantifier_laws(#[case] grammar: &str, #[case] input: &str, #[case] expected: Option<usize>) {
    let tree = parse(&compile(grammar), input);
    assert_eq!(emitted(&tree), expected);
}
