use grammex::{compile, try_parse, Kind, Node};

const GRAMMAR: &str = r"
    expr   = term ROOT('+') expr | term
    term   = factor ROOT('*') term | factor
    factor = ' *'ri ( '('i expr ')'i | value ) ' *'ri
    value  = '\d+'r
";

fn eval(node: &Node) -> Option<i64> {
    match node.kind {
        Kind::Ident => node.text.parse().ok(),
        Kind::Expr => {
            let lhs = eval(node.children.get(0)?)?;
            let rhs = eval(node.children.get(1)?)?;
            match node.text.as_str() {
                "+" => lhs.checked_add(rhs),
                "*" => lhs.checked_mul(rhs),
                _ => None,
            }
        }
        _ => None,
    }
}

fn main() {
    let args = std::env::args().collect::<Vec<_>>();

    let input = match args.get(1) {
        Some(input) => match input.as_str() {
            "-h" | "--help" => {
                println!("usage: {} <expression>", &args[0]);
                return;
            }
            _ => input.to_owned(),
        },
        None => {
            let stdin = std::io::stdin();
            use std::io::Read;
            let mut input = String::new();
            stdin.lock().read_to_string(&mut input).unwrap();
            input
        }
    };

    let grammar = compile(GRAMMAR);
    match try_parse(&grammar, input.trim()) {
        Ok(tree) => {
            println!("{:#?}", tree);
            match eval(&tree) {
                Some(v) => println!("= {}", v),
                None => eprintln!("could not evaluate expression"),
            }
        }
        Err(e) => {
            eprintln!("{}", e);
        }
    }
}
