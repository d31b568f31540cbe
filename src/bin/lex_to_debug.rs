//! Tokenize a file and print the resulting tokens.
//!
//! Uses a small demonstration grammar: words, integers, double-quoted strings
//! and bracketed arrays. Strings and arrays are lexed as START...END spans and
//! folded into single tokens by the combiner.
//!
//! Tokens go to stdout, one per line, in `Debug` form. Set `RUST_LOG=trace`
//! to watch the rules fire on stderr.
//!
//! ```ignore
//! lex_to_debug input.txt
//! ```

use std::fs::File;
use std::process::ExitCode;

use rulelex::{
    BufferedStringIterator, Combiner, FileSource, GroupName, LexResult, Token, Tokenizer,
};

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Null,
    Text(String),
    Number(i64),
    List(Vec<Value>),
}

impl GroupName for Value {
    fn group_name(&self) -> Option<&str> {
        match self {
            Value::Text(group) => Some(group.as_str()),
            _ => None,
        }
    }
}

fn group(name: &str) -> Value {
    Value::Text(name.to_owned())
}

fn tokenizer() -> LexResult<Tokenizer<Value>> {
    Ok(Tokenizer::builder()
        .rule("$", |_, _| Some(Token::eof(Value::Null)))?
        .rule(r"[\s,]+", |_, _| None)?
        .rule(r"-?\d+", |m, _| {
            let value = m[0].parse().map_or(Value::Null, Value::Number);
            Some(Token::new("NUMBER", value))
        })?
        .rule(r"\w+", |m, _| Some(Token::new("WORD", Value::Text(m[0].to_owned()))))?
        .rule("\"", |_, lexer| {
            lexer.push_state("string");
            Some(Token::start(group("STRING")))
        })?
        .rule(r"\[", |_, _| Some(Token::start(group("ARRAY"))))?
        .rule(r"\]", |_, _| Some(Token::end(group("ARRAY"))))?
        .state_rule("string", r"\\(.)", |m, _| {
            Some(Token::new("CHAR", Value::Text(m[1].to_owned())))
        })?
        .state_rule("string", "\"", |_, lexer| {
            lexer.pop_state();
            Some(Token::end(group("STRING")))
        })?
        .state_rule("string", r#"[^"\\]+"#, |m, _| {
            Some(Token::new("CHAR", Value::Text(m[0].to_owned())))
        })?
        .build())
}

fn combiner() -> Combiner<Value> {
    Combiner::default()
        .rule("STRING", |children| {
            let text = children
                .into_iter()
                .filter_map(|token| match token.value {
                    Value::Text(text) => Some(text),
                    _ => None,
                })
                .collect();
            Token::new("STRING", Value::Text(text))
        })
        .rule("ARRAY", |children| {
            Token::new(
                "ARRAY",
                Value::List(children.into_iter().map(|token| token.value).collect()),
            )
        })
}

fn run(path: &str) -> LexResult<()> {
    let file = File::open(path)?;
    let input = BufferedStringIterator::new(FileSource::new(&file));
    let tokenizer = tokenizer()?;
    let combiner = combiner();
    for token in combiner.map(tokenizer.map(input, Vec::<String>::new()), Vec::new()) {
        println!("{:?}", token?);
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: lex_to_debug <file>");
        return ExitCode::FAILURE;
    };
    match run(&path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e.annotate(&path));
            ExitCode::FAILURE
        }
    }
}
