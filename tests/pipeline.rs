//! End-to-end: source, iterator, tokenizer and combiner together.

use std::io::Write;

use pretty_assertions::assert_eq;
use rulelex::{
    BufferedOptions, BufferedStringIterator, ByteIterator, Combiner, FileSource, GroupName,
    LexError, LexResult, MemorySource, StatefulIterator, StringIterator, Token, Tokenizer,
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

fn text(s: &str) -> Value {
    Value::Text(s.to_owned())
}

/// Words, numbers, quoted strings (one CHAR per character) and bracketed arrays.
fn tokenizer() -> Tokenizer<Value> {
    Tokenizer::builder()
        .rule("$", |_, _| Some(Token::eof(Value::Null)))
        .and_then(|b| b.rule(r"[\s,]+", |_, _| None))
        .and_then(|b| {
            b.rule(r"\d+", |m, _| {
                Some(Token::new("NUMBER", Value::Number(m[0].parse().unwrap_or_default())))
            })
        })
        .and_then(|b| b.rule(r"\w+", |m, _| Some(Token::new("WORD", text(&m[0])))))
        .and_then(|b| {
            b.rule("\"", |_, lexer| {
                lexer.push_state("string");
                Some(Token::start(text("STRING")))
            })
        })
        .and_then(|b| b.rule(r"\[", |_, _| Some(Token::start(text("ARRAY")))))
        .and_then(|b| b.rule(r"\]", |_, _| Some(Token::end(text("ARRAY")))))
        .and_then(|b| {
            b.state_rule("string", "\"", |_, lexer| {
                lexer.pop_state();
                Some(Token::end(text("STRING")))
            })
        })
        .and_then(|b| b.state_rule("string", ".", |m, _| Some(Token::new("CHAR", text(&m[0])))))
        .expect("could not compile rules")
        .build()
}

fn combiner() -> Combiner<Value> {
    Combiner::default()
        .rule("STRING", |children| {
            let joined = children
                .into_iter()
                .filter_map(|token| match token.value {
                    Value::Text(text) => Some(text),
                    _ => None,
                })
                .collect::<String>();
            Token::new("STRING", Value::Text(joined))
        })
        .rule("ARRAY", |children| {
            Token::new(
                "ARRAY",
                Value::List(children.into_iter().map(|token| token.value).collect()),
            )
        })
}

fn combined<I: StatefulIterator>(input: I) -> LexResult<Vec<Token<Value>>> {
    let tokenizer = tokenizer();
    let combiner = combiner();
    let tokens = tokenizer.map(input, Vec::<String>::new());
    combiner.map(tokens, Vec::new()).collect()
}

#[test]
fn strings_between_words() {
    let got = combined(StringIterator::new(r#"BT "Abc" ET"#)).unwrap();
    assert_eq!(
        got,
        [
            Token::new("WORD", text("BT")),
            Token::new("STRING", text("Abc")),
            Token::new("WORD", text("ET")),
            Token::eof(Value::Null),
        ]
    );
}

#[test]
fn arrays_of_strings_and_numbers() {
    let got = combined(StringIterator::new(r#"["Abc", 10, "Def", 20]"#)).unwrap();
    assert_eq!(
        got,
        [
            Token::new(
                "ARRAY",
                Value::List(vec![
                    text("Abc"),
                    Value::Number(10),
                    text("Def"),
                    Value::Number(20),
                ])
            ),
            Token::eof(Value::Null),
        ]
    );
}

#[test]
fn nested_arrays() {
    let got = combined(StringIterator::new("[[1, [2]], []]")).unwrap();
    assert_eq!(
        got[0].value,
        Value::List(vec![
            Value::List(vec![Value::Number(1), Value::List(vec![Value::Number(2)])]),
            Value::List(vec![]),
        ])
    );
}

#[test]
fn every_input_variant_agrees() {
    let input = "say [\"caf\u{e9}\", 7] twice";
    let expected = combined(StringIterator::new(input)).unwrap();
    assert_eq!(expected.len(), 4);

    assert_eq!(combined(ByteIterator::new(input)).unwrap(), expected);
    assert_eq!(
        combined(BufferedStringIterator::with_options(
            MemorySource::new(input),
            BufferedOptions { block_size: 5 },
        ))
        .unwrap(),
        expected
    );

    let mut file = tempfile::tempfile().unwrap();
    file.write_all(input.as_bytes()).unwrap();
    let from_file = combined(BufferedStringIterator::new(FileSource::new(&file))).unwrap();
    assert_eq!(from_file, expected);
}

#[test]
fn unmatched_punctuation_fails() {
    match combined(StringIterator::new("This is a simple sentence!")) {
        Err(LexError::NoMatch { state, excerpt }) => {
            assert_eq!(state, "<default>");
            assert_eq!(excerpt, "!");
        }
        v => panic!("unexpected result: {v:?}"),
    }
}

#[test]
fn unclosed_array_fails() {
    assert!(matches!(
        combined(StringIterator::new("[1, 2")),
        Err(LexError::UnclosedSpan { depth: 1 })
    ));
}
