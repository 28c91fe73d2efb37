use proptest::prelude::*;
use rdlisp::{LispError, TokenKind, Value, parse, parse_one, tokenize};

/// Strategy for source text built only from characters the lexer accepts
fn lisp_text() -> impl Strategy<Value = String> {
    "[()'`,@. a-z0-9;+\\-\n]{0,60}"
}

fn proper_list() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(any::<i64>(), 0..20)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn lexer_never_panics(input in any::<String>()) {
        let _ = tokenize(&input);
    }

    #[test]
    fn reader_never_panics(input in lisp_text()) {
        match parse(&input) {
            Ok(_) | Err(LispError::Lex(_)) | Err(LispError::Parse(_)) => {}
            Err(other) => prop_assert!(false, "unexpected error kind: {other}"),
        }
    }

    #[test]
    fn token_offsets_increase(input in lisp_text()) {
        if let Ok(tokens) = tokenize(&input) {
            prop_assert_eq!(tokens.last().map(|t| &t.kind), Some(&TokenKind::Eof));
            for pair in tokens.windows(2) {
                prop_assert!(pair[0].offset < pair[1].offset || pair[1].kind == TokenKind::Eof);
            }
        }
    }

    #[test]
    fn integer_lists_read_in_order(items in proper_list()) {
        let source: Vec<String> = items.iter().map(i64::to_string).collect();
        let value = parse_one(&format!("({})", source.join(" "))).unwrap();
        let read: Vec<i64> = value
            .list_to_vec()
            .unwrap()
            .iter()
            .map(|v| v.as_integer().unwrap())
            .collect();
        prop_assert_eq!(read, items);
    }

    #[test]
    fn dotted_tail_is_kept(a in any::<i64>(), b in any::<i64>()) {
        let value = parse_one(&format!("({a} . {b})")).unwrap();
        let pair = value.as_pair().unwrap();
        prop_assert_eq!(pair.car(), Value::Integer(a));
        prop_assert_eq!(pair.cdr(), Value::Integer(b));
    }
}
