extern crate preprocessor;

use std::rc::Rc;

use preprocessor::lexeme::LexemeKind;
use preprocessor::lexeme::LexemeKind::*;
use preprocessor::tokenizer;

fn lex(content: &str) -> (Vec<(LexemeKind, String)>, Vec<&'static str>) {
    let file: Rc<str> = Rc::from("test.uc");
    let content: Rc<str> = Rc::from(content);
    let (lexemes, errors) = tokenizer::run(&file, &content);
    (
        lexemes
            .iter()
            .map(|l| (l.kind, l.text().to_string()))
            .collect(),
        errors.iter().map(|e| e.message).collect(),
    )
}

fn kinds(content: &str) -> Vec<LexemeKind> {
    lex(content).0.into_iter().map(|(k, _)| k).collect()
}

#[test]
fn empty_file() {
    let (lexemes, errors) = lex("");
    assert!(lexemes.is_empty());
    assert!(errors.is_empty());
}

#[test]
fn whitespace_collapses() {
    let (lexemes, errors) = lex(" \t\x0b\x0c ");
    assert_eq!(lexemes.len(), 1);
    assert_eq!(lexemes[0].0, Whitespace);
    assert!(errors.is_empty());
}

#[test]
fn line_endings() {
    assert_eq!(kinds("\n"), [LineEnd]);
    assert_eq!(kinds("\r"), [LineEnd]);
    assert_eq!(kinds("\r\n"), [LineEnd]);
    assert_eq!(kinds("\n\r\n\r"), [LineEnd, LineEnd, LineEnd]);
}

#[test]
fn crlf_text_is_kept() {
    let (lexemes, _) = lex("a\r\nb");
    assert_eq!(lexemes[1], (LineEnd, "\r\n".to_string()));
}

#[test]
fn lines_and_columns() {
    let file: Rc<str> = Rc::from("test.uc");
    let content: Rc<str> = Rc::from("a\nbc  d");
    let (lexemes, _) = tokenizer::run(&file, &content);
    let positions: Vec<(u32, u32, &str)> = lexemes
        .iter()
        .map(|l| (l.line, l.column, l.text()))
        .collect();
    assert_eq!(
        positions,
        [
            (1, 0, "a"),
            (1, 1, "\n"),
            (2, 0, "bc"),
            (2, 2, "  "),
            (2, 4, "d"),
        ]
    );
}

#[test]
fn byte_order_mark_is_skipped() {
    let (lexemes, errors) = lex("\u{feff}x");
    assert_eq!(lexemes, [(Identifier, "x".to_string())]);
    assert!(errors.is_empty());
}

#[test]
fn identifiers() {
    assert_eq!(
        lex("foo _bar9 X").0,
        [
            (Identifier, "foo".to_string()),
            (Whitespace, " ".to_string()),
            (Identifier, "_bar9".to_string()),
            (Whitespace, " ".to_string()),
            (Identifier, "X".to_string()),
        ]
    );
}

#[test]
fn numeric_literals() {
    assert_eq!(lex("0").0, [(Octal, "0".to_string())]);
    assert_eq!(lex("007").0, [(Octal, "007".to_string())]);
    assert_eq!(lex("123").0, [(Decimal, "123".to_string())]);
    assert_eq!(lex("0x1F").0, [(Hexadecimal, "0x1F".to_string())]);
    assert_eq!(lex("0XAB").0, [(Hexadecimal, "0XAB".to_string())]);
    assert_eq!(lex("0.").0, [(Float, "0.".to_string())]);
    assert_eq!(lex("0.f").0, [(Float, "0.f".to_string())]);
    assert_eq!(lex("1.25").0, [(Float, "1.25".to_string())]);
    assert_eq!(lex("1.5e+3").0, [(Float, "1.5e+3".to_string())]);
    assert_eq!(lex("1.5E10F").0, [(Float, "1.5E10F".to_string())]);
}

#[test]
fn bad_octal_becomes_decimal() {
    let (lexemes, errors) = lex("08");
    assert_eq!(lexemes, [(Decimal, "08".to_string())]);
    assert_eq!(errors, ["invalid octal literal"]);
}

#[test]
fn hexadecimal_without_digits() {
    let (lexemes, errors) = lex("0x");
    assert_eq!(lexemes, [(Hexadecimal, "0x".to_string())]);
    assert_eq!(errors, ["invalid hexadecimal literal"]);
}

#[test]
fn float_with_broken_exponent() {
    let (lexemes, errors) = lex("1.e;");
    assert_eq!(lexemes[0], (Float, "1.e".to_string()));
    assert_eq!(errors, ["invalid float literal"]);
}

#[test]
fn operators_munch_maximally() {
    assert_eq!(
        kinds(">>> >> >= >"),
        [ShrUnsigned, Whitespace, Shr, Whitespace, GtEq, Whitespace, Gt]
    );
    assert_eq!(
        kinds("<< <= <"),
        [Shl, Whitespace, LtEq, Whitespace, Lt]
    );
    assert_eq!(
        kinds("** *= *"),
        [Pow, Whitespace, MulEq, Whitespace, Mul]
    );
    assert_eq!(
        kinds("== = != !"),
        [EqEq, Whitespace, Eq, Whitespace, Neq, Whitespace, Not]
    );
    assert_eq!(
        kinds("&& & || | ^^ ^"),
        [
            And, Whitespace, BitAnd, Whitespace, Or, Whitespace, BitOr,
            Whitespace, Xor, Whitespace, BitXor
        ]
    );
    assert_eq!(
        kinds("~= ~ ## #"),
        [Almost, Whitespace, BitNot, Whitespace, TokenConcat, Whitespace, Hash]
    );
    assert_eq!(
        kinds("$= $ @= @"),
        [ConcatEq, Whitespace, Concat, Whitespace, ConcatSpaceEq, Whitespace, ConcatSpace]
    );
    assert_eq!(
        kinds("++ += + -- -= -"),
        [
            Increment, Whitespace, AddEq, Whitespace, Plus, Whitespace,
            Decrement, Whitespace, SubEq, Whitespace, Minus
        ]
    );
    assert_eq!(kinds("/= /"), [DivEq, Whitespace, Div]);
    assert_eq!(kinds("%= %"), [ModEq, Whitespace, Mod]);
}

#[test]
fn dots_and_ellipsis() {
    assert_eq!(kinds("..."), [Ellipsis]);
    assert_eq!(kinds(".."), [Dot, Dot]);
    assert_eq!(kinds(". ,:;(){}[]"), [
        Dot, Whitespace, Comma, Colon, Semicolon, OpenParen, CloseParen,
        OpenBrace, CloseBrace, OpenBracket, CloseBracket
    ]);
}

#[test]
fn strings_and_names() {
    assert_eq!(lex("\"foo\"").0, [(StringLiteral, "\"foo\"".to_string())]);
    assert_eq!(
        lex("\"a\\\"b\"").0,
        [(StringLiteral, "\"a\\\"b\"".to_string())]
    );
    assert_eq!(lex("'Engine'").0, [(NameLiteral, "'Engine'".to_string())]);
}

#[test]
fn unterminated_strings() {
    let (lexemes, errors) = lex("\"abc");
    assert!(lexemes.is_empty());
    assert_eq!(errors, ["unclosed string"]);

    let (lexemes, errors) = lex("\"abc\nx");
    assert_eq!(
        lexemes,
        [(LineEnd, "\n".to_string()), (Identifier, "x".to_string())]
    );
    assert_eq!(errors, ["unclosed string"]);

    let (_, errors) = lex("'abc");
    assert_eq!(errors, ["unclosed name"]);
}

#[test]
fn comments() {
    assert_eq!(
        lex("// hi\nx").0,
        [
            (Comment, "// hi".to_string()),
            (LineEnd, "\n".to_string()),
            (Identifier, "x".to_string()),
        ]
    );
    assert_eq!(
        lex("/* a */x").0,
        [
            (Comment, "/* a */".to_string()),
            (Identifier, "x".to_string()),
        ]
    );
}

#[test]
fn block_comment_spans_lines() {
    let file: Rc<str> = Rc::from("test.uc");
    let content: Rc<str> = Rc::from("/* a\nb */x");
    let (lexemes, errors) = tokenizer::run(&file, &content);
    assert!(errors.is_empty());
    assert_eq!(lexemes[0].kind, Comment);
    assert_eq!(lexemes[1].text(), "x");
    assert_eq!(lexemes[1].line, 2);
}

#[test]
fn unterminated_block_comment() {
    let (lexemes, errors) = lex("/* oops");
    assert_eq!(lexemes, [(Comment, "/* oops".to_string())]);
    assert_eq!(errors, ["unexpected EOF in comment"]);
}

#[test]
fn line_splice_emits_nothing() {
    let file: Rc<str> = Rc::from("test.uc");
    let content: Rc<str> = Rc::from("a\\\nb");
    let (lexemes, errors) = tokenizer::run(&file, &content);
    assert!(errors.is_empty());
    let texts: Vec<&str> = lexemes.iter().map(|l| l.text()).collect();
    assert_eq!(texts, ["a", "b"]);
    assert_eq!(lexemes[1].line, 2);

    let content: Rc<str> = Rc::from("a\\\r\nb");
    let (lexemes, _) = tokenizer::run(&file, &content);
    assert_eq!(lexemes.len(), 2);

    // a bare carriage return splices too
    let content: Rc<str> = Rc::from("a\\\rb");
    let (lexemes, _) = tokenizer::run(&file, &content);
    let texts: Vec<&str> = lexemes.iter().map(|l| l.text()).collect();
    assert_eq!(texts, ["a", "b"]);
    assert_eq!(lexemes[1].line, 2);
}

#[test]
fn lone_backslash_at_eof() {
    assert_eq!(kinds("a\\"), [Identifier, Backslash]);
    assert_eq!(kinds("\\x"), [Backslash, Identifier]);
}

#[test]
fn unknown_bytes_are_dropped() {
    let (lexemes, errors) = lex("a ` b");
    assert_eq!(
        lexemes,
        [
            (Identifier, "a".to_string()),
            (Whitespace, " ".to_string()),
            (Whitespace, " ".to_string()),
            (Identifier, "b".to_string()),
        ]
    );
    assert_eq!(errors, ["dropping unexpected symbol"]);
}

#[test]
fn high_bytes_ride_in_whitespace() {
    let (lexemes, errors) = lex("a é b");
    assert!(errors.is_empty());
    assert_eq!(lexemes.len(), 3);
    assert_eq!(lexemes[1].0, Whitespace);
}
