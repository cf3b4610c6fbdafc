//! Serialization of the residual lexeme stream.
//!
//! Lexeme texts are written verbatim; a single space is inserted between
//! two lexemes only when writing them back to back would merge them into
//! a different lexeme on a relex.

use std::io;
use std::io::Write;

use crate::lexeme::LexemeKind;
use crate::stream::LexemeList;

pub fn write_lexemes<W: Write>(list: &LexemeList, out: &mut W) -> io::Result<()> {
    let mut iter = list.iter().peekable();
    while let Some(cur) = iter.next() {
        out.write_all(cur.text().as_bytes())?;
        if let Some(next) = iter.peek() {
            if needs_space(cur.kind, next.kind) {
                out.write_all(b" ")?;
            }
        }
    }
    Ok(())
}

/// Would `a` directly followed by `b` lex back as something else?
fn needs_space(a: LexemeKind, b: LexemeKind) -> bool {
    use crate::lexeme::LexemeKind::*;
    match a {
        Identifier | Octal | Decimal | Hexadecimal | Float => match b {
            Identifier | Octal | Decimal | Hexadecimal | Float => true,
            _ => false,
        },
        Eq | BitAnd | BitOr | BitXor | Hash => b == a,
        Lt | Not | BitNot | Plus | Minus | Mul | Pow | Div | Mod | Concat | ConcatSpace => {
            b == a || b == Eq
        }
        Gt => match b {
            Gt | Eq | Shr => true,
            _ => false,
        },
        Shr => match b {
            Shr | Eq | Gt => true,
            _ => false,
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::needs_space;
    use crate::lexeme::LexemeKind::*;

    #[test]
    fn words_and_numbers_keep_apart() {
        assert!(needs_space(Identifier, Identifier));
        assert!(needs_space(Identifier, Decimal));
        assert!(needs_space(Octal, Hexadecimal));
        assert!(needs_space(Float, Identifier));
        assert!(!needs_space(Identifier, OpenParen));
        assert!(!needs_space(Decimal, Semicolon));
    }

    #[test]
    fn operators_that_would_merge() {
        assert!(needs_space(Eq, Eq));
        assert!(needs_space(Lt, Eq));
        assert!(needs_space(Lt, Lt));
        assert!(needs_space(Plus, Eq));
        assert!(needs_space(Plus, Plus));
        assert!(needs_space(Minus, Minus));
        assert!(needs_space(Mul, Mul));
        assert!(needs_space(BitAnd, BitAnd));
        assert!(needs_space(Concat, Eq));
        assert!(needs_space(ConcatSpace, Eq));
        assert!(needs_space(Hash, Hash));
        assert!(needs_space(Gt, Gt));
        assert!(needs_space(Gt, Shr));
        assert!(needs_space(Gt, Eq));
        assert!(needs_space(Shr, Gt));
        assert!(needs_space(Shr, Shr));
        assert!(needs_space(Shr, Eq));
    }

    #[test]
    fn harmless_neighbours_stay_tight() {
        assert!(!needs_space(Eq, Decimal));
        assert!(!needs_space(Comma, Comma));
        assert!(!needs_space(OpenParen, CloseParen));
        assert!(!needs_space(Semicolon, LineEnd));
        assert!(!needs_space(Not, Identifier));
        assert!(!needs_space(Shl, Lt));
    }
}
