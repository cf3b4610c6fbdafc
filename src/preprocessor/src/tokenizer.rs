//! The lexer: one pass over a file's bytes, producing the lexeme run and
//! the lexical errors side by side. A 256-entry category table routes every
//! byte to a scanner state; no state looks further ahead than one byte
//! (two for `...` and `\r\n`).

use std::rc::Rc;

use crate::lexeme::{Lexeme, LexemeKind};

#[derive(Clone, Debug, PartialEq)]
pub struct LexError {
    pub line: u32,
    pub column: u32,
    pub message: &'static str,
}

#[derive(Clone, Copy, PartialEq)]
enum CharCat {
    Err, Ws, Lf, Cr, Not, Dq, Hsh, Dol, Pct, And, Sq, Op, Cp, Mul, Add, Com,
    Sub, Dot, Sl, Nul, Dig, Col, Sc, Lt, Eq, Gt, At, Id, Obk, Bsl, Cbk, Cir,
    Ob, Or, Cb, Til,
}

use self::CharCat::*;

// Bytes above 127 count as whitespace so that multi-byte sequences ride
// along instead of producing a flood of bad-symbol errors.
static DISPATCH_TABLE: [CharCat; 256] = [
    Err, Err, Err, Err, Err, Err, Err, Err, Err, Ws, Lf, Ws, Ws, Cr, Err, Err,
    Err, Err, Err, Err, Err, Err, Err, Err, Err, Err, Err, Err, Err, Err, Err, Err,
    Ws, Not, Dq, Hsh, Dol, Pct, And, Sq, Op, Cp, Mul, Add, Com, Sub, Dot, Sl,
    Nul, Dig, Dig, Dig, Dig, Dig, Dig, Dig, Dig, Dig, Col, Sc, Lt, Eq, Gt, Err,
    At, Id, Id, Id, Id, Id, Id, Id, Id, Id, Id, Id, Id, Id, Id, Id,
    Id, Id, Id, Id, Id, Id, Id, Id, Id, Id, Id, Obk, Bsl, Cbk, Cir, Id,
    Err, Id, Id, Id, Id, Id, Id, Id, Id, Id, Id, Id, Id, Id, Id, Id,
    Id, Id, Id, Id, Id, Id, Id, Id, Id, Id, Id, Ob, Or, Cb, Til, Err,
    Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws,
    Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws,
    Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws,
    Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws,
    Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws,
    Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws,
    Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws,
    Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws, Ws,
];

pub fn run(file: &Rc<str>, content: &Rc<str>) -> (Vec<Lexeme>, Vec<LexError>) {
    let mut t = Tokenizer {
        file: Rc::clone(file),
        content: Rc::clone(content),
        pos: 0,
        line: 1,
        line_start: 0,
        start: 0,
        start_line: 1,
        start_column: 0,
        lexemes: Vec::new(),
        errors: Vec::new(),
    };
    if content.as_bytes().starts_with(&[0xEF, 0xBB, 0xBF]) {
        t.pos = 3;
        t.line_start = 3;
    }
    t.dispatch();
    (t.lexemes, t.errors)
}

struct Tokenizer {
    file: Rc<str>,
    content: Rc<str>,
    pos: usize,
    line: u32,
    line_start: usize,
    start: usize,
    start_line: u32,
    start_column: u32,
    lexemes: Vec<Lexeme>,
    errors: Vec<LexError>,
}

impl Tokenizer {
    fn byte(&self) -> Option<u8> {
        self.content.as_bytes().get(self.pos).copied()
    }

    fn byte_at(&self, at: usize) -> Option<u8> {
        self.content.as_bytes().get(at).copied()
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn begin(&mut self) {
        self.start = self.pos;
        self.start_line = self.line;
        self.start_column = (self.pos - self.line_start) as u32;
    }

    fn produce(&mut self, kind: LexemeKind) {
        self.lexemes.push(Lexeme::new(
            Rc::clone(&self.file),
            kind,
            self.start_line,
            self.start_column,
            &self.content,
            self.start,
            self.pos,
        ));
    }

    fn error(&mut self, message: &'static str) {
        self.errors.push(LexError {
            line: self.line,
            column: (self.pos - self.line_start) as u32,
            message,
        });
    }

    // The consumed newline bytes end at self.pos.
    fn newline(&mut self) {
        self.line += 1;
        self.line_start = self.pos;
    }

    fn dispatch(&mut self) {
        while let Some(b) = self.byte() {
            self.begin();
            match DISPATCH_TABLE[b as usize] {
                Err => {
                    self.error("dropping unexpected symbol");
                    self.bump();
                }
                Ws => self.whitespace(),
                Lf => self.line_end(),
                Cr => self.line_end_cr(),
                Id => self.identifier(),
                Nul => self.octal(),
                Dig => self.decimal(),
                Dq => self.quoted(b'"', LexemeKind::StringLiteral, "unclosed string"),
                Sq => self.quoted(b'\'', LexemeKind::NameLiteral, "unclosed name"),
                Sl => self.slash(),
                Bsl => self.backslash(),
                Dot => self.dot(),
                Add => self.plus(),
                Sub => self.minus(),
                Mul => self.asterisk(),
                Lt => self.less_than(),
                Gt => self.greater_than(),
                Hsh => self.hash(),
                Not => self.one_or_eq(LexemeKind::Not, LexemeKind::Neq),
                Eq => self.one_or_eq(LexemeKind::Eq, LexemeKind::EqEq),
                Til => self.one_or_eq(LexemeKind::BitNot, LexemeKind::Almost),
                Pct => self.one_or_eq(LexemeKind::Mod, LexemeKind::ModEq),
                Dol => self.one_or_eq(LexemeKind::Concat, LexemeKind::ConcatEq),
                At => self.one_or_eq(LexemeKind::ConcatSpace, LexemeKind::ConcatSpaceEq),
                And => self.one_or_double(b'&', LexemeKind::BitAnd, LexemeKind::And),
                Or => self.one_or_double(b'|', LexemeKind::BitOr, LexemeKind::Or),
                Cir => self.one_or_double(b'^', LexemeKind::BitXor, LexemeKind::Xor),
                Com => self.one(LexemeKind::Comma),
                Col => self.one(LexemeKind::Colon),
                Sc => self.one(LexemeKind::Semicolon),
                Op => self.one(LexemeKind::OpenParen),
                Cp => self.one(LexemeKind::CloseParen),
                Ob => self.one(LexemeKind::OpenBrace),
                Cb => self.one(LexemeKind::CloseBrace),
                Obk => self.one(LexemeKind::OpenBracket),
                Cbk => self.one(LexemeKind::CloseBracket),
            }
        }
    }

    fn one(&mut self, kind: LexemeKind) {
        self.bump();
        self.produce(kind);
    }

    fn one_or_eq(&mut self, plain: LexemeKind, with_eq: LexemeKind) {
        self.bump();
        if self.byte() == Some(b'=') {
            self.bump();
            self.produce(with_eq);
        } else {
            self.produce(plain);
        }
    }

    fn one_or_double(&mut self, second: u8, plain: LexemeKind, doubled: LexemeKind) {
        self.bump();
        if self.byte() == Some(second) {
            self.bump();
            self.produce(doubled);
        } else {
            self.produce(plain);
        }
    }

    fn whitespace(&mut self) {
        self.bump();
        while let Some(b) = self.byte() {
            if DISPATCH_TABLE[b as usize] == Ws {
                self.bump();
            } else {
                break;
            }
        }
        self.produce(LexemeKind::Whitespace);
    }

    fn line_end(&mut self) {
        self.bump();
        self.produce(LexemeKind::LineEnd);
        self.newline();
    }

    fn line_end_cr(&mut self) {
        self.bump();
        if self.byte() == Some(b'\n') {
            self.bump();
        }
        self.produce(LexemeKind::LineEnd);
        self.newline();
    }

    fn identifier(&mut self) {
        self.bump();
        while let Some(b) = self.byte() {
            match b {
                b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_' => self.bump(),
                _ => break,
            }
        }
        self.produce(LexemeKind::Identifier);
    }

    fn octal(&mut self) {
        self.bump();
        loop {
            match self.byte() {
                Some(b'x') | Some(b'X') => {
                    self.bump();
                    return self.hexadecimal();
                }
                Some(b'.') => {
                    self.bump();
                    return self.float_literal();
                }
                Some(b'8') | Some(b'9') => {
                    self.error("invalid octal literal");
                    return self.decimal_body();
                }
                Some(b'0'..=b'7') => self.bump(),
                _ => {
                    self.produce(LexemeKind::Octal);
                    return;
                }
            }
        }
    }

    fn decimal(&mut self) {
        self.bump();
        self.decimal_body();
    }

    fn decimal_body(&mut self) {
        loop {
            match self.byte() {
                Some(b'.') => {
                    self.bump();
                    return self.float_literal();
                }
                Some(b'0'..=b'9') => self.bump(),
                _ => {
                    self.produce(LexemeKind::Decimal);
                    return;
                }
            }
        }
    }

    fn hexadecimal(&mut self) {
        match self.byte() {
            Some(b) if b.is_ascii_hexdigit() => {}
            _ => {
                self.error("invalid hexadecimal literal");
                self.produce(LexemeKind::Hexadecimal);
                return;
            }
        }
        while let Some(b) = self.byte() {
            if b.is_ascii_hexdigit() {
                self.bump();
            } else {
                break;
            }
        }
        self.produce(LexemeKind::Hexadecimal);
    }

    fn float_literal(&mut self) {
        loop {
            match self.byte() {
                Some(b'e') | Some(b'E') => {
                    self.bump();
                    return self.float_exponent();
                }
                Some(b'f') | Some(b'F') => {
                    self.bump();
                    break;
                }
                Some(b'0'..=b'9') => self.bump(),
                _ => break,
            }
        }
        self.produce(LexemeKind::Float);
    }

    fn float_exponent(&mut self) {
        if let Some(b'+') | Some(b'-') = self.byte() {
            self.bump();
        }
        match self.byte() {
            Some(b'0'..=b'9') => {}
            _ => {
                self.error("invalid float literal");
                self.produce(LexemeKind::Float);
                return;
            }
        }
        while let Some(b'0'..=b'9') = self.byte() {
            self.bump();
        }
        if let Some(b'f') | Some(b'F') = self.byte() {
            self.bump();
        }
        self.produce(LexemeKind::Float);
    }

    // Strings and names scan the same way; the escape consumes one byte
    // blindly. A bare newline does not produce a lexeme, it gets relexed
    // as a LINE_END.
    fn quoted(&mut self, terminator: u8, kind: LexemeKind, unclosed: &'static str) {
        self.bump();
        loop {
            match self.byte() {
                None => {
                    self.error(unclosed);
                    return;
                }
                Some(b) if b == terminator => {
                    self.bump();
                    self.produce(kind);
                    return;
                }
                Some(b'\n') | Some(b'\r') => {
                    self.error(unclosed);
                    return;
                }
                Some(b'\\') => {
                    self.bump();
                    if self.byte().is_none() {
                        self.error(unclosed);
                        return;
                    }
                    self.bump();
                }
                Some(_) => self.bump(),
            }
        }
    }

    fn slash(&mut self) {
        self.bump();
        match self.byte() {
            Some(b'/') => self.line_comment(),
            Some(b'*') => {
                self.bump();
                self.block_comment();
            }
            Some(b'=') => {
                self.bump();
                self.produce(LexemeKind::DivEq);
            }
            _ => self.produce(LexemeKind::Div),
        }
    }

    fn line_comment(&mut self) {
        while let Some(b) = self.byte() {
            if b == b'\n' || b == b'\r' {
                break;
            }
            self.bump();
        }
        self.produce(LexemeKind::Comment);
    }

    fn block_comment(&mut self) {
        loop {
            match self.byte() {
                None => {
                    self.error("unexpected EOF in comment");
                    self.produce(LexemeKind::Comment);
                    return;
                }
                Some(b'*') => {
                    self.bump();
                    if self.byte() == Some(b'/') {
                        self.bump();
                        self.produce(LexemeKind::Comment);
                        return;
                    }
                }
                Some(b'\n') => {
                    self.bump();
                    self.newline();
                }
                Some(b'\r') => {
                    self.bump();
                    if self.byte() == Some(b'\n') {
                        self.bump();
                    }
                    self.newline();
                }
                Some(_) => self.bump(),
            }
        }
    }

    // A backslash splices the following line break away entirely, whatever
    // form it takes; anything else leaves a BACKSLASH lexeme, including a
    // backslash at EOF.
    fn backslash(&mut self) {
        self.bump();
        match self.byte() {
            Some(b'\n') => {
                self.bump();
                self.newline();
            }
            Some(b'\r') => {
                self.bump();
                if self.byte() == Some(b'\n') {
                    self.bump();
                }
                self.newline();
            }
            _ => self.produce(LexemeKind::Backslash),
        }
    }

    fn dot(&mut self) {
        self.bump();
        if self.byte() == Some(b'.') && self.byte_at(self.pos + 1) == Some(b'.') {
            self.bump();
            self.bump();
            self.produce(LexemeKind::Ellipsis);
        } else {
            self.produce(LexemeKind::Dot);
        }
    }

    fn plus(&mut self) {
        self.bump();
        match self.byte() {
            Some(b'+') => {
                self.bump();
                self.produce(LexemeKind::Increment);
            }
            Some(b'=') => {
                self.bump();
                self.produce(LexemeKind::AddEq);
            }
            _ => self.produce(LexemeKind::Plus),
        }
    }

    fn minus(&mut self) {
        self.bump();
        match self.byte() {
            Some(b'-') => {
                self.bump();
                self.produce(LexemeKind::Decrement);
            }
            Some(b'=') => {
                self.bump();
                self.produce(LexemeKind::SubEq);
            }
            _ => self.produce(LexemeKind::Minus),
        }
    }

    fn asterisk(&mut self) {
        self.bump();
        match self.byte() {
            Some(b'*') => {
                self.bump();
                self.produce(LexemeKind::Pow);
            }
            Some(b'=') => {
                self.bump();
                self.produce(LexemeKind::MulEq);
            }
            _ => self.produce(LexemeKind::Mul),
        }
    }

    fn less_than(&mut self) {
        self.bump();
        match self.byte() {
            Some(b'=') => {
                self.bump();
                self.produce(LexemeKind::LtEq);
            }
            Some(b'<') => {
                self.bump();
                self.produce(LexemeKind::Shl);
            }
            _ => self.produce(LexemeKind::Lt),
        }
    }

    fn greater_than(&mut self) {
        self.bump();
        match self.byte() {
            Some(b'=') => {
                self.bump();
                self.produce(LexemeKind::GtEq);
            }
            Some(b'>') => {
                self.bump();
                if self.byte() == Some(b'>') {
                    self.bump();
                    self.produce(LexemeKind::ShrUnsigned);
                } else {
                    self.produce(LexemeKind::Shr);
                }
            }
            _ => self.produce(LexemeKind::Gt),
        }
    }

    fn hash(&mut self) {
        self.bump();
        if self.byte() == Some(b'#') {
            self.bump();
            self.produce(LexemeKind::TokenConcat);
        } else {
            self.produce(LexemeKind::Hash);
        }
    }
}
