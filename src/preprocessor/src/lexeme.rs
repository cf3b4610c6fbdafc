use std::fmt;
use std::rc::Rc;

/// Everything the lexer can produce, plus the synthetic expansion marker
/// the preprocessor threads through the stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LexemeKind {
    Whitespace,
    LineEnd,
    Comment,
    Identifier,
    StringLiteral,
    IncludeString,
    NameLiteral,
    Octal,
    Decimal,
    Hexadecimal,
    Float,
    Lt,
    LtEq,
    Shl,
    Gt,
    GtEq,
    Shr,
    ShrUnsigned,
    Eq,
    EqEq,
    Not,
    Neq,
    BitNot,
    Almost,
    Plus,
    AddEq,
    Increment,
    Minus,
    SubEq,
    Decrement,
    Mul,
    MulEq,
    Pow,
    Div,
    DivEq,
    Mod,
    ModEq,
    BitAnd,
    And,
    BitOr,
    Or,
    BitXor,
    Xor,
    Hash,
    TokenConcat,
    Concat,
    ConcatEq,
    ConcatSpace,
    ConcatSpaceEq,
    Dot,
    Ellipsis,
    Comma,
    Colon,
    Semicolon,
    OpenParen,
    CloseParen,
    OpenBrace,
    CloseBrace,
    OpenBracket,
    CloseBracket,
    Backslash,
    MetaUsedDefinePop,
}

/// One lexical unit. The text is a view into either a file buffer or an
/// interned literal; both outlive the run, so cloning a lexeme is a couple
/// of `Rc` bumps.
#[derive(Clone)]
pub struct Lexeme {
    pub file: Rc<str>,
    pub kind: LexemeKind,
    pub line: u32,
    /// Byte offset from the start of the line.
    pub column: u32,
    pub source_length: u32,
    buffer: Rc<str>,
    lo: usize,
    hi: usize,
}

impl Lexeme {
    /// A lexeme scanned out of `buffer[lo..hi]`.
    pub fn new(
        file: Rc<str>,
        kind: LexemeKind,
        line: u32,
        column: u32,
        buffer: &Rc<str>,
        lo: usize,
        hi: usize,
    ) -> Lexeme {
        Lexeme {
            file,
            kind,
            line,
            column,
            source_length: (hi - lo) as u32,
            buffer: Rc::clone(buffer),
            lo,
            hi,
        }
    }

    /// A lexeme whose text does not come from a source file; `source_length`
    /// still reports the source bytes it stands for.
    pub fn synthetic(
        file: Rc<str>,
        kind: LexemeKind,
        line: u32,
        column: u32,
        source_length: u32,
        text: Rc<str>,
    ) -> Lexeme {
        let hi = text.len();
        Lexeme {
            file,
            kind,
            line,
            column,
            source_length,
            buffer: text,
            lo: 0,
            hi,
        }
    }

    pub fn text(&self) -> &str {
        &self.buffer[self.lo..self.hi]
    }

    pub fn is_ws_or_comment(&self) -> bool {
        self.kind == LexemeKind::Whitespace || self.kind == LexemeKind::Comment
    }

    pub(crate) fn buffer(&self) -> &Rc<str> {
        &self.buffer
    }

    pub(crate) fn range(&self) -> (usize, usize) {
        (self.lo, self.hi)
    }
}

impl PartialEq for Lexeme {
    fn eq(&self, other: &Lexeme) -> bool {
        self.kind == other.kind
            && self.file == other.file
            && self.line == other.line
            && self.column == other.column
            && self.text() == other.text()
    }
}

impl Eq for Lexeme {}

impl fmt::Debug for Lexeme {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:?} {:?} at {}({},{})",
            self.kind,
            self.text(),
            self.file,
            self.line,
            self.column
        )
    }
}
