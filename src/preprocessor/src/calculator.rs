//! Constant-expression evaluation for `#if` and `#elif`.
//!
//! A pre-pass rewrites the expression's stretch of the lexeme stream in
//! place: `defined NAME` / `defined(NAME)` runs collapse to a `0`/`1`
//! literal, and every other identifier goes through ordinary macro
//! expansion. What survives is parsed by recursive descent into a small
//! AST and evaluated over 32-bit unsigned values; `-`, `~` and `>>` work
//! on the two's-complement reinterpretation.

use std::rc::Rc;

use crate::lexeme::{Lexeme, LexemeKind};
use crate::preprocessor::Preprocessor;
use crate::stream::NodeId;

#[derive(Clone, Copy, Debug)]
enum UnaryOp {
    Pos,
    Neg,
    Not,
    BitNot,
}

#[derive(Clone, Copy, Debug)]
enum BinaryOp {
    Or,
    And,
    Eq,
    Neq,
    Gt,
    Geq,
    Lt,
    Leq,
    BitOr,
    BitXor,
    BitAnd,
    Shl,
    Shr,
    ShrUnsigned,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

#[derive(Debug)]
enum Expr {
    Literal(u32),
    // an identifier nobody defined; evaluates to 0
    Name,
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

/// Evaluate the controlling expression between the directive keyword at
/// `dir_id` (exclusive) and `end` (the terminating line end, exclusive).
/// `None` means the expression did not parse; the caller treats that as
/// false.
pub(crate) fn eval_controlling_expression(
    pp: &mut Preprocessor<'_>,
    dir_id: NodeId,
    end: Option<NodeId>,
) -> Option<u32> {
    if prepass(pp, dir_id, end).is_err() {
        return None;
    }
    let mut parser = ExprParser {
        cur: pp.next_lexeme(dir_id),
        end,
        anchor: dir_id,
        pp,
    };
    let expr = parser.or_expr()?;
    if parser.cur != parser.end {
        if let Some(id) = parser.cur {
            parser.pp.error(id, "unexpected token");
        }
    }
    Some(eval(parser.pp, dir_id, &expr))
}

/// Fold `defined` runs and expand macros, walking the live stream. The
/// stream tolerates insertion at the cursor, so expansion results are
/// themselves rescanned, exactly as in ordinary program text.
fn prepass(pp: &mut Preprocessor<'_>, dir_id: NodeId, end: Option<NodeId>) -> Result<(), ()> {
    let mut cur = pp.list.next(dir_id);
    while cur != end {
        let id = match cur {
            Some(id) => id,
            None => break,
        };
        let is_defined_operator = {
            let l = pp.list.get(id);
            l.kind == LexemeKind::Identifier && l.text() == "defined"
        };
        if !is_defined_operator {
            cur = pp.replace_identifier(id);
            continue;
        }

        let mut it = pp.next_lexeme(id);
        if it.is_none() || it == end {
            pp.error(id, "missing operand for operator \"defined\"");
            return Err(());
        }
        let mut operand = it.unwrap();
        let paren_used = pp.list.get(operand).kind == LexemeKind::OpenParen;
        if paren_used {
            it = pp.next_lexeme(operand);
            if it.is_none() || it == end {
                pp.error(id, "missing operand for operator \"defined\"");
                return Err(());
            }
            operand = it.unwrap();
        }
        if pp.list.get(operand).kind != LexemeKind::Identifier {
            pp.error(operand, "expected identifier");
            return Err(());
        }
        let defined = {
            let text = pp.list.get(operand).text();
            pp.is_defined(text)
        };

        let mut last = operand;
        if paren_used {
            it = pp.next_lexeme(operand);
            if it.is_none() || it == end {
                pp.error(operand, "missing closing parenthesis");
                return Err(());
            }
            last = it.unwrap();
            if pp.list.get(last).kind != LexemeKind::CloseParen {
                pp.error(last, "missing closing parenthesis");
                return Err(());
            }
        }

        let (file, line, column, source_length) = {
            let l = pp.list.get(id);
            (Rc::clone(&l.file), l.line, l.column, l.source_length)
        };
        let text = pp.literal(if defined { "1" } else { "0" });
        let literal = Lexeme::synthetic(
            file,
            LexemeKind::Decimal,
            line,
            column,
            source_length,
            text,
        );
        pp.list.insert_before(Some(id), literal);
        let after = pp.list.next(last);
        pp.list.remove_range(id, after);
        cur = after;
    }
    Ok(())
}

struct ExprParser<'a, 'b> {
    pp: &'a mut Preprocessor<'b>,
    cur: Option<NodeId>,
    end: Option<NodeId>,
    anchor: NodeId,
}

impl<'a, 'b> ExprParser<'a, 'b> {
    fn peek_kind(&self) -> Option<LexemeKind> {
        if self.cur == self.end {
            return None;
        }
        self.cur.map(|id| self.pp.list.get(id).kind)
    }

    fn advance(&mut self) {
        if let Some(id) = self.cur {
            if self.cur != self.end {
                self.cur = self.pp.next_lexeme(id);
            }
        }
    }

    fn or_expr(&mut self) -> Option<Expr> {
        let mut result = self.and_expr()?;
        while self.peek_kind() == Some(LexemeKind::Or) {
            self.advance();
            let rhs = self.and_expr()?;
            result = Expr::Binary(BinaryOp::Or, Box::new(result), Box::new(rhs));
        }
        Some(result)
    }

    fn and_expr(&mut self) -> Option<Expr> {
        let mut result = self.cmp_expr()?;
        while self.peek_kind() == Some(LexemeKind::And) {
            self.advance();
            let rhs = self.cmp_expr()?;
            result = Expr::Binary(BinaryOp::And, Box::new(result), Box::new(rhs));
        }
        Some(result)
    }

    fn cmp_expr(&mut self) -> Option<Expr> {
        let mut result = self.bit_or_expr()?;
        loop {
            let op = match self.peek_kind() {
                Some(LexemeKind::EqEq) => BinaryOp::Eq,
                Some(LexemeKind::Neq) => BinaryOp::Neq,
                Some(LexemeKind::Gt) => BinaryOp::Gt,
                Some(LexemeKind::GtEq) => BinaryOp::Geq,
                Some(LexemeKind::Lt) => BinaryOp::Lt,
                Some(LexemeKind::LtEq) => BinaryOp::Leq,
                _ => break,
            };
            self.advance();
            let rhs = self.bit_or_expr()?;
            result = Expr::Binary(op, Box::new(result), Box::new(rhs));
        }
        Some(result)
    }

    fn bit_or_expr(&mut self) -> Option<Expr> {
        let mut result = self.bit_and_expr()?;
        loop {
            let op = match self.peek_kind() {
                Some(LexemeKind::BitOr) => BinaryOp::BitOr,
                Some(LexemeKind::BitXor) => BinaryOp::BitXor,
                _ => break,
            };
            self.advance();
            let rhs = self.bit_and_expr()?;
            result = Expr::Binary(op, Box::new(result), Box::new(rhs));
        }
        Some(result)
    }

    fn bit_and_expr(&mut self) -> Option<Expr> {
        let mut result = self.shift_expr()?;
        while self.peek_kind() == Some(LexemeKind::BitAnd) {
            self.advance();
            let rhs = self.shift_expr()?;
            result = Expr::Binary(BinaryOp::BitAnd, Box::new(result), Box::new(rhs));
        }
        Some(result)
    }

    fn shift_expr(&mut self) -> Option<Expr> {
        let mut result = self.add_expr()?;
        loop {
            let op = match self.peek_kind() {
                Some(LexemeKind::Shl) => BinaryOp::Shl,
                Some(LexemeKind::Shr) => BinaryOp::Shr,
                Some(LexemeKind::ShrUnsigned) => BinaryOp::ShrUnsigned,
                _ => break,
            };
            self.advance();
            let rhs = self.add_expr()?;
            result = Expr::Binary(op, Box::new(result), Box::new(rhs));
        }
        Some(result)
    }

    fn add_expr(&mut self) -> Option<Expr> {
        let mut result = self.mul_expr()?;
        loop {
            let op = match self.peek_kind() {
                Some(LexemeKind::Plus) => BinaryOp::Add,
                Some(LexemeKind::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.mul_expr()?;
            result = Expr::Binary(op, Box::new(result), Box::new(rhs));
        }
        Some(result)
    }

    fn mul_expr(&mut self) -> Option<Expr> {
        let mut result = self.unary_expr()?;
        loop {
            let op = match self.peek_kind() {
                Some(LexemeKind::Mul) => BinaryOp::Mul,
                Some(LexemeKind::Div) => BinaryOp::Div,
                Some(LexemeKind::Mod) => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let rhs = self.unary_expr()?;
            result = Expr::Binary(op, Box::new(result), Box::new(rhs));
        }
        Some(result)
    }

    fn unary_expr(&mut self) -> Option<Expr> {
        let op = match self.peek_kind() {
            Some(LexemeKind::Plus) => Some(UnaryOp::Pos),
            Some(LexemeKind::Minus) => Some(UnaryOp::Neg),
            Some(LexemeKind::Not) => Some(UnaryOp::Not),
            Some(LexemeKind::BitNot) => Some(UnaryOp::BitNot),
            _ => None,
        };
        match op {
            Some(op) => {
                self.advance();
                Some(Expr::Unary(op, Box::new(self.unary_expr()?)))
            }
            None => self.primary(),
        }
    }

    fn primary(&mut self) -> Option<Expr> {
        let id = match self.cur {
            Some(id) if self.cur != self.end => id,
            _ => {
                self.pp
                    .error(self.anchor, "expected token, but found none");
                return None;
            }
        };
        match self.pp.list.get(id).kind {
            LexemeKind::Identifier => {
                self.pp.warn(id, "undefined macro, substituting 0");
                self.advance();
                Some(Expr::Name)
            }
            LexemeKind::Decimal => {
                let value = self.number(id, 10, 0);
                self.advance();
                Some(Expr::Literal(value))
            }
            LexemeKind::Octal => {
                let value = self.number(id, 8, 0);
                self.advance();
                Some(Expr::Literal(value))
            }
            LexemeKind::Hexadecimal => {
                // skip the 0x/0X prefix
                let value = self.number(id, 16, 2);
                self.advance();
                Some(Expr::Literal(value))
            }
            LexemeKind::OpenParen => {
                self.advance();
                let result = self.or_expr()?;
                if self.peek_kind() != Some(LexemeKind::CloseParen) {
                    let at = match self.cur {
                        Some(c) if self.cur != self.end => c,
                        _ => id,
                    };
                    self.pp.error(at, "missing )");
                    // fine to infer the closing parenthesis at the end
                    return Some(result);
                }
                self.advance();
                Some(result)
            }
            _ => {
                self.pp.error(id, "unexpected token");
                None
            }
        }
    }

    fn number(&mut self, id: NodeId, radix: u32, skip: usize) -> u32 {
        let parsed = {
            let text = self.pp.list.get(id).text();
            u32::from_str_radix(&text[skip..], radix)
        };
        match parsed {
            Ok(value) => value,
            Err(_) => {
                self.pp.error(id, "value too large");
                i32::MAX as u32
            }
        }
    }
}

fn eval(pp: &mut Preprocessor<'_>, anchor: NodeId, expr: &Expr) -> u32 {
    match expr {
        Expr::Literal(value) => *value,
        Expr::Name => 0,
        Expr::Unary(op, operand) => {
            let value = eval(pp, anchor, operand);
            match op {
                UnaryOp::Pos => value,
                UnaryOp::Neg => value.wrapping_neg(),
                UnaryOp::Not => (value == 0) as u32,
                UnaryOp::BitNot => !value,
            }
        }
        Expr::Binary(op, lhs, rhs) => {
            let l = eval(pp, anchor, lhs);
            let r = eval(pp, anchor, rhs);
            match op {
                BinaryOp::Or => (l != 0 || r != 0) as u32,
                BinaryOp::And => (l != 0 && r != 0) as u32,
                BinaryOp::Eq => (l == r) as u32,
                BinaryOp::Neq => (l != r) as u32,
                BinaryOp::Gt => (l > r) as u32,
                BinaryOp::Geq => (l >= r) as u32,
                BinaryOp::Lt => (l < r) as u32,
                BinaryOp::Leq => (l <= r) as u32,
                BinaryOp::BitOr => l | r,
                BinaryOp::BitXor => l ^ r,
                BinaryOp::BitAnd => l & r,
                BinaryOp::Shl => l.wrapping_shl(r),
                BinaryOp::Shr => (l as i32).wrapping_shr(r) as u32,
                BinaryOp::ShrUnsigned => l.wrapping_shr(r),
                BinaryOp::Add => l.wrapping_add(r),
                BinaryOp::Sub => l.wrapping_sub(r),
                BinaryOp::Mul => l.wrapping_mul(r),
                BinaryOp::Div => {
                    if r == 0 {
                        pp.error(anchor, "division by zero");
                        0
                    } else {
                        l / r
                    }
                }
                BinaryOp::Mod => {
                    if r == 0 {
                        pp.error(anchor, "division by zero");
                        0
                    } else {
                        l % r
                    }
                }
            }
        }
    }
}
