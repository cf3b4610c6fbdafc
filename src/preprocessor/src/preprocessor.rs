//! The directive state machine.
//!
//! One cursor walks the shared lexeme list. Directive runs are removed as
//! they are handled, included files are spliced in at the cursor, and
//! everything that survives to the end of the walk is the program text.

use std::rc::Rc;

use ahash::AHashMap;
use debug::debug::{debug_p, if_debug, DebugVal};
use resolve::{FileContent, FileService};
use shared::intern::StringInterner;

use crate::calculator;
use crate::lexeme::{Lexeme, LexemeKind};
use crate::stream::{LexemeList, NodeId};
use crate::tokenizer;

/// A recorded macro. Parameterized definitions are recorded but never
/// substituted; replacement lexemes are stored by value and copied into
/// the stream on every expansion.
#[derive(Clone, Debug)]
pub struct Define {
    pub name: Lexeme,
    pub content: Vec<Lexeme>,
    pub has_parameters: bool,
    pub parameters: Vec<Lexeme>,
}

impl Define {
    pub fn object(name: Lexeme, content: Vec<Lexeme>) -> Define {
        Define {
            name,
            content,
            has_parameters: false,
            parameters: Vec::new(),
        }
    }

    pub fn function(name: Lexeme, content: Vec<Lexeme>, parameters: Vec<Lexeme>) -> Define {
        Define {
            name,
            content,
            has_parameters: true,
            parameters,
        }
    }

    /// Build a definition from a command-line `NAME[=VALUE]` argument.
    /// The argument is lexed like any other source; the replacement is
    /// everything after the first `=`, minus whitespace and comments.
    pub fn parse(arg: &str) -> Option<Define> {
        let file: Rc<str> = Rc::from("cmdline");
        let text: Rc<str> = Rc::from(arg);
        let (mut lexemes, errors) = tokenizer::run(&file, &text);
        if !errors.is_empty() {
            return None;
        }
        if lexemes.last().map(|l| l.kind) == Some(LexemeKind::LineEnd) {
            lexemes.pop();
        }
        let eq = lexemes.iter().position(|l| l.kind == LexemeKind::Eq);
        let name_end = eq.unwrap_or_else(|| lexemes.len());
        let name = lexemes[..name_end]
            .iter()
            .find(|l| l.kind == LexemeKind::Identifier)?
            .clone();
        let content = match eq {
            Some(at) => lexemes[at + 1..]
                .iter()
                .filter(|l| !l.is_ws_or_comment())
                .cloned()
                .collect(),
            None => Vec::new(),
        };
        Some(Define::object(name, content))
    }
}

enum Directive {
    Include,
    Define,
    Undef,
    If,
    Elif,
    Else,
    Endif,
    Ifdef,
    Ifndef,
    Unknown,
}

fn directive_kind(name: &str) -> Directive {
    match name {
        "include" => Directive::Include,
        "define" => Directive::Define,
        "undef" => Directive::Undef,
        "if" => Directive::If,
        "elif" => Directive::Elif,
        "else" => Directive::Else,
        "endif" => Directive::Endif,
        "ifdef" => Directive::Ifdef,
        "ifndef" => Directive::Ifndef,
        _ => Directive::Unknown,
    }
}

pub struct Preprocessor<'a> {
    fserv: &'a mut dyn FileService,
    pub(crate) list: LexemeList,
    defines: AHashMap<Rc<str>, Define>,
    used_defines: Vec<Rc<str>>,
    if_depth: usize,
    erasing_depth: usize,
    else_seen: Vec<bool>,
    errors: Vec<String>,
    warnings: Vec<String>,
    literals: StringInterner,
    /// Every file opened during the run; the first entry is the root and
    /// anchors `#include "..."` resolution.
    files: Vec<Rc<str>>,
}

impl<'a> Preprocessor<'a> {
    pub fn new(fserv: &'a mut dyn FileService, defines: Vec<Define>) -> Preprocessor<'a> {
        let mut map = AHashMap::new();
        for def in defines {
            let key: Rc<str> = Rc::from(def.name.text());
            map.insert(key, def);
        }
        Preprocessor {
            fserv,
            list: LexemeList::new(),
            defines: map,
            used_defines: Vec::new(),
            if_depth: 0,
            erasing_depth: 0,
            // depth 0 is a sentinel so #else outside any #if always errors
            else_seen: vec![true],
            errors: Vec::new(),
            warnings: Vec::new(),
            literals: StringInterner::new(),
            files: Vec::new(),
        }
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Resolve and process the root file. Returns whether the run ended
    /// with no errors; only then is the residual list worth serializing.
    pub fn preprocess_file(&mut self, input: &str, cwd: &str) -> bool {
        let fcont = match self.fserv.resolve_load(cwd, input) {
            Some(f) => f,
            None => {
                self.errors
                    .push(format!("{}(1,0): could not find included file", input));
                return false;
            }
        };
        let mut cursor = match self.splice_file(fcont, None) {
            Ok(first) => first,
            Err(()) => return false,
        };

        while let Some(id) = cursor {
            cursor = match self.list.get(id).kind {
                LexemeKind::Hash => match self.handle_directive(id) {
                    Ok(next) => next,
                    Err(()) => return false,
                },
                LexemeKind::LineEnd | LexemeKind::Whitespace | LexemeKind::Comment => {
                    let next = self.list.next(id);
                    if self.erasing_depth > 0 {
                        self.list.remove(id);
                    }
                    next
                }
                _ => self.content_run(id),
            };
        }
        if self.if_depth > 0 {
            // every conditional has to close before the stream runs out
            match self.list.tail() {
                Some(id) => self.error(id, "unexpected EOF"),
                None => {
                    if let Some(f) = self.files.first() {
                        self.errors.push(format!("{}(1,0): unexpected EOF", f));
                    }
                }
            }
            self.if_depth = 0;
            self.erasing_depth = 0;
        }
        self.errors.is_empty()
    }

    pub fn write_output<W: std::io::Write>(&self, out: &mut W) -> std::io::Result<()> {
        crate::output::write_lexemes(&self.list, out)
    }

    fn content_run(&mut self, start: NodeId) -> Option<NodeId> {
        let mut cursor = Some(start);
        while let Some(id) = cursor {
            if self.list.get(id).kind == LexemeKind::LineEnd {
                break;
            }
            cursor = if self.erasing_depth > 0 {
                let next = self.list.next(id);
                self.list.remove(id);
                next
            } else {
                self.replace_identifier(id)
            };
        }
        cursor
    }

    /// Expand the lexeme at `id` if it names a live macro, following the
    /// expansion rule of the dialect:
    ///
    /// ```text
    ///     if the lexeme is the expansion-pop marker:
    ///         pop the in-progress stack, delete the marker, move on
    ///     if the name has no definition, takes parameters, or is
    ///     already being expanded:
    ///         leave it alone, move on
    ///     otherwise:
    ///         push the definition
    ///         insert copies of the replacement before the name
    ///         insert a pop marker before the name
    ///         delete the name, continue at the first inserted copy
    /// ```
    ///
    /// The marker closes the definition's scope at exactly the stream
    /// position where the original name ended, even across nested
    /// expansions, so a macro never substitutes inside its own output.
    pub(crate) fn replace_identifier(&mut self, id: NodeId) -> Option<NodeId> {
        match self.list.get(id).kind {
            LexemeKind::MetaUsedDefinePop => {
                self.used_defines.pop();
                let next = self.list.next(id);
                self.list.remove(id);
                return next;
            }
            LexemeKind::Identifier => {}
            _ => return self.list.next(id),
        }

        let (key, content) = {
            let text = self.list.get(id).text();
            match self.defines.get_key_value(text) {
                Some((k, def)) if !def.has_parameters && !self.used_defines.contains(k) => {
                    (Rc::clone(k), def.content.clone())
                }
                _ => return self.list.next(id),
            }
        };
        if_debug(DebugVal::MacroExpand, || println!("expanding {}", key));

        self.used_defines.push(key);
        let mut first = None;
        for lexeme in content {
            let inserted = self.list.insert_before(Some(id), lexeme);
            if first.is_none() {
                first = Some(inserted);
            }
        }
        let (file, line, column, source_length) = {
            let l = self.list.get(id);
            (Rc::clone(&l.file), l.line, l.column, l.source_length)
        };
        let empty = self.literals.get_ref("");
        let marker = Lexeme::synthetic(
            file,
            LexemeKind::MetaUsedDefinePop,
            line,
            column,
            source_length,
            empty,
        );
        let marker_id = self.list.insert_before(Some(id), marker);
        self.list.remove(id);
        Some(first.unwrap_or(marker_id))
    }

    fn handle_directive(&mut self, anchor: NodeId) -> Result<Option<NodeId>, ()> {
        let dir_id = match self.next_lexeme(anchor) {
            Some(id) if self.list.get(id).kind == LexemeKind::Identifier => id,
            other => return Ok(other),
        };
        let dir = directive_kind(self.list.get(dir_id).text());
        debug_p(DebugVal::Directive, self.list.get(dir_id).text());

        match dir {
            Directive::Else => Ok(self.handle_else(anchor, dir_id)),
            Directive::Elif => Ok(self.handle_elif(anchor, dir_id)),
            Directive::Endif => Ok(self.handle_endif(anchor, dir_id)),
            Directive::If | Directive::Ifdef | Directive::Ifndef if self.erasing_depth > 0 => {
                // the branch condition is never evaluated inside an elided
                // region, but the nesting still counts
                self.push_depth();
                let line_end = self.seek_line_end(dir_id);
                Ok(self.retire_directive(anchor, line_end))
            }
            Directive::If => Ok(self.handle_if(anchor, dir_id)),
            Directive::Ifdef => Ok(self.handle_ifdef(anchor, dir_id, false)),
            Directive::Ifndef => Ok(self.handle_ifdef(anchor, dir_id, true)),
            _ if self.erasing_depth > 0 => {
                let line_end = self.seek_line_end(dir_id);
                Ok(self.retire_directive(anchor, line_end))
            }
            Directive::Include => self.handle_include(anchor, dir_id),
            Directive::Define => Ok(self.handle_define(anchor, dir_id)),
            Directive::Undef => Ok(self.handle_undef(anchor, dir_id)),
            Directive::Unknown => Ok(Some(dir_id)),
        }
    }

    fn handle_if(&mut self, anchor: NodeId, dir_id: NodeId) -> Option<NodeId> {
        let line_end = self.seek_line_end(dir_id);
        let value = calculator::eval_controlling_expression(self, dir_id, line_end);
        self.push_depth();
        match value {
            Some(v) if v != 0 => {}
            _ => self.erasing_depth = self.if_depth,
        }
        self.retire_directive(anchor, line_end)
    }

    fn handle_elif(&mut self, anchor: NodeId, dir_id: NodeId) -> Option<NodeId> {
        if self.if_depth == 0 {
            self.error(dir_id, "spurious elif");
            let line_end = self.seek_line_end(dir_id);
            return self.retire_directive(anchor, line_end);
        }
        if self.else_seen[self.if_depth] {
            self.error(dir_id, "elif after else");
            let line_end = self.seek_line_end(dir_id);
            return self.retire_directive(anchor, line_end);
        }
        if self.erasing_depth > 0 && self.erasing_depth < self.if_depth {
            // an outer branch already discards this whole region
            let line_end = self.seek_line_end(dir_id);
            return self.retire_directive(anchor, line_end);
        }
        let line_end = self.seek_line_end(dir_id);
        let value = calculator::eval_controlling_expression(self, dir_id, line_end);
        self.erasing_depth = match value {
            Some(v) if v != 0 => 0,
            _ => self.if_depth,
        };
        self.retire_directive(anchor, line_end)
    }

    fn handle_else(&mut self, anchor: NodeId, dir_id: NodeId) -> Option<NodeId> {
        if self.if_depth == 0 {
            self.error(dir_id, "spurious else");
        } else if self.else_seen[self.if_depth] {
            self.error(dir_id, "second else");
        } else {
            self.else_seen[self.if_depth] = true;
            if self.erasing_depth == self.if_depth {
                self.erasing_depth = 0;
            } else if self.erasing_depth == 0 {
                self.erasing_depth = self.if_depth;
            }
        }
        let line_end = self.finish_directive_line(dir_id);
        self.retire_directive(anchor, line_end)
    }

    fn handle_endif(&mut self, anchor: NodeId, dir_id: NodeId) -> Option<NodeId> {
        if self.if_depth == 0 {
            self.error(dir_id, "spurious endif");
        } else {
            self.else_seen[self.if_depth] = false;
            if self.erasing_depth == self.if_depth {
                self.erasing_depth = 0;
            }
            self.if_depth -= 1;
        }
        let line_end = self.finish_directive_line(dir_id);
        self.retire_directive(anchor, line_end)
    }

    fn handle_ifdef(&mut self, anchor: NodeId, dir_id: NodeId, is_ifndef: bool) -> Option<NodeId> {
        let name_id = match self.next_lexeme(dir_id) {
            None => {
                self.error(dir_id, "missing define");
                self.list.remove_range(anchor, None);
                return None;
            }
            Some(id) if self.list.get(id).kind == LexemeKind::Identifier => id,
            Some(id) => {
                self.error(id, "unexpected token");
                let line_end = self.line_end_from(id);
                return self.retire_directive(anchor, line_end);
            }
        };
        self.push_depth();
        let defined = {
            let text = self.list.get(name_id).text();
            self.defines.contains_key(text)
        };
        let wanted = if is_ifndef { !defined } else { defined };
        if !wanted && self.erasing_depth == 0 {
            self.erasing_depth = self.if_depth;
        }
        let line_end = self.finish_directive_line(name_id);
        self.retire_directive(anchor, line_end)
    }

    fn handle_define(&mut self, anchor: NodeId, dir_id: NodeId) -> Option<NodeId> {
        let name_id = match self.next_lexeme(dir_id) {
            None => {
                self.error(dir_id, "unexpected EOF");
                self.list.remove_range(anchor, None);
                return None;
            }
            Some(id) if self.list.get(id).kind == LexemeKind::Identifier => id,
            Some(id) => {
                self.error(id, "expected name for define");
                let line_end = self.line_end_from(id);
                return self.retire_directive(anchor, line_end);
            }
        };
        let name = self.list.get(name_id).clone();

        let mut has_parameters = false;
        let mut parameters = Vec::new();
        let mut content_from = name_id;

        // a parameter list only counts when the paren hugs the name
        match self.list.next(name_id) {
            Some(paren) if self.list.get(paren).kind == LexemeKind::OpenParen => {
                self.error(paren, "parameterized not yet supported");
                has_parameters = true;
                content_from = paren;
                let mut cur = self.next_lexeme(paren);
                while let Some(id) = cur {
                    match self.list.get(id).kind {
                        LexemeKind::LineEnd => break,
                        LexemeKind::CloseParen => {
                            content_from = id;
                            break;
                        }
                        LexemeKind::Identifier => {
                            parameters.push(self.list.get(id).clone());
                        }
                        LexemeKind::Comma => {}
                        _ => self.error(id, "unexpected token"),
                    }
                    cur = self.next_lexeme(id);
                }
            }
            _ => {}
        }

        // the replacement: every non-whitespace, non-comment lexeme up to
        // the line end, copied out of the stream
        let mut content = Vec::new();
        let mut cur = self.next_lexeme(content_from);
        while let Some(id) = cur {
            if self.list.get(id).kind == LexemeKind::LineEnd {
                break;
            }
            content.push(self.list.get(id).clone());
            cur = self.next_lexeme(id);
        }
        let line_end = cur;

        let key: Rc<str> = Rc::from(name.text());
        let def = if has_parameters {
            Define::function(name, content, parameters)
        } else {
            Define::object(name, content)
        };
        // redefinition silently replaces
        self.defines.insert(key, def);

        self.retire_directive(anchor, line_end)
    }

    fn handle_undef(&mut self, anchor: NodeId, dir_id: NodeId) -> Option<NodeId> {
        let name_id = match self.next_lexeme(dir_id) {
            None => {
                self.error(dir_id, "unexpected EOF");
                self.list.remove_range(anchor, None);
                return None;
            }
            Some(id) if self.list.get(id).kind == LexemeKind::Identifier => id,
            Some(id) => {
                self.error(id, "unexpected token");
                let line_end = self.line_end_from(id);
                return self.retire_directive(anchor, line_end);
            }
        };
        let removed = {
            let text = self.list.get(name_id).text();
            self.defines.remove(text).is_some()
        };
        if !removed {
            self.error(name_id, "macro not defined");
        }
        let line_end = self.finish_directive_line(name_id);
        self.retire_directive(anchor, line_end)
    }

    fn handle_include(&mut self, anchor: NodeId, dir_id: NodeId) -> Result<Option<NodeId>, ()> {
        let arg_id = match self.next_lexeme(dir_id) {
            None => {
                self.error(dir_id, "unexpected EOF");
                self.list.remove_range(anchor, None);
                return Ok(None);
            }
            Some(id) => id,
        };
        match self.list.get(arg_id).kind {
            LexemeKind::StringLiteral => {
                self.list.get_mut(arg_id).kind = LexemeKind::IncludeString;
                let line_end = self.finish_directive_line(arg_id);
                let path = {
                    let text = self.list.get(arg_id).text();
                    text[1..text.len() - 1].to_string()
                };
                let cwd = match self.files.first() {
                    Some(f) => f.to_string(),
                    None => String::new(),
                };
                self.finish_include(anchor, arg_id, line_end, &cwd, &path)
            }
            LexemeKind::Lt => {
                // collapse everything from < through > into one
                // INCLUDE_STRING lexeme viewing the same buffer
                let mut cur = self.list.next(arg_id);
                let gt = loop {
                    match cur {
                        None => {
                            self.error(arg_id, "unexpected EOF");
                            self.list.remove_range(anchor, None);
                            return Ok(None);
                        }
                        Some(id) => match self.list.get(id).kind {
                            LexemeKind::LineEnd => {
                                self.error(id, "unclosed include path");
                                return Ok(self.retire_directive(anchor, Some(id)));
                            }
                            LexemeKind::Gt => break id,
                            _ => cur = self.list.next(id),
                        },
                    }
                };
                let aggregate = {
                    let lt = self.list.get(arg_id);
                    let (lo, _) = lt.range();
                    let (_, hi) = self.list.get(gt).range();
                    Lexeme::new(
                        Rc::clone(&lt.file),
                        LexemeKind::IncludeString,
                        lt.line,
                        lt.column,
                        lt.buffer(),
                        lo,
                        hi,
                    )
                };
                let inc_id = self.list.insert_before(Some(arg_id), aggregate);
                let after_gt = self.list.next(gt);
                self.list.remove_range(arg_id, after_gt);
                let line_end = self.finish_directive_line(inc_id);
                let path = {
                    let text = self.list.get(inc_id).text();
                    text[1..text.len() - 1].to_string()
                };
                self.finish_include(anchor, inc_id, line_end, "", &path)
            }
            _ => {
                self.error(arg_id, "unexpected token");
                let line_end = self.line_end_from(arg_id);
                Ok(self.retire_directive(anchor, line_end))
            }
        }
    }

    fn finish_include(
        &mut self,
        anchor: NodeId,
        arg_id: NodeId,
        line_end: Option<NodeId>,
        cwd: &str,
        path: &str,
    ) -> Result<Option<NodeId>, ()> {
        if_debug(DebugVal::IncludeName, || {
            println!("opening {} from {:?}", path, cwd)
        });
        match self.fserv.resolve_load(cwd, path) {
            Some(fcont) => {
                self.list.remove_range(anchor, line_end);
                let first = self.splice_file(fcont, line_end)?;
                // scanning continues at the first spliced lexeme; an empty
                // include leaves the cursor on the directive's line end
                Ok(first.or(line_end))
            }
            None => {
                self.error(arg_id, "could not find included file");
                Ok(line_end)
            }
        }
    }

    fn splice_file(
        &mut self,
        fcont: FileContent,
        before: Option<NodeId>,
    ) -> Result<Option<NodeId>, ()> {
        self.files.push(Rc::clone(&fcont.path));
        let (lexemes, errors) = tokenizer::run(&fcont.path, &fcont.content);
        if !errors.is_empty() {
            for e in &errors {
                self.errors.push(format!(
                    "{}({},{}): {}",
                    fcont.path, e.line, e.column, e.message
                ));
            }
            return Err(());
        }
        Ok(self.list.splice_before(before, lexemes))
    }

    fn push_depth(&mut self) {
        self.if_depth += 1;
        if self.if_depth >= self.else_seen.len() {
            self.else_seen.push(false);
        } else {
            self.else_seen[self.if_depth] = false;
        }
    }

    /// First non-whitespace, non-comment lexeme after `id`. Line ends are
    /// not whitespace here; they terminate directives.
    pub(crate) fn next_lexeme(&self, id: NodeId) -> Option<NodeId> {
        let mut cur = self.list.next(id);
        while let Some(n) = cur {
            match self.list.get(n).kind {
                LexemeKind::Whitespace | LexemeKind::Comment => cur = self.list.next(n),
                _ => break,
            }
        }
        cur
    }

    /// Like `seek_line_end`, but safe to call when `id` may already be the
    /// line end (error paths that landed on the directive's terminator).
    fn line_end_from(&self, id: NodeId) -> Option<NodeId> {
        if self.list.get(id).kind == LexemeKind::LineEnd {
            Some(id)
        } else {
            self.seek_line_end(id)
        }
    }

    fn seek_line_end(&self, id: NodeId) -> Option<NodeId> {
        let mut cur = self.list.next(id);
        while let Some(n) = cur {
            if self.list.get(n).kind == LexemeKind::LineEnd {
                break;
            }
            cur = self.list.next(n);
        }
        cur
    }

    /// Walk from `from` to the line end, diagnosing anything that is not
    /// whitespace or a comment.
    fn finish_directive_line(&mut self, from: NodeId) -> Option<NodeId> {
        let mut cur = self.list.next(from);
        while let Some(id) = cur {
            match self.list.get(id).kind {
                LexemeKind::LineEnd => break,
                LexemeKind::Whitespace | LexemeKind::Comment => {}
                _ => self.error(id, "unexpected token"),
            }
            cur = self.list.next(id);
        }
        cur
    }

    /// Remove the directive run `[anchor, line_end)` and step past the
    /// line end, which stays in the stream. Expansion markers stranded in
    /// the run (an expression pre-pass that bailed out) still pop their
    /// stack entry; they sit in stream order, innermost first.
    fn retire_directive(&mut self, anchor: NodeId, line_end: Option<NodeId>) -> Option<NodeId> {
        let mut cur = Some(anchor);
        while let Some(id) = cur {
            if Some(id) == line_end {
                break;
            }
            if self.list.get(id).kind == LexemeKind::MetaUsedDefinePop {
                self.used_defines.pop();
            }
            cur = self.list.next(id);
        }
        self.list.remove_range(anchor, line_end);
        line_end.and_then(|id| self.list.next(id))
    }

    pub(crate) fn is_defined(&self, name: &str) -> bool {
        self.defines.contains_key(name)
    }

    pub(crate) fn literal(&mut self, text: &str) -> Rc<str> {
        self.literals.get_ref(text)
    }

    pub(crate) fn error(&mut self, id: NodeId, msg: &str) {
        let l = self.list.get(id);
        let formatted = format!("{}({},{}): {}", l.file, l.line, l.column, msg);
        self.errors.push(formatted);
    }

    pub(crate) fn warn(&mut self, id: NodeId, msg: &str) {
        let l = self.list.get(id);
        let formatted = format!("{}({},{}): {}", l.file, l.line, l.column, msg);
        self.warnings.push(formatted);
    }
}
