//! A preprocessor for an UnrealScript-like dialect.
//!
//! The root file is lexed into a doubly-linked lexeme stream which serves
//! as input, working set and output at once: directives are consumed in
//! place, included files are spliced in where their `#include` stood,
//! macro expansion rewrites identifiers where they sit, and whatever is
//! left at the end of the walk is the emitted program text.

extern crate ahash;
extern crate debug;
extern crate resolve;
extern crate shared;

pub mod lexeme;
pub mod output;
pub mod preprocessor;
pub mod stream;
pub mod tokenizer;

mod calculator;

pub use crate::preprocessor::{Define, Preprocessor};

use resolve::FileService;

/// One-shot convenience: preprocess `input`, resolving files through
/// `fserv`, and serialize the residual stream. Returns the output text,
/// or the accumulated errors when the run failed.
pub fn preprocess(
    fserv: &mut dyn FileService,
    defines: Vec<Define>,
    input: &str,
    cwd: &str,
) -> Result<String, Vec<String>> {
    let mut pp = Preprocessor::new(fserv, defines);
    if !pp.preprocess_file(input, cwd) {
        return Err(pp.errors().to_vec());
    }
    let mut out = Vec::new();
    if let Err(e) = pp.write_output(&mut out) {
        return Err(vec![format!("could not write output: {}", e)]);
    }
    Ok(String::from_utf8_lossy(&out).into_owned())
}
