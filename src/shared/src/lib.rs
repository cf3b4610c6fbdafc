//! Various shared bits and pieces for the preprocessor.

extern crate regex;

pub mod intern;
pub mod utils;
