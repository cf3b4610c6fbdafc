use std::env;

#[derive(Clone, Copy)]
pub enum DebugVal {
    IncludeName,
    MacroExpand,
    Directive,
}

pub static DEBUG_VALS: &[&str] = &[
    "DEBUG_INCLUDE_NAME",
    "DEBUG_MACRO_EXPAND",
    "DEBUG_DIRECTIVE",
];

pub fn is_debug_enabled(ident: DebugVal) -> bool {
    if let Ok("1") = env::var(DEBUG_VALS[ident as usize]).as_ref().map(|t| t.as_str()) {
        true
    } else {
        false
    }
}

pub fn if_debug<CB>(ident: DebugVal, cb: CB)
where
    CB: Fn() -> (),
{
    if is_debug_enabled(ident) {
        cb();
    }
}

pub fn debug_p(ident: DebugVal, msg: &str) {
    if is_debug_enabled(ident) {
        println!("{}", msg);
    }
}
