extern crate preprocessor;
extern crate resolve;

mod common;

use common::*;

#[test]
fn quoted_include_splices_in_place() {
    process_with(
        &[("a.inc", "before\n")],
        "#include \"a.inc\"\nafter",
        &[],
        "before\n\nafter",
    );
}

#[test]
fn angle_include() {
    process_with(
        &[("sys/version.uci", "versioned\n")],
        "#include <sys/version.uci>\nx",
        &[],
        "versioned\n\nx",
    );
}

#[test]
fn missing_include() {
    process_fails("#include \"nope.inc\"\nx", "could not find included file");
}

#[test]
fn nested_includes() {
    process_with(
        &[("a.inc", "1\n#include \"b.inc\"\n3\n"), ("b.inc", "2\n")],
        "#include \"a.inc\"\nend",
        &[],
        "1\n2\n\n3\n\nend",
    );
}

#[test]
fn defines_from_an_include_survive_it() {
    process_with(
        &[("defs.uci", "#define VERSION 3\n")],
        "#include \"defs.uci\"\nVERSION",
        &[],
        "\n\n3",
    );
}

#[test]
fn empty_include() {
    process_with(&[("empty.inc", "")], "#include \"empty.inc\"\nx", &[], "\nx");
}

#[test]
fn unclosed_angle_path() {
    process_fails("#include <a\nx", "unclosed include path");
}

#[test]
fn include_without_argument() {
    process_fails("#include\nx", "unexpected token");
}

#[test]
fn include_junk_after_path() {
    process_fails("#include \"a.inc\" junk\nx", "unexpected token");
}

#[test]
fn includes_in_dead_branches_are_not_resolved() {
    // would fail the run if the resolver were consulted
    process(
        "#if 0\n#include \"missing.inc\"\n#endif\nok",
        "\n\n\nok",
    );
}
