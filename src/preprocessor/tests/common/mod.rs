#![allow(dead_code)]

use preprocessor::{Define, Preprocessor};
use resolve::MemoryFileService;

fn build(files: &[(&str, &str)], defines: &[&str]) -> (MemoryFileService, Vec<Define>) {
    let mut fserv = MemoryFileService::new();
    for (name, content) in files {
        assert!(fserv.add_file(name, content), "duplicate file {}", name);
    }
    let defines = defines
        .iter()
        .map(|d| Define::parse(d).expect("unparseable define in test"))
        .collect();
    (fserv, defines)
}

/// Run the preprocessor over in-memory files. Returns the serialized
/// output when the run succeeded, plus both diagnostic lists.
pub fn preprocess_full(
    files: &[(&str, &str)],
    input: &str,
    defines: &[&str],
) -> (Option<String>, Vec<String>, Vec<String>) {
    let (mut fserv, defines) = build(files, defines);
    let mut pp = Preprocessor::new(&mut fserv, defines);
    let ok = pp.preprocess_file(input, ".");
    let errors = pp.errors().to_vec();
    let warnings = pp.warnings().to_vec();
    if !ok {
        return (None, errors, warnings);
    }
    let mut out = Vec::new();
    pp.write_output(&mut out).unwrap();
    (Some(String::from_utf8(out).unwrap()), errors, warnings)
}

pub fn preprocess_result(
    files: &[(&str, &str)],
    input: &str,
    defines: &[&str],
) -> Result<String, Vec<String>> {
    let (mut fserv, defines) = build(files, defines);
    preprocessor::preprocess(&mut fserv, defines, input, ".")
}

pub fn process_with(
    extra_files: &[(&str, &str)],
    input: &str,
    defines: &[&str],
    expected: &str,
) {
    println!("---- input ----\n{}\n---- end input ----", input);
    let mut files = vec![("main.uc", input)];
    files.extend_from_slice(extra_files);
    let output = match preprocess_result(&files, "main.uc", defines) {
        Ok(output) => output,
        Err(errors) => panic!("preprocessing failed: {:?}", errors),
    };
    println!("---- output ----\n{}\n---- end output ----", output);
    assert_eq!(output, expected);
}

pub fn process(input: &str, expected: &str) {
    process_with(&[], input, &[], expected);
}

pub fn process_fails(input: &str, needle: &str) {
    println!("---- input (should fail) ----\n{}\n---- end input ----", input);
    let errors = preprocess_result(&[("main.uc", input)], "main.uc", &[])
        .expect_err("preprocessing unexpectedly succeeded");
    assert!(
        errors.iter().any(|e| e.contains(needle)),
        "no error containing {:?} in {:?}",
        needle,
        errors
    );
}
