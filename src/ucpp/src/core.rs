use std::env;
use std::fs::File;
use std::io;
use std::io::Write;

use clap::{App, Arg};
use regex::Regex;

use preprocessor::{Define, Preprocessor};
use resolve::FilesystemService;
use shared::utils::any_match;

pub fn real_main() -> i32 {
    let matches = App::new("ucpp")
        .version("0.1.0")
        .about("Preprocess UnrealScript-style source files")
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .value_name("PATH")
                .help("File to write the result to (stdout if omitted)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("input")
                .short("i")
                .long("input")
                .value_name("PATH")
                .help("File to preprocess")
                .required(true)
                .takes_value(true),
        )
        .arg(
            Arg::with_name("include-dir")
                .short("I")
                .long("include-dir")
                .value_name("DIR")
                .help("Add this path to the include search list")
                .multiple(true)
                .takes_value(true),
        )
        .arg(
            Arg::with_name("define")
                .short("D")
                .long("define")
                .value_name("NAME[=VALUE]")
                .help("Predefine a macro")
                .multiple(true)
                .takes_value(true),
        )
        .get_matches();

    let input = matches.value_of("input").unwrap();
    let include_dirs: Vec<String> = matches
        .values_of("include-dir")
        .map(|v| v.map(ToString::to_string).collect())
        .unwrap_or_default();

    let define_syntax = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(=.*)?$").unwrap();
    let mut defines = Vec::new();
    if let Some(values) = matches.values_of("define") {
        for def in values {
            if !any_match(def, &[&define_syntax]) {
                eprintln!("could not parse define: {}", def);
                continue;
            }
            match Define::parse(def) {
                Some(parsed) => defines.push(parsed),
                None => eprintln!("could not parse define: {}", def),
            }
        }
    }

    let mut fserv = FilesystemService::new(&include_dirs);
    let mut pp = Preprocessor::new(&mut fserv, defines);
    let cwd = env::current_dir()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ok = pp.preprocess_file(input, &cwd);

    for warning in pp.warnings() {
        eprint!("{}\n", warning);
    }
    if !ok {
        for error in pp.errors() {
            eprint!("{}\n", error);
        }
        return 1;
    }

    let written = match matches.value_of("output") {
        Some(path) => File::create(path).and_then(|mut f| pp.write_output(&mut f)),
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            pp.write_output(&mut lock).and_then(|()| lock.flush())
        }
    };
    if let Err(e) = written {
        eprintln!("could not write output: {}", e);
        return 1;
    }
    0
}
