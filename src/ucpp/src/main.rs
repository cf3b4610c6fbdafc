use std::process;

mod core;

fn main() {
    process::exit(crate::core::real_main());
}
