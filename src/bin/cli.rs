// src/bin/cli.rs
use gb_whatif::cli;

fn main() {
    let _ = color_eyre::install();
    if let Err(e) = cli::run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
