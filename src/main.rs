// Tue Jan 13 2026 - Alex

use colored::Colorize;
use std::process::ExitCode;

fn main() -> ExitCode {
    match taskline::ui::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "[!]".red(), e);
            ExitCode::FAILURE
        }
    }
}
