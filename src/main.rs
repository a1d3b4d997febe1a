use clap::Parser;
use sift::cli::{self, Args};
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();
    let result = args.read_input().and_then(|input| cli::run(&args, &input));
    match result {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("sift: {e}");
            ExitCode::FAILURE
        }
    }
}
