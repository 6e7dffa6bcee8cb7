use std::io::stdout;
use std::process::ExitCode;

use midas::{MidasError, Source};

fn main() -> ExitCode {
    env_logger::init();

    let mut args = std::env::args_os();
    let _program = args.next();
    let path = match (args.next(), args.next()) {
        (Some(path), None) => path,
        _ => {
            println!("Usage: midas <path>");
            return ExitCode::FAILURE;
        }
    };

    let source = match Source::from_path(&path) {
        Ok(source) => source,
        Err(source) => {
            eprintln!(
                "{}",
                MidasError::IOError {
                    path: path.into(),
                    source,
                }
            );
            return ExitCode::FAILURE;
        }
    };

    match midas::run(source, stdout()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{}", error);
            ExitCode::FAILURE
        }
    }
}
