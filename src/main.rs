//! eisc CLI - compile an eis source file

use std::env;
use std::fs;
use std::path::Path;
use std::process::ExitCode;

use eisc::{Diagnostics, ModuleRegistry, compile};

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: eisc <source-file>");
        return ExitCode::FAILURE;
    }

    let filename = &args[1];
    let source = match fs::read_to_string(filename) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("Error reading file '{}': {}", filename, error);
            return ExitCode::FAILURE;
        }
    };

    let path = Path::new(filename);
    let module_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(filename.as_str());
    let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();

    let mut diagnostics = Diagnostics::new();
    let mut registry = ModuleRegistry::new();
    let _module = compile(
        &source,
        module_name,
        directory,
        &mut registry,
        &mut diagnostics,
    );

    if diagnostics.had_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
