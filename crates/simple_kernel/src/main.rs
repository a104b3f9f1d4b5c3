/*
 * main.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

mod executor;

use std::process::ExitCode;

use himalia::connection_file::ConnectionFile;
use himalia::kernel;
use himalia::session::SignaturePolicy;

use crate::executor::StubExecutor;

#[derive(Default)]
struct Options {
    connection_file: Option<String>,
    bound_connection_file: Option<String>,
    policy: SignaturePolicy,
}

fn start_kernel(options: Options) -> himalia::Result<()> {
    let connection_file = match &options.connection_file {
        Some(path) => {
            let connection_file = ConnectionFile::from_file(path)?;
            log::info!("Loaded connection information from frontend in {path}");
            connection_file
        },
        None => {
            log::info!("No connection file given, starting with default configuration");
            ConnectionFile::default()
        },
    };

    if options.policy == SignaturePolicy::Permissive {
        log::warn!("Messages with incorrect signatures will be accepted");
    }

    let handle = kernel::connect(
        "simple",
        connection_file,
        options.policy,
        Box::new(StubExecutor::new()),
    )?;

    let bound = handle.connection_file();
    log::info!("Kernel listening on ports {:?}", handle.ports());

    if let Some(path) = &options.bound_connection_file {
        bound.to_file(path)?;
        log::info!("Wrote bound connection information to {path}");
    }

    // Frontends connecting to a stand-alone kernel need the key and ports
    if options.connection_file.is_none() {
        match serde_json::to_string_pretty(bound) {
            Ok(json) => println!("{json}"),
            Err(err) => log::error!("Could not serialize connection information: {err}"),
        }
    }

    println!("Kernel activated, press Ctrl+C to end");
    handle.join()
}

fn usage() {
    println!(
        "Usage: simple_kernel [--connection_file /path/to/file] \
         [--bound_connection_file /path/to/output] [--permissive_signatures]"
    );
}

fn main() -> ExitCode {
    // Initialize logging system; the env_logger lets you configure logging with
    // the RUST_LOG env var
    env_logger::init();

    // Get an iterator over all the command-line arguments
    let mut argv = std::env::args();

    // Skip the first "argument" as it's the path/name to this executable
    argv.next();

    let mut options = Options::default();

    while let Some(arg) = argv.next() {
        match arg.as_str() {
            "--connection_file" => {
                if let Some(file) = argv.next() {
                    options.connection_file = Some(file);
                } else {
                    eprintln!(
                        "A connection file must be specified with the --connection_file argument."
                    );
                    return ExitCode::FAILURE;
                }
            },
            "--bound_connection_file" => {
                if let Some(file) = argv.next() {
                    options.bound_connection_file = Some(file);
                } else {
                    eprintln!(
                        "An output path must be specified with the --bound_connection_file argument."
                    );
                    return ExitCode::FAILURE;
                }
            },
            "--permissive_signatures" => {
                options.policy = SignaturePolicy::Permissive;
            },
            "--version" => {
                println!("simple_kernel {}", env!("CARGO_PKG_VERSION"));
                return ExitCode::SUCCESS;
            },
            "--help" => {
                usage();
                return ExitCode::SUCCESS;
            },
            other => {
                eprintln!("Argument '{other}' unknown");
                usage();
                return ExitCode::FAILURE;
            },
        }
    }

    match start_kernel(options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("Kernel failed: {err}");
            eprintln!("Kernel failed: {err}");
            ExitCode::FAILURE
        },
    }
}
