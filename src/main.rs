//! netbpfload — boot entry point.
//!
//! Startup sequence:
//!   1. Parse CLI flags (boot passes none)
//!   2. Load config
//!   3. Init logger (kernel log, falling back to stderr)
//!   4. Probe kernel and device facts
//!   5. Run the pipeline
//!   6. Exec the chosen target, or exit with the pipeline's code

use std::process;

use tracing::error;

use netbpfload::config;
use netbpfload::error::EXIT_FATAL;
use netbpfload::handoff;
use netbpfload::kernel::bpf::BpfSyscall;
use netbpfload::kernel::probe;
use netbpfload::loader::ElfObjectLoader;
use netbpfload::logger;
use netbpfload::pipeline::{Outcome, Pipeline};

fn main() {
    process::exit(run());
}

fn run() -> i32 {
    let args = parse_cli_args();

    let config = match config::load(args.config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return EXIT_FATAL;
        }
    };

    let level = args.log_level.unwrap_or(config.log.level.as_str());
    let force_cli_level = args.log_level.is_some();
    if let Err(e) = logger::init(level, force_cli_level, config.log.file.as_deref()) {
        eprintln!("warning: {e}; logging to stderr");
        if let Err(e) = logger::init(level, force_cli_level, None) {
            eprintln!("warning: {e}");
        }
    }

    let facts = match probe::detect(&config.paths.build_props) {
        Ok(facts) => facts,
        Err(e) => {
            error!(error = %e, "cannot probe system");
            return EXIT_FATAL;
        }
    };

    let loader = ElfObjectLoader::new(config.loader.helper.clone());
    let pipeline = Pipeline::new(&config, &facts, &loader, &BpfSyscall, &std::thread::sleep);

    match pipeline.run(&args.argv0) {
        Outcome::Exit(code) => code,
        Outcome::Exec(target) => {
            let err = handoff::exec(&target);
            error!(error = %err, "FATAL: handoff failed");
            err.exit_code()
        }
    }
}

struct CliArgs {
    argv0: String,
    log_level: Option<&'static str>,
    config_path: Option<String>,
}

fn parse_cli_args() -> CliArgs {
    let mut args = std::env::args_os();
    let argv0 = args
        .next()
        .map(|a| a.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut verbosity = 0u8;
    let mut config_path = None;

    let mut iter = args.map(|a| a.to_string_lossy().into_owned());
    while let Some(arg) = iter.next() {
        if arg == "--" {
            break;
        }

        match arg.as_str() {
            "-h" | "--help" => {
                println!("Usage: netbpfload [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -h, --help                 Print help");
                println!("  -f, --config <PATH>        Path to configuration file (default: built-in layout)");
                println!("  -v, -vv, -vvv, -vvvv       Increase logging verbosity");
                process::exit(0);
            }
            "-f" | "--config" => {
                if let Some(path) = iter.next() {
                    config_path = Some(path);
                } else {
                    eprintln!("error: -f/--config requires a path argument");
                    process::exit(EXIT_FATAL);
                }
            }
            "--verbose" => verbosity = verbosity.saturating_add(1),
            a if a.starts_with('-') && a.len() > 1 && a.chars().skip(1).all(|c| c == 'v') => {
                verbosity = verbosity.saturating_add((a.len() - 1) as u8);
            }
            _ => {}
        }
    }

    //   -v      → warn
    //   -vv     → info
    //   -vvv    → debug
    //   -vvvv+  → trace
    let log_level = match verbosity {
        0 => None,
        1 => Some("warn"),
        2 => Some("info"),
        3 => Some("debug"),
        _ => Some("trace"),
    };

    CliArgs { argv0, log_level, config_path }
}
