//! # threaddump - Main Entry Point
//!
//! Resolves the target, loads symbols, takes the snapshot and prints the
//! report. A failure before the report is complete prints a single error
//! and nothing else.

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, LevelFilter};
use std::fs::File;
use std::io::{self, BufWriter, Write};

use threaddump::cli::Args;
use threaddump::domain::{Pid, SnapshotError};
use threaddump::dump::{DumpConfig, ThreadDumper};
use threaddump::introspection::{SnapshotFileProvider, Target};
use threaddump::preflight::run_preflight_checks;
use threaddump::process_lookup::resolve_target_pid;
use threaddump::symbolization::SequencePointProvider;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_USAGE: i32 = 2;
const EXIT_NOPERM: i32 = 77;

fn main() {
    let args = Args::parse();
    init_logging(args.pdb_debug);

    std::process::exit(match run(&args) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

fn init_logging(pdb_debug: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if pdb_debug {
        builder.filter_module("threaddump", LevelFilter::Info);
    }
    builder.init();
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    if let Some(SnapshotError::AccessDenied(_)) = err.downcast_ref::<SnapshotError>() {
        return EXIT_NOPERM;
    }
    let msg = err.to_string().to_lowercase();
    if msg.contains("permission denied") {
        EXIT_NOPERM
    } else if msg.contains("missing required argument") {
        EXIT_USAGE
    } else {
        EXIT_ERROR
    }
}

/// Build the dump config from CLI arguments.
///
/// Supports three modes:
/// - `threaddump my-app` - find process by name (or `threaddump 1234`)
/// - `threaddump --pid 1234` - explicit PID
/// - `threaddump --snapshot saved.json` - saved snapshot
fn resolve_config(args: &Args) -> Result<DumpConfig> {
    let target = if let Some(ref path) = args.snapshot {
        Target::SnapshotFile(path.clone())
    } else if let Some(pid) = args.pid {
        Target::Pid(Pid(pid))
    } else if let Some(ref name) = args.target {
        Target::Pid(resolve_target_pid(name)?)
    } else {
        anyhow::bail!(
            "Missing required argument: TARGET, --pid or --snapshot\n\n\
             Usage:\n  \
             threaddump my-app                 Find the process by name\n  \
             threaddump --pid 1234             Explicit PID\n  \
             threaddump --snapshot file.json   Saved snapshot\n\n\
             Run 'threaddump --help' for more options"
        );
    };

    Ok(DumpConfig { target, symbol_file: args.symbols.clone(), pdb_debug: args.pdb_debug })
}

fn run(args: &Args) -> Result<()> {
    let config = resolve_config(args)?;
    run_preflight_checks(&config, &args.snapshot_dir)?;

    if !args.quiet {
        if let Some(ref symbols) = config.symbol_file {
            println!("Using symbol file: {}", symbols.display());
        }
    }
    let dumper = ThreadDumper::from_config(&SequencePointProvider, &config)?;

    if !args.quiet {
        println!("Will dump threads of: {}", config.target);
    }
    let provider = SnapshotFileProvider::new(&args.snapshot_dir);
    let report = dumper.dump(&provider, &config.target)?;
    info!("Dumped {} threads", report.thread_count());

    if let Some(ref path) = args.output {
        let file = File::create(path)
            .with_context(|| format!("Failed to create report file {}", path.display()))?;
        report.write_to(BufWriter::new(file)).context("Failed to write report")?;
        if !args.quiet {
            println!("saved: {}", path.display());
        }
        return Ok(());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "\n\nThread stacktraces:")?;
    report.write_to(&mut out)?;
    writeln!(out, "\nEnd of threads")?;
    Ok(())
}
