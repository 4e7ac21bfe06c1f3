//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

use crate::introspection::snapshot_file::DEFAULT_SNAPSHOT_DIR;

#[derive(Parser, Debug)]
#[command(
    name = "threaddump",
    version,
    about = "Dump the managed thread stacks of a stuck process",
    after_help = "\
EXAMPLES:
    threaddump my-service                              Find the process by name
    threaddump --pid 1234 --symbols App.pdb.json       Explicit PID, with source lines
    threaddump --snapshot saved.json                   Dump a previously captured snapshot"
)]
pub struct Args {
    /// Process name or PID to dump
    #[arg(value_name = "TARGET", conflicts_with_all = ["pid", "snapshot"])]
    pub target: Option<String>,

    /// Process ID to dump
    #[arg(short, long, conflicts_with = "snapshot")]
    pub pid: Option<i32>,

    /// Dump a saved snapshot file instead of a live process
    #[arg(long, value_name = "FILE")]
    pub snapshot: Option<PathBuf>,

    /// Directory the runtime's capture agent publishes snapshots to
    #[arg(long, value_name = "DIR", env = "THREADDUMP_SNAPSHOT_DIR", default_value = DEFAULT_SNAPSHOT_DIR)]
    pub snapshot_dir: PathBuf,

    /// Debug-info file used to add source lines to frames
    #[arg(short, long, value_name = "FILE")]
    pub symbols: Option<PathBuf>,

    /// Log which debug-info paths are compared for every frame
    #[arg(long)]
    pub pdb_debug: bool,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}
