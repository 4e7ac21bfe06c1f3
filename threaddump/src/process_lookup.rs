//! Resolve the dump target from a process name or PID.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

use crate::domain::Pid;

/// A running process that matched a `TARGET` name.
#[derive(Debug)]
pub struct ProcessInfo {
    pub pid: Pid,
    pub command: String,
}

/// The names a process answers to
///
/// Managed apps usually run under a shared host (`dotnet OrderService.dll`),
/// and `comm` is cut at 15 bytes, so the hosted assembly is tracked too.
#[derive(Debug)]
struct ProcessNames {
    command: String,
    exe: String,
    assembly: Option<String>,
}

impl ProcessNames {
    fn read(pid: u32) -> Option<Self> {
        let dir = Path::new("/proc").join(pid.to_string());
        // Kernel threads and other users' processes have no readable exe link
        let exe = fs::read_link(dir.join("exe")).ok()?;
        let command = fs::read_to_string(dir.join("comm")).ok()?;
        let cmdline = fs::read(dir.join("cmdline")).unwrap_or_default();

        Some(Self {
            command: command.trim_end().to_string(),
            exe: exe.file_name()?.to_string_lossy().into_owned(),
            assembly: hosted_assembly(&cmdline),
        })
    }

    fn all(&self) -> impl Iterator<Item = &str> {
        [self.command.as_str(), self.exe.as_str()].into_iter().chain(self.assembly.as_deref())
    }

    /// Exact match on a name or on the pattern's basename, or a substring hit
    fn matches(&self, pattern: &str) -> bool {
        let basename = Path::new(pattern).file_name().and_then(|n| n.to_str()).unwrap_or(pattern);
        self.all().any(|name| name == basename || name.contains(pattern))
    }
}

/// Resolve a `TARGET` argument: a numeric PID or a process name.
///
/// # Errors
/// Returns an error if the name matches no process or more than one
pub fn resolve_target_pid(target: &str) -> Result<Pid> {
    if let Ok(pid) = target.parse::<i32>() {
        return Ok(Pid(pid));
    }
    Ok(find_process_by_name(target)?.pid)
}

/// Find a single process by name under `/proc`.
///
/// Matches the command name, the executable basename and the hosted
/// assembly. The dumper itself is never a match.
///
/// # Errors
/// - No processes found
/// - Multiple processes found (ambiguous)
pub fn find_process_by_name(name: &str) -> Result<ProcessInfo> {
    let own_pid = std::process::id();

    let mut matches: Vec<ProcessInfo> = fs::read_dir("/proc")
        .context("Failed to read /proc")?
        .flatten()
        .filter_map(|entry| entry.file_name().to_str()?.parse::<u32>().ok())
        .filter(|&pid| pid != own_pid)
        .filter_map(|pid| {
            let names = ProcessNames::read(pid)?;
            if !names.matches(name) {
                return None;
            }
            Some(ProcessInfo { pid: Pid(i32::try_from(pid).ok()?), command: names.command })
        })
        .collect();

    match matches.len() {
        0 => bail!(
            "No process matching '{name}' found.\n\
             Check running processes with: ps aux | grep {name}"
        ),
        1 => Ok(matches.remove(0)),
        _ => {
            let list: Vec<String> =
                matches.iter().map(|m| format!("  {} ({})", m.pid.0, m.command)).collect();
            bail!(
                "Multiple processes match '{name}':\n{}\n\n\
                 Specify PID explicitly: threaddump --pid <PID>",
                list.join("\n")
            )
        }
    }
}

/// Stem of the first `.dll` argument in a NUL-separated command line
fn hosted_assembly(cmdline: &[u8]) -> Option<String> {
    cmdline
        .split(|&b| b == 0)
        .skip(1)
        .filter_map(|arg| std::str::from_utf8(arg).ok())
        .find(|arg| arg.ends_with(".dll"))
        .and_then(|arg| Path::new(arg).file_stem()?.to_str().map(str::to_string))
}
