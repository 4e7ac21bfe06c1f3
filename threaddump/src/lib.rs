//! # threaddump - Managed Thread Stack Dumper
//!
//! threaddump answers "what is this stuck process doing right now": it takes
//! a point-in-time snapshot of a managed runtime, recovers every thread's
//! name and call stack, and prints them, with source lines when the matching
//! debug info is supplied.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Target Process                              │
//! │              (managed runtime + capture agent)                  │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ frozen snapshot
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   threaddump (This Crate)                       │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐        │
//! │  │Introspection │──▶│ Thread Name  │──▶│    Report    │        │
//! │  │  (snapshot)  │   │    Index     │   │  Assembler   │        │
//! │  └──────────────┘   └──────────────┘   └──────┬───────┘        │
//! │                                               │                 │
//! │                                               ▼                 │
//! │                                        ┌──────────────┐        │
//! │                                        │    Frame     │        │
//! │                                        │ Symbolicator │        │
//! │                                        └──────────────┘        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`introspection`]: snapshot provider traits and the snapshot-file provider
//! - [`thread_names`]: managed thread id → name, recovered from the heap
//! - [`symbolization`]: IL offset matching and debug-info lookup per frame
//! - [`report`]: per-thread sections and their text form
//! - [`dump`]: the pipeline tying the above together
//! - [`cli`], [`process_lookup`], [`preflight`]: the binary's front end
//! - [`domain`]: core types (ids, frames, threads) and errors
//!
//! ## Failure Model
//!
//! Failing to take the snapshot is fatal and produces no report. Everything
//! after that degrades locally: heap objects with unresolved types are
//! skipped, and frames that can't be symbolicated print the plain method.
//!
//! ## Typical Usage
//!
//! ```bash
//! # Dump a process by name
//! threaddump OrderService
//!
//! # Add source lines from the service's debug info
//! threaddump --pid 1234 --symbols OrderService.pdb.json
//!
//! # Dump a snapshot saved earlier
//! threaddump --snapshot incident-42.json
//! ```

pub mod cli;
pub mod domain;
pub mod dump;
pub mod introspection;
pub mod preflight;
pub mod process_lookup;
pub mod report;
pub mod symbolization;
pub mod thread_names;
