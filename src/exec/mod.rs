// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`supervisor`] runs one shell command under a timeout and collects its
//!   output, elapsed time and (optionally) peak memory.
//! - [`process_tree`] discovers and signals a process and its descendants.
//! - [`sampler`] polls the tree's resident memory on a dedicated thread.
//! - [`output`] drains stdout / stderr with a bounded post-exit grace.
//! - [`backend`] provides the `ToolExecutor` trait and the production
//!   `ProcessExecutor`, which tests can replace with a fake.

pub mod backend;
pub mod output;
pub mod process_tree;
pub mod sampler;
pub mod supervisor;

pub use backend::{ProcessExecutor, ToolExecutor};
pub use sampler::{MemoryProbe, MemorySampler, DEFAULT_SAMPLE_INTERVAL};
pub use supervisor::{supervise, Supervised, SupervisorOptions, Termination};
