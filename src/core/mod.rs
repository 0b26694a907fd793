//! Shared plumbing: errors, terminal output, progress bars, processes and
//! filesystem helpers.

pub mod error;
pub mod fs_utils;
pub mod output;
pub mod process;
pub mod progress;
