//! Building blocks for the snapshot pipeline and remote deployments.
//!
//! - **acquire**: HTTP access, streaming downloads, MD5 verification
//! - **extract**: native `.tgz` extraction with path safety checks
//! - **remote**: `ssh`/`scp` invocations against layout hosts

pub mod acquire;
pub mod extract;
pub mod remote;
