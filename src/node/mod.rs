//! Node deployments: local checks, single node and multi-node.

pub mod env;
pub mod layout;
pub mod multi;
pub mod single;

pub use env::{EnvReport, check_local, require_local};
pub use layout::{Layout, NodeType, RemoteNode};
pub use multi::{env_multi, run_multi};
pub use single::NodeProfile;
