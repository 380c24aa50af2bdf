//! State module for tracking traversal progress
//!
//! # Components
//!
//! - `RemoteNodeRef`: A node reference as listed by the remote API
//! - `ParentContext`: The parent breadcrumb recorded for an open frontier level
//! - `FrontierGroup`: One level's unvisited siblings
//! - `TraversalState`: The frontier stack and its paired ancestor stack

mod traversal;

pub use traversal::{FrontierGroup, ParentContext, RemoteNodeRef, TraversalState};
