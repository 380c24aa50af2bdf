//! Output module for reporting on mirrored data
//!
//! This module handles:
//! - Row counts and the latest run record
//! - Drawing the stored tree

pub mod stats;
mod tree;

pub use stats::{load_statistics, print_statistics, MirrorStatistics};
pub use tree::{print_tree, render_tree};
