//! Renders the mirrored tree from the database
//!
//! Starts at the root page and follows child edges depth first, prefixing
//! each display name with one `-` per level.

use crate::storage::{ChildRecord, Storage};
use crate::SyncError;
use std::collections::VecDeque;

/// Builds the tree listing, one line per stored page
///
/// Child edges pointing at pages that were never stored are left out, along
/// with everything below them.
pub fn render_tree(storage: &dyn Storage) -> Result<Vec<String>, SyncError> {
    let Some(root) = storage.get_root_page()? else {
        return Ok(Vec::new());
    };

    let mut lines = vec![line(0, root.display_name.as_deref(), &root.jcr_id)];
    let mut stack: Vec<VecDeque<ChildRecord>> = Vec::new();
    push_level(&mut stack, storage.get_children(root.id)?);

    loop {
        let depth = stack.len();
        let Some(level) = stack.last_mut() else {
            break;
        };
        let Some(edge) = level.pop_front() else {
            stack.pop();
            continue;
        };

        if let Some(page) = storage.get_page_by_jcr_id(&edge.child_jcr_id)? {
            lines.push(line(depth, page.display_name.as_deref(), &page.jcr_id));
            push_level(&mut stack, storage.get_children(page.id)?);
        }
    }

    Ok(lines)
}

/// Prints the tree to stdout
pub fn print_tree(storage: &dyn Storage) -> Result<(), SyncError> {
    let lines = render_tree(storage)?;
    if lines.is_empty() {
        println!("No root page stored");
    }
    for line in lines {
        println!("{}", line);
    }
    Ok(())
}

fn push_level(stack: &mut Vec<VecDeque<ChildRecord>>, children: Vec<ChildRecord>) {
    if !children.is_empty() {
        stack.push(children.into());
    }
}

fn line(depth: usize, display_name: Option<&str>, jcr_id: &str) -> String {
    format!("{}{}", "-".repeat(depth), display_name.unwrap_or(jcr_id))
}
