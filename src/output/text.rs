//! Plain-text tree rendering for terminal summaries.

use crate::graph::tree::Node;

/// Render the tree as indented lines of `[status] bytes url`.
///
/// Subtrees below `max_depth` are folded into a `... (n more)` line.
pub fn render_tree(root: &Node, max_depth: usize) -> String {
    let mut out = String::new();
    render_node(root, "", "", 0, max_depth, &mut out);
    out
}

fn render_node(
    node: &Node,
    lead: &str,
    child_lead: &str,
    depth: usize,
    max_depth: usize,
    out: &mut String,
) {
    out.push_str(lead);
    out.push_str(&node_label(node));
    out.push('\n');

    if node.children.is_empty() {
        return;
    }

    if depth >= max_depth {
        let hidden = node.iter().count() - 1;
        out.push_str(child_lead);
        out.push_str(&format!("`-- ... ({} more)\n", hidden));
        return;
    }

    let last = node.children.len() - 1;
    for (i, child) in node.children.iter().enumerate() {
        let (branch, indent) = if i == last {
            ("`-- ", "    ")
        } else {
            ("|-- ", "|   ")
        };
        render_node(
            child,
            &format!("{}{}", child_lead, branch),
            &format!("{}{}", child_lead, indent),
            depth + 1,
            max_depth,
            out,
        );
    }
}

fn node_label(node: &Node) -> String {
    let status = node
        .status
        .map_or_else(|| "---".to_string(), |s| s.to_string());
    let size = if node.is_size_known() {
        format_bytes(node.counted_bytes())
    } else {
        "?".to_string()
    };
    format!("[{}] {} {}", status, size, node.url)
}

/// Format a byte count with a binary unit suffix
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
