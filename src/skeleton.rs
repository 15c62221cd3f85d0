//! Skeleton segment reconstruction
//!
//! A skeleton arrives as flat SWC-style node rows; drawing needs one line
//! segment per parent-child edge. Joining each node's `link` against its
//! parent's `row_id` yields exactly one segment per non-root node.

use crate::neuprint::models::{SkeletonNode, SkeletonSegment};
use std::collections::HashMap;

/// Reconstruct drawable parent→child segments from skeleton node rows.
///
/// Nodes with a root sentinel link (0 or below) and nodes whose link does
/// not resolve to a known row produce no segment.
pub fn segments(nodes: &[SkeletonNode]) -> Vec<SkeletonSegment> {
    let by_row: HashMap<i64, &SkeletonNode> = nodes.iter().map(|n| (n.row_id, n)).collect();

    nodes
        .iter()
        .filter(|n| !n.is_root())
        .filter_map(|child| {
            by_row.get(&child.link).map(|parent| SkeletonSegment {
                parent: [parent.x, parent.y, parent.z],
                child: [child.x, child.y, child.z],
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(row_id: i64, link: i64, x: f64) -> SkeletonNode {
        SkeletonNode {
            row_id,
            link,
            x,
            y: x + 100.0,
            z: x + 200.0,
            radius: 1.0,
        }
    }

    #[test]
    fn root_only_skeleton_yields_no_segments() {
        assert!(segments(&[node(1, -1, 0.0)]).is_empty());
        assert!(segments(&[node(1, 0, 0.0)]).is_empty());
    }

    #[test]
    fn branching_skeleton_yields_one_segment_per_child() {
        // 1 is the root; 2 and 3 both hang off it.
        let nodes = vec![node(1, 0, 0.0), node(2, 1, 10.0), node(3, 1, 20.0)];
        let segs = segments(&nodes);
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].parent, [0.0, 100.0, 200.0]);
        assert_eq!(segs[0].child, [10.0, 110.0, 210.0]);
        assert_eq!(segs[1].parent, [0.0, 100.0, 200.0]);
        assert_eq!(segs[1].child, [20.0, 120.0, 220.0]);
    }

    #[test]
    fn segment_count_equals_non_root_count() {
        let mut nodes = vec![node(1, -1, 0.0)];
        for i in 2..=50 {
            nodes.push(node(i, i - 1, i as f64));
        }
        assert_eq!(segments(&nodes).len(), 49);
    }

    #[test]
    fn dangling_link_is_skipped() {
        let nodes = vec![node(1, 0, 0.0), node(2, 99, 10.0)];
        assert!(segments(&nodes).is_empty());
    }

    #[test]
    fn empty_input_is_fine() {
        assert!(segments(&[]).is_empty());
    }
}
