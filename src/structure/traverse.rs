//! Depth-first traversal that hands every node to a visitor with its parent

use super::StructureNode;

/// Visit `root` and all its descendants in pre-order (document order).
///
/// The root is visited with no parent; every other node with the node that
/// directly contains it. Results of all visits are concatenated in visiting
/// order. Nodes of unknown kind are visited and descended into like any other.
pub fn traverse_with_parent_depth_first<'a, R, F>(root: &'a StructureNode, mut visit: F) -> Vec<R>
where
    F: FnMut(Option<&'a StructureNode>, &'a StructureNode) -> Vec<R>,
{
    let mut results = Vec::new();
    let mut stack: Vec<(Option<&'a StructureNode>, &'a StructureNode)> = vec![(None, root)];

    while let Some((parent, node)) = stack.pop() {
        results.extend(visit(parent, node));

        // Reversed so the first child is popped first.
        for child in node.children().iter().rev() {
            stack.push((Some(node), child));
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::DeclarationKind;
    use crate::text::ByteRange;

    fn node(kind: DeclarationKind, location: usize) -> StructureNode {
        StructureNode::new(Some(kind), Some(ByteRange::new(location, 1)))
    }

    fn sample_tree() -> StructureNode {
        StructureNode::root(vec![
            node(DeclarationKind::Struct, 0).with_children(vec![
                node(DeclarationKind::VarInstance, 1),
                node(DeclarationKind::FunctionMethodInstance, 2)
                    .with_children(vec![node(DeclarationKind::VarLocal, 3)]),
            ]),
            node(DeclarationKind::Class, 4),
        ])
    }

    #[test]
    fn test_pre_order_with_parents() {
        let tree = sample_tree();
        let visited = traverse_with_parent_depth_first(&tree, |parent, node| {
            vec![(parent.and_then(|p| p.offset()), node.offset())]
        });

        assert_eq!(
            visited,
            vec![
                (None, None),
                (None, Some(0)),
                (Some(0), Some(1)),
                (Some(0), Some(2)),
                (Some(2), Some(3)),
                (None, Some(4)),
            ]
        );
    }

    #[test]
    fn test_root_has_no_parent() {
        let tree = sample_tree();
        let parentless = traverse_with_parent_depth_first(&tree, |parent, node| {
            if parent.is_none() {
                vec![node.kind()]
            } else {
                vec![]
            }
        });
        assert_eq!(parentless, vec![None]);
    }

    #[test]
    fn test_unknown_kind_subtree_is_visited() {
        let tree = StructureNode::root(vec![StructureNode::new(None, None)
            .with_children(vec![node(DeclarationKind::VarInstance, 7)])]);

        let offsets = traverse_with_parent_depth_first(&tree, |_, node| {
            node.kind().map(|_| node.offset()).into_iter().collect()
        });
        assert_eq!(offsets, vec![Some(7)]);
    }

    #[test]
    fn test_traversal_is_repeatable() {
        let tree = sample_tree();
        let collect = || traverse_with_parent_depth_first(&tree, |_, node| vec![node.kind()]);
        assert_eq!(collect(), collect());
    }
}
