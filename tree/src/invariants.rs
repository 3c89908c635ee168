use generational_arena::Index;
use thiserror::Error;

use crate::red_black_tree::RedBlackTree;
use crate::Key;

/// A broken red-black or BST property, as found by
/// [`RedBlackTree::check_invariants`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("root {0} is RED")]
    RedRoot(Key),

    #[error("RED node {parent} has RED child {child}")]
    RedRed { parent: Key, child: Key },

    #[error("black heights below {key} differ: left {left}, right {right}")]
    BlackHeight { key: Key, left: usize, right: usize },

    #[error("key {key} is outside of its subtree bounds ({lower:?}, {upper:?})")]
    OutOfOrder {
        key: Key,
        lower: Option<Key>,
        upper: Option<Key>,
    },

    #[error("node {key} does not link back to its parent {parent:?}")]
    ParentLink { key: Key, parent: Option<Key> },

    #[error("{stored} nodes are stored but only {reachable} are reachable from the root")]
    Unreachable { stored: usize, reachable: usize },
}

impl RedBlackTree {
    /// Checks every red-black and BST property and returns the black height
    /// of the tree, counted in black nodes on any root to leaf path.
    pub fn check_invariants(&self) -> Result<usize, InvariantViolation> {
        let Some(root) = self.root else {
            return match self.nodes.len() {
                0 => Ok(0),
                stored => Err(InvariantViolation::Unreachable {
                    stored,
                    reachable: 0,
                }),
            };
        };

        let root_ref = &self.nodes[root];
        if root_ref.color.is_red() {
            return Err(InvariantViolation::RedRoot(root_ref.key));
        }
        if root_ref.parent.is_some() {
            return Err(InvariantViolation::ParentLink {
                key: root_ref.key,
                parent: None,
            });
        }

        let mut reachable = 0;
        let black_height = self.check_subtree(root, None, None, &mut reachable)?;
        if reachable != self.nodes.len() {
            return Err(InvariantViolation::Unreachable {
                stored: self.nodes.len(),
                reachable,
            });
        }

        Ok(black_height)
    }

    fn check_subtree(
        &self,
        node: Index,
        lower: Option<Key>,
        upper: Option<Key>,
        reachable: &mut usize,
    ) -> Result<usize, InvariantViolation> {
        *reachable += 1;
        let node_ref = &self.nodes[node];
        let key = node_ref.key;
        if lower.is_some_and(|lower| key <= lower) || upper.is_some_and(|upper| key >= upper) {
            return Err(InvariantViolation::OutOfOrder { key, lower, upper });
        }

        let mut heights = [0; 2];
        let bounds = [(lower, Some(key)), (Some(key), upper)];
        for (i, child) in [node_ref.left, node_ref.right].into_iter().enumerate() {
            // absent children are black leaves that add nothing to the height
            let Some(child) = child else {
                continue;
            };
            let child_ref = &self.nodes[child];
            if child_ref.parent != Some(node) {
                return Err(InvariantViolation::ParentLink {
                    key: child_ref.key,
                    parent: Some(key),
                });
            }
            if node_ref.color.is_red() && child_ref.color.is_red() {
                return Err(InvariantViolation::RedRed {
                    parent: key,
                    child: child_ref.key,
                });
            }
            let (lower, upper) = bounds[i];
            heights[i] = self.check_subtree(child, lower, upper, reachable)?;
        }

        let [left, right] = heights;
        if left != right {
            return Err(InvariantViolation::BlackHeight { key, left, right });
        }

        Ok(left + usize::from(node_ref.color.is_black()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::red_black_tree::{Color, Node};

    fn tree_from(keys: &[Key]) -> RedBlackTree {
        let mut tree = RedBlackTree::new();
        for &key in keys {
            tree.insert(key).unwrap();
        }
        tree
    }

    fn index_of(tree: &RedBlackTree, key: Key) -> Index {
        tree.nodes
            .iter()
            .find(|(_, node)| node.key == key)
            .map(|(index, _)| index)
            .unwrap()
    }

    #[test]
    fn valid_trees() {
        assert_eq!(RedBlackTree::new().check_invariants(), Ok(0));
        assert_eq!(tree_from(&[1]).check_invariants(), Ok(1));
        // 10:b (5:b (3:r, 7:r), 15:b (12:r, 18:r))
        assert_eq!(
            tree_from(&[10, 5, 15, 3, 7, 12, 18]).check_invariants(),
            Ok(2)
        );
    }

    #[test]
    fn red_root() {
        let mut tree = tree_from(&[1, 2]);
        let root = tree.root.unwrap();
        tree.nodes[root].color = Color::Red;
        assert_eq!(
            tree.check_invariants(),
            Err(InvariantViolation::RedRoot(1))
        );
    }

    #[test]
    fn red_red() {
        // 2:b (1:r, 3:r)
        let mut tree = tree_from(&[2, 1, 3]);
        let three = index_of(&tree, 3);
        let four = tree.nodes.insert(Node {
            key: 4,
            color: Color::Red,
            parent: Some(three),
            left: None,
            right: None,
        });
        tree.nodes[three].right = Some(four);
        assert_eq!(
            tree.check_invariants(),
            Err(InvariantViolation::RedRed {
                parent: 3,
                child: 4
            })
        );
    }

    #[test]
    fn black_height() {
        let mut tree = tree_from(&[2, 1, 3]);
        let one = index_of(&tree, 1);
        tree.nodes[one].color = Color::Black;
        assert_eq!(
            tree.check_invariants(),
            Err(InvariantViolation::BlackHeight {
                key: 2,
                left: 1,
                right: 0
            })
        );
    }

    #[test]
    fn out_of_order() {
        let mut tree = tree_from(&[2, 1, 3]);
        let one = index_of(&tree, 1);
        tree.nodes[one].key = 5;
        assert_eq!(
            tree.check_invariants(),
            Err(InvariantViolation::OutOfOrder {
                key: 5,
                lower: None,
                upper: Some(2)
            })
        );
    }

    #[test]
    fn parent_link() {
        let mut tree = tree_from(&[2, 1, 3]);
        let one = index_of(&tree, 1);
        let three = index_of(&tree, 3);
        tree.nodes[one].parent = Some(three);
        assert_eq!(
            tree.check_invariants(),
            Err(InvariantViolation::ParentLink {
                key: 1,
                parent: Some(2)
            })
        );
    }

    #[test]
    fn unreachable() {
        let mut tree = tree_from(&[2, 1, 3]);
        tree.nodes.insert(Node {
            key: 9,
            color: Color::Black,
            parent: None,
            left: None,
            right: None,
        });
        assert_eq!(
            tree.check_invariants(),
            Err(InvariantViolation::Unreachable {
                stored: 4,
                reachable: 3
            })
        );
    }

    #[test]
    fn messages() {
        let err = InvariantViolation::RedRed {
            parent: 3,
            child: 4,
        };
        assert_eq!(err.to_string(), "RED node 3 has RED child 4");
    }
}
