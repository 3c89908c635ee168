use std::collections::VecDeque;

use generational_arena::Index;
use tracing::instrument;

use crate::red_black_tree::{Node, RedBlackTree, Side};
use crate::trace::{Operation, Step};
use crate::{Key, TreeError, TreeResult};

impl RedBlackTree {
    /// Level order, left to right.
    #[instrument(level = "debug", skip(self))]
    pub fn bfs(&mut self) -> TreeResult<Vec<Key>> {
        self.recorder.begin(Operation::Bfs, None);
        let Some(root) = self.root else {
            return self.finish(Err(TreeError::EmptyTree));
        };

        let mut order = Vec::with_capacity(self.len());
        let mut queue = VecDeque::new();
        queue.push_back(root);
        let key = self.key(root);
        self.step(Step::Enqueue { key });

        while let Some(node) = queue.pop_front() {
            let node_ref = &self.nodes[node];
            let (key, children) = (node_ref.key, [node_ref.left, node_ref.right]);
            order.push(key);
            self.step(Step::Visit { key });

            for child in children.into_iter().flatten() {
                queue.push_back(child);
                let key = self.key(child);
                self.step(Step::Enqueue { key });
            }
        }

        self.finish(Ok(order))
    }

    /// Preorder: node, left subtree, right subtree.
    #[instrument(level = "debug", skip(self))]
    pub fn dfs(&mut self) -> TreeResult<Vec<Key>> {
        self.recorder.begin(Operation::Dfs, None);
        let Some(root) = self.root else {
            return self.finish(Err(TreeError::EmptyTree));
        };

        let mut order = Vec::with_capacity(self.len());
        self.preorder(root, &mut order);
        self.finish(Ok(order))
    }

    /// Keys in ascending order. Not recorded.
    pub fn inorder(&self) -> Vec<Key> {
        let mut keys = Vec::with_capacity(self.len());
        self.inorder_for_each(|node| keys.push(node.key));
        keys
    }

    pub(crate) fn inorder_for_each<F>(&self, mut f: F)
    where
        F: FnMut(&Node),
    {
        fn inner<F>(tree: &RedBlackTree, node: Option<Index>, f: &mut F)
        where
            F: FnMut(&Node),
        {
            if let Some(node) = node {
                let node = &tree.nodes[node];
                inner(tree, node.left, f);
                f(node);
                inner(tree, node.right, f);
            }
        }

        inner(self, self.root, &mut f);
    }

    fn preorder(&mut self, node: Index, order: &mut Vec<Key>) {
        let node_ref = &self.nodes[node];
        let (key, left, right) = (node_ref.key, node_ref.left, node_ref.right);
        order.push(key);
        self.step(Step::Visit { key });

        if let Some(left) = left {
            self.step(Step::Descend {
                from: key,
                side: Side::Left,
            });
            self.preorder(left, order);
        }
        if let Some(right) = right {
            self.step(Step::Descend {
                from: key,
                side: Side::Right,
            });
            self.preorder(right, order);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_from(keys: &[Key]) -> RedBlackTree {
        let mut tree = RedBlackTree::new();
        for &key in keys {
            tree.insert(key).unwrap();
        }
        tree.clear_history();
        tree
    }

    #[test]
    fn bfs_and_dfs() {
        // 8:b (3:b (1:r, 5:r), 11:b)
        let mut tree = tree_from(&[8, 3, 11, 1, 5]);
        assert_eq!(tree.bfs().unwrap(), [8, 3, 11, 1, 5]);
        assert_eq!(tree.dfs().unwrap(), [8, 3, 1, 5, 11]);
        assert_eq!(tree.inorder(), [1, 3, 5, 8, 11]);
    }

    #[test]
    fn complete_tree() {
        let mut tree = tree_from(&[8, 4, 12, 2, 6, 10, 14]);
        assert_eq!(tree.bfs().unwrap(), [8, 4, 12, 2, 6, 10, 14]);
        assert_eq!(tree.dfs().unwrap(), [8, 4, 2, 6, 12, 10, 14]);
        assert_eq!(tree.history().len(), 2);
    }

    #[test]
    fn empty_tree() {
        let mut tree = RedBlackTree::new();
        assert_eq!(tree.bfs(), Err(TreeError::EmptyTree));
        assert_eq!(tree.dfs(), Err(TreeError::EmptyTree));
        assert!(tree.inorder().is_empty());

        let ops: Vec<_> = tree
            .history()
            .iter()
            .map(|trace| (trace.operation, trace.outcome))
            .collect();
        assert_eq!(
            ops,
            [
                (Operation::Bfs, Err(TreeError::EmptyTree)),
                (Operation::Dfs, Err(TreeError::EmptyTree)),
            ]
        );
    }

    #[test]
    fn traversals_do_not_mutate() {
        let mut tree = tree_from(&[4, 2, 6, 1, 3, 5, 7]);
        let before = tree.inorder();
        let root = tree.root_id().unwrap();

        tree.bfs().unwrap();
        tree.dfs().unwrap();
        assert_eq!(tree.inorder(), before);
        assert!(tree.node(root).is_some());
        tree.check_invariants().unwrap();
    }

    #[test]
    fn bfs_trace() {
        let mut tree = tree_from(&[2, 1, 3]);
        tree.bfs().unwrap();
        assert_eq!(
            tree.last_trace().unwrap().steps,
            [
                Step::Enqueue { key: 2 },
                Step::Visit { key: 2 },
                Step::Enqueue { key: 1 },
                Step::Enqueue { key: 3 },
                Step::Visit { key: 1 },
                Step::Visit { key: 3 },
            ]
        );
    }

    #[test]
    fn dfs_trace() {
        let mut tree = tree_from(&[2, 1, 3]);
        tree.dfs().unwrap();
        assert_eq!(
            tree.last_trace().unwrap().steps,
            [
                Step::Visit { key: 2 },
                Step::Descend {
                    from: 2,
                    side: Side::Left
                },
                Step::Visit { key: 1 },
                Step::Descend {
                    from: 2,
                    side: Side::Right
                },
                Step::Visit { key: 3 },
            ]
        );
    }
}
