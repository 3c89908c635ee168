use core::fmt;
use std::cmp::Ordering;
use std::mem;

use generational_arena::{Arena, Index};
use rand::Rng;
use tracing::instrument;

use crate::config::{ConfigError, EngineConfig, RandomRange};
use crate::trace::{DeleteCase, History, InsertCase, Operation, OperationTrace, Recorder, Step};
use crate::{Key, TreeError, TreeResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Black,
}

impl Color {
    /// Returns `true` if the color is [`Red`].
    ///
    /// [`Red`]: Color::Red
    #[must_use]
    pub fn is_red(&self) -> bool {
        matches!(self, Self::Red)
    }

    /// Returns `true` if the color is [`Black`].
    ///
    /// [`Black`]: Color::Black
    #[must_use]
    pub fn is_black(&self) -> bool {
        matches!(self, Self::Black)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Red => "RED",
            Self::Black => "BLACK",
        })
    }
}

/// Which child of its parent a node is. Rotations are named by the side the
/// pivot moves down to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Left => "left",
            Self::Right => "right",
        })
    }
}

#[derive(Debug)]
pub(crate) struct Node {
    pub(crate) key: Key,
    pub(crate) color: Color,
    pub(crate) parent: Option<Index>,
    pub(crate) left: Option<Index>,
    pub(crate) right: Option<Index>,
}

impl Node {
    #[inline]
    pub(crate) fn child(&self, side: Side) -> Option<Index> {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    #[inline]
    fn child_mut(&mut self, side: Side) -> &mut Option<Index> {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    fn children(&self) -> usize {
        usize::from(self.left.is_some()) + usize::from(self.right.is_some())
    }
}

/// Handle to a node of a [`RedBlackTree`].
///
/// A delete may copy a key into a surviving node, so every handle taken
/// before a delete (or a clear) stops resolving afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: Index,
    epoch: u64,
}

/// Read-only snapshot of a node, for drawing the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeView {
    pub id: NodeId,
    pub key: Key,
    pub color: Color,
    pub parent: Option<NodeId>,
    pub left: Option<NodeId>,
    pub right: Option<NodeId>,
}

/// Result of walking down from the root towards a key.
struct Probe {
    /// Every key compared against, with the comparison result.
    path: Vec<(Key, Ordering)>,
    hit: Option<Index>,
    /// Last node visited and the side the walk left it on. This is where a
    /// missing key would be attached.
    last: Option<(Index, Side)>,
}

/// A red-black tree of unique integer keys.
///
/// Absent children play the role of the black NIL sentinel: [`Self::color_of`]
/// reads `None` as [`Color::Black`], so no shared sentinel node is needed.
pub struct RedBlackTree {
    // INVARIANTS:
    //  * `root` is `None` iff `nodes` is empty
    //  * every node in `nodes` is reachable from `root`
    pub(crate) nodes: Arena<Node>,
    pub(crate) root: Option<Index>,
    epoch: u64,
    config: EngineConfig,
    pub(crate) recorder: Recorder,
}

impl Default for RedBlackTree {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RedBlackTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        struct Entry(Key, Color);

        impl fmt::Debug for Entry {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}:{}", self.0, self.1)
            }
        }

        let mut nodes = Vec::with_capacity(self.len());
        self.inorder_for_each(|node| nodes.push(Entry(node.key, node.color)));

        f.debug_struct("RedBlackTree")
            .field("len", &self.len())
            .field("root", &self.root.map(|root| self.nodes[root].key))
            .field("nodes", &nodes)
            .finish()
    }
}

impl RedBlackTree {
    pub fn new() -> Self {
        let config = EngineConfig::default();
        Self {
            nodes: Arena::new(),
            root: None,
            epoch: 0,
            recorder: Recorder::new(&config),
            config,
        }
    }

    pub fn with_config(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            nodes: Arena::new(),
            root: None,
            epoch: 0,
            recorder: Recorder::new(&config),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Traces of past operations, oldest first.
    pub fn history(&self) -> &History {
        self.recorder.history()
    }

    pub fn last_trace(&self) -> Option<&OperationTrace> {
        self.recorder.history().last()
    }

    pub fn clear_history(&mut self) {
        self.recorder.clear_history();
    }

    pub fn root_id(&self) -> Option<NodeId> {
        self.root.map(|root| self.id(root))
    }

    /// Resolves a handle, or returns `None` if it was invalidated by a delete.
    pub fn node(&self, id: NodeId) -> Option<NodeView> {
        if id.epoch != self.epoch {
            return None;
        }
        let node = self.nodes.get(id.index)?;
        Some(NodeView {
            id,
            key: node.key,
            color: node.color,
            parent: node.parent.map(|i| self.id(i)),
            left: node.left.map(|i| self.id(i)),
            right: node.right.map(|i| self.id(i)),
        })
    }

    /// Number of edges on the longest path from the root to a leaf.
    pub fn height(&self) -> usize {
        fn inner(tree: &RedBlackTree, node: Option<Index>) -> usize {
            match node {
                Some(node) => {
                    let node = &tree.nodes[node];
                    1 + inner(tree, node.left).max(inner(tree, node.right))
                }
                None => 0,
            }
        }

        inner(self, self.root).saturating_sub(1)
    }

    pub fn contains(&self, key: Key) -> bool {
        self.find(key).is_some()
    }

    pub fn min(&self) -> Option<Key> {
        self.root.map(|root| self.nodes[self.min_of(root)].key)
    }

    pub fn max(&self) -> Option<Key> {
        self.root.map(|root| self.nodes[self.max_of(root)].key)
    }

    /// The smallest key greater than `key`, if `key` is in the tree.
    pub fn successor(&self, key: Key) -> Option<Key> {
        self.find(key)
            .and_then(|node| self.successor_of(node))
            .map(|node| self.nodes[node].key)
    }

    /// The largest key smaller than `key`, if `key` is in the tree.
    pub fn predecessor(&self, key: Key) -> Option<Key> {
        self.find(key)
            .and_then(|node| self.predecessor_of(node))
            .map(|node| self.nodes[node].key)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn search(&mut self, key: Key) -> TreeResult<NodeId> {
        self.recorder.begin(Operation::Search, Some(key));
        if self.is_empty() {
            return self.finish(Err(TreeError::EmptyTree));
        }

        let probe = self.probe(key);
        self.record_path(key, &probe.path);
        let result = match probe.hit {
            Some(node) => Ok(self.id(node)),
            None => Err(TreeError::KeyNotFound(key)),
        };
        self.finish(result)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn insert(&mut self, key: Key) -> TreeResult<()> {
        self.recorder.begin(Operation::Insert, Some(key));

        // Move left/right down the tree until we find empty slot
        let probe = self.probe(key);
        self.record_path(key, &probe.path);
        if probe.hit.is_some() {
            return self.finish(Err(TreeError::DuplicateKey(key)));
        }

        // new node is a leaf, it cannot have left or right subtrees
        let new_node = self.nodes.insert(Node {
            key,
            color: Color::Red,
            parent: probe.last.map(|(parent, _)| parent),
            left: None,
            right: None,
        });
        self.step(Step::CreateRed { key });

        match probe.last {
            Some((parent, side)) => {
                *self.nodes[parent].child_mut(side) = Some(new_node);
                let parent = self.nodes[parent].key;
                self.step(Step::Attach { key, parent, side });
            }
            None => {
                self.root = Some(new_node);
                self.step(Step::AttachRoot { key });
            }
        }

        self.insert_fixup(new_node);
        self.finish(Ok(()))
    }

    /// Inserts a key drawn from the configured random range.
    pub fn insert_random<R>(&mut self, rng: &mut R) -> TreeResult<Key>
    where
        R: Rng + ?Sized,
    {
        let RandomRange { min, max } = self.config.random;
        let key = rng.gen_range(min..=max);
        self.insert(key).map(|()| key)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn delete(&mut self, key: Key) -> TreeResult<()> {
        self.recorder.begin(Operation::Delete, Some(key));
        if self.is_empty() {
            return self.finish(Err(TreeError::EmptyTree));
        }

        let probe = self.probe(key);
        self.record_path(key, &probe.path);
        let Some(node) = probe.hit else {
            return self.finish(Err(TreeError::KeyNotFound(key)));
        };

        self.delete_node(node);
        self.epoch += 1;
        self.finish(Ok(()))
    }

    #[instrument(level = "debug", skip(self))]
    pub fn clear(&mut self) {
        self.recorder.begin(Operation::Clear, None);
        let removed = self.nodes.len();
        self.nodes.clear();
        self.root = None;
        self.epoch += 1;
        self.step(Step::Cleared { removed });
        self.recorder.finish(Ok(()));
    }

    #[inline]
    pub(crate) fn step(&mut self, step: Step) {
        self.recorder.record(step);
    }

    pub(crate) fn finish<T>(&mut self, result: TreeResult<T>) -> TreeResult<T> {
        self.recorder
            .finish(result.as_ref().map(|_| ()).map_err(|e| *e));
        result
    }

    #[inline]
    pub(crate) fn key(&self, node: Index) -> Key {
        self.nodes[node].key
    }

    #[inline]
    fn id(&self, index: Index) -> NodeId {
        NodeId {
            index,
            epoch: self.epoch,
        }
    }

    /// Color of a possibly absent node, absent nodes are black.
    #[inline]
    fn color_of(&self, node: Option<Index>) -> Color {
        node.map_or(Color::Black, |node| self.nodes[node].color)
    }

    fn recolor(&mut self, node: Index, color: Color) {
        let from = self.nodes[node].color;
        if from != color {
            self.nodes[node].color = color;
            let key = self.nodes[node].key;
            self.step(Step::Recolor {
                key,
                from,
                to: color,
            });
        }
    }

    fn find(&self, key: Key) -> Option<Index> {
        let mut x = self.root;
        while let Some(node) = x {
            let node_ref = &self.nodes[node];
            match key.cmp(&node_ref.key) {
                Ordering::Less => x = node_ref.left,
                Ordering::Equal => return Some(node),
                Ordering::Greater => x = node_ref.right,
            }
        }

        None
    }

    fn probe(&self, key: Key) -> Probe {
        let mut path = Vec::new();
        let mut last = None;
        let mut x = self.root;
        while let Some(node) = x {
            let node_ref = &self.nodes[node];
            let ordering = key.cmp(&node_ref.key);
            path.push((node_ref.key, ordering));
            let side = match ordering {
                Ordering::Less => Side::Left,
                Ordering::Equal => {
                    return Probe {
                        path,
                        hit: Some(node),
                        last,
                    }
                }
                Ordering::Greater => Side::Right,
            };
            last = Some((node, side));
            x = node_ref.child(side);
        }

        Probe {
            path,
            hit: None,
            last,
        }
    }

    fn record_path(&mut self, key: Key, path: &[(Key, Ordering)]) {
        for &(node, ordering) in path {
            self.step(Step::Compare {
                key,
                node,
                ordering,
            });
        }
    }

    fn min_of(&self, root: Index) -> Index {
        let mut x = root;
        while let Some(left) = self.nodes[x].left {
            x = left;
        }

        x
    }

    fn max_of(&self, root: Index) -> Index {
        let mut x = root;
        while let Some(right) = self.nodes[x].right {
            x = right;
        }

        x
    }

    fn successor_of(&self, mut node: Index) -> Option<Index> {
        //       +---------- 34 ---------+
        //       |                       |
        // +---- 2 ----+                 58 ----+
        // |           |                        |
        // 1      +--- 9 ----+              +-- 77 --+
        //        |          |              |        |
        //     +- 6       +- 20 -+      +- 71 -+     82
        //     |          |      |      |      |
        //     5         12 -+   24    67      75
        //                   |
        //                   13

        match self.nodes[node].right {
            // 9 -> 12, 2 -> 5, 58 -> 67 ...
            // Everything in the right subtree is larger than node but smaller
            // than any larger ancestor, so the successor is its minimum.
            Some(right) => Some(self.min_of(right)),
            None => {
                // 6 -> 9, 1 -> 2, 13 -> 20, 24 -> 34 ...
                // Move up until we leave a left subtree, that parent is the successor.
                let mut node_parent = self.nodes[node].parent;
                while let Some(parent) = node_parent {
                    if self.nodes[parent].left == Some(node) {
                        break;
                    }
                    node = parent;
                    node_parent = self.nodes[node].parent;
                }

                node_parent
            }
        }
    }

    fn predecessor_of(&self, mut node: Index) -> Option<Index> {
        match self.nodes[node].left {
            // 2 -> 1, 9 -> 6, 20 -> 13, 77 -> 75
            Some(left) => Some(self.max_of(left)),
            None => {
                // 12 -> 9, 58 -> 34, 67 -> 58
                let mut node_parent = self.nodes[node].parent;
                while let Some(parent) = node_parent {
                    if self.nodes[parent].right == Some(node) {
                        break;
                    }
                    node = parent;
                    node_parent = self.nodes[node].parent;
                }

                node_parent
            }
        }
    }

    /// Points the slot of `parent` that held `old` at `new`. A missing parent
    /// means `old` was the root.
    fn replace_child(&mut self, parent: Option<Index>, old: Index, new: Option<Index>) {
        match parent {
            None => self.root = new,
            Some(parent) => {
                let parent = &mut self.nodes[parent];
                if parent.left == Some(old) {
                    parent.left = new;
                } else {
                    debug_assert_eq!(parent.right, Some(old));
                    parent.right = new;
                }
            }
        }
    }

    /// Rotates so that `node` moves down to `side`.
    fn rotate(&mut self, node: Index, side: Side) {
        match side {
            Side::Left => self.rotate_left(node),
            Side::Right => self.rotate_right(node),
        }
    }

    pub(crate) fn rotate_left(&mut self, node: Index) {
        //    p                       p
        //    |                       |
        // +-node-+               +-right-+
        // |      |      -->      |       |
        // a  +-right-+       +-node-+    c
        //    |       |       |      |
        //    b       c       a      b
        // where a, b, c can be any subtrees
        let Some(right) = self.nodes[node].right else {
            return;
        };

        // attach b to node
        let b = self.nodes[right].left;
        self.nodes[node].right = b;
        if let Some(b) = b {
            self.nodes[b].parent = Some(node);
        }

        // attach right to parent
        let parent = self.nodes[node].parent;
        self.nodes[right].parent = parent;
        self.replace_child(parent, node, Some(right));

        // attach node to right
        self.nodes[right].left = Some(node);
        self.nodes[node].parent = Some(right);

        let pivot = self.nodes[node].key;
        self.step(Step::Rotate {
            side: Side::Left,
            pivot,
        });
    }

    pub(crate) fn rotate_right(&mut self, node: Index) {
        //         p              p
        //         |              |
        //     +-node-+       +-left-+
        //     |      |       |      |
        // +-left-+   c  -->  a  +-node-+
        // |      |              |      |
        // a      b              b      c
        // where a, b, c can be any subtrees
        let Some(left) = self.nodes[node].left else {
            return;
        };

        // attach b to node
        let b = self.nodes[left].right;
        self.nodes[node].left = b;
        if let Some(b) = b {
            self.nodes[b].parent = Some(node);
        }

        // attach left to parent
        let parent = self.nodes[node].parent;
        self.nodes[left].parent = parent;
        self.replace_child(parent, node, Some(left));

        // attach node to left
        self.nodes[left].right = Some(node);
        self.nodes[node].parent = Some(left);

        let pivot = self.nodes[node].key;
        self.step(Step::Rotate {
            side: Side::Right,
            pivot,
        });
    }

    fn insert_fixup(&mut self, new_node: Index) {
        let mut node = new_node;
        while let Some(mut parent) = self.nodes[node].parent {
            if self.nodes[parent].color.is_black() {
                break;
            }
            // Red parent with a red child. This is the only violation: at the
            // first iteration between the new node and its parent, after a
            // red uncle recolor between the grandparent and its parent.
            //
            // A red parent is never the root, so the grandparent exists.
            let Some(grand_parent) = self.nodes[parent].parent else {
                break;
            };
            debug_assert!(self.nodes[grand_parent].color.is_black());
            let side = if self.nodes[grand_parent].left == Some(parent) {
                Side::Left
            } else {
                Side::Right
            };
            let uncle = self.nodes[grand_parent].child(side.opposite());
            let node_key = self.nodes[node].key;

            if let Some(uncle) = uncle.filter(|&uncle| self.nodes[uncle].color.is_red()) {
                //     +--- gp:b ---+               +--- gp:r ---+
                //     |            |               |            |
                //  + p:r +      + u:r +   -->   + p:b +      + u:b +
                //  |     |      |     |         |     |      |     |
                // n:r   a:b    b:b   c:b       n:r   a:b    b:b   c:b
                //
                // Coloring n black would add a black node to its paths only.
                // Moving the black of gp down to p and u keeps black heights,
                // gp may now have a red parent so repeat from there.
                self.step(Step::InsertFixup {
                    case: InsertCase::RedUncle,
                    node: node_key,
                });
                self.recolor(parent, Color::Black);
                self.recolor(uncle, Color::Black);
                self.recolor(grand_parent, Color::Red);
                node = grand_parent;
                continue;
            }

            if self.nodes[parent].child(side.opposite()) == Some(node) {
                //       +-- gp:b --+                 +-- gp:b --+
                //       |          |                 |          |
                //  +-- p:r --+    u:b  -->       +- n:r --+    u:b
                //  |         |                   |        |
                // a:b    +- n:r -+           +- p:r -+   c:b
                //        |       |           |       |
                //       b:b     c:b         a:b     b:b
                //
                // rotate parent and swap node and parent so we match the line case below
                self.step(Step::InsertFixup {
                    case: InsertCase::Triangle,
                    node: node_key,
                });
                self.rotate(parent, side);
                mem::swap(&mut parent, &mut node);
            }

            //           +-- gp:b --+            +----- p:b -----+
            //           |          |            |               |
            //      +-- p:r --+    u:b  -->   +- n:r -+     +- gp:r -+
            //      |         |               |       |     |        |
            //  +- n:r -+    c:b             a:b     b:b   c:b      u:b
            //  |       |
            // a:b     b:b
            //
            // p is black now, so there is nothing left to fix above it.
            let node_key = self.nodes[node].key;
            self.step(Step::InsertFixup {
                case: InsertCase::Line,
                node: node_key,
            });
            self.recolor(parent, Color::Black);
            self.recolor(grand_parent, Color::Red);
            self.rotate(grand_parent, side.opposite());
            break;
        }

        if let Some(root) = self.root {
            self.recolor(root, Color::Black);
        }
    }

    fn delete_node(&mut self, node: Index) {
        let key = self.nodes[node].key;
        let children = self.nodes[node].children();
        self.step(Step::DeleteShape { key, children });

        match (self.nodes[node].left, self.nodes[node].right) {
            (Some(_), Some(right)) => {
                // The successor is the minimum of the right subtree. It has no
                // left child, so deleting its cell takes the simple path below.
                let successor = self.min_of(right);
                let successor_key = self.nodes[successor].key;
                self.step(Step::Successor {
                    of: key,
                    successor: successor_key,
                });
                self.nodes[node].key = successor_key;
                self.step(Step::CopyKey {
                    from: successor_key,
                    into: key,
                });
                self.delete_node(successor);
            }
            _ => self.splice(node),
        }
    }

    /// Removes a node with at most one child by moving the child into its slot.
    fn splice(&mut self, node: Index) {
        let removed = self
            .nodes
            .remove(node)
            .expect("spliced node must be in the arena");
        let child = removed.left.or(removed.right);

        self.replace_child(removed.parent, node, child);
        if let Some(child) = child {
            self.nodes[child].parent = removed.parent;
        }
        let replacement = child.map(|child| self.key(child));
        self.step(Step::Splice {
            removed: removed.key,
            replacement,
        });

        if removed.color.is_black() {
            let parent = removed.parent.map(|parent| self.key(parent));
            self.step(Step::DoubleBlack {
                at: replacement,
                parent,
            });
            self.delete_fixup(child, removed.parent);
        }
    }

    /// Restores black heights after a black node was removed.
    ///
    /// `x` is the position that lost a black node and `x_parent` its parent.
    /// `x` is `None` when the removed node had no children, which is why the
    /// parent is tracked separately.
    fn delete_fixup(&mut self, mut x: Option<Index>, mut x_parent: Option<Index>) {
        // If x is red we simply color it black after the loop, that restores
        // the black node that was removed above it.
        while x != self.root && self.color_of(x).is_black() {
            let Some(parent) = x_parent else {
                break;
            };
            // x is doubly black. Its sibling cannot be absent: paths through x
            // have one black node fewer than before the removal, so the paths
            // through the sibling must contain at least one black node.
            let side = if self.nodes[parent].left == x {
                Side::Left
            } else {
                Side::Right
            };
            let far = side.opposite();
            let parent_key = self.nodes[parent].key;
            let mut sibling = self.sibling(parent, far);

            if self.nodes[sibling].color.is_red() {
                //     ┌─── p:b ───┐                ┌─── p:r ───┐                    ┌─── s:b ───┐
                //     │           │                │           │                    │           │
                // ┌─ x:b ─┐   ┌─ s:r ─┐   ──►  ┌─ x:b ─┐   ┌─ s:b ─┐   ──►      ┌─ p:r ─┐      d:b
                // │       │   │       │        │       │   │       │            │       │
                // a       b  c:b     d:b       a       b  c:b     d:b       ┌─ x:b ─┐  c:b
                //                                                           │       │
                //                                                           a       b
                // x gains a red parent and one of the cases below finishes the job.
                self.step(Step::DeleteFixup {
                    case: DeleteCase::RedSibling,
                    parent: parent_key,
                });
                self.recolor(sibling, Color::Black);
                self.recolor(parent, Color::Red);
                self.rotate(parent, side);
                sibling = self.sibling(parent, far);
            }

            let near_nephew = self.nodes[sibling].child(side);
            let far_nephew = self.nodes[sibling].child(far);

            if self.color_of(near_nephew).is_black() && self.color_of(far_nephew).is_black() {
                //     ┌─── p:c ───┐                ┌─── p:c ───┐
                //     │           │                │           │
                // ┌─ x:b ─┐   ┌─ s:b ─┐   ──►  ┌─ x:b ─┐   ┌─ s:r ─┐
                // │       │   │       │        │       │   │       │
                // a       b  c:b     d:b       a       b  c:b     d:b
                //
                // Take one black off both x and s and push it to the parent.
                self.step(Step::DeleteFixup {
                    case: DeleteCase::BlackNephews,
                    parent: parent_key,
                });
                self.recolor(sibling, Color::Red);
                x = Some(parent);
                x_parent = self.nodes[parent].parent;
                continue;
            }

            if self.color_of(far_nephew).is_black() {
                //    ┌───── p:c ─────┐                ┌───── p:c ─────┐                ┌─── p:c ───┐
                //    │               │                │               │                │           │
                // ┌─ x:b ─┐      ┌─ s:b ─┐   ──►  ┌─ x:b ─┐       ┌─ s:r ─┐   ──►  ┌─ x:b ─┐   ┌─ c:b ─┐
                // │       │      │       │        │       │       │       │        │       │   │       │
                // a       b  ┌─ c:r ─┐  d:b       a       b   ┌─ c:b ─┐   d:b      a       b   e   ┌─ s:r ─┐
                //            │       │                        │       │                            │       │
                //            e       f                        e       f                            f      d:b
                self.step(Step::DeleteFixup {
                    case: DeleteCase::NearNephewRed,
                    parent: parent_key,
                });
                if let Some(near_nephew) = near_nephew {
                    self.recolor(near_nephew, Color::Black);
                }
                self.recolor(sibling, Color::Red);
                self.rotate(sibling, far);
                sibling = self.sibling(parent, far);
            }

            //     ┌─── p:c ───┐                ┌─── p:b ───┐                     ┌── s:c ──┐
            //     │           │                │           │                     │         │
            // ┌─ x:b ─┐   ┌─ s:b ─┐   ──►  ┌─ x:b ─┐   ┌─ s:c ─┐   ──►       ┌─ p:b ─┐    d:b
            // │       │   │       │        │       │   │       │             │       │
            // a       b  c:b     d:r       a       b  c:b     d:b       ┌─ x:b ─┐   c:b
            //                                                           │       │
            //                                                           a       b
            //
            // x gains a black ancestor and d takes over the black s had.
            self.step(Step::DeleteFixup {
                case: DeleteCase::FarNephewRed,
                parent: parent_key,
            });
            let parent_color = self.nodes[parent].color;
            self.recolor(sibling, parent_color);
            self.recolor(parent, Color::Black);
            if let Some(far_nephew) = self.nodes[sibling].child(far) {
                self.recolor(far_nephew, Color::Black);
            }
            self.rotate(parent, side);
            x = self.root;
            break;
        }

        if let Some(x) = x {
            self.recolor(x, Color::Black);
        }
        if let Some(root) = self.root {
            self.recolor(root, Color::Black);
        }
    }

    fn sibling(&self, parent: Index, side: Side) -> Index {
        self.nodes[parent]
            .child(side)
            .expect("a doubly black node always has a sibling")
    }
}
