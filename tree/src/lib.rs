//! A red-black tree over integer keys that records every step it takes.
//!
//! The tree keeps the classic five color properties plus BST ordering after
//! every public operation and, alongside each insert, delete, search and
//! traversal, produces an [`OperationTrace`] describing the comparisons,
//! rotations and recolorings it made. A presentation layer can replay those
//! traces; the engine itself never depends on them.
//!
//! ```
//! use rbtree_trace::{Color, RedBlackTree};
//!
//! let mut tree = RedBlackTree::new();
//! for key in [10, 20, 30] {
//!     tree.insert(key).unwrap();
//! }
//!
//! let root = tree.node(tree.root_id().unwrap()).unwrap();
//! assert_eq!((root.key, root.color), (20, Color::Black));
//! assert_eq!(tree.bfs().unwrap(), vec![20, 10, 30]);
//! ```
#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod invariants;
mod red_black_tree;
mod trace;
mod traversal;

pub use config::{ConfigError, EngineConfig, RandomRange};
pub use error::{TreeError, TreeResult};
pub use invariants::InvariantViolation;
pub use red_black_tree::{Color, NodeId, NodeView, RedBlackTree, Side};
pub use trace::{DeleteCase, History, InsertCase, Operation, OperationTrace, Step};

/// Key type stored in the tree.
pub type Key = i32;
