use thiserror::Error;

use crate::Key;

/// Non-fatal outcomes of tree operations. None of them mutate the tree.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeError {
    #[error("key {0} already exists")]
    DuplicateKey(Key),

    #[error("key {0} not found")]
    KeyNotFound(Key),

    #[error("tree is empty")]
    EmptyTree,
}

impl TreeError {
    /// Returns `true` if the error means "the key is not in the tree",
    /// which includes looking into an empty tree.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound(_) | Self::EmptyTree)
    }
}

pub type TreeResult<T> = Result<T, TreeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        assert_eq!(TreeError::DuplicateKey(4).to_string(), "key 4 already exists");
        assert_eq!(TreeError::KeyNotFound(-2).to_string(), "key -2 not found");
        assert_eq!(TreeError::EmptyTree.to_string(), "tree is empty");
    }

    #[test]
    fn not_found() {
        assert!(TreeError::KeyNotFound(1).is_not_found());
        assert!(TreeError::EmptyTree.is_not_found());
        assert!(!TreeError::DuplicateKey(1).is_not_found());
    }
}
