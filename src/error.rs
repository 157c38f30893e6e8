//! Error types shared by the tree indexes

#![warn(missing_docs)]

use core::fmt;

use thiserror::Error;

//-----------------------------------------------------------------------------------------------//

/// Error returned when inserting an entry whose key is already indexed.
///
/// The index is left untouched and the rejected entry is handed back unmodified.
#[derive(Error, Clone, Copy, PartialEq, Eq)]
#[error("an entry with an equal key is already indexed")]
pub struct Occupied<N>(
    /// The rejected entry
    pub N,
);

impl<N> Occupied<N> {
    /// Recover the rejected entry
    pub fn into_entry(self) -> N {
        self.0
    }
}

impl<N> fmt::Debug for Occupied<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Occupied(..)")
    }
}

//-----------------------------------------------------------------------------------------------//

/// Error returned by the transactional key update operation.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKeyError<E>
where
    E: fmt::Debug + fmt::Display,
{
    /// No entry with a key equal to the old key is indexed
    #[error("no entry with an equal key is indexed")]
    NotFound,

    /// An entry with a key equal to the new key is already indexed. The update was rolled back
    /// and the entry is still indexed under its original key.
    #[error("an entry with an equal key is already indexed")]
    Occupied,

    /// The key update function refused the new key. The entry was re-attached under its
    /// original key.
    #[error("key update failed: {0}")]
    Callback(E),
}

//-----------------------------------------------------------------------------------------------//

/// An invariant violation reported by the tree checkers.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// An in-order walk produced keys out of strictly ascending order
    #[error("entries are not in strictly ascending key order")]
    OutOfOrder,

    /// A child's parent link does not point back at its parent
    #[error("a child's parent link does not point back at its parent")]
    BadBackLink,

    /// The root of a red-black tree is red
    #[error("the root is red")]
    RedRoot,

    /// A red entry of a red-black tree has a red child
    #[error("a red entry has a red child")]
    RedRedEdge,

    /// Two root-to-leaf paths of a red-black tree pass different numbers of black entries
    #[error("black depth differs between paths")]
    UnevenBlackDepth,

    /// The tree structure disagrees with the entry storage or the recorded count
    #[error("the tree structure disagrees with the entry storage")]
    BrokenStructure,
}
