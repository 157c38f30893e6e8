//! [![github]](https://github.com/duncanlivingston/grove)&ensp;
//! [![crates-io]](https://crates.io/duncanlivingston/grove)&ensp;
//!
//! [github]: https://img.shields.io/badge/github-8da0cb?style=for-the-badge&labelColor=555555&logo=github
//! [crates-io]: https://img.shields.io/badge/crates.io-fc8d62?style=for-the-badge&labelColor=555555&logo=rust
//!
//! ## Introduction
//!
//! This crate implements ordered indexes of caller-defined objects, backed by binary search
//! trees: a red-black tree with guaranteed logarithmic height, and a self-adjusting splay tree
//! that moves every accessed entry to the root for amortised logarithmic access. Both keep their
//! entries sorted into an 'ascending' order by comparing keys pairwise.
//!
//! ## Benefits
//!
//! The crate complements the standard `std::collection` routines, but provides the following
//! benefits:
//!
//! - Entries are caller-defined objects carrying their own key fields. The indexes never
//!   inspect an entry themselves: every ordering decision is delegated to the caller, either
//!   through the [`TreeOrd`] trait or through a comparison function passed per call.
//! - Entries do not need to be hashable, clonable or copyable. They are inserted by value and
//!   handed back by value when removed, so one entry can only ever belong to one index.
//! - Keys can be rewritten in place with a transactional `update_key` operation that rolls the
//!   index back if the new key collides with an existing entry.
//! - The crate is small and `#![no_std]`.
//! - The storage of entries is separate to the storage of the structure of the tree. Entries
//!   are moved when inserted and moved when the storage is expanded, but otherwise do not move
//!   as the tree reconfigures around them, and the memory of removed entries is recycled for
//!   future use.
//!
//! ## Contents
//!
//! The initial release of the `grove` crate includes the following types
//!
//! <center>
//!
//! | Type            | Balancing | Height          | Lookup          |
//! |:----------------|:----------|:----------------|:----------------|
//! | [`RbIndex`]     | Red-black | O(log n) always | Non-mutating    |
//! | [`SplayIndex`]  | Splay     | Amortised       | Splays to root  |
//!
//! </center>
//!
//! The crate exposes the additional types `rbtree::Tree` and `splay::Tree` that provide the
//! foundations of the two indexes. These can be thought of as utilities that manage a set of
//! `usize` indices into an external vector of data, without storing the vector itself. They are
//! provided to support development of additional collection types.

#![no_std]
#![warn(missing_docs)]

mod error;
mod order;
pub mod rbtree;
pub mod splay;

pub use error::*;
pub use order::*;
pub use rbtree::{RbIndex, RbIndexIterator};
pub use splay::{SplayIndex, SplayIndexIterator};
