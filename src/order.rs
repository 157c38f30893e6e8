//! Key ordering for indexed entries
//!
//! The indexes in this crate never look inside an entry themselves. Every ordering decision is
//! delegated to the caller, in one of two equivalent forms:
//!
//! - The `_by` operations take a comparison function `Fn(&K, &N) -> Ordering` that ranks a
//!   search key against an indexed entry. Any state a comparison needs beyond its two arguments
//!   rides in the closure environment.
//! - The plain operations require the entry type to implement [`TreeOrd`], which fixes the key
//!   type and the comparison at compile time.
//!
//! The same convention covers the other two callbacks an index accepts: a key update function
//! `FnMut(&K, &mut N) -> Result<(), E>` that writes the given key into an entry, and a free
//! function `FnMut(N) -> Result<(), E>` that consumes an entry and releases its resources.

#![warn(missing_docs)]

use core::cmp::Ordering;

//-----------------------------------------------------------------------------------------------//

/// Key ordering for an entry type.
///
/// Binds an entry type to the key its indexes are ordered by. `cmp_keys` must be a strict total
/// order, and must rank consistently for as long as any index holds the entry. An index built
/// over an inconsistent ordering produces undefined (though memory-safe) results.
///
/// ```
/// use core::cmp::Ordering;
/// use grove::TreeOrd;
///
/// struct Session {
///     id: u64,
/// }
///
/// impl TreeOrd for Session {
///     type Key = u64;
///
///     fn key(&self) -> &u64 {
///         &self.id
///     }
///
///     fn cmp_keys(a: &u64, b: &u64) -> Ordering {
///         a.cmp(b)
///     }
/// }
/// ```
pub trait TreeOrd {
    /// The key type entries are ordered by
    type Key: ?Sized;

    /// Borrow the entry's key
    fn key(&self) -> &Self::Key;

    /// Rank one key against another
    fn cmp_keys(a: &Self::Key, b: &Self::Key) -> Ordering;
}
