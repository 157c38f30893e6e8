//! Implementation of an ordered object index, backed by a splay tree

#![warn(missing_docs)]

extern crate alloc;

use alloc::vec::Vec;
use core::{cmp::Ordering, fmt, iter::FusedIterator};

use crate::error::{Occupied, UpdateKeyError, Violation};
use crate::order::TreeOrd;

//-----------------------------------------------------------------------------------------------//

// A leaf in a splay tree
//
// There is no parent link: top-down restructuring stands in for it. Recycled leaves thread the
// free chain through `left`.
#[derive(Clone)]
struct Leaf {
    left: usize,
    right: usize,
}

//-----------------------------------------------------------------------------------------------//

/// A splay tree of integer leaves
///
/// Manages a set of `usize` indices into an external vector of data, without storing the vector
/// itself. Every ordering decision is delegated to a 'probe' function that ranks the search key
/// against the entry a given leaf refers to. The [`SplayIndex`] type is built on this; it is
/// public to support development of additional collection types.
#[derive(Clone)]
pub struct Tree {
    leaf: Vec<Leaf>,
    root: usize,
    recycle: usize,
    count: usize,
}

impl Tree {
    /// Construct an empty tree
    pub fn new() -> Tree {
        Tree {
            leaf: Vec::new(),
            root: !0,
            recycle: !0,
            count: 0,
        }
    }

    /// Construct an empty tree, pre-allocating a given capacity
    pub fn with_capacity(capacity: usize) -> Tree {
        Tree {
            leaf: Vec::with_capacity(capacity),
            root: !0,
            recycle: !0,
            count: 0,
        }
    }

    /// Get the number of leaves in the tree
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Get the number of recycled leaves in the tree
    #[inline]
    pub fn recycle_count(&self) -> usize {
        self.leaf.len() - self.count
    }

    /// Get the current allocated size of the tree. This is the current `count` plus the
    /// `recycle_count`. Note that this is not necessarily the same as the allocated capacity.
    #[inline]
    pub fn allocated_count(&self) -> usize {
        self.leaf.len()
    }

    /// Check if there are any leaves in the tree
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Remove all leaves from the tree
    pub fn clear(&mut self) {
        self.leaf.truncate(0);
        self.root = !0;
        self.recycle = !0;
        self.count = 0;
    }

    /// Reserves capacity for at least `additional` more leaves
    ///
    /// The tree may already have some room that has been allocated then 'recycled', and this
    /// space is subtracted from the `additional` requested. This function returns the total
    /// amount of additional element storage that was required (if any), which is useful when
    /// implementing more complex types.
    pub fn reserve(&mut self, additional: usize) -> usize {
        let recycle_count = self.recycle_count();
        if additional > recycle_count {
            let required = additional - recycle_count;
            self.leaf.reserve(required);
            required
        } else {
            0
        }
    }

    /// Get the root leaf
    ///
    /// After a [`splay`](Tree::splay) this is the leaf the search ended on: the match if one
    /// exists, otherwise the last leaf compared.
    #[inline]
    pub fn root(&self) -> usize {
        self.root
    }

    /// Get the left child of a leaf
    #[inline]
    pub fn left(&self, leaf: usize) -> usize {
        self.leaf[leaf].left
    }

    /// Get the right child of a leaf
    #[inline]
    pub fn right(&self, leaf: usize) -> usize {
        self.leaf[leaf].right
    }

    /// Splay the tree on a search key
    ///
    /// `probe` ranks the search key against the entry a leaf refers to. After the call the root
    /// is the matching leaf if one exists, otherwise the last leaf the walk compared against.
    /// Repeated application of the splay is what gives the tree its amortised logarithmic
    /// access time.
    pub fn splay<F>(&mut self, probe: F)
    where
        F: Fn(usize) -> Ordering,
    {
        self.root = splay(&mut self.leaf, self.root, probe);
    }

    /// Get a leaf by probe without restructuring the tree
    ///
    /// If no leaf matches, then `usize::MAX` is returned.
    pub fn get<F>(&self, probe: F) -> usize
    where
        F: Fn(usize) -> Ordering,
    {
        let mut x = self.root;

        loop {
            if !x == 0 {
                return !0;
            }

            match probe(x) {
                Ordering::Equal => return x,
                Ordering::Less => x = self.leaf[x].left,
                Ordering::Greater => x = self.leaf[x].right,
            }
        }
    }

    /// Insert a new leaf at the root
    ///
    /// The tree must already be splayed on the new key, with `order` the rank of that key
    /// against the current root. The new leaf becomes the root and takes one side of the old
    /// root as a subtree. `order` must not be `Equal` unless the tree is empty. The new leaf
    /// is returned; note that this may be a 'recycled' value that has previously been removed,
    /// or a new leaf value that is the next in the ascending sequence.
    pub fn insert_root(&mut self, order: Ordering) -> usize {
        let t = self.root;
        debug_assert!(!t == 0 || order != Ordering::Equal);

        let x = self.alloc();

        if !t != 0 {
            if order == Ordering::Less {
                self.leaf[x].left = self.leaf[t].left;
                self.leaf[x].right = t;
                self.leaf[t].left = !0;
            } else {
                self.leaf[x].right = self.leaf[t].right;
                self.leaf[x].left = t;
                self.leaf[t].right = !0;
            }
        }

        self.root = x;
        x
    }

    /// Detach the root leaf
    ///
    /// The caller must have splayed the leaf to remove to the root. The left and right subtrees
    /// are rejoined by splaying the right subtree on its minimum, which then has a free left
    /// connection for the left subtree to hang from. The detached leaf is added to the 'recycle
    /// bin' for possible future reallocation, and its index is returned.
    pub fn remove_root(&mut self) -> usize {
        let t = self.root;
        debug_assert!(!t != 0);

        let a = self.leaf[t].left;
        let b = self.leaf[t].right;

        self.root = if !a == 0 {
            b
        } else if !b == 0 {
            a
        } else {
            let m = splay(&mut self.leaf, b, |_| Ordering::Less);
            debug_assert_eq!(self.leaf[m].left, !0);
            self.leaf[m].left = a;
            m
        };

        self.free(t);
        t
    }

    /// Get the first leaf in the tree
    pub fn first(&self) -> usize {
        let mut x = self.root;

        if !x == 0 {
            return !0;
        }

        loop {
            let y = self.leaf[x].left;
            if !y == 0 {
                return x;
            }
            x = y;
        }
    }

    /// Get the last leaf in the tree
    pub fn last(&self) -> usize {
        let mut x = self.root;

        if !x == 0 {
            return !0;
        }

        loop {
            let y = self.leaf[x].right;
            if !y == 0 {
                return x;
            }
            x = y;
        }
    }

    /// Tear the tree down leaf by leaf
    ///
    /// Rotates the root's left child up until the root has no left subtree, then visits the
    /// root and steps right, so every leaf is visited exactly once in ascending order. The walk
    /// is iterative and uses no auxiliary storage, so degenerate shapes of any depth are safe.
    /// Leaves the tree empty.
    pub fn drain<F>(&mut self, mut visit: F)
    where
        F: FnMut(usize),
    {
        let mut x = self.root;

        while !x != 0 {
            let y = self.leaf[x].left;
            if !y != 0 {
                // Rotate the left child above `x`
                self.leaf[x].left = self.leaf[y].right;
                self.leaf[y].right = x;
                x = y;
            } else {
                let y = self.leaf[x].right;
                visit(x);
                x = y;
            }
        }

        self.clear();
    }

    /// Check the binary search tree ordering
    ///
    /// Iterative in-order walk with an explicit stack; `cmp` ranks the entry at the first leaf
    /// against the entry at the second. Verifies that the leaves are in strictly ascending
    /// order and that every leaf is reachable.
    pub fn check<F>(&self, cmp: F) -> Result<(), Violation>
    where
        F: Fn(usize, usize) -> Ordering,
    {
        let mut stack: Vec<usize> = Vec::new();
        let mut prev = !0;
        let mut seen = 0;
        let mut x = self.root;

        loop {
            while !x != 0 {
                stack.push(x);
                x = self.leaf[x].left;
            }

            let Some(y) = stack.pop() else { break };

            if !prev != 0 && cmp(prev, y) != Ordering::Less {
                return Err(Violation::OutOfOrder);
            }

            prev = y;
            seen += 1;
            x = self.leaf[y].right;
        }

        if seen != self.count {
            return Err(Violation::BrokenStructure);
        }

        Ok(())
    }

    // Allocate and initialise a new leaf
    fn alloc(&mut self) -> usize {
        // Increase the leaf count
        self.count += 1;

        // Recycle an old leaf
        let leaf = self.recycle;
        if !leaf != 0 {
            let l = &mut self.leaf[leaf];
            self.recycle = l.left;
            l.left = !0;
            l.right = !0;

            return leaf;
        }

        // Inititialise a new one
        let leaf = self.leaf.len();
        self.leaf.push(Leaf { left: !0, right: !0 });

        // Return the new leaf
        leaf
    }

    // Free a leaf and add it to the recycle queue
    fn free(&mut self, leaf: usize) {
        // Decrease the leaf count
        self.count -= 1;

        // Recycle the leaf
        self.leaf[leaf].left = self.recycle;
        self.recycle = leaf;
    }
}

impl Default for Tree {
    fn default() -> Self {
        Tree::new()
    }
}

//-----------------------------------------------------------------------------------------------//

// IMPLEMENTATION NOTE
//
// The function below is low level. It is not 'unsafe' in the Rust sense, but it rewrites links
// wholesale. Use with caution.

// Top-down splay of the subtree rooted at `t`
//
// Walks down from `t` comparing with `probe`, flattening the path with zig-zig rotations and
// collecting the bypassed leaves on a 'lower' and a 'higher' chain, then reassembles the three
// pieces around the last leaf compared. That leaf becomes the new subtree root and is returned:
// the match if the probe hit `Equal`, otherwise the closest leaf visited.
fn splay<F>(leaf: &mut [Leaf], t: usize, probe: F) -> usize
where
    F: Fn(usize) -> Ordering,
{
    if !t == 0 {
        return t;
    }

    let mut t = t;

    // Tails of the lower and higher reassembly chains
    let mut l = !0;
    let mut r = !0;

    // Heads of the chains
    let mut lh = !0;
    let mut rh = !0;

    loop {
        match probe(t) {
            Ordering::Equal => break,
            Ordering::Less => {
                let mut y = leaf[t].left;
                if !y == 0 {
                    break;
                }

                if probe(y) == Ordering::Less {
                    // Zig-zig: rotate right
                    leaf[t].left = leaf[y].right;
                    leaf[y].right = t;
                    t = y;

                    y = leaf[t].left;
                    if !y == 0 {
                        break;
                    }
                }

                // Link `t` onto the higher chain
                if !r == 0 {
                    rh = t;
                } else {
                    leaf[r].left = t;
                }
                r = t;
                t = y;
            }
            Ordering::Greater => {
                let mut y = leaf[t].right;
                if !y == 0 {
                    break;
                }

                if probe(y) == Ordering::Greater {
                    // Zig-zig: rotate left
                    leaf[t].right = leaf[y].left;
                    leaf[y].left = t;
                    t = y;

                    y = leaf[t].right;
                    if !y == 0 {
                        break;
                    }
                }

                // Link `t` onto the lower chain
                if !l == 0 {
                    lh = t;
                } else {
                    leaf[l].right = t;
                }
                l = t;
                t = y;
            }
        }
    }

    // Reassemble the chains around `t`
    if !l == 0 {
        lh = leaf[t].left;
    } else {
        leaf[l].right = leaf[t].left;
    }

    if !r == 0 {
        rh = leaf[t].right;
    } else {
        leaf[r].left = leaf[t].right;
    }

    leaf[t].left = lh;
    leaf[t].right = rh;

    t
}

//-----------------------------------------------------------------------------------------------//

// Entry storage referenced by a live leaf is always occupied; anything else means the index
// structure has been corrupted.

fn slot<N>(node: &[Option<N>], leaf: usize) -> &N {
    match node[leaf].as_ref() {
        Some(entry) => entry,
        None => panic!("a leaf refers to a vacant entry slot"),
    }
}

fn slot_mut<N>(node: &mut [Option<N>], leaf: usize) -> &mut N {
    match node[leaf].as_mut() {
        Some(entry) => entry,
        None => panic!("a leaf refers to a vacant entry slot"),
    }
}

fn take_slot<N>(node: &mut [Option<N>], leaf: usize) -> N {
    match node[leaf].take() {
        Some(entry) => entry,
        None => panic!("a leaf refers to a vacant entry slot"),
    }
}

//-----------------------------------------------------------------------------------------------//

/// An ordered index of caller-defined entries, backed by a splay tree.
///
/// Entries are inserted by value and handed back by value when removed, so an entry can only
/// ever belong to one index. While an entry is indexed the tree owns its links; the caller
/// reaches the payload through `find`. Lookups restructure the tree (the accessed entry, or the
/// closest entry compared, is splayed to the root), which is why they take `&mut self`.
#[derive(Clone)]
pub struct SplayIndex<N> {
    tree: Tree,
    node: Vec<Option<N>>,
}

impl<N> SplayIndex<N> {
    /// Constructor
    pub fn new() -> SplayIndex<N> {
        SplayIndex {
            tree: Tree::new(),
            node: Vec::new(),
        }
    }

    /// Constructor
    pub fn with_capacity(capacity: usize) -> SplayIndex<N> {
        SplayIndex {
            tree: Tree::with_capacity(capacity),
            node: Vec::with_capacity(capacity),
        }
    }

    /// Get the number of entries in the index
    #[inline]
    pub fn count(&self) -> usize {
        self.tree.count()
    }

    /// Check if there are any entries in the index
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Remove and drop all entries from the index
    pub fn clear(&mut self) {
        self.tree.clear();
        self.node.truncate(0);
    }

    /// Reserves capacity for at least `additional` more entries
    pub fn reserve(&mut self, additional: usize) {
        debug_assert_eq!(self.node.len(), self.tree.allocated_count());

        let required = self.tree.reserve(additional);
        if required > 0 {
            self.node.reserve(required);
        }
    }

    /// Get an entry by key.
    ///
    /// If the key is not in the index then `None` is returned. A hit splays the matching entry
    /// to the root; a miss splays the last entry compared.
    pub fn find(&mut self, key: &N::Key) -> Option<&N>
    where
        N: TreeOrd,
    {
        self.find_by(key, |key, entry| N::cmp_keys(key, entry.key()))
    }

    /// Get an entry by key, ranking entries with a comparison function.
    ///
    /// If the key is not in the index then `None` is returned. A hit splays the matching entry
    /// to the root; a miss splays the last entry compared.
    pub fn find_by<K, F>(&mut self, key: &K, compare: F) -> Option<&N>
    where
        K: ?Sized,
        F: Fn(&K, &N) -> Ordering,
    {
        let node = &self.node;
        self.tree.splay(|x| compare(key, slot(node, x)));

        let t = self.tree.root();
        if !t == 0 {
            return None;
        }

        let entry = slot(&self.node, t);
        if compare(key, entry) == Ordering::Equal {
            Some(entry)
        } else {
            None
        }
    }

    /// Get a mutable reference to an entry by key.
    ///
    /// The entry's key fields must not be altered through the returned reference; use
    /// [`update_key`](SplayIndex::update_key) to change a key.
    pub fn find_mut(&mut self, key: &N::Key) -> Option<&mut N>
    where
        N: TreeOrd,
    {
        self.find_mut_by(key, |key, entry| N::cmp_keys(key, entry.key()))
    }

    /// Get a mutable reference to an entry by key, ranking entries with a comparison function.
    ///
    /// The entry's key fields must not be altered through the returned reference; use
    /// [`update_key_by`](SplayIndex::update_key_by) to change a key.
    pub fn find_mut_by<K, F>(&mut self, key: &K, compare: F) -> Option<&mut N>
    where
        K: ?Sized,
        F: Fn(&K, &N) -> Ordering,
    {
        let node = &self.node;
        self.tree.splay(|x| compare(key, slot(node, x)));

        let t = self.tree.root();
        if !t == 0 {
            return None;
        }

        if compare(key, slot(&self.node, t)) == Ordering::Equal {
            Some(slot_mut(&mut self.node, t))
        } else {
            None
        }
    }

    /// Insert an entry.
    ///
    /// If an entry with an equal key is already indexed the index is left untouched and the
    /// new entry is handed back inside the error.
    pub fn insert(&mut self, entry: N) -> Result<(), Occupied<N>>
    where
        N: TreeOrd,
    {
        {
            let node = &self.node;
            self.tree
                .splay(|x| N::cmp_keys(entry.key(), slot(node, x).key()));
        }

        let t = self.tree.root();
        let order = if !t == 0 {
            Ordering::Less
        } else {
            match N::cmp_keys(entry.key(), slot(&self.node, t).key()) {
                Ordering::Equal => return Err(Occupied(entry)),
                order => order,
            }
        };

        self.place(order, entry);
        Ok(())
    }

    /// Insert an entry under the given key, ranking entries with a comparison function.
    ///
    /// The key must rank equal to the entry's own key fields under `compare`; it only drives
    /// the descent. If an entry with an equal key is already indexed the index is left
    /// untouched and the new entry is handed back inside the error.
    pub fn insert_by<K, F>(&mut self, key: &K, entry: N, compare: F) -> Result<(), Occupied<N>>
    where
        K: ?Sized,
        F: Fn(&K, &N) -> Ordering,
    {
        {
            let node = &self.node;
            self.tree.splay(|x| compare(key, slot(node, x)));
        }

        let t = self.tree.root();
        let order = if !t == 0 {
            Ordering::Less
        } else {
            match compare(key, slot(&self.node, t)) {
                Ordering::Equal => return Err(Occupied(entry)),
                order => order,
            }
        };

        self.place(order, entry);
        Ok(())
    }

    /// Remove an entry by key.
    ///
    /// The entry is moved back to the caller; its storage is recycled for future insertions.
    /// If the key is not in the index then `None` is returned.
    pub fn remove(&mut self, key: &N::Key) -> Option<N>
    where
        N: TreeOrd,
    {
        self.remove_by(key, |key, entry| N::cmp_keys(key, entry.key()))
    }

    /// Remove an entry by key, ranking entries with a comparison function.
    ///
    /// The entry is moved back to the caller; its storage is recycled for future insertions.
    /// If the key is not in the index then `None` is returned.
    pub fn remove_by<K, F>(&mut self, key: &K, compare: F) -> Option<N>
    where
        K: ?Sized,
        F: Fn(&K, &N) -> Ordering,
    {
        let node = &self.node;
        self.tree.splay(|x| compare(key, slot(node, x)));

        let t = self.tree.root();
        if !t == 0 || compare(key, slot(&self.node, t)) != Ordering::Equal {
            return None;
        }

        let t = self.tree.remove_root();
        Some(take_slot(&mut self.node, t))
    }

    /// Move an entry from one key to another.
    ///
    /// The entry indexed under `old_key` is detached, `update` is invoked with `new_key` to
    /// rewrite the entry's key fields, and the entry is re-inserted under the new key. The
    /// operation is transactional:
    ///
    /// - if `update` fails, the entry is re-attached under its original key and the callback's
    ///   error is returned, so a failed call never changes the index's membership. A failing
    ///   `update` must leave the entry's ordering unchanged.
    /// - if an entry with an equal new key is already indexed, `update` is invoked again with
    ///   `old_key` to revert the entry, which is then re-attached under its original key.
    pub fn update_key<E, U>(
        &mut self,
        old_key: &N::Key,
        new_key: &N::Key,
        update: U,
    ) -> Result<(), UpdateKeyError<E>>
    where
        N: TreeOrd,
        E: fmt::Debug + fmt::Display,
        U: FnMut(&N::Key, &mut N) -> Result<(), E>,
    {
        self.update_key_by(old_key, new_key, update, |key, entry| {
            N::cmp_keys(key, entry.key())
        })
    }

    /// Move an entry from one key to another, ranking entries with a comparison function.
    ///
    /// See [`update_key`](SplayIndex::update_key) for the transactional contract.
    pub fn update_key_by<K, E, U, C>(
        &mut self,
        old_key: &K,
        new_key: &K,
        mut update: U,
        compare: C,
    ) -> Result<(), UpdateKeyError<E>>
    where
        K: ?Sized,
        E: fmt::Debug + fmt::Display,
        U: FnMut(&K, &mut N) -> Result<(), E>,
        C: Fn(&K, &N) -> Ordering,
    {
        let Some(mut entry) = self.remove_by(old_key, &compare) else {
            return Err(UpdateKeyError::NotFound);
        };

        if let Err(err) = update(new_key, &mut entry) {
            // The callback refused the new key: put the entry back where it was
            self.reattach(old_key, entry, &compare);
            return Err(UpdateKeyError::Callback(err));
        }

        match self.insert_by(new_key, entry, &compare) {
            Ok(()) => Ok(()),
            Err(Occupied(mut entry)) => {
                // Another entry already holds the new key: revert and re-attach
                if update(old_key, &mut entry).is_err() {
                    panic!("key update rollback failed");
                }
                self.reattach(old_key, entry, &compare);
                Err(UpdateKeyError::Occupied)
            }
        }
    }

    /// Release every entry through a free function and empty the index.
    ///
    /// `free` consumes each entry exactly once, in ascending order. Per-entry failures do not
    /// stop the sweep; the last error is returned once the index is empty. Calling this on an
    /// empty index does nothing.
    pub fn freenodes<E, F>(&mut self, mut free: F) -> Result<(), E>
    where
        F: FnMut(N) -> Result<(), E>,
    {
        let node = &mut self.node;
        let mut result = Ok(());

        self.tree.drain(|x| {
            if let Err(err) = free(take_slot(node, x)) {
                result = Err(err);
            }
        });

        self.node.truncate(0);
        result
    }

    /// Check the index invariants
    ///
    /// Verifies that an in-order walk of the tree yields entries in strictly ascending key
    /// order and that the structure agrees with the entry storage. The walk is iterative, so
    /// degenerate shapes of any depth are safe.
    pub fn check(&self) -> Result<(), Violation>
    where
        N: TreeOrd,
    {
        self.check_by(|a, b| N::cmp_keys(a.key(), b.key()))
    }

    /// Check the index invariants, ranking entries with a comparison function
    pub fn check_by<F>(&self, compare: F) -> Result<(), Violation>
    where
        F: Fn(&N, &N) -> Ordering,
    {
        let occupied = self.node.iter().filter(|entry| entry.is_some()).count();
        if occupied != self.tree.count() {
            return Err(Violation::BrokenStructure);
        }

        let node = &self.node;
        self.tree.check(|a, b| compare(slot(node, a), slot(node, b)))
    }

    /// Get the first entry in the index
    pub fn first(&self) -> Option<&N> {
        let x = self.tree.first();
        if !x == 0 {
            None
        } else {
            Some(slot(&self.node, x))
        }
    }

    /// Get the last entry in the index
    pub fn last(&self) -> Option<&N> {
        let x = self.tree.last();
        if !x == 0 {
            None
        } else {
            Some(slot(&self.node, x))
        }
    }

    /// Iterate over the entries in the index in ascending order
    ///
    /// Iteration does not restructure the tree.
    pub fn iter(&self) -> SplayIndexIterator<'_, N> {
        let mut stack = Vec::new();
        let mut x = self.tree.root();

        while !x != 0 {
            stack.push(x);
            x = self.tree.left(x);
        }

        SplayIndexIterator {
            index: self,
            stack,
            count: self.count(),
        }
    }

    // Attach a fresh root slot and move the entry into it
    fn place(&mut self, order: Ordering, entry: N) {
        let x = self.tree.insert_root(order);

        if x == self.node.len() {
            self.node.push(Some(entry));
        } else {
            self.node[x] = Some(entry);
        }
    }

    // Re-attach an entry under its original key on a rollback path
    fn reattach<K: ?Sized>(&mut self, key: &K, entry: N, compare: &impl Fn(&K, &N) -> Ordering) {
        if self.insert_by(key, entry, compare).is_err() {
            panic!("key update rollback found the original key occupied");
        }
    }
}

impl<N> Default for SplayIndex<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, N> IntoIterator for &'a SplayIndex<N> {
    type Item = &'a N;
    type IntoIter = SplayIndexIterator<'a, N>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

//-----------------------------------------------------------------------------------------------//

/// Iterator over a `SplayIndex`
///
/// The splay tree carries no parent links, so the iterator keeps an explicit stack of the
/// leaves still to descend into.
pub struct SplayIndexIterator<'a, N> {
    index: &'a SplayIndex<N>,
    stack: Vec<usize>,
    count: usize,
}

impl<'a, N> Iterator for SplayIndexIterator<'a, N> {
    type Item = &'a N;

    fn next(&mut self) -> Option<&'a N> {
        let x = self.stack.pop()?;

        let mut y = self.index.tree.right(x);
        while !y != 0 {
            self.stack.push(y);
            y = self.index.tree.left(y);
        }

        self.count -= 1;
        Some(slot(&self.index.node, x))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.count, Some(self.count))
    }
}

impl<N> FusedIterator for SplayIndexIterator<'_, N> {}

//-----------------------------------------------------------------------------------------------//

#[cfg(test)]
use compact_str::{format_compact, CompactString};

// A test entry with a numeric key and a payload that allocates
#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
struct Item {
    key: u64,
    tag: CompactString,
}

#[cfg(test)]
impl Item {
    fn new(key: u64) -> Item {
        Item {
            key,
            tag: format_compact!("item-{key}"),
        }
    }
}

#[cfg(test)]
impl TreeOrd for Item {
    type Key = u64;

    fn key(&self) -> &u64 {
        &self.key
    }

    fn cmp_keys(a: &u64, b: &u64) -> Ordering {
        a.cmp(b)
    }
}

// An error a test callback can refuse with
#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Refused;

#[cfg(test)]
impl fmt::Display for Refused {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("refused")
    }
}

#[test]
// A very simple test of inserting, finding and removing
fn test_splay_0() {
    let mut index = SplayIndex::new();

    for key in [5u64, 1, 9] {
        index.insert(Item::new(key)).unwrap();
    }

    debug_assert_eq!(index.count(), 3);
    debug_assert_eq!(index.find(&5).map(|item| item.key), Some(5));
    debug_assert_eq!(index.find(&4), None);
    debug_assert_eq!(index.first().map(|item| item.key), Some(1));
    debug_assert_eq!(index.last().map(|item| item.key), Some(9));

    let keys: Vec<u64> = index.iter().map(|item| item.key).collect();
    debug_assert_eq!(keys, [1, 5, 9]);

    let item = index.remove(&5);
    debug_assert_eq!(item, Some(Item::new(5)));
    debug_assert_eq!(index.find(&5), None);
    debug_assert_eq!(index.count(), 2);

    let keys: Vec<u64> = index.iter().map(|item| item.key).collect();
    debug_assert_eq!(keys, [1, 9]);

    // The removed slot is recycled
    index.insert(Item::new(5)).unwrap();
    debug_assert_eq!(index.count(), 3);
    debug_assert_eq!(index.tree.allocated_count(), 3);
    debug_assert_eq!(index.check(), Ok(()));
}

#[test]
// A successful find splays the matching entry to the root
fn test_splay_1() {
    let mut index = SplayIndex::new();

    for key in 1..1024u64 {
        index.insert(Item::new(key)).unwrap();
    }

    debug_assert_eq!(index.find(&500).map(|item| item.key), Some(500));

    let root = index.tree.root();
    debug_assert_eq!(index.node[root].as_ref().map(|item| item.key), Some(500));
    debug_assert_eq!(index.check(), Ok(()));
}

#[test]
// Inserting a duplicate key leaves the index untouched and hands the entry back
fn test_splay_2() {
    let mut index = SplayIndex::new();

    for key in [2u64, 4, 6] {
        index.insert(Item::new(key)).unwrap();
    }

    let rejected = index.insert(Item::new(4)).unwrap_err().into_entry();
    debug_assert_eq!(rejected, Item::new(4));
    debug_assert_eq!(index.count(), 3);

    let keys: Vec<u64> = index.iter().map(|item| item.key).collect();
    debug_assert_eq!(keys, [2, 4, 6]);
    debug_assert_eq!(index.check(), Ok(()));
}

#[test]
// Moving an entry to a new key, and rolling back when the new key is taken
fn test_splay_3() {
    let mut index = SplayIndex::new();

    for key in [1u64, 2, 3] {
        index.insert(Item::new(key)).unwrap();
    }

    let rewrite = |key: &u64, item: &mut Item| -> Result<(), Refused> {
        item.key = *key;
        Ok(())
    };

    // Moving 1 onto 2 collides and must roll back
    let result = index.update_key(&1, &2, rewrite);
    debug_assert_eq!(result, Err(UpdateKeyError::Occupied));
    debug_assert_eq!(index.find(&1).map(|item| item.tag.as_str()), Some("item-1"));
    debug_assert_eq!(index.find(&2).map(|item| item.tag.as_str()), Some("item-2"));
    debug_assert_eq!(index.count(), 3);
    debug_assert_eq!(index.check(), Ok(()));

    // Moving 1 to a free key succeeds
    index.update_key(&1, &9, rewrite).unwrap();
    debug_assert_eq!(index.find(&1), None);
    debug_assert_eq!(index.find(&9).map(|item| item.tag.as_str()), Some("item-1"));
    debug_assert_eq!(index.count(), 3);
    debug_assert_eq!(index.check(), Ok(()));

    // Moving a missing key reports NotFound
    debug_assert_eq!(
        index.update_key(&42, &43, rewrite),
        Err(UpdateKeyError::NotFound)
    );
}

#[test]
// A refusing update callback leaves the index membership unchanged
fn test_splay_4() {
    let mut index = SplayIndex::new();

    for key in [1u64, 2, 3] {
        index.insert(Item::new(key)).unwrap();
    }

    let refuse = |_key: &u64, _item: &mut Item| -> Result<(), Refused> { Err(Refused) };

    let result = index.update_key(&2, &7, refuse);
    debug_assert_eq!(result, Err(UpdateKeyError::Callback(Refused)));

    // The entry is back under its old key, and not reachable under the new one
    debug_assert_eq!(index.find(&2).map(|item| item.key), Some(2));
    debug_assert_eq!(index.find(&7), None);
    debug_assert_eq!(index.count(), 3);
    debug_assert_eq!(index.check(), Ok(()));
}

#[test]
// A degenerate chain of 10000 ascending keys is handled without recursion
fn test_splay_5() {
    const COUNT: u64 = 10000;

    let mut index = SplayIndex::new();

    for key in 0..COUNT {
        index.insert(Item::new(key)).unwrap();
    }

    debug_assert_eq!(index.count(), COUNT as usize);
    debug_assert_eq!(index.check(), Ok(()));
    debug_assert_eq!(index.first().map(|item| item.key), Some(0));
    debug_assert_eq!(index.last().map(|item| item.key), Some(COUNT - 1));

    let mut freed = 0;
    let result: Result<(), Refused> = index.freenodes(|_item| {
        freed += 1;
        Ok(())
    });
    debug_assert_eq!(result, Ok(()));
    debug_assert_eq!(freed, COUNT);
    debug_assert!(index.is_empty());

    // A second sweep is a no-op
    let result: Result<(), Refused> = index.freenodes(|_item| Err(Refused));
    debug_assert_eq!(result, Ok(()));
}

#[test]
// A stress test with random insertions, lookups and removals
fn test_splay_6() {
    use rand::prelude::*;

    const COUNT: usize = 100000;

    let mut rng = SmallRng::seed_from_u64(1234567890);

    let mut index = SplayIndex::new();
    for _ in 0..COUNT {
        let key = rng.random_range(0..COUNT as u64);
        let _ = index.insert(Item::new(key));
    }

    debug_assert_eq!(index.check(), Ok(()));

    let mut prev = None;
    for item in &index {
        if let Some(prev) = prev {
            debug_assert!(prev < item.key);
        }
        prev = Some(item.key);
    }

    let mut rng = SmallRng::seed_from_u64(1234567890);

    for _ in 0..COUNT {
        let key = rng.random_range(0..COUNT as u64);
        debug_assert_eq!(index.find(&key).map(|item| item.key), Some(key));
    }

    for _ in 0..COUNT {
        let key = rng.random_range(0..COUNT as u64);
        if let Some(item) = index.remove(&key) {
            debug_assert_eq!(item.key, key);
        }
    }

    debug_assert_eq!(index.check(), Ok(()));
}

#[test]
// The `_by` operations rank entries with a caller-supplied comparison
fn test_splay_7() {
    let reversed = |key: &u64, item: &Item| item.key.cmp(key);

    let mut index = SplayIndex::new();

    for key in [3u64, 1, 4, 1, 5] {
        let _ = index.insert_by(&key, Item::new(key), reversed);
    }

    // The duplicate 1 was rejected
    debug_assert_eq!(index.count(), 4);

    // Iteration follows the reversed order
    let keys: Vec<u64> = index.iter().map(|item| item.key).collect();
    debug_assert_eq!(keys, [5, 4, 3, 1]);

    debug_assert_eq!(index.find_by(&4, reversed).map(|item| item.key), Some(4));
    debug_assert_eq!(index.find_by(&2, reversed), None);
    debug_assert_eq!(index.check_by(|a, b| b.key.cmp(&a.key)), Ok(()));

    let removed = index.remove_by(&3, reversed);
    debug_assert_eq!(removed, Some(Item::new(3)));
    debug_assert_eq!(index.count(), 3);
    debug_assert_eq!(index.check_by(|a, b| b.key.cmp(&a.key)), Ok(()));
}

#[test]
// Per-entry free failures do not stop the sweep, and the last error is kept
fn test_splay_8() {
    let mut index = SplayIndex::new();

    for key in 1..=5u64 {
        index.insert(Item::new(key)).unwrap();
    }

    let mut freed = 0;
    let result = index.freenodes(|item| {
        freed += 1;
        if item.key % 2 == 0 {
            Err(item.key)
        } else {
            Ok(())
        }
    });

    // Entries are drained in ascending order, so the last failure is key 4
    debug_assert_eq!(result, Err(4));
    debug_assert_eq!(freed, 5);
    debug_assert!(index.is_empty());
}
