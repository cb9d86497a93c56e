//! The intrusive ring: a [`Link`] pair embedded in every participating node,
//! anchored at a sentinel ("ghost") link that carries no payload.
//!
//! All functions here work on raw `NonNull<Link>` handles and never allocate or
//! free. They are unsafe because they trust the caller about ring membership.
//!
//! # Naming Conventions
//!
//! - `ghost`: the sentinel of a ring; `ghost.next` is the first element and
//!   `ghost.prev` the last one;
//! - `start..end`: a forward chain of links, left inclusive and right
//!   exclusive (in practice `end` is always the ghost).

use std::ptr::NonNull;

pub(crate) mod algorithms;

/// A pair of ownership-free links to the neighbours of a node.
///
/// A free-standing `Link` is used as the sentinel of a ring; payload nodes
/// embed one as their first field (see `#[repr(C)]`), so a `NonNull<Link>` of
/// a payload node can be cast back to the node.
#[repr(C)]
pub(crate) struct Link {
    pub(crate) next: NonNull<Link>,
    pub(crate) prev: NonNull<Link>,
}

impl Link {
    /// A link whose neighbours are not yet known.
    ///
    /// Reading through `next`/`prev` of a dangling link is invalid until it is
    /// attached with [`insert_between`] or made a ring with [`init`].
    pub(crate) fn dangling() -> Self {
        Self {
            next: NonNull::dangling(),
            prev: NonNull::dangling(),
        }
    }
}

/// Make `anchor` an empty ring: `anchor.next == anchor == anchor.prev`.
///
/// # Safety
///
/// `anchor` must be valid for writes.
#[inline]
pub(crate) unsafe fn init(mut anchor: NonNull<Link>) {
    anchor.as_mut().next = anchor;
    anchor.as_mut().prev = anchor;
}

#[inline]
pub(crate) unsafe fn next(node: NonNull<Link>) -> NonNull<Link> {
    node.as_ref().next
}

#[inline]
pub(crate) unsafe fn prev(node: NonNull<Link>) -> NonNull<Link> {
    node.as_ref().prev
}

/// Link `prev` and `next` to each other directly.
#[inline]
pub(crate) unsafe fn connect(mut prev: NonNull<Link>, mut next: NonNull<Link>) {
    prev.as_mut().next = next;
    next.as_mut().prev = prev;
}

/// Attach `new` between `left` and `right`.
///
/// # Safety
///
/// `left` and `right` must be adjacent members of one ring (checked only in
/// `#[cfg(debug_assertions)]`), and `new` must not be a member of any ring.
pub(crate) unsafe fn insert_between(new: NonNull<Link>, left: NonNull<Link>, right: NonNull<Link>) {
    #[cfg(debug_assertions)]
    assert_adjacent(left, right);
    connect(left, new);
    connect(new, right);
    #[cfg(debug_assertions)]
    {
        assert_adjacent(left, new);
        assert_adjacent(new, right);
    }
}

/// Detach `node` from its ring by connecting its neighbours.
///
/// The links of `node` itself are left as they were, so they must not be
/// followed afterwards.
///
/// # Safety
///
/// `node` must be a non-sentinel member of a well-formed ring.
#[inline]
pub(crate) unsafe fn unlink(node: NonNull<Link>) {
    connect(prev(node), next(node));
}

/// Detach `node` and attach it right after `dest`.
///
/// # Safety
///
/// Both must be members of well-formed rings (possibly the same one), and
/// `node != dest`.
pub(crate) unsafe fn move_after(node: NonNull<Link>, dest: NonNull<Link>) {
    debug_assert_ne!(node, dest, "cannot move a node after itself");
    unlink(node);
    insert_between(node, dest, next(dest));
}

#[inline]
pub(crate) unsafe fn is_empty(anchor: NonNull<Link>) -> bool {
    next(anchor) == anchor
}

/// `true` if the ring holds exactly one non-sentinel member.
#[inline]
pub(crate) unsafe fn is_singular(anchor: NonNull<Link>) -> bool {
    let first = next(anchor);
    first != anchor && first == prev(anchor)
}

/// Walk the whole ring from `anchor` and check that every member, the anchor
/// included, satisfies `next.prev == self` and `prev.next == self`.
///
/// The walk always terminates: a revisit of any member other than the anchor
/// would give that member two different predecessors.
///
/// # Safety
///
/// Every link reachable from `anchor` must be valid for reads.
pub(crate) unsafe fn is_well_formed(anchor: NonNull<Link>) -> bool {
    let mut node = anchor;
    loop {
        if prev(next(node)) != node || next(prev(node)) != node {
            return false;
        }
        node = next(node);
        if node == anchor {
            return true;
        }
    }
}

#[cfg(debug_assertions)]
fn assert_adjacent(prev: NonNull<Link>, next: NonNull<Link>) {
    unsafe {
        assert_eq!(prev.as_ref().next, next);
        assert_eq!(next.as_ref().prev, prev);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Collects the positions of the ring members in `nodes`, front to back.
    unsafe fn positions(ghost: NonNull<Link>, nodes: &[NonNull<Link>]) -> Vec<usize> {
        let mut out = Vec::new();
        let mut node = next(ghost);
        while node != ghost {
            out.push(nodes.iter().position(|&n| n == node).unwrap());
            node = next(node);
        }
        out
    }

    fn ring(n: usize) -> (Box<Link>, Vec<Box<Link>>) {
        let mut ghost = Box::new(Link::dangling());
        let mut nodes: Vec<Box<Link>> = (0..n).map(|_| Box::new(Link::dangling())).collect();
        let ghost_ptr = NonNull::from(ghost.as_mut());
        unsafe {
            init(ghost_ptr);
            for node in nodes.iter_mut() {
                insert_between(NonNull::from(node.as_mut()), prev(ghost_ptr), ghost_ptr);
            }
        }
        (ghost, nodes)
    }

    fn ptrs(nodes: &mut [Box<Link>]) -> Vec<NonNull<Link>> {
        nodes.iter_mut().map(|n| NonNull::from(n.as_mut())).collect()
    }

    #[test]
    fn link_init() {
        let mut ghost = Link::dangling();
        let ghost = NonNull::from(&mut ghost);
        unsafe {
            init(ghost);
            assert!(is_empty(ghost));
            assert!(!is_singular(ghost));
            assert!(is_well_formed(ghost));
        }
    }

    #[test]
    fn link_insert_and_unlink() {
        let (mut ghost, mut nodes) = ring(3);
        let ghost = NonNull::from(ghost.as_mut());
        let nodes = ptrs(&mut nodes);
        unsafe {
            assert_eq!(positions(ghost, &nodes), vec![0, 1, 2]);
            assert!(is_well_formed(ghost));

            unlink(nodes[1]);
            assert_eq!(positions(ghost, &nodes), vec![0, 2]);
            assert!(is_well_formed(ghost));

            insert_between(nodes[1], ghost, next(ghost));
            assert_eq!(positions(ghost, &nodes), vec![1, 0, 2]);

            unlink(nodes[0]);
            unlink(nodes[2]);
            assert!(is_singular(ghost));
            unlink(nodes[1]);
            assert!(is_empty(ghost));
            assert!(is_well_formed(ghost));
        }
    }

    #[test]
    fn link_move_after() {
        let (mut ghost, mut nodes) = ring(4);
        let ghost = NonNull::from(ghost.as_mut());
        let nodes = ptrs(&mut nodes);
        unsafe {
            move_after(nodes[3], ghost);
            assert_eq!(positions(ghost, &nodes), vec![3, 0, 1, 2]);
            move_after(nodes[3], nodes[2]);
            assert_eq!(positions(ghost, &nodes), vec![0, 1, 2, 3]);
            move_after(nodes[0], nodes[1]);
            assert_eq!(positions(ghost, &nodes), vec![1, 0, 2, 3]);
            assert!(is_well_formed(ghost));
        }
    }

    #[test]
    fn link_move_across_rings() {
        let (mut a, mut a_nodes) = ring(2);
        let (mut b, mut b_nodes) = ring(1);
        let (a, b) = (NonNull::from(a.as_mut()), NonNull::from(b.as_mut()));
        let (a_nodes, b_nodes) = (ptrs(&mut a_nodes), ptrs(&mut b_nodes));
        unsafe {
            move_after(a_nodes[0], b_nodes[0]);
            assert!(is_singular(a));
            assert_eq!(next(b_nodes[0]), a_nodes[0]);
            assert_eq!(prev(b), a_nodes[0]);
            assert!(is_well_formed(a));
            assert!(is_well_formed(b));
        }
    }

    #[test]
    fn link_broken_ring_detected() {
        let (mut ghost, mut nodes) = ring(3);
        let ghost = NonNull::from(ghost.as_mut());
        let mut nodes = ptrs(&mut nodes);
        unsafe {
            nodes[1].as_mut().prev = ghost;
            assert!(!is_well_formed(ghost));
        }
    }
}
