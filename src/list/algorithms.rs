//! Structural transformations of a whole ring. None of them allocates; the
//! ones that drop members hand every detached link to a `release` callback.

use crate::list::{connect, is_empty, is_singular, move_after, next, prev, unlink, Link};
use std::mem;
use std::ptr::NonNull;

pub(crate) mod sort;

/// Count the non-sentinel members by walking the ring once.
pub(crate) unsafe fn len(ghost: NonNull<Link>) -> usize {
    let mut len = 0;
    let mut node = next(ghost);
    while node != ghost {
        len += 1;
        node = next(node);
    }
    len
}

/// Find the member at 0-based index `⌊n / 2⌋`, or `None` if the ring is empty.
///
/// Both pointers start at the first member; `fast` moves two steps for each
/// step of `slow`, and stops on the ghost or right before it.
pub(crate) unsafe fn middle(ghost: NonNull<Link>) -> Option<NonNull<Link>> {
    if is_empty(ghost) {
        return None;
    }
    let (mut slow, mut fast) = (next(ghost), next(ghost));
    while fast != ghost && next(fast) != ghost {
        fast = next(next(fast));
        slow = next(slow);
    }
    Some(slow)
}

/// Drop every member that belongs to a run of two or more adjacent members
/// for which `same` holds, handing each of them to `release` after it is
/// unlinked. Returns the number of released members.
///
/// The ring is expected to be sorted, so that equal members form runs. A run
/// that ends at the ghost is released like any other.
pub(crate) unsafe fn remove_duplicate_runs<S, R>(
    ghost: NonNull<Link>,
    mut same: S,
    mut release: R,
) -> usize
where
    S: FnMut(NonNull<Link>, NonNull<Link>) -> bool,
    R: FnMut(NonNull<Link>),
{
    let mut removed = 0;
    let mut in_run = false;
    let mut node = next(ghost);
    while node != ghost {
        let successor = next(node);
        // The last member of a run differs from its successor (or is followed
        // by the ghost), so `in_run` is what marks it.
        let duplicated = successor != ghost && same(node, successor);
        if duplicated || in_run {
            unlink(node);
            release(node);
            removed += 1;
        }
        in_run = duplicated;
        node = successor;
    }
    removed
}

/// Exchange the positions of every two adjacent members, from the front.
/// A trailing unpaired member stays where it is.
pub(crate) unsafe fn swap_pairs(ghost: NonNull<Link>) {
    let mut before = ghost;
    while next(before) != ghost && next(next(before)) != ghost {
        move_after(next(next(before)), before);
        before = next(next(before));
    }
}

/// Reverse the ring by exchanging `next` and `prev` of every member, the
/// ghost last. Payloads are never touched.
pub(crate) unsafe fn reverse(ghost: NonNull<Link>) {
    if is_empty(ghost) || is_singular(ghost) {
        return;
    }
    let mut node = next(ghost);
    while node != ghost {
        let successor = next(node);
        flip(node);
        node = successor;
    }
    flip(ghost);
}

#[inline]
unsafe fn flip(mut node: NonNull<Link>) {
    let link = node.as_mut();
    mem::swap(&mut link.next, &mut link.prev);
}

/// Put the forward chain `first..ghost` back into the ring of `ghost`,
/// restoring every `prev` link from the `next` links and closing the circle.
///
/// # Safety
///
/// Following `next` from `first` must reach `ghost`; the `prev` links of the
/// chain may be stale.
pub(crate) unsafe fn rebuild(ghost: NonNull<Link>, first: NonNull<Link>) {
    let mut node = ghost;
    let mut successor = first;
    while successor != ghost {
        connect(node, successor);
        node = successor;
        successor = next(node);
    }
    connect(node, ghost);
    debug_assert_eq!(prev(ghost), node);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::{init, insert_between, is_well_formed};

    /// A ring of `n` links; the test identifies members by their index in
    /// `nodes`.
    struct TestRing {
        ghost: Box<Link>,
        nodes: Vec<Box<Link>>,
    }

    impl TestRing {
        fn new(n: usize) -> Self {
            let mut ring = TestRing {
                ghost: Box::new(Link::dangling()),
                nodes: (0..n).map(|_| Box::new(Link::dangling())).collect(),
            };
            let ghost = ring.ghost();
            unsafe {
                init(ghost);
                for i in 0..n {
                    insert_between(ring.node(i), prev(ghost), ghost);
                }
            }
            ring
        }

        fn ghost(&mut self) -> NonNull<Link> {
            NonNull::from(self.ghost.as_mut())
        }

        fn node(&mut self, i: usize) -> NonNull<Link> {
            NonNull::from(self.nodes[i].as_mut())
        }

        fn index_of(&mut self, node: NonNull<Link>) -> usize {
            (0..self.nodes.len())
                .find(|&i| self.node(i) == node)
                .unwrap()
        }

        fn order(&mut self) -> Vec<usize> {
            let ghost = self.ghost();
            let mut out = Vec::new();
            unsafe {
                assert!(is_well_formed(ghost));
                let mut node = next(ghost);
                while node != ghost {
                    out.push(self.index_of(node));
                    node = next(node);
                }
            }
            out
        }
    }

    #[test]
    fn ring_len() {
        for n in 0..5 {
            let mut ring = TestRing::new(n);
            assert_eq!(unsafe { len(ring.ghost()) }, n);
        }
    }

    #[test]
    fn ring_middle() {
        let mut ring = TestRing::new(0);
        assert_eq!(unsafe { middle(ring.ghost()) }, None);
        for n in 1..10 {
            let mut ring = TestRing::new(n);
            let mid = unsafe { middle(ring.ghost()) }.unwrap();
            assert_eq!(ring.index_of(mid), n / 2, "length {}", n);
        }
    }

    #[test]
    fn ring_swap_pairs() {
        let mut ring = TestRing::new(4);
        unsafe { swap_pairs(ring.ghost()) };
        assert_eq!(ring.order(), vec![1, 0, 3, 2]);

        let mut ring = TestRing::new(5);
        unsafe { swap_pairs(ring.ghost()) };
        assert_eq!(ring.order(), vec![1, 0, 3, 2, 4]);

        let mut ring = TestRing::new(1);
        unsafe { swap_pairs(ring.ghost()) };
        assert_eq!(ring.order(), vec![0]);

        let mut ring = TestRing::new(0);
        unsafe { swap_pairs(ring.ghost()) };
        assert_eq!(ring.order(), Vec::<usize>::new());
    }

    #[test]
    fn ring_reverse() {
        for n in 0..6 {
            let mut ring = TestRing::new(n);
            unsafe { reverse(ring.ghost()) };
            assert_eq!(ring.order(), (0..n).rev().collect::<Vec<_>>());
            unsafe { reverse(ring.ghost()) };
            assert_eq!(ring.order(), (0..n).collect::<Vec<_>>());
        }
    }

    #[test]
    fn ring_remove_duplicate_runs() {
        // keys per node: 0 0 1 2 2 2 3 4 4
        let keys = [0, 0, 1, 2, 2, 2, 3, 4, 4];
        let mut ring = TestRing::new(keys.len());
        let ptrs: Vec<NonNull<Link>> = (0..keys.len()).map(|i| ring.node(i)).collect();
        let key = |node: NonNull<Link>| keys[ptrs.iter().position(|&p| p == node).unwrap()];
        let mut released = Vec::new();
        let removed = unsafe {
            remove_duplicate_runs(
                ring.ghost(),
                |a, b| key(a) == key(b),
                |node| released.push(key(node)),
            )
        };
        assert_eq!(removed, 7);
        assert_eq!(released, vec![0, 0, 2, 2, 2, 4, 4]);
        assert_eq!(ring.order(), vec![2, 6]);
    }

    #[test]
    fn ring_rebuild() {
        let mut ring = TestRing::new(3);
        let ghost = ring.ghost();
        let (a, b, c) = (ring.node(0), ring.node(1), ring.node(2));
        unsafe {
            // Relink forward as c -> a -> b -> ghost, leaving `prev` stale.
            let (mut a_, mut b_, mut c_) = (a, b, c);
            c_.as_mut().next = a;
            a_.as_mut().next = b;
            b_.as_mut().next = ghost;
            rebuild(ghost, c);
        }
        assert_eq!(ring.order(), vec![2, 0, 1]);
    }
}
