use crate::list::algorithms::rebuild;
use crate::list::{is_empty, is_singular, next, Link};
use std::ptr::NonNull;

/// Stable merge sort of the ring anchored at `ghost`.
///
/// `less_eq(a, b)` must be `true` iff the payload of `a` orders before or
/// equal to the payload of `b`. Ties keep the member that came first.
///
/// The ring is viewed as a forward chain `first..ghost`: while sorting, only
/// the `next` links are meaningful and the ghost plays the role of the null
/// terminator. The `prev` links are restored afterwards by a single
/// [`rebuild`] pass.
pub(crate) unsafe fn merge_sort<F>(ghost: NonNull<Link>, mut less_eq: F)
where
    F: FnMut(NonNull<Link>, NonNull<Link>) -> bool,
{
    if is_empty(ghost) || is_singular(ghost) {
        return;
    }
    let first = merge_sort_chain(next(ghost), ghost, &mut less_eq);
    rebuild(ghost, first);
}

/// Sort the chain `start..end` and return its new front.
unsafe fn merge_sort_chain<F>(start: NonNull<Link>, end: NonNull<Link>, less_eq: &mut F) -> NonNull<Link>
where
    F: FnMut(NonNull<Link>, NonNull<Link>) -> bool,
{
    if start == end || next(start) == end {
        return start;
    }
    // `fast` starts one node ahead, so `slow` stops at the back of the left
    // half, which is never shorter than the right one.
    let (mut slow, mut fast) = (start, next(start));
    while fast != end && next(fast) != end {
        slow = next(slow);
        fast = next(next(fast));
    }
    let mid = next(slow);
    slow.as_mut().next = end;

    let left = merge_sort_chain(start, end, less_eq);
    let right = merge_sort_chain(mid, end, less_eq);
    merge(left, right, end, less_eq)
}

/// Merge two sorted chains `a..end` and `b..end` into one, and return its
/// front. `a` wins ties.
unsafe fn merge<F>(
    mut a: NonNull<Link>,
    mut b: NonNull<Link>,
    end: NonNull<Link>,
    less_eq: &mut F,
) -> NonNull<Link>
where
    F: FnMut(NonNull<Link>, NonNull<Link>) -> bool,
{
    if a == end {
        return b;
    }
    if b == end {
        return a;
    }
    let front = if less_eq(a, b) {
        take(&mut a)
    } else {
        take(&mut b)
    };
    let mut back = front;
    loop {
        if a == end {
            back.as_mut().next = b;
            break;
        }
        if b == end {
            back.as_mut().next = a;
            break;
        }
        let taken = if less_eq(a, b) {
            take(&mut a)
        } else {
            take(&mut b)
        };
        back.as_mut().next = taken;
        back = taken;
    }
    front
}

/// Pop the front of a chain, advancing `chain` to its successor.
#[inline]
unsafe fn take(chain: &mut NonNull<Link>) -> NonNull<Link> {
    let front = *chain;
    *chain = next(front);
    front
}
