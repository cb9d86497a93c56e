use crate::list::{self, Link};
use crate::queue::element::ElementNode;
use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::ptr::NonNull;

/// An iterator over the values of a [`Queue`](crate::Queue).
///
/// It uses a pair of nodes `start..end` to represent a half-open subrange
/// of the ring, where `start` is inclusive and `end` is not.
///
/// Though the `Iter` does not hold a reference to the queue, it actually
/// *borrows* (immutably) from it, so the queue cannot be modified while the
/// iterator is alive.
///
/// # Examples
///
/// ```compile_fail
/// use cyclic_queue::Queue;
///
/// let mut queue = Queue::new().unwrap();
/// queue.insert_tail("a").unwrap();
/// let mut iter = queue.iter();
///
/// // Won't compile, because queue is already borrowed immutably.
/// queue.insert_tail("b").unwrap();
/// println!("{:?}", iter.next());
/// ```
#[derive(Clone)]
pub struct Iter<'a> {
    start: NonNull<Link>,
    end: NonNull<Link>,
    _marker: PhantomData<&'a ElementNode>,
}

impl<'a> Iter<'a> {
    pub(crate) fn new(start: NonNull<Link>, end: NonNull<Link>) -> Self {
        Self {
            start,
            end,
            _marker: PhantomData,
        }
    }

    /// # Safety
    ///
    /// `link` must be an element of the borrowed queue.
    unsafe fn value(link: NonNull<Link>) -> &'a str {
        ElementNode::from_link(link).as_ref().as_str()
    }
}

impl fmt::Debug for Iter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Iter").field(&self.clone().collect::<Vec<_>>()).finish()
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a str;

    /// Return `*start` and reset the iterating range to `(start.next)..end`,
    /// or return `None` if `start..end` is already empty.
    fn next(&mut self) -> Option<Self::Item> {
        if self.start == self.end {
            return None;
        }
        // SAFETY: `start..end` is always a valid range of the ring,
        // and it is not empty here, so `start` is an element.
        unsafe {
            let current = self.start;
            self.start = list::next(current);
            Some(Self::value(current))
        }
    }

    fn last(mut self) -> Option<Self::Item> {
        self.next_back()
    }
}

impl<'a> DoubleEndedIterator for Iter<'a> {
    /// Reset the iterating range to `start..(end.prev)` and return `*end`,
    /// or return `None` if `start..end` is already empty.
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.start == self.end {
            return None;
        }
        // SAFETY: `start..end` is always a valid range of the ring,
        // and it is not empty here, so `end.prev` is an element.
        unsafe {
            self.end = list::prev(self.end);
            Some(Self::value(self.end))
        }
    }
}

impl FusedIterator for Iter<'_> {}

#[cfg(test)]
mod tests {
    use crate::Queue;

    #[test]
    fn iter_both_ends() {
        let mut queue = Queue::new().unwrap();
        for s in ["a", "b", "c", "d"] {
            queue.insert_tail(s).unwrap();
        }
        let mut iter = queue.iter();
        assert_eq!(iter.next(), Some("a"));
        assert_eq!(iter.next_back(), Some("d"));
        assert_eq!(iter.next(), Some("b"));
        assert_eq!(iter.next_back(), Some("c"));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_back(), None);
        assert_eq!(iter.next(), None); // Fused and non-cyclic

        assert_eq!(queue.iter().rev().collect::<Vec<_>>(), ["d", "c", "b", "a"]);
        assert_eq!(queue.iter().last(), Some("d"));
        assert_eq!(format!("{:?}", queue.iter()), "Iter([\"a\", \"b\", \"c\", \"d\"])");
    }

    #[test]
    fn iter_empty() {
        let queue = Queue::new().unwrap();
        assert_eq!(queue.iter().next(), None);
        assert_eq!(queue.iter().next_back(), None);
        assert_eq!((&queue).into_iter().count(), 0);
    }
}
