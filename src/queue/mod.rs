use std::alloc::Layout;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use std::ptr::NonNull;

use tracing::{debug, trace, warn};

use crate::alloc::{Allocator, Global};
use crate::error::{QueueError, Result};
use crate::list::algorithms::{self, sort};
use crate::list::{self, Link};
use crate::queue::element::{copy_truncated, value_eq, value_le, ElementNode};

pub use element::Element;
pub use iterator::Iter;

mod element;
mod iterator;

/// A queue of strings over an intrusive circular doubly-linked list.
///
/// The queue is nothing more than its sentinel ("ghost") link and the
/// allocator that provided it. Every element reachable from the ghost is owned
/// by the queue; removing one hands its ownership to the caller as an
/// [`Element`].
///
/// The queue is meant for a single owner on a single thread: it is neither
/// `Send` nor `Sync`.
///
/// Every removed [`Element`] carries a clone of the queue's allocator and is
/// released through it, hence the `Clone` bound. To use an allocator that is
/// not `Clone`, such as [`CountingAlloc`], lend it by reference.
///
/// [`CountingAlloc`]: crate::CountingAlloc
///
/// # Examples
///
/// ```
/// use cyclic_queue::Queue;
///
/// let mut queue = Queue::new().unwrap();
/// for s in ["banana", "apple", "cherry"] {
///     queue.insert_tail(s).unwrap();
/// }
///
/// queue.sort();
/// assert_eq!(queue.iter().collect::<Vec<_>>(), ["apple", "banana", "cherry"]);
///
/// queue.reverse();
/// let mut out = [0u8; 16];
/// let element = queue.remove_head(Some(&mut out[..])).unwrap();
/// assert_eq!(element.value(), "cherry");
/// assert_eq!(&out[..7], b"cherry\0");
/// assert_eq!(queue.iter().collect::<Vec<_>>(), ["banana", "apple"]);
/// ```
pub struct Queue<A: Allocator + Clone = Global> {
    ghost: NonNull<Link>,
    alloc: A,
    _marker: PhantomData<Box<ElementNode>>,
}

// private methods
impl<A: Allocator + Clone> Queue<A> {
    pub(crate) fn ghost_node(&self) -> NonNull<Link> {
        self.ghost
    }

    pub(crate) fn front_node(&self) -> NonNull<Link> {
        // SAFETY: `ghost.next` is always valid (either `ghost` itself, or the
        // first element of the queue).
        unsafe { list::next(self.ghost) }
    }

    pub(crate) fn back_node(&self) -> NonNull<Link> {
        // SAFETY: `ghost.prev` is always valid (either `ghost` itself, or the
        // last element of the queue).
        unsafe { list::prev(self.ghost) }
    }

    fn insert_between_neighbours<F>(&mut self, s: &str, neighbours: F) -> Result<()>
    where
        F: FnOnce(&Self) -> (NonNull<Link>, NonNull<Link>),
    {
        let node = ElementNode::allocate(s, &self.alloc).map_err(|err| {
            if err == QueueError::AllocationFailure {
                warn!(len = s.len(), "queue: cannot allocate an element");
            }
            err
        })?;
        let (left, right) = neighbours(&*self);
        // SAFETY: `left` and `right` are adjacent members of this ring, and
        // the node is freshly allocated.
        unsafe { list::insert_between(ElementNode::link(node), left, right) };
        self.check_ring();
        Ok(())
    }

    /// Unlink `link` and hand it to the caller, copying its value into `out`.
    ///
    /// # Safety
    ///
    /// `link` must be a non-sentinel member of this ring.
    unsafe fn detach(&mut self, link: NonNull<Link>, out: Option<&mut [u8]>) -> Element<A> {
        list::unlink(link);
        self.check_ring();
        let node = ElementNode::from_link(link);
        if let Some(out) = out {
            copy_truncated(node.as_ref().as_bytes(), out);
        }
        Element::from_detached(node, self.alloc.clone())
    }

    /// # Safety
    ///
    /// `link` must be an element link already unlinked from this ring.
    unsafe fn release_link(&self, link: NonNull<Link>) {
        ElementNode::release(ElementNode::from_link(link), &self.alloc);
    }

    #[inline]
    fn check_ring(&self) {
        #[cfg(feature = "invariant-checks")]
        debug_assert!(self.is_well_formed(), "queue: ring invariant broken");
    }
}

impl Queue<Global> {
    /// Create an empty queue backed by the [`Global`] allocator.
    ///
    /// # Examples
    ///
    /// ```
    /// use cyclic_queue::Queue;
    ///
    /// let queue = Queue::new().unwrap();
    /// assert!(queue.is_empty());
    /// ```
    pub fn new() -> Result<Self> {
        Self::new_in(Global)
    }
}

impl<A: Allocator + Clone> Queue<A> {
    /// Create an empty queue whose sentinel and elements are allocated by
    /// `alloc`.
    ///
    /// Fails with [`QueueError::AllocationFailure`] if the sentinel cannot be
    /// allocated.
    pub fn new_in(alloc: A) -> Result<Self> {
        let ghost = match alloc.allocate(Layout::new::<Link>()) {
            Some(ptr) => ptr.cast::<Link>(),
            None => {
                warn!("queue: cannot allocate the sentinel");
                return Err(QueueError::AllocationFailure);
            }
        };
        // SAFETY: `ghost` is freshly allocated for a `Link`.
        unsafe {
            ghost.as_ptr().write(Link::dangling());
            list::init(ghost);
        }
        debug!("queue: created");
        Ok(Self {
            ghost,
            alloc,
            _marker: PhantomData,
        })
    }

    /// Release every element, then the sentinel.
    ///
    /// This is what dropping the queue does; an absent queue
    /// (`None::<Queue>`) is simply dropped without effect.
    pub fn destroy(self) {
        drop(self)
    }

    /// Returns `true` if the queue holds no element.
    ///
    /// This operation should compute in *O*(1) time.
    pub fn is_empty(&self) -> bool {
        // SAFETY: the ghost is a valid ring anchor.
        unsafe { list::is_empty(self.ghost) }
    }

    /// Returns `true` if the queue holds exactly one element.
    pub fn is_singular(&self) -> bool {
        // SAFETY: the ghost is a valid ring anchor.
        unsafe { list::is_singular(self.ghost) }
    }

    /// Returns the number of elements.
    ///
    /// No length is cached: this operation walks the whole ring and computes
    /// in *O*(*n*) time.
    ///
    /// # Examples
    ///
    /// ```
    /// use cyclic_queue::Queue;
    ///
    /// let mut queue = Queue::new().unwrap();
    /// assert_eq!(queue.size(), 0);
    /// queue.insert_head("a").unwrap();
    /// queue.insert_tail("b").unwrap();
    /// assert_eq!(queue.size(), 2);
    /// ```
    pub fn size(&self) -> usize {
        // SAFETY: the ghost is a valid ring anchor.
        unsafe { algorithms::len(self.ghost) }
    }

    /// Provides the value of the first element, or `None` if the queue is empty.
    pub fn front(&self) -> Option<&str> {
        self.iter().next()
    }

    /// Provides the value of the last element, or `None` if the queue is empty.
    pub fn back(&self) -> Option<&str> {
        self.iter().next_back()
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter::new(self.front_node(), self.ghost_node())
    }

    /// Walk the ring and check that every member, the sentinel included,
    /// satisfies `next.prev == self` and `prev.next == self`.
    pub fn is_well_formed(&self) -> bool {
        // SAFETY: every link reachable from the ghost is owned by the queue.
        unsafe { list::is_well_formed(self.ghost) }
    }

    /// Insert a copy of `s` before the first element.
    ///
    /// # Errors
    ///
    /// - [`QueueError::InvalidArgument`] if `s` contains a NUL byte;
    /// - [`QueueError::AllocationFailure`] if the element or its buffer cannot
    ///   be allocated.
    ///
    /// The queue is unchanged on failure.
    ///
    /// # Complexity
    ///
    /// This operation should compute in *O*(1) time, plus the copy of `s`.
    ///
    /// # Examples
    ///
    /// ```
    /// use cyclic_queue::Queue;
    ///
    /// let mut queue = Queue::new().unwrap();
    /// queue.insert_head("b").unwrap();
    /// queue.insert_head("a").unwrap();
    /// assert_eq!(queue.front(), Some("a"));
    /// assert!(queue.insert_head("a\0b").is_err());
    /// ```
    pub fn insert_head(&mut self, s: &str) -> Result<()> {
        trace!(len = s.len(), "queue: insert head");
        self.insert_between_neighbours(s, |queue| (queue.ghost_node(), queue.front_node()))
    }

    /// Insert a copy of `s` after the last element.
    ///
    /// Fails like [`Queue::insert_head`], leaving the queue unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use cyclic_queue::Queue;
    ///
    /// let mut queue = Queue::new().unwrap();
    /// queue.insert_tail("a").unwrap();
    /// queue.insert_tail("b").unwrap();
    /// assert_eq!(queue.back(), Some("b"));
    /// ```
    pub fn insert_tail(&mut self, s: &str) -> Result<()> {
        trace!(len = s.len(), "queue: insert tail");
        self.insert_between_neighbours(s, |queue| (queue.back_node(), queue.ghost_node()))
    }

    /// Detach the first element and return it, or `None` if the queue is
    /// empty.
    ///
    /// If `out` is given and not empty, the value is also copied into it as a
    /// NUL-terminated string, truncated to `out.len() - 1` bytes.
    ///
    /// The element is not released: see [`Element`].
    ///
    /// # Examples
    ///
    /// ```
    /// use cyclic_queue::Queue;
    ///
    /// let mut queue = Queue::new().unwrap();
    /// queue.insert_tail("strawberry").unwrap();
    ///
    /// let mut out = [0u8; 6];
    /// let element = queue.remove_head(Some(&mut out[..])).unwrap();
    /// assert_eq!(&out, b"straw\0");
    /// assert_eq!(element.value(), "strawberry");
    /// assert!(queue.remove_head(None).is_none());
    /// ```
    pub fn remove_head(&mut self, out: Option<&mut [u8]>) -> Option<Element<A>> {
        if self.is_empty() {
            return None;
        }
        trace!("queue: remove head");
        // SAFETY: the queue is not empty, so the front node is an element.
        Some(unsafe { self.detach(self.front_node(), out) })
    }

    /// Detach the last element and return it, or `None` if the queue is
    /// empty. `out` is filled like in [`Queue::remove_head`].
    pub fn remove_tail(&mut self, out: Option<&mut [u8]>) -> Option<Element<A>> {
        if self.is_empty() {
            return None;
        }
        trace!("queue: remove tail");
        // SAFETY: the queue is not empty, so the back node is an element.
        Some(unsafe { self.detach(self.back_node(), out) })
    }

    /// Delete the element at 0-based index `⌊n / 2⌋` of a queue of `n`
    /// elements. Returns `false` if the queue is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use cyclic_queue::Queue;
    ///
    /// let mut queue = Queue::new().unwrap();
    /// for s in ["a", "b", "c", "d", "e", "f"] {
    ///     queue.insert_tail(s).unwrap();
    /// }
    /// assert!(queue.delete_mid());
    /// assert_eq!(queue.iter().collect::<Vec<_>>(), ["a", "b", "c", "e", "f"]);
    /// ```
    pub fn delete_mid(&mut self) -> bool {
        // SAFETY: the ghost is a valid ring anchor.
        let mid = match unsafe { algorithms::middle(self.ghost) } {
            Some(mid) => mid,
            None => return false,
        };
        trace!("queue: delete middle");
        // SAFETY: `mid` is an element of this ring; it is unlinked before
        // being released.
        unsafe {
            list::unlink(mid);
            self.release_link(mid);
        }
        self.check_ring();
        true
    }

    /// Delete every element whose value also appears in an adjacent element,
    /// leaving only the values that were unique. Returns the number of
    /// deleted elements.
    ///
    /// The queue must be sorted in ascending order (see [`Queue::sort`]);
    /// otherwise only adjacent equal values are detected.
    ///
    /// # Examples
    ///
    /// ```
    /// use cyclic_queue::Queue;
    ///
    /// let mut queue = Queue::new().unwrap();
    /// for s in ["a", "a", "b", "c", "c", "c"] {
    ///     queue.insert_tail(s).unwrap();
    /// }
    /// assert_eq!(queue.delete_dup(), 5);
    /// assert_eq!(queue.iter().collect::<Vec<_>>(), ["b"]);
    /// ```
    pub fn delete_dup(&mut self) -> usize {
        let ghost = self.ghost;
        // SAFETY: every non-ghost member is an element node; each released
        // link has been unlinked and is never visited again.
        let removed = unsafe {
            algorithms::remove_duplicate_runs(
                ghost,
                |a, b| value_eq(a, b),
                |link| self.release_link(link),
            )
        };
        trace!(removed, "queue: delete duplicates");
        self.check_ring();
        removed
    }

    /// Swap every two adjacent elements. A trailing unpaired element stays
    /// in place.
    ///
    /// # Examples
    ///
    /// ```
    /// use cyclic_queue::Queue;
    ///
    /// let mut queue = Queue::new().unwrap();
    /// for s in ["a", "b", "c"] {
    ///     queue.insert_tail(s).unwrap();
    /// }
    /// queue.swap();
    /// assert_eq!(queue.iter().collect::<Vec<_>>(), ["b", "a", "c"]);
    /// ```
    pub fn swap(&mut self) {
        trace!("queue: swap pairs");
        // SAFETY: the ghost is a valid ring anchor.
        unsafe { algorithms::swap_pairs(self.ghost) };
        self.check_ring();
    }

    /// Reverse the order of the elements in place, without touching their
    /// values.
    ///
    /// # Complexity
    ///
    /// This operation should compute in *O*(*n*) time and *O*(1) memory.
    pub fn reverse(&mut self) {
        trace!("queue: reverse");
        // SAFETY: the ghost is a valid ring anchor.
        unsafe { algorithms::reverse(self.ghost) };
        self.check_ring();
    }

    /// Sort the elements in ascending byte-wise order of their values.
    ///
    /// This sort is stable (i.e., does not reorder equal elements).
    ///
    /// # Complexity
    ///
    /// This operation should compute in *O*(*n* * log(*n*)) time and
    /// *O*(log(*n*)) memory for the recursion.
    ///
    /// # Current Implementation
    ///
    /// The current algorithm is a top-down merge sort over the forward links
    /// only, followed by a pass that restores the backward links. No element
    /// is allocated or copied.
    pub fn sort(&mut self) {
        trace!("queue: sort");
        // SAFETY: every non-ghost member is an element node.
        unsafe { sort::merge_sort(self.ghost, |a, b| value_le(a, b)) };
        self.check_ring();
    }
}

impl<A: Allocator + Clone> Debug for Queue<A> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a, A: Allocator + Clone> IntoIterator for &'a Queue<A> {
    type Item = &'a str;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<A: Allocator + Clone> Drop for Queue<A> {
    fn drop(&mut self) {
        let ghost = self.ghost;
        let mut released = 0_usize;
        // SAFETY: the queue owns every member; each one is read before it is
        // released and never visited again, and the ghost is released last.
        unsafe {
            let mut link = list::next(ghost);
            while link != ghost {
                let successor = list::next(link);
                self.release_link(link);
                released += 1;
                link = successor;
            }
            self.alloc.deallocate(ghost.cast(), Layout::new::<Link>());
        }
        debug!(released, "queue: destroyed");
    }
}
