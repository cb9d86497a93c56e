//! Storage for the sentinel, the element nodes and their string buffers.
//!
//! Every byte the queue owns is obtained through an [`Allocator`]. Unlike the
//! global allocation API used by `Box`, a refusal is reported as `None` rather
//! than aborting the process, which is what lets `insert_head`/`insert_tail`
//! fail with [`QueueError::AllocationFailure`] and roll back.
//!
//! [`QueueError::AllocationFailure`]: crate::QueueError::AllocationFailure

use std::alloc::{self, Layout};
use std::cell::Cell;
use std::fmt;
use std::ptr::NonNull;

/// A fallible allocator.
///
/// # Safety
///
/// A `Some` pointer returned by [`allocate`](Allocator::allocate) must be valid
/// for reads and writes of `layout.size()` bytes, aligned to `layout.align()`,
/// until it is passed back to [`deallocate`](Allocator::deallocate) of the same
/// allocator with the same layout.
///
/// If the allocator is `Clone`, every clone counts as the same allocator:
/// memory allocated through one clone may be deallocated through any other.
/// A queue hands such clones to the elements it detaches, and they release
/// their storage through them.
///
/// The queue never asks for a zero-sized layout.
pub unsafe trait Allocator {
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>>;

    /// # Safety
    ///
    /// `ptr` must have been returned by `self.allocate(layout)` and not yet
    /// deallocated.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);
}

unsafe impl<A: Allocator + ?Sized> Allocator for &A {
    #[inline]
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        (**self).allocate(layout)
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        (**self).deallocate(ptr, layout)
    }
}

/// The process-wide allocator behind `std::alloc`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Global;

unsafe impl Allocator for Global {
    #[inline]
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        debug_assert!(layout.size() > 0, "zero-sized allocation");
        // SAFETY: the queue never requests a zero-sized layout.
        NonNull::new(unsafe { alloc::alloc(layout) })
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        alloc::dealloc(ptr.as_ptr(), layout)
    }
}

/// An accounting allocator on top of [`Global`].
///
/// It keeps track of the live allocations and bytes, and can be armed to
/// refuse requests deterministically. It is meant for a single owner and a
/// single thread, like the queue itself.
///
/// # Examples
///
/// ```
/// use cyclic_queue::{CountingAlloc, Queue, QueueError};
///
/// let alloc = CountingAlloc::new();
/// let mut queue = Queue::new_in(&alloc).unwrap();
/// queue.insert_tail("apple").unwrap();
/// assert_eq!(alloc.live_allocations(), 3); // sentinel, node, buffer
///
/// alloc.fail_now();
/// assert_eq!(queue.insert_tail("banana"), Err(QueueError::AllocationFailure));
/// assert_eq!(alloc.live_allocations(), 3);
///
/// drop(queue);
/// assert_eq!(alloc.live_allocations(), 0);
/// ```
#[derive(Default)]
pub struct CountingAlloc {
    live_allocations: Cell<usize>,
    live_bytes: Cell<usize>,
    total_allocations: Cell<usize>,
    /// Number of requests still granted before refusing, `None` if unlimited.
    remaining: Cell<Option<usize>>,
}

impl CountingAlloc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant the next `n` requests, then refuse every following one.
    pub fn fail_after(&self, n: usize) {
        self.remaining.set(Some(n));
    }

    /// Refuse every following request.
    pub fn fail_now(&self) {
        self.fail_after(0);
    }

    /// Grant every following request.
    pub fn disarm(&self) {
        self.remaining.set(None);
    }

    pub fn live_allocations(&self) -> usize {
        self.live_allocations.get()
    }

    pub fn live_bytes(&self) -> usize {
        self.live_bytes.get()
    }

    pub fn total_allocations(&self) -> usize {
        self.total_allocations.get()
    }
}

unsafe impl Allocator for CountingAlloc {
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        match self.remaining.get() {
            Some(0) => return None,
            Some(n) => self.remaining.set(Some(n - 1)),
            None => {}
        }
        let ptr = Global.allocate(layout)?;
        self.live_allocations.set(self.live_allocations.get() + 1);
        self.live_bytes.set(self.live_bytes.get() + layout.size());
        self.total_allocations.set(self.total_allocations.get() + 1);
        Some(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.live_allocations.set(self.live_allocations.get() - 1);
        self.live_bytes.set(self.live_bytes.get() - layout.size());
        Global.deallocate(ptr, layout)
    }
}

impl fmt::Debug for CountingAlloc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountingAlloc")
            .field("live_allocations", &self.live_allocations.get())
            .field("live_bytes", &self.live_bytes.get())
            .field("total_allocations", &self.total_allocations.get())
            .field("remaining", &self.remaining.get())
            .finish()
    }
}
