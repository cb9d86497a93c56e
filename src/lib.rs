//! This crate provides a queue of strings over an intrusive circular
//! doubly-linked list.
//!
//! The [`Queue`] allows inserting and removing elements at both ends in
//! constant time, and transforms the whole list in place: reversal, pairwise
//! swap, stable sort, deletion of duplicates and of the middle element. None of
//! the transformations allocates; they only rewrite links.
//!
//! Here is a quick example showing how the queue works.
//!
//! ```
//! use cyclic_queue::Queue;
//!
//! let mut queue = Queue::new().unwrap();
//! for s in ["banana", "apple", "cherry"] {
//!     queue.insert_tail(s).unwrap();
//! }
//!
//! queue.sort();
//! assert_eq!(queue.iter().collect::<Vec<_>>(), ["apple", "banana", "cherry"]);
//!
//! queue.reverse();
//! let cherry = queue.remove_head(None).unwrap(); // detached, not released
//! assert_eq!(cherry.value(), "cherry");
//! assert_eq!(queue.size(), 2);
//!
//! cherry.release();
//! queue.destroy(); // releases "banana" and "apple", then the sentinel
//! ```
//!
//! # Memory Layout
//!
//! The memory layout of the queue is like the following graph:
//! ```text
//!          ┌─────────────────────────────────────────────────────────────────────┐
//!          ↓                                                     (Ghost) Link    │
//!    ╔═══════════╗           ╔═══════════╗                        ┌───────────┐  │
//!    ║   next    ║ ────────→ ║   next    ║ ────────→ ┄┄ ────────→ │   next    │ ─┘
//!    ╟───────────╢           ╟───────────╢    Element 2, 3, ...   ├───────────┤
//! ┌─ ║   prev    ║ ←──────── ║   prev    ║ ←──────── ┄┄ ←──────── │   prev    │
//! │  ╟───────────╢           ╟───────────╢                        └───────────┘
//! │  ║  value  ──╫─→ "..\0"  ║  value  ──╫─→ "..\0"                  ↑   ↑
//! │  ╚═══════════╝           ╚═══════════╝                           │   │
//! │    Element 0               Element 1                             │   │
//! └──────────────────────────────────────────────────────────────────┘   │
//! ╔═══════════╗                                                          │
//! ║   ghost   ║ ─────────────────────────────────────────────────────────┘
//! ╟───────────╢
//! ║   alloc   ║
//! ╚═══════════╝
//!     Queue
//! ```
//! The `Queue` contains:
//! - a pointer `ghost` to the sentinel link, which has *NO* payload;
//! - the [`Allocator`] that provides the sentinel, the elements and their
//!   string buffers.
//!
//! Each element embeds its `next`/`prev` links as its first field, followed by
//! an exactly-sized, NUL-terminated copy of its string. There is no length
//! field: [`Queue::size`] walks the ring.
//!
//! Initially, the `next` and `prev` links of the ghost point to itself. As
//! elements are inserted, `ghost.next` points to the first element and
//! `ghost.prev` to the last one.
//!
//! # Remove and Release
//!
//! [`Queue::remove_head`] and [`Queue::remove_tail`] only unlink an element:
//! the caller receives an owned [`Element`], can inspect it, and releases it
//! with [`Element::release`] (or by dropping it). [`Queue::delete_mid`] and
//! [`Queue::delete_dup`] release the elements they remove.
//!
//! # Allocation Failure
//!
//! Storage comes from an [`Allocator`] that reports refusal instead of
//! aborting. A failed insertion rolls back whatever it already allocated and
//! leaves the queue untouched:
//!
//! ```
//! use cyclic_queue::{CountingAlloc, Queue, QueueError};
//!
//! let alloc = CountingAlloc::new();
//! let mut queue = Queue::new_in(&alloc).unwrap();
//! alloc.fail_after(1); // the node is granted, its buffer is not
//! assert_eq!(queue.insert_head("apple"), Err(QueueError::AllocationFailure));
//! assert!(queue.is_empty());
//! assert_eq!(alloc.live_allocations(), 1); // only the sentinel
//! ```
//!
//! # Features
//!
//! - `invariant-checks`: re-validate the whole ring after every mutating
//!   operation (with debug assertions enabled).
//!
//! [`Queue`]: crate::Queue
//! [`Element`]: crate::Element
//! [`Allocator`]: crate::Allocator

#[doc(inline)]
pub use crate::alloc::{Allocator, CountingAlloc, Global};
#[doc(inline)]
pub use crate::error::{QueueError, Result};
#[doc(inline)]
pub use crate::queue::{Element, Iter, Queue};

pub mod alloc;
mod error;
mod list;
mod queue;
