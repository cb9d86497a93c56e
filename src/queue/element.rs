use crate::alloc::Allocator;
use crate::error::{QueueError, Result};
use crate::list::Link;
use std::alloc::Layout;
use std::fmt;
use std::ptr::{self, NonNull};
use std::{slice, str};

/// A value-holding node of the ring.
///
/// `link` must stay the first field: the ring only knows `NonNull<Link>`, and
/// [`ElementNode::from_link`] relies on both pointers having the same address.
///
/// `value` points to `len + 1` bytes owned by the node: the UTF-8 bytes of
/// the string followed by a NUL terminator.
#[repr(C)]
pub(crate) struct ElementNode {
    pub(crate) link: Link,
    value: NonNull<u8>,
    len: usize,
}

impl ElementNode {
    /// Allocate a detached node holding a copy of `s`.
    ///
    /// If the buffer cannot be allocated, the node is freed again before
    /// reporting the failure.
    pub(crate) fn allocate<A: Allocator>(s: &str, alloc: &A) -> Result<NonNull<ElementNode>> {
        if s.as_bytes().contains(&0) {
            return Err(QueueError::InvalidArgument("string contains a NUL byte"));
        }
        let buffer_layout = buffer_layout(s.len())?;
        let node = alloc
            .allocate(Layout::new::<ElementNode>())
            .ok_or(QueueError::AllocationFailure)?
            .cast::<ElementNode>();
        let value = match alloc.allocate(buffer_layout) {
            Some(value) => value,
            None => {
                // SAFETY: `node` was just allocated with this layout.
                unsafe { alloc.deallocate(node.cast(), Layout::new::<ElementNode>()) };
                return Err(QueueError::AllocationFailure);
            }
        };
        // SAFETY: `value` is valid for `s.len() + 1` bytes, and `node` for an
        // `ElementNode`; neither overlaps `s`.
        unsafe {
            ptr::copy_nonoverlapping(s.as_ptr(), value.as_ptr(), s.len());
            value.as_ptr().add(s.len()).write(0);
            node.as_ptr().write(ElementNode {
                link: Link::dangling(),
                value,
                len: s.len(),
            });
        }
        Ok(node)
    }

    /// Free the buffer, then the node.
    ///
    /// # Safety
    ///
    /// `node` must come from [`ElementNode::allocate`] with an allocator that
    /// `alloc` refers to, must be detached from any ring, and must not be
    /// used afterwards.
    pub(crate) unsafe fn release<A: Allocator>(node: NonNull<ElementNode>, alloc: &A) {
        let ElementNode { value, len, .. } = node.as_ptr().read();
        if let Ok(layout) = buffer_layout(len) {
            alloc.deallocate(value, layout);
        }
        alloc.deallocate(node.cast(), Layout::new::<ElementNode>());
    }

    #[inline]
    pub(crate) fn link(node: NonNull<ElementNode>) -> NonNull<Link> {
        node.cast()
    }

    /// # Safety
    ///
    /// `link` must be the link of an `ElementNode`, not a sentinel.
    #[inline]
    pub(crate) unsafe fn from_link(link: NonNull<Link>) -> NonNull<ElementNode> {
        link.cast()
    }

    #[inline]
    pub(crate) fn as_bytes(&self) -> &[u8] {
        // SAFETY: `value` holds `len` initialized bytes while the node lives.
        unsafe { slice::from_raw_parts(self.value.as_ptr(), self.len) }
    }

    #[inline]
    pub(crate) fn as_str(&self) -> &str {
        // SAFETY: the bytes were copied from a `&str`.
        unsafe { str::from_utf8_unchecked(self.as_bytes()) }
    }
}

/// Byte-wise comparison of the values behind two element links, ordered the
/// way `strcmp` orders NUL-free strings.
///
/// # Safety
///
/// Both must be links of live `ElementNode`s.
#[inline]
pub(crate) unsafe fn value_le(a: NonNull<Link>, b: NonNull<Link>) -> bool {
    let a = ElementNode::from_link(a).as_ref().as_bytes();
    let b = ElementNode::from_link(b).as_ref().as_bytes();
    a <= b
}

/// # Safety
///
/// Both must be links of live `ElementNode`s.
#[inline]
pub(crate) unsafe fn value_eq(a: NonNull<Link>, b: NonNull<Link>) -> bool {
    let a = ElementNode::from_link(a).as_ref().as_bytes();
    let b = ElementNode::from_link(b).as_ref().as_bytes();
    a == b
}

fn buffer_layout(len: usize) -> Result<Layout> {
    let size = len
        .checked_add(1)
        .ok_or(QueueError::AllocationFailure)?;
    Layout::array::<u8>(size).map_err(|_| QueueError::AllocationFailure)
}

/// Copy `src` into `out` as a NUL-terminated string, truncated to at most
/// `out.len() - 1` bytes. Returns the number of bytes copied before the
/// terminator. Nothing is written if `out` is empty.
pub(crate) fn copy_truncated(src: &[u8], out: &mut [u8]) -> usize {
    let Some(cap) = out.len().checked_sub(1) else {
        return 0;
    };
    let n = src.len().min(cap);
    out[..n].copy_from_slice(&src[..n]);
    out[n] = 0;
    n
}

/// An element detached from a queue.
///
/// Removing an element from a [`Queue`] does not destroy it: the caller owns
/// the returned `Element` and may inspect it before deciding its fate. The
/// storage is released by [`Element::release`], or when the element is
/// dropped.
///
/// # Examples
///
/// ```
/// use cyclic_queue::Queue;
///
/// let mut queue = Queue::new().unwrap();
/// queue.insert_tail("apple").unwrap();
///
/// let element = queue.remove_head(None).unwrap();
/// assert_eq!(element.value(), "apple");
/// assert!(queue.is_empty());
/// element.release();
/// ```
///
/// [`Queue`]: crate::Queue
pub struct Element<A: Allocator> {
    node: NonNull<ElementNode>,
    alloc: A,
}

impl<A: Allocator> Element<A> {
    /// # Safety
    ///
    /// `node` must be detached from every ring and allocated by `alloc`.
    pub(crate) unsafe fn from_detached(node: NonNull<ElementNode>, alloc: A) -> Self {
        Self { node, alloc }
    }

    fn node(&self) -> &ElementNode {
        // SAFETY: an `Element` exclusively owns a live node.
        unsafe { self.node.as_ref() }
    }

    pub fn value(&self) -> &str {
        self.node().as_str()
    }

    /// The bytes of the value, without the NUL terminator.
    pub fn as_bytes(&self) -> &[u8] {
        self.node().as_bytes()
    }

    pub fn len(&self) -> usize {
        self.node().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Release the string buffer and the node.
    pub fn release(self) {
        drop(self)
    }
}

impl<A: Allocator> Drop for Element<A> {
    fn drop(&mut self) {
        // SAFETY: the node is detached and owned by this element only.
        unsafe { ElementNode::release(self.node, &self.alloc) }
    }
}

impl<A: Allocator> fmt::Debug for Element<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Element").field(&self.value()).finish()
    }
}

impl<A: Allocator> fmt::Display for Element<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value())
    }
}
