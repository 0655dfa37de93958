#![allow(unsafe_code)]

//! A lifetime-erased string handle pointing into a document's arena.

use std::hash::{Hash, Hasher};
use std::ptr::NonNull;

#[cfg(test)]
#[path = "./str_tests.rs"]
mod tests;

/// A `(ptr, len)` pair naming bytes owned by an [`Arena`](crate::Arena).
///
/// The handle carries no lifetime: it is stored inside the [`Document`]
/// that owns the arena, and only turned back into a `&str` through a borrow
/// of that document. Arena blocks never move or get freed before the
/// document is dropped, so the bytes stay valid for as long as the handle
/// is reachable.
///
/// [`Document`]: crate::Document
#[derive(Copy, Clone)]
pub(crate) struct ArenaStr {
    ptr: NonNull<u8>,
    len: u32,
}

const _: () = assert!(std::mem::size_of::<ArenaStr>() <= 16);

// SAFETY: The handle is a read-only view of bytes that are never mutated
// after being written.
unsafe impl Send for ArenaStr {}
unsafe impl Sync for ArenaStr {}

impl ArenaStr {
    pub(crate) const EMPTY: ArenaStr = ArenaStr {
        ptr: NonNull::dangling(),
        len: 0,
    };

    /// Wraps a string slice.
    ///
    /// Used both for arena-allocated strings and for short-lived lookup keys
    /// that borrow caller memory.
    #[inline]
    pub(crate) fn new(s: &str) -> Self {
        debug_assert!(s.len() <= u32::MAX as usize);
        Self {
            // Safety: slice pointers are never null.
            ptr: unsafe { NonNull::new_unchecked(s.as_ptr() as *mut u8) },
            len: s.len() as u32,
        }
    }

    /// Returns the referenced string.
    ///
    /// # Safety
    ///
    /// The memory behind the handle must outlive `'a`.
    #[inline]
    pub(crate) unsafe fn as_str<'a>(&self) -> &'a str {
        if self.len == 0 {
            return "";
        }
        unsafe {
            let slice = std::slice::from_raw_parts(self.ptr.as_ptr(), self.len as usize);
            std::str::from_utf8_unchecked(slice)
        }
    }
}

impl Hash for ArenaStr {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        unsafe { self.as_str() }.hash(state);
    }
}

impl PartialEq for ArenaStr {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        unsafe { self.as_str() == other.as_str() }
    }
}

impl Eq for ArenaStr {}

impl std::fmt::Debug for ArenaStr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(unsafe { self.as_str() }, f)
    }
}
