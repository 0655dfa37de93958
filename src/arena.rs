#![allow(unsafe_code)]

use crate::error::{Error, ErrorKind};
use std::alloc::Layout;
use std::cell::Cell;
use std::ptr::{self, NonNull};

const BLOCK_ALIGN: usize = std::mem::align_of::<BlockHeader>();
const HEADER_SIZE: usize = std::mem::size_of::<BlockHeader>();

/// Capacity of the first block when none is specified.
pub const DEFAULT_CAPACITY: usize = 16 * 1024;

const _: () = assert!(HEADER_SIZE == 16);
const _: () = assert!(BLOCK_ALIGN == 8);

#[repr(C)]
struct BlockHeader {
    prev: Option<NonNull<BlockHeader>>,
    size: usize,
}

/// A bump allocator that hands out bytes from a chain of blocks.
///
/// When the current block cannot satisfy a request, a new block is chained
/// in and becomes current; the old block keeps its contents and is never
/// written to again. Every pointer handed out stays valid until the arena is
/// dropped, at which point all blocks are released together. Individual
/// deallocation is not supported.
pub struct Arena {
    ptr: Cell<NonNull<u8>>,
    end: Cell<NonNull<u8>>,
    block: Cell<NonNull<BlockHeader>>,
    blocks: Cell<usize>,
    reserved: Cell<usize>,
    limit: Option<usize>,
}

// Safety: every block is exclusively owned by the arena and only reachable
// through it. The arena is !Sync because of the `Cell`s.
unsafe impl Send for Arena {}

impl Arena {
    /// Creates an arena whose first block holds [`DEFAULT_CAPACITY`] bytes.
    pub fn new() -> Result<Self, Error> {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates an arena whose first block holds `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Result<Self, Error> {
        Self::with_limit(capacity, None)
    }

    /// Creates an arena that refuses to reserve more than `limit` bytes of
    /// blocks (headers included) over its lifetime.
    pub fn with_limit(capacity: usize, limit: Option<usize>) -> Result<Self, Error> {
        let (header, size) = allocate_block(capacity, None, limit)?;
        let arena = Arena {
            ptr: Cell::new(NonNull::dangling()),
            end: Cell::new(NonNull::dangling()),
            block: Cell::new(header),
            blocks: Cell::new(0),
            reserved: Cell::new(0),
            limit,
        };
        arena.install(header, size);
        Ok(arena)
    }

    /// Allocates `len` bytes with byte alignment. The memory is not
    /// initialized.
    #[inline]
    pub fn alloc(&self, len: usize) -> Result<NonNull<u8>, Error> {
        match Layout::from_size_align(len, 1) {
            Ok(layout) => self.alloc_layout(layout),
            Err(_) => Err(ErrorKind::AllocationFailure { requested: len }.into()),
        }
    }

    /// Allocate `layout.size()` bytes with the given alignment.
    ///
    /// Alignments above 8 are rejected.
    #[inline]
    pub(crate) fn alloc_layout(&self, layout: Layout) -> Result<NonNull<u8>, Error> {
        if layout.align() > BLOCK_ALIGN {
            return Err(ErrorKind::Internal("arena alignment above 8").into());
        }
        if layout.size() == 0 {
            // Safety: layout.align() is always a non-zero power of two.
            return Ok(unsafe { NonNull::new_unchecked(layout.align() as *mut u8) });
        }

        if let Some(ptr) = self.bump(layout) {
            return Ok(ptr);
        }
        self.alloc_slow(layout)
    }

    #[inline]
    fn bump(&self, layout: Layout) -> Option<NonNull<u8>> {
        let ptr = self.ptr.get().as_ptr() as usize;
        let aligned = (ptr + layout.align() - 1) & !(layout.align() - 1);
        let new_ptr = aligned.checked_add(layout.size())?;

        if new_ptr <= self.end.get().as_ptr() as usize {
            // Safety: new_ptr is within the current block's bounds.
            unsafe {
                self.ptr.set(NonNull::new_unchecked(new_ptr as *mut u8));
                Some(NonNull::new_unchecked(aligned as *mut u8))
            }
        } else {
            None
        }
    }

    #[cold]
    #[inline(never)]
    fn alloc_slow(&self, layout: Layout) -> Result<NonNull<u8>, Error> {
        if let Err(e) = self.grow(layout.size()) {
            return Err(e);
        }
        match self.bump(layout) {
            Some(ptr) => Ok(ptr),
            None => Err(ErrorKind::Internal("fresh arena block too small").into()),
        }
    }

    /// Copies `bytes` into the arena.
    pub fn alloc_bytes(&self, bytes: &[u8]) -> Result<&[u8], Error> {
        if bytes.is_empty() {
            return Ok(&[]);
        }
        let ptr = match self.alloc(bytes.len()) {
            Ok(p) => p,
            Err(e) => return Err(e),
        };
        // Safety: ptr points to bytes.len() freshly reserved bytes that
        // cannot overlap the source.
        unsafe {
            ptr::copy_nonoverlapping(bytes.as_ptr(), ptr.as_ptr(), bytes.len());
            Ok(std::slice::from_raw_parts(ptr.as_ptr(), bytes.len()))
        }
    }

    /// Copies `s` into the arena.
    pub fn alloc_str(&self, s: &str) -> Result<&str, Error> {
        match self.alloc_bytes(s.as_bytes()) {
            // Safety: the bytes were copied from a valid `&str`.
            Ok(bytes) => Ok(unsafe { std::str::from_utf8_unchecked(bytes) }),
            Err(e) => Err(e),
        }
    }

    /// Grows an allocation previously obtained from this arena.
    ///
    /// Extends in place when `ptr` is the most recent allocation and the
    /// current block has room, otherwise copies into a new allocation.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by this arena for `old_size` bytes with
    /// alignment `align`, and `new_size >= old_size`.
    pub(crate) unsafe fn realloc(
        &self,
        ptr: NonNull<u8>,
        old_size: usize,
        new_size: usize,
        align: usize,
    ) -> Result<NonNull<u8>, Error> {
        debug_assert!(new_size >= old_size);
        let tail = ptr.as_ptr() as usize + old_size;
        if tail == self.ptr.get().as_ptr() as usize {
            let new_end = ptr.as_ptr() as usize + new_size;
            if new_end <= self.end.get().as_ptr() as usize {
                // Safety: new_end is within the current block's bounds.
                unsafe { self.ptr.set(NonNull::new_unchecked(new_end as *mut u8)) };
                return Ok(ptr);
            }
        }
        let layout = match Layout::from_size_align(new_size, align) {
            Ok(l) => l,
            Err(_) => return Err(ErrorKind::AllocationFailure { requested: new_size }.into()),
        };
        let new_ptr = match self.alloc_layout(layout) {
            Ok(p) => p,
            Err(e) => return Err(e),
        };
        // Safety: the old region is still live (blocks are never freed
        // before drop) and the new one is disjoint from it.
        unsafe { ptr::copy_nonoverlapping(ptr.as_ptr(), new_ptr.as_ptr(), old_size) };
        Ok(new_ptr)
    }

    /// Chains a new block able to hold at least `len` bytes.
    ///
    /// The new block is at least twice the bytes used in the current block
    /// and at least twice `len`.
    fn grow(&self, len: usize) -> Result<(), Error> {
        let used = self.usage();
        let capacity = used.saturating_mul(2).max(len.saturating_mul(2));
        let limit_left = self.limit.map(|limit| limit.saturating_sub(self.reserved.get()));
        let (header, size) = match allocate_block(capacity, Some(self.block.get()), limit_left) {
            Ok(v) => v,
            Err(e) => return Err(e),
        };
        self.install(header, size);
        tracing::trace!(
            blocks = self.blocks.get(),
            capacity = size - HEADER_SIZE,
            "arena grew"
        );
        Ok(())
    }

    fn install(&self, header: NonNull<BlockHeader>, size: usize) {
        // Safety: header points to a freshly allocated block of `size` bytes.
        unsafe {
            let base = header.as_ptr().cast::<u8>();
            self.block.set(header);
            self.ptr.set(NonNull::new_unchecked(base.add(HEADER_SIZE)));
            self.end.set(NonNull::new_unchecked(base.add(size)));
        }
        self.blocks.set(self.blocks.get() + 1);
        self.reserved.set(self.reserved.get() + size);
    }

    /// Bytes handed out from the current block.
    pub fn usage(&self) -> usize {
        let base = self.block.get().as_ptr() as usize + HEADER_SIZE;
        self.ptr.get().as_ptr() as usize - base
    }

    /// Usable bytes of the current block.
    pub fn capacity(&self) -> usize {
        // Safety: block always points at a live header.
        unsafe { self.block.get().as_ref().size - HEADER_SIZE }
    }

    /// Number of blocks in the chain.
    pub fn block_count(&self) -> usize {
        self.blocks.get()
    }

    /// Total bytes reserved from the backing allocator, headers included.
    pub fn reserved_bytes(&self) -> usize {
        self.reserved.get()
    }
}

fn allocate_block(
    capacity: usize,
    prev: Option<NonNull<BlockHeader>>,
    limit: Option<usize>,
) -> Result<(NonNull<BlockHeader>, usize), Error> {
    let failure = |requested| Error::from(ErrorKind::AllocationFailure { requested });

    let Some(size) = HEADER_SIZE.checked_add(capacity) else {
        return Err(failure(capacity));
    };
    if let Some(limit) = limit {
        if size > limit {
            return Err(failure(size));
        }
    }
    let Ok(layout) = Layout::from_size_align(size, BLOCK_ALIGN) else {
        return Err(failure(size));
    };

    // Safety: layout has a non-zero size (HEADER_SIZE > 0).
    let raw = unsafe { std::alloc::alloc(layout) };
    let Some(base) = NonNull::new(raw) else {
        return Err(failure(size));
    };

    let header = base.cast::<BlockHeader>();
    // Safety: base points to a freshly allocated region of `size` bytes.
    unsafe { header.as_ptr().write(BlockHeader { prev, size }) };
    Ok((header, size))
}

impl Drop for Arena {
    fn drop(&mut self) {
        let mut current = Some(self.block.get());
        while let Some(block) = current {
            // Safety: every header in the chain is a live heap block.
            let header = unsafe { block.as_ref() };
            current = header.prev;
            // Safety: header.size and BLOCK_ALIGN match the layout used in allocate_block().
            let layout = unsafe { Layout::from_size_align_unchecked(header.size, BLOCK_ALIGN) };
            unsafe { std::alloc::dealloc(block.as_ptr().cast(), layout) };
        }
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("blocks", &self.block_count())
            .field("usage", &self.usage())
            .field("capacity", &self.capacity())
            .finish()
    }
}

#[cfg(test)]
#[path = "./arena_tests.rs"]
mod tests;
