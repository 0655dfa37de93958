//! Checks that dropping a document hands every allocation back exactly once.
//!
//! Runs in its own test binary so the counting allocator does not apply to
//! the other tests.

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;
use std::fmt::Write;

struct Counting;

// Per-thread, so allocations of the test harness on other threads do not
// show up in the totals.
thread_local! {
    static LIVE_BYTES: Cell<isize> = const { Cell::new(0) };
    static LIVE_ALLOCS: Cell<isize> = const { Cell::new(0) };
}

fn record(bytes: isize, allocs: isize) {
    let _ = LIVE_BYTES.try_with(|c| c.set(c.get() + bytes));
    let _ = LIVE_ALLOCS.try_with(|c| c.set(c.get() + allocs));
}

unsafe impl GlobalAlloc for Counting {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            record(layout.size() as isize, 1);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) };
        record(-(layout.size() as isize), -1);
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new = unsafe { System.realloc(ptr, layout, new_size) };
        if !new.is_null() {
            record(new_size as isize - layout.size() as isize, 0);
        }
        new
    }
}

#[global_allocator]
static GLOBAL: Counting = Counting;

/// `(bytes, allocations)` currently live on this thread.
fn live() -> (isize, isize) {
    (LIVE_BYTES.with(Cell::get), LIVE_ALLOCS.with(Cell::get))
}

fn source(sections: usize) -> String {
    let mut out = String::new();
    for i in 0..sections {
        let _ = writeln!(out, "[group{} item{i}]", i % 7);
        let _ = writeln!(out, "key{i} = value number {i}");
        let _ = writeln!(out, "quoted = \"escaped\\tvalue {i}\"");
    }
    out
}

/// Parses `source` into a fresh document, drops it and returns the number of
/// arena blocks it held.
fn parse_and_drop(options: cini::Options, source: &str) -> usize {
    let mut doc = cini::Document::with_options(options).unwrap();
    let _ = doc.parse_str(source);
    let blocks = doc.arena().block_count();
    drop(doc);
    blocks
}

/// Like `parse_and_drop`, with a reset and a second parse in between.
fn reparse_and_drop(options: cini::Options, source: &str) {
    let mut doc = cini::Document::with_options(options).unwrap();
    doc.parse_str(source).unwrap();
    doc.reset().unwrap();
    doc.parse_str(source).unwrap();
    drop(doc);
}

#[test]
fn dropping_a_document_releases_every_block() {
    let source = source(2000);
    let small = || cini::Options::default().initial_capacity(64);
    let limited = || cini::Options::default().initial_capacity(64).memory_limit(Some(16 * 1024));

    // First runs register logging callsites, which stay allocated.
    parse_and_drop(small(), &source);
    parse_and_drop(limited(), &source);
    reparse_and_drop(small(), &source);

    let before = live();
    let blocks = parse_and_drop(small(), &source);
    assert!(blocks > 5, "only {blocks} blocks");
    assert_eq!(live(), before);

    // A pass stopped by the memory limit leaves a partial chain behind.
    let blocks = parse_and_drop(limited(), &source);
    assert!(blocks > 1, "only {blocks} blocks");
    assert_eq!(live(), before);

    reparse_and_drop(small(), &source);
    assert_eq!(live(), before);
}
