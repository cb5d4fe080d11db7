//! Streaming keeps peak heap use flat as the document grows
//!
//! Kept as the only test in this binary: the allocator counters are global.

mod common;

use drugstore::ingest::{RecordParser, DRUGBANK_NAMESPACE};
use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicUsize, Ordering};

struct CountingAllocator;

static CURRENT: AtomicUsize = AtomicUsize::new(0);
static PEAK: AtomicUsize = AtomicUsize::new(0);

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc(layout);
        if !ptr.is_null() {
            let now = CURRENT.fetch_add(layout.size(), Ordering::SeqCst) + layout.size();
            PEAK.fetch_max(now, Ordering::SeqCst);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout);
        CURRENT.fetch_sub(layout.size(), Ordering::SeqCst);
    }
}

#[global_allocator]
static ALLOCATOR: CountingAllocator = CountingAllocator;

/// Heap growth above the starting point while parsing `xml` to the end
fn parse_peak(xml: &str) -> Result<(usize, usize), drugstore::Error> {
    let baseline = CURRENT.load(Ordering::SeqCst);
    PEAK.store(baseline, Ordering::SeqCst);

    let mut records = 0;
    for record in RecordParser::from_reader(xml.as_bytes(), DRUGBANK_NAMESPACE) {
        let record = record?;
        assert!(!record.id.is_empty());
        records += 1;
    }

    Ok((records, PEAK.load(Ordering::SeqCst).saturating_sub(baseline)))
}

#[test]
fn test_peak_memory_independent_of_record_count() -> Result<(), drugstore::Error> {
    let small = common::synthetic(1_000);
    let large = common::synthetic(20_000);

    let (small_records, small_peak) = parse_peak(&small)?;
    let (large_records, large_peak) = parse_peak(&large)?;

    assert_eq!(small_records, 1_000);
    assert_eq!(large_records, 20_000);

    // the large document is 20x bigger; its parse must not be
    assert!(
        large_peak <= small_peak * 2 + 64 * 1024,
        "peak grew with input: {small_peak} bytes for 1k records, {large_peak} bytes for 20k"
    );
    assert!(large_peak < large.len() / 4);
    Ok(())
}
