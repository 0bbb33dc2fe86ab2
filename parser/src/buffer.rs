//! Scratch buffers handed to foreign callers.
//!
//! Each buffer is preceded by a header holding its length, so it can be
//! released knowing only its address.

use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::mem::{align_of, size_of};
use std::ptr;

const HEADER: usize = size_of::<usize>();

fn layout(len: usize) -> Option<Layout> {
  let size = len.checked_add(HEADER)?;
  Layout::from_size_align(size, align_of::<usize>()).ok()
}

/// Allocates a zeroed buffer of `len` bytes. Returns null if the size
/// overflows or the allocation fails.
pub(crate) fn allocate(len: usize) -> *mut u8 {
  let Some(layout) = layout(len) else {
    return ptr::null_mut();
  };

  // SAFETY: the layout is never zero sized because of the header
  unsafe {
    let base = alloc_zeroed(layout);

    if base.is_null() {
      return base;
    }

    (base as *mut usize).write(len);
    base.add(HEADER)
  }
}

/// # Safety
///
/// `buffer` must be null or returned by `allocate` and not released yet.
pub(crate) unsafe fn release(buffer: *mut u8) {
  if buffer.is_null() {
    return;
  }

  let base = buffer.sub(HEADER);
  let len = (base as *const usize).read();

  if let Some(layout) = layout(len) {
    dealloc(base, layout);
  }
}
