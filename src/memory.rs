//! Allocation for engine scratch memory.
//!
//! Doublers never grow after creation: the ring buffer and column scratch are
//! sized from the configuration and obtained once through the context's
//! [`Allocator`]. The default is the C heap; embedders can inject their own
//! `alloc`/`free` pair through [`CallbackAllocator`].

use std::ffi::c_void;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;
use std::sync::Arc;

use crate::doubler::DoublerError;

// ==============================================================================
// Allocator
// ==============================================================================

/// Source of raw scratch memory
pub trait Allocator: Send + Sync {
    /// Allocate `size` bytes, or `None` when memory is exhausted.
    ///
    /// The block must be aligned for `i32` at least.
    fn allocate(&self, size: usize) -> Option<NonNull<u8>>;

    /// Return a block obtained from [`Allocator::allocate`]
    ///
    /// # Safety
    /// `ptr` must come from `allocate` on this same allocator and must not
    /// be used afterwards.
    unsafe fn release(&self, ptr: NonNull<u8>);
}

/// The system heap through libc `malloc`/`free`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAllocator;

impl Allocator for SystemAllocator {
    fn allocate(&self, size: usize) -> Option<NonNull<u8>> {
        // malloc(0) may legally return null; ask for one byte instead.
        let ptr = unsafe { libc::malloc(size.max(1)) };
        if ptr.is_null() {
            log::error!("malloc of {} bytes failed", size);
        }
        NonNull::new(ptr as *mut u8)
    }

    unsafe fn release(&self, ptr: NonNull<u8>) {
        libc::free(ptr.as_ptr() as *mut c_void);
    }
}

/// Allocation callback supplied by a C caller
pub type AllocCallback = unsafe extern "C" fn(opaque: *mut c_void, size: usize) -> *mut c_void;

/// Release callback supplied by a C caller
pub type FreeCallback = unsafe extern "C" fn(opaque: *mut c_void, ptr: *mut c_void);

/// Allocator backed by caller-provided C callbacks and an opaque cookie
#[derive(Debug)]
pub struct CallbackAllocator {
    alloc: AllocCallback,
    free: FreeCallback,
    opaque: *mut c_void,
}

// The callbacks are required to be callable from whichever thread owns the
// doubler; the opaque cookie is only ever handed back to them.
unsafe impl Send for CallbackAllocator {}
unsafe impl Sync for CallbackAllocator {}

impl CallbackAllocator {
    /// Wrap a callback pair.
    ///
    /// # Safety
    /// Both callbacks must stay valid for the allocator's lifetime and `free`
    /// must accept every pointer returned by `alloc` with the same `opaque`.
    pub unsafe fn new(alloc: AllocCallback, free: FreeCallback, opaque: *mut c_void) -> Self {
        Self { alloc, free, opaque }
    }
}

impl Allocator for CallbackAllocator {
    fn allocate(&self, size: usize) -> Option<NonNull<u8>> {
        let ptr = unsafe { (self.alloc)(self.opaque, size.max(1)) } as *mut u8;
        let ptr = NonNull::new(ptr)?;
        if ptr.as_ptr().align_offset(std::mem::align_of::<i32>()) != 0 {
            log::error!("allocator callback returned a misaligned block");
            unsafe { (self.free)(self.opaque, ptr.as_ptr() as *mut c_void) };
            return None;
        }
        Some(ptr)
    }

    unsafe fn release(&self, ptr: NonNull<u8>) {
        (self.free)(self.opaque, ptr.as_ptr() as *mut c_void);
    }
}

// ==============================================================================
// Accumulator buffers
// ==============================================================================

/// Zero-initialised `i32` buffer owned through an [`Allocator`]
pub struct AccumBuffer {
    ptr: NonNull<i32>,
    len: usize,
    allocator: Arc<dyn Allocator>,
}

// The buffer is uniquely owned and the allocator is Send + Sync.
unsafe impl Send for AccumBuffer {}

impl AccumBuffer {
    /// Allocate `len` zeroed accumulators
    pub fn zeroed(allocator: Arc<dyn Allocator>, len: usize) -> Result<Self, DoublerError> {
        let bytes = len
            .checked_mul(std::mem::size_of::<i32>())
            .ok_or(DoublerError::OutOfMemory { bytes: usize::MAX })?;
        let raw = allocator
            .allocate(bytes)
            .ok_or(DoublerError::OutOfMemory { bytes })?;
        if raw.as_ptr().align_offset(std::mem::align_of::<i32>()) != 0 {
            unsafe { allocator.release(raw) };
            return Err(DoublerError::OutOfMemory { bytes });
        }
        unsafe { std::ptr::write_bytes(raw.as_ptr(), 0, bytes) };
        Ok(Self {
            ptr: raw.cast::<i32>(),
            len,
            allocator,
        })
    }
}

impl Deref for AccumBuffer {
    type Target = [i32];

    fn deref(&self) -> &[i32] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl DerefMut for AccumBuffer {
    fn deref_mut(&mut self) -> &mut [i32] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl Drop for AccumBuffer {
    fn drop(&mut self) {
        unsafe { self.allocator.release(self.ptr.cast::<u8>()) };
    }
}

impl std::fmt::Debug for AccumBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccumBuffer").field("len", &self.len).finish()
    }
}
