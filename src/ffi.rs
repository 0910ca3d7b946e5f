//! C ABI for embedding doublers in C pipelines.
//!
//! Contexts and doublers are handed out as opaque boxed pointers. Every entry
//! point catches panics; failures are logged at `warn` and reported as a null
//! pointer or `-1`.

use std::ffi::{c_int, c_void};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr;
use std::sync::Arc;

use crate::context::Context;
use crate::doubler::{Doubler, DoublerConfig, Quality};
use crate::logging::{self, LogLevel};
use crate::memory::{AllocCallback, CallbackAllocator, FreeCallback};

/// Optional allocator callbacks; both must be set to take effect
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct DoublerAllocators {
    pub alloc: Option<AllocCallback>,
    pub free: Option<FreeCallback>,
}

// ============================================================================
// Context
// ============================================================================

/// Create a context. With a null `allocators` (or missing callbacks) the
/// system heap is used; otherwise scratch memory comes from the callbacks,
/// which receive `opaque` on every call.
///
/// # Safety
///
/// `allocators`, when non-null, must point to a valid `DoublerAllocators`
/// whose callbacks stay valid until every doubler created from the context
/// has been released.
#[no_mangle]
pub unsafe extern "C" fn rust_doubler_context_new(
    allocators: *const DoublerAllocators,
    opaque: *mut c_void,
) -> *mut Context {
    catch_unwind(AssertUnwindSafe(|| {
        let ctx = match allocators.as_ref() {
            Some(DoublerAllocators {
                alloc: Some(alloc),
                free: Some(free),
            }) => Context::with_allocator(Arc::new(CallbackAllocator::new(*alloc, *free, opaque))),
            _ => Context::new(),
        };
        Box::into_raw(Box::new(ctx))
    }))
    .unwrap_or(ptr::null_mut())
}

/// Release a context. Doublers created from it remain valid.
///
/// # Safety
///
/// `ctx` must be null or a pointer from `rust_doubler_context_new` that has
/// not been freed yet.
#[no_mangle]
pub unsafe extern "C" fn rust_doubler_context_free(ctx: *mut Context) {
    if !ctx.is_null() {
        drop(Box::from_raw(ctx));
    }
}

/// Turn vector kernels on or off for doublers created afterwards.
///
/// Returns 1 when vector kernels are now in use, 0 when not, -1 for a null
/// context.
///
/// # Safety
///
/// `ctx` must be null or a live context pointer.
#[no_mangle]
pub unsafe extern "C" fn rust_doubler_force_simd(ctx: *mut Context, enable: c_int) -> c_int {
    match ctx.as_mut() {
        Some(ctx) => ctx.force_simd(enable != 0) as c_int,
        None => {
            log::warn!("rust_doubler_force_simd: null context");
            -1
        }
    }
}

/// 1 when the CPU has SSE4.1, 0 when not, -1 for a null context.
///
/// # Safety
///
/// `ctx` must be null or a live context pointer.
#[no_mangle]
pub unsafe extern "C" fn rust_doubler_cpu_supports_sse41(ctx: *const Context) -> c_int {
    match ctx.as_ref() {
        Some(ctx) => ctx.cpu_supports_sse41() as c_int,
        None => -1,
    }
}

// ============================================================================
// Doubler
// ============================================================================

/// Create a doubler. On success the number of input rows each call expects
/// is stored through `in_lines` (when non-null). Returns null on failure.
///
/// # Safety
///
/// `ctx` must be a live context pointer; `in_lines` must be null or
/// writable.
#[no_mangle]
pub unsafe extern "C" fn rust_doubler_init(
    ctx: *const Context,
    src_w: c_int,
    src_h: c_int,
    factor: c_int,
    quality: c_int,
    channels: c_int,
    in_lines: *mut c_int,
) -> *mut Doubler {
    catch_unwind(AssertUnwindSafe(|| {
        let Some(ctx) = ctx.as_ref() else {
            log::warn!("rust_doubler_init: null context");
            return ptr::null_mut();
        };
        let quality = match Quality::from_i32(quality) {
            Ok(q) => q,
            Err(e) => {
                log::warn!("rust_doubler_init: {}", e);
                return ptr::null_mut();
            }
        };
        // Negative values map to 0, which creation rejects.
        let config = DoublerConfig::new(
            usize::try_from(src_w).unwrap_or(0),
            usize::try_from(src_h).unwrap_or(0),
            u32::try_from(factor).unwrap_or(0),
            quality,
            usize::try_from(channels).unwrap_or(0),
        );
        match Doubler::new(ctx, config) {
            Ok(doubler) => {
                if let Some(out) = in_lines.as_mut() {
                    *out = doubler.support() as c_int;
                }
                Box::into_raw(Box::new(doubler))
            }
            Err(e) => {
                log::warn!("rust_doubler_init: {}", e);
                ptr::null_mut()
            }
        }
    }))
    .unwrap_or(ptr::null_mut())
}

/// Process one call. `inputs` holds `in_lines` row pointers (null outside
/// the image), `outputs` holds `factor` row pointers. Returns the number of
/// rows written, or -1.
///
/// # Safety
///
/// `doubler` must be a live doubler pointer. Each non-null input must point
/// to `src_w * channels` readable bytes and each output used by the call to
/// `factor * src_w * channels` writable bytes. Output rows must not overlap
/// each other or any input.
#[no_mangle]
pub unsafe extern "C" fn rust_doubler_process(
    doubler: *mut Doubler,
    inputs: *const *const u8,
    outputs: *const *mut u8,
) -> c_int {
    catch_unwind(AssertUnwindSafe(|| {
        let Some(doubler) = doubler.as_mut() else {
            log::warn!("rust_doubler_process: null doubler");
            return -1;
        };
        if inputs.is_null() || outputs.is_null() {
            log::warn!("rust_doubler_process: null row array");
            return -1;
        }

        let src_len = doubler.input_row_len();
        let dst_len = doubler.output_row_len();
        let window: Vec<Option<&[u8]>> = std::slice::from_raw_parts(inputs, doubler.support())
            .iter()
            .map(|&p| (!p.is_null()).then(|| std::slice::from_raw_parts(p, src_len)))
            .collect();
        // A null output row becomes empty and fails the length check if used.
        let mut rows: Vec<&mut [u8]> = std::slice::from_raw_parts(outputs, doubler.factor().get())
            .iter()
            .map(|&p| {
                if p.is_null() {
                    <&mut [u8]>::default()
                } else {
                    std::slice::from_raw_parts_mut(p, dst_len)
                }
            })
            .collect();

        match doubler.process(&window, &mut rows) {
            Ok(n) => n as c_int,
            Err(e) => {
                log::warn!("rust_doubler_process: {}", e);
                -1
            }
        }
    }))
    .unwrap_or(-1)
}

/// Release a doubler and its scratch memory. Null is a no-op.
///
/// # Safety
///
/// `doubler` must be null or a pointer from `rust_doubler_init` that has not
/// been released yet.
#[no_mangle]
pub unsafe extern "C" fn rust_doubler_fin(doubler: *mut Doubler) {
    if !doubler.is_null() {
        drop(Box::from_raw(doubler));
    }
}

/// Install the stderr logger at a numeric level (0 = nothing .. 5 = all)
#[no_mangle]
pub extern "C" fn rust_doubler_log_init(level: c_int) {
    logging::init(LogLevel::from_i32(level));
}
