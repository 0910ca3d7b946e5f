//! Shared engine context: allocator and CPU capabilities.

use std::sync::Arc;

use crate::kernels;
use crate::memory::{Allocator, SystemAllocator};

/// State shared by every doubler created from it
#[derive(Clone)]
pub struct Context {
    allocator: Arc<dyn Allocator>,
    has_sse41: bool,
    use_sse41: bool,
}

impl Context {
    /// Context on the system heap with vector kernels enabled when available
    pub fn new() -> Self {
        Self::with_allocator(Arc::new(SystemAllocator))
    }

    pub fn with_allocator(allocator: Arc<dyn Allocator>) -> Self {
        let has_sse41 = kernels::simd_available();
        log::debug!("context created (sse4.1: {})", has_sse41);
        Self {
            allocator,
            has_sse41,
            use_sse41: has_sse41,
        }
    }

    /// Enable or disable vector kernels for doublers created afterwards.
    ///
    /// Enabling has no effect on a CPU without SSE4.1. Returns whether vector
    /// kernels are now in use.
    pub fn force_simd(&mut self, enable: bool) -> bool {
        self.use_sse41 = self.has_sse41 && enable;
        self.use_sse41
    }

    pub fn cpu_supports_sse41(&self) -> bool {
        self.has_sse41
    }

    pub fn simd_enabled(&self) -> bool {
        self.use_sse41
    }

    pub fn allocator(&self) -> Arc<dyn Allocator> {
        Arc::clone(&self.allocator)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("has_sse41", &self.has_sse41)
            .field("use_sse41", &self.use_sse41)
            .finish()
    }
}
