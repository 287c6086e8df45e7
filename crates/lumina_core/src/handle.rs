//! Strongly-typed render handles.
//!
//! Thin `Copy` wrappers around a `u32` index. Using distinct newtypes prevents
//! accidentally mixing up stage, subpass and pipeline keys when indexing the
//! draw registry.
//!
//! Handles are produced by a [`HandleAllocator`], an explicitly constructed
//! context object (one per engine instance). Allocation is monotonic: an index
//! is never handed out twice by the same allocator.

use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU32, Ordering};

/// Common behaviour of the small-integer handle types.
pub trait Handle: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static {
    /// Short name used in diagnostics.
    const KIND: &'static str;

    /// Wraps a raw index.
    fn from_raw(raw: u32) -> Self;

    /// Raw index.
    fn raw(self) -> u32;

    /// Raw index as `usize`, for indexing tables.
    #[inline]
    fn index(self) -> usize {
        self.raw() as usize
    }
}

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            /// Creates a handle from a raw index.
            #[inline]
            #[must_use]
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }
        }

        impl Handle for $name {
            const KIND: &'static str = $kind;

            #[inline]
            fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            #[inline]
            fn raw(self) -> u32 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", $kind, self.0)
            }
        }
    };
}

define_handle!(
    /// A logical phase of frame rendering (shadow pass, opaque pass, ...).
    ///
    /// Stages are the nodes of the render graph.
    RenderStage,
    "stage"
);

define_handle!(
    /// A subdivision of a render stage. Pure namespacing key, no ordering.
    SubPass,
    "subpass"
);

define_handle!(
    /// A GPU pipeline configuration, used as a draw bucket key.
    Pipeline,
    "pipeline"
);

/// Thread-safe monotonic allocator for one handle kind.
pub struct HandleAllocator<H: Handle> {
    next: AtomicU32,
    _marker: PhantomData<fn() -> H>,
}

impl<H: Handle> Default for HandleAllocator<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Handle> fmt::Debug for HandleAllocator<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleAllocator")
            .field("kind", &H::KIND)
            .field("allocated", &self.allocated())
            .finish()
    }
}

impl<H: Handle> HandleAllocator<H> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: AtomicU32::new(0),
            _marker: PhantomData,
        }
    }

    /// Returns a fresh, never previously returned handle.
    pub fn allocate(&self) -> H {
        let raw = self.next.fetch_add(1, Ordering::Relaxed);
        log::trace!("Allocated {} #{}", H::KIND, raw);
        H::from_raw(raw)
    }

    /// Number of handles handed out so far.
    #[inline]
    #[must_use]
    pub fn allocated(&self) -> u32 {
        self.next.load(Ordering::Relaxed)
    }
}

/// The three allocators an engine instance needs for draw routing.
#[derive(Debug, Default)]
pub struct HandleRegistry {
    pub stages: HandleAllocator<RenderStage>,
    pub subpasses: HandleAllocator<SubPass>,
    pub pipelines: HandleAllocator<Pipeline>,
}

impl HandleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
