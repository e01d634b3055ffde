//! Exclusive ownership of an OS handle.
//!
//! The handle is released exactly once: either by an explicit [`OwnedHandle::close`]
//! or when the owner is dropped. Closing an already-closed handle is a no-op.

/// An OS resource that must be released exactly once.
pub trait ReleaseHandle {
    fn release(self);
}

#[derive(Debug)]
pub struct OwnedHandle<H: ReleaseHandle> {
    inner: Option<H>,
}

impl<H: ReleaseHandle> OwnedHandle<H> {
    pub fn new(handle: H) -> Self {
        Self {
            inner: Some(handle),
        }
    }

    /// A handle that was never opened ("not attached").
    pub fn closed() -> Self {
        Self { inner: None }
    }

    pub fn is_valid(&self) -> bool {
        self.inner.is_some()
    }

    pub fn get(&self) -> Option<&H> {
        self.inner.as_ref()
    }

    /// Release the handle. Safe to call repeatedly.
    pub fn close(&mut self) {
        if let Some(handle) = self.inner.take() {
            handle.release();
        }
    }
}

impl<H: ReleaseHandle> Drop for OwnedHandle<H> {
    fn drop(&mut self) {
        self.close();
    }
}
