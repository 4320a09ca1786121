/*
 * Ownership of exactly one native resource. A `NativeHandle` is created from
 * the raw value a native "new control" call returned and releases it exactly
 * once: either explicitly through `release` during disposal, or from `Drop`
 * when the owner was never disposed. After release every accessor fails with
 * `InvalidHandle`, so use-after-free turns into a deterministic error instead
 * of a call into the native toolkit with a dangling value.
 */
use crate::error::{NativeResult, PlatformError, Result as PlatformResult};
use crate::native::NativeToolkit;
use crate::types::RawHandle;

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

pub struct NativeHandle {
    raw: Cell<RawHandle>,
    native: Rc<dyn NativeToolkit>,
}

impl NativeHandle {
    pub(crate) fn new(native: Rc<dyn NativeToolkit>, raw: RawHandle) -> PlatformResult<Self> {
        if raw.is_null() {
            return Err(PlatformError::InvalidHandle(
                "native toolkit returned a null handle".to_string(),
            ));
        }
        Ok(Self {
            raw: Cell::new(raw),
            native,
        })
    }

    pub fn is_invalid(&self) -> bool {
        self.raw.get().is_null()
    }

    /// The raw value, or `InvalidHandle` once released.
    pub fn raw(&self) -> PlatformResult<RawHandle> {
        let raw = self.raw.get();
        if raw.is_null() {
            Err(PlatformError::InvalidHandle(
                "native handle has already been released".to_string(),
            ))
        } else {
            Ok(raw)
        }
    }

    pub(crate) fn native(&self) -> &dyn NativeToolkit {
        &*self.native
    }

    /*
     * Marks the handle invalid and destroys the native object. Returns
     * `Ok(false)` when it was already released. The handle stays invalid even
     * if the native destroy fails, so the destroy is never attempted twice.
     */
    pub(crate) fn release(&self) -> NativeResult<bool> {
        let raw = self.raw.replace(RawHandle::NULL);
        if raw.is_null() {
            return Ok(false);
        }
        log::trace!("NativeHandle: destroying native object {raw:?}");
        self.native.destroy(raw)?;
        Ok(true)
    }
}

impl Drop for NativeHandle {
    fn drop(&mut self) {
        if self.is_invalid() {
            return;
        }
        let raw = self.raw.get();
        log::debug!("NativeHandle: finalizing unreleased native object {raw:?}");
        if let Err(err) = self.release() {
            log::warn!("NativeHandle: finalizer could not destroy {raw:?}: {err}");
        }
    }
}

impl fmt::Debug for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NativeHandle").field(&self.raw.get()).finish()
    }
}
