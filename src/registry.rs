/*
 * The wrapper cache: maps registry keys and native handles back to the live
 * managed `Control`. Keys come from a generational arena, so a key whose
 * control was unregistered never resolves to a later control that happens to
 * reuse the slot. Entries hold weak references; a wrapper that was dropped
 * without being disposed simply stops resolving, and `register` sweeps such
 * entries out once the table has grown past the last sweep.
 *
 * The registry lives inside the application context and is only reachable
 * from the UI thread (`Rc`-based, hence `!Send`), so a `RefCell` is the only
 * exclusion it needs.
 */
use crate::control::{Control, ControlInner};
use crate::error::{PlatformError, Result as PlatformResult};
use crate::types::{CallbackToken, ControlId, RawHandle};

use slotmap::SlotMap;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Weak;

const SWEEP_THRESHOLD: usize = 64;

#[derive(Debug)]
struct RegistryEntry {
    handle: RawHandle,
    control: Weak<ControlInner>,
}

#[derive(Debug)]
struct RegistryTables {
    entries: SlotMap<ControlId, RegistryEntry>,
    by_handle: HashMap<RawHandle, ControlId>,
    sweep_at: usize,
}

impl Default for RegistryTables {
    fn default() -> Self {
        Self {
            entries: SlotMap::with_key(),
            by_handle: HashMap::new(),
            sweep_at: SWEEP_THRESHOLD,
        }
    }
}

impl RegistryTables {
    // Drops entries whose wrapper is gone and moves the next sweep out to twice the survivors.
    fn sweep(&mut self) {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.control.strong_count() > 0);
        let entries = &self.entries;
        self.by_handle.retain(|_, id| entries.contains_key(*id));
        log::debug!(
            "ControlRegistry: swept {} stale entries, {} left",
            before - self.entries.len(),
            self.entries.len()
        );
        self.sweep_at = (self.entries.len() * 2).max(SWEEP_THRESHOLD);
    }
}

#[derive(Debug, Default)]
pub(crate) struct ControlRegistry {
    tables: RefCell<RegistryTables>,
}

impl ControlRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /*
     * Inserts the wrapper for `handle`. Fails if another live wrapper already
     * owns the handle; a stale entry left behind by a dropped wrapper is
     * replaced.
     */
    pub(crate) fn register(&self, handle: RawHandle, control: Weak<ControlInner>) -> PlatformResult<ControlId> {
        let mut tables = self.tables.borrow_mut();
        if let Some(existing) = tables.by_handle.get(&handle).copied() {
            let live = tables
                .entries
                .get(existing)
                .is_some_and(|entry| entry.control.strong_count() > 0);
            if live {
                return Err(PlatformError::InvalidOperation(format!(
                    "native handle {handle:?} already has a live wrapper"
                )));
            }
            log::debug!("ControlRegistry: replacing stale entry for {handle:?}");
            tables.entries.remove(existing);
        }
        if tables.entries.len() >= tables.sweep_at {
            tables.sweep();
        }
        let id = tables.entries.insert(RegistryEntry { handle, control });
        tables.by_handle.insert(handle, id);
        log::trace!("ControlRegistry: registered {handle:?} as {}", id.raw());
        Ok(id)
    }

    pub(crate) fn unregister(&self, id: ControlId) -> bool {
        let mut tables = self.tables.borrow_mut();
        let Some(entry) = tables.entries.remove(id) else {
            return false;
        };
        if tables.by_handle.get(&entry.handle) == Some(&id) {
            tables.by_handle.remove(&entry.handle);
        }
        log::trace!("ControlRegistry: unregistered {:?} ({})", entry.handle, id.raw());
        true
    }

    pub(crate) fn lookup(&self, id: ControlId) -> Option<Control> {
        let tables = self.tables.borrow();
        tables
            .entries
            .get(id)
            .and_then(|entry| entry.control.upgrade())
            .map(Control::from_inner)
    }

    pub(crate) fn lookup_handle(&self, handle: RawHandle) -> Option<Control> {
        let id = self.tables.borrow().by_handle.get(&handle).copied()?;
        self.lookup(id)
    }

    /// Resolves a native callback: the token must name a live entry registered for `handle`.
    pub(crate) fn resolve(&self, token: CallbackToken, handle: RawHandle) -> Option<Control> {
        let tables = self.tables.borrow();
        let entry = tables.entries.get(token.control_id())?;
        if entry.handle != handle {
            log::warn!(
                "ControlRegistry: token {} belongs to {:?}, not {handle:?}",
                token.raw(),
                entry.handle
            );
            return None;
        }
        entry.control.upgrade().map(Control::from_inner)
    }

    /// Entries held, stale ones included.
    pub(crate) fn entry_count(&self) -> usize {
        self.tables.borrow().entries.len()
    }

    pub(crate) fn live_count(&self) -> usize {
        self.tables
            .borrow()
            .entries
            .values()
            .filter(|entry| entry.control.strong_count() > 0)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_app;
    use crate::controls::Button;
    use crate::control::Widget;

    #[test]
    fn lookup_after_unregister_is_not_found() {
        // Arrange
        let (app, _native) = test_app();
        let button = Button::new(&app, "b").expect("button");
        let id = button.id().expect("cacheable");
        let raw = button.control().handle().expect("raw");
        // Act
        let removed = app.registry().unregister(id);
        // Assert
        assert!(removed);
        assert!(app.registry().lookup(id).is_none());
        assert!(app.registry().lookup_handle(raw).is_none());
        assert!(!app.registry().unregister(id));
    }

    #[test]
    fn second_live_wrapper_for_a_handle_is_rejected() {
        let (app, _native) = test_app();
        let button = Button::new(&app, "b").expect("button");
        let raw = button.control().handle().expect("raw");
        let result = app
            .registry()
            .register(raw, std::rc::Rc::downgrade(&button.control().inner));
        assert!(matches!(result, Err(PlatformError::InvalidOperation(_))));
    }

    #[test]
    fn token_for_another_handle_does_not_resolve() {
        let (app, _native) = test_app();
        let first = Button::new(&app, "a").expect("a");
        let second = Button::new(&app, "b").expect("b");
        let token = CallbackToken::from(first.id().expect("id"));
        let other_raw = second.control().handle().expect("raw");
        assert!(app.registry().resolve(token, other_raw).is_none());
        let own_raw = first.control().handle().expect("raw");
        assert_eq!(
            app.registry().resolve(token, own_raw).as_ref(),
            Some(first.control())
        );
    }

    #[test]
    fn dropped_wrappers_do_not_accumulate() {
        // Arrange
        let (app, _native) = test_app();
        let kept = Button::new(&app, "kept").expect("kept");
        // Act
        for _ in 0..1000 {
            let button = Button::new(&app, "b").expect("button");
            drop(button);
        }
        // Assert
        assert!(app.registry().entry_count() <= SWEEP_THRESHOLD);
        assert_eq!(app.registry().live_count(), 1);
        let raw = kept.control().handle().expect("raw");
        assert_eq!(app.control_by_handle(raw).as_ref(), Some(kept.control()));
        assert_eq!(app.control(kept.id().expect("id")).as_ref(), Some(kept.control()));
    }

    #[test]
    fn dropped_wrapper_stops_resolving() {
        let (app, _native) = test_app();
        let button = Button::new(&app, "b").expect("button");
        let id = button.id().expect("id");
        drop(button);
        assert!(app.registry().lookup(id).is_none());
        assert_eq!(app.registry().live_count(), 0);
    }
}
