/*
 * Managed event slots. Handlers are taken out of the slot while they run so a
 * handler may subscribe further handlers, or dispose the control that raised
 * the event, without re-entering a held borrow. A `clear` issued while the
 * handlers run wins: they are dropped instead of being put back.
 */
use std::cell::{Cell, RefCell};
use std::fmt;

type Handler<A> = Box<dyn FnMut(&mut A)>;

pub(crate) struct Event<A> {
    handlers: RefCell<Vec<Handler<A>>>,
    cleared: Cell<u64>,
}

impl<A> Event<A> {
    pub(crate) fn new() -> Self {
        Self {
            handlers: RefCell::new(Vec::new()),
            cleared: Cell::new(0),
        }
    }

    pub(crate) fn subscribe(&self, handler: impl FnMut(&mut A) + 'static) {
        self.handlers.borrow_mut().push(Box::new(handler));
    }

    pub(crate) fn len(&self) -> usize {
        self.handlers.borrow().len()
    }

    pub(crate) fn raise(&self, args: &mut A) {
        let generation = self.cleared.get();
        let mut running = std::mem::take(&mut *self.handlers.borrow_mut());
        for handler in running.iter_mut() {
            handler(args);
        }
        if self.cleared.get() != generation {
            return;
        }
        let mut slot = self.handlers.borrow_mut();
        let added_meanwhile = std::mem::replace(&mut *slot, running);
        slot.extend(added_meanwhile);
    }

    pub(crate) fn clear(&self) {
        self.cleared.set(self.cleared.get().wrapping_add(1));
        self.handlers.borrow_mut().clear();
    }
}

impl<A> fmt::Debug for Event<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event").field("handlers", &self.len()).finish()
    }
}

/// Arguments of a cancelable `Closing` event raised by `S`.
#[derive(Debug)]
pub struct ClosingEventArgs<S> {
    sender: S,
    cancel: bool,
}

impl<S> ClosingEventArgs<S> {
    pub(crate) fn new(sender: S) -> Self {
        Self {
            sender,
            cancel: false,
        }
    }

    pub fn sender(&self) -> &S {
        &self.sender
    }

    pub fn cancel(&mut self) {
        self.cancel = true;
    }

    pub fn set_cancel(&mut self, cancel: bool) {
        self.cancel = cancel;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel
    }
}
