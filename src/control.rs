/*
 * The managed node of the control tree.
 *
 * A `Control` is a cheap, reference-counted view of one native control. It
 * owns the native handle, remembers its position in its parent's child
 * collection, caches the enabled/visible state it last pushed to the native
 * side, and carries the managed event slots the native callbacks are routed
 * into. Clones compare equal and share all of that state.
 *
 * Lifetime has two exits:
 *  - `dispose` is the explicit path. It detaches the control from its parent,
 *    recursively disposes its children, removes it from the registry and
 *    finally destroys the native object. It runs at most once.
 *  - Dropping the last clone of a control that was never disposed runs the
 *    finalizer path: native children are detached from it first so the native
 *    destroy only ever sees unattached controls, then the handle destroys the
 *    native object. The registry is left alone; its entry simply stops
 *    resolving.
 */
use crate::app::Application;
use crate::collection::{self, ChildArray};
use crate::error::{PlatformError, Result as PlatformResult};
use crate::event::{ClosingEventArgs, Event};
use crate::native::NativeToolkit;
use crate::native_handle::NativeHandle;
use crate::types::{CallbackToken, ControlClass, ControlId, ControlKind, NativeEventKind, RawHandle};
use crate::window::Window;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// Payload of the managed notification raised for a native control event.
#[derive(Debug, Clone)]
pub struct Notification {
    pub sender: Control,
    pub kind: NativeEventKind,
}

// Field order matters: the handle is released before the last `Application` clone goes away.
pub(crate) struct ControlInner {
    pub(crate) handle: NativeHandle,
    pub(crate) kind: ControlKind,
    pub(crate) key: Cell<Option<ControlId>>,
    pub(crate) parent: RefCell<Weak<ControlInner>>,
    pub(crate) index: Cell<Option<usize>>,
    pub(crate) enabled: Cell<Option<bool>>,
    pub(crate) visible: Cell<Option<bool>>,
    pub(crate) disposed: Cell<bool>,
    pub(crate) children: RefCell<Option<ChildArray>>,
    pub(crate) notifications: Event<Notification>,
    pub(crate) closing: Event<ClosingEventArgs<Window>>,
    pub(crate) app: Application,
}

impl Drop for ControlInner {
    fn drop(&mut self) {
        if self.disposed.get() {
            return;
        }
        let Ok(owner) = self.handle.raw() else {
            return;
        };
        if let Some(children) = self.children.get_mut().take() {
            log::debug!("Control: finalizing {:?} {owner:?} with {} child(ren)", self.kind, children.len());
            children.release_native(self.handle.native(), owner);
        }
        // `handle` is dropped next and destroys the native object.
    }
}

#[derive(Clone)]
pub struct Control {
    pub(crate) inner: Rc<ControlInner>,
}

impl Control {
    /*
     * Creates the native control, takes ownership of its handle, and for
     * cacheable kinds registers the wrapper and wires the native callbacks
     * with the registry key as token.
     */
    pub(crate) fn create(app: &Application, class: ControlClass) -> PlatformResult<Control> {
        let kind = class.kind();
        let native = Rc::clone(app.native());
        let raw = native.new_control(&class)?;
        let handle = NativeHandle::new(native, raw)?;
        let control = Control {
            inner: Rc::new(ControlInner {
                handle,
                kind,
                key: Cell::new(None),
                parent: RefCell::new(Weak::new()),
                index: Cell::new(None),
                enabled: Cell::new(None),
                visible: Cell::new(None),
                disposed: Cell::new(false),
                children: RefCell::new(None),
                notifications: Event::new(),
                closing: Event::new(),
                app: app.clone(),
            }),
        };
        log::trace!("Control: created {kind:?} {raw:?}");

        if kind.is_cacheable() {
            let id = app.registry().register(raw, Rc::downgrade(&control.inner))?;
            control.inner.key.set(Some(id));
            let token = CallbackToken::from(id);
            for event in kind.native_events() {
                if let Err(err) = app.native().subscribe(raw, *event, token) {
                    control.inner.key.set(None);
                    app.registry().unregister(id);
                    return Err(err.into());
                }
            }
        }
        Ok(control)
    }

    pub(crate) fn from_inner(inner: Rc<ControlInner>) -> Control {
        Control { inner }
    }

    /// Registry key; `None` for non-cacheable kinds and after disposal.
    pub fn id(&self) -> Option<ControlId> {
        self.inner.key.get()
    }

    pub fn kind(&self) -> ControlKind {
        self.inner.kind
    }

    /// The raw native handle, or `InvalidHandle` once released.
    pub fn handle(&self) -> PlatformResult<RawHandle> {
        self.inner.handle.raw()
    }

    pub fn is_invalid(&self) -> bool {
        self.inner.handle.is_invalid()
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    pub fn top_level(&self) -> bool {
        self.inner.kind.is_top_level()
    }

    pub fn parent(&self) -> Option<Control> {
        self.inner.parent.borrow().upgrade().map(Control::from_inner)
    }

    /// Position in the parent's child collection.
    pub fn index(&self) -> Option<usize> {
        self.inner.index.get()
    }

    pub fn application(&self) -> &Application {
        &self.inner.app
    }

    /// Runs `handler` whenever the native side raises `kind` for this control.
    pub fn subscribe(&self, kind: NativeEventKind, mut handler: impl FnMut(&Control) + 'static) {
        self.inner.notifications.subscribe(move |notification| {
            if notification.kind == kind {
                handler(&notification.sender);
            }
        });
    }

    pub(crate) fn native(&self) -> &dyn NativeToolkit {
        self.inner.handle.native()
    }

    /*
     * Explicit disposal. Idempotent; failures are logged because there is no
     * caller left that could act on them.
     */
    pub fn dispose(&self) {
        if self.inner.disposed.get() {
            log::trace!("Control: {:?} already disposed", self.kind());
            return;
        }
        if let Some(parent) = self.parent() {
            collection::detach_from_parent(&parent, self);
        }
        self.inner.disposed.set(true);
        log::debug!("Control: disposing {:?} {:?}", self.kind(), self.inner.handle);

        if self.top_level()
            && let Err(err) = self.apply_visible(false)
        {
            log::warn!("Control: could not hide {:?} before disposal: {err}", self.inner.handle);
        }
        collection::dispose_children(self);
        if let Some(id) = self.inner.key.take() {
            self.inner.app.registry().unregister(id);
        }
        self.inner.notifications.clear();
        self.inner.closing.clear();
        if let Err(err) = self.inner.handle.release() {
            log::warn!("Control: native destroy failed for {:?}: {err}", self.kind());
        }
    }

    /// Records the new owner. Top-level controls cannot have one.
    pub(crate) fn attach(&self, owner: &Control, index: usize) -> PlatformResult<()> {
        if self.top_level() {
            return Err(PlatformError::InvalidOperation(format!(
                "a top-level {:?} cannot have a parent",
                self.kind()
            )));
        }
        *self.inner.parent.borrow_mut() = Rc::downgrade(&owner.inner);
        self.inner.index.set(Some(index));
        Ok(())
    }

    pub(crate) fn set_index(&self, index: usize) {
        self.inner.index.set(Some(index));
    }

    pub(crate) fn detach(&self) {
        *self.inner.parent.borrow_mut() = Weak::new();
        self.inner.index.set(None);
    }

    /// Whether `self` is `other` or one of its ancestors.
    pub(crate) fn is_self_or_ancestor_of(&self, other: &Control) -> bool {
        let mut current = Some(other.clone());
        while let Some(control) = current {
            if control == *self {
                return true;
            }
            current = control.parent();
        }
        false
    }

    /// Routes a native callback. The return value is the answer handed back to the native side.
    pub(crate) fn raise_native(&self, kind: NativeEventKind) -> bool {
        if self.is_invalid() {
            log::debug!("Control: ignoring {kind:?} for a released {:?}", self.kind());
            return false;
        }
        match kind {
            NativeEventKind::Closing => match Window::from_control(self) {
                Some(window) => window.handle_close_request(),
                None => {
                    log::warn!("Control: Closing raised for non-window {:?}", self.kind());
                    false
                }
            },
            _ => {
                let mut notification = Notification {
                    sender: self.clone(),
                    kind,
                };
                self.inner.notifications.raise(&mut notification);
                false
            }
        }
    }

    pub(crate) fn query_enabled(&self) -> PlatformResult<bool> {
        let enabled = self.native().enabled(self.handle()?)?;
        self.inner.enabled.set(Some(enabled));
        Ok(enabled)
    }

    pub(crate) fn apply_enabled(&self, enabled: bool) -> PlatformResult<()> {
        let raw = self.handle()?;
        if self.inner.enabled.get() == Some(enabled) {
            return Ok(());
        }
        self.native().set_enabled(raw, enabled)?;
        self.inner.enabled.set(Some(enabled));
        Ok(())
    }

    pub(crate) fn query_visible(&self) -> PlatformResult<bool> {
        let visible = self.native().visible(self.handle()?)?;
        self.inner.visible.set(Some(visible));
        Ok(visible)
    }

    pub(crate) fn apply_visible(&self, visible: bool) -> PlatformResult<()> {
        let raw = self.handle()?;
        if self.inner.visible.get() == Some(visible) {
            return Ok(());
        }
        self.native().set_visible(raw, visible)?;
        self.inner.visible.set(Some(visible));
        Ok(())
    }
}

impl PartialEq for Control {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Control {}

impl fmt::Debug for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Control")
            .field("kind", &self.inner.kind)
            .field("handle", &self.inner.handle)
            .field("index", &self.inner.index.get())
            .field("disposed", &self.inner.disposed.get())
            .finish()
    }
}

/// Anything backed by a managed `Control`.
pub trait Widget {
    fn control(&self) -> &Control;

    fn id(&self) -> Option<ControlId> {
        self.control().id()
    }

    fn is_invalid(&self) -> bool {
        self.control().is_invalid()
    }

    fn top_level(&self) -> bool {
        self.control().top_level()
    }

    fn parent(&self) -> Option<Control> {
        self.control().parent()
    }

    fn index(&self) -> Option<usize> {
        self.control().index()
    }

    fn dispose(&self) {
        self.control().dispose();
    }
}

impl Widget for Control {
    fn control(&self) -> &Control {
        self
    }
}

/*
 * Enabled state. The getter always asks the native side and refreshes the
 * cache; `enable`/`disable` skip the native call when the cache already holds
 * the requested value.
 */
pub trait Enableable: Widget {
    fn enabled(&self) -> PlatformResult<bool> {
        self.control().query_enabled()
    }

    fn set_enabled(&self, enabled: bool) -> PlatformResult<()> {
        self.control().apply_enabled(enabled)
    }

    fn enable(&self) -> PlatformResult<()> {
        self.set_enabled(true)
    }

    fn disable(&self) -> PlatformResult<()> {
        self.set_enabled(false)
    }
}

impl<T: Widget + ?Sized> Enableable for T {}

/// Visibility, cached the same way as the enabled state.
pub trait Showable: Widget {
    fn visible(&self) -> PlatformResult<bool> {
        self.control().query_visible()
    }

    fn set_visible(&self, visible: bool) -> PlatformResult<()> {
        self.control().apply_visible(visible)
    }

    fn show(&self) -> PlatformResult<()> {
        self.set_visible(true)
    }

    fn hide(&self) -> PlatformResult<()> {
        self.set_visible(false)
    }
}

impl<T: Widget + ?Sized> Showable for T {}

/// Controls whose native side carries a text.
pub trait HasText: Widget {
    fn text(&self) -> PlatformResult<String> {
        let control = self.control();
        Ok(control.native().text(control.handle()?)?)
    }

    fn set_text(&self, text: &str) -> PlatformResult<()> {
        let control = self.control();
        control.native().set_text(control.handle()?, text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::{Button, Separator, StackPanel};
    use crate::headless::NativeCall;
    use crate::test_support::test_app;
    use crate::types::Orientation;
    use std::cell::Cell;

    #[test]
    fn enable_is_skipped_when_cache_matches() {
        // Arrange
        let (app, native) = test_app();
        let button = Button::new(&app, "b").expect("button");
        let raw = button.control().handle().expect("raw");
        // Act
        button.enable().expect("first");
        button.enable().expect("second");
        button.disable().expect("third");
        // Assert
        let set_calls = native.count_calls(|call| matches!(call, NativeCall::SetEnabled(h, _) if *h == raw));
        assert_eq!(set_calls, 2);
    }

    #[test]
    fn getter_refreshes_cache_from_native() {
        let (app, native) = test_app();
        let button = Button::new(&app, "b").expect("button");
        let raw = button.control().handle().expect("raw");
        button.disable().expect("disable");
        // Changed behind the wrapper's back.
        native.set_enabled(raw, true).expect("native");
        assert!(button.enabled().expect("enabled"));
        native.clear_calls();
        button.enable().expect("enable");
        assert_eq!(native.count_calls(|call| matches!(call, NativeCall::SetEnabled(..))), 0);
    }

    #[test]
    fn dispose_is_idempotent() {
        let (app, native) = test_app();
        let button = Button::new(&app, "b").expect("button");
        let raw = button.control().handle().expect("raw");
        button.dispose();
        button.dispose();
        assert!(button.is_invalid());
        assert!(button.control().is_disposed());
        assert_eq!(native.destroy_count(raw), 1);
    }

    #[test]
    fn operations_on_a_disposed_control_fail_with_invalid_handle() {
        let (app, _native) = test_app();
        let button = Button::new(&app, "b").expect("button");
        button.dispose();
        assert!(matches!(button.enable(), Err(PlatformError::InvalidHandle(_))));
        assert!(matches!(button.text(), Err(PlatformError::InvalidHandle(_))));
    }

    thread_local! {
        static WATCHED: RefCell<Option<Application>> = const { RefCell::new(None) };
        static REGISTERED_AT_DESTROY: RefCell<Vec<(RawHandle, bool)>> = const { RefCell::new(Vec::new()) };
    }

    #[test]
    fn dispose_unregisters_before_native_destroy() {
        // Arrange
        let (app, native) = test_app();
        let button = Button::new(&app, "b").expect("button");
        let id = button.id().expect("id");
        let raw = button.control().handle().expect("raw");
        WATCHED.with(|watched| *watched.borrow_mut() = Some(app.clone()));
        native.on_destroy(|handle| {
            let registered = WATCHED.with(|watched| {
                watched
                    .borrow()
                    .as_ref()
                    .is_some_and(|app| app.control_by_handle(handle).is_some())
            });
            REGISTERED_AT_DESTROY.with(|seen| seen.borrow_mut().push((handle, registered)));
        });
        // Act
        button.dispose();
        WATCHED.with(|watched| watched.borrow_mut().take());
        // Assert
        let seen = REGISTERED_AT_DESTROY.with(|seen| seen.borrow_mut().split_off(0));
        assert_eq!(seen, vec![(raw, false)]);
        assert!(app.control(id).is_none());
        assert!(app.control_by_handle(raw).is_none());
        assert!(button.id().is_none());
    }

    #[test]
    fn separators_are_not_registered() {
        let (app, _native) = test_app();
        let separator = Separator::new(&app, Orientation::Horizontal).expect("separator");
        assert!(separator.id().is_none());
        let raw = separator.control().handle().expect("raw");
        assert!(app.control_by_handle(raw).is_none());
    }

    #[test]
    fn dropping_an_undisposed_container_detaches_children_before_destroy() {
        // Arrange
        let (app, native) = test_app();
        let panel = StackPanel::new(&app, Orientation::Vertical).expect("panel");
        let button = Button::new(&app, "b").expect("button");
        panel.append(&button, false).expect("append");
        let panel_raw = panel.control().handle().expect("panel raw");
        let button_raw = button.control().handle().expect("button raw");
        native.clear_calls();
        // Act
        drop(panel);
        // Assert
        let calls = native.calls();
        let delete = calls
            .iter()
            .position(|call| *call == NativeCall::Delete { owner: panel_raw, index: 0 })
            .expect("delete");
        let destroy = calls
            .iter()
            .position(|call| *call == NativeCall::Destroy(panel_raw))
            .expect("destroy");
        assert!(delete < destroy);
        assert!(button.parent().is_none());
        assert!(native.is_alive(button_raw));
    }

    #[test]
    fn notifications_reach_subscribers_of_that_kind_only() {
        let (app, _native) = test_app();
        let button = Button::new(&app, "b").expect("button");
        let clicks = Rc::new(Cell::new(0));
        let seen = Rc::clone(&clicks);
        button
            .control()
            .subscribe(NativeEventKind::Clicked, move |_| seen.set(seen.get() + 1));
        button.control().raise_native(NativeEventKind::Clicked);
        button.control().raise_native(NativeEventKind::TextChanged);
        assert_eq!(clicks.get(), 1);
    }

    #[test]
    fn clones_compare_equal() {
        let (app, _native) = test_app();
        let first = Button::new(&app, "a").expect("a");
        let second = Button::new(&app, "b").expect("b");
        let copy = first.control().clone();
        assert_eq!(&copy, first.control());
        assert_ne!(first.control(), second.control());
    }
}
