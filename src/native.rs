/*
 * The call contract between the managed control layer and a native GUI toolkit.
 *
 * Every managed operation maps one-to-one onto an entry point of
 * `NativeToolkit` taking a raw handle plus primitive arguments. Strings are
 * returned as owned `String`s, so nothing handed back by the native side is
 * retained by reference. Native callbacks reach the managed side as
 * `NativeEvent`s passed to the dispatcher given to `NativeToolkit::main`; each
 * carries the token registered for it, which the trampoline resolves through
 * the control registry.
 *
 * All methods except those on `NativeWaker` are only ever called on the UI
 * thread that runs the loop.
 */
use crate::error::NativeResult;
use crate::types::{CallbackToken, ControlClass, GridCell, GridEdge, NativeEventKind, RawHandle, WindowFlag};

use std::sync::Arc;

/// A unit of native callback delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeEvent {
    /// A queued action is ready to run; one action per wakeup.
    Wakeup,
    /// The user asked the whole application to quit (e.g. a Quit menu item).
    ShouldQuit,
    /// A control raised a notification.
    Control {
        handle: RawHandle,
        token: CallbackToken,
        kind: NativeEventKind,
    },
}

/// Thread-safe half of the toolkit: asks the UI loop to run the queue trampoline once.
pub trait NativeWaker: Send + Sync {
    fn wake(&self);
}

pub trait NativeToolkit {
    // Lifecycle and event loop.

    fn init(&self) -> NativeResult<()>;
    fn is_initialized(&self) -> bool;
    fn uninit(&self);
    /// Blocks until `quit` is called. The dispatcher's return value is the native
    /// boolean answer for events that expect one (`ShouldQuit`, `Closing`).
    fn main(&self, dispatch: &mut dyn FnMut(NativeEvent) -> bool) -> NativeResult<()>;
    fn quit(&self);
    fn waker(&self) -> Arc<dyn NativeWaker>;
    fn on_should_quit(&self) -> NativeResult<()>;
    fn subscribe(&self, handle: RawHandle, kind: NativeEventKind, token: CallbackToken) -> NativeResult<()>;

    // Control lifecycle and common properties.

    fn new_control(&self, class: &ControlClass) -> NativeResult<RawHandle>;
    fn destroy(&self, handle: RawHandle) -> NativeResult<()>;
    fn enabled(&self, handle: RawHandle) -> NativeResult<bool>;
    fn set_enabled(&self, handle: RawHandle, enabled: bool) -> NativeResult<()>;
    fn visible(&self, handle: RawHandle) -> NativeResult<bool>;
    fn set_visible(&self, handle: RawHandle, visible: bool) -> NativeResult<()>;
    fn text(&self, handle: RawHandle) -> NativeResult<String>;
    fn set_text(&self, handle: RawHandle, text: &str) -> NativeResult<()>;
    fn checked(&self, handle: RawHandle) -> NativeResult<bool>;
    fn set_checked(&self, handle: RawHandle, checked: bool) -> NativeResult<()>;
    fn padded(&self, handle: RawHandle) -> NativeResult<bool>;
    fn set_padded(&self, handle: RawHandle, padded: bool) -> NativeResult<()>;

    // Windows.

    fn window_content_size(&self, window: RawHandle) -> NativeResult<(i32, i32)>;
    fn set_window_content_size(&self, window: RawHandle, width: i32, height: i32) -> NativeResult<()>;
    fn window_flag(&self, window: RawHandle, flag: WindowFlag) -> NativeResult<bool>;
    fn set_window_flag(&self, window: RawHandle, flag: WindowFlag, value: bool) -> NativeResult<()>;
    fn window_set_child(&self, window: RawHandle, child: Option<RawHandle>) -> NativeResult<()>;

    // Stack panels (boxes).

    fn box_append(&self, owner: RawHandle, child: RawHandle, stretchy: bool) -> NativeResult<()>;
    fn box_insert(&self, owner: RawHandle, index: usize, child: RawHandle, stretchy: bool) -> NativeResult<()>;
    fn box_delete(&self, owner: RawHandle, index: usize) -> NativeResult<()>;

    // Forms.

    fn form_append(&self, owner: RawHandle, label: &str, child: RawHandle, stretchy: bool) -> NativeResult<()>;
    fn form_delete(&self, owner: RawHandle, index: usize) -> NativeResult<()>;

    // Grids.

    fn grid_append(&self, owner: RawHandle, child: RawHandle, cell: &GridCell) -> NativeResult<()>;
    /// Inserts `child` directly before `existing` in the child order, placed against `edge` of it.
    fn grid_insert_at(
        &self,
        owner: RawHandle,
        child: RawHandle,
        existing: RawHandle,
        edge: GridEdge,
        cell: &GridCell,
    ) -> NativeResult<()>;
    fn grid_delete(&self, owner: RawHandle, index: usize) -> NativeResult<()>;

    // Tabs.

    fn tab_append(&self, owner: RawHandle, name: &str, child: RawHandle) -> NativeResult<()>;
    fn tab_insert_at(&self, owner: RawHandle, name: &str, index: usize, child: RawHandle) -> NativeResult<()>;
    fn tab_delete(&self, owner: RawHandle, index: usize) -> NativeResult<()>;
    fn tab_margined(&self, owner: RawHandle, page: usize) -> NativeResult<bool>;
    fn tab_set_margined(&self, owner: RawHandle, page: usize, margined: bool) -> NativeResult<()>;
}
