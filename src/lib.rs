/*
 * Provides the public entry point for the nativeui crate: a managed control
 * tree layered over an opaque native GUI toolkit. The crate owns the lifetime
 * of native handles, keeps every container's managed child list in lockstep
 * with the native one, routes native callbacks back to the right wrapper
 * through a registry, and marshals work queued from any thread onto the UI
 * thread.
 *
 * The native toolkit is reached only through the `NativeToolkit` trait.
 * `HeadlessToolkit` implements it in memory so the whole tree can be driven
 * and inspected without a display.
 */
pub mod app;
pub(crate) mod collection;
pub mod control;
pub mod controls;
pub mod error;
pub(crate) mod event;
pub mod headless;
pub mod native;
pub(crate) mod native_handle;
pub(crate) mod registry;
pub mod types;
pub mod window;

#[cfg(test)]
pub(crate) mod test_support;

pub use app::{AppState, Application, EXIT_FAILURE, EXIT_SUCCESS, MainQueue};
pub use collection::{AnySlot, ChildSlot, Children, ControlCollection, HasChildren};
pub use control::{Control, Enableable, HasText, Notification, Showable, Widget};
pub use controls::{
    Button, CheckBox, Form, FormSlot, Grid, GridSlot, Label, Separator, StackPanel, StackSlot, Tab,
    TabPage, TextBox,
};
pub use error::{NativeError, PlatformError, Result as PlatformResult};
pub use event::ClosingEventArgs;
pub use headless::{FailPoint, HeadlessToolkit};
pub use native::{NativeEvent, NativeToolkit, NativeWaker};
pub use native_handle::NativeHandle;
pub use types::{
    Align, AppConfig, CallbackToken, ControlClass, ControlId, ControlKind, GridCell, GridEdge,
    NativeEventKind, Orientation, RawHandle, WindowConfig, WindowFlag,
};
pub use window::{ContentSlot, Window};

/// The capability traits, for glob import.
pub mod prelude {
    pub use crate::collection::HasChildren;
    pub use crate::control::{Enableable, HasText, Showable, Widget};
}
