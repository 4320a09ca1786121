/*
 * Top-level windows and the closing protocol.
 *
 * A native close request is answered in two phases. First the cancelable
 * `Closing` event is raised; any handler may veto. If nobody did, the main
 * window asks the application to shut the loop down, while any other window
 * disposes itself. The native side is always told not to destroy the window,
 * because destruction is driven from the managed side.
 *
 * A window holds at most one content child, attached through the same child
 * collection machinery as the containers with a `ContentSlot`.
 */
use crate::app::Application;
use crate::collection::{AnySlot, ChildSlot, ControlCollection, sealed};
use crate::control::{Control, Widget};
use crate::error::{PlatformError, Result as PlatformResult};
use crate::event::ClosingEventArgs;
use crate::native::NativeToolkit;
use crate::types::{ControlClass, ControlKind, NativeEventKind, RawHandle, WindowConfig, WindowFlag};

/// Slot of a window's single content child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContentSlot;

impl sealed::Sealed for ContentSlot {}

impl ChildSlot for ContentSlot {
    fn default_slot() -> PlatformResult<Self> {
        Ok(ContentSlot)
    }

    fn native_append(&self, native: &dyn NativeToolkit, owner: RawHandle, index: usize, child: RawHandle) -> PlatformResult<()> {
        if index != 0 {
            return Err(PlatformError::InvalidOperation(
                "a window holds a single child".to_string(),
            ));
        }
        Ok(native.window_set_child(owner, Some(child))?)
    }

    fn native_insert(
        &self,
        native: &dyn NativeToolkit,
        owner: RawHandle,
        index: usize,
        _sibling: Option<RawHandle>,
        child: RawHandle,
    ) -> PlatformResult<()> {
        self.native_append(native, owner, index, child)
    }

    fn native_delete(native: &dyn NativeToolkit, owner: RawHandle, _index: usize) -> PlatformResult<()> {
        Ok(native.window_set_child(owner, None)?)
    }

    fn into_any(self) -> AnySlot {
        AnySlot::Content(self)
    }

    fn from_any(slot: &AnySlot) -> Option<&Self> {
        match slot {
            AnySlot::Content(slot) => Some(slot),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    control: Control,
}

impl Window {
    pub fn new(app: &Application, config: &WindowConfig) -> PlatformResult<Self> {
        log::debug!(
            "Window: creating '{}' ({}x{}, menubar: {})",
            config.title,
            config.width,
            config.height,
            config.has_menubar
        );
        let control = Control::create(
            app,
            ControlClass::Window {
                title: config.title.clone(),
                width: config.width,
                height: config.height,
                has_menubar: config.has_menubar,
            },
        )?;
        Ok(Self { control })
    }

    pub(crate) fn from_control(control: &Control) -> Option<Self> {
        (control.kind() == ControlKind::Window).then(|| Self {
            control: control.clone(),
        })
    }

    fn raw(&self) -> PlatformResult<RawHandle> {
        self.control.handle()
    }

    pub fn title(&self) -> PlatformResult<String> {
        Ok(self.control.native().text(self.raw()?)?)
    }

    pub fn set_title(&self, title: &str) -> PlatformResult<()> {
        self.control.native().set_text(self.raw()?, title)?;
        Ok(())
    }

    pub fn content_size(&self) -> PlatformResult<(i32, i32)> {
        Ok(self.control.native().window_content_size(self.raw()?)?)
    }

    pub fn set_content_size(&self, width: i32, height: i32) -> PlatformResult<()> {
        self.control
            .native()
            .set_window_content_size(self.raw()?, width, height)?;
        Ok(())
    }

    fn flag(&self, flag: WindowFlag) -> PlatformResult<bool> {
        Ok(self.control.native().window_flag(self.raw()?, flag)?)
    }

    fn set_flag(&self, flag: WindowFlag, value: bool) -> PlatformResult<()> {
        self.control
            .native()
            .set_window_flag(self.raw()?, flag, value)?;
        Ok(())
    }

    pub fn fullscreen(&self) -> PlatformResult<bool> {
        self.flag(WindowFlag::Fullscreen)
    }

    pub fn set_fullscreen(&self, fullscreen: bool) -> PlatformResult<()> {
        self.set_flag(WindowFlag::Fullscreen, fullscreen)
    }

    pub fn borderless(&self) -> PlatformResult<bool> {
        self.flag(WindowFlag::Borderless)
    }

    pub fn set_borderless(&self, borderless: bool) -> PlatformResult<()> {
        self.set_flag(WindowFlag::Borderless, borderless)
    }

    pub fn margined(&self) -> PlatformResult<bool> {
        self.flag(WindowFlag::Margined)
    }

    pub fn set_margined(&self, margined: bool) -> PlatformResult<()> {
        self.set_flag(WindowFlag::Margined, margined)
    }

    /// Fixed when the window is created.
    pub fn has_menubar(&self) -> PlatformResult<bool> {
        self.flag(WindowFlag::HasMenubar)
    }

    fn content(&self) -> ControlCollection<'_, ContentSlot> {
        ControlCollection::new(&self.control)
    }

    pub fn child(&self) -> Option<Control> {
        self.content().get(0)
    }

    /*
     * Replaces the content. The new child is validated before the current one
     * is touched. The current content is taken out, and only disposed once the
     * new child is attached; if attaching fails it is put back.
     */
    pub fn set_child(&self, child: &impl Widget) -> PlatformResult<()> {
        let content = self.content();
        if content.get(0).as_ref() == Some(child.control()) {
            return Ok(());
        }
        content.validate(child.control())?;
        let previous = if content.is_empty() {
            None
        } else {
            Some(content.take_at(0)?)
        };
        if let Err(err) = content.add(child) {
            if let Some(previous) = previous
                && let Err(restore) = content.add(&previous)
            {
                log::warn!("Window: could not put back the previous content: {restore}");
                previous.dispose();
            }
            return Err(err);
        }
        if let Some(previous) = previous {
            previous.dispose();
        }
        Ok(())
    }

    /// Removes and disposes the content, if any.
    pub fn clear_child(&self) -> PlatformResult<()> {
        self.content().clear()
    }

    pub fn on_closing(&self, handler: impl FnMut(&mut ClosingEventArgs<Window>) + 'static) {
        self.control.inner.closing.subscribe(handler);
    }

    pub fn on_content_size_changed(&self, mut handler: impl FnMut(&Window) + 'static) {
        self.control
            .subscribe(NativeEventKind::ContentSizeChanged, move |sender| {
                if let Some(window) = Window::from_control(sender) {
                    handler(&window);
                }
            });
    }

    /// Runs the closing protocol as if the user had asked to close the window.
    pub fn close(&self) -> PlatformResult<()> {
        self.raw()?;
        self.handle_close_request();
        Ok(())
    }

    /// Answers a native close request; the result is always "do not destroy".
    pub(crate) fn handle_close_request(&self) -> bool {
        let mut args = ClosingEventArgs::new(self.clone());
        self.control.inner.closing.raise(&mut args);
        if args.is_cancelled() {
            log::debug!("Window: close of {:?} cancelled by a Closing handler.", self.control.handle());
            return false;
        }
        let app = self.control.application().clone();
        if app.is_main_window(self) {
            log::debug!("Window: main window closed, shutting down.");
            app.shutdown();
        } else {
            log::debug!("Window: disposing secondary window {:?}.", self.control.handle());
            self.control.dispose();
        }
        false
    }
}

impl Widget for Window {
    fn control(&self) -> &Control {
        &self.control
    }
}
