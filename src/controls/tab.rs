/*
 * A tab control: every child is a page with a name. Page margins are a native
 * per-page attribute; the slot's `margined` flag is applied right after the
 * page is attached, later changes go straight to the native side.
 */
use crate::app::Application;
use crate::collection::{AnySlot, ChildSlot, HasChildren, sealed};
use crate::control::{Control, Widget};
use crate::error::{PlatformError, Result as PlatformResult};
use crate::native::NativeToolkit;
use crate::types::{ControlClass, RawHandle};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TabPage {
    pub name: String,
    pub margined: bool,
}

impl TabPage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            margined: false,
        }
    }

    pub fn margined(mut self, margined: bool) -> Self {
        self.margined = margined;
        self
    }

    // A page whose margin cannot be applied is taken out again so the native page list stays in step.
    fn apply_margin(&self, native: &dyn NativeToolkit, owner: RawHandle, index: usize) -> PlatformResult<()> {
        if !self.margined {
            return Ok(());
        }
        if let Err(err) = native.tab_set_margined(owner, index, true) {
            if let Err(rollback) = native.tab_delete(owner, index) {
                log::warn!("Tab: could not take back page {index} of {owner:?}: {rollback}");
            }
            return Err(err.into());
        }
        Ok(())
    }
}

impl sealed::Sealed for TabPage {}

impl ChildSlot for TabPage {
    fn default_slot() -> PlatformResult<Self> {
        Ok(Self::default())
    }

    fn native_append(&self, native: &dyn NativeToolkit, owner: RawHandle, index: usize, child: RawHandle) -> PlatformResult<()> {
        native.tab_append(owner, &self.name, child)?;
        self.apply_margin(native, owner, index)
    }

    fn native_insert(
        &self,
        native: &dyn NativeToolkit,
        owner: RawHandle,
        index: usize,
        _sibling: Option<RawHandle>,
        child: RawHandle,
    ) -> PlatformResult<()> {
        native.tab_insert_at(owner, &self.name, index, child)?;
        self.apply_margin(native, owner, index)
    }

    fn native_delete(native: &dyn NativeToolkit, owner: RawHandle, index: usize) -> PlatformResult<()> {
        Ok(native.tab_delete(owner, index)?)
    }

    fn into_any(self) -> AnySlot {
        AnySlot::Tab(self)
    }

    fn from_any(slot: &AnySlot) -> Option<&Self> {
        match slot {
            AnySlot::Tab(slot) => Some(slot),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    control: Control,
}

impl Tab {
    pub fn new(app: &Application) -> PlatformResult<Self> {
        let control = Control::create(app, ControlClass::Tab)?;
        Ok(Self { control })
    }

    pub fn append(&self, name: &str, child: &impl Widget) -> PlatformResult<()> {
        self.children().add_with(child, TabPage::new(name))
    }

    pub fn insert_at(&self, name: &str, index: usize, child: &impl Widget) -> PlatformResult<()> {
        self.children().insert_with(index, child, TabPage::new(name))
    }

    pub fn page_name(&self, index: usize) -> Option<String> {
        self.children().slot(index).map(|page| page.name)
    }

    pub fn margined(&self, index: usize) -> PlatformResult<bool> {
        let len = self.children().count();
        if index >= len {
            return Err(PlatformError::IndexOutOfRange { index, len });
        }
        Ok(self.control.native().tab_margined(self.control.handle()?, index)?)
    }

    pub fn set_margined(&self, index: usize, margined: bool) -> PlatformResult<()> {
        let len = self.children().count();
        if index >= len {
            return Err(PlatformError::IndexOutOfRange { index, len });
        }
        self.control
            .native()
            .tab_set_margined(self.control.handle()?, index, margined)?;
        Ok(())
    }
}

impl Widget for Tab {
    fn control(&self) -> &Control {
        &self.control
    }
}

impl HasChildren for Tab {
    type Slot = TabPage;
}
