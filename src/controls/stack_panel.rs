/*
 * A box that lays its children out in a single row or column. Children can
 * be appended or inserted anywhere; each one carries a `stretchy` flag telling
 * the native side whether it takes up spare room.
 */
use crate::app::Application;
use crate::collection::{AnySlot, ChildSlot, HasChildren, sealed};
use crate::control::{Control, Widget};
use crate::error::Result as PlatformResult;
use crate::native::NativeToolkit;
use crate::types::{ControlClass, Orientation, RawHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StackSlot {
    pub stretchy: bool,
}

impl StackSlot {
    pub fn new(stretchy: bool) -> Self {
        Self { stretchy }
    }
}

impl sealed::Sealed for StackSlot {}

impl ChildSlot for StackSlot {
    fn default_slot() -> PlatformResult<Self> {
        Ok(Self::default())
    }

    fn native_append(&self, native: &dyn NativeToolkit, owner: RawHandle, _index: usize, child: RawHandle) -> PlatformResult<()> {
        Ok(native.box_append(owner, child, self.stretchy)?)
    }

    fn native_insert(
        &self,
        native: &dyn NativeToolkit,
        owner: RawHandle,
        index: usize,
        _sibling: Option<RawHandle>,
        child: RawHandle,
    ) -> PlatformResult<()> {
        Ok(native.box_insert(owner, index, child, self.stretchy)?)
    }

    fn native_delete(native: &dyn NativeToolkit, owner: RawHandle, index: usize) -> PlatformResult<()> {
        Ok(native.box_delete(owner, index)?)
    }

    fn into_any(self) -> AnySlot {
        AnySlot::Stack(self)
    }

    fn from_any(slot: &AnySlot) -> Option<&Self> {
        match slot {
            AnySlot::Stack(slot) => Some(slot),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackPanel {
    control: Control,
    orientation: Orientation,
}

impl StackPanel {
    pub fn new(app: &Application, orientation: Orientation) -> PlatformResult<Self> {
        let control = Control::create(app, ControlClass::StackPanel { orientation })?;
        Ok(Self {
            control,
            orientation,
        })
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn append(&self, child: &impl Widget, stretchy: bool) -> PlatformResult<()> {
        self.children().add_with(child, StackSlot::new(stretchy))
    }

    pub fn insert(&self, index: usize, child: &impl Widget, stretchy: bool) -> PlatformResult<()> {
        self.children()
            .insert_with(index, child, StackSlot::new(stretchy))
    }

    pub fn padded(&self) -> PlatformResult<bool> {
        Ok(self.control.native().padded(self.control.handle()?)?)
    }

    pub fn set_padded(&self, padded: bool) -> PlatformResult<()> {
        self.control
            .native()
            .set_padded(self.control.handle()?, padded)?;
        Ok(())
    }
}

impl Widget for StackPanel {
    fn control(&self) -> &Control {
        &self.control
    }
}

impl HasChildren for StackPanel {
    type Slot = StackSlot;
}
