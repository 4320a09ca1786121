/*
 * A two-column form: every child is shown next to a text label. The native
 * side only knows how to append and delete rows, so a form child always needs
 * a label and can never be inserted in the middle.
 */
use crate::app::Application;
use crate::collection::{AnySlot, ChildSlot, HasChildren, sealed};
use crate::control::{Control, Widget};
use crate::error::{PlatformError, Result as PlatformResult};
use crate::native::NativeToolkit;
use crate::types::{ControlClass, RawHandle};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSlot {
    pub label: String,
    pub stretchy: bool,
}

impl FormSlot {
    pub fn new(label: impl Into<String>, stretchy: bool) -> Self {
        Self {
            label: label.into(),
            stretchy,
        }
    }
}

impl sealed::Sealed for FormSlot {}

impl ChildSlot for FormSlot {
    fn default_slot() -> PlatformResult<Self> {
        Err(PlatformError::InvalidOperation(
            "form children need a label; use Form::append".to_string(),
        ))
    }

    fn native_append(&self, native: &dyn NativeToolkit, owner: RawHandle, _index: usize, child: RawHandle) -> PlatformResult<()> {
        Ok(native.form_append(owner, &self.label, child, self.stretchy)?)
    }

    fn native_insert(
        &self,
        _native: &dyn NativeToolkit,
        _owner: RawHandle,
        _index: usize,
        _sibling: Option<RawHandle>,
        _child: RawHandle,
    ) -> PlatformResult<()> {
        Err(PlatformError::InvalidOperation(
            "forms do not support inserting children".to_string(),
        ))
    }

    fn native_delete(native: &dyn NativeToolkit, owner: RawHandle, index: usize) -> PlatformResult<()> {
        Ok(native.form_delete(owner, index)?)
    }

    fn into_any(self) -> AnySlot {
        AnySlot::Form(self)
    }

    fn from_any(slot: &AnySlot) -> Option<&Self> {
        match slot {
            AnySlot::Form(slot) => Some(slot),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
    control: Control,
}

impl Form {
    pub fn new(app: &Application) -> PlatformResult<Self> {
        let control = Control::create(app, ControlClass::Form)?;
        Ok(Self { control })
    }

    pub fn append(&self, label: &str, child: &impl Widget, stretchy: bool) -> PlatformResult<()> {
        self.children().add_with(child, FormSlot::new(label, stretchy))
    }

    /// The label shown next to the child at `index`.
    pub fn label_of(&self, index: usize) -> Option<String> {
        self.children().slot(index).map(|slot| slot.label)
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

impl Widget for Form {
    fn control(&self) -> &Control {
        &self.control
    }
}

impl HasChildren for Form {
    type Slot = FormSlot;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::{Label, TextBox};
    use crate::test_support::test_app;

    #[test]
    fn labels_follow_their_rows_after_removal() {
        // Arrange
        let (app, native) = test_app();
        let form = Form::new(&app).expect("form");
        let name = TextBox::new(&app).expect("name");
        let email = TextBox::new(&app).expect("email");
        let note = Label::new(&app, "note").expect("note");
        form.append("Name", &name, false).expect("name");
        form.append("Email", &email, false).expect("email");
        form.append("Note", &note, true).expect("note");
        // Act
        form.children().remove(&name).expect("remove");
        // Assert
        let owner = form.control().handle().expect("raw");
        assert_eq!(native.child_label(owner, 0).as_deref(), Some("Email"));
        assert_eq!(form.label_of(0).as_deref(), Some("Email"));
        assert_eq!(form.label_of(1).as_deref(), Some("Note"));
        assert_eq!(email.index(), Some(0));
    }
}
