/*
 * Check boxes. The checked state lives on the native side only; `checked`
 * always asks it. User toggles arrive as native `Toggled` callbacks.
 */
use crate::app::Application;
use crate::control::{Control, HasText, Widget};
use crate::error::Result as PlatformResult;
use crate::types::{ControlClass, NativeEventKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckBox {
    control: Control,
}

impl CheckBox {
    pub fn new(app: &Application, text: &str) -> PlatformResult<Self> {
        let control = Control::create(
            app,
            ControlClass::CheckBox {
                text: text.to_string(),
            },
        )?;
        Ok(Self { control })
    }

    pub fn checked(&self) -> PlatformResult<bool> {
        Ok(self.control.native().checked(self.control.handle()?)?)
    }

    /// Programmatic changes do not raise `Toggled`.
    pub fn set_checked(&self, checked: bool) -> PlatformResult<()> {
        self.control
            .native()
            .set_checked(self.control.handle()?, checked)?;
        Ok(())
    }

    pub fn on_toggled(&self, mut handler: impl FnMut(&CheckBox) + 'static) {
        self.control.subscribe(NativeEventKind::Toggled, move |sender| {
            handler(&CheckBox {
                control: sender.clone(),
            })
        });
    }
}

impl Widget for CheckBox {
    fn control(&self) -> &Control {
        &self.control
    }
}

impl HasText for CheckBox {}
