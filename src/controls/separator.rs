use crate::app::Application;
use crate::control::{Control, Widget};
use crate::error::Result as PlatformResult;
use crate::types::{ControlClass, Orientation};

/*
 * A separator line. Separators never raise callbacks, so they are created
 * without a registry entry and cannot be looked up by id or handle.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Separator {
    control: Control,
}

impl Separator {
    pub fn new(app: &Application, orientation: Orientation) -> PlatformResult<Self> {
        let control = Control::create(app, ControlClass::Separator { orientation })?;
        Ok(Self { control })
    }
}

impl Widget for Separator {
    fn control(&self) -> &Control {
        &self.control
    }
}
