use crate::app::Application;
use crate::control::{Control, HasText, Widget};
use crate::error::Result as PlatformResult;
use crate::types::ControlClass;

/// Static text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    control: Control,
}

impl Label {
    pub fn new(app: &Application, text: &str) -> PlatformResult<Self> {
        let control = Control::create(
            app,
            ControlClass::Label {
                text: text.to_string(),
            },
        )?;
        Ok(Self { control })
    }
}

impl Widget for Label {
    fn control(&self) -> &Control {
        &self.control
    }
}

impl HasText for Label {}
