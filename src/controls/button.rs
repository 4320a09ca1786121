/*
 * Push buttons. Clicks arrive as native `Clicked` callbacks routed through the
 * registry and are raised to the handlers registered with `on_clicked`.
 */
use crate::app::Application;
use crate::control::{Control, HasText, Widget};
use crate::error::Result as PlatformResult;
use crate::types::{ControlClass, NativeEventKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    control: Control,
}

impl Button {
    pub fn new(app: &Application, text: &str) -> PlatformResult<Self> {
        log::debug!("Button: creating '{text}'");
        let control = Control::create(
            app,
            ControlClass::Button {
                text: text.to_string(),
            },
        )?;
        Ok(Self { control })
    }

    pub fn on_clicked(&self, mut handler: impl FnMut(&Button) + 'static) {
        self.control.subscribe(NativeEventKind::Clicked, move |sender| {
            handler(&Button {
                control: sender.clone(),
            })
        });
    }
}

impl Widget for Button {
    fn control(&self) -> &Control {
        &self.control
    }
}

impl HasText for Button {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{run_until_idle, test_app};
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn click_reaches_handler_through_event_loop() {
        // Arrange
        let (app, native) = test_app();
        let button = Button::new(&app, "OK").expect("button");
        let clicks = Rc::new(Cell::new(0));
        let seen = Rc::clone(&clicks);
        button.on_clicked(move |_| seen.set(seen.get() + 1));
        let raw = button.control().handle().expect("raw");
        // Act
        assert!(native.click(raw));
        run_until_idle(&app);
        // Assert
        assert_eq!(clicks.get(), 1);
    }

    #[test]
    fn text_round_trips_through_native() {
        let (app, _native) = test_app();
        let button = Button::new(&app, "OK").expect("button");
        assert_eq!(button.text().expect("text"), "OK");
        button.set_text("Cancel").expect("set");
        assert_eq!(button.text().expect("text"), "Cancel");
    }
}
