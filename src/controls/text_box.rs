/*
 * Single-line text entry. Edits made by the user arrive as native
 * `TextChanged` callbacks; `set_text` does not raise one.
 */
use crate::app::Application;
use crate::control::{Control, HasText, Widget};
use crate::error::Result as PlatformResult;
use crate::types::{ControlClass, NativeEventKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBox {
    control: Control,
}

impl TextBox {
    pub fn new(app: &Application) -> PlatformResult<Self> {
        let control = Control::create(app, ControlClass::TextBox)?;
        Ok(Self { control })
    }

    pub fn on_text_changed(&self, mut handler: impl FnMut(&TextBox) + 'static) {
        self.control
            .subscribe(NativeEventKind::TextChanged, move |sender| {
                handler(&TextBox {
                    control: sender.clone(),
                })
            });
    }
}

impl Widget for TextBox {
    fn control(&self) -> &Control {
        &self.control
    }
}

impl HasText for TextBox {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{run_until_idle, test_app};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn typed_text_is_reported_to_handler() {
        let (app, native) = test_app();
        let entry = TextBox::new(&app).expect("text box");
        let texts = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&texts);
        entry.on_text_changed(move |sender| seen.borrow_mut().push(sender.text().expect("text")));

        native.type_text(entry.control().handle().expect("raw"), "hello");
        run_until_idle(&app);

        assert_eq!(*texts.borrow(), vec!["hello".to_string()]);
    }
}
