// Shared fixtures for the inline test modules.
use crate::app::Application;
use crate::headless::HeadlessToolkit;
use crate::native::NativeEvent;
use crate::types::AppConfig;

use std::rc::Rc;

/// A fresh application on its own headless toolkit, plus a view of that toolkit for assertions.
pub(crate) fn test_app() -> (Application, HeadlessToolkit) {
    let native = HeadlessToolkit::new();
    let app = Application::new(native.clone(), AppConfig::new("test")).expect("application");
    (app, native)
}

/*
 * Delivers everything already pending on the native side, then returns. The
 * quit action is queued last, so every event injected before the call is
 * dispatched first. Does not touch the application state machine.
 */
pub(crate) fn run_until_idle(app: &Application) {
    app.queue_main(|app| app.native().quit());
    let native = Rc::clone(app.native());
    native
        .main(&mut |event: NativeEvent| app.dispatch(event))
        .expect("native loop");
}
