/*
 * The application context: native toolkit initialization, the control
 * registry, the cross-thread action queue, the main window and the blocking
 * event loop.
 *
 * `Application` is a cheap handle onto a shared `UiContext`. It is built on
 * `Rc` and therefore stays on the thread that created it, which is the UI
 * thread. The one piece that crosses threads is the action queue: a
 * `MainQueue` handle (`Send + Sync`) appends boxed actions under a mutex and
 * wakes the native loop, which then runs exactly one action per wakeup on the
 * UI thread, in the order they were queued.
 *
 * At most one application can be initialized on a native toolkit at a time.
 * Disposing the application, or dropping its last handle, uninitializes the
 * toolkit and makes room for the next one.
 */
use crate::control::{Control, ControlInner, Showable, Widget};
use crate::error::{PlatformError, Result as PlatformResult};
use crate::event::{ClosingEventArgs, Event};
use crate::native::{NativeEvent, NativeToolkit, NativeWaker};
use crate::registry::ControlRegistry;
use crate::types::{AppConfig, ControlId, RawHandle};
use crate::window::Window;

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Exit code of a loop that ended through shutdown or an accepted quit request.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code of a run that could not start, or whose loop failed or panicked.
pub const EXIT_FAILURE: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Initialized,
    Running,
    Terminated,
}

type QueuedAction = Box<dyn FnOnce(&Application) + Send>;

struct ActionQueue {
    actions: Mutex<VecDeque<QueuedAction>>,
    waker: Arc<dyn NativeWaker>,
}

impl ActionQueue {
    fn new(waker: Arc<dyn NativeWaker>) -> Self {
        Self {
            actions: Mutex::new(VecDeque::new()),
            waker,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<QueuedAction>> {
        self.actions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push_back(&self, action: QueuedAction) {
        self.lock().push_back(action);
        self.waker.wake();
    }

    fn push_front(&self, action: QueuedAction) {
        self.lock().push_front(action);
        self.waker.wake();
    }

    fn pop(&self) -> Option<QueuedAction> {
        self.lock().pop_front()
    }

    fn len(&self) -> usize {
        self.lock().len()
    }
}

/// Thread-safe handle for queueing work onto the UI thread.
#[derive(Clone)]
pub struct MainQueue {
    queue: Arc<ActionQueue>,
}

impl MainQueue {
    /// Queues `action` to run on the UI thread. Never blocks on the loop.
    pub fn queue_main(&self, action: impl FnOnce(&Application) + Send + 'static) {
        self.queue.push_back(Box::new(action));
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl fmt::Debug for MainQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MainQueue")
            .field("pending", &self.pending())
            .finish()
    }
}

struct UiContext {
    native: Rc<dyn NativeToolkit>,
    registry: ControlRegistry,
    queue: Arc<ActionQueue>,
    config: AppConfig,
    state: Cell<AppState>,
    main_window: RefCell<Weak<ControlInner>>,
    closing: Event<ClosingEventArgs<Application>>,
    owns_native: Cell<bool>,
    dispose_requested: Cell<bool>,
}

impl Drop for UiContext {
    fn drop(&mut self) {
        if self.owns_native.replace(false) {
            log::debug!("Application: last handle dropped, uninitializing '{}'", self.config.app_name);
            self.native.uninit();
        }
    }
}

#[derive(Clone)]
pub struct Application {
    ctx: Rc<UiContext>,
}

impl Application {
    /// Initializes `native` and wires the should-quit callback.
    pub fn new(native: impl NativeToolkit + 'static, config: AppConfig) -> PlatformResult<Self> {
        Self::with_native(Rc::new(native), config)
    }

    pub fn with_native(native: Rc<dyn NativeToolkit>, config: AppConfig) -> PlatformResult<Self> {
        log::debug!("Application: initializing '{}'", config.app_name);
        if native.is_initialized() {
            log::error!("Application: toolkit already initialized by another application");
            return Err(PlatformError::ApplicationInitialization(
                "an application is already initialized on this toolkit".to_string(),
            ));
        }
        if let Err(err) = native.init() {
            log::error!("Application: native init failed: {err}");
            return Err(PlatformError::ApplicationInitialization(err.to_string()));
        }
        if let Err(err) = native.on_should_quit() {
            log::error!("Application: could not wire the should-quit callback: {err}");
            native.uninit();
            return Err(PlatformError::ApplicationInitialization(err.to_string()));
        }

        let queue = Arc::new(ActionQueue::new(native.waker()));
        Ok(Self {
            ctx: Rc::new(UiContext {
                native,
                registry: ControlRegistry::new(),
                queue,
                config,
                state: Cell::new(AppState::Initialized),
                main_window: RefCell::new(Weak::new()),
                closing: Event::new(),
                owns_native: Cell::new(true),
                dispose_requested: Cell::new(false),
            }),
        })
    }

    pub fn state(&self) -> AppState {
        self.ctx.state.get()
    }

    pub fn config(&self) -> &AppConfig {
        &self.ctx.config
    }

    /// Whether this context has released the native toolkit.
    pub fn is_disposed(&self) -> bool {
        !self.ctx.owns_native.get()
    }

    pub fn ptr_eq(&self, other: &Application) -> bool {
        Rc::ptr_eq(&self.ctx, &other.ctx)
    }

    pub(crate) fn native(&self) -> &Rc<dyn NativeToolkit> {
        &self.ctx.native
    }

    pub(crate) fn registry(&self) -> &ControlRegistry {
        &self.ctx.registry
    }

    /*
     * Runs the native loop with `window` as the main window and blocks until
     * it exits. Returns `EXIT_SUCCESS` after a shutdown or an accepted quit
     * request, `EXIT_FAILURE` if the run could not start or the loop failed
     * or panicked. The main window is disposed afterwards in every case.
     */
    pub fn run(&self, window: &Window) -> i32 {
        let state = self.state();
        if state != AppState::Initialized {
            log::error!("Application: run called in state {state:?}");
            return EXIT_FAILURE;
        }
        if window.is_invalid() {
            log::error!("Application: run called with a disposed main window");
            return EXIT_FAILURE;
        }
        if !window.control().application().ptr_eq(self) {
            log::error!("Application: main window belongs to another application");
            return EXIT_FAILURE;
        }

        *self.ctx.main_window.borrow_mut() = Rc::downgrade(&window.control().inner);
        self.ctx.queue.push_front(Box::new(|app: &Application| {
            if let Some(main) = app.main_window()
                && let Err(err) = main.show()
            {
                log::warn!("Application: could not show the main window: {err}");
            }
        }));

        self.ctx.state.set(AppState::Running);
        log::debug!("Application: entering the native loop for '{}'", self.ctx.config.app_name);
        let native = Rc::clone(&self.ctx.native);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            native.main(&mut |event: NativeEvent| self.dispatch(event))
        }));
        self.ctx.state.set(AppState::Terminated);

        let code = match outcome {
            Ok(Ok(())) => {
                log::debug!("Application: native loop exited normally");
                EXIT_SUCCESS
            }
            Ok(Err(err)) => {
                log::error!("Application: native loop failed: {err}");
                EXIT_FAILURE
            }
            Err(payload) => {
                log::error!("Application: native loop aborted by a panic: {}", panic_message(&*payload));
                EXIT_FAILURE
            }
        };

        if let Some(main) = self.main_window() {
            main.dispose();
        }
        if self.ctx.dispose_requested.get() {
            self.dispose();
        }
        code
    }

    pub fn queue_main(&self, action: impl FnOnce(&Application) + Send + 'static) {
        self.ctx.queue.push_back(Box::new(action));
    }

    pub fn queue_handle(&self) -> MainQueue {
        MainQueue {
            queue: Arc::clone(&self.ctx.queue),
        }
    }

    pub fn pending_actions(&self) -> usize {
        self.ctx.queue.len()
    }

    /// Asks the native loop to exit.
    pub fn shutdown(&self) {
        log::debug!("Application: shutdown requested");
        self.ctx.native.quit();
    }

    /// Subscribes to the cancelable should-quit request.
    pub fn on_closing(&self, handler: impl FnMut(&mut ClosingEventArgs<Application>) + 'static) {
        self.ctx.closing.subscribe(handler);
    }

    pub fn main_window(&self) -> Option<Window> {
        let inner = self.ctx.main_window.borrow().upgrade()?;
        Window::from_control(&Control::from_inner(inner))
    }

    pub fn is_main_window(&self, window: &Window) -> bool {
        std::ptr::eq(
            self.ctx.main_window.borrow().as_ptr(),
            Rc::as_ptr(&window.control().inner),
        )
    }

    /// The live control registered under `id`.
    pub fn control(&self, id: ControlId) -> Option<Control> {
        self.ctx.registry.lookup(id)
    }

    pub fn control_by_handle(&self, handle: RawHandle) -> Option<Control> {
        self.ctx.registry.lookup_handle(handle)
    }

    pub fn live_controls(&self) -> usize {
        self.ctx.registry.live_count()
    }

    /*
     * Idempotent. Disposes the main window, drops the should-quit handlers and
     * uninitializes the native toolkit. Called from inside the running loop it
     * only requests shutdown; the disposal happens once `run` returns.
     */
    pub fn dispose(&self) {
        if self.is_disposed() {
            return;
        }
        if self.state() == AppState::Running {
            log::debug!("Application: dispose requested while running, deferring until the loop exits");
            self.ctx.dispose_requested.set(true);
            self.shutdown();
            return;
        }
        log::debug!("Application: disposing '{}'", self.ctx.config.app_name);
        if let Some(main) = self.main_window() {
            main.dispose();
        }
        self.ctx.state.set(AppState::Terminated);
        self.ctx.closing.clear();
        let live = self.ctx.registry.live_count();
        if live > 0 {
            log::warn!("Application: disposing with {live} live control(s) left");
        }
        self.ctx.owns_native.set(false);
        self.ctx.native.uninit();
    }

    /// Routes one native event. The return value is the answer handed back to the native side.
    pub(crate) fn dispatch(&self, event: NativeEvent) -> bool {
        match event {
            NativeEvent::Wakeup => {
                match self.ctx.queue.pop() {
                    Some(action) => action(self),
                    None => log::trace!("Application: wakeup with an empty queue"),
                }
                false
            }
            NativeEvent::ShouldQuit => {
                let mut args = ClosingEventArgs::new(self.clone());
                self.ctx.closing.raise(&mut args);
                if args.is_cancelled() {
                    log::debug!("Application: quit request cancelled by a Closing handler");
                    false
                } else {
                    log::debug!("Application: quit request accepted");
                    true
                }
            }
            NativeEvent::Control { handle, token, kind } => match self.ctx.registry.resolve(token, handle) {
                Some(control) => control.raise_native(kind),
                None => {
                    log::warn!(
                        "Application: dropping {kind:?} for {handle:?}, token {} has no live control",
                        token.raw()
                    );
                    false
                }
            },
        }
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("app_name", &self.ctx.config.app_name)
            .field("state", &self.state())
            .field("live_controls", &self.live_controls())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
