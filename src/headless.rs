/*
 * An in-memory `NativeToolkit`. It keeps a table of native nodes with their
 * native child lists, records every mutating call so callers can assert on the
 * exact native traffic, and runs a blocking event loop fed by a condition
 * variable. Events can be injected from any thread (`click`, `request_close`,
 * `request_quit`, ...); they are only delivered when the managed side has
 * registered a callback for them, mirroring how a real toolkit behaves.
 *
 * The native-side rules a real toolkit enforces are enforced here as errors:
 * unknown handles, destroying a control that is still attached to a parent,
 * attaching a control twice, and calls made while uninitialized.
 */
use crate::error::{NativeError, NativeResult};
use crate::native::{NativeEvent, NativeToolkit, NativeWaker};
use crate::types::{
    CallbackToken, ControlClass, ControlKind, GridCell, GridEdge, NativeEventKind, RawHandle,
    WindowFlag,
};

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

const FIRST_HANDLE: usize = 0x1000;
const HANDLE_STRIDE: usize = 0x10;

/// One recorded native call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeCall {
    Init,
    Uninit,
    Quit,
    New { handle: RawHandle, kind: ControlKind },
    Destroy(RawHandle),
    SetEnabled(RawHandle, bool),
    SetVisible(RawHandle, bool),
    SetText(RawHandle, String),
    Append { owner: RawHandle, child: RawHandle },
    Insert { owner: RawHandle, index: usize, child: RawHandle },
    Delete { owner: RawHandle, index: usize },
    SetChild { window: RawHandle, child: Option<RawHandle> },
}

/// Native entry points whose next call can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    Init,
    /// Any append or insert of a child, window content included.
    Attach,
    TabMargin,
}

/// Called with the handle right before a native destroy.
#[derive(Clone)]
struct DestroyHook(Arc<dyn Fn(RawHandle) + Send + Sync>);

impl std::fmt::Debug for DestroyHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DestroyHook")
    }
}

/// A native child entry together with the container-specific parameters it was added with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessChild {
    pub handle: RawHandle,
    /// Form label or tab page name.
    pub label: Option<String>,
    pub stretchy: bool,
    pub margined: bool,
    pub cell: Option<GridCell>,
    pub edge: Option<GridEdge>,
}

impl HeadlessChild {
    fn plain(handle: RawHandle) -> Self {
        Self {
            handle,
            label: None,
            stretchy: false,
            margined: false,
            cell: None,
            edge: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessNode {
    pub kind: ControlKind,
    pub text: String,
    pub enabled: bool,
    pub visible: bool,
    pub checked: bool,
    pub padded: bool,
    pub parent: Option<RawHandle>,
    pub children: Vec<HeadlessChild>,
    pub content_size: (i32, i32),
    pub fullscreen: bool,
    pub borderless: bool,
    pub margined: bool,
    pub has_menubar: bool,
}

impl HeadlessNode {
    fn from_class(class: &ControlClass) -> Self {
        let mut node = Self {
            kind: class.kind(),
            text: String::new(),
            enabled: true,
            visible: true,
            checked: false,
            padded: false,
            parent: None,
            children: Vec::new(),
            content_size: (0, 0),
            fullscreen: false,
            borderless: false,
            margined: false,
            has_menubar: false,
        };
        match class {
            ControlClass::Window {
                title,
                width,
                height,
                has_menubar,
            } => {
                node.text = title.clone();
                node.content_size = (*width, *height);
                node.has_menubar = *has_menubar;
                // Windows start hidden until shown explicitly.
                node.visible = false;
            }
            ControlClass::Button { text }
            | ControlClass::Label { text }
            | ControlClass::CheckBox { text } => node.text = text.clone(),
            _ => {}
        }
        node
    }

    fn is_container(&self) -> bool {
        matches!(
            self.kind,
            ControlKind::Window
                | ControlKind::StackPanel
                | ControlKind::Form
                | ControlKind::Grid
                | ControlKind::Tab
        )
    }
}

#[derive(Debug)]
struct HeadlessState {
    initialized: bool,
    failures: HashMap<FailPoint, String>,
    destroy_hook: Option<DestroyHook>,
    should_quit_wired: bool,
    running: bool,
    quit_requested: bool,
    next_handle: usize,
    nodes: HashMap<RawHandle, HeadlessNode>,
    callbacks: HashMap<(RawHandle, NativeEventKind), CallbackToken>,
    events: VecDeque<NativeEvent>,
    calls: Vec<NativeCall>,
}

impl Default for HeadlessState {
    fn default() -> Self {
        Self {
            initialized: false,
            failures: HashMap::new(),
            destroy_hook: None,
            should_quit_wired: false,
            running: false,
            quit_requested: false,
            next_handle: FIRST_HANDLE,
            nodes: HashMap::new(),
            callbacks: HashMap::new(),
            events: VecDeque::new(),
            calls: Vec::new(),
        }
    }
}

impl HeadlessState {
    fn ensure_initialized(&self) -> NativeResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(NativeError::NotInitialized)
        }
    }

    fn node(&self, handle: RawHandle) -> NativeResult<&HeadlessNode> {
        self.ensure_initialized()?;
        self.nodes
            .get(&handle)
            .ok_or(NativeError::UnknownHandle(handle))
    }

    fn node_mut(&mut self, handle: RawHandle) -> NativeResult<&mut HeadlessNode> {
        self.ensure_initialized()?;
        self.nodes
            .get_mut(&handle)
            .ok_or(NativeError::UnknownHandle(handle))
    }

    fn take_failure(&mut self, point: FailPoint) -> NativeResult<()> {
        match self.failures.remove(&point) {
            Some(message) => Err(NativeError::OperationFailed(message)),
            None => Ok(()),
        }
    }

    fn expect_kind(&self, handle: RawHandle, expected: ControlKind) -> NativeResult<()> {
        let node = self.node(handle)?;
        if node.kind == expected {
            Ok(())
        } else {
            Err(NativeError::OperationFailed(format!(
                "{handle:?} is a {:?}, expected {expected:?}",
                node.kind
            )))
        }
    }

    fn allocate_handle(&mut self) -> RawHandle {
        let handle = RawHandle::new(self.next_handle);
        self.next_handle += HANDLE_STRIDE;
        handle
    }

    /// Attaches `entry.handle` under `owner` at `index` (or at the end).
    fn attach(&mut self, owner: RawHandle, index: Option<usize>, entry: HeadlessChild) -> NativeResult<()> {
        let child = entry.handle;
        self.take_failure(FailPoint::Attach)?;
        {
            let child_node = self.node(child)?;
            if child_node.kind == ControlKind::Window {
                return Err(NativeError::OperationFailed(format!(
                    "window {child:?} cannot be a child"
                )));
            }
            if let Some(parent) = child_node.parent {
                return Err(NativeError::OperationFailed(format!(
                    "{child:?} is already attached to {parent:?}"
                )));
            }
        }
        let owner_node = self.node_mut(owner)?;
        if !owner_node.is_container() {
            return Err(NativeError::OperationFailed(format!(
                "{owner:?} cannot hold children"
            )));
        }
        let position = index.unwrap_or(owner_node.children.len());
        if position > owner_node.children.len() {
            return Err(NativeError::OperationFailed(format!(
                "insert position {position} out of range for {owner:?}"
            )));
        }
        owner_node.children.insert(position, entry);
        self.node_mut(child)?.parent = Some(owner);
        let call = match index {
            Some(index) => NativeCall::Insert { owner, index, child },
            None => NativeCall::Append { owner, child },
        };
        self.calls.push(call);
        Ok(())
    }

    fn detach_at(&mut self, owner: RawHandle, index: usize) -> NativeResult<RawHandle> {
        let owner_node = self.node_mut(owner)?;
        if index >= owner_node.children.len() {
            return Err(NativeError::OperationFailed(format!(
                "delete index {index} out of range for {owner:?} with {} children",
                owner_node.children.len()
            )));
        }
        let removed = owner_node.children.remove(index);
        if let Some(child) = self.nodes.get_mut(&removed.handle) {
            child.parent = None;
        }
        self.calls.push(NativeCall::Delete { owner, index });
        Ok(removed.handle)
    }

    fn position_of(&self, owner: RawHandle, child: RawHandle) -> NativeResult<usize> {
        self.node(owner)?
            .children
            .iter()
            .position(|entry| entry.handle == child)
            .ok_or_else(|| {
                NativeError::OperationFailed(format!("{child:?} is not a child of {owner:?}"))
            })
    }

    fn destroy(&mut self, handle: RawHandle) -> NativeResult<()> {
        let node = self.node(handle)?;
        if let Some(parent) = node.parent {
            return Err(NativeError::OperationFailed(format!(
                "cannot destroy {handle:?} while it is attached to {parent:?}"
            )));
        }
        // A container takes its remaining native descendants with it.
        let mut pending = vec![handle];
        while let Some(current) = pending.pop() {
            if let Some(removed) = self.nodes.remove(&current) {
                pending.extend(removed.children.iter().map(|entry| entry.handle));
            }
            self.callbacks.retain(|(owner, _), _| *owner != current);
        }
        self.calls.push(NativeCall::Destroy(handle));
        Ok(())
    }

    fn emit(&mut self, handle: RawHandle, kind: NativeEventKind) -> bool {
        match self.callbacks.get(&(handle, kind)) {
            Some(token) => {
                self.events.push_back(NativeEvent::Control {
                    handle,
                    token: *token,
                    kind,
                });
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Default)]
struct HeadlessShared {
    state: Mutex<HeadlessState>,
    events_ready: Condvar,
}

impl HeadlessShared {
    fn lock(&self) -> MutexGuard<'_, HeadlessState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// In-memory native toolkit. Cloning yields another view of the same native state.
#[derive(Debug, Clone, Default)]
pub struct HeadlessToolkit {
    shared: Arc<HeadlessShared>,
}

struct HeadlessWaker {
    shared: Arc<HeadlessShared>,
}

impl NativeWaker for HeadlessWaker {
    fn wake(&self) {
        self.shared.lock().events.push_back(NativeEvent::Wakeup);
        self.shared.events_ready.notify_all();
    }
}

// Clears the running flag even when the dispatcher unwinds.
struct RunningGuard<'a> {
    shared: &'a HeadlessShared,
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.shared.lock();
        state.running = false;
        state.quit_requested = false;
    }
}

impl HeadlessToolkit {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HeadlessState> {
        self.shared.lock()
    }

    fn inject(&self, mutate: impl FnOnce(&mut HeadlessState) -> bool) -> bool {
        let delivered = mutate(&mut self.lock());
        if delivered {
            self.shared.events_ready.notify_all();
        }
        delivered
    }

    /// Makes the next `init` fail with `message`.
    pub fn fail_next_init(&self, message: impl Into<String>) {
        self.fail_next(FailPoint::Init, message);
    }

    /// Makes the next call through `point` fail with `message`.
    pub fn fail_next(&self, point: FailPoint, message: impl Into<String>) {
        self.lock().failures.insert(point, message.into());
    }

    /// Installs `hook`, run on the calling thread before every native destroy.
    pub fn on_destroy(&self, hook: impl Fn(RawHandle) + Send + Sync + 'static) {
        self.lock().destroy_hook = Some(DestroyHook(Arc::new(hook)));
    }

    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    // Input injection. Each returns whether an event was queued for delivery.

    pub fn click(&self, handle: RawHandle) -> bool {
        self.inject(|state| state.emit(handle, NativeEventKind::Clicked))
    }

    pub fn toggle(&self, handle: RawHandle) -> bool {
        self.inject(|state| {
            let Some(node) = state.nodes.get_mut(&handle) else {
                return false;
            };
            node.checked = !node.checked;
            state.emit(handle, NativeEventKind::Toggled)
        })
    }

    pub fn type_text(&self, handle: RawHandle, text: &str) -> bool {
        self.inject(|state| {
            let Some(node) = state.nodes.get_mut(&handle) else {
                return false;
            };
            node.text = text.to_string();
            state.emit(handle, NativeEventKind::TextChanged)
        })
    }

    pub fn resize(&self, window: RawHandle, width: i32, height: i32) -> bool {
        self.inject(|state| {
            let Some(node) = state.nodes.get_mut(&window) else {
                return false;
            };
            node.content_size = (width, height);
            state.emit(window, NativeEventKind::ContentSizeChanged)
        })
    }

    pub fn request_close(&self, window: RawHandle) -> bool {
        self.inject(|state| state.emit(window, NativeEventKind::Closing))
    }

    pub fn request_quit(&self) -> bool {
        self.inject(|state| {
            if state.should_quit_wired {
                state.events.push_back(NativeEvent::ShouldQuit);
            }
            state.should_quit_wired
        })
    }

    // Inspection.

    pub fn calls(&self) -> Vec<NativeCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn count_calls(&self, predicate: impl Fn(&NativeCall) -> bool) -> usize {
        self.lock().calls.iter().filter(|call| predicate(*call)).count()
    }

    pub fn destroy_count(&self, handle: RawHandle) -> usize {
        self.count_calls(|call| *call == NativeCall::Destroy(handle))
    }

    pub fn is_alive(&self, handle: RawHandle) -> bool {
        self.lock().nodes.contains_key(&handle)
    }

    pub fn node(&self, handle: RawHandle) -> Option<HeadlessNode> {
        self.lock().nodes.get(&handle).cloned()
    }

    pub fn children_of(&self, owner: RawHandle) -> Vec<RawHandle> {
        self.lock()
            .nodes
            .get(&owner)
            .map(|node| node.children.iter().map(|entry| entry.handle).collect())
            .unwrap_or_default()
    }

    pub fn child_entry(&self, owner: RawHandle, index: usize) -> Option<HeadlessChild> {
        self.lock()
            .nodes
            .get(&owner)
            .and_then(|node| node.children.get(index).cloned())
    }

    pub fn child_label(&self, owner: RawHandle, index: usize) -> Option<String> {
        self.child_entry(owner, index).and_then(|entry| entry.label)
    }

    pub fn has_callback(&self, handle: RawHandle, kind: NativeEventKind) -> bool {
        self.lock().callbacks.contains_key(&(handle, kind))
    }
}

impl NativeToolkit for HeadlessToolkit {
    fn init(&self) -> NativeResult<()> {
        let mut state = self.lock();
        if let Some(message) = state.failures.remove(&FailPoint::Init) {
            return Err(NativeError::InitFailed(message));
        }
        if state.initialized {
            return Err(NativeError::InitFailed(
                "toolkit is already initialized".to_string(),
            ));
        }
        state.initialized = true;
        state.calls.push(NativeCall::Init);
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.lock().initialized
    }

    fn uninit(&self) {
        let mut state = self.lock();
        if !state.nodes.is_empty() {
            log::warn!(
                "HeadlessToolkit: uninit with {} native control(s) still alive.",
                state.nodes.len()
            );
        }
        state.initialized = false;
        state.should_quit_wired = false;
        state.nodes.clear();
        state.callbacks.clear();
        state.events.clear();
        state.calls.push(NativeCall::Uninit);
    }

    fn main(&self, dispatch: &mut dyn FnMut(NativeEvent) -> bool) -> NativeResult<()> {
        {
            let mut state = self.lock();
            state.ensure_initialized()?;
            if state.running {
                return Err(NativeError::OperationFailed(
                    "main loop is already running".to_string(),
                ));
            }
            state.running = true;
            state.quit_requested = false;
        }
        let _running = RunningGuard {
            shared: &self.shared,
        };

        loop {
            let event = {
                let mut state = self.lock();
                loop {
                    if state.quit_requested {
                        log::debug!("HeadlessToolkit: quit requested, leaving main loop.");
                        return Ok(());
                    }
                    if let Some(event) = state.events.pop_front() {
                        break event;
                    }
                    state = self
                        .shared
                        .events_ready
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            };

            // The lock is released while managed code runs; it calls back into the toolkit.
            let accepted = dispatch(event);
            if !accepted {
                continue;
            }
            let mut state = self.lock();
            match event {
                NativeEvent::ShouldQuit => state.quit_requested = true,
                NativeEvent::Control {
                    handle,
                    kind: NativeEventKind::Closing,
                    ..
                } => {
                    if let Err(err) = state.destroy(handle) {
                        log::warn!("HeadlessToolkit: accepted close of {handle:?} failed: {err}");
                    }
                }
                _ => {}
            }
        }
    }

    fn quit(&self) {
        let mut state = self.lock();
        state.calls.push(NativeCall::Quit);
        if state.running {
            state.quit_requested = true;
            drop(state);
            self.shared.events_ready.notify_all();
        } else {
            log::debug!("HeadlessToolkit: quit ignored, main loop is not running.");
        }
    }

    fn waker(&self) -> Arc<dyn NativeWaker> {
        Arc::new(HeadlessWaker {
            shared: Arc::clone(&self.shared),
        })
    }

    fn on_should_quit(&self) -> NativeResult<()> {
        let mut state = self.lock();
        state.ensure_initialized()?;
        state.should_quit_wired = true;
        Ok(())
    }

    fn subscribe(&self, handle: RawHandle, kind: NativeEventKind, token: CallbackToken) -> NativeResult<()> {
        let mut state = self.lock();
        state.node(handle)?;
        state.callbacks.insert((handle, kind), token);
        Ok(())
    }

    fn new_control(&self, class: &ControlClass) -> NativeResult<RawHandle> {
        let mut state = self.lock();
        state.ensure_initialized()?;
        let handle = state.allocate_handle();
        let node = HeadlessNode::from_class(class);
        state.calls.push(NativeCall::New {
            handle,
            kind: node.kind,
        });
        state.nodes.insert(handle, node);
        Ok(handle)
    }

    fn destroy(&self, handle: RawHandle) -> NativeResult<()> {
        let hook = self.lock().destroy_hook.clone();
        if let Some(DestroyHook(hook)) = hook {
            hook(handle);
        }
        self.lock().destroy(handle)
    }

    fn enabled(&self, handle: RawHandle) -> NativeResult<bool> {
        Ok(self.lock().node(handle)?.enabled)
    }

    fn set_enabled(&self, handle: RawHandle, enabled: bool) -> NativeResult<()> {
        let mut state = self.lock();
        state.node_mut(handle)?.enabled = enabled;
        state.calls.push(NativeCall::SetEnabled(handle, enabled));
        Ok(())
    }

    fn visible(&self, handle: RawHandle) -> NativeResult<bool> {
        Ok(self.lock().node(handle)?.visible)
    }

    fn set_visible(&self, handle: RawHandle, visible: bool) -> NativeResult<()> {
        let mut state = self.lock();
        state.node_mut(handle)?.visible = visible;
        state.calls.push(NativeCall::SetVisible(handle, visible));
        Ok(())
    }

    fn text(&self, handle: RawHandle) -> NativeResult<String> {
        Ok(self.lock().node(handle)?.text.clone())
    }

    fn set_text(&self, handle: RawHandle, text: &str) -> NativeResult<()> {
        let mut state = self.lock();
        state.node_mut(handle)?.text = text.to_string();
        state.calls.push(NativeCall::SetText(handle, text.to_string()));
        Ok(())
    }

    fn checked(&self, handle: RawHandle) -> NativeResult<bool> {
        let state = self.lock();
        state.expect_kind(handle, ControlKind::CheckBox)?;
        Ok(state.node(handle)?.checked)
    }

    fn set_checked(&self, handle: RawHandle, checked: bool) -> NativeResult<()> {
        let mut state = self.lock();
        state.expect_kind(handle, ControlKind::CheckBox)?;
        state.node_mut(handle)?.checked = checked;
        Ok(())
    }

    fn padded(&self, handle: RawHandle) -> NativeResult<bool> {
        Ok(self.lock().node(handle)?.padded)
    }

    fn set_padded(&self, handle: RawHandle, padded: bool) -> NativeResult<()> {
        self.lock().node_mut(handle)?.padded = padded;
        Ok(())
    }

    fn window_content_size(&self, window: RawHandle) -> NativeResult<(i32, i32)> {
        let state = self.lock();
        state.expect_kind(window, ControlKind::Window)?;
        Ok(state.node(window)?.content_size)
    }

    fn set_window_content_size(&self, window: RawHandle, width: i32, height: i32) -> NativeResult<()> {
        let mut state = self.lock();
        state.expect_kind(window, ControlKind::Window)?;
        state.node_mut(window)?.content_size = (width, height);
        Ok(())
    }

    fn window_flag(&self, window: RawHandle, flag: WindowFlag) -> NativeResult<bool> {
        let state = self.lock();
        state.expect_kind(window, ControlKind::Window)?;
        let node = state.node(window)?;
        Ok(match flag {
            WindowFlag::Fullscreen => node.fullscreen,
            WindowFlag::Borderless => node.borderless,
            WindowFlag::Margined => node.margined,
            WindowFlag::HasMenubar => node.has_menubar,
        })
    }

    fn set_window_flag(&self, window: RawHandle, flag: WindowFlag, value: bool) -> NativeResult<()> {
        let mut state = self.lock();
        state.expect_kind(window, ControlKind::Window)?;
        let node = state.node_mut(window)?;
        match flag {
            WindowFlag::Fullscreen => node.fullscreen = value,
            WindowFlag::Borderless => node.borderless = value,
            WindowFlag::Margined => node.margined = value,
            WindowFlag::HasMenubar => {
                return Err(NativeError::OperationFailed(
                    "the menubar is fixed when the window is created".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn window_set_child(&self, window: RawHandle, child: Option<RawHandle>) -> NativeResult<()> {
        let mut state = self.lock();
        state.expect_kind(window, ControlKind::Window)?;
        let previous = state.node_mut(window)?.children.drain(..).collect::<Vec<_>>();
        for entry in previous {
            if let Some(node) = state.nodes.get_mut(&entry.handle) {
                node.parent = None;
            }
        }
        if let Some(child) = child {
            state.attach(window, None, HeadlessChild::plain(child))?;
            // Replace the generic append record with the window-specific one.
            state.calls.pop();
        }
        state.calls.push(NativeCall::SetChild { window, child });
        Ok(())
    }

    fn box_append(&self, owner: RawHandle, child: RawHandle, stretchy: bool) -> NativeResult<()> {
        let mut state = self.lock();
        state.expect_kind(owner, ControlKind::StackPanel)?;
        state.attach(
            owner,
            None,
            HeadlessChild {
                stretchy,
                ..HeadlessChild::plain(child)
            },
        )
    }

    fn box_insert(&self, owner: RawHandle, index: usize, child: RawHandle, stretchy: bool) -> NativeResult<()> {
        let mut state = self.lock();
        state.expect_kind(owner, ControlKind::StackPanel)?;
        state.attach(
            owner,
            Some(index),
            HeadlessChild {
                stretchy,
                ..HeadlessChild::plain(child)
            },
        )
    }

    fn box_delete(&self, owner: RawHandle, index: usize) -> NativeResult<()> {
        let mut state = self.lock();
        state.expect_kind(owner, ControlKind::StackPanel)?;
        state.detach_at(owner, index).map(|_| ())
    }

    fn form_append(&self, owner: RawHandle, label: &str, child: RawHandle, stretchy: bool) -> NativeResult<()> {
        let mut state = self.lock();
        state.expect_kind(owner, ControlKind::Form)?;
        state.attach(
            owner,
            None,
            HeadlessChild {
                label: Some(label.to_string()),
                stretchy,
                ..HeadlessChild::plain(child)
            },
        )
    }

    fn form_delete(&self, owner: RawHandle, index: usize) -> NativeResult<()> {
        let mut state = self.lock();
        state.expect_kind(owner, ControlKind::Form)?;
        state.detach_at(owner, index).map(|_| ())
    }

    fn grid_append(&self, owner: RawHandle, child: RawHandle, cell: &GridCell) -> NativeResult<()> {
        let mut state = self.lock();
        state.expect_kind(owner, ControlKind::Grid)?;
        state.attach(
            owner,
            None,
            HeadlessChild {
                cell: Some(*cell),
                ..HeadlessChild::plain(child)
            },
        )
    }

    fn grid_insert_at(
        &self,
        owner: RawHandle,
        child: RawHandle,
        existing: RawHandle,
        edge: GridEdge,
        cell: &GridCell,
    ) -> NativeResult<()> {
        let mut state = self.lock();
        state.expect_kind(owner, ControlKind::Grid)?;
        let position = state.position_of(owner, existing)?;
        state.attach(
            owner,
            Some(position),
            HeadlessChild {
                cell: Some(*cell),
                edge: Some(edge),
                ..HeadlessChild::plain(child)
            },
        )
    }

    fn grid_delete(&self, owner: RawHandle, index: usize) -> NativeResult<()> {
        let mut state = self.lock();
        state.expect_kind(owner, ControlKind::Grid)?;
        state.detach_at(owner, index).map(|_| ())
    }

    fn tab_append(&self, owner: RawHandle, name: &str, child: RawHandle) -> NativeResult<()> {
        let mut state = self.lock();
        state.expect_kind(owner, ControlKind::Tab)?;
        state.attach(
            owner,
            None,
            HeadlessChild {
                label: Some(name.to_string()),
                ..HeadlessChild::plain(child)
            },
        )
    }

    fn tab_insert_at(&self, owner: RawHandle, name: &str, index: usize, child: RawHandle) -> NativeResult<()> {
        let mut state = self.lock();
        state.expect_kind(owner, ControlKind::Tab)?;
        state.attach(
            owner,
            Some(index),
            HeadlessChild {
                label: Some(name.to_string()),
                ..HeadlessChild::plain(child)
            },
        )
    }

    fn tab_delete(&self, owner: RawHandle, index: usize) -> NativeResult<()> {
        let mut state = self.lock();
        state.expect_kind(owner, ControlKind::Tab)?;
        state.detach_at(owner, index).map(|_| ())
    }

    fn tab_margined(&self, owner: RawHandle, page: usize) -> NativeResult<bool> {
        let state = self.lock();
        state.expect_kind(owner, ControlKind::Tab)?;
        state
            .node(owner)?
            .children
            .get(page)
            .map(|entry| entry.margined)
            .ok_or_else(|| NativeError::OperationFailed(format!("no tab page {page} in {owner:?}")))
    }

    fn tab_set_margined(&self, owner: RawHandle, page: usize, margined: bool) -> NativeResult<()> {
        let mut state = self.lock();
        state.expect_kind(owner, ControlKind::Tab)?;
        state.take_failure(FailPoint::TabMargin)?;
        let entry = state
            .node_mut(owner)?
            .children
            .get_mut(page)
            .ok_or_else(|| NativeError::OperationFailed(format!("no tab page {page} in {owner:?}")))?;
        entry.margined = margined;
        Ok(())
    }
}
