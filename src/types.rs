/*
 * Platform-agnostic value types shared between the managed control layer and
 * the native toolkit seam: raw handles, registry keys and callback tokens,
 * control classes, grid placement, and the configuration structs used to
 * create the application and its windows.
 */
use slotmap::{Key, KeyData};

/// Default initial capacity of a container's child collection.
pub const DEFAULT_CHILD_CAPACITY: usize = 4;

/// Opaque pointer-sized value identifying one native object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawHandle(usize);

impl RawHandle {
    /// The sentinel a native toolkit returns when creation failed.
    pub const NULL: RawHandle = RawHandle(0);

    pub const fn new(raw: usize) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> usize {
        self.0
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

slotmap::new_key_type! {
    /// Registry key of a cacheable control. Stable for the control's lifetime and
    /// never resolves to a different control after the original is unregistered.
    pub struct ControlId;
}

impl ControlId {
    pub fn raw(self) -> u64 {
        self.data().as_ffi()
    }
}

/*
 * Token handed to the native toolkit when a callback is registered. The native
 * side echoes it back with every event so the trampoline can resolve the wrapper
 * through the registry instead of holding a pointer to managed state.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackToken(u64);

impl CallbackToken {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    pub(crate) fn control_id(self) -> ControlId {
        ControlId::from(KeyData::from_ffi(self.0))
    }
}

impl From<ControlId> for CallbackToken {
    fn from(id: ControlId) -> Self {
        Self(id.raw())
    }
}

/// Native notifications a control can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeEventKind {
    Clicked,
    Toggled,
    TextChanged,
    Closing,
    ContentSizeChanged,
}

/// Identifies the kind of a control so behavior can be dispatched without native class queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    Window,
    StackPanel,
    Form,
    Grid,
    Tab,
    Button,
    Label,
    CheckBox,
    TextBox,
    Separator,
}

impl ControlKind {
    /// Windows are the only roots of the control tree.
    pub const fn is_top_level(self) -> bool {
        matches!(self, ControlKind::Window)
    }

    /// Separators are pass-through nodes that never receive callbacks, so they skip the registry.
    pub const fn is_cacheable(self) -> bool {
        !matches!(self, ControlKind::Separator)
    }

    /// Native callbacks wired at construction for controls of this kind.
    pub const fn native_events(self) -> &'static [NativeEventKind] {
        match self {
            ControlKind::Window => &[
                NativeEventKind::Closing,
                NativeEventKind::ContentSizeChanged,
            ],
            ControlKind::Button => &[NativeEventKind::Clicked],
            ControlKind::CheckBox => &[NativeEventKind::Toggled],
            ControlKind::TextBox => &[NativeEventKind::TextChanged],
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
}

/// Parameters for one native "new control" call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlClass {
    Window {
        title: String,
        width: i32,
        height: i32,
        has_menubar: bool,
    },
    StackPanel {
        orientation: Orientation,
    },
    Form,
    Grid,
    Tab,
    Button {
        text: String,
    },
    Label {
        text: String,
    },
    CheckBox {
        text: String,
    },
    TextBox,
    Separator {
        orientation: Orientation,
    },
}

impl ControlClass {
    pub fn kind(&self) -> ControlKind {
        match self {
            ControlClass::Window { .. } => ControlKind::Window,
            ControlClass::StackPanel { .. } => ControlKind::StackPanel,
            ControlClass::Form => ControlKind::Form,
            ControlClass::Grid => ControlKind::Grid,
            ControlClass::Tab => ControlKind::Tab,
            ControlClass::Button { .. } => ControlKind::Button,
            ControlClass::Label { .. } => ControlKind::Label,
            ControlClass::CheckBox { .. } => ControlKind::CheckBox,
            ControlClass::TextBox => ControlKind::TextBox,
            ControlClass::Separator { .. } => ControlKind::Separator,
        }
    }
}

/// Alignment of a grid child inside its cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Fill,
    Start,
    Center,
    End,
}

/// Side of an existing grid child that a new child is placed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridEdge {
    #[default]
    Leading,
    Top,
    Trailing,
    Bottom,
}

/// Placement of one grid child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    pub left: i32,
    pub top: i32,
    pub xspan: i32,
    pub yspan: i32,
    pub hexpand: bool,
    pub halign: Align,
    pub vexpand: bool,
    pub valign: Align,
}

impl GridCell {
    pub fn at(left: i32, top: i32) -> Self {
        Self {
            left,
            top,
            ..Self::default()
        }
    }

    pub fn span(mut self, xspan: i32, yspan: i32) -> Self {
        self.xspan = xspan;
        self.yspan = yspan;
        self
    }

    pub fn expand(mut self, hexpand: bool, vexpand: bool) -> Self {
        self.hexpand = hexpand;
        self.vexpand = vexpand;
        self
    }

    pub fn align(mut self, halign: Align, valign: Align) -> Self {
        self.halign = halign;
        self.valign = valign;
        self
    }
}

impl Default for GridCell {
    // Cell (0,0), one by one, no expansion, filling the cell.
    fn default() -> Self {
        Self {
            left: 0,
            top: 0,
            xspan: 1,
            yspan: 1,
            hexpand: false,
            halign: Align::Fill,
            vexpand: false,
            valign: Align::Fill,
        }
    }
}

/// Boolean window attributes exposed by the native toolkit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowFlag {
    Fullscreen,
    Borderless,
    Margined,
    /// Fixed at creation; the native side rejects writes.
    HasMenubar,
}

/// Settings used when constructing an `Application`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub app_name: String,
    /// Initial capacity of lazily created child collections.
    pub child_capacity: usize,
}

impl AppConfig {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            ..Self::default()
        }
    }

    pub fn with_child_capacity(mut self, capacity: usize) -> Self {
        self.child_capacity = capacity.max(1);
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "nativeui".to_string(),
            child_capacity: DEFAULT_CHILD_CAPACITY,
        }
    }
}

/// Settings used when creating a native window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowConfig {
    pub title: String,
    pub width: i32,
    pub height: i32,
    pub has_menubar: bool,
}

impl WindowConfig {
    pub fn new(title: impl Into<String>, width: i32, height: i32) -> Self {
        Self {
            title: title.into(),
            width,
            height,
            has_menubar: false,
        }
    }

    pub fn with_menubar(mut self, has_menubar: bool) -> Self {
        self.has_menubar = has_menubar;
        self
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self::new("Window", 640, 480)
    }
}
