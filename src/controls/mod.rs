/*
 * Concrete control types. Each one is a thin typed wrapper around a managed
 * `Control`: leaf controls add their notifications and native properties,
 * containers add a child slot type describing how children are attached on
 * the native side.
 */
pub mod button;
pub mod checkbox;
pub mod form;
pub mod grid;
pub mod label;
pub mod separator;
pub mod stack_panel;
pub mod tab;
pub mod text_box;

pub use button::Button;
pub use checkbox::CheckBox;
pub use form::{Form, FormSlot};
pub use grid::{Grid, GridSlot};
pub use label::Label;
pub use separator::Separator;
pub use stack_panel::{StackPanel, StackSlot};
pub use tab::{Tab, TabPage};
pub use text_box::TextBox;
