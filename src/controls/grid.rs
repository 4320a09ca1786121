/*
 * A grid places each child in a cell rectangle with its own expansion and
 * alignment. Native insertion is relative to an existing child: the new child
 * goes before the sibling currently at the target index, placed against one of
 * its edges. Inserting at the end has no sibling and becomes an append.
 */
use crate::app::Application;
use crate::collection::{AnySlot, ChildSlot, HasChildren, sealed};
use crate::control::{Control, Widget};
use crate::error::{PlatformError, Result as PlatformResult};
use crate::native::NativeToolkit;
use crate::types::{ControlClass, GridCell, GridEdge, RawHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridSlot {
    pub cell: GridCell,
    /// Only used when the child is inserted relative to a sibling.
    pub edge: GridEdge,
}

impl GridSlot {
    pub fn new(cell: GridCell) -> Self {
        Self {
            cell,
            edge: GridEdge::default(),
        }
    }

    pub fn with_edge(mut self, edge: GridEdge) -> Self {
        self.edge = edge;
        self
    }
}

impl sealed::Sealed for GridSlot {}

impl ChildSlot for GridSlot {
    fn default_slot() -> PlatformResult<Self> {
        Ok(Self::default())
    }

    fn native_append(&self, native: &dyn NativeToolkit, owner: RawHandle, _index: usize, child: RawHandle) -> PlatformResult<()> {
        Ok(native.grid_append(owner, child, &self.cell)?)
    }

    fn native_insert(
        &self,
        native: &dyn NativeToolkit,
        owner: RawHandle,
        _index: usize,
        sibling: Option<RawHandle>,
        child: RawHandle,
    ) -> PlatformResult<()> {
        match sibling {
            Some(existing) => Ok(native.grid_insert_at(owner, child, existing, self.edge, &self.cell)?),
            None => Ok(native.grid_append(owner, child, &self.cell)?),
        }
    }

    fn native_delete(native: &dyn NativeToolkit, owner: RawHandle, index: usize) -> PlatformResult<()> {
        Ok(native.grid_delete(owner, index)?)
    }

    fn into_any(self) -> AnySlot {
        AnySlot::Grid(self)
    }

    fn from_any(slot: &AnySlot) -> Option<&Self> {
        match slot {
            AnySlot::Grid(slot) => Some(slot),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    control: Control,
}

impl Grid {
    pub fn new(app: &Application) -> PlatformResult<Self> {
        let control = Control::create(app, ControlClass::Grid)?;
        Ok(Self { control })
    }

    pub fn append(&self, child: &impl Widget, cell: GridCell) -> PlatformResult<()> {
        self.children().add_with(child, GridSlot::new(cell))
    }

    /// Inserts `child` before `existing`, placed against `edge` of it.
    pub fn insert_at(&self, child: &impl Widget, existing: &impl Widget, edge: GridEdge, cell: GridCell) -> PlatformResult<()> {
        let index = self.children().index_of(existing).ok_or_else(|| {
            PlatformError::InvalidOperation("existing control is not a child of this grid".to_string())
        })?;
        self.children()
            .insert_with(index, child, GridSlot::new(cell).with_edge(edge))
    }

    pub fn padded(&self) -> PlatformResult<bool> {
        Ok(self.control.native().padded(self.control.handle()?)?)
    }

    pub fn set_padded(&self, padded: bool) -> PlatformResult<()> {
        self.control
            .native()
            .set_padded(self.control.handle()?, padded)?;
        Ok(())
    }
}

impl Widget for Grid {
    fn control(&self) -> &Control {
        &self.control
    }
}

impl HasChildren for Grid {
    type Slot = GridSlot;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::Button;
    use crate::headless::NativeCall;
    use crate::test_support::test_app;
    use crate::types::Align;

    #[test]
    fn insert_uses_the_sibling_at_the_target_index() {
        // Arrange
        let (app, native) = test_app();
        let grid = Grid::new(&app).expect("grid");
        let first = Button::new(&app, "first").expect("first");
        let second = Button::new(&app, "second").expect("second");
        let cell = GridCell::at(1, 0).expand(true, false).align(Align::Center, Align::Start);
        grid.append(&first, GridCell::at(0, 0)).expect("append");
        // Act
        grid.insert_at(&second, &first, GridEdge::Top, cell).expect("insert");
        // Assert
        let owner = grid.control().handle().expect("raw");
        let second_raw = second.control().handle().expect("raw");
        assert_eq!(native.children_of(owner)[0], second_raw);
        let entry = native.child_entry(owner, 0).expect("entry");
        assert_eq!(entry.edge, Some(GridEdge::Top));
        assert_eq!(entry.cell, Some(cell));
        assert_eq!(first.index(), Some(1));
    }

    #[test]
    fn insert_at_the_end_appends() {
        let (app, native) = test_app();
        let grid = Grid::new(&app).expect("grid");
        let only = Button::new(&app, "only").expect("only");
        native.clear_calls();

        grid.children()
            .insert_with(0, &only, GridSlot::new(GridCell::default()).with_edge(GridEdge::Bottom))
            .expect("insert");

        let owner = grid.control().handle().expect("raw");
        let child = only.control().handle().expect("raw");
        assert_eq!(native.calls(), vec![NativeCall::Append { owner, child }]);
    }

    #[test]
    fn insert_relative_to_a_stranger_is_rejected() {
        let (app, _native) = test_app();
        let grid = Grid::new(&app).expect("grid");
        let stranger = Button::new(&app, "stranger").expect("stranger");
        let child = Button::new(&app, "child").expect("child");
        assert!(matches!(
            grid.insert_at(&child, &stranger, GridEdge::Leading, GridCell::default()),
            Err(PlatformError::InvalidOperation(_))
        ));
        assert!(grid.children().is_empty());
    }
}
