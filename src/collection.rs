/*
 * Child collections of container controls.
 *
 * Every container keeps an ordered array of its managed children that mirrors
 * the native child list one-to-one: the child at managed index `i` is the
 * native child at index `i`. Each mutation validates first, then performs the
 * native call, and only touches managed state once the native call succeeded,
 * so a failure leaves both sides as they were.
 *
 * The array is created lazily on first access with the capacity configured on
 * the application and doubles when it runs out of room. How a child is added
 * to the native side depends on the container: each container kind has its
 * own slot type (`StackSlot`, `FormSlot`, `GridSlot`, `TabPage`,
 * `ContentSlot`) carrying the per-child parameters and the native calls that
 * go with them.
 */
use crate::control::{Control, Widget};
use crate::controls::{FormSlot, GridSlot, StackSlot, TabPage};
use crate::error::{PlatformError, Result as PlatformResult};
use crate::native::NativeToolkit;
use crate::types::RawHandle;
use crate::window::ContentSlot;

use std::fmt;
use std::marker::PhantomData;

pub(crate) mod sealed {
    pub trait Sealed {}
}

/// The per-child parameters of any container kind.
#[derive(Debug, Clone, PartialEq)]
pub enum AnySlot {
    Stack(StackSlot),
    Form(FormSlot),
    Grid(GridSlot),
    Tab(TabPage),
    Content(ContentSlot),
}

impl AnySlot {
    fn native_delete(&self, native: &dyn NativeToolkit, owner: RawHandle, index: usize) -> PlatformResult<()> {
        match self {
            AnySlot::Stack(_) => StackSlot::native_delete(native, owner, index),
            AnySlot::Form(_) => FormSlot::native_delete(native, owner, index),
            AnySlot::Grid(_) => GridSlot::native_delete(native, owner, index),
            AnySlot::Tab(_) => TabPage::native_delete(native, owner, index),
            AnySlot::Content(_) => ContentSlot::native_delete(native, owner, index),
        }
    }
}

/// Container-specific child parameters together with the native calls that apply them.
pub trait ChildSlot: sealed::Sealed + Clone + fmt::Debug + 'static {
    /// Parameters used by `add`/`insert` without explicit ones.
    fn default_slot() -> PlatformResult<Self>;

    fn native_append(&self, native: &dyn NativeToolkit, owner: RawHandle, index: usize, child: RawHandle) -> PlatformResult<()>;

    /// Inserts `child` at `index`; `sibling` is the child currently at that index, if any.
    fn native_insert(
        &self,
        native: &dyn NativeToolkit,
        owner: RawHandle,
        index: usize,
        sibling: Option<RawHandle>,
        child: RawHandle,
    ) -> PlatformResult<()>;

    fn native_delete(native: &dyn NativeToolkit, owner: RawHandle, index: usize) -> PlatformResult<()>;

    fn into_any(self) -> AnySlot;

    fn from_any(slot: &AnySlot) -> Option<&Self>;
}

#[derive(Debug)]
pub(crate) struct ChildEntry {
    control: Control,
    slot: AnySlot,
}

/*
 * Backing store. `items.len()` is the capacity; the first `size` items are
 * occupied and everything after them is `None`.
 */
#[derive(Debug)]
pub(crate) struct ChildArray {
    items: Vec<Option<ChildEntry>>,
    size: usize,
    read_only: bool,
}

impl ChildArray {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            items: std::iter::repeat_with(|| None).take(capacity.max(1)).collect(),
            size: 0,
            read_only: false,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.size
    }

    fn capacity(&self) -> usize {
        self.items.len()
    }

    fn get(&self, index: usize) -> Option<&ChildEntry> {
        if index < self.size {
            self.items[index].as_ref()
        } else {
            None
        }
    }

    fn position(&self, control: &Control) -> Option<usize> {
        self.items[..self.size]
            .iter()
            .position(|entry| entry.as_ref().is_some_and(|entry| entry.control == *control))
    }

    fn ensure_capacity(&mut self, required: usize) {
        let mut capacity = self.capacity();
        if required <= capacity {
            return;
        }
        while capacity < required {
            capacity *= 2;
        }
        log::trace!("ChildArray: growing from {} to {capacity}", self.capacity());
        self.items.resize_with(capacity, || None);
    }

    fn insert(&mut self, index: usize, entry: ChildEntry) {
        self.ensure_capacity(self.size + 1);
        self.items[index..=self.size].rotate_right(1);
        self.items[index] = Some(entry);
        self.size += 1;
        self.renumber_from(index);
    }

    fn remove(&mut self, index: usize) -> Option<ChildEntry> {
        let removed = self.items[index].take();
        self.items[index..self.size].rotate_left(1);
        self.size -= 1;
        self.renumber_from(index);
        removed
    }

    fn renumber_from(&self, start: usize) {
        for (index, entry) in self.items[..self.size].iter().enumerate().skip(start) {
            if let Some(entry) = entry {
                entry.control.set_index(index);
            }
        }
    }

    /*
     * Finalizer path of the owner: detaches every native child, last first,
     * and forgets the managed side without disposing anything.
     */
    pub(crate) fn release_native(mut self, native: &dyn NativeToolkit, owner: RawHandle) {
        for index in (0..self.size).rev() {
            let Some(entry) = self.items[index].take() else {
                continue;
            };
            if let Err(err) = entry.slot.native_delete(native, owner, index) {
                log::warn!("ChildArray: could not detach native child {index} of {owner:?}: {err}");
            }
            entry.control.detach();
        }
        self.size = 0;
    }
}

fn with_children<R>(owner: &Control, f: impl FnOnce(&mut ChildArray) -> R) -> R {
    let mut children = owner.inner.children.borrow_mut();
    let array = children.get_or_insert_with(|| {
        ChildArray::with_capacity(owner.application().config().child_capacity)
    });
    f(array)
}

/*
 * Native delete followed by the managed removal. With `strict` a native
 * failure aborts and leaves both sides untouched; without it the failure is
 * logged and the managed side is updated anyway so teardown always makes
 * progress.
 */
fn remove_at_unchecked(owner: &Control, index: usize, strict: bool) -> PlatformResult<Control> {
    let owner_raw = owner.handle()?;
    let slot = with_children(owner, |children| children.get(index).map(|entry| entry.slot.clone()))
        .ok_or_else(|| PlatformError::IndexOutOfRange {
            index,
            len: with_children(owner, |children| children.len()),
        })?;
    if let Err(err) = slot.native_delete(owner.native(), owner_raw, index) {
        if strict {
            return Err(err);
        }
        log::warn!("ControlCollection: native delete of child {index} from {owner_raw:?} failed: {err}");
    }
    let removed = with_children(owner, |children| children.remove(index));
    let entry = removed.ok_or_else(|| {
        PlatformError::InvalidOperation(format!("child slot {index} was empty"))
    })?;
    entry.control.detach();
    Ok(entry.control)
}

/*
 * Called when a child is disposed directly: takes it out of `parent` without
 * disposing it again. Runs even when the collection is read-only, since a
 * disposed control cannot stay a member.
 */
pub(crate) fn detach_from_parent(parent: &Control, child: &Control) {
    let Some(index) = with_children(parent, |children| children.position(child)) else {
        log::warn!("ControlCollection: {child:?} names a parent that does not list it");
        child.detach();
        return;
    };
    if let Err(err) = remove_at_unchecked(parent, index, false) {
        log::warn!("ControlCollection: could not detach {child:?}: {err}");
        child.detach();
    }
}

/// Disposal of an owner: removes and disposes every child, last first.
pub(crate) fn dispose_children(owner: &Control) {
    let Some(count) = owner.inner.children.borrow().as_ref().map(ChildArray::len) else {
        return;
    };
    for index in (0..count).rev() {
        match remove_at_unchecked(owner, index, false) {
            Ok(child) => child.dispose(),
            Err(err) => log::warn!("ControlCollection: could not remove child {index} of {owner:?}: {err}"),
        }
    }
}

/// Typed view of a container's children.
pub struct ControlCollection<'a, S: ChildSlot> {
    owner: &'a Control,
    _slot: PhantomData<fn() -> S>,
}

impl<S: ChildSlot> Clone for ControlCollection<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: ChildSlot> Copy for ControlCollection<'_, S> {}

impl<'a, S: ChildSlot> ControlCollection<'a, S> {
    pub(crate) fn new(owner: &'a Control) -> Self {
        Self {
            owner,
            _slot: PhantomData,
        }
    }

    pub fn owner(&self) -> &'a Control {
        self.owner
    }

    pub fn count(&self) -> usize {
        with_children(self.owner, |children| children.len())
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn capacity(&self) -> usize {
        with_children(self.owner, |children| children.capacity())
    }

    pub fn is_read_only(&self) -> bool {
        with_children(self.owner, |children| children.read_only)
    }

    /// Freezes the structure against `add`/`insert`/`remove`/`clear`. Disposing a member still takes it out.
    pub fn set_read_only(&self, read_only: bool) {
        with_children(self.owner, |children| children.read_only = read_only);
    }

    pub fn get(&self, index: usize) -> Option<Control> {
        with_children(self.owner, |children| {
            children.get(index).map(|entry| entry.control.clone())
        })
    }

    /// The parameters the child at `index` was added with.
    pub fn slot(&self, index: usize) -> Option<S> {
        with_children(self.owner, |children| {
            children
                .get(index)
                .and_then(|entry| S::from_any(&entry.slot).cloned())
        })
    }

    pub fn index_of(&self, child: &impl Widget) -> Option<usize> {
        with_children(self.owner, |children| children.position(child.control()))
    }

    pub fn contains(&self, child: &impl Widget) -> bool {
        !child.is_invalid() && self.index_of(child).is_some()
    }

    pub fn add(&self, child: &impl Widget) -> PlatformResult<()> {
        self.add_with(child, S::default_slot()?)
    }

    pub fn add_with(&self, child: &impl Widget, slot: S) -> PlatformResult<()> {
        self.insert_internal(None, child.control(), slot)
    }

    pub fn insert(&self, index: usize, child: &impl Widget) -> PlatformResult<()> {
        self.insert_with(index, child, S::default_slot()?)
    }

    pub fn insert_with(&self, index: usize, child: &impl Widget, slot: S) -> PlatformResult<()> {
        self.insert_internal(Some(index), child.control(), slot)
    }

    /// Removes and disposes `child`. `Ok(false)` when it is not a member.
    pub fn remove(&self, child: &impl Widget) -> PlatformResult<bool> {
        self.ensure_writable()?;
        let child = child.control();
        child.handle()?;
        let Some(index) = self.index_of(child) else {
            return Ok(false);
        };
        let removed = remove_at_unchecked(self.owner, index, true)?;
        removed.dispose();
        Ok(true)
    }

    /// Removes and disposes the child at `index`.
    pub fn remove_at(&self, index: usize) -> PlatformResult<()> {
        self.ensure_writable()?;
        let len = self.count();
        if index >= len {
            return Err(PlatformError::IndexOutOfRange { index, len });
        }
        let removed = remove_at_unchecked(self.owner, index, true)?;
        removed.dispose();
        Ok(())
    }

    /// Removes and disposes every child, last first.
    pub fn clear(&self) -> PlatformResult<()> {
        self.ensure_writable()?;
        while let Some(last) = self.count().checked_sub(1) {
            remove_at_unchecked(self.owner, last, true)?.dispose();
        }
        Ok(())
    }

    /// Takes the child at `index` out, native side first, without disposing it.
    pub(crate) fn take_at(&self, index: usize) -> PlatformResult<Control> {
        self.ensure_writable()?;
        let len = self.count();
        if index >= len {
            return Err(PlatformError::IndexOutOfRange { index, len });
        }
        remove_at_unchecked(self.owner, index, true)
    }

    pub fn iter(&self) -> Children<'a, S> {
        Children {
            collection: *self,
            next: 0,
        }
    }

    fn ensure_writable(&self) -> PlatformResult<()> {
        if self.is_read_only() {
            return Err(PlatformError::InvalidOperation(
                "child collection is read-only".to_string(),
            ));
        }
        Ok(())
    }

    /// Checks everything that can be checked before any native call; returns the child's handle.
    pub(crate) fn validate(&self, child: &Control) -> PlatformResult<RawHandle> {
        self.ensure_writable()?;
        let raw = child.handle()?;
        if child.top_level() {
            return Err(PlatformError::InvalidOperation(format!(
                "a top-level {:?} cannot be added to a container",
                child.kind()
            )));
        }
        if self.index_of(child).is_some() {
            return Err(PlatformError::InvalidOperation(
                "control is already in this collection".to_string(),
            ));
        }
        if child.parent().is_some() {
            return Err(PlatformError::InvalidOperation(
                "control already belongs to another container".to_string(),
            ));
        }
        if child.is_self_or_ancestor_of(self.owner) {
            return Err(PlatformError::InvalidOperation(
                "adding the control would create a cycle".to_string(),
            ));
        }
        Ok(raw)
    }

    fn insert_internal(&self, position: Option<usize>, child: &Control, slot: S) -> PlatformResult<()> {
        let owner_raw = self.owner.handle()?;
        let child_raw = self.validate(child)?;
        let len = self.count();
        let index = position.unwrap_or(len);
        if index > len {
            return Err(PlatformError::IndexOutOfRange { index, len });
        }

        let native = self.owner.native();
        match position {
            None => slot.native_append(native, owner_raw, index, child_raw)?,
            Some(_) => {
                let sibling = match self.get(index) {
                    Some(sibling) => Some(sibling.handle()?),
                    None => None,
                };
                slot.native_insert(native, owner_raw, index, sibling, child_raw)?;
            }
        }

        with_children(self.owner, |children| {
            children.insert(
                index,
                ChildEntry {
                    control: child.clone(),
                    slot: slot.into_any(),
                },
            );
        });
        child.attach(self.owner, index)?;
        log::trace!("ControlCollection: attached {child_raw:?} to {owner_raw:?} at {index}");
        Ok(())
    }
}

impl<S: ChildSlot> fmt::Debug for ControlCollection<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlCollection")
            .field("owner", self.owner)
            .field("count", &self.count())
            .finish()
    }
}

/// Walks the collection by index, so it observes mutations made between steps.
pub struct Children<'a, S: ChildSlot> {
    collection: ControlCollection<'a, S>,
    next: usize,
}

impl<S: ChildSlot> Iterator for Children<'_, S> {
    type Item = Control;

    fn next(&mut self) -> Option<Control> {
        let item = self.collection.get(self.next)?;
        self.next += 1;
        Some(item)
    }
}

impl<'a, S: ChildSlot> IntoIterator for ControlCollection<'a, S> {
    type Item = Control;
    type IntoIter = Children<'a, S>;

    fn into_iter(self) -> Children<'a, S> {
        self.iter()
    }
}

/// Containers exposing their children as a typed collection.
pub trait HasChildren: Widget {
    type Slot: ChildSlot;

    fn children(&self) -> ControlCollection<'_, Self::Slot> {
        ControlCollection::new(self.control())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{Enableable, Showable};
    use crate::controls::{Button, Form, Label, StackPanel};
    use crate::headless::NativeCall;
    use crate::test_support::test_app;
    use crate::types::{AppConfig, Orientation, WindowConfig};
    use crate::window::Window;

    fn buttons(app: &crate::app::Application, count: usize) -> Vec<Button> {
        (0..count)
            .map(|i| Button::new(app, &format!("b{i}")).expect("button"))
            .collect()
    }

    fn assert_indices_match(panel: &StackPanel) {
        for (position, child) in panel.children().iter().enumerate() {
            assert_eq!(child.index(), Some(position));
            assert_eq!(child.parent().as_ref(), Some(panel.control()));
        }
    }

    #[test]
    fn add_mirrors_native_order() {
        // Arrange
        let (app, native) = test_app();
        let panel = StackPanel::new(&app, Orientation::Vertical).expect("panel");
        let children = buttons(&app, 3);
        // Act
        for child in &children {
            panel.children().add(child).expect("add");
        }
        // Assert
        let owner = panel.control().handle().expect("raw");
        let expected: Vec<_> = children
            .iter()
            .map(|child| child.control().handle().expect("raw"))
            .collect();
        assert_eq!(native.children_of(owner), expected);
        assert_indices_match(&panel);
    }

    #[test]
    fn collection_grows_past_initial_capacity() {
        let (app, _native) = test_app();
        let panel = StackPanel::new(&app, Orientation::Vertical).expect("panel");
        assert_eq!(panel.children().capacity(), 4);
        for child in &buttons(&app, 5) {
            panel.children().add(child).expect("add");
        }
        assert_eq!(panel.children().count(), 5);
        assert_eq!(panel.children().capacity(), 8);
        assert_indices_match(&panel);
    }

    #[test]
    fn configured_capacity_is_used() {
        let native = crate::headless::HeadlessToolkit::new();
        let app = crate::app::Application::new(native, AppConfig::new("cap").with_child_capacity(2))
            .expect("app");
        let panel = StackPanel::new(&app, Orientation::Vertical).expect("panel");
        assert_eq!(panel.children().capacity(), 2);
    }

    #[test]
    fn insert_shifts_later_children_and_renumbers() {
        let (app, native) = test_app();
        let panel = StackPanel::new(&app, Orientation::Vertical).expect("panel");
        let children = buttons(&app, 3);
        panel.children().add(&children[0]).expect("add");
        panel.children().add(&children[1]).expect("add");

        panel.children().insert(1, &children[2]).expect("insert");

        let owner = panel.control().handle().expect("raw");
        assert_eq!(panel.children().get(1).as_ref(), Some(children[2].control()));
        assert_eq!(children[1].index(), Some(2));
        assert_eq!(
            native.children_of(owner)[1],
            children[2].control().handle().expect("raw")
        );
        assert_indices_match(&panel);
    }

    #[test]
    fn insert_past_the_end_is_out_of_range() {
        let (app, native) = test_app();
        let panel = StackPanel::new(&app, Orientation::Vertical).expect("panel");
        let child = Button::new(&app, "b").expect("b");
        native.clear_calls();
        let result = panel.children().insert(1, &child);
        assert_eq!(result, Err(PlatformError::IndexOutOfRange { index: 1, len: 0 }));
        assert!(native.calls().is_empty());
    }

    #[test]
    fn remove_disposes_and_renumbers() {
        // Arrange
        let (app, native) = test_app();
        let panel = StackPanel::new(&app, Orientation::Vertical).expect("panel");
        let children = buttons(&app, 3);
        for child in &children {
            panel.children().add(child).expect("add");
        }
        let removed_raw = children[0].control().handle().expect("raw");
        // Act
        let removed = panel.children().remove(&children[0]).expect("remove");
        // Assert
        assert!(removed);
        assert!(children[0].is_invalid());
        assert!(!native.is_alive(removed_raw));
        assert_eq!(children[1].index(), Some(0));
        assert_eq!(children[2].index(), Some(1));
        assert_eq!(panel.children().count(), 2);
        assert_indices_match(&panel);
    }

    #[test]
    fn removing_a_non_member_returns_false() {
        let (app, _native) = test_app();
        let panel = StackPanel::new(&app, Orientation::Vertical).expect("panel");
        let stranger = Button::new(&app, "s").expect("s");
        assert_eq!(panel.children().remove(&stranger), Ok(false));
        assert!(!stranger.is_invalid());
    }

    #[test]
    fn last_child_is_reachable_at_count_minus_one() {
        let (app, _native) = test_app();
        let panel = StackPanel::new(&app, Orientation::Vertical).expect("panel");
        let children = buttons(&app, 4);
        for child in &children {
            panel.children().add(child).expect("add");
        }
        let count = panel.children().count();
        assert_eq!(count, 4);
        assert_eq!(panel.children().get(count - 1).as_ref(), Some(children[3].control()));
        assert!(panel.children().get(count).is_none());
    }

    #[test]
    fn adding_the_same_child_twice_is_rejected() {
        let (app, _native) = test_app();
        let panel = StackPanel::new(&app, Orientation::Vertical).expect("panel");
        let child = Button::new(&app, "b").expect("b");
        panel.children().add(&child).expect("add");
        assert!(matches!(
            panel.children().add(&child),
            Err(PlatformError::InvalidOperation(_))
        ));
        assert_eq!(panel.children().count(), 1);
    }

    #[test]
    fn inserting_a_contained_child_is_rejected_without_native_calls() {
        let (app, native) = test_app();
        let panel = StackPanel::new(&app, Orientation::Vertical).expect("panel");
        let children = buttons(&app, 2);
        for child in &children {
            panel.children().add(child).expect("add");
        }
        native.clear_calls();
        assert!(matches!(
            panel.children().insert(0, &children[1]),
            Err(PlatformError::InvalidOperation(_))
        ));
        assert!(native.calls().is_empty());
        assert_eq!(panel.children().count(), 2);
        assert_eq!(children[1].index(), Some(1));
        assert_indices_match(&panel);
    }

    #[test]
    fn child_of_another_container_is_rejected() {
        let (app, _native) = test_app();
        let first = StackPanel::new(&app, Orientation::Vertical).expect("first");
        let second = StackPanel::new(&app, Orientation::Vertical).expect("second");
        let child = Button::new(&app, "b").expect("b");
        first.children().add(&child).expect("add");
        assert!(matches!(
            second.children().add(&child),
            Err(PlatformError::InvalidOperation(_))
        ));
    }

    #[test]
    fn top_level_and_disposed_children_are_rejected() {
        let (app, _native) = test_app();
        let panel = StackPanel::new(&app, Orientation::Vertical).expect("panel");
        let window = Window::new(&app, &WindowConfig::default()).expect("window");
        assert!(matches!(
            panel.children().add(window.control()),
            Err(PlatformError::InvalidOperation(_))
        ));
        let disposed = Button::new(&app, "b").expect("b");
        disposed.dispose();
        assert!(matches!(
            panel.children().add(&disposed),
            Err(PlatformError::InvalidHandle(_))
        ));
    }

    #[test]
    fn cycles_are_rejected() {
        let (app, _native) = test_app();
        let outer = StackPanel::new(&app, Orientation::Vertical).expect("outer");
        let inner = StackPanel::new(&app, Orientation::Vertical).expect("inner");
        outer.children().add(&inner).expect("add");
        assert!(matches!(
            inner.children().add(&outer),
            Err(PlatformError::InvalidOperation(_))
        ));
        assert!(matches!(
            outer.children().add(&outer),
            Err(PlatformError::InvalidOperation(_))
        ));
    }

    #[test]
    fn read_only_collection_rejects_mutation() {
        let (app, native) = test_app();
        let panel = StackPanel::new(&app, Orientation::Vertical).expect("panel");
        let child = Button::new(&app, "b").expect("b");
        panel.children().set_read_only(true);
        native.clear_calls();
        assert!(matches!(
            panel.children().add(&child),
            Err(PlatformError::InvalidOperation(_))
        ));
        assert!(native.calls().is_empty());
        panel.children().set_read_only(false);
        assert!(panel.children().add(&child).is_ok());
    }

    #[test]
    fn disposing_a_child_detaches_it_from_its_parent() {
        let (app, native) = test_app();
        let panel = StackPanel::new(&app, Orientation::Vertical).expect("panel");
        let children = buttons(&app, 2);
        for child in &children {
            panel.children().add(child).expect("add");
        }
        children[0].dispose();
        assert_eq!(panel.children().count(), 1);
        assert_eq!(children[1].index(), Some(0));
        let owner = panel.control().handle().expect("raw");
        assert_eq!(native.children_of(owner).len(), 1);
    }

    #[test]
    fn disposing_a_child_of_a_frozen_collection_still_detaches_it() {
        let (app, native) = test_app();
        let panel = StackPanel::new(&app, Orientation::Vertical).expect("panel");
        let children = buttons(&app, 2);
        for child in &children {
            panel.children().add(child).expect("add");
        }
        panel.children().set_read_only(true);
        children[0].dispose();
        assert!(panel.children().is_read_only());
        assert_eq!(panel.children().count(), 1);
        assert_eq!(panel.children().get(0).as_ref(), Some(children[1].control()));
        let owner = panel.control().handle().expect("raw");
        assert_eq!(
            native.children_of(owner),
            vec![children[1].control().handle().expect("raw")]
        );
        assert!(matches!(
            panel.children().remove(&children[1]),
            Err(PlatformError::InvalidOperation(_))
        ));
    }

    #[test]
    fn disposing_a_container_disposes_children_after_native_delete() {
        // Arrange
        let (app, native) = test_app();
        let panel = StackPanel::new(&app, Orientation::Vertical).expect("panel");
        let child = Button::new(&app, "b").expect("b");
        panel.children().add(&child).expect("add");
        let owner = panel.control().handle().expect("owner");
        let child_raw = child.control().handle().expect("child");
        native.clear_calls();
        // Act
        panel.dispose();
        // Assert
        let calls = native.calls();
        let delete = calls
            .iter()
            .position(|call| *call == NativeCall::Delete { owner, index: 0 })
            .expect("delete");
        let child_destroy = calls
            .iter()
            .position(|call| *call == NativeCall::Destroy(child_raw))
            .expect("child destroy");
        let owner_destroy = calls
            .iter()
            .position(|call| *call == NativeCall::Destroy(owner))
            .expect("owner destroy");
        assert!(delete < child_destroy);
        assert!(child_destroy < owner_destroy);
        assert!(child.is_invalid());
    }

    #[test]
    fn clear_removes_last_first() {
        let (app, native) = test_app();
        let panel = StackPanel::new(&app, Orientation::Vertical).expect("panel");
        for child in &buttons(&app, 3) {
            panel.children().add(child).expect("add");
        }
        let owner = panel.control().handle().expect("raw");
        native.clear_calls();
        panel.children().clear().expect("clear");
        let deletes: Vec<_> = native
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                NativeCall::Delete { owner: o, index } if o == owner => Some(index),
                _ => None,
            })
            .collect();
        assert_eq!(deletes, vec![2, 1, 0]);
        assert!(panel.children().is_empty());
    }

    #[test]
    fn remove_then_re_add_a_fresh_control() {
        let (app, _native) = test_app();
        let panel = StackPanel::new(&app, Orientation::Vertical).expect("panel");
        let first = Button::new(&app, "first").expect("first");
        panel.children().add(&first).expect("add");
        panel.children().remove(&first).expect("remove");
        let second = Button::new(&app, "second").expect("second");
        panel.children().add(&second).expect("add");
        assert_eq!(second.index(), Some(0));
        assert_eq!(panel.children().count(), 1);
    }

    #[test]
    fn iteration_observes_live_state() {
        let (app, _native) = test_app();
        let panel = StackPanel::new(&app, Orientation::Vertical).expect("panel");
        let children = buttons(&app, 3);
        for child in &children {
            panel.children().add(child).expect("add");
        }
        let mut iter = panel.children().iter();
        assert_eq!(iter.next().as_ref(), Some(children[0].control()));
        panel.children().remove(&children[1]).expect("remove");
        assert_eq!(iter.next().as_ref(), Some(children[2].control()));
        assert!(iter.next().is_none());
    }

    #[test]
    fn form_rejects_unlabelled_add_and_insert() {
        let (app, _native) = test_app();
        let form = Form::new(&app).expect("form");
        let label = Label::new(&app, "l").expect("label");
        assert!(matches!(
            form.children().add(&label),
            Err(PlatformError::InvalidOperation(_))
        ));
        form.append("Name", &label, false).expect("append");
        let other = Label::new(&app, "o").expect("other");
        assert!(matches!(
            form.children().insert_with(0, &other, FormSlot::new("Other", false)),
            Err(PlatformError::InvalidOperation(_))
        ));
        assert_eq!(form.children().count(), 1);
    }

    #[test]
    fn failed_native_append_leaves_collection_untouched() {
        let (app, native) = test_app();
        let panel = StackPanel::new(&app, Orientation::Vertical).expect("panel");
        let child = Button::new(&app, "b").expect("b");
        let child_raw = child.control().handle().expect("raw");
        // Attached natively behind the managed layer's back.
        let other = native
            .new_control(&crate::types::ControlClass::StackPanel {
                orientation: Orientation::Vertical,
            })
            .expect("other");
        native.box_append(other, child_raw, false).expect("native append");

        let result = panel.children().add(&child);

        assert!(matches!(result, Err(PlatformError::Native(_))));
        assert_eq!(panel.children().count(), 0);
        assert!(child.parent().is_none());
        assert!(child.enabled().is_ok());
        assert!(child.visible().is_ok());
    }
}
