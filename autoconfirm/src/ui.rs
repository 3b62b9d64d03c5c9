//! Access to the foreign widget system.
//!
//! Everything the automation core knows about the game's live UI goes through
//! the [`UiEngine`] trait: control lookup, synthetic activation, widget state
//! reads and writes, and raw memory access for encoded text buffers. The host
//! embedding supplies the implementation; tests supply fakes. Typed dialog
//! views at the bottom of this module keep slot indices and value-block
//! offsets in one place instead of scattering them through policy code.

use tracing::debug;

use crate::errors::AutomationError;
use crate::text::{read_terminated, RichText};

/// An opaque address inside the foreign process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RawPtr(pub u64);

impl RawPtr {
    pub const NULL: RawPtr = RawPtr(0);

    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    pub fn offset(self, delta: u64) -> RawPtr {
        RawPtr(self.0.wrapping_add(delta))
    }
}

/// An opaque reference to a live widget in the foreign UI tree.
///
/// Handles are only meaningful to the engine that produced them and only for
/// as long as the widget exists; the core never dereferences one itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WidgetHandle(pub u64);

/// Byte-level reads out of the foreign process.
pub trait ForeignMemory {
    /// Read one byte, or `None` if the address is not readable.
    fn read_u8(&self, ptr: RawPtr) -> Option<u8>;

    /// Read a pointer-sized slot, or `None` if the address is not readable.
    fn read_ptr(&self, ptr: RawPtr) -> Option<RawPtr>;
}

/// Widget-state flags the core is allowed to mutate directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogFlag {
    /// The salvage dialog's bulk-mode toggle.
    BulkDesynthesis,
}

/// The surface the host's UI system exposes to the automation core.
pub trait UiEngine: ForeignMemory + Send + Sync {
    /// Locate a named interactive control, either globally or under the given
    /// widget subtree.
    fn find_control(
        &self,
        name: &str,
        scope: Option<&WidgetHandle>,
    ) -> Result<WidgetHandle, AutomationError>;

    /// Raise the same event a real user activation would raise on the control
    /// (mouse-down + mouse-up equivalent). Fire-and-forget.
    fn post_activation(&self, control: &WidgetHandle) -> Result<(), AutomationError>;

    /// Number of entries in the widget's child node list.
    fn node_count(&self, widget: &WidgetHandle) -> usize;

    /// Child node at a fixed slot index, if present.
    fn node_at(&self, widget: &WidgetHandle, index: usize) -> Option<WidgetHandle>;

    fn is_visible(&self, widget: &WidgetHandle) -> bool;

    fn is_enabled(&self, widget: &WidgetHandle) -> bool;

    fn set_enabled(&self, widget: &WidgetHandle, enabled: bool);

    /// Address of the widget's encoded text buffer, if it has one.
    fn text_ptr(&self, widget: &WidgetHandle) -> Option<RawPtr>;

    /// Flip a known dialog flag. The engine owns the offset knowledge.
    fn set_dialog_flag(&self, widget: &WidgetHandle, flag: DialogFlag, value: bool);

    /// Identifier of the zone the player is currently in; 0 when not yet known.
    fn current_zone_id(&self) -> u32;
}

/// Offset of the dialog body text pointer inside the yes/no setup value block.
const YESNO_TEXT_SLOT: u64 = 0x8;

/// The confirmation dialog. Knows how to pull the prompt text out of the
/// setup value block and how to make the affirmative button usable.
pub struct YesNoDialog<'a> {
    engine: &'a dyn UiEngine,
    handle: WidgetHandle,
}

impl<'a> YesNoDialog<'a> {
    pub fn new(engine: &'a dyn UiEngine, handle: WidgetHandle) -> Self {
        Self { engine, handle }
    }

    /// Decode the dialog body text referenced by the setup value block.
    pub fn prompt_text(&self, values: RawPtr) -> RichText {
        let text_ptr = self
            .engine
            .read_ptr(values.offset(YESNO_TEXT_SLOT))
            .unwrap_or(RawPtr::NULL);
        RichText::decode(&read_terminated(self.engine, text_ptr))
    }

    /// The affirmative button starts out disabled on some prompts; flip it on
    /// so the synthetic activation is accepted.
    pub fn ensure_yes_enabled(&self) {
        let Ok(button) = self
            .engine
            .find_control(crate::click::controls::SELECT_YES, Some(&self.handle))
        else {
            return;
        };
        if !self.engine.is_enabled(&button) {
            debug!("enabling the yes button");
            self.engine.set_enabled(&button, true);
        }
    }
}

/// The desynthesis dialog.
pub struct SalvageDialog<'a> {
    engine: &'a dyn UiEngine,
    handle: WidgetHandle,
}

impl<'a> SalvageDialog<'a> {
    pub fn new(engine: &'a dyn UiEngine, handle: WidgetHandle) -> Self {
        Self { engine, handle }
    }

    pub fn enable_bulk(&self) {
        self.engine
            .set_dialog_flag(&self.handle, DialogFlag::BulkDesynthesis, true);
    }
}

/// The item inspection result window.
pub struct InspectionResult<'a> {
    engine: &'a dyn UiEngine,
    handle: WidgetHandle,
}

impl<'a> InspectionResult<'a> {
    /// Node-list slot holding the inspected item's name.
    const ITEM_NAME_SLOT: usize = 64;
    /// Node-list slot holding the inspected item's description.
    const ITEM_DESC_SLOT: usize = 55;

    pub fn new(engine: &'a dyn UiEngine, handle: WidgetHandle) -> Self {
        Self { engine, handle }
    }

    /// When the inspected item carries one of the "newly discovered" markers
    /// in its description, return the item's name for announcement.
    ///
    /// The markers are locale-specific literal substrings supplied by
    /// configuration; the window layout varies between game states, so any
    /// missing or hidden slot simply yields `None`.
    pub fn new_item_name(&self, markers: &[String]) -> Option<RichText> {
        if self.engine.node_count(&self.handle) <= Self::ITEM_NAME_SLOT {
            return None;
        }
        let name_node = self.engine.node_at(&self.handle, Self::ITEM_NAME_SLOT)?;
        let desc_node = self.engine.node_at(&self.handle, Self::ITEM_DESC_SLOT)?;
        if !self.engine.is_visible(&name_node) || !self.engine.is_visible(&desc_node) {
            return None;
        }

        let desc_ptr = self.engine.text_ptr(&desc_node)?;
        let description = RichText::decode(&read_terminated(self.engine, desc_ptr)).flatten();
        if !markers.iter().any(|marker| description.contains(marker)) {
            return None;
        }

        let name_ptr = self.engine.text_ptr(&name_node)?;
        Some(RichText::decode(&read_terminated(self.engine, name_ptr)))
    }
}
