//! Synthetic input: locating a named control and activating it the way a
//! real user click would.

use tracing::{debug, instrument};

use crate::errors::AutomationError;
use crate::ui::{UiEngine, WidgetHandle};

/// Symbolic names of the controls the dialog policies activate. The engine
/// maps these onto the live widget tree.
pub mod controls {
    pub const SELECT_YES: &str = "select_yes";
    pub const DESYNTHESIZE_CHECKBOX: &str = "desynthesize_checkbox";
    pub const DESYNTHESIZE: &str = "desynthesize";
    pub const MATERIALIZE: &str = "materialize";
    pub const ITEM_INSPECTION_NEXT: &str = "item_inspection_result_next";
    pub const RETAINER_VENTURE_ASSIGN: &str = "retainer_venture_ask_assign";
    pub const RETAINER_VENTURE_REASSIGN: &str = "retainer_venture_result_reassign";
    pub const GC_EXPERT_DELIVERY_DELIVER: &str = "grand_company_expert_delivery_deliver";
    pub const SELL_TRIPLE_TRIAD_CARD: &str = "sell_triple_triad_card";
}

/// What a synthetic activation ended up doing.
#[derive(Debug, Clone)]
pub struct ClickResult {
    pub control: String,
    pub details: String,
}

/// Locate `control` (globally, or under `scope`) and post a synthetic
/// activation to it.
///
/// Widget layout varies by game state, so a control that cannot be located
/// right now is an error the caller treats as non-fatal, not a bug.
#[instrument(level = "debug", skip(engine, scope))]
pub fn send_click(
    engine: &dyn UiEngine,
    control: &str,
    scope: Option<&WidgetHandle>,
) -> Result<ClickResult, AutomationError> {
    let target = engine.find_control(control, scope)?;
    engine.post_activation(&target)?;
    debug!(%control, "synthetic activation posted");
    Ok(ClickResult {
        control: control.to_string(),
        details: format!("activation posted to {target:?}"),
    })
}

/// Post a sequence of global activations, stopping at the first failure.
pub fn send_clicks(engine: &dyn UiEngine, controls: &[&str]) -> Result<(), AutomationError> {
    for control in controls {
        send_click(engine, control, None)?;
    }
    Ok(())
}
