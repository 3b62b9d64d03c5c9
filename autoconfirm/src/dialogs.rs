//! Per-dialog policy: what to do after each intercepted setup call.
//!
//! Every policy runs after the original setup has completed, so button
//! enablement, widget visibility, and text buffers are in the state the game
//! put them in. All policies are gated by the master switch; the yes/no
//! dialog additionally consults the rule tree, the rest are plain feature
//! flags.

use std::sync::Mutex;

use tracing::debug;

use crate::click::{controls, send_click, send_clicks};
use crate::config::Config;
use crate::errors::AutomationError;
use crate::hooks::{HookKind, SetupArgs};
use crate::ui::{InspectionResult, SalvageDialog, UiEngine, YesNoDialog};
use crate::zones::ZoneNameTable;
use crate::Messenger;

/// Everything a policy is allowed to touch.
pub(crate) struct PolicyCtx<'a> {
    pub engine: &'a dyn UiEngine,
    pub messenger: &'a Messenger,
    pub config: &'a Config,
    pub zones: &'a ZoneNameTable,
    pub last_seen_dialog_text: &'a Mutex<String>,
}

pub(crate) fn apply(
    ctx: &PolicyCtx<'_>,
    kind: HookKind,
    args: &SetupArgs,
) -> Result<(), AutomationError> {
    match kind {
        HookKind::SelectYesNo => select_yes_no(ctx, args),
        HookKind::SalvageDialog => salvage_dialog(ctx, args),
        HookKind::MaterializeDialog => {
            clicks_when(ctx, ctx.config.materialize_dialog, &[controls::MATERIALIZE])
        }
        HookKind::ItemInspectionResult => item_inspection_result(ctx, args),
        HookKind::RetainerTaskAsk => clicks_when(
            ctx,
            ctx.config.retainer_task_ask,
            &[controls::RETAINER_VENTURE_ASSIGN],
        ),
        // The result window needs two activations to restart a venture.
        HookKind::RetainerTaskResult => clicks_when(
            ctx,
            ctx.config.retainer_task_result,
            &[
                controls::RETAINER_VENTURE_REASSIGN,
                controls::RETAINER_VENTURE_REASSIGN,
            ],
        ),
        HookKind::GrandCompanySupplyReward => clicks_when(
            ctx,
            ctx.config.grand_company_supply_reward,
            &[controls::GC_EXPERT_DELIVERY_DELIVER],
        ),
        HookKind::ShopCardDialog => clicks_when(
            ctx,
            ctx.config.shop_card_dialog,
            &[controls::SELL_TRIPLE_TRIAD_CARD],
        ),
    }
}

fn select_yes_no(ctx: &PolicyCtx<'_>, args: &SetupArgs) -> Result<(), AutomationError> {
    let dialog = YesNoDialog::new(ctx.engine, args.widget);
    let text = dialog.prompt_text(args.values).flatten();
    debug!(%text, "yes/no dialog text");

    // Retained even while automation is off, for the settings preview.
    *crate::lock_unpoisoned(ctx.last_seen_dialog_text) = text.clone();

    if !ctx.config.enabled {
        return Ok(());
    }

    let zone_name = ctx.zones.resolve(ctx.engine.current_zone_id());
    let outcome = ctx.config.root.evaluate(&text, zone_name);
    if outcome.zone_unresolved {
        ctx.messenger
            .print_text("Unable to verify a zone-restricted entry, change zones to update the value");
    }
    let Some(entry) = outcome.matched else {
        return Ok(());
    };

    debug!(rule = %entry.name(), "dialog matched, confirming");
    dialog.ensure_yes_enabled();
    send_click(ctx.engine, controls::SELECT_YES, Some(&args.widget))?;
    Ok(())
}

fn salvage_dialog(ctx: &PolicyCtx<'_>, args: &SetupArgs) -> Result<(), AutomationError> {
    if ctx.config.enabled && ctx.config.desynth_bulk_dialog {
        SalvageDialog::new(ctx.engine, args.widget).enable_bulk();
    }
    clicks_when(
        ctx,
        ctx.config.desynth_dialog,
        &[controls::DESYNTHESIZE_CHECKBOX, controls::DESYNTHESIZE],
    )
}

fn item_inspection_result(ctx: &PolicyCtx<'_>, args: &SetupArgs) -> Result<(), AutomationError> {
    if ctx.config.enabled && ctx.config.item_inspection_result {
        let view = InspectionResult::new(ctx.engine, args.widget);
        if let Some(mut item_name) = view.new_item_name(&ctx.config.new_item_markers) {
            item_name.insert_prefix("Received: ");
            ctx.messenger.print(item_name);
        }
    }
    clicks_when(
        ctx,
        ctx.config.item_inspection_result,
        &[controls::ITEM_INSPECTION_NEXT],
    )
}

/// Post a fixed activation sequence when the master switch and the given
/// feature flag are both on.
fn clicks_when(
    ctx: &PolicyCtx<'_>,
    enabled: bool,
    controls: &[&str],
) -> Result<(), AutomationError> {
    if !(ctx.config.enabled && enabled) {
        return Ok(());
    }
    send_clicks(ctx.engine, controls)
}
