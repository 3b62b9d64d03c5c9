//! Interception of the foreign dialog setup routines.
//!
//! Each hook point wraps one setup function inside the game client. The host
//! supplies the actual detour mechanism behind [`HookBackend`]; this module
//! owns which hooks exist, resolves and attaches them as a batch at startup,
//! and detaches them as a batch at shutdown. Attaching routes the foreign
//! call into [`Plugin::on_setup`](crate::Plugin::on_setup), which always
//! forwards to the captured original first and then applies dialog policy.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::errors::AutomationError;
use crate::ui::{RawPtr, WidgetHandle};

/// The dialog setup routines this core intercepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    SelectYesNo,
    SalvageDialog,
    MaterializeDialog,
    ItemInspectionResult,
    RetainerTaskAsk,
    RetainerTaskResult,
    GrandCompanySupplyReward,
    ShopCardDialog,
}

impl HookKind {
    pub const ALL: [HookKind; 8] = [
        HookKind::SelectYesNo,
        HookKind::SalvageDialog,
        HookKind::MaterializeDialog,
        HookKind::ItemInspectionResult,
        HookKind::RetainerTaskAsk,
        HookKind::RetainerTaskResult,
        HookKind::GrandCompanySupplyReward,
        HookKind::ShopCardDialog,
    ];

    /// Name of the foreign routine this hook wraps.
    pub fn symbol(self) -> &'static str {
        match self {
            HookKind::SelectYesNo => "SelectYesNo.OnSetup",
            HookKind::SalvageDialog => "SalvageDialog.OnSetup",
            HookKind::MaterializeDialog => "MaterializeDialog.OnSetup",
            HookKind::ItemInspectionResult => "ItemInspectionResult.OnSetup",
            HookKind::RetainerTaskAsk => "RetainerTaskAsk.OnSetup",
            HookKind::RetainerTaskResult => "RetainerTaskResult.OnSetup",
            HookKind::GrandCompanySupplyReward => "GrandCompanySupplyReward.OnSetup",
            HookKind::ShopCardDialog => "ShopCardDialog.OnSetup",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A resolved code address inside the loaded process image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetAddress(pub u64);

/// Arguments of a foreign setup call, forwarded unmodified.
#[derive(Debug, Clone, Copy)]
pub struct SetupArgs {
    /// The dialog widget being set up.
    pub widget: WidgetHandle,
    /// Number of entries in the setup value block.
    pub value_count: u32,
    /// The setup value block itself.
    pub values: RawPtr,
}

/// Callable trampoline to the original foreign implementation.
pub trait OriginalFn: Send + Sync {
    fn call(&self, args: &SetupArgs) -> RawPtr;
}

/// The host's detour mechanism: resolves hook targets against the loaded
/// process image and installs/removes the actual trampolines.
pub trait HookBackend: Send + Sync {
    fn resolve(&self, kind: HookKind) -> Result<TargetAddress, AutomationError>;

    /// Install the detour and hand back the trampoline to the original.
    fn attach(
        &self,
        kind: HookKind,
        address: TargetAddress,
    ) -> Result<Arc<dyn OriginalFn>, AutomationError>;

    fn detach(&self, kind: HookKind);
}

struct InstalledHook {
    kind: HookKind,
    address: TargetAddress,
    original: Arc<dyn OriginalFn>,
}

/// Exclusive owner of all hook bindings. Hooks come up together at startup
/// and go down together at shutdown; a hook whose target cannot be resolved
/// is skipped and stays inactive without affecting the rest.
pub struct HookRegistry {
    backend: Arc<dyn HookBackend>,
    installed: Vec<InstalledHook>,
}

impl HookRegistry {
    pub fn new(backend: Arc<dyn HookBackend>) -> Self {
        Self {
            backend,
            installed: Vec::new(),
        }
    }

    /// Resolve and attach every hook point.
    pub fn activate_all(&mut self) {
        for kind in HookKind::ALL {
            let address = match self.backend.resolve(kind) {
                Ok(address) => address,
                Err(err) => {
                    warn!(hook = %kind, %err, "hook target unresolved, hook stays inactive");
                    continue;
                }
            };
            match self.backend.attach(kind, address) {
                Ok(original) => {
                    debug!(hook = %kind, address = ?address, "hook attached");
                    self.installed.push(InstalledHook {
                        kind,
                        address,
                        original,
                    });
                }
                Err(err) => {
                    warn!(hook = %kind, %err, "hook attach failed, hook stays inactive");
                }
            }
        }
        debug!(active = self.installed.len(), "hook activation finished");
    }

    /// Detach everything that was attached. Unconditional: a failed reload
    /// cycle must not leave partial activation behind.
    pub fn deactivate_all(&mut self) {
        for hook in self.installed.drain(..) {
            self.backend.detach(hook.kind);
            debug!(hook = %hook.kind, "hook detached");
        }
    }

    /// Trampoline to the original implementation of an attached hook.
    pub fn original(&self, kind: HookKind) -> Option<Arc<dyn OriginalFn>> {
        self.installed
            .iter()
            .find(|hook| hook.kind == kind)
            .map(|hook| Arc::clone(&hook.original))
    }

    pub fn is_active(&self, kind: HookKind) -> bool {
        self.installed.iter().any(|hook| hook.kind == kind)
    }

    pub fn active_kinds(&self) -> Vec<HookKind> {
        self.installed.iter().map(|hook| hook.kind).collect()
    }

    pub fn address(&self, kind: HookKind) -> Option<TargetAddress> {
        self.installed
            .iter()
            .find(|hook| hook.kind == kind)
            .map(|hook| hook.address)
    }
}
