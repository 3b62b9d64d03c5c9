//! Rule-driven auto-confirmation of in-game dialog prompts.
//!
//! This library intercepts the setup routines of the game client's modal
//! dialogs and, based on a user-authored rule tree, synthesizes the clicks a
//! player would otherwise have to make by hand: confirming yes/no prompts,
//! reassigning retainer ventures, walking through desynthesis and inspection
//! flows. The game process, the detour mechanism, chat output, and the
//! settings window are all host collaborators behind narrow traits; the core
//! here is the rule matching, the hook dispatch, and the input synthesis.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use tracing::{debug, error, info, instrument};

pub mod click;
pub mod config;
mod dialogs;
pub mod errors;
pub mod hooks;
pub mod rules;
pub mod text;
#[cfg(test)]
mod tests;
pub mod ui;
pub mod zones;

pub use click::{send_click, send_clicks, ClickResult};
pub use config::{Config, ConfigStore, JsonFileStore, CURRENT_CONFIG_VERSION};
pub use errors::AutomationError;
pub use hooks::{HookBackend, HookKind, HookRegistry, OriginalFn, SetupArgs, TargetAddress};
pub use rules::{Evaluation, FolderNode, RuleNode, TextEntryNode};
pub use text::{Payload, RichText};
pub use ui::{DialogFlag, ForeignMemory, RawPtr, UiEngine, WidgetHandle};
pub use zones::{ZoneDataSource, ZoneNameTable, ZoneRecord};

pub const PLUGIN_NAME: &str = "AutoConfirm";

/// The chat command that opens the settings surface.
pub const COMMAND: &str = "autoconfirm";

/// Host-side chat/notification output.
pub trait ChatSink: Send + Sync {
    fn print(&self, message: &RichText);
    fn print_error(&self, message: &str);
}

/// Host-side command binding. The host routes invocations of a registered
/// command back into [`Plugin::on_command`].
pub trait CommandRegistry: Send + Sync {
    fn register(&self, command: &str, help: &str) -> Result<(), AutomationError>;
    fn unregister(&self, command: &str);
}

/// The settings window. Rendering it is outside this crate.
pub trait SettingsSurface: Send + Sync {
    fn open(&self);
}

/// Everything the host supplies to bring the plugin up.
pub struct Host {
    pub engine: Arc<dyn UiEngine>,
    pub hook_backend: Arc<dyn HookBackend>,
    pub chat: Arc<dyn ChatSink>,
    pub zone_data: Arc<dyn ZoneDataSource>,
    pub commands: Arc<dyn CommandRegistry>,
    pub settings: Arc<dyn SettingsSurface>,
    pub config_store: Arc<dyn ConfigStore>,
}

/// Chat output with the plugin's fixed tag prefixed to every message.
pub struct Messenger {
    chat: Arc<dyn ChatSink>,
}

impl Messenger {
    pub fn new(chat: Arc<dyn ChatSink>) -> Self {
        Self { chat }
    }

    pub fn print(&self, mut message: RichText) {
        message.insert_prefix(&format!("[{PLUGIN_NAME}] "));
        self.chat.print(&message);
    }

    pub fn print_text(&self, message: &str) {
        self.print(RichText::plain(message));
    }

    pub fn print_error(&self, message: &str) {
        self.chat.print_error(&format!("[{PLUGIN_NAME}] {message}"));
    }
}

/// The automation layer. One instance lives for the whole host session:
/// [`Plugin::start`] loads configuration, builds the zone table, registers
/// the command, and attaches every hook; [`Plugin::shutdown`] tears all of it
/// down as a batch.
pub struct Plugin {
    engine: Arc<dyn UiEngine>,
    messenger: Messenger,
    config_store: Arc<dyn ConfigStore>,
    settings: Arc<dyn SettingsSurface>,
    commands: Arc<dyn CommandRegistry>,
    config: Mutex<Config>,
    zones: ZoneNameTable,
    hooks: RwLock<HookRegistry>,
    last_seen_dialog_text: Mutex<String>,
}

impl Plugin {
    /// Bring the plugin up against a host.
    ///
    /// Configuration older than the current version is migrated forward and
    /// saved back. Hooks whose targets cannot be resolved are skipped with a
    /// warning; everything else comes up.
    #[instrument(skip(host))]
    pub fn start(host: Host) -> anyhow::Result<Self> {
        let mut config = host.config_store.load()?;
        if config.upgrade() {
            host.config_store.save(&config)?;
        }

        host.commands
            .register(COMMAND, "Open the rule editor window.")?;

        let zones = ZoneNameTable::load(host.zone_data.as_ref());

        let mut hooks = HookRegistry::new(host.hook_backend);
        hooks.activate_all();

        info!(
            zones = zones.len(),
            hooks = hooks.active_kinds().len(),
            "plugin started"
        );

        Ok(Self {
            engine: host.engine,
            messenger: Messenger::new(host.chat),
            config_store: host.config_store,
            settings: host.settings,
            commands: host.commands,
            config: Mutex::new(config),
            zones,
            hooks: RwLock::new(hooks),
            last_seen_dialog_text: Mutex::new(String::new()),
        })
    }

    /// Detour entry point. The host's installed trampolines route every
    /// intercepted setup call here.
    ///
    /// The original implementation always runs first, since policy decisions
    /// depend on the state it establishes, and its return value is passed
    /// through unchanged no matter what the policy does. A policy fault is
    /// logged and swallowed; nothing may escape into the host.
    pub fn on_setup(&self, kind: HookKind, args: &SetupArgs) -> RawPtr {
        debug!(hook = %kind, "setup intercepted");

        let original = self
            .hooks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .original(kind);
        let Some(original) = original else {
            // A detour fired for a hook that was never attached; there is no
            // original to forward to.
            error!(hook = %kind, "setup dispatched for an inactive hook");
            return RawPtr::NULL;
        };

        let result = original.call(args);

        let policy = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.apply_policy(kind, args)
        }));
        match policy {
            Ok(Ok(())) => {}
            Ok(Err(err)) => error!(hook = %kind, %err, "policy evaluation failed"),
            Err(_) => error!(hook = %kind, "policy evaluation panicked"),
        }

        result
    }

    fn apply_policy(&self, kind: HookKind, args: &SetupArgs) -> Result<(), AutomationError> {
        let config = lock_unpoisoned(&self.config);
        let ctx = dialogs::PolicyCtx {
            engine: self.engine.as_ref(),
            messenger: &self.messenger,
            config: &config,
            zones: &self.zones,
            last_seen_dialog_text: &self.last_seen_dialog_text,
        };
        dialogs::apply(&ctx, kind, args)
    }

    /// Invoked by the host when the registered command fires. Arguments are
    /// ignored beyond presence; the command only opens the settings surface.
    pub fn on_command(&self, _arguments: &str) {
        self.settings.open();
    }

    /// Tear everything down as a batch: command binding and all hooks.
    pub fn shutdown(&self) {
        self.commands.unregister(COMMAND);
        self.hooks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .deactivate_all();
        info!("plugin shut down");
    }

    /// Persist the current configuration.
    pub fn save_config(&self) {
        let config = lock_unpoisoned(&self.config);
        if let Err(err) = self.config_store.save(&config) {
            error!(%err, "failed to save configuration");
            self.messenger.print_error("Failed to save configuration.");
        }
    }

    /// The configuration, for reading or for mutation by the settings
    /// surface. The host model serializes settings edits with dispatch.
    pub fn config(&self) -> MutexGuard<'_, Config> {
        lock_unpoisoned(&self.config)
    }

    /// Flattened text of the most recently intercepted yes/no dialog.
    pub fn last_seen_dialog_text(&self) -> String {
        lock_unpoisoned(&self.last_seen_dialog_text).clone()
    }

    pub fn zones(&self) -> &ZoneNameTable {
        &self.zones
    }

    pub fn active_hooks(&self) -> Vec<HookKind> {
        self.hooks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .active_kinds()
    }

    pub fn messenger(&self) -> &Messenger {
        &self.messenger
    }
}

/// Locks that only guard plain data stay usable after a poisoning panic.
pub(crate) fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
