//! A fake host for driving the plugin end-to-end: in-memory widget tree,
//! byte-addressable fake process memory, a recording hook backend, and
//! recording chat/command sinks. Every action lands in one shared log so
//! tests can assert ordering across collaborators.

// Each test binary uses its own subset of the fixture surface.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use autoconfirm::{
    AutomationError, ChatSink, CommandRegistry, Config, ConfigStore, DialogFlag, ForeignMemory,
    Host, HookBackend, HookKind, OriginalFn, RawPtr, RichText, SettingsSurface, SetupArgs,
    TargetAddress, UiEngine, WidgetHandle, ZoneDataSource, ZoneRecord,
};

/// Return value every fake original reports, so tests can assert passthrough.
pub const ORIGINAL_RESULT: RawPtr = RawPtr(0xBEEF);

#[derive(Debug, Default, Clone)]
pub struct FakeWidget {
    pub visible: bool,
    pub enabled: bool,
    pub text_addr: Option<u64>,
    pub slot_count: usize,
    pub slots: HashMap<usize, u64>,
}

impl FakeWidget {
    pub fn interactive() -> Self {
        Self {
            visible: true,
            enabled: true,
            ..Self::default()
        }
    }
}

pub struct FakeUi {
    memory: Mutex<HashMap<u64, u8>>,
    pointers: Mutex<HashMap<u64, u64>>,
    widgets: Mutex<HashMap<u64, FakeWidget>>,
    controls: Mutex<HashMap<(Option<u64>, String), u64>>,
    zone_id: AtomicU32,
    pub panic_on_activation: AtomicBool,
    log: Arc<Mutex<Vec<String>>>,
}

impl FakeUi {
    fn new(log: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            memory: Mutex::new(HashMap::new()),
            pointers: Mutex::new(HashMap::new()),
            widgets: Mutex::new(HashMap::new()),
            controls: Mutex::new(HashMap::new()),
            zone_id: AtomicU32::new(0),
            panic_on_activation: AtomicBool::new(false),
            log,
        }
    }

    /// Write a null-terminated string into fake process memory.
    pub fn put_cstr(&self, addr: u64, text: &str) {
        let mut memory = self.memory.lock().unwrap();
        for (i, &b) in text.as_bytes().iter().enumerate() {
            memory.insert(addr + i as u64, b);
        }
        memory.insert(addr + text.len() as u64, 0);
    }

    /// Write a pointer-sized slot.
    pub fn put_ptr(&self, addr: u64, value: u64) {
        self.pointers.lock().unwrap().insert(addr, value);
    }

    pub fn add_widget(&self, id: u64, widget: FakeWidget) -> WidgetHandle {
        self.widgets.lock().unwrap().insert(id, widget);
        WidgetHandle(id)
    }

    /// Register a named control, optionally scoped under a widget subtree.
    pub fn add_control(&self, scope: Option<u64>, name: &str, id: u64) -> WidgetHandle {
        self.add_widget(id, FakeWidget::interactive());
        self.controls
            .lock()
            .unwrap()
            .insert((scope, name.to_string()), id);
        WidgetHandle(id)
    }

    pub fn set_zone_id(&self, id: u32) {
        self.zone_id.store(id, Ordering::SeqCst);
    }

    pub fn widget_enabled(&self, id: u64) -> bool {
        self.widgets.lock().unwrap()[&id].enabled
    }

    fn control_name(&self, id: u64) -> String {
        self.controls
            .lock()
            .unwrap()
            .iter()
            .find(|(_, &v)| v == id)
            .map(|((_, name), _)| name.clone())
            .unwrap_or_else(|| format!("widget#{id}"))
    }
}

impl ForeignMemory for FakeUi {
    fn read_u8(&self, ptr: RawPtr) -> Option<u8> {
        self.memory.lock().unwrap().get(&ptr.0).copied()
    }

    fn read_ptr(&self, ptr: RawPtr) -> Option<RawPtr> {
        self.pointers.lock().unwrap().get(&ptr.0).copied().map(RawPtr)
    }
}

impl UiEngine for FakeUi {
    fn find_control(
        &self,
        name: &str,
        scope: Option<&WidgetHandle>,
    ) -> Result<WidgetHandle, AutomationError> {
        let key = (scope.map(|s| s.0), name.to_string());
        self.controls
            .lock()
            .unwrap()
            .get(&key)
            .copied()
            .map(WidgetHandle)
            .ok_or_else(|| AutomationError::ControlNotFound(name.to_string()))
    }

    fn post_activation(&self, control: &WidgetHandle) -> Result<(), AutomationError> {
        if self.panic_on_activation.load(Ordering::SeqCst) {
            panic!("activation exploded");
        }
        let name = self.control_name(control.0);
        self.log.lock().unwrap().push(format!("click:{name}"));
        Ok(())
    }

    fn node_count(&self, widget: &WidgetHandle) -> usize {
        self.widgets
            .lock()
            .unwrap()
            .get(&widget.0)
            .map_or(0, |w| w.slot_count)
    }

    fn node_at(&self, widget: &WidgetHandle, index: usize) -> Option<WidgetHandle> {
        self.widgets
            .lock()
            .unwrap()
            .get(&widget.0)?
            .slots
            .get(&index)
            .copied()
            .map(WidgetHandle)
    }

    fn is_visible(&self, widget: &WidgetHandle) -> bool {
        self.widgets
            .lock()
            .unwrap()
            .get(&widget.0)
            .is_some_and(|w| w.visible)
    }

    fn is_enabled(&self, widget: &WidgetHandle) -> bool {
        self.widgets
            .lock()
            .unwrap()
            .get(&widget.0)
            .is_some_and(|w| w.enabled)
    }

    fn set_enabled(&self, widget: &WidgetHandle, enabled: bool) {
        if let Some(w) = self.widgets.lock().unwrap().get_mut(&widget.0) {
            w.enabled = enabled;
        }
        self.log
            .lock()
            .unwrap()
            .push(format!("set_enabled:{}={enabled}", widget.0));
    }

    fn text_ptr(&self, widget: &WidgetHandle) -> Option<RawPtr> {
        self.widgets
            .lock()
            .unwrap()
            .get(&widget.0)?
            .text_addr
            .map(RawPtr)
    }

    fn set_dialog_flag(&self, widget: &WidgetHandle, flag: DialogFlag, value: bool) {
        self.log
            .lock()
            .unwrap()
            .push(format!("flag:{}:{flag:?}={value}", widget.0));
    }

    fn current_zone_id(&self) -> u32 {
        self.zone_id.load(Ordering::SeqCst)
    }
}

struct FakeOriginal {
    kind: HookKind,
    log: Arc<Mutex<Vec<String>>>,
}

impl OriginalFn for FakeOriginal {
    fn call(&self, _args: &SetupArgs) -> RawPtr {
        self.log
            .lock()
            .unwrap()
            .push(format!("original:{}", self.kind));
        ORIGINAL_RESULT
    }
}

pub struct FakeBackend {
    pub unresolvable: Mutex<HashSet<HookKind>>,
    pub detached: Mutex<Vec<HookKind>>,
    log: Arc<Mutex<Vec<String>>>,
}

impl HookBackend for FakeBackend {
    fn resolve(&self, kind: HookKind) -> Result<TargetAddress, AutomationError> {
        if self.unresolvable.lock().unwrap().contains(&kind) {
            return Err(AutomationError::HookUnresolved(kind.symbol().to_string()));
        }
        Ok(TargetAddress(0x1000 + kind as u64))
    }

    fn attach(
        &self,
        kind: HookKind,
        _address: TargetAddress,
    ) -> Result<Arc<dyn OriginalFn>, AutomationError> {
        Ok(Arc::new(FakeOriginal {
            kind,
            log: self.log.clone(),
        }))
    }

    fn detach(&self, kind: HookKind) {
        self.detached.lock().unwrap().push(kind);
    }
}

#[derive(Default)]
pub struct RecordingChat {
    pub messages: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<String>>,
}

impl ChatSink for RecordingChat {
    fn print(&self, message: &RichText) {
        self.messages.lock().unwrap().push(message.flatten());
    }

    fn print_error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

pub struct MemoryConfigStore {
    pub stored: Mutex<Option<Config>>,
    pub saves: Mutex<Vec<Config>>,
}

impl MemoryConfigStore {
    pub fn holding(config: Config) -> Self {
        Self {
            stored: Mutex::new(Some(config)),
            saves: Mutex::new(Vec::new()),
        }
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load(&self) -> anyhow::Result<Config> {
        Ok(self.stored.lock().unwrap().clone().unwrap_or_default())
    }

    fn save(&self, config: &Config) -> anyhow::Result<()> {
        *self.stored.lock().unwrap() = Some(config.clone());
        self.saves.lock().unwrap().push(config.clone());
        Ok(())
    }
}

pub struct StaticZoneData(pub Vec<ZoneRecord>);

impl ZoneDataSource for StaticZoneData {
    fn zone_records(&self) -> Vec<ZoneRecord> {
        self.0.clone()
    }
}

#[derive(Default)]
pub struct RecordingCommands {
    pub registered: Mutex<Vec<String>>,
    pub unregistered: Mutex<Vec<String>>,
}

impl CommandRegistry for RecordingCommands {
    fn register(&self, command: &str, _help: &str) -> Result<(), AutomationError> {
        self.registered.lock().unwrap().push(command.to_string());
        Ok(())
    }

    fn unregister(&self, command: &str) {
        self.unregistered.lock().unwrap().push(command.to_string());
    }
}

#[derive(Default)]
pub struct CountingSettings {
    pub opened: Mutex<u32>,
}

impl SettingsSurface for CountingSettings {
    fn open(&self) {
        *self.opened.lock().unwrap() += 1;
    }
}

/// Assembles a full fake [`Host`] and keeps handles to every collaborator.
pub struct TestHost {
    pub ui: Arc<FakeUi>,
    pub backend: Arc<FakeBackend>,
    pub chat: Arc<RecordingChat>,
    pub store: Arc<MemoryConfigStore>,
    pub commands: Arc<RecordingCommands>,
    pub settings: Arc<CountingSettings>,
    zones: Vec<ZoneRecord>,
    log: Arc<Mutex<Vec<String>>>,
}

impl TestHost {
    pub fn new(config: Config) -> Self {
        Self::with_zones(config, Vec::new())
    }

    pub fn with_zones(config: Config, zones: Vec<ZoneRecord>) -> Self {
        let log = Arc::new(Mutex::new(Vec::new()));
        Self {
            ui: Arc::new(FakeUi::new(log.clone())),
            backend: Arc::new(FakeBackend {
                unresolvable: Mutex::new(HashSet::new()),
                detached: Mutex::new(Vec::new()),
                log: log.clone(),
            }),
            chat: Arc::new(RecordingChat::default()),
            store: Arc::new(MemoryConfigStore::holding(config)),
            commands: Arc::new(RecordingCommands::default()),
            settings: Arc::new(CountingSettings::default()),
            zones,
            log,
        }
    }

    pub fn host(&self) -> Host {
        Host {
            engine: self.ui.clone(),
            hook_backend: self.backend.clone(),
            chat: self.chat.clone(),
            zone_data: Arc::new(StaticZoneData(self.zones.clone())),
            commands: self.commands.clone(),
            settings: self.settings.clone(),
            config_store: self.store.clone(),
        }
    }

    /// Every recorded action, in order.
    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    /// Just the synthetic activations, in order.
    pub fn clicks(&self) -> Vec<String> {
        self.log()
            .into_iter()
            .filter_map(|entry| entry.strip_prefix("click:").map(str::to_string))
            .collect()
    }
}
