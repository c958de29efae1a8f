pub mod advice;
pub mod controller;
pub mod host;
pub mod plugin;
pub mod scheduler;
pub mod settings;
pub mod store;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use advice::{AdviceProvider, ProviderKind, RandomAdvice, ScopeEchoAdvice};
pub use controller::{Activation, Delivery, PanelController, ToggleOutcome};
pub use host::{
    CommandHost, CommandSpec, Host, HostError, Notifier, PanelId, RibbonSpec, ViewHost, ViewState,
};
pub use plugin::{AdvicePlugin, PluginAction};
pub use scheduler::{
    Clock, IdleAdviceScheduler, ManualClock, SystemClock, TimerSlot, DEFAULT_QUIET_INTERVAL,
};
pub use settings::{Settings, SettingsField, SettingsForm};
pub use store::{JsonFileStore, MemoryStore, PersistenceError, PersistenceStore};
pub use view::{AdviceView, AdviceViewModel};
