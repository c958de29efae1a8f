use crate::advice::AdviceProvider;
use crate::controller::{Activation, Delivery, PanelController, ToggleOutcome};
use crate::host::{CommandSpec, Host, RibbonSpec, ViewHost};
use crate::scheduler::{Clock, IdleAdviceScheduler, SystemClock};
use crate::settings::{Settings, SettingsField};
use crate::store::{PersistenceError, PersistenceStore};
use crate::view::{ADVICE_VIEW_TYPE, RIBBON_ICON, TOGGLE_COMMAND_ID, TOGGLE_TITLE};
use std::time::Duration;
use tracing::{debug, info, warn};

pub const SETTINGS_SAVE_FAILED_NOTICE: &str = "AIdvice: failed to save settings";

/// User-invoked entry points the host routes back into the plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginAction {
    /// The toggle command or the ribbon icon.
    ToggleAdviceView,
    /// The panel's "Get Advice" button.
    GetAdvice,
}

pub struct AdvicePlugin<S: PersistenceStore, C: Clock = SystemClock> {
    settings: Settings,
    store: S,
    provider: Box<dyn AdviceProvider>,
    controller: PanelController,
    scheduler: IdleAdviceScheduler<C>,
    advice_wanted: bool,
    loaded: bool,
}

impl<S: PersistenceStore, C: Clock> AdvicePlugin<S, C> {
    /// Load settings and register the view, the toggle command and the ribbon icon.
    pub fn load<H: Host + ?Sized>(
        host: &mut H,
        store: S,
        provider: Box<dyn AdviceProvider>,
        scheduler: IdleAdviceScheduler<C>,
    ) -> Self {
        let persisted = match store.load_data() {
            Ok(data) => data,
            Err(err) => {
                warn!(event = "settings_load_failed", error = %err);
                None
            }
        };
        let settings = Settings::from_persisted(persisted);

        host.register_view(ADVICE_VIEW_TYPE);
        host.add_ribbon_icon(RibbonSpec {
            icon: RIBBON_ICON.to_string(),
            title: TOGGLE_TITLE.to_string(),
        });
        host.add_command(CommandSpec {
            id: TOGGLE_COMMAND_ID.to_string(),
            name: TOGGLE_TITLE.to_string(),
        });

        info!(
            event = "plugin_loaded",
            quiet_ms = scheduler.quiet_interval().as_millis() as u64,
            has_key = settings.has_api_key()
        );

        Self {
            settings,
            store,
            provider,
            controller: PanelController::new(),
            scheduler,
            advice_wanted: false,
            loaded: true,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn controller(&self) -> &PanelController {
        &self.controller
    }

    pub fn scheduler(&self) -> &IdleAdviceScheduler<C> {
        &self.scheduler
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn has_panel<H: ViewHost + ?Sized>(&self, host: &H) -> bool {
        self.controller.has_panel(host)
    }

    pub fn on_layout_ready<H: Host + ?Sized>(&mut self, host: &mut H) -> Option<Activation> {
        self.activate(host)
    }

    /// Reveal the advice panel, creating it if needed.
    ///
    /// Advice is requested when the panel is new, or when an earlier request found no panel
    /// to land in. Revealing a panel that already shows advice does not regenerate it.
    pub fn activate<H: Host + ?Sized>(&mut self, host: &mut H) -> Option<Activation> {
        if !self.loaded {
            return None;
        }
        let activation = self.controller.activate(host);
        self.after_activation(host, activation);
        Some(activation)
    }

    pub fn toggle<H: Host + ?Sized>(&mut self, host: &mut H) -> Option<ToggleOutcome> {
        if !self.loaded {
            return None;
        }
        let outcome = self.controller.toggle(host);
        if let ToggleOutcome::Opened(activation) = outcome {
            self.after_activation(host, activation);
        }
        Some(outcome)
    }

    pub fn dispatch<H: Host + ?Sized>(&mut self, host: &mut H, action: PluginAction) {
        debug!(event = "action", action = ?action);
        match action {
            PluginAction::ToggleAdviceView => {
                self.toggle(host);
            }
            PluginAction::GetAdvice => {
                self.request_advice(host);
            }
        }
    }

    /// An edit happened in the observed document.
    pub fn on_edit(&mut self) {
        if self.loaded {
            self.scheduler.on_edit();
        }
    }

    /// Drive the idle timer. Returns true when it fired and advice was requested.
    pub fn tick<H: Host + ?Sized>(&mut self, host: &mut H) -> bool {
        if !self.loaded || !self.scheduler.poll() {
            return false;
        }
        self.request_advice(host);
        true
    }

    pub fn time_until_fire(&self) -> Option<Duration> {
        self.scheduler.time_until_fire()
    }

    /// Generate advice and hand it to the panel, if one is open.
    pub fn request_advice<H: Host + ?Sized>(&mut self, host: &mut H) -> Option<Delivery> {
        if !self.loaded {
            return None;
        }
        let advice = self.provider.generate(&self.settings);
        let delivery = self.controller.deliver_advice(host, &advice);
        self.advice_wanted = delivery == Delivery::NoPanel;
        Some(delivery)
    }

    /// Apply one settings-form change and persist the whole mapping.
    pub fn commit_setting<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        field: SettingsField,
        value: String,
    ) -> Result<(), PersistenceError> {
        field.set(&mut self.settings, value);
        let result = self.save_settings();
        if let Err(err) = &result {
            warn!(event = "settings_save_failed", error = %err);
            host.notice(SETTINGS_SAVE_FAILED_NOTICE);
        }
        result
    }

    /// Cancel the pending timer and drop the panel handle. Every entry point is inert after.
    pub fn unload(&mut self) {
        if !self.loaded {
            return;
        }
        self.scheduler.shutdown();
        self.controller.release();
        self.advice_wanted = false;
        self.loaded = false;
        info!(event = "plugin_unloaded");
    }

    fn save_settings(&mut self) -> Result<(), PersistenceError> {
        let value = self.settings.to_value()?;
        self.store.save_data(&value)
    }

    fn after_activation<H: Host + ?Sized>(&mut self, host: &mut H, activation: Activation) {
        let wants_advice = match activation {
            Activation::Created(_) => true,
            Activation::Revealed(_) => self.advice_wanted,
            Activation::Unavailable => false,
        };
        if wants_advice {
            self.request_advice(host);
        }
    }
}
