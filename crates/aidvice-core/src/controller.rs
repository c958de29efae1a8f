//! Find-or-create management of the single advice panel.
//!
//! Whether a panel is open is always answered by asking the host, never by a flag kept on
//! the side, so a panel the user closed by hand cannot leave the controller out of step.

use crate::host::{Notifier, PanelId, ViewHost, ViewState};
use crate::view::{AdviceView, ADVICE_VIEW_TYPE};
use tracing::{debug, info, warn};

pub const PLACEMENT_UNAVAILABLE_NOTICE: &str = "AIdvice: could not open the advice panel";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// No panel existed; a new one was placed and revealed.
    Created(PanelId),
    /// An existing panel was revealed.
    Revealed(PanelId),
    /// The host had no slot to give. A notice was shown.
    Unavailable,
}

impl Activation {
    pub fn panel(&self) -> Option<PanelId> {
        match self {
            Activation::Created(panel) | Activation::Revealed(panel) => Some(*panel),
            Activation::Unavailable => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Closed { detached: usize },
    Opened(Activation),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Rendered(PanelId),
    NoPanel,
}

#[derive(Debug, Default)]
pub struct PanelController {
    view: Option<AdviceView>,
}

impl PanelController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_panel<H: ViewHost + ?Sized>(&self, host: &H) -> bool {
        !host.panels_of_type(ADVICE_VIEW_TYPE).is_empty()
    }

    pub fn view(&self) -> Option<&AdviceView> {
        self.view.as_ref()
    }

    pub fn activate<H: ViewHost + Notifier + ?Sized>(&mut self, host: &mut H) -> Activation {
        let existing = host.panels_of_type(ADVICE_VIEW_TYPE);
        if existing.len() > 1 {
            warn!(event = "duplicate_panels", count = existing.len());
        }

        let (panel, created) = match existing.first() {
            Some(&panel) => (panel, false),
            None => match Self::place_new_panel(host) {
                Some(panel) => (panel, true),
                None => {
                    host.notice(PLACEMENT_UNAVAILABLE_NOTICE);
                    return Activation::Unavailable;
                }
            },
        };

        self.bind(panel);
        host.reveal(panel);
        if let Some(view) = &self.view {
            host.render(panel, &view.render());
        }

        if created {
            info!(event = "panel_created", panel = %panel);
            Activation::Created(panel)
        } else {
            debug!(event = "panel_revealed", panel = %panel);
            Activation::Revealed(panel)
        }
    }

    /// Close every advice panel if any is open, otherwise activate.
    pub fn toggle<H: ViewHost + Notifier + ?Sized>(&mut self, host: &mut H) -> ToggleOutcome {
        let existing = host.panels_of_type(ADVICE_VIEW_TYPE);
        if existing.is_empty() {
            return ToggleOutcome::Opened(self.activate(host));
        }
        host.detach_panels_of_type(ADVICE_VIEW_TYPE);
        self.view = None;
        info!(event = "panels_detached", count = existing.len());
        ToggleOutcome::Closed {
            detached: existing.len(),
        }
    }

    /// Show `text` in the known panel. Never opens a panel.
    pub fn deliver_advice<H: ViewHost + ?Sized>(&mut self, host: &mut H, text: &str) -> Delivery {
        self.reconcile(host);
        let Some(view) = self.view.as_mut() else {
            info!(event = "advice_dropped", reason = "no_panel");
            return Delivery::NoPanel;
        };
        view.set_advice(text);
        let panel = view.panel();
        host.render(panel, &view.render());
        Delivery::Rendered(panel)
    }

    /// Forget the handle if the host no longer shows that panel.
    pub fn reconcile<H: ViewHost + ?Sized>(&mut self, host: &H) {
        let Some(view) = &self.view else {
            return;
        };
        if !host.panels_of_type(ADVICE_VIEW_TYPE).contains(&view.panel()) {
            debug!(event = "panel_gone", panel = %view.panel());
            self.view = None;
        }
    }

    pub fn release(&mut self) {
        self.view = None;
    }

    fn place_new_panel<H: ViewHost + ?Sized>(host: &mut H) -> Option<PanelId> {
        let Some(slot) = host.right_placement() else {
            warn!(event = "placement_unavailable");
            return None;
        };
        let state = ViewState {
            view_type: ADVICE_VIEW_TYPE.to_string(),
            active: true,
        };
        if let Err(err) = host.set_view_state(slot, state) {
            warn!(event = "set_view_state_failed", panel = %slot, error = %err);
            return None;
        }
        Some(slot)
    }

    fn bind(&mut self, panel: PanelId) {
        let same = self.view.as_ref().is_some_and(|view| view.panel() == panel);
        if !same {
            self.view = Some(AdviceView::new(panel));
        }
    }
}
