use crate::host::{
    CommandHost, CommandSpec, HostError, Notifier, PanelId, RibbonSpec, ViewHost, ViewState,
};
use crate::view::AdviceViewModel;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct FakePanel {
    pub id: PanelId,
    pub view_type: Option<String>,
    pub active: bool,
    pub rendered: Option<AdviceViewModel>,
}

/// In-memory host recording every call the plugin makes.
#[derive(Debug, Default)]
pub struct FakeHost {
    pub registered: HashSet<String>,
    pub panels: Vec<FakePanel>,
    pub next_id: u64,
    pub placement_available: bool,
    pub revealed: Vec<PanelId>,
    pub notices: Vec<String>,
    pub commands: Vec<CommandSpec>,
    pub ribbons: Vec<RibbonSpec>,
    pub renders: usize,
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            placement_available: true,
            ..Self::default()
        }
    }

    pub fn live_panels(&self, view_type: &str) -> usize {
        self.panels_of_type(view_type).len()
    }

    /// Adds a panel of `view_type` behind the plugin's back.
    pub fn inject_panel(&mut self, view_type: &str) -> PanelId {
        self.next_id += 1;
        let id = PanelId(self.next_id);
        self.panels.push(FakePanel {
            id,
            view_type: Some(view_type.to_string()),
            active: false,
            rendered: None,
        });
        id
    }

    /// Closes a panel the way a user closing the tab would.
    pub fn close_externally(&mut self, panel: PanelId) {
        self.panels.retain(|p| p.id != panel);
    }

    pub fn rendered_body(&self, panel: PanelId) -> Option<&str> {
        self.panels
            .iter()
            .find(|p| p.id == panel)
            .and_then(|p| p.rendered.as_ref())
            .map(|model| model.body.as_str())
    }
}

impl ViewHost for FakeHost {
    fn register_view(&mut self, view_type: &str) {
        self.registered.insert(view_type.to_string());
    }

    fn panels_of_type(&self, view_type: &str) -> Vec<PanelId> {
        self.panels
            .iter()
            .filter(|p| p.view_type.as_deref() == Some(view_type))
            .map(|p| p.id)
            .collect()
    }

    fn right_placement(&mut self) -> Option<PanelId> {
        if !self.placement_available {
            return None;
        }
        self.next_id += 1;
        let id = PanelId(self.next_id);
        self.panels.push(FakePanel {
            id,
            view_type: None,
            active: false,
            rendered: None,
        });
        Some(id)
    }

    fn set_view_state(&mut self, panel: PanelId, state: ViewState) -> Result<(), HostError> {
        if !self.registered.contains(&state.view_type) {
            return Err(HostError::UnregisteredView(state.view_type));
        }
        let slot = self
            .panels
            .iter_mut()
            .find(|p| p.id == panel)
            .ok_or(HostError::UnknownPanel(panel))?;
        slot.view_type = Some(state.view_type);
        slot.active = state.active;
        Ok(())
    }

    fn detach_panels_of_type(&mut self, view_type: &str) {
        self.panels
            .retain(|p| p.view_type.as_deref() != Some(view_type));
    }

    fn reveal(&mut self, panel: PanelId) {
        self.revealed.push(panel);
    }

    fn render(&mut self, panel: PanelId, model: &AdviceViewModel) {
        self.renders += 1;
        if let Some(slot) = self.panels.iter_mut().find(|p| p.id == panel) {
            slot.rendered = Some(model.clone());
        }
    }
}

impl CommandHost for FakeHost {
    fn add_command(&mut self, command: CommandSpec) {
        self.commands.push(command);
    }

    fn add_ribbon_icon(&mut self, ribbon: RibbonSpec) {
        self.ribbons.push(ribbon);
    }
}

impl Notifier for FakeHost {
    fn notice(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }
}
