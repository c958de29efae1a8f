use aidvice_core::{
    AdviceViewModel, CommandHost, CommandSpec, HostError, Notifier, PanelId, RibbonSpec,
    ViewHost, ViewState,
};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Narrower than this and the right split has no room for a panel.
pub const MIN_COLS_FOR_RIGHT_SPLIT: u16 = 60;
const NOTICE_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone)]
pub struct RightSlot {
    pub id: PanelId,
    pub view_type: Option<String>,
    pub active: bool,
    pub model: Option<AdviceViewModel>,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub message: String,
    pub shown_at: Instant,
}

/// The terminal's stand-in for an application workspace: a notes area on the left and a
/// stack of slots in a right split.
#[derive(Debug)]
pub struct TerminalWorkspace {
    registered: HashSet<String>,
    slots: Vec<RightSlot>,
    next_id: u64,
    focused: Option<PanelId>,
    right_split_available: bool,
    commands: Vec<CommandSpec>,
    ribbons: Vec<RibbonSpec>,
    notice: Option<Notice>,
}

impl Default for TerminalWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalWorkspace {
    pub fn new() -> Self {
        Self {
            registered: HashSet::new(),
            slots: Vec::new(),
            next_id: 0,
            focused: None,
            right_split_available: true,
            commands: Vec::new(),
            ribbons: Vec::new(),
            notice: None,
        }
    }

    pub fn set_width(&mut self, cols: u16) {
        self.right_split_available = cols >= MIN_COLS_FOR_RIGHT_SPLIT;
    }

    /// Slots that show a view, in placement order.
    pub fn visible_slots(&self) -> impl Iterator<Item = &RightSlot> {
        self.slots.iter().filter(|slot| slot.view_type.is_some())
    }

    pub fn focused(&self) -> Option<PanelId> {
        self.focused
    }

    pub fn commands(&self) -> &[CommandSpec] {
        &self.commands
    }

    pub fn ribbons(&self) -> &[RibbonSpec] {
        &self.ribbons
    }

    /// Close the focused slot without asking the plugin, like closing a tab by hand.
    pub fn close_focused(&mut self) -> bool {
        let Some(focused) = self.focused.take() else {
            return false;
        };
        let before = self.slots.len();
        self.slots.retain(|slot| slot.id != focused);
        let next = self.visible_slots().next().map(|slot| slot.id);
        self.focused = next;
        before != self.slots.len()
    }

    pub fn current_notice(&self) -> Option<&str> {
        self.notice
            .as_ref()
            .filter(|notice| notice.shown_at.elapsed() < NOTICE_TTL)
            .map(|notice| notice.message.as_str())
    }

    pub fn expire_notice(&mut self) -> bool {
        let expired = self
            .notice
            .as_ref()
            .is_some_and(|notice| notice.shown_at.elapsed() >= NOTICE_TTL);
        if expired {
            self.notice = None;
        }
        expired
    }

    fn slot_mut(&mut self, panel: PanelId) -> Option<&mut RightSlot> {
        self.slots.iter_mut().find(|slot| slot.id == panel)
    }
}

impl ViewHost for TerminalWorkspace {
    fn register_view(&mut self, view_type: &str) {
        self.registered.insert(view_type.to_string());
    }

    fn panels_of_type(&self, view_type: &str) -> Vec<PanelId> {
        self.slots
            .iter()
            .filter(|slot| slot.view_type.as_deref() == Some(view_type))
            .map(|slot| slot.id)
            .collect()
    }

    fn right_placement(&mut self) -> Option<PanelId> {
        if !self.right_split_available {
            return None;
        }
        if let Some(empty) = self.slots.iter().find(|slot| slot.view_type.is_none()) {
            return Some(empty.id);
        }
        self.next_id += 1;
        let id = PanelId(self.next_id);
        self.slots.push(RightSlot {
            id,
            view_type: None,
            active: false,
            model: None,
        });
        Some(id)
    }

    fn set_view_state(&mut self, panel: PanelId, state: ViewState) -> Result<(), HostError> {
        if !self.registered.contains(&state.view_type) {
            return Err(HostError::UnregisteredView(state.view_type));
        }
        let active = state.active;
        let slot = self.slot_mut(panel).ok_or(HostError::UnknownPanel(panel))?;
        slot.view_type = Some(state.view_type);
        slot.active = active;
        if active {
            self.focused = Some(panel);
        }
        Ok(())
    }

    fn detach_panels_of_type(&mut self, view_type: &str) {
        self.slots
            .retain(|slot| slot.view_type.as_deref() != Some(view_type));
        if let Some(focused) = self.focused {
            if !self.slots.iter().any(|slot| slot.id == focused) {
                self.focused = None;
            }
        }
        debug!(event = "detached", view_type = view_type);
    }

    fn reveal(&mut self, panel: PanelId) {
        if self.slots.iter().any(|slot| slot.id == panel) {
            self.focused = Some(panel);
        }
    }

    fn render(&mut self, panel: PanelId, model: &AdviceViewModel) {
        if let Some(slot) = self.slot_mut(panel) {
            slot.model = Some(model.clone());
        }
    }
}

impl CommandHost for TerminalWorkspace {
    fn add_command(&mut self, command: CommandSpec) {
        info!(event = "command_registered", id = %command.id);
        self.commands.push(command);
    }

    fn add_ribbon_icon(&mut self, ribbon: RibbonSpec) {
        self.ribbons.push(ribbon);
    }
}

impl Notifier for TerminalWorkspace {
    fn notice(&mut self, message: &str) {
        info!(event = "notice", message = message);
        self.notice = Some(Notice {
            message: message.to_string(),
            shown_at: Instant::now(),
        });
    }
}
