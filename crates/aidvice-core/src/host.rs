//! Narrow interfaces onto the surrounding application.
//!
//! The plugin never reaches for ambient state: every placement, command registration and
//! notice goes through one of these traits, so the policy layer runs the same against the
//! terminal workspace and against the in-memory hosts used by tests.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PanelId(pub u64);

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "panel-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub view_type: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RibbonSpec {
    pub icon: String,
    pub title: String,
}

#[derive(Debug, Error)]
pub enum HostError {
    #[error("unknown panel {0}")]
    UnknownPanel(PanelId),
    #[error("view type {0} is not registered")]
    UnregisteredView(String),
}

pub trait ViewHost {
    fn register_view(&mut self, view_type: &str);

    /// Panels currently showing `view_type`, in placement order.
    fn panels_of_type(&self, view_type: &str) -> Vec<PanelId>;

    /// An empty slot in the right-hand split, or `None` when the host cannot place one.
    fn right_placement(&mut self) -> Option<PanelId>;

    fn set_view_state(&mut self, panel: PanelId, state: ViewState) -> Result<(), HostError>;

    fn detach_panels_of_type(&mut self, view_type: &str);

    fn reveal(&mut self, panel: PanelId);

    fn render(&mut self, panel: PanelId, model: &crate::view::AdviceViewModel);
}

pub trait CommandHost {
    fn add_command(&mut self, command: CommandSpec);
    fn add_ribbon_icon(&mut self, ribbon: RibbonSpec);
}

pub trait Notifier {
    fn notice(&mut self, message: &str);
}

/// Everything the plugin needs from the application it is loaded into.
pub trait Host: ViewHost + CommandHost + Notifier {}

impl<T: ViewHost + CommandHost + Notifier> Host for T {}
