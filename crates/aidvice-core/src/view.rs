use crate::host::PanelId;

pub const ADVICE_VIEW_TYPE: &str = "advice-view";
pub const ADVICE_DISPLAY_TEXT: &str = "AIdvice";
pub const GET_ADVICE_LABEL: &str = "Get Advice";
pub const RIBBON_ICON: &str = "bulb";
pub const TOGGLE_TITLE: &str = "Toggle AIdvice";
pub const TOGGLE_COMMAND_ID: &str = "toggle-writing-advice";

/// What a host draws for the advice panel: a heading, the button, then the advice text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdviceViewModel {
    pub heading: String,
    pub button_label: String,
    pub body: String,
}

/// The plugin's handle on the one advice panel the host is showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdviceView {
    panel: PanelId,
    content: String,
}

impl AdviceView {
    pub fn new(panel: PanelId) -> Self {
        Self {
            panel,
            content: String::new(),
        }
    }

    pub fn panel(&self) -> PanelId {
        self.panel
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn set_advice(&mut self, advice: &str) {
        self.content = advice.to_string();
    }

    pub fn render(&self) -> AdviceViewModel {
        AdviceViewModel {
            heading: ADVICE_DISPLAY_TEXT.to_string(),
            button_label: GET_ADVICE_LABEL.to_string(),
            body: self.content.clone(),
        }
    }
}
