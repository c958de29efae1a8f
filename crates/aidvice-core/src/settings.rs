use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

pub const DEFAULT_ADVICE_SCOPE: &str = "Provide writing advice for creative fiction.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub advice_scope: String,
    pub claude_api_key: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            advice_scope: DEFAULT_ADVICE_SCOPE.to_string(),
            claude_api_key: String::new(),
        }
    }
}

impl Settings {
    /// Defaults, overwritten by whichever fields the persisted object carries.
    ///
    /// Each field is applied on its own; a field with the wrong type is skipped with a
    /// warning and keeps its default.
    pub fn from_persisted(data: Option<Value>) -> Self {
        let mut settings = Self::default();
        let map = match data {
            None | Some(Value::Null) => return settings,
            Some(Value::Object(map)) => map,
            Some(other) => {
                warn!(event = "settings_not_object", kind = json_kind(&other));
                return settings;
            }
        };

        for field in SettingsForm::FIELDS {
            match map.get(field.key()) {
                None => {}
                Some(Value::String(value)) => field.set(&mut settings, value.clone()),
                Some(other) => {
                    warn!(
                        event = "settings_field_invalid",
                        field = field.key(),
                        kind = json_kind(other)
                    );
                }
            }
        }
        settings
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn has_api_key(&self) -> bool {
        !self.claude_api_key.trim().is_empty()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    ApiKey,
    AdviceScope,
}

impl SettingsField {
    /// Key under which the field is persisted.
    pub fn key(self) -> &'static str {
        match self {
            SettingsField::ApiKey => "claudeApiKey",
            SettingsField::AdviceScope => "adviceScope",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SettingsField::ApiKey => "Claude API Key",
            SettingsField::AdviceScope => "Advice Scope",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            SettingsField::ApiKey => "Enter your Claude API key",
            SettingsField::AdviceScope => "Enter the scope or context for the writing advice",
        }
    }

    pub fn placeholder(self) -> &'static str {
        match self {
            SettingsField::ApiKey => "Enter your API key",
            SettingsField::AdviceScope => {
                "E.g., Provide writing advice for creative fiction. Focus on character development and plot structure."
            }
        }
    }

    /// The scope is edited in a text area, the key in a single-line input.
    pub fn multiline(self) -> bool {
        matches!(self, SettingsField::AdviceScope)
    }

    pub fn value(self, settings: &Settings) -> &str {
        match self {
            SettingsField::ApiKey => &settings.claude_api_key,
            SettingsField::AdviceScope => &settings.advice_scope,
        }
    }

    pub fn set(self, settings: &mut Settings, value: String) {
        match self {
            SettingsField::ApiKey => settings.claude_api_key = value,
            SettingsField::AdviceScope => settings.advice_scope = value,
        }
    }
}

/// Layout of the settings tab: a heading and the two text fields in display order.
pub struct SettingsForm;

impl SettingsForm {
    pub const HEADING: &'static str = "AIdvice Settings";
    pub const FIELDS: [SettingsField; 2] = [SettingsField::ApiKey, SettingsField::AdviceScope];

    pub fn field(index: usize) -> Option<SettingsField> {
        Self::FIELDS.get(index).copied()
    }
}
