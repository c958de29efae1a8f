//! Advice generation.
//!
//! Providers sit behind [`AdviceProvider`] so a network-backed one can replace the local
//! ones without touching the scheduling or panel code. Neither built-in provider does I/O.

use crate::settings::Settings;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::fmt;
use std::str::FromStr;

pub const MISSING_KEY_ADVICE: &str = "Please set your Claude API key in the plugin settings.";

pub const WRITING_TIPS: [&str; 5] = [
    "Show, don't tell: let a character's actions reveal what they feel.",
    "Cut the first paragraph of the scene and see if it still works.",
    "Give every character a want they can name and a need they can't.",
    "Read the last page aloud and trim any sentence you stumble over.",
    "End the chapter a beat earlier than feels comfortable.",
];

pub trait AdviceProvider {
    fn generate(&mut self, settings: &Settings) -> String;
}

/// Echoes the configured advice scope back as the advice text.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScopeEchoAdvice;

impl AdviceProvider for ScopeEchoAdvice {
    fn generate(&mut self, settings: &Settings) -> String {
        if !settings.has_api_key() {
            return MISSING_KEY_ADVICE.to_string();
        }
        format!(
            "Based on your settings, here's some advice: {}",
            settings.advice_scope
        )
    }
}

/// Picks one of [`WRITING_TIPS`] uniformly at random.
pub struct RandomAdvice {
    rng: StdRng,
}

impl RandomAdvice {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomAdvice {
    fn default() -> Self {
        Self::new()
    }
}

impl AdviceProvider for RandomAdvice {
    fn generate(&mut self, settings: &Settings) -> String {
        if !settings.has_api_key() {
            return MISSING_KEY_ADVICE.to_string();
        }
        WRITING_TIPS
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(WRITING_TIPS[0])
            .to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    #[default]
    Scope,
    Random,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Scope => "scope",
            ProviderKind::Random => "random",
        }
    }

    pub fn build(self) -> Box<dyn AdviceProvider> {
        match self {
            ProviderKind::Scope => Box::new(ScopeEchoAdvice),
            ProviderKind::Random => Box::new(RandomAdvice::new()),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_lowercase().as_str() {
            "scope" | "echo" => Ok(ProviderKind::Scope),
            "random" | "tips" => Ok(ProviderKind::Random),
            other => Err(format!("Unknown advice provider: {other}")),
        }
    }
}
