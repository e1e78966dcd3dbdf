//! Review personas.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Voice a persona reviews in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonaTone {
    /// Looks for flaws.
    Critical,
    /// Encourages and suggests.
    Supportive,
    /// Balanced.
    #[default]
    Neutral,
    /// Argues the opposite position.
    DevilAdvocate,
    /// Focuses on technical accuracy.
    Technical,
}

/// A review persona.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    /// Persona identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Prompt the backend runs the persona with.
    #[serde(default)]
    pub system_prompt: String,
    /// Review voice.
    #[serde(default)]
    pub tone: PersonaTone,
    /// Topics the persona pays attention to.
    #[serde(default)]
    pub focus_areas: Vec<String>,
    /// Display color.
    #[serde(default = "default_color")]
    pub color: String,
    /// Relative weight in the meta-review.
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Whether the persona is offered for new reviews.
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_color() -> String {
    "#6366f1".to_string()
}

fn default_weight() -> f64 {
    1.0
}

fn default_active() -> bool {
    true
}

/// Body of a persona weight update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersonaWeightUpdate {
    /// New weight.
    pub weight: f64,
}

impl PersonaWeightUpdate {
    /// Weights the backend accepts.
    pub const RANGE: RangeInclusive<f64> = 0.0..=5.0;

    /// Create an update, rejecting weights the backend would refuse.
    pub fn new(weight: f64) -> Option<Self> {
        Self::RANGE.contains(&weight).then_some(Self { weight })
    }
}
