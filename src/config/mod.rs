//! Editor configuration
//! Diagram style, canvas dimensions and transition mode

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;


/// Position of the node created by `initialize` (and where a protected
/// initial node snaps back to after a rejected delete).
pub const DEFAULT_INITIAL_POSITION: (f32, f32) = (200.0, 240.0);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StyleError {
    #[error("Unknown style {0}")]
    InvalidStyle(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Style(#[from] StyleError),
}

/// The kind of automaton-like diagram being drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DiagramStyle {
    /// Deterministic Büchi automaton
    #[default]
    DetBuchiAut,
    /// Nondeterministic Büchi automaton
    NondetBuchiAut,
    /// Büchi game arena
    BuchiGame,
    /// Parity game arena
    ParityGame,
}

impl DiagramStyle {
    pub const ALL: [DiagramStyle; 4] = [
        DiagramStyle::DetBuchiAut,
        DiagramStyle::NondetBuchiAut,
        DiagramStyle::BuchiGame,
        DiagramStyle::ParityGame,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DiagramStyle::DetBuchiAut => "detbuchiaut",
            DiagramStyle::NondetBuchiAut => "nondetbuchiaut",
            DiagramStyle::BuchiGame => "buchigame",
            DiagramStyle::ParityGame => "paritygame",
        }
    }

    pub fn is_deterministic(self) -> bool {
        matches!(self, DiagramStyle::DetBuchiAut)
    }

    /// Games have no distinguished start state arrow.
    pub fn shows_initial_arrow(self) -> bool {
        matches!(self, DiagramStyle::DetBuchiAut | DiagramStyle::NondetBuchiAut)
    }
}

impl fmt::Display for DiagramStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiagramStyle {
    type Err = StyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiagramStyle::ALL
            .into_iter()
            .find(|style| style.as_str() == s)
            .ok_or_else(|| StyleError::InvalidStyle(s.to_string()))
    }
}

impl TryFrom<String> for DiagramStyle {
    type Error = StyleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DiagramStyle> for String {
    fn from(style: DiagramStyle) -> Self {
        style.as_str().to_string()
    }
}

/// Whether every state must have exactly one transition per symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Deterministic,
    NonDeterministic,
}

impl Mode {
    pub fn is_deterministic(self) -> bool {
        matches!(self, Mode::Deterministic)
    }
}

/// Canvas and behavior settings for one editor instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Canvas width in pixels
    pub width: f32,
    /// Canvas height in pixels
    pub height: f32,
    /// Diagram style
    pub style: DiagramStyle,
    /// Legacy switch that overrides the mode implied by `style`
    pub deterministic: Option<bool>,
    /// Epsilon self-loops; defaults to on for non-deterministic diagrams
    pub epsilon: Option<bool>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            style: DiagramStyle::default(),
            deterministic: None,
            epsilon: None,
        }
    }
}

impl EditorConfig {
    pub fn with_style(mut self, style: &str) -> Result<Self, StyleError> {
        self.style = style.parse()?;
        Ok(self)
    }

    pub fn with_dimensions(mut self, width: f32, height: f32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn mode(&self) -> Mode {
        let deterministic = self
            .deterministic
            .unwrap_or_else(|| self.style.is_deterministic());
        if deterministic {
            Mode::Deterministic
        } else {
            Mode::NonDeterministic
        }
    }

    pub fn epsilon_enabled(&self) -> bool {
        self.epsilon.unwrap_or(!self.mode().is_deterministic())
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_json(&content)?;
        log::info!("loaded editor config from {}", path.display());
        Ok(config)
    }
}
