use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GraphMode {
    #[default]
    Goal,
    WhatIf,
    Impact,
}

impl GraphMode {
    pub const ALL: [GraphMode; 3] = [GraphMode::Goal, GraphMode::WhatIf, GraphMode::Impact];

    /// Name used in the store and on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            GraphMode::Goal => "goal",
            GraphMode::WhatIf => "whatIf",
            GraphMode::Impact => "impact",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            GraphMode::Goal => "Goal progress",
            GraphMode::WhatIf => "What if",
            GraphMode::Impact => "Impact",
        }
    }
}

impl fmt::Display for GraphMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown graph mode {0:?}")]
pub struct UnknownMode(pub String);

impl FromStr for GraphMode {
    type Err = UnknownMode;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        GraphMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == value)
            .ok_or_else(|| UnknownMode(value.to_string()))
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("graph mode {0} is not enabled")]
pub struct ModeDisabled(pub GraphMode);

/// Modes offered as tiles. Goal is always part of the set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnabledModes(BTreeSet<GraphMode>);

impl EnabledModes {
    pub fn all() -> Self {
        Self(GraphMode::ALL.into_iter().collect())
    }

    pub fn from_modes(modes: impl IntoIterator<Item = GraphMode>) -> Self {
        let mut set: BTreeSet<GraphMode> = modes.into_iter().collect();
        set.insert(GraphMode::Goal);
        Self(set)
    }

    pub fn contains(&self, mode: GraphMode) -> bool {
        self.0.contains(&mode)
    }

    pub fn iter(&self) -> impl Iterator<Item = GraphMode> + '_ {
        self.0.iter().copied()
    }
}

impl Default for EnabledModes {
    fn default() -> Self {
        Self::all()
    }
}

/// Tracks which derived view the result screen shows.
#[derive(Debug, Clone)]
pub struct GraphModeSelector {
    current: GraphMode,
    enabled: EnabledModes,
}

impl GraphModeSelector {
    /// Starts from the persisted mode, falling back to Goal when it is not offered.
    pub fn new(initial: GraphMode, enabled: EnabledModes) -> Self {
        let current = if enabled.contains(initial) {
            initial
        } else {
            GraphMode::Goal
        };
        Self { current, enabled }
    }

    pub fn current(&self) -> GraphMode {
        self.current
    }

    pub fn enabled(&self) -> &EnabledModes {
        &self.enabled
    }

    /// Moves to `mode`. Returns whether the mode actually changed.
    pub fn select(&mut self, mode: GraphMode) -> Result<bool, ModeDisabled> {
        if !self.enabled.contains(mode) {
            return Err(ModeDisabled(mode));
        }
        let changed = self.current != mode;
        self.current = mode;
        Ok(changed)
    }

    pub fn reset(&mut self) {
        self.current = GraphMode::Goal;
    }
}

/// Reads a stored mode name; anything unrecognised is Goal.
pub fn parse_or_default(raw: Option<&str>) -> GraphMode {
    raw.and_then(|value| value.trim().parse().ok())
        .unwrap_or_default()
}
