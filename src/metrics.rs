use crate::config::TrackerConfig;
use crate::mode::{self, GraphMode};
use crate::models::MetricsSnapshot;
use crate::store::PersistentStore;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const KEY_TOTAL_CO2_SAVED: &str = "totalCo2Saved";
pub const KEY_REFUSAL_COUNT: &str = "refusalCount";
pub const KEY_BOUGHT_COUNT: &str = "boughtCount";
pub const KEY_MONTHLY_GOAL: &str = "monthlyGoal";
pub const KEY_GRAPH_MODE: &str = "currentGraphType";
/// Older builds stored the mode under this name.
pub const LEGACY_KEY_GRAPH_MODE: &str = "graphMode";

pub const DEFAULT_MONTHLY_GOAL: u32 = 20;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("please enter a valid number")]
    NotANumber,
    #[error("the goal must be a positive whole number")]
    NotPositive,
}

/// Outcome of asking for a destructive reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    Cleared,
    Declined,
}

/// Yes/no step that must pass before the store is wiped.
pub trait ConfirmationGate {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F> ConfirmationGate for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

pub const RESET_PROMPT: &str = "Reset all data? This cannot be undone.";

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsState {
    refusal_count: u64,
    bought_count: u64,
    total_co2_saved: f64,
    monthly_goal: u32,
    graph_mode: GraphMode,
    co2_per_refusal: f64,
}

impl MetricsState {
    pub fn new(config: &TrackerConfig) -> Self {
        Self {
            refusal_count: 0,
            bought_count: 0,
            total_co2_saved: 0.0,
            monthly_goal: DEFAULT_MONTHLY_GOAL,
            graph_mode: GraphMode::Goal,
            co2_per_refusal: config.co2.per_refusal,
        }
    }

    /// Reads every field from `store`. Missing or corrupt entries become defaults.
    pub fn load<S: PersistentStore + ?Sized>(store: &S, config: &TrackerConfig) -> Self {
        let mut state = Self::new(config);

        state.refusal_count = read_parsed(store, KEY_REFUSAL_COUNT).unwrap_or(0);
        state.bought_count = read_parsed(store, KEY_BOUGHT_COUNT).unwrap_or(0);
        state.monthly_goal = read_parsed::<u32, S>(store, KEY_MONTHLY_GOAL)
            .filter(|goal| *goal > 0)
            .unwrap_or(DEFAULT_MONTHLY_GOAL);

        let raw_mode = store
            .get(KEY_GRAPH_MODE)
            .or_else(|| store.get(LEGACY_KEY_GRAPH_MODE));
        let graph_mode = mode::parse_or_default(raw_mode.as_deref());
        state.graph_mode = if config.enabled_modes.contains(graph_mode) {
            graph_mode
        } else {
            GraphMode::Goal
        };

        state.total_co2_saved = state.derived_total();
        if let Some(stored) = read_parsed::<f64, S>(store, KEY_TOTAL_CO2_SAVED) {
            if (stored - state.total_co2_saved).abs() > 1e-6 {
                warn!(
                    stored,
                    derived = state.total_co2_saved,
                    "stored CO2 total disagrees with refusal count, using derived value"
                );
            }
        }

        debug!(
            refusals = state.refusal_count,
            bought = state.bought_count,
            goal = state.monthly_goal,
            mode = %state.graph_mode,
            "metrics loaded"
        );
        state
    }

    pub fn refusal_count(&self) -> u64 {
        self.refusal_count
    }

    pub fn bought_count(&self) -> u64 {
        self.bought_count
    }

    pub fn total_co2_saved(&self) -> f64 {
        self.total_co2_saved
    }

    pub fn monthly_goal(&self) -> u32 {
        self.monthly_goal
    }

    pub fn graph_mode(&self) -> GraphMode {
        self.graph_mode
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            refusal_count: self.refusal_count,
            bought_count: self.bought_count,
            total_co2_saved: self.total_co2_saved,
            monthly_goal: self.monthly_goal,
            graph_mode: self.graph_mode,
        }
    }

    pub fn record_refusal<S: PersistentStore + ?Sized>(&mut self, store: &mut S) {
        self.refusal_count = self.refusal_count.saturating_add(1);
        self.total_co2_saved = self.derived_total();
        store.set(KEY_REFUSAL_COUNT, self.refusal_count.to_string());
        store.set(KEY_TOTAL_CO2_SAVED, self.total_co2_saved.to_string());
    }

    pub fn record_purchase<S: PersistentStore + ?Sized>(&mut self, store: &mut S) {
        self.bought_count = self.bought_count.saturating_add(1);
        store.set(KEY_BOUGHT_COUNT, self.bought_count.to_string());
    }

    /// Accepts a positive whole number typed by the user.
    pub fn set_goal<S: PersistentStore + ?Sized>(
        &mut self,
        store: &mut S,
        candidate: &str,
    ) -> Result<u32, ValidationError> {
        let goal = parse_goal(candidate)?;
        self.monthly_goal = goal;
        store.set(KEY_MONTHLY_GOAL, goal.to_string());
        info!(goal, "monthly goal updated");
        Ok(goal)
    }

    /// Writes the current key and drops the legacy one.
    pub fn set_graph_mode<S: PersistentStore + ?Sized>(&mut self, store: &mut S, mode: GraphMode) {
        self.graph_mode = mode;
        store.set(KEY_GRAPH_MODE, mode.as_str().to_string());
        store.remove(LEGACY_KEY_GRAPH_MODE);
    }

    /// Wipes the whole store once `gate` agrees, then returns every field to its default.
    pub fn reset<S, G>(&mut self, store: &mut S, gate: &mut G) -> ResetOutcome
    where
        S: PersistentStore + ?Sized,
        G: ConfirmationGate + ?Sized,
    {
        if !gate.confirm(RESET_PROMPT) {
            debug!("reset declined");
            return ResetOutcome::Declined;
        }
        store.clear();
        let co2_per_refusal = self.co2_per_refusal;
        *self = Self {
            refusal_count: 0,
            bought_count: 0,
            total_co2_saved: 0.0,
            monthly_goal: DEFAULT_MONTHLY_GOAL,
            graph_mode: GraphMode::Goal,
            co2_per_refusal,
        };
        info!("all tracker data reset");
        ResetOutcome::Cleared
    }

    fn derived_total(&self) -> f64 {
        self.refusal_count as f64 * self.co2_per_refusal
    }
}

fn parse_goal(candidate: &str) -> Result<u32, ValidationError> {
    let value = candidate
        .trim()
        .parse::<i64>()
        .map_err(|_| ValidationError::NotANumber)?;
    if value <= 0 {
        return Err(ValidationError::NotPositive);
    }
    u32::try_from(value).map_err(|_| ValidationError::NotANumber)
}

fn read_parsed<T, S>(store: &S, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    S: PersistentStore + ?Sized,
{
    let raw = store.get(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unreadable stored value");
            None
        }
    }
}
