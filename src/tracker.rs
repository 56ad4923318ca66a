use crate::config::TrackerConfig;
use crate::metrics::{ConfirmationGate, MetricsState, ResetOutcome, ValidationError, RESET_PROMPT};
use crate::mode::{GraphMode, GraphModeSelector, ModeDisabled};
use crate::models::{CounterSummary, LastAction, ResultView, Screen};
use crate::stats;
use crate::store::PersistentStore;
use thiserror::Error;
use tracing::{debug, info, warn};

/// One user gesture.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Refuse,
    Buy,
    OpenSettings,
    ShowMain,
    SaveGoal(String),
    SelectMode(GraphMode),
    /// Shows the reset question; nothing is cleared yet.
    RequestReset,
    Reset { confirmed: bool },
}

impl Action {
    /// Whether a successful dispatch may have written to the store.
    pub fn mutates_store(&self) -> bool {
        match self {
            Action::Refuse | Action::Buy | Action::SaveGoal(_) | Action::SelectMode(_) => true,
            Action::Reset { confirmed } => *confirmed,
            Action::OpenSettings | Action::ShowMain | Action::RequestReset => false,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrackerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    ModeDisabled(#[from] ModeDisabled),
}

/// Change notification pushed to subscribed renderers.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewUpdate {
    Counters(CounterSummary),
    Screen(Screen),
}

/// Paints whatever the tracker reports. Drawing itself lives outside the engine.
pub trait ViewRenderer: Send + Sync {
    fn render(&mut self, update: &ViewUpdate);
}

/// Logs every update; the server subscribes one of these.
#[derive(Debug, Default)]
pub struct TracingRenderer;

impl ViewRenderer for TracingRenderer {
    fn render(&mut self, update: &ViewUpdate) {
        match update {
            ViewUpdate::Counters(counters) => debug!(
                refusals = counters.refusal_count,
                bought = counters.bought_count,
                co2 = %counters.total_co2_saved,
                "counters changed"
            ),
            ViewUpdate::Screen(Screen::Result(view)) => {
                debug!(mode = %view.mode, headline = view.headline(), "result redrawn")
            }
            ViewUpdate::Screen(screen) => debug!(?screen, "screen changed"),
        }
    }
}

/// In-memory state captured before a dispatch, put back if the flush fails.
#[derive(Debug, Clone)]
pub struct TrackerCheckpoint {
    metrics: MetricsState,
    selector: GraphModeSelector,
    screen: Screen,
}

/// Ties the metrics, the mode selector and the current screen together.
///
/// The store is handed in on every call so the caller decides where it lives
/// and when it is flushed.
pub struct Tracker {
    config: TrackerConfig,
    metrics: MetricsState,
    selector: GraphModeSelector,
    screen: Screen,
    renderers: Vec<Box<dyn ViewRenderer>>,
}

impl Tracker {
    pub fn load<S: PersistentStore + ?Sized>(store: &S, config: TrackerConfig) -> Self {
        let metrics = MetricsState::load(store, &config);
        let selector = GraphModeSelector::new(metrics.graph_mode(), config.enabled_modes.clone());
        Self {
            config,
            metrics,
            selector,
            screen: Screen::Main,
            renderers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, renderer: Box<dyn ViewRenderer>) {
        self.renderers.push(renderer);
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn metrics(&self) -> &MetricsState {
        &self.metrics
    }

    pub fn graph_mode(&self) -> GraphMode {
        self.selector.current()
    }

    pub fn enabled_modes(&self) -> Vec<GraphMode> {
        self.selector.enabled().iter().collect()
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn counters(&self) -> CounterSummary {
        CounterSummary {
            total_co2_saved: stats::format_amount(self.metrics.total_co2_saved()),
            refusal_count: self.metrics.refusal_count(),
            bought_count: self.metrics.bought_count(),
            monthly_goal: self.metrics.monthly_goal(),
        }
    }

    pub fn dispatch<S: PersistentStore + ?Sized>(
        &mut self,
        store: &mut S,
        action: Action,
    ) -> Result<&Screen, TrackerError> {
        debug!(?action, "dispatching action");
        match action {
            Action::Refuse => {
                self.metrics.record_refusal(store);
                self.notify_counters();
                self.show_result(LastAction::Refused);
            }
            Action::Buy => {
                self.metrics.record_purchase(store);
                self.notify_counters();
                self.show_result(LastAction::Bought);
            }
            Action::OpenSettings => {
                let goal = self.metrics.monthly_goal();
                self.set_screen(Screen::Settings { goal });
            }
            Action::ShowMain => self.set_screen(Screen::Main),
            Action::SaveGoal(candidate) => {
                self.metrics.set_goal(store, &candidate)?;
                self.notify_counters();
                self.set_screen(Screen::Main);
            }
            Action::SelectMode(mode) => self.select_mode(store, mode)?,
            Action::RequestReset => self.set_screen(Screen::ConfirmReset {
                prompt: RESET_PROMPT.to_string(),
            }),
            Action::Reset { confirmed } => {
                let outcome = self.reset(store, &mut |_: &str| confirmed);
                let asking = matches!(self.screen, Screen::ConfirmReset { .. });
                if outcome == ResetOutcome::Declined && asking {
                    self.set_screen(Screen::Main);
                }
            }
        }
        Ok(&self.screen)
    }

    /// Persists the mode and, when a result is on screen, redraws it with the
    /// action message it already had.
    pub fn select_mode<S: PersistentStore + ?Sized>(
        &mut self,
        store: &mut S,
        mode: GraphMode,
    ) -> Result<(), ModeDisabled> {
        self.selector.select(mode)?;
        self.metrics.set_graph_mode(store, mode);
        info!(%mode, "graph mode selected");

        if let Screen::Result(previous) = &self.screen {
            let view = self.build_result(previous.action, previous.action_message.clone());
            self.set_screen(Screen::Result(view));
        }
        Ok(())
    }

    pub fn reset<S, G>(&mut self, store: &mut S, gate: &mut G) -> ResetOutcome
    where
        S: PersistentStore + ?Sized,
        G: ConfirmationGate + ?Sized,
    {
        let outcome = self.metrics.reset(store, gate);
        if outcome == ResetOutcome::Cleared {
            self.selector.reset();
            self.notify_counters();
            self.set_screen(Screen::Main);
        }
        outcome
    }

    pub fn checkpoint(&self) -> TrackerCheckpoint {
        TrackerCheckpoint {
            metrics: self.metrics.clone(),
            selector: self.selector.clone(),
            screen: self.screen.clone(),
        }
    }

    /// Puts a checkpoint back and tells the renderers what they show now.
    pub fn restore(&mut self, checkpoint: TrackerCheckpoint) {
        self.metrics = checkpoint.metrics;
        self.selector = checkpoint.selector;
        self.notify_counters();
        self.set_screen(checkpoint.screen);
        warn!("tracker rolled back to last saved state");
    }

    /// Result view for `action` under the current mode, without touching the screen.
    pub fn result_for(&self, action: LastAction) -> ResultView {
        self.build_result(action, stats::action_message(action, &self.config.co2))
    }

    fn show_result(&mut self, action: LastAction) {
        let view = self.result_for(action);
        self.set_screen(Screen::Result(view));
    }

    fn build_result(&self, action: LastAction, action_message: String) -> ResultView {
        let mode = self.selector.current();
        ResultView {
            action,
            action_message,
            mode,
            graph: stats::render(mode, &self.metrics.snapshot(), &self.config.co2),
        }
    }

    fn set_screen(&mut self, screen: Screen) {
        self.screen = screen;
        let update = ViewUpdate::Screen(self.screen.clone());
        self.publish(&update);
    }

    fn notify_counters(&mut self) {
        let update = ViewUpdate::Counters(self.counters());
        self.publish(&update);
    }

    fn publish(&mut self, update: &ViewUpdate) {
        for renderer in &mut self.renderers {
            renderer.render(update);
        }
    }
}
