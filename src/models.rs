use crate::mode::GraphMode;
use serde::{Deserialize, Serialize};

/// Read-only copy of the counters handed to the derived-metrics formatters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub refusal_count: u64,
    pub bought_count: u64,
    pub total_co2_saved: f64,
    pub monthly_goal: u32,
    pub graph_mode: GraphMode,
}

/// Two comparison bars plus a comment line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarComparison {
    pub primary_value: String,
    pub primary_height_pct: f64,
    pub primary_label: String,
    pub secondary_value: String,
    pub secondary_height_pct: f64,
    pub secondary_label: String,
    pub comment_text: String,
}

impl BarComparison {
    /// Zero-height bars with empty labels, shown while a text panel is active.
    pub fn suppressed() -> Self {
        Self {
            primary_value: String::new(),
            primary_height_pct: 0.0,
            primary_label: String::new(),
            secondary_value: String::new(),
            secondary_height_pct: 0.0,
            secondary_label: String::new(),
            comment_text: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactPanel {
    pub headline: String,
    pub trees_text: String,
    pub km_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RenderedGraph {
    Bars(BarComparison),
    Impact(ImpactPanel),
}

impl RenderedGraph {
    pub fn bars(&self) -> BarComparison {
        match self {
            RenderedGraph::Bars(bars) => bars.clone(),
            RenderedGraph::Impact(_) => BarComparison::suppressed(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LastAction {
    Refused,
    Bought,
}

/// What the result screen paints: the action message above the selected graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultView {
    pub action: LastAction,
    pub action_message: String,
    pub mode: GraphMode,
    pub graph: RenderedGraph,
}

impl ResultView {
    /// Large message at the top of the result screen.
    pub fn headline(&self) -> &str {
        match &self.graph {
            RenderedGraph::Impact(panel) => &panel.headline,
            RenderedGraph::Bars(_) => &self.action_message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "screen", rename_all = "camelCase")]
pub enum Screen {
    Main,
    Settings { goal: u32 },
    Result(ResultView),
    ConfirmReset { prompt: String },
}

/// Numbers shown on the main screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterSummary {
    pub total_co2_saved: String,
    pub refusal_count: u64,
    pub bought_count: u64,
    pub monthly_goal: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateResponse {
    pub counters: CounterSummary,
    pub graph_mode: GraphMode,
    pub enabled_modes: Vec<GraphMode>,
    #[serde(flatten)]
    pub screen: Screen,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ActionRequest {
    Refuse,
    Buy,
    OpenSettings,
    ShowMain,
    SaveGoal { goal: serde_json::Value },
    SelectMode { mode: String },
    RequestReset,
    Reset { confirmed: bool },
}

#[derive(Debug, Deserialize)]
pub struct GoalForm {
    pub goal: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetForm {
    #[serde(default)]
    pub confirm: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MonthValueRequest {
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub kwh: Vec<f64>,
    pub co2_kg: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectricitySummary {
    pub total_kwh: f64,
    pub total_co2_kg: f64,
    pub total_kwh_text: String,
    pub total_co2_kg_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectricityResponse {
    pub months: Vec<f64>,
    pub current_month: u32,
    pub summary: ElectricitySummary,
    pub chart: ChartSeries,
    pub saved: bool,
}
