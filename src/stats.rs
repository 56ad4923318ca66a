use crate::config::Co2Constants;
use crate::mode::GraphMode;
use crate::models::{BarComparison, ImpactPanel, LastAction, MetricsSnapshot, RenderedGraph};

pub const IMPACT_HEADLINE: &str = "Your reduction impact";

pub fn render(mode: GraphMode, snapshot: &MetricsSnapshot, co2: &Co2Constants) -> RenderedGraph {
    match mode {
        GraphMode::Goal => RenderedGraph::Bars(goal_progress(snapshot)),
        GraphMode::WhatIf => RenderedGraph::Bars(what_if(snapshot, co2)),
        GraphMode::Impact => RenderedGraph::Impact(impact(snapshot, co2)),
    }
}

/// Current refusals against the monthly goal.
pub fn goal_progress(snapshot: &MetricsSnapshot) -> BarComparison {
    let current = snapshot.refusal_count;
    let goal = u64::from(snapshot.monthly_goal);

    let comment_text = if current >= goal {
        "Great job! You reached this month's goal! 🎉".to_string()
    } else {
        format!("{} more to reach your goal!", goal - current)
    };

    BarComparison {
        primary_value: current.to_string(),
        primary_height_pct: progress_pct(current, goal),
        primary_label: "Current".to_string(),
        secondary_value: goal.to_string(),
        secondary_height_pct: 100.0,
        secondary_label: "Goal".to_string(),
        comment_text,
    }
}

pub fn progress_pct(current: u64, goal: u64) -> f64 {
    if goal == 0 {
        return 0.0;
    }
    (current as f64 / goal as f64 * 100.0).min(100.0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmissionComparison {
    pub potential: f64,
    pub actual: f64,
    pub saved: f64,
}

impl EmissionComparison {
    pub fn from_snapshot(snapshot: &MetricsSnapshot, co2: &Co2Constants) -> Self {
        let total_actions = snapshot.refusal_count.saturating_add(snapshot.bought_count);
        Self {
            potential: total_actions as f64 * co2.per_refusal,
            actual: snapshot.bought_count as f64 * co2.per_refusal,
            saved: snapshot.refusal_count as f64 * co2.per_refusal,
        }
    }

    pub fn actual_pct(&self) -> f64 {
        if self.potential > 0.0 {
            self.actual / self.potential * 100.0
        } else {
            0.0
        }
    }
}

/// Actual emissions against a buy-every-time baseline.
pub fn what_if(snapshot: &MetricsSnapshot, co2: &Co2Constants) -> BarComparison {
    let emissions = EmissionComparison::from_snapshot(snapshot, co2);

    let comment_text = if emissions.saved > 0.0 {
        format!(
            "Your choices saved {}g of CO2. Wonderful!",
            format_amount(emissions.saved)
        )
    } else {
        "Refusing a bag cuts CO2 emissions.".to_string()
    };

    BarComparison {
        primary_value: format!("{}g", format_amount(emissions.actual)),
        primary_height_pct: emissions.actual_pct(),
        primary_label: "Your emissions".to_string(),
        secondary_value: format!("{}g", format_amount(emissions.potential)),
        secondary_height_pct: 100.0,
        secondary_label: "If you had bought every time".to_string(),
        comment_text,
    }
}

pub fn impact(snapshot: &MetricsSnapshot, co2: &Co2Constants) -> ImpactPanel {
    let trees = ratio(snapshot.total_co2_saved, co2.per_tree_year);
    let km = ratio(snapshot.total_co2_saved, co2.per_km_driven);

    ImpactPanel {
        headline: IMPACT_HEADLINE.to_string(),
        trees_text: fixed(trees, 2),
        km_text: fixed(km, 2),
    }
}

pub fn action_message(action: LastAction, co2: &Co2Constants) -> String {
    match action {
        LastAction::Refused => format!("{}g of CO2 saved!", format_amount(co2.per_refusal)),
        LastAction::Bought => "Maybe next time!".to_string(),
    }
}

/// Gram amounts with at most two decimals and no trailing zeros.
pub fn format_amount(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        return "0".to_string();
    }
    rounded.to_string()
}

/// Fixed-point text with exact ties rounded away from zero (`7.625` -> `7.63`).
pub fn fixed(value: f64, decimals: usize) -> String {
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round() / factor;
    format!("{rounded:.decimals$}")
}

fn ratio(value: f64, per: f64) -> f64 {
    if per > 0.0 { value / per } else { 0.0 }
}
