use crate::models::{ChartSeries, ElectricitySummary};
use crate::stats::fixed;
use crate::store::PersistentStore;
use serde_json::Value;
use tracing::{info, warn};

pub const KEY_ELECTRICITY_DATA: &str = "electricityData";
pub const MONTHS: usize = 12;
pub const MONTH_LABELS: [&str; MONTHS] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Monthly electricity usage in kWh, kept apart from the bag counters.
#[derive(Debug, Clone, PartialEq)]
pub struct ElectricityLedger {
    monthly_kwh: [f64; MONTHS],
    co2_factor: f64,
}

impl ElectricityLedger {
    pub fn new(co2_factor: f64) -> Self {
        Self {
            monthly_kwh: [0.0; MONTHS],
            co2_factor,
        }
    }

    /// Fills the 12 slots from the stored array. Anything missing or unusable reads as 0.
    pub fn load<S: PersistentStore + ?Sized>(store: &S, co2_factor: f64) -> Self {
        let mut ledger = Self::new(co2_factor);
        let Some(raw) = store.get(KEY_ELECTRICITY_DATA) else {
            return ledger;
        };

        let values = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(values)) => values,
            Ok(_) => {
                warn!("stored electricity data is not an array, starting empty");
                return ledger;
            }
            Err(err) => {
                warn!("failed to parse stored electricity data: {err}");
                return ledger;
            }
        };

        for (slot, value) in ledger.monthly_kwh.iter_mut().zip(values.iter()) {
            *slot = sanitize(slot_value(value));
        }
        ledger
    }

    pub fn co2_factor(&self) -> f64 {
        self.co2_factor
    }

    pub fn months(&self) -> &[f64; MONTHS] {
        &self.monthly_kwh
    }

    pub fn month(&self, month: usize) -> f64 {
        self.monthly_kwh[slot_index(month)]
    }

    /// Sets usage for calendar `month` (1..=12). Negative input is stored as 0.
    ///
    /// # Panics
    ///
    /// Panics when `month` is outside 1..=12.
    pub fn set_month(&mut self, month: usize, kwh: f64) {
        self.monthly_kwh[slot_index(month)] = sanitize(kwh);
    }

    /// Writes all 12 months as one entry and returns exactly what was stored.
    pub fn save<S: PersistentStore + ?Sized>(&self, store: &mut S) -> String {
        let payload = Value::from(self.monthly_kwh.to_vec()).to_string();
        store.set(KEY_ELECTRICITY_DATA, payload.clone());
        info!(total_kwh = self.total_kwh(), "electricity data saved");
        payload
    }

    pub fn total_kwh(&self) -> f64 {
        self.monthly_kwh.iter().sum()
    }

    pub fn summarize(&self) -> ElectricitySummary {
        let total_kwh = self.total_kwh();
        let total_co2_kg = total_kwh * self.co2_factor;
        ElectricitySummary {
            total_kwh,
            total_co2_kg,
            total_kwh_text: fixed(total_kwh, 1),
            total_co2_kg_text: fixed(total_co2_kg, 1),
        }
    }

    pub fn chart_series(&self) -> ChartSeries {
        ChartSeries {
            labels: MONTH_LABELS.iter().map(|label| label.to_string()).collect(),
            kwh: self.monthly_kwh.to_vec(),
            co2_kg: self
                .monthly_kwh
                .iter()
                .map(|kwh| kwh * self.co2_factor)
                .collect(),
        }
    }
}

pub fn is_valid_month(month: usize) -> bool {
    (1..=MONTHS).contains(&month)
}

fn slot_index(month: usize) -> usize {
    assert!(is_valid_month(month), "month must be in 1..=12, got {month}");
    month - 1
}

fn slot_value(value: &Value) -> f64 {
    match value {
        Value::Number(number) => number.as_f64().unwrap_or(0.0),
        Value::String(text) => text.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn sanitize(kwh: f64) -> f64 {
    if kwh.is_finite() && kwh > 0.0 { kwh } else { 0.0 }
}
