use crate::electricity::{self, ElectricityLedger};
use crate::errors::AppError;
use crate::mode::GraphMode;
use crate::models::{
    ActionRequest, ElectricityResponse, GoalForm, MonthValueRequest, ResetForm, StateResponse,
};
use crate::state::{AppData, AppState, DataCheckpoint};
use crate::storage::persist_store;
use crate::tracker::{Action, Tracker};
use crate::ui::{render_electricity, render_index};
use axum::{
    extract::{Path, State},
    response::{Html, Redirect},
    Form, Json,
};
use chrono::{Datelike, Local};
use std::collections::HashMap;
use tracing::{debug, error, info};

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let data = state.data.lock().await;
    Html(render_index(&data.tracker))
}

pub async fn get_state(State(state): State<AppState>) -> Json<StateResponse> {
    let data = state.data.lock().await;
    Json(state_response(&data.tracker))
}

pub async fn action(
    State(state): State<AppState>,
    Json(payload): Json<ActionRequest>,
) -> Result<Json<StateResponse>, AppError> {
    let action = Action::try_from(payload)?;
    let response = apply_action(&state, action).await?;
    Ok(Json(response))
}

pub async fn refuse(State(state): State<AppState>) -> Result<Redirect, AppError> {
    apply_action(&state, Action::Refuse).await?;
    Ok(Redirect::to("/"))
}

pub async fn buy(State(state): State<AppState>) -> Result<Redirect, AppError> {
    apply_action(&state, Action::Buy).await?;
    Ok(Redirect::to("/"))
}

pub async fn open_settings(State(state): State<AppState>) -> Result<Redirect, AppError> {
    apply_action(&state, Action::OpenSettings).await?;
    Ok(Redirect::to("/"))
}

pub async fn show_main(State(state): State<AppState>) -> Result<Redirect, AppError> {
    apply_action(&state, Action::ShowMain).await?;
    Ok(Redirect::to("/"))
}

pub async fn save_goal(
    State(state): State<AppState>,
    Form(form): Form<GoalForm>,
) -> Result<Redirect, AppError> {
    apply_action(&state, Action::SaveGoal(form.goal)).await?;
    Ok(Redirect::to("/"))
}

pub async fn select_mode(
    State(state): State<AppState>,
    Path(mode): Path<String>,
) -> Result<Redirect, AppError> {
    let mode = parse_mode(&mode)?;
    apply_action(&state, Action::SelectMode(mode)).await?;
    Ok(Redirect::to("/"))
}

/// Puts the reset question on screen; the answer arrives at `/reset/confirm`.
pub async fn reset(State(state): State<AppState>) -> Result<Redirect, AppError> {
    apply_action(&state, Action::RequestReset).await?;
    Ok(Redirect::to("/"))
}

pub async fn confirm_reset(
    State(state): State<AppState>,
    Form(form): Form<ResetForm>,
) -> Result<Redirect, AppError> {
    let confirmed = form.confirm.as_deref() == Some("yes");
    apply_action(&state, Action::Reset { confirmed }).await?;
    Ok(Redirect::to("/"))
}

/// Runs `action` and flushes the store when it changed. If the flush fails,
/// memory is rolled back so it never runs ahead of the file on disk.
async fn apply_action(state: &AppState, action: Action) -> Result<StateResponse, AppError> {
    let mut guard = state.data.lock().await;
    let data = &mut *guard;

    let mutates = action.mutates_store();
    let clears = matches!(action, Action::Reset { confirmed: true });
    let checkpoint = mutates.then(|| data.checkpoint());

    data.tracker.dispatch(&mut data.store, action)?;
    if clears {
        data.reload_ledger();
    }
    if let Some(checkpoint) = checkpoint {
        if let Err(err) = persist_store(&state.data_path, &data.store).await {
            error!(path = %state.data_path.display(), "failed to persist store: {}", err.message);
            data.rollback(checkpoint);
            return Err(err);
        }
    }

    Ok(state_response(&data.tracker))
}

fn state_response(tracker: &Tracker) -> StateResponse {
    StateResponse {
        counters: tracker.counters(),
        graph_mode: tracker.graph_mode(),
        enabled_modes: tracker.enabled_modes(),
        screen: tracker.screen().clone(),
    }
}

fn parse_mode(raw: &str) -> Result<GraphMode, AppError> {
    raw.parse::<GraphMode>()
        .map_err(|err| AppError::bad_request(err.to_string()))
}

impl TryFrom<ActionRequest> for Action {
    type Error = AppError;

    fn try_from(request: ActionRequest) -> Result<Self, Self::Error> {
        Ok(match request {
            ActionRequest::Refuse => Action::Refuse,
            ActionRequest::Buy => Action::Buy,
            ActionRequest::OpenSettings => Action::OpenSettings,
            ActionRequest::ShowMain => Action::ShowMain,
            ActionRequest::SaveGoal { goal } => {
                let candidate = match goal {
                    serde_json::Value::String(text) => text,
                    other => other.to_string(),
                };
                Action::SaveGoal(candidate)
            }
            ActionRequest::SelectMode { mode } => Action::SelectMode(parse_mode(&mode)?),
            ActionRequest::RequestReset => Action::RequestReset,
            ActionRequest::Reset { confirmed } => Action::Reset { confirmed },
        })
    }
}

pub async fn electricity_page(State(state): State<AppState>) -> Html<String> {
    let data = state.data.lock().await;
    Html(render_electricity(&data.ledger, current_month()))
}

pub async fn get_electricity(State(state): State<AppState>) -> Json<ElectricityResponse> {
    let data = state.data.lock().await;
    Json(electricity_response(&data.ledger, false))
}

/// Updates one month in memory; nothing is written until a save.
pub async fn set_month(
    State(state): State<AppState>,
    Path(month): Path<usize>,
    Json(payload): Json<MonthValueRequest>,
) -> Result<Json<ElectricityResponse>, AppError> {
    if !electricity::is_valid_month(month) {
        return Err(AppError::bad_request("month must be between 1 and 12"));
    }
    let mut data = state.data.lock().await;
    data.ledger.set_month(month, payload.value);
    Ok(Json(electricity_response(&data.ledger, false)))
}

pub async fn save_electricity(
    State(state): State<AppState>,
) -> Result<Json<ElectricityResponse>, AppError> {
    let mut guard = state.data.lock().await;
    let data = &mut *guard;
    let checkpoint = data.checkpoint();
    flush_ledger(&state, data, checkpoint).await?;
    Ok(Json(electricity_response(&data.ledger, true)))
}

/// Saves the 12 inputs posted from the electricity page (`month-1` .. `month-12`).
pub async fn save_electricity_form(
    State(state): State<AppState>,
    Form(fields): Form<HashMap<String, String>>,
) -> Result<Redirect, AppError> {
    let mut guard = state.data.lock().await;
    let data = &mut *guard;
    let checkpoint = data.checkpoint();
    for month in 1..=electricity::MONTHS {
        let value = fields
            .get(&format!("month-{month}"))
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .unwrap_or(0.0);
        data.ledger.set_month(month, value);
    }
    flush_ledger(&state, data, checkpoint).await?;
    info!("electricity form saved");
    Ok(Redirect::to("/electricity"))
}

/// Writes the ledger into the store and the store to disk, or rolls both back.
async fn flush_ledger(
    state: &AppState,
    data: &mut AppData,
    checkpoint: DataCheckpoint,
) -> Result<(), AppError> {
    let payload = data.ledger.save(&mut data.store);
    match persist_store(&state.data_path, &data.store).await {
        Ok(()) => {
            debug!(%payload, "electricity data flushed");
            Ok(())
        }
        Err(err) => {
            error!(path = %state.data_path.display(), "failed to persist electricity data: {}", err.message);
            data.rollback(checkpoint);
            Err(err)
        }
    }
}

fn electricity_response(ledger: &ElectricityLedger, saved: bool) -> ElectricityResponse {
    ElectricityResponse {
        months: ledger.months().to_vec(),
        current_month: current_month(),
        summary: ledger.summarize(),
        chart: ledger.chart_series(),
        saved,
    }
}

fn current_month() -> u32 {
    Local::now().month()
}
