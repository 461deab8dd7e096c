//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use tracing::{error, info, warn};

use crate::{
    error::ProfileError,
    profile::Profile,
    scheduler::{state_counts, TimerUpdate},
    state::{AppState, Timer, TimerAction, TimerId, TimerState},
    utils::validators::{parse_duration, validate_duration, validate_hotkey, validate_timer_label},
};
use super::responses::{
    ApiResponse, CreateTimerRequest, DurationInput, HealthResponse, ImportQuery,
    ProfileListResponse, StatusResponse, TimerView, UpdateTimerRequest,
};

type ApiError = (StatusCode, Json<ApiResponse>);

fn bad_request(message: String) -> ApiError {
    warn!("Rejected request: {}", message);
    (StatusCode::BAD_REQUEST, Json(ApiResponse::error(message)))
}

fn not_found(id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::error(format!("Timer {} not found", id))),
    )
}

fn profile_error(e: ProfileError) -> ApiError {
    let status = match &e {
        ProfileError::InvalidName { .. } => StatusCode::BAD_REQUEST,
        ProfileError::AlreadyExists { .. }
        | ProfileError::InUse { .. }
        | ProfileError::Protected { .. } => StatusCode::CONFLICT,
        _ => {
            error!("Profile operation failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(ApiResponse::error(e.to_string())))
}

fn profile_not_found(name: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::error(format!("Profile {} not found", name))),
    )
}

fn resolve_duration(input: &DurationInput) -> Result<u32, ApiError> {
    let seconds = match input {
        DurationInput::Seconds(secs) => Some(*secs),
        DurationInput::Text(text) => parse_duration(text),
    }
    .ok_or_else(|| bad_request("Invalid duration".to_string()))?;

    validate_duration(seconds).map_err(bad_request)
}

fn check_hotkey(hotkey: &str) -> Result<(), ApiError> {
    if let Some(warning) = validate_hotkey(hotkey).map_err(bad_request)? {
        warn!("Hotkey warning: {}", warning);
    }
    Ok(())
}

/// Handle GET /timers - List all timers in registration order
pub async fn list_timers_handler(State(state): State<Arc<AppState>>) -> Json<Vec<TimerView>> {
    Json(state.scheduler.list().iter().map(TimerView::from).collect())
}

/// Handle GET /timers/:id - Fetch one timer
pub async fn get_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TimerView>, ApiError> {
    state
        .scheduler
        .get(&id)
        .map(|timer| Json(TimerView::from(&timer)))
        .ok_or_else(|| not_found(&id))
}

/// Handle POST /timers - Create (or replace) a timer
pub async fn create_timer_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateTimerRequest>,
) -> Result<(StatusCode, Json<ApiResponse>), ApiError> {
    validate_timer_label(&request.label).map_err(bad_request)?;
    let duration = resolve_duration(&request.duration)?;

    let id = request.id.map(TimerId::from).unwrap_or_else(TimerId::generate);
    let mut timer = Timer::with_id(id, request.label, duration)
        .map_err(|e| bad_request(e.to_string()))?;
    if let Some(hotkey) = request.hotkey.filter(|h| !h.trim().is_empty()) {
        check_hotkey(&hotkey)?;
        timer = timer.with_hotkey(hotkey);
    }
    if let Some(alert) = request.alert {
        timer = timer.with_alert(alert);
    }
    if let Some(font) = request.font {
        timer = timer.with_font(font);
    }

    let view = TimerView::from(&timer);
    let replaced = state.scheduler.register(timer).is_some();
    state.record_action("create");
    info!("Timer '{}' ({}) created", view.label, view.id);

    let message = if replaced {
        format!("Timer {} replaced", view.id)
    } else {
        format!("Timer {} created", view.id)
    };
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(message, Some(view)))))
}

/// Handle PATCH /timers/:id - Change label, duration or presentation config
pub async fn update_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<UpdateTimerRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    if let Some(label) = &request.label {
        validate_timer_label(label).map_err(bad_request)?;
    }
    let duration = request.duration.as_ref().map(resolve_duration).transpose()?;
    let hotkey = match request.hotkey {
        Some(hotkey) if hotkey.trim().is_empty() => Some(None),
        Some(hotkey) => {
            check_hotkey(&hotkey)?;
            Some(Some(hotkey))
        }
        None => None,
    };

    let update = TimerUpdate {
        label: request.label,
        duration,
        hotkey,
        alert: request.alert.map(Some),
        font: request.font.map(Some),
    };

    match state.scheduler.reconfigure(&id, update) {
        Ok(Some(timer)) => {
            state.record_action("update");
            Ok(Json(ApiResponse::ok(
                format!("Timer {} updated", id),
                Some(TimerView::from(&timer)),
            )))
        }
        Ok(None) => Err(not_found(&id)),
        Err(e) => Err(bad_request(e.to_string())),
    }
}

/// Handle DELETE /timers/:id - Remove a timer
pub async fn delete_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    if !state.scheduler.unregister(&id) {
        return Err(not_found(&id));
    }
    state.record_action("delete");
    info!("Timer {} removed", id);
    Ok(Json(ApiResponse::ok(format!("Timer {} removed", id), None)))
}

/// Handle POST /timers/:id/:action - Start, pause, reset or toggle a timer
pub async fn timer_action_handler(
    State(state): State<Arc<AppState>>,
    Path((id, action)): Path<(String, String)>,
) -> Result<Json<ApiResponse>, ApiError> {
    if state.scheduler.get(&id).is_none() {
        return Err(not_found(&id));
    }

    let action = match action.parse::<TimerAction>() {
        Ok(action) => action,
        Err(e) => {
            let timer = state.scheduler.get(&id).map(|t| TimerView::from(&t));
            return Ok(Json(ApiResponse::ignored(e.to_string(), timer)));
        }
    };

    // The timer may have been removed since the lookup above
    if !state.scheduler.run_action(&id, action) {
        return Err(not_found(&id));
    }
    state.record_action(action.as_str());

    let timer = state.scheduler.get(&id).map(|t| TimerView::from(&t));
    Ok(Json(ApiResponse::ok(format!("Timer {}: {}", id, action), timer)))
}

/// Handle POST /profile/save - Persist the current timer list
pub async fn save_profile_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    match state.save_profile() {
        Ok(count) => {
            state.record_action("save");
            Ok(Json(ApiResponse::ok(
                format!("Saved {} timers to profile '{}'", count, state.profile_name()),
                None,
            )))
        }
        Err(e) => {
            error!("Failed to save profile: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle GET /profiles - List stored profiles
pub async fn list_profiles_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ProfileListResponse>, ApiError> {
    let profiles = state.store.list().map_err(profile_error)?;
    Ok(Json(ProfileListResponse {
        active: state.profile_name(),
        profiles,
        recent: state.get_session().recent_profiles,
    }))
}

/// Handle GET /profiles/:name - Export a stored profile document
pub async fn export_profile_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Profile>, ApiError> {
    state
        .store
        .load(&name)
        .map_err(profile_error)?
        .map(Json)
        .ok_or_else(|| profile_not_found(&name))
}

/// Handle POST /profiles/import - Store a profile document
pub async fn import_profile_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ImportQuery>,
    Json(profile): Json<Profile>,
) -> Result<(StatusCode, Json<ApiResponse>), ApiError> {
    let name = state
        .import_profile(&profile, query.name.as_deref(), query.overwrite)
        .map_err(profile_error)?;
    state.record_action("import");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(format!("Profile imported as '{}'", name), None)),
    ))
}

/// Handle POST /profiles/:name/load - Switch the active profile
pub async fn load_profile_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    if state.profile_name() == name {
        return Ok(Json(ApiResponse::ignored(
            format!("Profile '{}' is already active", name),
            None,
        )));
    }

    match state.switch_profile(&name).map_err(profile_error)? {
        Some(count) => {
            state.record_action("load");
            Ok(Json(ApiResponse::ok(
                format!("Switched to profile '{}' ({} timers)", name, count),
                None,
            )))
        }
        None => Err(profile_not_found(&name)),
    }
}

/// Handle DELETE /profiles/:name - Remove a stored profile
pub async fn delete_profile_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    if !state.delete_profile(&name).map_err(profile_error)? {
        return Err(profile_not_found(&name));
    }
    state.record_action("delete_profile");
    Ok(Json(ApiResponse::ok(format!("Profile '{}' deleted", name), None)))
}

/// Handle GET /status - Return scheduler and timer summary
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let timers = state.scheduler.list();
    let counts = state_counts(&timers);
    let count_of = |wanted: TimerState| {
        counts
            .iter()
            .find(|(s, _)| *s == wanted)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    };
    let (last_action, last_action_time) = state.get_last_action();

    Json(StatusResponse {
        scheduler: state.scheduler.status(),
        tick_interval_ms: state.scheduler.tick_interval().as_millis() as u64,
        profile: state.profile_name(),
        timers_total: timers.len(),
        timers_running: count_of(TimerState::Running),
        timers_paused: count_of(TimerState::Paused),
        timers_completed: count_of(TimerState::Completed),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
        last_completed: state.get_last_completed(),
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
