use crate::errors::AppError;
use crate::models::{
    DailyRow, DashboardView, LoginRequest, NewPracticeRequest, Notice, PracticeTotal,
    ProgressResponse, RegisterRequest, SessionUser, TapResponse,
};
use crate::state::AppState;
use crate::tap::apply_tap;
use crate::ui::render_index;
use crate::view::{build_daily, build_view};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
    Json,
};
use serde_json::Value;
use tracing::{info, warn};

pub async fn index() -> Html<String> {
    Html(render_index())
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn list_practices(
    State(state): State<AppState>,
) -> Result<Json<Vec<PracticeTotal>>, AppError> {
    let practices = state.remote.list_practices().await?;
    Ok(Json(build_view(&practices, &[]).practices))
}

pub async fn get_progress(
    State(state): State<AppState>,
    Path(practice_id): Path<String>,
) -> Json<ProgressResponse> {
    let progress = state.store.lock().await.load(&practice_id);
    Json(ProgressResponse {
        practice_id,
        progress,
    })
}

pub async fn tap(
    State(state): State<AppState>,
    Path(practice_id): Path<String>,
) -> Result<Json<TapResponse>, AppError> {
    let practice_id = practice_id.trim().to_string();
    if practice_id.is_empty() {
        return Err(AppError::bad_request("practice id is required"));
    }

    let (progress, completed, persisted) = {
        let mut store = state.store.lock().await;
        let (next, completed) = apply_tap(store.load(&practice_id));
        let persisted = match store.save(&practice_id, next).await {
            Ok(()) => true,
            Err(err) => {
                warn!(%practice_id, "progress kept in memory only: {err}");
                false
            }
        };
        (next, completed, persisted)
    };

    let sync = if completed {
        info!(%practice_id, unit = progress.completed_units, "mala completed");
        Some(state.sync.dispatch(&practice_id, progress.completed_units).await)
    } else {
        None
    };

    Ok(Json(TapResponse {
        practice_id,
        progress,
        completed,
        sync,
        persisted,
    }))
}

pub async fn add_count(
    State(state): State<AppState>,
    Path(practice_id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<StatusCode, AppError> {
    let count = positive_count(&payload)
        .ok_or_else(|| AppError::bad_request("count must be a positive number"))?;

    state.remote.add_count(&practice_id, count).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_daily(State(state): State<AppState>) -> Result<Json<Vec<DailyRow>>, AppError> {
    let entries = state.remote.daily_counts().await?;
    Ok(Json(build_daily(&entries)))
}

pub async fn get_dashboard(
    State(state): State<AppState>,
) -> Result<Json<DashboardView>, AppError> {
    let (practices, users) = tokio::try_join!(
        state.remote.list_practices(),
        state.remote.users_with_counts()
    )?;
    Ok(Json(build_view(&practices, &users)))
}

pub async fn get_notices(State(state): State<AppState>) -> Json<Vec<Notice>> {
    Json(state.notices.drain().await)
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<SessionUser>, AppError> {
    if payload.identifier.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::bad_request("identifier and password are required"));
    }

    let session = state.remote.login(&payload).await?;
    info!(user = %session.user.name, role = %session.user.role, "logged in");
    Ok(Json(session.user))
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<StatusCode, AppError> {
    if payload.name.trim().is_empty() || payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::bad_request("name, email and password are required"));
    }

    state.remote.register(&payload).await?;
    Ok(StatusCode::CREATED)
}

pub async fn logout(State(state): State<AppState>) -> StatusCode {
    state.remote.clear_session().await;
    StatusCode::NO_CONTENT
}

pub async fn add_practice(
    State(state): State<AppState>,
    Json(payload): Json<NewPracticeRequest>,
) -> Result<StatusCode, AppError> {
    require_admin(&state).await?;
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("practice name is required"));
    }

    state.remote.add_practice(name).await?;
    info!(name, "practice added");
    Ok(StatusCode::CREATED)
}

pub async fn delete_practice(
    State(state): State<AppState>,
    Path(practice_id): Path<String>,
) -> Result<StatusCode, AppError> {
    require_admin(&state).await?;
    state.remote.delete_practice(&practice_id).await?;
    info!(%practice_id, "practice deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn positive_count(payload: &Value) -> Option<u64> {
    payload
        .get("count")
        .and_then(Value::as_u64)
        .filter(|count| *count > 0)
}

async fn require_admin(state: &AppState) -> Result<(), AppError> {
    match state.remote.session().await {
        Some(session) if session.user.is_admin() => Ok(()),
        Some(_) => Err(AppError::forbidden("admin role required")),
        None => Err(AppError::forbidden("login required")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn manual_count_must_be_a_positive_integer() {
        assert_eq!(positive_count(&json!({ "count": 11 })), Some(11));
        assert_eq!(positive_count(&json!({ "count": 0 })), None);
        assert_eq!(positive_count(&json!({ "count": -3 })), None);
        assert_eq!(positive_count(&json!({ "count": 2.5 })), None);
        assert_eq!(positive_count(&json!({ "count": "12" })), None);
        assert_eq!(positive_count(&json!({})), None);
    }
}
