use axum::{extract::State, http::StatusCode, Json};
use tracing::info;

use crate::auth::Caller;
use crate::errors::AppError;
use crate::models::profile::{Profile, ProfileInput};
use crate::state::AppState;

/// POST /profile
///
/// Stores a new profile for the caller. Earlier profiles are kept; the newest one wins.
pub async fn handle_create_profile(
    State(state): State<AppState>,
    caller: Caller,
    Json(input): Json<ProfileInput>,
) -> Result<(StatusCode, Json<Profile>), AppError> {
    for (field, value) in [
        ("job", &input.job),
        ("sector", &input.sector),
        ("ai_level", &input.ai_level),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("{field} cannot be empty")));
        }
    }

    let profile = state.gateway.save_profile(&caller.id, input).await?;
    info!(
        user_id = %caller.id,
        email = ?caller.email,
        profile_id = %profile.id,
        "Profile saved"
    );
    Ok((StatusCode::CREATED, Json(profile)))
}
