use crate::core::error::AdminError;
use crate::core::state::AppState;
use crate::models::admin::{
    ApiKeyQuery, CompareQuery, CompareResponse, SuccessResponse, UserAddRequest,
    UserInfoQuery, UserIpRequest, UserListResponse, UserRemoveRequest, UserResponse,
    UserUpdateRequest,
};
use crate::models::user::{UserUpdate, UserView};
use crate::utils::auth::verify_admin_key;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{info, warn};

fn authorize(state: &AppState, api_key: &str, action: &str) -> Result<(), AdminError> {
    if !verify_admin_key(api_key, state.config.auth.admin_api_key.as_deref()) {
        warn!(action = %action, "Unauthorized admin attempt");
        return Err(AdminError::InvalidApiKey);
    }
    Ok(())
}

fn success(message: &str) -> Response {
    (
        StatusCode::OK,
        Json(SuccessResponse {
            success: true,
            message: message.to_string(),
        }),
    )
        .into_response()
}

/// Create a user
///
/// POST /user/add {api_key, login, password, perm}
pub async fn user_add_handler(
    State(state): State<Arc<AppState>>,
    Json(params): Json<UserAddRequest>,
) -> Result<Response, AdminError> {
    authorize(&state, &params.api_key, "user add")?;

    if params.login.is_empty() || params.password.is_empty() {
        return Err(AdminError::InvalidParameter(
            "login and password must not be empty".to_string(),
        ));
    }

    let user = state
        .users
        .create_user(&params.login, &params.password, params.perm)
        .await?
        .ok_or_else(|| AdminError::Conflict(format!("login '{}' is already taken", params.login)))?;

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            success: true,
            user: UserView::from(&user),
        }),
    )
        .into_response())
}

/// Patch login, password or permission of a user
///
/// POST /user/update {api_key, id, login?, password?, perm?}
pub async fn user_update_handler(
    State(state): State<Arc<AppState>>,
    Json(params): Json<UserUpdateRequest>,
) -> Result<Response, AdminError> {
    authorize(&state, &params.api_key, "user update")?;

    if !state.users.has_user(&params.id) {
        return Err(AdminError::NotFound(format!("user {}", params.id)));
    }

    let update = UserUpdate {
        id: params.id,
        login: params.login,
        password: params.password,
        perm: params.perm,
    };

    if update.is_empty() {
        return Err(AdminError::InvalidParameter("nothing to update".to_string()));
    }

    if update.has_blank_field() {
        return Err(AdminError::InvalidParameter(
            "login and password must not be empty".to_string(),
        ));
    }

    if !state.users.update_user(&update).await? {
        return Err(AdminError::Conflict("login is already taken".to_string()));
    }

    Ok(success("User updated successfully"))
}

/// Delete a user
///
/// POST /user/remove {api_key, id}
pub async fn user_remove_handler(
    State(state): State<Arc<AppState>>,
    Json(params): Json<UserRemoveRequest>,
) -> Result<Response, AdminError> {
    authorize(&state, &params.api_key, "user remove")?;

    if !state.users.delete_user(&params.id).await? {
        return Err(AdminError::NotFound(format!("user {}", params.id)));
    }

    Ok(success("User removed successfully"))
}

/// Grant an IP to a user
///
/// POST /user/allow {api_key, id, ip}
pub async fn user_allow_handler(
    State(state): State<Arc<AppState>>,
    Json(params): Json<UserIpRequest>,
) -> Result<Response, AdminError> {
    authorize(&state, &params.api_key, "user allow")?;

    if params.ip.trim().is_empty() {
        return Err(AdminError::InvalidParameter("ip must not be empty".to_string()));
    }

    if !state.users.allow(&params.id, params.ip.trim()).await? {
        return Err(AdminError::NotFound(format!("user {}", params.id)));
    }

    info!(user_id = %params.id, ip = %params.ip, "IP allowed by admin");
    Ok(success("IP allowed successfully"))
}

/// Revoke an IP from a user
///
/// POST /user/disallow {api_key, id, ip}
pub async fn user_disallow_handler(
    State(state): State<Arc<AppState>>,
    Json(params): Json<UserIpRequest>,
) -> Result<Response, AdminError> {
    authorize(&state, &params.api_key, "user disallow")?;

    if !state.users.disallow(&params.id, params.ip.trim()).await? {
        return Err(AdminError::NotFound(format!("user {}", params.id)));
    }

    info!(user_id = %params.id, ip = %params.ip, "IP disallowed by admin");
    Ok(success("IP disallowed successfully"))
}

/// GET /user/info?api_key=<key>&id=<id> or &login=<login>
pub async fn user_info_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UserInfoQuery>,
) -> Result<Response, AdminError> {
    authorize(&state, &params.api_key, "user info")?;

    let user = match (&params.id, &params.login) {
        (Some(id), _) => state.users.get_user(id),
        (None, Some(login)) => state.users.get_user_by_login(login),
        (None, None) => {
            return Err(AdminError::InvalidParameter(
                "either id or login is required".to_string(),
            ))
        }
    }
    .ok_or_else(|| AdminError::NotFound("user".to_string()))?;

    Ok(Json(UserResponse {
        success: true,
        user: UserView::from(&user),
    })
    .into_response())
}

/// GET /user/list?api_key=<key>
pub async fn user_list_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ApiKeyQuery>,
) -> Result<Response, AdminError> {
    authorize(&state, &params.api_key, "user list")?;

    let users = state.users.users().iter().map(UserView::from).collect();

    Ok(Json(UserListResponse {
        success: true,
        users,
    })
    .into_response())
}

/// GET /user/compare?api_key=<key>&candidate=<perm>&reference=<perm>&mode=<boolean|label>
pub async fn user_compare_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CompareQuery>,
) -> Result<Response, AdminError> {
    authorize(&state, &params.api_key, "permission compare")?;

    let result = state
        .users
        .compare_permission(params.candidate, params.reference, params.mode);

    Ok(Json(CompareResponse {
        success: true,
        result,
    })
    .into_response())
}
