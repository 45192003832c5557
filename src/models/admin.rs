use crate::models::permission::{CompareMode, PermComparison, PermLevel};
use crate::models::user::UserView;
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct ApiKeyQuery {
    pub api_key: String,
}

#[derive(Deserialize)]
pub struct UserAddRequest {
    pub api_key: String,
    pub login: String,
    pub password: String,
    #[serde(default)]
    pub perm: PermLevel,
}

#[derive(Deserialize)]
pub struct UserUpdateRequest {
    pub api_key: String,
    pub id: String,
    pub login: Option<String>,
    pub password: Option<String>,
    pub perm: Option<PermLevel>,
}

#[derive(Deserialize)]
pub struct UserRemoveRequest {
    pub api_key: String,
    pub id: String,
}

#[derive(Deserialize)]
pub struct UserIpRequest {
    pub api_key: String,
    pub id: String,
    pub ip: String,
}

/// Look a user up by id or by login
#[derive(Deserialize)]
pub struct UserInfoQuery {
    pub api_key: String,
    pub id: Option<String>,
    pub login: Option<String>,
}

#[derive(Deserialize)]
pub struct CompareQuery {
    pub api_key: String,
    pub candidate: PermLevel,
    pub reference: PermLevel,
    #[serde(default)]
    pub mode: CompareMode,
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub success: bool,
    pub user: UserView,
}

#[derive(Serialize)]
pub struct UserListResponse {
    pub success: bool,
    pub users: Vec<UserView>,
}

#[derive(Serialize)]
pub struct CompareResponse {
    pub success: bool,
    pub result: PermComparison,
}
