use crate::domain::user::{LoginRequest, RegisterUser, UpdateUser, UserResponse};
use crate::presentation::handlers::{ApiError, AppState, MessageResponse};
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

#[derive(Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub user: UserResponse,
}

#[derive(Serialize)]
pub struct UpdateResponse {
    pub message: &'static str,
    #[serde(rename = "updatedUser")]
    pub updated_user: UserResponse,
}

#[derive(Debug, Deserialize)]
pub struct NameFilter {
    pub name: Option<String>,
}

#[instrument(skip(state, req), fields(email = %req.email))]
pub async fn register(
    state: web::Data<AppState>,
    req: web::Json<RegisterUser>,
) -> Result<HttpResponse, ApiError> {
    info!("Registration request received");

    let user = state
        .users
        .register(req.into_inner())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to register user");
            ApiError::from(e)
        })?;

    info!(user_id = %user.id, "User registered successfully");
    Ok(HttpResponse::Ok().json(MessageResponse::new("User registered successfully")))
}

#[instrument(skip(state, req), fields(email = %req.email))]
pub async fn login(
    state: web::Data<AppState>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    info!("Login request received");

    let user = state.users.login(req.into_inner()).await.map_err(|e| {
        error!(error = %e, "Failed to login");
        ApiError::from(e)
    })?;

    info!(user_id = %user.id, "Login successful");
    Ok(HttpResponse::Ok().json(LoginResponse {
        message: "User logged in successfully",
        user: user.into(),
    }))
}

#[instrument(skip(state))]
pub async fn list_users(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let users = state.users.list_users().await?;
    let users: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
    info!(count = users.len(), "Users listed");
    Ok(HttpResponse::Ok().json(users))
}

#[instrument(skip(state), fields(user_id = %*path))]
pub async fn get_user(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user_id = path.into_inner();
    let user = state.users.get_user(&user_id).await.map_err(|e| {
        error!(error = %e, "Failed to get user");
        ApiError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

#[instrument(skip(state))]
pub async fn filter_users(
    state: web::Data<AppState>,
    query: web::Query<NameFilter>,
) -> Result<HttpResponse, ApiError> {
    let users = state
        .users
        .filter_by_name(query.name.as_deref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to filter users");
            ApiError::from(e)
        })?;
    let users: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
    info!(count = users.len(), "Users filtered by name");
    Ok(HttpResponse::Ok().json(users))
}

#[instrument(skip(state, req), fields(user_id = %*path))]
pub async fn update_user(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<UpdateUser>,
) -> Result<HttpResponse, ApiError> {
    let user_id = path.into_inner();
    let user = state
        .users
        .update_user(&user_id, req.into_inner())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to update user");
            ApiError::from(e)
        })?;

    info!("User updated successfully");
    Ok(HttpResponse::Ok().json(UpdateResponse {
        message: "User updated successfully",
        updated_user: user.into(),
    }))
}

#[instrument(skip(state), fields(user_id = %*path))]
pub async fn delete_user(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user_id = path.into_inner();
    state.users.delete_user(&user_id).await.map_err(|e| {
        error!(error = %e, "Failed to delete user");
        ApiError::from(e)
    })?;

    info!("User deleted successfully");
    Ok(HttpResponse::Ok().json(MessageResponse::new("User deleted successfully")))
}
