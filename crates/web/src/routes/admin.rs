//! Admin panel route handlers.
//!
//! Every handler requires [`RequireAdmin`], which re-checks the role in the
//! database. At least one admin must remain at all times.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tracing::instrument;

use playdeck_core::{UserId, UserRole};

use crate::db::{AdminChange, RepositoryError, UserRepository};
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::{CurrentUser, User};
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

/// Create-user form data.
#[derive(Debug, Deserialize)]
pub struct CreateUserForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: String,
}

/// Admin page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/index.html")]
pub struct AdminTemplate {
    pub current_user: Option<CurrentUser>,
    pub users: Vec<User>,
    pub admin_count: i64,
}

/// List every user with the create form.
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<impl IntoResponse, AppError> {
    let repo = UserRepository::new(state.pool());
    let users = repo.list_all().await?;
    let admin_count = repo.count_admins().await?;

    Ok(AdminTemplate {
        current_user: Some(admin),
        users,
        admin_count,
    })
}

/// Grant the admin role. Unknown ids are ignored.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn promote(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<UserId>,
) -> Result<Redirect, AppError> {
    match UserRepository::new(state.pool())
        .set_role(id, UserRole::Admin)
        .await
    {
        Ok(()) => tracing::info!(user_id = %id, "User promoted to admin"),
        Err(RepositoryError::NotFound) => {}
        Err(e) => return Err(e.into()),
    }

    Ok(Redirect::to("/admin"))
}

/// Revoke the admin role, refusing to remove the last admin.
///
/// Targets that are missing or not admins are left untouched.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn demote(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<UserId>,
) -> Result<Redirect, AppError> {
    match UserRepository::new(state.pool()).demote(id).await? {
        AdminChange::Applied => tracing::info!(user_id = %id, "Admin demoted to user"),
        AdminChange::Unchanged => {}
        AdminChange::LastAdmin => {
            return Err(AppError::BadRequest(
                "Cannot remove the last administrator".to_string(),
            ));
        }
    }

    Ok(Redirect::to("/admin"))
}

/// Delete a user and their favourites. Chat messages are kept.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<UserId>,
) -> Result<Redirect, AppError> {
    if id == admin.id {
        return Err(AppError::BadRequest(
            "You cannot delete your own account".to_string(),
        ));
    }

    match UserRepository::new(state.pool()).delete(id).await? {
        AdminChange::Applied => tracing::info!(user_id = %id, "User deleted"),
        AdminChange::Unchanged => {}
        AdminChange::LastAdmin => {
            return Err(AppError::BadRequest(
                "Cannot delete the last administrator".to_string(),
            ));
        }
    }

    Ok(Redirect::to("/admin"))
}

/// Create a user with the chosen role (default `user`).
#[instrument(skip(state, admin, form), fields(admin_id = %admin.id, email = %form.email))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Form(form): Form<CreateUserForm>,
) -> Result<Redirect, AppError> {
    let role = if form.role.trim().is_empty() {
        UserRole::User
    } else {
        form.role
            .parse::<UserRole>()
            .map_err(|_| AppError::BadRequest("Invalid role".to_string()))?
    };

    let created = AuthService::new(state.pool())
        .register(&form.name, &form.email, &form.password, role)
        .await;

    match created {
        Ok(user) => {
            tracing::info!(user_id = %user.id, role = %user.role, "User created by admin");
            Ok(Redirect::to("/admin"))
        }
        Err(AuthError::UserAlreadyExists) => {
            Err(AppError::BadRequest("Email already exists".to_string()))
        }
        Err(e) if e.is_invalid_input() => Err(AppError::BadRequest(capitalize(&e.to_string()))),
        Err(e) => Err(e.into()),
    }
}

/// Upper-case the first letter of an error message for display.
fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
