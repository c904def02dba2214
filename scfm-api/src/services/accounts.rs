//! Registration, login and admin user management
//!
//! Sessions are opaque bearer tokens. Banning a user revokes every session
//! they hold and blocks future logins.

use scfm_common::auth::{generate_session_token, new_credentials, verify_password, MIN_PASSWORD_LEN};
use scfm_common::error::FieldErrors;
use scfm_common::events::ScfmEvent;
use scfm_common::models::user::normalize_email;
use scfm_common::models::{Role, User};
use scfm_common::time::now;
use scfm_common::validation::is_valid_email;
use scfm_common::{Error, Result};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::AppState;

pub const INVALID_LOGIN: &str = "Invalid email or password.";
pub const BANNED: &str = "This account has been banned.";

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Admin edit of a user; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub is_banned: Option<bool>,
}

/// Create an artist account (admin if the email is configured as one) and log in
pub async fn register(state: &AppState, input: RegisterRequest) -> Result<(User, String)> {
    let mut errors = FieldErrors::new();
    let name = input.name.trim();
    if name.is_empty() {
        errors.insert("name".to_string(), "Name is required.".to_string());
    }
    if !is_valid_email(&input.email) {
        errors.insert("email".to_string(), "Please enter a valid email address.".to_string());
    }
    if input.password.chars().count() < MIN_PASSWORD_LEN {
        errors.insert(
            "password".to_string(),
            format!("Password must be at least {} characters.", MIN_PASSWORD_LEN),
        );
    }
    if !errors.is_empty() {
        return Err(Error::Validation(errors));
    }

    let role = if state.config.is_admin_email(&input.email) {
        Role::Admin
    } else {
        Role::Artist
    };
    let user = User::new(name.to_string(), input.email, role, now());
    state
        .repo
        .create_user(&user, &new_credentials(&input.password))
        .await?;
    info!(user_id = %user.id, role = user.role.as_str(), "User registered");

    let token = open_session(state, &user).await?;
    Ok((user, token))
}

pub async fn login(state: &AppState, email: &str, password: &str) -> Result<(User, String)> {
    let email = normalize_email(email);
    let Some(user) = state.repo.find_user_by_email(&email).await? else {
        warn!(email = %email, "Login for unknown email");
        return Err(Error::Auth(INVALID_LOGIN.to_string()));
    };
    let credentials = state
        .repo
        .find_credentials(user.id)
        .await?
        .ok_or_else(|| Error::Auth(INVALID_LOGIN.to_string()))?;
    if !verify_password(password, &credentials) {
        warn!(user_id = %user.id, "Login with wrong password");
        return Err(Error::Auth(INVALID_LOGIN.to_string()));
    }
    if user.is_banned {
        warn!(user_id = %user.id, "Login attempt by banned user");
        return Err(Error::Auth(BANNED.to_string()));
    }

    let token = open_session(state, &user).await?;
    info!(user_id = %user.id, "User logged in");
    Ok((user, token))
}

pub async fn logout(state: &AppState, token: &str) -> Result<()> {
    state.repo.delete_session(token).await
}

/// Resolve a bearer token to an active, non-banned user
pub async fn authenticate(state: &AppState, token: &str) -> Result<User> {
    let user_id = state
        .repo
        .find_session(token)
        .await?
        .ok_or_else(|| Error::Auth("Invalid or expired session.".to_string()))?;
    let user = state
        .repo
        .find_user(user_id)
        .await?
        .ok_or_else(|| Error::Auth("Invalid or expired session.".to_string()))?;
    if user.is_banned {
        return Err(Error::Auth(BANNED.to_string()));
    }
    Ok(user)
}

pub async fn list_users(state: &AppState) -> Result<Vec<User>> {
    state.repo.list_users().await
}

pub async fn update_user(
    state: &AppState,
    admin: &User,
    user_id: Uuid,
    changes: UpdateUserRequest,
) -> Result<User> {
    let mut user = state
        .repo
        .find_user(user_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("user {}", user_id)))?;

    if let Some(name) = changes.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::field("name", "Name is required."));
        }
        user.name = name.to_string();
    }
    if let Some(email) = changes.email {
        if !is_valid_email(&email) {
            return Err(Error::field("email", "Please enter a valid email address."));
        }
        user.email = normalize_email(&email);
    }
    if let Some(role) = changes.role {
        if user.id == admin.id && role != Role::Admin {
            return Err(Error::InvalidInput("admins cannot demote themselves".to_string()));
        }
        user.role = role;
    }
    if let Some(is_banned) = changes.is_banned {
        if user.id == admin.id && is_banned {
            return Err(Error::InvalidInput("admins cannot ban themselves".to_string()));
        }
        user.is_banned = is_banned;
    }

    save_user(state, admin, user).await
}

pub async fn ban_user(state: &AppState, admin: &User, user_id: Uuid) -> Result<User> {
    update_user(
        state,
        admin,
        user_id,
        UpdateUserRequest {
            is_banned: Some(true),
            ..Default::default()
        },
    )
    .await
}

async fn save_user(state: &AppState, admin: &User, user: User) -> Result<User> {
    state.repo.update_user(&user).await?;
    if user.is_banned {
        let revoked = state.repo.delete_sessions_for_user(user.id).await?;
        info!(user_id = %user.id, admin_id = %admin.id, revoked, "User banned");
    } else {
        info!(user_id = %user.id, admin_id = %admin.id, "User updated");
    }

    state.events.emit_lossy(ScfmEvent::UserUpdated {
        user_id: user.id,
        is_banned: user.is_banned,
        timestamp: now(),
    });
    Ok(user)
}

async fn open_session(state: &AppState, user: &User) -> Result<String> {
    let token = generate_session_token();
    state.repo.create_session(&token, user.id, now()).await?;
    Ok(token)
}
