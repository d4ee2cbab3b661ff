use askama::Template;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;

use crate::auth::{password, session};
use crate::error::{AppError, AppResult};
use crate::extractors::{cookie_value, CurrentUser};
use crate::routes::home::Html;
use crate::state::AppState;
use crate::users;

// -- Templates --

#[derive(Template)]
#[template(path = "pages/signup.html")]
pub struct SignupTemplate {
    pub error_message: String,
}

#[derive(Template)]
#[template(path = "pages/login.html")]
pub struct LoginTemplate {
    pub error_message: String,
}

// -- Request types --

#[derive(Deserialize)]
pub struct SignupForm {
    pub username: String,
    pub password: String,
    pub email: String,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

// -- Cookie helpers --

fn session_cookie(name: &str, token: &str, max_age_hours: u64) -> String {
    let max_age_secs = max_age_hours * 3600;
    format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}",
        name, token, max_age_secs
    )
}

fn clear_session_cookie(name: &str) -> String {
    format!("{}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0", name)
}

// -- Signup handlers --

/// GET /auth/signup — render the signup form
pub async fn signup_page() -> Html<SignupTemplate> {
    Html(SignupTemplate {
        error_message: String::new(),
    })
}

/// POST /auth/signup — validate, create the user, redirect to login.
/// Signup deliberately does not log the new user in.
pub async fn signup(
    State(state): State<AppState>,
    Form(form): Form<SignupForm>,
) -> AppResult<Response> {
    match try_signup(&state, &form) {
        Ok(()) => Ok(Redirect::to("/auth/login").into_response()),
        Err(e) => match e.form_message() {
            Some(error_message) => Ok(Html(SignupTemplate { error_message }).into_response()),
            None => Err(e),
        },
    }
}

fn try_signup(state: &AppState, form: &SignupForm) -> AppResult<()> {
    let username = form.username.trim();
    let email = form.email.trim();

    if username.is_empty() || form.password.is_empty() {
        return Err(AppError::Validation("Enter username and password".into()));
    }

    let eval = password::evaluate(&form.password);
    if !eval.acceptable {
        let reason = eval
            .reason
            .unwrap_or_else(|| "Password too weak. Try again!".to_string());
        return Err(AppError::WeakPassword(reason));
    }

    // Fast-path duplicate messages; the UNIQUE indexes on the users table
    // are what actually guarantees uniqueness under concurrent signups.
    if users::find_by_email(&state.db, email)?.is_some() {
        return Err(AppError::DuplicateEmail);
    }
    if users::find_by_username(&state.db, username)?.is_some() {
        return Err(AppError::DuplicateUsername);
    }

    let hash = password::hash_password(&form.password)?;
    users::create_user(&state.db, username, email, &hash)?;
    Ok(())
}

// -- Login handlers --

/// GET /auth/login — render the login form
pub async fn login_page() -> Html<LoginTemplate> {
    Html(LoginTemplate {
        error_message: String::new(),
    })
}

/// POST /auth/login — verify credentials, establish a session, redirect home
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    match try_login(&state, &form) {
        Ok(token) => {
            let cookie = session_cookie(
                &state.config.auth.cookie_name,
                &token,
                state.config.auth.session_hours,
            );
            Ok((
                StatusCode::SEE_OTHER,
                [
                    (header::LOCATION, "/".to_string()),
                    (header::SET_COOKIE, cookie),
                ],
                "",
            )
                .into_response())
        }
        Err(e) => match e.form_message() {
            Some(error_message) => Ok(Html(LoginTemplate { error_message }).into_response()),
            None => Err(e),
        },
    }
}

fn try_login(state: &AppState, form: &LoginForm) -> AppResult<String> {
    let username = form.username.trim();

    if username.is_empty() || form.password.is_empty() {
        return Err(AppError::Validation(
            "Please enter username and password".into(),
        ));
    }

    let user = users::find_by_username(&state.db, username)?.ok_or(AppError::UnknownUser)?;

    if !password::verify_password(&form.password, &user.password_hash) {
        return Err(AppError::InvalidCredentials);
    }

    session::create_session(&state.db, &user.id, state.config.auth.session_hours)
}

// -- Logout handler --

/// GET /auth/logout — destroy the session and redirect to login.
/// A failed destroy propagates; the response never claims a logout that
/// did not happen.
pub async fn logout(
    State(state): State<AppState>,
    _user: CurrentUser,
    headers: HeaderMap,
) -> AppResult<Response> {
    let cookie_name = state.config.auth.cookie_name.clone();
    if let Some(token) = cookie_value(&headers, &cookie_name) {
        session::destroy_session(&state.db, token)?;
    }

    Ok((
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, "/auth/login".to_string()),
            (header::SET_COOKIE, clear_session_cookie(&cookie_name)),
        ],
        "",
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_carries_name_token_and_max_age() {
        let cookie = session_cookie("craftery_session", "tok", 2);
        assert!(cookie.starts_with("craftery_session=tok;"));
        assert!(cookie.contains("Max-Age=7200"));
        assert!(cookie.contains("HttpOnly"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let cookie = clear_session_cookie("craftery_session");
        assert!(cookie.starts_with("craftery_session=;"));
        assert!(cookie.contains("Max-Age=0"));
    }
}
