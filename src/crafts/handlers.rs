use askama::Template;
use axum::extract::{Multipart, Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;

use crate::crafts::{self, favorites};
use crate::db::models::Craft;
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::routes::home::Html;
use crate::state::AppState;
use crate::uploads;

// -- Templates --

pub struct CraftView {
    pub id: String,
    pub title: String,
    pub category: String,
    pub image_url: String,
}

pub struct CraftDetailView {
    pub id: String,
    pub title: String,
    pub category: String,
    pub description: String,
    pub materials: String,
    pub instructions: String,
    pub image_url: String,
    pub favorite_count: usize,
}

#[derive(Template)]
#[template(path = "pages/results.html")]
pub struct ResultsTemplate {
    pub category: String,
    pub crafts: Vec<CraftView>,
    pub user_is_logged_in: bool,
}

#[derive(Template)]
#[template(path = "pages/details.html")]
pub struct DetailsTemplate {
    pub craft: CraftDetailView,
    pub user_is_logged_in: bool,
    pub favorited: bool,
}

#[derive(Template)]
#[template(path = "pages/favorites.html")]
pub struct FavoritesTemplate {
    pub username: String,
    pub favorites: Vec<CraftView>,
    pub posts: Vec<CraftView>,
}

#[derive(Template)]
#[template(path = "pages/add_post.html")]
pub struct AddPostTemplate {
    pub username: String,
    pub error_message: String,
}

#[derive(Template)]
#[template(path = "pages/edit_post.html")]
pub struct EditPostTemplate {
    pub craft: CraftDetailView,
}

#[derive(Template)]
#[template(path = "pages/search_results.html")]
pub struct SearchResultsTemplate {
    pub query: String,
    pub crafts: Vec<CraftView>,
    pub user_is_logged_in: bool,
}

fn craft_view(craft: Craft) -> CraftView {
    CraftView {
        id: craft.id,
        title: craft.title,
        category: craft.category,
        image_url: craft.image_url.unwrap_or_default(),
    }
}

fn craft_views(crafts: Vec<Craft>) -> Vec<CraftView> {
    crafts.into_iter().map(craft_view).collect()
}

fn detail_view(craft: Craft, favorite_count: usize) -> CraftDetailView {
    CraftDetailView {
        id: craft.id,
        title: craft.title,
        category: craft.category,
        description: craft.description,
        materials: craft.materials,
        instructions: craft.instructions,
        image_url: craft.image_url.unwrap_or_default(),
        favorite_count,
    }
}

// -- Public pages --

/// GET /results/{category} — crafts in one category
pub async fn results(
    State(state): State<AppState>,
    Path(category): Path<String>,
    maybe_user: MaybeUser,
) -> AppResult<Response> {
    let crafts = crafts::list_by_category(&state.db, &category)?;
    Ok(Html(ResultsTemplate {
        category,
        crafts: craft_views(crafts),
        user_is_logged_in: maybe_user.0.is_some(),
    })
    .into_response())
}

/// GET /details/{id} — one craft, with its favorite status for the viewer
pub async fn details(
    State(state): State<AppState>,
    Path(id): Path<String>,
    maybe_user: MaybeUser,
) -> AppResult<Response> {
    let craft = crafts::find_craft(&state.db, &id)?.ok_or(AppError::NotFound)?;
    let fans = favorites::favorited_by(&state.db, &id)?;
    let favorited = match &maybe_user.0 {
        Some(user) => fans.contains(&user.id),
        None => false,
    };

    Ok(Html(DetailsTemplate {
        craft: detail_view(craft, fans.len()),
        user_is_logged_in: maybe_user.0.is_some(),
        favorited,
    })
    .into_response())
}

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(rename = "searchRequest", default)]
    pub search_request: String,
}

/// GET /craft-search?searchRequest= — substring title search
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
    maybe_user: MaybeUser,
) -> AppResult<Response> {
    let crafts = crafts::search_by_title(&state.db, query.search_request.trim())?;
    Ok(Html(SearchResultsTemplate {
        query: query.search_request,
        crafts: craft_views(crafts),
        user_is_logged_in: maybe_user.0.is_some(),
    })
    .into_response())
}

// -- Private pages --

/// GET /favorites — the user's favorites and authored posts
pub async fn favorites_page(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Response> {
    let favorites = favorites::favorites_of(&state.db, &user.id)?;
    let posts = crafts::crafts_created_by(&state.db, &user.id)?;

    Ok(Html(FavoritesTemplate {
        username: user.username,
        favorites: craft_views(favorites),
        posts: craft_views(posts),
    })
    .into_response())
}

/// GET /addPost — render the new-craft form
pub async fn add_post_page(user: CurrentUser) -> Html<AddPostTemplate> {
    Html(AddPostTemplate {
        username: user.username,
        error_message: String::new(),
    })
}

/// POST /addPost — create a craft owned by the current user
pub async fn add_post(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Multipart,
) -> AppResult<Response> {
    let form = uploads::read_craft_form(multipart, state.config.uploads_path()).await?;

    if form.content.title.trim().is_empty() || form.content.category.trim().is_empty() {
        return Ok(Html(AddPostTemplate {
            username: user.username,
            error_message: "Enter a title and a category".to_string(),
        })
        .into_response());
    }

    crafts::create_craft(&state.db, &form.content, &user.id)?;
    Ok(Redirect::to("/favorites").into_response())
}

/// GET /savePost/{id} — favorite a craft
pub async fn save_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: CurrentUser,
) -> AppResult<Response> {
    favorites::add_favorite(&state.db, &user.id, &id)?;
    Ok(Redirect::to(&format!("/details/{id}")).into_response())
}

/// GET /unsavePost/{id} — unfavorite a craft
pub async fn unsave_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: CurrentUser,
) -> AppResult<Response> {
    favorites::remove_favorite(&state.db, &user.id, &id)?;
    Ok(Redirect::to("/favorites").into_response())
}

/// GET /deletePost/{id} — delete an owned craft and its favorites rows
pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: CurrentUser,
) -> AppResult<Response> {
    crafts::delete_craft(&state.db, &id, &user.id)?;
    Ok(Redirect::to("/favorites").into_response())
}

/// GET /editPost/{id} — render the edit form for an owned craft
pub async fn edit_post_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: CurrentUser,
) -> AppResult<Response> {
    let craft = crafts::find_craft(&state.db, &id)?.ok_or(AppError::NotFound)?;
    if craft.created_by != user.id {
        return Err(AppError::Unauthenticated);
    }

    Ok(Html(EditPostTemplate {
        craft: detail_view(craft, 0),
    })
    .into_response())
}

/// POST /editPost — apply edits; a submission without a new image keeps
/// the stored one
pub async fn edit_post(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Multipart,
) -> AppResult<Response> {
    let form = uploads::read_craft_form(multipart, state.config.uploads_path()).await?;

    if form.id.is_empty() {
        return Err(AppError::Validation("Missing craft id".into()));
    }
    if form.content.title.trim().is_empty() || form.content.category.trim().is_empty() {
        return Err(AppError::Validation("Enter a title and a category".into()));
    }

    crafts::update_craft(&state.db, &form.id, &user.id, &form.content)?;
    Ok(Redirect::to("/favorites").into_response())
}

/// Site router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/results/{category}", get(results))
        .route("/details/{id}", get(details))
        .route("/craft-search", get(search))
        .route("/favorites", get(favorites_page))
        .route("/addPost", get(add_post_page).post(add_post))
        .route("/savePost/{id}", get(save_post))
        .route("/unsavePost/{id}", get(unsave_post))
        .route("/deletePost/{id}", get(delete_post))
        .route("/editPost/{id}", get(edit_post_page))
        .route("/editPost", post(edit_post))
}
