use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    error::ApiError,
    locations::{
        dto::{
            CreateLocationRequest, DeleteResponse, LocationPage, PageQuery, SearchQuery,
            UpdateLocationRequest,
        },
        repo::{self, Location, LocationWithOwner, TagCount},
    },
    state::AppState,
};

const POPULAR_TAGS_LIMIT: i64 = 10;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/locations", get(list_locations))
        .route("/my-locations", get(my_locations))
        .route("/search", get(search))
        .route("/tags", get(popular_tags))
        .route("/tags/all", get(all_tags))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/locations", post(create_location))
        .route(
            "/locations/:id",
            patch(update_location).delete(delete_location),
        )
}

#[instrument(skip(state))]
pub async fn list_locations(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Query(p): Query<PageQuery>,
) -> Result<Json<LocationPage>, ApiError> {
    let page = p.page.max(1);
    let (items, total_pages) = repo::page(&state.db, page).await?;
    Ok(Json(LocationPage {
        items,
        page,
        total_pages,
    }))
}

#[instrument(skip(state, payload))]
pub async fn create_location(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateLocationRequest>,
) -> Result<(StatusCode, Json<Location>), ApiError> {
    let (lat, lng) = match (payload.lat, payload.lng) {
        (Some(lat), Some(lng)) if !payload.title.trim().is_empty() => (lat, lng),
        _ => {
            warn!("create location missing fields");
            return Err(ApiError::validation("title, lat and lng are required"));
        }
    };

    let location = repo::create(
        &state.db,
        user_id,
        &payload.title,
        payload.description.as_deref(),
        payload.image.as_deref(),
        &payload.tags,
        lat,
        lng,
    )
    .await?;

    info!(location_id = %location.id, owner_id = %user_id, "location created");
    Ok((StatusCode::CREATED, Json(location)))
}

#[instrument(skip(state, payload))]
pub async fn update_location(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLocationRequest>,
) -> Result<Json<Location>, ApiError> {
    if let Some(title) = &payload.title {
        if title.trim().is_empty() {
            return Err(ApiError::validation("title cannot be blank"));
        }
    }

    match repo::update_partial(&state.db, id, user_id, &payload).await? {
        Some(location) => {
            info!(location_id = %id, "location updated");
            Ok(Json(location))
        }
        None => {
            warn!(location_id = %id, user_id = %user_id, "update of missing or foreign location");
            Err(ApiError::NotFound)
        }
    }
}

#[instrument(skip(state))]
pub async fn delete_location(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, ApiError> {
    if !repo::delete_by_owner(&state.db, id, user_id).await? {
        warn!(location_id = %id, user_id = %user_id, "delete of missing or foreign location");
        return Err(ApiError::NotFound);
    }
    info!(location_id = %id, "location deleted");
    Ok(Json(DeleteResponse {
        message: "location deleted".into(),
        id,
    }))
}

#[instrument(skip(state))]
pub async fn my_locations(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<LocationWithOwner>>, ApiError> {
    let items = repo::list_owned_by(&state.db, user_id).await?;
    Ok(Json(items))
}

/// GET /search?query=needle or /search?tags=a,b. Text search wins when both
/// are present.
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Query(q): Query<SearchQuery>,
) -> Result<Json<Vec<LocationWithOwner>>, ApiError> {
    if let Some(query) = q.query.as_deref() {
        let query = query.trim();
        if !query.is_empty() {
            let items = repo::search_text(&state.db, query).await?;
            return Ok(Json(items));
        }
    }

    if let Some(raw) = q.tags.as_deref() {
        let tags = parse_tags(raw);
        if !tags.is_empty() {
            let items = repo::search_tags(&state.db, &tags).await?;
            return Ok(Json(items));
        }
    }

    warn!("search without query or tags");
    Err(ApiError::validation("query or tags parameter is required"))
}

#[instrument(skip(state))]
pub async fn popular_tags(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
) -> Result<Json<Vec<TagCount>>, ApiError> {
    let tags = repo::popular_tags(&state.db, POPULAR_TAGS_LIMIT).await?;
    Ok(Json(tags))
}

#[instrument(skip(state))]
pub async fn all_tags(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
) -> Result<Json<Vec<TagCount>>, ApiError> {
    let tags = repo::tag_counts(&state.db).await?;
    Ok(Json(tags))
}

/// Split a comma-separated tag list, dropping blanks.
fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tags_splits_on_commas() {
        assert_eq!(parse_tags("park,lake"), vec!["park", "lake"]);
        assert_eq!(parse_tags(" park , lake "), vec!["park", "lake"]);
    }

    #[test]
    fn parse_tags_drops_blanks() {
        assert_eq!(parse_tags(""), Vec::<String>::new());
        assert_eq!(parse_tags(",,,"), Vec::<String>::new());
        assert_eq!(parse_tags("park,,lake,"), vec!["park", "lake"]);
    }

    #[test]
    fn parse_tags_keeps_case_and_duplicates() {
        assert_eq!(parse_tags("Park,park"), vec!["Park", "park"]);
    }
}
