use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::locations::dto::UpdateLocationRequest;

pub const PAGE_SIZE: i64 = 12;

/// Location record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Location {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub tags: Vec<String>,
    pub lat: f64,
    pub lng: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Location joined with its owner's username, as served in listings.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LocationWithOwner {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub username: String,
    pub title: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub tags: Vec<String>,
    pub lat: f64,
    pub lng: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Tag with the number of locations carrying it.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TagCount {
    pub name: String,
    pub count: i64,
}

pub async fn create(
    db: &PgPool,
    owner_id: Uuid,
    title: &str,
    description: Option<&str>,
    image: Option<&str>,
    tags: &[String],
    lat: f64,
    lng: f64,
) -> anyhow::Result<Location> {
    let location = sqlx::query_as::<_, Location>(
        r#"
        INSERT INTO locations (owner_id, title, description, image, tags, lat, lng)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, owner_id, title, description, image, tags, lat, lng, created_at, updated_at
        "#,
    )
    .bind(owner_id)
    .bind(title)
    .bind(description)
    .bind(image)
    .bind(tags)
    .bind(lat)
    .bind(lng)
    .fetch_one(db)
    .await?;
    Ok(location)
}

/// Apply a partial update to an owned location. `None` means the row does not
/// exist or belongs to someone else; callers treat both the same.
pub async fn update_partial(
    db: &PgPool,
    id: Uuid,
    owner_id: Uuid,
    patch: &UpdateLocationRequest,
) -> anyhow::Result<Option<Location>> {
    let location = sqlx::query_as::<_, Location>(
        r#"
        UPDATE locations
        SET title = COALESCE($3, title),
            description = COALESCE($4, description),
            image = COALESCE($5, image),
            tags = COALESCE($6, tags),
            lat = COALESCE($7, lat),
            lng = COALESCE($8, lng),
            updated_at = now()
        WHERE id = $1 AND owner_id = $2
        RETURNING id, owner_id, title, description, image, tags, lat, lng, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(owner_id)
    .bind(patch.title.as_deref())
    .bind(patch.description.as_deref())
    .bind(patch.image.as_deref())
    .bind(patch.tags.as_deref())
    .bind(patch.lat)
    .bind(patch.lng)
    .fetch_optional(db)
    .await?;
    Ok(location)
}

/// Delete an owned location. `false` covers missing and foreign rows alike.
pub async fn delete_by_owner(db: &PgPool, id: Uuid, owner_id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM locations
        WHERE id = $1 AND owner_id = $2
        "#,
    )
    .bind(id)
    .bind(owner_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// One page of the global listing in creation order, plus the page count for
/// the fixed page size.
pub async fn page(db: &PgPool, page: i64) -> anyhow::Result<(Vec<LocationWithOwner>, i64)> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM locations")
        .fetch_one(db)
        .await?;

    let items = sqlx::query_as::<_, LocationWithOwner>(
        r#"
        SELECT l.id, l.owner_id, u.username, l.title, l.description, l.image,
               l.tags, l.lat, l.lng, l.created_at, l.updated_at
        FROM locations l
        JOIN users u ON u.id = l.owner_id
        ORDER BY l.created_at ASC, l.id ASC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(PAGE_SIZE)
    .bind((page - 1) * PAGE_SIZE)
    .fetch_all(db)
    .await?;

    Ok((items, total_pages(total)))
}

pub async fn list_owned_by(db: &PgPool, owner_id: Uuid) -> anyhow::Result<Vec<LocationWithOwner>> {
    let items = sqlx::query_as::<_, LocationWithOwner>(
        r#"
        SELECT l.id, l.owner_id, u.username, l.title, l.description, l.image,
               l.tags, l.lat, l.lng, l.created_at, l.updated_at
        FROM locations l
        JOIN users u ON u.id = l.owner_id
        WHERE l.owner_id = $1
        ORDER BY l.created_at ASC, l.id ASC
        "#,
    )
    .bind(owner_id)
    .fetch_all(db)
    .await?;
    Ok(items)
}

/// Case-insensitive substring match over title, description and tags.
pub async fn search_text(db: &PgPool, needle: &str) -> anyhow::Result<Vec<LocationWithOwner>> {
    let pattern = like_pattern(needle);
    let items = sqlx::query_as::<_, LocationWithOwner>(
        r#"
        SELECT l.id, l.owner_id, u.username, l.title, l.description, l.image,
               l.tags, l.lat, l.lng, l.created_at, l.updated_at
        FROM locations l
        JOIN users u ON u.id = l.owner_id
        WHERE l.title ILIKE $1
           OR l.description ILIKE $1
           OR EXISTS (SELECT 1 FROM unnest(l.tags) AS t WHERE t ILIKE $1)
        ORDER BY l.created_at ASC, l.id ASC
        "#,
    )
    .bind(pattern)
    .fetch_all(db)
    .await?;
    Ok(items)
}

/// Locations whose tag array contains every requested tag.
pub async fn search_tags(db: &PgPool, tags: &[String]) -> anyhow::Result<Vec<LocationWithOwner>> {
    let items = sqlx::query_as::<_, LocationWithOwner>(
        r#"
        SELECT l.id, l.owner_id, u.username, l.title, l.description, l.image,
               l.tags, l.lat, l.lng, l.created_at, l.updated_at
        FROM locations l
        JOIN users u ON u.id = l.owner_id
        WHERE l.tags @> $1
        ORDER BY l.created_at ASC, l.id ASC
        "#,
    )
    .bind(tags)
    .fetch_all(db)
    .await?;
    Ok(items)
}

/// The `limit` most used tags, most frequent first, ties by name.
pub async fn popular_tags(db: &PgPool, limit: i64) -> anyhow::Result<Vec<TagCount>> {
    let tags = sqlx::query_as::<_, TagCount>(
        r#"
        SELECT t AS name, COUNT(*) AS count
        FROM locations, unnest(tags) AS t
        GROUP BY t
        ORDER BY count DESC, name ASC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(tags)
}

/// Every tag in use with its count, same order as [`popular_tags`].
pub async fn tag_counts(db: &PgPool) -> anyhow::Result<Vec<TagCount>> {
    let tags = sqlx::query_as::<_, TagCount>(
        r#"
        SELECT t AS name, COUNT(*) AS count
        FROM locations, unnest(tags) AS t
        GROUP BY t
        ORDER BY count DESC, name ASC
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(tags)
}

/// Pages needed for `total` rows at `PAGE_SIZE` per page.
pub fn total_pages(total: i64) -> i64 {
    (total + PAGE_SIZE - 1) / PAGE_SIZE
}

/// Wrap a needle in `%` wildcards, escaping LIKE metacharacters so the
/// needle itself always matches literally.
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0), 0);
        assert_eq!(total_pages(1), 1);
        assert_eq!(total_pages(12), 1);
        assert_eq!(total_pages(13), 2);
        assert_eq!(total_pages(20), 2);
        assert_eq!(total_pages(24), 2);
        assert_eq!(total_pages(25), 3);
    }

    #[test]
    fn like_pattern_wraps_in_wildcards() {
        assert_eq!(like_pattern("park"), "%park%");
        assert_eq!(like_pattern(""), "%%");
    }

    #[test]
    fn like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("50%"), "%50\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern(r"back\slash"), r"%back\\slash%");
    }
}
