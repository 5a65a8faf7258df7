use anyhow::Context;
use bytes::Bytes;
use uuid::Uuid;

use crate::state::AppState;

/// Store one image under an owner-scoped key and return its durable URL.
pub async fn store_image(
    st: &AppState,
    owner_id: Uuid,
    body: Bytes,
    content_type: &str,
) -> anyhow::Result<String> {
    let id = Uuid::new_v4();
    let ext = ext_from_mime(content_type).unwrap_or("bin");
    let key = format!("locations/{}/{}.{}", owner_id, id, ext);
    st.storage
        .put_object(&key, body, content_type)
        .await
        .with_context(|| format!("put_object {}", key))?;
    Ok(st.storage.object_url(&key))
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;

    #[test]
    fn test_ext_from_mime() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("image/heic"), Some("heic"));
        assert_eq!(ext_from_mime("application/octet-stream"), None);
        assert_eq!(ext_from_mime("whatever/else"), None);
    }

    #[tokio::test]
    async fn store_image_builds_owner_scoped_url() {
        let state = AppState::fake();
        let owner = Uuid::new_v4();

        let url = store_image(&state, owner, Bytes::from_static(b"image-bytes"), "image/png")
            .await
            .unwrap();

        assert!(url.starts_with("https://fake.local/locations/"));
        assert!(url.contains(&owner.to_string()));
        assert!(url.ends_with(".png"));
    }

    #[tokio::test]
    async fn store_image_defaults_unknown_mime_to_bin() {
        let state = AppState::fake();

        let url = store_image(
            &state,
            Uuid::new_v4(),
            Bytes::from_static(b"bytes"),
            "application/octet-stream",
        )
        .await
        .unwrap();

        assert!(url.ends_with(".bin"));
    }
}
