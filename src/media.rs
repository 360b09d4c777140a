use std::path::{Component, Path, PathBuf};

use actix_web::{web, HttpResponse};
use mime_guess::from_path;
use uuid::Uuid;

use crate::config::POST_IMAGE_DIR;
use crate::core::errors::{AppError, AppResult};
use crate::forms::ValidImage;
use crate::AppState;

/// Store an uploaded post image under the media directory.
///
/// Returns the path relative to `media_dir`, which is what posts keep.
pub async fn save_post_image(media_dir: &Path, image: &ValidImage) -> std::io::Result<String> {
    let relative = format!("{}/{}.{}", POST_IMAGE_DIR, Uuid::new_v4(), image.extension);
    let full = media_dir.join(&relative);
    if let Some(parent) = full.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&full, &image.data).await?;
    tracing::debug!(path = %full.display(), bytes = image.data.len(), "stored post image");
    Ok(relative)
}

/// Delete a stored post image. A file that is already gone is not an error;
/// other failures are logged and otherwise ignored.
pub async fn remove_post_image(media_dir: &Path, relative: &str) {
    let Some(full) = resolve(media_dir, relative) else {
        tracing::warn!(path = relative, "refusing to remove image outside the media dir");
        return;
    };
    match tokio::fs::remove_file(&full).await {
        Ok(()) => tracing::debug!(path = %full.display(), "removed post image"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %full.display(), error = %e, "failed to remove post image"),
    }
}

/// Joins `requested` onto `root`, refusing anything that could leave it.
fn resolve(root: &Path, requested: &str) -> Option<PathBuf> {
    let relative = Path::new(requested);
    if requested.is_empty()
        || relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }
    Some(root.join(relative))
}

pub async fn serve_media(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let full = resolve(&state.settings.media_dir, &path).ok_or(AppError::NotFound)?;

    let data = match tokio::fs::read(&full).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(AppError::NotFound),
        Err(e) => return Err(e.into()),
    };

    let mime = from_path(&full).first_or_octet_stream();
    Ok(HttpResponse::Ok().content_type(mime.as_ref()).body(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::web::Bytes;

    #[test]
    fn resolve_rejects_traversal() {
        let root = Path::new("/srv/media");
        assert_eq!(
            resolve(root, "posts/a.gif"),
            Some(PathBuf::from("/srv/media/posts/a.gif"))
        );
        assert_eq!(resolve(root, "../etc/passwd"), None);
        assert_eq!(resolve(root, "posts/../../x"), None);
        assert_eq!(resolve(root, "/etc/passwd"), None);
        assert_eq!(resolve(root, ""), None);
    }

    #[tokio::test]
    async fn saved_images_land_in_the_posts_directory() {
        let dir = tempfile::tempdir().unwrap();
        let image = ValidImage {
            data: Bytes::from_static(b"GIF89a"),
            extension: "gif",
        };
        let relative = save_post_image(dir.path(), &image).await.unwrap();
        assert!(relative.starts_with("posts/"));
        assert!(relative.ends_with(".gif"));
        assert_eq!(std::fs::read(dir.path().join(&relative)).unwrap(), b"GIF89a");
    }

    #[tokio::test]
    async fn removing_images_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let image = ValidImage {
            data: Bytes::from_static(b"GIF89a"),
            extension: "gif",
        };
        let relative = save_post_image(dir.path(), &image).await.unwrap();

        remove_post_image(dir.path(), &relative).await;
        assert!(!dir.path().join(&relative).exists());

        // Gone already, and outside the root: both are quiet no-ops.
        remove_post_image(dir.path(), &relative).await;
        remove_post_image(dir.path(), "../outside.gif").await;
    }
}
