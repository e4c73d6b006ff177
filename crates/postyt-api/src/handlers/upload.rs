use axum::{
    extract::{multipart::Field, Multipart, State},
    Json,
};
use postyt_core::{AppError, OverallUploadReport, TokenUpdate, UploadSelection, VideoMetadata};
use postyt_services::{parse_selection, OrchestratorError, TempVideoFile};
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::constants::{
    DESCRIPTION_FIELD, SELECTED_ACCOUNTS_FIELD, TAGS_FIELD, TITLE_FIELD, VIDEO_FIELD,
};
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::{AppState, UploadConfig};

#[derive(Default)]
struct UploadForm {
    video: Option<TempVideoFile>,
    title: Option<String>,
    description: Option<String>,
    tags: Option<String>,
    selected_accounts: Option<String>,
}

fn video_extension(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_else(|| "mp4".to_string())
}

/// Stream the video field to a uniquely named file under the upload directory.
/// The returned guard owns the file; any error before that point removes what was written.
async fn save_video(config: &UploadConfig, mut field: Field<'_>) -> Result<TempVideoFile, HttpAppError> {
    let file_name = format!("{}.{}", Uuid::new_v4(), video_extension(field.file_name()));
    let guard = TempVideoFile::new(config.upload_dir.join(file_name));

    let mut file = tokio::fs::File::create(guard.path())
        .await
        .map_err(AppError::from)?;

    let mut written: usize = 0;
    while let Some(chunk) = field.chunk().await? {
        written += chunk.len();
        if written > config.max_video_size_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "Video exceeds the maximum size of {} MB",
                config.max_video_size_bytes / 1024 / 1024
            ))
            .into());
        }
        file.write_all(&chunk).await.map_err(AppError::from)?;
    }
    file.flush().await.map_err(AppError::from)?;

    if written == 0 {
        return Err(AppError::BadRequest("Uploaded video is empty".to_string()).into());
    }

    tracing::debug!(path = %guard.path().display(), bytes = written, "Video received");
    Ok(guard)
}

async fn read_form(config: &UploadConfig, multipart: &mut Multipart) -> Result<UploadForm, HttpAppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            VIDEO_FIELD => {
                if form.video.is_some() {
                    return Err(AppError::BadRequest("Only one video file is accepted".to_string()).into());
                }
                form.video = Some(save_video(config, field).await?);
            }
            TITLE_FIELD => form.title = Some(field.text().await?),
            DESCRIPTION_FIELD => form.description = Some(field.text().await?),
            TAGS_FIELD => form.tags = Some(field.text().await?),
            SELECTED_ACCOUNTS_FIELD => form.selected_accounts = Some(field.text().await?),
            other => tracing::debug!(field = %other, "Ignoring unknown multipart field"),
        }
    }

    Ok(form)
}

/// Persist refreshed tokens; a failed write is logged, the upload result stands
async fn persist_token_updates(state: &AppState, user_id: &str, updates: &[TokenUpdate]) {
    for update in updates {
        if let Err(e) = state.accounts.apply_token_update(user_id, update).await {
            tracing::error!(
                error = %e,
                user_id = %user_id,
                platform = %update.platform,
                account_id = %update.account_id,
                "Failed to persist refreshed token"
            );
        }
    }
}

/// Upload and persist refreshed tokens on a detached task.
///
/// Dropping the returned future (client disconnect) leaves in-flight provider calls, token
/// persistence and video cleanup running to completion.
async fn run_detached_upload(
    state: Arc<AppState>,
    user_id: String,
    video: TempVideoFile,
    metadata: VideoMetadata,
    selection: UploadSelection,
) -> Result<OverallUploadReport, HttpAppError> {
    let task = tokio::spawn(async move {
        let outcome = state
            .orchestrator
            .run_upload_and_cleanup(
                &user_id,
                video,
                &metadata,
                &selection,
                state.accounts.as_ref(),
            )
            .await?;
        persist_token_updates(&state, &user_id, &outcome.token_updates).await;
        Ok::<_, OrchestratorError>(outcome.report)
    });

    let report = task.await.map_err(|e| {
        tracing::error!(error = %e, "Upload task did not complete");
        AppError::Internal(format!("Upload task failed: {}", e))
    })??;
    Ok(report)
}

#[utoipa::path(
    post,
    path = "/api/upload",
    tag = "upload",
    request_body(
        content = inline(Object),
        content_type = "multipart/form-data",
        description = "`video` file, optional `title`, `description`, comma-separated `tags`, and `selectedAccounts` as a JSON object {platform: [accountId, ...]}"
    ),
    responses(
        (status = 200, description = "Per-platform, per-account results; returned even when uploads failed", body = OverallUploadReport),
        (status = 400, description = "Missing video or malformed selectedAccounts", body = ErrorResponse),
        (status = 401, description = "Missing bearer token", body = ErrorResponse),
        (status = 403, description = "Invalid bearer token", body = ErrorResponse),
        (status = 413, description = "Video too large", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<OverallUploadReport>, HttpAppError> {
    let form = read_form(&state.upload, &mut multipart).await?;

    let video = form
        .video
        .ok_or_else(|| AppError::BadRequest("No video file uploaded".to_string()))?;
    let raw_selection = form
        .selected_accounts
        .ok_or_else(|| AppError::BadRequest("selectedAccounts is required".to_string()))?;
    let selection = parse_selection(&raw_selection)?;
    let metadata = VideoMetadata::from_form(form.title, form.description, form.tags.as_deref());

    tracing::info!(
        user_id = %user.user_id,
        accounts = selection.total_accounts(),
        title = %metadata.title,
        "Upload requested"
    );

    let report = run_detached_upload(state, user.user_id, video, metadata, selection).await?;

    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::RedirectConfig;
    use postyt_core::PlatformId;
    use postyt_platforms::AdapterRegistry;
    use postyt_services::test_helpers::{expired_credential, InMemoryAccountStore, MockAdapter};
    use postyt_services::UploadOrchestrator;
    use std::time::Duration;

    fn state_with(store: InMemoryAccountStore, adapter: Arc<MockAdapter>, upload_dir: &Path) -> Arc<AppState> {
        let registry = Arc::new(AdapterRegistry::new().with_adapter(adapter));
        Arc::new(AppState {
            accounts: Arc::new(store),
            orchestrator: UploadOrchestrator::new(registry.clone(), 2),
            registry,
            upload: UploadConfig {
                upload_dir: upload_dir.to_path_buf(),
                max_video_size_bytes: 1024 * 1024,
            },
            redirects: RedirectConfig {
                success_url: "https://app.test/ok".to_string(),
                error_url: "https://app.test/error".to_string(),
            },
        })
    }

    #[tokio::test]
    async fn test_upload_finishes_after_caller_goes_away() {
        let upload_dir = tempfile::tempdir().unwrap();
        let video_path = upload_dir.path().join("video.mp4");
        std::fs::write(&video_path, b"video bytes").unwrap();

        let youtube = Arc::new(
            MockAdapter::new(PlatformId::Youtube)
                .delaying_upload_for("A1", Duration::from_millis(200)),
        );
        let store = InMemoryAccountStore::new().with_account(
            "user-1",
            PlatformId::Youtube,
            expired_credential("A1"),
        );
        let state = state_with(store.clone(), youtube.clone(), upload_dir.path());

        // The caller stops waiting long before the provider upload finishes
        let abandoned = tokio::time::timeout(
            Duration::from_millis(20),
            run_detached_upload(
                state,
                "user-1".to_string(),
                TempVideoFile::new(video_path.clone()),
                VideoMetadata::from_form(Some("Clip".into()), None, None),
                UploadSelection::new().with("youtube", &["A1"]),
            ),
        )
        .await;
        assert!(abandoned.is_err());

        let mut persisted = false;
        for _ in 0..100 {
            if !store.applied_updates().is_empty() && !video_path.exists() {
                persisted = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        assert!(persisted, "refreshed token was not persisted or video not removed");
        assert_eq!(youtube.uploads(), vec![("A1".to_string(), "fresh-A1".to_string())]);
        assert_eq!(
            store
                .get("user-1", PlatformId::Youtube, "A1")
                .unwrap()
                .access_token,
            "fresh-A1"
        );
    }

    #[test]
    fn test_video_extension() {
        assert_eq!(video_extension(Some("clip.MOV")), "mov");
        assert_eq!(video_extension(Some("holiday.final.mp4")), "mp4");
        assert_eq!(video_extension(Some("noext")), "mp4");
        assert_eq!(video_extension(Some("weird.../../x")), "mp4");
        assert_eq!(video_extension(None), "mp4");
    }
}
