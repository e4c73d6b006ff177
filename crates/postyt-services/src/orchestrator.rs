//! Multi-account upload orchestration
//!
//! One call publishes a single video to every selected account. Each account is an
//! independent unit of work: its failure (missing account, refresh failure, upload error) is
//! recorded in its own result and never stops the others. Accounts are processed concurrently
//! up to a bound, and results are reassembled in selection order regardless of completion
//! order.

use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;

use postyt_core::constants::{
    ACCOUNT_NOT_FOUND_MESSAGE, NOT_IMPLEMENTED_MESSAGE, UNSUPPORTED_PLATFORM_MESSAGE,
};
use postyt_core::{
    AccountUploadResult, AppError, OverallUploadReport, PlatformId, PlatformUploadReport,
    SelectionError, TokenUpdate, UploadSelection, VideoMetadata,
};
use postyt_db::CredentialStore;
use postyt_platforms::{AdapterLookup, AdapterRegistry, PlatformAdapter, UploadRequest};

use crate::cleanup::TempVideoFile;
use crate::token::{ensure_valid, ValidCredential};

/// Request-level failures; per-account and per-platform failures never surface here
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("video file not found: {}", .0.display())]
    VideoNotFound(PathBuf),

    #[error("invalid selectedAccounts: {0}")]
    InvalidSelection(#[from] SelectionError),

    #[error("failed to read video file: {0}")]
    Io(#[from] std::io::Error),
}

impl From<OrchestratorError> for AppError {
    fn from(err: OrchestratorError) -> Self {
        match err {
            OrchestratorError::VideoNotFound(_) | OrchestratorError::InvalidSelection(_) => {
                AppError::InvalidInput(err.to_string())
            }
            OrchestratorError::Io(e) => AppError::InternalWithSource {
                message: "failed to read video file".to_string(),
                source: e.into(),
            },
        }
    }
}

/// Parse the raw `selectedAccounts` JSON object
pub fn parse_selection(raw: &str) -> Result<UploadSelection, OrchestratorError> {
    Ok(UploadSelection::from_json(raw)?)
}

/// Aggregate report plus the refreshed tokens the caller must persist
#[derive(Debug)]
pub struct UploadOutcome {
    pub report: OverallUploadReport,
    pub token_updates: Vec<TokenUpdate>,
}

/// Lookup-and-refresh result for one account, shared by every job that names it
#[derive(Clone)]
enum ResolvedCredential {
    Ready(ValidCredential),
    Failed {
        account_name: Option<String>,
        error: String,
    },
}

type SharedCredential = Arc<OnceCell<ResolvedCredential>>;

struct AccountJob {
    slot: usize,
    platform: PlatformId,
    adapter: Arc<dyn PlatformAdapter>,
    account_id: String,
    credential: SharedCredential,
}

struct AccountOutcome {
    slot: usize,
    result: AccountUploadResult,
    token_update: Option<TokenUpdate>,
}

#[derive(Clone)]
pub struct UploadOrchestrator {
    registry: Arc<AdapterRegistry>,
    concurrency: usize,
}

impl UploadOrchestrator {
    pub fn new(registry: Arc<AdapterRegistry>, concurrency: usize) -> Self {
        Self {
            registry,
            concurrency: concurrency.max(1),
        }
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    /// Upload the video at `video_path` to every account in `selection`
    ///
    /// Fails only when the video file is missing; everything else ends up in the report.
    #[tracing::instrument(skip(self, metadata, selection, credentials), fields(video = %video_path.display()))]
    pub async fn run_upload<C>(
        &self,
        user_id: &str,
        video_path: &Path,
        metadata: &VideoMetadata,
        selection: &UploadSelection,
        credentials: &C,
    ) -> Result<UploadOutcome, OrchestratorError>
    where
        C: CredentialStore + ?Sized,
    {
        match tokio::fs::metadata(video_path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(OrchestratorError::VideoNotFound(video_path.to_path_buf())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(OrchestratorError::VideoNotFound(video_path.to_path_buf()))
            }
            Err(e) => return Err(e.into()),
        }

        // One slot per selected platform, in selection order
        let mut platforms: Vec<(String, Option<PlatformUploadReport>)> = Vec::new();
        let mut jobs = Vec::new();
        // An account listed more than once is looked up and refreshed only once
        let mut credentials_by_account: HashMap<(PlatformId, String), SharedCredential> =
            HashMap::new();

        for (key, account_ids) in selection.non_empty() {
            let slot = platforms.len();
            match self.registry.resolve(key) {
                AdapterLookup::Unsupported => {
                    tracing::warn!(platform = %key, "Unsupported platform in selection");
                    platforms.push((
                        key.to_string(),
                        Some(PlatformUploadReport::platform_error(UNSUPPORTED_PLATFORM_MESSAGE)),
                    ));
                }
                AdapterLookup::Unimplemented(platform) => {
                    tracing::info!(platform = %platform, "Platform not yet implemented");
                    platforms.push((
                        key.to_string(),
                        Some(PlatformUploadReport::platform_error(NOT_IMPLEMENTED_MESSAGE)),
                    ));
                }
                AdapterLookup::Ready(adapter) => {
                    platforms.push((key.to_string(), None));
                    let platform = adapter.platform();
                    for account_id in account_ids {
                        let credential = credentials_by_account
                            .entry((platform, account_id.clone()))
                            .or_default()
                            .clone();
                        jobs.push(AccountJob {
                            slot,
                            platform,
                            adapter: adapter.clone(),
                            account_id: account_id.clone(),
                            credential,
                        });
                    }
                }
            }
        }

        tracing::info!(
            user_id = %user_id,
            platforms = platforms.len(),
            accounts = jobs.len(),
            "Starting upload"
        );

        // `buffered` yields in submission order, so results land in selection order
        let outcomes: Vec<AccountOutcome> = stream::iter(jobs)
            .map(|job| self.upload_for_account(user_id, job, video_path, metadata, credentials))
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut account_results: Vec<Vec<AccountUploadResult>> = vec![Vec::new(); platforms.len()];
        let mut token_updates: Vec<TokenUpdate> = Vec::new();
        for outcome in outcomes {
            account_results[outcome.slot].push(outcome.result);
            if let Some(update) = outcome.token_update {
                // an account listed twice keeps only its latest token
                token_updates.retain(|u| {
                    !(u.platform == update.platform && u.account_id == update.account_id)
                });
                token_updates.push(update);
            }
        }

        let platforms = platforms
            .into_iter()
            .zip(account_results)
            .map(|((key, report), results)| {
                (key, report.unwrap_or_else(|| PlatformUploadReport::from_results(results)))
            })
            .collect();

        let report = OverallUploadReport::from_platforms(platforms);

        tracing::info!(
            user_id = %user_id,
            success = report.overall.success,
            refreshed_tokens = token_updates.len(),
            "Upload finished"
        );

        Ok(UploadOutcome {
            report,
            token_updates,
        })
    }

    /// Run the upload, then delete the video whatever the outcome
    pub async fn run_upload_and_cleanup<C>(
        &self,
        user_id: &str,
        video: TempVideoFile,
        metadata: &VideoMetadata,
        selection: &UploadSelection,
        credentials: &C,
    ) -> Result<UploadOutcome, OrchestratorError>
    where
        C: CredentialStore + ?Sized,
    {
        let outcome = self
            .run_upload(user_id, video.path(), metadata, selection, credentials)
            .await;

        if let Err(e) = video.remove().await {
            tracing::error!(error = %e, "Temporary video could not be deleted");
        }

        outcome
    }

    async fn resolve_credential<C>(
        &self,
        user_id: &str,
        job: &AccountJob,
        credentials: &C,
    ) -> ResolvedCredential
    where
        C: CredentialStore + ?Sized,
    {
        let not_found = || ResolvedCredential::Failed {
            account_name: None,
            error: ACCOUNT_NOT_FOUND_MESSAGE.to_string(),
        };

        let credential = match credentials
            .find_account(user_id, job.platform, &job.account_id)
            .await
        {
            Ok(Some(credential)) => credential,
            Ok(None) => {
                tracing::warn!(platform = %job.platform, account_id = %job.account_id, "Account not linked");
                return not_found();
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    platform = %job.platform,
                    account_id = %job.account_id,
                    "Account lookup failed"
                );
                return not_found();
            }
        };

        let account_name = credential.account_name.clone();
        match ensure_valid(credential, job.adapter.as_ref()).await {
            Ok(valid) => ResolvedCredential::Ready(valid),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    platform = %job.platform,
                    account_id = %job.account_id,
                    "Token refresh failed"
                );
                ResolvedCredential::Failed {
                    account_name: Some(account_name),
                    error: e.to_string(),
                }
            }
        }
    }

    async fn upload_for_account<C>(
        &self,
        user_id: &str,
        job: AccountJob,
        video_path: &Path,
        metadata: &VideoMetadata,
        credentials: &C,
    ) -> AccountOutcome
    where
        C: CredentialStore + ?Sized,
    {
        let resolved = job
            .credential
            .get_or_init(|| self.resolve_credential(user_id, &job, credentials))
            .await
            .clone();

        let valid = match resolved {
            ResolvedCredential::Ready(valid) => valid,
            ResolvedCredential::Failed {
                account_name,
                error,
            } => {
                return AccountOutcome {
                    slot: job.slot,
                    result: AccountUploadResult::failed(job.account_id.clone(), account_name, error),
                    token_update: None,
                }
            }
        };
        let account_name = valid.credential.account_name.clone();
        let token_update = valid.token_update(job.platform);

        let request = UploadRequest {
            video_path: video_path.to_path_buf(),
            account_id: job.account_id.clone(),
            account_name: account_name.clone(),
            metadata: metadata.clone(),
            access_token: valid.credential.access_token,
        };

        let result = match job.adapter.upload_video(request).await {
            Ok(uploaded) => {
                tracing::info!(
                    platform = %job.platform,
                    account_id = %job.account_id,
                    video_id = %uploaded.video_id,
                    "Video uploaded"
                );
                AccountUploadResult::succeeded(
                    job.account_id.clone(),
                    account_name,
                    uploaded.video_id,
                    uploaded.video_url,
                )
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    platform = %job.platform,
                    account_id = %job.account_id,
                    retryable = e.is_retryable(),
                    "Upload failed"
                );
                AccountUploadResult::failed(job.account_id.clone(), Some(account_name), e.to_string())
            }
        };

        AccountOutcome {
            slot: job.slot,
            result,
            token_update,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{
        expired_credential, valid_credential, video_file, InMemoryAccountStore, MockAdapter,
    };
    use std::time::Duration;

    const USER: &str = "user-1";

    fn orchestrator(adapters: Vec<Arc<MockAdapter>>) -> UploadOrchestrator {
        let mut registry = AdapterRegistry::new();
        for adapter in adapters {
            registry.register(adapter);
        }
        UploadOrchestrator::new(Arc::new(registry), 4)
    }

    fn metadata() -> VideoMetadata {
        VideoMetadata::from_form(Some("Launch".into()), Some("Our launch video".into()), Some("a, b"))
    }

    #[tokio::test]
    async fn test_all_accounts_succeed() {
        let youtube = Arc::new(MockAdapter::new(PlatformId::Youtube));
        let reddit = Arc::new(MockAdapter::new(PlatformId::Reddit));
        let store = InMemoryAccountStore::new()
            .with_account(USER, PlatformId::Youtube, valid_credential("A1"))
            .with_account(USER, PlatformId::Youtube, valid_credential("A2"))
            .with_account(USER, PlatformId::Reddit, valid_credential("R1"));
        let selection = UploadSelection::new()
            .with("youtube", &["A1", "A2"])
            .with("reddit", &["R1"]);
        let video = video_file();

        let outcome = orchestrator(vec![youtube, reddit])
            .run_upload(USER, video.path(), &metadata(), &selection, &store)
            .await
            .unwrap();

        assert!(outcome.report.overall.success);
        assert!(outcome.token_updates.is_empty());
        for key in ["youtube", "reddit"] {
            let platform = outcome.report.platform(key).unwrap();
            assert!(platform.error.is_none());
            for result in &platform.account_results {
                assert!(result.success);
                assert!(!result.video_id.as_deref().unwrap_or_default().is_empty());
                assert!(!result.video_url.as_deref().unwrap_or_default().is_empty());
                assert!(result.error.is_none());
            }
        }
        assert_eq!(
            outcome.report.platform("youtube").unwrap().account_results[1].account_name.as_deref(),
            Some("A2 name")
        );
    }

    #[tokio::test]
    async fn test_mixed_results_with_unimplemented_platform() {
        let youtube = Arc::new(MockAdapter::new(PlatformId::Youtube).failing_refresh_for("A2"));
        let store = InMemoryAccountStore::new()
            .with_account(USER, PlatformId::Youtube, valid_credential("A1"))
            .with_account(USER, PlatformId::Youtube, expired_credential("A2"));
        let selection = UploadSelection::new()
            .with("youtube", &["A1", "A2"])
            .with("tiktok", &["T1"]);
        let video = video_file();

        let outcome = orchestrator(vec![youtube.clone()])
            .run_upload(USER, video.path(), &metadata(), &selection, &store)
            .await
            .unwrap();

        let results = &outcome.report.platform("youtube").unwrap().account_results;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].account_id, "A1");
        assert!(results[0].success);
        assert_eq!(results[1].account_id, "A2");
        assert!(!results[1].success);
        assert!(results[1].error.as_deref().unwrap().starts_with("token refresh failed"));

        let tiktok = outcome.report.platform("tiktok").unwrap();
        assert_eq!(tiktok.error.as_deref(), Some("not yet implemented"));
        assert!(tiktok.account_results.is_empty());

        assert!(outcome.report.overall.success);
        assert!(outcome.token_updates.is_empty());
        // the failed refresh never reaches the upload call
        assert_eq!(youtube.uploads().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_account_fails_platform_and_overall() {
        let facebook = Arc::new(MockAdapter::new(PlatformId::Facebook));
        let store = InMemoryAccountStore::new();
        let selection = UploadSelection::new().with("facebook", &["F1"]);
        let video = video_file();

        let outcome = orchestrator(vec![facebook.clone()])
            .run_upload(USER, video.path(), &metadata(), &selection, &store)
            .await
            .unwrap();

        let results = &outcome.report.platform("facebook").unwrap().account_results;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].account_id, "F1");
        assert!(!results[0].success);
        assert_eq!(results[0].error.as_deref(), Some("account not found"));
        assert!(!outcome.report.overall.success);
        assert!(facebook.uploads().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_is_reported_per_account() {
        let youtube = Arc::new(MockAdapter::new(PlatformId::Youtube));
        let store = InMemoryAccountStore::new()
            .with_account(USER, PlatformId::Youtube, valid_credential("A1"))
            .with_account(USER, PlatformId::Youtube, valid_credential("A2"))
            .failing_lookup_for("A2");
        let selection = UploadSelection::new().with("youtube", &["A1", "A2"]);
        let video = video_file();

        let outcome = orchestrator(vec![youtube])
            .run_upload(USER, video.path(), &metadata(), &selection, &store)
            .await
            .unwrap();

        let results = &outcome.report.platform("youtube").unwrap().account_results;
        assert!(results[0].success);
        assert_eq!(results[1].error.as_deref(), Some("account not found"));
        assert!(outcome.report.overall.success);
    }

    #[tokio::test]
    async fn test_unsupported_platform_does_not_abort_others() {
        let reddit = Arc::new(MockAdapter::new(PlatformId::Reddit));
        let store =
            InMemoryAccountStore::new().with_account(USER, PlatformId::Reddit, valid_credential("R1"));
        let selection = UploadSelection::new()
            .with("myspace", &["M1"])
            .with("reddit", &["R1"]);
        let video = video_file();

        let outcome = orchestrator(vec![reddit])
            .run_upload(USER, video.path(), &metadata(), &selection, &store)
            .await
            .unwrap();

        let myspace = outcome.report.platform("myspace").unwrap();
        assert_eq!(myspace.error.as_deref(), Some("unsupported platform"));
        assert!(myspace.account_results.is_empty());
        assert!(outcome.report.platform("reddit").unwrap().account_results[0].success);
        assert!(outcome.report.overall.success);
    }

    #[tokio::test]
    async fn test_partial_failure_does_not_flip_overall() {
        let youtube = Arc::new(MockAdapter::new(PlatformId::Youtube).failing_upload_for("A2"));
        let store = InMemoryAccountStore::new()
            .with_account(USER, PlatformId::Youtube, valid_credential("A1"))
            .with_account(USER, PlatformId::Youtube, valid_credential("A2"));
        let selection = UploadSelection::new().with("youtube", &["A1", "A2"]);
        let video = video_file();

        let outcome = orchestrator(vec![youtube])
            .run_upload(USER, video.path(), &metadata(), &selection, &store)
            .await
            .unwrap();

        let results = &outcome.report.platform("youtube").unwrap().account_results;
        assert!(results[0].success);
        assert_eq!(results[1].error.as_deref(), Some("upload failed (403): quota exceeded"));
        assert!(outcome.report.overall.success);
    }

    #[tokio::test]
    async fn test_all_failed_on_one_platform_flips_overall() {
        let youtube = Arc::new(MockAdapter::new(PlatformId::Youtube));
        let reddit = Arc::new(MockAdapter::new(PlatformId::Reddit).failing_upload_for("R1"));
        let store = InMemoryAccountStore::new()
            .with_account(USER, PlatformId::Youtube, valid_credential("A1"))
            .with_account(USER, PlatformId::Reddit, valid_credential("R1"));
        let selection = UploadSelection::new()
            .with("youtube", &["A1"])
            .with("reddit", &["R1"]);
        let video = video_file();

        let outcome = orchestrator(vec![youtube, reddit])
            .run_upload(USER, video.path(), &metadata(), &selection, &store)
            .await
            .unwrap();

        assert!(outcome.report.platform("youtube").unwrap().account_results[0].success);
        assert!(!outcome.report.overall.success);
    }

    #[tokio::test]
    async fn test_expired_token_refreshed_once_and_used_for_upload() {
        let youtube = Arc::new(MockAdapter::new(PlatformId::Youtube));
        let store =
            InMemoryAccountStore::new().with_account(USER, PlatformId::Youtube, expired_credential("A1"));
        let selection = UploadSelection::new().with("youtube", &["A1"]);
        let video = video_file();

        let outcome = orchestrator(vec![youtube.clone()])
            .run_upload(USER, video.path(), &metadata(), &selection, &store)
            .await
            .unwrap();

        assert_eq!(youtube.refresh_count(), 1);
        assert_eq!(youtube.uploads(), vec![("A1".to_string(), "fresh-A1".to_string())]);

        assert_eq!(outcome.token_updates.len(), 1);
        let update = &outcome.token_updates[0];
        assert_eq!(update.platform, PlatformId::Youtube);
        assert_eq!(update.account_id, "A1");
        assert_eq!(update.access_token, "fresh-A1");

        // the engine only reads from the store
        assert!(store.applied_updates().is_empty());
        assert_eq!(
            store.get(USER, PlatformId::Youtube, "A1").unwrap().access_token,
            "access-A1"
        );
    }

    #[tokio::test]
    async fn test_repeated_account_is_refreshed_once() {
        let youtube = Arc::new(MockAdapter::new(PlatformId::Youtube));
        let store =
            InMemoryAccountStore::new().with_account(USER, PlatformId::Youtube, expired_credential("A1"));
        // listed twice in one entry and again under a repeated key
        let selection = UploadSelection::new()
            .with("youtube", &["A1", "A1"])
            .with("youtube", &["A1"]);
        let video = video_file();

        let outcome = orchestrator(vec![youtube.clone()])
            .run_upload(USER, video.path(), &metadata(), &selection, &store)
            .await
            .unwrap();

        assert_eq!(youtube.refresh_count(), 1);
        let results = &outcome.report.platform("youtube").unwrap().account_results;
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.success));
        assert!(youtube
            .uploads()
            .iter()
            .all(|(account, token)| account == "A1" && token == "fresh-A1"));
        assert_eq!(outcome.token_updates.len(), 1);
    }

    #[tokio::test]
    async fn test_repeated_account_shares_refresh_failure() {
        let youtube = Arc::new(MockAdapter::new(PlatformId::Youtube).failing_refresh_for("A1"));
        let store =
            InMemoryAccountStore::new().with_account(USER, PlatformId::Youtube, expired_credential("A1"));
        let selection = UploadSelection::new().with("youtube", &["A1", "A1"]);
        let video = video_file();

        let outcome = orchestrator(vec![youtube.clone()])
            .run_upload(USER, video.path(), &metadata(), &selection, &store)
            .await
            .unwrap();

        assert_eq!(youtube.refresh_count(), 1);
        let results = &outcome.report.platform("youtube").unwrap().account_results;
        assert_eq!(results.len(), 2);
        for result in results {
            assert!(!result.success);
            assert_eq!(result.account_name.as_deref(), Some("A1 name"));
            assert!(result.error.as_deref().unwrap().contains("revoked"));
        }
        assert!(youtube.uploads().is_empty());
        assert!(outcome.token_updates.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_kept_when_upload_fails() {
        let youtube = Arc::new(MockAdapter::new(PlatformId::Youtube).failing_upload_for("A1"));
        let store =
            InMemoryAccountStore::new().with_account(USER, PlatformId::Youtube, expired_credential("A1"));
        let selection = UploadSelection::new().with("youtube", &["A1"]);
        let video = video_file();

        let outcome = orchestrator(vec![youtube])
            .run_upload(USER, video.path(), &metadata(), &selection, &store)
            .await
            .unwrap();

        assert!(!outcome.report.overall.success);
        assert_eq!(outcome.token_updates.len(), 1);
    }

    #[tokio::test]
    async fn test_results_follow_selection_order_not_completion_order() {
        let youtube = Arc::new(
            MockAdapter::new(PlatformId::Youtube)
                .delaying_upload_for("A1", Duration::from_millis(150))
                .delaying_upload_for("A2", Duration::from_millis(50)),
        );
        let store = InMemoryAccountStore::new()
            .with_account(USER, PlatformId::Youtube, valid_credential("A1"))
            .with_account(USER, PlatformId::Youtube, valid_credential("A2"))
            .with_account(USER, PlatformId::Youtube, valid_credential("A3"));
        let selection = UploadSelection::new().with("youtube", &["A1", "A2", "A3"]);
        let video = video_file();

        let outcome = orchestrator(vec![youtube.clone()])
            .run_upload(USER, video.path(), &metadata(), &selection, &store)
            .await
            .unwrap();

        let order: Vec<&str> = outcome.report.platform("youtube").unwrap().account_results
            .iter()
            .map(|r| r.account_id.as_str())
            .collect();
        assert_eq!(order, vec!["A1", "A2", "A3"]);

        let completion: Vec<String> = youtube.uploads().into_iter().map(|(id, _)| id).collect();
        assert_eq!(completion, vec!["A3", "A2", "A1"]);
    }

    #[tokio::test]
    async fn test_empty_platform_entries_are_skipped() {
        let store = InMemoryAccountStore::new();
        let selection = UploadSelection::from_json(r#"{"youtube":[],"reddit":null}"#).unwrap();
        let video = video_file();

        let outcome = orchestrator(vec![])
            .run_upload(USER, video.path(), &metadata(), &selection, &store)
            .await
            .unwrap();

        assert!(outcome.report.platforms.is_empty());
        assert!(outcome.report.overall.success);
    }

    #[tokio::test]
    async fn test_missing_video_is_rejected() {
        let store = InMemoryAccountStore::new();
        let dir = tempfile::tempdir().unwrap();
        let selection = UploadSelection::new().with("youtube", &["A1"]);

        let err = orchestrator(vec![])
            .run_upload(USER, &dir.path().join("missing.mp4"), &metadata(), &selection, &store)
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::VideoNotFound(_)));

        // a directory is not a video either
        let err = orchestrator(vec![])
            .run_upload(USER, dir.path(), &metadata(), &selection, &store)
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::VideoNotFound(_)));
        assert!(matches!(AppError::from(err), AppError::InvalidInput(_)));
    }

    #[test]
    fn test_parse_selection() {
        let selection = parse_selection(r#"{"youtube":["A1"],"tiktok":["T1"]}"#).unwrap();
        assert_eq!(selection.total_accounts(), 2);

        let err = parse_selection(r#"["youtube"]"#).unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidSelection(_)));
        assert!(matches!(AppError::from(err), AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_video_deleted_once_after_failures() {
        let youtube = Arc::new(MockAdapter::new(PlatformId::Youtube).failing_upload_for("A1"));
        let store =
            InMemoryAccountStore::new().with_account(USER, PlatformId::Youtube, valid_credential("A1"));
        let selection = UploadSelection::new().with("youtube", &["A1", "missing"]);
        let (_, path) = video_file().keep().unwrap();

        let outcome = orchestrator(vec![youtube])
            .run_upload_and_cleanup(USER, TempVideoFile::new(&path), &metadata(), &selection, &store)
            .await
            .unwrap();

        assert!(!outcome.report.overall.success);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_video_deleted_when_run_fails() {
        let store = InMemoryAccountStore::new();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload.mp4");
        let selection = UploadSelection::new().with("youtube", &["A1"]);

        // the file vanishes before the run starts; cleanup still completes without error
        let result = orchestrator(vec![])
            .run_upload_and_cleanup(USER, TempVideoFile::new(&path), &metadata(), &selection, &store)
            .await;

        assert!(matches!(result, Err(OrchestratorError::VideoNotFound(_))));
        assert!(!path.exists());
    }
}
