// ==================== BULK IMPORT ====================
// upload -> staged file -> company resolution -> extraction -> sequential
// account creation -> report. The staged file is removed whenever the
// StagedUpload is dropped, so every exit path cleans up after itself.

use chrono::Utc;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::backend::BackendClient;
use crate::config::ImportLimits;
use crate::models::{ImportReport, UserRecord};
use crate::services::account_creator::create_account;
use crate::services::record_extractor::RecordExtractor;
use crate::services::tenant_resolver::resolve_tenant;
use crate::utils::AppError;

const MAX_FILENAME_LENGTH: usize = 64;
const DEFAULT_FILENAME: &str = "upload.csv";

/// An uploaded file written to the upload directory for the length of one request.
pub struct StagedUpload {
    file: Option<NamedTempFile>,
    original_name: String,
}

impl StagedUpload {
    /// Creates an empty file named after the current timestamp and the client's filename.
    pub fn create(dir: &Path, original_name: &str) -> io::Result<Self> {
        let prefix = format!(
            "{}_{}_",
            Utc::now().format("%Y%m%d%H%M%S%6f"),
            sanitize_filename(original_name)
        );
        let file = tempfile::Builder::new().prefix(&prefix).tempfile_in(dir)?;

        log::debug!("📁 Staged upload at {}", file.path().display());

        Ok(Self {
            file: Some(file),
            original_name: original_name.to_string(),
        })
    }

    pub fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.write_all(chunk),
            None => Err(io::Error::new(io::ErrorKind::NotFound, "staged upload already removed")),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.file.as_ref().map(|f| f.path())
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            let path = file.path().to_path_buf();
            match file.close() {
                Ok(()) => log::debug!("🧹 Removed staged upload {}", path.display()),
                Err(e) => log::error!(
                    "❌ Failed to remove staged upload {}: {}",
                    path.display(),
                    e
                ),
            }
        }
    }
}

/// Drives one import per call; holds no per-import state between calls.
pub struct ImportService {
    backend: Arc<dyn BackendClient>,
    extractor: RecordExtractor,
    upload_dir: PathBuf,
}

impl ImportService {
    pub fn new(backend: Arc<dyn BackendClient>, limits: ImportLimits, upload_dir: PathBuf) -> Self {
        Self {
            backend,
            extractor: RecordExtractor::new(limits),
            upload_dir,
        }
    }

    pub fn backend(&self) -> &dyn BackendClient {
        self.backend.as_ref()
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn stage_upload(&self, original_name: &str) -> Result<StagedUpload, AppError> {
        StagedUpload::create(&self.upload_dir, original_name).map_err(|e| {
            log::error!("❌ Failed to stage upload in {}: {}", self.upload_dir.display(), e);
            AppError::from(e)
        })
    }

    /// Stages `bytes` and imports them in one go.
    pub async fn import_bytes(
        &self,
        original_name: &str,
        bytes: &[u8],
        tenant_name: &str,
        row_limit: Option<usize>,
    ) -> Result<ImportReport, AppError> {
        let mut upload = self.stage_upload(original_name)?;
        upload.write_chunk(bytes)?;
        self.run(upload, tenant_name, row_limit).await
    }

    /// Imports a staged upload into the company named `tenant_name`.
    ///
    /// The company is resolved before the file is read; an unknown company aborts
    /// the import with no creation attempted. `row_limit` can only lower the
    /// configured cap.
    pub async fn run(
        &self,
        upload: StagedUpload,
        tenant_name: &str,
        row_limit: Option<usize>,
    ) -> Result<ImportReport, AppError> {
        let import_id = Uuid::new_v4();
        log::info!(
            "📥 [{}] Importing '{}' into company '{}'",
            import_id,
            upload.original_name(),
            tenant_name
        );

        let tenant = resolve_tenant(self.backend(), tenant_name)
            .await
            .ok_or_else(|| AppError::TenantNotFound(tenant_name.to_string()))?;

        let records = self.extract(&upload, row_limit).await?;
        log::info!("📋 [{}] Extracted {} records", import_id, records.len());

        let mut report = ImportReport::default();
        for record in &records {
            let outcome = create_account(self.backend(), record, &tenant).await;
            report.record(&outcome);
        }

        log::info!(
            "✅ [{}] Import finished: {}/{} created",
            import_id,
            report.created,
            report.total
        );
        Ok(report)
    }

    async fn extract(
        &self,
        upload: &StagedUpload,
        row_limit: Option<usize>,
    ) -> Result<Vec<UserRecord>, AppError> {
        let path = upload
            .path()
            .ok_or_else(|| AppError::Storage("staged upload missing".to_string()))?
            .to_path_buf();
        let extractor = self.extractor.capped(row_limit);

        let records = tokio::task::spawn_blocking(move || extractor.extract_path(&path))
            .await
            .map_err(|e| AppError::Storage(format!("extraction task failed: {}", e)))??;
        Ok(records)
    }
}

/// Keeps only the last path component and a safe character set.
fn sanitize_filename(raw: &str) -> String {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or(raw);

    let sanitized: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .take(MAX_FILENAME_LENGTH)
        .collect();
    let sanitized = sanitized.trim_start_matches('.');

    if sanitized.is_empty() {
        DEFAULT_FILENAME.to_string()
    } else {
        sanitized.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, RpcResponse};
    use crate::test_support::StubBackend;
    use serde_json::json;
    use tempfile::TempDir;

    fn users_csv(n: usize) -> String {
        let mut csv = String::from("email,full_name,password\n");
        for i in 0..n {
            csv.push_str(&format!("User{}@Example.com,User {},pw{}\n", i, i, i));
        }
        csv
    }

    fn service_with(backend: Arc<StubBackend>, limits: ImportLimits) -> (ImportService, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let service = ImportService::new(backend, limits, dir.path().to_path_buf());
        (service, dir)
    }

    fn staged_files(dir: &TempDir) -> usize {
        std::fs::read_dir(dir.path()).unwrap().count()
    }

    #[tokio::test]
    async fn test_three_rows_all_created_and_file_removed() {
        let backend = Arc::new(StubBackend::new().with_tenant("Acme", json!("c-1")));
        let (service, dir) = service_with(backend.clone(), ImportLimits::default());

        let report = service
            .import_bytes("users.csv", users_csv(3).as_bytes(), "Acme", None)
            .await
            .unwrap();

        assert_eq!(report, ImportReport { created: 3, total: 3 });
        assert_eq!(staged_files(&dir), 0);

        let emails: Vec<_> = backend.created_accounts().into_iter().map(|a| a.p_email).collect();
        assert_eq!(emails, vec!["user0@example.com", "user1@example.com", "user2@example.com"]);
    }

    #[tokio::test]
    async fn test_even_indexed_successes_are_counted() {
        let backend = Arc::new(
            StubBackend::new()
                .with_tenant("Acme", json!(3))
                .with_create_script(|i, _| {
                    if i % 2 == 0 {
                        Ok(RpcResponse::data(json!({"success": true})))
                    } else {
                        Ok(RpcResponse::data(json!({"success": false, "error": "duplicate"})))
                    }
                }),
        );
        let (service, _dir) = service_with(backend.clone(), ImportLimits::default());

        let report = service
            .import_bytes("users.csv", users_csv(5).as_bytes(), "Acme", None)
            .await
            .unwrap();

        // indices 0, 2, 4
        assert_eq!(report, ImportReport { created: 3, total: 5 });
        assert_eq!(backend.created_accounts().len(), 5);
    }

    #[tokio::test]
    async fn test_unknown_company_aborts_before_any_creation() {
        let backend = Arc::new(StubBackend::new().with_tenant("Acme", json!("c-1")));
        let (service, dir) = service_with(backend.clone(), ImportLimits::default());

        let err = service
            .import_bytes("users.csv", users_csv(3).as_bytes(), "Globex", None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::TenantNotFound(ref name) if name == "Globex"));
        assert!(backend.created_accounts().is_empty());
        assert_eq!(staged_files(&dir), 0);
    }

    #[tokio::test]
    async fn test_backend_failure_during_resolution_is_not_found() {
        let backend = Arc::new(StubBackend::new().failing_tenant_lookup());
        let (service, _dir) = service_with(backend.clone(), ImportLimits::default());

        let err = service
            .import_bytes("users.csv", users_csv(1).as_bytes(), "Acme", None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::TenantNotFound(_)));
        assert!(backend.created_accounts().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_upload_creates_nothing_and_cleans_up() {
        let backend = Arc::new(StubBackend::new().with_tenant("Acme", json!("c-1")));
        let (service, dir) = service_with(backend.clone(), ImportLimits::default());

        let err = service
            .import_bytes("users.csv", b"email,name\na@b.c,A\n", "Acme", None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::MalformedInput(_)));
        assert!(backend.created_accounts().is_empty());
        assert_eq!(staged_files(&dir), 0);
    }

    #[tokio::test]
    async fn test_transport_failures_are_counted_not_raised() {
        let backend = Arc::new(
            StubBackend::new()
                .with_tenant("Acme", json!("c-1"))
                .with_create_script(|i, _| {
                    if i == 1 {
                        Err(BackendError::Transport("timed out".to_string()))
                    } else {
                        Ok(RpcResponse::data(json!({"success": true})))
                    }
                }),
        );
        let (service, _dir) = service_with(backend, ImportLimits::default());

        let report = service
            .import_bytes("users.csv", users_csv(3).as_bytes(), "Acme", None)
            .await
            .unwrap();

        assert_eq!(report, ImportReport { created: 2, total: 3 });
    }

    #[tokio::test]
    async fn test_row_caps() {
        let backend = Arc::new(StubBackend::new().with_tenant("Acme", json!("c-1")));
        let limits = ImportLimits {
            max_rows: Some(4),
            skip_malformed_rows: false,
        };
        let (service, _dir) = service_with(backend.clone(), limits);

        let configured = service
            .import_bytes("users.csv", users_csv(10).as_bytes(), "Acme", None)
            .await
            .unwrap();
        assert_eq!(configured.total, 4);

        let per_request = service
            .import_bytes("users.csv", users_csv(10).as_bytes(), "Acme", Some(2))
            .await
            .unwrap();
        assert_eq!(per_request.total, 2);

        let above_cap = service
            .import_bytes("users.csv", users_csv(10).as_bytes(), "Acme", Some(50))
            .await
            .unwrap();
        assert_eq!(above_cap.total, 4);
    }

    #[test]
    fn test_staged_name_carries_original_filename() {
        let dir = tempfile::tempdir().unwrap();
        let upload = StagedUpload::create(dir.path(), "../../etc/users.csv").unwrap();

        let name = upload.path().unwrap().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.contains("_users.csv_"), "unexpected staged name {}", name);
        assert!(upload.path().unwrap().starts_with(dir.path()));

        drop(upload);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_concurrent_uploads_with_same_name_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let first = StagedUpload::create(dir.path(), "users.csv").unwrap();
        let second = StagedUpload::create(dir.path(), "users.csv").unwrap();
        assert_ne!(first.path(), second.path());
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("users.csv"), "users.csv");
        assert_eq!(sanitize_filename("C:\\tmp\\my users.csv"), "myusers.csv");
        assert_eq!(sanitize_filename(".hidden"), "hidden");
        assert_eq!(sanitize_filename("///"), "upload.csv");
    }
}
