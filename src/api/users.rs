use actix_multipart::{Field, Multipart};
use actix_web::{web, HttpResponse};
use futures::TryStreamExt;
use serde::Deserialize;

use crate::api::metrics;
use crate::middleware::ApiKeyAuth;
use crate::models::ImportReport;
use crate::services::{ImportService, StagedUpload};
use crate::utils::AppError;

const FILE_FIELD: &str = "file";
const COMPANY_FIELD: &str = "company_name";
const DEFAULT_UPLOAD_NAME: &str = "upload.csv";
const MAX_TEXT_FIELD_BYTES: usize = 1024;

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ImportQuery {
    /// Company to import into. Takes precedence over the form field of the same name.
    pub company_name: Option<String>,
    /// Import at most this many rows (never more than the configured cap).
    pub num_users: Option<usize>,
}

/// Multipart body of `POST /users/add`.
#[derive(utoipa::ToSchema)]
#[allow(dead_code)]
pub struct ImportUploadForm {
    /// CSV with an `email,full_name,password` header.
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    pub company_name: Option<String>,
}

/// Mounts `/users`, guarded by the shared-secret header.
pub fn configure(cfg: &mut web::ServiceConfig, api_key: &str) {
    cfg.service(
        web::scope("/users")
            .wrap(ApiKeyAuth::new(api_key))
            .route("/add", web::post().to(add_users)),
    );
}

/// POST /users/add - Importa usuários de um CSV para a empresa informada
#[utoipa::path(
    post,
    path = "/users/add",
    tag = "Users",
    params(ImportQuery),
    request_body(content = ImportUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Import finished", body = ImportReport),
        (status = 400, description = "Missing file or company, or malformed CSV"),
        (status = 403, description = "Invalid API Key"),
        (status = 404, description = "Company not found")
    ),
    security(
        ("api_key" = [])
    )
)]
pub async fn add_users(
    service: web::Data<ImportService>,
    query: web::Query<ImportQuery>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    metrics::increment_import_request_count();
    log::info!("📤 POST /users/add");

    match import_upload(&service, query.into_inner(), payload).await {
        Ok(report) => {
            metrics::record_import(&report);
            Ok(HttpResponse::Ok().json(report))
        }
        Err(e) => {
            metrics::increment_import_error_count();
            log::warn!("❌ Import rejected: {}", e);
            Err(e)
        }
    }
}

async fn import_upload(
    service: &ImportService,
    query: ImportQuery,
    mut payload: Multipart,
) -> Result<ImportReport, AppError> {
    let mut upload: Option<StagedUpload> = None;
    let mut form_company: Option<String> = None;

    while let Some(mut field) = payload.try_next().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            FILE_FIELD => {
                let filename = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename())
                    .unwrap_or(DEFAULT_UPLOAD_NAME)
                    .to_string();
                upload = Some(stage_field(service, &filename, &mut field).await?);
            }
            COMPANY_FIELD => {
                form_company = Some(read_text(&mut field).await?);
            }
            _ => {
                // Ignore unknown fields
                while field.try_next().await.map_err(multipart_error)?.is_some() {}
            }
        }
    }

    let company = query
        .company_name
        .or(form_company)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| AppError::InvalidRequest("company_name is required".to_string()))?;

    let upload = upload.ok_or_else(|| {
        AppError::InvalidRequest(format!("No '{}' field found in multipart upload", FILE_FIELD))
    })?;

    service.run(upload, &company, query.num_users).await
}

async fn stage_field(
    service: &ImportService,
    filename: &str,
    field: &mut Field,
) -> Result<StagedUpload, AppError> {
    let mut staged = service.stage_upload(filename)?;

    while let Some(chunk) = field.try_next().await.map_err(multipart_error)? {
        staged = web::block(move || -> std::io::Result<StagedUpload> {
            let mut staged = staged;
            staged.write_chunk(&chunk)?;
            Ok(staged)
        })
        .await
        .map_err(|e| AppError::Storage(e.to_string()))??;
    }

    Ok(staged)
}

async fn read_text(field: &mut Field) -> Result<String, AppError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.try_next().await.map_err(multipart_error)? {
        if bytes.len() + chunk.len() > MAX_TEXT_FIELD_BYTES {
            return Err(AppError::InvalidRequest("Form field too large".to_string()));
        }
        bytes.extend_from_slice(&chunk);
    }

    String::from_utf8(bytes)
        .map_err(|_| AppError::InvalidRequest("Form field is not valid UTF-8".to_string()))
}

fn multipart_error(e: actix_multipart::MultipartError) -> AppError {
    AppError::InvalidRequest(format!("Multipart read error: {}", e))
}
