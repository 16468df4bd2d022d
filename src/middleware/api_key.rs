use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, ResponseError,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::sync::Arc;

use crate::api::metrics;
use crate::utils::AppError;

pub const API_KEY_HEADER: &str = "X-API-Key";

/// Rejects requests whose `X-API-Key` header is not byte-for-byte the configured secret.
///
/// Runs before the handler touches the body, so a rejected upload is never staged.
#[derive(Clone)]
pub struct ApiKeyAuth {
    expected: Arc<str>,
}

impl ApiKeyAuth {
    pub fn new(expected: impl Into<Arc<str>>) -> Self {
        Self {
            expected: expected.into(),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ApiKeyAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = ApiKeyAuthService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ApiKeyAuthService {
            service,
            expected: self.expected.clone(),
        }))
    }
}

pub struct ApiKeyAuthService<S> {
    service: S,
    expected: Arc<str>,
}

impl<S, B> Service<ServiceRequest> for ApiKeyAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let authorized = req
            .headers()
            .get(API_KEY_HEADER)
            .is_some_and(|value| value.as_bytes() == self.expected.as_bytes());

        if !authorized {
            log::warn!("🔒 Rejected {} {}: invalid API key", req.method(), req.path());
            metrics::increment_rejected_key_count();

            let response = AppError::InvalidApiKey.error_response();
            return Box::pin(async move { Ok(req.into_response(response).map_into_right_body()) });
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            Ok(res.map_into_left_body())
        })
    }
}
