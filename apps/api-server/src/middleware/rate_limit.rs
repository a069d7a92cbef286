//! Rate limiting middleware.

use actix_web::{
    Error, HttpMessage, ResponseError,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header::{HeaderMap, HeaderName, HeaderValue},
};
use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::sync::Arc;

use tracker_core::RateLimiter;

use super::error::{AppError, retry_after_secs};

const LIMIT_HEADER: &str = "x-ratelimit-limit";
const REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Authenticated user id, inserted into request extensions by the
/// authentication layer. When present it is the rate limit key instead of
/// the client address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal(pub String);

/// Rate limiting middleware factory.
pub struct RateLimitMiddleware {
    limiter: Arc<dyn RateLimiter>,
}

impl RateLimitMiddleware {
    pub fn new(limiter: Arc<dyn RateLimiter>) -> Self {
        Self { limiter }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddlewareService {
            service,
            limiter: self.limiter.clone(),
        }))
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: S,
    limiter: Arc<dyn RateLimiter>,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let key = client_id(&req);
        let limit = self.limiter.limit();
        let result = self.limiter.check(&key);

        if !result.allowed {
            // Rejections are an expected outcome, not an error.
            tracing::debug!(
                client_id = %key,
                retry_after_secs = retry_after_secs(result.reset_after),
                "Rate limit exceeded"
            );

            let mut response = AppError::TooManyRequests {
                retry_after: result.reset_after,
            }
            .error_response();
            insert_limit_headers(response.headers_mut(), limit, 0);

            let (http_req, _payload) = req.into_parts();
            let srv_response = ServiceResponse::new(http_req, response);

            return Box::pin(async move { Ok(srv_response.map_into_right_body()) });
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let mut res = fut.await?;
            insert_limit_headers(res.headers_mut(), limit, result.remaining);
            Ok(res.map_into_left_body())
        })
    }
}

/// Derive the rate limit key: the authenticated user if known, otherwise the
/// client address.
///
/// The address comes from `Forwarded` / `X-Forwarded-For` when present, so
/// anonymous limits only hold behind a trusted reverse proxy that overwrites
/// those headers. Exposed directly, a client can pick a fresh key per request.
pub fn client_id(req: &ServiceRequest) -> String {
    if let Some(principal) = req.extensions().get::<Principal>() {
        return format!("user:{}", principal.0);
    }

    req.connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_string()
}

fn insert_limit_headers(headers: &mut HeaderMap, limit: u32, remaining: u32) {
    headers.insert(
        HeaderName::from_static(LIMIT_HEADER),
        HeaderValue::from(limit),
    );
    headers.insert(
        HeaderName::from_static(REMAINING_HEADER),
        HeaderValue::from(remaining),
    );
}
