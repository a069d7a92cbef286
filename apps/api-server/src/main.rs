//! # Tracker API Server
//!
//! The main entry point for the Actix-web HTTP server.

use std::io;

use actix_web::{
    App, Error, HttpServer,
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    web,
};
use tracing_actix_web::TracingLogger;

mod background;
mod config;
mod handlers;
mod middleware;
mod state;
mod telemetry;

use config::AppConfig;
use middleware::RateLimitMiddleware;
use state::AppState;
use telemetry::TelemetryConfig;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    telemetry::init_telemetry(&TelemetryConfig::from_env());

    // Refuse to start with an unusable configuration
    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;

    tracing::info!(
        "Starting Tracker API Server on {}:{}",
        config.host,
        config.port
    );

    let state =
        AppState::new(config.rate_limit).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let mut sweeper = background::start_idle_sweep(state.rate_limiter.clone(), config.sweep)
        .await
        .map_err(io::Error::other)?;

    let result = HttpServer::new(move || build_app(state.clone()))
        .bind((config.host.as_str(), config.port))?
        .run()
        .await;

    if let Some(sweeper) = sweeper.as_mut() {
        if let Err(e) = sweeper.shutdown().await {
            tracing::warn!(error = %e, "Failed to stop idle client sweep");
        }
    }

    result
}

/// Security headers wrap the rate limiter, so rejected requests carry them too.
fn build_app(
    state: AppState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    App::new()
        .wrap(RateLimitMiddleware::new(state.limiter()))
        .wrap(middleware::security_headers())
        .wrap(TracingLogger::default())
        .app_data(web::Data::new(state))
        .configure(handlers::configure_routes)
        .default_service(web::to(middleware::error::not_found))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::{StatusCode, header};
    use actix_web::test;
    use std::net::SocketAddr;
    use std::time::Duration;

    use tracker_infra::RateLimitConfig;

    #[actix_web::test]
    async fn test_rejected_requests_carry_security_headers() {
        let state = AppState::new(RateLimitConfig::new(1, Duration::from_secs(60))).unwrap();
        let app = test::init_service(build_app(state)).await;
        let peer: SocketAddr = "10.0.0.1:40000".parse().unwrap();

        let mut statuses = Vec::new();
        for _ in 0..2 {
            let req = test::TestRequest::get()
                .uri("/api/health")
                .peer_addr(peer)
                .to_request();
            let res = test::call_service(&app, req).await;
            assert_eq!(res.headers().get(header::X_CONTENT_TYPE_OPTIONS).unwrap(), "nosniff");
            assert_eq!(res.headers().get(header::X_FRAME_OPTIONS).unwrap(), "DENY");
            assert!(res.headers().contains_key(header::CONTENT_SECURITY_POLICY));
            statuses.push(res.status());
        }

        assert_eq!(statuses, vec![StatusCode::OK, StatusCode::TOO_MANY_REQUESTS]);
    }

    #[actix_web::test]
    async fn test_unknown_route_is_rate_limited() {
        let state = AppState::new(RateLimitConfig::new(5, Duration::from_secs(60))).unwrap();
        let app = test::init_service(build_app(state)).await;

        let req = test::TestRequest::get()
            .uri("/api/meals")
            .peer_addr("10.0.0.2:40000".parse().unwrap())
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(res.headers().get("x-ratelimit-remaining").unwrap(), "4");
    }
}
