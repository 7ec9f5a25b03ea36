pub mod handlers;
pub mod middleware;
pub mod models;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use authgate_auth::{Authenticator, CredentialStore, JwtError, TokenCodec, TokenConfig};
use chrono::Duration;
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

/// Application state shared across handlers
pub struct AppState {
    pub authenticator: Arc<Authenticator>,
    /// Lifetime of tokens issued by `/auth/login`
    pub access_token_ttl: Duration,
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
            components.add_security_scheme(
                "basic",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Basic)),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "authgate API",
        description = "Token and password authentication with role-gated routes"
    ),
    paths(
        handlers::root,
        handlers::health_check,
        handlers::register,
        handlers::login,
        handlers::get_me,
        handlers::protected_route,
        handlers::admin_route,
        handlers::submit_form,
    ),
    components(
        schemas(
            models::ErrorResponse,
            models::HealthResponse,
            models::RootResponse,
            models::RegisterRequest,
            models::LoginRequest,
            models::UserResponse,
            models::TokenResponse,
            models::MessageResponse,
            models::ContactForm,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration and login"),
        (name = "users", description = "Authenticated user endpoints"),
        (name = "form", description = "Form submission"),
        (name = "system", description = "System health and info endpoints")
    )
)]
pub struct ApiDoc;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Address to bind the API server
    pub bind_addr: SocketAddr,
    /// Enable CORS
    pub enable_cors: bool,
    /// Allowed CORS origins (if None, the request origin is mirrored)
    pub cors_origins: Option<Vec<String>>,
    /// Token signing and validation settings
    pub token: TokenConfig,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            enable_cors: true,
            cors_origins: None,
            token: TokenConfig::default(),
        }
    }
}

/// API Server
pub struct ApiServer {
    config: ApiServerConfig,
    state: Arc<AppState>,
}

impl ApiServer {
    /// Create a new API server around an injected credential store
    pub fn new(
        config: ApiServerConfig,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self, JwtError> {
        let codec = Arc::new(TokenCodec::new(&config.token)?);
        let state = Arc::new(AppState {
            authenticator: Arc::new(Authenticator::new(codec, store)),
            access_token_ttl: config.token.access_token_ttl,
        });

        Ok(Self { config, state })
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        // PUBLIC routes (no authentication required)
        let public_router = Router::new()
            .route("/", get(handlers::root))
            .route("/health", get(handlers::health_check))
            .route("/openapi.json", get(openapi_json))
            .route("/auth/register", post(handlers::register))
            .route("/auth/login", post(handlers::login))
            .route("/form/submit", post(handlers::submit_form))
            .with_state(self.state.clone());

        // ADMIN routes (role check runs after authentication)
        let admin_router = middleware::with_roles(
            Router::new().route("/users/admin", get(handlers::admin_route)),
            ["admin"],
        );

        // PROTECTED routes (bearer token or Basic credentials)
        let protected_router = middleware::with_auth(
            Router::new()
                .route("/users/me", get(handlers::get_me))
                .route("/users/protected", get(handlers::protected_route))
                .merge(admin_router),
            self.state.authenticator.clone(),
        );

        let mut router = public_router
            .merge(protected_router)
            .layer(TraceLayer::new_for_http());

        if self.config.enable_cors {
            router = router.layer(self.cors_layer());
        }

        router
    }

    fn cors_layer(&self) -> CorsLayer {
        let origins = match &self.config.cors_origins {
            Some(origins) => AllowOrigin::list(
                origins
                    .iter()
                    .filter_map(|origin| HeaderValue::from_str(origin).ok()),
            ),
            None => AllowOrigin::mirror_request(),
        };

        // Credentials are allowed, so wildcards cannot be used anywhere
        CorsLayer::new()
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::PATCH,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .allow_credentials(true)
            .allow_origin(origins)
    }

    /// Start the API server
    pub async fn start(self) -> Result<(), anyhow::Error> {
        let router = self.build_router();

        info!("Starting API server on {}", self.config.bind_addr);
        info!(
            "OpenAPI document: http://{}/openapi.json",
            self.config.bind_addr
        );

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;

        axum::serve(listener, router)
            .await
            .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

        Ok(())
    }
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
