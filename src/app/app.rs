use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use tracing::{error, info, warn};

use crate::config::{AdminUserConfig, AppConfig, EmailConfig, JwtConfig, MongoConfig, PasswordResetConfig};
use crate::handler::{health, not_found};
use crate::middlewares::auth_middleware::AuthState;
use crate::repository::connect_database;
use crate::repository::movie_repo::{MongoMovieRepository, MovieRepository};
use crate::repository::user_repo::{MongoUserRepository, UserRepository};
use crate::router::movie_router::movie_router;
use crate::router::user_router::user_router;
use crate::service::movie_service::{MovieService, MovieServiceImpl};
use crate::service::user_service::{UserService, UserServiceImpl};
use crate::util::email::{EmailService, SmtpEmailService};
use crate::util::jwt::{JwtTokenUtils, JwtTokenUtilsImpl};

/// Everything the routers need, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<dyn UserService>,
    pub movie_service: Arc<dyn MovieService>,
    pub auth: AuthState,
}

impl AppState {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        movie_repo: Arc<dyn MovieRepository>,
        jwt_utils: Arc<dyn JwtTokenUtils>,
        mailer: Arc<dyn EmailService>,
        reset_config: PasswordResetConfig,
    ) -> Self {
        let user_service = Arc::new(UserServiceImpl::new(
            user_repo.clone(),
            jwt_utils.clone(),
            mailer,
            reset_config,
        ));
        let movie_service = Arc::new(MovieServiceImpl::new(movie_repo));
        AppState {
            user_service,
            movie_service,
            auth: AuthState { jwt_utils, user_repo },
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(user_router(state.user_service))
        .merge(movie_router(state.movie_service, state.auth))
        .route("/health", get(health))
        .fallback(not_found)
}

pub struct App {
    config: AppConfig,
    router: Router,
}

impl App {
    pub async fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let config = AppConfig::from_env();
        let mongo_config = MongoConfig::from_env()?;
        let jwt_config = JwtConfig::from_env()?;
        let email_config = EmailConfig::from_env()?;
        let reset_config = PasswordResetConfig::from_env()?;

        let db = connect_database(&mongo_config).await?;
        let user_repo = Arc::new(MongoUserRepository::new(&db, &mongo_config.user_collection));
        let movie_repo = Arc::new(MongoMovieRepository::new(&db, &mongo_config.movie_collection));
        user_repo.ensure_indexes().await?;
        movie_repo.ensure_indexes().await?;

        let mailer = Arc::new(SmtpEmailService::new(email_config)?);
        let jwt_utils = Arc::new(JwtTokenUtilsImpl::new(jwt_config));

        let state = AppState::new(user_repo, movie_repo, jwt_utils, mailer, reset_config);
        Self::create_first_admin_user(state.user_service.as_ref()).await;

        Ok(App {
            config,
            router: build_router(state),
        })
    }

    async fn create_first_admin_user(user_service: &dyn UserService) {
        let admin_conf = match AdminUserConfig::from_env() {
            Ok(c) => c,
            Err(e) => {
                warn!("Admin user config not loaded: {e}");
                return;
            }
        };
        if let Err(e) = user_service.ensure_admin(&admin_conf).await {
            error!("Failed to create admin user: {e}");
        }
    }

    pub async fn start(self) -> Result<(), Box<dyn std::error::Error>> {
        let addr = SocketAddr::new(self.config.host.parse()?, self.config.port);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("🚀 Server running at http://{}", addr);
        axum::serve(listener, self.router).await?;
        Ok(())
    }
}
