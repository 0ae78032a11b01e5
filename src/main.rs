use std::{process, sync::Arc, time::Duration};

use inkpost::{
    application::{
        analytics::AnalyticsService,
        comments::CommentService,
        error::AppError,
        posts::PostService,
        profiles::ProfileService,
        repos::{
            AnalyticsRepo, CommentsRepo, CommentsWriteRepo, HealthRepo, PostsRepo, PostsWriteRepo,
            ProfilesRepo, ProfilesWriteRepo,
        },
        session::{IdentityProvider, ProfileIdentityProvider},
    },
    cache::{CacheConfig, CacheHandles},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiState},
        telemetry,
    },
};
use sqlx::PgPool;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli().map_err(InfraError::from)?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let pool = connect(&settings).await?;
    migrate(&pool).await?;
    info!(target = "inkpost::migrate", "Migrations applied");
    Ok(())
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let pool = connect(&settings).await?;
    if settings.database.migrate_on_start {
        migrate(&pool).await?;
    }

    let repositories = Arc::new(PostgresRepositories::new(pool));
    let state = build_api_state(repositories, &settings);
    serve_http(&settings, state).await
}

async fn connect(settings: &config::Settings) -> Result<PgPool, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or(InfraError::MissingSetting {
            key: "database.url",
        })?;

    PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))
}

async fn migrate(pool: &PgPool) -> Result<(), AppError> {
    PostgresRepositories::run_migrations(pool)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))
}

fn build_api_state(repositories: Arc<PostgresRepositories>, settings: &config::Settings) -> ApiState {
    let posts_repo: Arc<dyn PostsRepo> = repositories.clone();
    let posts_write_repo: Arc<dyn PostsWriteRepo> = repositories.clone();
    let comments_repo: Arc<dyn CommentsRepo> = repositories.clone();
    let comments_write_repo: Arc<dyn CommentsWriteRepo> = repositories.clone();
    let profiles_repo: Arc<dyn ProfilesRepo> = repositories.clone();
    let profiles_write_repo: Arc<dyn ProfilesWriteRepo> = repositories.clone();
    let analytics_repo: Arc<dyn AnalyticsRepo> = repositories.clone();
    let health_repo: Arc<dyn HealthRepo> = repositories;

    let cache_config = CacheConfig::from(&settings.cache);
    let cache = CacheHandles::build(cache_config);
    info!(
        target = "inkpost::serve",
        cache_enabled = cache.is_some(),
        "Query cache configured"
    );

    let identity: Arc<dyn IdentityProvider> =
        Arc::new(ProfileIdentityProvider::new(profiles_repo.clone()));

    ApiState {
        posts: Arc::new(
            PostService::new(posts_repo, posts_write_repo).with_cache_opt(cache.clone()),
        ),
        comments: Arc::new(
            CommentService::new(comments_repo, comments_write_repo).with_cache_opt(cache.clone()),
        ),
        profiles: Arc::new(
            ProfileService::new(profiles_repo, profiles_write_repo).with_cache_opt(cache.clone()),
        ),
        analytics: Arc::new(AnalyticsService::new(analytics_repo).with_cache_opt(cache)),
        identity,
        health: health_repo,
    }
}

async fn serve_http(settings: &config::Settings, state: ApiState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "inkpost::serve",
        addr = %settings.server.addr,
        "Listening"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal(settings.server.graceful_shutdown))
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

/// Resolves on ctrl-c; in-flight requests then get `grace` to finish.
async fn shutdown_signal(grace: Duration) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        return;
    }
    info!(
        target = "inkpost::serve",
        grace_seconds = grace.as_secs(),
        "Shutdown requested, draining connections"
    );

    tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        warn!(target = "inkpost::serve", "Graceful shutdown timed out");
        process::exit(1);
    });
}
