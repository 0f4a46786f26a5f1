use std::{future::IntoFuture, path::Path, process, sync::Arc};

use forum_sitemap::{
    application::{
        builder::ForumEngine,
        clock::SystemClock,
        error::AppError,
        links::PermalinkResolver,
        sitemap::SitemapService,
    },
    cache::{CacheConfig, DisabledCache},
    config,
    infra::{
        db::{ForumTables, MySqlRepositories},
        error::InfraError,
        http::{self, HttpState, SitemapRoutes},
        telemetry,
    },
};
use tokio::{io::AsyncWriteExt, sync::Notify};
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
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Generate(args) => run_generate(settings, args).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    // the pool connects on first use; availability is probed per request until it succeeds
    let db = match settings.database.url.as_deref() {
        Some(url) => Some(lazy_repositories(url, &settings.database)?),
        None => {
            warn!(
                target = "forum_sitemap::startup",
                "no database configured; sitemap will answer 503"
            );
            None
        }
    };

    let engine = db
        .as_ref()
        .map(|db| forum_engine(db.clone(), &settings.forum));

    let cache_config = CacheConfig::from(&settings.sitemap);
    let sitemap = SitemapService::new(
        engine,
        cache_config.build_store(),
        &cache_config,
        Arc::new(SystemClock::new(settings.forum.timezone)),
    )
    .with_recheck_interval(settings.sitemap.availability_recheck);
    let available = sitemap.is_available().await;
    info!(
        target = "forum_sitemap::startup",
        available,
        cache_enabled = cache_config.enabled,
        cache_ttl_secs = cache_config.ttl.as_secs(),
        "sitemap service ready"
    );

    let state = HttpState {
        sitemap: Arc::new(sitemap),
        db,
        routes: Arc::new(SitemapRoutes::from(&settings.sitemap)),
    };

    serve_http(&settings, state).await
}

async fn run_generate(
    settings: config::Settings,
    args: config::GenerateArgs,
) -> Result<(), AppError> {
    let url = settings.database.url.as_deref().ok_or_else(|| {
        InfraError::configuration("database.url is required to generate a sitemap")
    })?;
    let db = connect_repositories(url, &settings.database).await?;
    db.probe_forum_tables().await?;

    let cache_config = CacheConfig::from(&settings.sitemap);
    let sitemap = SitemapService::new(
        Some(forum_engine(db, &settings.forum)),
        Arc::new(DisabledCache),
        &cache_config,
        Arc::new(SystemClock::new(settings.forum.timezone)),
    );
    let xml = sitemap.build_document().await?;

    match args.output.as_deref() {
        Some(path) => write_output(path, &xml).await?,
        None => {
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(xml.as_bytes())
                .await
                .map_err(InfraError::from)?;
            stdout.flush().await.map_err(InfraError::from)?;
        }
    }

    Ok(())
}

async fn write_output(path: &Path, xml: &str) -> Result<(), InfraError> {
    tokio::fs::write(path, xml).await?;
    info!(
        target = "forum_sitemap::generate",
        path = %path.display(),
        bytes = xml.len(),
        "sitemap written"
    );
    Ok(())
}

async fn connect_repositories(
    url: &str,
    database: &config::DatabaseSettings,
) -> Result<Arc<MySqlRepositories>, InfraError> {
    let pool = MySqlRepositories::connect(url, database.max_connections.get())
        .await
        .map_err(|err| InfraError::database(err.to_string()))?;
    Ok(Arc::new(MySqlRepositories::new(
        pool,
        ForumTables::new(&database.table_prefix),
    )))
}

fn lazy_repositories(
    url: &str,
    database: &config::DatabaseSettings,
) -> Result<Arc<MySqlRepositories>, InfraError> {
    let pool = MySqlRepositories::connect_lazy(url, database.max_connections.get())
        .map_err(|err| InfraError::configuration(format!("invalid database.url: {err}")))?;
    Ok(Arc::new(MySqlRepositories::new(
        pool,
        ForumTables::new(&database.table_prefix),
    )))
}

fn forum_engine(db: Arc<MySqlRepositories>, forum: &config::ForumSettings) -> ForumEngine {
    let links = PermalinkResolver::new(
        forum.home_url.clone(),
        forum.pretty_permalinks,
        forum.view_name_forum.clone(),
        forum.view_name_topic.clone(),
        forum.posts_per_page,
    );
    ForumEngine::new(db, Arc::new(links), forum.options())
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "forum_sitemap::server",
        addr = %settings.server.addr,
        "listening"
    );

    let shutdown = Arc::new(Notify::new());
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()));
    let grace = settings.server.graceful_shutdown;

    tokio::select! {
        result = server.into_future() => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        _ = async {
            shutdown.notified().await;
            tokio::time::sleep(grace).await;
        } => {
            warn!(
                target = "forum_sitemap::server",
                grace_secs = grace.as_secs(),
                "graceful shutdown timed out; dropping open connections"
            );
        }
    }

    info!(target = "forum_sitemap::server", "server stopped");
    Ok(())
}

async fn shutdown_signal(shutdown: Arc<Notify>) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(
            target = "forum_sitemap::server",
            error = %err,
            "failed to listen for shutdown signal"
        );
        std::future::pending::<()>().await;
    }
    info!(target = "forum_sitemap::server", "shutdown requested");
    shutdown.notify_one();
}
