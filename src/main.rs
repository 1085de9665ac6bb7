use std::{process, sync::Arc};

use newsdesk::{
    application::{
        access::{AccessKeyError, AccessKeyService},
        error::AppError,
        news::NewsService,
        repos::{AccessKeysRepo, ImageStore, NewsRepo, NewsWriteRepo},
    },
    config::{self, Command, KeysArgs, KeysCommand, Settings},
    domain::uploads::UploadPolicy,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, HttpState},
        telemetry,
        uploads::UploadStorage,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info};
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
        .unwrap_or(Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        Command::Serve(_) => run_serve(settings).await,
        Command::Keys(args) => run_keys(settings, args).await,
    }
}

async fn run_serve(settings: Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;

    let storage = UploadStorage::new(settings.uploads.directory.clone())
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    let news_reader: Arc<dyn NewsRepo> = repositories.clone();
    let news_writer: Arc<dyn NewsWriteRepo> = repositories.clone();
    let access_repo: Arc<dyn AccessKeysRepo> = repositories.clone();
    let images: Arc<dyn ImageStore> = Arc::new(storage);

    let news = NewsService::new(
        news_reader,
        news_writer,
        images,
        UploadPolicy::new(settings.uploads.max_image_bytes),
    );

    let upload_limit_bytes = usize::try_from(settings.uploads.max_request_bytes.get())
        .map_err(|_| AppError::from(InfraError::configuration("upload limit exceeds usize")))?;

    let state = HttpState {
        news: Arc::new(news),
        access: Arc::new(AccessKeyService::new(access_repo)),
        site: Arc::new(settings.site.clone()),
        upload_limit_bytes,
    };

    let router = http::build_router(state);
    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "newsdesk::http",
        addr = %settings.server.addr,
        uploads = %settings.uploads.directory.display(),
        "listening"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

async fn run_keys(settings: Settings, args: KeysArgs) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let repo: Arc<dyn AccessKeysRepo> = repositories;
    let service = AccessKeyService::new(repo);

    match args.command {
        KeysCommand::Issue(issue) => {
            let issued = service
                .issue(&issue.name, issue.role)
                .await
                .map_err(access_key_error)?;
            println!("prefix: {}", issued.record.prefix);
            println!("role:   {}", issued.record.role);
            println!("token:  {}", issued.token);
            println!("Store this token now; it cannot be shown again.");
        }
        KeysCommand::Revoke(revoke) => {
            service
                .revoke(revoke.prefix.trim())
                .await
                .map_err(access_key_error)?;
            println!("revoked {}", revoke.prefix.trim());
        }
    }

    Ok(())
}

fn access_key_error(err: AccessKeyError) -> AppError {
    match err {
        AccessKeyError::NotFound => AppError::NotFound,
        AccessKeyError::InvalidName => AppError::validation(err.to_string()),
        AccessKeyError::Repo(repo) => AppError::from(InfraError::database(repo.to_string())),
    }
}

async fn init_repositories(settings: &Settings) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::migration(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!(target = "newsdesk::http", "shutdown signal received");
}
