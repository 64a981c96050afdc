//! # Student Registration Backend
//!
//! HTTP backend for the student registration form and its admin dashboard.
//!
//! ## Layers
//!
//! - **domain** - form state machine, validators, submission, list queries
//! - **storage** - SQLite record store and the local profile image store
//! - **io** - axum handlers and DTO mappers
//!
//! Applicants walk a three-step form held server-side per session; the last
//! step uploads the profile image and inserts the record. Admins log in with
//! a bearer token and browse the submitted records with search, filters and
//! pagination.

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use anyhow::{Context, Result};
use axum::{
    http::{HeaderValue, Method},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::info;

use crate::config::AppConfig;
use crate::domain::{AdminService, RecordAssembler, RegistrationService};
use crate::storage::{BlobStorage, DbConnection, LocalBlobStore, StudentRepository, StudentStorage};

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub registration_service: RegistrationService,
    pub admin_service: AdminService,
}

impl AppState {
    /// Wire the services over the given storage backends
    pub fn new(
        config: &AppConfig,
        students: Arc<dyn StudentStorage>,
        blobs: Arc<dyn BlobStorage>,
    ) -> Self {
        let assembler = RecordAssembler::new(students.clone(), blobs);
        Self {
            registration_service: RegistrationService::new(assembler, config.form_idle_timeout()),
            admin_service: AdminService::new(config.admin.clone(), students),
        }
    }
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: &AppConfig) -> Result<AppState> {
    info!("Setting up database at {}", config.database_url);
    let db_conn = DbConnection::new(&config.database_url).await?;

    info!("Storing uploads in {}", config.upload_dir.display());
    let students: Arc<dyn StudentStorage> = Arc::new(StudentRepository::new(db_conn));
    let blobs: Arc<dyn BlobStorage> = Arc::new(LocalBlobStore::new(
        &config.upload_dir,
        config.public_base_url.clone(),
    ));

    info!("Setting up application state");
    Ok(AppState::new(config, students, blobs))
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, config: &AppConfig) -> Result<Router> {
    let origin = config
        .allowed_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid allowed origin '{}'", config.allowed_origin))?;

    // CORS setup to allow the frontend to make requests
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers(Any);

    let api_routes = Router::new()
        .nest("/registrations", io::rest::registration_apis::router())
        .nest("/admin", io::rest::admin_apis::router())
        .merge(io::rest::logging_apis::router());

    Ok(Router::new()
        .nest("/api", api_routes)
        .nest_service("/uploads", ServeDir::new(&config.upload_dir))
        .layer(cors)
        .with_state(app_state))
}
