pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod storage;
pub mod utils;

use crate::services::{
    listing_service::ListingService, notification_service::NotificationService,
    registry_service::RegistryService, workflow_service::WorkflowService,
};
use crate::storage::Storage;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub storage: Storage,
    pub registry: RegistryService,
    pub workflow: WorkflowService,
    pub listing: ListingService,
    pub notifications: NotificationService,
}

impl AppState {
    pub fn new(pool: PgPool) -> error::Result<Self> {
        let config = crate::config::get_config();

        let storage = Storage::from_config(config)?;
        let notifications =
            NotificationService::new(pool.clone(), config.notification_webhook_url.clone());
        let registry = RegistryService::new(
            pool.clone(),
            storage.clone(),
            notifications.clone(),
            config.max_resume_bytes,
        );
        let workflow = WorkflowService::new(pool.clone(), notifications.clone());
        let listing = ListingService::new(pool.clone());

        Ok(Self {
            pool,
            storage,
            registry,
            workflow,
            listing,
            notifications,
        })
    }
}
