pub mod listing_service;
pub mod notification_service;
pub mod registry_service;
pub mod resume_validator;
pub mod workflow_service;
