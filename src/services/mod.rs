pub mod auth_services;
pub mod media_storage;
pub mod page_cache;
pub mod pagination;
pub mod seed_loader;
