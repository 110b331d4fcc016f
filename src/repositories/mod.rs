pub mod blog_store;
pub mod memory_store;
pub mod pg_store;
