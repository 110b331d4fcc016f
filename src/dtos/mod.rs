pub mod auth_dtos;
pub mod page_dtos;
pub mod post_dtos;
// alias supaya dapat dipanggil sebagai `crate::dtos::auth` dan `crate::dtos::pages`
pub use auth_dtos as auth;
pub use page_dtos as pages;
