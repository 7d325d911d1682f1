//! HTTP interface: router, projections, skin uploads

pub mod routes;
pub mod skins;

pub use routes::build_router;
