pub mod api_routes;
pub mod auth_routes;
pub mod export_routes;
pub mod middleware;
pub mod server;
pub mod settings_routes;
