pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use error::*;
pub use handlers::ConnectionCellState;
pub use models::*;
pub use router::connection_routes;
pub use services::*;
