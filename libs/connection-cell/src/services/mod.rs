pub mod cache;
pub mod directory;
pub mod gateway;
pub mod lifecycle;
pub mod router;

pub use cache::{IdentityCache, DEFAULT_CACHE_CAPACITY};
pub use directory::{ConnectionDirectory, DocumentConnectionDirectory};
pub use gateway::{DeliveryError, DeliveryGateway, HttpDeliveryGateway};
pub use lifecycle::ConnectionLifecycleService;
pub use router::MessageRouter;
