pub mod document;

pub use document::{DocumentStoreClient, StoreError};
