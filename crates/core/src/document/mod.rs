pub mod id;
pub mod model;
pub mod validate;

pub use id::DocumentId;
pub use model::{Record, StoredDocument};
pub use validate::ValidationError;
