//! Generic collection machinery: typed repositories, payload decoding,
//! pagination, and the ordered-child pattern shared by every form child.

pub mod cascade;
pub mod child;
pub mod entity;
pub mod ordering;
pub mod page;
pub mod payload;
pub mod repository;

pub use cascade::{CascadeCoordinator, CascadeScope};
pub use child::{ChildFilter, ChildService, Populated};
pub use entity::{ChildMeta, Entity, OrderedChild, PARENT_KEY};
pub use page::{PageRequest, Pagination};
pub use payload::Payload;
pub use repository::Repository;
