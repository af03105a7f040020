//! Domain core of the visa CMS: a document store abstraction, the
//! ordered-child collections that hang off each visa form, and the
//! services the HTTP layer calls.

pub mod blog;
pub mod collection;
pub mod document;
pub mod error;
pub mod events;
pub mod form;
pub mod office;
pub mod store;

#[cfg(test)]
mod testing;

pub use error::{CoreError, CoreResult};
