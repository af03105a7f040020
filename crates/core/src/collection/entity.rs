use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::document::{DocumentId, ValidationError};

/// Wire name of the foreign key every ordered child stores.
pub const PARENT_KEY: &str = "formId";

/// A typed document kind living in one store collection.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Store collection name.
    const COLLECTION: &'static str;
    /// Human-readable name used in error messages.
    const NAME: &'static str;

    /// Boundary checks run before any write.
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Fields shared by every child ordered under a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildMeta {
    pub form_id: DocumentId,
    pub order: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// An entity ordered among its siblings under a parent form.
pub trait OrderedChild: Entity {
    fn meta(&self) -> &ChildMeta;
    fn meta_mut(&mut self) -> &mut ChildMeta;
}

pub(crate) fn default_true() -> bool {
    true
}
