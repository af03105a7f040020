use serde::{Deserialize, Serialize};

use crate::collection::entity::{default_true, ChildMeta, Entity, OrderedChild};
use crate::document::validate::{require_text, validate_slug};
use crate::document::{DocumentId, Record, ValidationError};

/// A visa application form: the parent every ordered child hangs off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Form {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Entity for Form {
    const COLLECTION: &'static str = "forms";
    const NAME: &'static str = "Form";

    fn validate(&self) -> Result<(), ValidationError> {
        require_text(&[("name", &self.name)])?;
        validate_slug(&self.slug)
    }
}

/// The parent projection joined onto child records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormSummary {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub name: String,
    pub slug: String,
}

impl From<&Record<Form>> for FormSummary {
    fn from(record: &Record<Form>) -> Self {
        FormSummary {
            id: record.id.clone(),
            name: record.body.name.clone(),
            slug: record.body.slug.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Text,
    Email,
    Tel,
    Number,
    Date,
    Select,
    Textarea,
    Checkbox,
    Radio,
    File,
}

impl FieldType {
    pub fn has_choices(self) -> bool {
        matches!(self, FieldType::Select | FieldType::Radio)
    }
}

/// One input on a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    #[serde(flatten)]
    pub meta: ChildMeta,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

impl Entity for FormField {
    const COLLECTION: &'static str = "form_fields";
    const NAME: &'static str = "Form field";

    fn validate(&self) -> Result<(), ValidationError> {
        require_text(&[("label", &self.label), ("name", &self.name)])?;
        if self.field_type.has_choices() && self.options.is_empty() {
            return Err(ValidationError::invalid(
                "options",
                "must list at least one choice for select and radio fields",
            ));
        }
        Ok(())
    }
}

impl OrderedChild for FormField {
    fn meta(&self) -> &ChildMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ChildMeta {
        &mut self.meta
    }
}
