//! Child collections shown on a form's landing page.

use serde::{Deserialize, Serialize};

use crate::collection::entity::{default_true, ChildMeta, Entity, OrderedChild};
use crate::document::validate::require_text;
use crate::document::ValidationError;

/// A supporting document an applicant must provide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRequirement {
    #[serde(flatten)]
    pub meta: ChildMeta,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Faq {
    #[serde(flatten)]
    pub meta: ChildMeta,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

/// A block of landing-page copy. Sections sharing a `sectionKey` render together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSection {
    #[serde(flatten)]
    pub meta: ChildMeta,
    #[serde(default)]
    pub section_key: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingPlan {
    #[serde(flatten)]
    pub meta: ChildMeta,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub is_popular: bool,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl Entity for DocumentRequirement {
    const COLLECTION: &'static str = "documents";
    const NAME: &'static str = "Document";

    fn validate(&self) -> Result<(), ValidationError> {
        require_text(&[("title", &self.title)])
    }
}

impl Entity for Faq {
    const COLLECTION: &'static str = "faqs";
    const NAME: &'static str = "FAQ";

    fn validate(&self) -> Result<(), ValidationError> {
        require_text(&[("question", &self.question), ("answer", &self.answer)])
    }
}

impl Entity for ContentSection {
    const COLLECTION: &'static str = "content_sections";
    const NAME: &'static str = "Content section";

    fn validate(&self) -> Result<(), ValidationError> {
        require_text(&[
            ("sectionKey", &self.section_key),
            ("title", &self.title),
            ("content", &self.content),
        ])
    }
}

impl Entity for PricingPlan {
    const COLLECTION: &'static str = "pricing_plans";
    const NAME: &'static str = "Pricing plan";

    fn validate(&self) -> Result<(), ValidationError> {
        require_text(&[("name", &self.name)])?;
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(ValidationError::invalid("price", "must be a non-negative number"));
        }
        Ok(())
    }
}

impl OrderedChild for DocumentRequirement {
    fn meta(&self) -> &ChildMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ChildMeta {
        &mut self.meta
    }
}

impl OrderedChild for Faq {
    fn meta(&self) -> &ChildMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ChildMeta {
        &mut self.meta
    }
}

impl OrderedChild for ContentSection {
    fn meta(&self) -> &ChildMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ChildMeta {
        &mut self.meta
    }
}

impl OrderedChild for PricingPlan {
    fn meta(&self) -> &ChildMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ChildMeta {
        &mut self.meta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::payload::decode;
    use crate::testing::object;
    use serde_json::json;

    #[test]
    fn faq_requires_question_and_answer() {
        let err = decode::<Faq>(object(json!({ "formId": "f", "order": 0, "question": "Q" })))
            .unwrap_err();
        assert_eq!(err, ValidationError::Required(vec!["answer"]));
    }

    #[test]
    fn document_requirement_defaults_to_required() {
        let doc: DocumentRequirement =
            decode(object(json!({ "formId": "f", "order": 0, "title": "Passport" }))).unwrap();
        assert!(doc.required);
        assert!(doc.meta.is_active);
    }

    #[test]
    fn content_section_serializes_section_key() {
        let section: ContentSection = decode(object(json!({
            "formId": "f", "order": 1, "sectionKey": "hero", "title": "Hello", "content": "Welcome"
        })))
        .unwrap();
        assert_eq!(serde_json::to_value(&section).unwrap()["sectionKey"], "hero");
    }

    #[test]
    fn content_section_requires_title() {
        let err = decode::<ContentSection>(object(json!({
            "formId": "f", "order": 0, "sectionKey": "hero", "content": "Welcome"
        })))
        .unwrap_err();
        assert_eq!(err, ValidationError::Required(vec!["title"]));
    }

    #[test]
    fn pricing_plan_checks_price() {
        assert!(decode::<PricingPlan>(object(json!({ "formId": "f", "order": 0, "name": "Basic" }))).is_err());
        assert!(decode::<PricingPlan>(object(json!({
            "formId": "f", "order": 0, "name": "Basic", "price": -1
        })))
        .is_err());

        let plan: PricingPlan = decode(object(json!({
            "formId": "f", "order": 0, "name": "Basic", "price": 99
        })))
        .unwrap();
        assert_eq!(plan.currency, "USD");
        assert_eq!(plan.price, 99.0);
    }
}
