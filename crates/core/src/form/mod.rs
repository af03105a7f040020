pub mod aggregate;
pub mod children;
pub mod model;
pub mod service;

pub use aggregate::FormAggregate;
pub use children::{ContentSection, DocumentRequirement, Faq, PricingPlan};
pub use model::{FieldType, Form, FormField, FormSummary};
pub use service::{FormService, FormWithFields};
