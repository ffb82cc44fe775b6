//! Callers of remote services that go through the request pipeline.

pub mod careplan;
pub mod spellcheck;

pub use careplan::{
    AboutMePoint, CarePlanAiClient, CarePlanAiError, CarePlanSection, GeneratedSection, PlanSubject,
};
pub use spellcheck::{has_changes, SpellCheckClient, SpellCheckError, SpellCheckResponse, SpellCheckTarget};
