mod answers;
mod catalog;
mod definition;
mod engine;

pub use answers::{AnswerSet, AnswerValue};
pub use catalog::{CatalogError, QuestionCatalog};
pub use definition::{
    AnswerError, Dependency, NumberFormat, NumericBounds, QuestionDefinition, QuestionKind,
    Section, SelectOption, Unit, VisibilityPredicate,
};
pub use engine::{Advance, QuestionnaireEngine, QuestionnaireSnapshot};
