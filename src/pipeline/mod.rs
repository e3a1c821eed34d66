//! Incident triage pipeline.
//!
//! Every submitted report flows through:
//! 1. `normalizer::normalize()`: timestamp and structure raw fields
//! 2. `Classifier::classify()`: inference, repaired by `validator` and `rules`
//! 3. `routing::decide()`: community push, plus authority email when warranted
//! 4. `AuthorityResolver::resolve()`: which departments to notify
//! 5. `SuggestionGenerator::suggest()`: safety advice for people nearby
//!
//! **A run never fails.** Inference errors degrade to keyword rules and fixed
//! catalogs; faults below a stage degrade to a minimal safe record.

pub mod authority;
pub mod classifier;
pub mod feedback;
pub mod matching;
pub mod normalizer;
pub mod processor;
pub mod routing;
pub mod rules;
pub mod suggestions;
pub mod types;
pub mod validator;

pub use processor::TriagePipeline;
