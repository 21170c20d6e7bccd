//! Question corpus, text normalization and matching.

pub mod bank;
pub mod matcher;
pub mod normalize;

pub use bank::{AnswerOption, Question, QuestionBank};
pub use matcher::find_match;
pub use normalize::normalize;
