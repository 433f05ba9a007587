//! Game core for lettora: daily letters, word validation, scoring and the
//! timed session. The terminal front end lives in the binary.
pub mod app_dirs;
pub mod config;
pub mod dictionary;
pub mod effects;
pub mod high_score;
pub mod letters;
pub mod lexicon;
pub mod runtime;
pub mod scoring;
pub mod session;
pub mod validator;

pub use letters::{daily_letters, DailyLetters};
pub use scoring::word_score;
pub use session::{Game, Phase, Session, SessionConfig, SessionEvent, Submission};
pub use validator::{ValidationResult, WordValidator};
