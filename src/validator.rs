use crate::dictionary::DictionaryLookup;
use crate::letters::DailyLetters;
use crate::lexicon::Lexicon;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

pub const MIN_WORD_LEN: usize = 3;

/// Outcome of running a submission through the validation pipeline.
/// `Display` yields the message shown to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum ValidationResult {
    #[strum(to_string = "Word accepted")]
    Accepted,
    #[strum(to_string = "You've already used that word!")]
    RejectedDuplicate,
    #[strum(to_string = "Word does not contain the 2 letters")]
    RejectedMissingLetters,
    #[strum(to_string = "Word must be at least 3 letters long")]
    RejectedTooShort,
    #[strum(to_string = "Word not found in dictionary")]
    RejectedNotInLexicon,
    #[strum(to_string = "Error checking word. Please try again.")]
    RejectedLookupFailed,
}

impl ValidationResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationResult::Accepted)
    }
}

/// Lowercase and trim raw player input.
pub fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Decides whether a normalized word is acceptable. Holds no session state.
#[derive(Clone)]
pub struct WordValidator {
    lexicon: Arc<Lexicon>,
    dictionary: Arc<dyn DictionaryLookup>,
    min_len: usize,
}

impl WordValidator {
    pub fn new(lexicon: Arc<Lexicon>, dictionary: Arc<dyn DictionaryLookup>) -> Self {
        Self {
            lexicon,
            dictionary,
            min_len: MIN_WORD_LEN,
        }
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Checks run in order and the first failure wins: required letters,
    /// length, duplicates, local lexicon, then the remote dictionary.
    pub async fn validate(
        &self,
        word: &str,
        required: DailyLetters,
        already_used: &HashSet<String>,
    ) -> ValidationResult {
        if !required.is_contained_in(word) {
            return ValidationResult::RejectedMissingLetters;
        }
        if word.chars().count() < self.min_len {
            return ValidationResult::RejectedTooShort;
        }
        if already_used.contains(word) {
            return ValidationResult::RejectedDuplicate;
        }
        if !self.lexicon.contains(word) {
            return ValidationResult::RejectedNotInLexicon;
        }

        match self.dictionary.lookup(word, 1).await {
            Ok(suggestions) => match suggestions.first() {
                Some(best) if best.word == word => ValidationResult::Accepted,
                best => {
                    debug!(word, best = ?best.map(|s| &s.word), "dictionary disagrees");
                    ValidationResult::RejectedNotInLexicon
                }
            },
            Err(e) => {
                warn!(word, error = %e, "dictionary lookup failed");
                ValidationResult::RejectedLookupFailed
            }
        }
    }
}

impl std::fmt::Debug for WordValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WordValidator")
            .field("lexicon", &self.lexicon.name())
            .field("min_len", &self.min_len)
            .finish_non_exhaustive()
    }
}
