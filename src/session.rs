//! Session data and the state machine driving it.
//!
//! A [`Game`] owns exactly one [`Session`] at a time and moves it through
//! `Idle -> Running -> Ended`. Hosts call [`Game::tick`] once per second and
//! feed player input through [`Game::submit`], or through the split
//! [`Game::begin_submission`] / [`Game::complete_submission`] pair when the
//! dictionary lookup runs elsewhere and ticks may land while it is in flight.
//! Every transition is reported as a [`SessionEvent`] on the game's channel.

use crate::high_score::HighScoreStore;
use crate::letters::{daily_letters, DailyLetters};
use crate::scoring::{total_score, word_score};
use crate::validator::{normalize, ValidationResult, WordValidator};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::mpsc::Sender;
use tracing::{debug, info, warn};

pub const DEFAULT_SESSION_SECS: u32 = 90;
pub const DEFAULT_WARNING_SECS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub session_secs: u32,
    /// The deadline warning is raised once this many seconds or fewer remain.
    pub warning_secs: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_secs: DEFAULT_SESSION_SECS,
            warning_secs: DEFAULT_WARNING_SECS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    Idle,
    Running,
    Ended,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedWord {
    pub word: String,
    pub points: u32,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub letters: DailyLetters,
    pub time_remaining: u32,
    pub phase: Phase,
    pub score: u32,
    /// Accepted words in submission order
    pub words: Vec<AcceptedWord>,
    pub warning: bool,
    pub new_high_score: bool,
}

impl Session {
    fn new(letters: DailyLetters, session_secs: u32) -> Self {
        Self {
            letters,
            time_remaining: session_secs,
            phase: Phase::Idle,
            score: 0,
            words: Vec::new(),
            warning: false,
            new_high_score: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    pub fn has_word(&self, word: &str) -> bool {
        self.words.iter().any(|w| w.word == word)
    }

    pub fn used_words(&self) -> HashSet<String> {
        self.words.iter().map(|w| w.word.clone()).collect()
    }

    fn accept(&mut self, word: String) -> u32 {
        let points = word_score(&word);
        self.words.push(AcceptedWord { word, points });
        self.score += points;
        debug_assert_eq!(
            self.score,
            total_score(self.words.iter().map(|w| w.word.as_str()))
        );
        points
    }
}

/// Notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Started {
        letters: DailyLetters,
        time_remaining: u32,
    },
    Tick {
        time_remaining: u32,
        warning: bool,
    },
    WordAccepted {
        word: String,
        points: u32,
    },
    WordRejected {
        word: String,
        result: ValidationResult,
    },
    SessionFinished {
        final_score: u32,
    },
    NewHighScore {
        score: u32,
    },
}

/// A submission that passed the local pre-check and awaits validation.
/// Only meaningful for the session it was issued under.
#[derive(Debug, Clone)]
pub struct PendingSubmission {
    word: String,
    letters: DailyLetters,
    used: HashSet<String>,
    epoch: u64,
}

impl PendingSubmission {
    pub fn word(&self) -> &str {
        &self.word
    }

    pub async fn validate(&self, validator: &WordValidator) -> ValidationResult {
        validator
            .validate(&self.word, self.letters, &self.used)
            .await
    }
}

#[derive(Debug, Clone)]
pub enum Submission {
    /// The session is not running
    Ignored,
    Rejected(ValidationResult),
    Pending(PendingSubmission),
}

#[derive(Debug, Clone, Copy)]
enum LetterSource {
    Daily,
    Fixed(DailyLetters),
}

impl LetterSource {
    fn resolve(self) -> DailyLetters {
        match self {
            LetterSource::Daily => daily_letters(Utc::now()),
            LetterSource::Fixed(letters) => letters,
        }
    }
}

pub struct Game {
    session: Session,
    config: SessionConfig,
    letter_source: LetterSource,
    store: Box<dyn HighScoreStore>,
    events: Sender<SessionEvent>,
    epoch: u64,
}

impl Game {
    pub fn new(
        config: SessionConfig,
        store: Box<dyn HighScoreStore>,
        events: Sender<SessionEvent>,
    ) -> Self {
        let letter_source = LetterSource::Daily;
        Self {
            session: Session::new(letter_source.resolve(), config.session_secs),
            config,
            letter_source,
            store,
            events,
            epoch: 0,
        }
    }

    /// Play with fixed letters instead of the day's.
    pub fn with_letters(mut self, letters: DailyLetters) -> Self {
        self.letter_source = LetterSource::Fixed(letters);
        self.session.letters = letters;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn phase(&self) -> Phase {
        self.session.phase
    }

    pub fn is_running(&self) -> bool {
        self.session.is_running()
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    pub fn high_score(&self) -> u32 {
        self.store.load()
    }

    pub fn high_score_store(&self) -> &dyn HighScoreStore {
        self.store.as_ref()
    }

    /// Begin a fresh session. Has no effect while one is already running.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            debug!("start ignored, session already running");
            return false;
        }

        let letters = self.letter_source.resolve();
        self.epoch += 1;
        self.session = Session::new(letters, self.config.session_secs);
        self.session.phase = Phase::Running;
        self.session.warning = self.session.time_remaining <= self.config.warning_secs;
        info!(%letters, epoch = self.epoch, "session started");

        self.emit(SessionEvent::Started {
            letters,
            time_remaining: self.session.time_remaining,
        });
        true
    }

    /// Advance the clock by one second.
    pub fn tick(&mut self) {
        if !self.is_running() {
            return;
        }

        let session = &mut self.session;
        session.time_remaining = session.time_remaining.saturating_sub(1);
        if session.time_remaining <= self.config.warning_secs {
            session.warning = true;
        }
        let (time_remaining, warning) = (session.time_remaining, session.warning);

        self.emit(SessionEvent::Tick {
            time_remaining,
            warning,
        });

        if time_remaining == 0 {
            self.finish();
        }
    }

    /// Stop a running session now, regardless of the time left.
    pub fn end(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        debug!(time_remaining = self.session.time_remaining, "session ended early");
        self.finish();
        true
    }

    /// Normalize input and run the local duplicate check. Anything that
    /// survives must be validated and handed back to [`Game::complete_submission`].
    pub fn begin_submission(&mut self, raw: &str) -> Submission {
        if !self.is_running() {
            debug!("submission ignored, session not running");
            return Submission::Ignored;
        }

        let word = normalize(raw);
        if self.session.has_word(&word) {
            let result = ValidationResult::RejectedDuplicate;
            self.emit(SessionEvent::WordRejected { word, result });
            return Submission::Rejected(result);
        }

        Submission::Pending(PendingSubmission {
            letters: self.session.letters,
            used: self.session.used_words(),
            word,
            epoch: self.epoch,
        })
    }

    /// Apply a validation result. Returns `None` when the session it belonged
    /// to is no longer running, in which case the result is dropped.
    pub fn complete_submission(
        &mut self,
        pending: PendingSubmission,
        result: ValidationResult,
    ) -> Option<ValidationResult> {
        if !self.is_running() || pending.epoch != self.epoch {
            debug!(word = %pending.word, ?result, "discarding stale validation result");
            return None;
        }

        // another in-flight submission may have claimed the word meanwhile
        let result = if result.is_accepted() && self.session.has_word(&pending.word) {
            ValidationResult::RejectedDuplicate
        } else {
            result
        };

        if result.is_accepted() {
            let word = pending.word;
            let points = self.session.accept(word.clone());
            debug!(%word, points, score = self.session.score, "word accepted");
            self.emit(SessionEvent::WordAccepted { word, points });
        } else {
            debug!(word = %pending.word, %result, "word rejected");
            self.emit(SessionEvent::WordRejected {
                word: pending.word,
                result,
            });
        }
        Some(result)
    }

    /// Submit and validate in one step. Returns `None` if the session was not
    /// running when the input arrived.
    pub async fn submit(
        &mut self,
        raw: &str,
        validator: &WordValidator,
    ) -> Option<ValidationResult> {
        match self.begin_submission(raw) {
            Submission::Ignored => None,
            Submission::Rejected(result) => Some(result),
            Submission::Pending(pending) => {
                let result = pending.validate(validator).await;
                self.complete_submission(pending, result)
            }
        }
    }

    fn finish(&mut self) {
        self.session.phase = Phase::Ended;
        let final_score = self.session.score;
        let best = self.store.load();
        info!(final_score, best, words = self.session.words.len(), "session finished");

        self.emit(SessionEvent::SessionFinished { final_score });

        if final_score > best {
            if let Err(e) = self.store.save(final_score) {
                warn!(error = %e, "unable to persist high score");
            }
            self.session.new_high_score = true;
            self.emit(SessionEvent::NewHighScore { score: final_score });
        }
    }

    fn emit(&self, event: SessionEvent) {
        // the presentation side may have gone away; the core carries on
        let _ = self.events.send(event);
    }
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("session", &self.session)
            .field("config", &self.config)
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::{DictionaryLookup, LookupError, StaticDictionary, Suggestion};
    use crate::high_score::MemoryHighScoreStore;
    use crate::lexicon::Lexicon;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::mpsc::{self, Receiver};
    use std::sync::Arc;

    fn game_with(store: MemoryHighScoreStore) -> (Game, Receiver<SessionEvent>) {
        let (tx, rx) = mpsc::channel();
        let game = Game::new(SessionConfig::default(), Box::new(store), tx)
            .with_letters(DailyLetters::new('A', 'T').unwrap());
        (game, rx)
    }

    fn validator() -> WordValidator {
        let words = ["cat", "tea", "treat", "oat", "eat", "tart"];
        WordValidator::new(
            Arc::new(Lexicon::from_words(words)),
            Arc::new(StaticDictionary::new(words)),
        )
    }

    /// Fails the first lookup, then answers like a `StaticDictionary`.
    struct FlakyDictionary {
        failed: AtomicBool,
        inner: StaticDictionary,
    }

    #[async_trait]
    impl DictionaryLookup for FlakyDictionary {
        async fn lookup(
            &self,
            spelling: &str,
            max_results: usize,
        ) -> Result<Vec<Suggestion>, LookupError> {
            if !self.failed.swap(true, Ordering::SeqCst) {
                return Err(LookupError::Unavailable("connection reset".into()));
            }
            self.inner.lookup(spelling, max_results).await
        }
    }

    fn drain(rx: &Receiver<SessionEvent>) -> Vec<SessionEvent> {
        rx.try_iter().collect()
    }

    #[test]
    fn test_new_game_is_idle() {
        let (game, rx) = game_with(MemoryHighScoreStore::default());

        assert_eq!(game.phase(), Phase::Idle);
        assert_eq!(game.session().time_remaining, 90);
        assert_eq!(game.session().letters, DailyLetters::new('A', 'T').unwrap());
        assert!(drain(&rx).is_empty());
    }

    #[test]
    fn test_start_emits_started() {
        let (mut game, rx) = game_with(MemoryHighScoreStore::default());

        assert!(game.start());
        assert!(game.is_running());
        assert_eq!(
            drain(&rx),
            vec![SessionEvent::Started {
                letters: DailyLetters::new('A', 'T').unwrap(),
                time_remaining: 90
            }]
        );

        // no restart while running
        assert!(!game.start());
        assert!(drain(&rx).is_empty());
    }

    #[test]
    fn test_tick_ignored_when_idle() {
        let (mut game, rx) = game_with(MemoryHighScoreStore::default());
        game.tick();
        assert_eq!(game.session().time_remaining, 90);
        assert!(drain(&rx).is_empty());
    }

    #[test]
    fn test_warning_raised_at_threshold() {
        let (mut game, _rx) = game_with(MemoryHighScoreStore::default());
        game.start();

        for _ in 0..79 {
            game.tick();
        }
        assert_eq!(game.session().time_remaining, 11);
        assert!(!game.session().warning);

        game.tick();
        assert_eq!(game.session().time_remaining, 10);
        assert!(game.session().warning);
    }

    #[test]
    fn test_ninety_ticks_end_session_once() {
        let (mut game, rx) = game_with(MemoryHighScoreStore::default());
        game.start();
        drain(&rx);

        for _ in 0..90 {
            game.tick();
        }
        assert_eq!(game.phase(), Phase::Ended);
        assert_eq!(game.session().time_remaining, 0);

        // further ticks are no-ops
        game.tick();
        game.tick();

        let events = drain(&rx);
        let ticks = events
            .iter()
            .filter(|e| matches!(e, SessionEvent::Tick { .. }))
            .count();
        let finished = events
            .iter()
            .filter(|e| matches!(e, SessionEvent::SessionFinished { .. }))
            .count();
        assert_eq!(ticks, 90);
        assert_eq!(finished, 1);
        assert_eq!(
            events.last(),
            Some(&SessionEvent::SessionFinished { final_score: 0 })
        );
    }

    #[tokio::test]
    async fn test_submit_accepts_and_scores() {
        let (mut game, rx) = game_with(MemoryHighScoreStore::default());
        let v = validator();
        game.start();
        drain(&rx);

        let result = game.submit("  CAT ", &v).await;
        assert_eq!(result, Some(ValidationResult::Accepted));
        assert_eq!(game.session().score, 4);
        assert_eq!(
            drain(&rx),
            vec![SessionEvent::WordAccepted {
                word: "cat".into(),
                points: 4
            }]
        );
    }

    #[tokio::test]
    async fn test_duplicate_precheck() {
        let (mut game, rx) = game_with(MemoryHighScoreStore::default());
        let v = validator();
        game.start();
        game.submit("cat", &v).await;
        drain(&rx);

        let result = game.submit("Cat", &v).await;
        assert_eq!(result, Some(ValidationResult::RejectedDuplicate));
        assert_eq!(game.session().score, 4);
        assert_eq!(
            drain(&rx),
            vec![SessionEvent::WordRejected {
                word: "cat".into(),
                result: ValidationResult::RejectedDuplicate
            }]
        );
    }

    #[tokio::test]
    async fn test_submit_when_idle_is_noop() {
        let (mut game, rx) = game_with(MemoryHighScoreStore::default());
        assert_eq!(game.submit("cat", &validator()).await, None);
        assert!(game.session().words.is_empty());
        assert!(drain(&rx).is_empty());
    }

    #[tokio::test]
    async fn test_rejection_leaves_state_unchanged() {
        let (mut game, _rx) = game_with(MemoryHighScoreStore::default());
        let v = validator();
        game.start();

        assert_eq!(
            game.submit("dog", &v).await,
            Some(ValidationResult::RejectedMissingLetters)
        );
        assert_eq!(
            game.submit("taco", &v).await,
            Some(ValidationResult::RejectedNotInLexicon)
        );
        assert!(game.is_running());
        assert_eq!(game.session().score, 0);
        assert!(game.session().words.is_empty());
    }

    #[tokio::test]
    async fn test_lookup_failure_keeps_session_usable() {
        let (mut game, rx) = game_with(MemoryHighScoreStore::default());
        let words = ["cat", "tea"];
        let v = WordValidator::new(
            Arc::new(Lexicon::from_words(words)),
            Arc::new(FlakyDictionary {
                failed: AtomicBool::new(false),
                inner: StaticDictionary::new(words),
            }),
        );
        game.start();
        drain(&rx);

        assert_eq!(
            game.submit("cat", &v).await,
            Some(ValidationResult::RejectedLookupFailed)
        );
        assert_eq!(
            drain(&rx),
            vec![SessionEvent::WordRejected {
                word: "cat".into(),
                result: ValidationResult::RejectedLookupFailed
            }]
        );
        assert!(game.is_running());
        assert_eq!(game.session().score, 0);
        assert!(game.session().words.is_empty());

        // a failed lookup does not mark the word as used
        assert_eq!(game.submit("cat", &v).await, Some(ValidationResult::Accepted));
        assert_eq!(game.submit("tea", &v).await, Some(ValidationResult::Accepted));
        assert_eq!(game.session().score, 8);
        assert!(game.is_running());
    }

    #[test]
    fn test_result_after_end_is_discarded() {
        let (mut game, rx) = game_with(MemoryHighScoreStore::default());
        game.start();

        let pending = match game.begin_submission("cat") {
            Submission::Pending(p) => p,
            other => panic!("expected pending submission, got {other:?}"),
        };
        game.end();
        drain(&rx);

        assert_eq!(
            game.complete_submission(pending, ValidationResult::Accepted),
            None
        );
        assert_eq!(game.session().score, 0);
        assert!(drain(&rx).is_empty());
    }

    #[test]
    fn test_result_from_previous_session_is_discarded() {
        let (mut game, _rx) = game_with(MemoryHighScoreStore::default());
        game.start();
        let Submission::Pending(pending) = game.begin_submission("cat") else {
            panic!("expected pending submission");
        };
        game.end();
        game.start();

        assert_eq!(
            game.complete_submission(pending, ValidationResult::Accepted),
            None
        );
        assert!(game.session().words.is_empty());
    }

    #[test]
    fn test_tick_during_lookup_does_not_disturb_words() {
        let (mut game, _rx) = game_with(MemoryHighScoreStore::default());
        game.start();
        let Submission::Pending(pending) = game.begin_submission("cat") else {
            panic!("expected pending submission");
        };

        game.tick();
        game.tick();

        assert_eq!(
            game.complete_submission(pending, ValidationResult::Accepted),
            Some(ValidationResult::Accepted)
        );
        assert_eq!(game.session().time_remaining, 88);
        assert_eq!(game.session().score, 4);
    }

    #[test]
    fn test_concurrent_duplicates_accept_once() {
        let (mut game, _rx) = game_with(MemoryHighScoreStore::default());
        game.start();
        let Submission::Pending(first) = game.begin_submission("cat") else {
            panic!("expected pending submission");
        };
        let Submission::Pending(second) = game.begin_submission("cat") else {
            panic!("expected pending submission");
        };

        assert_eq!(
            game.complete_submission(first, ValidationResult::Accepted),
            Some(ValidationResult::Accepted)
        );
        assert_eq!(
            game.complete_submission(second, ValidationResult::Accepted),
            Some(ValidationResult::RejectedDuplicate)
        );
        assert_eq!(game.session().words.len(), 1);
        assert_eq!(game.session().score, 4);
    }

    #[tokio::test]
    async fn test_forced_end_updates_high_score() {
        let (mut game, rx) = game_with(MemoryHighScoreStore::with_score(3));
        let v = validator();
        game.start();
        game.submit("treat", &v).await;
        drain(&rx);

        assert!(game.end());
        assert!(!game.end());
        assert_eq!(
            drain(&rx),
            vec![
                SessionEvent::SessionFinished { final_score: 7 },
                SessionEvent::NewHighScore { score: 7 },
            ]
        );
        assert_eq!(game.high_score(), 7);
        assert!(game.session().new_high_score);
    }

    #[tokio::test]
    async fn test_high_score_needs_strictly_greater() {
        let (mut game, rx) = game_with(MemoryHighScoreStore::with_score(4));
        game.start();
        game.submit("cat", &validator()).await;
        drain(&rx);

        game.end();
        assert_eq!(
            drain(&rx),
            vec![SessionEvent::SessionFinished { final_score: 4 }]
        );
        assert_eq!(game.high_score(), 4);
        assert!(!game.session().new_high_score);
    }

    #[tokio::test]
    async fn test_restart_resets_session() {
        let (mut game, _rx) = game_with(MemoryHighScoreStore::default());
        game.start();
        game.submit("cat", &validator()).await;
        for _ in 0..85 {
            game.tick();
        }
        game.end();

        assert!(game.start());
        let session = game.session();
        assert_eq!(session.score, 0);
        assert!(session.words.is_empty());
        assert_eq!(session.time_remaining, 90);
        assert!(!session.warning);
        assert!(!session.new_high_score);
    }

    #[test]
    fn test_short_session_starts_in_warning() {
        let (tx, _rx) = mpsc::channel();
        let config = SessionConfig {
            session_secs: 5,
            warning_secs: 10,
        };
        let mut game = Game::new(config, Box::new(MemoryHighScoreStore::default()), tx);
        game.start();
        assert!(game.session().warning);

        let (mut game, _rx) = game_with(MemoryHighScoreStore::default());
        game.start();
        assert!(!game.session().warning);
    }

    #[test]
    fn test_custom_session_length() {
        let (tx, rx) = mpsc::channel();
        let config = SessionConfig {
            session_secs: 3,
            warning_secs: 1,
        };
        let mut game = Game::new(config, Box::new(MemoryHighScoreStore::default()), tx);
        game.start();
        game.tick();
        game.tick();
        assert!(game.session().warning);
        game.tick();
        assert_eq!(game.phase(), Phase::Ended);
        assert!(drain(&rx)
            .iter()
            .any(|e| *e == SessionEvent::SessionFinished { final_score: 0 }));
    }

    #[test]
    fn test_dropped_receiver_is_harmless() {
        let (mut game, rx) = game_with(MemoryHighScoreStore::default());
        drop(rx);
        game.start();
        game.tick();
        assert!(game.end());
    }
}
