use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::fmt;
use std::str::FromStr;

/// Offset of the reference timezone used to decide what "today" is.
pub const SEED_OFFSET_HOURS: i64 = -8;

const ALPHABET_LEN: u64 = 26;

/// The two letters every accepted word must contain, stored uppercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DailyLetters([char; 2]);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LettersParseError {
    #[error("expected exactly two letters, got {0}")]
    WrongCount(usize),
    #[error("'{0}' is not an ASCII letter")]
    NotALetter(char),
}

impl DailyLetters {
    pub fn new(first: char, second: char) -> Result<Self, LettersParseError> {
        for c in [first, second] {
            if !c.is_ascii_alphabetic() {
                return Err(LettersParseError::NotALetter(c));
            }
        }
        Ok(Self([first.to_ascii_uppercase(), second.to_ascii_uppercase()]))
    }

    pub fn first(&self) -> char {
        self.0[0]
    }

    pub fn second(&self) -> char {
        self.0[1]
    }

    pub fn as_lowercase(&self) -> [char; 2] {
        [self.0[0].to_ascii_lowercase(), self.0[1].to_ascii_lowercase()]
    }

    /// True when `word` contains each required letter at least once.
    /// Only presence is checked, so identical letters need a single occurrence.
    pub fn is_contained_in(&self, word: &str) -> bool {
        let word = word.to_lowercase();
        self.as_lowercase().iter().all(|c| word.contains(*c))
    }
}

impl fmt::Display for DailyLetters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.0[0], self.0[1])
    }
}

impl FromStr for DailyLetters {
    type Err = LettersParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.trim().chars().filter(|c| !c.is_whitespace()).collect();
        match chars.as_slice() {
            [a, b] => Self::new(*a, *b),
            other => Err(LettersParseError::WrongCount(other.len())),
        }
    }
}

/// Calendar date string ("YYYY-MM-DD") of `now` in the reference offset.
pub fn seed_for(now: DateTime<Utc>) -> String {
    let shifted = now.naive_utc() + Duration::hours(SEED_OFFSET_HOURS);
    shifted.date().format("%Y-%m-%d").to_string()
}

pub fn daily_letters(now: DateTime<Utc>) -> DailyLetters {
    letters_for_seed(&seed_for(now))
}

pub fn letters_for_date(date: NaiveDate) -> DailyLetters {
    letters_for_seed(&date.format("%Y-%m-%d").to_string())
}

/// Rolling hash with multiplier 31 over the UTF-16 code units of `seed`.
///
/// Only the shift is done in 32 bits: the accumulator is truncated to `i32`
/// before `<< 5`, while the subtraction and addition are exact. The result can
/// therefore leave the `i32` range, and the daily letters depend on that.
pub fn seed_hash(seed: &str) -> i64 {
    seed.encode_utf16().fold(0i64, |hash, unit| {
        let shifted = i64::from((hash as i32).wrapping_shl(5));
        i64::from(unit) + shifted - hash
    })
}

fn letters_for_seed(seed: &str) -> DailyLetters {
    let hash = seed_hash(seed);
    let first = letter_at(hash.unsigned_abs());
    let second = letter_at((hash * 2).unsigned_abs());
    DailyLetters([first, second])
}

fn letter_at(n: u64) -> char {
    // n % 26 < 26, so the sum stays within 'A'..='Z'
    char::from(b'A' + (n % ALPHABET_LEN) as u8)
}
