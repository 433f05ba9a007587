/// Points for an accepted word: one and a half points per letter, rounded down,
/// never less than one.
pub fn word_score(word: &str) -> u32 {
    let len = word.chars().count() as u32;
    (len * 3 / 2).max(1)
}

/// Sum of [`word_score`] over `words`.
pub fn total_score<'a, I>(words: I) -> u32
where
    I: IntoIterator<Item = &'a str>,
{
    words.into_iter().map(word_score).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_score_examples() {
        assert_eq!(word_score("cat"), 4);
        assert_eq!(word_score("ab"), 3);
        assert_eq!(word_score("a"), 1);
        assert_eq!(word_score(""), 1);
        assert_eq!(word_score("treat"), 7);
        assert_eq!(word_score("lettora"), 10);
    }

    #[test]
    fn test_word_score_monotonic() {
        let mut previous = 0;
        for len in 0..40 {
            let word = "x".repeat(len);
            let score = word_score(&word);
            assert!(score >= 1);
            assert!(score >= previous, "score dropped at length {len}");
            previous = score;
        }
    }

    #[test]
    fn test_word_score_counts_chars_not_bytes() {
        assert_eq!(word_score("café"), 6);
    }

    #[test]
    fn test_total_score() {
        assert_eq!(total_score(["cat", "treat"]), 11);
        assert_eq!(total_score(Vec::<&str>::new()), 0);
    }
}
