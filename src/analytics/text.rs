/// Number of whitespace-delimited, non-empty tokens.
#[inline]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
