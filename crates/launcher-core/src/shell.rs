//! POSIX shell quoting for the few places we build shell text.

/// Quote `word` so a POSIX shell reads it back as one literal word.
pub fn quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./:=@%+,".contains(c));
    if plain {
        return word.to_string();
    }
    format!("'{}'", word.replace('\'', r"'\''"))
}

/// Quote every word and join with spaces.
pub fn join<'a, I>(words: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    words.into_iter().map(quote).collect::<Vec<_>>().join(" ")
}
