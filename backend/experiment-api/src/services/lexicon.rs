use std::collections::HashSet;
use std::path::Path;

/// Words accepted as Block A guesses, stored upper-case.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    words: HashSet<String>,
}

impl Lexicon {
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut lexicon = Self::default();
        lexicon.extend(words);
        lexicon
    }

    /// One word per line; blank lines and `#` comments are skipped.
    pub fn parse(contents: &str) -> Self {
        Self::from_words(
            contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        )
    }

    pub async fn load(path: &Path) -> std::io::Result<Self> {
        let contents = tokio::fs::read_to_string(path).await?;
        Ok(Self::parse(&contents))
    }

    pub fn extend<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.words
            .extend(words.into_iter().map(|w| w.as_ref().trim().to_ascii_uppercase()));
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(&word.trim().to_ascii_uppercase())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
