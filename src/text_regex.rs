use std::borrow::Cow;
use std::fmt;

#[derive(Debug, Clone)]
pub(crate) struct Regex {
    backend: fancy_regex::Regex,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RegexError(pub(crate) String);

impl fmt::Display for RegexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "regex error: {}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Match {
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) text: String,
}

#[derive(Debug, Clone)]
pub(crate) struct Captures {
    groups: Vec<Option<Match>>,
}

impl Captures {
    pub(crate) fn get(&self, index: usize) -> Option<&Match> {
        self.groups.get(index).and_then(|group| group.as_ref())
    }
}

impl Regex {
    pub(crate) fn new(pattern: &str) -> Result<Self, RegexError> {
        let backend = fancy_regex::Regex::new(pattern)
            .map_err(|error| RegexError(error.to_string()))?;
        Ok(Self { backend })
    }

    /// First match with capture groups. Patterns compiled here are
    /// crate-authored literals, so backend evaluation errors collapse
    /// into "no match".
    pub(crate) fn captures(&self, text: &str) -> Option<Captures> {
        let captures = self.backend.captures(text).ok().flatten()?;
        let groups = (0..captures.len())
            .map(|index| {
                captures.get(index).map(|group| Match {
                    start: group.start(),
                    end: group.end(),
                    text: group.as_str().to_string(),
                })
            })
            .collect();
        Some(Captures { groups })
    }

    /// All non-overlapping matches in order.
    pub(crate) fn find_all(&self, text: &str) -> Vec<Match> {
        self.backend
            .find_iter(text)
            .filter_map(|group| group.ok())
            .map(|group| Match {
                start: group.start(),
                end: group.end(),
                text: group.as_str().to_string(),
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RegexBuilder {
    pattern: String,
    case_insensitive: bool,
}

impl RegexBuilder {
    pub(crate) fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            case_insensitive: false,
        }
    }

    pub(crate) fn case_insensitive(mut self, value: bool) -> Self {
        self.case_insensitive = value;
        self
    }

    pub(crate) fn build(self) -> Result<Regex, RegexError> {
        let backend = fancy_regex::RegexBuilder::new(&self.pattern)
            .case_insensitive(self.case_insensitive)
            .build()
            .map_err(|error| RegexError(error.to_string()))?;
        Ok(Regex { backend })
    }
}

/// Escapes text for literal use inside a pattern.
pub(crate) fn escape(text: &str) -> Cow<'_, str> {
    if !text.chars().any(needs_escape) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        if needs_escape(ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    Cow::Owned(out)
}

fn needs_escape(ch: char) -> bool {
    matches!(
        ch,
        '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$'
    )
}
