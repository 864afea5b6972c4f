//! Compilation of comma-separated pattern lists.

use regex::Regex;

use crate::error::StartupError;

/// An ordered list of independently compiled path patterns.
#[derive(Debug, Clone, Default)]
pub struct PatternList {
    patterns: Vec<Regex>,
}

impl PatternList {
    /// Compile a policy string such as `"^/api/.*/exec,^/api/.*/attach"`.
    ///
    /// An empty string yields an empty list, which matches nothing. Each
    /// comma-separated part is compiled on its own; the first part that
    /// fails to compile aborts the whole list.
    pub fn parse(spec: &str) -> Result<Self, StartupError> {
        if spec.is_empty() {
            return Ok(Self::default());
        }

        let patterns = spec
            .split(',')
            .map(|part| {
                Regex::new(part).map_err(|source| StartupError::Pattern {
                    pattern: part.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }

    /// Returns true if at least one pattern matches somewhere in `text`.
    pub fn matches(&self, text: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(text))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Source text of each pattern, in order.
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|re| re.as_str())
    }
}
