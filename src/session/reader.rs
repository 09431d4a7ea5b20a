use std::str::{Lines, SplitWhitespace};

use crate::error::SessionError;

/// Sequential line source. Blank lines and `#` lines are skipped.
pub(crate) struct LineReader<'a> {
    lines: Lines<'a>,
    line: usize,
}

impl<'a> LineReader<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines(),
            line: 0,
        }
    }

    /// Number of the line most recently returned, counting from 1.
    pub(crate) fn line(&self) -> usize {
        self.line
    }

    /// Next content line, trimmed.
    pub(crate) fn next_line(&mut self, expected: &str) -> Result<&'a str, SessionError> {
        for raw in self.lines.by_ref() {
            self.line += 1;
            let trimmed = raw.trim();
            if !trimmed.is_empty() && !trimmed.starts_with('#') {
                return Ok(trimmed);
            }
        }
        Err(SessionError::UnexpectedEnd {
            line: self.line,
            expected: expected.to_string(),
        })
    }

    /// Next content line, split into tokens.
    pub(crate) fn tokens(&mut self, expected: &str) -> Result<Tokens<'a>, SessionError> {
        let text = self.next_line(expected)?;
        Ok(Tokens {
            iter: text.split_whitespace(),
            line: self.line,
        })
    }

    /// Free text following `key ` on the next content line.
    pub(crate) fn text(&mut self, key: &str) -> Result<&'a str, SessionError> {
        let text = self.next_line(key)?;
        match text.strip_prefix(key) {
            Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => {
                Ok(rest.trim_start())
            }
            _ => Err(self.malformed(format!("expected '{key}' line, found '{text}'"))),
        }
    }

    /// Double-quoted string following `key ` on the next content line.
    ///
    /// Understands the escapes written by [`quote`](super::raw::quote).
    pub(crate) fn quoted(&mut self, key: &str) -> Result<String, SessionError> {
        let rest = self.text(key)?;
        let inner = rest
            .strip_prefix('"')
            .and_then(|r| r.strip_suffix('"'))
            .ok_or_else(|| self.malformed(format!("expected quoted {key}, found '{rest}'")))?;
        let mut out = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some('\\') => out.push('\\'),
                    Some('"') => out.push('"'),
                    Some('n') => out.push('\n'),
                    Some('r') => out.push('\r'),
                    Some('t') => out.push('\t'),
                    other => {
                        let found = other.map_or_else(String::new, String::from);
                        return Err(self.malformed(format!("invalid escape '\\{found}' in {key}")));
                    }
                },
                '"' => return Err(self.malformed(format!("unescaped quote in {key}"))),
                c => out.push(c),
            }
        }
        Ok(out)
    }

    /// Tokens following `key` on the next content line.
    pub(crate) fn keyed(&mut self, key: &str) -> Result<Tokens<'a>, SessionError> {
        let mut tokens = self.tokens(key)?;
        let found = tokens.word(key)?;
        if found != key {
            return Err(tokens.malformed(format!("expected '{key}', found '{found}'")));
        }
        Ok(tokens)
    }

    /// Element count line.
    pub(crate) fn count(&mut self, what: &str) -> Result<usize, SessionError> {
        let mut tokens = self.tokens(what)?;
        let n = tokens.usize(what)?;
        tokens.finish()?;
        Ok(n)
    }

    /// Any content left besides comments and blank lines.
    pub(crate) fn is_exhausted(&self) -> bool {
        self.lines.clone().all(|l| {
            let t = l.trim();
            t.is_empty() || t.starts_with('#')
        })
    }

    pub(crate) fn malformed(&self, message: String) -> SessionError {
        SessionError::Malformed {
            line: self.line,
            message,
        }
    }
}

/// Whitespace-separated fields of one line.
pub(crate) struct Tokens<'a> {
    iter: SplitWhitespace<'a>,
    line: usize,
}

impl<'a> Tokens<'a> {
    pub(crate) fn line(&self) -> usize {
        self.line
    }

    pub(crate) fn malformed(&self, message: String) -> SessionError {
        SessionError::Malformed {
            line: self.line,
            message,
        }
    }

    pub(crate) fn word(&mut self, what: &str) -> Result<&'a str, SessionError> {
        self.iter
            .next()
            .ok_or_else(|| self.malformed(format!("missing {what}")))
    }

    fn parse<T: std::str::FromStr>(&mut self, what: &str) -> Result<T, SessionError> {
        let word = self.word(what)?;
        word.parse()
            .map_err(|_| self.malformed(format!("invalid {what} '{word}'")))
    }

    pub(crate) fn f64(&mut self, what: &str) -> Result<f64, SessionError> {
        self.parse(what)
    }

    pub(crate) fn usize(&mut self, what: &str) -> Result<usize, SessionError> {
        self.parse(what)
    }

    pub(crate) fn u8(&mut self, what: &str) -> Result<u8, SessionError> {
        self.parse(what)
    }

    /// `0` or `1`.
    pub(crate) fn flag(&mut self, what: &str) -> Result<bool, SessionError> {
        match self.word(what)? {
            "0" => Ok(false),
            "1" => Ok(true),
            other => Err(self.malformed(format!("invalid {what} '{other}', expected 0 or 1"))),
        }
    }

    /// An index, or `null`.
    pub(crate) fn opt_usize(&mut self, what: &str) -> Result<Option<usize>, SessionError> {
        if self.iter.clone().next() == Some("null") {
            self.iter.next();
            return Ok(None);
        }
        self.usize(what).map(Some)
    }

    /// `true` and consumes it if the next token is `null`.
    pub(crate) fn take_null(&mut self) -> bool {
        if self.iter.clone().next() == Some("null") {
            self.iter.next();
            true
        } else {
            false
        }
    }

    /// Fails if any token is left.
    pub(crate) fn finish(mut self) -> Result<(), SessionError> {
        match self.iter.next() {
            None => Ok(()),
            Some(extra) => Err(self.malformed(format!("unexpected trailing '{extra}'"))),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn comments_and_blanks_are_skipped() {
        let mut r = LineReader::new("# head\n\n  3  \n# tail\n");
        assert_eq!(r.count("count").unwrap(), 3);
        assert_eq!(r.line(), 3);
        assert!(r.is_exhausted());
    }

    #[test]
    fn null_and_flags() {
        let mut r = LineReader::new("null 4 1 x");
        let mut t = r.tokens("line").unwrap();
        assert_eq!(t.opt_usize("section").unwrap(), None);
        assert_eq!(t.opt_usize("group").unwrap(), Some(4));
        assert!(t.flag("boundary").unwrap());
        assert!(t.flag("boundary").is_err());
    }

    #[test]
    fn text_lines_keep_spaces() {
        let mut r = LineReader::new("name  upper crust\nname\n");
        assert_eq!(r.text("name").unwrap(), "upper crust");
        assert_eq!(r.text("name").unwrap(), "");
    }

    #[test]
    fn quoted_text_is_unescaped() {
        let mut r = LineReader::new(
            "name \"  two\\nlines \\\"q\\\" \\\\ \"\nname \"\"\nname bare\nname \"a\\x\"\n",
        );
        assert_eq!(r.quoted("name").unwrap(), "  two\nlines \"q\" \\ ");
        assert_eq!(r.quoted("name").unwrap(), "");
        assert!(matches!(
            r.quoted("name"),
            Err(SessionError::Malformed { line: 3, .. })
        ));
        assert!(matches!(
            r.quoted("name"),
            Err(SessionError::Malformed { line: 4, .. })
        ));
    }

    #[test]
    fn end_of_input_names_what_was_expected() {
        let mut r = LineReader::new("# only a comment");
        assert_eq!(
            r.count("node count"),
            Err(SessionError::UnexpectedEnd {
                line: 1,
                expected: "node count".to_string()
            })
        );
    }

    #[test]
    fn trailing_tokens_are_rejected() {
        let mut r = LineReader::new("2 3");
        assert!(matches!(
            r.count("count"),
            Err(SessionError::Malformed { line: 1, .. })
        ));
    }
}
