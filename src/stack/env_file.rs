//! `.env` file model
//!
//! The file is held as an ordered list of lines, each with its original line
//! terminator. `KEY=VALUE` lines are recognized as entries; comments, blank
//! lines and anything else are carried verbatim. An unmodified file renders
//! back byte-for-byte identical to the text it was parsed from.

use crate::error::{HservError, Result};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

fn entry_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([^#=\s][^=\s]*)=").expect("valid entry pattern"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Line {
    text: String,
    ending: String,
    /// Length of the key when the line is a `KEY=VALUE` entry
    key_len: Option<usize>,
}

impl Line {
    fn new(text: &str, ending: &str) -> Self {
        let key_len = entry_pattern()
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|key| key.end());

        Self {
            text: text.to_string(),
            ending: ending.to_string(),
            key_len,
        }
    }

    fn key(&self) -> Option<&str> {
        self.key_len.map(|len| &self.text[..len])
    }

    fn value(&self) -> Option<&str> {
        self.key_len.map(|len| &self.text[len + 1..])
    }

    fn set_value(&mut self, value: &str) {
        if let Some(len) = self.key_len {
            self.text.truncate(len + 1);
            self.text.push_str(value);
        }
    }
}

/// In-memory mirror of a stack's `.env` file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvFile {
    lines: Vec<Line>,
}

impl EnvFile {
    /// Parse `.env` text. Parsing never fails; unrecognized lines are kept as-is.
    pub fn parse(text: &str) -> Self {
        let mut lines = Vec::new();
        let mut rest = text;

        while !rest.is_empty() {
            match rest.find(['\n', '\r']) {
                Some(pos) => {
                    let ending_len = if rest[pos..].starts_with("\r\n") { 2 } else { 1 };
                    lines.push(Line::new(&rest[..pos], &rest[pos..pos + ending_len]));
                    rest = &rest[pos + ending_len..];
                }
                None => {
                    lines.push(Line::new(rest, ""));
                    rest = "";
                }
            }
        }

        Self { lines }
    }

    /// Value of the first entry named `key`, or `None` if there is no such entry
    pub fn extract(&self, key: &str) -> Option<&str> {
        self.lines
            .iter()
            .find(|line| line.key() == Some(key))
            .and_then(Line::value)
    }

    /// Check whether an entry named `key` exists
    pub fn contains(&self, key: &str) -> bool {
        self.lines.iter().any(|line| line.key() == Some(key))
    }

    /// Set every key of `keys` to `value`.
    ///
    /// All keys must be present; if one is missing the file is left untouched
    /// and `UnknownOption` names the missing key. For each key, every entry
    /// holding that key's current (first) value is rewritten. Returns the
    /// number of lines changed.
    pub fn replace_all(&mut self, keys: &[&str], value: &str) -> Result<usize> {
        if value.contains(['\n', '\r']) {
            return Err(HservError::invalid_argument(
                "Values cannot contain line breaks",
            ));
        }

        if let Some(missing) = keys.iter().find(|key| !self.contains(key)) {
            return Err(HservError::unknown_option(*missing));
        }

        let mut changed = 0;
        for key in keys {
            let current = match self.extract(key) {
                Some(current) => current.to_string(),
                None => continue,
            };

            for line in self.lines.iter_mut() {
                if line.key() == Some(*key) && line.value() == Some(current.as_str()) {
                    line.set_value(value);
                    changed += 1;
                }
            }
        }

        Ok(changed)
    }

    /// Entries in file order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.lines
            .iter()
            .filter_map(|line| Some((line.key()?, line.value()?)))
    }

    pub fn len(&self) -> usize {
        self.entries().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for EnvFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            f.write_str(&line.text)?;
            f.write_str(&line.ending)?;
        }
        Ok(())
    }
}

impl FromStr for EnvFile {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "############\n\
        # Secrets\n\
        ############\n\
        \n\
        POSTGRES_PASSWORD=your-super-secret-and-long-postgres-password\n\
        JWT_SECRET=your-super-secret-jwt-token-with-at-least-32-characters-long\n\
        SITE_URL=http://localhost:3000\n\
        SUPABASE_PUBLIC_URL=http://localhost:8000\n\
        API_EXTERNAL_URL=http://localhost:8000\n";

    #[test]
    fn test_round_trip_is_byte_identical() {
        let samples = [
            SAMPLE,
            "A=1\r\nB=2\r\n",
            "A=1\rB=2",
            "# only a comment",
            "",
            "\n\n",
            "WEIRD LINE\nA==b=c\n",
        ];

        for sample in samples {
            assert_eq!(EnvFile::parse(sample).to_string(), sample);
        }
    }

    #[test]
    fn test_extract_first_match() {
        let env = EnvFile::parse("A=1\nB=2\nA=3\n");
        assert_eq!(env.extract("A"), Some("1"));
        assert_eq!(env.extract("B"), Some("2"));
        assert_eq!(env.extract("C"), None);
    }

    #[test]
    fn test_extract_matches_whole_key() {
        let env = EnvFile::parse("PG_JWT_SECRET=wrong\nJWT_SECRET=right\n");
        assert_eq!(env.extract("JWT_SECRET"), Some("right"));
        assert_eq!(env.extract("jwt_secret"), None);
        assert_eq!(env.extract("JWT"), None);
    }

    #[test]
    fn test_extract_strips_line_terminators() {
        let env = EnvFile::parse("A=windows\r\nB=last");
        assert_eq!(env.extract("A"), Some("windows"));
        assert_eq!(env.extract("B"), Some("last"));
    }

    #[test]
    fn test_values_with_equals_and_empty_values() {
        let env = EnvFile::parse("TOKEN=abc==\nEMPTY=\n");
        assert_eq!(env.extract("TOKEN"), Some("abc=="));
        assert_eq!(env.extract("EMPTY"), Some(""));
    }

    #[test]
    fn test_comments_are_not_entries() {
        let env = EnvFile::parse("# A=commented\nB=2\n");
        assert!(!env.contains("A"));
        assert!(!env.contains("# A"));
        assert_eq!(env.len(), 1);
    }

    #[test]
    fn test_replace_all_updates_group() {
        let mut env =
            EnvFile::parse("SUPABASE_PUBLIC_URL=http://a\nAPI_EXTERNAL_URL=http://a\n");
        let changed = env
            .replace_all(&["SUPABASE_PUBLIC_URL", "API_EXTERNAL_URL"], "http://b")
            .unwrap();

        assert_eq!(changed, 2);
        assert_eq!(
            env.to_string(),
            "SUPABASE_PUBLIC_URL=http://b\nAPI_EXTERNAL_URL=http://b\n"
        );
    }

    #[test]
    fn test_replace_all_leaves_similar_keys_alone() {
        let mut env = EnvFile::parse("OTHER_PORT=5432\nPOSTGRES_PORT=5432\n");
        env.replace_all(&["POSTGRES_PORT"], "6543").unwrap();
        assert_eq!(env.to_string(), "OTHER_PORT=5432\nPOSTGRES_PORT=6543\n");
    }

    #[test]
    fn test_replace_all_updates_duplicates_with_same_value() {
        let mut env = EnvFile::parse("A=1\nB=2\nA=1\nA=9\n");
        env.replace_all(&["A"], "5").unwrap();
        assert_eq!(env.to_string(), "A=5\nB=2\nA=5\nA=9\n");
    }

    #[test]
    fn test_replace_all_is_all_or_nothing() {
        let text = "SUPABASE_PUBLIC_URL=http://a\n";
        let mut env = EnvFile::parse(text);
        let err = env
            .replace_all(&["SUPABASE_PUBLIC_URL", "API_EXTERNAL_URL"], "http://b")
            .unwrap_err();

        assert!(matches!(err, HservError::UnknownOption { ref name } if name == "API_EXTERNAL_URL"));
        assert_eq!(env.to_string(), text);
    }

    #[test]
    fn test_replace_all_rejects_line_breaks() {
        let mut env = EnvFile::parse("A=1\n");
        assert!(env.replace_all(&["A"], "2\nB=3").is_err());
        assert_eq!(env.to_string(), "A=1\n");
    }

    #[test]
    fn test_replace_all_keeps_crlf() {
        let mut env = EnvFile::parse("A=1\r\nB=2\r\n");
        env.replace_all(&["B"], "20").unwrap();
        assert_eq!(env.to_string(), "A=1\r\nB=20\r\n");
    }

    #[test]
    fn test_entries_in_file_order() {
        let env = EnvFile::parse(SAMPLE);
        let keys: Vec<&str> = env.entries().map(|(key, _)| key).collect();
        assert_eq!(
            keys,
            vec![
                "POSTGRES_PASSWORD",
                "JWT_SECRET",
                "SITE_URL",
                "SUPABASE_PUBLIC_URL",
                "API_EXTERNAL_URL"
            ]
        );
    }
}
