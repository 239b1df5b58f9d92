//! Index-format templates such as `[%d]` and `_%d`.

use crate::error::PathError;

const PLACEHOLDER: &str = "%d";

/// Template describing how list indices are written inside a path.
///
/// The template contains exactly one `%d`; the text before and after it wraps
/// the decimal index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexFormat {
    template: String,
    prefix: String,
    suffix: String,
}

impl IndexFormat {
    /// Parse an index-format template.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::InvalidIndexFormat`] unless `template` contains
    /// exactly one `%d`.
    ///
    /// # Examples
    ///
    /// ```
    /// use confstore::IndexFormat;
    /// let format = IndexFormat::new("<%d>").expect("valid template");
    /// assert_eq!(format.render(7), "<7>");
    /// assert!(IndexFormat::new("[]").is_err());
    /// ```
    pub fn new(template: impl Into<String>) -> Result<Self, PathError> {
        let template = template.into();
        let invalid = || PathError::InvalidIndexFormat {
            template: template.clone(),
        };
        let (prefix, suffix) = template.split_once(PLACEHOLDER).ok_or_else(invalid)?;
        if suffix.contains(PLACEHOLDER) {
            return Err(invalid());
        }
        Ok(Self {
            prefix: prefix.to_owned(),
            suffix: suffix.to_owned(),
            template,
        })
    }

    /// The default `[%d]` format.
    #[must_use]
    pub fn brackets() -> Self {
        Self {
            template: "[%d]".to_owned(),
            prefix: "[".to_owned(),
            suffix: "]".to_owned(),
        }
    }

    /// The environment-style `_%d` format.
    #[must_use]
    pub fn underscore() -> Self {
        Self {
            template: "_%d".to_owned(),
            prefix: "_".to_owned(),
            suffix: String::new(),
        }
    }

    /// The template this format was built from.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Write `index` using this format.
    #[must_use]
    pub fn render(&self, index: usize) -> String {
        format!("{}{index}{}", self.prefix, self.suffix)
    }

    /// Match an index token at the very start of `text`.
    ///
    /// Returns the index and the number of bytes the token spans. Tokens
    /// whose digits overflow `usize` do not match.
    pub(crate) fn match_start(&self, text: &str) -> Option<(usize, usize)> {
        let rest = text.strip_prefix(self.prefix.as_str())?;
        let digit_count = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digit_count == 0 {
            return None;
        }
        let (digits, after_digits) = rest.split_at_checked(digit_count)?;
        let after = after_digits.strip_prefix(self.suffix.as_str())?;
        let index = digits.parse::<usize>().ok()?;
        Some((index, text.len() - after.len()))
    }
}

impl Default for IndexFormat {
    fn default() -> Self {
        Self::brackets()
    }
}
