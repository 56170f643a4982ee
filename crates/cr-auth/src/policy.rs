//! Passphrase composition policies.
//!
//! A passphrase is split into words on single spaces. Policies constrain the
//! word count, the length of every word, the total length, and the presence
//! of upper-case letters, digits and symbols.

use cr_core::PassphrasePolicyKind;

use crate::error::{AuthError, AuthResult};

/// Characters that count as symbols.
pub const SYMBOLS: &str = "`'\"\\[]{},./;:!@#$%^&*()_+-=";

/// A passphrase composition rule set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassphrasePolicy {
    /// Minimum number of words.
    pub min_words: usize,
    /// Maximum number of words, if bounded.
    pub max_words: Option<usize>,
    /// Minimum characters in every word.
    pub letters_per_word: usize,
    /// Minimum characters in the whole passphrase, spaces included.
    pub minimum_total: usize,
    /// Requires at least one ASCII upper-case letter.
    pub require_upper: bool,
    /// Requires at least one ASCII digit.
    pub require_numeric: bool,
    /// Requires at least one character from [`SYMBOLS`].
    pub require_symbol: bool,
}

impl PassphrasePolicy {
    /// A single word of at least eight characters.
    #[must_use]
    pub const fn simple() -> Self {
        Self {
            min_words: 1,
            max_words: Some(1),
            letters_per_word: 8,
            minimum_total: 8,
            require_upper: false,
            require_numeric: false,
            require_symbol: false,
        }
    }

    /// At least three space-separated words of five characters or more,
    /// twelve characters in total.
    #[must_use]
    pub const fn strong() -> Self {
        Self {
            min_words: 3,
            max_words: None,
            letters_per_word: 5,
            minimum_total: 12,
            require_upper: false,
            require_numeric: false,
            require_symbol: false,
        }
    }

    /// A single word of at least eight characters containing an upper-case
    /// letter, a digit and a symbol.
    #[must_use]
    pub const fn classic() -> Self {
        Self {
            min_words: 1,
            max_words: Some(1),
            letters_per_word: 8,
            minimum_total: 8,
            require_upper: true,
            require_numeric: true,
            require_symbol: true,
        }
    }

    /// Returns the policy for a configured kind.
    #[must_use]
    pub const fn for_kind(kind: PassphrasePolicyKind) -> Self {
        match kind {
            PassphrasePolicyKind::Simple => Self::simple(),
            PassphrasePolicyKind::Strong => Self::strong(),
            PassphrasePolicyKind::Classic => Self::classic(),
        }
    }

    /// Checks a passphrase.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PolicyViolation` naming the first rule broken.
    pub fn check(&self, pass: &str) -> AuthResult<()> {
        let violation = |msg: String| Err(AuthError::PolicyViolation(msg));

        if pass.trim() != pass {
            return violation("passphrase has leading or trailing whitespace".to_string());
        }

        let words: Vec<&str> = pass.split(' ').collect();
        if words.len() < self.min_words || self.max_words.is_some_and(|max| words.len() > max) {
            return violation(match self.max_words {
                Some(max) if max == self.min_words => {
                    format!("passphrase must have exactly {max} word(s), got {}", words.len())
                }
                _ => format!(
                    "passphrase must have at least {} words, got {}",
                    self.min_words,
                    words.len()
                ),
            });
        }

        if words.iter().any(|w| w.chars().count() < self.letters_per_word) {
            return violation(format!(
                "every word needs at least {} characters",
                self.letters_per_word
            ));
        }

        if pass.chars().count() < self.minimum_total {
            return violation(format!(
                "passphrase needs at least {} characters",
                self.minimum_total
            ));
        }

        if self.require_upper && !pass.chars().any(|c| c.is_ascii_uppercase()) {
            return violation("passphrase requires an upper-case letter".to_string());
        }
        if self.require_numeric && !pass.chars().any(|c| c.is_ascii_digit()) {
            return violation("passphrase requires a digit".to_string());
        }
        if self.require_symbol && !pass.chars().any(|c| SYMBOLS.contains(c)) {
            return violation("passphrase requires a symbol".to_string());
        }

        Ok(())
    }

    /// Returns whether a passphrase satisfies the policy.
    #[must_use]
    pub fn is_valid(&self, pass: &str) -> bool {
        self.check(pass).is_ok()
    }
}

impl Default for PassphrasePolicy {
    fn default() -> Self {
        Self::simple()
    }
}

impl From<PassphrasePolicyKind> for PassphrasePolicy {
    fn from(kind: PassphrasePolicyKind) -> Self {
        Self::for_kind(kind)
    }
}
