use crate::client_id::error::GrammarError;
use crate::client_id::ClientId;
use serde::Deserialize;

/// Maximum length of a client id, in bytes.
pub const MAX_CLIENT_ID_LEN: usize = 64;

/// The set of characters a client id may contain.
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Alphabet {
    /// ASCII letters of either case, digits and `-`. Case is preserved, never folded.
    #[default]
    Ascii,
    /// Lowercase ASCII letters, digits and `-`.
    Lowercase,
}

impl Alphabet {
    #[must_use]
    pub fn permits(self, ch: char) -> bool {
        match self {
            Alphabet::Ascii => ch.is_ascii_alphanumeric() || ch == '-',
            Alphabet::Lowercase => ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-',
        }
    }
}

/// Check `candidate` against the client id grammar, returning it as a [`ClientId`].
///
/// The length rule is applied before the alphabet rule. Callers never pass an empty candidate:
/// an absent id means an anonymous client and is decided before validation.
///
/// # Errors
///
/// Returns [`GrammarError::TooLong`] if the candidate exceeds [`MAX_CLIENT_ID_LEN`], or
/// [`GrammarError::InvalidChar`] for the first character outside `alphabet`.
pub fn validate(candidate: &str, alphabet: Alphabet) -> Result<ClientId, GrammarError> {
    if candidate.len() > MAX_CLIENT_ID_LEN {
        return Err(GrammarError::TooLong {
            id: candidate.to_string(),
            max: MAX_CLIENT_ID_LEN,
        });
    }

    if let Some((index, ch)) = candidate.char_indices().find(|(_, ch)| !alphabet.permits(*ch)) {
        return Err(GrammarError::InvalidChar {
            ch,
            index,
            id: candidate.to_string(),
        });
    }

    Ok(ClientId(candidate.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_letters_digits_and_hyphens() {
        let id = validate("Laptop-01", Alphabet::Ascii).unwrap();
        assert_eq!(id.as_str(), "Laptop-01");
    }

    #[test]
    fn accepts_max_length() {
        let candidate = "a".repeat(MAX_CLIENT_ID_LEN);
        assert!(validate(&candidate, Alphabet::Ascii).is_ok());
    }

    #[test]
    fn rejects_too_long_before_checking_chars() {
        let candidate = "!".repeat(MAX_CLIENT_ID_LEN + 1);
        let err = validate(&candidate, Alphabet::Ascii).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("client id \"{candidate}\" is too long, max: 64")
        );
    }

    #[test]
    fn reports_first_invalid_char() {
        let err = validate("ab_c.d", Alphabet::Ascii).unwrap_err();
        assert_eq!(
            err,
            GrammarError::InvalidChar {
                ch: '_',
                index: 2,
                id: "ab_c.d".to_string(),
            }
        );
        assert_eq!(
            err.to_string(),
            "invalid char '_' at index 2 in client id \"ab_c.d\""
        );
    }

    #[test]
    fn lowercase_alphabet_rejects_uppercase() {
        assert!(validate("cli-1", Alphabet::Lowercase).is_ok());
        let err = validate("cLi", Alphabet::Lowercase).unwrap_err();
        assert_eq!(err.to_string(), "invalid char 'L' at index 1 in client id \"cLi\"");
    }

    #[test]
    fn accepted_ids_only_hold_permitted_chars() {
        let candidates = ["a", "A-b", "-", "x!y", "0123", "héllo", "tab\there"];
        for candidate in candidates {
            match validate(candidate, Alphabet::Ascii) {
                Ok(id) => {
                    assert!(id.as_str().len() <= MAX_CLIENT_ID_LEN);
                    assert!(id.as_str().chars().all(|ch| Alphabet::Ascii.permits(ch)));
                }
                Err(GrammarError::InvalidChar { ch, index, .. }) => {
                    assert!(!Alphabet::Ascii.permits(ch));
                    assert!(candidate[..index].chars().all(|ch| Alphabet::Ascii.permits(ch)));
                    assert!(candidate[index..].starts_with(ch));
                }
                Err(err) => panic!("unexpected error for {candidate:?}: {err}"),
            }
        }
    }
}
