//! User-facing text for raw backend error messages.

pub const GENERIC_ERROR: &str = "Something went wrong. Please try again.";

/// (lowercase substring, friendly text). First match wins.
const KNOWN_ERRORS: &[(&str, &str)] = &[
    ("invalid login credentials", "Incorrect email or password."),
    ("email not confirmed", "Please confirm your email address before signing in."),
    ("user already registered", "An account with this email already exists."),
    ("password should be at least", "Your password is too weak. Use at least 6 characters."),
    ("weak password", "Your password is too weak. Use at least 6 characters."),
    ("failed to fetch", "Network error. Check your connection and try again."),
    ("network", "Network error. Check your connection and try again."),
    ("jwt expired", "Your session has expired. Please sign in again."),
    ("duplicate key", "This record already exists."),
];

/// Map a raw error message onto friendly text. Unknown errors get
/// [`GENERIC_ERROR`].
pub fn friendly_message(raw: &str) -> &'static str {
    let lowered = raw.to_lowercase();
    KNOWN_ERRORS
        .iter()
        .find(|(needle, _)| lowered.contains(needle))
        .map(|(_, friendly)| *friendly)
        .unwrap_or(GENERIC_ERROR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_errors_are_mapped() {
        assert_eq!(friendly_message("Invalid login credentials"), "Incorrect email or password.");
        assert_eq!(
            friendly_message("AuthApiError: JWT expired"),
            "Your session has expired. Please sign in again."
        );
        assert_eq!(
            friendly_message("TypeError: Failed to fetch"),
            "Network error. Check your connection and try again."
        );
        assert_eq!(
            friendly_message("duplicate key value violates unique constraint"),
            "This record already exists."
        );
    }

    #[test]
    fn unknown_errors_are_generic() {
        assert_eq!(friendly_message("relation \"foo\" does not exist"), GENERIC_ERROR);
        assert_eq!(friendly_message(""), GENERIC_ERROR);
    }
}
