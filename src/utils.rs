use std::env;

/// Check if a user is authorized to use owner-only commands
pub fn is_protected_user(username: &str) -> bool {
    let protected_users = env::var("PROTECTED_USERS").unwrap_or_default();

    protected_users
        .split_whitespace()
        .any(|user| user.trim().eq_ignore_ascii_case(username))
}

/// Log and discard the outcome of a non-critical side effect.
///
/// Role grants, role revocations and nickname changes in the greeting flow
/// must never abort the remaining steps, so their failures end up here
/// instead of propagating.
pub fn best_effort<T, E: std::fmt::Display>(action: &str, result: Result<T, E>) {
    if let Err(e) = result {
        log::warn!("Ignoring failure while {action}: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_effort_swallows_errors() {
        let failed: Result<(), String> = Err("boom".to_string());
        best_effort("testing", failed);

        let ok: Result<u32, String> = Ok(7);
        best_effort("testing", ok);
    }
}
