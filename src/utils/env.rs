/// Get environment variable with DIALBACK_ prefix, falling back to unprefixed version
///
/// This helper function checks for `DIALBACK_{key}` first, then falls back to `{key}`
/// for compatibility with standard environment variable naming.
///
/// # Examples
///
/// ```rust
/// use dialback::utils::get_env_with_prefix;
///
/// // Checks DIALBACK_THROTTLE_FACTOR first, then THROTTLE_FACTOR
/// let factor = get_env_with_prefix("THROTTLE_FACTOR");
/// ```
pub fn get_env_with_prefix(key: &str) -> Option<String> {
    std::env::var(format!("DIALBACK_{}", key))
        .or_else(|_| std::env::var(key))
        .ok()
}
