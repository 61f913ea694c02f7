use std::env;
use std::str::FromStr;
use tracing::warn;

/// Retrieves an environment variable and parses it, falling back to a default.
///
/// # Arguments
/// - `var`: The name of the environment variable.
/// - `default`: The value used when the variable is unset or does not parse.
///
/// # Returns
/// - The parsed value or `default`.
pub fn get_env_var_or<T: FromStr>(var: &str, default: T) -> T {
    match env::var(var) {
        Ok(raw) if !raw.trim().is_empty() => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                warn!("Ignoring unparseable value {:?} for {}", raw, var);
                default
            }
        },
        _ => default,
    }
}

/// Retrieves an environment variable as a string, falling back to a default.
pub fn get_env_var_string(var: &str, default: &str) -> String {
    env::var(var)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}
