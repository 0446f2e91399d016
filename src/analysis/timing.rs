//! Elapsed-time logging for public operations.

use std::time::Instant;

/// Run `f`, log how long it took, and return its result unchanged.
///
/// Errors are logged at debug level and passed through.
pub fn timed<T, E, F>(operation: &str, f: F) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnOnce() -> Result<T, E>,
{
    let start = Instant::now();
    let result = f();
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    match &result {
        Ok(_) => tracing::debug!(operation, elapsed_ms, "operation finished"),
        Err(e) => tracing::debug!(operation, elapsed_ms, error = %e, "operation failed"),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passes_value_through() {
        let value: Result<u32, String> = timed("answer", || Ok(42));
        assert_eq!(value, Ok(42));
    }

    #[test]
    fn test_passes_error_through() {
        let value: Result<u32, String> = timed("boom", || Err("broken".to_string()));
        assert_eq!(value, Err("broken".to_string()));
    }
}
