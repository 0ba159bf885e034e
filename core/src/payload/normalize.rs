pub const DEFAULT_PORT: i64 = 22;
pub const FALLBACK_TIMEOUT_SECS: i64 = 120;

pub fn normalize_port(port: i64) -> i64 {
    if port <= 0 {
        DEFAULT_PORT
    } else {
        port
    }
}

/// Request timeout if positive, else the configured default if positive,
/// else [`FALLBACK_TIMEOUT_SECS`].
pub fn normalize_timeout(request_timeout: i64, default_timeout: i64) -> i64 {
    if request_timeout > 0 {
        request_timeout
    } else if default_timeout > 0 {
        default_timeout
    } else {
        FALLBACK_TIMEOUT_SECS
    }
}

/// Number of targets the engine may work on at once. Always within
/// `[1, n_targets]`, and 1 when there are no targets.
pub fn effective_concurrency(hint: i64, n_targets: usize) -> usize {
    let upper = n_targets.max(1);
    let hint = usize::try_from(hint).unwrap_or(0);
    hint.clamp(1, upper)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_defaults_for_non_positive() {
        for p in [i64::MIN, -1, 0] {
            assert_eq!(normalize_port(p), 22);
        }
        assert_eq!(normalize_port(1), 1);
        assert_eq!(normalize_port(2222), 2222);
    }

    #[test]
    fn timeout_fallback_chain() {
        assert_eq!(normalize_timeout(30, 60), 30);
        assert_eq!(normalize_timeout(0, 60), 60);
        assert_eq!(normalize_timeout(-5, 60), 60);
        assert_eq!(normalize_timeout(-5, 0), 120);
        assert_eq!(normalize_timeout(0, -1), 120);
    }

    #[test]
    fn concurrency_is_clamped_to_targets() {
        assert_eq!(effective_concurrency(8, 3), 3);
        assert_eq!(effective_concurrency(2, 3), 2);
        assert_eq!(effective_concurrency(0, 3), 1);
        assert_eq!(effective_concurrency(-4, 3), 1);
        assert_eq!(effective_concurrency(5, 0), 1);
        for hint in -3..10 {
            for n in 1..6 {
                let c = effective_concurrency(hint, n);
                assert!((1..=n).contains(&c), "hint={hint} n={n} got {c}");
            }
        }
    }
}
