//! Deterministic mapping from the request's selector value to an
//! execution scenario.

/// Kind of deliberately triggered failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    Timeout,
    Error,
}

/// Execution path chosen for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// Fan-out to the resource operations, then chain downstream.
    Normal,
    /// Exercise a failure path for trace validation.
    Fault(FaultKind),
}

/// Map the numeric selector to a scenario.
///
/// `n <= 1` runs the normal path, `1 < n <= 2` the timeout fault, and
/// anything above the error fault. The mapping is fully deterministic;
/// load generators may feed a random `n`, but the routing never is.
pub fn select(n: f64) -> Scenario {
    if n <= 1.0 {
        Scenario::Normal
    } else if n <= 2.0 {
        Scenario::Fault(FaultKind::Timeout)
    } else {
        Scenario::Fault(FaultKind::Error)
    }
}

/// Parse the selector from its raw query-parameter value. Absent or
/// unparseable input defaults to `0` (the normal path).
pub fn selector_from_query(raw: Option<&str>) -> f64 {
    match raw {
        None => 0.0,
        Some(text) => match text.parse::<f64>() {
            Ok(n) => n,
            Err(_) => {
                tracing::warn!(value = %text, "unparseable selector, defaulting to 0");
                0.0
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_selector_mapping_table() {
        let cases = [
            (0.0, Scenario::Normal),
            (1.0, Scenario::Normal),
            (1.5, Scenario::Fault(FaultKind::Timeout)),
            (2.0, Scenario::Fault(FaultKind::Timeout)),
            (2.5, Scenario::Fault(FaultKind::Error)),
            (5.0, Scenario::Fault(FaultKind::Error)),
        ];
        for (n, expected) in cases {
            assert_eq!(select(n), expected, "selector {n}");
        }
    }

    #[test]
    fn test_negative_selector_is_normal() {
        assert_eq!(select(-3.0), Scenario::Normal);
    }

    #[test]
    fn test_query_parsing_defaults() {
        assert_eq!(selector_from_query(None), 0.0);
        assert_eq!(selector_from_query(Some("1.5")), 1.5);
        assert_eq!(selector_from_query(Some("garbage")), 0.0);
    }

    proptest! {
        #[test]
        fn test_thresholds_partition_the_line(n in -1e6f64..1e6) {
            let scenario = select(n);
            prop_assert_eq!(scenario == Scenario::Normal, n <= 1.0);
            prop_assert_eq!(
                scenario == Scenario::Fault(FaultKind::Timeout),
                n > 1.0 && n <= 2.0
            );
            prop_assert_eq!(scenario == Scenario::Fault(FaultKind::Error), n > 2.0);
        }
    }
}
