//! Test assertions over recorded wrapper calls.

use super::CallLog;

/// Asserts that `wrappers` (in registration order) installed outermost-last
/// first, ran `work_entry`, and tore down in mirrored order.
pub fn assert_contexts_nested(log: &CallLog, wrappers: &[&str], work_entry: &str) {
    let mut expected: Vec<String> = wrappers
        .iter()
        .rev()
        .map(|name| format!("install:{name}"))
        .collect();
    expected.push(work_entry.to_string());
    expected.extend(wrappers.iter().map(|name| format!("teardown:{name}")));

    let actual: Vec<String> = log
        .entries()
        .into_iter()
        .filter(|e| !e.starts_with("capture:"))
        .collect();

    assert_eq!(
        actual, expected,
        "Expected nested install/teardown order {:?}, got {:?}",
        expected, actual
    );
}

/// Asserts that every wrapper in `wrappers` tore down exactly once.
pub fn assert_torn_down_once(log: &CallLog, wrappers: &[&str]) {
    for name in wrappers {
        let count = log.count(&format!("teardown:{name}"));
        assert_eq!(
            count, 1,
            "Expected wrapper '{}' to tear down once, got {} teardowns",
            name, count
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_order_accepted() {
        let log = CallLog::new();
        for entry in [
            "capture:w1",
            "capture:w2",
            "install:w2",
            "install:w1",
            "work",
            "teardown:w1",
            "teardown:w2",
        ] {
            log.record(entry);
        }

        assert_contexts_nested(&log, &["w1", "w2"], "work");
        assert_torn_down_once(&log, &["w1", "w2"]);
    }

    #[test]
    #[should_panic(expected = "Expected nested install/teardown order")]
    fn test_sequential_order_rejected() {
        let log = CallLog::new();
        for entry in ["install:w1", "install:w2", "work", "teardown:w1", "teardown:w2"] {
            log.record(entry);
        }

        assert_contexts_nested(&log, &["w1", "w2"], "work");
    }
}
