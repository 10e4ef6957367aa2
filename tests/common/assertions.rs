//! Custom test assertions

/// Assert two values are approximately equal (for floats)
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr) => {
        $crate::assert_approx_eq!($left, $right, 1e-9_f64)
    };
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left_val: f64 = $left as f64;
        let right_val: f64 = $right as f64;
        let diff = (left_val - right_val).abs();
        assert!(
            diff < $epsilon,
            "assertion failed: `(left ~ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}`",
            left_val,
            right_val,
            diff
        );
    }};
}

/// Assert a result is an error of the given `MetricsError` variant
#[macro_export]
macro_rules! assert_err_variant {
    ($result:expr, $variant:path) => {
        match $result {
            Err($variant(_)) => {}
            other => panic!(
                "expected Err({}), got {:?}",
                stringify!($variant),
                other
            ),
        }
    };
}
