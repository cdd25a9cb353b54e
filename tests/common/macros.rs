/// Asserts that a live cell holds the given amount, within `1e-6`.
#[macro_export]
macro_rules! assert_amount {
    ($field:expr, $cx:expr, $cy:expr, $expected:expr) => {
        let actual = $crate::common::amount_at(&$field, $cx, $cy);
        assert!(
            (actual - $expected).abs() < 1e-6,
            "Cell ({}, {}) amount {} != {}",
            $cx,
            $cy,
            actual,
            $expected
        );
    };
}

/// Asserts that a sample is the out-of-grid sentinel.
#[macro_export]
macro_rules! assert_unobserved {
    ($sample:expr) => {
        let s = $sample;
        assert_eq!(s.value, 0.0, "Unobserved sample must carry no value");
        assert_eq!(s.author_id, 0, "Unobserved sample must carry no author");
        assert!(
            s.age.is_infinite() && s.age > 0.0,
            "Unobserved sample age {} is not +inf",
            s.age
        );
    };
}
