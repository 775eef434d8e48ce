#[macro_export]
macro_rules! pretty_assert_eq {
  ($left:expr, $right:expr) => {{
    pretty_assertions::assert_eq!(
      format!("{:#?}", $left).replace("\n", "\u{0085}"),
      format!("{:#?}", $right).replace("\n", "\u{0085}")
    );
  }};
}

/// Compares floats (or arrays of floats) with `approx::abs_diff_eq!` and, on mismatch, shows a readable diff
#[macro_export]
macro_rules! pretty_assert_abs_diff_eq {
  ($left:expr, $right:expr, epsilon = $epsilon:expr) => {{
    // operands are bound through a match so that temporaries live until the end of the comparison
    match (&$left, &$right) {
      (left, right) => {
        if !approx::abs_diff_eq!(left, right, epsilon = $epsilon) {
          pretty_assertions::assert_eq!(
            format!("{:#?}", left),
            format!("{:#?}", right),
            "arrays differ by more than epsilon = {}",
            $epsilon
          );
        }
      }
    }
  }};
  ($left:expr, $right:expr) => {{
    $crate::pretty_assert_abs_diff_eq!($left, $right, epsilon = f64::EPSILON)
  }};
}
