pub const TINY_NUMBER: f64 = 1e-12;

// absolute mass below which trailing entries of a distribution are dropped
pub const TRIM_THRESHOLD: f64 = 1e-10;

// Poisson jump-count distributions are truncated at the first index past the mean with mass below this
pub const POISSON_THRESHOLD: f64 = 1e-10;

// tolerance on total mass of a distribution
pub const MASS_TOLERANCE: f64 = 1e-6;
