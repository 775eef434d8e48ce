use crate::constants::POISSON_THRESHOLD;
use crate::distribution::prob_vector::ProbVector;
use crate::make_error;
use eyre::{Report, WrapErr};

/// Poisson distribution with mean `lambda`, truncated at the first index `j > lambda` whose mass falls below
/// `POISSON_THRESHOLD`, and renormalized.
///
/// Masses are computed in log space, so that large `lambda` does not underflow at `j = 0`.
pub fn poisson(lambda: f64) -> Result<ProbVector, Report> {
  if !lambda.is_finite() || lambda < 0.0 {
    return make_error!("Poisson rate must be finite and non-negative, but found {lambda}");
  }
  if lambda == 0.0 {
    return Ok(ProbVector::point_mass());
  }

  let log_lambda = lambda.ln();
  let mut probs = vec![];
  let mut log_p = -lambda;
  let mut j = 0_usize;
  loop {
    let p = log_p.exp();
    if j as f64 > lambda && p < POISSON_THRESHOLD {
      break;
    }
    probs.push(p);
    j += 1;
    log_p += log_lambda - (j as f64).ln();
  }

  let mut pois = ProbVector::from_vec(probs)?;
  pois
    .normalize()
    .wrap_err_with(|| format!("When computing Poisson distribution with rate {lambda}"))?;
  Ok(pois)
}
