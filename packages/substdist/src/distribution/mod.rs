pub mod poisson;
pub mod prob_matrix;
pub mod prob_vector;
