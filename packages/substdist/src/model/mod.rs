pub mod get_model;
pub mod subst_model;
