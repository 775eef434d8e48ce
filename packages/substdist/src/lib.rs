pub mod alignment;
pub mod alphabet;
pub mod commands;
pub mod constants;
pub mod distribution;
pub mod io;
pub mod model;
pub mod subst;
pub mod tree;
pub mod utils;
