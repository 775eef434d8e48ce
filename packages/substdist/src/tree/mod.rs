pub mod prune;
pub mod reroot;
pub mod tree;
