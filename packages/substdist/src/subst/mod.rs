pub mod alignment_distrib;
pub mod branch;
pub mod jump_process;
pub mod tree_dp;
