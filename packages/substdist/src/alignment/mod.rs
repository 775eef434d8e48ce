pub mod seq_index;
pub mod sufficient_stats;
