pub mod input;
pub mod output;
pub mod posterior;
pub mod prior;
pub mod split;
