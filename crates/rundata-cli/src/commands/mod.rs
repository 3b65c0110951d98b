pub mod plan;
pub mod rundata;
