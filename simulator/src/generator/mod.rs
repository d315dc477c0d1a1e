pub mod chart;
pub mod profile;
