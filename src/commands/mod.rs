mod aggregate;
mod clean;
mod compare;

pub use aggregate::run_aggregate;
pub use clean::run_clean;
pub use compare::run_compare;
