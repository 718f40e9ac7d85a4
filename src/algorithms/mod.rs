pub mod dtw;
pub mod envelope;
pub mod lower_bounds;
#[cfg(feature = "parallel")]
pub mod parallel;
pub mod query;
pub mod search;
pub mod window;
