pub mod calendar;
pub mod fitness;
pub mod query;
pub mod sample;
pub mod task;
