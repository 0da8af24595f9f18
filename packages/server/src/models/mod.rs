pub mod contest;
pub mod display;
pub mod phase;
pub mod problem_display;
pub mod shared;
pub mod transfer;
