pub mod contest;
pub mod contest_display_data;
pub mod contest_problem;
pub mod phase;
pub mod phase_problem;
pub mod problem;
pub mod problem_display_data;
