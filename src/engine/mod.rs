pub mod goals;
pub mod score;
pub mod streak;

pub use goals::GoalStore;
pub use score::{compute_overall_score, compute_section_score, ScoreBoard};
pub use streak::StreakEngine;
