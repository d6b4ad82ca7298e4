mod engine;

pub use engine::StreakEngine;
