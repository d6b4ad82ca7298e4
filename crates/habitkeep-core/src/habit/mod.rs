mod engine;

pub use engine::{CreateHabit, HabitEngine};
