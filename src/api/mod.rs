pub mod health;
pub mod posts;
pub mod study_hall;
