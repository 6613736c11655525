pub mod cleanup;
pub mod generate;
pub mod posts;
pub mod study_hall;
