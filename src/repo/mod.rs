pub mod migrations;
pub mod posts;
