pub mod gemini;
pub mod keywords;
pub mod markdown;
pub mod time_estimate;
