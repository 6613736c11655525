use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::service::study_hall::TimerSnapshot;

pub mod progress;

#[derive(Debug, Serialize)]
pub struct PostSummaryOut {
    pub id: i64,
    pub uuid: String,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub difficulty: Option<String>,
    pub time_estimate: Option<String>,
    pub time_label: String,
    pub tags: Vec<String>,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct StepOut {
    pub index: usize,
    pub number: usize,
    pub task: String,
    pub details_html: String,
    pub completed: bool,
}

#[derive(Debug, Serialize)]
pub struct ResearchLinks {
    pub tutorials: String,
    pub academic: String,
}

#[derive(Debug, Serialize)]
pub struct PostDetailOut {
    pub id: i64,
    pub uuid: String,
    pub title: String,
    pub description: Option<String>,
    pub content_html: String,
    pub category: String,
    pub difficulty: Option<String>,
    pub time_estimate: Option<String>,
    pub time_label: String,
    pub tags: Vec<String>,
    pub steps: Vec<StepOut>,
    pub progress_percent: u32,
    pub research_links: ResearchLinks,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct PageResp<T> {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub has_more: bool,
    pub items: Vec<T>,
}

#[derive(Debug, Serialize)]
pub struct StudyHallOut {
    pub focus_minutes: u32,
    pub break_minutes: u32,
    pub timer: TimerSnapshot,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PostListQuery {
    pub search: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PostDetailQuery {
    /// Comma separated step indices the reader has ticked off locally.
    pub completed: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    #[default]
    CreatedAt,
    Title,
    Difficulty,
    TimeEstimate,
}

impl SortField {
    pub fn column(self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::Title => "title",
            SortField::Difficulty => "difficulty",
            SortField::TimeEstimate => "time_estimate",
        }
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "created_at" => Ok(SortField::CreatedAt),
            "title" => Ok(SortField::Title),
            "difficulty" => Ok(SortField::Difficulty),
            "time_estimate" => Ok(SortField::TimeEstimate),
            other => Err(format!("unsupported sort field: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn keyword(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("unsupported sort order: {other}")),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}
