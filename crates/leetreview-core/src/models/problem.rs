use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Number of review stages before a problem is retired
pub const REVIEW_STAGES: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    #[serde(alias = "EASY", alias = "easy")]
    Easy,
    #[serde(alias = "MEDIUM", alias = "medium")]
    Medium,
    #[serde(alias = "HARD", alias = "hard")]
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty '{}' (expected easy, medium or hard)", other)),
        }
    }
}

/// List filter on whether a problem is still in rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProblemStatus {
    Active,
    Completed,
}

impl fmt::Display for ProblemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProblemStatus::Active => write!(f, "active"),
            ProblemStatus::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for ProblemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(ProblemStatus::Active),
            "completed" => Ok(ProblemStatus::Completed),
            other => Err(format!("unknown status '{}' (expected active or completed)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub problem_id: i64,
    pub leetcode_number: i64,
    pub title: String,
    pub difficulty: Difficulty,
    pub first_study_date: NaiveDate,
    pub next_review_date: NaiveDate,
    #[serde(default)]
    pub stage: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl Problem {
    /// Whether the problem belongs in the review queue on `today`
    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.is_active && self.next_review_date <= today
    }

    /// Days until the next review; negative when overdue
    pub fn days_until_review(&self, today: NaiveDate) -> i64 {
        (self.next_review_date - today).num_days()
    }

    pub fn stage_display(&self) -> String {
        if self.is_active {
            format!("{}/{}", self.stage, REVIEW_STAGES)
        } else {
            "done".to_string()
        }
    }
}

/// One page of `GET /problems`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProblemPage {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub problems: Vec<Problem>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProblemStats {
    #[serde(default)]
    pub total_problems: u64,
    #[serde(default)]
    pub active_problems: u64,
    #[serde(default)]
    pub completed_problems: u64,
    #[serde(default, alias = "by_difficulty")]
    pub difficulty_distribution: BTreeMap<String, u64>,
}

impl ProblemStats {
    pub fn count_for(&self, difficulty: Difficulty) -> u64 {
        self.difficulty_distribution
            .iter()
            .filter(|(name, _)| name.parse::<Difficulty>().ok() == Some(difficulty))
            .map(|(_, count)| *count)
            .sum()
    }
}

/// Server-side page size when `limit` is omitted
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Largest page the server accepts
pub const MAX_PAGE_SIZE: u32 = 100;

/// Query parameters of `GET /problems`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProblemQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProblemStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl ProblemQuery {
    /// Clamp `limit` into the range the server validates against
    pub fn normalized(mut self) -> Self {
        self.limit = self.limit.map(|l| l.clamp(1, MAX_PAGE_SIZE));
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProblemUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ProblemUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.difficulty.is_none() && self.notes.is_none()
    }
}
