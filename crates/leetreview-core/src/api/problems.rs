//! Problem tracking and review queue endpoints under `/problems`.

use reqwest::Method;
use serde::Serialize;

use crate::models::{Problem, ProblemPage, ProblemQuery, ProblemStats, ProblemUpdate};

use super::{ApiError, Gateway};

/// Largest postponement the server accepts, in days
pub const MAX_POSTPONE_DAYS: u32 = 30;

#[derive(Serialize)]
struct AddProblemRequest {
    problem_number: u32,
}

#[derive(Serialize)]
struct PostponeQuery {
    days: u32,
}

impl Gateway {
    pub async fn list_problems(&self, query: &ProblemQuery) -> Result<ProblemPage, ApiError> {
        let query = query.clone().normalized();
        self.request(Method::GET, "/problems", |rb| rb.query(&query))
            .await
    }

    /// Start tracking a LeetCode problem by its number
    pub async fn add_problem(&self, problem_number: u32) -> Result<Problem, ApiError> {
        if problem_number == 0 {
            return Err(ApiError::InvalidRequest(
                "Problem number must be positive".to_string(),
            ));
        }
        let body = AddProblemRequest { problem_number };
        self.request(Method::POST, "/problems", |rb| rb.json(&body))
            .await
    }

    pub async fn update_problem(&self, problem_id: i64, update: &ProblemUpdate) -> Result<Problem, ApiError> {
        if update.is_empty() {
            return Err(ApiError::InvalidRequest("Nothing to update".to_string()));
        }
        let path = format!("/problems/{}", problem_id);
        self.request(Method::PUT, &path, |rb| rb.json(update)).await
    }

    /// Problems due for review today
    pub async fn review_queue(&self) -> Result<Vec<Problem>, ApiError> {
        self.get("/problems/review").await
    }

    /// Advance a problem to its next review stage
    pub async fn complete_review(&self, problem_id: i64) -> Result<Problem, ApiError> {
        let path = format!("/problems/{}/complete", problem_id);
        self.request(Method::POST, &path, |rb| rb).await
    }

    /// Push the next review back by `days` (1..=30)
    pub async fn postpone_review(&self, problem_id: i64, days: u32) -> Result<Problem, ApiError> {
        if !(1..=MAX_POSTPONE_DAYS).contains(&days) {
            return Err(ApiError::InvalidRequest(format!(
                "Postpone days must be between 1 and {}, got {}",
                MAX_POSTPONE_DAYS, days
            )));
        }
        let path = format!("/problems/{}/postpone", problem_id);
        let query = PostponeQuery { days };
        self.request(Method::POST, &path, |rb| rb.query(&query))
            .await
    }

    pub async fn problem_stats(&self) -> Result<ProblemStats, ApiError> {
        self.get("/problems/stats").await
    }
}
