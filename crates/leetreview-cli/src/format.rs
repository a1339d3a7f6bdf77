//! Plain-text rendering of problems and statistics.

use chrono::NaiveDate;

use leetreview_core::models::{Difficulty, Problem, ProblemStats, User};

/// Widest title shown in a table row
const TITLE_WIDTH: usize = 40;

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Describe a review date relative to `today`
pub fn format_due(date: NaiveDate, today: NaiveDate) -> String {
    match (date - today).num_days() {
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        -1 => "yesterday".to_string(),
        n if n < 0 => format!("{} days overdue", -n),
        n => format!("in {} days", n),
    }
}

pub fn problem_header() -> String {
    format!(
        "{:>6}  {:>6}  {:<width$}  {:<6}  {:<5}  {}",
        "ID",
        "#",
        "Title",
        "Diff",
        "Stage",
        "Next review",
        width = TITLE_WIDTH
    )
}

pub fn problem_row(problem: &Problem, today: NaiveDate) -> String {
    let due = if problem.is_active {
        format!(
            "{} ({})",
            problem.next_review_date.format("%b %d, %Y"),
            format_due(problem.next_review_date, today)
        )
    } else {
        "-".to_string()
    };
    format!(
        "{:>6}  {:>6}  {:<width$}  {:<6}  {:<5}  {}",
        problem.problem_id,
        problem.leetcode_number,
        truncate_string(&problem.title, TITLE_WIDTH),
        problem.difficulty.as_str(),
        problem.stage_display(),
        due,
        width = TITLE_WIDTH
    )
}

pub fn problem_table(problems: &[Problem], today: NaiveDate) -> String {
    let mut lines = vec![problem_header()];
    lines.extend(problems.iter().map(|p| problem_row(p, today)));
    lines.join("\n")
}

pub fn stats_summary(stats: &ProblemStats) -> String {
    let mut lines = vec![
        format!("Total problems:  {}", stats.total_problems),
        format!("  In rotation:   {}", stats.active_problems),
        format!("  Completed:     {}", stats.completed_problems),
    ];
    let by_difficulty: Vec<String> = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard]
        .into_iter()
        .map(|d| format!("{} {}", d, stats.count_for(d)))
        .collect();
    lines.push(format!("By difficulty:   {}", by_difficulty.join(" / ")));
    lines.join("\n")
}

pub fn user_summary(user: &User) -> String {
    format!(
        "{}\n  Reminder time: {}\n  Timezone:      {}",
        user.email, user.notification_time, user.timezone
    )
}
