//! Subcommand handlers. Every handler first asks the router whether its
//! page is reachable with the current session, mirroring how the web
//! client guards its pages.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context as _, Result};
use chrono::Local;
use clap::{Args, Subcommand};
use tracing::{debug, warn};

use leetreview_core::api::ApiError;
use leetreview_core::models::{Difficulty, ProblemQuery, ProblemStatus, ProblemUpdate, UserUpdate};
use leetreview_core::{Config, Navigation, RedirectSlot, Route, SessionError, SessionManager};

use crate::format;

/// Password source that skips the interactive prompt
pub const ENV_PASSWORD: &str = "LEETREVIEW_PASSWORD";

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in and remember the token
    Login {
        #[arg(long)]
        email: Option<String>,
    },
    /// Create an account and sign in
    Register {
        #[arg(long)]
        email: Option<String>,
        /// Daily reminder time, HH:MM (24h)
        #[arg(long)]
        notification_time: Option<String>,
        /// IANA timezone name, e.g. Europe/Paris
        #[arg(long)]
        timezone: Option<String>,
    },
    /// Forget the stored token
    Logout,
    /// Show who is signed in
    Whoami,
    /// Show or change reminder settings
    Settings {
        #[arg(long)]
        notification_time: Option<String>,
        #[arg(long)]
        timezone: Option<String>,
    },
    /// Change the account password
    ResetPassword {
        #[arg(long)]
        email: Option<String>,
    },
    /// Statistics and today's reviews
    Dashboard,
    Problems(ProblemsCommand),
    Review(ReviewCommand),
}

#[derive(Args, Debug)]
pub struct ProblemsCommand {
    #[command(subcommand)]
    command: ProblemsSubcommand,
}

#[derive(Subcommand, Debug)]
enum ProblemsSubcommand {
    /// List tracked problems
    List {
        /// easy, medium or hard
        #[arg(long)]
        difficulty: Option<Difficulty>,
        /// active or completed
        #[arg(long)]
        status: Option<ProblemStatus>,
        #[arg(long)]
        skip: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Start tracking a LeetCode problem by number
    Add { number: u32 },
    /// Edit a tracked problem
    Update {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        difficulty: Option<Difficulty>,
        #[arg(long)]
        notes: Option<String>,
    },
}

#[derive(Args, Debug)]
pub struct ReviewCommand {
    #[command(subcommand)]
    command: ReviewSubcommand,
}

#[derive(Subcommand, Debug)]
enum ReviewSubcommand {
    /// Problems due today
    List,
    /// Mark a review as done and advance the stage
    Complete { id: i64 },
    /// Push a review back
    Postpone {
        id: i64,
        #[arg(long, default_value_t = 1)]
        days: u32,
    },
}

/// Everything a handler needs
pub struct Context {
    pub session: SessionManager,
    pub redirects: Arc<RedirectSlot>,
    pub config: Config,
}

/// Turn a client error into the message shown to the user
trait UserFacing<T> {
    fn user_facing(self) -> Result<T>;
}

impl<T> UserFacing<T> for Result<T, ApiError> {
    fn user_facing(self) -> Result<T> {
        self.map_err(|e| anyhow!(e.user_message()))
    }
}

impl<T> UserFacing<T> for Result<T, SessionError> {
    fn user_facing(self) -> Result<T> {
        self.map_err(|e| anyhow!(e.user_message()))
    }
}

impl Command {
    /// Commands that sign in; a 401 there means bad credentials, not an
    /// expired session
    fn signs_in(&self) -> bool {
        matches!(self, Command::Login { .. } | Command::Register { .. })
    }
}

pub async fn run(ctx: &mut Context, command: Command) -> Result<()> {
    let signs_in = command.signs_in();
    let result = dispatch(ctx, command).await;

    // A rejected credential during the command sends the user to login
    let redirect = ctx.redirects.take();
    if let Some(route) = redirect {
        debug!(%route, "Redirect requested");
    }
    if let Some(notice) = redirect_notice(redirect, signs_in) {
        eprintln!("{}", notice);
    }
    result
}

fn redirect_notice(redirect: Option<Route>, signs_in: bool) -> Option<&'static str> {
    match redirect {
        Some(Route::Login) if !signs_in => {
            Some("Your session has expired. Run `leetreview login` to sign in again.")
        }
        _ => None,
    }
}

async fn dispatch(ctx: &mut Context, command: Command) -> Result<()> {
    match command {
        Command::Login { email } => login(ctx, email).await,
        Command::Register {
            email,
            notification_time,
            timezone,
        } => register(ctx, email, notification_time, timezone).await,
        Command::Logout => {
            ctx.session.logout();
            println!("Logged out.");
            Ok(())
        }
        Command::Whoami => {
            match ctx.session.user() {
                Some(user) => println!("{}", format::user_summary(&user)),
                None => println!("Not logged in."),
            }
            Ok(())
        }
        Command::Settings {
            notification_time,
            timezone,
        } => settings(ctx, notification_time, timezone).await,
        Command::ResetPassword { email } => reset_password(ctx, email).await,
        Command::Dashboard => dashboard(ctx).await,
        Command::Problems(cmd) => problems(ctx, cmd.command).await,
        Command::Review(cmd) => review(ctx, cmd.command).await,
    }
}

/// Check the router before running a page's command. Returns `false` (after
/// telling the user why) when the page is not reachable.
fn enter(ctx: &Context, route: Route) -> bool {
    match ctx.session.navigate(route.path()) {
        Navigation::Render(_) => true,
        Navigation::Redirect(Route::Login) => {
            println!("You are not logged in. Run `leetreview login` first.");
            false
        }
        Navigation::Redirect(Route::Dashboard) => {
            let who = ctx.session.user().map(|u| u.email).unwrap_or_default();
            println!("Already logged in as {}. Run `leetreview logout` first.", who);
            false
        }
        Navigation::Redirect(other) => {
            println!("Redirected to {}.", other);
            false
        }
        Navigation::Pending | Navigation::NotFound => {
            warn!(%route, "Route could not be resolved");
            false
        }
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read input")?;
    let value = line.trim().to_string();
    if value.is_empty() {
        bail!("{} is required", label);
    }
    Ok(value)
}

fn prompt_password(label: &str) -> Result<String> {
    if let Ok(password) = std::env::var(ENV_PASSWORD) {
        return Ok(password);
    }
    let password = rpassword::prompt_password(format!("{}: ", label))
        .context("Failed to read password")?;
    if password.is_empty() {
        bail!("{} is required", label);
    }
    Ok(password)
}

fn email_or_prompt(ctx: &Context, email: Option<String>) -> Result<String> {
    match email.or_else(|| ctx.config.last_email.clone()) {
        Some(email) => Ok(email),
        None => prompt("Email"),
    }
}

fn remember_email(ctx: &mut Context, email: &str) {
    if ctx.config.last_email.as_deref() == Some(email) {
        return;
    }
    ctx.config.last_email = Some(email.to_string());
    if let Err(e) = ctx.config.save() {
        warn!(error = %e, "Failed to save config");
    }
}

async fn login(ctx: &mut Context, email: Option<String>) -> Result<()> {
    if !enter(ctx, Route::Login) {
        return Ok(());
    }
    let email = email_or_prompt(ctx, email)?;
    let password = prompt_password("Password")?;

    let user = ctx.session.login(&email, &password).await.user_facing()?;
    remember_email(ctx, &user.email);
    println!("Logged in as {}.", user.email);
    Ok(())
}

async fn register(
    ctx: &mut Context,
    email: Option<String>,
    notification_time: Option<String>,
    timezone: Option<String>,
) -> Result<()> {
    if !enter(ctx, Route::Register) {
        return Ok(());
    }
    let email = match email {
        Some(email) => email,
        None => prompt("Email")?,
    };
    let password = prompt_password("Password")?;

    let user = ctx
        .session
        .register(&email, &password, notification_time.as_deref(), timezone.as_deref())
        .await
        .user_facing()?;
    remember_email(ctx, &user.email);
    println!("Account created.\n{}", format::user_summary(&user));
    Ok(())
}

async fn settings(
    ctx: &mut Context,
    notification_time: Option<String>,
    timezone: Option<String>,
) -> Result<()> {
    if !enter(ctx, Route::Settings) {
        return Ok(());
    }
    let mut update = UserUpdate::default();
    if let Some(time) = notification_time {
        update = update.with_notification_time(time);
    }
    if let Some(tz) = timezone {
        update = update.with_timezone(tz);
    }

    let user = if update.is_empty() {
        ctx.session.user().ok_or_else(|| anyhow!("Not logged in"))?
    } else {
        let user = ctx.session.update_user(update).await.user_facing()?;
        println!("Settings updated successfully.");
        user
    };
    println!("{}", format::user_summary(&user));
    Ok(())
}

async fn reset_password(ctx: &mut Context, email: Option<String>) -> Result<()> {
    let email = match email.or_else(|| ctx.session.user().map(|u| u.email)) {
        Some(email) => email,
        None => email_or_prompt(ctx, None)?,
    };
    let old_password = prompt_password("Current password")?;
    let new_password = rpassword::prompt_password("New password: ")
        .context("Failed to read password")?;
    let confirm = rpassword::prompt_password("Confirm new password: ")
        .context("Failed to read password")?;
    if new_password != confirm {
        bail!("Passwords do not match");
    }

    ctx.session
        .reset_password(&email, &old_password, &new_password)
        .await
        .user_facing()?;
    println!("Password updated.");
    Ok(())
}

async fn dashboard(ctx: &mut Context) -> Result<()> {
    if !enter(ctx, Route::Dashboard) {
        return Ok(());
    }
    let api = ctx.session.gateway();
    let (stats, queue) = futures::join!(api.problem_stats(), api.review_queue());
    let stats = stats.user_facing()?;
    let queue = queue.user_facing()?;

    println!("{}", format::stats_summary(&stats));
    println!();
    if queue.is_empty() {
        println!("No reviews due today.");
    } else {
        println!("Today's reviews ({}):", queue.len());
        println!("{}", format::problem_table(&queue, Local::now().date_naive()));
    }
    Ok(())
}

async fn problems(ctx: &mut Context, command: ProblemsSubcommand) -> Result<()> {
    if !enter(ctx, Route::Problems) {
        return Ok(());
    }
    let api = ctx.session.gateway();
    let today = Local::now().date_naive();

    match command {
        ProblemsSubcommand::List {
            difficulty,
            status,
            skip,
            limit,
        } => {
            let query = ProblemQuery {
                difficulty,
                status,
                skip,
                limit,
            };
            let page = api.list_problems(&query).await.user_facing()?;
            if page.problems.is_empty() {
                println!("No problems found.");
            } else {
                println!("{}", format::problem_table(&page.problems, today));
                let shown = skip.unwrap_or(0) as u64 + page.problems.len() as u64;
                println!("\nShowing {} of {}", shown.min(page.total), page.total);
            }
        }
        ProblemsSubcommand::Add { number } => {
            let problem = api.add_problem(number).await.user_facing()?;
            println!(
                "Added #{} {} ({}). First review {}.",
                problem.leetcode_number,
                problem.title,
                problem.difficulty,
                format::format_due(problem.next_review_date, today)
            );
        }
        ProblemsSubcommand::Update {
            id,
            title,
            difficulty,
            notes,
        } => {
            let update = ProblemUpdate {
                title,
                difficulty,
                notes,
            };
            if update.is_empty() {
                bail!("Nothing to update; pass --title, --difficulty or --notes");
            }
            let problem = api.update_problem(id, &update).await.user_facing()?;
            println!("{}", format::problem_table(&[problem], today));
        }
    }
    Ok(())
}

async fn review(ctx: &mut Context, command: ReviewSubcommand) -> Result<()> {
    if !enter(ctx, Route::Review) {
        return Ok(());
    }
    let api = ctx.session.gateway();
    let today = Local::now().date_naive();

    match command {
        ReviewSubcommand::List => {
            let queue = api.review_queue().await.user_facing()?;
            if queue.is_empty() {
                println!("No reviews due today.");
            } else {
                println!("{}", format::problem_table(&queue, today));
            }
        }
        ReviewSubcommand::Complete { id } => {
            let problem = api.complete_review(id).await.user_facing()?;
            if problem.is_active {
                println!(
                    "Review recorded. Stage {}; next review {}.",
                    problem.stage_display(),
                    format::format_due(problem.next_review_date, today)
                );
            } else {
                println!("Review recorded. {} is complete.", problem.title);
            }
        }
        ReviewSubcommand::Postpone { id, days } => {
            let problem = api.postpone_review(id, days).await.user_facing()?;
            println!(
                "Postponed {}; next review {}.",
                problem.title,
                format::format_due(problem.next_review_date, today)
            );
        }
    }
    Ok(())
}
