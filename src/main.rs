mod analyze;
mod github;
mod model;
mod report;
mod utils;

use crate::analyze::OrgSummary;
use crate::github::client::GITHUB_API_BASE_URL;
use crate::github::{normalize, EndpointKind, GithubClient};
use crate::model::{
    DailyOrgMetric, DailyUserMetric, DateRange, OwnerKind, ReportModel, RequestScope, Result, Seat,
};
use crate::report::{build_report, table, write_report, OutputFormat};
use crate::utils::{MultiProgressNew, ProgressStyleTemplate};
use chrono::{NaiveDate, Utc};
use clap::Parser;
use indicatif::{MultiProgress, ProgressBar};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "copilot-metrics", about = "GitHub Copilot usage metrics report generator")]
struct Args {
    /// Report a single day (YYYY-MM-DD) instead of the trailing window.
    #[arg(long = "day")]
    day: Option<NaiveDate>,
    /// Report the trailing 28-day window explicitly.
    #[arg(long = "window")]
    window: bool,
    /// Fetch per-user daily metrics.
    #[arg(long = "users")]
    users: bool,
    /// Fetch the assigned-seat list.
    #[arg(long = "seats")]
    seats: bool,
    /// Build the per-user usage breakdown (implies --users and --seats).
    #[arg(long = "breakdown")]
    breakdown: bool,
    #[arg(long = "org", env = "GITHUB_ORG")]
    org: Option<String>,
    /// Report on an enterprise instead of an organization.
    #[arg(long = "enterprise", env = "GITHUB_ENTERPRISE")]
    enterprise: Option<String>,
    #[arg(long = "token", env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,
    #[arg(long = "format", value_enum, default_value = "json", env = "OUTPUT_FORMAT")]
    format: OutputFormat,
    #[arg(long = "output", default_value = "./reports", env = "OUTPUT_DIR")]
    output: PathBuf,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    if let Err(error) = run(&args).await {
        eprintln!("❌ {error}");
        std::process::exit(1);
    }
}

async fn run(args: &Args) -> Result<()> {
    let scope = resolve_scope(args)?;
    let client = GithubClient::new(GITHUB_API_BASE_URL, &scope.credential)?;

    let want_users = args.users || args.breakdown;
    let want_seats = args.seats || args.breakdown;
    let (org_metrics, user_metrics, seats) =
        fetch_sections(&client, &scope, want_users, want_seats).await?;

    let report = build_report(scope, org_metrics, user_metrics, seats, args.breakdown)?;
    let artifact = write_report(&report, args.format, &args.output)?;

    print_report(&report);
    println!("\n✅ Report written to {}", artifact.display());
    Ok(())
}

fn resolve_scope(args: &Args) -> Result<RequestScope> {
    let range = DateRange::from_flags(args.day, args.window, Utc::now().date_naive())?;
    let credential = args.token.clone().unwrap_or_default();
    match &args.enterprise {
        Some(name) => RequestScope::new(OwnerKind::Enterprise, name, &credential, range),
        None => RequestScope::new(
            OwnerKind::Organization,
            args.org.clone().unwrap_or_default(),
            &credential,
            range,
        ),
    }
}

async fn fetch_sections(
    client: &GithubClient,
    scope: &RequestScope,
    want_users: bool,
    want_seats: bool,
) -> Result<(Vec<DailyOrgMetric>, Option<Vec<DailyUserMetric>>, Option<Vec<Seat>>)> {
    let multi_progress = MultiProgress::default();

    let org_pb = multi_progress.add_with_style(
        ProgressBar::new_spinner(),
        ProgressStyleTemplate::page_counter(),
    );
    org_pb.set_message(format!("Org metrics `{}`", scope.owner_name));
    let org_task = tokio::spawn(fetch_org_metrics(client.clone(), scope.clone(), org_pb));

    let users_task = want_users.then(|| {
        let pb = multi_progress.add_with_style(
            ProgressBar::new_spinner(),
            ProgressStyleTemplate::page_counter(),
        );
        pb.set_message("User metrics");
        tokio::spawn(fetch_user_metrics(client.clone(), scope.clone(), pb))
    });
    let seats_task = want_seats.then(|| {
        let pb = multi_progress.add_with_style(
            ProgressBar::new_spinner(),
            ProgressStyleTemplate::page_counter(),
        );
        pb.set_message("Seats");
        tokio::spawn(fetch_seats(client.clone(), scope.clone(), pb))
    });

    let (org_metrics, user_metrics, seats) =
        futures::join!(org_task, join_optional(users_task), join_optional(seats_task));
    Ok((org_metrics??, user_metrics?, seats?))
}

async fn join_optional<T>(task: Option<tokio::task::JoinHandle<Result<T>>>) -> Result<Option<T>> {
    match task {
        Some(task) => Ok(Some(task.await??)),
        None => Ok(None),
    }
}

async fn fetch_org_metrics(
    client: GithubClient,
    scope: RequestScope,
    pb: ProgressBar,
) -> Result<Vec<DailyOrgMetric>> {
    let progress_pb = pb.clone();
    let records = client
        .fetch_all(
            EndpointKind::OrgMetrics,
            &format!("{}/copilot/metrics", scope.base_path()),
            scope.range.query(),
            Box::new(move |page| progress_pb.set_position(page)),
        )
        .await?;
    let metrics = normalize::org_metrics(&records)?;
    pb.set_style(ProgressStyleTemplate::only_message());
    pb.finish_with_message(format!("✅ Org metrics ({} days)", metrics.len()));
    Ok(metrics)
}

async fn fetch_user_metrics(
    client: GithubClient,
    scope: RequestScope,
    pb: ProgressBar,
) -> Result<Vec<DailyUserMetric>> {
    let progress_pb = pb.clone();
    let records = client
        .fetch_all(
            EndpointKind::UserMetrics,
            &format!("{}/copilot/metrics/users", scope.base_path()),
            scope.range.query(),
            Box::new(move |page| progress_pb.set_position(page)),
        )
        .await?;
    let metrics = normalize::user_metrics(&records)?;
    pb.set_style(ProgressStyleTemplate::only_message());
    pb.finish_with_message(format!("✅ User metrics ({} records)", metrics.len()));
    Ok(metrics)
}

async fn fetch_seats(client: GithubClient, scope: RequestScope, pb: ProgressBar) -> Result<Vec<Seat>> {
    let progress_pb = pb.clone();
    let records = client
        .fetch_all(
            EndpointKind::Seats,
            &format!("{}/copilot/billing/seats", scope.base_path()),
            vec![("per_page".to_string(), "50".to_string())],
            Box::new(move |page| progress_pb.set_position(page)),
        )
        .await?;
    let seats = normalize::seats(&records)?;
    pb.set_style(ProgressStyleTemplate::only_message());
    pb.finish_with_message(format!("✅ Seats ({} assigned)", seats.len()));
    Ok(seats)
}

fn print_report(report: &ReportModel) {
    let summary = OrgSummary::from_metrics(report.org_metrics.iter());
    println!(
        "\n📈 {} `{}`: {} to {}",
        report.scope.owner.label(),
        report.scope.owner_name,
        report.scope.range.since().format("%Y-%m-%d"),
        report.scope.range.until().format("%Y-%m-%d"),
    );
    println!(
        "   {} days | {} suggestions | {} acceptances ({})",
        summary.days,
        summary.total_suggestions,
        summary.total_acceptances,
        summary
            .acceptance_rate()
            .map(|rate| format!("{rate:.1}%"))
            .unwrap_or_else(|| "N/A".to_string()),
    );

    if let Some(breakdown) = &report.breakdown {
        println!("\n📊 Usage breakdown");
        for row in breakdown {
            println!(
                "{} {:<22} {:>8} interactions {:>8} code gen {:>14} {}",
                row.indicator.glyph(),
                row.login,
                row.interactions,
                row.code_generations,
                row.included_requests_cell(),
                row.editor.as_deref().unwrap_or("N/A"),
            );
            println!("   {}", table::usage_bar(row.percent_of_quota));
            if row.pending_cancellation {
                println!("   ⚠️  pending cancellation");
            }
        }
    } else if let Some(seats) = &report.seats {
        println!("\n👥 Seats");
        for seat in seats {
            println!(
                "{:<25} assigned {:<12} last activity {:<12} {}",
                seat.login,
                seat.assigned_at
                    .map(|at| at.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "N/A".to_string()),
                seat.last_activity_at
                    .map(|at| at.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "no activity".to_string()),
                if seat.pending_cancellation {
                    "⚠️ pending cancellation"
                } else {
                    ""
                },
            );
        }
    }

    println!(
        "\n   👥 {} seats | 💬 {} interactions | 💻 {} code generations",
        report.summary.total_users,
        report.summary.total_interactions,
        report.summary.total_code_generations,
    );
}
