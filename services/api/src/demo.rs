use crate::infra::build_service;
use chrono::{Local, NaiveDate};
use clap::Args;
use safety_net::config::AppConfig;
use safety_net::error::AppError;
use safety_net::workflows::intervention::{
    BatchReport, DeliverableContent, InterventionPlan, InterventionReport, Language, StudentId,
};
use serde::Serialize;

#[derive(Args, Debug)]
pub(crate) struct AssessArgs {
    /// Roster id of the student to assess
    #[arg(long)]
    pub(crate) student_id: u32,
    /// Language for the home-visit script (defaults to Hindi)
    #[arg(long)]
    pub(crate) language: Option<Language>,
    /// Evaluation date used to window exam history (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
    /// Score and select actions without calling the generators
    #[arg(long)]
    pub(crate) plan_only: bool,
    /// Print the result as JSON instead of a readable summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Evaluation date used to window exam history (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
    /// Language for the home-visit scripts (defaults to Hindi)
    #[arg(long)]
    pub(crate) language: Option<Language>,
    /// Skip the roster-wide batch summary at the end of the demo
    #[arg(long)]
    pub(crate) skip_batch: bool,
}

const HIGH_RISK_STUDENT: StudentId = StudentId(1);
const ACADEMIC_WATCH_STUDENT: StudentId = StudentId(3);

pub(crate) async fn run_assess(args: AssessArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let as_of = args.as_of.unwrap_or_else(|| Local::now().date_naive());
    let (service, _) = build_service(&config, as_of)?;

    let student_id = StudentId(args.student_id);
    let language = args.language.unwrap_or_default();

    if args.plan_only {
        let plan = service.plan(student_id, language)?;
        if args.json {
            print_json(&plan);
        } else {
            render_plan(&plan);
        }
    } else {
        let report = service.intervene(student_id, language).await?;
        if args.json {
            print_json(&report);
        } else {
            render_report(&report);
        }
    }

    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        as_of,
        language,
        skip_batch,
    } = args;

    let config = AppConfig::load()?;
    let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());
    let language = language.unwrap_or_default();
    let (service, repository) = build_service(&config, as_of)?;

    println!("Rural education safety net demo (as of {as_of})");
    if config.generator.api_key.is_none() {
        println!("Text generation is not configured; scripts and plans show placeholders.");
    }

    println!("\nScenario 1: economic and social distress");
    let report = service.intervene(HIGH_RISK_STUDENT, language).await?;
    render_report(&report);

    println!("\nScenario 2: sudden drop in Math");
    let report = service.intervene(ACADEMIC_WATCH_STUDENT, language).await?;
    render_report(&report);

    if !skip_batch {
        let batch = service
            .intervene_batch(repository.student_ids(), language)
            .await;
        render_batch(&batch);
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(err) => println!("JSON output unavailable: {err}"),
    }
}

fn render_plan(plan: &InterventionPlan) {
    let tier = plan.tier();
    println!("{} (student {})", plan.student_name, plan.student_id);
    println!(
        "  Status: {} (score {}/100)",
        tier.headline(),
        plan.assessment.score
    );
    println!("  {}", tier.guidance());

    if !plan.assessment.reasons.is_empty() {
        println!("  Risk factors:");
        for reason in &plan.assessment.reasons {
            println!("    - {reason}");
        }
    }

    let academic = &plan.metrics.academic;
    if academic.is_recorded() {
        println!(
            "  Attendance {}% | weakest subject {} at {} (was {})",
            plan.metrics.attendance_percent,
            academic.weakest_subject,
            academic.current_score,
            academic.previous_score
        );
    } else {
        println!(
            "  Attendance {}% | no exam records",
            plan.metrics.attendance_percent
        );
    }

    match &plan.matched_scheme {
        Some(scheme) => println!("  Eligible scheme: {scheme}"),
        None => println!("  Eligible scheme: none"),
    }
    println!("  Actions: {}", action_summary(plan));
}

fn render_report(report: &InterventionReport) {
    render_plan(&report.plan);
    for deliverable in &report.deliverables {
        let label = deliverable.kind.label();
        match &deliverable.content {
            DeliverableContent::Text { body } => {
                println!("  [{label}]");
                println!("{}", indent(body, "    "));
            }
            DeliverableContent::Document { path, content_type } => {
                println!("  [{label}] {} ({content_type})", path.display());
            }
            DeliverableContent::Failed { placeholder, error } => {
                println!("  [{label}] {placeholder} ({error})");
            }
        }
    }
}

fn render_batch(batch: &BatchReport) {
    let summary = &batch.summary;
    println!("\nRoster summary");
    println!(
        "- {} evaluated | {} high risk | {} academic watch | {} normal | {} failed",
        summary.evaluated,
        summary.high_risk,
        summary.academic_watch,
        summary.normal,
        summary.failed
    );
    for report in &batch.reports {
        println!(
            "  - {} ({}): {} [{}]",
            report.plan.student_name,
            report.plan.student_id,
            report.plan.tier().headline(),
            action_summary(&report.plan)
        );
    }
    for failure in &batch.failures {
        println!(
            "  - student {}: {} ({})",
            failure.student_id, failure.error_kind, failure.error
        );
    }
}

fn action_summary(plan: &InterventionPlan) -> String {
    if plan.actions.is_empty() {
        return "none".to_string();
    }
    plan.actions
        .iter()
        .map(|action| action.kind().label())
        .collect::<Vec<_>>()
        .join(", ")
}

fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| format!("{prefix}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
