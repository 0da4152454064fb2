use crate::error::OutputError;
use crate::planner::ComprehensivePlan;
use crate::risk::IndicatorStatus;
use std::fs;
use std::path::{Path, PathBuf};

/// Write a plan as `<project>-v<N>.md` plus the full plan as JSON. Returns the
/// markdown path.
pub fn write_plan_report(
    report_dir: &Path,
    plan: &ComprehensivePlan,
) -> Result<PathBuf, OutputError> {
    fs::create_dir_all(report_dir).map_err(OutputError::CreateDir)?;

    let stem = format!("{}-v{}", plan.project_id, plan.version);
    let report_path = report_dir.join(format!("{}.md", stem));
    fs::write(&report_path, render_markdown(plan)).map_err(OutputError::WriteReport)?;

    let json_path = report_dir.join(format!("{}.json", stem));
    let json = serde_json::to_string_pretty(plan)?;
    fs::write(&json_path, json).map_err(OutputError::WriteReport)?;

    Ok(report_path)
}

pub fn render_markdown(plan: &ComprehensivePlan) -> String {
    let schedule = &plan.schedule;
    let budget = &plan.budget;
    let risk = &plan.risk;
    let mut content = String::new();

    // Header
    content.push_str(&format!(
        "# {}: plan v{}\n\n",
        plan.snapshot.project.name, plan.version
    ));
    content.push_str(&format!(
        "Generated {} (priority: {}, aggressiveness: {})\n\n",
        plan.created_at.to_rfc3339(),
        plan.options.priority,
        plan.options.aggressiveness
    ));

    content.push_str("| Metric | Value |\n");
    content.push_str("|--------|-------|\n");
    content.push_str(&format!(
        "| Feasibility | {:.1} ({}) |\n",
        plan.feasibility.overall, plan.feasibility.verdict
    ));
    content.push_str(&format!(
        "| Success probability | {:.0}% |\n",
        plan.success_probability * 100.0
    ));
    content.push_str(&format!("| Confidence | {:.0}% |\n", plan.confidence * 100.0));
    content.push_str(&format!("| Health | {:.0}/100 |\n", plan.health_score));
    content.push_str(&format!(
        "| Duration | {} days ({} to {}, +{} buffer) |\n",
        schedule.total_duration, schedule.start, schedule.end, schedule.buffer_days
    ));
    content.push_str(&format!(
        "| Budget | {:.0} (estimate {:.0} + contingency {:.0}) |\n",
        budget.baseline, budget.estimate.total_estimated_cost, budget.estimate.contingency
    ));
    content.push_str(&format!(
        "| Risk | {:.1} ({}, {}) |\n",
        risk.overall_score, risk.level, risk.trend
    ));
    content.push_str("\n---\n\n");

    // Timeline
    content.push_str("## Timeline\n\n");
    content.push_str(&format!(
        "Critical path: {}\n\n",
        if schedule.critical_path.is_empty() {
            "none".to_string()
        } else {
            schedule.critical_path.join(" → ")
        }
    ));
    content.push_str(&format!(
        "Completion probability: {:.0}%\n\n",
        schedule.completion_probability * 100.0
    ));
    content.push_str("| Task | Start | Finish | Slack |\n");
    content.push_str("|------|-------|--------|-------|\n");
    for node in &schedule.nodes {
        let marker = if node.is_critical { "**" } else { "" };
        content.push_str(&format!(
            "| {}{}{} | {} | {} | {} |\n",
            marker,
            node.title,
            marker,
            node.scheduled_start,
            node.scheduled_finish,
            node.slack
        ));
    }
    content.push('\n');
    push_list(&mut content, "Hints", &schedule.optimization_hints);

    // Resources
    let allocation = &plan.allocation;
    content.push_str("## Resources\n\n");
    content.push_str(&format!(
        "Utilization {:.1}% → {:.1}% after balancing; savings {:.0} and {:.1} days\n\n",
        allocation.original_utilization,
        allocation.optimized_utilization,
        allocation.cost_savings,
        allocation.timeline_savings_days
    ));
    if !allocation.conflicts.is_empty() {
        content.push_str("| Severity | Conflict | Best option |\n");
        content.push_str("|----------|----------|-------------|\n");
        for conflict in &allocation.conflicts {
            let best = conflict
                .best_option()
                .map(|o| o.strategy.to_string())
                .unwrap_or_else(|| "-".to_string());
            content.push_str(&format!(
                "| {} | {} | {} |\n",
                conflict.severity, conflict.description, best
            ));
        }
        content.push('\n');
    }
    let moves: Vec<String> = allocation
        .reallocations
        .iter()
        .map(|r| r.rationale.clone())
        .collect();
    push_list(&mut content, "Reallocations", &moves);
    push_list(&mut content, "Recommendations", &allocation.recommendations);

    // Budget
    let forecast = &budget.forecast;
    content.push_str("## Budget\n\n");
    content.push_str("| Category | Cost |\n");
    content.push_str("|----------|------|\n");
    for (name, cost) in budget.estimate.breakdown.entries() {
        content.push_str(&format!("| {} | {:.0} |\n", name, cost));
    }
    content.push('\n');
    content.push_str(&format!(
        "Spent {:.0} of {:.0} ({}). CPI {:.2}, SPI {:.2}, EAC {:.0}, VAC {:.0}",
        budget.performance.total_spent,
        budget.performance.total_allocated,
        budget.performance.health,
        forecast.cpi,
        forecast.spi,
        forecast.eac,
        forecast.vac
    ));
    if let Some(date) = forecast.projected_completion {
        content.push_str(&format!(", projected completion {}", date));
    }
    content.push_str("\n\n");

    // Risk
    content.push_str("## Risks\n\n");
    if risk.risks.is_empty() {
        content.push_str("*No risks identified*\n\n");
    } else {
        content.push_str("| Risk | Category | P | I | Score | Owner |\n");
        content.push_str("|------|----------|---|---|-------|-------|\n");
        for r in &risk.risks {
            content.push_str(&format!(
                "| {} | {} | {:.2} | {:.0} | {:.1} | {} |\n",
                r.title,
                r.category,
                r.probability,
                r.impact,
                r.score(),
                r.mitigation.owner
            ));
        }
        content.push('\n');
    }
    if let Some(sim) = &risk.simulation {
        content.push_str(&format!(
            "Simulation ({} runs): duration p50 {:.1} / p90 {:.1} days, cost p50 {:.0} / p90 {:.0}; \
             on time {:.0}%, on budget {:.0}%\n\n",
            sim.iterations,
            sim.duration.p50,
            sim.duration.p90,
            sim.cost.p50,
            sim.cost.p90,
            sim.on_time_probability * 100.0,
            sim.on_budget_probability * 100.0
        ));
    }
    let indicators: Vec<String> = risk
        .monitoring
        .indicators
        .iter()
        .map(|i| {
            let icon = match i.status {
                IndicatorStatus::Green => "🟢",
                IndicatorStatus::Yellow => "🟡",
                IndicatorStatus::Red => "🔴",
            };
            format!(
                "{} {}: {:.2} (threshold {:.2})",
                icon, i.name, i.value, i.threshold
            )
        })
        .collect();
    push_list(&mut content, "Indicators", &indicators);
    let triggers: Vec<String> = risk
        .contingency_plan
        .active()
        .map(|t| match &t.evidence {
            Some(evidence) => format!("{} ({})", t.condition, evidence),
            None => t.condition.clone(),
        })
        .collect();
    push_list(&mut content, "Active contingency triggers", &triggers);
    push_list(&mut content, "Risk recommendations", &risk.recommendations);

    // Alternatives
    content.push_str("## Alternatives\n\n");
    content.push_str("| Variant | Days | Budget | Team | Score |\n");
    content.push_str("|---------|------|--------|------|-------|\n");
    for alt in &plan.alternatives {
        content.push_str(&format!(
            "| {} | {} | {:.0} | {} | {:.1} |\n",
            alt.name, alt.duration_days, alt.budget, alt.team_size, alt.recommendation_score
        ));
    }
    content.push('\n');

    // Monitoring
    let monitoring = &plan.monitoring;
    content.push_str(&format!(
        "## Monitoring (review every {} days)\n\n",
        monitoring.review_cadence_days
    ));
    for kpi in &monitoring.kpis {
        content.push_str(&format!(
            "- [{}] {}: {:.2} {} (target {:.2})\n",
            if kpi.on_target() { "x" } else { " " },
            kpi.name,
            kpi.current,
            kpi.unit,
            kpi.target
        ));
    }
    content.push('\n');
    let points: Vec<String> = monitoring
        .control_points
        .iter()
        .map(|c| format!("{} {} ({})", c.due, c.name, c.status))
        .collect();
    push_list(&mut content, "Control points", &points);
    let escalations: Vec<String> = monitoring
        .active_escalations()
        .map(|e| format!("{} → {}", e.condition, e.level))
        .collect();
    push_list(&mut content, "Escalations", &escalations);
    push_list(&mut content, "Feasibility concerns", &plan.feasibility.concerns);

    content
}

fn push_list(content: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    content.push_str(&format!("**{}:**\n", title));
    for item in items {
        content.push_str(&format!("- {}\n", item));
    }
    content.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model::{Dependency, Project, ProjectSnapshot, Resource, ResourceType, Task};
    use crate::planner::{PlanOptions, ProjectPlanner};
    use crate::repository::InMemoryRepository;
    use chrono::NaiveDate;
    use std::sync::Arc;

    async fn plan() -> ComprehensivePlan {
        let start = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let mut snap = ProjectSnapshot::new(Project::new("app", "Mobile app", start));
        snap.tasks = vec![
            Task::new("spec", "Specify").with_days(2.0),
            Task::new("ship", "Ship").with_days(3.0),
        ];
        snap.dependencies = vec![Dependency::new("ship", "spec")];
        snap.resources = vec![Resource::new("ida", "Ida", ResourceType::Human)];
        snap.as_of = Some(start);

        let mut config = Config::default();
        config.risk.simulation_iterations = 100;
        let planner = ProjectPlanner::new(config, Arc::new(InMemoryRepository::new()));
        planner
            .analyze(snap, PlanOptions::default(), 3)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_report_and_json_written() {
        let plan = plan().await;
        let dir = tempfile::tempdir().unwrap();

        let path = write_plan_report(dir.path(), &plan).unwrap();
        assert_eq!(path, dir.path().join("app-v3.md"));

        let json = std::fs::read_to_string(dir.path().join("app-v3.json")).unwrap();
        let restored: ComprehensivePlan = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.version, 3);
        assert_eq!(restored.schedule.critical_path, plan.schedule.critical_path);
    }

    #[tokio::test]
    async fn test_markdown_sections() {
        let plan = plan().await;
        let md = render_markdown(&plan);

        assert!(md.starts_with("# Mobile app: plan v3"));
        assert!(md.contains("Critical path: spec → ship"));
        assert!(md.contains("| **Specify** |"));
        for section in ["## Timeline", "## Resources", "## Budget", "## Risks", "## Alternatives"] {
            assert!(md.contains(section), "missing {}", section);
        }
    }
}
