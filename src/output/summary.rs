use crate::budget::BudgetHealth;
use crate::error::OutputError;
use crate::planner::{ComprehensivePlan, FeasibilityVerdict};
use crate::risk::RiskLevel;
use crate::timeline::ConflictSeverity;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyzerStatus {
    Ok,
    Warning,
    Critical,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzerSummary {
    pub name: String,
    pub status: AnalyzerStatus,
    pub headline: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlanSummary {
    pub timestamp: String,
    pub project_id: String,
    pub version: u32,
    pub verdict: FeasibilityVerdict,
    pub feasibility: f64,
    pub success_probability: f64,
    pub health_score: f64,
    pub end_date: String,
    pub budget: f64,
    pub estimate_at_completion: f64,
    pub risk_level: RiskLevel,
    pub analyzers: Vec<AnalyzerSummary>,
    pub escalations: Vec<String>,
    /// 1 when the plan is infeasible or its risk is critical
    pub exit_code: i32,
    pub report_dir: PathBuf,
}

/// Write `summary.json` and `summary.md` for a plan and return the summary
pub fn write_summary(
    report_dir: &Path,
    plan: &ComprehensivePlan,
) -> Result<PlanSummary, OutputError> {
    fs::create_dir_all(report_dir).map_err(OutputError::CreateDir)?;

    let summary = build_summary(plan, report_dir.to_path_buf());

    let json_path = report_dir.join("summary.json");
    let json = serde_json::to_string_pretty(&summary)?;
    fs::write(&json_path, json).map_err(OutputError::WriteReport)?;

    let md_path = report_dir.join("summary.md");
    fs::write(&md_path, build_summary_markdown(&summary)).map_err(OutputError::WriteReport)?;

    Ok(summary)
}

pub fn build_summary(plan: &ComprehensivePlan, report_dir: PathBuf) -> PlanSummary {
    let schedule = &plan.schedule;
    let allocation = &plan.allocation;
    let budget = &plan.budget;
    let risk = &plan.risk;

    let timeline_status = if schedule.completion_probability >= 0.7 {
        AnalyzerStatus::Ok
    } else if schedule.completion_probability >= 0.5 {
        AnalyzerStatus::Warning
    } else {
        AnalyzerStatus::Critical
    };

    let worst_conflict = allocation.conflicts.iter().map(|c| c.severity).max();
    let resource_status = match worst_conflict {
        None => AnalyzerStatus::Ok,
        Some(ConflictSeverity::Critical) => AnalyzerStatus::Critical,
        Some(_) => AnalyzerStatus::Warning,
    };

    let budget_status = match budget.performance.health {
        BudgetHealth::Critical => AnalyzerStatus::Critical,
        BudgetHealth::Warning => AnalyzerStatus::Warning,
        BudgetHealth::Good if budget.forecast.over_budget() => AnalyzerStatus::Warning,
        BudgetHealth::Good => AnalyzerStatus::Ok,
    };

    let risk_status = match risk.level {
        RiskLevel::Low | RiskLevel::Moderate => AnalyzerStatus::Ok,
        RiskLevel::High => AnalyzerStatus::Warning,
        RiskLevel::Critical => AnalyzerStatus::Critical,
    };

    let analyzers = vec![
        AnalyzerSummary {
            name: "timeline".to_string(),
            status: timeline_status,
            headline: format!(
                "{} days, {:.0}% likely on time",
                schedule.total_duration,
                schedule.completion_probability * 100.0
            ),
        },
        AnalyzerSummary {
            name: "resources".to_string(),
            status: resource_status,
            headline: format!(
                "{:.0}% utilization, {} conflicts",
                allocation.optimized_utilization,
                allocation.conflicts.len()
            ),
        },
        AnalyzerSummary {
            name: "budget".to_string(),
            status: budget_status,
            headline: format!(
                "EAC {:.0} against {:.0}",
                budget.forecast.eac, budget.baseline
            ),
        },
        AnalyzerSummary {
            name: "risk".to_string(),
            status: risk_status,
            headline: format!("{} risks, score {:.1}", risk.risks.len(), risk.overall_score),
        },
    ];

    let critical = plan.feasibility.verdict == FeasibilityVerdict::Critical
        || risk.level == RiskLevel::Critical;

    PlanSummary {
        timestamp: Utc::now().to_rfc3339(),
        project_id: plan.project_id.clone(),
        version: plan.version,
        verdict: plan.feasibility.verdict,
        feasibility: plan.feasibility.overall,
        success_probability: plan.success_probability,
        health_score: plan.health_score,
        end_date: schedule.end.to_string(),
        budget: budget.baseline,
        estimate_at_completion: budget.forecast.eac,
        risk_level: risk.level,
        analyzers,
        escalations: plan
            .monitoring
            .active_escalations()
            .map(|e| format!("{} ({})", e.condition, e.level))
            .collect(),
        exit_code: if critical { 1 } else { 0 },
        report_dir,
    }
}

fn build_summary_markdown(summary: &PlanSummary) -> String {
    let mut md = String::new();

    md.push_str("# planforge Summary\n\n");
    md.push_str(&format!("**Generated:** {}\n", summary.timestamp));
    md.push_str(&format!(
        "**Project:** {} (v{})\n",
        summary.project_id, summary.version
    ));
    md.push_str(&format!(
        "**Report Dir:** {}\n\n",
        summary.report_dir.display()
    ));

    md.push_str("| Metric | Value |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!(
        "| Feasibility | {:.1} ({}) |\n",
        summary.feasibility, summary.verdict
    ));
    md.push_str(&format!(
        "| Success probability | {:.0}% |\n",
        summary.success_probability * 100.0
    ));
    md.push_str(&format!("| Health | {:.0}/100 |\n", summary.health_score));
    md.push_str(&format!("| End date | {} |\n", summary.end_date));
    md.push_str(&format!(
        "| Budget | {:.0} (EAC {:.0}) |\n",
        summary.budget, summary.estimate_at_completion
    ));
    md.push_str(&format!("| Risk | {} |\n\n", summary.risk_level));

    md.push_str("## Analyzers\n\n");
    md.push_str("| Analyzer | Status | Headline |\n");
    md.push_str("|----------|--------|----------|\n");
    for analyzer in &summary.analyzers {
        let status_icon = match analyzer.status {
            AnalyzerStatus::Ok => "✅",
            AnalyzerStatus::Warning => "⚠️",
            AnalyzerStatus::Critical => "❌",
        };
        md.push_str(&format!(
            "| {} | {} | {} |\n",
            analyzer.name, status_icon, analyzer.headline
        ));
    }

    if !summary.escalations.is_empty() {
        md.push_str("\n## Escalations\n\n");
        for escalation in &summary.escalations {
            md.push_str(&format!("- {}\n", escalation));
        }
    }

    md
}
