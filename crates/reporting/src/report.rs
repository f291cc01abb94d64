//! Report assembly and export — runs the filter engine and aggregations
//! over a table snapshot, archives the result, and renders it as text,
//! CSV, or JSON.

use crate::filters::{self, FilterSelection};
use crate::kpi::{
    self, IncrementalRoas, InfluencerRoas, PersonaMatrix, PersonaRoas, PlatformEngagement,
    SummaryKpis,
};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use insights_core::config::ReportConfig;
use insights_core::types::Tables;
use insights_core::{InsightsError, InsightsResult};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RowCounts {
    pub influencers: usize,
    pub posts: usize,
    pub tracking_events: usize,
    pub payouts: usize,
}

/// One fully computed render pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignReport {
    pub id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub filters: FilterSelection,
    pub row_counts: RowCounts,
    pub summary: SummaryKpis,
    pub incremental: IncrementalRoas,
    pub influencers: Vec<InfluencerRoas>,
    pub leaderboard: Vec<InfluencerRoas>,
    pub underperformers: Vec<InfluencerRoas>,
    pub personas: Vec<PersonaRoas>,
    pub persona_matrix: PersonaMatrix,
    pub engagement: Vec<PlatformEngagement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportSection {
    Leaderboard,
    Underperformers,
    Personas,
    Engagement,
}

impl std::str::FromStr for ReportSection {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "leaderboard" => Ok(ReportSection::Leaderboard),
            "underperformers" => Ok(ReportSection::Underperformers),
            "personas" => Ok(ReportSection::Personas),
            "engagement" => Ok(ReportSection::Engagement),
            other => Err(InsightsError::Dataset(format!(
                "unknown report section: {other:?}"
            ))),
        }
    }
}

pub struct ReportEngine {
    config: ReportConfig,
    archive: DashMap<Uuid, CampaignReport>,
}

impl ReportEngine {
    pub fn new(config: ReportConfig) -> Self {
        Self {
            config,
            archive: DashMap::new(),
        }
    }

    /// Filter the snapshot and recompute every KPI from scratch. The
    /// output is archived by id.
    pub fn build(&self, tables: &Tables, selection: &FilterSelection) -> CampaignReport {
        let filtered = filters::apply(tables, selection);
        let influencers = kpi::influencer_roas(&filtered);
        let personas = kpi::persona_roas(&influencers);

        let report = CampaignReport {
            id: Uuid::new_v4(),
            generated_at: Utc::now(),
            filters: selection.clone(),
            row_counts: RowCounts {
                influencers: filtered.influencers.len(),
                posts: filtered.posts.len(),
                tracking_events: filtered.tracking.len(),
                payouts: filtered.payouts.len(),
            },
            summary: kpi::summary_kpis(&filtered),
            incremental: kpi::incremental_roas(&filtered),
            leaderboard: kpi::leaderboard(&influencers, self.config.leaderboard_size),
            underperformers: kpi::underperformers(&influencers),
            persona_matrix: kpi::persona_matrix(&personas),
            engagement: kpi::platform_engagement(&filtered),
            influencers,
            personas,
        };

        info!(
            report_id = %report.id,
            influencers = report.row_counts.influencers,
            tracking_events = report.row_counts.tracking_events,
            roas = report.summary.roas,
            "report built"
        );
        self.archive.insert(report.id, report.clone());
        report
    }

    pub fn get(&self, id: &Uuid) -> Option<CampaignReport> {
        self.archive.get(id).map(|r| r.clone())
    }

    pub fn archived_count(&self) -> usize {
        self.archive.len()
    }

    pub fn export_json(&self, report: &CampaignReport) -> InsightsResult<String> {
        Ok(serde_json::to_string_pretty(report)?)
    }

    pub fn export_csv(&self, report: &CampaignReport, section: ReportSection) -> String {
        let (columns, rows) = match section {
            ReportSection::Leaderboard => influencer_rows(&report.leaderboard),
            ReportSection::Underperformers => influencer_rows(&report.underperformers),
            ReportSection::Personas => persona_rows(&report.personas),
            ReportSection::Engagement => engagement_rows(&report.engagement),
        };

        let mut csv = columns.join(",");
        csv.push('\n');
        for row in &rows {
            let cells: Vec<String> = row
                .iter()
                .map(|v| match v {
                    serde_json::Value::String(s) => format!("\"{}\"", s.replace('"', "\"\"")),
                    serde_json::Value::Null => String::new(),
                    other => other.to_string(),
                })
                .collect();
            csv.push_str(&cells.join(","));
            csv.push('\n');
        }
        csv
    }

    /// Plain-text rendering, the terminal stand-in for the dashboard.
    pub fn render_text(&self, report: &CampaignReport) -> String {
        let currency = &self.config.currency_symbol;
        let mut out = String::new();

        let _ = writeln!(out, "Influencer Campaign Report ({})", report.id);
        let _ = writeln!(out, "Generated: {}", report.generated_at.format("%Y-%m-%d %H:%M:%S UTC"));
        let _ = writeln!(
            out,
            "Rows: {} influencers, {} posts, {} tracking events, {} payouts",
            report.row_counts.influencers,
            report.row_counts.posts,
            report.row_counts.tracking_events,
            report.row_counts.payouts
        );
        out.push('\n');

        let _ = writeln!(out, "Key metrics");
        let _ = writeln!(
            out,
            "  Total Revenue: {currency}{:.2}",
            report.summary.total_revenue
        );
        let _ = writeln!(
            out,
            "  Total Payout:  {currency}{:.2}",
            report.summary.total_payout
        );
        let _ = writeln!(out, "  ROAS:          {:.2}x", report.summary.roas);
        match report.incremental.value {
            Some(v) => {
                let _ = writeln!(out, "  Incremental ROAS: {v:.4}");
            }
            None => {
                let _ = writeln!(
                    out,
                    "  Incremental ROAS: n/a (control users: {}, exposed users: {}, payout: {currency}{:.2})",
                    report.incremental.control_users,
                    report.incremental.exposed_users,
                    report.incremental.total_payout
                );
            }
        }
        out.push('\n');

        let _ = writeln!(out, "Top influencers by ROAS");
        if report.leaderboard.is_empty() {
            let _ = writeln!(out, "  (no data)");
        }
        for row in &report.leaderboard {
            let _ = writeln!(
                out,
                "  {:<20} {:<10} {:<10} {:>10} followers  revenue {currency}{:>10.2}  payout {currency}{:>10.2}  ROAS {}",
                row.name,
                row.platform.to_string(),
                row.category.to_string(),
                row.follower_count,
                row.revenue,
                row.total_payout,
                fmt_roas(row.roas)
            );
        }
        out.push('\n');

        let _ = writeln!(out, "Underperformers (ROAS < 1.0)");
        if report.underperformers.is_empty() {
            let _ = writeln!(out, "  (none)");
        }
        for row in &report.underperformers {
            let _ = writeln!(
                out,
                "  {:<20} revenue {currency}{:>10.2}  payout {currency}{:>10.2}  ROAS {}",
                row.name,
                row.revenue,
                row.total_payout,
                fmt_roas(row.roas)
            );
        }
        out.push('\n');

        let _ = writeln!(out, "Persona ROAS (category × gender, payout-weighted)");
        if report.personas.is_empty() {
            let _ = writeln!(out, "  (no data)");
        }
        for persona in &report.personas {
            let _ = writeln!(
                out,
                "  {:<10} / {:<7} influencers {:>3}  revenue {currency}{:>10.2}  payout {currency}{:>10.2}  ROAS {}",
                persona.category.to_string(),
                persona.gender.to_string(),
                persona.influencer_count,
                persona.revenue,
                persona.total_payout,
                fmt_roas(persona.roas)
            );
        }
        out.push('\n');

        let matrix = &report.persona_matrix;
        let _ = write!(out, "{:<12}", "");
        for gender in &matrix.genders {
            let _ = write!(out, "{:>10}", gender.to_string());
        }
        out.push('\n');
        for (c, category) in matrix.categories.iter().enumerate() {
            let _ = write!(out, "{:<12}", category.to_string());
            for cell in &matrix.cells[c] {
                match cell {
                    Some(v) => {
                        let _ = write!(out, "{:>10.2}", v);
                    }
                    None => {
                        let _ = write!(out, "{:>10}", "-");
                    }
                }
            }
            out.push('\n');
        }
        out.push('\n');

        let _ = writeln!(out, "Engagement rate by platform");
        if report.engagement.is_empty() {
            let _ = writeln!(out, "  (no data)");
        }
        for entry in &report.engagement {
            let _ = writeln!(
                out,
                "  {:<10} {:>6.2}%  ({} posts)",
                entry.platform.to_string(),
                entry.avg_engagement_rate * 100.0,
                entry.posts
            );
        }

        out
    }
}

impl Default for ReportEngine {
    fn default() -> Self {
        Self::new(ReportConfig::default())
    }
}

fn fmt_roas(roas: Option<f64>) -> String {
    match roas {
        Some(v) => format!("{v:.2}x"),
        None => "n/a".to_string(),
    }
}

fn influencer_rows(rows: &[InfluencerRoas]) -> (Vec<String>, Vec<Vec<serde_json::Value>>) {
    let columns = vec![
        "influencer_id",
        "name",
        "platform",
        "category",
        "follower_count",
        "revenue",
        "total_payout",
        "roas",
    ]
    .into_iter()
    .map(String::from)
    .collect();

    let data = rows
        .iter()
        .map(|r| {
            vec![
                serde_json::json!(r.influencer_id),
                serde_json::json!(r.name),
                serde_json::json!(r.platform.to_string()),
                serde_json::json!(r.category.to_string()),
                serde_json::json!(r.follower_count),
                serde_json::json!(kpi::round_to(r.revenue, 2)),
                serde_json::json!(kpi::round_to(r.total_payout, 2)),
                serde_json::json!(r.roas.map(|v| kpi::round_to(v, 2))),
            ]
        })
        .collect();

    (columns, data)
}

fn persona_rows(rows: &[PersonaRoas]) -> (Vec<String>, Vec<Vec<serde_json::Value>>) {
    let columns = vec![
        "category",
        "gender",
        "influencer_count",
        "revenue",
        "total_payout",
        "roas",
    ]
    .into_iter()
    .map(String::from)
    .collect();

    let data = rows
        .iter()
        .map(|p| {
            vec![
                serde_json::json!(p.category.to_string()),
                serde_json::json!(p.gender.to_string()),
                serde_json::json!(p.influencer_count),
                serde_json::json!(kpi::round_to(p.revenue, 2)),
                serde_json::json!(kpi::round_to(p.total_payout, 2)),
                serde_json::json!(p.roas.map(|v| kpi::round_to(v, 2))),
            ]
        })
        .collect();

    (columns, data)
}

fn engagement_rows(rows: &[PlatformEngagement]) -> (Vec<String>, Vec<Vec<serde_json::Value>>) {
    let columns = vec!["platform", "posts", "avg_engagement_rate"]
        .into_iter()
        .map(String::from)
        .collect();

    let data = rows
        .iter()
        .map(|e| {
            vec![
                serde_json::json!(e.platform.to_string()),
                serde_json::json!(e.posts),
                serde_json::json!(kpi::round_to(e.avg_engagement_rate, 4)),
            ]
        })
        .collect();

    (columns, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{FilterOptions, FilterSelection};
    use chrono::NaiveDate;
    use insights_core::types::{
        Category, ExperimentGroup, Gender, Influencer, InfluencerType, Payout, PayoutBasis,
        Platform, Post, TrackingEvent,
    };

    fn fixture() -> Tables {
        let influencer = |id: u64, category, gender, followers: u64, platform| Influencer {
            id,
            name: format!("Influencer_{id}"),
            category,
            gender,
            follower_count: followers,
            platform,
            influencer_type: InfluencerType::from_followers(followers),
        };
        let event = |id: u64, user: &str, revenue: f64, group| TrackingEvent {
            influencer_id: id,
            source: "ad".into(),
            campaign: "summer".into(),
            user_id: user.into(),
            product: "Whey Protein".into(),
            date: NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(),
            orders: 1,
            revenue,
            group,
        };
        Tables {
            influencers: vec![
                influencer(1, Category::Fitness, Gender::Female, 30_000, Platform::Instagram),
                influencer(2, Category::Health, Gender::Male, 250_000, Platform::YouTube),
            ],
            posts: vec![Post {
                influencer_id: 1,
                platform: Platform::Instagram,
                date: NaiveDate::from_ymd_opt(2024, 2, 12).unwrap(),
                url: "https://social.example/p/1".into(),
                caption: "drop".into(),
                reach: 2000,
                likes: 100,
                comments: 20,
            }],
            tracking: vec![
                event(1, "u1", 800.0, ExperimentGroup::Exposed),
                event(1, "u2", 200.0, ExperimentGroup::Control),
                event(2, "u3", 500.0, ExperimentGroup::Exposed),
            ],
            payouts: vec![
                Payout {
                    influencer_id: 1,
                    basis: PayoutBasis::Post,
                    rate: 400.0,
                    orders: 0,
                    total_payout: 400.0,
                },
                Payout {
                    influencer_id: 2,
                    basis: PayoutBasis::Order,
                    rate: 100.0,
                    orders: 10,
                    total_payout: 1000.0,
                },
            ],
        }
    }

    fn all_filters(tables: &Tables) -> FilterSelection {
        FilterSelection::all(&FilterOptions::from_tables(tables))
    }

    #[test]
    fn test_build_and_archive() {
        let engine = ReportEngine::default();
        let tables = fixture();
        let report = engine.build(&tables, &all_filters(&tables));

        assert_eq!(report.row_counts.influencers, 2);
        assert!((report.summary.total_revenue - 1500.0).abs() < 1e-9);
        assert!((report.summary.total_payout - 1400.0).abs() < 1e-9);
        assert_eq!(report.summary.roas, 1.07);
        assert_eq!(report.leaderboard.len(), 2);
        assert_eq!(report.leaderboard[0].influencer_id, 1);

        assert_eq!(engine.archived_count(), 1);
        assert!(engine.get(&report.id).is_some());
    }

    #[test]
    fn test_empty_filter_selection_reports_zeroes() {
        let engine = ReportEngine::default();
        let tables = fixture();
        let mut selection = all_filters(&tables);
        selection.platforms.clear();

        let report = engine.build(&tables, &selection);
        assert_eq!(report.row_counts.influencers, 0);
        assert_eq!(report.summary.roas, 0.0);
        assert_eq!(report.incremental.value, None);
        assert!(report.leaderboard.is_empty());
        assert!(report.personas.is_empty());
        assert!(report.engagement.is_empty());

        // And the text rendering still works.
        let text = engine.render_text(&report);
        assert!(text.contains("ROAS:          0.00x"));
        assert!(text.contains("(no data)"));
    }

    #[test]
    fn test_csv_export_shape() {
        let engine = ReportEngine::default();
        let tables = fixture();
        let report = engine.build(&tables, &all_filters(&tables));

        let csv = engine.export_csv(&report, ReportSection::Leaderboard);
        assert!(csv.starts_with("influencer_id,name,platform,"));
        assert_eq!(csv.lines().count(), 3);
        assert!(csv.contains("\"Influencer_1\""));

        let csv = engine.export_csv(&report, ReportSection::Engagement);
        assert!(csv.starts_with("platform,posts,avg_engagement_rate"));
        assert!(csv.contains("\"Instagram\""));
    }

    #[test]
    fn test_json_export_round_trips() {
        let engine = ReportEngine::default();
        let tables = fixture();
        let report = engine.build(&tables, &all_filters(&tables));

        let json = engine.export_json(&report).unwrap();
        let parsed: CampaignReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, report.id);
        assert_eq!(parsed.leaderboard.len(), report.leaderboard.len());
    }

    #[test]
    fn test_section_from_str() {
        assert_eq!(
            "leaderboard".parse::<ReportSection>().unwrap(),
            ReportSection::Leaderboard
        );
        assert!("pie_chart".parse::<ReportSection>().is_err());
    }
}
