//! Metrics aggregator: the five KPI computations, all pure functions of
//! their (already filtered) table inputs. Empty inputs yield zero/`None`
//! results, never a panic.

use insights_core::types::{Category, ExperimentGroup, Gender, Platform, Tables};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

// ─── Aggregate KPIs ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryKpis {
    pub total_revenue: f64,
    pub total_payout: f64,
    /// Revenue over payout, rounded to 2 decimals; 0 when nothing was
    /// paid out.
    pub roas: f64,
}

pub fn summary_kpis(tables: &Tables) -> SummaryKpis {
    let total_revenue: f64 = tables.tracking.iter().map(|t| t.revenue).sum();
    let total_payout: f64 = tables.payouts.iter().map(|p| p.total_payout).sum();
    let roas = if total_payout > 0.0 {
        round_to(total_revenue / total_payout, 2)
    } else {
        0.0
    };
    SummaryKpis {
        total_revenue,
        total_payout,
        roas,
    }
}

// ─── Incremental ROAS ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncrementalRoas {
    pub control_users: usize,
    pub exposed_users: usize,
    /// Mean per-user revenue; `None` when the group has no users in the
    /// filtered slice.
    pub control_mean_revenue: Option<f64>,
    pub exposed_mean_revenue: Option<f64>,
    pub total_payout: f64,
    /// (exposed mean − control mean) / total payout, rounded to 4
    /// decimals. `None` when either mean is undefined or payout is zero.
    pub value: Option<f64>,
}

fn per_user_mean(tables: &Tables, group: ExperimentGroup) -> (usize, Option<f64>) {
    let mut by_user: HashMap<&str, f64> = HashMap::new();
    for event in tables.tracking.iter().filter(|t| t.group == group) {
        *by_user.entry(event.user_id.as_str()).or_insert(0.0) += event.revenue;
    }
    let users = by_user.len();
    if users == 0 {
        return (0, None);
    }
    let mean = by_user.values().sum::<f64>() / users as f64;
    (users, Some(mean))
}

pub fn incremental_roas(tables: &Tables) -> IncrementalRoas {
    let (control_users, control_mean) = per_user_mean(tables, ExperimentGroup::Control);
    let (exposed_users, exposed_mean) = per_user_mean(tables, ExperimentGroup::Exposed);
    let total_payout: f64 = tables.payouts.iter().map(|p| p.total_payout).sum();

    let value = match (exposed_mean, control_mean) {
        (Some(exposed), Some(control)) if total_payout > 0.0 => {
            Some(round_to((exposed - control) / total_payout, 4))
        }
        _ => None,
    };

    IncrementalRoas {
        control_users,
        exposed_users,
        control_mean_revenue: control_mean,
        exposed_mean_revenue: exposed_mean,
        total_payout,
        value,
    }
}

// ─── Per-influencer ROAS ─────────────────────────────────────────────

/// Revenue and payout for one influencer, joined with display attributes.
/// Only influencers present in both the tracking and payout tables appear
/// (inner join); `roas` is `None` when the payout total is zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfluencerRoas {
    pub influencer_id: u64,
    pub name: String,
    pub platform: Platform,
    pub category: Category,
    pub gender: Gender,
    pub follower_count: u64,
    pub revenue: f64,
    pub total_payout: f64,
    pub roas: Option<f64>,
}

pub fn influencer_roas(tables: &Tables) -> Vec<InfluencerRoas> {
    let mut revenue_by_influencer: HashMap<u64, f64> = HashMap::new();
    for event in &tables.tracking {
        *revenue_by_influencer.entry(event.influencer_id).or_insert(0.0) += event.revenue;
    }

    let mut rows: Vec<InfluencerRoas> = Vec::new();
    for payout in &tables.payouts {
        let Some(&revenue) = revenue_by_influencer.get(&payout.influencer_id) else {
            continue;
        };
        let Some(influencer) = tables
            .influencers
            .iter()
            .find(|i| i.id == payout.influencer_id)
        else {
            continue;
        };
        let roas = if payout.total_payout > 0.0 {
            Some(revenue / payout.total_payout)
        } else {
            debug!(
                influencer_id = payout.influencer_id,
                "zero payout, ROAS undefined"
            );
            None
        };
        rows.push(InfluencerRoas {
            influencer_id: influencer.id,
            name: influencer.name.clone(),
            platform: influencer.platform,
            category: influencer.category,
            gender: influencer.gender,
            follower_count: influencer.follower_count,
            revenue,
            total_payout: payout.total_payout,
            roas,
        });
    }

    // Descending by ROAS; undefined ratios sink to the bottom. Ties break
    // on id so output is deterministic.
    rows.sort_by(|a, b| {
        b.roas
            .partial_cmp(&a.roas)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.influencer_id.cmp(&b.influencer_id))
    });
    rows
}

/// Top-n influencers with a defined ROAS.
pub fn leaderboard(rows: &[InfluencerRoas], n: usize) -> Vec<InfluencerRoas> {
    rows.iter()
        .filter(|r| r.roas.is_some())
        .take(n)
        .cloned()
        .collect()
}

/// Influencers paying out more than they bring in, worst first.
pub fn underperformers(rows: &[InfluencerRoas]) -> Vec<InfluencerRoas> {
    let mut out: Vec<InfluencerRoas> = rows
        .iter()
        .filter(|r| r.roas.is_some_and(|v| v < 1.0))
        .cloned()
        .collect();
    out.sort_by(|a, b| {
        a.roas
            .partial_cmp(&b.roas)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.influencer_id.cmp(&b.influencer_id))
    });
    out
}

// ─── Persona ROAS ────────────────────────────────────────────────────

/// A (category, gender) segment. ROAS is the payout-weighted ratio
/// Σrevenue/Σpayout — summing personas back together reproduces the
/// aggregate ROAS, which an unweighted mean of per-influencer ratios
/// would not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaRoas {
    pub category: Category,
    pub gender: Gender,
    pub influencer_count: usize,
    pub revenue: f64,
    pub total_payout: f64,
    pub roas: Option<f64>,
}

pub fn persona_roas(rows: &[InfluencerRoas]) -> Vec<PersonaRoas> {
    let mut groups: HashMap<(Category, Gender), (usize, f64, f64)> = HashMap::new();
    for row in rows {
        let entry = groups
            .entry((row.category, row.gender))
            .or_insert((0, 0.0, 0.0));
        entry.0 += 1;
        entry.1 += row.revenue;
        entry.2 += row.total_payout;
    }

    let mut personas: Vec<PersonaRoas> = groups
        .into_iter()
        .map(|((category, gender), (count, revenue, payout))| PersonaRoas {
            category,
            gender,
            influencer_count: count,
            revenue,
            total_payout: payout,
            roas: (payout > 0.0).then(|| revenue / payout),
        })
        .collect();

    personas.sort_by(|a, b| {
        b.roas
            .partial_cmp(&a.roas)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.category.cmp(&b.category))
            .then(a.gender.cmp(&b.gender))
    });
    personas
}

/// The persona table projected onto a category × gender grid; cells with
/// no influencer data are `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaMatrix {
    pub categories: Vec<Category>,
    pub genders: Vec<Gender>,
    /// `cells[c][g]` is the weighted ROAS for `categories[c]` ×
    /// `genders[g]`.
    pub cells: Vec<Vec<Option<f64>>>,
}

pub fn persona_matrix(personas: &[PersonaRoas]) -> PersonaMatrix {
    let categories: Vec<Category> = Category::ALL.to_vec();
    let genders: Vec<Gender> = Gender::ALL.to_vec();

    let cells = categories
        .iter()
        .map(|&category| {
            genders
                .iter()
                .map(|&gender| {
                    personas
                        .iter()
                        .find(|p| p.category == category && p.gender == gender)
                        .and_then(|p| p.roas)
                })
                .collect()
        })
        .collect();

    PersonaMatrix {
        categories,
        genders,
        cells,
    }
}

// ─── Engagement rate ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformEngagement {
    pub platform: Platform,
    /// Posts that reached anyone; reach-0 rows are excluded outright.
    pub posts: usize,
    pub avg_engagement_rate: f64,
}

pub fn platform_engagement(tables: &Tables) -> Vec<PlatformEngagement> {
    let mut groups: HashMap<Platform, (usize, f64)> = HashMap::new();
    for post in &tables.posts {
        if let Some(rate) = post.engagement_rate() {
            let entry = groups.entry(post.platform).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += rate;
        }
    }

    let mut out: Vec<PlatformEngagement> = groups
        .into_iter()
        .map(|(platform, (posts, sum))| PlatformEngagement {
            platform,
            posts,
            avg_engagement_rate: sum / posts as f64,
        })
        .collect();

    out.sort_by(|a, b| {
        b.avg_engagement_rate
            .partial_cmp(&a.avg_engagement_rate)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.platform.cmp(&b.platform))
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use insights_core::types::{
        Influencer, InfluencerType, Payout, PayoutBasis, Post, TrackingEvent,
    };

    fn influencer(id: u64, category: Category, gender: Gender) -> Influencer {
        Influencer {
            id,
            name: format!("inf_{id}"),
            category,
            gender,
            follower_count: 80_000,
            platform: Platform::Instagram,
            influencer_type: InfluencerType::Micro,
        }
    }

    fn payout(influencer_id: u64, total: f64) -> Payout {
        Payout {
            influencer_id,
            basis: PayoutBasis::Post,
            rate: total,
            orders: 0,
            total_payout: total,
        }
    }

    fn event(influencer_id: u64, user: &str, revenue: f64, group: ExperimentGroup) -> TrackingEvent {
        TrackingEvent {
            influencer_id,
            source: "ad".into(),
            campaign: "summer".into(),
            user_id: user.into(),
            product: "Whey Protein".into(),
            date: NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
            orders: 1,
            revenue,
            group,
        }
    }

    #[test]
    fn test_aggregate_roas_exact_ratio() {
        let tables = Tables {
            influencers: vec![influencer(1, Category::Fitness, Gender::Female)],
            posts: vec![],
            tracking: vec![
                event(1, "u1", 150.0, ExperimentGroup::Exposed),
                event(1, "u2", 100.0, ExperimentGroup::Control),
            ],
            payouts: vec![payout(1, 100.0)],
        };
        let summary = summary_kpis(&tables);
        assert!((summary.total_revenue - 250.0).abs() < 1e-9);
        assert!((summary.roas - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_aggregate_roas_zero_payout_defaults_to_zero() {
        let tables = Tables {
            influencers: vec![influencer(1, Category::Fitness, Gender::Female)],
            posts: vec![],
            tracking: vec![event(1, "u1", 9999.0, ExperimentGroup::Exposed)],
            payouts: vec![payout(1, 0.0)],
        };
        assert_eq!(summary_kpis(&tables).roas, 0.0);
    }

    #[test]
    fn test_empty_tables_do_not_panic() {
        let tables = Tables::default();
        let summary = summary_kpis(&tables);
        assert_eq!(summary.total_revenue, 0.0);
        assert_eq!(summary.roas, 0.0);

        let incremental = incremental_roas(&tables);
        assert_eq!(incremental.control_mean_revenue, None);
        assert_eq!(incremental.value, None);

        assert!(influencer_roas(&tables).is_empty());
        assert!(persona_roas(&[]).is_empty());
        assert!(platform_engagement(&tables).is_empty());
    }

    #[test]
    fn test_incremental_roas_example() {
        // Control mean 30, exposed mean 400, payout 1000 → 0.37.
        let tables = Tables {
            influencers: vec![influencer(1, Category::Health, Gender::Male)],
            posts: vec![],
            tracking: vec![
                event(1, "c1", 20.0, ExperimentGroup::Control),
                event(1, "c1", 10.0, ExperimentGroup::Control),
                event(1, "c2", 30.0, ExperimentGroup::Control),
                event(1, "e1", 400.0, ExperimentGroup::Exposed),
            ],
            payouts: vec![payout(1, 1000.0)],
        };
        let incremental = incremental_roas(&tables);
        assert_eq!(incremental.control_users, 2);
        assert_eq!(incremental.exposed_users, 1);
        assert_eq!(incremental.control_mean_revenue, Some(30.0));
        assert_eq!(incremental.exposed_mean_revenue, Some(400.0));
        assert_eq!(incremental.value, Some(0.37));
    }

    #[test]
    fn test_incremental_roas_missing_group_is_undefined() {
        let tables = Tables {
            influencers: vec![influencer(1, Category::Health, Gender::Male)],
            posts: vec![],
            tracking: vec![event(1, "e1", 400.0, ExperimentGroup::Exposed)],
            payouts: vec![payout(1, 1000.0)],
        };
        let incremental = incremental_roas(&tables);
        assert_eq!(incremental.control_mean_revenue, None);
        assert!(incremental.exposed_mean_revenue.is_some());
        assert_eq!(incremental.value, None);
    }

    #[test]
    fn test_influencer_roas_zero_payout_scenario() {
        // Payout totals [100, 0, 50], revenue sums [50, 20, 200].
        let tables = Tables {
            influencers: vec![
                influencer(1, Category::Fitness, Gender::Female),
                influencer(2, Category::Fitness, Gender::Male),
                influencer(3, Category::Health, Gender::Other),
            ],
            posts: vec![],
            tracking: vec![
                event(1, "u1", 50.0, ExperimentGroup::Control),
                event(2, "u2", 20.0, ExperimentGroup::Control),
                event(3, "u3", 200.0, ExperimentGroup::Exposed),
            ],
            payouts: vec![payout(1, 100.0), payout(2, 0.0), payout(3, 50.0)],
        };
        let rows = influencer_roas(&tables);
        assert_eq!(rows.len(), 3);
        // Sorted descending, undefined last.
        assert_eq!(rows[0].influencer_id, 3);
        assert_eq!(rows[0].roas, Some(4.0));
        assert_eq!(rows[1].roas, Some(0.5));
        assert_eq!(rows[2].influencer_id, 2);
        assert_eq!(rows[2].roas, None);

        // The zero-payout influencer never enters the ranked lists.
        let top = leaderboard(&rows, 5);
        assert_eq!(top.len(), 2);
        assert!(top.iter().all(|r| r.influencer_id != 2));

        let under = underperformers(&rows);
        assert_eq!(under.len(), 1);
        assert_eq!(under[0].influencer_id, 1);
    }

    #[test]
    fn test_influencer_roas_is_an_inner_join() {
        // Influencer 2 has tracking revenue but no payout row.
        let tables = Tables {
            influencers: vec![
                influencer(1, Category::Fitness, Gender::Female),
                influencer(2, Category::Fitness, Gender::Male),
            ],
            posts: vec![],
            tracking: vec![
                event(1, "u1", 50.0, ExperimentGroup::Control),
                event(2, "u2", 500.0, ExperimentGroup::Exposed),
            ],
            payouts: vec![payout(1, 10.0)],
        };
        let rows = influencer_roas(&tables);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].influencer_id, 1);
    }

    #[test]
    fn test_underperformers_sorted_ascending_below_one() {
        let tables = Tables {
            influencers: vec![
                influencer(1, Category::Fitness, Gender::Female),
                influencer(2, Category::Health, Gender::Male),
                influencer(3, Category::Lifestyle, Gender::Other),
            ],
            posts: vec![],
            tracking: vec![
                event(1, "u1", 90.0, ExperimentGroup::Control),
                event(2, "u2", 20.0, ExperimentGroup::Control),
                event(3, "u3", 300.0, ExperimentGroup::Exposed),
            ],
            payouts: vec![payout(1, 100.0), payout(2, 100.0), payout(3, 100.0)],
        };
        let rows = influencer_roas(&tables);
        let under = underperformers(&rows);
        let ids: Vec<u64> = under.iter().map(|r| r.influencer_id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert!(under.iter().all(|r| r.roas.is_some_and(|v| v < 1.0)));
    }

    #[test]
    fn test_persona_partition_and_weighted_ratio() {
        let tables = Tables {
            influencers: vec![
                influencer(1, Category::Fitness, Gender::Female),
                influencer(2, Category::Fitness, Gender::Female),
                influencer(3, Category::Health, Gender::Male),
            ],
            posts: vec![],
            tracking: vec![
                event(1, "u1", 100.0, ExperimentGroup::Control),
                event(2, "u2", 300.0, ExperimentGroup::Exposed),
                event(3, "u3", 50.0, ExperimentGroup::Control),
            ],
            payouts: vec![payout(1, 100.0), payout(2, 100.0), payout(3, 100.0)],
        };
        let rows = influencer_roas(&tables);
        let personas = persona_roas(&rows);

        // Every joined influencer lands in exactly one persona.
        let total: usize = personas.iter().map(|p| p.influencer_count).sum();
        assert_eq!(total, rows.len());
        assert_eq!(personas.len(), 2);

        // Fitness/Female: (100+300)/(100+100) = 2.0.
        let fitness = personas
            .iter()
            .find(|p| p.category == Category::Fitness)
            .unwrap();
        assert_eq!(fitness.roas, Some(2.0));
        assert_eq!(fitness.influencer_count, 2);

        let matrix = persona_matrix(&personas);
        let c = matrix
            .categories
            .iter()
            .position(|&x| x == Category::Fitness)
            .unwrap();
        let g = matrix.genders.iter().position(|&x| x == Gender::Female).unwrap();
        assert_eq!(matrix.cells[c][g], Some(2.0));
        // Untouched cell stays empty.
        let g_other = matrix.genders.iter().position(|&x| x == Gender::Other).unwrap();
        assert_eq!(matrix.cells[c][g_other], None);
    }

    #[test]
    fn test_persona_weighting_is_payout_weighted() {
        // Influencer 1: 100/400 = 0.25, influencer 2: 300/100 = 3.0.
        // Unweighted mean would be 1.625; weighted is 400/500 = 0.8.
        let tables = Tables {
            influencers: vec![
                influencer(1, Category::Fitness, Gender::Female),
                influencer(2, Category::Fitness, Gender::Female),
            ],
            posts: vec![],
            tracking: vec![
                event(1, "u1", 100.0, ExperimentGroup::Control),
                event(2, "u2", 300.0, ExperimentGroup::Exposed),
            ],
            payouts: vec![payout(1, 400.0), payout(2, 100.0)],
        };
        let personas = persona_roas(&influencer_roas(&tables));
        assert_eq!(personas.len(), 1);
        assert_eq!(personas[0].roas, Some(0.8));
    }

    #[test]
    fn test_engagement_excludes_zero_reach() {
        let post = |platform, reach, likes, comments| Post {
            influencer_id: 1,
            platform,
            date: NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
            url: String::new(),
            caption: String::new(),
            reach,
            likes,
            comments,
        };
        let tables = Tables {
            influencers: vec![],
            posts: vec![
                post(Platform::Instagram, 1000, 90, 10),
                post(Platform::Instagram, 0, 50, 50),
                post(Platform::YouTube, 100, 1, 1),
            ],
            tracking: vec![],
            payouts: vec![],
        };
        let engagement = platform_engagement(&tables);
        assert_eq!(engagement.len(), 2);
        // Instagram: only the reach>0 post counts, rate 0.1.
        assert_eq!(engagement[0].platform, Platform::Instagram);
        assert_eq!(engagement[0].posts, 1);
        assert!((engagement[0].avg_engagement_rate - 0.1).abs() < 1e-9);
        // Sorted descending.
        assert!(engagement[0].avg_engagement_rate >= engagement[1].avg_engagement_rate);
    }
}
