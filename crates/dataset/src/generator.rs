//! Seeded synthetic datasets for demo runs. Any tables matching the wire
//! shapes work; these mirror the value pools of the original demo data.

use insights_core::config::GeneratorConfig;
use insights_core::types::{
    Category, ExperimentGroup, Gender, Influencer, InfluencerType, Payout, PayoutBasis, Platform,
    Post, Tables, TrackingEvent,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

const SOURCES: [&str; 3] = ["organic", "paid", "affiliate"];
const CAMPAIGNS: [&str; 3] = ["summer_sale", "new_launch", "festive_push"];
const PRODUCTS: [&str; 5] = [
    "Whey Protein",
    "Multivitamin",
    "Omega 3",
    "Mass Gainer",
    "BCAA",
];
const CAPTIONS: [&str; 4] = [
    "New stack, new PRs",
    "Honest review after 30 days",
    "Use my code for 20% off",
    "Morning routine essentials",
];

// All generated dates fall inside a fixed half-year campaign window so a
// given seed always produces byte-identical tables.
const WINDOW_DAYS: i64 = 180;

fn window_start() -> chrono::NaiveDate {
    chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default()
}

fn pick<'a, T>(rng: &mut StdRng, pool: &'a [T]) -> &'a T {
    &pool[rng.gen_range(0..pool.len())]
}

/// Generate the four tables under a fixed seed.
pub fn generate(config: &GeneratorConfig) -> Tables {
    let mut rng = StdRng::seed_from_u64(config.seed);

    let influencers = generate_influencers(&mut rng, config.influencers);
    let posts = generate_posts(&mut rng, &influencers, config.posts);
    let tracking = generate_tracking(&mut rng, &influencers, config.tracking_events);
    let payouts = generate_payouts(&mut rng, &influencers, &tracking);

    info!(
        seed = config.seed,
        influencers = influencers.len(),
        posts = posts.len(),
        tracking_events = tracking.len(),
        payouts = payouts.len(),
        "synthetic dataset generated"
    );

    Tables {
        influencers,
        posts,
        tracking,
        payouts,
    }
}

fn generate_influencers(rng: &mut StdRng, count: usize) -> Vec<Influencer> {
    (0..count)
        .map(|i| {
            let follower_count = rng.gen_range(10_000..1_000_000);
            Influencer {
                id: i as u64 + 1,
                name: format!("Influencer_{}", i + 1),
                category: *pick(rng, &Category::ALL),
                gender: *pick(rng, &Gender::ALL),
                follower_count,
                platform: *pick(rng, &Platform::ALL),
                influencer_type: InfluencerType::from_followers(follower_count),
            }
        })
        .collect()
}

fn generate_posts(rng: &mut StdRng, influencers: &[Influencer], count: usize) -> Vec<Post> {
    if influencers.is_empty() {
        return Vec::new();
    }
    (0..count)
        .map(|i| {
            let influencer = pick(rng, influencers);
            let reach = (influencer.follower_count as f64 * rng.gen_range(0.05..0.40)) as u64;
            let likes = (reach as f64 * rng.gen_range(0.01..0.10)) as u64;
            let comments = (likes as f64 * rng.gen_range(0.05..0.30)) as u64;
            Post {
                influencer_id: influencer.id,
                platform: influencer.platform,
                date: window_start() + chrono::Duration::days(rng.gen_range(0..WINDOW_DAYS)),
                url: format!("https://social.example/{}/post/{}", influencer.name, i + 1),
                caption: (*pick(rng, &CAPTIONS)).to_string(),
                reach,
                likes,
                comments,
            }
        })
        .collect()
}

fn generate_tracking(
    rng: &mut StdRng,
    influencers: &[Influencer],
    count: usize,
) -> Vec<TrackingEvent> {
    if influencers.is_empty() {
        return Vec::new();
    }
    (0..count)
        .map(|_| {
            let influencer = pick(rng, influencers);
            let orders = rng.gen_range(1..=3u64);
            let revenue = orders as f64 * rng.gen_range(300.0..1500.0);
            let group = if rng.gen_bool(0.5) {
                ExperimentGroup::Exposed
            } else {
                ExperimentGroup::Control
            };
            TrackingEvent {
                influencer_id: influencer.id,
                source: (*pick(rng, &SOURCES)).to_string(),
                campaign: (*pick(rng, &CAMPAIGNS)).to_string(),
                user_id: format!("user_{}", rng.gen_range(1..500)),
                product: (*pick(rng, &PRODUCTS)).to_string(),
                date: window_start() + chrono::Duration::days(rng.gen_range(0..WINDOW_DAYS)),
                orders,
                revenue: (revenue * 100.0).round() / 100.0,
                group,
            }
        })
        .collect()
}

fn generate_payouts(
    rng: &mut StdRng,
    influencers: &[Influencer],
    tracking: &[TrackingEvent],
) -> Vec<Payout> {
    influencers
        .iter()
        .map(|influencer| {
            let attributed_orders: u64 = tracking
                .iter()
                .filter(|t| t.influencer_id == influencer.id)
                .map(|t| t.orders)
                .sum();
            let basis = if rng.gen_bool(0.5) {
                PayoutBasis::Order
            } else {
                PayoutBasis::Post
            };
            let (rate, orders, total_payout) = match basis {
                PayoutBasis::Order => {
                    let rate = (rng.gen_range(50.0..300.0f64) * 100.0).round() / 100.0;
                    (rate, attributed_orders, rate * attributed_orders as f64)
                }
                PayoutBasis::Post => {
                    let rate = (rng.gen_range(2_000.0..15_000.0f64) * 100.0).round() / 100.0;
                    (rate, attributed_orders, rate)
                }
            };
            Payout {
                influencer_id: influencer.id,
                basis,
                rate,
                orders,
                total_payout,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader;
    use insights_core::config::GeneratorConfig;

    fn small_config(seed: u64) -> GeneratorConfig {
        GeneratorConfig {
            seed,
            influencers: 8,
            posts: 40,
            tracking_events: 120,
        }
    }

    #[test]
    fn test_shapes_and_referential_integrity() {
        let tables = generate(&small_config(42));
        assert_eq!(tables.influencers.len(), 8);
        assert_eq!(tables.posts.len(), 40);
        assert_eq!(tables.tracking.len(), 120);
        // Exactly one payout row per influencer.
        assert_eq!(tables.payouts.len(), 8);

        let ids: std::collections::HashSet<u64> =
            tables.influencers.iter().map(|i| i.id).collect();
        assert!(tables.posts.iter().all(|p| ids.contains(&p.influencer_id)));
        assert!(tables.tracking.iter().all(|t| ids.contains(&t.influencer_id)));
        assert!(tables.payouts.iter().all(|p| ids.contains(&p.influencer_id)));
    }

    #[test]
    fn test_tier_matches_follower_count() {
        let tables = generate(&small_config(7));
        for influencer in &tables.influencers {
            assert_eq!(
                influencer.influencer_type,
                InfluencerType::from_followers(influencer.follower_count)
            );
        }
    }

    #[test]
    fn test_payout_totals_follow_basis() {
        let tables = generate(&small_config(7));
        for payout in &tables.payouts {
            match payout.basis {
                PayoutBasis::Order => {
                    let expected = payout.rate * payout.orders as f64;
                    assert!((payout.total_payout - expected).abs() < 1e-9);
                }
                PayoutBasis::Post => {
                    assert!((payout.total_payout - payout.rate).abs() < 1e-9);
                }
            }
        }
    }

    #[test]
    fn test_same_seed_same_tables() {
        let a = generate(&small_config(99));
        let b = generate(&small_config(99));
        assert_eq!(
            loader::influencers_to_csv(&a.influencers),
            loader::influencers_to_csv(&b.influencers)
        );
        assert_eq!(loader::posts_to_csv(&a.posts), loader::posts_to_csv(&b.posts));
        assert_eq!(
            loader::tracking_to_csv(&a.tracking),
            loader::tracking_to_csv(&b.tracking)
        );
        assert_eq!(
            loader::payouts_to_csv(&a.payouts),
            loader::payouts_to_csv(&b.payouts)
        );
    }
}
