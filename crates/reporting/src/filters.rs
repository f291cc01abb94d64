//! Filter engine: derive the selectable values from the loaded tables,
//! then produce filtered snapshots by relational selection.

use insights_core::types::{Category, InfluencerType, Platform, Tables};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Distinct values observed in the loaded data, the universe the user can
/// select from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterOptions {
    pub platforms: Vec<Platform>,
    pub categories: Vec<Category>,
    pub products: Vec<String>,
    pub influencer_types: Vec<InfluencerType>,
}

impl FilterOptions {
    pub fn from_tables(tables: &Tables) -> Self {
        let platforms: BTreeSet<Platform> =
            tables.influencers.iter().map(|i| i.platform).collect();
        let categories: BTreeSet<Category> =
            tables.influencers.iter().map(|i| i.category).collect();
        let products: BTreeSet<String> =
            tables.tracking.iter().map(|t| t.product.clone()).collect();
        let influencer_types: BTreeSet<InfluencerType> =
            tables.influencers.iter().map(|i| i.influencer_type).collect();

        Self {
            platforms: platforms.into_iter().collect(),
            categories: categories.into_iter().collect(),
            products: products.into_iter().collect(),
            influencer_types: influencer_types.into_iter().collect(),
        }
    }
}

/// The user's chosen subset of each filter dimension. An empty set is a
/// legitimate selection and yields empty filtered tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterSelection {
    pub platforms: BTreeSet<Platform>,
    pub categories: BTreeSet<Category>,
    pub products: BTreeSet<String>,
    pub influencer_types: BTreeSet<InfluencerType>,
}

impl FilterSelection {
    /// Default selection: everything observed in the data.
    pub fn all(options: &FilterOptions) -> Self {
        Self {
            platforms: options.platforms.iter().copied().collect(),
            categories: options.categories.iter().copied().collect(),
            products: options.products.iter().cloned().collect(),
            influencer_types: options.influencer_types.iter().copied().collect(),
        }
    }
}

/// Apply the selection: influencers by conjunctive attribute membership,
/// dependent tables by influencer-id reference (tracking additionally by
/// product). The originals are never mutated.
pub fn apply(tables: &Tables, selection: &FilterSelection) -> Tables {
    let influencers: Vec<_> = tables
        .influencers
        .iter()
        .filter(|i| {
            selection.platforms.contains(&i.platform)
                && selection.categories.contains(&i.category)
                && selection.influencer_types.contains(&i.influencer_type)
        })
        .cloned()
        .collect();

    let ids: HashSet<u64> = influencers.iter().map(|i| i.id).collect();

    Tables {
        posts: tables
            .posts
            .iter()
            .filter(|p| ids.contains(&p.influencer_id))
            .cloned()
            .collect(),
        tracking: tables
            .tracking
            .iter()
            .filter(|t| ids.contains(&t.influencer_id) && selection.products.contains(&t.product))
            .cloned()
            .collect(),
        payouts: tables
            .payouts
            .iter()
            .filter(|p| ids.contains(&p.influencer_id))
            .cloned()
            .collect(),
        influencers,
    }
}
