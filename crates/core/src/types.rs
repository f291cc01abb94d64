//! Row types for the four campaign datasets and their enumerated attributes.

use crate::error::InsightsError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Instagram,
    YouTube,
    Twitter,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Instagram, Platform::YouTube, Platform::Twitter];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Fitness,
    Health,
    Lifestyle,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Fitness, Category::Health, Category::Lifestyle];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Other];
}

/// Follower-count tier, derived once at data-generation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfluencerType {
    Nano,
    Micro,
    Macro,
    Mega,
}

impl InfluencerType {
    pub const ALL: [InfluencerType; 4] = [
        InfluencerType::Nano,
        InfluencerType::Micro,
        InfluencerType::Macro,
        InfluencerType::Mega,
    ];

    /// Tier thresholds: <50k Nano, <100k Micro, <500k Macro, else Mega.
    pub fn from_followers(follower_count: u64) -> Self {
        if follower_count >= 500_000 {
            InfluencerType::Mega
        } else if follower_count >= 100_000 {
            InfluencerType::Macro
        } else if follower_count >= 50_000 {
            InfluencerType::Micro
        } else {
            InfluencerType::Nano
        }
    }
}

/// How an influencer is compensated: a flat rate per post, or a rate
/// multiplied by attributed orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutBasis {
    Post,
    Order,
}

/// Experimental assignment label on a tracking event. Supplied as raw
/// data; this system does not model the assignment mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentGroup {
    Control,
    Exposed,
}

impl ExperimentGroup {
    /// Wire encoding: 0 = control, 1 = exposed.
    pub fn from_flag(flag: u8) -> Option<Self> {
        match flag {
            0 => Some(ExperimentGroup::Control),
            1 => Some(ExperimentGroup::Exposed),
            _ => None,
        }
    }

    pub fn as_flag(self) -> u8 {
        match self {
            ExperimentGroup::Control => 0,
            ExperimentGroup::Exposed => 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Influencer {
    pub id: u64,
    pub name: String,
    pub category: Category,
    pub gender: Gender,
    pub follower_count: u64,
    pub platform: Platform,
    pub influencer_type: InfluencerType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub influencer_id: u64,
    pub platform: Platform,
    pub date: NaiveDate,
    pub url: String,
    pub caption: String,
    pub reach: u64,
    pub likes: u64,
    pub comments: u64,
}

impl Post {
    /// (likes + comments) / reach. Undefined when the post reached nobody.
    pub fn engagement_rate(&self) -> Option<f64> {
        if self.reach == 0 {
            return None;
        }
        Some((self.likes + self.comments) as f64 / self.reach as f64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingEvent {
    pub influencer_id: u64,
    pub source: String,
    pub campaign: String,
    pub user_id: String,
    pub product: String,
    pub date: NaiveDate,
    pub orders: u64,
    pub revenue: f64,
    pub group: ExperimentGroup,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payout {
    pub influencer_id: u64,
    pub basis: PayoutBasis,
    pub rate: f64,
    pub orders: u64,
    pub total_payout: f64,
}

/// The four loaded tables, an immutable snapshot for one render pass.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub influencers: Vec<Influencer>,
    pub posts: Vec<Post>,
    pub tracking: Vec<TrackingEvent>,
    pub payouts: Vec<Payout>,
}

// ─── Wire names ──────────────────────────────────────────────────────
//
// The CSV datasets carry capitalised enum values ("Instagram", "Fitness",
// "Nano"); payout basis is lowercase ("post"/"order"). FromStr accepts the
// wire form case-insensitively, Display produces it.

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::Instagram => "Instagram",
            Platform::YouTube => "YouTube",
            Platform::Twitter => "Twitter",
        };
        f.write_str(name)
    }
}

impl FromStr for Platform {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "instagram" => Ok(Platform::Instagram),
            "youtube" => Ok(Platform::YouTube),
            "twitter" => Ok(Platform::Twitter),
            other => Err(InsightsError::Parse(format!("unknown platform: {other:?}"))),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Fitness => "Fitness",
            Category::Health => "Health",
            Category::Lifestyle => "Lifestyle",
        };
        f.write_str(name)
    }
}

impl FromStr for Category {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fitness" => Ok(Category::Fitness),
            "health" => Ok(Category::Health),
            "lifestyle" => Ok(Category::Lifestyle),
            other => Err(InsightsError::Parse(format!("unknown category: {other:?}"))),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        };
        f.write_str(name)
    }
}

impl FromStr for Gender {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            value => Err(InsightsError::Parse(format!("unknown gender: {value:?}"))),
        }
    }
}

impl fmt::Display for InfluencerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InfluencerType::Nano => "Nano",
            InfluencerType::Micro => "Micro",
            InfluencerType::Macro => "Macro",
            InfluencerType::Mega => "Mega",
        };
        f.write_str(name)
    }
}

impl FromStr for InfluencerType {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nano" => Ok(InfluencerType::Nano),
            "micro" => Ok(InfluencerType::Micro),
            "macro" => Ok(InfluencerType::Macro),
            "mega" => Ok(InfluencerType::Mega),
            other => Err(InsightsError::Parse(format!(
                "unknown influencer type: {other:?}"
            ))),
        }
    }
}

impl fmt::Display for PayoutBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PayoutBasis::Post => "post",
            PayoutBasis::Order => "order",
        };
        f.write_str(name)
    }
}

impl FromStr for PayoutBasis {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "post" => Ok(PayoutBasis::Post),
            "order" => Ok(PayoutBasis::Order),
            other => Err(InsightsError::Parse(format!(
                "unknown payout basis: {other:?}"
            ))),
        }
    }
}
