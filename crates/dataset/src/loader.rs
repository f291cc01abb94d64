//! Table loaders: CSV text in, typed rows out, with fail-fast schema and
//! cell-level validation.

use crate::csv::{self, Record};
use crate::schema::{self, BoundHeader};
use insights_core::types::{
    ExperimentGroup, Influencer, Payout, PayoutBasis, Post, TrackingEvent,
};
use insights_core::{InsightsError, InsightsResult};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

pub fn load_influencers(text: &str) -> InsightsResult<Vec<Influencer>> {
    let (header, records) = csv::parse(text)?;
    let bound = schema::INFLUENCERS.bind(&header)?;

    let mut seen = HashSet::new();
    let mut rows = Vec::with_capacity(records.len());
    for record in &records {
        let influencer = Influencer {
            id: bound.parse_cell(record, "id")?,
            name: bound.cell(record, "name")?.to_string(),
            category: bound.parse_cell(record, "category")?,
            gender: bound.parse_cell(record, "gender")?,
            follower_count: bound.parse_cell(record, "follower_count")?,
            platform: bound.parse_cell(record, "platform")?,
            influencer_type: bound.parse_cell(record, "influencer_type")?,
        };
        if !seen.insert(influencer.id) {
            return Err(InsightsError::Dataset(format!(
                "influencers line {}: duplicate influencer id {}",
                record.line, influencer.id
            )));
        }
        rows.push(influencer);
    }
    debug!(rows = rows.len(), "influencers loaded");
    Ok(rows)
}

pub fn load_posts(text: &str) -> InsightsResult<Vec<Post>> {
    let (header, records) = csv::parse(text)?;
    let bound = schema::POSTS.bind(&header)?;

    let mut rows = Vec::with_capacity(records.len());
    for record in &records {
        rows.push(Post {
            influencer_id: bound.parse_cell(record, "influencer_id")?,
            platform: bound.parse_cell(record, "platform")?,
            date: bound.parse_cell(record, "date")?,
            url: bound.cell(record, "url")?.to_string(),
            caption: bound.cell(record, "caption")?.to_string(),
            reach: bound.parse_cell(record, "reach")?,
            likes: bound.parse_cell(record, "likes")?,
            comments: bound.parse_cell(record, "comments")?,
        });
    }
    debug!(rows = rows.len(), "posts loaded");
    Ok(rows)
}

pub fn load_tracking(text: &str) -> InsightsResult<Vec<TrackingEvent>> {
    let (header, records) = csv::parse(text)?;
    let bound = schema::TRACKING.bind(&header)?;

    let mut rows = Vec::with_capacity(records.len());
    for record in &records {
        rows.push(TrackingEvent {
            influencer_id: bound.parse_cell(record, "influencer_id")?,
            source: bound.cell(record, "source")?.to_string(),
            campaign: bound.cell(record, "campaign")?.to_string(),
            user_id: bound.cell(record, "user_id")?.to_string(),
            product: bound.cell(record, "product")?.to_string(),
            date: bound.parse_cell(record, "date")?,
            orders: bound.parse_cell(record, "orders")?,
            revenue: bound.parse_cell(record, "revenue")?,
            group: parse_group(&bound, record)?,
        });
    }
    debug!(rows = rows.len(), "tracking events loaded");
    Ok(rows)
}

pub fn load_payouts(text: &str) -> InsightsResult<Vec<Payout>> {
    let (header, records) = csv::parse(text)?;
    let bound = schema::PAYOUTS.bind(&header)?;

    let mut seen = HashSet::new();
    let mut rows = Vec::with_capacity(records.len());
    for record in &records {
        let payout = Payout {
            influencer_id: bound.parse_cell(record, "influencer_id")?,
            basis: bound.parse_cell(record, "basis")?,
            rate: bound.parse_cell(record, "rate")?,
            orders: bound.parse_cell(record, "orders")?,
            total_payout: bound.parse_cell(record, "total_payout")?,
        };
        // One payout row per influencer.
        if !seen.insert(payout.influencer_id) {
            return Err(InsightsError::Dataset(format!(
                "payouts line {}: duplicate payout for influencer {}",
                record.line, payout.influencer_id
            )));
        }
        rows.push(payout);
    }
    debug!(rows = rows.len(), "payouts loaded");
    Ok(rows)
}

fn parse_group(bound: &BoundHeader, record: &Record) -> InsightsResult<ExperimentGroup> {
    let flag: u8 = bound.parse_cell(record, "group")?;
    ExperimentGroup::from_flag(flag).ok_or_else(|| {
        InsightsError::Parse(format!(
            "{} line {}, column \"group\": expected 0 (control) or 1 (exposed), got {flag}",
            bound.table(),
            record.line
        ))
    })
}

pub fn read_to_string(path: &Path) -> InsightsResult<String> {
    std::fs::read_to_string(path).map_err(|e| {
        InsightsError::Dataset(format!("cannot read {}: {e}", path.display()))
    })
}

// ─── Encoders ────────────────────────────────────────────────────────
//
// The serialize side of the same wire contract, used when persisting
// generated datasets.

pub fn influencers_to_csv(rows: &[Influencer]) -> String {
    let data: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            vec![
                r.id.to_string(),
                r.name.clone(),
                r.category.to_string(),
                r.gender.to_string(),
                r.follower_count.to_string(),
                r.platform.to_string(),
                r.influencer_type.to_string(),
            ]
        })
        .collect();
    csv::format_document(schema::INFLUENCERS.required, &data)
}

pub fn posts_to_csv(rows: &[Post]) -> String {
    let data: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            vec![
                r.influencer_id.to_string(),
                r.platform.to_string(),
                r.date.to_string(),
                r.url.clone(),
                r.caption.clone(),
                r.reach.to_string(),
                r.likes.to_string(),
                r.comments.to_string(),
            ]
        })
        .collect();
    csv::format_document(schema::POSTS.required, &data)
}

pub fn tracking_to_csv(rows: &[TrackingEvent]) -> String {
    let data: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            vec![
                r.influencer_id.to_string(),
                r.source.clone(),
                r.campaign.clone(),
                r.user_id.clone(),
                r.product.clone(),
                r.date.to_string(),
                r.orders.to_string(),
                format!("{:.2}", r.revenue),
                r.group.as_flag().to_string(),
            ]
        })
        .collect();
    csv::format_document(schema::TRACKING.required, &data)
}

pub fn payouts_to_csv(rows: &[Payout]) -> String {
    let data: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            vec![
                r.influencer_id.to_string(),
                r.basis.to_string(),
                format!("{:.2}", r.rate),
                r.orders.to_string(),
                format!("{:.2}", r.total_payout),
            ]
        })
        .collect();
    csv::format_document(schema::PAYOUTS.required, &data)
}
