//! Effective-table resolution: defaults loaded or generated once per
//! process, overrides applied per table on top. Two explicit stages, no
//! hidden global state.

use crate::{generator, loader};
use insights_core::config::AppConfig;
use insights_core::types::Tables;
use insights_core::InsightsResult;
use std::path::{Path, PathBuf};
use tracing::info;

pub const INFLUENCERS_FILE: &str = "influencers.csv";
pub const POSTS_FILE: &str = "posts.csv";
pub const TRACKING_FILE: &str = "tracking_data.csv";
pub const PAYOUTS_FILE: &str = "payouts.csv";

/// User-supplied CSV payloads, each independently optional.
#[derive(Debug, Clone, Default)]
pub struct TableOverrides {
    pub influencers: Option<String>,
    pub posts: Option<String>,
    pub tracking: Option<String>,
    pub payouts: Option<String>,
}

impl TableOverrides {
    pub fn is_empty(&self) -> bool {
        self.influencers.is_none()
            && self.posts.is_none()
            && self.tracking.is_none()
            && self.payouts.is_none()
    }

    /// Read override payloads from optional file paths.
    pub fn from_paths(
        influencers: Option<&Path>,
        posts: Option<&Path>,
        tracking: Option<&Path>,
        payouts: Option<&Path>,
    ) -> InsightsResult<Self> {
        Ok(Self {
            influencers: influencers.map(loader::read_to_string).transpose()?,
            posts: posts.map(loader::read_to_string).transpose()?,
            tracking: tracking.map(loader::read_to_string).transpose()?,
            payouts: payouts.map(loader::read_to_string).transpose()?,
        })
    }
}

/// Holds the default tables for the process lifetime. The defaults are
/// read-only; `resolve` hands out fresh snapshots for each render pass.
pub struct DatasetStore {
    defaults: Tables,
}

impl DatasetStore {
    /// Read defaults from the data directory when all four CSVs are
    /// present, otherwise generate them from config.
    pub fn open(config: &AppConfig) -> InsightsResult<Self> {
        let dir = PathBuf::from(&config.data_dir);
        let paths = [
            dir.join(INFLUENCERS_FILE),
            dir.join(POSTS_FILE),
            dir.join(TRACKING_FILE),
            dir.join(PAYOUTS_FILE),
        ];

        let defaults = if paths.iter().all(|p| p.is_file()) {
            info!(dir = %dir.display(), "loading default tables from disk");
            Tables {
                influencers: loader::load_influencers(&loader::read_to_string(&paths[0])?)?,
                posts: loader::load_posts(&loader::read_to_string(&paths[1])?)?,
                tracking: loader::load_tracking(&loader::read_to_string(&paths[2])?)?,
                payouts: loader::load_payouts(&loader::read_to_string(&paths[3])?)?,
            }
        } else {
            info!(seed = config.generator.seed, "generating default tables");
            generator::generate(&config.generator)
        };

        Ok(Self { defaults })
    }

    pub fn from_tables(defaults: Tables) -> Self {
        Self { defaults }
    }

    pub fn defaults(&self) -> &Tables {
        &self.defaults
    }

    /// Effective tables for one render pass: each override is parsed and
    /// validated when present, else the cached default is used.
    pub fn resolve(&self, overrides: &TableOverrides) -> InsightsResult<Tables> {
        Ok(Tables {
            influencers: match &overrides.influencers {
                Some(text) => loader::load_influencers(text)?,
                None => self.defaults.influencers.clone(),
            },
            posts: match &overrides.posts {
                Some(text) => loader::load_posts(text)?,
                None => self.defaults.posts.clone(),
            },
            tracking: match &overrides.tracking {
                Some(text) => loader::load_tracking(text)?,
                None => self.defaults.tracking.clone(),
            },
            payouts: match &overrides.payouts {
                Some(text) => loader::load_payouts(text)?,
                None => self.defaults.payouts.clone(),
            },
        })
    }
}

/// Persist tables as the four CSVs the loader reads back.
pub fn write_to_dir(tables: &Tables, dir: &Path) -> InsightsResult<()> {
    std::fs::create_dir_all(dir)?;
    std::fs::write(
        dir.join(INFLUENCERS_FILE),
        loader::influencers_to_csv(&tables.influencers),
    )?;
    std::fs::write(dir.join(POSTS_FILE), loader::posts_to_csv(&tables.posts))?;
    std::fs::write(
        dir.join(TRACKING_FILE),
        loader::tracking_to_csv(&tables.tracking),
    )?;
    std::fs::write(
        dir.join(PAYOUTS_FILE),
        loader::payouts_to_csv(&tables.payouts),
    )?;
    info!(dir = %dir.display(), "datasets written");
    Ok(())
}
