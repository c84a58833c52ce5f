use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::algorithms::{CommunityOptions, StandardAlgorithms};
use crate::builder::{GraphModelBuilder, DEFAULT_PALETTE};
use crate::error::Result;
use crate::filter::FilterSettings;

/// How one dashboard view is built and filtered. Every field has a default,
/// so an empty file is a valid configuration.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ViewConfig {
    pub directed: bool,
    pub palette: Vec<String>,
    pub filters: FilterSettings,
    pub focus: Option<String>,
    pub layout: String,
    /// Shorthand for `communities.weighted`; either one switches weighting on.
    pub weighted_communities: bool,
    pub communities: CommunityOptions,
}

impl Default for ViewConfig {
    fn default() -> Self {
        ViewConfig {
            directed: false,
            palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
            filters: FilterSettings::default(),
            focus: None,
            layout: "cise".to_string(),
            weighted_communities: false,
            communities: CommunityOptions::default(),
        }
    }
}

impl ViewConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn community_options(&self) -> CommunityOptions {
        CommunityOptions {
            weighted: self.communities.weighted || self.weighted_communities,
            ..self.communities.clone()
        }
    }

    pub fn builder(&self) -> GraphModelBuilder {
        GraphModelBuilder::new()
            .with_algorithms(StandardAlgorithms::new(self.community_options()))
            .with_palette(self.palette.clone())
    }
}
