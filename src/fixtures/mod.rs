//! Fixtures

use std::{fs, path::PathBuf};

use thiserror::Error;

use crate::{
    batches::Batch,
    fixtures::catalog::{CatalogFixture, TargetFixture},
    params::OptimizerParams,
    service::{Algorithm, BlendRequest},
    target::BlendTarget,
};

pub mod catalog;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Target not found
    #[error("Target not found: {0}")]
    TargetNotFound(String),

    /// Catalog has no targets to choose from
    #[error("Catalog defines no targets")]
    NoTargets,
}

/// A loaded batch catalog with its named targets.
#[derive(Debug)]
pub struct Fixture {
    /// Base path for fixture files
    base_path: PathBuf,

    /// Parsed catalog
    catalog: CatalogFixture,
}

impl Fixture {
    /// Create an empty fixture rooted at `./fixtures`
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create an empty fixture with a custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            catalog: CatalogFixture::default(),
        }
    }

    /// Load `catalogs/<name>.yml` from the base path, replacing anything loaded before
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_catalog(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("catalogs").join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;

        self.catalog = serde_norway::from_str(&contents)?;

        Ok(self)
    }

    /// Load a named catalog from `./fixtures`
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::new();

        fixture.load_catalog(name)?;

        Ok(fixture)
    }

    /// Parse a catalog from YAML text
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML cannot be parsed.
    pub fn from_yaml(yaml: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::new();

        fixture.catalog = serde_norway::from_str(yaml)?;

        Ok(fixture)
    }

    /// Batches in the catalog
    pub fn batches(&self) -> &[Batch] {
        &self.catalog.batches
    }

    /// Target names, sorted
    pub fn target_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.catalog.targets.keys().map(String::as_str).collect();

        names.sort_unstable();

        names
    }

    /// Get a target by name
    ///
    /// # Errors
    ///
    /// Returns an error if the target is not found.
    pub fn target(&self, name: &str) -> Result<&BlendTarget, FixtureError> {
        self.target_fixture(name).map(|fixture| &fixture.target)
    }

    /// Parameter override for a target, if the catalog sets one
    ///
    /// # Errors
    ///
    /// Returns an error if the target is not found.
    pub fn params(&self, name: &str) -> Result<Option<OptimizerParams>, FixtureError> {
        self.target_fixture(name).map(TargetFixture::params)
    }

    /// Name of the first target, for callers that did not pick one
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog has no targets.
    pub fn default_target_name(&self) -> Result<&str, FixtureError> {
        self.target_names()
            .first()
            .copied()
            .ok_or(FixtureError::NoTargets)
    }

    /// Build a blend request for a named target
    ///
    /// # Errors
    ///
    /// Returns an error if the target is not found.
    pub fn request(&self, name: &str, algorithm: Algorithm) -> Result<BlendRequest, FixtureError> {
        let fixture = self.target_fixture(name)?;

        let mut request = BlendRequest::new(self.catalog.batches.clone(), fixture.target.clone())
            .with_algorithm(algorithm);

        request.params = fixture.params();

        Ok(request)
    }

    fn target_fixture(&self, name: &str) -> Result<&TargetFixture, FixtureError> {
        self.catalog
            .targets
            .get(name)
            .ok_or_else(|| FixtureError::TargetNotFound(name.to_string()))
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}
