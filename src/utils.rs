//! Utils

use std::path::PathBuf;

use clap::Parser;

use crate::{observability::LoggingConfig, service::Algorithm};

/// Arguments for the blend demo
#[derive(Debug, Parser)]
pub struct DemoArgs {
    /// Catalog fixture to load from `fixtures/catalogs`
    #[clap(short, long, env = "BLEND_FIXTURE", default_value = "robusta")]
    pub fixture: String,

    /// Target to optimise; every target in the catalog when omitted
    #[clap(short, long, env = "BLEND_TARGET")]
    pub target: Option<String>,

    /// Engine selector (`HYBRID` relaxes constraints, anything else solves once)
    #[clap(short, long, env = "BLEND_ALGORITHM", default_value = "HYBRID")]
    pub algorithm: String,

    /// Output file path
    #[clap(short, long)]
    pub out: Option<PathBuf>,

    /// Logging settings
    #[command(flatten)]
    pub logging: LoggingConfig,
}

impl DemoArgs {
    /// Engine variant named by the selector.
    pub fn algorithm(&self) -> Algorithm {
        Algorithm::from_selector(&self.algorithm)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn selector_maps_to_an_algorithm() -> TestResult {
        let args = DemoArgs::try_parse_from(["blend", "-a", "default", "-t", "house_blend"])?;

        assert_eq!(args.algorithm(), Algorithm::Standard);
        assert_eq!(args.target.as_deref(), Some("house_blend"));

        Ok(())
    }
}
