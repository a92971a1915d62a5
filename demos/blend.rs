//! Blend Optimisation Example
//!
//! Loads a batch catalog and optimises one or all of its targets.
//!
//! Use `-f` to load a catalog fixture by name
//! Use `-t` to pick a single target
//! Use `-a` to choose the engine (`HYBRID` or `DEFAULT`)
//! Use `-o` to also write the reports to a file

use std::{
    fs::File,
    io::{self, Write},
};

use anyhow::Result;
use clap::Parser;
use tracing::info;

use blend_optimizer::{
    fixtures::Fixture, observability::init_logging, report::write_report, service::BlendService,
    solvers::initialise, utils::DemoArgs,
};

/// Blend Optimisation Example
pub fn main() -> Result<()> {
    let args = DemoArgs::parse();

    init_logging(&args.logging)?;

    let backend = initialise()?;
    info!(backend, "solver ready");

    let fixture = Fixture::from_set(&args.fixture)?;
    let algorithm = args.algorithm();

    let targets = match args.target.as_deref() {
        Some(name) => vec![name],
        None => fixture.target_names(),
    };

    let service = BlendService::new();

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    let mut file = args.out.as_deref().map(File::create).transpose()?;

    for name in targets {
        let request = fixture.request(name, algorithm)?;
        let result = service.optimize(&request)?;
        let target = fixture.target(name)?;

        writeln!(handle, "\n== {name} ({algorithm}, {}) ==", target.mode)?;
        write_report(&mut handle, &result, fixture.batches(), target)?;

        if let Some(file) = file.as_mut() {
            writeln!(file, "== {name} ({algorithm}, {}) ==", target.mode)?;
            write_report(&mut *file, &result, fixture.batches(), target)?;
        }
    }

    if let Some(out) = args.out.as_deref() {
        info!(path = %out.display(), "reports written");
    }

    Ok(())
}
