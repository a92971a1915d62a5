//! Report
//!
//! Terminal rendering of a blend result against its target.

use std::{io, ops::Range};

use humanize_duration::{Truncate, prelude::DurationExt};
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    attributes::Attribute, batches::Batch, result::BlendResult, target::BlendTarget,
};

/// Errors that can occur when writing a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Writing to the output failed.
    #[error("failed to write report: {0}")]
    Io(#[from] io::Error),
}

/// Write the composition table, the attribute comparison table and a summary.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub fn write_report(
    mut out: impl io::Write,
    result: &BlendResult,
    batches: &[Batch],
    target: &BlendTarget,
) -> Result<(), ReportError> {
    if result.composition.is_empty() {
        writeln!(out, "\nNo blend found.")?;
    } else {
        let table = render_table(composition_builder(result, batches), Columns::new(2..4));

        writeln!(out, "\n{table}")?;
    }

    if result.feasible {
        let table = render_table(attribute_builder(result, target), Columns::new(1..4));

        writeln!(out, "{table}")?;
    }

    write_summary(&mut out, result)?;

    writeln!(out)?;

    Ok(())
}

fn composition_builder(result: &BlendResult, batches: &[Batch]) -> Builder {
    let mut builder = Builder::default();

    builder.push_record(["Batch", "Name", "Share", "Weight"]);

    for (id, share) in result.sorted_composition() {
        let name = batches
            .iter()
            .find(|batch| batch.id == id)
            .map_or("", |batch| batch.name.as_str());

        let weight = result
            .weight_distribution
            .get(id)
            .copied()
            .unwrap_or_default();

        builder.push_record([
            id.to_string(),
            name.to_string(),
            format!("{:.2}%", share * 100.0),
            format!("{weight:.2}"),
        ]);
    }

    builder
}

fn attribute_builder(result: &BlendResult, target: &BlendTarget) -> Builder {
    let mut builder = Builder::default();

    builder.push_record(["Attribute", "Predicted", "Target", "Deviation"]);

    for attribute in Attribute::ALL {
        let predicted = result.predicted.get(attribute);

        let (wanted, deviation) = if target.tracks(attribute) {
            let wanted = target.values.get(attribute);

            (format_value(attribute, wanted), format_value(attribute, predicted - wanted))
        } else {
            ("-".to_string(), "-".to_string())
        };

        builder.push_record([
            attribute.label().to_string(),
            format_value(attribute, predicted),
            wanted,
            deviation,
        ]);
    }

    builder
}

fn format_value(attribute: Attribute, value: f64) -> String {
    match attribute {
        Attribute::Price => format!("{value:.0}"),
        _ => format!("{value:.2}"),
    }
}

fn render_table(builder: Builder, numeric: Columns<Range<usize>>) -> String {
    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(
        1,
        HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤')),
    );

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);
    table.modify(numeric, Alignment::right());

    table.to_string()
}

fn write_summary(out: &mut impl io::Write, result: &BlendResult) -> Result<(), ReportError> {
    writeln!(out, " Status:     {}", result.status_label())?;

    if result.feasible {
        writeln!(out, " Similarity: {:.1}%", result.similarity_score)?;
        writeln!(out, " Objective:  {:.4}", result.objective_value)?;
    }

    writeln!(out, " Elapsed:    {}", result.elapsed.human(Truncate::Nano))?;
    writeln!(out, " Retries:    {}", result.retry_count)?;

    if !result.relaxation_trace.is_empty() {
        writeln!(out, " Trace:")?;

        for line in result.relaxation_trace.lines() {
            writeln!(out, "   {line}")?;
        }
    }

    Ok(())
}
