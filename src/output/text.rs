//! Console summary of a run

use std::io::{self, Write};

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::diagnostics::Severity;
use crate::pipeline::{AggregatorOutcome, DestinationStatus, RunSummary};

/// Writes a run summary to any color-capable writer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryFormatter {
    /// Also list info-level diagnostics.
    pub show_info: bool,
}

impl SummaryFormatter {
    pub fn new(show_info: bool) -> Self {
        Self { show_info }
    }

    pub fn write<W: WriteColor>(&self, out: &mut W, summary: &RunSummary) -> io::Result<()> {
        let mut bold = ColorSpec::new();
        bold.set_bold(true);

        out.set_color(&bold)?;
        write!(out, "{}", summary.input.display())?;
        out.reset()?;
        writeln!(
            out,
            ": {} of {} `{}` definition(s) extracted{}",
            summary.counts.extracted,
            summary.counts.candidates,
            summary.owner,
            if summary.dry_run { " (dry run)" } else { "" }
        )?;

        if !summary.destinations.is_empty() {
            writeln!(out)?;
            for destination in &summary.destinations {
                let (label, color) = status_style(destination.status);
                write!(out, "  ")?;
                out.set_color(ColorSpec::new().set_fg(Some(color)))?;
                write!(out, "{:<10}", label)?;
                out.reset()?;
                writeln!(
                    out,
                    " {}  {} function(s)  [{}]",
                    destination.path.display(),
                    destination.functions.len(),
                    destination.classification
                )?;
            }
        }

        writeln!(out)?;
        self.write_aggregator(out, summary)?;
        self.write_diagnostics(out, summary)?;

        let counts = &summary.counts;
        writeln!(
            out,
            "skipped: {} unterminated, {} nested, {} unrecognized; defaulted: {}; duplicates: {}; comment blocks dropped: {}",
            counts.unterminated,
            counts.nested,
            counts.unrecognized,
            counts.defaulted,
            counts.duplicates,
            counts.comment_blocks_dropped
        )?;
        Ok(())
    }

    /// Render to a plain string without colors.
    pub fn format(&self, summary: &RunSummary) -> String {
        let mut buffer = termcolor::Buffer::no_color();
        // Writing into memory cannot fail.
        let _ = self.write(&mut buffer, summary);
        String::from_utf8_lossy(buffer.as_slice()).into_owned()
    }

    fn write_aggregator<W: WriteColor>(&self, out: &mut W, summary: &RunSummary) -> io::Result<()> {
        write!(out, "aggregator: ")?;
        match &summary.aggregator {
            AggregatorOutcome::Rewritten => {
                out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
                write!(out, "rewritten")?;
                out.reset()?;
                if summary.forced {
                    write!(out, " (forced)")?;
                }
                writeln!(out)?;
            }
            AggregatorOutcome::Unchanged => writeln!(out, "unchanged")?,
            AggregatorOutcome::Planned => writeln!(out, "would be rewritten")?,
            AggregatorOutcome::NothingToSplit => writeln!(out, "nothing to split")?,
            AggregatorOutcome::Withheld { reasons } => {
                out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true))?;
                write!(out, "withheld")?;
                out.reset()?;
                writeln!(out, " (use --force to override)")?;
                for reason in reasons {
                    writeln!(out, "  - {}", reason)?;
                }
            }
            AggregatorOutcome::Failed { message } => {
                out.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
                write!(out, "failed")?;
                out.reset()?;
                writeln!(out, ": {}", message)?;
            }
        }
        Ok(())
    }

    fn write_diagnostics<W: WriteColor>(&self, out: &mut W, summary: &RunSummary) -> io::Result<()> {
        let shown: Vec<_> = summary
            .diagnostics
            .iter()
            .filter(|d| self.show_info || d.severity() > Severity::Info)
            .collect();
        if shown.is_empty() {
            return Ok(());
        }

        writeln!(out)?;
        for diagnostic in shown {
            let (label, color) = match diagnostic.severity() {
                Severity::Error => ("error", Color::Red),
                Severity::Warning => ("warning", Color::Yellow),
                Severity::Info => ("info", Color::Cyan),
            };
            out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
            write!(out, "{}", label)?;
            out.reset()?;
            writeln!(out, ": {}", diagnostic)?;
        }
        writeln!(out)?;
        Ok(())
    }
}

fn status_style(status: DestinationStatus) -> (&'static str, Color) {
    match status {
        DestinationStatus::Written => ("written", Color::Green),
        DestinationStatus::Unchanged => ("unchanged", Color::Blue),
        DestinationStatus::Planned => ("planned", Color::Cyan),
        DestinationStatus::Failed => ("failed", Color::Red),
    }
}

/// Print the run summary to stdout.
pub fn print_summary(summary: &RunSummary, use_color: bool, show_info: bool) -> io::Result<()> {
    let color_choice = if use_color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stdout = StandardStream::stdout(color_choice);
    SummaryFormatter::new(show_info).write(&mut stdout, summary)
}
