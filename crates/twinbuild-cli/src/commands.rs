use anyhow::Context;
use tracing::info;
use twinbuild_archive::{pack_directory, resolve};
use twinbuild_diff::{DiffEngine, DiffReport};

use crate::cli::Cli;
use crate::reporter;

/// Exit status when no compiled unit differs.
pub const EXIT_CLEAN: u8 = 0;
/// Exit status when at least one compiled unit differs.
pub const EXIT_DIVERGENT: u8 = 1;
/// Exit status for invalid invocations and runs that produced no report.
pub const EXIT_USAGE: u8 = 2;

pub fn exit_code(report: &DiffReport) -> u8 {
    if report.has_error() {
        EXIT_DIVERGENT
    } else {
        EXIT_CLEAN
    }
}

/// Resolve both inputs, run the engine and print the report to stdout.
pub async fn run(cli: Cli) -> anyhow::Result<u8> {
    let original = resolve(&cli.original)
        .with_context(|| format!("cannot use {} as the original build", cli.original.display()))?;
    let incremental = resolve(&cli.incremental).with_context(|| {
        format!("cannot use {} as the incremental build", cli.incremental.display())
    })?;

    let config = cli.diff_config();
    info!(
        original = %original.source().display(),
        incremental = %incremental.source().display(),
        compare_other = config.compare_other_files,
        compare_methods = config.compare_method_bodies,
        workers = config.workers,
        "starting comparison"
    );
    let report = DiffEngine::new(config)
        .run(original.path(), incremental.path())
        .await
        .context("comparison failed")?;

    if cli.archive_diagnostics {
        let dest = cli.diagnostics_archive();
        let files = pack_directory(&cli.diagnostics_dir, &dest)
            .with_context(|| format!("failed to archive {}", cli.diagnostics_dir.display()))?;
        info!(archive = %dest.display(), files, "archived diagnostics");
    }

    let mut out = std::io::stdout().lock();
    reporter::render(cli.format, &report, &mut out).context("failed to write report")?;
    Ok(exit_code(&report))
}
