//! `sprout install` command implementation.
//!
//! Checks the installation root, selects a mirror for every server list,
//! installs the requested packages with their dependencies and finishes
//! with a handoff or the collected failures.

use std::time::Instant;

use sprout_config::file::validate_reference;
use sprout_core::error::{SproutError, SproutResult};
use sprout_core::types::PackageReference;
use sprout_installer::{InstallOutcome, InstallerOptions, PackageInstaller};

use super::{CommandContext, InstallArgs, Settings};
use crate::finalize::Finalization;
use crate::probe::check_environment;

/// Execute the `sprout install` command
pub async fn execute(args: InstallArgs, ctx: &CommandContext) -> SproutResult<u8> {
    let start_time = Instant::now();
    let settings = Settings::load(&args.config, ctx).await?;
    ctx.output
        .info(&format!("Configuration: {}", settings.source));

    let packages = requested_packages(&args.packages, &settings)?;

    ctx.output
        .step("🔍", &format!("Checking {}", settings.root.display()));
    check_environment(&settings.root).into_result()?;

    let transport = settings.transport()?;
    let options = InstallerOptions {
        root: settings.root.clone(),
        manifest_dir: settings.config.manifest_dir.clone(),
        modes: settings.config.permission_modes(),
    };
    let mut installer = PackageInstaller::new(transport, settings.registry(), options);

    ctx.output.step("📡", "Selecting release servers");
    let summary = installer.probe().await;
    for name in &summary.connected {
        if let Some(server) = installer.registry().connected(name) {
            ctx.output
                .success(&format!("{}: {} ({})", name, server.server.name, server.base_url()));
        }
    }
    for name in &summary.unconnected {
        ctx.output.warn(&format!("{}: no server answered", name));
    }

    ctx.output
        .step("📦", &format!("Installing {} package(s)", packages.len()));
    let report = installer.install_all(&packages).await;

    for (reference, outcome) in &report.outcomes {
        let line = format!("{} {}", reference.label(), outcome);
        match outcome {
            InstallOutcome::Installed => ctx.output.success(&line),
            InstallOutcome::AlreadyInstalled => ctx.output.info(&line),
            InstallOutcome::NotConnected => ctx.output.warn(&line),
            _ => ctx.output.error(&line),
        }
    }

    let ending = Finalization::from_report(&report, &settings.config.post_install);
    match &ending {
        Finalization::HandOff { location, installed } => {
            ctx.output.success(&format!(
                "{} package(s) installed in {:.2}s",
                installed,
                start_time.elapsed().as_secs_f64()
            ));
            ctx.output
                .step("➡", &format!("Continue at {}", settings.root.join(location).display()));
        },
        Finalization::Failed { .. } => {
            if let Some(lines) = ending.failure_lines() {
                ctx.output.failure_block(&lines);
            }
        },
    }

    Ok(ending.exit_code())
}

/// Packages named on the command line, else the configured install set
fn requested_packages(specs: &[String], settings: &Settings) -> SproutResult<Vec<PackageReference>> {
    if specs.is_empty() {
        return Ok(settings.config.install.clone());
    }

    let default_list = settings.config.default_server_list();
    specs
        .iter()
        .map(|spec| {
            let reference = parse_package_spec(spec, default_list)?;
            validate_reference(&settings.config, &reference).map_err(|reason| SproutError::ConfigValidation {
                field: "packages".to_string(),
                reason,
            })?;
            Ok(reference)
        })
        .collect()
}

/// Parse `PKG@RELEASE[@LIST]`, falling back to `default_list`
pub fn parse_package_spec(spec: &str, default_list: Option<&str>) -> SproutResult<PackageReference> {
    let invalid = |reason: &str| SproutError::ConfigValidation {
        field: "packages".to_string(),
        reason: format!("'{}': {}", spec, reason),
    };

    let parts: Vec<&str> = spec.split('@').collect();
    if parts.iter().any(|part| part.trim().is_empty()) {
        return Err(invalid("expected PKG@RELEASE or PKG@RELEASE@LIST"));
    }

    match parts.as_slice() {
        [package, release] => {
            let list = default_list.ok_or_else(|| invalid("no server list is configured"))?;
            Ok(PackageReference::new(*package, *release, list))
        },
        [package, release, list] => Ok(PackageReference::new(*package, *release, *list)),
        _ => Err(invalid("expected PKG@RELEASE or PKG@RELEASE@LIST")),
    }
}
