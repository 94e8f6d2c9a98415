//! `sprout probe`: show which mirror every server list selects

use sprout_core::error::SproutResult;

use super::{CommandContext, ConfigArgs, Settings};

pub async fn execute(args: ConfigArgs, ctx: &CommandContext) -> SproutResult<u8> {
    let settings = Settings::load(&args, ctx).await?;
    let transport = settings.transport()?;
    let mut registry = settings.registry();

    ctx.output.step("📡", "Selecting release servers");
    let summary = registry.probe_all(&transport).await;

    for name in &summary.connected {
        if let Some(server) = registry.connected(name) {
            ctx.output
                .success(&format!("{}: {} ({})", name, server.server.name, server.base_url()));
            ctx.output.info(&format!("  {}", server.identity.trim()));
        }
    }
    for name in &summary.unconnected {
        ctx.output.warn(&format!("{}: no server answered", name));
    }

    Ok(if summary.all_connected() { 0 } else { 1 })
}
