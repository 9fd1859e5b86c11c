use anyhow::Context;
use biblioteca_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load biblioteca settings")?;
    biblioteca_telemetry::init(&settings.telemetry)?;

    biblioteca_app::run(settings).await
}
