use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the JSON log subscriber. `RUST_LOG` overrides the default `info`
/// filter. Calling this more than once is harmless.
pub fn init() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_target(false),
        )
        .try_init()
        .ok();

    Ok(())
}
