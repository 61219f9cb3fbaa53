
// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use error::ConfigError;
pub use logging::init_tracing;
pub use settings::{
    ClampRange, Config, DiscordConfig, ExchangeConfig, LoggingConfig, OutcomeConfig, StreakReset,
    ThresholdParams, TradingConfig,
};

/// Environment variables with this prefix override file values,
/// e.g. `TRENDBOT__EXCHANGE__API_SECRET`.
pub const ENV_PREFIX: &str = "TRENDBOT";

/// Loads the application configuration from a TOML file, layered with environment overrides.
///
/// Every section has defaults, so a file only needs to name what it changes. The
/// resulting configuration is validated before it is returned.
pub fn load_config(path: &str) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name(path))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    Ok(config)
}
