use mentor_config::{API_KEY_ENV, Config};

/// Strategy for initializing the configuration.
///
/// Writes the default `~/mentor/config.json`. An existing file is left alone
/// so a tuned persona or memory budget is never overwritten.
#[derive(Debug, Clone, Copy)]
pub struct InitStrategy;

impl super::CommandStrategy for InitStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let config_path = Config::config_path()?;
        if config_path.exists() {
            println!("Config already present at: {}", config_path.display());
            println!("Run 'mentor info' to see the active settings.");
            return Ok(());
        }

        Config::create_config()?;
        println!("{}", key_hint(std::env::var(API_KEY_ENV).ok().as_deref()));
        Ok(())
    }
}

/// Whether the fresh template can already reach the API through the
/// environment key.
fn key_hint(env_value: Option<&str>) -> String {
    match env_value {
        Some(key) if !key.trim().is_empty() => {
            format!("🔑 {API_KEY_ENV} is set; the blank api_key in the file will fall back to it.")
        }
        _ => format!("⚠️  {API_KEY_ENV} is not set; chat will fail until an API key is added."),
    }
}
