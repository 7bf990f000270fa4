use mentor_core::ChatOptions;

/// Strategy for displaying version information.
///
/// Alongside the version, shows the model a fresh config starts with.
#[derive(Debug, Clone, Copy)]
pub struct VersionStrategy;

impl super::CommandStrategy for VersionStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        println!("{}", version_banner(&ChatOptions::default()));
        Ok(())
    }
}

fn version_banner(defaults: &ChatOptions) -> String {
    format!(
        "mentor {} (CBT/DBT practice mentor, default model {})",
        env!("CARGO_PKG_VERSION"),
        defaults.model
    )
}
