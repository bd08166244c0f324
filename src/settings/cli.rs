use super::Parser;

#[derive(Parser, Debug)]
#[command(name = "hubgate", about = "Session gate for the home web applications")]
pub struct Cli {
    /// Path to the settings file, without or with the `.toml` extension.
    #[arg(long)]
    pub settings: Option<String>,
}
