use crate::prelude::*;
use clap::Parser;

mod ai;
mod config;
mod edit;
mod error;
mod filemap;
mod generate;
mod prelude;
mod request;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Describe a change to your Kubernetes manifests in natural language and let a language model propose the new or edited files"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Explicit config file, replacing the default search path
    #[clap(long, env = "COPILOT_OPS_CONFIG", global = true)]
    config: Option<std::path::PathBuf>,

    /// Whether to display additional information.
    #[clap(long, env = "COPILOT_OPS_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Propose new files from a request and the related files of the repo
    Generate(crate::generate::GenerateOptions),

    /// Edit a single file according to a request
    Edit(crate::edit::EditOptions),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Generate(options) => crate::generate::run(options, app.global).await,
        SubCommands::Edit(options) => crate::edit::run(options, app.global).await,
    }
}
