use crate::ai::ModelClient;
use crate::filemap::{dump, print_or_write_out};
use crate::prelude::*;
use crate::request::{decode_completions, prepare, RequestArgs};
use copilot_ops_core::ai::{Capability, DEFAULT_COMPLETIONS, DEFAULT_MAX_TOKENS};
use copilot_ops_core::prompt::build_generate_prompt;

#[derive(Debug, Clone, clap::Args)]
pub struct GenerateOptions {
    #[clap(flatten)]
    pub request: RequestArgs,

    /// Files (glob) to include as context; repeatable
    #[arg(short = 'f', long = "file")]
    pub files: Vec<String>,

    /// Filesets from .copilot-ops.yaml to include as context; repeatable
    #[arg(short = 's', long = "fileset")]
    pub filesets: Vec<String>,

    /// Max number of tokens to generate
    #[arg(short = 'n', long, default_value_t = DEFAULT_MAX_TOKENS)]
    pub ntokens: u32,

    /// Number of completions to generate
    #[arg(short = 'c', long, default_value_t = DEFAULT_COMPLETIONS)]
    pub ncompletions: u32,
}

pub async fn run(options: GenerateOptions, global: crate::Global) -> Result<()> {
    let args = &options.request;
    let request = prepare(args, &options.files, &options.filesets, &global)?;
    request.client.require(Capability::Generate)?;

    let prompt = build_generate_prompt(&args.request, &request.filemap_text);
    log::debug!("generate prompt:\n{}", prompt);

    let completions = request
        .client
        .generate(&prompt, options.ntokens, options.ncompletions)
        .await?;
    log::info!("received {} completion(s)", completions.len());

    let mut filemap = decode_completions(&completions)?;
    if global.verbose {
        dump("Generated files", &filemap);
    }

    print_or_write_out(&mut filemap, args.write, args.output, &args.output_dir)
}
