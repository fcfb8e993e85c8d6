/*!
Subcommands of the `lesion` binary.
*/

use anyhow::Result;
use clap::{Args, Parser};
use lesion_core::{CachePolicy, ModelStore, Pipeline, Registry};
use std::{path::PathBuf, sync::Arc};

mod api;
mod classify;
#[cfg(feature = "serve")]
mod serve;

/// The command to run.
#[derive(Parser, Debug)]
pub(crate) enum Command {
    Api(api::ApiArgs),
    Classify(classify::Args),
    #[cfg(feature = "serve")]
    Serve(serve::Args),
}

pub(crate) fn run(command: Command) -> Result<()> {
    match command {
        Command::Api(config) => api::describe_api(config),
        Command::Classify(config) => classify::classify(config),
        #[cfg(feature = "serve")]
        Command::Serve(config) => serve::serve(config),
    }
}

/// Where models are found and how they're kept once loaded.
#[derive(Args, Debug, Clone)]
pub(crate) struct ModelArgs {
    /// Directory holding one sub-directory per model kind.
    #[clap(long, default_value = "models")]
    models_dir: PathBuf,

    /// Either `cold` to load the model for every image, or `cached` to load each model once.
    #[clap(long, default_value = "cached")]
    cache_policy: CachePolicy,
}

impl ModelArgs {
    pub(crate) fn registry(&self) -> Registry {
        Registry::new(&self.models_dir)
    }

    pub(crate) fn pipeline(&self) -> Pipeline {
        Pipeline::new(
            Arc::new(self.registry()),
            ModelStore::new(self.cache_policy),
        )
    }
}
