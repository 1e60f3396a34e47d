pub mod key;
pub mod transfer;

use fncache::RemoteConfig;
use std::path::PathBuf;
use tracing::instrument;

#[derive(Debug, Clone)]
pub enum Command {
    Get {
        config: RemoteConfig,
        key: String,
        output: PathBuf,
    },
    Put {
        config: RemoteConfig,
        key: String,
        input: PathBuf,
        content_type: String,
    },
    Key {
        args: Vec<String>,
    },
}

/// Run a command, returning the line to print on success
#[instrument(skip_all)]
pub async fn execute(command: Command) -> miette::Result<String> {
    match command {
        Command::Get {
            config,
            key,
            output,
        } => transfer::get(&config, &key, &output).await,
        Command::Put {
            config,
            key,
            input,
            content_type,
        } => transfer::put(&config, &key, &input, &content_type).await,
        Command::Key { args } => Ok(key::derive(&args)),
    }
}
