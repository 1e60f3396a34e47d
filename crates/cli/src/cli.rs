use crate::commands::Command;
use crate::logging::LogLevel;
use clap::{Args, Parser, Subcommand};
use fncache::store::DEFAULT_CONTENT_TYPE;
use fncache::{RemoteConfig, RemoteCredentials};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fncache")]
#[command(about = "Move cache entries between the local disk and an S3 bucket")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        short = 'l',
        long,
        global = true,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: LogLevel,

    #[arg(long, global = true, help = "Output logs in JSON format")]
    pub json: bool,
}

/// Connection and object options shared by the transfer commands
#[derive(Args, Debug, Clone)]
pub struct RemoteArgs {
    #[arg(
        long,
        alias = "accessKeyId",
        env = "AWS_ACCESS_KEY_ID",
        help = "Access key id"
    )]
    pub access_key_id: String,

    #[arg(
        long,
        alias = "secretAccessKey",
        env = "AWS_SECRET_ACCESS_KEY",
        hide_env_values = true,
        help = "Secret access key"
    )]
    pub secret_access_key: String,

    #[arg(long, env = "AWS_REGION", help = "Region of the bucket")]
    pub region: String,

    #[arg(long, help = "Bucket name")]
    pub bucket: String,

    #[arg(long, help = "Object key in the bucket")]
    pub file: String,

    #[arg(
        long,
        env = "AWS_ENDPOINT_URL",
        help = "Endpoint override for S3-compatible stores"
    )]
    pub endpoint: Option<String>,
}

impl RemoteArgs {
    fn into_parts(self) -> (RemoteConfig, String) {
        let mut credentials =
            RemoteCredentials::new(self.access_key_id, self.secret_access_key, self.region);
        if let Some(endpoint) = self.endpoint {
            credentials = credentials.with_endpoint(endpoint);
        }
        (RemoteConfig::new(credentials, self.bucket), self.file)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Download an object from the bucket to a local file")]
    Get {
        #[command(flatten)]
        remote: RemoteArgs,
        #[arg(long, help = "Local path to write the object to")]
        output: PathBuf,
    },
    #[command(about = "Upload a local file to the bucket")]
    Put {
        #[command(flatten)]
        remote: RemoteArgs,
        #[arg(long, help = "Local file to upload")]
        input: PathBuf,
        #[arg(long, help = "Content type of the object", default_value = DEFAULT_CONTENT_TYPE)]
        content_type: String,
    },
    #[command(about = "Print the default cache key for JSON-encoded arguments")]
    Key {
        #[arg(
            value_name = "JSON",
            help = "Call arguments; values that are not JSON are taken as strings"
        )]
        args: Vec<String>,
    },
}

impl From<Commands> for Command {
    fn from(cmd: Commands) -> Self {
        match cmd {
            Commands::Get { remote, output } => {
                let (config, key) = remote.into_parts();
                Self::Get {
                    config,
                    key,
                    output,
                }
            }
            Commands::Put {
                remote,
                input,
                content_type,
            } => {
                let (config, key) = remote.into_parts();
                Self::Put {
                    config,
                    key,
                    input,
                    content_type,
                }
            }
            Commands::Key { args } => Self::Key { args },
        }
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}
