use clap::Parser;
use pact_mock::{BrokerConfiguration, Publisher};
use std::{path::PathBuf, process::ExitCode};

/// Publishes contract documents to a pact broker.
#[derive(Parser, Debug)]
#[command(name = "publish-pacts", version)]
struct Args {
    /// Contract files, or directories containing them.
    #[arg(required = true, value_name = "PATH")]
    paths: Vec<PathBuf>,

    #[arg(long, value_name = "VERSION")]
    consumer_app_version: String,

    #[arg(long, env = "PACT_BROKER_URL", value_name = "URL")]
    broker_base_url: String,

    #[arg(long, env = "PACT_BROKER_USERNAME")]
    broker_username: Option<String>,

    #[arg(long, env = "PACT_BROKER_PASSWORD", hide_env_values = true)]
    broker_password: Option<String>,

    /// Tags the published consumer version. Can be repeated.
    #[arg(long = "tag", value_name = "TAG")]
    tags: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    pact_mock::logging::init("info", None);

    let mut broker = BrokerConfiguration::new(args.broker_base_url);
    if let Some(username) = args.broker_username {
        broker = broker.with_basic_auth(username, args.broker_password.unwrap_or_default());
    }

    match Publisher::new(broker)
        .publish(&args.paths, &args.consumer_app_version, &args.tags)
        .await
    {
        Ok(receipts) => {
            for receipt in receipts {
                println!(
                    "Published {} ({} -> {}) as version {} to {}",
                    receipt.path.display(),
                    receipt.consumer,
                    receipt.provider,
                    receipt.version,
                    receipt.url
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to publish pacts: {}", e);
            ExitCode::FAILURE
        }
    }
}
