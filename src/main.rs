use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::{Parser, Subcommand};
use rocket::routes;
use tokio::sync::mpsc::unbounded_channel;

use prololab::{
    announcer::Announcer,
    config::ProlabConfig,
    webhooks::{gitlab_webhook, Delivery, Event, EventSender},
};

#[derive(Parser)]
#[clap(version)]
struct Opts {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Receive GitLab webhooks and announce them
    Serve {
        /// Configuration file for prololab
        #[clap(short, long)]
        config: PathBuf,
    },
    /// Decode a stored delivery and print what would be announced
    Decode {
        /// JSON body of the delivery
        payload: PathBuf,
        /// Configuration file for prololab
        #[clap(short, long)]
        config: Option<PathBuf>,
    },
}

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let opts = Opts::parse();
    match opts.command {
        Command::Serve { config } => serve(&config).await,
        Command::Decode { payload, config } => decode(&payload, config.as_deref()),
    }
}

async fn serve(config: &Path) -> anyhow::Result<()> {
    let config = ProlabConfig::load(config)?;

    let (sender, receiver) = unbounded_channel();
    let announcer = Announcer::new(config);
    tokio::spawn(async move { announcer.run(receiver).await });

    let rocket = rocket::build()
        .mount("/", routes![gitlab_webhook])
        .manage(EventSender(sender));
    rocket
        .launch()
        .await
        .map(|_| ())
        .map_err(|err| anyhow::anyhow!(err))
}

fn decode(payload: &Path, config: Option<&Path>) -> anyhow::Result<()> {
    let config = match config {
        Some(path) => ProlabConfig::load(path)?,
        None => ProlabConfig::default(),
    };

    let content =
        fs::read(payload).with_context(|| format!("couldn't read {}:", payload.display()))?;
    let delivery = Delivery::decode(&content).context("couldn't decode delivery")?;
    println!("{:#?}", delivery);

    match Announcer::new(config).handle_event(Event::GitLab(delivery))? {
        Some(message) => println!("{}", message),
        None => println!("(not announced)"),
    }

    Ok(())
}
