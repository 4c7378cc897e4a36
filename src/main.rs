use std::path::PathBuf;

use color_eyre::eyre::{eyre, WrapErr};
use log::{debug, info, warn};
use structopt::StructOpt;

use crate::cache::IpCache;
use crate::config::Config;
use crate::http::ApiClient;
use crate::public_ip::{HttpEcho, OpenDns, PublicIpSource};
use crate::update_dns::api::UpdateDns;
use crate::update_dns::cloudflare::Cloudflare;
use crate::updater::{RunOutcome, Updater};

mod cache;
mod config;
mod http;
mod public_ip;
mod update_dns;
mod updater;

#[cfg(test)]
mod test_support;

const RUST_BACKTRACE: &str = "RUST_BACKTRACE";

/// Dynamic DNS record updater for Cloudflare.
#[derive(StructOpt, Debug)]
#[structopt(name = "cf-dyn-dns")]
pub(crate) struct CfDynDns {
    /// Path to the YAML config file
    #[structopt(short, long, parse(from_os_str), default_value = "config.yml")]
    pub config: PathBuf,

    /// Only log the records that would be updated; never writes the IP cache
    #[structopt(long = "dryrun", alias = "check")]
    pub dry_run: bool,

    /// Where the last applied IP is kept between runs
    #[structopt(long, parse(from_os_str), default_value = "old_ip.txt")]
    pub cache_file: PathBuf,

    /// How to discover the public IP: `http` or `opendns`
    #[structopt(long, default_value = "http", possible_values = &["http", "opendns"])]
    pub ip_source: String,

    /// Plain-text endpoint used by the `http` IP source
    #[structopt(long, default_value = "https://checkip.amazonaws.com/")]
    pub ip_url: String,

    /// Verbosity of output, 1 occurrence for debug, 2 occurrences for trace
    #[structopt(short, long, parse(from_occurrences))]
    pub verbose: usize,

    /// Only log warnings and errors
    #[structopt(short, long)]
    pub quiet: bool,
}

fn main() -> color_eyre::Result<()> {
    if std::env::var_os(RUST_BACKTRACE).is_none() {
        std::env::set_var(RUST_BACKTRACE, "1");
    }

    let args: CfDynDns = CfDynDns::from_args();

    color_eyre::install()?;
    stderrlog::new()
        .verbosity(if args.quiet { 1 } else { args.verbose + 2 })
        .init()
        .wrap_err("Failed to initialize logging")?;

    let config = Config::load(&args.config)?;
    info!(
        "Loaded {} site(s) from {}",
        config.sites.len(),
        args.config.display()
    );

    let provider = Cloudflare::new(ApiClient::new(
        config.common.api_token,
        config.common.base_url,
    ));
    let ip_source = pick_ip_source(&args)?;
    let cache = IpCache::new(&args.cache_file);
    debug!("Using IP cache at {}", cache.path().display());
    if args.dry_run {
        info!("[DRY RUN] No record or cache will be modified");
    }
    info!(
        "Checking {} against {}",
        ip_source.describe(),
        provider.describe()
    );

    let outcome = Updater::new(&provider, &cache, args.dry_run).run(&config.sites, &*ip_source)?;
    match &outcome {
        RunOutcome::Skipped { ip } => debug!("Cached IP {} is still current", ip),
        RunOutcome::DryRun { ip, report } => info!(
            "[DRY RUN] {} record(s) would point at {}, {} site(s) skipped",
            report.planned, ip, report.skipped_sites
        ),
        RunOutcome::Updated { ip, report } if report.failed > 0 || report.skipped_sites > 0 => {
            warn!(
                "{} record(s) now point at {}, {} failed, {} site(s) skipped",
                report.updated, ip, report.failed, report.skipped_sites
            )
        }
        RunOutcome::Updated { ip, report } => {
            info!("{} record(s) now point at {}", report.updated, ip)
        }
    }

    Ok(())
}

fn pick_ip_source(args: &CfDynDns) -> color_eyre::Result<Box<dyn PublicIpSource>> {
    match args.ip_source.as_str() {
        "http" => Ok(Box::new(HttpEcho {
            url: args.ip_url.clone(),
        })),
        "opendns" => Ok(Box::new(OpenDns::default())),
        other => Err(eyre!("Unknown IP source `{}`", other)),
    }
}
