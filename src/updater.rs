use color_eyre::eyre::WrapErr;
use log::{info, warn};

use crate::cache::IpCache;
use crate::config::SiteConfig;
use crate::public_ip::PublicIpSource;
use crate::update_dns::api::{RecordError, UpdateDns};

/// `"@"` stands for the bare base domain.
pub fn record_name(label: &str, base_domain: &str) -> String {
    if label == "@" {
        base_domain.to_string()
    } else {
        format!("{}.{}", label, base_domain)
    }
}

/// Tally of a run that went past the cache check.
#[derive(Debug, Default, PartialEq)]
pub struct RunReport {
    pub updated: usize,
    pub failed: usize,
    pub planned: usize,
    pub skipped_sites: usize,
}

#[derive(Debug, PartialEq)]
pub enum RunOutcome {
    /// The public IP matches the cached one; nothing was sent to the provider.
    Skipped { ip: String },
    /// Intended updates were only logged.
    DryRun { ip: String, report: RunReport },
    Updated { ip: String, report: RunReport },
}

pub struct Updater<'a> {
    provider: &'a dyn UpdateDns,
    cache: &'a IpCache,
    dry_run: bool,
}

impl<'a> Updater<'a> {
    pub fn new(provider: &'a dyn UpdateDns, cache: &'a IpCache, dry_run: bool) -> Self {
        Updater {
            provider,
            cache,
            dry_run,
        }
    }

    /// Fetches the public IP and, unless it is unchanged, points every
    /// configured record at it.
    ///
    /// Only a failed IP lookup or cache I/O ends the run early. Record level
    /// failures are logged and counted in the returned report, and the cache
    /// is rewritten after any non-dry pass.
    pub fn run(
        &self,
        sites: &[SiteConfig],
        ip_source: &dyn PublicIpSource,
    ) -> color_eyre::Result<RunOutcome> {
        let public_ip = ip_source
            .fetch()
            .wrap_err_with(|| format!("Failed to fetch public IP from {}", ip_source.describe()))?;
        info!("--- Public IP: {}", public_ip);

        if !self.dry_run && self.cache.load()?.as_deref() == Some(public_ip.as_str()) {
            info!("Skip update");
            return Ok(RunOutcome::Skipped { ip: public_ip });
        }

        let mut report = RunReport::default();
        for site in sites {
            self.process_site(site, &public_ip, &mut report);
        }

        if self.dry_run {
            return Ok(RunOutcome::DryRun {
                ip: public_ip,
                report,
            });
        }

        info!("Save old IP");
        self.cache.store(&public_ip)?;
        Ok(RunOutcome::Updated {
            ip: public_ip,
            report,
        })
    }

    fn process_site(&self, site: &SiteConfig, public_ip: &str, report: &mut RunReport) {
        info!("--- Updating {} ---", site.name);
        let target = match site.target() {
            Ok(target) => target,
            Err(field) => {
                warn!("Not found `{}` config on section `{}`", field, site.name);
                report.skipped_sites += 1;
                return;
            }
        };

        for label in &target.labels {
            let name = record_name(label, target.base_domain);
            if self.dry_run {
                info!(
                    "[DRY RUN] Update record `{}` in zone id `{}`",
                    name, target.zone_id
                );
                report.planned += 1;
                continue;
            }

            match self.update_host(target.zone_id, &name, public_ip) {
                Ok(()) => {
                    info!("Success update {}:{}", name, public_ip);
                    report.updated += 1;
                }
                Err(e) => {
                    warn!("Failed to update {}:{}: {}", name, public_ip, e);
                    report.failed += 1;
                }
            }
        }
    }

    fn update_host(&self, zone_id: &str, name: &str, public_ip: &str) -> Result<(), RecordError> {
        let record_id = self.provider.resolve_record_id(zone_id, name)?;
        self.provider
            .update_record(zone_id, &record_id, name, public_ip)
    }
}
