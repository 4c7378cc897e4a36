use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use color_eyre::eyre::{eyre, ContextCompat, WrapErr};
use trust_dns_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use trust_dns_resolver::Resolver;

/// Somewhere that can tell us which address we appear from.
pub trait PublicIpSource {
    fn describe(&self) -> String;

    /// The observed address, whitespace-trimmed but otherwise unvalidated.
    fn fetch(&self) -> color_eyre::Result<String>;
}

/// Plain-text "what is my IP" endpoint.
pub struct HttpEcho {
    pub url: String,
}

impl PublicIpSource for HttpEcho {
    fn describe(&self) -> String {
        format!("HttpEcho[url={}]", self.url)
    }

    fn fetch(&self) -> color_eyre::Result<String> {
        let response = attohttpc::get(&self.url)
            .send()
            .wrap_err_with(|| format!("Failed to reach {}", self.url))?;
        if !response.is_success() {
            let status = response.status();
            return Err(eyre!(
                "{status} from {url}: {body}",
                status = status,
                url = self.url,
                body = response.text().unwrap_or_default(),
            ));
        }

        let body = response.bytes().wrap_err("Failed to read response")?;
        Ok(String::from_utf8_lossy(&body).trim().to_string())
    }
}

/// Asks a resolver that answers `hostname` with the querying address.
///
/// The default is OpenDNS and `myip.opendns.com`.
pub struct OpenDns {
    pub nameserver: SocketAddr,
    pub hostname: String,
    pub timeout: Duration,
}

impl Default for OpenDns {
    fn default() -> Self {
        OpenDns {
            nameserver: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(208, 67, 222, 222)), 53),
            hostname: "myip.opendns.com.".to_string(),
            timeout: ResolverOpts::default().timeout,
        }
    }
}

impl PublicIpSource for OpenDns {
    fn describe(&self) -> String {
        format!(
            "OpenDns[server={}, name={}]",
            self.nameserver, self.hostname
        )
    }

    fn fetch(&self) -> color_eyre::Result<String> {
        let mut opts = ResolverOpts::default();
        opts.timeout = self.timeout;
        opts.attempts = 1;
        let resolver = Resolver::new(
            ResolverConfig::from_parts(
                None,
                vec![],
                NameServerConfigGroup::from_ips_clear(
                    &[self.nameserver.ip()],
                    self.nameserver.port(),
                    true,
                ),
            ),
            opts,
        )
        .wrap_err("Failed to initialize resolver")?;
        let response = resolver
            .lookup_ip(self.hostname.as_str())
            .wrap_err_with(|| format!("Failed to resolve {}", self.hostname))?;

        Ok(first_ipv4(response.iter())?.to_string())
    }
}

fn first_ipv4(addresses: impl IntoIterator<Item = IpAddr>) -> color_eyre::Result<Ipv4Addr> {
    addresses
        .into_iter()
        .filter_map(|x| match x {
            IpAddr::V4(v4) => Some(v4),
            _ => None,
        })
        .next()
        .wrap_err("No IPv4 addresses returned")
}
