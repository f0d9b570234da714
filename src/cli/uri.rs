//! Reachable panel URL discovery for the `uri` command.

use std::io::{self, Write};
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use nix::ifaddrs::getifaddrs;
use nix::net::if_::InterfaceFlags;

use crate::database::Database;
use crate::service::SettingService;

/// Service used to discover the public address.
const PUBLIC_IP_URL: &str = "https://api.ipify.org?format=text";
const PUBLIC_IP_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings that shape the panel's URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelEndpoint {
    pub port: u16,
    pub base_path: String,
    pub listen: String,
    pub domain: String,
    pub tls: bool,
}

impl PanelEndpoint {
    /// Read the endpoint from settings. Unreadable fields fall back to defaults.
    pub fn from_settings(settings: &SettingService) -> Self {
        let cert = settings.get_cert_file().unwrap_or_default();
        let key = settings.get_key_file().unwrap_or_default();
        Self {
            port: settings.get_port().unwrap_or_default(),
            base_path: settings.get_base_path().unwrap_or_default(),
            listen: settings.get_listen().unwrap_or_default(),
            domain: settings.get_web_domain().unwrap_or_default(),
            tls: !cert.is_empty() && !key.is_empty(),
        }
    }

    pub fn proto(&self) -> &'static str {
        if self.tls {
            "https://"
        } else {
            "http://"
        }
    }

    /// `:port`, omitted for the scheme's default port.
    pub fn port_text(&self) -> String {
        if (self.port == 443 && self.tls) || (self.port == 80 && !self.tls) {
            String::new()
        } else {
            format!(":{}", self.port)
        }
    }

    pub fn url(&self, host: &str) -> String {
        format!("{}{}{}{}", self.proto(), host, self.port_text(), self.base_path)
    }

    /// The single URL implied by a configured domain or listen address.
    pub fn configured_url(&self) -> Option<String> {
        if !self.domain.is_empty() {
            return Some(self.url(&self.domain));
        }
        if !self.listen.is_empty() {
            return Some(self.url(&self.listen));
        }
        None
    }
}

/// Host text for an address: IPv6 in brackets, link-local IPv6 skipped.
pub fn host_for(ip: IpAddr) -> Option<String> {
    match ip {
        IpAddr::V4(v4) => Some(v4.to_string()),
        IpAddr::V6(v6) if (v6.segments()[0] & 0xffc0) == 0xfe80 => None,
        IpAddr::V6(v6) => Some(format!("[{v6}]")),
    }
}

/// Addresses of every interface that is up and not loopback.
pub fn local_addresses() -> Vec<IpAddr> {
    let interfaces = match getifaddrs() {
        Ok(interfaces) => interfaces,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to list network interfaces");
            return Vec::new();
        }
    };

    interfaces
        .filter(|ifa| {
            ifa.flags.contains(InterfaceFlags::IFF_UP)
                && !ifa.flags.contains(InterfaceFlags::IFF_LOOPBACK)
        })
        .filter_map(|ifa| {
            let addr = ifa.address?;
            if let Some(v4) = addr.as_sockaddr_in() {
                return Some(IpAddr::V4(std::net::SocketAddrV4::from(*v4).ip().to_owned()));
            }
            addr.as_sockaddr_in6()
                .map(|v6| IpAddr::V6(std::net::SocketAddrV6::from(*v6).ip().to_owned()))
        })
        .collect()
}

/// Ask the public-IP service for this host's address.
pub async fn public_ip() -> Option<String> {
    let client = reqwest::Client::builder()
        .timeout(PUBLIC_IP_TIMEOUT)
        .build()
        .ok()?;
    let response = client.get(PUBLIC_IP_URL).send().await.ok()?;
    if !response.status().is_success() {
        return None;
    }
    let text = response.text().await.ok()?;
    let ip = text.trim();
    (!ip.is_empty()).then(|| ip.to_string())
}

/// Print the panel's reachable URLs.
pub async fn print_panel_uri<W: Write>(db_path: &Path, out: &mut W) -> io::Result<()> {
    let db = match Database::open(db_path) {
        Ok(db) => db,
        Err(e) => return writeln!(out, "{e}"),
    };
    let endpoint = PanelEndpoint::from_settings(&SettingService::new(db));

    if let Some(url) = endpoint.configured_url() {
        return writeln!(out, "{url}");
    }

    writeln!(out, "Local address:")?;
    for host in local_addresses().into_iter().filter_map(host_for) {
        writeln!(out, "{}", endpoint.url(&host))?;
    }

    if let Some(ip) = public_ip().await {
        writeln!(out, "\nGlobal address:\n{}", endpoint.url(&ip))?;
    }
    Ok(())
}
