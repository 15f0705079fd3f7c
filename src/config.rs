use crate::client_id::{Alphabet, ServerIdentity};
use crate::dhcp::DhcpConfig;
use crate::error::Error;
use crate::lease_store::{DynLeaseStore, FileLeaseStore, InMemoryLeaseStore};
use ipnetwork::IpNetwork;
use lazy_static::lazy_static;
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_with::{serde_as, DurationSeconds};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::BufReader;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use trust_dns_server::client::rr::{LowerName, Name};

pub type SharedConfig = Arc<Config>;

#[serde_as]
#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub api_bind_addr: SocketAddr,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub api_timeout: Duration,
    pub dns_udp_bind_addr: SocketAddr,
    pub dns_tcp_bind_addr: SocketAddr,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub dns_tcp_timeout: Duration,
    /// Domain DHCP lease hostnames are served under.
    #[serde(default = "default_local_domain")]
    pub local_domain: String,
    /// Static `A`/`AAAA` answers, keyed by [`LowerName`][`trust_dns_client::rr::LowerName`].
    /// Names are made fully qualified on load; spellings of the same name share one address list.
    #[serde(default, deserialize_with = "deserialize_hosts")]
    pub hosts: HashMap<LowerName, Vec<IpAddr>>,
    #[serde(default)]
    pub tls: TlsConfig,
    #[serde(default)]
    pub dhcp: DhcpConfig,
    pub dhcp_db_path: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct TlsConfig {
    /// The name clients connect to over DNS-over-TLS: a DNS name, or a wildcard `*.<suffix>` to
    /// let clients send their [client id][crate::client_id] as the leading label.
    pub server_name: Option<String>,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
    pub dot_bind_addr: Option<SocketAddr>,
    pub doh_bind_addr: Option<SocketAddr>,
    /// Serve DNS-over-HTTPS without TLS, e.g. behind a TLS-terminating reverse proxy.
    #[serde(default)]
    pub allow_unencrypted_doh: bool,
    #[serde(default)]
    pub client_id_alphabet: Alphabet,
}

fn default_local_domain() -> String {
    "lan".to_string()
}

lazy_static! {
    // NOTE(XXX): Once the "ip" feature has stabilized we can use Ipv6Addr.is_unique_local[0].
    //            Presently this feature is unstable so we home-roll. See also RFC 4193[1].
    // [0]: https://doc.rust-lang.org/std/net/struct.Ipv6Addr.html#method.is_unique_local
    // [1]: https://www.rfc-editor.org/rfc/rfc4193.html
    static ref IPV6_UNIQUE_LOCAL_NETWORK: IpNetwork = IpNetwork::from_str("fc00::/7").unwrap();
}

impl FromStr for Config {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let conf: Config = serde_json::from_str(s)?;
        conf.normalized()
    }
}

impl Config {
    pub fn try_from_file(p: impl AsRef<Path>) -> Result<Self, Error> {
        let f = File::open(p)?;
        let reader = BufReader::new(f);
        let conf: Config = serde_json::from_reader(reader)?;
        conf.normalized()
    }

    fn normalized(mut self) -> Result<Self, Error> {
        self.bind_addr_is_secure()?;
        self.tls_is_complete()?;
        if let Some(server_name) = &mut self.tls.server_name {
            validate_server_name(server_name)?;
            // TLS stacks hand SNI over lowercased.
            server_name.make_ascii_lowercase();
        }
        self.dhcp.validate()?;

        self.local_domain = self
            .local_domain
            .trim_end_matches('.')
            .to_ascii_lowercase();
        Ok(self)
    }

    #[must_use]
    pub fn server_identity(&self) -> ServerIdentity {
        ServerIdentity::new(self.tls.server_name.clone(), self.tls.client_id_alphabet)
    }

    /// The lease store backing the DHCP server: file-backed when
    /// [`Config::dhcp_db_path`] is set, in memory otherwise.
    pub async fn lease_store(&self) -> Result<DynLeaseStore, Error> {
        Ok(match &self.dhcp_db_path {
            Some(path) => Box::new(FileLeaseStore::try_from_file(path).await?),
            None => Box::<InMemoryLeaseStore>::default(),
        })
    }

    fn bind_addr_is_secure(&self) -> Result<(), Error> {
        match self.api_bind_addr {
            SocketAddr::V4(v4_addr) => {
                let ip = v4_addr.ip();
                if !ip.is_loopback() && !ip.is_private() {
                    return Err(Error::InsecureAPIBind(IpAddr::V4(*ip)));
                }
                Ok(())
            }
            SocketAddr::V6(v6_addr) => {
                let ip = v6_addr.ip();
                if !ip.is_loopback() && !IPV6_UNIQUE_LOCAL_NETWORK.contains(IpAddr::V6(*ip)) {
                    return Err(Error::InsecureAPIBind(IpAddr::V6(*ip)));
                }
                Ok(())
            }
        }
    }

    fn tls_is_complete(&self) -> Result<(), Error> {
        let has_cert = self.tls.cert_path.is_some() && self.tls.key_path.is_some();
        if self.tls.dot_bind_addr.is_some() && !has_cert {
            return Err(Error::MissingCertificate("tls.dot_bind_addr"));
        }
        if self.tls.doh_bind_addr.is_some() && !has_cert && !self.tls.allow_unencrypted_doh {
            return Err(Error::MissingCertificate("tls.doh_bind_addr"));
        }
        Ok(())
    }
}

// Queries always arrive fully qualified, so `router.lan` and `Router.LAN.` are one host.
fn deserialize_hosts<'de, D>(deserializer: D) -> Result<HashMap<LowerName, Vec<IpAddr>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Vec<IpAddr>>::deserialize(deserializer)?;
    let mut hosts: HashMap<LowerName, Vec<IpAddr>> = HashMap::new();
    for (name, addrs) in raw {
        let mut name = Name::from_ascii(&name).map_err(de::Error::custom)?;
        name.set_fqdn(true);
        let known = hosts.entry(LowerName::from(name)).or_default();
        for addr in addrs {
            if !known.contains(&addr) {
                known.push(addr);
            }
        }
    }
    Ok(hosts)
}

fn validate_server_name(server_name: &str) -> Result<(), Error> {
    let host = server_name.strip_prefix("*.").unwrap_or(server_name);
    let valid = !host.is_empty()
        && host.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        });
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidServerName(server_name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client_id::{resolve, ClientId, Transport};
    use serde_json::json;

    fn base() -> serde_json::Value {
        json!({
            "api_bind_addr": "127.0.0.1:3000",
            "api_timeout": 10,
            "dns_udp_bind_addr": "127.0.0.1:5353",
            "dns_tcp_bind_addr": "127.0.0.1:5353",
            "dns_tcp_timeout": 5,
        })
    }

    fn parse(value: &serde_json::Value) -> Result<Config, Error> {
        value.to_string().parse()
    }

    #[test]
    fn minimal_config() {
        let config = parse(&base()).unwrap();
        assert_eq!(config.local_domain, "lan");
        assert_eq!(config.api_timeout, Duration::from_secs(10));
        assert!(config.hosts.is_empty());
        assert!(!config.dhcp.enabled);
        assert_eq!(config.server_identity(), ServerIdentity::default());
    }

    #[test]
    fn hosts_are_fully_qualified() {
        let mut value = base();
        value["hosts"] = json!({ "Router.LAN": ["192.168.1.1"] });
        value["local_domain"] = json!("Home.Arpa.");
        let config = parse(&value).unwrap();

        let name = LowerName::from(Name::from_str("router.lan.").unwrap());
        assert_eq!(config.hosts[&name], vec!["192.168.1.1".parse::<IpAddr>().unwrap()]);
        assert_eq!(config.local_domain, "home.arpa");
    }

    #[test]
    fn host_spellings_are_merged() {
        let mut value = base();
        value["hosts"] = json!({
            "router.lan": ["192.168.1.1"],
            "Router.LAN.": ["192.168.1.1", "fd00::1"],
        });
        let config = parse(&value).unwrap();

        assert_eq!(config.hosts.len(), 1);
        let name = LowerName::from(Name::from_str("router.lan.").unwrap());
        let mut addrs = config.hosts[&name].clone();
        addrs.sort();
        assert_eq!(
            addrs,
            vec![
                "192.168.1.1".parse::<IpAddr>().unwrap(),
                "fd00::1".parse::<IpAddr>().unwrap()
            ]
        );
    }

    #[test]
    fn rejects_invalid_host_names() {
        let mut value = base();
        let name = format!("{}.lan", "a".repeat(64));
        value["hosts"][name.as_str()] = json!(["192.168.1.1"]);
        assert!(matches!(parse(&value), Err(Error::InvalidJSON(_))));
    }

    #[test]
    fn server_name_is_lowercased() {
        let mut value = base();
        value["tls"] = json!({ "server_name": "*.DNS.Example.com" });
        let config = parse(&value).unwrap();
        assert_eq!(config.tls.server_name.as_deref(), Some("*.dns.example.com"));
        let transport = Transport::Tls {
            server_name: "laptop.dns.example.com".to_string(),
        };
        let client_id = resolve(&transport, &config.server_identity()).unwrap();
        assert_eq!(client_id.as_ref().map(ClientId::as_str), Some("laptop"));
    }

    #[test]
    fn server_identity_from_tls_config() {
        let mut value = base();
        value["tls"] = json!({
            "server_name": "*.dns.example.com",
            "client_id_alphabet": "lowercase",
        });
        let config = parse(&value).unwrap();
        assert_eq!(
            config.server_identity(),
            ServerIdentity::new(Some("*.dns.example.com".to_string()), Alphabet::Lowercase)
        );
    }

    #[test]
    fn rejects_malformed_server_names() {
        for name in ["*.", "*", "a.*.example.com", "**.example.com", "example..com", ""] {
            let mut value = base();
            value["tls"] = json!({ "server_name": name });
            assert!(
                matches!(parse(&value), Err(Error::InvalidServerName(_))),
                "{name:?}"
            );
        }
    }

    #[test]
    fn rejects_public_api_bind() {
        let mut value = base();
        value["api_bind_addr"] = json!("8.8.8.8:3000");
        assert!(matches!(parse(&value), Err(Error::InsecureAPIBind(_))));

        value["api_bind_addr"] = json!("[fd00::1]:3000");
        assert!(parse(&value).is_ok());
    }

    #[test]
    fn encrypted_listeners_need_certificates() {
        let mut value = base();
        value["tls"] = json!({ "dot_bind_addr": "0.0.0.0:853" });
        assert!(matches!(
            parse(&value),
            Err(Error::MissingCertificate("tls.dot_bind_addr"))
        ));

        value["tls"] = json!({ "doh_bind_addr": "0.0.0.0:8443", "allow_unencrypted_doh": true });
        assert!(parse(&value).is_ok());
    }

    #[test]
    fn rejects_invalid_dhcp() {
        let mut value = base();
        value["dhcp"] = json!({ "enabled": true, "interface_name": "eth0" });
        assert!(matches!(parse(&value), Err(Error::Dhcp(_))));
    }
}
