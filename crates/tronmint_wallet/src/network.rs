use serde::Serialize;

/// Block-explorer URL templates for a network. Identifiers are appended
/// after a `/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExplorerTemplates {
    pub transaction_url: &'static str,
    pub address_url: &'static str,
}

/// Display name and explorer links for a known RPC endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NetworkDescriptor {
    pub name: &'static str,
    pub explorer: ExplorerTemplates,
}

impl NetworkDescriptor {
    /// Explorer page for a transaction id.
    pub fn transaction_link(&self, txid: &str) -> String {
        format!("{}/{txid}", self.explorer.transaction_url)
    }

    /// Explorer page for an account or contract address.
    pub fn address_link(&self, address: &str) -> String {
        format!("{}/{address}", self.explorer.address_url)
    }
}

pub const MAINNET_RPC: &str = "https://api.trongrid.io";
pub const SHASTA_RPC: &str = "https://api.shasta.trongrid.io";
pub const NILE_RPC: &str = "https://api.nileex.io";

static KNOWN_NETWORKS: [(&str, NetworkDescriptor); 3] = [
    (
        MAINNET_RPC,
        NetworkDescriptor {
            name: "Mainnet",
            explorer: ExplorerTemplates {
                transaction_url: "https://tronscan.org/#/transaction",
                address_url: "https://tronscan.org/#/address",
            },
        },
    ),
    (
        SHASTA_RPC,
        NetworkDescriptor {
            name: "Shasta",
            explorer: ExplorerTemplates {
                transaction_url: "https://shasta.tronscan.org/#/transaction",
                address_url: "https://shasta.tronscan.org/#/address",
            },
        },
    ),
    (
        NILE_RPC,
        NetworkDescriptor {
            name: "Nile",
            explorer: ExplorerTemplates {
                transaction_url: "https://nile.tronscan.org/#/transaction",
                address_url: "https://nile.tronscan.org/#/address",
            },
        },
    ),
];

/// Look up a network by its exact RPC endpoint string.
pub fn describe_network(rpc_url: &str) -> Option<&'static NetworkDescriptor> {
    KNOWN_NETWORKS
        .iter()
        .find(|(url, _)| *url == rpc_url)
        .map(|(_, descriptor)| descriptor)
}

/// All known `(rpc_url, descriptor)` pairs.
pub fn known_networks() -> impl Iterator<Item = (&'static str, &'static NetworkDescriptor)> {
    KNOWN_NETWORKS.iter().map(|(url, descriptor)| (*url, descriptor))
}

/// Validate that a URL is well-formed and uses HTTP or HTTPS.
pub fn validate_url(url: &str) -> bool {
    match url::Url::parse(url) {
        Ok(parsed) => {
            let scheme = parsed.scheme();
            (scheme == "http" || scheme == "https") && parsed.host().is_some()
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shasta_transaction_template_is_exact() {
        let shasta = describe_network("https://api.shasta.trongrid.io").unwrap();
        assert_eq!(shasta.name, "Shasta");
        assert_eq!(
            shasta.explorer.transaction_url,
            "https://shasta.tronscan.org/#/transaction"
        );
    }

    #[test]
    fn all_three_networks_are_known() {
        assert_eq!(describe_network(MAINNET_RPC).unwrap().name, "Mainnet");
        assert_eq!(describe_network(SHASTA_RPC).unwrap().name, "Shasta");
        assert_eq!(describe_network(NILE_RPC).unwrap().name, "Nile");
        assert_eq!(known_networks().count(), 3);
    }

    #[test]
    fn unknown_endpoints_are_not_found() {
        for url in [
            "",
            "https://api.trongrid.io/",
            "http://api.trongrid.io",
            "https://API.TRONGRID.IO",
            "http://localhost:9090",
            "not a url at all",
            "https://api.shasta.trongrid.io?x=1",
        ] {
            assert!(describe_network(url).is_none(), "{url} should be unknown");
        }
    }

    #[test]
    fn links_join_template_and_identifier() {
        let nile = describe_network(NILE_RPC).unwrap();
        assert_eq!(
            nile.transaction_link("abc123"),
            "https://nile.tronscan.org/#/transaction/abc123"
        );
        assert_eq!(
            nile.address_link("TXYZ"),
            "https://nile.tronscan.org/#/address/TXYZ"
        );
    }

    #[test]
    fn registry_rpc_urls_are_https() {
        for (url, _) in known_networks() {
            assert!(url.starts_with("https://"), "RPC URL must be HTTPS: {url}");
            assert!(validate_url(url));
        }
    }

    #[test]
    fn validate_url_accepts_http() {
        assert!(validate_url("http://localhost:8090"));
    }

    #[test]
    fn validate_url_rejects_garbage() {
        assert!(!validate_url(""));
        assert!(!validate_url("not a url"));
        assert!(!validate_url("ftp://server.com"));
        assert!(!validate_url("file:///etc/passwd"));
    }
}
