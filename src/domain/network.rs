use serde::{Deserialize, Serialize};

/// Physical or virtual link kind of an interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    Wired,
    Wireless,
    Loopback,
    Virtual,
    Unknown,
}

/// Network interface entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInterface {
    pub name: String,
    pub ipv4: Option<String>,
    pub mac: String,
    pub link_type: LinkType,
    /// Negotiated speed in Mbit/s
    pub speed_mbps: Option<u64>,
    pub dhcp: Option<bool>,
}

impl NetworkInterface {
    pub fn new(name: String, mac: String) -> Self {
        Self {
            name,
            ipv4: None,
            mac,
            link_type: LinkType::Unknown,
            speed_mbps: None,
            dhcp: None,
        }
    }

    pub fn with_ipv4(mut self, ipv4: Option<String>) -> Self {
        self.ipv4 = ipv4;
        self
    }

    pub fn with_link(mut self, link_type: LinkType, speed_mbps: Option<u64>) -> Self {
        self.link_type = link_type;
        self.speed_mbps = speed_mbps;
        self
    }

    pub fn with_dhcp(mut self, dhcp: Option<bool>) -> Self {
        self.dhcp = dhcp;
        self
    }
}
