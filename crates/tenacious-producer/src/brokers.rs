//! Broker address lists.
//!
//! Broker lists usually arrive as a single comma-separated string from the
//! environment (`"kafka-1:9092,kafka-2:9092"`). They are validated when a
//! producer is constructed so that a typo fails loudly and synchronously
//! instead of turning into an endless stream of connect failures.

use std::fmt;
use std::str::FromStr;

use crate::error::BrokersError;

/// A single `host:port` broker address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BrokerAddress {
    host: String,
    port: u16,
}

impl BrokerAddress {
    /// Creates an address from its parts.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Returns the host name or IP literal, without IPv6 brackets.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for BrokerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for BrokerAddress {
    type Err = BrokersError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &'static str| BrokersError::InvalidAddress {
            address: s.to_string(),
            reason,
        };

        let (host, port) = s.rsplit_once(':').ok_or_else(|| invalid("missing port"))?;

        let host = match host.strip_prefix('[') {
            Some(inner) => inner
                .strip_suffix(']')
                .ok_or_else(|| invalid("unterminated IPv6 literal"))?,
            None if host.contains(':') => return Err(invalid("IPv6 hosts must be bracketed")),
            None => host,
        };

        if host.is_empty() {
            return Err(invalid("missing host"));
        }
        if host.chars().any(char::is_whitespace) {
            return Err(invalid("host contains whitespace"));
        }

        let port = port.parse::<u16>().map_err(|_| invalid("invalid port"))?;
        if port == 0 {
            return Err(invalid("port must be non-zero"));
        }

        Ok(Self::new(host, port))
    }
}

/// An ordered, non-empty list of broker addresses.
///
/// # Examples
///
/// ```
/// use tenacious_producer::Brokers;
///
/// let brokers = Brokers::parse("kafka-1:9092, kafka-2:9093").unwrap();
/// assert_eq!(brokers.len(), 2);
/// assert_eq!(brokers.to_string(), "kafka-1:9092,kafka-2:9093");
///
/// assert!(Brokers::parse("").is_err());
/// assert!(Brokers::parse("kafka-1").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Brokers(Vec<BrokerAddress>);

impl Brokers {
    /// Wraps an already-parsed address list, rejecting an empty one.
    pub fn new(addresses: Vec<BrokerAddress>) -> Result<Self, BrokersError> {
        if addresses.is_empty() {
            return Err(BrokersError::Empty);
        }
        Ok(Self(addresses))
    }

    /// Parses a comma-separated list. Blank entries are ignored.
    pub fn parse(list: &str) -> Result<Self, BrokersError> {
        let addresses = list
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::parse)
            .collect::<Result<Vec<BrokerAddress>, _>>()?;
        Self::new(addresses)
    }

    /// Returns the addresses in configuration order.
    pub fn addresses(&self) -> &[BrokerAddress] {
        &self.0
    }

    /// Returns the number of addresses.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no addresses. A constructed list never is.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the addresses.
    pub fn iter(&self) -> std::slice::Iter<'_, BrokerAddress> {
        self.0.iter()
    }
}

impl fmt::Display for Brokers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, address) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", address)?;
        }
        Ok(())
    }
}

impl FromStr for Brokers {
    type Err = BrokersError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for Brokers {
    type Error = BrokersError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl TryFrom<String> for Brokers {
    type Error = BrokersError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<Vec<String>> for Brokers {
    type Error = BrokersError;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        let addresses = value
            .iter()
            .map(|entry| entry.trim().parse())
            .collect::<Result<Vec<BrokerAddress>, _>>()?;
        Self::new(addresses)
    }
}

impl TryFrom<Vec<BrokerAddress>> for Brokers {
    type Error = BrokersError;

    fn try_from(value: Vec<BrokerAddress>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<'a> IntoIterator for &'a Brokers {
    type Item = &'a BrokerAddress;
    type IntoIter = std::slice::Iter<'a, BrokerAddress>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
