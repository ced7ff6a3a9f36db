//! Connection URL handling
//!
//! Bluetooth transports live outside this workspace, so every URL resolves to
//! a simulated hub that reports the devices of the requested model.

use anyhow::{Context, Result, bail};
use hub::sim::default_devices;
use hub::{HubModel, SimulatedConnection};
use percent_encoding::percent_decode_str;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;
use url::Url;

/// Attach delay used when the URL does not set one
pub const DEFAULT_ATTACH_DELAY: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionUrl {
    /// `auto://`: first hub found
    Auto,
    /// `sim://[address][?delay_ms=N]`
    ///
    /// The address is a URL host, so Bluetooth MAC addresses are written
    /// with `-` separators (or `%3A` for colons).
    Simulated {
        address: Option<String>,
        attach_delay: Duration,
    },
}

impl FromStr for ConnectionUrl {
    type Err = anyhow::Error;

    fn from_str(input: &str) -> Result<Self> {
        let url =
            Url::parse(input).with_context(|| format!("Malformed connection URL: {}", input))?;

        match url.scheme() {
            "auto" => Ok(ConnectionUrl::Auto),
            "sim" => Self::simulated(&url),
            other => bail!("Unrecognised URL scheme: {}", other),
        }
    }
}

impl ConnectionUrl {
    fn simulated(url: &Url) -> Result<Self> {
        if !matches!(url.path(), "" | "/") {
            bail!("Unexpected path in connection URL: {}", url.path());
        }

        let address = match url.host_str() {
            Some(host) if !host.is_empty() => Some(
                percent_decode_str(host)
                    .decode_utf8()
                    .with_context(|| format!("Invalid hub address: {}", host))?
                    .into_owned(),
            ),
            _ => None,
        };

        let mut attach_delay = DEFAULT_ATTACH_DELAY;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "delay_ms" => {
                    let millis: u64 = value
                        .parse()
                        .with_context(|| format!("Invalid delay_ms value: {}", value))?;
                    attach_delay = Duration::from_millis(millis);
                }
                _ => bail!("Unknown connection parameter: {}", key),
            }
        }

        Ok(ConnectionUrl::Simulated {
            address,
            attach_delay,
        })
    }

    /// Open and start a connection to a hub of `model`
    pub fn open(&self, model: HubModel) -> Result<SimulatedConnection> {
        let mut connection = match self {
            ConnectionUrl::Auto => {
                info!("No Bluetooth transport available, using a simulated {}", model);
                SimulatedConnection::for_model(model, DEFAULT_ATTACH_DELAY)
            }
            ConnectionUrl::Simulated {
                address: Some(address),
                attach_delay,
            } => SimulatedConnection::new(
                format!("sim://{}", address),
                default_devices(model),
                *attach_delay,
            ),
            ConnectionUrl::Simulated {
                address: None,
                attach_delay,
            } => SimulatedConnection::for_model(model, *attach_delay),
        };

        connection
            .start()
            .context("Failed to start simulated connection")?;
        Ok(connection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hub::HubConnection;

    #[test]
    fn test_parse_auto() {
        assert_eq!("auto://".parse::<ConnectionUrl>().unwrap(), ConnectionUrl::Auto);
    }

    #[test]
    fn test_parse_simulated() {
        assert_eq!(
            "sim://".parse::<ConnectionUrl>().unwrap(),
            ConnectionUrl::Simulated {
                address: None,
                attach_delay: DEFAULT_ATTACH_DELAY,
            }
        );
        assert_eq!(
            "sim://90-84-2B-00-00-01?delay_ms=5"
                .parse::<ConnectionUrl>()
                .unwrap(),
            ConnectionUrl::Simulated {
                address: Some("90-84-2B-00-00-01".to_string()),
                attach_delay: Duration::from_millis(5),
            }
        );
    }

    #[test]
    fn test_parse_decodes_and_ignores_scheme_case() {
        assert_eq!(
            "SIM://hub".parse::<ConnectionUrl>().unwrap(),
            ConnectionUrl::Simulated {
                address: Some("hub".to_string()),
                attach_delay: DEFAULT_ATTACH_DELAY,
            }
        );
        assert_eq!("Auto://".parse::<ConnectionUrl>().unwrap(), ConnectionUrl::Auto);
        assert_eq!(
            "sim://my%20hub?delay_ms=%35".parse::<ConnectionUrl>().unwrap(),
            ConnectionUrl::Simulated {
                address: Some("my hub".to_string()),
                attach_delay: Duration::from_millis(5),
            }
        );
        assert_eq!(
            "sim://90%3A84%3A2B%3A00%3A00%3A01"
                .parse::<ConnectionUrl>()
                .unwrap(),
            ConnectionUrl::Simulated {
                address: Some("90:84:2B:00:00:01".to_string()),
                attach_delay: DEFAULT_ATTACH_DELAY,
            }
        );
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = "gatt://00-16-53".parse::<ConnectionUrl>().unwrap_err();
        assert!(err.to_string().contains("Unrecognised URL scheme"));

        assert!("auto".parse::<ConnectionUrl>().is_err());
        assert!("sim://?delay_ms=soon".parse::<ConnectionUrl>().is_err());
        assert!("sim://?hub_mac=1".parse::<ConnectionUrl>().is_err());
        assert!("sim://hub/extra".parse::<ConnectionUrl>().is_err());
    }

    #[test]
    fn test_open_names_connection() {
        let url: ConnectionUrl = "sim://train-1?delay_ms=1".parse().unwrap();
        let mut connection = url.open(HubModel::SmartHub).unwrap();
        assert_eq!(connection.name(), "sim://train-1");
        connection.disconnect().unwrap();
    }
}
