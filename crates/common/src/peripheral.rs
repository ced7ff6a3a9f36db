//! Opaque peripheral access interface
//!
//! The hub connection layer constructs one handle per attached port. The
//! hub runtime never looks inside a handle: it stores it in the registry,
//! binds it to role slots and forwards commands to the capability methods
//! below.

use crate::{Error, Result};
use protocol::{Color, PeripheralKind, PortId, SensorValue};
use std::fmt;
use std::sync::Arc;

/// Shared handle to an attached peripheral
pub type PeripheralHandle = Arc<dyn Peripheral>;

/// Callback invoked with every reading of a subscribed sensor
pub type SensorCallback = Arc<dyn Fn(SensorValue) + Send + Sync>;

/// Identifies one subscription so it can be removed again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Capability interface of an attached peripheral
///
/// Every capability method has a default implementation that fails with
/// [`Error::Unsupported`], so an implementation only overrides what its
/// kind can actually do.
pub trait Peripheral: Send + Sync + fmt::Debug {
    /// Port the peripheral is attached to
    fn port(&self) -> PortId;

    /// Capability tag reported at attach time
    fn kind(&self) -> PeripheralKind;

    /// Run a motor at `fraction` of full power, in `[-1.0, 1.0]`
    fn power(&self, fraction: f32) -> Result<()> {
        let _ = fraction;
        Err(self.unsupported("power"))
    }

    /// Stop a motor
    fn stop(&self) -> Result<()> {
        Err(self.unsupported("stop"))
    }

    /// Set an RGB light to a palette color
    fn set_color(&self, color: Color) -> Result<()> {
        let _ = color;
        Err(self.unsupported("set_color"))
    }

    /// Set a light's brightness, in percent
    fn set_brightness(&self, percent: u8) -> Result<()> {
        let _ = percent;
        Err(self.unsupported("set_brightness"))
    }

    /// Start delivering readings in `mode` to `callback`
    ///
    /// `granularity` is the minimum change that triggers a notification.
    fn subscribe(
        &self,
        callback: SensorCallback,
        mode: u8,
        granularity: u32,
    ) -> Result<SubscriptionId> {
        let _ = (callback, mode, granularity);
        Err(self.unsupported("subscribe"))
    }

    /// Stop delivering readings to a subscription
    fn unsubscribe(&self, id: SubscriptionId) -> Result<()> {
        let _ = id;
        Err(self.unsupported("unsubscribe"))
    }

    /// Build the error returned by unsupported capabilities
    fn unsupported(&self, operation: &'static str) -> Error {
        Error::Unsupported {
            port: self.port(),
            kind: self.kind(),
            operation,
        }
    }
}

/// Validate a motor power fraction
pub fn check_power(fraction: f32) -> Result<f32> {
    if !(-1.0..=1.0).contains(&fraction) || fraction.is_nan() {
        return Err(Error::InvalidArgument(format!(
            "power {} outside [-1.0, 1.0]",
            fraction
        )));
    }
    Ok(fraction)
}

/// Validate a brightness percentage
pub fn check_brightness(percent: u8) -> Result<u8> {
    if percent > 100 {
        return Err(Error::InvalidArgument(format!(
            "brightness {}% outside [0, 100]",
            percent
        )));
    }
    Ok(percent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Bare;

    impl Peripheral for Bare {
        fn port(&self) -> PortId {
            PortId(0x3b)
        }

        fn kind(&self) -> PeripheralKind {
            PeripheralKind::Current
        }
    }

    #[test]
    fn test_default_capabilities_are_unsupported() {
        let p = Bare;
        assert!(matches!(
            p.power(0.5),
            Err(Error::Unsupported {
                operation: "power",
                ..
            })
        ));
        assert!(p.stop().is_err());
        assert!(p.set_color(Color::Red).is_err());
        assert!(p.set_brightness(10).is_err());
        assert!(p.unsubscribe(SubscriptionId(1)).is_err());
    }

    #[test]
    fn test_check_power() {
        assert_eq!(check_power(-1.0).unwrap(), -1.0);
        assert_eq!(check_power(0.25).unwrap(), 0.25);
        assert!(check_power(1.01).is_err());
        assert!(check_power(f32::NAN).is_err());
    }

    #[test]
    fn test_check_brightness() {
        assert_eq!(check_brightness(100).unwrap(), 100);
        assert!(check_brightness(101).is_err());
    }
}
