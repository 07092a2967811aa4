//! Display configuration

use std::time::Duration;

/// When writes to the logical buffer reach the panels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum TransferDelay {
    /// Flush synchronously after every write
    Immediate,
    /// Flush once, this long after the first unflushed write
    Debounce(Duration),
    /// Flush only when [`Display::flush`](crate::Display::flush) is called
    Manual,
}

impl TransferDelay {
    /// 15 ms debounce
    pub const DEFAULT: Self = Self::Debounce(Duration::from_millis(15));

    /// Tri-state milliseconds: `0` immediate, `> 0` debounce, `< 0` manual
    ///
    /// # Examples
    /// ```
    /// use panel_compositor::TransferDelay;
    /// use std::time::Duration;
    ///
    /// assert_eq!(TransferDelay::from_millis(0), TransferDelay::Immediate);
    /// assert_eq!(TransferDelay::from_millis(-1), TransferDelay::Manual);
    /// assert_eq!(
    ///     TransferDelay::from_millis(20),
    ///     TransferDelay::Debounce(Duration::from_millis(20))
    /// );
    /// ```
    pub const fn from_millis(millis: i64) -> Self {
        if millis == 0 {
            Self::Immediate
        } else if millis > 0 {
            Self::Debounce(Duration::from_millis(millis.unsigned_abs()))
        } else {
            Self::Manual
        }
    }

    /// Inverse of [`TransferDelay::from_millis`]; manual maps to `-1`
    pub fn as_millis(self) -> i64 {
        match self {
            Self::Immediate => 0,
            Self::Debounce(delay) => i64::try_from(delay.as_millis()).unwrap_or(i64::MAX),
            Self::Manual => -1,
        }
    }
}

impl Default for TransferDelay {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Configuration for a [`Display`](crate::Display)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DisplayConfig {
    /// Flush policy
    pub transfer_delay: TransferDelay,
    /// Upper bound on the bytes of a single `set_pixels` call
    pub max_transfer_size: usize,
}

impl DisplayConfig {
    /// Transfer bound shared by common SPI/I2C bridges
    pub const MAX_TRANSFER_SIZE: usize = 4000;

    /// Default configuration: 15 ms debounce, 4000-byte transfers
    pub const DEFAULT: Self = Self {
        transfer_delay: TransferDelay::DEFAULT,
        max_transfer_size: Self::MAX_TRANSFER_SIZE,
    };

    /// Flush on every write
    pub const IMMEDIATE: Self = Self {
        transfer_delay: TransferDelay::Immediate,
        max_transfer_size: Self::MAX_TRANSFER_SIZE,
    };

    /// Flush only on request
    pub const MANUAL: Self = Self {
        transfer_delay: TransferDelay::Manual,
        max_transfer_size: Self::MAX_TRANSFER_SIZE,
    };
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millis_round_trip() {
        for millis in [-5, -1, 0, 1, 15, 1000] {
            let delay = TransferDelay::from_millis(millis);
            assert_eq!(delay.as_millis(), millis.max(-1));
        }
    }

    #[test]
    fn test_defaults() {
        assert_eq!(DisplayConfig::default(), DisplayConfig::DEFAULT);
        assert_eq!(DisplayConfig::DEFAULT.transfer_delay.as_millis(), 15);
        assert_eq!(DisplayConfig::DEFAULT.max_transfer_size, 4000);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_serde() {
        #![allow(clippy::unwrap_used)]
        let json = serde_json::to_string(&DisplayConfig::MANUAL).unwrap();
        let back: DisplayConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, DisplayConfig::MANUAL);
    }
}
