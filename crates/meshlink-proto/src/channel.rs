//! Bands, channels and frequency/channel-number conversion

use serde::{Deserialize, Serialize};

/// Operating band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Band {
    #[default]
    TwoGhz,
    FiveGhz,
    SixGhz,
}

/// A channel as known to the wireless PHY
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Channel {
    /// Center frequency in MHz
    pub center_freq: u32,
    pub band: Band,
    /// Regulatory or administrative disable
    pub disabled: bool,
}

impl Channel {
    pub const fn new(center_freq: u32, band: Band) -> Self {
        Self {
            center_freq,
            band,
            disabled: false,
        }
    }

    pub const fn new_2g(center_freq: u32) -> Self {
        Self::new(center_freq, Band::TwoGhz)
    }

    pub const fn new_5g(center_freq: u32) -> Self {
        Self::new(center_freq, Band::FiveGhz)
    }

    pub const fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    /// IEEE channel number of this channel
    pub fn number(&self) -> Option<u8> {
        frequency_to_channel(self.center_freq)
    }
}

/// Convert a channel number in `band` to its center frequency (MHz)
pub fn channel_to_frequency(chan: u8, band: Band) -> Option<u32> {
    if chan == 0 {
        return None;
    }
    let chan = chan as u32;

    match band {
        Band::TwoGhz => match chan {
            14 => Some(2484),
            1..=13 => Some(2407 + chan * 5),
            _ => None,
        },
        Band::FiveGhz => {
            if (182..=196).contains(&chan) {
                Some(4000 + chan * 5)
            } else {
                Some(5000 + chan * 5)
            }
        }
        Band::SixGhz => match chan {
            2 => Some(5935),
            1..=233 => Some(5950 + chan * 5),
            _ => None,
        },
    }
}

/// Convert a center frequency (MHz) to its channel number
pub fn frequency_to_channel(freq: u32) -> Option<u8> {
    let chan = match freq {
        2484 => 14,
        2412..=2483 => (freq - 2407) / 5,
        4910..=4980 => (freq - 4000) / 5,
        5000..=5924 => (freq - 5000) / 5,
        5935 => 2,
        5950..=7115 => (freq - 5950) / 5,
        _ => return None,
    };
    u8::try_from(chan).ok()
}
