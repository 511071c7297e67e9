//! Switch and dimmer wrappers
//!
//! A [`Device`] binds an address to the commands its kind accepts and tracks
//! the status the device should be in after each successful send. Status is
//! a brightness percentage, or `None` when the outcome cannot be known (for
//! example after `TOGGLE`).

use std::fmt;

use fs20_protocol::{AckStatus, Address, CodecError, Command, TimeCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Fs20Error;
use crate::transmitter::Transmitter;

/// Brightness after a command, `None` when unknown
pub type Status = Option<u8>;

use Command::*;

static SWITCH_COMMANDS: &[(Command, Status)] = &[
    (ChangeInternalTimer, None),
    (Educate, None),
    (Off, Some(0)),
    (OffForInternalTimeThenLastBrightnessLevel, None),
    (On, Some(100)),
    (OnForInternalTimeLastBrightnessLevelThenOff, Some(0)),
    (OnForInternalTimeLastBrightnessLevelThenPreviousState, None),
    (OnForInternalTimeThenOff, Some(0)),
    (OnForInternalTimeThenPreviousState, None),
    (OnLastBrightnessLevel, Some(100)),
    (Reset, None),
    (Toggle, None),
    (OffForTimeThenLastBrightnessLevel, Some(100)),
    (OnForTimeLastBrightnessLevelThenOff, Some(0)),
    (OnForTimeLastBrightnessLevelThenPreviousState, None),
    (OnForTimeThenOff, Some(0)),
    (OnForTimeThenPreviousState, None),
    (SetInternalTimer, None),
];

static DIMMER_COMMANDS: &[(Command, Status)] = &[
    (ChangeInternalTimer, None),
    (DimDown, None),
    (DimUp, None),
    (Dim, None),
    (Educate, None),
    (Off, Some(0)),
    (OffForInternalTimeThenLastBrightnessLevel, None),
    (On, Some(100)),
    (OnBrightnessLevel1, Some(6)),
    (OnBrightnessLevel2, Some(12)),
    (OnBrightnessLevel3, Some(18)),
    (OnBrightnessLevel4, Some(25)),
    (OnBrightnessLevel5, Some(31)),
    (OnBrightnessLevel6, Some(37)),
    (OnBrightnessLevel7, Some(43)),
    (OnBrightnessLevel8, Some(50)),
    (OnBrightnessLevel9, Some(56)),
    (OnBrightnessLevel10, Some(62)),
    (OnBrightnessLevel11, Some(68)),
    (OnBrightnessLevel12, Some(75)),
    (OnBrightnessLevel13, Some(81)),
    (OnBrightnessLevel14, Some(87)),
    (OnBrightnessLevel15, Some(93)),
    (OnBrightnessLevel16, Some(100)),
    (OnForInternalTimeLastBrightnessLevelThenOff, Some(0)),
    (OnForInternalTimeLastBrightnessLevelThenPreviousState, None),
    (OnForInternalTimeThenOff, Some(0)),
    (OnForInternalTimeThenPreviousState, None),
    (OnLastBrightnessLevel, None),
    (Reset, None),
    (Toggle, None),
    (DimBrightnessLevel1InTime, Some(6)),
    (DimBrightnessLevel2InTime, Some(12)),
    (DimBrightnessLevel3InTime, Some(18)),
    (DimBrightnessLevel4InTime, Some(25)),
    (DimBrightnessLevel5InTime, Some(31)),
    (DimBrightnessLevel6InTime, Some(37)),
    (DimBrightnessLevel7InTime, Some(43)),
    (DimBrightnessLevel8InTime, Some(50)),
    (DimBrightnessLevel9InTime, Some(56)),
    (DimBrightnessLevel10InTime, Some(62)),
    (DimBrightnessLevel11InTime, Some(68)),
    (DimBrightnessLevel12InTime, Some(75)),
    (DimBrightnessLevel13InTime, Some(81)),
    (DimBrightnessLevel14InTime, Some(87)),
    (DimBrightnessLevel15InTime, Some(93)),
    (DimBrightnessLevel16InTime, Some(100)),
    (DimDownThenOffInTime, Some(0)),
    (DimLastBrightnessLevelInTime, None),
    (DimLastBrightnessLevelThenOffInTime, Some(0)),
    (DimOffInTime, Some(0)),
    (DimThenOffInTime, Some(0)),
    (DimUpThenOffInTime, Some(0)),
    (OffForTimeThenLastBrightnessLevel, None),
    (OnForTimeLastBrightnessLevelThenOff, Some(0)),
    (OnForTimeLastBrightnessLevelThenPreviousState, None),
    (OnForTimeThenOff, Some(0)),
    (OnForTimeThenPreviousState, None),
    (SetInternalTimer, None),
    (SetInternalTimerDimDown, None),
    (SetInternalTimerDimUp, None),
];

/// Kind of FS20 actuator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceKind {
    Switch,
    Dimmer,
}

impl DeviceKind {
    /// Commands this kind accepts and the status each one leads to
    pub fn commands(&self) -> &'static [(Command, Status)] {
        match self {
            DeviceKind::Switch => SWITCH_COMMANDS,
            DeviceKind::Dimmer => DIMMER_COMMANDS,
        }
    }

    /// Status after `command`, or `None` if the kind does not accept it
    pub fn status_after(&self, command: Command) -> Option<Status> {
        self.commands()
            .iter()
            .find(|(c, _)| *c == command)
            .map(|(_, status)| *status)
    }

    pub fn supports(&self, command: Command) -> bool {
        self.status_after(command).is_some()
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::Switch => write!(f, "switch"),
            DeviceKind::Dimmer => write!(f, "dimmer"),
        }
    }
}

/// An addressed switch or dimmer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub address: Address,
    pub kind: DeviceKind,
    /// When set, every command fails with [`Fs20Error::DeviceBlocked`]
    pub blocked: bool,
    pub status: Status,
}

impl Device {
    /// A device assumed to be off
    pub fn new(address: Address, kind: DeviceKind) -> Self {
        Self {
            address,
            kind,
            blocked: false,
            status: Some(0),
        }
    }

    pub fn switch(address: Address) -> Self {
        Self::new(address, DeviceKind::Switch)
    }

    pub fn dimmer(address: Address) -> Self {
        Self::new(address, DeviceKind::Dimmer)
    }

    /// Send `command` to the device and return its status afterwards
    ///
    /// An `interval` of 1 sends once; anything else starts a repeating send.
    /// The status only changes when the transmitter acknowledges with
    /// [`AckStatus::Ok`].
    pub fn execute(
        &mut self,
        tx: &mut Transmitter,
        command: Command,
        time: TimeCode,
        interval: u32,
    ) -> Result<Status, Fs20Error> {
        let next = self.kind.status_after(command).ok_or_else(|| {
            CodecError::UnknownCommand(format!("{} is not supported by a {}", command, self.kind))
        })?;
        if self.blocked {
            return Err(Fs20Error::DeviceBlocked(self.address.to_string()));
        }

        let ack = if interval == 1 {
            tx.send_once(self.address, command, time)?
        } else {
            tx.send_repeating(self.address, command, time, interval)?
        };

        if ack == AckStatus::Ok {
            debug!("{} {} status {:?} -> {:?}", self.kind, self.address, self.status, next);
            self.status = next;
        }
        Ok(self.status)
    }

    /// Like [`Device::execute`], with the command looked up by name and the
    /// time given as `H:M:S.f`
    pub fn execute_named(
        &mut self,
        tx: &mut Transmitter,
        name: &str,
        time: &str,
        interval: u32,
    ) -> Result<Status, Fs20Error> {
        let command: Command = name.parse()?;
        let time: TimeCode = time.parse()?;
        self.execute(tx, command, time, interval)
    }
}
