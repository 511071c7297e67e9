//! Simulated USB bus

use fs20_detect::usb_ids::{self, UsbId};
use fs20_detect::{UsbBus, UsbDeviceInfo, UsbHandle};
use serde::{Deserialize, Serialize};

use crate::air::Air;
use crate::pce::{SimulatedPce, DEFAULT_PCE_VERSION};
use crate::pcs::{SimulatedPcs, DEFAULT_PCS_VERSION};

/// Which adapters are plugged into a [`SimBus`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimBusConfig {
    pub pcs_attached: bool,
    pub pce_attached: bool,
    pub pcs_version: u8,
    pub pce_version: u8,
}

impl Default for SimBusConfig {
    fn default() -> Self {
        Self {
            pcs_attached: true,
            pce_attached: true,
            pcs_version: DEFAULT_PCS_VERSION,
            pce_version: DEFAULT_PCE_VERSION,
        }
    }
}

/// A USB bus carrying simulated adapters that share one [`Air`]
#[derive(Debug, Clone)]
pub struct SimBus {
    pcs: Option<SimulatedPcs>,
    pce: Option<SimulatedPce>,
    air: Air,
}

impl SimBus {
    /// Bus with both adapters attached
    pub fn new() -> Self {
        Self::from_config(SimBusConfig::default())
    }

    pub fn from_config(config: SimBusConfig) -> Self {
        let air = Air::new();
        let pcs = config.pcs_attached.then(|| {
            SimulatedPcs::with_versions(air.clone(), config.pcs_version, config.pce_version)
        });
        let pce = config
            .pce_attached
            .then(|| SimulatedPce::with_version(air.clone(), config.pce_version));
        Self { pcs, pce, air }
    }

    pub fn pcs(&self) -> Option<&SimulatedPcs> {
        self.pcs.as_ref()
    }

    pub fn pce(&self) -> Option<&SimulatedPce> {
        self.pce.as_ref()
    }

    pub fn air(&self) -> &Air {
        &self.air
    }
}

impl Default for SimBus {
    fn default() -> Self {
        Self::new()
    }
}

impl UsbBus for SimBus {
    fn find_device(&self, id: UsbId) -> Option<Box<dyn UsbHandle>> {
        match id {
            usb_ids::PCS => self
                .pcs
                .clone()
                .map(|pcs| Box::new(pcs) as Box<dyn UsbHandle>),
            usb_ids::PCE => self
                .pce
                .clone()
                .map(|pce| Box::new(pce) as Box<dyn UsbHandle>),
            _ => None,
        }
    }

    fn list_devices(&self) -> Vec<UsbDeviceInfo> {
        let attached = [
            (self.pcs.is_some(), usb_ids::PCS, "FS20 PCS"),
            (self.pce.is_some(), usb_ids::PCE, "FS20 PCE"),
        ];
        attached
            .into_iter()
            .filter(|(present, _, _)| *present)
            .enumerate()
            .map(|(i, (_, id, product))| UsbDeviceInfo {
                id,
                location: format!("001:{:03}", i + 2),
                manufacturer: Some("ELV".to_string()),
                product: Some(product.to_string()),
            })
            .collect()
    }
}
