//! The logical I2C control register.
//!
//! Software never writes the control register directly. It writes ones to CONSET to set
//! control bits and ones to CONCLR to clear them; zeroes written to either are ignored. What
//! happens when both are written to for the same bit in the same cycle is not documented, and
//! nothing here models it.

use bitflags::bitflags;

use crate::{
  error::{I2cMapError, I2cMapResult},
  field::Field,
  map::{
    conclr::{self, Conclr},
    conset::{self, Conset},
  },
};

/// One bit of the logical control register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlBit {
  /// Assert acknowledge.
  Aa,
  /// Interrupt flag.
  Si,
  /// STOP request. Cleared by hardware only.
  Sto,
  /// START request.
  Sta,
  /// Interface enable.
  I2cen,
}
impl ControlBit {
  pub const ALL: [ControlBit; 5] = [
    ControlBit::Aa,
    ControlBit::Si,
    ControlBit::Sto,
    ControlBit::Sta,
    ControlBit::I2cen,
  ];

  pub const fn name(self) -> &'static str {
    self.set_field().def().name()
  }

  /// The CONSET field that sets this bit.
  pub const fn set_field(self) -> Field<Conset> {
    match self {
      ControlBit::Aa => conset::AA,
      ControlBit::Si => conset::SI,
      ControlBit::Sto => conset::STO,
      ControlBit::Sta => conset::STA,
      ControlBit::I2cen => conset::I2CEN,
    }
  }

  /// The CONCLR field that clears this bit. STO has none.
  pub const fn clear_field(self) -> Option<Field<Conclr>> {
    match self {
      ControlBit::Aa => Some(conclr::AAC),
      ControlBit::Si => Some(conclr::SIC),
      ControlBit::Sto => None,
      ControlBit::Sta => Some(conclr::STAC),
      ControlBit::I2cen => Some(conclr::I2CENC),
    }
  }

  /// The value to write to CONSET to set this bit.
  pub const fn set_mask(self) -> u32 {
    self.set_field().def().mask()
  }

  /// The value to write to CONCLR to clear this bit. Fails with `InvalidRegister` for STO,
  /// which software cannot clear.
  pub fn clear_mask(self) -> I2cMapResult<u32> {
    match self.clear_field() {
      Some(field) => Ok(field.mask()),
      None => Err(I2cMapError::InvalidRegister(format!(
        "CONCLR.{}C",
        self.name()
      ))),
    }
  }

  pub fn is_set(self, control: ControlFlags) -> bool {
    control.contains(ControlFlags::from(self))
  }
}

bitflags! {
  /// Bits written to CONSET. Every bit set here is set in the control register.
  #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
  pub struct ControlFlags: u32 {
    const AA = conset::AA.def().mask();
    const SI = conset::SI.def().mask();
    const STO = conset::STO.def().mask();
    const STA = conset::STA.def().mask();
    const I2CEN = conset::I2CEN.def().mask();
  }
}

bitflags! {
  /// Bits written to CONCLR. Every bit set here is cleared in the control register.
  #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
  pub struct ClearFlags: u32 {
    const AAC = conclr::AAC.def().mask();
    const SIC = conclr::SIC.def().mask();
    const STAC = conclr::STAC.def().mask();
    const I2CENC = conclr::I2CENC.def().mask();
  }
}

impl From<ControlBit> for ControlFlags {
  fn from(bit: ControlBit) -> Self {
    ControlFlags::from_bits_truncate(bit.set_mask())
  }
}

impl ControlFlags {
  /// The clear request that undoes these bits. STO is dropped since it cannot be cleared.
  pub fn to_clear(self) -> ClearFlags {
    ClearFlags::from_bits_truncate(self.bits())
  }
}
