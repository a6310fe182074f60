use crate::{
  control::{ClearFlags, ControlBit, ControlFlags},
  error::I2cMapResult,
  field::RegisterValue,
  map::{FamilyRegister, SingleRegister, Writable},
  register::{Register, RegisterFamily},
};

/// Base address of the I2C0 peripheral on LPC17xx devices.
pub const I2C0_BASE: u32 = 0x4001_C000;
/// Base address of the I2C1 peripheral on LPC17xx devices.
pub const I2C1_BASE: u32 = 0x4005_C000;
/// Base address of the I2C2 peripheral on LPC17xx devices.
pub const I2C2_BASE: u32 = 0x400A_0000;

pub const I2C0: I2cInstance = I2cInstance::new(I2C0_BASE);
pub const I2C1: I2cInstance = I2cInstance::new(I2C1_BASE);
pub const I2C2: I2cInstance = I2cInstance::new(I2C2_BASE);

/// Handle to one I2C peripheral, identified only by its base address.
///
/// The handle owns nothing and touches no memory. It computes the addresses and values of
/// the stores a driver has to perform. Drivers must issue those as volatile accesses and keep
/// a single owner per instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2cInstance {
  base: u32,
}

/// A 32-bit store a driver has to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterWrite {
  pub register: Register,
  pub address: u32,
  pub value: u32,
}

impl I2cInstance {
  pub const fn new(base: u32) -> Self {
    Self { base }
  }

  pub const fn base(self) -> u32 {
    self.base
  }

  /// The absolute address of `register` on this instance.
  pub const fn address(self, register: Register) -> u32 {
    register.address(self.base)
  }

  /// The absolute address of member `index` of `family`. Fails with `IndexOutOfRange` unless
  /// `index < 4`.
  pub fn family_address(self, family: RegisterFamily, index: usize) -> I2cMapResult<u32> {
    family.address(self.base, index)
  }

  pub fn address_of<R: SingleRegister>(self) -> u32 {
    self.address(R::REGISTER)
  }

  /// Stores `value` into a plain read-write register.
  pub fn write<R: SingleRegister + Writable>(self, value: RegisterValue<R>) -> RegisterWrite {
    self.store(R::REGISTER, value.bits())
  }

  /// Stores `value` into member `index` of a register family.
  pub fn write_family<R: FamilyRegister + Writable>(
    self,
    index: usize,
    value: RegisterValue<R>,
  ) -> I2cMapResult<RegisterWrite> {
    Ok(self.store(R::FAMILY.member(index)?, value.bits()))
  }

  /// Requests that `bit` be set in the control register.
  pub fn request_set(self, bit: ControlBit) -> RegisterWrite {
    self.store(Register::Conset, bit.set_mask())
  }

  /// Requests that `bit` be cleared in the control register. Fails with `InvalidRegister`
  /// for STO, which only hardware clears.
  pub fn request_clear(self, bit: ControlBit) -> I2cMapResult<RegisterWrite> {
    Ok(self.store(Register::Conclr, bit.clear_mask()?))
  }

  /// Requests that every bit in `flags` be set. Bits outside the named flags are reserved and
  /// never written.
  pub fn request_set_flags(self, flags: ControlFlags) -> RegisterWrite {
    self.store(Register::Conset, flags.bits() & ControlFlags::all().bits())
  }

  /// Requests that every bit in `flags` be cleared. Reserved bits are never written.
  pub fn request_clear_flags(self, flags: ClearFlags) -> RegisterWrite {
    self.store(Register::Conclr, flags.bits() & ClearFlags::all().bits())
  }

  fn store(self, register: Register, value: u32) -> RegisterWrite {
    RegisterWrite {
      register,
      address: self.address(register),
      value,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::{I2cInstance, RegisterWrite, I2C0, I2C1, I2C2, I2C2_BASE};
  use crate::{
    map::{adr, conset, mask, sclh, stat, SingleRegister},
    ClearFlags, ControlBit, ControlFlags, I2cMapError, Register, RegisterFamily, RegisterValue,
  };
  use std::collections::HashMap;

  /// Simulated peripheral memory that applies the CONSET/CONCLR write semantics to a
  /// separate control register.
  #[derive(Default)]
  struct SimulatedI2c {
    control: u32,
    words: HashMap<u32, u32>,
  }
  impl SimulatedI2c {
    fn apply(&mut self, write: RegisterWrite) {
      match write.register {
        Register::Conset => self.control |= write.value & Register::Conset.defined_bits(),
        Register::Conclr => self.control &= !(write.value & Register::Conclr.defined_bits()),
        _ => {
          self.words.insert(write.address, write.value);
        }
      }
    }
  }

  #[test]
  fn instances_share_layout_at_different_bases() {
    assert_eq!(0x4001_C004, I2C0.address(Register::Stat));
    assert_eq!(0x4005_C004, I2C1.address(Register::Stat));
    assert_eq!(0x400A_0004, I2C2.address(Register::Stat));

    for register in Register::ALL.iter() {
      assert_eq!(
        I2C1.address(*register) - I2C1.base(),
        I2C2.address(*register) - I2C2.base()
      );
    }
  }

  #[test]
  fn resolves_typed_addresses() {
    let i2c = I2cInstance::new(0x1000);

    assert_eq!(0x1004, i2c.address_of::<stat::Stat>());
    assert_eq!(0x1000, i2c.address_of::<conset::Conset>());
    assert_eq!(0x1034, i2c.family_address(RegisterFamily::Mask, 1).unwrap());
    assert_eq!(
      Err(I2cMapError::IndexOutOfRange {
        family: "ADR",
        index: 4,
        len: 4
      }),
      i2c.family_address(RegisterFamily::Adr, 4)
    );
  }

  #[test]
  fn set_request_targets_conset() {
    assert_eq!(
      RegisterWrite {
        register: Register::Conset,
        address: 0x4001_C000,
        value: 0x20,
      },
      I2C0.request_set(ControlBit::Sta)
    );
  }

  #[test]
  fn clear_request_targets_conclr() {
    assert_eq!(
      RegisterWrite {
        register: Register::Conclr,
        address: 0x4005_C018,
        value: 0x08,
      },
      I2C1.request_clear(ControlBit::Si).unwrap()
    );
    assert!(I2C1.request_clear(ControlBit::Sto).is_err());
  }

  #[test]
  fn set_and_clear_only_touch_requested_bits() {
    let mut sim = SimulatedI2c::default();

    sim.apply(I2C0.request_set_flags(ControlFlags::I2CEN | ControlFlags::AA));
    assert_eq!(0x44, sim.control);

    sim.apply(I2C0.request_set(ControlBit::Sta));
    assert_eq!(0x64, sim.control);

    sim.apply(I2C0.request_clear(ControlBit::Aa).unwrap());
    assert_eq!(0x60, sim.control);

    sim.apply(I2C0.request_clear_flags(ClearFlags::STAC | ClearFlags::SIC));
    assert_eq!(0x40, sim.control);

    sim.apply(I2C0.request_set_flags(ControlFlags::empty()));
    sim.apply(I2C0.request_clear_flags(ClearFlags::empty()));
    assert_eq!(0x40, sim.control);
  }

  #[test]
  fn flag_requests_never_assert_reserved_bits() {
    let set = I2C0.request_set_flags(ControlFlags::from_bits_retain(u32::MAX));
    assert_eq!(0x7C, set.value);

    let clear = I2C0.request_clear_flags(ClearFlags::from_bits_retain(0x8000_0013 | 0x20));
    assert_eq!(0x20, clear.value);
  }

  #[test]
  fn writes_plain_registers() {
    let mut sim = SimulatedI2c::default();

    let high = RegisterValue::<sclh::Sclh>::zero()
      .set(sclh::SCLH, 60)
      .unwrap();
    sim.apply(I2C2.write(high));

    assert_eq!(Some(&60), sim.words.get(&(I2C2_BASE + 0x10)));
    assert_eq!(Register::Sclh, sclh::Sclh::REGISTER);
  }

  #[test]
  fn writes_family_members() {
    let address = RegisterValue::<adr::Adr>::zero()
      .set(adr::ADDR, 0x2A)
      .unwrap();

    let write = I2C0.write_family(2, address).unwrap();
    assert_eq!(Register::Adr2, write.register);
    assert_eq!(0x4001_C024, write.address);
    assert_eq!(0x54, write.value);

    let all_bits = RegisterValue::<mask::Mask>::zero()
      .set(mask::MASK, 0x7F)
      .unwrap();
    assert_eq!(0x4001_C03C, I2C0.write_family(3, all_bits).unwrap().address);
    assert!(I2C0.write_family(4, all_bits).is_err());
  }
}
