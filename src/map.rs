//! Field definitions for every register of the I2C peripheral.
//!
//! Each register gets a module holding a zero-sized marker type and one `Field` constant per
//! named field. The marker ties fields to their register, so `stat::STATUS` can only be used
//! on a `RegisterValue<stat::Stat>`.

use crate::{
  field::{Field, FieldDef, RegisterLayout},
  register::{Register, RegisterFamily},
  value::FieldRole,
};

/// Marker for a register that exists once per peripheral.
pub trait SingleRegister: RegisterLayout {
  const REGISTER: Register;
}

/// Marker for a register layout shared by an indexed family.
pub trait FamilyRegister: RegisterLayout {
  const FAMILY: RegisterFamily;
}

/// Marker for registers software may store a full value into. CONSET and CONCLR are not
/// writable this way; they are driven through set and clear requests.
pub trait Writable {}

pub mod conset {
  use super::*;

  /// I2C Control Set register.
  pub struct Conset;

  /// Assert acknowledge flag.
  pub const AA: Field<Conset> = Field::new(
    FieldDef::new("AA", 2, 1, FieldRole::Flag).with_description("Assert acknowledge flag."),
  );
  /// I2C interrupt flag. Set by hardware when the state in STAT changes.
  pub const SI: Field<Conset> =
    Field::new(FieldDef::new("SI", 3, 1, FieldRole::Flag).with_description("I2C interrupt flag."));
  /// Stop flag. Hardware clears it once the STOP condition is on the bus.
  pub const STO: Field<Conset> =
    Field::new(FieldDef::new("STO", 4, 1, FieldRole::Flag).with_description("Stop flag."));
  /// Start flag.
  pub const STA: Field<Conset> =
    Field::new(FieldDef::new("STA", 5, 1, FieldRole::Flag).with_description("Start flag."));
  /// I2C interface enable.
  pub const I2CEN: Field<Conset> = Field::new(
    FieldDef::new("I2CEN", 6, 1, FieldRole::Enable).with_description("I2C interface enable."),
  );

  impl RegisterLayout for Conset {
    const NAME: &'static str = "CONSET";
    const FIELDS: &'static [FieldDef] = &[AA.def(), SI.def(), STO.def(), STA.def(), I2CEN.def()];
  }
  impl SingleRegister for Conset {
    const REGISTER: Register = Register::Conset;
  }
}

pub mod conclr {
  use super::*;

  /// I2C Control Clear register. There is no clear bit for STO.
  pub struct Conclr;

  pub const AAC: Field<Conclr> = Field::new(
    FieldDef::new("AAC", 2, 1, FieldRole::Flag).with_description("Assert acknowledge clear bit."),
  );
  pub const SIC: Field<Conclr> = Field::new(
    FieldDef::new("SIC", 3, 1, FieldRole::Flag).with_description("I2C interrupt clear bit."),
  );
  pub const STAC: Field<Conclr> = Field::new(
    FieldDef::new("STAC", 5, 1, FieldRole::Flag).with_description("Start flag clear bit."),
  );
  pub const I2CENC: Field<Conclr> = Field::new(
    FieldDef::new("I2CENC", 6, 1, FieldRole::Enable).with_description("I2C interface disable bit."),
  );

  impl RegisterLayout for Conclr {
    const NAME: &'static str = "CONCLR";
    const FIELDS: &'static [FieldDef] = &[AAC.def(), SIC.def(), STAC.def(), I2CENC.def()];
  }
  impl SingleRegister for Conclr {
    const REGISTER: Register = Register::Conclr;
  }
}

pub mod stat {
  use super::*;

  /// I2C Status register.
  pub struct Stat;

  /// Status code, bits 7..3. The low three bits of STAT always read as zero.
  pub const STATUS: Field<Stat> = Field::new(
    FieldDef::new("STATUS", 3, 5, FieldRole::StatusCode).with_description("I2C interface status."),
  );

  impl RegisterLayout for Stat {
    const NAME: &'static str = "STAT";
    const FIELDS: &'static [FieldDef] = &[STATUS.def()];
  }
  impl SingleRegister for Stat {
    const REGISTER: Register = Register::Stat;
  }

  /// The raw status code held in a STAT value. Interpreting it is up to the driver's state
  /// machine.
  pub fn status_code(stat: u32) -> u8 {
    STATUS.get(stat) as u8
  }
}

pub mod dat {
  use super::*;

  /// I2C Data register.
  pub struct Dat;

  pub const DATA: Field<Dat> =
    Field::new(FieldDef::new("DATA", 0, 8, FieldRole::Data).with_description("Data value."));

  impl RegisterLayout for Dat {
    const NAME: &'static str = "DAT";
    const FIELDS: &'static [FieldDef] = &[DATA.def()];
  }
  impl SingleRegister for Dat {
    const REGISTER: Register = Register::Dat;
  }
  impl Writable for Dat {}
}

pub mod databuf {
  use super::*;

  /// Data buffer register.
  pub struct DataBuf;

  pub const DATA: Field<DataBuf> =
    Field::new(FieldDef::new("DATA", 0, 8, FieldRole::Data).with_description("Data buffer."));

  impl RegisterLayout for DataBuf {
    const NAME: &'static str = "DATABUF";
    const FIELDS: &'static [FieldDef] = &[DATA.def()];
  }
  impl SingleRegister for DataBuf {
    const REGISTER: Register = Register::DataBuf;
  }
}

pub mod adr {
  use super::*;

  /// Slave address registers ADR0..ADR3.
  pub struct Adr;

  /// General Call enable bit.
  pub const GC: Field<Adr> = Field::new(
    FieldDef::new("GC", 0, 1, FieldRole::Enable).with_description("General Call enable bit."),
  );
  /// 7-bit slave address.
  pub const ADDR: Field<Adr> = Field::new(
    FieldDef::new("ADDR", 1, 7, FieldRole::Address)
      .with_description("I2C device address for slave mode."),
  );

  impl RegisterLayout for Adr {
    const NAME: &'static str = "ADR";
    const FIELDS: &'static [FieldDef] = &[GC.def(), ADDR.def()];
  }
  impl FamilyRegister for Adr {
    const FAMILY: RegisterFamily = RegisterFamily::Adr;
  }
  impl Writable for Adr {}
}

pub mod mask {
  use super::*;

  /// Slave address mask registers MASK0..MASK3. Bit 0 is reserved.
  pub struct Mask;

  pub const MASK: Field<Mask> = Field::new(
    FieldDef::new("MASK", 1, 7, FieldRole::Address).with_description("Mask bits."),
  );

  impl RegisterLayout for Mask {
    const NAME: &'static str = "MASK";
    const FIELDS: &'static [FieldDef] = &[MASK.def()];
  }
  impl FamilyRegister for Mask {
    const FAMILY: RegisterFamily = RegisterFamily::Mask;
  }
  impl Writable for Mask {}
}

pub mod sclh {
  use super::*;

  /// SCL duty cycle high half word.
  pub struct Sclh;

  pub const SCLH: Field<Sclh> = Field::new(
    FieldDef::new("SCLH", 0, 16, FieldRole::ClockCount)
      .with_description("Count for SCL high time period selection."),
  );

  impl RegisterLayout for Sclh {
    const NAME: &'static str = "SCLH";
    const FIELDS: &'static [FieldDef] = &[SCLH.def()];
  }
  impl SingleRegister for Sclh {
    const REGISTER: Register = Register::Sclh;
  }
  impl Writable for Sclh {}
}

pub mod scll {
  use super::*;

  /// SCL duty cycle low half word.
  pub struct Scll;

  pub const SCLL: Field<Scll> = Field::new(
    FieldDef::new("SCLL", 0, 16, FieldRole::ClockCount)
      .with_description("Count for SCL low time period selection."),
  );

  impl RegisterLayout for Scll {
    const NAME: &'static str = "SCLL";
    const FIELDS: &'static [FieldDef] = &[SCLL.def()];
  }
  impl SingleRegister for Scll {
    const REGISTER: Register = Register::Scll;
  }
  impl Writable for Scll {}
}

pub mod mmctrl {
  use super::*;

  /// Monitor mode control register.
  pub struct Mmctrl;

  pub const MM_ENA: Field<Mmctrl> = Field::new(
    FieldDef::new("MM_ENA", 0, 1, FieldRole::Enable).with_description("Monitor mode enable."),
  );
  pub const ENA_SCL: Field<Mmctrl> = Field::new(
    FieldDef::new("ENA_SCL", 1, 1, FieldRole::Enable).with_description("SCL output enable."),
  );
  pub const MATCH_ALL: Field<Mmctrl> = Field::new(
    FieldDef::new("MATCH_ALL", 2, 1, FieldRole::Enable)
      .with_description("Select interrupt register match."),
  );

  impl RegisterLayout for Mmctrl {
    const NAME: &'static str = "MMCTRL";
    const FIELDS: &'static [FieldDef] = &[MM_ENA.def(), ENA_SCL.def(), MATCH_ALL.def()];
  }
  impl SingleRegister for Mmctrl {
    const REGISTER: Register = Register::Mmctrl;
  }
  impl Writable for Mmctrl {}
}

#[cfg(test)]
mod tests {
  use super::{adr, conclr, conset, databuf, dat, mask, mmctrl, sclh, stat, SingleRegister};
  use crate::{field_get, field_set, I2cMapError, RegisterValue};

  #[test]
  fn sets_start_flag() {
    assert_eq!(0x0000_0020, field_set(0x0000_0000, conset::STA, 1).unwrap());
    assert_eq!(1, field_get(0x0000_0020, conset::STA));
  }

  #[test]
  fn extracts_status_code() {
    assert_eq!(21, field_get(0x0000_00A8, stat::STATUS));
    assert_eq!(0x15, stat::status_code(0xA8));
    assert_eq!(0x1F, stat::status_code(0xF8));
  }

  #[test]
  fn replaces_data_buffer_byte() {
    assert_eq!(
      0x1234_56FF,
      field_set(0x1234_5678, databuf::DATA, 0xFF).unwrap()
    );
  }

  #[test]
  fn control_bits_match_hardware_positions() {
    assert_eq!(1 << 2, conset::AA.mask());
    assert_eq!(1 << 3, conset::SI.mask());
    assert_eq!(1 << 4, conset::STO.mask());
    assert_eq!(1 << 5, conset::STA.mask());
    assert_eq!(1 << 6, conset::I2CEN.mask());

    assert_eq!(conset::AA.mask(), conclr::AAC.mask());
    assert_eq!(conset::SI.mask(), conclr::SIC.mask());
    assert_eq!(conset::STA.mask(), conclr::STAC.mask());
    assert_eq!(conset::I2CEN.mask(), conclr::I2CENC.mask());
  }

  #[test]
  fn address_fields_sit_above_general_call_bit() {
    assert_eq!(0x01, adr::GC.mask());
    assert_eq!(0xFE, adr::ADDR.mask());
    assert_eq!(0xFE, mask::MASK.mask());

    let value = RegisterValue::<adr::Adr>::zero()
      .set(adr::ADDR, 0x50)
      .unwrap()
      .set(adr::GC, 1)
      .unwrap();

    assert_eq!(0xA1, value.bits());
  }

  #[test]
  fn rejects_eight_bit_slave_address() {
    assert_eq!(
      Err(I2cMapError::ValueOutOfRange {
        field: "ADDR",
        value: 0x80,
        width: 7
      }),
      field_set(0, adr::ADDR, 0x80)
    );
  }

  #[test]
  fn clock_counts_are_half_words() {
    assert_eq!(0xFFFF, sclh::SCLH.mask());
    assert!(field_set(0, sclh::SCLH, 0xFFFF).is_ok());
    assert!(field_set(0, sclh::SCLH, 0x1_0000).is_err());
  }

  #[test]
  fn monitor_mode_bits() {
    let value = RegisterValue::<mmctrl::Mmctrl>::from_read(0xFFFF_FFFE);

    assert!(!value.is_set(mmctrl::MM_ENA));
    assert!(value.is_set(mmctrl::ENA_SCL));
    assert!(value.is_set(mmctrl::MATCH_ALL));
    assert_eq!(0x06, value.bits());
  }

  #[test]
  fn reading_masks_reserved_bits() {
    assert_eq!(0xA8, RegisterValue::<stat::Stat>::from_read(0xFFFF_FFAF).bits());
    assert_eq!(0x5A, RegisterValue::<dat::Dat>::from_read(0x1234_565A).bits());
  }

  #[test]
  fn layouts_match_register_table() {
    assert_eq!(conset::Conset::REGISTER.fields().len(), 5);
    assert_eq!(conclr::Conclr::REGISTER.fields().len(), 4);
    assert_eq!("STATUS", stat::Stat::REGISTER.fields()[0].name());
    assert_eq!(
      databuf::DATA.def(),
      databuf::DataBuf::REGISTER.fields()[0]
    );
  }

  #[test]
  fn fields_do_not_overlap() {
    for register in crate::Register::ALL.iter() {
      let fields = register.fields();
      for (i, a) in fields.iter().enumerate() {
        for b in fields.iter().skip(i + 1) {
          assert!(!a.overlaps(b), "{}.{} / {}", register.name(), a.name(), b.name());
        }
      }
    }
  }
}
