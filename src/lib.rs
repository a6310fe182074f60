//! Register and bit-field map of the LPC17xx I2C controller.
//!
//! The map names every register of the I2C block, its byte offset from the peripheral base
//! address, and the position and width of every field inside it. Fields are typed by the
//! register they belong to, so a `stat::STATUS` cannot be read out of a CONSET value.
//!
//! ```
//! use lpc17xx_i2c_map::{map::stat, ControlBit, RegisterValue, I2C0};
//!
//! let start = I2C0.request_set(ControlBit::Sta);
//! assert_eq!((0x4001_C000, 0x20), (start.address, start.value));
//!
//! let status = RegisterValue::<stat::Stat>::from_read(0xA8);
//! assert_eq!(0x15, status.get(stat::STATUS));
//! ```
//!
//! The same map can be loaded from, and checked against, a CMSIS-SVD `<peripheral>` description
//! with `PeripheralSpec`.

use regex::Regex;

mod control;
mod error;
mod field;
mod instance;
pub mod map;
mod peripheral;
mod register;
mod value;

pub use control::{ClearFlags, ControlBit, ControlFlags};
pub use error::{I2cMapError, I2cMapResult};
pub use field::{
  defined_bits, field_get, field_set, Field, FieldDef, FieldSpec, RegisterLayout, RegisterValue,
};
pub use instance::{
  I2cInstance, RegisterWrite, I2C0, I2C0_BASE, I2C1, I2C1_BASE, I2C2, I2C2_BASE,
};
pub use peripheral::PeripheralSpec;
pub use register::{
  offsets, register_address, register_address_by_name, AccessClass, Register, RegisterFamily,
  RegisterSpec, REGISTER_WIDTH,
};
pub use value::{AccessSpec, FieldRole, ModifiedWriteValuesSpec};

/// Collapses runs of whitespace in an SVD description into single spaces.
pub(crate) fn clean_whitespace_opt(s: Option<String>) -> I2cMapResult<Option<String>> {
  match s {
    Some(s) => Ok(Some(clean_whitespace(&s)?)),
    None => Ok(None),
  }
}

fn clean_whitespace(s: &str) -> I2cMapResult<String> {
  let re = Regex::new(r"\s+")?;
  Ok(re.replace_all(s.trim(), " ").into_owned())
}

#[cfg(test)]
mod tests {
  use super::clean_whitespace_opt;

  #[test]
  fn collapses_whitespace() {
    assert_eq!(
      Some("Master and slave modes".to_string()),
      clean_whitespace_opt(Some("  Master and\n\t  slave   modes\n".to_string())).unwrap()
    );
    assert_eq!(None, clean_whitespace_opt(None).unwrap());
  }
}
