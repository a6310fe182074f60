use anyhow::Error as AnyhowError;
use std::{error::Error, fmt};

/// Convenience type for a result that may contain an `I2cMapError`.
pub type I2cMapResult<T> = std::result::Result<T, I2cMapError>;

/// Error enum for all errors returned by this crate or the crates on which it depends.
///
/// All variants describe programmer or configuration mistakes. Nothing in this crate performs
/// I/O, so there is nothing to retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum I2cMapError {
  /// A symbolic register or field name that is not part of the I2C register map.
  InvalidRegister(String),

  /// A value that does not fit in the bit width of the field it was written to.
  ValueOutOfRange {
    /// Name of the field.
    field: &'static str,
    /// The rejected value.
    value: u32,
    /// Bit width of the field.
    width: u8,
  },

  /// An index outside of an indexed register family such as ADR0..ADR3.
  IndexOutOfRange {
    /// Name of the register family.
    family: &'static str,
    /// The rejected index.
    index: usize,
    /// Number of members in the family.
    len: usize,
  },

  /// A register map description (built-in or imported from SVD) that breaks a layout
  /// invariant or could not be parsed.
  InvalidDescription(String),
}
impl I2cMapError {
  pub(crate) fn description(msg: &str) -> I2cMapError {
    I2cMapError::InvalidDescription(msg.to_string())
  }
}
impl fmt::Display for I2cMapError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      I2cMapError::InvalidRegister(name) => write!(f, "'{}' is not an I2C register or field", name),
      I2cMapError::ValueOutOfRange {
        field,
        value,
        width,
      } => write!(
        f,
        "value {:#x} does not fit in the {}-bit field {}",
        value, width, field
      ),
      I2cMapError::IndexOutOfRange { family, index, len } => write!(
        f,
        "index {} is outside of register family {} (0..{})",
        index, family, len
      ),
      I2cMapError::InvalidDescription(details) => write!(f, "{}", details),
    }
  }
}
impl Error for I2cMapError {}
impl From<AnyhowError> for I2cMapError {
  fn from(err: AnyhowError) -> Self {
    I2cMapError::description(&format!("anyhow::Error {:?}", err))
  }
}
impl From<regex::Error> for I2cMapError {
  fn from(err: regex::Error) -> Self {
    I2cMapError::description(&format!("regex::Error {:?}", err))
  }
}
impl From<xmltree::ParseError> for I2cMapError {
  fn from(err: xmltree::ParseError) -> Self {
    I2cMapError::description(&format!("xmltree::ParseError {}", err))
  }
}

#[cfg(test)]
mod tests {
  use super::I2cMapError;

  #[test]
  fn displays_value_out_of_range() {
    let err = I2cMapError::ValueOutOfRange {
      field: "ADDR",
      value: 0x80,
      width: 7,
    };

    assert_eq!("value 0x80 does not fit in the 7-bit field ADDR", err.to_string());
  }

  #[test]
  fn displays_index_out_of_range() {
    let err = I2cMapError::IndexOutOfRange {
      family: "MASK",
      index: 4,
      len: 4,
    };

    assert_eq!(
      "index 4 is outside of register family MASK (0..4)",
      err.to_string()
    );
  }

  #[test]
  fn converts_anyhow_errors_to_descriptions() {
    let err: I2cMapError = anyhow::anyhow!("bad svd").into();

    match err {
      I2cMapError::InvalidDescription(details) => assert!(details.contains("bad svd")),
      other => panic!("unexpected error {:?}", other),
    }
  }
}
