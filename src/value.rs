use svd_parser::{Access, ModifiedWriteValues};

/// Read/write rights of a register or field, in the terms CMSIS-SVD uses for them.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccessSpec {
  ReadOnly,
  ReadWrite,
  ReadWriteOnce,
  WriteOnce,
  WriteOnly,
}
impl AccessSpec {
  pub fn new(access: &Access) -> AccessSpec {
    match access {
      Access::ReadOnly => AccessSpec::ReadOnly,
      Access::ReadWrite => AccessSpec::ReadWrite,
      Access::ReadWriteOnce => AccessSpec::ReadWriteOnce,
      Access::WriteOnce => AccessSpec::WriteOnce,
      Access::WriteOnly => AccessSpec::WriteOnly,
    }
  }

  pub fn can_read(&self) -> bool {
    match self {
      AccessSpec::ReadOnly | AccessSpec::ReadWrite | AccessSpec::ReadWriteOnce => true,
      _ => false,
    }
  }

  pub fn can_write(&self) -> bool {
    match self {
      AccessSpec::ReadWrite
      | AccessSpec::ReadWriteOnce
      | AccessSpec::WriteOnce
      | AccessSpec::WriteOnly => true,
      _ => false,
    }
  }
}

/// What the hardware does with a value written to a register or field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModifiedWriteValuesSpec {
  OneToClear,
  OneToSet,
  OneToToggle,
  ZeroToClear,
  ZeroToSet,
  ZeroToToggle,
  Clear,
  Set,
  Modify,
}
impl ModifiedWriteValuesSpec {
  pub fn new(mwv: &ModifiedWriteValues) -> Self {
    match mwv {
      ModifiedWriteValues::OneToClear => ModifiedWriteValuesSpec::OneToClear,
      ModifiedWriteValues::OneToSet => ModifiedWriteValuesSpec::OneToSet,
      ModifiedWriteValues::OneToToggle => ModifiedWriteValuesSpec::OneToToggle,

      ModifiedWriteValues::ZeroToClear => ModifiedWriteValuesSpec::ZeroToClear,
      ModifiedWriteValues::ZeroToSet => ModifiedWriteValuesSpec::ZeroToSet,
      ModifiedWriteValues::ZeroToToggle => ModifiedWriteValuesSpec::ZeroToToggle,

      ModifiedWriteValues::Clear => ModifiedWriteValuesSpec::Clear,
      ModifiedWriteValues::Set => ModifiedWriteValuesSpec::Set,
      ModifiedWriteValues::Modify => ModifiedWriteValuesSpec::Modify,
    }
  }

  /// Whether writing a zero to a bit with this behavior leaves the bit unchanged.
  pub fn zero_is_no_op(&self) -> bool {
    match self {
      ModifiedWriteValuesSpec::OneToClear
      | ModifiedWriteValuesSpec::OneToSet
      | ModifiedWriteValuesSpec::OneToToggle => true,
      _ => false,
    }
  }
}

/// What a field's bits mean to the driver that reads or writes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FieldRole {
  /// A single bit reporting or requesting a condition.
  Flag,
  /// A single bit switching a hardware function on or off.
  Enable,
  /// A hardware-defined status code. Its meaning belongs to the bus protocol state machine.
  StatusCode,
  /// A 7-bit slave address or address mask.
  Address,
  /// A byte of bus data.
  Data,
  /// A count of peripheral clock cycles.
  ClockCount,
}

#[cfg(test)]
mod tests {
  use super::{AccessSpec, ModifiedWriteValuesSpec};

  #[test]
  fn write_only_cannot_be_read() {
    assert!(!AccessSpec::WriteOnly.can_read());
    assert!(AccessSpec::WriteOnly.can_write());
    assert!(AccessSpec::ReadOnly.can_read());
    assert!(!AccessSpec::ReadOnly.can_write());
  }

  #[test]
  fn set_and_clear_ignore_zeroes() {
    assert!(ModifiedWriteValuesSpec::OneToSet.zero_is_no_op());
    assert!(ModifiedWriteValuesSpec::OneToClear.zero_is_no_op());
    assert!(!ModifiedWriteValuesSpec::Modify.zero_is_no_op());
  }
}
