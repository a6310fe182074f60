use svd_parser::{Register as SvdRegister, RegisterInfo};

use crate::{
  clean_whitespace_opt,
  error::{I2cMapError, I2cMapResult},
  field::{defined_bits, FieldDef, FieldSpec, RegisterLayout},
  map,
  value::{AccessSpec, ModifiedWriteValuesSpec},
};

/// Byte offsets of every register from the peripheral base address.
pub mod offsets {
  pub const CONSET: u32 = 0x00;
  pub const STAT: u32 = 0x04;
  pub const DAT: u32 = 0x08;
  pub const ADR0: u32 = 0x0C;
  pub const SCLH: u32 = 0x10;
  pub const SCLL: u32 = 0x14;
  pub const CONCLR: u32 = 0x18;
  pub const MMCTRL: u32 = 0x1C;
  pub const ADR1: u32 = 0x20;
  pub const ADR2: u32 = 0x24;
  pub const ADR3: u32 = 0x28;
  pub const DATABUF: u32 = 0x2C;
  pub const MASK0: u32 = 0x30;
  pub const MASK1: u32 = 0x34;
  pub const MASK2: u32 = 0x38;
  pub const MASK3: u32 = 0x3C;

  /// Offset of the last register. The peripheral decodes nothing above it.
  pub const LAST: u32 = MASK3;
}

/// Bit width of every register on the peripheral.
pub const REGISTER_WIDTH: u32 = 32;

/// The registers of one I2C peripheral instance, in address order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
  Conset,
  Stat,
  Dat,
  Adr0,
  Sclh,
  Scll,
  Conclr,
  Mmctrl,
  Adr1,
  Adr2,
  Adr3,
  DataBuf,
  Mask0,
  Mask1,
  Mask2,
  Mask3,
}

/// How software is allowed to touch a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccessClass {
  /// Writing 1 sets the matching control bit, writing 0 does nothing.
  WriteOneToSet,
  /// Writing 1 clears the matching control bit, writing 0 does nothing.
  WriteOneToClear,
  /// Read-only status reported by hardware.
  Status,
  /// Bus data, shifted in or out by hardware.
  Data,
  /// Slave address or address mask.
  AddressMask,
  /// Plain read-write configuration.
  Config,
}

impl Register {
  pub const ALL: [Register; 16] = [
    Register::Conset,
    Register::Stat,
    Register::Dat,
    Register::Adr0,
    Register::Sclh,
    Register::Scll,
    Register::Conclr,
    Register::Mmctrl,
    Register::Adr1,
    Register::Adr2,
    Register::Adr3,
    Register::DataBuf,
    Register::Mask0,
    Register::Mask1,
    Register::Mask2,
    Register::Mask3,
  ];

  pub const fn offset(self) -> u32 {
    match self {
      Register::Conset => offsets::CONSET,
      Register::Stat => offsets::STAT,
      Register::Dat => offsets::DAT,
      Register::Adr0 => offsets::ADR0,
      Register::Sclh => offsets::SCLH,
      Register::Scll => offsets::SCLL,
      Register::Conclr => offsets::CONCLR,
      Register::Mmctrl => offsets::MMCTRL,
      Register::Adr1 => offsets::ADR1,
      Register::Adr2 => offsets::ADR2,
      Register::Adr3 => offsets::ADR3,
      Register::DataBuf => offsets::DATABUF,
      Register::Mask0 => offsets::MASK0,
      Register::Mask1 => offsets::MASK1,
      Register::Mask2 => offsets::MASK2,
      Register::Mask3 => offsets::MASK3,
    }
  }

  pub const fn name(self) -> &'static str {
    match self {
      Register::Conset => "CONSET",
      Register::Stat => "STAT",
      Register::Dat => "DAT",
      Register::Adr0 => "ADR0",
      Register::Sclh => "SCLH",
      Register::Scll => "SCLL",
      Register::Conclr => "CONCLR",
      Register::Mmctrl => "MMCTRL",
      Register::Adr1 => "ADR1",
      Register::Adr2 => "ADR2",
      Register::Adr3 => "ADR3",
      Register::DataBuf => "DATABUF",
      Register::Mask0 => "MASK0",
      Register::Mask1 => "MASK1",
      Register::Mask2 => "MASK2",
      Register::Mask3 => "MASK3",
    }
  }

  pub fn description(self) -> &'static str {
    match self {
      Register::Conset => {
        "I2C Control Set Register. Writing a one to a bit sets the corresponding bit in the I2C \
         control register. Writing a zero has no effect."
      }
      Register::Stat => {
        "I2C Status Register. Provides detailed status codes that allow software to determine \
         the next action needed."
      }
      Register::Dat => {
        "I2C Data Register. Holds the byte to transmit in transmit modes and the received byte \
         in receive modes."
      }
      Register::Adr0 | Register::Adr1 | Register::Adr2 | Register::Adr3 => {
        "I2C Slave Address Register. Holds the 7-bit slave address used in slave mode. The \
         least significant bit enables responses to the General Call address."
      }
      Register::Sclh => "SCL Duty Cycle Register High Half Word. Sets the high time of the I2C clock.",
      Register::Scll => {
        "SCL Duty Cycle Register Low Half Word. Sets the low time of the I2C clock. Together \
         with SCLH it determines the clock frequency generated by a master."
      }
      Register::Conclr => {
        "I2C Control Clear Register. Writing a one to a bit clears the corresponding bit in the \
         I2C control register. Writing a zero has no effect."
      }
      Register::Mmctrl => "Monitor mode control register.",
      Register::DataBuf => {
        "Data buffer register. Receives the 8 MSBs of the DAT shift register after every 9 bits \
         (8 data bits plus ACK or NACK) seen on the bus."
      }
      Register::Mask0 | Register::Mask1 | Register::Mask2 | Register::Mask3 => {
        "I2C Slave address mask register. Masks the bits of the paired ADR register when \
         checking for an address match. Has no effect on the General Call address."
      }
    }
  }

  pub const fn width(self) -> u32 {
    REGISTER_WIDTH
  }

  pub const fn access_class(self) -> AccessClass {
    match self {
      Register::Conset => AccessClass::WriteOneToSet,
      Register::Conclr => AccessClass::WriteOneToClear,
      Register::Stat => AccessClass::Status,
      Register::Dat | Register::DataBuf => AccessClass::Data,
      Register::Adr0
      | Register::Adr1
      | Register::Adr2
      | Register::Adr3
      | Register::Mask0
      | Register::Mask1
      | Register::Mask2
      | Register::Mask3 => AccessClass::AddressMask,
      Register::Sclh | Register::Scll | Register::Mmctrl => AccessClass::Config,
    }
  }

  pub const fn access(self) -> AccessSpec {
    match self {
      Register::Conset | Register::Conclr => AccessSpec::WriteOnly,
      Register::Stat | Register::DataBuf => AccessSpec::ReadOnly,
      _ => AccessSpec::ReadWrite,
    }
  }

  pub const fn modified_write_values(self) -> Option<ModifiedWriteValuesSpec> {
    match self {
      Register::Conset => Some(ModifiedWriteValuesSpec::OneToSet),
      Register::Conclr => Some(ModifiedWriteValuesSpec::OneToClear),
      _ => None,
    }
  }

  /// Value of the register after a device reset. CONCLR cannot be read and has none.
  pub const fn reset_value(self) -> Option<u32> {
    match self {
      Register::Conclr => None,
      Register::Stat => Some(0xF8),
      Register::Sclh | Register::Scll => Some(0x04),
      _ => Some(0x00),
    }
  }

  pub fn fields(self) -> &'static [FieldDef] {
    match self {
      Register::Conset => map::conset::Conset::FIELDS,
      Register::Stat => map::stat::Stat::FIELDS,
      Register::Dat => map::dat::Dat::FIELDS,
      Register::Adr0 | Register::Adr1 | Register::Adr2 | Register::Adr3 => map::adr::Adr::FIELDS,
      Register::Sclh => map::sclh::Sclh::FIELDS,
      Register::Scll => map::scll::Scll::FIELDS,
      Register::Conclr => map::conclr::Conclr::FIELDS,
      Register::Mmctrl => map::mmctrl::Mmctrl::FIELDS,
      Register::DataBuf => map::databuf::DataBuf::FIELDS,
      Register::Mask0 | Register::Mask1 | Register::Mask2 | Register::Mask3 => {
        map::mask::Mask::FIELDS
      }
    }
  }

  /// Looks up a field of this register by name.
  pub fn field(self, name: &str) -> I2cMapResult<&'static FieldDef> {
    self
      .fields()
      .iter()
      .find(|f| f.name().eq_ignore_ascii_case(name))
      .ok_or_else(|| I2cMapError::InvalidRegister(format!("{}.{}", self.name(), name)))
  }

  /// Bits that belong to some field of the register. The rest are reserved: software must
  /// write them as zero and ignore them on read.
  pub fn defined_bits(self) -> u32 {
    defined_bits(self.fields())
  }

  /// The family this register belongs to and its index in it, if any.
  pub const fn family(self) -> Option<(RegisterFamily, usize)> {
    match self {
      Register::Adr0 => Some((RegisterFamily::Adr, 0)),
      Register::Adr1 => Some((RegisterFamily::Adr, 1)),
      Register::Adr2 => Some((RegisterFamily::Adr, 2)),
      Register::Adr3 => Some((RegisterFamily::Adr, 3)),
      Register::Mask0 => Some((RegisterFamily::Mask, 0)),
      Register::Mask1 => Some((RegisterFamily::Mask, 1)),
      Register::Mask2 => Some((RegisterFamily::Mask, 2)),
      Register::Mask3 => Some((RegisterFamily::Mask, 3)),
      _ => None,
    }
  }

  /// The absolute address of this register on the instance at `base`.
  pub const fn address(self, base: u32) -> u32 {
    base.wrapping_add(self.offset())
  }

  /// Resolves a symbolic register name.
  ///
  /// Names are case-insensitive and may carry the `I2C_` prefix of the C headers or the `I2`
  /// prefix of the user manual (`I2C_CONSET`, `I2CONSET` and `conset` all resolve to
  /// `Register::Conset`). A family member with an index past the end of its family (`ADR4`,
  /// or one too large for `usize`) fails with `IndexOutOfRange`. Indices are written without
  /// leading zeros, so `ADR01` is an unknown name. Any other unknown name fails with
  /// `InvalidRegister`.
  pub fn from_name(name: &str) -> I2cMapResult<Register> {
    let upper = name.trim().to_ascii_uppercase();
    let invalid = || I2cMapError::InvalidRegister(name.to_owned());

    let bare = upper
      .strip_prefix("I2C_")
      .or_else(|| upper.strip_prefix("I2"))
      .unwrap_or(&upper);
    let (stem, digits) = bare.split_at(
      bare
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or_else(|| bare.len()),
    );

    if stem.is_empty()
      || !stem.bytes().all(|b| b.is_ascii_uppercase())
      || !digits.bytes().all(|b| b.is_ascii_digit())
    {
      return Err(invalid());
    }

    let family = match stem {
      "ADR" => Some(RegisterFamily::Adr),
      "MASK" => Some(RegisterFamily::Mask),
      _ => None,
    };

    match (family, digits) {
      (Some(_), "") => Err(invalid()),
      (Some(_), digits) if digits.len() > 1 && digits.starts_with('0') => Err(invalid()),
      (Some(family), digits) => family.member(digits.parse::<usize>().unwrap_or(usize::MAX)),
      (None, "") => Register::ALL
        .iter()
        .copied()
        .find(|r| r.name() == stem)
        .ok_or_else(invalid),
      (None, _) => Err(invalid()),
    }
  }
}

/// The absolute address of `register` on the peripheral instance at `base`.
pub const fn register_address(base: u32, register: Register) -> u32 {
  register.address(base)
}

/// The absolute address of the register called `name` on the instance at `base`.
pub fn register_address_by_name(base: u32, name: &str) -> I2cMapResult<u32> {
  Ok(Register::from_name(name)?.address(base))
}

/// Registers that come in indexed groups sharing one field layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegisterFamily {
  /// Slave address registers ADR0..ADR3.
  Adr,
  /// Slave address mask registers MASK0..MASK3.
  Mask,
}
impl RegisterFamily {
  /// Number of registers in every family.
  pub const LEN: usize = 4;

  pub const fn name(self) -> &'static str {
    match self {
      RegisterFamily::Adr => "ADR",
      RegisterFamily::Mask => "MASK",
    }
  }

  pub const fn members(self) -> [Register; RegisterFamily::LEN] {
    match self {
      RegisterFamily::Adr => [
        Register::Adr0,
        Register::Adr1,
        Register::Adr2,
        Register::Adr3,
      ],
      RegisterFamily::Mask => [
        Register::Mask0,
        Register::Mask1,
        Register::Mask2,
        Register::Mask3,
      ],
    }
  }

  /// Byte distance between consecutive members. ADR0 is the exception: it sits apart from
  /// ADR1..ADR3 at offset 0x0C.
  pub const fn stride(self) -> u32 {
    0x4
  }

  pub fn fields(self) -> &'static [FieldDef] {
    self.members()[0].fields()
  }

  /// The member at `index`. Fails with `IndexOutOfRange` unless `index < 4`.
  pub fn member(self, index: usize) -> I2cMapResult<Register> {
    self
      .members()
      .get(index)
      .copied()
      .ok_or(I2cMapError::IndexOutOfRange {
        family: self.name(),
        index,
        len: RegisterFamily::LEN,
      })
  }

  /// The absolute address of member `index` on the instance at `base`.
  pub fn address(self, base: u32, index: usize) -> I2cMapResult<u32> {
    Ok(self.member(index)?.address(base))
  }
}

/// Describes a register: where it lives, how it may be accessed and the fields it holds.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterSpec {
  preceding_path: String,
  base_address: u32,

  /// Name that identifies the register. Must be unique within the peripheral.
  pub name: String,

  /// Description of the details of the register. May describe its purpose, operation, and effects
  /// on other parts of the device.
  pub description: Option<String>,

  /// Register's starting address relative to the peripheral base address.
  pub address_offset: u32,

  /// The bit width of the register.
  pub size: Option<u32>,

  /// The value of the register after reset.
  pub reset_value: Option<u32>,

  /// The access rights of the register.
  pub access: Option<AccessSpec>,

  /// What the hardware does with the bits written to the register.
  pub modified_write_values: Option<ModifiedWriteValuesSpec>,

  /// The fields that exist on the register.
  pub fields: Vec<FieldSpec>,
}
impl RegisterSpec {
  pub(crate) fn new(
    r: &SvdRegister,
    preceding_path: &str,
    base_address: u32,
  ) -> I2cMapResult<Vec<Self>> {
    let specs: Vec<Self> = match r {
      SvdRegister::Single(ref ri) => {
        vec![Self::from_register_info(ri, preceding_path, base_address)?]
      }
      SvdRegister::Array(ref ri, ref d) => {
        let dim_indices = if let Some(ref di) = d.dim_index {
          if d.dim != di.len() as u32 {
            return Err(I2cMapError::description(&format!(
              "Register {}: 'dim' element must have the same value as the length of 'dimIndex'",
              &r.name
            )));
          }
          di.to_owned()
        } else {
          (0..d.dim).map(|v| v.to_string()).collect()
        };

        let prototype = Self::from_register_info(ri, preceding_path, base_address)?;
        let mut register_specs = Vec::with_capacity(d.dim as usize);

        for (n, dim_index) in dim_indices.iter().enumerate() {
          let mut spec = prototype.clone();
          spec.interpolate_array_params(
            dim_index.clone(),
            prototype.address_offset + n as u32 * d.dim_increment,
          );
          register_specs.push(spec);
        }

        register_specs
      }
    };

    Ok(specs)
  }

  /// Describes one register of the built-in map on the instance at `base_address`.
  pub fn from_register(register: Register, preceding_path: &str, base_address: u32) -> Self {
    let mut spec = Self {
      preceding_path: preceding_path.to_owned(),
      base_address,
      name: register.name().to_owned(),
      description: Some(register.description().to_owned()),
      address_offset: register.offset(),
      size: Some(register.width()),
      reset_value: register.reset_value(),
      access: Some(register.access()),
      modified_write_values: register.modified_write_values(),
      fields: Vec::new(),
    };

    spec.fields = register
      .fields()
      .iter()
      .map(|f| {
        FieldSpec::from_def(
          f,
          &spec.path(),
          spec.address(),
          register.access(),
          register.modified_write_values(),
        )
      })
      .collect();

    spec
  }

  /// The memory address of this register
  pub fn address(&self) -> u32 {
    self.base_address.wrapping_add(self.address_offset)
  }

  /// The full path to this register.
  pub fn path(&self) -> String {
    format!("{}.{}", self.preceding_path, self.name)
  }

  /// The bit width of the register, defaulting to the peripheral's 32 bits.
  pub fn size_or_default(&self) -> u32 {
    self.size.unwrap_or(REGISTER_WIDTH)
  }

  /// OR of the masks of all fields. Bits outside of it are reserved.
  pub fn defined_bits(&self) -> u32 {
    self.fields.iter().fold(0, |bits, f| bits | f.mask())
  }

  pub fn field(&self, name: &str) -> Option<&FieldSpec> {
    self.fields.iter().find(|f| f.name == name)
  }

  pub(crate) fn propagate_default_properties(
    &mut self,
    size: &Option<u32>,
    access: &Option<AccessSpec>,
  ) -> bool {
    let mut changed = false;

    if self.size.is_none() && size.is_some() {
      self.size = *size;
      changed = true;
    }

    if self.access.is_none() && access.is_some() {
      self.access = *access;
      changed = true;
    }

    for field in self.fields.iter_mut() {
      if field.propagate_default_properties(&self.access, &self.modified_write_values) {
        changed = true;
      }
    }

    changed
  }

  fn from_register_info(
    ri: &RegisterInfo,
    preceding_path: &str,
    base_address: u32,
  ) -> I2cMapResult<Self> {
    let mut register = Self {
      preceding_path: preceding_path.to_owned(),
      base_address,
      name: ri.name.clone(),
      description: clean_whitespace_opt(ri.description.clone())?,
      address_offset: ri.address_offset,
      size: ri.size,
      reset_value: ri.reset_value,
      access: ri.access.as_ref().map(AccessSpec::new),
      modified_write_values: ri
        .modified_write_values
        .as_ref()
        .map(ModifiedWriteValuesSpec::new),
      fields: Vec::new(),
    };

    register.fields = {
      let mut field_specs: Vec<FieldSpec> = Vec::new();

      if let Some(ref fields) = ri.fields {
        for f in fields.iter() {
          field_specs.extend(FieldSpec::new(f, &register.path(), register.address())?);
        }
      }

      field_specs
    };

    Ok(register)
  }

  fn interpolate_array_params(&mut self, index: String, address_offset: u32) {
    self.name = self.name.replace("%s", &index);

    if let Some(desc) = self.description.clone() {
      self.description = Some(desc.replace("%s", &index));
    }

    self.address_offset = address_offset;

    let self_address = self.address();
    let self_path = self.path();
    for field in self.fields.iter_mut() {
      field.rebase(&self_path, self_address);
    }
  }
}
