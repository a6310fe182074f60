use std::collections::HashMap;

use svd_parser::{parse::Parse, Peripheral, RegisterCluster};
use xmltree::Element;

use crate::{
  clean_whitespace_opt,
  error::{I2cMapError, I2cMapResult},
  field::FieldSpec,
  instance::I2cInstance,
  register::{offsets, Register, RegisterFamily, RegisterSpec},
  value::AccessSpec,
};

/// Describes a whole I2C peripheral instance: its base address and every register on it.
///
/// A description comes either from the built-in map or from a CMSIS-SVD `<peripheral>`
/// element, and two descriptions can be checked against each other.
#[derive(Debug, Clone, PartialEq)]
pub struct PeripheralSpec {
  /// Name of the peripheral instance, e.g. `I2C0`.
  pub name: String,

  /// Overview of the purpose and functionality of the peripheral.
  pub description: Option<String>,

  /// Lowest address reserved or used by the peripheral.
  pub base_address: u32,

  /// Default bit-width of any register contained in this peripheral.
  pub default_register_size: Option<u32>,

  /// Default access rights for any register contained in this peripheral.
  pub default_register_access: Option<AccessSpec>,

  /// Registers that exist on this peripheral, in the order they were declared.
  pub registers: Vec<RegisterSpec>,
}
impl PeripheralSpec {
  /// Describes the built-in register map placed at `instance`.
  pub fn builtin(name: &str, instance: I2cInstance) -> Self {
    Self {
      name: name.to_owned(),
      description: Some("Inter-Integrated Circuit (I2C) bus interface".to_owned()),
      base_address: instance.base(),
      default_register_size: Some(crate::register::REGISTER_WIDTH),
      default_register_access: Some(AccessSpec::ReadWrite),
      registers: Register::ALL
        .iter()
        .map(|r| RegisterSpec::from_register(*r, name, instance.base()))
        .collect(),
    }
  }

  /// Parses a CMSIS-SVD `<peripheral>` element. Register arrays are expanded.
  pub fn from_xml(xml: &str) -> I2cMapResult<Self> {
    let el = Element::parse(xml.as_bytes())?;
    Self::new(&Peripheral::parse(&el)?)
  }

  pub fn new(p: &Peripheral) -> I2cMapResult<Self> {
    let mut peripheral = Self {
      name: p.name.clone(),
      description: clean_whitespace_opt(p.description.clone())?,
      base_address: p.base_address,
      default_register_size: p.default_register_properties.size,
      default_register_access: p
        .default_register_properties
        .access
        .as_ref()
        .map(AccessSpec::new),
      registers: Vec::new(),
    };

    if let Some(ref register_clusters) = p.registers {
      for rc in register_clusters.iter() {
        match rc {
          RegisterCluster::Register(ref r) => {
            let registers = RegisterSpec::new(r, &peripheral.name, peripheral.base_address)?;
            peripheral.registers.extend(registers);
          }
          RegisterCluster::Cluster(ref c) => {
            return Err(I2cMapError::description(&format!(
              "Peripheral {}: register cluster '{}' is not part of the I2C register map",
              p.name, c.name
            )))
          }
        }
      }
    }

    while peripheral.propagate_default_register_properties() {}

    Ok(peripheral)
  }

  /// Iterates all the registers of this peripheral.
  pub fn iter_registers(&self) -> impl Iterator<Item = &RegisterSpec> {
    self.registers.iter()
  }

  /// Iterates all the register fields of this peripheral.
  pub fn iter_fields(&self) -> impl Iterator<Item = &FieldSpec> {
    self.registers.iter().flat_map(|r| r.fields.iter())
  }

  /// Looks up a register by name. Names resolve the same way `Register::from_name` resolves
  /// them, so `I2CONSET` finds a register declared as `CONSET`.
  pub fn get_register(&self, name: &str) -> I2cMapResult<&RegisterSpec> {
    if let Some(r) = self.registers.iter().find(|r| r.name == name) {
      return Ok(r);
    }

    let wanted = Register::from_name(name)?;
    self
      .registers
      .iter()
      .find(|r| Register::from_name(&r.name).ok() == Some(wanted))
      .ok_or_else(|| I2cMapError::InvalidRegister(format!("{}.{}", self.name, name)))
  }

  /// The full path of this peripheral.
  pub fn path(&self) -> String {
    self.name.clone()
  }

  /// Checks the layout invariants of the I2C register map:
  ///
  /// * registers are 32 bits wide, word aligned, inside offsets 0x00..=0x3C and do not overlap
  /// * register names are unique
  /// * fields lie inside their register and do not overlap each other
  /// * members of the ADR and MASK families share one field layout
  pub fn validate(&self) -> I2cMapResult<()> {
    let mut by_offset: Vec<&RegisterSpec> = self.registers.iter().collect();
    by_offset.sort_by_key(|r| r.address_offset);

    for register in by_offset.iter() {
      let size = register.size_or_default();

      if size != crate::register::REGISTER_WIDTH {
        return Err(I2cMapError::description(&format!(
          "Register {} is {} bits wide, expected {}",
          register.path(),
          size,
          crate::register::REGISTER_WIDTH
        )));
      }

      if register.address_offset % 4 != 0 || register.address_offset > offsets::LAST {
        return Err(I2cMapError::description(&format!(
          "Register {} at offset {:#x} is outside the word-aligned window 0x00..={:#x}",
          register.path(),
          register.address_offset,
          offsets::LAST
        )));
      }

      let fields = &register.fields;
      if let Some(field) = fields.iter().find(|f| !f.fits_in(size)) {
        return Err(I2cMapError::description(&format!(
          "Field {} (bits {}+{}) does not fit in {} bits",
          field.path(),
          field.offset,
          field.width,
          size
        )));
      }

      for (i, field) in fields.iter().enumerate() {
        if let Some(other) = fields.iter().skip(i + 1).find(|f| f.overlaps(field)) {
          return Err(I2cMapError::description(&format!(
            "Fields {} and {} overlap",
            field.path(),
            other.path()
          )));
        }
      }
    }

    for pair in by_offset.windows(2) {
      let end = pair[0].address_offset + pair[0].size_or_default() / 8;
      if end > pair[1].address_offset {
        return Err(I2cMapError::description(&format!(
          "Registers {} and {} overlap",
          pair[0].path(),
          pair[1].path()
        )));
      }
    }

    for (i, register) in self.registers.iter().enumerate() {
      if let Some(other) = self
        .registers
        .iter()
        .skip(i + 1)
        .find(|r| r.name == register.name)
      {
        return Err(I2cMapError::description(&format!(
          "Register {} is declared twice (offsets {:#x} and {:#x})",
          register.path(),
          register.address_offset,
          other.address_offset
        )));
      }
    }

    self.validate_families()
  }

  /// Checks that every register of `self` exists in `other` with the same offset, size, access
  /// and fields, and that `other` has no registers `self` lacks. Fails with
  /// `InvalidDescription` naming the first difference.
  pub fn verify_against(&self, other: &PeripheralSpec) -> I2cMapResult<()> {
    for register in self.registers.iter() {
      let theirs = other.get_register(&register.name).map_err(|_| {
        I2cMapError::description(&format!(
          "Register {} is missing from {}",
          register.path(),
          other.path()
        ))
      })?;

      if register.address_offset != theirs.address_offset {
        return Err(I2cMapError::description(&format!(
          "Register {} is at offset {:#x} but {} has it at {:#x}",
          register.path(),
          register.address_offset,
          theirs.path(),
          theirs.address_offset
        )));
      }

      if register.size_or_default() != theirs.size_or_default() {
        return Err(I2cMapError::description(&format!(
          "Register {} is {} bits wide but {} is {}",
          register.path(),
          register.size_or_default(),
          theirs.path(),
          theirs.size_or_default()
        )));
      }

      if let (Some(ours), Some(their_access)) = (register.access, theirs.access) {
        if ours != their_access {
          return Err(I2cMapError::description(&format!(
            "Register {} has access {:?} but {} has {:?}",
            register.path(),
            ours,
            theirs.path(),
            their_access
          )));
        }
      }

      if let (Some(ours), Some(their_mwv)) =
        (register.modified_write_values, theirs.modified_write_values)
      {
        if ours != their_mwv {
          return Err(I2cMapError::description(&format!(
            "Register {} handles writes as {:?} but {} as {:?}",
            register.path(),
            ours,
            theirs.path(),
            their_mwv
          )));
        }
      }

      verify_fields(register, theirs)?;
    }

    if let Some(extra) = other
      .registers
      .iter()
      .find(|r| self.get_register(&r.name).is_err())
    {
      return Err(I2cMapError::description(&format!(
        "Register {} is not part of {}",
        extra.path(),
        self.path()
      )));
    }

    Ok(())
  }

  fn validate_families(&self) -> I2cMapResult<()> {
    let mut layouts: HashMap<RegisterFamily, &RegisterSpec> = HashMap::new();

    for register in self.registers.iter() {
      let family = match Register::from_name(&register.name).map(|r| r.family()) {
        Ok(Some((family, _))) => family,
        _ => continue,
      };

      match layouts.get(&family) {
        Some(first) => {
          if field_layout(first) != field_layout(register) {
            return Err(I2cMapError::description(&format!(
              "Registers {} and {} belong to family {} but have different fields",
              first.path(),
              register.path(),
              family.name()
            )));
          }
        }
        None => {
          layouts.insert(family, register);
        }
      }
    }

    Ok(())
  }

  fn propagate_default_register_properties(&mut self) -> bool {
    let mut changed = false;

    for register in self.registers.iter_mut() {
      if register.propagate_default_properties(
        &self.default_register_size,
        &self.default_register_access,
      ) {
        changed = true;
      }
    }

    changed
  }
}

fn field_layout(register: &RegisterSpec) -> Vec<(&str, u32, u32)> {
  let mut layout: Vec<(&str, u32, u32)> = register
    .fields
    .iter()
    .map(|f| (f.name.as_str(), f.offset, f.width))
    .collect();
  layout.sort();
  layout
}

fn verify_fields(ours: &RegisterSpec, theirs: &RegisterSpec) -> I2cMapResult<()> {
  for field in ours.fields.iter() {
    let their_field = theirs.field(&field.name).ok_or_else(|| {
      I2cMapError::description(&format!(
        "Field {} is missing from {}",
        field.path(),
        theirs.path()
      ))
    })?;

    if field.offset != their_field.offset || field.width != their_field.width {
      return Err(I2cMapError::description(&format!(
        "Field {} covers bits {}+{} but {} covers bits {}+{}",
        field.path(),
        field.offset,
        field.width,
        their_field.path(),
        their_field.offset,
        their_field.width
      )));
    }
  }

  if let Some(extra) = theirs.fields.iter().find(|f| ours.field(&f.name).is_none()) {
    return Err(I2cMapError::description(&format!(
      "Field {} is not part of {}",
      extra.path(),
      ours.path()
    )));
  }

  Ok(())
}
