use std::{fmt, marker::PhantomData, ops::Deref};

use svd_parser::{Field as SvdField, FieldInfo};

use crate::{
  clean_whitespace_opt,
  error::{I2cMapError, I2cMapResult},
  value::{AccessSpec, FieldRole, ModifiedWriteValuesSpec},
};

/// Compile-time description of a bit field: its name, where it sits in a 32-bit register, and
/// what its bits mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FieldDef {
  name: &'static str,
  description: &'static str,
  offset: u8,
  width: u8,
  role: FieldRole,
}
impl FieldDef {
  /// Describes the field occupying bits `offset + width - 1` down to `offset`.
  ///
  /// Panics (at compile time when used in a constant) if the field is empty or does not fit in
  /// a 32-bit register.
  pub const fn new(name: &'static str, offset: u8, width: u8, role: FieldRole) -> Self {
    assert!(width > 0, "bit field must be at least one bit wide");
    assert!(
      offset as u32 + width as u32 <= 32,
      "bit field must lie inside a 32-bit register"
    );

    Self {
      name,
      description: "",
      offset,
      width,
      role,
    }
  }

  pub const fn with_description(self, description: &'static str) -> Self {
    Self {
      description,
      ..self
    }
  }

  pub const fn name(&self) -> &'static str {
    self.name
  }

  pub const fn description(&self) -> &'static str {
    self.description
  }

  /// The position of the least-significant bit of this field within its register.
  pub const fn shift(&self) -> u8 {
    self.offset
  }

  /// The position of the most-significant bit of this field within its register.
  pub const fn high(&self) -> u8 {
    self.offset + self.width - 1
  }

  pub const fn width(&self) -> u8 {
    self.width
  }

  pub const fn role(&self) -> FieldRole {
    self.role
  }

  /// The largest value the field can hold.
  pub const fn max_value(&self) -> u32 {
    u32::MAX >> (32 - self.width as u32)
  }

  /// The bit mask for reading/writing this field on the parent register.
  pub const fn mask(&self) -> u32 {
    self.max_value() << self.offset
  }

  /// Extracts this field from a full register value.
  pub const fn get(&self, register_value: u32) -> u32 {
    (register_value & self.mask()) >> self.offset
  }

  /// Returns `register_value` with this field replaced by `value`. Bits outside the field are
  /// left untouched.
  pub fn set(&self, register_value: u32, value: u32) -> I2cMapResult<u32> {
    if value > self.max_value() {
      return Err(I2cMapError::ValueOutOfRange {
        field: self.name,
        value,
        width: self.width,
      });
    }

    Ok((register_value & !self.mask()) | ((value << self.offset) & self.mask()))
  }

  pub const fn overlaps(&self, other: &FieldDef) -> bool {
    self.mask() & other.mask() != 0
  }
}

/// OR of the masks of every field in `fields`. Bits outside of it are reserved.
pub const fn defined_bits(fields: &[FieldDef]) -> u32 {
  let mut bits = 0;
  let mut i = 0;
  while i < fields.len() {
    bits |= fields[i].mask();
    i += 1;
  }
  bits
}

/// Layout shared by every register (or register family) that owns a set of fields.
pub trait RegisterLayout {
  /// Name of the register or register family.
  const NAME: &'static str;

  /// All the fields defined on the register.
  const FIELDS: &'static [FieldDef];

  /// Bits that belong to some field. Everything else is reserved.
  fn defined_bits() -> u32 {
    defined_bits(Self::FIELDS)
  }
}

/// A bit field bound to the register it lives in. The register is only a type parameter, so
/// a field of one register cannot be used on a value of another.
pub struct Field<R> {
  def: FieldDef,
  register: PhantomData<fn() -> R>,
}
impl<R> Field<R> {
  pub const fn new(def: FieldDef) -> Self {
    Self {
      def,
      register: PhantomData,
    }
  }

  pub const fn def(&self) -> FieldDef {
    self.def
  }
}
impl<R> Clone for Field<R> {
  fn clone(&self) -> Self {
    *self
  }
}
impl<R> Copy for Field<R> {}
impl<R> PartialEq for Field<R> {
  fn eq(&self, other: &Self) -> bool {
    self.def == other.def
  }
}
impl<R> Eq for Field<R> {}
impl<R> fmt::Debug for Field<R> {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.debug_tuple("Field").field(&self.def).finish()
  }
}
impl<R> Deref for Field<R> {
  type Target = FieldDef;

  fn deref(&self) -> &FieldDef {
    &self.def
  }
}

/// Extracts `field` from `register_value`. Never fails; the result is at most
/// `field.max_value()`.
pub fn field_get<R>(register_value: u32, field: Field<R>) -> u32 {
  field.get(register_value)
}

/// Replaces `field` in `register_value` with `value`, preserving every other bit.
///
/// Fails with `ValueOutOfRange` if `value` does not fit in the field.
pub fn field_set<R>(register_value: u32, field: Field<R>, value: u32) -> I2cMapResult<u32> {
  field.set(register_value, value)
}

/// A register value that only accepts fields of register `R`.
pub struct RegisterValue<R> {
  bits: u32,
  register: PhantomData<fn() -> R>,
}
impl<R: RegisterLayout> RegisterValue<R> {
  /// A value with every field cleared.
  pub fn zero() -> Self {
    Self::from_bits(0)
  }

  /// Wraps a value read from hardware. Reserved bits are undefined on read and are masked out.
  pub fn from_read(raw: u32) -> Self {
    Self::from_bits(raw & R::defined_bits())
  }

  fn from_bits(bits: u32) -> Self {
    Self {
      bits,
      register: PhantomData,
    }
  }

  /// The raw value. Reserved bits are always zero.
  pub fn bits(&self) -> u32 {
    self.bits
  }

  pub fn get(&self, field: Field<R>) -> u32 {
    field.get(self.bits)
  }

  pub fn is_set(&self, field: Field<R>) -> bool {
    field.get(self.bits) != 0
  }

  pub fn set(self, field: Field<R>, value: u32) -> I2cMapResult<Self> {
    Ok(Self::from_bits(field.set(self.bits, value)?))
  }
}
impl<R> Clone for RegisterValue<R> {
  fn clone(&self) -> Self {
    *self
  }
}
impl<R> Copy for RegisterValue<R> {}
impl<R> PartialEq for RegisterValue<R> {
  fn eq(&self, other: &Self) -> bool {
    self.bits == other.bits
  }
}
impl<R> Eq for RegisterValue<R> {}
impl<R: RegisterLayout> fmt::Debug for RegisterValue<R> {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}({:#010x})", R::NAME, self.bits)
  }
}

/// Describes a field on a register.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
  preceding_path: String,
  base_address: u32,

  /// A name that identfies the field. Must be unique within the parent register.
  pub name: String,

  /// Description of the field's usage, purpose, and/or operation.
  pub description: Option<String>,

  /// The position of the least-significant bit of this field within its register.
  pub offset: u32,

  /// The bit width of the field.
  pub width: u32,

  /// The access rights to the field.
  pub access: Option<AccessSpec>,

  /// Describes the manipulation of data written to this field. If `None`, the value written to
  /// the field is the value stored in the field.
  pub modified_write_values: Option<ModifiedWriteValuesSpec>,

  /// What the field's bits mean. Only known for fields of the built-in map.
  pub role: Option<FieldRole>,
}
impl FieldSpec {
  pub(crate) fn new(
    f: &SvdField,
    preceding_path: &str,
    base_address: u32,
  ) -> I2cMapResult<Vec<Self>> {
    let specs: Vec<Self> = match f {
      SvdField::Single(ref fi) => vec![Self::from_field_info(fi, preceding_path, base_address)?],
      SvdField::Array(ref fi, ref d) => {
        let dim_indices = if let Some(ref di) = d.dim_index {
          if d.dim != di.len() as u32 {
            return Err(I2cMapError::description(&format!(
              "Field {}: 'dim' element must have the same value as the length of 'dimIndex'",
              &f.name
            )));
          }
          di.to_owned()
        } else {
          (0..d.dim).map(|v| v.to_string()).collect()
        };

        let prototype = Self::from_field_info(fi, preceding_path, base_address)?;
        let mut field_specs = Vec::with_capacity(d.dim as usize);

        for (n, dim_index) in dim_indices.iter().enumerate() {
          let mut spec = prototype.clone();
          spec.interpolate_array_params(
            dim_index.clone(),
            prototype.offset + n as u32 * d.dim_increment,
          );
          field_specs.push(spec);
        }

        field_specs
      }
    };

    Ok(specs)
  }

  pub(crate) fn from_def(
    def: &FieldDef,
    preceding_path: &str,
    base_address: u32,
    access: AccessSpec,
    modified_write_values: Option<ModifiedWriteValuesSpec>,
  ) -> Self {
    Self {
      preceding_path: preceding_path.to_owned(),
      base_address,
      name: def.name().to_owned(),
      description: match def.description() {
        "" => None,
        d => Some(d.to_owned()),
      },
      offset: def.shift() as u32,
      width: def.width() as u32,
      access: Some(access),
      modified_write_values,
      role: Some(def.role()),
    }
  }

  /// Whether this field is readable
  pub fn can_read(&self) -> bool {
    match self.access {
      Some(a) => a.can_read(),
      None => true,
    }
  }

  /// Whether this field is writable
  pub fn can_write(&self) -> bool {
    match self.access {
      Some(a) => a.can_write(),
      None => true,
    }
  }

  /// The bit mask for reading/writing this field on the parent register. Bits that fall past
  /// bit 31 are dropped.
  pub fn mask(&self) -> u32 {
    let bits = match self.width {
      0 => 0,
      w if w >= 32 => u32::MAX,
      w => u32::MAX >> (32 - w),
    };
    bits.checked_shl(self.offset).unwrap_or(0)
  }

  /// Whether the field stays inside a register of `size` bits.
  pub fn fits_in(&self, size: u32) -> bool {
    self.width > 0
      && self
        .offset
        .checked_add(self.width)
        .map_or(false, |end| end <= size)
  }

  pub fn overlaps(&self, other: &FieldSpec) -> bool {
    self.mask() & other.mask() != 0
  }

  /// The memory address of this field's parent register
  pub fn address(&self) -> u32 {
    self.base_address
  }

  /// The full path to this field.
  pub fn path(&self) -> String {
    format!("{}.{}", self.preceding_path, self.name)
  }

  pub fn parent_path(&self) -> String {
    self.preceding_path.clone()
  }

  pub(crate) fn rebase(&mut self, preceding_path: &str, base_address: u32) {
    self.preceding_path = preceding_path.to_owned();
    self.base_address = base_address;
  }

  pub(crate) fn propagate_default_properties(
    &mut self,
    access: &Option<AccessSpec>,
    modified_write_values: &Option<ModifiedWriteValuesSpec>,
  ) -> bool {
    let mut changed = false;

    if self.access.is_none() && access.is_some() {
      self.access = *access;
      changed = true;
    }

    if self.modified_write_values.is_none() && modified_write_values.is_some() {
      self.modified_write_values = *modified_write_values;
      changed = true;
    }

    changed
  }

  fn from_field_info(
    fi: &FieldInfo,
    preceding_path: &str,
    base_address: u32,
  ) -> I2cMapResult<Self> {
    Ok(Self {
      preceding_path: preceding_path.to_owned(),
      base_address,
      name: fi.name.clone(),
      description: clean_whitespace_opt(fi.description.clone())?,
      offset: fi.bit_range.offset,
      width: fi.bit_range.width,
      access: fi.access.as_ref().map(AccessSpec::new),
      modified_write_values: fi
        .modified_write_values
        .as_ref()
        .map(ModifiedWriteValuesSpec::new),
      role: None,
    })
  }

  fn interpolate_array_params(&mut self, index: String, offset: u32) {
    self.name = self.name.replace("%s", &index);

    if let Some(desc) = self.description.clone() {
      self.description = Some(desc.replace("%s", &index));
    }

    self.offset = offset
  }
}

#[cfg(test)]
mod tests {
  use super::{field_get, field_set, Field, FieldDef, FieldSpec, RegisterLayout, RegisterValue};
  use crate::{AccessSpec, FieldRole, I2cMapError, ModifiedWriteValuesSpec, Register};
  use svd_parser::parse::Parse;
  use svd_parser::Field as SvdField;
  use xmltree::Element;

  struct Sample;

  const LOW: Field<Sample> = Field::new(FieldDef::new("LOW", 0, 1, FieldRole::Flag));
  const MID: Field<Sample> = Field::new(FieldDef::new("MID", 3, 5, FieldRole::StatusCode));
  const HALF: Field<Sample> = Field::new(FieldDef::new("HALF", 16, 16, FieldRole::ClockCount));

  impl RegisterLayout for Sample {
    const NAME: &'static str = "SAMPLE";
    const FIELDS: &'static [FieldDef] = &[LOW.def(), MID.def(), HALF.def()];
  }

  #[test]
  fn computes_mask_and_shift() {
    assert_eq!(0x0000_0001, LOW.mask());
    assert_eq!(0x0000_00F8, MID.mask());
    assert_eq!(3, MID.shift());
    assert_eq!(7, MID.high());
    assert_eq!(31, MID.max_value());
    assert_eq!(0xFFFF_0000, HALF.mask());
    assert_eq!(0xFFFF, HALF.max_value());
  }

  #[test]
  fn get_extracts_only_the_field() {
    assert_eq!(0b10101, field_get(0xFFFF_FFA8 & 0x0000_00FF, MID));
    assert_eq!(0xFFFF, field_get(0xFFFF_0000, HALF));
    assert_eq!(0, field_get(0x0000_FFFE, LOW));
  }

  fn sample_values(def: &FieldDef) -> Vec<u32> {
    let mut values: Vec<u32> = (0..=def.max_value().min(0xFF)).collect();
    values.push(def.max_value() / 2);
    values.push(def.max_value());
    values
  }

  fn every_field() -> Vec<FieldDef> {
    let mut defs = vec![LOW.def(), MID.def(), HALF.def()];
    for register in Register::ALL.iter() {
      defs.extend_from_slice(register.fields());
    }
    defs
  }

  #[test]
  fn set_then_get_returns_value() {
    for def in every_field().iter() {
      for value in sample_values(def) {
        let register = def.set(0xDEAD_BEEF, value).unwrap();
        assert_eq!(value, def.get(register), "{}", def.name());
      }
    }

    for value in 0..=MID.max_value() {
      let register = field_set(0xDEAD_BEEF, MID, value).unwrap();
      assert_eq!(value, field_get(register, MID));
    }
  }

  #[test]
  fn set_preserves_other_bits() {
    for def in every_field().iter() {
      for &register in &[0u32, u32::MAX, 0x1234_5678, 0xA5A5_5A5A] {
        for value in sample_values(def) {
          let updated = def.set(register, value).unwrap();
          assert_eq!(
            register & !def.mask(),
            updated & !def.mask(),
            "{}",
            def.name()
          );
        }
      }
    }
  }

  #[test]
  fn owned_mask_drops_bits_past_the_register() {
    let mut fs = FieldSpec::from_def(&MID.def(), "I2C0.STAT", 0, AccessSpec::ReadOnly, None);

    fs.offset = 40;
    assert_eq!(0, fs.mask());
    assert!(!fs.fits_in(32));

    fs.offset = 28;
    assert_eq!(0xF000_0000, fs.mask());
    assert!(!fs.fits_in(32));

    fs.offset = u32::MAX;
    assert_eq!(0, fs.mask());
    assert!(!fs.fits_in(32));
  }

  #[test]
  fn set_rejects_values_wider_than_field() {
    assert_eq!(
      Err(I2cMapError::ValueOutOfRange {
        field: "MID",
        value: 32,
        width: 5
      }),
      field_set(0, MID, 32)
    );
    assert!(field_set(0, LOW, 2).is_err());
    assert!(field_set(0, HALF, 0x1_0000).is_err());
  }

  #[test]
  fn overlapping_fields_are_detected() {
    let a = FieldDef::new("A", 0, 4, FieldRole::Data);
    let b = FieldDef::new("B", 3, 2, FieldRole::Data);
    let c = FieldDef::new("C", 4, 4, FieldRole::Data);

    assert!(a.overlaps(&b));
    assert!(!a.overlaps(&c));
  }

  #[test]
  fn register_value_masks_reserved_bits_on_read() {
    let value = RegisterValue::<Sample>::from_read(u32::MAX);

    assert_eq!(0xFFFF_00F9, value.bits());
    assert!(value.is_set(LOW));
    assert_eq!(31, value.get(MID));
  }

  #[test]
  fn register_value_sets_fields() {
    let value = RegisterValue::<Sample>::zero()
      .set(MID, 0x15)
      .unwrap()
      .set(HALF, 0x1234)
      .unwrap();

    assert_eq!(0x1234_00A8, value.bits());
    assert!(!value.is_set(LOW));
    assert_eq!("SAMPLE(0x123400a8)", format!("{:?}", value));
  }

  #[test]
  fn can_create_single_from_xml() {
    let el: Element = Element::parse(
      r##"
      <field>
        <name>STA</name>
        <description>Start
          flag.</description>
        <bitOffset>5</bitOffset>
        <bitWidth>1</bitWidth>
        <access>write-only</access>
        <modifiedWriteValues>oneToSet</modifiedWriteValues>
      </field>
      "##
        .as_bytes(),
    )
    .unwrap();

    let fi = SvdField::parse(&el).unwrap();

    let mut specs = FieldSpec::new(&fi, "I2C0.CONSET", 0x4001_C000).unwrap();

    assert_eq!(1, specs.len());

    let fs = specs.pop().unwrap();

    assert_eq!("STA", fs.name);
    assert_eq!("Start flag.", fs.description.clone().unwrap());
    assert_eq!(1, fs.width);
    assert_eq!(5, fs.offset);
    assert_eq!(0x20, fs.mask());
    assert_eq!(AccessSpec::WriteOnly, fs.access.unwrap());
    assert_eq!(
      ModifiedWriteValuesSpec::OneToSet,
      fs.modified_write_values.unwrap()
    );
    assert_eq!("I2C0.CONSET.STA", fs.path());
    assert_eq!(0x4001_C000, fs.address());
  }

  #[test]
  fn can_create_multiple_from_field_xml() {
    let el: Element = Element::parse(
      r##"
      <field>
        <name>FLAG_%s</name>
        <description>Flag %s</description>
        <bitOffset>2</bitOffset>
        <bitWidth>1</bitWidth>
        <dim>3</dim>
        <dimIndex>a,b,c</dimIndex>
        <dimIncrement>0x2</dimIncrement>
      </field>
      "##
        .as_bytes(),
    )
    .unwrap();

    let fi = SvdField::parse(&el).unwrap();
    let specs = FieldSpec::new(&fi, "path", 0).unwrap();

    assert_eq!(3, specs.len());
    assert_eq!("FLAG_a", specs[0].name);
    assert_eq!(2, specs[0].offset);
    assert_eq!("Flag b", specs[1].description.clone().unwrap());
    assert_eq!(4, specs[1].offset);
    assert_eq!("path.FLAG_c", specs[2].path());
    assert_eq!(6, specs[2].offset);
  }

  #[test]
  fn from_def_copies_layout() {
    let fs = FieldSpec::from_def(
      &MID.def().with_description("Status code."),
      "I2C0.STAT",
      0x4001_C004,
      AccessSpec::ReadOnly,
      None,
    );

    assert_eq!("MID", fs.name);
    assert_eq!("Status code.", fs.description.clone().unwrap());
    assert_eq!(3, fs.offset);
    assert_eq!(5, fs.width);
    assert_eq!(0xF8, fs.mask());
    assert_eq!(Some(FieldRole::StatusCode), fs.role);
    assert!(fs.can_read());
    assert!(!fs.can_write());
    assert!(fs.fits_in(32));
    assert!(!fs.fits_in(7));
  }

  #[test]
  fn propagates_default_register_properties() {
    let el: Element = Element::parse(
      r##"
      <field>
        <name>AAC</name>
        <bitOffset>2</bitOffset>
        <bitWidth>1</bitWidth>
      </field>
      "##
        .as_bytes(),
    )
    .unwrap();

    let fi = SvdField::parse(&el).unwrap();
    let mut fs = FieldSpec::new(&fi, "I2C0.CONCLR", 0).unwrap();
    let field = &mut fs[0];

    let changed = field.propagate_default_properties(
      &Some(AccessSpec::WriteOnly),
      &Some(ModifiedWriteValuesSpec::OneToClear),
    );

    assert!(changed);
    assert_eq!(AccessSpec::WriteOnly, field.access.unwrap());
    assert_eq!(
      ModifiedWriteValuesSpec::OneToClear,
      field.modified_write_values.unwrap()
    );
    assert!(!field.propagate_default_properties(&None, &None));
  }
}
