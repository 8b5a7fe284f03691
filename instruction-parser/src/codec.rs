//! Schema codec: turns an instruction byte blob into a name and argument map.
//!
//! [`InstructionCodec`] is the seam the parser decodes through. The bundled
//! [`BorshInstructionCodec`] implements the Anchor layout: a discriminator
//! prefix followed by borsh-encoded arguments.

use std::collections::HashMap;

use borsh::{BorshDeserialize, BorshSerialize};
use serde_json::{Map, Number, Value};
use solana_pubkey::Pubkey;

use crate::{
    error::CodecError,
    schema::{ArgType, FieldDef, ProgramSchema, TypeDefKind},
};

/// Nesting limit for defined types while decoding or encoding a value.
pub const MAX_TYPE_DEPTH: usize = 32;

/// An instruction name and its decoded arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedData {
    pub name: String,
    pub args: Map<String, Value>,
}

/// A compiled decoder handle for one program schema.
///
/// Implementations must be deterministic and free of side effects.
pub trait InstructionCodec: Send + Sync {
    /// Decode `data`; `None` when the bytes match no known layout.
    fn decode(&self, data: &[u8]) -> Option<DecodedData>;

    /// Encode `args` for the instruction called `name`.
    fn encode(&self, name: &str, args: &Map<String, Value>) -> Result<Vec<u8>, CodecError>;
}

struct InstructionLayout {
    name: String,
    discriminator: Vec<u8>,
    args: Vec<FieldDef>,
}

/// Anchor-style codec: discriminator prefix plus borsh arguments.
pub struct BorshInstructionCodec {
    /// Sorted by discriminator length, longest first.
    layouts: Vec<InstructionLayout>,
    types: HashMap<String, TypeDefKind>,
}

impl BorshInstructionCodec {
    pub fn new(schema: &ProgramSchema) -> Self {
        let mut layouts: Vec<InstructionLayout> = schema
            .instructions
            .iter()
            .map(|ix| InstructionLayout {
                name: ix.name.clone(),
                discriminator: ix.discriminator.clone(),
                args: ix.args.clone(),
            })
            .collect();
        layouts.sort_by(|a, b| b.discriminator.len().cmp(&a.discriminator.len()));

        Self {
            layouts,
            types: schema
                .types
                .iter()
                .map(|t| (t.name.clone(), t.kind.clone()))
                .collect(),
        }
    }

    fn read_fields(
        &self,
        fields: &[FieldDef],
        buf: &mut &[u8],
        depth: usize,
    ) -> Result<Map<String, Value>, CodecError> {
        let mut map = Map::new();
        for field in fields {
            map.insert(field.name.clone(), self.read_value(&field.ty, buf, depth)?);
        }
        Ok(map)
    }

    fn read_value(&self, ty: &ArgType, buf: &mut &[u8], depth: usize) -> Result<Value, CodecError> {
        if depth > MAX_TYPE_DEPTH {
            return Err(CodecError::DepthExceeded(MAX_TYPE_DEPTH));
        }
        Ok(match ty {
            ArgType::Bool => Value::Bool(bool::deserialize(buf)?),
            ArgType::U8 => Value::from(u8::deserialize(buf)?),
            ArgType::U16 => Value::from(u16::deserialize(buf)?),
            ArgType::U32 => Value::from(u32::deserialize(buf)?),
            ArgType::U64 => Value::from(u64::deserialize(buf)?),
            ArgType::U128 => Value::String(u128::deserialize(buf)?.to_string()),
            ArgType::I8 => Value::from(i8::deserialize(buf)?),
            ArgType::I16 => Value::from(i16::deserialize(buf)?),
            ArgType::I32 => Value::from(i32::deserialize(buf)?),
            ArgType::I64 => Value::from(i64::deserialize(buf)?),
            ArgType::I128 => Value::String(i128::deserialize(buf)?.to_string()),
            ArgType::F32 => float_value(f32::deserialize(buf)? as f64),
            ArgType::F64 => float_value(f64::deserialize(buf)?),
            ArgType::String => Value::String(String::deserialize(buf)?),
            ArgType::Bytes => Value::from(Vec::<u8>::deserialize(buf)?),
            ArgType::Pubkey => {
                Value::String(Pubkey::new_from_array(<[u8; 32]>::deserialize(buf)?).to_string())
            }
            ArgType::Option(inner) => match u8::deserialize(buf)? {
                0 => Value::Null,
                1 => self.read_value(inner, buf, depth + 1)?,
                tag => {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        format!("invalid option tag {tag}"),
                    )
                    .into())
                }
            },
            ArgType::Vec(inner) => {
                let len = u32::deserialize(buf)? as usize;
                let mut items = Vec::with_capacity(len.min(buf.len()));
                for _ in 0..len {
                    let remaining = buf.len();
                    items.push(self.read_value(inner, buf, depth + 1)?);
                    // A length prefix over zero-sized elements would never run out of input.
                    if buf.len() == remaining {
                        return Err(std::io::Error::new(
                            std::io::ErrorKind::InvalidData,
                            "vector of zero-sized elements",
                        )
                        .into());
                    }
                }
                Value::Array(items)
            }
            ArgType::Array(inner, len) => {
                let mut items = Vec::with_capacity((*len).min(buf.len()));
                for _ in 0..*len {
                    items.push(self.read_value(inner, buf, depth + 1)?);
                }
                Value::Array(items)
            }
            ArgType::Defined(name) => match self.defined(name)? {
                TypeDefKind::Struct(fields) => Value::Object(self.read_fields(fields, buf, depth + 1)?),
                TypeDefKind::Enum(variants) => {
                    let index = u8::deserialize(buf)? as usize;
                    let variant = variants.get(index).ok_or_else(|| {
                        std::io::Error::new(
                            std::io::ErrorKind::InvalidData,
                            format!("invalid variant {index} for `{name}`"),
                        )
                    })?;
                    let mut map = Map::new();
                    map.insert(
                        variant.name.clone(),
                        Value::Object(self.read_fields(&variant.fields, buf, depth + 1)?),
                    );
                    Value::Object(map)
                }
            },
        })
    }

    fn write_fields(
        &self,
        fields: &[FieldDef],
        values: &Map<String, Value>,
        out: &mut Vec<u8>,
        depth: usize,
    ) -> Result<(), CodecError> {
        for field in fields {
            let value = values
                .get(&field.name)
                .ok_or_else(|| CodecError::MissingArgument(field.name.clone()))?;
            self.write_value(&field.name, &field.ty, value, out, depth)?;
        }
        Ok(())
    }

    fn write_value(
        &self,
        field: &str,
        ty: &ArgType,
        value: &Value,
        out: &mut Vec<u8>,
        depth: usize,
    ) -> Result<(), CodecError> {
        if depth > MAX_TYPE_DEPTH {
            return Err(CodecError::DepthExceeded(MAX_TYPE_DEPTH));
        }
        let mismatch = |expected: &'static str| CodecError::TypeMismatch {
            field: field.to_string(),
            expected,
        };
        match ty {
            ArgType::Bool => value.as_bool().ok_or_else(|| mismatch("bool"))?.serialize(out)?,
            ArgType::U8 => int::<u8, _>(value.as_u64()).ok_or_else(|| mismatch("u8"))?.serialize(out)?,
            ArgType::U16 => int::<u16, _>(value.as_u64()).ok_or_else(|| mismatch("u16"))?.serialize(out)?,
            ArgType::U32 => int::<u32, _>(value.as_u64()).ok_or_else(|| mismatch("u32"))?.serialize(out)?,
            ArgType::U64 => value.as_u64().ok_or_else(|| mismatch("u64"))?.serialize(out)?,
            ArgType::U128 => value
                .as_str()
                .and_then(|s| s.parse::<u128>().ok())
                .ok_or_else(|| mismatch("u128"))?
                .serialize(out)?,
            ArgType::I8 => int::<i8, _>(value.as_i64()).ok_or_else(|| mismatch("i8"))?.serialize(out)?,
            ArgType::I16 => int::<i16, _>(value.as_i64()).ok_or_else(|| mismatch("i16"))?.serialize(out)?,
            ArgType::I32 => int::<i32, _>(value.as_i64()).ok_or_else(|| mismatch("i32"))?.serialize(out)?,
            ArgType::I64 => value.as_i64().ok_or_else(|| mismatch("i64"))?.serialize(out)?,
            ArgType::I128 => value
                .as_str()
                .and_then(|s| s.parse::<i128>().ok())
                .ok_or_else(|| mismatch("i128"))?
                .serialize(out)?,
            ArgType::F32 => (value.as_f64().ok_or_else(|| mismatch("f32"))? as f32).serialize(out)?,
            ArgType::F64 => value.as_f64().ok_or_else(|| mismatch("f64"))?.serialize(out)?,
            ArgType::String => value
                .as_str()
                .ok_or_else(|| mismatch("string"))?
                .to_string()
                .serialize(out)?,
            ArgType::Bytes => {
                let bytes = byte_array(value).ok_or_else(|| mismatch("byte array"))?;
                bytes.serialize(out)?
            }
            ArgType::Pubkey => value
                .as_str()
                .and_then(|s| s.parse::<Pubkey>().ok())
                .ok_or_else(|| mismatch("pubkey"))?
                .to_bytes()
                .serialize(out)?,
            ArgType::Option(inner) => {
                if value.is_null() {
                    0u8.serialize(out)?
                } else {
                    1u8.serialize(out)?;
                    self.write_value(field, inner, value, out, depth + 1)?
                }
            }
            ArgType::Vec(inner) => {
                let items = value.as_array().ok_or_else(|| mismatch("vec"))?;
                let len = u32::try_from(items.len()).map_err(|_| mismatch("vec"))?;
                len.serialize(out)?;
                for item in items {
                    self.write_value(field, inner, item, out, depth + 1)?;
                }
            }
            ArgType::Array(inner, len) => {
                let items = value
                    .as_array()
                    .filter(|items| items.len() == *len)
                    .ok_or_else(|| mismatch("fixed-size array"))?;
                for item in items {
                    self.write_value(field, inner, item, out, depth + 1)?;
                }
            }
            ArgType::Defined(name) => match self.defined(name)? {
                TypeDefKind::Struct(fields) => {
                    let values = value.as_object().ok_or_else(|| mismatch("struct"))?;
                    self.write_fields(fields, values, out, depth + 1)?
                }
                TypeDefKind::Enum(variants) => {
                    let (variant_name, fields) = value
                        .as_object()
                        .filter(|map| map.len() == 1)
                        .and_then(|map| map.iter().next())
                        .ok_or_else(|| mismatch("enum"))?;
                    let index = variants
                        .iter()
                        .position(|v| &v.name == variant_name)
                        .ok_or_else(|| mismatch("enum"))?;
                    (index as u8).serialize(out)?;
                    let values = fields.as_object().ok_or_else(|| mismatch("enum"))?;
                    self.write_fields(&variants[index].fields, values, out, depth + 1)?
                }
            },
        }
        Ok(())
    }

    fn defined(&self, name: &str) -> Result<&TypeDefKind, CodecError> {
        self.types
            .get(name)
            .ok_or_else(|| CodecError::UndefinedType(name.to_string()))
    }
}

impl InstructionCodec for BorshInstructionCodec {
    fn decode(&self, data: &[u8]) -> Option<DecodedData> {
        let layout = self
            .layouts
            .iter()
            .find(|layout| data.starts_with(&layout.discriminator))?;
        let mut buf = &data[layout.discriminator.len()..];
        let args = self.read_fields(&layout.args, &mut buf, 0).ok()?;
        Some(DecodedData {
            name: layout.name.clone(),
            args,
        })
    }

    fn encode(&self, name: &str, args: &Map<String, Value>) -> Result<Vec<u8>, CodecError> {
        let layout = self
            .layouts
            .iter()
            .find(|layout| layout.name == name)
            .ok_or_else(|| CodecError::UnknownInstruction(name.to_string()))?;
        let mut out = layout.discriminator.clone();
        self.write_fields(&layout.args, args, &mut out, 0)?;
        Ok(out)
    }
}

fn float_value(value: f64) -> Value {
    Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
}

fn int<T: TryFrom<V>, V>(value: Option<V>) -> Option<T> {
    value.and_then(|v| T::try_from(v).ok())
}

fn byte_array(value: &Value) -> Option<Vec<u8>> {
    value
        .as_array()?
        .iter()
        .map(|b| int::<u8, u64>(b.as_u64()))
        .collect()
}
