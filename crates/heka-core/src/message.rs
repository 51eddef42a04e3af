//! The canonical record.

use crate::field::{Field, FieldScalar, FieldValue};
use crate::proto::{PbField, PbHmacHashFunction, PbMessage, PbValueType};
use crate::Error;
use bytes::Bytes;

/// A normalized event. `fields` is ordered and may
/// be empty. `msg_bytes` is the lazily-produced or wire-captured shadow used to
/// route bytes-faithfully when a message crosses transports unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub uuid: [u8; 16],
    pub timestamp: i64,
    pub type_: String,
    pub logger: String,
    pub severity: i32,
    pub payload: String,
    pub env_version: String,
    pub pid: i32,
    pub hostname: String,
    pub fields: Vec<Field>,
    msg_bytes: Option<Bytes>,
}

/// The variables a matcher left-hand side may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Var {
    Uuid,
    Type,
    Logger,
    Payload,
    EnvVersion,
    Hostname,
    Timestamp,
    Severity,
    Pid,
}

impl Message {
    pub fn new(type_: impl Into<String>, payload: impl Into<String>) -> Self {
        Message {
            uuid: uuid::Uuid::new_v4().into_bytes(),
            timestamp: 0,
            type_: type_.into(),
            logger: String::new(),
            severity: 7,
            payload: payload.into(),
            env_version: String::new(),
            pid: 0,
            hostname: String::new(),
            fields: Vec::new(),
            msg_bytes: None,
        }
    }

    /// Clear every field in place for reuse by the pack pool. Reuses the
    /// `fields` allocation rather than dropping it.
    pub fn reset(&mut self) {
        self.uuid = [0u8; 16];
        self.timestamp = 0;
        self.type_.clear();
        self.logger.clear();
        self.severity = 7;
        self.payload.clear();
        self.env_version.clear();
        self.pid = 0;
        self.hostname.clear();
        self.fields.clear();
        self.msg_bytes = None;
    }

    /// The exact serialized form, if one has been captured or computed.
    pub fn msg_bytes(&self) -> Option<&Bytes> {
        self.msg_bytes.as_ref()
    }

    pub fn set_msg_bytes(&mut self, bytes: Bytes) {
        self.msg_bytes = Some(bytes);
    }

    pub fn clear_msg_bytes(&mut self) {
        self.msg_bytes = None;
    }

    /// Resolve a top-level matcher variable to a scalar for comparison.
    pub fn var(&self, var: Var) -> FieldScalar<'_> {
        match var {
            Var::Uuid => FieldScalar::Bytes(std::borrow::Cow::Borrowed(&self.uuid)),
            Var::Type => FieldScalar::Str(std::borrow::Cow::Borrowed(&self.type_)),
            Var::Logger => FieldScalar::Str(std::borrow::Cow::Borrowed(&self.logger)),
            Var::Payload => FieldScalar::Str(std::borrow::Cow::Borrowed(&self.payload)),
            Var::EnvVersion => FieldScalar::Str(std::borrow::Cow::Borrowed(&self.env_version)),
            Var::Hostname => FieldScalar::Str(std::borrow::Cow::Borrowed(&self.hostname)),
            Var::Timestamp => FieldScalar::Int(self.timestamp),
            Var::Severity => FieldScalar::Int(self.severity as i64),
            Var::Pid => FieldScalar::Int(self.pid as i64),
        }
    }

    /// Field access by name, returning the first field instance with that name.
    /// Absence yields `None` (a sentinel to the matcher), never an error.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// `Fields[name][i]`: the `i`-th field instance sharing `name` (fields with the
    /// same name may appear more than once; order is preserved).
    pub fn field_indexed(&self, name: &str, i: usize) -> Option<&Field> {
        self.fields.iter().filter(|f| f.name == name).nth(i)
    }

    /// `Fields[name][i][j]`: the `j`-th element of the value sequence of the `i`-th
    /// field instance named `name`.
    pub fn field_element(&self, name: &str, i: usize, j: usize) -> Option<FieldScalar<'_>> {
        self.field_indexed(name, i)?.value.scalar(j)
    }

    pub fn add_field(&mut self, field: Field) {
        self.fields.push(field);
    }

    pub fn to_proto(&self) -> PbMessage {
        PbMessage {
            uuid: Some(self.uuid.to_vec()),
            timestamp: Some(self.timestamp),
            r#type: Some(self.type_.clone()),
            logger: Some(self.logger.clone()),
            severity: Some(self.severity),
            payload: Some(self.payload.clone()),
            env_version: Some(self.env_version.clone()),
            pid: Some(self.pid),
            hostname: Some(self.hostname.clone()),
            fields: self.fields.iter().map(field_to_proto).collect(),
        }
    }

    pub fn from_proto(pb: PbMessage) -> Result<Self, Error> {
        let uuid_bytes = pb.uuid.ok_or(Error::MissingRequiredField("uuid"))?;
        let uuid: [u8; 16] = uuid_bytes
            .as_slice()
            .try_into()
            .map_err(|_| Error::MalformedUuid)?;
        Ok(Message {
            uuid,
            timestamp: pb.timestamp.ok_or(Error::MissingRequiredField("timestamp"))?,
            type_: pb.r#type.unwrap_or_default(),
            logger: pb.logger.unwrap_or_default(),
            severity: pb.severity.unwrap_or(7),
            payload: pb.payload.unwrap_or_default(),
            env_version: pb.env_version.unwrap_or_default(),
            pid: pb.pid.unwrap_or_default(),
            hostname: pb.hostname.unwrap_or_default(),
            fields: pb
                .fields
                .into_iter()
                .map(field_from_proto)
                .collect::<Result<Vec<_>, _>>()?,
            msg_bytes: None,
        })
    }

    /// Encode to the protobuf payload bytes (the part framed by the splitter/header,
    /// not the frame itself — see [`crate::framing`]).
    pub fn encode_payload(&self) -> Bytes {
        use prost::Message as _;
        Bytes::from(self.to_proto().encode_to_vec())
    }

    pub fn decode_payload(buf: &[u8]) -> Result<Self, Error> {
        use prost::Message as _;
        let pb = PbMessage::decode(buf).map_err(Error::ProtoDecode)?;
        Self::from_proto(pb)
    }
}

fn field_to_proto(f: &Field) -> PbField {
    let mut pb = PbField {
        name: f.name.clone(),
        value_type: None,
        representation: f.representation.clone(),
        value_string: Vec::new(),
        value_bytes: Vec::new(),
        value_integer: Vec::new(),
        value_double: Vec::new(),
        value_bool: Vec::new(),
    };
    match &f.value {
        FieldValue::Strings(v) => {
            pb.value_type = Some(PbValueType::String as i32);
            pb.value_string = v.clone();
        }
        FieldValue::Bytes(v) => {
            pb.value_type = Some(PbValueType::Bytes as i32);
            pb.value_bytes = v.clone();
        }
        FieldValue::Integers(v) => {
            pb.value_type = Some(PbValueType::Integer as i32);
            pb.value_integer = v.clone();
        }
        FieldValue::Doubles(v) => {
            pb.value_type = Some(PbValueType::Double as i32);
            pb.value_double = v.clone();
        }
        FieldValue::Bools(v) => {
            pb.value_type = Some(PbValueType::Bool as i32);
            pb.value_bool = v.clone();
        }
    }
    pb
}

fn field_from_proto(pb: PbField) -> Result<Field, Error> {
    let value_type = pb
        .value_type
        .and_then(PbValueType::from_i32)
        .unwrap_or(PbValueType::String);
    let value = match value_type {
        PbValueType::String => FieldValue::Strings(pb.value_string),
        PbValueType::Bytes => FieldValue::Bytes(pb.value_bytes),
        PbValueType::Integer => FieldValue::Integers(pb.value_integer),
        PbValueType::Double => FieldValue::Doubles(pb.value_double),
        PbValueType::Bool => FieldValue::Bools(pb.value_bool),
    };
    Ok(Field {
        name: pb.name,
        representation: pb.representation,
        value,
    })
}

/// Maps the header's HMAC hash function selector to its protobuf wire value.
pub fn hmac_hash_function_tag(name: &str) -> Option<PbHmacHashFunction> {
    match name.to_ascii_uppercase().as_str() {
        "MD5" => Some(PbHmacHashFunction::Md5),
        "SHA1" => Some(PbHmacHashFunction::Sha1),
        _ => None,
    }
}
