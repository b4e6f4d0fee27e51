//! Resolved contracts.
//!
//! A [`TypeDescriptor`] is what the resolver produces for one application
//! type: the wire name of every serialized member, which member is the id,
//! and which members carry protocol system properties. Descriptors are
//! immutable once built and shared through the descriptor cache.

use crate::codec::CodecContext;
use crate::contract::MemberAccess;
use crate::error::Result;
use crate::wire::WireValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reserved wire name of the id member.
pub const ID_WIRE_NAME: &str = "id";

/// Codec kinds a member can be encoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Decimal,
    String,
    Char,
    DateTime,
    Uri,
    Uuid,
    Enum,
    Object,
    Array,
    Map,
    /// Raw wire value passed through untouched
    Any,
    /// Encoded by a member-specific converter
    Custom,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Bool => "Bool",
            ValueKind::I8 => "I8",
            ValueKind::I16 => "I16",
            ValueKind::I32 => "I32",
            ValueKind::I64 => "I64",
            ValueKind::U8 => "U8",
            ValueKind::U16 => "U16",
            ValueKind::U32 => "U32",
            ValueKind::U64 => "U64",
            ValueKind::F32 => "F32",
            ValueKind::F64 => "F64",
            ValueKind::Decimal => "Decimal",
            ValueKind::String => "String",
            ValueKind::Char => "Char",
            ValueKind::DateTime => "DateTime",
            ValueKind::Uri => "Uri",
            ValueKind::Uuid => "Uuid",
            ValueKind::Enum => "Enum",
            ValueKind::Object => "Object",
            ValueKind::Array => "Array",
            ValueKind::Map => "Map",
            ValueKind::Any => "Any",
            ValueKind::Custom => "Custom",
        };
        f.write_str(name)
    }
}

/// Protocol-reserved system properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SystemProperty {
    CreatedAt,
    UpdatedAt,
    Version,
}

impl SystemProperty {
    /// All system properties, in wire order.
    pub const ALL: [SystemProperty; 3] = [
        SystemProperty::CreatedAt,
        SystemProperty::UpdatedAt,
        SystemProperty::Version,
    ];

    /// Fixed wire name of the property.
    pub fn wire_name(self) -> &'static str {
        match self {
            SystemProperty::CreatedAt => "__createdAt",
            SystemProperty::UpdatedAt => "__updatedAt",
            SystemProperty::Version => "__version",
        }
    }

    /// Logical role name used in diagnostics.
    pub fn role(self) -> &'static str {
        match self {
            SystemProperty::CreatedAt => "createdAt",
            SystemProperty::UpdatedAt => "updatedAt",
            SystemProperty::Version => "version",
        }
    }

    /// The property whose wire name matches `name`, ignoring case.
    pub fn from_wire_name(name: &str) -> Option<SystemProperty> {
        Self::ALL
            .into_iter()
            .find(|p| p.wire_name().eq_ignore_ascii_case(name))
    }

    fn bit(self) -> u8 {
        match self {
            SystemProperty::CreatedAt => 1,
            SystemProperty::UpdatedAt => 2,
            SystemProperty::Version => 4,
        }
    }
}

/// Set of system properties bound by a type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SystemProperties(u8);

impl SystemProperties {
    /// The empty set.
    pub const NONE: SystemProperties = SystemProperties(0);

    /// Add a property to the set.
    pub fn insert(&mut self, property: SystemProperty) {
        self.0 |= property.bit();
    }

    /// Check whether the set contains a property.
    pub fn contains(&self, property: SystemProperty) -> bool {
        self.0 & property.bit() != 0
    }

    /// Check whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterate the contained properties in wire order.
    pub fn iter(&self) -> impl Iterator<Item = SystemProperty> + '_ {
        SystemProperty::ALL
            .into_iter()
            .filter(move |p| self.contains(*p))
    }
}

impl FromIterator<SystemProperty> for SystemProperties {
    fn from_iter<I: IntoIterator<Item = SystemProperty>>(iter: I) -> Self {
        let mut set = SystemProperties::NONE;
        for property in iter {
            set.insert(property);
        }
        set
    }
}

impl Serialize for SystemProperties {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

/// A resolved member of a type.
pub struct MemberDescriptor<T> {
    pub(crate) wire_name: String,
    pub(crate) declared_name: String,
    pub(crate) kind: ValueKind,
    pub(crate) nullable: bool,
    pub(crate) has_converter: bool,
    pub(crate) system: Option<SystemProperty>,
    pub(crate) is_id: bool,
    pub(crate) source_depth: usize,
    pub(crate) declaring_type: &'static str,
    pub(crate) access: Box<dyn MemberAccess<T>>,
}

impl<T> MemberDescriptor<T> {
    /// Name of the member on the wire.
    pub fn wire_name(&self) -> &str {
        &self.wire_name
    }

    /// Name the member was declared with.
    pub fn declared_name(&self) -> &str {
        &self.declared_name
    }

    /// Codec kind of the member's value.
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Whether the member's value can be null.
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Whether a member-specific converter replaces codec selection.
    pub fn has_converter(&self) -> bool {
        self.has_converter
    }

    /// The system property this member is bound to, if any.
    pub fn system_property(&self) -> Option<SystemProperty> {
        self.system
    }

    /// Whether this member is bound to a system property.
    pub fn is_system(&self) -> bool {
        self.system.is_some()
    }

    /// Whether this member is the id of the type.
    pub fn is_id(&self) -> bool {
        self.is_id
    }

    /// Distance of the declaring type from the most-derived type.
    pub fn source_depth(&self) -> usize {
        self.source_depth
    }

    /// Name of the type that declared this member.
    pub fn declaring_type(&self) -> &'static str {
        self.declaring_type
    }

    pub(crate) fn encode(&self, owner: &T, ctx: &CodecContext<'_>) -> Result<WireValue> {
        self.access.encode(owner, ctx)
    }

    pub(crate) fn decode(&self, owner: &mut T, value: &WireValue, ctx: &CodecContext<'_>) -> Result<()> {
        self.access.decode(owner, value, ctx)
    }
}

impl<T> fmt::Debug for MemberDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberDescriptor")
            .field("wire_name", &self.wire_name)
            .field("declared_name", &self.declared_name)
            .field("kind", &self.kind)
            .field("nullable", &self.nullable)
            .field("has_converter", &self.has_converter)
            .field("system", &self.system)
            .field("is_id", &self.is_id)
            .field("source_depth", &self.source_depth)
            .field("declaring_type", &self.declaring_type)
            .finish()
    }
}

/// The resolved contract of one application type.
pub struct TypeDescriptor<T> {
    pub(crate) type_name: &'static str,
    pub(crate) table_name: String,
    pub(crate) members: Vec<MemberDescriptor<T>>,
    pub(crate) id: Option<usize>,
    pub(crate) system: SystemProperties,
}

impl<T> TypeDescriptor<T> {
    /// Name of the application type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Wire-level collection name of the type.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Serialized members in contract order.
    pub fn members(&self) -> &[MemberDescriptor<T>] {
        &self.members
    }

    /// The id member, if the type has one.
    pub fn id_member(&self) -> Option<&MemberDescriptor<T>> {
        self.id.map(|i| &self.members[i])
    }

    /// The id member of a table-row type.
    ///
    /// Types without an id can only be used as nested values.
    pub fn require_id(&self) -> std::result::Result<&MemberDescriptor<T>, crate::ContractError> {
        self.id_member().ok_or_else(|| crate::ContractError::NoIdMember {
            type_name: self.type_name.to_string(),
            missing: crate::error::MissingId::Member,
        })
    }

    /// System properties bound by the type.
    pub fn system_properties(&self) -> SystemProperties {
        self.system
    }

    /// The member bound to a system property.
    pub fn system_member(&self, property: SystemProperty) -> Option<&MemberDescriptor<T>> {
        self.members.iter().find(|m| m.system == Some(property))
    }

    /// Look up a member by wire name, exactly first and then ignoring case.
    pub fn member(&self, wire_name: &str) -> Option<&MemberDescriptor<T>> {
        self.members
            .iter()
            .find(|m| m.wire_name == wire_name)
            .or_else(|| {
                self.members
                    .iter()
                    .find(|m| m.wire_name.eq_ignore_ascii_case(wire_name))
            })
    }

    /// A serializable view of the contract, for diagnostics.
    pub fn summary(&self) -> DescriptorSummary {
        DescriptorSummary {
            type_name: self.type_name.to_string(),
            table_name: self.table_name.clone(),
            id: self.id_member().map(|m| m.wire_name.clone()),
            system_properties: self.system,
            members: self
                .members
                .iter()
                .map(|m| MemberSummary {
                    wire_name: m.wire_name.clone(),
                    declared_name: m.declared_name.clone(),
                    kind: if m.has_converter { ValueKind::Custom } else { m.kind },
                    nullable: m.nullable,
                    source_depth: m.source_depth,
                })
                .collect(),
        }
    }
}

impl<T> fmt::Debug for TypeDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("type_name", &self.type_name)
            .field("table_name", &self.table_name)
            .field("members", &self.members)
            .field("id", &self.id)
            .field("system", &self.system)
            .finish()
    }
}

/// Serializable summary of a [`TypeDescriptor`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptorSummary {
    pub type_name: String,
    pub table_name: String,
    pub id: Option<String>,
    pub system_properties: SystemProperties,
    pub members: Vec<MemberSummary>,
}

/// Serializable summary of a [`MemberDescriptor`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSummary {
    pub wire_name: String,
    pub declared_name: String,
    pub kind: ValueKind,
    pub nullable: bool,
    pub source_depth: usize,
}
