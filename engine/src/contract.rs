//! Contract declarations.
//!
//! Application types describe their members once through [`Entity::describe`].
//! The declaration carries the same information attributes would: which
//! members exist, how they are reached, and the annotations that steer the
//! resolver (renames, data-contract opt-in, ignore, system-property roles,
//! custom converters). The resolver turns a declaration into a
//! [`TypeDescriptor`](crate::TypeDescriptor).
//!
//! ```rust
//! use wiretable_engine::{ContractBuilder, Entity, Serializer, SerializerSettings};
//! use serde_json::json;
//!
//! #[derive(Default)]
//! struct TodoItem {
//!     id: i64,
//!     text: Option<String>,
//!     done: bool,
//! }
//!
//! impl Entity for TodoItem {
//!     const TYPE_NAME: &'static str = "TodoItem";
//!
//!     fn describe(contract: &mut ContractBuilder<Self>) {
//!         contract.member("Id", |t| &t.id, |t| &mut t.id);
//!         contract.member("Text", |t| &t.text, |t| &mut t.text).json_name("text");
//!         contract.member("Done", |t| &t.done, |t| &mut t.done);
//!     }
//! }
//!
//! let serializer = Serializer::new(SerializerSettings::default());
//! let item = TodoItem { id: 5, text: Some("milk".into()), done: false };
//! let wire = serializer.serialize(&item).unwrap();
//! assert_eq!(wire, json!({"Id": 5, "text": "milk", "Done": false}));
//! ```

use crate::codec::{CodecContext, Converter, WireCodec};
use crate::descriptor::{SystemProperty, ValueKind};
use crate::error::Result;
use crate::wire::WireValue;
use std::sync::Arc;

/// An application type with a wire contract.
pub trait Entity: Default + Send + Sync + 'static {
    /// Name of the type, used as the default table name and in errors.
    const TYPE_NAME: &'static str;

    /// Declare the members of the type.
    fn describe(contract: &mut ContractBuilder<Self>);
}

/// Type-erased read/write access to one member of `T`.
pub(crate) trait MemberAccess<T>: Send + Sync {
    fn encode(&self, owner: &T, ctx: &CodecContext<'_>) -> Result<WireValue>;

    fn decode(&self, owner: &mut T, value: &WireValue, ctx: &CodecContext<'_>) -> Result<()>;
}

/// A member encoded with the codec of its value type.
struct Field<T, V> {
    get: fn(&T) -> &V,
    get_mut: fn(&mut T) -> &mut V,
}

impl<T: 'static, V: WireCodec> MemberAccess<T> for Field<T, V> {
    fn encode(&self, owner: &T, ctx: &CodecContext<'_>) -> Result<WireValue> {
        (self.get)(owner).encode(ctx)
    }

    fn decode(&self, owner: &mut T, value: &WireValue, ctx: &CodecContext<'_>) -> Result<()> {
        *(self.get_mut)(owner) = V::decode(value, ctx)?;
        Ok(())
    }
}

/// A member encoded by a member-specific converter.
struct Converted<T, V> {
    get: fn(&T) -> &V,
    get_mut: fn(&mut T) -> &mut V,
    converter: Arc<dyn Converter<V>>,
}

impl<T: 'static, V: Send + Sync + 'static> MemberAccess<T> for Converted<T, V> {
    fn encode(&self, owner: &T, ctx: &CodecContext<'_>) -> Result<WireValue> {
        self.converter.encode((self.get)(owner), ctx)
    }

    fn decode(&self, owner: &mut T, value: &WireValue, ctx: &CodecContext<'_>) -> Result<()> {
        *(self.get_mut)(owner) = self.converter.decode(value, ctx)?;
        Ok(())
    }
}

/// A member declared on a base type, reached through the embedded base.
struct Inherited<T, B> {
    get: fn(&T) -> &B,
    get_mut: fn(&mut T) -> &mut B,
    inner: Box<dyn MemberAccess<B>>,
}

impl<T: 'static, B: 'static> MemberAccess<T> for Inherited<T, B> {
    fn encode(&self, owner: &T, ctx: &CodecContext<'_>) -> Result<WireValue> {
        self.inner.encode((self.get)(owner), ctx)
    }

    fn decode(&self, owner: &mut T, value: &WireValue, ctx: &CodecContext<'_>) -> Result<()> {
        self.inner.decode((self.get_mut)(owner), value, ctx)
    }
}

/// Annotations attached to a declared member.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct MemberAttributes {
    /// Direct rename; highest precedence.
    pub json_name: Option<String>,
    /// Data-contract opt-in, with an optional declared name.
    pub data_member: Option<Option<String>>,
    pub ignore: bool,
    pub system: Option<SystemProperty>,
}

/// A member as declared, before resolution.
pub(crate) struct MemberDecl<T> {
    pub name: String,
    pub attributes: MemberAttributes,
    pub kind: ValueKind,
    pub nullable: bool,
    pub has_converter: bool,
    pub depth: usize,
    pub declaring_type: &'static str,
    pub declaring_data_contract: bool,
    pub access: Box<dyn MemberAccess<T>>,
}

/// A derived/base pair in a type hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HierarchyLink {
    pub derived: &'static str,
    pub derived_data_contract: bool,
    pub base: &'static str,
    pub base_data_contract: bool,
}

/// Collects the declaration of one type.
pub struct ContractBuilder<T> {
    type_name: &'static str,
    data_contract: bool,
    table_name: Option<String>,
    members: Vec<MemberDecl<T>>,
    bases: Vec<(&'static str, bool)>,
    ancestor_links: Vec<HierarchyLink>,
}

impl<T: Entity> ContractBuilder<T> {
    /// Run `T::describe` and collect its declaration.
    pub(crate) fn collect() -> Self {
        let mut builder = ContractBuilder {
            type_name: T::TYPE_NAME,
            data_contract: false,
            table_name: None,
            members: Vec::new(),
            bases: Vec::new(),
            ancestor_links: Vec::new(),
        };
        T::describe(&mut builder);

        // Members were recorded before the style may have been set.
        let data_contract = builder.data_contract;
        for member in builder.members.iter_mut().filter(|m| m.depth == 0) {
            member.declaring_data_contract = data_contract;
        }
        builder
    }

    /// Declare a member encoded with the codec of its type.
    pub fn member<V: WireCodec>(
        &mut self,
        name: &str,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> MemberBuilder<'_, T> {
        self.push(
            name,
            V::kind(),
            V::nullable(),
            false,
            Box::new(Field { get, get_mut }),
        )
    }

    /// Declare a member encoded by a custom converter.
    pub fn converted<V: Send + Sync + 'static>(
        &mut self,
        name: &str,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
        converter: Arc<dyn Converter<V>>,
    ) -> MemberBuilder<'_, T> {
        self.push(
            name,
            ValueKind::Custom,
            true,
            true,
            Box::new(Converted {
                get,
                get_mut,
                converter,
            }),
        )
    }

    /// Opt the type in to data-contract serialization: only members marked
    /// with [`MemberBuilder::data_member`] (or renamed with
    /// [`MemberBuilder::json_name`]) are serialized.
    ///
    /// Every type in a hierarchy must agree on this choice.
    pub fn data_contract(&mut self) -> &mut Self {
        self.data_contract = true;
        self
    }

    /// Override the wire-level table name (defaults to the type name).
    pub fn table_name(&mut self, name: &str) -> &mut Self {
        self.table_name = Some(name.to_string());
        self
    }

    /// Include the members of a base type embedded in this one.
    pub fn inherit<B: Entity>(&mut self, get: fn(&T) -> &B, get_mut: fn(&mut T) -> &mut B) -> &mut Self {
        let base = ContractBuilder::<B>::collect();

        self.bases.push((base.type_name, base.data_contract));
        self.ancestor_links.extend(base.hierarchy_links());

        for decl in base.members {
            self.members.push(MemberDecl {
                name: decl.name,
                attributes: decl.attributes,
                kind: decl.kind,
                nullable: decl.nullable,
                has_converter: decl.has_converter,
                depth: decl.depth + 1,
                declaring_type: decl.declaring_type,
                declaring_data_contract: decl.declaring_data_contract,
                access: Box::new(Inherited {
                    get,
                    get_mut,
                    inner: decl.access,
                }),
            });
        }
        self
    }
}

impl<T> ContractBuilder<T> {
    fn push(
        &mut self,
        name: &str,
        kind: ValueKind,
        nullable: bool,
        has_converter: bool,
        access: Box<dyn MemberAccess<T>>,
    ) -> MemberBuilder<'_, T> {
        self.members.push(MemberDecl {
            name: name.to_string(),
            attributes: MemberAttributes::default(),
            kind,
            nullable,
            has_converter,
            depth: 0,
            declaring_type: self.type_name,
            declaring_data_contract: self.data_contract,
            access,
        });
        let index = self.members.len() - 1;
        MemberBuilder {
            decl: &mut self.members[index],
        }
    }

    pub(crate) fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn is_data_contract(&self) -> bool {
        self.data_contract
    }

    pub(crate) fn declared_table_name(&self) -> Option<&str> {
        self.table_name.as_deref()
    }

    /// Every derived/base pair from this type up to the root.
    pub(crate) fn hierarchy_links(&self) -> Vec<HierarchyLink> {
        self.bases
            .iter()
            .map(|&(base, base_data_contract)| HierarchyLink {
                derived: self.type_name,
                derived_data_contract: self.data_contract,
                base,
                base_data_contract,
            })
            .chain(self.ancestor_links.iter().copied())
            .collect()
    }

    pub(crate) fn into_members(self) -> Vec<MemberDecl<T>> {
        self.members
    }
}

/// Annotates the member just declared.
pub struct MemberBuilder<'a, T> {
    decl: &'a mut MemberDecl<T>,
}

impl<T> MemberBuilder<'_, T> {
    /// Give the member an explicit wire name. Takes precedence over every
    /// other naming rule and is never camel-cased.
    pub fn json_name(self, name: &str) -> Self {
        self.decl.attributes.json_name = Some(name.to_string());
        self
    }

    /// Opt the member in to data-contract serialization.
    pub fn data_member(self) -> Self {
        self.decl.attributes.data_member = Some(None);
        self
    }

    /// Opt the member in to data-contract serialization under a declared
    /// name. The name applies on data-contract types only, and loses to
    /// [`json_name`](Self::json_name).
    pub fn data_member_named(self, name: &str) -> Self {
        self.decl.attributes.data_member = Some(Some(name.to_string()));
        self
    }

    /// Leave the member out of the contract.
    pub fn ignore(self) -> Self {
        self.decl.attributes.ignore = true;
        self
    }

    /// Bind the member to a system property. It is written under the
    /// property's fixed wire name whatever else it is annotated with.
    pub fn system(self, property: SystemProperty) -> Self {
        self.decl.attributes.system = Some(property);
        self
    }
}
