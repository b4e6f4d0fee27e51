//! The serializer: instances to wire values and back.

use crate::cache::DescriptorCache;
use crate::codec::CodecContext;
use crate::descriptor::{SystemProperty, TypeDescriptor};
use crate::error::{ContractError, Error, MissingId, Result};
use crate::id;
use crate::settings::SerializerSettings;
use crate::wire::{self, WireObject, WirePath, WireValue};
use crate::Entity;
use std::fmt;
use std::sync::Arc;

/// Converts application instances to and from wire values.
///
/// A serializer is cheap to clone and safe to share between threads. By
/// default all serializers share the process-wide [`DescriptorCache`].
#[derive(Clone)]
pub struct Serializer {
    settings: SerializerSettings,
    cache: Arc<DescriptorCache>,
}

impl Serializer {
    /// Create a serializer backed by the global descriptor cache.
    pub fn new(settings: SerializerSettings) -> Self {
        Self::with_cache(settings, DescriptorCache::global())
    }

    /// Create a serializer backed by its own descriptor cache.
    pub fn with_cache(settings: SerializerSettings, cache: Arc<DescriptorCache>) -> Self {
        Self { settings, cache }
    }

    /// Settings this serializer was created with.
    pub fn settings(&self) -> &SerializerSettings {
        &self.settings
    }

    /// The resolved contract of `T` under this serializer's naming policy.
    ///
    /// The id is not required here, so this works for nested types too.
    pub fn descriptor<T: Entity>(&self) -> Result<Arc<TypeDescriptor<T>>> {
        Ok(self.cache.get_or_resolve::<T>(self.settings.naming())?)
    }

    /// The contract of a table-row type, which must have an id.
    fn row_descriptor<T: Entity>(&self) -> Result<Arc<TypeDescriptor<T>>> {
        let descriptor = self.descriptor::<T>()?;
        descriptor.require_id()?;
        Ok(descriptor)
    }

    /// Wire-level table name of `T`.
    pub fn table_name<T: Entity>(&self) -> Result<String> {
        Ok(self.descriptor::<T>()?.table_name().to_string())
    }

    /// Serialize an instance into a wire object.
    ///
    /// Every member of the contract is written. With
    /// [`omit_null_members`](SerializerSettings::omit_null_members) set,
    /// members that encode to null are skipped, except the id and system
    /// members.
    pub fn serialize<T: Entity>(&self, instance: &T) -> Result<WireValue> {
        let descriptor = self.row_descriptor::<T>()?;
        let root = WirePath::root();
        self.write_object(&descriptor, instance, &CodecContext::new(self, root))
    }

    /// Deserialize a wire object into a new instance.
    pub fn deserialize<T: Entity>(&self, value: &WireValue) -> Result<T> {
        let mut instance = T::default();
        self.deserialize_into(value, &mut instance)?;
        Ok(instance)
    }

    /// Populate an existing instance from a wire object.
    ///
    /// Only members present in `value` are assigned; the rest keep their
    /// current values. A member present as null is reset to its default.
    pub fn deserialize_into<T: Entity>(&self, value: &WireValue, instance: &mut T) -> Result<()> {
        let descriptor = self.row_descriptor::<T>()?;
        let root = WirePath::root();
        self.read_object(&descriptor, value, instance, &CodecContext::new(self, root))
    }

    /// Deserialize every element of a wire array, in order.
    pub fn deserialize_all<T: Entity>(&self, value: &WireValue) -> Result<Vec<T>> {
        let descriptor = self.row_descriptor::<T>()?;
        let root = WirePath::root();
        let ctx = CodecContext::new(self, root);

        let items = value
            .as_array()
            .ok_or_else(|| ctx.conversion_error(value, "Array"))?;
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let mut instance = T::default();
                self.read_object(&descriptor, item, &mut instance, &ctx.index(index))?;
                Ok(instance)
            })
            .collect()
    }

    /// The current id of an instance.
    ///
    /// With `allow_default` off, a default id (zero, empty, nil) is an
    /// error: the instance has no id value yet.
    pub fn get_id<T: Entity>(&self, instance: &T, allow_default: bool) -> Result<WireValue> {
        let descriptor = self.row_descriptor::<T>()?;
        let id_member = descriptor.require_id()?;
        let root = WirePath::root();
        let ctx = CodecContext::new(self, root);

        let value = id_member.encode(instance, &ctx.field(id_member.wire_name()))?;
        if !allow_default && id::is_default_id(&value) {
            return Err(ContractError::NoIdMember {
                type_name: T::TYPE_NAME.to_string(),
                missing: MissingId::Value,
            }
            .into());
        }
        Ok(value)
    }

    /// Reset the id of an instance to the default of its kind.
    pub fn set_id_to_default<T: Entity>(&self, instance: &mut T) -> Result<()> {
        let descriptor = self.row_descriptor::<T>()?;
        let id_member = descriptor.require_id()?;
        let root = WirePath::root();
        let ctx = CodecContext::new(self, root);
        id_member.decode(instance, &WireValue::Null, &ctx.field(id_member.wire_name()))
    }

    /// Whether an id value is the default of its kind.
    pub fn is_default_id(&self, id: &WireValue) -> bool {
        id::is_default_id(id)
    }

    /// The version of an instance, when its type binds the version property
    /// and the value is set.
    pub fn get_version<T: Entity>(&self, instance: &T) -> Result<Option<String>> {
        let descriptor = self.row_descriptor::<T>()?;
        let Some(member) = descriptor.system_member(SystemProperty::Version) else {
            return Ok(None);
        };
        let root = WirePath::root();
        let ctx = CodecContext::new(self, root);

        Ok(match member.encode(instance, &ctx.field(member.wire_name()))? {
            WireValue::Null => None,
            WireValue::String(version) => Some(version),
            other => Some(other.to_string()),
        })
    }

    /// Render a wire value as JSON text, indented when
    /// [`pretty_print`](SerializerSettings::pretty_print) is set.
    pub fn to_json_string(&self, value: &WireValue) -> Result<String> {
        wire::to_json_string(value, self.settings.pretty_print)
    }

    /// Parse JSON text received from the service.
    pub fn parse_json(&self, text: &str) -> Result<WireValue> {
        wire::parse_json(text)
    }

    pub(crate) fn write_object<T>(
        &self,
        descriptor: &TypeDescriptor<T>,
        instance: &T,
        ctx: &CodecContext<'_>,
    ) -> Result<WireValue> {
        let mut object = WireObject::new();
        for member in descriptor.members() {
            let value = member.encode(instance, &ctx.field(member.wire_name()))?;
            if value.is_null() && self.settings.omit_null_members && !member.is_id() && !member.is_system() {
                continue;
            }
            object.insert(member.wire_name().to_string(), value);
        }
        Ok(WireValue::Object(object))
    }

    pub(crate) fn read_object<T>(
        &self,
        descriptor: &TypeDescriptor<T>,
        value: &WireValue,
        instance: &mut T,
        ctx: &CodecContext<'_>,
    ) -> Result<()> {
        let object = value
            .as_object()
            .ok_or_else(|| ctx.conversion_error(value, descriptor.type_name()))?;

        for member in descriptor.members() {
            let Some(field) = lookup(object, member.wire_name()) else {
                continue;
            };
            let decoded = member.decode(instance, field, &ctx.field(member.wire_name()));
            if member.is_id() {
                decoded.map_err(Error::into_id_error)?;
            } else {
                decoded?;
            }
        }
        Ok(())
    }
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new(SerializerSettings::default())
    }
}

impl fmt::Debug for Serializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Serializer")
            .field("settings", &self.settings)
            .field("cached_descriptors", &self.cache.len())
            .finish()
    }
}

/// A wire field by exact name, or else ignoring case.
fn lookup<'v>(object: &'v WireObject, name: &str) -> Option<&'v WireValue> {
    object.get(name).or_else(|| {
        object
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    })
}
