//! # Wiretable Engine
//!
//! The contract-resolution and marshalling engine of a mobile table-service
//! client.
//!
//! This crate converts between strongly-typed application objects and the
//! generic wire value tree exchanged with a remote table service. It decides
//! the wire name of every member, which member is the id, which members carry
//! protocol system properties, and how each value is encoded and decoded.
//!
//! ## Design Principles
//!
//! - **No IO**: Transport, authentication and query compilation live elsewhere
//! - **Deterministic**: A type resolves to the same contract (or the same error) every time
//! - **Strict out, lenient in**: Encoding rejects values the wire cannot carry exactly;
//!   decoding coerces every compatible shape
//!
//! ## Core Concepts
//!
//! ### Wire values
//!
//! A [`WireValue`] is an insertion-ordered JSON tree: null, bool, number,
//! string, array or object.
//!
//! ### Contracts
//!
//! Application types implement [`Entity`] and declare their members once
//! through a [`ContractBuilder`]. Member annotations steer naming:
//! - [`MemberBuilder::json_name`] - direct rename, highest precedence
//! - [`MemberBuilder::data_member_named`] - name used by data-contract types
//! - [`MemberBuilder::system`] - bind a system property (`__createdAt`,
//!   `__updatedAt`, `__version`)
//! - [`MemberBuilder::ignore`] - leave the member out
//!
//! The resolver turns a declaration into a [`TypeDescriptor`]. Descriptors
//! are computed once per type and shared through the [`DescriptorCache`].
//!
//! ### Codecs
//!
//! Every member value crosses the wire through a [`WireCodec`]. 64-bit
//! integers and decimals outside ±2^53 are rejected on encode; timestamps are
//! normalized to UTC; enums travel by name ([`WireEnum`]). A [`Converter`]
//! replaces the codec of a single member.
//!
//! ## Quick Start
//!
//! ```rust
//! use wiretable_engine::{
//!     ContractBuilder, Entity, Serializer, SerializerSettings, SystemProperty,
//! };
//! use serde_json::json;
//!
//! #[derive(Default)]
//! struct TodoItem {
//!     id: String,
//!     text: String,
//!     complete: bool,
//!     version: Option<String>,
//! }
//!
//! impl Entity for TodoItem {
//!     const TYPE_NAME: &'static str = "TodoItem";
//!
//!     fn describe(contract: &mut ContractBuilder<Self>) {
//!         contract.member("Id", |t| &t.id, |t| &mut t.id);
//!         contract.member("Text", |t| &t.text, |t| &mut t.text);
//!         contract.member("Complete", |t| &t.complete, |t| &mut t.complete);
//!         contract
//!             .member("Version", |t| &t.version, |t| &mut t.version)
//!             .system(SystemProperty::Version);
//!     }
//! }
//!
//! // 1. Create a serializer
//! let serializer = Serializer::new(SerializerSettings::new().with_camel_case_member_names(true));
//!
//! // 2. Serialize an instance
//! let item = TodoItem { id: "a1".into(), text: "milk".into(), ..Default::default() };
//! let wire = serializer.serialize(&item).unwrap();
//! assert_eq!(
//!     wire,
//!     json!({"id": "a1", "text": "milk", "complete": false, "__version": null})
//! );
//!
//! // 3. Merge a response into the instance
//! let mut item = item;
//! let response = json!({"complete": true, "__version": "AAAAAAAAB9E="});
//! serializer.deserialize_into(&response, &mut item).unwrap();
//! assert!(item.complete);
//! assert_eq!(item.text, "milk");
//! assert_eq!(serializer.get_version(&item).unwrap().as_deref(), Some("AAAAAAAAB9E="));
//! ```

pub mod cache;
pub mod codec;
pub mod contract;
pub mod descriptor;
pub mod error;
pub mod id;
mod resolver;
pub mod serializer;
pub mod settings;
pub mod wire;

// Re-export main types at crate root
pub use cache::DescriptorCache;
pub use codec::{Converter, UriRef, WireCodec, WireEnum, MAX_SAFE_INTEGER};
pub use contract::{ContractBuilder, Entity, MemberBuilder};
pub use descriptor::{
    DescriptorSummary, MemberDescriptor, MemberSummary, SystemProperties, SystemProperty,
    TypeDescriptor, ValueKind, ID_WIRE_NAME,
};
pub use error::{ContractError, Error, MissingId, Result};
pub use id::{is_default_id, remove_system_properties, validate_id};
pub use serializer::Serializer;
pub use settings::{NamingPolicy, SerializerSettings};
pub use wire::{WireObject, WirePath, WireValue};
