//! Process-wide descriptor cache.
//!
//! Each (type, naming policy) pair is resolved at most once. The map shard
//! lock is held only long enough to fetch or insert the per-key cell;
//! resolution itself runs inside the cell, so callers asking for the same
//! type wait for one another while unrelated types proceed in parallel.
//! A failed resolution is cached like a successful one.

use crate::descriptor::TypeDescriptor;
use crate::error::ContractError;
use crate::resolver;
use crate::settings::NamingPolicy;
use crate::Entity;
use dashmap::DashMap;
use once_cell::sync::{Lazy, OnceCell};
use std::any::{Any, TypeId};
use std::sync::Arc;

type Resolved = Result<Arc<dyn Any + Send + Sync>, ContractError>;

static GLOBAL: Lazy<Arc<DescriptorCache>> = Lazy::new(|| Arc::new(DescriptorCache::new()));

/// Memoized type descriptors, keyed by type and naming policy.
#[derive(Default)]
pub struct DescriptorCache {
    entries: DashMap<(TypeId, NamingPolicy), Arc<OnceCell<Resolved>>>,
}

impl DescriptorCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The cache shared by every serializer that does not bring its own.
    pub fn global() -> Arc<DescriptorCache> {
        Arc::clone(&GLOBAL)
    }

    /// The descriptor of `T`, resolving it on first use.
    pub fn get_or_resolve<T: Entity>(
        &self,
        naming: NamingPolicy,
    ) -> Result<Arc<TypeDescriptor<T>>, ContractError> {
        let cell = {
            let entry = self
                .entries
                .entry((TypeId::of::<T>(), naming))
                .or_insert_with(|| Arc::new(OnceCell::new()));
            Arc::clone(entry.value())
        };

        let mut resolved_here = false;
        let outcome = cell.get_or_init(|| {
            resolved_here = true;
            resolve_and_log::<T>(naming)
        });
        if !resolved_here {
            tracing::trace!(type_name = T::TYPE_NAME, "reusing cached descriptor");
        }

        match outcome {
            Ok(any) => Arc::clone(any)
                .downcast::<TypeDescriptor<T>>()
                .map_err(|_| ContractError::CachedTypeMismatch {
                    type_name: T::TYPE_NAME.to_string(),
                }),
            Err(err) => Err(err.clone()),
        }
    }

    /// Number of cached resolutions, failed ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether nothing has been resolved yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn resolve_and_log<T: Entity>(naming: NamingPolicy) -> Resolved {
    match resolver::resolve::<T>(naming) {
        Ok(descriptor) => {
            tracing::debug!(
                type_name = T::TYPE_NAME,
                table = descriptor.table_name(),
                members = descriptor.members().len(),
                ?naming,
                "resolved contract"
            );
            Ok(Arc::new(descriptor) as Arc<dyn Any + Send + Sync>)
        }
        Err(err) => {
            tracing::warn!(type_name = T::TYPE_NAME, error = %err, "contract failed to resolve");
            Err(err)
        }
    }
}
