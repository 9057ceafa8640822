//! Request-scoped attributes and the per-thread holder exposing them.

use crate::errors::ContextflowError;
use parking_lot::RwLock;
use std::cell::RefCell;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use uuid::Uuid;

/// Attributes bound to a single inbound request.
///
/// Shared by reference: the submitting thread and every worker that receives
/// the holder read and write the same bag.
#[derive(Debug)]
pub struct RequestAttributes {
    id: Uuid,
    attributes: RwLock<HashMap<String, serde_json::Value>>,
}

impl RequestAttributes {
    /// Creates an empty attribute bag with a fresh request id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::now_v7(),
            attributes: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a shared attribute bag.
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Returns the id of the request these attributes belong to.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Gets an attribute.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<serde_json::Value> {
        self.attributes.read().get(name).cloned()
    }

    /// Sets an attribute, returning the previous value.
    pub fn set(&self, name: impl Into<String>, value: serde_json::Value) -> Option<serde_json::Value> {
        self.attributes.write().insert(name.into(), value)
    }

    /// Removes an attribute.
    pub fn remove(&self, name: &str) -> Option<serde_json::Value> {
        self.attributes.write().remove(name)
    }

    /// Checks if an attribute exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.attributes.read().contains_key(name)
    }

    /// Returns all attribute names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.attributes.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attributes.read().len()
    }

    /// Returns true if no attributes are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.read().is_empty()
    }
}

impl Default for RequestAttributes {
    fn default() -> Self {
        Self::new()
    }
}

thread_local! {
    static HOLDER: RefCell<Option<Arc<RequestAttributes>>> = const { RefCell::new(None) };
}

/// Binds request attributes to the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestContextHolder;

impl RequestContextHolder {
    /// Returns the attributes bound to the current thread, if any.
    #[must_use]
    pub fn current() -> Option<Arc<RequestAttributes>> {
        HOLDER.with(|holder| holder.borrow().clone())
    }

    /// Returns the attributes bound to the current thread.
    ///
    /// # Errors
    ///
    /// Returns `NoRequestAttributes` if nothing is bound.
    pub fn current_or_err() -> Result<Arc<RequestAttributes>, ContextflowError> {
        Self::current().ok_or(ContextflowError::NoRequestAttributes)
    }

    /// Binds attributes to the current thread.
    pub fn set(attributes: Arc<RequestAttributes>) {
        Self::replace(Some(attributes));
    }

    /// Unbinds whatever attributes the current thread holds.
    pub fn reset() {
        Self::replace(None);
    }

    /// Replaces the binding, returning the previous one.
    pub fn replace(attributes: Option<Arc<RequestAttributes>>) -> Option<Arc<RequestAttributes>> {
        HOLDER
            .try_with(|holder| std::mem::replace(&mut *holder.borrow_mut(), attributes))
            .unwrap_or_default()
    }

    /// Binds `attributes` until the returned scope is dropped, then restores
    /// the previous binding.
    pub fn scope(attributes: Option<Arc<RequestAttributes>>) -> RequestScope {
        RequestScope {
            previous: Some(Self::replace(attributes)),
            _thread_bound: PhantomData,
        }
    }
}

/// Restores the previous request binding on drop.
#[must_use = "dropping the scope restores the previous binding immediately"]
#[derive(Debug)]
pub struct RequestScope {
    previous: Option<Option<Arc<RequestAttributes>>>,
    _thread_bound: PhantomData<*const ()>,
}

impl Drop for RequestScope {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            RequestContextHolder::replace(previous);
        }
    }
}
