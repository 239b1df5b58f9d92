//! Priority merge over several storages, with hot-swappable members.

use std::any::Any;
use std::ptr;
use std::sync::Arc;

use parking_lot::RwLock;

use super::{Storage, nil_equality, storage_eq};
use crate::bind::{Bind, BindContext};
use crate::error::{StorageError, StorageResult};

type Member = Option<Arc<dyn Storage>>;

/// Ordered set of storages merged by priority: later members win.
///
/// Binding replays every non-nil member against the same destination, so a
/// field is overwritten only when a later member actually supplies it. Member
/// slots can be swapped at runtime with [`CompositeStorage::update_storage`],
/// which reports whether the content changed.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use confstore::{CompositeStorage, Storage, StorageExt, TreeStorage};
/// use serde_json::json;
///
/// let base: Arc<dyn Storage> = Arc::new(TreeStorage::new(json!({"host": "a", "port": 1})));
/// let local: Arc<dyn Storage> = Arc::new(TreeStorage::new(json!({"port": 2})));
/// let merged = CompositeStorage::new([Some(base), Some(local)]);
/// let value: serde_json::Value = merged.get().expect("merge binds");
/// assert_eq!(value, json!({"host": "a", "port": 2}));
/// ```
#[derive(Debug, Default)]
pub struct CompositeStorage {
    members: RwLock<Vec<Member>>,
}

impl CompositeStorage {
    /// Compose `members`, lowest priority first. `None` slots act as nil
    /// storages.
    #[must_use]
    pub fn new(members: impl IntoIterator<Item = Member>) -> Self {
        Self {
            members: RwLock::new(members.into_iter().collect()),
        }
    }

    /// Append a member with the highest priority so far.
    pub fn push(&self, member: Member) {
        self.members.write().push(member);
    }

    /// Number of member slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.read().len()
    }

    /// Whether there are no member slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.read().is_empty()
    }

    /// Snapshot of the member slots.
    #[must_use]
    pub fn members(&self) -> Vec<Member> {
        self.members.read().clone()
    }

    /// Replace the member at `index`, returning whether content changed.
    ///
    /// Two nil members, or two members that compare equal, count as no
    /// change.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Composition`] when `index` is out of range.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use confstore::{CompositeStorage, TreeStorage};
    /// use serde_json::json;
    ///
    /// let composite = CompositeStorage::new([None]);
    /// let fresh = Arc::new(TreeStorage::new(json!({"a": 1})));
    /// assert!(composite.update_storage(0, Some(fresh.clone())).expect("slot exists"));
    /// assert!(!composite.update_storage(0, Some(fresh)).expect("slot exists"));
    /// assert!(composite.update_storage(1, None).is_err());
    /// ```
    pub fn update_storage(&self, index: usize, member: Member) -> StorageResult<bool> {
        let mut members = self.members.write();
        let len = members.len();
        let slot = members.get_mut(index).ok_or_else(|| {
            StorageError::composition(format!(
                "member index {index} is out of range for {len} members"
            ))
        })?;
        let changed = !storage_eq(slot.as_deref(), member.as_deref());
        *slot = member;
        drop(members);
        tracing::debug!(index, changed, "replaced composite member");
        Ok(changed)
    }

    /// Compose the sub-storage of every member at `path`.
    #[must_use]
    pub fn sub(&self, path: &str) -> Self {
        Self::new(
            self.members()
                .into_iter()
                .map(|member| member.map(|storage| storage.sub(path))),
        )
    }

    fn active(members: &[Member]) -> impl Iterator<Item = (usize, &Arc<dyn Storage>)> {
        members
            .iter()
            .enumerate()
            .filter_map(|(index, member)| member.as_ref().map(|storage| (index, storage)))
            .filter(|(_, storage)| !storage.is_nil())
    }
}

impl Storage for CompositeStorage {
    fn sub(&self, path: &str) -> Arc<dyn Storage> {
        Arc::new(Self::sub(self, path))
    }

    /// Runs one root defaults pass when any live member enables defaults,
    /// then overlays the members in priority order.
    fn convert_to(&self, dest: &mut dyn Bind) -> StorageResult<()> {
        let members = self.members();
        if Self::active(&members).any(|(_, storage)| storage.defaults_enabled()) {
            dest.apply_defaults(&BindContext::new(true))?;
        }
        replay(&members, dest)
    }

    fn overlay(&self, dest: &mut dyn Bind) -> StorageResult<()> {
        replay(&self.members(), dest)
    }

    fn equals(&self, other: &dyn Storage) -> bool {
        let Some(that) = other.as_any().downcast_ref::<Self>() else {
            return nil_equality(self, other).unwrap_or(false);
        };
        if ptr::eq(self, that) {
            return true;
        }
        // Member layout matters even when every member is nil.
        let (mine, theirs) = (self.members(), that.members());
        mine.len() == theirs.len()
            && mine
                .iter()
                .zip(&theirs)
                .all(|(a, b)| storage_eq(a.as_deref(), b.as_deref()))
    }

    fn is_nil(&self) -> bool {
        Self::active(&self.members.read()).next().is_none()
    }

    fn defaults_enabled(&self) -> bool {
        Self::active(&self.members.read()).any(|(_, storage)| storage.defaults_enabled())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn replay(members: &[Member], dest: &mut dyn Bind) -> StorageResult<()> {
    for (index, storage) in CompositeStorage::active(members) {
        storage
            .overlay(dest)
            .map_err(|err| StorageError::member(index, err))?;
    }
    Ok(())
}
