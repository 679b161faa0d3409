//! Lifecycle hook registration and dispatch.
//!
//! # Responsibility
//! - Store hook callbacks per entity type and lifecycle event.
//! - Dispatch them with the caller's transaction handle.
//!
//! # Invariants
//! - Hooks run in registration order, after the primary statement and
//!   before the enclosing transaction commits.
//! - Dispatch stops at the first failing hook and returns its error
//!   unchanged; the caller drops the transaction, rolling everything back.

use crate::model::blog::{Comment, Post, User};
use crate::model::{EntityKind, RowId};
use crate::repo::RepoResult;
use log::{debug, error};
use rusqlite::Transaction;
use std::fmt::{Debug, Formatter};

pub mod counters;

/// Callback invoked with the open transaction and the affected entity.
pub type HookFn<E> = Box<dyn Fn(&Transaction<'_>, &E) -> RepoResult<()> + Send + Sync>;

/// Mutation after which a hook runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    AfterCreate,
    AfterDelete,
}

impl LifecycleEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AfterCreate => "after_create",
            Self::AfterDelete => "after_delete",
        }
    }
}

struct NamedHook<E> {
    name: &'static str,
    run: HookFn<E>,
}

/// Ordered hook lists for one entity type.
pub struct Hooks<E> {
    after_create: Vec<NamedHook<E>>,
    after_delete: Vec<NamedHook<E>>,
}

impl<E> Default for Hooks<E> {
    fn default() -> Self {
        Self {
            after_create: Vec::new(),
            after_delete: Vec::new(),
        }
    }
}

impl<E> Debug for Hooks<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("after_create", &self.names(LifecycleEvent::AfterCreate))
            .field("after_delete", &self.names(LifecycleEvent::AfterDelete))
            .finish()
    }
}

impl<E> Hooks<E> {
    /// Names of hooks registered for `event`, in dispatch order.
    pub fn names(&self, event: LifecycleEvent) -> Vec<&'static str> {
        self.list(event).iter().map(|hook| hook.name).collect()
    }

    fn list(&self, event: LifecycleEvent) -> &Vec<NamedHook<E>> {
        match event {
            LifecycleEvent::AfterCreate => &self.after_create,
            LifecycleEvent::AfterDelete => &self.after_delete,
        }
    }

    fn list_mut(&mut self, event: LifecycleEvent) -> &mut Vec<NamedHook<E>> {
        match event {
            LifecycleEvent::AfterCreate => &mut self.after_create,
            LifecycleEvent::AfterDelete => &mut self.after_delete,
        }
    }
}

/// Entity types that own a hook list inside [`HookRegistry`].
pub trait HookTarget: Sized + 'static {
    const KIND: EntityKind;

    fn row_id(&self) -> RowId;
    fn hooks(registry: &HookRegistry) -> &Hooks<Self>;
    fn hooks_mut(registry: &mut HookRegistry) -> &mut Hooks<Self>;
}

impl HookTarget for User {
    const KIND: EntityKind = EntityKind::User;

    fn row_id(&self) -> RowId {
        self.id
    }

    fn hooks(registry: &HookRegistry) -> &Hooks<Self> {
        &registry.users
    }

    fn hooks_mut(registry: &mut HookRegistry) -> &mut Hooks<Self> {
        &mut registry.users
    }
}

impl HookTarget for Post {
    const KIND: EntityKind = EntityKind::Post;

    fn row_id(&self) -> RowId {
        self.id
    }

    fn hooks(registry: &HookRegistry) -> &Hooks<Self> {
        &registry.posts
    }

    fn hooks_mut(registry: &mut HookRegistry) -> &mut Hooks<Self> {
        &mut registry.posts
    }
}

impl HookTarget for Comment {
    const KIND: EntityKind = EntityKind::Comment;

    fn row_id(&self) -> RowId {
        self.id
    }

    fn hooks(registry: &HookRegistry) -> &Hooks<Self> {
        &registry.comments
    }

    fn hooks_mut(registry: &mut HookRegistry) -> &mut Hooks<Self> {
        &mut registry.comments
    }
}

/// Hook lists for every blog entity type.
#[derive(Debug, Default)]
pub struct HookRegistry {
    users: Hooks<User>,
    posts: Hooks<Post>,
    comments: Hooks<Comment>,
}

impl HookRegistry {
    /// Creates a registry with no hooks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the derived-counter hooks installed.
    pub fn with_counter_maintenance() -> Self {
        let mut registry = Self::new();
        counters::register(&mut registry);
        registry
    }

    /// Appends a hook for entity type `E` and `event`.
    pub fn register<E: HookTarget>(
        &mut self,
        event: LifecycleEvent,
        name: &'static str,
        hook: impl Fn(&Transaction<'_>, &E) -> RepoResult<()> + Send + Sync + 'static,
    ) -> &mut Self {
        E::hooks_mut(self).list_mut(event).push(NamedHook {
            name,
            run: Box::new(hook),
        });
        self
    }

    /// Names of hooks registered for `E` and `event`, in dispatch order.
    pub fn registered<E: HookTarget>(&self, event: LifecycleEvent) -> Vec<&'static str> {
        E::hooks(self).names(event)
    }

    /// Runs every hook registered for `E` and `event` inside `tx`.
    pub fn dispatch<E: HookTarget>(
        &self,
        event: LifecycleEvent,
        tx: &Transaction<'_>,
        entity: &E,
    ) -> RepoResult<()> {
        for hook in E::hooks(self).list(event) {
            debug!(
                "event=hook_dispatch module=hooks status=start entity={} lifecycle={} hook={} entity_id={}",
                E::KIND,
                event.as_str(),
                hook.name,
                entity.row_id()
            );
            if let Err(err) = (hook.run)(tx, entity) {
                error!(
                    "event=hook_dispatch module=hooks status=error entity={} lifecycle={} hook={} entity_id={} error={}",
                    E::KIND,
                    event.as_str(),
                    hook.name,
                    entity.row_id(),
                    err
                );
                return Err(err);
            }
        }
        Ok(())
    }
}
