//! Named service bindings the application resolves its connection from.

use std::{collections::HashMap, fmt, sync::Arc};

use crate::DatabaseConnection;

/// Builds the connection bound under a name.
pub type Factory = Box<dyn Fn() -> Arc<dyn DatabaseConnection> + Send + Sync>;

/// Minimal dependency container contract.
pub trait Registry {
    /// Resolves the connection bound under `name`.
    fn get(&mut self, name: &str) -> Option<Arc<dyn DatabaseConnection>>;

    /// Drops the binding under `name`, if any.
    fn remove(&mut self, name: &str);

    /// Binds `factory` under `name`; it runs at most once and its result is
    /// shared by every later `get`.
    fn set_shared(&mut self, name: &str, factory: Factory);

    fn has(&self, name: &str) -> bool;
}

enum Binding {
    Pending(Factory),
    Resolved(Arc<dyn DatabaseConnection>),
}

/// In-memory [`Registry`].
#[derive(Default)]
pub struct Container {
    bindings: HashMap<String, Binding>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds an already built connection under `name`.
    pub fn set_instance(&mut self, name: &str, connection: Arc<dyn DatabaseConnection>) {
        self.bindings
            .insert(name.to_owned(), Binding::Resolved(connection));
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.bindings.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("Container").field("bindings", &names).finish()
    }
}

impl Registry for Container {
    fn get(&mut self, name: &str) -> Option<Arc<dyn DatabaseConnection>> {
        let binding = self.bindings.get_mut(name)?;
        let connection = match &*binding {
            Binding::Resolved(connection) => return Some(Arc::clone(connection)),
            Binding::Pending(factory) => factory(),
        };
        *binding = Binding::Resolved(Arc::clone(&connection));
        Some(connection)
    }

    fn remove(&mut self, name: &str) {
        self.bindings.remove(name);
    }

    fn set_shared(&mut self, name: &str, factory: Factory) {
        self.bindings
            .insert(name.to_owned(), Binding::Pending(factory));
    }

    fn has(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use super::{Container, Registry};
    use crate::{DatabaseConnection, ExpectationStore, MockConnection, SqliteDialect};

    fn mock() -> Arc<dyn DatabaseConnection> {
        Arc::new(MockConnection::new(
            ExpectationStore::new(),
            Arc::new(SqliteDialect),
        ))
    }

    #[test]
    fn shared_factory_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut container = Container::new();
        container.set_shared(
            "db",
            Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                mock()
            }),
        );

        let first = container.get("db").expect("bound");
        let second = container.get("db").expect("bound");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn remove_unbinds() {
        let mut container = Container::new();
        container.set_instance("db", mock());
        assert!(container.has("db"));

        container.remove("db");
        assert!(!container.has("db"));
        assert!(container.get("db").is_none());
        container.remove("db");
        assert!(container.is_empty());
    }

    #[test]
    fn debug_lists_binding_names() {
        let mut container = Container::new();
        container.set_instance("db", mock());
        container.set_instance("replica", mock());
        assert_eq!(
            format!("{container:?}"),
            "Container { bindings: [\"db\", \"replica\"] }"
        );
    }
}
