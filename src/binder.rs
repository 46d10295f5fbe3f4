//! Swaps a registry binding for the mock connection.

use std::sync::Arc;

use crate::{
    DatabaseConnection, Error, ExpectationStore, MockConnection, MockOptions, Registry, Result,
};

/// Rebinds `name` to a shared factory that always returns `connection`.
///
/// Any previous binding is dropped first; installing again just replaces it.
pub fn install<R>(registry: &mut R, name: &str, connection: Arc<dyn DatabaseConnection>)
where
    R: Registry + ?Sized,
{
    registry.remove(name);
    registry.set_shared(name, Box::new(move || Arc::clone(&connection)));

    #[cfg(feature = "tracing")]
    tracing::debug!(%name, "mock connection installed");
}

/// Replaces the connection bound under `name` with a [`MockConnection`]
/// answering from `store`.
///
/// The mock carries the replaced connection's dialect, so SQL helpers the
/// application calls on it keep working.
pub fn mock_db<R>(
    registry: &mut R,
    name: &str,
    store: &ExpectationStore,
    options: &MockOptions,
) -> Result<Arc<MockConnection>>
where
    R: Registry + ?Sized,
{
    let current = registry
        .get(name)
        .ok_or_else(|| Error::ServiceNotFound(name.to_owned()))?;

    let mock = MockConnection::new(store.clone(), current.dialect()).with_options(options.clone());
    let mock = Arc::new(mock);
    install(registry, name, mock.clone());
    Ok(mock)
}
