//! Scoped process-environment application.
//!
//! Handlers that read configuration through `std::env` see the declared
//! environment only while an [`EnvScope`] is alive. Scopes are serialized by
//! a process-wide lock, so concurrent invocations never observe each other's
//! variables or restoration.
//!
//! A task running under [`EnvScope::run`] already holds the lock. Scopes and
//! snapshots taken from that task layer on top of the held scope instead of
//! waiting for it, so a handler can start another invocation.
//! Tasks spawned by such a handler do not inherit the lock.

use std::ffi::OsString;
use std::future::Future;
use std::sync::OnceLock;

use indexmap::IndexMap;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{trace, warn};

tokio::task_local! {
    static LOCK_HELD: ();
}

fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

fn lock_held_by_task() -> bool {
    LOCK_HELD.try_with(|_| ()).is_ok()
}

async fn acquire() -> Option<MutexGuard<'static, ()>> {
    if lock_held_by_task() {
        None
    } else {
        Some(env_lock().lock().await)
    }
}

/// Reads the process environment while no scope is being applied or
/// restored.
///
/// Variables whose name or value is not valid Unicode are left out.
///
/// # Example
///
/// ```
/// let vars = tokio_test::block_on(hermes_core::snapshot_env());
/// assert_eq!(vars.get("PATH").cloned(), std::env::var("PATH").ok());
/// ```
pub async fn snapshot_env() -> IndexMap<String, String> {
    let _lock = acquire().await;
    std::env::vars_os()
        .filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?)))
        .collect()
}

/// Guard that applies variables to the process environment and restores the
/// previous values when dropped.
///
/// # Example
///
/// ```
/// use hermes_core::EnvScope;
/// use indexmap::IndexMap;
///
/// let mut vars = IndexMap::new();
/// vars.insert("HERMES_DOC_SCOPE".to_string(), "inside".to_string());
///
/// tokio_test::block_on(async {
///     let scope = EnvScope::apply(&vars).await;
///     assert_eq!(std::env::var("HERMES_DOC_SCOPE").unwrap(), "inside");
///     drop(scope);
/// });
/// assert!(std::env::var("HERMES_DOC_SCOPE").is_err());
/// ```
#[derive(Debug)]
pub struct EnvScope {
    saved: Vec<(String, Option<OsString>)>,
    _lock: Option<MutexGuard<'static, ()>>,
}

impl EnvScope {
    /// Waits for exclusive access, then applies the variables.
    ///
    /// Inside [`EnvScope::run`] the task already has exclusive access, and
    /// the variables are layered over the running scope.
    ///
    /// Names that the platform cannot store (empty, containing `=` or NUL)
    /// and values containing NUL are skipped with a warning.
    pub async fn apply(vars: &IndexMap<String, String>) -> Self {
        let lock = acquire().await;
        let mut saved = Vec::with_capacity(vars.len());

        for (name, value) in vars {
            if !is_settable(name, value) {
                warn!(name = %name, "skipping environment variable that cannot be set");
                continue;
            }
            saved.push((name.clone(), std::env::var_os(name)));
            std::env::set_var(name, value);
        }

        trace!(
            applied = saved.len(),
            nested = lock.is_none(),
            "environment scope entered"
        );

        Self { saved, _lock: lock }
    }

    /// Runs a future with the variables applied, restoring them when it
    /// completes.
    ///
    /// Invocations started by the future see the variables and do not wait
    /// for this scope to end.
    ///
    /// # Example
    ///
    /// ```
    /// use hermes_core::EnvScope;
    /// use indexmap::IndexMap;
    ///
    /// let mut outer = IndexMap::new();
    /// outer.insert("HERMES_DOC_RUN".to_string(), "outer".to_string());
    /// let mut inner = IndexMap::new();
    /// inner.insert("HERMES_DOC_RUN".to_string(), "inner".to_string());
    ///
    /// let seen = tokio_test::block_on(EnvScope::run(&outer, async {
    ///     let nested = EnvScope::run(&inner, async { std::env::var("HERMES_DOC_RUN") }).await;
    ///     (nested.unwrap(), std::env::var("HERMES_DOC_RUN").unwrap())
    /// }));
    /// assert_eq!(seen, ("inner".to_string(), "outer".to_string()));
    /// ```
    pub async fn run<F: Future>(vars: &IndexMap<String, String>, future: F) -> F::Output {
        let scope = Self::apply(vars).await;
        let output = LOCK_HELD.scope((), future).await;
        drop(scope);
        output
    }

    /// Names of the variables this scope applied.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.saved.iter().map(|(name, _)| name.as_str())
    }
}

impl Drop for EnvScope {
    fn drop(&mut self) {
        for (name, previous) in self.saved.drain(..).rev() {
            match previous {
                Some(value) => std::env::set_var(&name, value),
                None => std::env::remove_var(&name),
            }
        }
        trace!("environment scope restored");
    }
}

fn is_settable(name: &str, value: &str) -> bool {
    !name.is_empty() && !name.contains(['=', '\0']) && !value.contains('\0')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_scope_sets_and_removes_new_variable() {
        let scope = EnvScope::apply(&vars(&[("HERMES_TEST_ENV_NEW", "simple value")])).await;
        assert_eq!(std::env::var("HERMES_TEST_ENV_NEW").unwrap(), "simple value");
        assert_eq!(scope.names().collect::<Vec<_>>(), vec!["HERMES_TEST_ENV_NEW"]);
        drop(scope);
        assert!(std::env::var_os("HERMES_TEST_ENV_NEW").is_none());
    }

    #[tokio::test]
    async fn test_scope_restores_previous_value() {
        {
            let _outer = env_lock().lock().await;
            std::env::set_var("HERMES_TEST_ENV_PREV", "before");
        }

        let scope = EnvScope::apply(&vars(&[("HERMES_TEST_ENV_PREV", "during")])).await;
        assert_eq!(std::env::var("HERMES_TEST_ENV_PREV").unwrap(), "during");
        drop(scope);
        assert_eq!(std::env::var("HERMES_TEST_ENV_PREV").unwrap(), "before");

        std::env::remove_var("HERMES_TEST_ENV_PREV");
    }

    #[tokio::test]
    async fn test_scope_skips_unsettable_names() {
        let scope = EnvScope::apply(&vars(&[("", "x"), ("A=B", "x"), ("HERMES_TEST_ENV_NUL", "a\0b")])).await;
        assert_eq!(scope.names().count(), 0);
    }

    #[tokio::test]
    async fn test_nested_run_does_not_wait_for_outer_scope() {
        let outer = vars(&[("HERMES_TEST_ENV_NESTED", "outer")]);
        let inner = vars(&[("HERMES_TEST_ENV_NESTED", "inner")]);

        let seen = tokio::time::timeout(
            std::time::Duration::from_secs(3),
            EnvScope::run(&outer, async {
                let nested =
                    EnvScope::run(&inner, async { std::env::var("HERMES_TEST_ENV_NESTED") }).await;
                (nested.unwrap(), std::env::var("HERMES_TEST_ENV_NESTED").unwrap())
            }),
        )
        .await
        .expect("nested scope waited on the outer lock");

        assert_eq!(seen, ("inner".to_string(), "outer".to_string()));
        assert!(std::env::var_os("HERMES_TEST_ENV_NESTED").is_none());
    }

    #[tokio::test]
    async fn test_snapshot_waits_for_active_scope() {
        let scope = EnvScope::apply(&vars(&[("HERMES_TEST_ENV_SNAPSHOT", "scoped")])).await;
        let pending = tokio::spawn(snapshot_env());
        tokio::task::yield_now().await;
        drop(scope);

        let snapshot = pending.await.unwrap();
        assert!(!snapshot.contains_key("HERMES_TEST_ENV_SNAPSHOT"));
    }

    #[tokio::test]
    async fn test_snapshot_inside_run_sees_scope() {
        let outer = vars(&[("HERMES_TEST_ENV_SNAPSHOT_RUN", "scoped")]);
        let snapshot = EnvScope::run(&outer, snapshot_env()).await;
        assert_eq!(snapshot["HERMES_TEST_ENV_SNAPSHOT_RUN"], "scoped");
    }

    #[test]
    fn test_is_settable() {
        assert!(is_settable("MY_SIMPLE", "simple value"));
        assert!(is_settable("EMPTY_VALUE", ""));
        assert!(!is_settable("", "x"));
        assert!(!is_settable("A=B", "x"));
        assert!(!is_settable("A", "x\0"));
    }
}
