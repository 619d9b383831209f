//! Test utilities for the backend crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`, via
//! the `test-support` feature): in-memory port adapters plus capability-safe
//! file helpers.

use std::sync::{Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub mod cap_fs {
    //! Capability-safe filesystem helpers for tests.
    //!
    //! The backend reads files only through `cap_std::fs::Dir`; tests writing
    //! fixtures follow the same rule.

    use std::ffi::OsString;
    use std::io;
    use std::path::Path;

    use cap_std::{ambient_authority, fs::Dir};

    /// Write bytes to a file through `cap_std`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use account_service::test_support::cap_fs::write_file;
    ///
    /// let path = std::env::temp_dir().join("cap-fs-write-example.yml");
    /// write_file(&path, b"host: localhost\n")?;
    /// # Ok::<(), std::io::Error>(())
    /// ```
    pub fn write_file(path: &Path, contents: &[u8]) -> io::Result<()> {
        let (parent, file_name) = parent_and_file_name(path)?;
        let directory = Dir::open_ambient_dir(parent, ambient_authority())?;
        directory.write(Path::new(&file_name), contents)
    }

    /// Remove a file, treating a missing file as success.
    pub fn remove_file(path: &Path) -> io::Result<()> {
        let (parent, file_name) = parent_and_file_name(path)?;
        let directory = Dir::open_ambient_dir(parent, ambient_authority())?;
        match directory.remove_file(Path::new(&file_name)) {
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    fn parent_and_file_name(path: &Path) -> io::Result<(&Path, OsString)> {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        let file_name = path.file_name().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "path must include a file or directory name",
            )
        })?;
        Ok((parent, file_name.to_os_string()))
    }
}

mod accounts {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{SubsecRound, Utc};
    use pagination::PageWindow;

    use crate::domain::ports::{AccountRepository, PersistenceError};
    use crate::domain::{Account, AccountPage, NamespaceRef};

    use super::lock;

    /// Account repository keeping rows in insertion order.
    #[derive(Debug, Default)]
    pub struct InMemoryAccountRepository {
        rows: Mutex<Vec<Account>>,
    }

    impl InMemoryAccountRepository {
        /// Store `namespace` as a new account and return it.
        pub fn insert(&self, namespace: NamespaceRef) -> Account {
            let mut rows = lock(&self.rows);
            let now = Utc::now().trunc_subsecs(0);
            let account = Account {
                id: i64::try_from(rows.len()).unwrap_or(i64::MAX - 1) + 1,
                created_at: now,
                updated_at: now,
                deleted_at: None,
                namespace,
            };
            rows.push(account.clone());
            account
        }

        /// Number of stored accounts.
        pub fn len(&self) -> usize {
            lock(&self.rows).len()
        }

        /// Whether nothing is stored.
        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        /// Snapshot of every stored account.
        pub fn accounts(&self) -> Vec<Account> {
            lock(&self.rows).clone()
        }
    }

    #[async_trait]
    impl AccountRepository for InMemoryAccountRepository {
        async fn list(&self, window: PageWindow) -> Result<AccountPage, PersistenceError> {
            let rows = lock(&self.rows);
            let live: Vec<&Account> = rows.iter().filter(|a| a.deleted_at.is_none()).collect();
            let skip = usize::try_from(window.offset).unwrap_or(0);
            let take = window
                .limit
                .map_or(usize::MAX, |limit| usize::try_from(limit).unwrap_or(0));
            Ok(AccountPage {
                count: i64::try_from(live.len()).unwrap_or(i64::MAX),
                accounts: live.into_iter().skip(skip).take(take).cloned().collect(),
            })
        }

        async fn create(&self, namespace: &NamespaceRef) -> Result<Account, PersistenceError> {
            Ok(self.insert(namespace.clone()))
        }
    }
}

mod actions {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::domain::ActionRecord;
    use crate::domain::ports::{ActionRepository, PersistenceError};

    use super::lock;

    /// Action repository recording every write.
    ///
    /// Inserts can be made to fail to exercise the insert-on-save path.
    #[derive(Debug, Default)]
    pub struct RecordingActionRepository {
        fail_create: bool,
        created: Mutex<Vec<ActionRecord>>,
        saved: Mutex<Vec<ActionRecord>>,
    }

    impl RecordingActionRepository {
        /// Repository whose `create` always fails with a connection error.
        pub fn failing_inserts() -> Self {
            Self {
                fail_create: true,
                ..Self::default()
            }
        }

        /// Records passed to `create`, in call order.
        pub fn created(&self) -> Vec<ActionRecord> {
            lock(&self.created).clone()
        }

        /// Records passed to `save`, in call order.
        pub fn saved(&self) -> Vec<ActionRecord> {
            lock(&self.saved).clone()
        }

        fn next_id(&self) -> i64 {
            i64::try_from(lock(&self.created).len() + lock(&self.saved).len())
                .unwrap_or(i64::MAX - 1)
                + 1
        }
    }

    #[async_trait]
    impl ActionRepository for RecordingActionRepository {
        async fn create(&self, record: &ActionRecord) -> Result<i64, PersistenceError> {
            if self.fail_create {
                return Err(PersistenceError::connection("actions table unavailable"));
            }
            let id = self.next_id();
            lock(&self.created).push(record.clone());
            Ok(id)
        }

        async fn save(&self, record: &ActionRecord) -> Result<i64, PersistenceError> {
            let id = match record.id {
                Some(id) => id,
                None => self.next_id(),
            };
            lock(&self.saved).push(record.clone());
            Ok(id)
        }
    }
}

mod namespaces {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::domain::NamespaceRef;
    use crate::domain::ports::{NamespaceInfo, NamespaceLookup, NamespaceLookupError};

    use super::lock;

    /// Namespace lookup answering from a fixed outcome.
    #[derive(Debug)]
    pub struct StubNamespaceLookup {
        outcome: Result<NamespaceInfo, NamespaceLookupError>,
        calls: Mutex<Vec<NamespaceRef>>,
    }

    impl StubNamespaceLookup {
        /// Every namespace exists.
        pub fn found() -> Self {
            Self {
                outcome: Ok(NamespaceInfo::new()),
                calls: Mutex::new(Vec::new()),
            }
        }

        /// Every lookup fails with `error`.
        pub fn failing(error: NamespaceLookupError) -> Self {
            Self {
                outcome: Err(error),
                calls: Mutex::new(Vec::new()),
            }
        }

        /// Namespaces looked up so far.
        pub fn calls(&self) -> Vec<NamespaceRef> {
            lock(&self.calls).clone()
        }
    }

    #[async_trait]
    impl NamespaceLookup for StubNamespaceLookup {
        async fn namespace_info(
            &self,
            namespace: &NamespaceRef,
        ) -> Result<NamespaceInfo, NamespaceLookupError> {
            lock(&self.calls).push(namespace.clone());
            self.outcome.clone()
        }
    }
}

mod reporters {
    use std::sync::Mutex;

    use crate::domain::ports::{ErrorReport, ErrorReporter};

    use super::lock;

    /// Error reporter keeping every report.
    #[derive(Debug, Default)]
    pub struct RecordingErrorReporter {
        reports: Mutex<Vec<ErrorReport>>,
    }

    impl RecordingErrorReporter {
        /// Reports received so far.
        pub fn reports(&self) -> Vec<ErrorReport> {
            lock(&self.reports).clone()
        }
    }

    impl ErrorReporter for RecordingErrorReporter {
        fn report(&self, report: &ErrorReport) {
            lock(&self.reports).push(report.clone());
        }
    }
}

pub use accounts::InMemoryAccountRepository;
pub use actions::RecordingActionRepository;
pub use namespaces::StubNamespaceLookup;
pub use reporters::RecordingErrorReporter;
