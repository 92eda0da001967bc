//! Directory contract for resolving mention ids.
//!
//! The directory is provided by the embedding application (a bot client, an
//! archive index, ...). Lookups may suspend on network I/O; the mention
//! resolver wraps every call in a job-scoped timeout and memoizes results.

use std::sync::Arc;

use crate::error::DirectoryError;

/// Directory scope (a guild/server) mention ids are resolved against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GuildContext {
    /// Guild id.
    pub id: u64,
}

impl GuildContext {
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self { id }
    }
}

/// A channel known to the directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Channel {
    pub id: u64,
    pub name: String,
}

/// A member (or user) known to the directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Member {
    pub id: u64,
    /// Name shown in the guild.
    pub display_name: String,
}

/// A role known to the directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Role {
    pub id: u64,
    pub name: String,
    /// RGB color, `0` meaning no color set.
    pub color: u32,
}

/// Source of channel, member and role data.
///
/// `Ok(None)` is a miss. `Err` values are logged and degrade to the same
/// fallback as a miss, except [`DirectoryError::Unavailable`], which also
/// fails the render job once it completes.
pub trait Directory: Send + Sync {
    /// Look up a channel by id.
    fn channel(
        &self,
        guild: &GuildContext,
        id: u64,
    ) -> impl Future<Output = Result<Option<Channel>, DirectoryError>> + Send;

    /// Look up a member by id, falling back to a user fetch when the
    /// implementation supports one.
    fn member(
        &self,
        guild: &GuildContext,
        id: u64,
    ) -> impl Future<Output = Result<Option<Member>, DirectoryError>> + Send;

    /// Look up a role by id.
    fn role(
        &self,
        guild: &GuildContext,
        id: u64,
    ) -> impl Future<Output = Result<Option<Role>, DirectoryError>> + Send;
}

impl<D: Directory> Directory for &D {
    fn channel(
        &self,
        guild: &GuildContext,
        id: u64,
    ) -> impl Future<Output = Result<Option<Channel>, DirectoryError>> + Send {
        (**self).channel(guild, id)
    }

    fn member(
        &self,
        guild: &GuildContext,
        id: u64,
    ) -> impl Future<Output = Result<Option<Member>, DirectoryError>> + Send {
        (**self).member(guild, id)
    }

    fn role(
        &self,
        guild: &GuildContext,
        id: u64,
    ) -> impl Future<Output = Result<Option<Role>, DirectoryError>> + Send {
        (**self).role(guild, id)
    }
}

impl<D: Directory> Directory for Arc<D> {
    fn channel(
        &self,
        guild: &GuildContext,
        id: u64,
    ) -> impl Future<Output = Result<Option<Channel>, DirectoryError>> + Send {
        (**self).channel(guild, id)
    }

    fn member(
        &self,
        guild: &GuildContext,
        id: u64,
    ) -> impl Future<Output = Result<Option<Member>, DirectoryError>> + Send {
        (**self).member(guild, id)
    }

    fn role(
        &self,
        guild: &GuildContext,
        id: u64,
    ) -> impl Future<Output = Result<Option<Role>, DirectoryError>> + Send {
        (**self).role(guild, id)
    }
}

/// Directory that knows nothing.
///
/// Every lookup is a miss, which is what direct-message exports want.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyDirectory;

impl Directory for EmptyDirectory {
    async fn channel(
        &self,
        _guild: &GuildContext,
        _id: u64,
    ) -> Result<Option<Channel>, DirectoryError> {
        Ok(None)
    }

    async fn member(
        &self,
        _guild: &GuildContext,
        _id: u64,
    ) -> Result<Option<Member>, DirectoryError> {
        Ok(None)
    }

    async fn role(&self, _guild: &GuildContext, _id: u64) -> Result<Option<Role>, DirectoryError> {
        Ok(None)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory directory with call counters and scripted failures.

    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    #[derive(Debug, Default)]
    pub(crate) struct MockDirectory {
        pub channels: HashMap<u64, Channel>,
        pub members: HashMap<u64, Member>,
        pub roles: HashMap<u64, Role>,
        /// Error returned by every lookup when set.
        pub failure: Mutex<Option<DirectoryError>>,
        /// Artificial latency per lookup.
        pub delay: Option<Duration>,
        pub calls: AtomicUsize,
    }

    impl MockDirectory {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn with_channel(mut self, id: u64, name: &str) -> Self {
            self.channels.insert(
                id,
                Channel {
                    id,
                    name: name.to_owned(),
                },
            );
            self
        }

        pub(crate) fn with_member(mut self, id: u64, display_name: &str) -> Self {
            self.members.insert(
                id,
                Member {
                    id,
                    display_name: display_name.to_owned(),
                },
            );
            self
        }

        pub(crate) fn with_role(mut self, id: u64, name: &str, color: u32) -> Self {
            self.roles.insert(
                id,
                Role {
                    id,
                    name: name.to_owned(),
                    color,
                },
            );
            self
        }

        pub(crate) fn failing(self, error: DirectoryError) -> Self {
            *self.failure.lock().unwrap() = Some(error);
            self
        }

        pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        async fn lookup<T: Clone>(
            &self,
            table: &HashMap<u64, T>,
            id: u64,
        ) -> Result<Option<T>, DirectoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let failure = self.failure.lock().unwrap().clone();
            match failure {
                Some(error) => Err(error),
                None => Ok(table.get(&id).cloned()),
            }
        }
    }

    impl Directory for MockDirectory {
        async fn channel(
            &self,
            _guild: &GuildContext,
            id: u64,
        ) -> Result<Option<Channel>, DirectoryError> {
            self.lookup(&self.channels, id).await
        }

        async fn member(
            &self,
            _guild: &GuildContext,
            id: u64,
        ) -> Result<Option<Member>, DirectoryError> {
            self.lookup(&self.members, id).await
        }

        async fn role(
            &self,
            _guild: &GuildContext,
            id: u64,
        ) -> Result<Option<Role>, DirectoryError> {
            self.lookup(&self.roles, id).await
        }
    }
}
