//! Environment running [`Task`]s in background.

use std::{
    error::Error,
    future::{Future, IntoFuture},
    iter,
};

use futures::{
    future::{self, LocalBoxFuture},
    FutureExt as _, TryFutureExt as _,
};
use tokio::task;
use tracing as log;

#[cfg(doc)]
use crate::Task;

/// Failure of a background [`Task`].
pub type Failure = Box<dyn Error + 'static>;

/// Environment running [`Task`]s in background on a single thread.
///
/// Resolves once all the spawned [`Task`]s finish, or with the first
/// [`Failure`] of them.
#[derive(Debug, Default)]
pub struct Background {
    /// Local set of [`Task`]s.
    set: task::LocalSet,

    /// Handles of the spawned [`Task`]s, along with their names.
    handles: Vec<(&'static str, task::JoinHandle<Result<(), Failure>>)>,
}

impl Background {
    /// Spawns a new named [`Task`] inside this [`Background`] environment.
    pub fn spawn<F, E>(&mut self, name: &'static str, future: F)
    where
        F: Future<Output = Result<(), E>> + 'static,
        E: Error + 'static,
    {
        log::debug!("spawning `{name}` background task");
        let handle = self
            .set
            .spawn_local(future.map_err(|e| Failure::from(Box::new(e))));
        self.handles.push((name, handle));
    }

    /// Returns the number of [`Task`]s spawned in this [`Background`].
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Indicates whether no [`Task`]s are spawned in this [`Background`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl IntoFuture for Background {
    type Output = Result<(), Failure>;
    type IntoFuture = LocalBoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        let Self { set, handles } = self;
        let handles = handles.into_iter().map(|(name, h)| {
            h.map(move |r| {
                let res = match r {
                    Ok(res) => res,
                    Err(e) => Err(Failure::from(Box::new(e))),
                };
                if let Err(e) = &res {
                    log::error!("`{name}` background task failed: {e}");
                }
                res
            })
            .boxed_local()
        });
        let set = set.map(Ok).boxed_local();
        future::try_join_all(iter::once(set).chain(handles))
            .map_ok(drop)
            .boxed_local()
    }
}

#[cfg(test)]
mod spec {
    use std::{fmt, future::IntoFuture as _};

    use derive_more::{Display, Error};

    use super::Background;

    #[derive(Debug, Display, Error)]
    #[display("boom")]
    struct Boom;

    #[tokio::test]
    async fn resolves_once_tasks_finish() {
        let mut bg = Background::default();
        assert!(bg.is_empty());

        bg.spawn("first", async { Ok::<_, fmt::Error>(()) });
        bg.spawn("second", async { Ok::<_, fmt::Error>(()) });
        assert_eq!(bg.len(), 2);

        bg.into_future().await.unwrap();
    }

    #[tokio::test]
    async fn fails_with_task_failure() {
        let mut bg = Background::default();
        bg.spawn("failing", async { Err::<(), _>(Boom) });

        let err = bg.into_future().await.unwrap_err();

        assert_eq!(err.to_string(), "boom");
    }
}
