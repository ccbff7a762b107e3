//! Recursive directory browser.
//!
//! Walks a folder tree on top of a provider's paginated single-level
//! listing. Subfolders are listed concurrently; every branch appends into
//! one shared container guarded by a mutex, so `ListOptions::add` always
//! sees a consistent count. Once the max-results cap is hit a shared stop
//! flag prevents any further listing calls.
//!
//! With concurrent recursion the entries kept when the cap truncates a
//! batch depend on which branch finishes first. That non-determinism is
//! accepted: callers asking for "at most N" get exactly N when enough
//! entries exist, but not a stable selection.

use futures::future::{try_join_all, BoxFuture};
use futures::FutureExt;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

use crate::blob::Blob;
use crate::list_options::ListOptions;
use crate::storage::BlobPrimitives;
use crate::{path, Result};

/// One recursive listing over a provider
pub struct DirectoryBrowser<'a, P: ?Sized> {
    lister: &'a P,
    options: &'a ListOptions,
    container: Mutex<Vec<Blob>>,
    stopped: AtomicBool,
}

impl<'a, P> DirectoryBrowser<'a, P>
where
    P: BlobPrimitives + ?Sized,
{
    pub fn new(lister: &'a P, options: &'a ListOptions) -> Self {
        Self {
            lister,
            options,
            container: Mutex::new(Vec::new()),
            stopped: AtomicBool::new(false),
        }
    }

    /// Run the walk and return everything accumulated.
    pub async fn list(self) -> Result<Vec<Blob>> {
        self.options.validate()?;

        let root = path::normalize(&self.options.folder_path);
        self.list_folder(root).await?;

        Ok(self.container.into_inner())
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    fn list_folder(&self, folder: String) -> BoxFuture<'_, Result<()>> {
        async move {
            if self.is_stopped() {
                return Ok(());
            }

            let entries = match self.list_level(&folder).await {
                Ok(entries) => entries,
                Err(e) if e.is_not_found() || e.is_access_denied() => {
                    warn!("Skipping folder {}: {}", folder, e);
                    return Ok(());
                }
                Err(e) => return Err(e),
            };

            let subfolders: Vec<String> = if self.options.recurse && !self.lister.lists_recursively()
            {
                entries
                    .iter()
                    .filter(|b| b.is_folder())
                    .map(|b| b.full_path())
                    .collect()
            } else {
                Vec::new()
            };

            let batch: Vec<Blob> = entries
                .into_iter()
                .filter(|b| self.options.is_match(b))
                .collect();

            {
                let mut container = self.container.lock();
                if self.is_stopped() {
                    return Ok(());
                }
                if self.options.add(&mut container, batch) {
                    debug!("Listing limit reached at {}", folder);
                    self.stopped.store(true, Ordering::Release);
                    return Ok(());
                }
            }

            try_join_all(subfolders.into_iter().map(|sub| self.list_folder(sub))).await?;
            Ok(())
        }
        .boxed()
    }

    /// Collect every page of one folder level.
    async fn list_level(&self, folder: &str) -> Result<Vec<Blob>> {
        debug!("Browsing folder: {}", folder);

        let mut entries = Vec::new();
        let mut continuation: Option<String> = None;
        loop {
            let page = self
                .lister
                .list_at(folder, self.options, continuation.as_deref())
                .await?;
            entries.extend(page.blobs);

            match page.continuation {
                Some(token) if !self.is_stopped() => continuation = Some(token),
                _ => break,
            }
        }

        Ok(entries)
    }
}
