use crate::{
    FindError,
    fs::{AsyncFileSystem, EntryKind},
    walk::{
        resolver::Resolved,
        traverse::Walk,
        types::{BoxFuture, Step, Target},
    },
};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/*
 The async walk runs as a single chain: one directory level is listed, then its entries are
 handled strictly in listing order, and an entry's whole subtree completes before the next
 sibling starts. Nothing is spawned, siblings never run concurrently.
*/
impl<F: AsyncFileSystem + ?Sized> Walk<'_, F> {
    /**
     Walks `root` to completion without blocking.

     Unlike [`Walk::run_sync`], every failure including a missing root goes through the
     handler; the walk only stops early when the handler hands an error back.
    */
    pub(crate) async fn run_async(&mut self, root: &Path) -> Result<(), FindError> {
        debug!(root = %root.display(), target = ?self.target, "starting async traversal");
        self.walk_async(root.to_path_buf(), 0).await?;
        debug!(root = %root.display(), "async traversal finished");
        Ok(())
    }

    async fn listing_root_async(&mut self, root: &Path) -> Result<Option<PathBuf>, FindError> {
        let Some(kind) = self.classify(root)? else {
            return Ok(None);
        };
        let listing = if kind.is_symlink() {
            let resolver = self.resolver();
            match resolver.resolve_async(root).await? {
                Resolved::Path(resolved) => resolved,
                Resolved::Unresolved | Resolved::Failed => return Ok(None),
            }
        } else {
            root.to_path_buf()
        };

        Ok(match self.classify(&listing)? {
            Some(EntryKind::Directory) => Some(listing),
            _ => None,
        })
    }

    async fn step_async(&mut self, entry: &Path) -> Result<Step, FindError> {
        let kind = self.classify(entry)?;
        match kind {
            None => Ok(Step::Skip),
            Some(EntryKind::Directory) => Ok(Step::Dir),
            Some(EntryKind::Symlink) => {
                let resolver = self.resolver();
                let origin = resolver.resolve_async(entry).await?;
                self.link_step(origin)
            }
            Some(_) => Ok(Step::File),
        }
    }

    fn walk_async(&mut self, root: PathBuf, depth: u32) -> BoxFuture<'_, Result<(), FindError>> {
        Box::pin(async move {
            if !self.fs.exists(&root) {
                self.report(FindError::NotExist(root))?;
                return Ok(());
            }
            match self.listing_root_async(&root).await? {
                Some(listing) => self.list_async(root, listing, depth).await,
                None => Ok(()),
            }
        })
    }

    fn list_async(
        &mut self,
        root: PathBuf,
        listing: PathBuf,
        depth: u32,
    ) -> BoxFuture<'_, Result<(), FindError>> {
        Box::pin(async move {
            trace!(dir = %listing.display(), "listing");
            let fs = self.fs;
            let names = match fs.read_dir_async(&listing).await {
                Ok(names) => names,
                Err(e) => {
                    // a swallowed listing failure leaves an empty level
                    self.report(FindError::from_io(&listing, e))?;
                    Vec::new()
                }
            };

            let depth = depth + 1;
            for name in names {
                let entry = root.join(name);
                match self.step_async(&entry).await? {
                    Step::Skip => {}
                    Step::File => self.emit(&entry, Target::File),
                    Step::Dir => {
                        self.emit(&entry, Target::Directory);
                        if self.may_descend(depth) {
                            self.walk_async(entry, depth).await?;
                        }
                    }
                    Step::LinkedDir { target, descend } => {
                        self.emit(&entry, Target::Directory);
                        if descend && self.may_descend(depth) {
                            self.list_async(entry, target, depth).await?;
                        }
                    }
                }
            }
            Ok(())
        })
    }
}
