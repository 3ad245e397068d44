use crate::{
    ErrorHandler, FindError, Pattern,
    fs::AsyncFileSystem,
    walk::{
        finder::Finder,
        types::{BoxFuture, Target},
    },
};
use core::future::IntoFuture;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

/**
 A pending async walk that delivers every match as one list.

 Nothing happens until the handle is awaited, and the walk itself starts one scheduler turn
 later. An error handler installed with [`Collect::error`] applies to this call only.

 # Examples
 ```no_run
 # async fn run() -> Result<(), rfind::FindError> {
 use rfind::{Finder, Pattern};

 let finder = Finder::new();
 let logs = finder
     .file("/var/log")
     .matching(Pattern::regex(r"\.log$")?)
     .error(rfind::ignore)
     .await?;
 # Ok(())
 # }
 ```
*/
#[must_use = "futures do nothing unless awaited"]
pub struct Collect<'f, F> {
    finder: &'f Finder<F>,
    target: Target,
    root: PathBuf,
    pattern: Pattern,
    handler: Option<ErrorHandler>,
}

impl<'f, F: AsyncFileSystem> Collect<'f, F> {
    pub(crate) fn new(finder: &'f Finder<F>, target: Target, root: &Path) -> Self {
        Self {
            finder,
            target,
            root: root.to_path_buf(),
            pattern: Pattern::Any,
            handler: None,
        }
    }

    /// Keep only entries matching `pattern`, applied once the walk is done
    pub fn matching<T: Into<Pattern>>(mut self, pattern: T) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// Handle failures of this call with `handler` instead of the finder's handler
    pub fn error<H>(mut self, handler: H) -> Self
    where
        H: Fn(FindError) -> Result<(), FindError> + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    async fn run(self) -> Result<Vec<PathBuf>, FindError> {
        tokio::task::yield_now().await;

        let mut found = Vec::new();
        {
            let handler = self
                .handler
                .as_deref()
                .unwrap_or_else(|| self.finder.handler());
            let mut push = |path: PathBuf| found.push(path);
            let mut walk = self.finder.walk(self.target, handler, &mut push);
            walk.run_async(&self.root).await?;
        }

        if !self.pattern.is_any() {
            found.retain(|path| self.pattern.matches(path));
        }
        Ok(found)
    }
}

impl<'f, F: AsyncFileSystem> IntoFuture for Collect<'f, F> {
    type Output = Result<Vec<PathBuf>, FindError>;
    type IntoFuture = BoxFuture<'f, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.run())
    }
}

/**
 A pending async walk that calls an action once per match, in traversal order.

 Entries come depth first, left to right in listing order: a directory's whole subtree is
 pushed before its next sibling. The [`Each::end`] callback runs once, after the last action,
 and only if the walk completed.

 # Examples
 ```no_run
 # async fn run() -> Result<(), rfind::FindError> {
 use rfind::Finder;

 let finder = Finder::new();
 finder
     .each_file("/tmp/t", |path| println!("{}", path.display()))
     .matching("b.txt")
     .end(|| println!("done"))
     .await?;
 # Ok(())
 # }
 ```
*/
#[must_use = "futures do nothing unless awaited"]
pub struct Each<'f, F, A> {
    finder: &'f Finder<F>,
    target: Target,
    root: PathBuf,
    pattern: Pattern,
    action: A,
    on_end: Option<Box<dyn FnOnce() + Send + 'f>>,
    handler: Option<ErrorHandler>,
}

impl<'f, F, A> Each<'f, F, A>
where
    F: AsyncFileSystem,
    A: FnMut(PathBuf) + Send,
{
    pub(crate) fn new(finder: &'f Finder<F>, target: Target, root: &Path, action: A) -> Self {
        Self {
            finder,
            target,
            root: root.to_path_buf(),
            pattern: Pattern::Any,
            action,
            on_end: None,
            handler: None,
        }
    }

    /// Only call the action for entries matching `pattern`
    pub fn matching<T: Into<Pattern>>(mut self, pattern: T) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// Run `on_end` once the walk has completed
    pub fn end<E>(mut self, on_end: E) -> Self
    where
        E: FnOnce() + Send + 'f,
    {
        self.on_end = Some(Box::new(on_end));
        self
    }

    /// Handle failures of this call with `handler` instead of the finder's handler
    pub fn error<H>(mut self, handler: H) -> Self
    where
        H: Fn(FindError) -> Result<(), FindError> + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    async fn run(self) -> Result<(), FindError> {
        let Self {
            finder,
            target,
            root,
            pattern,
            mut action,
            on_end,
            handler,
        } = self;

        tokio::task::yield_now().await;
        {
            let handler = handler.as_deref().unwrap_or_else(|| finder.handler());
            let mut filtered = |path: PathBuf| {
                if pattern.matches(&path) {
                    action(path);
                }
            };
            let mut walk = finder.walk(target, handler, &mut filtered);
            walk.run_async(&root).await?;
        }

        if let Some(on_end) = on_end {
            on_end();
        }
        Ok(())
    }
}

impl<'f, F, A> IntoFuture for Each<'f, F, A>
where
    F: AsyncFileSystem,
    A: FnMut(PathBuf) + Send + 'f,
{
    type Output = Result<(), FindError>;
    type IntoFuture = BoxFuture<'f, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.run())
    }
}
