#[cfg(test)]
mod tests {
    use crate::fs::MemoryFs;
    use crate::{FindError, Finder, Pattern, Target};
    use std::collections::HashSet;
    use std::env::temp_dir;
    use std::fs;
    use std::os::unix::fs::symlink;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// A fresh directory under the system temp dir, removed up front if a previous run left it
    fn scratch(name: &str) -> PathBuf {
        let dir = temp_dir().join(format!("rfind_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("Failed to create test directory");
        dir
    }

    /// `a.txt` and `sub/b.txt`, the tree most scenarios start from
    fn basic_tree(name: &str) -> PathBuf {
        let root = scratch(name);
        fs::write(root.join("a.txt"), "a").unwrap();
        fs::create_dir(root.join("sub")).unwrap();
        fs::write(root.join("sub/b.txt"), "b").unwrap();
        root
    }

    fn set(paths: Vec<PathBuf>) -> HashSet<PathBuf> {
        paths.into_iter().collect()
    }

    fn paths<const N: usize>(items: [&str; N]) -> HashSet<PathBuf> {
        items.iter().map(PathBuf::from).collect()
    }

    fn swallow(_: FindError) -> Result<(), FindError> {
        Ok(())
    }

    #[test]
    fn missing_root_fails_sync() {
        let root = temp_dir().join("rfind_surely_not_here_at_all");
        let finder = Finder::new();
        assert!(matches!(finder.file_sync(&root), Err(FindError::NotExist(p)) if p == root));
        assert!(matches!(finder.dir_sync(&root), Err(FindError::NotExist(_))));
    }

    #[test]
    fn missing_root_ignores_handler_in_sync_mode() {
        let finder = Finder::init().error_handler(swallow).build();
        let err = finder.file_sync("/rfind/not/here").unwrap_err();
        assert!(err.is_not_exist());
    }

    #[tokio::test]
    async fn missing_root_goes_to_handler_in_async_mode() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let finder = Finder::init()
            .error_handler(move |e| {
                assert!(e.is_not_exist());
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .build();

        let found = finder.file("/rfind/not/here").await.unwrap();
        assert!(found.is_empty());
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_root_fails_async_without_handler() {
        let finder = Finder::new();
        let err = finder.dir("/rfind/not/here").await.unwrap_err();
        assert!(err.is_not_exist());

        let mut called = false;
        let result = finder
            .each_file("/rfind/not/here", |_| {})
            .end(|| called = true)
            .await;
        assert!(result.is_err());
        assert!(!called, "end must not run after a failed walk");
    }

    #[test]
    fn files_only_directory() {
        let root = scratch("files_only");
        for name in ["one", "two", "three"] {
            fs::write(root.join(name), name).unwrap();
        }
        let finder = Finder::new();
        let expected: HashSet<PathBuf> = ["one", "two", "three"]
            .iter()
            .map(|n| root.join(n))
            .collect();
        assert_eq!(set(finder.file_sync(&root).unwrap()), expected);
        assert!(finder.dir_sync(&root).unwrap().is_empty());
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn repeated_calls_agree() {
        let root = basic_tree("idempotent");
        let finder = Finder::new();
        let pattern = Pattern::regex(r"\.txt$").unwrap();
        let first = set(finder.collect_sync(Target::File, &pattern, &root).unwrap());
        let second = set(finder.collect_sync(Target::File, &pattern, &root).unwrap());
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn regex_and_name_filters() {
        let root = scratch("patterns");
        for name in ["a.txt", "b.txt", "a.log"] {
            fs::write(root.join(name), name).unwrap();
        }
        let finder = Finder::new();

        let text = finder
            .file_sync_matching(Pattern::regex(r"\.txt$").unwrap(), &root)
            .unwrap();
        assert_eq!(set(text), set(vec![root.join("a.txt"), root.join("b.txt")]));

        let exact = finder.file_sync_matching("a.txt", &root).unwrap();
        assert_eq!(exact, vec![root.join("a.txt")]);
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn self_loop_terminates() {
        let root = scratch("self_loop");
        symlink(root.join("loop"), root.join("loop")).unwrap();
        let finder = Finder::new();
        assert_eq!(finder.file_sync(&root).unwrap(), vec![root.join("loop")]);
        assert!(finder.dir_sync(&root).unwrap().is_empty());
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn dangling_link_is_only_a_file() {
        let root = scratch("dangling");
        symlink(root.join("nowhere"), root.join("dangling")).unwrap();
        let finder = Finder::new();
        assert_eq!(finder.file_sync(&root).unwrap(), vec![root.join("dangling")]);
        assert!(finder.dir_sync(&root).unwrap().is_empty());
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn end_to_end_sync() {
        let root = basic_tree("end_to_end");
        let finder = Finder::new();
        assert_eq!(
            set(finder.file_sync(&root).unwrap()),
            set(vec![root.join("a.txt"), root.join("sub/b.txt")])
        );
        assert_eq!(finder.dir_sync(&root).unwrap(), vec![root.join("sub")]);
        let _ = fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn end_to_end_async() {
        let root = basic_tree("end_to_end_async");
        let finder = Finder::new();
        assert_eq!(
            set(finder.file(&root).await.unwrap()),
            set(vec![root.join("a.txt"), root.join("sub/b.txt")])
        );
        assert_eq!(finder.dir(&root).await.unwrap(), vec![root.join("sub")]);
        let _ = fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn each_file_order_and_end() {
        // listings come back sorted here, so the depth first order is fixed
        let fs = MemoryFs::new();
        fs.add_file("/tmp/t/a.txt").add_file("/tmp/t/sub/b.txt");
        let finder = Finder::with_filesystem(fs);
        let log = Mutex::new(Vec::new());

        finder
            .each_file("/tmp/t", |path| log.lock().unwrap().push(path))
            .end(|| log.lock().unwrap().push(PathBuf::from("<end>")))
            .await
            .unwrap();

        let log = log.into_inner().unwrap();
        assert_eq!(log, ["/tmp/t/a.txt", "/tmp/t/sub/b.txt", "<end>"].map(PathBuf::from));
    }

    #[tokio::test]
    async fn each_file_on_disk_runs_end_once() {
        let root = basic_tree("each_file");
        let finder = Finder::new();
        let mut seen = Vec::new();
        let mut ends = 0;

        finder
            .each_file(&root, |path| seen.push(path))
            .end(|| ends += 1)
            .await
            .unwrap();

        assert_eq!(ends, 1);
        assert_eq!(set(seen), set(vec![root.join("a.txt"), root.join("sub/b.txt")]));
        let _ = fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn per_call_handler_overrides_the_finder() {
        let finder = Finder::new();
        let found = finder
            .file("/rfind/not/here")
            .error(swallow)
            .await
            .unwrap();
        assert!(found.is_empty());
        // the next call is back to failing loudly
        assert!(finder.file("/rfind/not/here").await.is_err());
    }

    #[tokio::test]
    async fn each_handle_takes_its_own_handler() {
        let finder = Finder::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let mut ends = 0;

        finder
            .each_dir("/rfind/not/here", |_| {})
            .error(move |e| {
                assert!(e.is_not_exist());
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .end(|| ends += 1)
            .await
            .unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(ends, 1);

        // the handler went with the call, the finder still fails loudly
        assert!(finder.each_dir("/rfind/not/here", |_| {}).await.is_err());
    }

    #[test]
    fn symlinked_dirs_are_listed_not_entered_by_default() {
        let root = basic_tree("linked_dir");
        symlink(root.join("sub"), root.join("alias")).unwrap();
        let finder = Finder::new();
        assert_eq!(
            set(finder.dir_sync(&root).unwrap()),
            set(vec![root.join("sub"), root.join("alias")])
        );
        assert_eq!(finder.file_sync(&root).unwrap().len(), 2);

        let following = Finder::init().follow_symlinks(true).build();
        assert_eq!(
            set(following.file_sync(&root).unwrap()),
            set(vec![
                root.join("a.txt"),
                root.join("sub/b.txt"),
                root.join("alias/b.txt"),
            ])
        );
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn following_a_link_to_an_ancestor_terminates() {
        let root = basic_tree("ancestor");
        symlink(&root, root.join("sub/up")).unwrap();
        let finder = Finder::init().follow_symlinks(true).build();
        let files = finder.file_sync(&root).unwrap();
        assert!(files.contains(&root.join("sub/up/a.txt")));
        assert!(files.len() < 10);
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn max_depth_limits_descent() {
        let fs = MemoryFs::new();
        fs.add_file("/d/top").add_file("/d/one/mid").add_file("/d/one/two/low");
        let finder = Finder::init().filesystem(fs).max_depth(Some(1)).build();
        assert_eq!(
            set(finder.file_sync("/d").unwrap()),
            paths(["/d/top"])
        );
        assert_eq!(set(finder.dir_sync("/d").unwrap()), paths(["/d/one"]));
    }

    #[test]
    fn max_depth_none_clears_a_limit() {
        let fs = MemoryFs::new();
        fs.add_file("/d/top").add_file("/d/one/two/low");
        let finder = Finder::init()
            .filesystem(fs)
            .max_depth(Some(1))
            .max_depth(None)
            .build();
        assert_eq!(
            set(finder.file_sync("/d").unwrap()),
            paths(["/d/top", "/d/one/two/low"])
        );
    }

    #[test]
    fn symlinked_root_is_walked() {
        let root = basic_tree("linked_root");
        let alias = temp_dir().join(format!("rfind_linked_root_alias_{}", std::process::id()));
        let _ = fs::remove_file(&alias);
        symlink(&root, &alias).unwrap();
        let files = Finder::new().file_sync(&alias).unwrap();
        assert_eq!(set(files), set(vec![alias.join("a.txt"), alias.join("sub/b.txt")]));
        let _ = fs::remove_file(&alias);
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn file_root_yields_nothing() {
        let root = basic_tree("file_root");
        let finder = Finder::new();
        assert!(finder.file_sync(root.join("a.txt")).unwrap().is_empty());
        let _ = fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn file_root_completes_async() {
        let fs = MemoryFs::new();
        fs.add_file("/x/file");
        let finder = Finder::with_filesystem(fs);
        let mut ended = false;
        finder
            .each_file("/x/file", |_| panic!("nothing to emit"))
            .end(|| ended = true)
            .await
            .unwrap();
        assert!(ended);
    }

    fn memory_tree() -> MemoryFs {
        let fs = MemoryFs::new();
        fs.add_file("/tmp/t/a.txt")
            .add_file("/tmp/t/sub/b.txt")
            .add_file("/tmp/t/sub/deep/c.log")
            .add_file("/tmp/t/z.txt")
            .add_symlink("/tmp/t/loop", "loop")
            .add_symlink("/tmp/t/gone", "/tmp/nowhere")
            .add_symlink("/tmp/t/link", "sub");
        fs
    }

    #[test]
    fn memory_backed_sync() {
        let finder = Finder::with_filesystem(memory_tree());
        assert_eq!(
            set(finder.file_sync("/tmp/t").unwrap()),
            paths([
                "/tmp/t/a.txt",
                "/tmp/t/sub/b.txt",
                "/tmp/t/sub/deep/c.log",
                "/tmp/t/z.txt",
                "/tmp/t/loop",
                "/tmp/t/gone",
            ])
        );
        assert_eq!(
            set(finder.dir_sync("/tmp/t").unwrap()),
            paths(["/tmp/t/sub", "/tmp/t/sub/deep", "/tmp/t/link"])
        );
    }

    #[tokio::test]
    async fn memory_backed_async_order() {
        let finder = Finder::with_filesystem(memory_tree());
        let mut order = Vec::new();
        finder
            .each_file("/tmp/t", |path| order.push(path))
            .await
            .unwrap();
        assert_eq!(
            order,
            [
                "/tmp/t/a.txt",
                "/tmp/t/gone",
                "/tmp/t/loop",
                "/tmp/t/sub/b.txt",
                "/tmp/t/sub/deep/c.log",
                "/tmp/t/z.txt",
            ]
            .map(PathBuf::from)
        );
    }

    #[tokio::test]
    async fn each_dir_filters_with_pattern() {
        let finder = Finder::with_filesystem(memory_tree());
        let mut found = Vec::new();
        finder
            .each_dir("/tmp/t", |path| found.push(path))
            .matching("deep")
            .await
            .unwrap();
        assert_eq!(found, vec![PathBuf::from("/tmp/t/sub/deep")]);
    }

    #[test]
    fn name_regex_and_full_path_regex_differ() {
        let finder = Finder::with_filesystem(memory_tree());
        let by_path = finder
            .file_sync_matching(Pattern::regex("sub").unwrap(), "/tmp/t")
            .unwrap();
        assert_eq!(by_path.len(), 2);
        let by_name = finder
            .file_sync_matching(Pattern::name_regex("sub").unwrap(), "/tmp/t")
            .unwrap();
        assert!(by_name.is_empty());
    }

    #[test]
    fn swallowed_failures_skip_the_branch() {
        let fs = memory_tree();
        fs.fail_on("/tmp/t/sub");

        let strict = Finder::init().filesystem(Arc::new(fs)).build();
        assert!(matches!(
            strict.file_sync("/tmp/t"),
            Err(FindError::AccessDenied { .. })
        ));

        let lenient = Finder::init()
            .filesystem(Arc::clone(strict.filesystem()))
            .error_handler(swallow)
            .build();
        let files = set(lenient.file_sync("/tmp/t").unwrap());
        assert!(files.contains(Path::new("/tmp/t/z.txt")));
        assert!(!files.contains(Path::new("/tmp/t/sub/b.txt")));
    }

    fn failing_link_target() -> MemoryFs {
        let fs = MemoryFs::new();
        fs.add_file("/t/dir/x")
            .add_symlink("/t/link", "dir")
            .add_file("/t/plain")
            .fail_on("/t/dir");
        fs
    }

    #[test]
    fn swallowed_link_failure_skips_the_link() {
        let finder = Finder::init()
            .filesystem(failing_link_target())
            .error_handler(swallow)
            .build();
        assert_eq!(finder.file_sync("/t").unwrap(), vec![PathBuf::from("/t/plain")]);
        assert!(finder.dir_sync("/t").unwrap().is_empty());
    }

    #[tokio::test]
    async fn swallowed_link_failure_skips_the_link_async() {
        let finder = Finder::init()
            .filesystem(failing_link_target())
            .error_handler(swallow)
            .build();
        assert_eq!(finder.file("/t").await.unwrap(), vec![PathBuf::from("/t/plain")]);
        assert!(finder.dir("/t").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn vanished_directory_goes_to_handler_async() {
        let fs = Arc::new(memory_tree());
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&errors);
        let finder = Finder::init()
            .filesystem(Arc::clone(&fs))
            .error_handler(move |e| {
                sink.lock().unwrap().push(e.to_string());
                Ok(())
            })
            .build();

        // removing the subtree as soon as the first file shows up
        let mut seen = Vec::new();
        finder
            .each_file("/tmp/t", |path| {
                if path.ends_with("a.txt") {
                    fs.remove("/tmp/t/sub");
                }
                seen.push(path);
            })
            .await
            .unwrap();
        assert!(!seen.contains(&PathBuf::from("/tmp/t/sub/b.txt")));
        assert!(seen.contains(&PathBuf::from("/tmp/t/z.txt")));
        // `link` now dangles and counts as a file, `sub` itself is reported once
        assert!(seen.contains(&PathBuf::from("/tmp/t/link")));
        assert_eq!(errors.lock().unwrap().len(), 1);
    }

    #[test]
    fn link_depth_zero_leaves_links_as_files() {
        let fs = memory_tree();
        let finder = Finder::init().filesystem(fs).max_link_depth(0).build();
        let dirs = set(finder.dir_sync("/tmp/t").unwrap());
        assert!(!dirs.contains(Path::new("/tmp/t/link")));
        let files = set(finder.file_sync("/tmp/t").unwrap());
        assert!(files.contains(Path::new("/tmp/t/link")));
    }

    #[test]
    fn collect_sync_by_target() {
        let finder = Finder::with_filesystem(memory_tree());
        let dirs = finder
            .collect_sync(Target::Directory, &Pattern::Any, "/tmp/t/sub")
            .unwrap();
        assert_eq!(dirs, vec![PathBuf::from("/tmp/t/sub/deep")]);
    }
}
