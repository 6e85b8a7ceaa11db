//! Revealing paths in the platform file browser.

use std::path::Path;

use crate::model::RevealOutcome;
use crate::platform::current::browse;
use crate::utils::spawn_detached;

/// Launches the file browser. Launches are fire-and-forget.
pub trait FileBrowser {
    /// Whether the browser can open a folder with a file pre-selected.
    fn supports_select(&self) -> bool;

    fn open_directory(&self, dir: &Path);

    fn select_file(&self, file: &Path);
}

/// Explorer, Finder or the desktop's default handler, depending on platform.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemFileBrowser;

impl FileBrowser for SystemFileBrowser {
    fn supports_select(&self) -> bool {
        browse::SUPPORTS_SELECT
    }

    fn open_directory(&self, dir: &Path) {
        let label = format!("file browser for {}", dir.display());
        spawn_detached(browse::open_directory_command(dir), &label);
    }

    fn select_file(&self, file: &Path) {
        let label = format!("file browser selecting {}", file.display());
        spawn_detached(browse::select_file_command(file), &label);
    }
}

pub struct Locator<B: FileBrowser = SystemFileBrowser> {
    browser: B,
}

impl Locator<SystemFileBrowser> {
    pub fn system() -> Self {
        Self::new(SystemFileBrowser)
    }
}

impl<B: FileBrowser> Locator<B> {
    pub fn new(browser: B) -> Self {
        Self { browser }
    }

    pub fn browser(&self) -> &B {
        &self.browser
    }

    /// Show `path` in the file browser.
    ///
    /// Missing paths are ignored. Files are selected in their folder where the
    /// browser supports it, otherwise the containing folder is opened.
    pub fn reveal(&self, path: &Path) -> RevealOutcome {
        if !path.exists() {
            log::debug!("not revealing {}: path no longer exists", path.display());
            return RevealOutcome::Missing;
        }

        if path.is_dir() {
            self.browser.open_directory(path);
            return RevealOutcome::OpenedDirectory(path.to_path_buf());
        }

        if self.browser.supports_select() {
            self.browser.select_file(path);
            return RevealOutcome::SelectedFile(path.to_path_buf());
        }

        match path.parent() {
            Some(parent) => {
                self.browser.open_directory(parent);
                RevealOutcome::OpenedDirectory(parent.to_path_buf())
            }
            None => RevealOutcome::Missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::fs;
    use std::path::PathBuf;

    use super::*;

    #[derive(Debug, PartialEq)]
    enum Launch {
        Directory(PathBuf),
        Select(PathBuf),
    }

    struct RecordingBrowser {
        select: bool,
        launches: RefCell<Vec<Launch>>,
    }

    impl RecordingBrowser {
        fn new(select: bool) -> Self {
            Self {
                select,
                launches: RefCell::new(Vec::new()),
            }
        }
    }

    impl FileBrowser for RecordingBrowser {
        fn supports_select(&self) -> bool {
            self.select
        }

        fn open_directory(&self, dir: &Path) {
            self.launches
                .borrow_mut()
                .push(Launch::Directory(dir.to_path_buf()));
        }

        fn select_file(&self, file: &Path) {
            self.launches
                .borrow_mut()
                .push(Launch::Select(file.to_path_buf()));
        }
    }

    #[test]
    fn missing_path_launches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let locator = Locator::new(RecordingBrowser::new(true));

        let outcome = locator.reveal(&dir.path().join("gone.msg"));
        assert_eq!(outcome, RevealOutcome::Missing);
        assert!(locator.browser().launches.borrow().is_empty());
    }

    #[test]
    fn directory_is_opened_directly() {
        let dir = tempfile::tempdir().unwrap();
        let locator = Locator::new(RecordingBrowser::new(true));

        let outcome = locator.reveal(dir.path());
        assert_eq!(outcome, RevealOutcome::OpenedDirectory(dir.path().to_path_buf()));
        assert_eq!(
            *locator.browser().launches.borrow(),
            vec![Launch::Directory(dir.path().to_path_buf())]
        );
    }

    #[test]
    fn file_is_selected_when_supported() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("jobA.msg");
        fs::write(&file, "").unwrap();
        let locator = Locator::new(RecordingBrowser::new(true));

        assert_eq!(locator.reveal(&file), RevealOutcome::SelectedFile(file.clone()));
        assert_eq!(*locator.browser().launches.borrow(), vec![Launch::Select(file)]);
    }

    #[test]
    fn file_falls_back_to_parent_without_select() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("jobA.msg");
        fs::write(&file, "").unwrap();
        let locator = Locator::new(RecordingBrowser::new(false));

        let outcome = locator.reveal(&file);
        assert_eq!(outcome, RevealOutcome::OpenedDirectory(dir.path().to_path_buf()));
        assert_eq!(
            *locator.browser().launches.borrow(),
            vec![Launch::Directory(dir.path().to_path_buf())]
        );
    }
}
