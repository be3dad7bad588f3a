//! File browser controller.
//!
//! [`FileBrowser`] keeps the current directory listing and the single edit
//! session in sync with the server's file store:
//!
//! | Operation | Request                           | On success                        |
//! |-----------|-----------------------------------|-----------------------------------|
//! | `list`    | `GET /file/list?path=P`           | replace path + entries            |
//! | `open`    | `GET /file?path=P` (files only)   | replace editor, new clean session |
//! | `save`    | `PUT /file?path=P` (text body)    | session clean                     |
//! | `reload`  | `POST /file/reload?path=P`        | return server message             |
//! | `create`  | `POST /file?path=P&type=T&name=N` | re-list current directory         |
//!
//! Failures leave every cached field as it was. Opening a file while the
//! session is dirty asks through the [`SessionGuard`] first; navigating into
//! a directory never does.

use tracing::info;

use crate::editor::{Editor, EditorMode};
use crate::error::{decode, failed, ControlError};
use crate::guard::{Prompt, SessionGuard};
use crate::model::{CreateKind, DirectoryListing, EditSession, Entry, EntryType};
use crate::transport::Transport;

/// Result of [`FileBrowser::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// A directory was listed.
    Listed,
    /// A file was loaded into the editor.
    Opened,
    /// The user kept their unsaved changes.
    Cancelled,
}

/// Validate a new file or folder name: one or more of `[A-Za-z0-9_\-.]`.
pub fn validate_name(name: &str) -> Result<(), ControlError> {
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(ControlError::InvalidName(name.to_string()));
    }
    Ok(())
}

pub struct FileBrowser<T, P, E> {
    transport: T,
    guard: SessionGuard<P>,
    editor: E,
    listing: DirectoryListing,
    session_path: Option<String>,
    mode: EditorMode,
}

impl<T: Transport, P: Prompt, E: Editor> FileBrowser<T, P, E> {
    /// Starts at `.` with an empty listing and no session.
    pub fn new(transport: T, guard: SessionGuard<P>, editor: E) -> Self {
        Self {
            transport,
            guard,
            editor,
            listing: DirectoryListing {
                current_path: ".".to_string(),
                entries: Vec::new(),
            },
            session_path: None,
            mode: EditorMode::default(),
        }
    }

    pub fn current_path(&self) -> &str {
        &self.listing.current_path
    }

    pub fn entries(&self) -> &[Entry] {
        &self.listing.entries
    }

    pub fn session(&self) -> Option<EditSession> {
        self.session_path.as_ref().map(|path| EditSession {
            path: path.clone(),
            is_dirty: self.guard.is_dirty(),
        })
    }

    pub fn is_dirty(&self) -> bool {
        self.guard.is_dirty()
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn editor(&self) -> &E {
        &self.editor
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    #[cfg(test)]
    pub(crate) fn guard(&self) -> &SessionGuard<P> {
        &self.guard
    }

    /// List `path` and make it the current directory.
    pub async fn list(&mut self, path: &str) -> Result<&DirectoryListing, ControlError> {
        let body = self
            .transport
            .get("/file/list", &[("path", path)])
            .await
            .map_err(|e| failed("list", e))?;
        self.listing = decode(&body)?;
        Ok(&self.listing)
    }

    /// Directories are listed; files replace the editor content after the
    /// discard check on the current session.
    pub async fn open(&mut self, entry: &Entry) -> Result<OpenOutcome, ControlError> {
        if entry.entry_type == EntryType::Dir {
            self.list(&entry.path).await?;
            return Ok(OpenOutcome::Listed);
        }

        if let Some(current) = &self.session_path {
            if !self.guard.confirm_discard(current) {
                info!("kept unsaved changes to {current}");
                return Ok(OpenOutcome::Cancelled);
            }
        }

        let content = self
            .transport
            .get("/file", &[("path", &entry.path)])
            .await
            .map_err(|e| failed("open", e))?;

        self.mode = EditorMode::for_name(&entry.name);
        self.editor.set_value(content);
        self.editor.set_mode(self.mode);
        self.session_path = Some(entry.path.clone());
        self.guard.mark_clean();
        info!("opened {} ({})", entry.path, self.mode.as_str());
        Ok(OpenOutcome::Opened)
    }

    /// [`open`](Self::open) the cached entry whose path is `path`.
    pub async fn open_path(&mut self, path: &str) -> Result<OpenOutcome, ControlError> {
        let entry = self
            .listing
            .entries
            .iter()
            .find(|e| e.path == path || e.name == path)
            .cloned()
            .ok_or_else(|| ControlError::UnknownEntry(path.to_string()))?;
        self.open(&entry).await
    }

    /// Editor change notification.
    pub fn notify_changed(&mut self) {
        if self.session_path.is_some() {
            self.guard.mark_dirty();
        }
    }

    /// Replace the editor content as a user edit.
    pub fn apply_edit(&mut self, content: String) {
        self.editor.set_value(content);
        self.notify_changed();
    }

    /// Override the extension-derived syntax mode. Content and dirty state
    /// are untouched; the next `open` picks the mode from the name again.
    pub fn set_mode(&mut self, mode: EditorMode) {
        self.mode = mode;
        self.editor.set_mode(mode);
    }

    /// Write the editor's full content to the session path.
    pub async fn save(&mut self) -> Result<(), ControlError> {
        let path = self.session_path.clone().ok_or(ControlError::NoSession)?;
        let content = self.editor.value();
        self.transport
            .put("/file", &[("path", &path)], content)
            .await
            .map_err(|e| failed("save", e))?;
        self.guard.mark_clean();
        info!("saved {path}");
        Ok(())
    }

    /// Ask the server to reload `path` from its backing source. Returns the
    /// server's message; local dirty state is untouched.
    pub async fn reload(&self, path: &str) -> Result<String, ControlError> {
        let message = self
            .transport
            .post("/file/reload", &[("path", path)])
            .await
            .map_err(|e| failed("reload", e))?;
        info!("reloaded {path}: {message}");
        Ok(message)
    }

    /// [`reload`](Self::reload) the open file.
    pub async fn reload_session(&self) -> Result<String, ControlError> {
        let path = self.session_path.as_deref().ok_or(ControlError::NoSession)?;
        self.reload(path).await
    }

    /// Create a file or folder in the current directory, then re-list it.
    pub async fn create(&mut self, kind: CreateKind, name: &str) -> Result<(), ControlError> {
        validate_name(name)?;
        let dir = self.listing.current_path.clone();
        self.transport
            .post(
                "/file",
                &[("path", &dir), ("type", kind.as_str()), ("name", name)],
            )
            .await
            .map_err(|e| failed("create", e))?;
        info!("created {} {name} in {dir}", kind.as_str());
        self.list(&dir).await?;
        Ok(())
    }

    /// Exit check: `true` when there is nothing to lose or the user agrees
    /// to drop it.
    pub fn confirm_leave(&self) -> bool {
        match &self.session_path {
            Some(path) => self.guard.confirm_discard(path),
            None => true,
        }
    }
}
