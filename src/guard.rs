//! Unsaved-edit protection.
//!
//! [`SessionGuard`] holds the dirty flag of the open file and asks the user,
//! through an injected [`Prompt`], before anything replaces unsaved content.
//! A clean session never prompts.

use std::io::{BufRead, Write};

/// Synchronous yes/no confirmation from the user.
pub trait Prompt {
    /// Show `message` and block until the user answers. `true` = proceed.
    fn confirm(&self, message: &str) -> bool;
}

/// Prompts on stderr and reads the answer from stdin. Anything other than
/// `y`/`yes` (including EOF) counts as cancel.
pub struct ConsolePrompt;

impl Prompt for ConsolePrompt {
    fn confirm(&self, message: &str) -> bool {
        let mut stderr = std::io::stderr();
        let _ = write!(stderr, "{message} [y/N] ");
        let _ = stderr.flush();

        let mut answer = String::new();
        match std::io::stdin().lock().read_line(&mut answer) {
            Ok(0) | Err(_) => false,
            Ok(_) => is_yes(&answer),
        }
    }
}

/// `y` or `yes`, any case.
pub(crate) fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Dirty-state tracker for the single edit session.
pub struct SessionGuard<P> {
    dirty: bool,
    prompt: P,
}

impl<P: Prompt> SessionGuard<P> {
    pub fn new(prompt: P) -> Self {
        Self {
            dirty: false,
            prompt,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Ask before discarding `resource_name`'s unsaved changes. Returns
    /// `true` without prompting when clean. Never changes the dirty flag.
    pub fn confirm_discard(&self, resource_name: &str) -> bool {
        if !self.dirty {
            return true;
        }
        self.prompt.confirm(&discard_message(resource_name))
    }

    pub fn prompt(&self) -> &P {
        &self.prompt
    }
}

/// The question shown before dropping unsaved edits.
pub fn discard_message(resource_name: &str) -> String {
    format!("file {resource_name} is modified, ignore?")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedPrompt;

    #[test]
    fn clean_guard_never_prompts() {
        let guard = SessionGuard::new(ScriptedPrompt::answering(false));
        assert!(guard.confirm_discard("./a.txt"));
        assert!(guard.prompt().asked().is_empty());
    }

    #[test]
    fn dirty_guard_prompts_with_resource_name() {
        let mut guard = SessionGuard::new(ScriptedPrompt::answering(true));
        guard.mark_dirty();
        assert!(guard.confirm_discard("./a.txt"));
        assert_eq!(guard.prompt().asked(), vec!["file ./a.txt is modified, ignore?"]);
    }

    #[test]
    fn cancel_leaves_guard_dirty() {
        let mut guard = SessionGuard::new(ScriptedPrompt::answering(false));
        guard.mark_dirty();
        assert!(!guard.confirm_discard("./a.txt"));
        assert!(guard.is_dirty());
    }

    #[test]
    fn mark_clean_resets() {
        let mut guard = SessionGuard::new(ScriptedPrompt::answering(false));
        guard.mark_dirty();
        guard.mark_clean();
        assert!(!guard.is_dirty());
        assert!(guard.confirm_discard("./a.txt"));
    }

    #[test]
    fn only_y_or_yes_confirms() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes("n"));
        assert!(!is_yes(""));
        assert!(!is_yes("yep"));
    }
}
