//! Confirmation and input helpers for destructive operations.

use crate::errors::Result;
use anyhow::{anyhow, Context};
use dialoguer::{Confirm, Input, Select};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Everything the workflows ask the operator.
pub trait Prompter {
    /// Yes/no question, default no.
    fn confirm(&self, prompt: &str) -> Result<bool>;

    /// Free-form line of text (may be empty).
    fn input(&self, prompt: &str) -> Result<String>;

    /// Pick one of `items`; `None` when the operator backs out.
    fn select(&self, prompt: &str, items: &[String]) -> Result<Option<usize>>;
}

/// Interactive terminal prompts via dialoguer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn confirm(&self, prompt: &str) -> Result<bool> {
        confirm_destructive_action(prompt)
    }

    fn input(&self, prompt: &str) -> Result<String> {
        Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .context("Failed to read input")
    }

    fn select(&self, prompt: &str, items: &[String]) -> Result<Option<usize>> {
        Select::new()
            .with_prompt(prompt)
            .items(items)
            .default(0)
            .interact_opt()
            .context("Failed to read selection")
    }
}

pub fn confirm_destructive_action(prompt: &str) -> Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .context("Failed to read confirmation input")
}

/// Either a pre-authorized `--yes` or an explicit answer from the operator.
pub fn approve(prompter: &dyn Prompter, auto_yes: bool, prompt: &str) -> Result<bool> {
    if auto_yes {
        log::info!("auto-confirmed: {}", prompt);
        return Ok(true);
    }
    prompter.confirm(prompt)
}

/// One scripted reply for [`ScriptedPrompter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Yes,
    No,
    Text(String),
    Choice(Option<usize>),
}

/// Answers prompts from a queue and remembers what was asked.
///
/// Running out of replies is an error, so a test fails loudly when a flow
/// asks something unexpected.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    replies: Mutex<VecDeque<Reply>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Prompts asked so far, in order.
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().map(|a| a.clone()).unwrap_or_default()
    }

    pub fn remaining(&self) -> usize {
        self.replies.lock().map(|r| r.len()).unwrap_or_default()
    }

    fn next(&self, prompt: &str) -> Result<Reply> {
        if let Ok(mut asked) = self.asked.lock() {
            asked.push(prompt.to_string());
        }
        self.replies
            .lock()
            .map_err(|_| anyhow!("prompter poisoned"))?
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted reply for prompt: {}", prompt))
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, prompt: &str) -> Result<bool> {
        match self.next(prompt)? {
            Reply::Yes => Ok(true),
            Reply::No => Ok(false),
            Reply::Text(t) => Ok(matches!(t.trim().to_lowercase().as_str(), "y" | "yes")),
            other => Err(anyhow!("expected yes/no for {:?}, got {:?}", prompt, other)),
        }
    }

    fn input(&self, prompt: &str) -> Result<String> {
        match self.next(prompt)? {
            Reply::Text(t) => Ok(t),
            other => Err(anyhow!("expected text for {:?}, got {:?}", prompt, other)),
        }
    }

    fn select(&self, prompt: &str, _items: &[String]) -> Result<Option<usize>> {
        match self.next(prompt)? {
            Reply::Choice(c) => Ok(c),
            other => Err(anyhow!("expected choice for {:?}, got {:?}", prompt, other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approve_skips_prompt_when_preauthorized() {
        let prompter = ScriptedPrompter::new([]);
        assert!(approve(&prompter, true, "Run e2fsck -f -y?").unwrap());
        assert!(prompter.asked().is_empty());
    }

    #[test]
    fn approve_asks_when_not_preauthorized() {
        let prompter = ScriptedPrompter::new([Reply::No]);
        assert!(!approve(&prompter, false, "Run e2fsck -f -y?").unwrap());
        assert_eq!(prompter.asked(), vec!["Run e2fsck -f -y?"]);
    }

    #[test]
    fn scripted_prompter_errors_when_exhausted() {
        let prompter = ScriptedPrompter::new([]);
        assert!(prompter.confirm("anything?").is_err());
    }
}
