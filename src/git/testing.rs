//! Scripted `GitRunner` for unit tests

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{CommandOutput, GitRunner};
use crate::error::{GitError, Result};

/// Answers each command (arguments joined by spaces) with a canned output and
/// records what was asked. Unscripted commands fail.
#[derive(Default)]
pub(crate) struct ScriptedRunner {
    responses: HashMap<String, CommandOutput>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, command: &str, output: CommandOutput) -> Self {
        self.responses.insert(command.to_string(), output);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl GitRunner for ScriptedRunner {
    async fn run(&self, args: &[&str]) -> Result<CommandOutput> {
        let key = args.join(" ");
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(key.clone());
        }
        self.responses
            .get(&key)
            .cloned()
            .ok_or_else(|| GitError::UnexpectedOutput(format!("unscripted command: git {key}")).into())
    }
}
