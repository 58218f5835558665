use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::model::{Command, CommandId, DeviceId};

/// How many entries `most_used` reports.
pub const MOST_USED_LIMIT: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CommandUsage {
    pub device_id: DeviceId,
    pub action: String,
    pub count: u64,
}

/// Append-only command history plus usage counts per `(device, action)`.
///
/// Only the commands are serialized; counts are rebuilt on load by replaying them.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(from = "Vec<Command>", into = "Vec<Command>")]
pub struct CommandLog {
    commands: Vec<Command>,
    // first-seen order, the tie-breaker for rankings
    usage: Vec<CommandUsage>,
    index: HashMap<(DeviceId, String), usize>,
}

impl CommandLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_commands(commands: Vec<Command>) -> Self {
        let mut log = Self::default();
        for cmd in commands {
            log.append(cmd);
        }
        log
    }

    pub fn record(
        &mut self,
        device_id: DeviceId,
        device_name: impl Into<String>,
        action: impl Into<String>,
    ) -> Command {
        let cmd = Command {
            id: CommandId::new(),
            device_id,
            device_name: device_name.into(),
            action: action.into(),
            timestamp: Utc::now(),
        };
        self.append(cmd.clone());
        cmd
    }

    fn append(&mut self, cmd: Command) {
        let key = (cmd.device_id, cmd.action.clone());
        match self.index.get(&key) {
            Some(&i) => self.usage[i].count += 1,
            None => {
                self.index.insert(key, self.usage.len());
                self.usage.push(CommandUsage {
                    device_id: cmd.device_id,
                    action: cmd.action.clone(),
                    count: 1,
                });
            }
        }
        self.commands.push(cmd);
    }

    /// Top `n` `(device, action)` pairs by count, ties kept in first-seen order.
    pub fn top_commands(&self, n: usize) -> Vec<CommandUsage> {
        let mut ranked = self.usage.clone();
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked.truncate(n);
        ranked
    }

    pub fn most_used(&self) -> Vec<CommandUsage> {
        self.top_commands(MOST_USED_LIMIT)
    }

    pub fn usage_count(&self, device_id: DeviceId, action: &str) -> u64 {
        self.index
            .get(&(device_id, action.to_string()))
            .map(|&i| self.usage[i].count)
            .unwrap_or(0)
    }

    /// Last `n` commands, most recent first.
    pub fn history(&self, n: usize) -> Vec<Command> {
        self.commands.iter().rev().take(n).cloned().collect()
    }

    pub fn history_for_device(&self, device_id: DeviceId, n: usize) -> Vec<Command> {
        self.commands.iter().rev().filter(|c| c.device_id == device_id).take(n).cloned().collect()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl From<Vec<Command>> for CommandLog {
    fn from(commands: Vec<Command>) -> Self {
        Self::from_commands(commands)
    }
}

impl From<CommandLog> for Vec<Command> {
    fn from(log: CommandLog) -> Self {
        log.commands
    }
}

impl PartialEq for CommandLog {
    fn eq(&self, other: &Self) -> bool {
        self.commands == other.commands
    }
}
