use std::collections::HashMap;

use super::{Category, Command, CommandError, Handler};

/// Maps command names to handlers. Names are matched case-insensitively.
#[derive(Clone, Debug, Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Handler>,
    order: Vec<String>,
}

fn key(name: &str) -> String {
    name.to_lowercase()
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `command` under `name`, replacing whatever was there.
    pub fn register(
        &mut self,
        name: &str,
        category: Category,
        summary: &'static str,
        command: impl Command + 'static,
    ) {
        self.insert(name, Handler::new(category, summary, command));
    }

    /// Register one command under a primary name and any number of aliases.
    pub fn register_with_aliases(
        &mut self,
        names: &[&str],
        category: Category,
        summary: &'static str,
        command: impl Command + 'static,
    ) {
        let handler = Handler::new(category, summary, command);
        for name in names {
            self.insert(name, handler.clone());
        }
    }

    /// Make `alias` resolve to the handler currently registered as `target`.
    pub fn alias(&mut self, alias: &str, target: &str) -> Result<(), CommandError> {
        let handler = self
            .get(target)
            .cloned()
            .ok_or_else(|| CommandError::NotFound(target.to_string()))?;
        self.insert(alias, handler);
        Ok(())
    }

    pub fn unregister(&mut self, name: &str) -> Option<Handler> {
        let key = key(name);
        let removed = self.commands.remove(&key);
        if removed.is_some() {
            self.order.retain(|n| n != &key);
        }
        removed
    }

    pub fn get(&self, name: &str) -> Option<&Handler> {
        self.commands.get(&key(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(&key(name))
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Names grouped by shared handler, first registered name first, paired
    /// with that handler. Used for help listings.
    pub fn groups(&self) -> Vec<(Vec<&str>, &Handler)> {
        let mut groups: Vec<(Vec<&str>, &Handler)> = Vec::new();
        for name in &self.order {
            let Some(handler) = self.commands.get(name) else {
                continue;
            };
            match groups.iter_mut().find(|(_, h)| h.same_as(handler)) {
                Some((names, _)) => names.push(name.as_str()),
                None => groups.push((vec![name.as_str()], handler)),
            }
        }
        groups
    }

    fn insert(&mut self, name: &str, handler: Handler) {
        let key = key(name);
        if self.commands.insert(key.clone(), handler).is_none() {
            self.order.push(key);
        }
    }
}
