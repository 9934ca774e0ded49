use super::EnvError;
use std::collections::BTreeMap;
use std::env;

/// Session copy of the environment. Writes go through to the process
/// environment as well, so they are visible process-wide and not just to
/// the session that made them.
#[derive(Clone, Debug, Default)]
pub struct EnvVarManager {
    vars: BTreeMap<Box<str>, Box<str>>,
}

impl EnvVarManager {
    /// Snapshot of the current process environment.
    pub fn from_process() -> Self {
        let vars = env::vars()
            .map(|(key, value)| (key.into_boxed_str(), value.into_boxed_str()))
            .collect();
        Self { vars }
    }

    pub fn set(&mut self, name: &str, value: &str) -> Result<(), EnvError> {
        if name.is_empty() || name.contains(['=', '\0']) {
            return Err(EnvError::InvalidName(name.to_string()));
        }
        if value.contains('\0') {
            return Err(EnvError::InvalidValue("NUL byte in value"));
        }

        self.vars.insert(name.into(), value.into());
        env::set_var(name, value);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(|s| s.as_ref())
    }

    /// Variables sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_ref(), v.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
