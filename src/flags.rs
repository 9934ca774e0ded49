use crate::error::ShellError;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct Flags {
    flags: BTreeMap<&'static str, Flag>,
}

#[derive(Debug, Clone)]
pub struct Flag {
    pub short: &'static str,
    pub long: &'static str,
    pub description: &'static str,
    /// Placeholder shown in help for flags that take a value.
    pub value_name: Option<&'static str>,
    pub value: Option<String>,
}

impl Flag {
    fn switch(short: &'static str, long: &'static str, description: &'static str) -> Self {
        Self {
            short,
            long,
            description,
            value_name: None,
            value: None,
        }
    }

    fn with_value(
        short: &'static str,
        long: &'static str,
        value_name: &'static str,
        description: &'static str,
    ) -> Self {
        Self {
            value_name: Some(value_name),
            ..Self::switch(short, long, description)
        }
    }

    fn matches(&self, arg: &str) -> bool {
        arg == self.short || arg == self.long
    }
}

impl Default for Flags {
    fn default() -> Self {
        Self::new()
    }
}

impl Flags {
    pub fn new() -> Self {
        let flags = [
            ("help", Flag::switch("-h", "--help", "Print this help message")),
            ("version", Flag::switch("-v", "--version", "Show version information")),
            ("quiet", Flag::switch("-q", "--quiet", "Do not print the welcome banner")),
            ("debug", Flag::switch("-d", "--debug", "Enable debug output")),
            (
                "config",
                Flag::with_value("-c", "--config", "FILE", "Read startup commands from FILE"),
            ),
            (
                "history-file",
                Flag::with_value("-H", "--history-file", "FILE", "Store history in FILE"),
            ),
            (
                "max-history",
                Flag::with_value("-m", "--max-history", "N", "Keep at most N history entries"),
            ),
            (
                "serve",
                Flag::with_value("-s", "--serve", "ADDR", "Serve POST /execute on ADDR"),
            ),
        ];

        Flags {
            flags: flags.into_iter().collect(),
        }
    }

    pub fn parse(&mut self, args: &[String]) -> Result<(), ShellError> {
        let mut args = args.iter();
        while let Some(arg) = args.next() {
            let flag = self
                .flags
                .values_mut()
                .find(|flag| flag.matches(arg))
                .ok_or_else(|| ShellError::Flag(format!("unknown flag {}", arg)))?;

            flag.value = if flag.value_name.is_some() {
                let value = args
                    .next()
                    .ok_or_else(|| ShellError::Flag(format!("Flag {} requires a value", arg)))?;
                Some(value.clone())
            } else {
                Some("true".to_string())
            };
        }
        Ok(())
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.flags
            .get(name)
            .and_then(|f| f.value.as_ref())
            .is_some()
    }

    pub fn get_value(&self, name: &str) -> Option<&str> {
        self.flags.get(name).and_then(|f| f.value.as_deref())
    }

    pub fn usage(&self) -> String {
        let mut text = format!("Usage: {} [OPTIONS]\n\nOptions:\n", env!("CARGO_PKG_NAME"));
        for flag in self.flags.values() {
            let long = match flag.value_name {
                Some(value) => format!("{} <{}>", flag.long, value),
                None => flag.long.to_string(),
            };
            text.push_str(&format!("  {}, {:<22} {}\n", flag.short, long, flag.description));
        }
        text
    }

    pub fn print_help(&self) {
        print!("{}", self.usage());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_switches_and_values() {
        let mut flags = Flags::new();
        flags
            .parse(&args(&["-q", "--history-file", "/tmp/h.json", "-m", "50"]))
            .unwrap();

        assert!(flags.is_set("quiet"));
        assert!(!flags.is_set("debug"));
        assert_eq!(flags.get_value("history-file"), Some("/tmp/h.json"));
        assert_eq!(flags.get_value("max-history"), Some("50"));
        assert_eq!(flags.get_value("serve"), None);
    }

    #[test]
    fn test_missing_value() {
        let mut flags = Flags::new();
        let err = flags.parse(&args(&["--serve"])).unwrap_err();
        assert_eq!(err.to_string(), "Flag error: Flag --serve requires a value");
    }

    #[test]
    fn test_unknown_flag() {
        let mut flags = Flags::new();
        assert!(matches!(
            flags.parse(&args(&["--bogus"])),
            Err(ShellError::Flag(_))
        ));
    }

    #[test]
    fn test_usage_lists_every_flag() {
        let usage = Flags::new().usage();
        assert!(usage.starts_with("Usage: termina [OPTIONS]"));
        for long in ["--help", "--config <FILE>", "--max-history <N>", "--serve <ADDR>"] {
            assert!(usage.contains(long), "missing {}", long);
        }
    }
}
