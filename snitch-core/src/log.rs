// Line-oriented audit output

use colored::Colorize;

/// Category label of an audit output line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    InfoBar,
    Info,
    Comment,
    Trace,
    Warning,
    Error,
    Success,
}

/// Destination for audit findings, one line per call
pub trait AuditLog {
    fn write(&mut self, level: Level, message: &str);
}

impl<L: AuditLog + ?Sized> AuditLog for &mut L {
    fn write(&mut self, level: Level, message: &str) {
        (**self).write(level, message);
    }
}

/// Colored output on stdout
#[derive(Debug, Default)]
pub struct ConsoleLog;

impl AuditLog for ConsoleLog {
    fn write(&mut self, level: Level, message: &str) {
        let line = match level {
            Level::InfoBar => message.white().on_blue().bold(),
            Level::Info => message.cyan(),
            Level::Comment => message.yellow(),
            Level::Trace => message.dimmed(),
            Level::Warning => message.bright_yellow().bold(),
            Level::Error => message.red().bold(),
            Level::Success => message.green().bold(),
        };
        println!("{}", line);
    }
}

/// Keeps every line in memory
#[derive(Debug, Default)]
pub struct MemoryLog {
    lines: Vec<(Level, String)>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[(Level, String)] {
        &self.lines
    }

    pub fn at(&self, level: Level) -> Vec<&str> {
        self.lines
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, message)| message.as_str())
            .collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|(_, message)| message.contains(needle))
    }
}

impl AuditLog for MemoryLog {
    fn write(&mut self, level: Level, message: &str) {
        self.lines.push((level, message.to_string()));
    }
}
