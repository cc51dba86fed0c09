//! Fuzzer selection by command name.
//!
//! Fuzzers register under one of the [`FuzzerCommand`] names and are started
//! through [`FuzzerRegistry::dispatch`]. How a fuzzer mutates its input is
//! its own business.

use std::fmt;

use crate::error::{ConfigurationError, Error};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FuzzerCommand {
    Simple,
    Multi,
    CleverMulti,
}

impl FuzzerCommand {
    pub const ALL: &'static [FuzzerCommand] = &[
        FuzzerCommand::Simple,
        FuzzerCommand::Multi,
        FuzzerCommand::CleverMulti,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FuzzerCommand::Simple => "simple_fuzzer",
            FuzzerCommand::Multi => "multi_fuzzer",
            FuzzerCommand::CleverMulti => "clever_multi_fuzzer",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.name() == name)
    }
}

impl fmt::Display for FuzzerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub trait Fuzzer {
    fn command(&self) -> FuzzerCommand;

    /// The fuzzer's own help flag was given.
    fn is_help(&self) -> bool {
        false
    }

    fn usage(&self) -> String {
        format!("Usage: {} [options]", self.command())
    }

    fn start_fuzzer(&mut self) -> Result<(), Error>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// General usage, listing the commands.
    Usage(String),
    /// Usage of one command, whose help flag was set.
    CommandUsage(FuzzerCommand, String),
    /// The fuzzer ran to completion.
    Completed(FuzzerCommand),
}

#[derive(Default)]
pub struct FuzzerRegistry {
    fuzzers: Vec<Box<dyn Fuzzer>>,
}

impl FuzzerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `fuzzer`, replacing any earlier one for the same command.
    pub fn register(&mut self, fuzzer: Box<dyn Fuzzer>) {
        let command = fuzzer.command();
        self.fuzzers.retain(|f| f.command() != command);
        debug!("Registered {}", command);
        self.fuzzers.push(fuzzer);
    }

    pub fn usage(&self) -> String {
        let mut usage = String::from("Usage: <command> [options]\nCommands:");
        for command in FuzzerCommand::ALL {
            if self.fuzzers.iter().any(|f| f.command() == *command) {
                usage.push_str("\n  ");
                usage.push_str(command.name());
            }
        }
        usage
    }

    /// Run the fuzzer named by `command`.
    ///
    /// No command, or the general help flag, gives the usage. A name that is
    /// not a registered command is a configuration error.
    pub fn dispatch(&mut self, command: Option<&str>, help: bool) -> Result<DispatchOutcome, Error> {
        let name = match command {
            Some(name) if !help => name,
            _ => return Ok(DispatchOutcome::Usage(self.usage())),
        };

        let fuzzer = FuzzerCommand::from_name(name)
            .and_then(|c| self.fuzzers.iter_mut().find(|f| f.command() == c))
            .ok_or_else(|| {
                debug!("Unknown fuzzer command {:?}", name);
                ConfigurationError::new("No command found")
            })?;

        let command = fuzzer.command();
        if fuzzer.is_help() {
            return Ok(DispatchOutcome::CommandUsage(command, fuzzer.usage()));
        }

        info!("Starting {}", command);
        fuzzer.start_fuzzer()?;
        Ok(DispatchOutcome::Completed(command))
    }
}
