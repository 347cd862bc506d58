//! Whitespace tokenizer for command lines.

use heapless::Vec;

/// Maximum tokens per line, command name included.  Extra tokens are
/// ignored.
pub const MAX_ARGS: usize = 8;

/// Borrowed argument vector: `args[0]` is the command name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args<'a> {
    argv: Vec<&'a str, MAX_ARGS>,
    overflowed: bool,
}

impl<'a> Args<'a> {
    /// Split on spaces and tabs.  Runs of separators produce no empty
    /// tokens.
    pub fn parse(line: &'a str) -> Self {
        let mut argv = Vec::new();
        let mut overflowed = false;
        for token in line.split([' ', '\t']).filter(|t| !t.is_empty()) {
            if argv.push(token).is_err() {
                overflowed = true;
                break;
            }
        }
        Self { argv, overflowed }
    }

    /// Token count including the command name.
    pub fn argc(&self) -> usize {
        self.argv.len()
    }

    pub fn is_empty(&self) -> bool {
        self.argv.is_empty()
    }

    pub fn name(&self) -> Option<&'a str> {
        self.argv.first().copied()
    }

    pub fn get(&self, index: usize) -> Option<&'a str> {
        self.argv.get(index).copied()
    }

    /// Tokens after the command name.
    pub fn rest(&self) -> &[&'a str] {
        self.argv.get(1..).unwrap_or(&[])
    }

    /// The line held more than [`MAX_ARGS`] tokens.
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }
}
