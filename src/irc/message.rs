//! IRC message codec (RFC 1459 shape).
//!
//! `[@tags] [:prefix] COMMAND params [:trailing]` — tags are tolerated and
//! discarded, the trailing parameter is just the last entry of `params`.

use thiserror::Error;

/// Errors from parsing an inbound protocol line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The line was empty after trimming.
    #[error("empty message line")]
    Empty,
    /// The line had a prefix or tags but no command.
    #[error("message line has no command")]
    MissingCommand,
}

/// One parsed protocol message, inbound or outbound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Raw source prefix without the leading `:` (`nick!user@host` or server name).
    pub prefix: Option<String>,
    /// Command name or three-digit numeric, as received.
    pub command: String,
    /// Positional parameters; a trailing argument is the last entry.
    pub params: Vec<String>,
}

impl Message {
    /// Build an outbound message from a command and parameters.
    pub fn new(command: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            prefix: None,
            command: command.into(),
            params,
        }
    }

    /// Build a `PRIVMSG` to the given target.
    pub fn privmsg(target: &str, text: &str) -> Self {
        Self::new("PRIVMSG", vec![target.to_owned(), text.to_owned()])
    }

    /// Parse one line (CR/LF already or not yet stripped — both accepted).
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] when the line is empty or carries no command.
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let mut rest = line.trim_end_matches(['\r', '\n']).trim_start();
        if rest.is_empty() {
            return Err(ProtocolError::Empty);
        }

        // IRCv3 message tags: skip to the next token.
        if rest.starts_with('@') {
            rest = match rest.split_once(' ') {
                Some((_, tail)) => tail.trim_start(),
                None => return Err(ProtocolError::MissingCommand),
            };
        }

        let prefix = if let Some(tail) = rest.strip_prefix(':') {
            let (prefix, tail) = tail
                .split_once(' ')
                .ok_or(ProtocolError::MissingCommand)?;
            rest = tail.trim_start();
            Some(prefix.to_owned())
        } else {
            None
        };

        let (command, mut rest) = match rest.split_once(' ') {
            Some((cmd, tail)) => (cmd, tail.trim_start()),
            None => (rest, ""),
        };
        if command.is_empty() {
            return Err(ProtocolError::MissingCommand);
        }

        let mut params = Vec::new();
        while !rest.is_empty() {
            if let Some(trailing) = rest.strip_prefix(':') {
                params.push(trailing.to_owned());
                break;
            }
            match rest.split_once(' ') {
                Some((param, tail)) => {
                    params.push(param.to_owned());
                    rest = tail.trim_start();
                }
                None => {
                    params.push(rest.to_owned());
                    break;
                }
            }
        }

        Ok(Self {
            prefix,
            command: command.to_owned(),
            params,
        })
    }

    /// Serialize to a wire line, without the terminating CR LF.
    ///
    /// The last parameter gets the `:` trailing marker when it is empty,
    /// contains a space, or begins with `:`.
    pub fn to_line(&self) -> String {
        let mut line = self.command.clone();
        let last_index = self.params.len().saturating_sub(1);
        for (i, param) in self.params.iter().enumerate() {
            line.push(' ');
            if i == last_index
                && (param.is_empty() || param.contains(' ') || param.starts_with(':'))
            {
                line.push(':');
            }
            line.push_str(param);
        }
        line
    }

    /// Parameter at `index`, when present.
    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    /// The nick portion of the source prefix (`nick!user@host` → `nick`).
    pub fn source_nick(&self) -> Option<&str> {
        let prefix = self.prefix.as_deref()?;
        Some(prefix.split('!').next().unwrap_or(prefix))
    }
}
