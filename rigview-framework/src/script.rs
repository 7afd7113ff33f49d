use std::{collections::VecDeque, fmt::Debug};

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScriptError {
    #[error("Unknown command {token:?} at position {position} of the input script")]
    UnknownCommand { position: usize, token: String },
    #[error("Bad frame number {frame:?} at position {position} of the input script")]
    BadFrame { position: usize, frame: String },
    #[error("Command {token:?} at position {position} is scheduled for frame {frame}, before the frame of the command preceding it")]
    OutOfOrder { position: usize, token: String, frame: u64 },
}

/// Commands scheduled on frame numbers, standing in for live input.
#[derive(Debug, Clone, PartialEq)]
pub struct InputScript<C> {
    entries: VecDeque<(u64, C)>,
}

impl<C> Default for InputScript<C> {
    fn default() -> Self {
        Self { entries: VecDeque::new() }
    }
}

impl<C: Debug> InputScript<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// One command per frame, starting at frame zero.
    pub fn sequential(commands: impl IntoIterator<Item = C>) -> Self {
        Self {
            entries: commands.into_iter().enumerate().map(|(i, c)| (i as u64, c)).collect(),
        }
    }

    /// Schedules `command` on `frame`, after anything already scheduled on
    /// that frame.
    pub fn push(&mut self, frame: u64, command: C) {
        let position = self.entries.partition_point(|(f, _)| *f <= frame);
        self.entries.insert(position, (frame, command));
    }

    /// Parses a comma separated script. Each token is a command, optionally
    /// prefixed by `frame:` to pin it to a frame. Unpinned commands go on the
    /// frame after the previous command.
    pub fn parse(text: &str, mut parse_command: impl FnMut(&str) -> Option<C>) -> Result<Self, ScriptError> {
        let mut script = Self::new();
        let mut last_frame: Option<u64> = None;
        for (position, token) in text.split(',').map(str::trim).filter(|t| !t.is_empty()).enumerate() {
            let (frame, command) = match token.split_once(':') {
                Some((frame, command)) => {
                    let frame = frame.trim().parse().map_err(|_| ScriptError::BadFrame {
                        position,
                        frame: frame.to_owned(),
                    })?;
                    if last_frame.map_or(false, |last| frame < last) {
                        return Err(ScriptError::OutOfOrder {
                            position,
                            token: token.to_owned(),
                            frame,
                        });
                    }
                    (frame, command.trim())
                }
                None => (last_frame.map_or(0, |last| last + 1), token),
            };
            let command = parse_command(command).ok_or_else(|| ScriptError::UnknownCommand {
                position,
                token: command.to_owned(),
            })?;
            script.push(frame, command);
            last_frame = Some(frame);
        }
        Ok(script)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes and returns every command due on or before `frame`.
    pub fn take_due(&mut self, frame: u64) -> Vec<C> {
        let due = self.entries.partition_point(|(f, _)| *f <= frame);
        self.entries.drain(..due).map(|(_, c)| c).collect()
    }
}
