pub mod echo;
pub mod executable;
pub mod ping;
pub mod unknown;

use bytes::Bytes;
use std::vec;
use thiserror::Error as ThisError;

use crate::commands::executable::Executable;
use crate::frame::Frame;
use crate::Error;

use echo::Echo;
use ping::Ping;
use unknown::Unknown;

#[derive(Debug, PartialEq)]
pub enum Command {
    Echo(Echo),
    Ping(Ping),
    Unknown(Unknown),
}

impl Executable for Command {
    fn exec(self) -> Result<Frame, Error> {
        match self {
            Command::Echo(cmd) => cmd.exec(),
            Command::Ping(cmd) => cmd.exec(),
            Command::Unknown(cmd) => cmd.exec(),
        }
    }
}

impl TryFrom<Frame> for Command {
    type Error = Error;

    fn try_from(frame: Frame) -> Result<Self, Self::Error> {
        // Clients send commands to the server as RESP arrays.
        let frames = match frame {
            Frame::Array(array) => array,
            frame => {
                return Err(CommandParserError::InvalidFrame {
                    expected: "array".to_string(),
                    actual: frame,
                }
                .into())
            }
        };

        let parser = &mut CommandParser {
            parts: frames.into_iter(),
        };

        // A zero-element array carries no name at all. It still dispatches,
        // as an unrecognized command.
        let command_name = match parser.parse_command_name() {
            Ok(name) => name,
            Err(CommandParserError::EndOfStream) => String::new(),
            Err(err) => return Err(err.into()),
        };

        match &command_name[..] {
            "echo" => Echo::try_from(parser).map(Command::Echo),
            "ping" => Ping::try_from(parser).map(Command::Ping),
            _ => Ok(Command::Unknown(Unknown { name: command_name })),
        }
    }
}

pub(crate) struct CommandParser {
    parts: vec::IntoIter<Frame>,
}

impl CommandParser {
    /// Command names are matched case-insensitively. A name that is not valid
    /// UTF-8 is folded lossily so it can still dispatch (as unrecognized);
    /// argument bytes are never transformed.
    fn parse_command_name(&mut self) -> Result<String, CommandParserError> {
        let command_name = self.parts.next().ok_or(CommandParserError::EndOfStream)?;

        match command_name {
            Frame::Simple(s) => Ok(s.to_lowercase()),
            Frame::Bulk(bytes) => Ok(String::from_utf8_lossy(&bytes).to_lowercase()),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "simple or bulk string".to_string(),
                actual: frame,
            }),
        }
    }

    fn next_bytes(&mut self) -> Result<Bytes, CommandParserError> {
        let frame = self.parts.next().ok_or(CommandParserError::EndOfStream)?;

        match frame {
            // Both `Simple` and `Bulk` representation may be strings.
            Frame::Simple(s) => Ok(Bytes::from(s)),
            Frame::Bulk(bytes) => Ok(bytes),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "simple or bulk string".to_string(),
                actual: frame,
            }),
        }
    }
}

#[derive(Debug, ThisError, PartialEq)]
pub(crate) enum CommandParserError {
    #[error("protocol error; invalid frame, expected {expected}, got {actual:?}")]
    InvalidFrame { expected: String, actual: Frame },
    #[error("protocol error; attempting to extract a value failed due to the frame being fully consumed")]
    EndOfStream,
}
