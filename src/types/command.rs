use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::errors::SignalError;

/// Seconds skipped by `skip_forward`/`skip_backward` when no value is given.
pub const DEFAULT_SKIP_SECONDS: f64 = 10.0;

/// A playback command addressed to a tab's in-page agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AudioCommand {
    SetVolume(f64),
    SetMuted(bool),
    ToggleMute,
    Play,
    Pause,
    Stop,
    SkipForward(f64),
    SkipBackward(f64),
}

impl AudioCommand {
    /// Parse the wire form (`action` string plus optional `value`) used by
    /// UI clients. Volume is clamped to [0.0, 1.0]; skip amounts default to
    /// ten seconds.
    pub fn parse(action: &str, value: Option<&Value>) -> Result<Self, SignalError> {
        match action {
            "setVolume" => {
                let v = value
                    .and_then(Value::as_f64)
                    .ok_or(SignalError::MissingField("value"))?;
                if !v.is_finite() {
                    return Err(SignalError::OutOfRange(format!("volume: {}", v)));
                }
                Ok(AudioCommand::SetVolume(v.clamp(0.0, 1.0)))
            }
            "setMuted" => {
                let m = value
                    .and_then(Value::as_bool)
                    .ok_or(SignalError::MissingField("value"))?;
                Ok(AudioCommand::SetMuted(m))
            }
            "toggleMute" => Ok(AudioCommand::ToggleMute),
            "play" => Ok(AudioCommand::Play),
            "pause" => Ok(AudioCommand::Pause),
            "stop" => Ok(AudioCommand::Stop),
            "skipForward" => Ok(AudioCommand::SkipForward(
                value.and_then(Value::as_f64).unwrap_or(DEFAULT_SKIP_SECONDS),
            )),
            "skipBackward" => Ok(AudioCommand::SkipBackward(
                value.and_then(Value::as_f64).unwrap_or(DEFAULT_SKIP_SECONDS),
            )),
            other => Err(SignalError::UnknownAction(other.to_string())),
        }
    }

    /// The wire `action` name understood by agents.
    pub fn action_name(&self) -> &'static str {
        match self {
            AudioCommand::SetVolume(_) => "setVolume",
            AudioCommand::SetMuted(_) => "setMuted",
            AudioCommand::ToggleMute => "toggleMute",
            AudioCommand::Play => "play",
            AudioCommand::Pause => "pause",
            AudioCommand::Stop => "stop",
            AudioCommand::SkipForward(_) => "skipForward",
            AudioCommand::SkipBackward(_) => "skipBackward",
        }
    }

    /// The wire `value` argument, if the command carries one.
    pub fn wire_value(&self) -> Option<Value> {
        match self {
            AudioCommand::SetVolume(v) => Some(Value::from(*v)),
            AudioCommand::SetMuted(m) => Some(Value::from(*m)),
            AudioCommand::SkipForward(s) | AudioCommand::SkipBackward(s) => {
                Some(Value::from(*s))
            }
            _ => None,
        }
    }
}

/// Acknowledgement returned to the caller of a successful dispatch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandAck {
    pub tab_id: String,
    pub action: String,
}
