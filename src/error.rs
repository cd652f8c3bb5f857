use std::{fmt, io, path::PathBuf};

use crate::shaders::ShaderStage;

/// A failure observed while building a [`ShaderProgram`](crate::ShaderProgram).
///
/// None of these abort construction. They are logged at `error` level when
/// they happen and kept on the program, in order.
#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    #[error("PROGRAM {stage} READ ERROR: could not read {}: {source}", path.display())]
    FileRead {
        stage: ShaderStage,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("PROGRAM {stage} COMPILE ERROR: {log}")]
    Compile { stage: ShaderStage, log: String },

    #[error("PROGRAM LINK ERROR: {log}")]
    Link { log: String },

    #[error("PROGRAM {object} CREATION ERROR: {reason}")]
    ObjectCreation { object: GlObject, reason: String },
}

/// Driver object a [`ShaderError::ObjectCreation`] is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlObject {
    Program,
    Stage(ShaderStage),
}

impl fmt::Display for GlObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GlObject::Program => f.write_str("OBJECT"),
            GlObject::Stage(stage) => write!(f, "{} SHADER", stage),
        }
    }
}

impl ShaderError {
    /// Stage the failure belongs to, `None` for program-wide failures.
    pub fn stage(&self) -> Option<ShaderStage> {
        match self {
            ShaderError::FileRead { stage, .. } | ShaderError::Compile { stage, .. } => {
                Some(*stage)
            }
            ShaderError::ObjectCreation {
                object: GlObject::Stage(stage),
                ..
            } => Some(*stage),
            ShaderError::Link { .. } | ShaderError::ObjectCreation { .. } => None,
        }
    }
}
