//! Vertex/fragment shader program loading on top of `glow`.
//!
//! [`ShaderProgram`] reads two GLSL sources, compiles and links them, and
//! reports every failure through the `log` facade instead of aborting. The
//! program is always constructed; [`ShaderProgram::status`] and
//! [`ShaderProgram::diagnostics`] tell whether it is usable.

pub mod backend;
pub mod error;
pub mod info_log;
pub mod shaders;
pub mod uniform;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::ShaderBackend;
pub use error::{GlObject, ShaderError};
pub use shaders::{BoundProgram, ProgramStatus, ShaderProgram, ShaderStage};
pub use uniform::Uniform;
