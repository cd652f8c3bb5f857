use std::fmt::Debug;

use glow::HasContext;

use crate::{shaders::ShaderStage, uniform::Uniform};

/// The slice of the GL API a [`ShaderProgram`](crate::ShaderProgram) talks to.
///
/// Every call goes straight to the driver and assumes the context is current
/// on the calling thread.
pub trait ShaderBackend {
    type Shader: Copy + Debug;
    type Program: Copy + Debug;
    type UniformLocation: Debug;

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String>;
    fn compile_shader(&self, shader: Self::Shader, source: &str);
    fn shader_compile_status(&self, shader: Self::Shader) -> bool;
    fn shader_info_log(&self, shader: Self::Shader) -> String;
    fn delete_shader(&self, shader: Self::Shader);

    fn create_program(&self) -> Result<Self::Program, String>;
    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn detach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn link_program(&self, program: Self::Program);
    fn program_link_status(&self, program: Self::Program) -> bool;
    fn program_info_log(&self, program: Self::Program) -> String;
    fn delete_program(&self, program: Self::Program);

    /// Binds `program` as current, or unbinds with `None`.
    fn use_program(&self, program: Option<Self::Program>);
    fn uniform_location(&self, program: Self::Program, name: &str)
        -> Option<Self::UniformLocation>;
    /// Writes `value` to the uniform at `location` of the current program.
    fn upload_uniform(&self, location: &Self::UniformLocation, value: Uniform);
}

impl ShaderBackend for glow::Context {
    type Shader = glow::NativeShader;
    type Program = glow::NativeProgram;
    type UniformLocation = glow::NativeUniformLocation;

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String> {
        unsafe { HasContext::create_shader(self, stage.gl_type()) }
    }

    fn compile_shader(&self, shader: Self::Shader, source: &str) {
        unsafe {
            HasContext::shader_source(self, shader, source);
            HasContext::compile_shader(self, shader);
        }
    }

    fn shader_compile_status(&self, shader: Self::Shader) -> bool {
        unsafe { HasContext::get_shader_compile_status(self, shader) }
    }

    fn shader_info_log(&self, shader: Self::Shader) -> String {
        unsafe { HasContext::get_shader_info_log(self, shader) }
    }

    fn delete_shader(&self, shader: Self::Shader) {
        unsafe { HasContext::delete_shader(self, shader) }
    }

    fn create_program(&self) -> Result<Self::Program, String> {
        unsafe { HasContext::create_program(self) }
    }

    fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { HasContext::attach_shader(self, program, shader) }
    }

    fn detach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { HasContext::detach_shader(self, program, shader) }
    }

    fn link_program(&self, program: Self::Program) {
        unsafe { HasContext::link_program(self, program) }
    }

    fn program_link_status(&self, program: Self::Program) -> bool {
        unsafe { HasContext::get_program_link_status(self, program) }
    }

    fn program_info_log(&self, program: Self::Program) -> String {
        unsafe { HasContext::get_program_info_log(self, program) }
    }

    fn delete_program(&self, program: Self::Program) {
        unsafe { HasContext::delete_program(self, program) }
    }

    fn use_program(&self, program: Option<Self::Program>) {
        unsafe { HasContext::use_program(self, program) }
    }

    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        unsafe { HasContext::get_uniform_location(self, program, name) }
    }

    fn upload_uniform(&self, location: &Self::UniformLocation, value: Uniform) {
        let location = Some(location);
        unsafe {
            match value {
                Uniform::Int(v) => self.uniform_1_i32(location, v),
                Uniform::Bool(v) => self.uniform_1_i32(location, v as i32),
                Uniform::Float(v) => self.uniform_1_f32(location, v),
                Uniform::IVec4([x, y, z, w]) => self.uniform_4_i32(location, x, y, z, w),
                Uniform::Vec4([x, y, z, w]) => self.uniform_4_f32(location, x, y, z, w),
            }
        }
    }
}
