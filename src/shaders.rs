use std::{fmt, fs, ops::Deref, path::Path};

use log::{debug, error, trace};

use crate::{
    backend::ShaderBackend,
    error::{GlObject, ShaderError},
    info_log,
    uniform::Uniform,
};

type BackendOf<G> = <G as Deref>::Target;
type ProgramOf<G> = <BackendOf<G> as ShaderBackend>::Program;
type ShaderOf<G> = <BackendOf<G> as ShaderBackend>::Shader;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn gl_type(self) -> u32 {
        match self {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("VERTEX"),
            ShaderStage::Fragment => f.write_str("FRAGMENT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramStatus {
    /// Both sources were read, both stages compiled and the program linked.
    Linked,
    /// Something went wrong; see [`ShaderProgram::diagnostics`].
    Failed,
}

/// A linked vertex + fragment program.
///
/// `G` is whatever hands out the GL context: `&glow::Context`,
/// `Arc<glow::Context>`, ... The program keeps it for its whole life and
/// deletes its handle through it on drop.
///
/// Construction never fails. Read, compile and link errors are logged at
/// `error` level as they happen and kept in [`diagnostics`](Self::diagnostics);
/// a program that failed somewhere still holds whatever handle the driver gave
/// back and can still be bound, it just won't draw anything useful.
pub struct ShaderProgram<G>
where
    G: Deref,
    G::Target: ShaderBackend,
{
    gl: G,
    handle: Option<ProgramOf<G>>,
    status: ProgramStatus,
    diagnostics: Vec<ShaderError>,
}

impl<G> ShaderProgram<G>
where
    G: Deref,
    G::Target: ShaderBackend,
{
    /// Reads both files and builds the program from their contents.
    ///
    /// A file that can't be read is reported and compiled as empty source.
    pub fn from_files<P, Q>(gl: G, vertex_path: P, fragment_path: Q) -> Self
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let mut diagnostics = Vec::new();
        let vertex_source = read_source(ShaderStage::Vertex, vertex_path.as_ref(), &mut diagnostics);
        let fragment_source =
            read_source(ShaderStage::Fragment, fragment_path.as_ref(), &mut diagnostics);

        Self::build(gl, &vertex_source, &fragment_source, diagnostics)
    }

    pub fn from_sources(gl: G, vertex_source: &str, fragment_source: &str) -> Self {
        Self::build(gl, vertex_source, fragment_source, Vec::new())
    }

    fn build(
        gl: G,
        vertex_source: &str,
        fragment_source: &str,
        mut diagnostics: Vec<ShaderError>,
    ) -> Self {
        let backend: &G::Target = &gl;

        let handle = match backend.create_program() {
            Ok(program) => Some(program),
            Err(reason) => {
                report(
                    &mut diagnostics,
                    ShaderError::ObjectCreation {
                        object: GlObject::Program,
                        reason,
                    },
                );
                None
            }
        };

        let stages: Vec<ShaderOf<G>> = [
            (ShaderStage::Vertex, vertex_source),
            (ShaderStage::Fragment, fragment_source),
        ]
        .into_iter()
        .filter_map(|(stage, source)| compile_stage(backend, stage, source, &mut diagnostics))
        .collect();

        if let Some(program) = handle {
            for &shader in &stages {
                backend.attach_shader(program, shader);
            }
            backend.link_program(program);

            if !backend.program_link_status(program) {
                let log = info_log::bounded(&backend.program_info_log(program));
                report(&mut diagnostics, ShaderError::Link { log });
            }

            for &shader in &stages {
                backend.detach_shader(program, shader);
            }
        }

        // Stage objects never outlive construction, whatever happened above.
        for shader in stages {
            backend.delete_shader(shader);
        }

        let status = if diagnostics.is_empty() {
            debug!("Linked shader program {:?}", handle);
            ProgramStatus::Linked
        } else {
            ProgramStatus::Failed
        };

        Self {
            gl,
            handle,
            status,
            diagnostics,
        }
    }

    /// Driver handle, `None` only if the driver refused to create a program.
    pub fn handle(&self) -> Option<ProgramOf<G>> {
        self.handle
    }

    pub fn status(&self) -> ProgramStatus {
        self.status
    }

    pub fn is_valid(&self) -> bool {
        self.status == ProgramStatus::Linked
    }

    /// Failures recorded during construction, in the order they happened.
    pub fn diagnostics(&self) -> &[ShaderError] {
        &self.diagnostics
    }

    /// Turns a program that failed anywhere into its first diagnostic.
    ///
    /// The program is dropped (and its handle deleted) on the error path.
    pub fn into_result(mut self) -> Result<Self, ShaderError> {
        if self.diagnostics.is_empty() {
            Ok(self)
        } else {
            Err(self.diagnostics.remove(0))
        }
    }

    /// Makes this the current program.
    ///
    /// Link status is not checked. The returned token is the only way to set
    /// uniforms; it re-binds its own program before each upload, so it stays
    /// correct after another program has been made current.
    pub fn use_program(&self) -> BoundProgram<'_, BackendOf<G>> {
        let gl: &G::Target = &self.gl;
        gl.use_program(self.handle);

        BoundProgram {
            gl,
            handle: self.handle,
        }
    }
}

impl<G> Drop for ShaderProgram<G>
where
    G: Deref,
    G::Target: ShaderBackend,
{
    fn drop(&mut self) {
        if let Some(program) = self.handle.take() {
            self.gl.delete_program(program);
            debug!("Deleted shader program {:?}", program);
        }
    }
}

impl<G> fmt::Debug for ShaderProgram<G>
where
    G: Deref,
    G::Target: ShaderBackend,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("handle", &self.handle)
            .field("status", &self.status)
            .field("diagnostics", &self.diagnostics)
            .finish()
    }
}

/// A [`ShaderProgram`] that has been made current.
///
/// Uniform names are looked up on every call. A name the program doesn't
/// have (or optimized away) is ignored, as GL does for location `-1`.
///
/// Uploads bind the token's program first: GL writes uniforms to whatever
/// program is current, and a location is only meaningful for the program it
/// was queried from.
pub struct BoundProgram<'a, B: ShaderBackend + ?Sized> {
    gl: &'a B,
    handle: Option<B::Program>,
}

impl<B: ShaderBackend + ?Sized> BoundProgram<'_, B> {
    pub fn set_uniform<U: Into<Uniform>>(&self, name: &str, value: U) {
        let Some(program) = self.handle else {
            return;
        };

        match self.gl.uniform_location(program, name) {
            Some(location) => {
                self.gl.use_program(Some(program));
                self.gl.upload_uniform(&location, value.into());
            }
            None => trace!("Uniform {:?} not found in program {:?}, ignoring", name, program),
        }
    }

    pub fn set_int(&self, name: &str, value: i32) {
        self.set_uniform(name, value);
    }

    pub fn set_bool(&self, name: &str, value: bool) {
        self.set_uniform(name, value);
    }

    pub fn set_float(&self, name: &str, value: f32) {
        self.set_uniform(name, value);
    }

    pub fn set_ivec4(&self, name: &str, x: i32, y: i32, z: i32, w: i32) {
        self.set_uniform(name, [x, y, z, w]);
    }

    pub fn set_vec4(&self, name: &str, x: f32, y: f32, z: f32, w: f32) {
        self.set_uniform(name, [x, y, z, w]);
    }
}

fn report(diagnostics: &mut Vec<ShaderError>, err: ShaderError) {
    error!("{}", err);
    diagnostics.push(err);
}

fn read_source(stage: ShaderStage, path: &Path, diagnostics: &mut Vec<ShaderError>) -> String {
    match fs::read_to_string(path) {
        Ok(source) => {
            debug!("Read {} shader source from {}", stage, path.display());
            source
        }
        Err(source) => {
            report(
                diagnostics,
                ShaderError::FileRead {
                    stage,
                    path: path.to_path_buf(),
                    source,
                },
            );
            String::new()
        }
    }
}

/// Creates and compiles one stage. A stage that fails to compile is still
/// returned; it gets attached and the link is attempted anyway.
fn compile_stage<B: ShaderBackend + ?Sized>(
    gl: &B,
    stage: ShaderStage,
    source: &str,
    diagnostics: &mut Vec<ShaderError>,
) -> Option<B::Shader> {
    let shader = match gl.create_shader(stage) {
        Ok(shader) => shader,
        Err(reason) => {
            report(
                diagnostics,
                ShaderError::ObjectCreation {
                    object: GlObject::Stage(stage),
                    reason,
                },
            );
            return None;
        }
    };

    gl.compile_shader(shader, source);

    if !gl.shader_compile_status(shader) {
        let log = info_log::bounded(&gl.shader_info_log(shader));
        report(diagnostics, ShaderError::Compile { stage, log });
    }

    Some(shader)
}
