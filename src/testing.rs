//! In-memory stand-in for a GL context, for unit tests.
//!
//! Compilation fails for empty sources or any source containing `BROKEN`
//! (`VERBOSE` makes the info log very long). Linking fails if a stage failed
//! or a fragment `in` has no matching vertex `out`. Uniforms are whatever
//! `uniform <type> <name>;` lines the attached sources declare.

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    sync::Once,
};

use crate::{backend::ShaderBackend, shaders::ShaderStage, uniform::Uniform};

pub const VERTEX_SOURCE: &str = "#version 330 core
layout (location = 0) in vec2 a_position;
layout (location = 1) in vec3 a_color;
out vec3 v_color;
uniform float u_intensity;
void main() {
    v_color = a_color * u_intensity;
    gl_Position = vec4(a_position, 0.0, 1.0);
}
";

pub const FRAGMENT_SOURCE: &str = "#version 330 core
in vec3 v_color;
out vec4 frag_color;
uniform vec4 u_tint;
uniform bool u_use_vertex_color;
uniform int u_mask_enabled;
uniform ivec4 u_mask;
void main() {
    vec4 color = u_use_vertex_color ? vec4(v_color, 1.0) : u_tint;
    if (u_mask_enabled != 0) color *= vec4(u_mask);
    frag_color = color;
}
";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MockShader(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MockProgram(u32);

#[derive(Debug)]
pub struct MockLocation {
    name: String,
}

struct ShaderObject {
    stage: ShaderStage,
    source: String,
    compiled: bool,
}

#[derive(Default)]
struct ProgramObject {
    attached: Vec<MockShader>,
    linked: bool,
    link_log: String,
    uniforms: HashSet<String>,
    values: HashMap<String, Uniform>,
}

#[derive(Default)]
struct State {
    next_id: u32,
    shaders: HashMap<MockShader, ShaderObject>,
    programs: HashMap<MockProgram, ProgramObject>,
    shaders_created: usize,
    compiled_sources: Vec<String>,
    link_attempts: usize,
    uploads: usize,
    program_deletions: HashMap<MockProgram, usize>,
    current: Option<MockProgram>,
    refuse_programs: bool,
}

#[derive(Default)]
pub struct RecordingGl {
    state: RefCell<State>,
}

impl RecordingGl {
    pub fn refuse_program_creation(&self) {
        self.state.borrow_mut().refuse_programs = true;
    }

    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    pub fn attached_shaders(&self) -> usize {
        self.state
            .borrow()
            .programs
            .values()
            .map(|p| p.attached.len())
            .sum()
    }

    pub fn shaders_created(&self) -> usize {
        self.state.borrow().shaders_created
    }

    pub fn compiled_sources(&self) -> Vec<String> {
        self.state.borrow().compiled_sources.clone()
    }

    pub fn link_attempts(&self) -> usize {
        self.state.borrow().link_attempts
    }

    pub fn uploads(&self) -> usize {
        self.state.borrow().uploads
    }

    pub fn program_deletions(&self, program: MockProgram) -> usize {
        self.state
            .borrow()
            .program_deletions
            .get(&program)
            .copied()
            .unwrap_or(0)
    }

    pub fn current_program(&self) -> Option<MockProgram> {
        self.state.borrow().current
    }

    pub fn uniform(&self, program: MockProgram, name: &str) -> Option<Uniform> {
        self.state
            .borrow()
            .programs
            .get(&program)
            .and_then(|p| p.values.get(name).copied())
    }

    fn next_id(state: &mut State) -> u32 {
        state.next_id += 1;
        state.next_id
    }
}

fn declarations<'a>(source: &'a str, keyword: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    source.lines().filter_map(move |line| {
        let mut words = line.trim().trim_end_matches(';').split_whitespace();
        if words.next()? != keyword {
            return None;
        }
        words.last()
    })
}

impl ShaderBackend for RecordingGl {
    type Shader = MockShader;
    type Program = MockProgram;
    type UniformLocation = MockLocation;

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String> {
        let mut state = self.state.borrow_mut();
        let shader = MockShader(Self::next_id(&mut state));
        state.shaders.insert(
            shader,
            ShaderObject {
                stage,
                source: String::new(),
                compiled: false,
            },
        );
        state.shaders_created += 1;
        Ok(shader)
    }

    fn compile_shader(&self, shader: Self::Shader, source: &str) {
        let mut state = self.state.borrow_mut();
        state.compiled_sources.push(source.to_string());
        let object = state.shaders.get_mut(&shader).expect("unknown shader");
        object.source = source.to_string();
        object.compiled = !source.trim().is_empty() && !source.contains("BROKEN");
    }

    fn shader_compile_status(&self, shader: Self::Shader) -> bool {
        self.state.borrow().shaders[&shader].compiled
    }

    fn shader_info_log(&self, shader: Self::Shader) -> String {
        let state = self.state.borrow();
        let object = &state.shaders[&shader];
        if object.compiled {
            String::new()
        } else if object.source.contains("VERBOSE") {
            "0:1(1): error: syntax error, unexpected token\n".repeat(200)
        } else {
            "0:1(1): error: syntax error, unexpected token\n".to_string()
        }
    }

    fn delete_shader(&self, shader: Self::Shader) {
        let mut state = self.state.borrow_mut();
        let still_attached = state
            .programs
            .values()
            .any(|p| p.attached.contains(&shader));
        assert!(!still_attached, "deleting a shader that is still attached");
        state.shaders.remove(&shader);
    }

    fn create_program(&self) -> Result<Self::Program, String> {
        let mut state = self.state.borrow_mut();
        if state.refuse_programs {
            return Err("out of memory".to_string());
        }
        let program = MockProgram(Self::next_id(&mut state));
        state.programs.insert(program, ProgramObject::default());
        Ok(program)
    }

    fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        let mut state = self.state.borrow_mut();
        let object = state.programs.get_mut(&program).expect("unknown program");
        object.attached.push(shader);
    }

    fn detach_shader(&self, program: Self::Program, shader: Self::Shader) {
        let mut state = self.state.borrow_mut();
        let object = state.programs.get_mut(&program).expect("unknown program");
        object.attached.retain(|&s| s != shader);
    }

    fn link_program(&self, program: Self::Program) {
        let mut state = self.state.borrow_mut();
        state.link_attempts += 1;

        let attached = state.programs[&program].attached.clone();
        let mut outs = HashSet::new();
        let mut ins = Vec::new();
        let mut uniforms = HashSet::new();
        let mut all_compiled = attached.len() == 2;

        for shader in &attached {
            let object = &state.shaders[shader];
            all_compiled &= object.compiled;
            uniforms.extend(declarations(&object.source, "uniform").map(str::to_string));
            match object.stage {
                ShaderStage::Vertex => {
                    outs.extend(declarations(&object.source, "out").map(str::to_string))
                }
                ShaderStage::Fragment => {
                    ins.extend(declarations(&object.source, "in").map(str::to_string))
                }
            }
        }

        let (linked, link_log) = if !all_compiled {
            (false, "error: linking with uncompiled/unspecialized shader".to_string())
        } else if let Some(missing) = ins.iter().find(|name| !outs.contains(*name)) {
            (
                false,
                format!("error: fragment shader input `{missing}' has no matching output"),
            )
        } else {
            (true, String::new())
        };

        let object = state.programs.get_mut(&program).expect("unknown program");
        object.linked = linked;
        object.link_log = link_log;
        object.uniforms = if linked { uniforms } else { HashSet::new() };
    }

    fn program_link_status(&self, program: Self::Program) -> bool {
        self.state.borrow().programs[&program].linked
    }

    fn program_info_log(&self, program: Self::Program) -> String {
        self.state.borrow().programs[&program].link_log.clone()
    }

    fn delete_program(&self, program: Self::Program) {
        let mut state = self.state.borrow_mut();
        state.programs.remove(&program);
        *state.program_deletions.entry(program).or_insert(0) += 1;
        if state.current == Some(program) {
            state.current = None;
        }
    }

    fn use_program(&self, program: Option<Self::Program>) {
        self.state.borrow_mut().current = program;
    }

    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        let state = self.state.borrow();
        let object = state.programs.get(&program)?;
        object.uniforms.contains(name).then(|| MockLocation {
            name: name.to_string(),
        })
    }

    fn upload_uniform(&self, location: &Self::UniformLocation, value: Uniform) {
        let mut state = self.state.borrow_mut();
        let Some(current) = state.current else {
            return;
        };
        state.uploads += 1;
        if let Some(object) = state.programs.get_mut(&current) {
            object.values.insert(location.name.clone(), value);
        }
    }
}

thread_local! {
    static CAPTURED: RefCell<Vec<(log::Level, String)>> = const { RefCell::new(Vec::new()) };
}

struct CaptureLogger;

impl log::Log for CaptureLogger {
    fn enabled(&self, _metadata: &log::Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &log::Record<'_>) {
        CAPTURED.with(|captured| {
            captured
                .borrow_mut()
                .push((record.level(), record.args().to_string()))
        });
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;

/// Routes log records into a per-thread buffer (each test runs on its own
/// thread) and clears whatever the current thread captured so far.
pub fn capture_logs() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(log::LevelFilter::Trace);
        }
    });
    CAPTURED.with(|captured| captured.borrow_mut().clear());
}

/// Messages logged at `error` level on this thread since [`capture_logs`].
pub fn logged_errors() -> Vec<String> {
    CAPTURED.with(|captured| {
        captured
            .borrow()
            .iter()
            .filter(|(level, _)| *level == log::Level::Error)
            .map(|(_, message)| message.clone())
            .collect()
    })
}
