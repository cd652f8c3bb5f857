use std::error::Error;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use clap::{Arg, ArgAction, Command};
use cruel_shader::ShaderProgram;
use glow::HasContext;
use glutin::config::ConfigTemplateBuilder;
use glutin::context::{ContextAttributesBuilder, PossiblyCurrentContext};
use glutin::display::{Display, DisplayApiPreference};
use glutin::prelude::*;
use glutin::surface::{Surface, SurfaceAttributesBuilder, WindowSurface};
use log::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::window::{Window, WindowId};

mod opengl;
use opengl::TriangleMesh;

const SMOKE_COLOR: [u8; 4] = [255, 0, 0, 255];

struct Options {
    vertex_path: PathBuf,
    fragment_path: PathBuf,
    smoke: bool,
}

fn parse_options() -> Options {
    let matches = Command::new("cruel_shader")
        .about("Builds a shader program from two GLSL files and draws a triangle with it")
        .arg(
            Arg::new("vertex")
                .long("vertex")
                .value_name("PATH")
                .default_value("shaders/triangle.vert")
                .help("Vertex stage source"),
        )
        .arg(
            Arg::new("fragment")
                .long("fragment")
                .value_name("PATH")
                .default_value("shaders/triangle.frag")
                .help("Fragment stage source"),
        )
        .arg(
            Arg::new("smoke")
                .long("smoke")
                .action(ArgAction::SetTrue)
                .help("Draw one frame, check the centre pixel and exit"),
        )
        .get_matches();

    Options {
        vertex_path: matches
            .get_one::<String>("vertex")
            .map(PathBuf::from)
            .unwrap_or_default(),
        fragment_path: matches
            .get_one::<String>("fragment")
            .map(PathBuf::from)
            .unwrap_or_default(),
        smoke: matches.get_flag("smoke"),
    }
}

struct Renderer {
    gl: Arc<glow::Context>,
    program: ShaderProgram<Arc<glow::Context>>,
    triangle: TriangleMesh,
}

impl Renderer {
    fn new(gl: Arc<glow::Context>, options: &Options) -> Result<Self, Box<dyn Error>> {
        let program =
            ShaderProgram::from_files(Arc::clone(&gl), &options.vertex_path, &options.fragment_path);
        if !program.is_valid() {
            warn!(
                "Shader program from {} and {} is not usable ({} problem(s)), drawing anyway",
                options.vertex_path.display(),
                options.fragment_path.display(),
                program.diagnostics().len()
            );
        }

        let triangle = TriangleMesh::colored_triangle(&gl)?;

        Ok(Self {
            gl,
            program,
            triangle,
        })
    }

    fn render(&self, width: u32, height: u32, elapsed: f32, smoke: bool) {
        unsafe {
            self.gl.viewport(0, 0, width as i32, height as i32);
            self.gl.clear_color(0.0, 0.0, 0.0, 1.0);
            self.gl.clear(glow::COLOR_BUFFER_BIT);
        }

        let bound = self.program.use_program();
        if smoke {
            bound.set_float("u_intensity", 1.0);
            bound.set_bool("u_use_vertex_color", false);
            bound.set_vec4("u_tint", 1.0, 0.0, 0.0, 1.0);
            bound.set_int("u_mask_enabled", 1);
            bound.set_ivec4("u_mask", 1, 1, 0, 1);
        } else {
            bound.set_float("u_intensity", 0.6 + 0.4 * elapsed.sin());
            bound.set_bool("u_use_vertex_color", true);
            bound.set_int("u_mask_enabled", 0);
        }

        self.triangle.draw(&self.gl);
    }

    fn centre_pixel(&self, width: u32, height: u32) -> [u8; 4] {
        let mut pixel = [0u8; 4];
        unsafe {
            self.gl.read_pixels(
                (width / 2) as i32,
                (height / 2) as i32,
                1,
                1,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelPackData::Slice(Some(&mut pixel)),
            );
        }
        pixel
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        self.triangle.destroy(&self.gl);
    }
}

struct App {
    // Dropped first, the GL objects need the context alive.
    renderer: Option<Renderer>,
    surface: Option<Surface<WindowSurface>>,
    current_context: Option<PossiblyCurrentContext>,
    window: Option<Window>,

    options: Options,
    started: Instant,
    failed: bool,
}

impl App {
    fn new(options: Options) -> Self {
        Self {
            renderer: None,
            surface: None,
            current_context: None,
            window: None,
            options,
            started: Instant::now(),
            failed: false,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), Box<dyn Error>> {
        let window = event_loop.create_window(
            Window::default_attributes().with_title("cruel_shader"),
        )?;

        let raw_display_handle = window.display_handle()?.as_raw();
        let raw_window_handle = window.window_handle()?.as_raw();

        #[cfg(target_os = "windows")]
        let preference = DisplayApiPreference::Wgl(Some(raw_window_handle));
        #[cfg(target_os = "macos")]
        let preference = DisplayApiPreference::Cgl;
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        let preference = DisplayApiPreference::Egl;

        let display = unsafe { Display::new(raw_display_handle, preference)? };

        let config_template = ConfigTemplateBuilder::new()
            .compatible_with_native_window(raw_window_handle)
            .build();
        let config = unsafe { display.find_configs(config_template)? }
            .next()
            .ok_or("no GL config matches the window")?;

        let physical_size = window.inner_size();
        let width = NonZeroU32::new(physical_size.width).ok_or("window has zero width")?;
        let height = NonZeroU32::new(physical_size.height).ok_or("window has zero height")?;

        let surface_attributes = SurfaceAttributesBuilder::<WindowSurface>::new().build(
            raw_window_handle,
            width,
            height,
        );
        let surface = unsafe { display.create_window_surface(&config, &surface_attributes)? };

        let context_attributes = ContextAttributesBuilder::new().build(Some(raw_window_handle));
        let non_current_context = unsafe { display.create_context(&config, &context_attributes)? };
        let current_context = non_current_context.make_current(&surface)?;

        let gl = unsafe {
            Arc::new(glow::Context::from_loader_function_cstr(|s| {
                display.get_proc_address(s) as *const _
            }))
        };
        info!("GL context ready: {}", unsafe {
            gl.get_parameter_string(glow::VERSION)
        });

        let renderer = Renderer::new(gl, &self.options)?;

        window.request_redraw();

        self.renderer = Some(renderer);
        self.surface = Some(surface);
        self.current_context = Some(current_context);
        self.window = Some(window);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: Box<dyn Error>) {
        self.record_failure(err);
        event_loop.exit();
    }

    /// Logs `err` once; `main` only turns it into the exit code.
    fn record_failure(&mut self, err: Box<dyn Error>) {
        error!("{}", err);
        self.failed = true;
    }

    fn exit_code(&self) -> ExitCode {
        if self.failed {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        }
    }

    fn redraw(&mut self) -> Result<bool, Box<dyn Error>> {
        let (Some(window), Some(renderer), Some(surface), Some(context)) = (
            self.window.as_ref(),
            self.renderer.as_ref(),
            self.surface.as_ref(),
            self.current_context.as_ref(),
        ) else {
            return Ok(true);
        };

        let size = window.inner_size();
        let elapsed = self.started.elapsed().as_secs_f32();
        renderer.render(size.width, size.height, elapsed, self.options.smoke);

        if self.options.smoke {
            let pixel = renderer.centre_pixel(size.width, size.height);
            if pixel != SMOKE_COLOR {
                return Err(format!(
                    "smoke check failed: centre pixel is {:?}, expected {:?}",
                    pixel, SMOKE_COLOR
                )
                .into());
            }
            info!("Smoke check passed: centre pixel is {:?}", pixel);
            return Ok(false);
        }

        surface.swap_buffers(context)?;
        window.request_redraw();
        Ok(true)
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.init(event_loop) {
            self.fail(event_loop, err);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, stopping");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let (Some(surface), Some(context), Some(width), Some(height)) = (
                    self.surface.as_ref(),
                    self.current_context.as_ref(),
                    NonZeroU32::new(size.width),
                    NonZeroU32::new(size.height),
                ) {
                    surface.resize(context, width, height);
                }
            }
            WindowEvent::RedrawRequested => match self.redraw() {
                Ok(true) => {}
                Ok(false) => event_loop.exit(),
                Err(err) => self.fail(event_loop, err),
            },
            _ => (),
        }
    }
}

fn main() -> Result<ExitCode, Box<dyn Error>> {
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );

    let options = parse_options();

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(options);
    event_loop.run_app(&mut app)?;

    Ok(app.exit_code())
}
