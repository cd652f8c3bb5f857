use glow::HasContext;

#[derive(Debug, Clone)]
pub struct Layout {
    pub index: u32,
    pub size: i32,
    pub gl_type: u32,
    pub normalized: bool,
    pub offset: usize,
}

impl Layout {
    pub fn new(index: u32, size: i32, gl_type: u32, normalized: bool, offset: usize) -> Self {
        Self {
            index,
            size,
            gl_type,
            normalized,
            offset,
        }
    }
}

/// Interleaved, non-indexed vertex data uploaded once.
#[derive(Debug)]
pub struct TriangleMesh {
    vao: glow::NativeVertexArray,
    vbo: glow::NativeBuffer,
    vertex_count: i32,
}

impl TriangleMesh {
    pub fn new(
        context: &glow::Context,
        vertices: &[f32],
        stride: i32,
        layouts: &[Layout],
    ) -> Result<Self, String> {
        unsafe {
            let vao = context.create_vertex_array()?;
            context.bind_vertex_array(Some(vao));

            let vbo = context.create_buffer()?;
            context.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            context.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(vertices),
                glow::STATIC_DRAW,
            );

            for layout in layouts {
                context.vertex_attrib_pointer_f32(
                    layout.index,
                    layout.size,
                    layout.gl_type,
                    layout.normalized,
                    stride,
                    layout.offset as i32,
                );
                context.enable_vertex_attrib_array(layout.index);
            }

            context.bind_vertex_array(None);

            let vertex_count = (vertices.len() as i32) / (stride / std::mem::size_of::<f32>() as i32);

            Ok(Self {
                vao,
                vbo,
                vertex_count,
            })
        }
    }

    /// Position (xy) + color (rgb) triangle covering the middle of the viewport.
    pub fn colored_triangle(context: &glow::Context) -> Result<Self, String> {
        let vertices: [f32; 15] = [
            //  Position     Color
            -0.8, -0.8, 1.0, 0.0, 0.0, //
            0.8, -0.8, 0.0, 1.0, 0.0, //
            0.0, 0.8, 0.0, 0.0, 1.0,
        ];
        let float = std::mem::size_of::<f32>();
        let stride = (5 * float) as i32;
        let layouts = [
            Layout::new(0, 2, glow::FLOAT, false, 0),
            Layout::new(1, 3, glow::FLOAT, false, 2 * float),
        ];

        Self::new(context, &vertices, stride, &layouts)
    }

    pub fn draw(&self, context: &glow::Context) {
        unsafe {
            context.bind_vertex_array(Some(self.vao));
            context.draw_arrays(glow::TRIANGLES, 0, self.vertex_count);
            context.bind_vertex_array(None);
        }
    }

    pub fn destroy(&self, context: &glow::Context) {
        unsafe {
            context.delete_vertex_array(self.vao);
            context.delete_buffer(self.vbo);
        }
    }
}
