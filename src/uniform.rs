/// A uniform value in one of the shapes a [`BoundProgram`](crate::BoundProgram)
/// can upload.
///
/// The set is closed on purpose: anything else does not convert into a
/// `Uniform` and so does not compile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Uniform {
    Int(i32),
    /// Uploaded as an integer, `0` or `1`.
    Bool(bool),
    Float(f32),
    IVec4([i32; 4]),
    Vec4([f32; 4]),
}

impl Uniform {
    /// Number of components the native setter writes.
    pub fn components(&self) -> usize {
        match self {
            Uniform::Int(_) | Uniform::Bool(_) | Uniform::Float(_) => 1,
            Uniform::IVec4(_) | Uniform::Vec4(_) => 4,
        }
    }
}

impl From<i32> for Uniform {
    fn from(value: i32) -> Self {
        Uniform::Int(value)
    }
}

impl From<bool> for Uniform {
    fn from(value: bool) -> Self {
        Uniform::Bool(value)
    }
}

impl From<f32> for Uniform {
    fn from(value: f32) -> Self {
        Uniform::Float(value)
    }
}

impl From<[i32; 4]> for Uniform {
    fn from(value: [i32; 4]) -> Self {
        Uniform::IVec4(value)
    }
}

impl From<[f32; 4]> for Uniform {
    fn from(value: [f32; 4]) -> Self {
        Uniform::Vec4(value)
    }
}

impl From<(i32, i32, i32, i32)> for Uniform {
    fn from((x, y, z, w): (i32, i32, i32, i32)) -> Self {
        Uniform::IVec4([x, y, z, w])
    }
}

impl From<(f32, f32, f32, f32)> for Uniform {
    fn from((x, y, z, w): (f32, f32, f32, f32)) -> Self {
        Uniform::Vec4([x, y, z, w])
    }
}

impl From<cgmath::Vector4<i32>> for Uniform {
    fn from(value: cgmath::Vector4<i32>) -> Self {
        Uniform::IVec4(value.into())
    }
}

impl From<cgmath::Vector4<f32>> for Uniform {
    fn from(value: cgmath::Vector4<f32>) -> Self {
        Uniform::Vec4(value.into())
    }
}
