//! Materials: a shader plus the named uniform values it is drawn with.

use crate::data_structures::color::Color;
use crate::data_structures::shader::Shader;
use crate::math::{Matrix4, Vector3};

/// A single uniform value, already in GPU-friendly units.
#[derive(Clone, Debug, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat4([[f32; 4]; 4]),
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Float(v)
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        UniformValue::Int(v)
    }
}

impl From<Vector3> for UniformValue {
    fn from(v: Vector3) -> Self {
        UniformValue::Vec3(v.into())
    }
}

impl From<Color> for UniformValue {
    fn from(c: Color) -> Self {
        UniformValue::Vec4(c.to_array())
    }
}

impl From<Matrix4> for UniformValue {
    fn from(m: Matrix4) -> Self {
        UniformValue::Mat4(m.into())
    }
}

/// Identity of the GPU program a material is drawn with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramKey(pub u64);

#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    shader: Shader,
    uniforms: Vec<(String, UniformValue)>,
}

impl Material {
    pub fn new(shader: Shader, uniforms: Vec<(String, UniformValue)>) -> Self {
        Self { shader, uniforms }
    }

    pub fn basic(color: Color) -> Self {
        Self::new(Shader::basic(), vec![("color".into(), color.into())])
    }

    pub fn phong(ambient: Color, diffuse: Color, specular: Color, shininess: f32, light_coordinates: Vector3) -> Self {
        Self::new(
            Shader::phong(),
            vec![
                ("ambient".into(), ambient.into()),
                ("diffuse".into(), diffuse.into()),
                ("specular".into(), specular.into()),
                ("shininess".into(), shininess.into()),
                ("lightCoordinates".into(), light_coordinates.into()),
            ],
        )
    }

    /// White Phong with shininess 30, the material imported meshes receive.
    pub fn default_phong() -> Self {
        Self::phong(Color::WHITE, Color::WHITE, Color::WHITE, 30.0, Vector3::new(3.0, 3.0, 3.0))
    }

    pub fn shader(&self) -> &Shader {
        &self.shader
    }

    pub fn uniforms(&self) -> impl Iterator<Item = (&str, &UniformValue)> {
        self.uniforms.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn uniform(&self, name: &str) -> Option<&UniformValue> {
        self.uniforms.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn set_uniform(&mut self, name: &str, value: impl Into<UniformValue>) {
        let value = value.into();
        match self.uniforms.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = value,
            None => self.uniforms.push((name.to_string(), value)),
        }
    }

    /// Materials sharing a shader share a program, independent of their uniforms.
    pub fn program_key(&self) -> ProgramKey {
        ProgramKey(self.shader.content_hash())
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::basic(Color::WHITE)
    }
}
