//! Light kinds and their shader uniforms
//!
//! Directional, point and spot lights are plain parameter sets; `apply`
//! writes them into the fixed `lights_dir[i].*` / `lights_point[i].*` /
//! `lights_spot[i].*` uniform names. A [`LightSet`] pushes every light plus
//! the per-kind counts before a draw batch.

use cgmath::Vector3;

use crate::gfx::shader::ShaderProgram;

/// Fixed array length of each light kind in the shader.
pub const MAX_LIGHTS_PER_KIND: usize = 4;

fn default_ambient() -> Vector3<f32> {
    Vector3::new(0.2, 0.2, 0.2)
}
fn default_diffuse() -> Vector3<f32> {
    Vector3::new(0.5, 0.5, 0.5)
}
fn default_specular() -> Vector3<f32> {
    Vector3::new(1.0, 1.0, 1.0)
}

/// Light shining uniformly along one direction.
#[derive(Clone, Debug)]
pub struct DirLight {
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
    pub direction: Vector3<f32>,
}

impl DirLight {
    pub fn new(direction: Vector3<f32>) -> Self {
        Self {
            ambient: default_ambient(),
            diffuse: default_diffuse(),
            specular: default_specular(),
            direction,
        }
    }
}

/// Point light with distance attenuation.
///
/// The default attenuation terms cover roughly a 3250-unit radius.
#[derive(Clone, Debug)]
pub struct PointLight {
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
    pub position: Vector3<f32>,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl PointLight {
    pub fn new(position: Vector3<f32>) -> Self {
        Self {
            ambient: default_ambient(),
            diffuse: default_diffuse(),
            specular: default_specular(),
            position,
            constant: 1.0,
            linear: 0.0014,
            quadratic: 0.000007,
        }
    }
}

/// Cone-shaped light with a soft edge between the inner and outer cutoff.
#[derive(Clone, Debug)]
pub struct SpotLight {
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
    pub position: Vector3<f32>,
    pub direction: Vector3<f32>,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
    /// Cosine of the inner cutoff angle.
    pub cutoff: f32,
    /// Cosine of the outer cutoff angle.
    pub cutoff_outer: f32,
}

impl SpotLight {
    /// Builds a spot light from inner/outer cutoff angles in degrees.
    ///
    /// Panics when `inner_degrees >= outer_degrees`: the soft edge needs a
    /// non-empty angular band.
    pub fn new(
        position: Vector3<f32>,
        direction: Vector3<f32>,
        inner_degrees: f32,
        outer_degrees: f32,
    ) -> Self {
        let mut light = Self {
            ambient: default_ambient(),
            diffuse: default_diffuse(),
            specular: default_specular(),
            position,
            direction,
            constant: 1.0,
            linear: 0.0014,
            quadratic: 0.000007,
            cutoff: 0.0,
            cutoff_outer: 0.0,
        };
        light.set_cutoff_angles(inner_degrees, outer_degrees);
        light
    }

    /// Re-derives the cosine cutoffs from angles in degrees.
    pub fn set_cutoff_angles(&mut self, inner_degrees: f32, outer_degrees: f32) {
        assert!(
            inner_degrees < outer_degrees,
            "spot light inner cutoff ({} deg) must be less than outer cutoff ({} deg)",
            inner_degrees,
            outer_degrees
        );
        self.cutoff = inner_degrees.to_radians().cos();
        self.cutoff_outer = outer_degrees.to_radians().cos();
    }
}

/// Any of the three light kinds.
#[derive(Clone, Debug)]
pub enum Light {
    Dir(DirLight),
    Point(PointLight),
    Spot(SpotLight),
}

impl From<DirLight> for Light {
    fn from(light: DirLight) -> Self {
        Self::Dir(light)
    }
}
impl From<PointLight> for Light {
    fn from(light: PointLight) -> Self {
        Self::Point(light)
    }
}
impl From<SpotLight> for Light {
    fn from(light: SpotLight) -> Self {
        Self::Spot(light)
    }
}

impl Light {
    /// Writes this light's uniforms at `index` within its kind's array.
    pub fn apply(&self, shader: &mut ShaderProgram, index: usize) {
        match self {
            Light::Dir(light) => {
                let key = format!("lights_dir[{}]", index);
                shader.set_uniform(&format!("{}.direction", key), light.direction);
                shader.set_uniform(&format!("{}.ambient", key), light.ambient);
                shader.set_uniform(&format!("{}.diffuse", key), light.diffuse);
                shader.set_uniform(&format!("{}.specular", key), light.specular);
            }
            Light::Point(light) => {
                let key = format!("lights_point[{}]", index);
                shader.set_uniform(&format!("{}.position", key), light.position);
                shader.set_uniform(&format!("{}.ambient", key), light.ambient);
                shader.set_uniform(&format!("{}.diffuse", key), light.diffuse);
                shader.set_uniform(&format!("{}.specular", key), light.specular);
                shader.set_uniform(&format!("{}.constant", key), light.constant);
                shader.set_uniform(&format!("{}.linear", key), light.linear);
                shader.set_uniform(&format!("{}.quadratic", key), light.quadratic);
            }
            Light::Spot(light) => {
                let key = format!("lights_spot[{}]", index);
                shader.set_uniform(&format!("{}.position", key), light.position);
                shader.set_uniform(&format!("{}.direction", key), light.direction);
                shader.set_uniform(&format!("{}.ambient", key), light.ambient);
                shader.set_uniform(&format!("{}.diffuse", key), light.diffuse);
                shader.set_uniform(&format!("{}.specular", key), light.specular);
                shader.set_uniform(&format!("{}.constant", key), light.constant);
                shader.set_uniform(&format!("{}.linear", key), light.linear);
                shader.set_uniform(&format!("{}.quadratic", key), light.quadratic);
                shader.set_uniform(&format!("{}.cutoff", key), light.cutoff);
                shader.set_uniform(&format!("{}.cutoff_outer", key), light.cutoff_outer);
            }
        }
    }
}

/// All lights of a scene, pushed together before a draw batch.
#[derive(Default)]
pub struct LightSet {
    lights: Vec<Light>,
}

impl LightSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a light; each kind is limited to the shader's array length.
    pub fn push(&mut self, light: impl Into<Light>) {
        let light = light.into();
        let count = match light {
            Light::Dir(_) => self.dir_count(),
            Light::Point(_) => self.point_count(),
            Light::Spot(_) => self.spot_count(),
        };
        assert!(
            count < MAX_LIGHTS_PER_KIND,
            "at most {} lights per kind",
            MAX_LIGHTS_PER_KIND
        );
        self.lights.push(light);
    }

    pub fn clear(&mut self) {
        self.lights.clear();
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Light> {
        self.lights.iter()
    }

    pub fn dir_count(&self) -> usize {
        self.lights
            .iter()
            .filter(|l| matches!(l, Light::Dir(_)))
            .count()
    }

    pub fn point_count(&self) -> usize {
        self.lights
            .iter()
            .filter(|l| matches!(l, Light::Point(_)))
            .count()
    }

    pub fn spot_count(&self) -> usize {
        self.lights
            .iter()
            .filter(|l| matches!(l, Light::Spot(_)))
            .count()
    }

    /// Pushes every light plus the per-kind counts into the shader.
    pub fn apply(&self, shader: &mut ShaderProgram) {
        let (mut dir, mut point, mut spot) = (0usize, 0usize, 0usize);
        for light in &self.lights {
            let index = match light {
                Light::Dir(_) => {
                    dir += 1;
                    dir - 1
                }
                Light::Point(_) => {
                    point += 1;
                    point - 1
                }
                Light::Spot(_) => {
                    spot += 1;
                    spot - 1
                }
            };
            light.apply(shader, index);
        }
        shader.set_uniform("dir_light_num", dir as i32);
        shader.set_uniform("point_light_num", point as i32);
        shader.set_uniform("spot_light_num", spot as i32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spot_light_derives_cosine_cutoffs() {
        let light = SpotLight::new(
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(0.0, -1.0, 0.0),
            10.0,
            20.0,
        );
        assert!((light.cutoff - 10.0f32.to_radians().cos()).abs() < 1e-6);
        assert!((light.cutoff_outer - 20.0f32.to_radians().cos()).abs() < 1e-6);
    }

    #[test]
    #[should_panic(expected = "must be less than outer cutoff")]
    fn spot_light_rejects_inner_wider_than_outer() {
        SpotLight::new(
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(0.0, -1.0, 0.0),
            20.0,
            10.0,
        );
    }

    #[test]
    #[should_panic(expected = "must be less than outer cutoff")]
    fn spot_light_rejects_equal_angles() {
        let mut light = SpotLight::new(
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(0.0, -1.0, 0.0),
            10.0,
            20.0,
        );
        light.set_cutoff_angles(15.0, 15.0);
    }

    #[test]
    fn light_set_counts_kinds() {
        let mut lights = LightSet::new();
        lights.push(DirLight::new(Vector3::new(0.0, -1.0, 0.0)));
        lights.push(PointLight::new(Vector3::new(1.0, 2.0, 3.0)));
        lights.push(PointLight::new(Vector3::new(3.0, 2.0, 1.0)));
        assert_eq!(lights.dir_count(), 1);
        assert_eq!(lights.point_count(), 2);
        assert_eq!(lights.spot_count(), 0);
        assert_eq!(lights.len(), 3);
    }

    #[test]
    #[should_panic(expected = "at most 4 lights per kind")]
    fn light_set_caps_each_kind() {
        let mut lights = LightSet::new();
        for i in 0..5 {
            lights.push(PointLight::new(Vector3::new(i as f32, 0.0, 0.0)));
        }
    }
}
