use serde::{Deserialize, Serialize};

use crate::{mapping::GeometryComplexity, MandalaError, Result};

/// Base ring dimensions before any per-phase intensity scaling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    pub outer_radius: f32,
    pub inner_radius: f32,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            outer_radius: 5.0,
            inner_radius: 1.0,
        }
    }
}

/// Indexed triangle mesh in the XY plane.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|tri| [tri[0], tri[1], tri[2]])
    }
}

/// Tessellates a closed annulus into `2 * segments` triangles.
///
/// Vertices alternate inner/outer at each angular step, so vertex `2i` is
/// inner and `2i + 1` is outer. Indices wrap so the last segment joins the
/// first without a seam.
pub fn generate(segments: u32, outer_radius: f32, inner_radius: f32) -> Result<Mesh> {
    validate_ring(segments, outer_radius, inner_radius)?;
    let mut mesh = Mesh::default();
    append_ring(&mut mesh, segments, outer_radius, inner_radius, 0.0);
    Ok(mesh)
}

/// Splits `[inner_radius, outer_radius]` into `complexity.layers` concentric
/// rings. Odd layers are rotated by half a segment so the petals interleave.
pub fn generate_layered(
    complexity: GeometryComplexity,
    outer_radius: f32,
    inner_radius: f32,
) -> Result<Mesh> {
    complexity.validate()?;
    validate_ring(complexity.segments, outer_radius, inner_radius)?;

    let layers = complexity.layers;
    let band = (outer_radius - inner_radius) / layers as f32;
    let half_step = 180.0 / complexity.segments as f32;

    let mut mesh = Mesh::default();
    for layer in 0..layers {
        let inner = inner_radius + band * layer as f32;
        let outer = if layer + 1 == layers {
            outer_radius
        } else {
            inner_radius + band * (layer + 1) as f32
        };
        let offset = if layer % 2 == 1 { half_step } else { 0.0 };
        append_ring(&mut mesh, complexity.segments, outer, inner, offset);
    }
    Ok(mesh)
}

pub(crate) fn validate_ring(segments: u32, outer_radius: f32, inner_radius: f32) -> Result<()> {
    if !(GeometryComplexity::MIN_SEGMENTS..=GeometryComplexity::MAX_SEGMENTS).contains(&segments) {
        return Err(MandalaError::geometry(format!(
            "segment count {segments} outside [{}, {}]",
            GeometryComplexity::MIN_SEGMENTS,
            GeometryComplexity::MAX_SEGMENTS
        )));
    }
    if !outer_radius.is_finite() || !inner_radius.is_finite() {
        return Err(MandalaError::geometry("radii must be finite"));
    }
    if inner_radius < 0.0 {
        return Err(MandalaError::geometry(format!(
            "inner radius {inner_radius} is negative"
        )));
    }
    if outer_radius <= inner_radius {
        return Err(MandalaError::geometry(format!(
            "outer radius {outer_radius} must exceed inner radius {inner_radius}"
        )));
    }
    Ok(())
}

fn append_ring(
    mesh: &mut Mesh,
    segments: u32,
    outer_radius: f32,
    inner_radius: f32,
    offset_degrees: f32,
) {
    let base = mesh.vertices.len() as u32;
    let ring_len = segments * 2;
    let step = 360.0 / segments as f32;

    mesh.vertices.reserve(ring_len as usize);
    for i in 0..segments {
        let (sin, cos) = (offset_degrees + i as f32 * step).to_radians().sin_cos();
        mesh.vertices.push([cos * inner_radius, sin * inner_radius, 0.0]);
        mesh.vertices.push([cos * outer_radius, sin * outer_radius, 0.0]);
    }

    mesh.indices.reserve(segments as usize * 6);
    for i in 0..segments {
        let i0 = base + i * 2;
        let i1 = base + i * 2 + 1;
        let i2 = base + (i * 2 + 2) % ring_len;
        let i3 = base + (i * 2 + 3) % ring_len;
        mesh.indices.extend_from_slice(&[i0, i2, i1, i1, i2, i3]);
    }
}

/// Owns the current mandala mesh and only swaps it for a fully built one.
#[derive(Debug, Default)]
pub struct GeometryGenerator {
    config: GeometryConfig,
    mesh: Option<Mesh>,
    complexity: Option<GeometryComplexity>,
}

impl GeometryGenerator {
    pub fn new(config: GeometryConfig) -> Self {
        Self {
            config,
            mesh: None,
            complexity: None,
        }
    }

    pub fn config(&self) -> &GeometryConfig {
        &self.config
    }

    /// Rebuilds from the configured radii, stretching the outer radius by
    /// `1 + radius_intensity`.
    pub fn regenerate(
        &mut self,
        complexity: GeometryComplexity,
        radius_intensity: f32,
    ) -> Result<&Mesh> {
        let outer = self.config.outer_radius * (1.0 + radius_intensity);
        let inner = self.config.inner_radius;
        self.rebuild(complexity, outer, inner)
    }

    /// Replaces the held mesh; on error the previous mesh is kept.
    pub fn rebuild(
        &mut self,
        complexity: GeometryComplexity,
        outer_radius: f32,
        inner_radius: f32,
    ) -> Result<&Mesh> {
        match generate_layered(complexity, outer_radius, inner_radius) {
            Ok(mesh) => {
                tracing::debug!(
                    segments = complexity.segments,
                    layers = complexity.layers,
                    vertices = mesh.vertex_count(),
                    "regenerated mandala mesh"
                );
                self.complexity = Some(complexity);
                Ok(&*self.mesh.insert(mesh))
            }
            Err(err) => {
                tracing::warn!(%err, "rejected mandala geometry; keeping previous mesh");
                Err(err)
            }
        }
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        self.mesh.as_ref()
    }

    /// Complexity of the mesh currently held.
    pub fn complexity(&self) -> Option<GeometryComplexity> {
        self.complexity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eight_segment_ring_has_expected_topology() {
        let mesh = generate(8, 5.0, 1.0).unwrap();
        assert_eq!(mesh.vertex_count(), 16);
        assert_eq!(mesh.indices.len(), 48);
        assert_eq!(mesh.triangle_count(), 16);
        assert!(mesh.indices.iter().all(|&index| index < 16));

        for i in 0..8u32 {
            let inner = i * 2;
            let next_inner = (inner + 2) % 16;
            assert!(mesh
                .triangles()
                .any(|tri| tri.contains(&inner) && tri.contains(&next_inner)));
        }
    }

    #[test]
    fn vertices_alternate_inner_and_outer_radius() {
        let mesh = generate(6, 5.0, 1.0).unwrap();
        for (index, vertex) in mesh.vertices.iter().enumerate() {
            let radius = (vertex[0] * vertex[0] + vertex[1] * vertex[1]).sqrt();
            let expected = if index % 2 == 0 { 1.0 } else { 5.0 };
            assert!((radius - expected).abs() < 1e-4);
            assert_eq!(vertex[2], 0.0);
        }
    }

    #[test]
    fn last_segment_closes_the_ring() {
        let mesh = generate(3, 2.0, 0.0).unwrap();
        let tail: Vec<_> = mesh.triangles().skip(4).collect();
        assert_eq!(tail, vec![[4, 0, 5], [5, 0, 1]]);
    }

    #[test]
    fn rejects_degenerate_parameters() {
        assert!(matches!(
            generate(2, 5.0, 1.0),
            Err(MandalaError::InvalidGeometry(_))
        ));
        assert!(generate(361, 5.0, 1.0).is_err());
        assert!(generate(8, 1.0, 2.0).is_err());
        assert!(generate(8, 1.0, 1.0).is_err());
        assert!(generate(8, 1.0, -0.5).is_err());
        assert!(generate(8, f32::NAN, 0.5).is_err());
    }

    #[test]
    fn single_layer_matches_plain_ring() {
        let layered = generate_layered(GeometryComplexity::new(8, 1), 5.0, 1.0).unwrap();
        assert_eq!(layered, generate(8, 5.0, 1.0).unwrap());
    }

    #[test]
    fn layers_stack_disjoint_rings() {
        let mesh = generate_layered(GeometryComplexity::new(10, 4), 5.0, 1.0).unwrap();
        assert_eq!(mesh.vertex_count(), 80);
        assert_eq!(mesh.triangle_count(), 80);
        assert!(mesh.indices.iter().all(|&index| index < 80));

        let outermost = mesh.vertices[79];
        let radius = (outermost[0] * outermost[0] + outermost[1] * outermost[1]).sqrt();
        assert!((radius - 5.0).abs() < 1e-4);
    }

    #[test]
    fn failed_rebuild_keeps_previous_mesh() {
        let mut generator = GeometryGenerator::new(GeometryConfig::default());
        generator
            .rebuild(GeometryComplexity::new(8, 1), 5.0, 1.0)
            .unwrap();
        let before = generator.mesh().cloned();

        assert!(generator
            .rebuild(GeometryComplexity::new(2, 1), 5.0, 1.0)
            .is_err());
        assert!(generator
            .rebuild(GeometryComplexity::new(8, 1), 1.0, 2.0)
            .is_err());

        assert_eq!(generator.mesh().cloned(), before);
        assert_eq!(generator.complexity(), Some(GeometryComplexity::new(8, 1)));
    }

    #[test]
    fn regenerate_applies_radius_intensity() {
        let mut generator = GeometryGenerator::new(GeometryConfig::default());
        let mesh = generator
            .regenerate(GeometryComplexity::new(4, 1), 0.3)
            .unwrap();
        let outer = mesh.vertices[1];
        assert!((outer[0] - 6.5).abs() < 1e-4);
    }
}
