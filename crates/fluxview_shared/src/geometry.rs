//! Surface geometry as delivered by the field data accessor.

use serde::{Deserialize, Serialize};

/// A point in solver space.
pub type Point3 = [f64; 3];

/// Connectivity of a surface mesh.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Topology {
    /// Polygonal faces, each a list of vertex indices.
    Faces(Vec<Vec<u32>>),
    /// Line segments (2D domains and edge surfaces).
    Lines(Vec<[u32; 2]>),
}

impl Topology {
    /// Number of cells (faces or segments).
    #[must_use]
    pub fn cell_count(&self) -> usize {
        match self {
            Self::Faces(faces) => faces.len(),
            Self::Lines(lines) => lines.len(),
        }
    }
}

/// Mesh of one solver surface.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SurfaceMesh {
    /// Solver-side surface id.
    pub surface_id: u32,
    /// Surface name.
    pub name: String,
    /// Vertex positions.
    pub vertices: Vec<Point3>,
    /// Cell connectivity.
    pub topology: Topology,
}

impl SurfaceMesh {
    /// Creates a mesh.
    #[must_use]
    pub fn new(surface_id: u32, name: impl Into<String>, vertices: Vec<Point3>, topology: Topology) -> Self {
        Self {
            surface_id,
            name: name.into(),
            vertices,
            topology,
        }
    }

    /// Builds a structured quad patch spanned by `u` and `v` from `origin`.
    ///
    /// `nu` x `nv` cells, `(nu + 1) * (nv + 1)` vertices.
    #[must_use]
    pub fn quad_patch(
        surface_id: u32,
        name: impl Into<String>,
        origin: Point3,
        u: Point3,
        v: Point3,
        nu: u32,
        nv: u32,
    ) -> Self {
        let nu = nu.max(1);
        let nv = nv.max(1);
        let mut vertices = Vec::with_capacity(((nu + 1) * (nv + 1)) as usize);
        for j in 0..=nv {
            for i in 0..=nu {
                let s = f64::from(i) / f64::from(nu);
                let t = f64::from(j) / f64::from(nv);
                vertices.push([
                    origin[0] + s * u[0] + t * v[0],
                    origin[1] + s * u[1] + t * v[1],
                    origin[2] + s * u[2] + t * v[2],
                ]);
            }
        }

        let row = nu + 1;
        let mut faces = Vec::with_capacity((nu * nv) as usize);
        for j in 0..nv {
            for i in 0..nu {
                let a = j * row + i;
                faces.push(vec![a, a + 1, a + 1 + row, a + row]);
            }
        }

        Self::new(surface_id, name, vertices, Topology::Faces(faces))
    }

    /// Number of cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.topology.cell_count()
    }

    /// Cell centroids (face or segment midpoints).
    ///
    /// Out-of-range indices are skipped rather than trusted.
    #[must_use]
    pub fn centroids(&self) -> Vec<Point3> {
        match &self.topology {
            Topology::Faces(faces) => faces
                .iter()
                .map(|face| self.average(face.iter().copied()))
                .collect(),
            Topology::Lines(lines) => lines
                .iter()
                .map(|line| self.average(line.iter().copied()))
                .collect(),
        }
    }

    fn average(&self, indices: impl Iterator<Item = u32>) -> Point3 {
        let mut sum = [0.0; 3];
        let mut count = 0.0;
        for idx in indices {
            if let Some(p) = self.vertices.get(idx as usize) {
                sum[0] += p[0];
                sum[1] += p[1];
                sum[2] += p[2];
                count += 1.0;
            }
        }
        if count > 0.0 {
            [sum[0] / count, sum[1] / count, sum[2] / count]
        } else {
            [0.0; 3]
        }
    }
}

/// Dot product.
#[inline]
#[must_use]
pub fn dot(a: Point3, b: Point3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Euclidean length.
#[inline]
#[must_use]
pub fn norm(a: Point3) -> f64 {
    dot(a, a).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quad_patch_shape() {
        let mesh = SurfaceMesh::quad_patch(3, "wall", [0.0; 3], [2.0, 0.0, 0.0], [0.0, 1.0, 0.0], 2, 1);
        assert_eq!(mesh.vertices.len(), 6);
        assert_eq!(mesh.cell_count(), 2);

        let centroids = mesh.centroids();
        assert_eq!(centroids.len(), 2);
        assert!((centroids[0][0] - 0.5).abs() < 1e-12);
        assert!((centroids[1][0] - 1.5).abs() < 1e-12);
        assert!((centroids[1][1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_line_centroids() {
        let mesh = SurfaceMesh::new(
            1,
            "axis",
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [3.0, 0.0, 0.0]],
            Topology::Lines(vec![[0, 1], [1, 2]]),
        );
        let centroids = mesh.centroids();
        assert_eq!(centroids, vec![[0.5, 0.0, 0.0], [2.0, 0.0, 0.0]]);
    }

    #[test]
    fn test_norm() {
        assert!((norm([3.0, 4.0, 0.0]) - 5.0).abs() < 1e-12);
    }
}
