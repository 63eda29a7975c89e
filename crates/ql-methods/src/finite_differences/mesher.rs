//! One-dimensional meshes, optionally concentrated around a point.

use ql_core::{ensure_config, errors::Result, Real};

/// A strictly increasing 1-D mesh on `[start, end]`.
///
/// With a concentration point `(c, density)` the nodes follow the sinh map
///
/// `x(ξ) = c + d·sinh(c₁ξ + c₂(1 − ξ))`, `ξ = i/(n−1)`,
///
/// where `d = density·(end − start)`, `c₁ = asinh((end − c)/d)` and
/// `c₂ = asinh((start − c)/d)`. Smaller densities pack more nodes near `c`.
#[derive(Debug, Clone, PartialEq)]
pub struct Concentrating1dMesher {
    locations: Vec<Real>,
}

impl Concentrating1dMesher {
    /// Build the mesh; `None` gives uniform spacing.
    ///
    /// # Errors
    /// `Error::Configuration` for fewer than 2 nodes, an empty or
    /// non-finite interval, or a non-positive density.
    pub fn new(
        start: Real,
        end: Real,
        size: usize,
        concentration: Option<(Real, Real)>,
    ) -> Result<Self> {
        ensure_config!(size >= 2, "a mesh needs at least 2 nodes, got {size}");
        ensure_config!(
            start.is_finite() && end.is_finite() && end > start,
            "invalid mesh interval [{start}, {end}]"
        );
        let last = (size - 1) as Real;

        let mut locations: Vec<Real> = match concentration {
            None => {
                let dx = (end - start) / last;
                (0..size).map(|i| start + i as Real * dx).collect()
            }
            Some((center, density)) => {
                ensure_config!(
                    density > 0.0 && density.is_finite(),
                    "mesh density must be positive, got {density}"
                );
                ensure_config!(center.is_finite(), "non-finite concentration point");
                let d = density * (end - start);
                let c1 = ((end - center) / d).asinh();
                let c2 = ((start - center) / d).asinh();
                (0..size)
                    .map(|i| {
                        let xi = i as Real / last;
                        center + d * (c1 * xi + c2 * (1.0 - xi)).sinh()
                    })
                    .collect()
            }
        };
        locations[0] = start;
        locations[size - 1] = end;
        ensure_config!(
            locations.windows(2).all(|w| w[1] > w[0]),
            "mesh nodes are not strictly increasing"
        );
        Ok(Self { locations })
    }

    /// Uniform mesh.
    ///
    /// # Errors
    /// As [`new`](Self::new).
    pub fn uniform(start: Real, end: Real, size: usize) -> Result<Self> {
        Self::new(start, end, size, None)
    }

    /// Number of nodes.
    pub fn size(&self) -> usize {
        self.locations.len()
    }

    /// Node coordinates.
    pub fn locations(&self) -> &[Real] {
        &self.locations
    }

    /// Consume the mesher, returning its nodes.
    pub fn into_locations(self) -> Vec<Real> {
        self.locations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_mesh() {
        let m = Concentrating1dMesher::uniform(-1.0, 1.0, 5).unwrap();
        assert_eq!(m.size(), 5);
        assert_eq!(m.locations(), &[-1.0, -0.5, 0.0, 0.5, 1.0]);
    }

    #[test]
    fn concentrated_mesh_is_finer_near_the_center() {
        let m = Concentrating1dMesher::new(0.0, 10.0, 101, Some((3.0, 0.05))).unwrap();
        let x = m.into_locations();
        assert_eq!((x[0], x[100]), (0.0, 10.0));
        let near = x.partition_point(|&v| v < 3.0);
        let h_center = x[near + 1] - x[near];
        let h_edge = x[100] - x[99];
        assert!(h_center < 0.2 * h_edge, "{h_center} vs {h_edge}");
    }

    #[test]
    fn invalid_meshes() {
        assert!(Concentrating1dMesher::uniform(0.0, 1.0, 1).is_err());
        assert!(Concentrating1dMesher::uniform(1.0, 1.0, 10).is_err());
        assert!(Concentrating1dMesher::new(0.0, 1.0, 10, Some((0.5, 0.0))).is_err());
    }
}
