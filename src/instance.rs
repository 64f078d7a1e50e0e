//! Module for representing TSP instances.
//!
//! This module defines the [`Graph`] collaborator consumed by the solver and
//! [`TspInstance`], a dense distance-matrix implementation that can be parsed from
//! a TSP-LIB file (Euclidean 2D coordinates or an explicit full matrix) or
//! generated for experiments.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::InstanceError;

/// A weighted, possibly asymmetric, complete graph.
pub trait Graph: Sync {
    /// Number of vertices.
    fn n(&self) -> usize;

    /// Non-negative weight of the edge `i -> j`.
    fn get_dist(&self, i: usize, j: usize) -> f64;
}

impl<G: Graph + ?Sized> Graph for &G {
    fn n(&self) -> usize {
        (**self).n()
    }

    fn get_dist(&self, i: usize, j: usize) -> f64 {
        (**self).get_dist(i, j)
    }
}

/// A TSP instance backed by a dense distance matrix
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TspInstance {
    /// Name of the instance
    pub name: String,
    /// Comment/description
    pub comment: String,
    /// Number of vertices
    pub dimension: usize,
    /// Vertex coordinates, when the instance is geometric
    pub coordinates: Option<Vec<(f64, f64)>>,
    /// Distance matrix, `distance_matrix[i][j]` is the weight of `i -> j`
    pub distance_matrix: Vec<Vec<f64>>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Header,
    Coords,
    Weights,
    Ignored,
}

impl TspInstance {
    /// Build an instance from an explicit (square, non-negative) distance matrix
    pub fn from_matrix(name: &str, matrix: Vec<Vec<f64>>) -> Result<Self, InstanceError> {
        let n = matrix.len();
        if n == 0 {
            return Err(InstanceError::InvalidMatrix("matrix is empty".to_string()));
        }

        for (i, row) in matrix.iter().enumerate() {
            if row.len() != n {
                return Err(InstanceError::InvalidMatrix(format!(
                    "row {} has {} entries, expected {}",
                    i,
                    row.len(),
                    n
                )));
            }
            if let Some(j) = row.iter().position(|d| !d.is_finite() || *d < 0.0) {
                return Err(InstanceError::InvalidMatrix(format!(
                    "weight ({}, {}) = {} is not a finite non-negative number",
                    i, j, row[j]
                )));
            }
        }

        Ok(TspInstance {
            name: name.to_string(),
            comment: String::new(),
            dimension: n,
            coordinates: None,
            distance_matrix: matrix,
        })
    }

    /// Build a Euclidean 2D instance from point coordinates
    pub fn from_coordinates(name: &str, coords: &[(f64, f64)]) -> Result<Self, InstanceError> {
        if coords.is_empty() {
            return Err(InstanceError::InvalidMatrix("no coordinates".to_string()));
        }
        if coords.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
            return Err(InstanceError::InvalidMatrix("non-finite coordinate".to_string()));
        }

        Ok(TspInstance {
            name: name.to_string(),
            comment: String::new(),
            dimension: coords.len(),
            coordinates: Some(coords.to_vec()),
            distance_matrix: Self::compute_distance_matrix(coords),
        })
    }

    /// Generate `n` points uniformly at random in a `side x side` square
    pub fn random_euclidean(n: usize, seed: u64, side: f64) -> Result<Self, InstanceError> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let coords: Vec<(f64, f64)> = (0..n)
            .map(|_| (rng.gen::<f64>() * side, rng.gen::<f64>() * side))
            .collect();

        let mut instance = Self::from_coordinates(&format!("random{}-s{}", n, seed), &coords)?;
        instance.comment = format!("{} random points in a {}x{} square", n, side, side);
        Ok(instance)
    }

    /// Vertices on a line: `dist(i, j) = |i - j|`
    pub fn line(n: usize) -> Result<Self, InstanceError> {
        let coords: Vec<(f64, f64)> = (0..n).map(|i| (i as f64, 0.0)).collect();
        Self::from_coordinates(&format!("line{}", n), &coords)
    }

    /// Parse an instance from a TSP-LIB file.
    ///
    /// Supports `EDGE_WEIGHT_TYPE: EUC_2D` with a `NODE_COORD_SECTION`, and
    /// `EDGE_WEIGHT_TYPE: EXPLICIT` with `EDGE_WEIGHT_FORMAT: FULL_MATRIX`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, InstanceError> {
        let file = File::open(&path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Parse an instance from any TSP-LIB formatted reader
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, InstanceError> {
        let mut name = String::new();
        let mut comment = String::new();
        let mut dimension = 0usize;
        let mut explicit = false;
        let mut coords: Vec<(usize, f64, f64)> = Vec::new();
        let mut weights: Vec<f64> = Vec::new();

        let mut section = Section::Header;

        for (idx, line) in reader.lines().enumerate() {
            let line_no = idx + 1;
            let line = line?;
            let line = line.trim();

            if line.is_empty() {
                continue;
            }
            if line == "EOF" {
                break;
            }

            if line.starts_with("NODE_COORD_SECTION") {
                section = Section::Coords;
                continue;
            }
            if line.starts_with("EDGE_WEIGHT_SECTION") {
                section = Section::Weights;
                continue;
            }
            if line.ends_with("_SECTION") {
                section = Section::Ignored;
                continue;
            }

            if let Some((key, value)) = line.split_once(':') {
                let value = value.trim();
                match key.trim() {
                    "NAME" => name = value.to_string(),
                    "COMMENT" => comment = value.to_string(),
                    "DIMENSION" => {
                        dimension = value
                            .parse()
                            .map_err(|_| InstanceError::parse(line_no, "invalid dimension"))?
                    }
                    "EDGE_WEIGHT_TYPE" => match value {
                        "EUC_2D" => explicit = false,
                        "EXPLICIT" => explicit = true,
                        other => {
                            return Err(InstanceError::parse(
                                line_no,
                                format!("unsupported edge weight type {}", other),
                            ))
                        }
                    },
                    "EDGE_WEIGHT_FORMAT" if value != "FULL_MATRIX" => {
                        return Err(InstanceError::parse(
                            line_no,
                            format!("unsupported edge weight format {}", value),
                        ));
                    }
                    _ => {}
                }
                section = Section::Header;
                continue;
            }

            match section {
                Section::Coords => {
                    let parts: Vec<&str> = line.split_whitespace().collect();
                    if parts.len() < 3 {
                        return Err(InstanceError::parse(line_no, "expected `id x y`"));
                    }
                    let id: usize = parts[0]
                        .parse()
                        .map_err(|_| InstanceError::parse(line_no, "invalid node id"))?;
                    let x: f64 = parts[1]
                        .parse()
                        .map_err(|_| InstanceError::parse(line_no, "invalid x coordinate"))?;
                    let y: f64 = parts[2]
                        .parse()
                        .map_err(|_| InstanceError::parse(line_no, "invalid y coordinate"))?;
                    coords.push((id, x, y));
                }
                Section::Weights => {
                    for token in line.split_whitespace() {
                        let w: f64 = token
                            .parse()
                            .map_err(|_| InstanceError::parse(line_no, "invalid edge weight"))?;
                        weights.push(w);
                    }
                }
                Section::Header => {
                    return Err(InstanceError::parse(line_no, format!("unexpected line `{}`", line)));
                }
                Section::Ignored => {}
            }
        }

        let mut instance = if explicit {
            if dimension == 0 || weights.len() != dimension * dimension {
                return Err(InstanceError::InvalidMatrix(format!(
                    "expected {} weights for dimension {}, found {}",
                    dimension * dimension,
                    dimension,
                    weights.len()
                )));
            }
            let matrix = weights.chunks(dimension).map(|row| row.to_vec()).collect();
            Self::from_matrix(&name, matrix)?
        } else {
            coords.sort_by_key(|(id, _, _)| *id);
            if dimension != 0 && coords.len() != dimension {
                return Err(InstanceError::InvalidMatrix(format!(
                    "DIMENSION is {} but {} coordinates were given",
                    dimension,
                    coords.len()
                )));
            }
            let points: Vec<(f64, f64)> = coords.iter().map(|(_, x, y)| (*x, *y)).collect();
            Self::from_coordinates(&name, &points)?
        };

        instance.comment = comment;
        Ok(instance)
    }

    /// Compute Euclidean distance matrix
    fn compute_distance_matrix(coords: &[(f64, f64)]) -> Vec<Vec<f64>> {
        let n = coords.len();
        let mut matrix = vec![vec![0.0; n]; n];

        for i in 0..n {
            for j in 0..n {
                if i != j {
                    let dx = coords[i].0 - coords[j].0;
                    let dy = coords[i].1 - coords[j].1;
                    matrix[i][j] = (dx * dx + dy * dy).sqrt();
                }
            }
        }

        matrix
    }

    /// Get the distance between two vertices
    #[inline]
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        self.distance_matrix[i][j]
    }

    /// Whether `dist(i, j) == dist(j, i)` for every pair
    pub fn is_symmetric(&self) -> bool {
        (0..self.dimension).all(|i| {
            (i + 1..self.dimension).all(|j| (self.distance(i, j) - self.distance(j, i)).abs() < 1e-9)
        })
    }

    /// Get statistics about the instance
    pub fn statistics(&self) -> InstanceStatistics {
        let mut distances: Vec<f64> = Vec::new();
        for i in 0..self.dimension {
            for j in 0..self.dimension {
                if i != j {
                    distances.push(self.distance(i, j));
                }
            }
        }

        let (avg_distance, min_distance, max_distance) = if distances.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            (
                distances.iter().sum::<f64>() / distances.len() as f64,
                distances.iter().cloned().fold(f64::INFINITY, f64::min),
                distances.iter().cloned().fold(0.0, f64::max),
            )
        };

        InstanceStatistics {
            name: self.name.clone(),
            dimension: self.dimension,
            symmetric: self.is_symmetric(),
            geometric: self.coordinates.is_some(),
            avg_distance,
            min_distance,
            max_distance,
        }
    }
}

impl Graph for TspInstance {
    fn n(&self) -> usize {
        self.dimension
    }

    #[inline]
    fn get_dist(&self, i: usize, j: usize) -> f64 {
        self.distance(i, j)
    }
}

/// Statistics about a TSP instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatistics {
    pub name: String,
    pub dimension: usize,
    pub symmetric: bool,
    pub geometric: bool,
    pub avg_distance: f64,
    pub min_distance: f64,
    pub max_distance: f64,
}

impl std::fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(f, "  Vertices: {}", self.dimension)?;
        writeln!(f, "  Symmetric: {}", self.symmetric)?;
        writeln!(f, "  Geometric: {}", self.geometric)?;
        writeln!(f, "  Avg distance: {:.2}", self.avg_distance)?;
        writeln!(f, "  Min distance: {:.2}", self.min_distance)?;
        writeln!(f, "  Max distance: {:.2}", self.max_distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_calculation() {
        let matrix = TspInstance::compute_distance_matrix(&[(0.0, 0.0), (3.0, 4.0)]);

        assert!((matrix[0][1] - 5.0).abs() < 1e-10);
        assert!((matrix[1][0] - 5.0).abs() < 1e-10);
        assert_eq!(matrix[0][0], 0.0);
    }

    #[test]
    fn test_line_instance() {
        let instance = TspInstance::line(5).unwrap();
        assert_eq!(instance.n(), 5);
        assert!((instance.get_dist(1, 4) - 3.0).abs() < 1e-12);
        assert!((instance.get_dist(4, 1) - 3.0).abs() < 1e-12);
        assert!(instance.is_symmetric());
    }

    #[test]
    fn test_from_matrix_rejects_bad_input() {
        assert!(TspInstance::from_matrix("empty", vec![]).is_err());
        assert!(TspInstance::from_matrix("ragged", vec![vec![0.0, 1.0], vec![0.0]]).is_err());
        assert!(TspInstance::from_matrix("neg", vec![vec![0.0, -1.0], vec![1.0, 0.0]]).is_err());
    }

    #[test]
    fn test_asymmetric_matrix() {
        let instance =
            TspInstance::from_matrix("asym", vec![vec![0.0, 1.0], vec![7.0, 0.0]]).unwrap();
        assert!(!instance.is_symmetric());
        assert_eq!(instance.get_dist(1, 0), 7.0);
    }

    #[test]
    fn test_parse_euc_2d() {
        let text = "NAME: tiny\nCOMMENT: three points\nTYPE: TSP\nDIMENSION: 3\n\
                    EDGE_WEIGHT_TYPE: EUC_2D\nNODE_COORD_SECTION\n1 0 0\n2 3 4\n3 0 4\nEOF\n";
        let instance = TspInstance::from_reader(text.as_bytes()).unwrap();

        assert_eq!(instance.name, "tiny");
        assert_eq!(instance.comment, "three points");
        assert_eq!(instance.dimension, 3);
        assert!((instance.distance(0, 1) - 5.0).abs() < 1e-10);
        assert!((instance.distance(1, 2) - 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_parse_explicit_matrix() {
        let text = "NAME : m\nDIMENSION : 3\nEDGE_WEIGHT_TYPE : EXPLICIT\n\
                    EDGE_WEIGHT_FORMAT : FULL_MATRIX\nEDGE_WEIGHT_SECTION\n\
                    0 1 2\n3 0 4\n5 6 0\nEOF\n";
        let instance = TspInstance::from_reader(text.as_bytes()).unwrap();

        assert_eq!(instance.dimension, 3);
        assert_eq!(instance.distance(1, 0), 3.0);
        assert_eq!(instance.distance(2, 1), 6.0);
        assert!(instance.coordinates.is_none());
    }

    #[test]
    fn test_parse_errors() {
        let bad_coord = "DIMENSION: 2\nNODE_COORD_SECTION\n1 0 x\n2 1 1\n";
        assert!(matches!(
            TspInstance::from_reader(bad_coord.as_bytes()),
            Err(InstanceError::Parse { line: 3, .. })
        ));

        let short = "DIMENSION: 2\nEDGE_WEIGHT_TYPE: EXPLICIT\nEDGE_WEIGHT_SECTION\n0 1 2\n";
        assert!(matches!(
            TspInstance::from_reader(short.as_bytes()),
            Err(InstanceError::InvalidMatrix(_))
        ));
    }

    #[test]
    fn test_random_instance_is_reproducible() {
        let a = TspInstance::random_euclidean(10, 7, 100.0).unwrap();
        let b = TspInstance::random_euclidean(10, 7, 100.0).unwrap();
        assert_eq!(a.distance_matrix, b.distance_matrix);
        assert_eq!(a.statistics().dimension, 10);
    }
}
