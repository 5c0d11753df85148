// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sutherland-Hodgman clipping against the aperture rectangle
//!
//! `clip_against_edge` keeps the part of a polygon on one side of an edge
//! line. `clip_triangle_outside_rectangle` peels a triangle edge by edge:
//! for each rectangle edge the outward half is emitted as a finished convex
//! piece and the inward half carries on to the next edge. Whatever is left
//! after the fourth edge lies inside the rectangle and is thrown away.

use crate::classify::ApertureRect;
use crate::error::{Error, Result};
use crate::primitives::{distance, Triangle};
use nalgebra::{Point3, Vector3};
use smallvec::SmallVec;

/// Closed polygon loop. A triangle clipped by one edge gains at most one
/// vertex, so eight inline slots cover every pass without allocating.
pub type Polygon = SmallVec<[Point3<f64>; 8]>;

/// Half-plane bounded by an edge line, positive on the kept side
#[derive(Debug, Clone, Copy)]
struct HalfPlane {
    origin: Point3<f64>,
    normal: Vector3<f64>,
}

impl HalfPlane {
    /// The normal is the part of `edge_start -> reference` perpendicular to
    /// the edge, i.e. `(dir x to_ref) x dir`, normalized.
    fn through_edge(
        edge_start: &Point3<f64>,
        edge_end: &Point3<f64>,
        reference: &Point3<f64>,
    ) -> Result<Self> {
        let dir = edge_end - edge_start;
        let to_ref = reference - edge_start;
        let normal = dir
            .cross(&to_ref)
            .cross(&dir)
            .try_normalize(1e-12)
            .ok_or_else(|| {
                Error::geometry(format!(
                    "clip edge {:?} -> {:?} is degenerate or collinear with reference {:?}",
                    edge_start, edge_end, reference
                ))
            })?;
        Ok(Self {
            origin: *edge_start,
            normal,
        })
    }

    #[inline]
    fn signed_distance(&self, p: &Point3<f64>) -> f64 {
        (p - self.origin).dot(&self.normal)
    }
}

/// Point where segment `p -> q` crosses the edge line, from the endpoint
/// signed distances. `None` when the segment runs parallel to the line.
#[inline]
fn edge_intersection(
    p: &Point3<f64>,
    dp: f64,
    q: &Point3<f64>,
    dq: f64,
    epsilon: f64,
) -> Option<Point3<f64>> {
    // Endpoints on the line are returned as is, not re-derived
    if dp == 0.0 {
        return Some(*p);
    }
    if dq == 0.0 {
        return Some(*q);
    }
    let denom = dp - dq;
    if denom.abs() < epsilon {
        return None;
    }
    let t = dp / denom;
    Some(p + (q - p) * t)
}

#[inline]
fn push_distinct(out: &mut Polygon, p: Point3<f64>, epsilon: f64) {
    if let Some(last) = out.last() {
        if distance(last, &p) < epsilon {
            return;
        }
    }
    out.push(p);
}

/// Clip a polygon against one edge line, keeping the side `reference` is on.
///
/// A vertex is kept when its signed distance is strictly positive. Output
/// follows input traversal order (possibly starting from a different
/// vertex) and never repeats a vertex consecutively. The result may have
/// fewer than three vertices, which callers treat as fully clipped.
pub fn clip_against_edge(
    polygon: &[Point3<f64>],
    edge_start: &Point3<f64>,
    edge_end: &Point3<f64>,
    reference: &Point3<f64>,
    epsilon: f64,
) -> Result<Polygon> {
    let plane = HalfPlane::through_edge(edge_start, edge_end, reference)?;
    Ok(clip_with_plane(polygon, &plane, epsilon, |hit| hit))
}

/// One Sutherland-Hodgman pass. Crossing points go through `place_hit`
/// before they are pushed.
fn clip_with_plane(
    polygon: &[Point3<f64>],
    plane: &HalfPlane,
    epsilon: f64,
    place_hit: impl Fn(Point3<f64>) -> Point3<f64>,
) -> Polygon {
    let mut clipped = Polygon::new();
    if polygon.is_empty() {
        return clipped;
    }

    let n = polygon.len();
    for i in 0..n {
        let current = &polygon[i];
        let next = &polygon[(i + 1) % n];
        let d_current = plane.signed_distance(current);
        let d_next = plane.signed_distance(next);
        let current_kept = d_current > 0.0;
        let next_kept = d_next > 0.0;

        match (current_kept, next_kept) {
            (true, true) => push_distinct(&mut clipped, *next, epsilon),
            (true, false) => {
                push_distinct(&mut clipped, *current, epsilon);
                if let Some(hit) = edge_intersection(current, d_current, next, d_next, epsilon) {
                    push_distinct(&mut clipped, place_hit(hit), epsilon);
                }
            }
            (false, true) => {
                if let Some(hit) = edge_intersection(current, d_current, next, d_next, epsilon) {
                    push_distinct(&mut clipped, place_hit(hit), epsilon);
                }
                push_distinct(&mut clipped, *next, epsilon);
            }
            (false, false) => {}
        }
    }

    // Loop closure: the last vertex may repeat the first
    while clipped.len() > 1 && distance(&clipped[0], &clipped[clipped.len() - 1]) < epsilon {
        clipped.pop();
    }

    clipped
}

/// Coordinate held constant along a rectangle side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Z,
}

impl Axis {
    #[inline]
    fn coord_mut(self, p: &mut Point3<f64>) -> &mut f64 {
        match self {
            Axis::X => &mut p.x,
            Axis::Z => &mut p.z,
        }
    }

    /// Coordinate running along a side fixed on this axis
    #[inline]
    fn along(self, p: &Point3<f64>) -> f64 {
        match self {
            Axis::X => p.z,
            Axis::Z => p.x,
        }
    }
}

/// One rectangle side with reference points on either side of it
struct RectEdge {
    start: Point3<f64>,
    end: Point3<f64>,
    outward: Point3<f64>,
    inward: Point3<f64>,
    axis: Axis,
    value: f64,
}

impl RectEdge {
    /// Clip to the outward or inward side. The edge is axis-aligned, so
    /// kept vertices are decided exactly and crossing points are placed
    /// exactly on the side line rather than wherever interpolation lands.
    fn clip(&self, polygon: &[Point3<f64>], outward: bool, epsilon: f64) -> Result<Polygon> {
        let reference = if outward { &self.outward } else { &self.inward };
        let plane = HalfPlane::through_edge(&self.start, &self.end, reference)?;
        Ok(clip_with_plane(polygon, &plane, epsilon, |mut hit| {
            *self.axis.coord_mut(&mut hit) = self.value;
            hit
        }))
    }

    /// Split every piece edge lying on this side's line at the given
    /// positions along it, so neighbouring pieces meet vertex to vertex.
    fn insert_on_line(&self, piece: &Polygon, stops: [f64; 2]) -> Polygon {
        let on_line = |p: &Point3<f64>| match self.axis {
            Axis::X => p.x == self.value,
            Axis::Z => p.z == self.value,
        };

        let n = piece.len();
        let mut out = Polygon::new();
        for i in 0..n {
            let a = piece[i];
            let b = piece[(i + 1) % n];
            out.push(a);
            if !(on_line(&a) && on_line(&b)) {
                continue;
            }

            let (sa, sb) = (self.axis.along(&a), self.axis.along(&b));
            let (lo, hi) = (sa.min(sb), sa.max(sb));
            let mut hits: SmallVec<[f64; 2]> =
                stops.iter().copied().filter(|&s| s > lo && s < hi).collect();
            if sb < sa {
                hits.reverse();
            }
            for s in hits {
                let t = (s - sa) / (sb - sa);
                let mut hit = a + (b - a) * t;
                *self.axis.coord_mut(&mut hit) = self.value;
                match self.axis {
                    Axis::X => hit.z = s,
                    Axis::Z => hit.x = s,
                }
                out.push(hit);
            }
        }
        out
    }
}

/// Left, right, bottom, top. The order is fixed so results are reproducible.
fn rect_edges(rect: &ApertureRect) -> [RectEdge; 4] {
    let p = |x: f64, z: f64| Point3::new(x, 0.0, z);
    [
        RectEdge {
            start: p(rect.min_x, rect.min_z),
            end: p(rect.min_x, rect.max_z),
            outward: p(rect.min_x - 1.0, rect.min_z),
            inward: p(rect.min_x + 1.0, rect.min_z),
            axis: Axis::X,
            value: rect.min_x,
        },
        RectEdge {
            start: p(rect.max_x, rect.min_z),
            end: p(rect.max_x, rect.max_z),
            outward: p(rect.max_x + 1.0, rect.min_z),
            inward: p(rect.max_x - 1.0, rect.min_z),
            axis: Axis::X,
            value: rect.max_x,
        },
        RectEdge {
            start: p(rect.min_x, rect.min_z),
            end: p(rect.max_x, rect.min_z),
            outward: p(rect.min_x, rect.min_z - 1.0),
            inward: p(rect.min_x, rect.min_z + 1.0),
            axis: Axis::Z,
            value: rect.min_z,
        },
        RectEdge {
            start: p(rect.min_x, rect.max_z),
            end: p(rect.max_x, rect.max_z),
            outward: p(rect.min_x, rect.max_z + 1.0),
            inward: p(rect.min_x, rect.max_z - 1.0),
            axis: Axis::Z,
            value: rect.max_z,
        },
    ]
}

/// True when the triangle has vertices strictly on both sides of the line
/// through the rectangle's left or right side.
///
/// The left and right pieces are cut along the whole length of those lines,
/// not just the rectangle's extent. A triangle sharing an edge with a cut
/// one must be cut too, even when it lies entirely above or below the
/// rectangle, or the shared edge ends up split on one side only.
pub fn crosses_side_lines(triangle: &Triangle, rect: &ApertureRect) -> bool {
    let vertices = triangle.vertices();
    [rect.min_x, rect.max_x].into_iter().any(|x| {
        vertices.iter().any(|p| p.x < x) && vertices.iter().any(|p| p.x > x)
    })
}

/// Clip a triangle to the region outside the rectangle.
///
/// Returns up to four convex pieces (one per rectangle edge) whose union is
/// the triangle minus the rectangle. Every piece keeps the triangle's
/// winding and has at least three vertices; none of its vertices lies
/// strictly inside the rectangle.
///
/// Crossing points lie exactly on the rectangle sides. The left
/// and right pieces also carry the rectangle corners that fall inside their
/// long edge, since the bottom, top and aperture pieces have vertices
/// there. Such pieces contain collinear vertices; fan them with
/// [`fan_apex`](crate::triangulation::fan_apex).
pub fn clip_triangle_outside_rectangle(
    triangle: &Triangle,
    rect: &ApertureRect,
    epsilon: f64,
) -> Result<Vec<Polygon>> {
    let mut pieces = Vec::with_capacity(4);
    let mut remainder: Polygon = triangle.vertices().into_iter().collect();

    for edge in rect_edges(rect) {
        let mut outside = edge.clip(&remainder, true, epsilon)?;
        if outside.len() >= 3 {
            if edge.axis == Axis::X {
                outside = edge.insert_on_line(&outside, [rect.min_z, rect.max_z]);
            }
            pieces.push(outside);
        }

        remainder = edge.clip(&remainder, false, epsilon)?;
        if remainder.len() < 3 {
            break;
        }
    }

    Ok(pieces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::polygon_area_xz;
    use approx::assert_relative_eq;

    const EPS: f64 = 1e-10;

    fn xz(x: f64, z: f64) -> Point3<f64> {
        Point3::new(x, 0.0, z)
    }

    fn total_area(pieces: &[Polygon]) -> f64 {
        pieces.iter().map(|p| polygon_area_xz(p)).sum()
    }

    #[test]
    fn test_clip_square_against_vertical_edge() {
        let square = [xz(0.0, 0.0), xz(2.0, 0.0), xz(2.0, 2.0), xz(0.0, 2.0)];
        let clipped = clip_against_edge(&square, &xz(1.0, 0.0), &xz(1.0, 2.0), &xz(0.0, 0.0), EPS)
            .unwrap();

        assert_eq!(clipped.len(), 4);
        assert!(clipped.iter().all(|p| p.x <= 1.0));
        assert_relative_eq!(polygon_area_xz(&clipped), 2.0);
    }

    #[test]
    fn test_fully_kept_polygon_is_preserved() {
        let tri = [xz(-3.0, 0.0), xz(-2.0, 0.0), xz(-2.0, 1.0)];
        let clipped =
            clip_against_edge(&tri, &xz(0.0, 0.0), &xz(0.0, 1.0), &xz(-1.0, 0.0), EPS).unwrap();

        assert_eq!(clipped.len(), 3);
        assert_relative_eq!(polygon_area_xz(&clipped), polygon_area_xz(&tri));
        for p in tri {
            assert!(clipped.contains(&p));
        }
    }

    #[test]
    fn test_fully_removed_polygon_is_empty() {
        let tri = [xz(3.0, 0.0), xz(4.0, 0.0), xz(4.0, 1.0)];
        let clipped =
            clip_against_edge(&tri, &xz(0.0, 0.0), &xz(0.0, 1.0), &xz(-1.0, 0.0), EPS).unwrap();
        assert!(clipped.is_empty());
    }

    #[test]
    fn test_near_parallel_crossing_reports_no_intersection() {
        let tri = [xz(-5e-11, 0.0), xz(4e-11, 1.0), xz(-5.0, 0.5)];
        let clipped =
            clip_against_edge(&tri, &xz(0.0, 0.0), &xz(0.0, 1.0), &xz(-1.0, 0.0), EPS).unwrap();

        assert_eq!(clipped.len(), 3);
        assert!(clipped.iter().all(|p| p.x <= 1e-12));
    }

    #[test]
    fn test_no_consecutive_duplicates() {
        // Apex exactly on the line: the case table would emit it twice
        let tri = [xz(0.0, 0.0), xz(-1.0, 1.0), xz(-1.0, -1.0)];
        let clipped =
            clip_against_edge(&tri, &xz(0.0, -2.0), &xz(0.0, 2.0), &xz(-1.0, 0.0), EPS).unwrap();

        assert_eq!(clipped.len(), 3);
        for i in 0..clipped.len() {
            let next = &clipped[(i + 1) % clipped.len()];
            assert!(distance(&clipped[i], next) > EPS);
        }
    }

    #[test]
    fn test_degenerate_edge_is_an_error() {
        let tri = [xz(0.0, 0.0), xz(1.0, 0.0), xz(0.0, 1.0)];
        let p = xz(0.5, 0.5);
        assert!(matches!(
            clip_against_edge(&tri, &p, &p, &xz(0.0, 0.0), EPS),
            Err(Error::InvalidGeometryInput(_))
        ));
        // Reference on the edge line itself
        assert!(clip_against_edge(&tri, &xz(0.0, 0.0), &xz(0.0, 1.0), &xz(0.0, 5.0), EPS).is_err());
    }

    #[test]
    fn test_intersection_interpolates_height() {
        let tri = [
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(1.0, 2.0, 0.0),
            Point3::new(-1.0, 0.0, 1.0),
        ];
        let clipped =
            clip_against_edge(&tri, &xz(0.0, -1.0), &xz(0.0, 2.0), &xz(-1.0, 0.0), EPS).unwrap();
        let on_line: Vec<_> = clipped.iter().filter(|p| p.x.abs() < 1e-12).collect();
        assert_eq!(on_line.len(), 2);
        assert!(on_line.iter().any(|p| (p.y - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_corner_overlap_yields_two_pieces() {
        let rect = ApertureRect::new(0.5, 1.5, 0.5, 1.5).unwrap();
        let tri = Triangle::new(xz(0.0, 0.0), xz(1.0, 0.0), xz(1.0, 1.0));
        let pieces = clip_triangle_outside_rectangle(&tri, &rect, EPS).unwrap();

        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[0].len(), 3);
        assert_eq!(pieces[1].len(), 4);
        assert_relative_eq!(polygon_area_xz(&pieces[0]), 0.125);
        assert_relative_eq!(polygon_area_xz(&pieces[1]), 0.25);
        // Triangle area 0.5 minus the 0.125 overlap
        assert_relative_eq!(total_area(&pieces), 0.375);
    }

    #[test]
    fn test_piece_vertices_never_strictly_inside() {
        let rect = ApertureRect::new(-1.0, 1.0, -1.0, 1.0).unwrap();
        let triangles = [
            Triangle::new(xz(-10.0, -10.0), xz(10.0, -10.0), xz(0.0, 10.0)),
            Triangle::new(xz(0.0, 0.0), xz(3.0, 0.5), xz(0.2, 4.0)),
            Triangle::new(xz(-2.0, 0.3), xz(2.0, -0.3), xz(0.1, 0.0)),
        ];
        for tri in triangles {
            let pieces = clip_triangle_outside_rectangle(&tri, &rect, EPS).unwrap();
            for piece in &pieces {
                assert!(piece.len() >= 3);
                assert!(piece.iter().all(|p| !rect.strictly_contains(p)));
                // Winding is preserved
                assert!(polygon_area_xz(piece) * tri.signed_area_xz() > 0.0);
            }
        }
    }

    /// xorshift64, enough for reproducible coordinates in [0, 1)
    struct Xorshift(u64);

    impl Xorshift {
        fn next_f64(&mut self) -> f64 {
            self.0 ^= self.0 << 13;
            self.0 ^= self.0 >> 7;
            self.0 ^= self.0 << 17;
            (self.0 >> 11) as f64 / (1u64 << 53) as f64
        }

        fn point(&mut self) -> Point3<f64> {
            let x = self.next_f64();
            let z = self.next_f64();
            xz(x, z)
        }
    }

    #[test]
    fn test_random_crossings_land_on_non_dyadic_sides() {
        // 0.3 and 0.7 are not exact in binary, so interpolated crossings
        // would drift off the sides unless placed on them exactly
        let rect = ApertureRect::new(0.3, 0.7, 0.3, 0.7).unwrap();
        let mut rng = Xorshift(0x9e37_79b9_7f4a_7c15);

        for _ in 0..20_000 {
            let tri = Triangle::new(rng.point(), rng.point(), rng.point());
            let pieces = clip_triangle_outside_rectangle(&tri, &rect, EPS).unwrap();
            for piece in &pieces {
                assert!(piece.len() >= 3);
                for v in piece {
                    assert!(!rect.strictly_contains(v), "{:?} inside {:?} for {:?}", v, rect, tri);
                }
            }
            assert!(total_area(&pieces).abs() <= tri.signed_area_xz().abs() + 1e-12);
        }
    }

    #[test]
    fn test_side_pieces_carry_rectangle_corners() {
        let rect = ApertureRect::new(-1.0, 1.0, -1.0, 1.0).unwrap();
        let tri = Triangle::new(xz(-10.0, -10.0), xz(10.0, -10.0), xz(0.0, 10.0));
        let pieces = clip_triangle_outside_rectangle(&tri, &rect, EPS).unwrap();

        let has = |piece: &Polygon, x: f64, z: f64| piece.iter().any(|p| p.x == x && p.z == z);
        assert!(has(&pieces[0], -1.0, -1.0) && has(&pieces[0], -1.0, 1.0));
        assert!(has(&pieces[1], 1.0, -1.0) && has(&pieces[1], 1.0, 1.0));
        assert_eq!(pieces[0].len(), 5);
        assert_eq!(pieces[1].len(), 5);
    }

    #[test]
    fn test_side_lines_extend_past_rectangle() {
        let rect = ApertureRect::new(3.05, 5.55, 2.9, 4.5).unwrap();
        let below = Triangle::new(xz(3.0, 1.0), xz(4.0, 2.0), xz(3.0, 2.0));
        let left = Triangle::new(xz(0.0, 1.0), xz(1.0, 5.0), xz(0.0, 5.0));
        let touching = Triangle::new(xz(2.0, 1.0), xz(3.05, 2.0), xz(2.0, 2.0));
        assert!(crosses_side_lines(&below, &rect));
        assert!(!crosses_side_lines(&left, &rect));
        assert!(!crosses_side_lines(&touching, &rect));

        // Cut at x = 3.05 like its straddling neighbour across z = 2
        let pieces = clip_triangle_outside_rectangle(&below, &rect, EPS).unwrap();
        assert_eq!(pieces.len(), 2);
        assert!(pieces[0].iter().any(|p| p.x == 3.05 && p.z == 2.0));
        assert_relative_eq!(total_area(&pieces), below.signed_area_xz(), epsilon = 1e-12);
    }

    #[test]
    fn test_enclosing_triangle_loses_exactly_the_rectangle() {
        let rect = ApertureRect::new(-1.0, 1.0, -1.0, 1.0).unwrap();
        let tri = Triangle::new(xz(-10.0, -10.0), xz(10.0, -10.0), xz(0.0, 10.0));
        let pieces = clip_triangle_outside_rectangle(&tri, &rect, EPS).unwrap();

        assert_eq!(pieces.len(), 4);
        assert_relative_eq!(total_area(&pieces), 200.0 - 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_corner_wrap_keeps_whole_area() {
        let rect = ApertureRect::new(0.0, 1.0, 0.0, 1.0).unwrap();
        let tri = Triangle::new(xz(-1.0, 0.5), xz(0.5, 2.0), xz(-1.0, 2.0));
        let pieces = clip_triangle_outside_rectangle(&tri, &rect, EPS).unwrap();

        assert!(!pieces.is_empty());
        assert_relative_eq!(total_area(&pieces).abs(), tri.signed_area_xz().abs(), epsilon = 1e-12);
    }

    #[test]
    fn test_triangle_inside_rectangle_leaves_nothing() {
        let rect = ApertureRect::new(0.0, 1.0, 0.0, 1.0).unwrap();
        let tri = Triangle::new(xz(0.2, 0.2), xz(0.8, 0.2), xz(0.5, 0.9));
        let pieces = clip_triangle_outside_rectangle(&tri, &rect, EPS).unwrap();
        assert!(pieces.is_empty());
    }
}
