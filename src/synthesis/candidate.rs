use tracing::debug;

use crate::math::combinations::Combinations;
use crate::math::Point2;
use crate::model::NodeId;
use crate::selection::{Painted, SelectionContext};

use super::Synthesizer;

impl Synthesizer {
    /// Synthesizes a triangle from the painted nodes around `p`.
    ///
    /// Returns `None` when fewer than three nodes are painted.
    pub fn calculate_tri_facet(&mut self, ctx: &SelectionContext, p: &Point2) -> Option<&[NodeId]> {
        self.calculate_facet(ctx, p, 3)
    }

    /// Synthesizes a line facet from the painted nodes around `p`.
    pub fn calculate_line_facet(
        &mut self,
        ctx: &SelectionContext,
        p: &Point2,
    ) -> Option<&[NodeId]> {
        self.calculate_facet(ctx, p, 2)
    }

    /// Brute-force search over the painted nodes near `p`.
    ///
    /// The `k` nearest nodes set a radius, scaled by the auto-facet factor.
    /// Every `k`-combination of the nodes inside that radius is scored by
    /// the distance from its centroid to `p`. The first best combination in
    /// lexicographic order wins. Cost grows with the cube of the candidate
    /// count for triangles.
    fn calculate_facet(
        &mut self,
        ctx: &SelectionContext,
        p: &Point2,
        k: usize,
    ) -> Option<&[NodeId]> {
        self.candidate = None;
        let painted = &ctx.painted.nodes;
        if painted.len() < k {
            return None;
        }

        let distances: Vec<f64> = painted.iter().map(|e| (e.pixel - p).norm()).collect();
        let mut nearest: Vec<usize> = (0..painted.len()).collect();
        nearest.sort_by(|&a, &b| distances[a].total_cmp(&distances[b]));
        nearest.truncate(k);
        let scale = nearest
            .iter()
            .map(|&i| distances[i])
            .fold(0.0_f64, f64::max);
        let radius = scale * self.params.auto_facet_factor;

        let pool: Vec<&Painted<NodeId>> = painted
            .iter()
            .enumerate()
            .filter(|(i, _)| distances[*i] <= radius || nearest.contains(i))
            .map(|(_, e)| e)
            .collect();

        #[allow(clippy::cast_precision_loss)]
        let kf = k as f64;
        let mut best: Option<(Vec<usize>, f64)> = None;
        for combo in Combinations::new(pool.len(), k) {
            let sum = combo
                .iter()
                .fold(Point2::origin().coords, |acc, &i| acc + pool[i].pixel.coords);
            let d = (Point2::from(sum / kf) - p).norm();
            if best.as_ref().is_none_or(|(_, b)| d < *b) {
                best = Some((combo, d));
            }
        }

        let (combo, _) = best?;
        debug!(pool = pool.len(), k, "facet synthesized");
        self.candidate = Some(combo.iter().map(|&i| pool[i].id).collect());
        self.candidate.as_deref()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::selection::PaintedSet;
    use crate::synthesis::SynthesisParams;
    use crate::test_support::{cross_section, Fixture};

    fn painted(fx: &mut Fixture, pixels: &[(f64, f64)]) -> (SelectionContext, Vec<NodeId>) {
        let s = fx.store.add_section(cross_section());
        let ids = pixels
            .iter()
            .map(|&(x, y)| fx.on_section(s, x, y))
            .collect();
        let ctx = SelectionContext::new(Some(fx.group), Some(s))
            .with_painted(PaintedSet::on_section(&fx.store, s));
        (ctx, ids)
    }

    #[test]
    fn three_points_always_form_the_triangle() {
        let mut fx = Fixture::new();
        let (ctx, ids) = painted(&mut fx, &[(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)]);
        let mut synth = Synthesizer::default();
        for p in [Point2::new(3.0, 3.0), Point2::new(90.0, -40.0)] {
            let facet = synth.calculate_tri_facet(&ctx, &p).unwrap().to_vec();
            assert_eq!(facet, ids);
        }
    }

    #[test]
    fn too_few_points_gives_nothing() {
        let mut fx = Fixture::new();
        let (ctx, _) = painted(&mut fx, &[(0.0, 0.0), (10.0, 0.0)]);
        let mut synth = Synthesizer::default();
        assert!(synth.calculate_tri_facet(&ctx, &Point2::new(1.0, 1.0)).is_none());
        assert!(synth.candidate().is_none());
        assert!(synth.calculate_line_facet(&ctx, &Point2::new(1.0, 1.0)).is_some());
    }

    #[test]
    fn picks_triangle_whose_centroid_is_nearest() {
        let mut fx = Fixture::new();
        // Two triangles sharing the edge (10,0)-(10,10).
        let (ctx, ids) = painted(
            &mut fx,
            &[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (20.0, 5.0)],
        );
        let mut synth = Synthesizer::default();
        let right = synth
            .calculate_tri_facet(&ctx, &Point2::new(14.0, 5.0))
            .unwrap()
            .to_vec();
        assert_eq!(right, vec![ids[1], ids[2], ids[3]]);
        let left = synth
            .calculate_tri_facet(&ctx, &Point2::new(6.0, 4.0))
            .unwrap()
            .to_vec();
        assert_eq!(left, vec![ids[0], ids[1], ids[2]]);
    }

    #[test]
    fn far_points_fall_outside_the_radius() {
        let mut fx = Fixture::new();
        let (ctx, ids) = painted(&mut fx, &[(0.0, 0.0), (2.0, 0.0), (60.0, 0.0)]);
        let mut synth = Synthesizer::new(SynthesisParams {
            auto_facet_factor: 1.0,
            ..SynthesisParams::default()
        });
        let line = synth
            .calculate_line_facet(&ctx, &Point2::new(1.0, 0.0))
            .unwrap()
            .to_vec();
        assert_eq!(line, vec![ids[0], ids[1]]);
    }
}
