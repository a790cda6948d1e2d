use crate::{
    geometry::{Point, Segment},
    DarknessField, Float, Grid,
};

/// Scores chords against a darkness field.
///
/// A chord covers the cells of the digital line between its ends that lie
/// inside the field. Its score is the mean darkness of those cells, so long
/// chords are not favoured just for crossing more cells.
#[derive(Clone, Copy)]
pub struct LineSampler<'a, S> {
    field: &'a DarknessField<S>,
}

impl<'a, S: Float> LineSampler<'a, S> {
    pub fn new(field: &'a DarknessField<S>) -> Self {
        Self { field }
    }

    pub fn cells(&self, from: Point<S>, to: Point<S>) -> impl Iterator<Item = usize> + 'a {
        let grid: Grid = **self.field;
        grid.get_pixel_indexes_in_segment(Segment::new(from, to))
    }

    /// Same value whichever end is passed first. 0 if no cell is inside the field.
    pub fn score(&self, from: Point<S>, to: Point<S>) -> S {
        let values = self.field.values();
        let (sum, count) = self
            .cells(from, to)
            .fold((S::ZERO, 0usize), |(sum, count), cell| {
                (sum + values[cell], count + 1)
            });
        match num_traits::cast::<usize, S>(count) {
            Some(count) if count > S::ZERO => sum / count,
            _ => S::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::SmallRng, Rng, SeedableRng};

    use super::*;

    fn random_field(seed: u64, width: usize, height: usize) -> DarknessField<f64> {
        let mut rng = SmallRng::seed_from_u64(seed);
        let values = (0..width * height).map(|_| rng.gen::<f64>()).collect();
        DarknessField::from_values(Grid::new(width, height), values).unwrap()
    }

    #[test]
    fn score_is_the_mean_of_crossed_cells() {
        let mut values = vec![0.0f64; 100];
        values[30..35].copy_from_slice(&[1.0, 0.5, 0.5, 1.0, 0.0]);
        let field = DarknessField::from_values(Grid::new(10, 10), values).unwrap();
        let sampler = LineSampler::new(&field);
        let score = sampler.score(Point::new(0.0, 3.0), Point::new(4.0, 3.0));
        assert!((score - 0.6).abs() < 1e-12);
    }

    #[test]
    fn score_is_symmetric() {
        let field = random_field(7, 40, 30);
        let sampler = LineSampler::new(&field);
        let mut rng = SmallRng::seed_from_u64(11);
        for _ in 0..200 {
            let a = Point::new(rng.gen_range(0.0..40.0), rng.gen_range(0.0..30.0));
            let b = Point::new(rng.gen_range(0.0..40.0), rng.gen_range(0.0..30.0));
            assert_eq!(sampler.score(a, b), sampler.score(b, a));
        }
    }

    #[test]
    fn long_chords_are_not_favoured() {
        let field = DarknessField::uniform(Grid::new(50, 50), 0.4f32).unwrap();
        let sampler = LineSampler::new(&field);
        let short = sampler.score(Point::new(1.0, 1.0), Point::new(5.0, 2.0));
        let long = sampler.score(Point::new(1.0, 1.0), Point::new(48.0, 47.0));
        assert!((short - 0.4).abs() < 1e-6);
        assert!((long - 0.4).abs() < 1e-6);
    }

    #[test]
    fn chord_outside_the_field_scores_zero() {
        let field = DarknessField::uniform(Grid::new(10, 10), 1.0f32).unwrap();
        let sampler = LineSampler::new(&field);
        assert_eq!(sampler.score(Point::new(10.0, 0.0), Point::new(10.0, 10.0)), 0.0);
        assert_eq!(sampler.cells(Point::new(-5.0, -1.0), Point::new(-1.0, -3.0)).count(), 0);
    }

    #[test]
    fn cells_along_a_diagonal() {
        let field = DarknessField::uniform(Grid::new(4, 4), 1.0f64).unwrap();
        let sampler = LineSampler::new(&field);
        let cells: Vec<_> = sampler
            .cells(Point::new(3.5, 3.5), Point::new(0.0, 0.0))
            .collect();
        assert_eq!(cells, vec![0, 5, 10, 15]);
    }
}
