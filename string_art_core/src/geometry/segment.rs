use bresenham::Bresenham;
use serde::{Deserialize, Serialize};

use super::Point;
use crate::Float;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment<T> {
    pub start: Point<T>,
    pub end: Point<T>,
}

impl<T> Segment<T> {
    pub fn new(start: Point<T>, end: Point<T>) -> Self {
        Self { start, end }
    }
}

impl<T: Float> Segment<T> {
    pub fn floor(&self) -> Self {
        Self {
            start: self.start.floor(),
            end: self.end.floor(),
        }
    }
}

impl<T: num_traits::NumCast> Segment<T> {
    pub fn cast<I: num_traits::NumCast>(self) -> Option<Segment<I>> {
        self.start
            .cast()
            .and_then(|start| self.end.cast().map(|end| Segment { start, end }))
    }
}

impl Segment<isize> {
    /// Cells visited by a digital line between both ends, both included.
    ///
    /// Ends are walked in lexicographic order so reversing the segment yields
    /// exactly the same cells.
    pub fn points_between(self) -> impl Iterator<Item = Point<isize>> {
        let (start, end) = if (self.start.x, self.start.y) <= (self.end.x, self.end.y) {
            (self.start, self.end)
        } else {
            (self.end, self.start)
        };
        Bresenham::new((start.x, start.y), (end.x, end.y))
            .map(|(x, y)| Point { x, y })
            .chain(core::iter::once(end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_includes_both_ends() {
        let points: Vec<_> = Segment::new(Point::new(0isize, 0), Point::new(3, 0))
            .points_between()
            .collect();
        assert_eq!(
            points,
            vec![
                Point::new(0, 0),
                Point::new(1, 0),
                Point::new(2, 0),
                Point::new(3, 0)
            ]
        );
    }

    #[test]
    fn degenerate_segment_is_a_single_cell() {
        let points: Vec<_> = Segment::new(Point::new(4isize, 7), Point::new(4, 7))
            .points_between()
            .collect();
        assert_eq!(points, vec![Point::new(4, 7)]);
    }

    #[test]
    fn walk_does_not_depend_on_direction() {
        let ends = [
            (Point::new(0isize, 0), Point::new(7, 3)),
            (Point::new(2, 9), Point::new(11, 1)),
            (Point::new(5, 0), Point::new(5, 12)),
            (Point::new(13, 4), Point::new(0, 6)),
        ];
        for (a, b) in ends {
            let forward: Vec<_> = Segment::new(a, b).points_between().collect();
            let backward: Vec<_> = Segment::new(b, a).points_between().collect();
            assert_eq!(forward, backward);
        }
    }

    #[test]
    fn walk_visits_one_cell_per_step_on_the_longer_axis() {
        let count = Segment::new(Point::new(0isize, 0), Point::new(10, 4))
            .points_between()
            .count();
        assert_eq!(count, 11);
    }
}
