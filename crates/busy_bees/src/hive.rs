use core::fmt::{self, Display, Formatter};

use bevy::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HoleId(pub usize);

impl Display for HoleId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "hole {}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hole {
    pub id: HoleId,
    pub center: Vec2,
    pub filled: bool,
}

/// Returns the unfilled hole closest to `point`, the first one in iteration order on ties.
pub fn nearest<'a>(point: Vec2, holes: impl IntoIterator<Item = &'a Hole>) -> Option<&'a Hole> {
    let mut best: Option<(&Hole, f32)> = None;
    for hole in holes.into_iter().filter(|hole| !hole.filled) {
        let distance = hole.center.distance(point);
        if best.is_none_or(|(_, shortest)| distance < shortest) {
            best = Some((hole, distance));
        }
    }
    best.map(|(hole, _)| hole)
}

/// The honeycomb: a fixed registry of holes, ids in row major order.
#[derive(Debug, Clone, Default)]
pub struct Hive {
    holes: Vec<Hole>,
}

impl Hive {
    /// Lays out `rows * cols` cells below `top`, odd rows shifted by half a cell.
    pub fn honeycomb(rows: usize, cols: usize, spacing: f32, top: Vec2) -> Self {
        let row_step = spacing * 0.866;
        let first_col = -((cols - 1) as f32) * 0.5 - 0.25;
        let holes = (0..rows * cols)
            .map(|index| {
                let (row, col) = (index / cols, index % cols);
                let shift = if row % 2 == 1 { 0.5 } else { 0.0 };
                Hole {
                    id: HoleId(index),
                    center: Vec2::new(
                        (col as f32 + first_col + shift).mul_add(spacing, top.x),
                        (row as f32).mul_add(-row_step, top.y),
                    ),
                    filled: false,
                }
            })
            .collect();
        Self { holes }
    }

    pub fn get(&self, id: HoleId) -> Option<&Hole> {
        self.holes.get(id.0)
    }

    pub fn holes(&self) -> &[Hole] {
        &self.holes
    }

    pub fn nearest_unfilled(&self, point: Vec2) -> Option<&Hole> {
        nearest(point, &self.holes)
    }

    pub fn filled(&self) -> impl Iterator<Item = &Hole> {
        self.holes.iter().filter(|hole| hole.filled)
    }

    pub fn filled_count(&self) -> usize {
        self.filled().count()
    }

    /// Marks `id` filled. `false` if it is unknown or already filled.
    pub fn fill(&mut self, id: HoleId) -> bool {
        match self.holes.get_mut(id.0) {
            Some(hole) if !hole.filled => {
                hole.filled = true;
                true
            }
            _ => false,
        }
    }

    /// Marks `id` empty. `false` if it is unknown or already empty.
    pub fn vacate(&mut self, id: HoleId) -> bool {
        match self.holes.get_mut(id.0) {
            Some(hole) if hole.filled => {
                hole.filled = false;
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.holes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holes.is_empty()
    }
}
