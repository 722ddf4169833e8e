use glam::Vec3;

/// Cell counts of one simulation grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridSize {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

impl GridSize {
    pub fn new(width: u32, height: u32, depth: u32) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    pub fn cube(n: u32) -> Self {
        Self::new(n, n, n)
    }

    pub fn from_ivec(v: [u32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }

    pub fn to_array(self) -> [u32; 3] {
        [self.width, self.height, self.depth]
    }

    pub fn voxel_count(&self) -> usize {
        self.width as usize * self.height as usize * self.depth as usize
    }

    /// Linear index with x varying fastest, then y, then z (3D texture upload order).
    pub fn index(&self, x: u32, y: u32, z: u32) -> usize {
        (z as usize * self.height as usize + y as usize) * self.width as usize + x as usize
    }

    pub fn as_vec3(&self) -> Vec3 {
        Vec3::new(self.width as f32, self.height as f32, self.depth as f32)
    }

    pub fn contains(&self, x: i64, y: i64, z: i64) -> bool {
        (0..self.width as i64).contains(&x)
            && (0..self.height as i64).contains(&y)
            && (0..self.depth as i64).contains(&z)
    }

    /// Whether the cell lies on the one-cell outer shell.
    pub fn is_shell(&self, x: u32, y: u32, z: u32) -> bool {
        x == 0
            || y == 0
            || z == 0
            || x + 1 >= self.width
            || y + 1 >= self.height
            || z + 1 >= self.depth
    }

    /// Iterate every cell as `(x, y, z)` in [`GridSize::index`] order.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32, u32)> {
        let (w, h, d) = (self.width, self.height, self.depth);
        (0..d).flat_map(move |z| (0..h).flat_map(move |y| (0..w).map(move |x| (x, y, z))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_is_x_fastest() {
        let g = GridSize::new(4, 3, 2);
        assert_eq!(g.voxel_count(), 24);
        assert_eq!(g.index(1, 0, 0), 1);
        assert_eq!(g.index(0, 1, 0), 4);
        assert_eq!(g.index(0, 0, 1), 12);
        assert_eq!(g.index(3, 2, 1), 23);

        let order: Vec<usize> = g.cells().map(|(x, y, z)| g.index(x, y, z)).collect();
        assert_eq!(order, (0..24).collect::<Vec<_>>());
    }

    #[test]
    fn shell_and_bounds() {
        let g = GridSize::cube(4);
        assert!(g.is_shell(0, 2, 2));
        assert!(g.is_shell(3, 1, 1));
        assert!(!g.is_shell(1, 2, 1));
        assert!(g.contains(3, 3, 3));
        assert!(!g.contains(-1, 0, 0));
        assert!(!g.contains(0, 4, 0));
    }
}
