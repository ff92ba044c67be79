use strata_core::constants::{CHUNK_SIZE_X, CHUNK_SIZE_Y, CHUNK_SIZE_Z, VOXELS_PER_CHUNK};
use strata_core::material::{GRASS, STONE};
use strata_core::math::voxel_index;
use strata_core::{ChunkPos, Voxel};

use glam::IVec3;

/// Mean terrain height in voxels.
const BASE_HEIGHT: f64 = 65.0;

/// Height swing of the terrain noise, in voxels.
const HEIGHT_AMPLITUDE: f64 = 15.0;

/// Surface cells whose cover sample is above this get grass.
const GRASS_THRESHOLD: f64 = -0.5;

/// Heightmap terrain from seeded 3D simplex noise.
pub struct TerrainGenerator {
    /// Permutation table for simplex noise (doubled for wrapping).
    perm: [u8; 512],
}

impl TerrainGenerator {
    pub fn new(seed: u64) -> Self {
        let perm = Self::build_permutation(seed);
        Self { perm }
    }

    /// Generate the voxel grid of one chunk.
    ///
    /// Each column is stone up to its height; the cell at the height is grass
    /// or stone depending on an independent cover sample.
    pub fn generate_chunk(&self, pos: ChunkPos) -> Vec<Voxel> {
        let mut voxels = vec![Voxel::default(); VOXELS_PER_CHUNK];
        let origin = pos.origin();

        for z in 0..CHUNK_SIZE_Z as i32 {
            let gz = (origin.z + z) as f64;
            for x in 0..CHUNK_SIZE_X as i32 {
                let gx = (origin.x + x) as f64;
                let height = self.column_height(gx, gz);

                for y in 0..height.min(CHUNK_SIZE_Y as i32) {
                    voxels[voxel_index(IVec3::new(x, y, z))] = Voxel::new(STONE);
                }
                if (0..CHUNK_SIZE_Y as i32).contains(&height) {
                    let cover = if self.noise(gx * 10.0, gz * 10.0, 50.0) > GRASS_THRESHOLD {
                        GRASS
                    } else {
                        STONE
                    };
                    voxels[voxel_index(IVec3::new(x, height, z))] = Voxel::new(cover);
                }
            }
        }

        voxels
    }

    /// Surface height of the column at global (x, z), truncated toward zero.
    pub fn column_height(&self, gx: f64, gz: f64) -> i32 {
        (HEIGHT_AMPLITUDE * self.noise(gx / 2.0, gz / 2.0, 0.0) + BASE_HEIGHT) as i32
    }

    /// 3D simplex noise. Returns a value in [-1, 1].
    pub fn noise(&self, x: f64, y: f64, z: f64) -> f64 {
        const F3: f64 = 1.0 / 3.0;
        const G3: f64 = 1.0 / 6.0;

        let s = (x + y + z) * F3;
        let i = (x + s).floor();
        let j = (y + s).floor();
        let k = (z + s).floor();

        let t = (i + j + k) * G3;
        let x0 = x - (i - t);
        let y0 = y - (j - t);
        let z0 = z - (k - t);

        // Which of the six tetrahedra of the skewed cube holds the point.
        let (i1, j1, k1, i2, j2, k2) = if x0 >= y0 {
            if y0 >= z0 {
                (1, 0, 0, 1, 1, 0)
            } else if x0 >= z0 {
                (1, 0, 0, 1, 0, 1)
            } else {
                (0, 0, 1, 1, 0, 1)
            }
        } else if y0 < z0 {
            (0, 0, 1, 0, 1, 1)
        } else if x0 < z0 {
            (0, 1, 0, 0, 1, 1)
        } else {
            (0, 1, 0, 1, 1, 0)
        };

        let x1 = x0 - i1 as f64 + G3;
        let y1 = y0 - j1 as f64 + G3;
        let z1 = z0 - k1 as f64 + G3;
        let x2 = x0 - i2 as f64 + 2.0 * G3;
        let y2 = y0 - j2 as f64 + 2.0 * G3;
        let z2 = z0 - k2 as f64 + 2.0 * G3;
        let x3 = x0 - 1.0 + 3.0 * G3;
        let y3 = y0 - 1.0 + 3.0 * G3;
        let z3 = z0 - 1.0 + 3.0 * G3;

        let ii = (i as i64 & 255) as usize;
        let jj = (j as i64 & 255) as usize;
        let kk = (k as i64 & 255) as usize;

        let gi0 = self.hash(ii, jj, kk);
        let gi1 = self.hash(ii + i1, jj + j1, kk + k1);
        let gi2 = self.hash(ii + i2, jj + j2, kk + k2);
        let gi3 = self.hash(ii + 1, jj + 1, kk + 1);

        let n0 = Self::corner_contribution(gi0, x0, y0, z0);
        let n1 = Self::corner_contribution(gi1, x1, y1, z1);
        let n2 = Self::corner_contribution(gi2, x2, y2, z2);
        let n3 = Self::corner_contribution(gi3, x3, y3, z3);

        (32.0 * (n0 + n1 + n2 + n3)).clamp(-1.0, 1.0)
    }

    fn hash(&self, i: usize, j: usize, k: usize) -> usize {
        let p = &self.perm;
        p[i + p[j + p[k] as usize] as usize] as usize % 12
    }

    fn corner_contribution(gi: usize, x: f64, y: f64, z: f64) -> f64 {
        let t = 0.6 - x * x - y * y - z * z;
        if t < 0.0 {
            0.0
        } else {
            let t = t * t;
            t * t * Self::grad3d(gi, x, y, z)
        }
    }

    fn grad3d(hash: usize, x: f64, y: f64, z: f64) -> f64 {
        // Midpoints of the 12 cube edges
        const GRAD: [[f64; 3]; 12] = [
            [1.0, 1.0, 0.0],
            [-1.0, 1.0, 0.0],
            [1.0, -1.0, 0.0],
            [-1.0, -1.0, 0.0],
            [1.0, 0.0, 1.0],
            [-1.0, 0.0, 1.0],
            [1.0, 0.0, -1.0],
            [-1.0, 0.0, -1.0],
            [0.0, 1.0, 1.0],
            [0.0, -1.0, 1.0],
            [0.0, 1.0, -1.0],
            [0.0, -1.0, -1.0],
        ];
        let g = &GRAD[hash % 12];
        g[0] * x + g[1] * y + g[2] * z
    }

    fn build_permutation(seed: u64) -> [u8; 512] {
        let mut p: [u8; 256] = [0; 256];
        for (i, val) in p.iter_mut().enumerate() {
            *val = i as u8;
        }

        // Fisher-Yates shuffle with seed
        let mut rng = seed;
        for i in (1..256).rev() {
            rng = rng
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let j = (rng >> 33) as usize % (i + 1);
            p.swap(i, j);
        }

        let mut perm = [0u8; 512];
        for (i, val) in perm.iter_mut().enumerate() {
            *val = p[i & 255];
        }
        perm
    }
}
