use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use strata_core::{ChunkPos, EngineConfig, MaterialTable, Voxel};
use strata_render::{MemoryBackend, RenderBackend, WgpuBackend};
use strata_world::{SharedObserver, StreamingManager, WorldError};

use crate::scenes::{self, SceneConfig};

/// Longest a scene waits for the window to settle after a move.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(120);

/// Timing data for a series of operations.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TimingSeries {
    pub samples: usize,
    pub mean_ms: f64,
    pub median_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
}

/// Result of a single scene benchmark.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BenchmarkResult {
    pub scene_name: String,
    pub backend: String,
    pub chunk_count: u32,
    /// Initial window fill, from manager start to idle.
    pub fill_ms: f64,
    /// One observer step to the next chunk, until the window settles.
    pub steps: TimingSeries,
    /// One `set_block`, including neighbor updates and the draw list refresh.
    pub edits: TimingSeries,
    /// Final flush of every chunk to disk plus the catalog rewrite.
    pub shutdown_ms: f64,
}

struct GpuContext {
    device: wgpu::Device,
    queue: Arc<wgpu::Queue>,
}

/// Runs scenes against the streaming manager with a memory or wgpu backend.
pub struct BenchmarkRunner {
    gpu: Option<GpuContext>,
    base: EngineConfig,
    materials: Arc<MaterialTable>,
    scratch: PathBuf,
}

impl BenchmarkRunner {
    /// Memory-backed runner. Scene worlds are written under `scratch`; every
    /// scene starts from `base` with its own radius and world directory.
    pub fn new(scratch: PathBuf, base: EngineConfig, materials: MaterialTable) -> Self {
        Self {
            gpu: None,
            base,
            materials: Arc::new(materials),
            scratch,
        }
    }

    /// Runner that uploads faces to real GPU buffers. Blocks on adapter and
    /// device requests; returns None if no adapter is available.
    pub fn with_gpu(scratch: PathBuf, base: EngineConfig, materials: MaterialTable) -> Option<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))?;

        log::info!("Benchmark adapter: {}", adapter.get_info().name);

        let (device, queue) = match pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("bench-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::Performance,
            },
            None,
        )) {
            Ok(pair) => pair,
            Err(e) => {
                log::error!("failed to create device: {e}");
                return None;
            }
        };

        Some(Self {
            gpu: Some(GpuContext {
                device,
                queue: Arc::new(queue),
            }),
            ..Self::new(scratch, base, materials)
        })
    }

    fn backend(&self, slots: u32) -> Box<dyn RenderBackend> {
        match &self.gpu {
            Some(gpu) => Box::new(WgpuBackend::new(&gpu.device, Arc::clone(&gpu.queue), slots)),
            None => Box::new(MemoryBackend::new()),
        }
    }

    /// Run one scene in a fresh world directory.
    pub fn run_scene(&self, scene: &SceneConfig) -> Result<BenchmarkResult, WorldError> {
        log::info!(
            "Running scene '{}' (radius {}, {} steps, {} edits)...",
            scene.name,
            scene.render_distance,
            scene.path.len(),
            scene.edits
        );

        let world_dir = self.scratch.join(scene.name);
        if world_dir.exists() {
            let _ = std::fs::remove_dir_all(&world_dir);
        }
        let config = EngineConfig {
            render_distance: scene.render_distance,
            world_dir: world_dir.clone(),
            controller_interval_ms: 5,
            ..self.base.clone()
        };

        let start = ChunkPos::new(0, 0);
        let observer = Arc::new(SharedObserver::new(
            scenes::observer_position(start),
            glam::Vec3::NEG_Y,
        ));
        let backend = self.backend(config.max_active_chunks());
        let backend_name = backend.name().to_string();

        let fill_start = Instant::now();
        let manager = StreamingManager::new(
            &config,
            Arc::clone(&self.materials),
            observer.clone(),
            backend,
        )?;
        self.settle(&manager, scene.name);
        let fill_ms = elapsed_ms(fill_start);

        let mut step_times = Vec::with_capacity(scene.path.len());
        let mut center = start;
        for &pos in &scene.path {
            let step_start = Instant::now();
            observer.set_position(scenes::observer_position(pos));
            manager.set_current_chunk(pos);
            self.settle(&manager, scene.name);
            step_times.push(elapsed_ms(step_start));
            center = pos;
        }

        let mut edit_times = Vec::with_capacity(scene.edits as usize);
        for i in 0..scene.edits {
            let (cell, material) = scenes::edit_cell(center, i);
            let edit_start = Instant::now();
            manager.set_block(cell, Voxel::new(material))?;
            edit_times.push(elapsed_ms(edit_start));
        }

        let chunk_count = manager.active_chunks().len() as u32;
        let shutdown_start = Instant::now();
        manager.shutdown()?;
        let shutdown_ms = elapsed_ms(shutdown_start);
        let _ = std::fs::remove_dir_all(&world_dir);

        let result = BenchmarkResult {
            scene_name: scene.name.to_string(),
            backend: backend_name,
            chunk_count,
            fill_ms,
            steps: compute_timings(&step_times),
            edits: compute_timings(&edit_times),
            shutdown_ms,
        };
        log::info!(
            "  Done: fill={:.2}ms, step mean={:.2}ms, edit mean={:.3}ms, shutdown={:.2}ms",
            result.fill_ms,
            result.steps.mean_ms,
            result.edits.mean_ms,
            result.shutdown_ms
        );
        Ok(result)
    }

    fn settle(&self, manager: &StreamingManager, scene: &str) {
        if !manager.wait_idle(SETTLE_TIMEOUT) {
            log::warn!("scene '{scene}': window did not settle within {SETTLE_TIMEOUT:?}");
        }
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Compute timing statistics from a list of samples in milliseconds.
pub fn compute_timings(times: &[f64]) -> TimingSeries {
    if times.is_empty() {
        return TimingSeries {
            samples: 0,
            mean_ms: 0.0,
            median_ms: 0.0,
            p95_ms: 0.0,
            p99_ms: 0.0,
            min_ms: 0.0,
            max_ms: 0.0,
        };
    }

    let mut sorted = times.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = sorted.len();
    let mean = sorted.iter().sum::<f64>() / n as f64;
    let median = if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    };
    let p95_idx = ((n as f64) * 0.95).ceil() as usize;
    let p99_idx = ((n as f64) * 0.99).ceil() as usize;

    TimingSeries {
        samples: n,
        mean_ms: mean,
        median_ms: median,
        p95_ms: sorted[p95_idx.min(n - 1)],
        p99_ms: sorted[p99_idx.min(n - 1)],
        min_ms: sorted[0],
        max_ms: sorted[n - 1],
    }
}
