//! Chunk streaming around a moving observer.
//!
//! Two background threads cooperate with the caller's thread:
//!
//! - the window controller polls the observer and turns chunk-coordinate
//!   changes into load/unload requests;
//! - the loader services those requests: terrain generation or disk reads,
//!   face buffer builds, and saving chunks that left the window.
//!
//! Lock order is map, then a chunk's face lock, then its voxels, then the
//! renderer. Disk I/O never runs under the map lock.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use glam::{IVec3, Vec3};
use parking_lot::Mutex;
use strata_core::constants::CHUNK_SIZE_Y;
use strata_core::material::AIR;
use strata_core::math::world_to_chunk_local;
use strata_core::{ChunkPos, CoreError, EngineConfig, MaterialTable, Voxel, ALL_SIDES};
use strata_persist::{Catalog, ChunkStore};
use strata_render::{ChunkRenderer, RenderBackend};

use crate::chunk::{Chunk, Selection};
use crate::chunk_map::{ChunkEntry, ChunkMap, ChunkRequest, ChunkState};
use crate::error::{fatal, WorldError};
use crate::observer::Observer;
use crate::terrain::TerrainGenerator;

/// How long the loader blocks on an empty queue before rechecking shutdown.
const LOADER_POLL: Duration = Duration::from_millis(50);

/// State reachable from every thread.
struct Shared {
    map: Mutex<ChunkMap>,
    renderer: Arc<Mutex<ChunkRenderer>>,
    materials: Arc<MaterialTable>,
    requests: Sender<ChunkRequest>,
    /// Requests queued or being serviced.
    in_flight: AtomicUsize,
    shutdown: AtomicBool,
    radius: i32,
}

impl Shared {
    fn set_current_chunk(&self, center: ChunkPos) {
        let mut map = self.map.lock();
        let requests = map.plan_window(center, self.radius);
        if !requests.is_empty() {
            log::debug!("window moved to {center}: {} requests", requests.len());
        }
        self.enqueue(requests);
    }

    fn enqueue(&self, requests: Vec<ChunkRequest>) {
        for request in requests {
            self.in_flight.fetch_add(1, Ordering::SeqCst);
            if self.requests.send(request).is_err() {
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                log::warn!("loader stopped, dropped {request:?}");
            }
        }
    }
}

/// Owns the active chunk window and the threads that maintain it.
pub struct StreamingManager {
    shared: Arc<Shared>,
    store: ChunkStore,
    max_selection_distance: i32,
    loader: Option<JoinHandle<Catalog>>,
    controller: Option<JoinHandle<()>>,
    stop_controller: Option<Sender<()>>,
}

impl StreamingManager {
    /// Read the catalog, start both threads and request the window around (0, 0).
    ///
    /// The render arena is sized for one full window of chunks.
    pub fn new(
        config: &EngineConfig,
        materials: Arc<MaterialTable>,
        observer: Arc<dyn Observer>,
        backend: Box<dyn RenderBackend>,
    ) -> Result<Self, WorldError> {
        let store = ChunkStore::new(&config.world_dir);
        let catalog = store.load_catalog()?;
        log::info!(
            "world {}: {} saved chunks",
            store.dir().display(),
            catalog.len()
        );

        let renderer = ChunkRenderer::new(backend, config.max_active_chunks());
        let (requests, receiver) = crossbeam_channel::unbounded();
        let shared = Arc::new(Shared {
            map: Mutex::new(ChunkMap::new()),
            renderer: Arc::new(Mutex::new(renderer)),
            materials,
            requests,
            in_flight: AtomicUsize::new(0),
            shutdown: AtomicBool::new(false),
            radius: config.render_distance.max(0),
        });

        let loader = Loader {
            shared: Arc::clone(&shared),
            requests: receiver,
            store: store.clone(),
            catalog,
            terrain: TerrainGenerator::new(config.seed),
        };
        let loader = thread::Builder::new()
            .name("chunk-loader".into())
            .spawn(move || loader.run())
            .map_err(|source| WorldError::Spawn {
                name: "chunk-loader",
                source,
            })?;

        shared.set_current_chunk(ChunkPos::new(0, 0));

        let (stop_controller, stop) = crossbeam_channel::bounded::<()>(0);
        let interval = Duration::from_millis(config.controller_interval_ms);
        let controller_shared = Arc::clone(&shared);
        let controller = thread::Builder::new()
            .name("chunk-window".into())
            .spawn(move || run_controller(controller_shared, observer, interval, stop));
        let controller = match controller {
            Ok(handle) => handle,
            Err(source) => {
                shared.shutdown.store(true, Ordering::SeqCst);
                let _ = loader.join();
                return Err(WorldError::Spawn {
                    name: "chunk-window",
                    source,
                });
            }
        };

        Ok(Self {
            shared,
            store,
            max_selection_distance: config.max_selection_distance,
            loader: Some(loader),
            controller: Some(controller),
            stop_controller: Some(stop_controller),
        })
    }

    /// Move the window to `center`. No-op if it is already there.
    pub fn set_current_chunk(&self, center: ChunkPos) {
        self.shared.set_current_chunk(center);
    }

    /// Last requested window center.
    pub fn center(&self) -> Option<ChunkPos> {
        self.shared.map.lock().center()
    }

    /// The chunk at `pos`, if active.
    pub fn get_chunk(&self, pos: ChunkPos) -> Option<Arc<Chunk>> {
        self.shared.map.lock().active(pos).cloned()
    }

    pub fn active_chunks(&self) -> Vec<ChunkPos> {
        self.shared.map.lock().active_positions()
    }

    pub fn renderer(&self) -> &Arc<Mutex<ChunkRenderer>> {
        &self.shared.renderer
    }

    pub fn materials(&self) -> &MaterialTable {
        &self.shared.materials
    }

    /// No queued requests and no chunk still loading.
    pub fn is_idle(&self) -> bool {
        self.shared.in_flight.load(Ordering::SeqCst) == 0
            && self.shared.map.lock().loading_count() == 0
    }

    /// Poll [`Self::is_idle`] until it holds or `timeout` passes.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.is_idle() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(5));
        }
    }

    /// Re-mesh around an edited cell and refresh the frame draw list.
    ///
    /// The cell itself is re-evaluated on all sides. Each of its six neighbors
    /// owns the face that points back at the cell; those are re-evaluated in
    /// whichever chunk holds the neighbor.
    pub fn update_block(&self, chunk_pos: ChunkPos, local: IVec3) -> Result<(), WorldError> {
        let chunk = self
            .get_chunk(chunk_pos)
            .ok_or(WorldError::NotActive(chunk_pos))?;
        let materials = &self.shared.materials;
        let renderer = &self.shared.renderer;

        chunk.update_voxel(local, materials, renderer)?;

        let world = chunk_pos.origin() + local;
        for side in ALL_SIDES {
            let neighbor = world + side.offset();
            if !(0..CHUNK_SIZE_Y as i32).contains(&neighbor.y) {
                continue;
            }
            let (owner, owner_local) = world_to_chunk_local(neighbor);
            let target = if owner == chunk_pos {
                Some(Arc::clone(&chunk))
            } else {
                self.get_chunk(owner)
            };
            if let Some(target) = target {
                target.update_side(owner_local, side.opposite(), materials, renderer)?;
            }
        }

        renderer.lock().refresh_command_lists();
        Ok(())
    }

    /// Write one cell by world coordinate and re-mesh around it.
    /// Returns false when the cell is outside the world or its chunk is not active.
    /// Fails without touching the world when the material id is unknown.
    pub fn set_block(&self, world: IVec3, voxel: Voxel) -> Result<bool, WorldError> {
        self.check_material(voxel.material)?;
        if !(0..CHUNK_SIZE_Y as i32).contains(&world.y) {
            return Ok(false);
        }
        let (pos, local) = world_to_chunk_local(world);
        let Some(chunk) = self.get_chunk(pos) else {
            return Ok(false);
        };
        chunk.set_voxel(local, voxel)?;
        self.update_block(pos, local)?;
        Ok(true)
    }

    /// Nearest voxel hit by a ray, searching the 3x3 chunks around the origin.
    pub fn get_selected_block(&self, origin: Vec3, direction: Vec3) -> Option<Selection> {
        let center = ChunkPos::containing(origin);
        let reach = self.max_selection_distance;
        let map = self.shared.map.lock();

        let mut best: Option<Selection> = None;
        for dz in -1..=1 {
            for dx in -1..=1 {
                let Some(chunk) = map.active(center.offset(dx, dz)) else {
                    continue;
                };
                let Some(hit) = chunk.get_selected_block(origin, direction, reach) else {
                    continue;
                };
                if hit.distance < reach as f32 && best.map_or(true, |b| hit.distance < b.distance) {
                    best = Some(hit);
                }
            }
        }
        best
    }

    /// Clear the voxel the observer looks at. Returns the cleared world cell.
    pub fn remove_selected(&self, observer: &dyn Observer) -> Result<Option<IVec3>, WorldError> {
        let Some(hit) = self.get_selected_block(observer.position(), observer.direction()) else {
            return Ok(None);
        };
        let Some(chunk) = self.get_chunk(hit.chunk) else {
            return Ok(None);
        };
        chunk.set_voxel(hit.local, Voxel::default())?;
        self.update_block(hit.chunk, hit.local)?;
        Ok(Some(hit.world()))
    }

    /// Place `material` against the face the observer looks at, if that cell is
    /// empty. Returns the filled world cell.
    pub fn place_selected(
        &self,
        observer: &dyn Observer,
        material: u32,
    ) -> Result<Option<IVec3>, WorldError> {
        self.check_material(material)?;
        let Some(hit) = self.get_selected_block(observer.position(), observer.direction()) else {
            return Ok(None);
        };
        let target = hit.world() + hit.normal;
        if !(0..CHUNK_SIZE_Y as i32).contains(&target.y) {
            return Ok(None);
        }
        let (pos, local) = world_to_chunk_local(target);
        let Some(chunk) = self.get_chunk(pos) else {
            return Ok(None);
        };
        if chunk.voxel(local).map(|v| v.material) != Some(AIR) {
            return Ok(None);
        }
        chunk.set_voxel(local, Voxel::new(material))?;
        self.update_block(pos, local)?;
        Ok(Some(target))
    }

    /// Every written voxel must resolve in the material table, or meshing and
    /// later reloads of its chunk fail.
    fn check_material(&self, material: u32) -> Result<(), WorldError> {
        match self.shared.materials.get(material) {
            Some(_) => Ok(()),
            None => Err(CoreError::UnknownMaterial(material).into()),
        }
    }

    /// Save every chunk, stop both threads and rewrite the catalog.
    pub fn shutdown(mut self) -> Result<(), WorldError> {
        self.finish()
    }

    fn finish(&mut self) -> Result<(), WorldError> {
        drop(self.stop_controller.take());
        if let Some(controller) = self.controller.take() {
            if controller.join().is_err() {
                log::error!("chunk window controller panicked");
            }
        }

        let Some(loader) = self.loader.take() else {
            return Ok(());
        };
        {
            let mut map = self.shared.map.lock();
            let flush = map.plan_flush();
            log::debug!("flushing {} chunks", flush.len());
            self.shared.enqueue(flush);
        }
        self.shared.shutdown.store(true, Ordering::SeqCst);

        match loader.join() {
            Ok(catalog) => {
                self.store.save_catalog(&catalog)?;
                log::info!(
                    "saved catalog {} ({} chunks)",
                    self.store.catalog_path().display(),
                    catalog.len()
                );
                Ok(())
            }
            Err(_) => {
                log::error!("chunk loader panicked; catalog not rewritten");
                Ok(())
            }
        }
    }
}

impl Drop for StreamingManager {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            log::error!("streaming shutdown failed: {e}");
        }
    }
}

fn run_controller(
    shared: Arc<Shared>,
    observer: Arc<dyn Observer>,
    interval: Duration,
    stop: Receiver<()>,
) {
    loop {
        shared.set_current_chunk(observer.current_chunk());
        match stop.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => continue,
            _ => break,
        }
    }
    log::debug!("chunk window controller stopped");
}

/// Loader thread state. Owns the on-disk side of the world.
struct Loader {
    shared: Arc<Shared>,
    requests: Receiver<ChunkRequest>,
    store: ChunkStore,
    catalog: Catalog,
    terrain: TerrainGenerator,
}

impl Loader {
    /// Service requests until shutdown is flagged and the queue is drained.
    /// Returns the catalog for the final rewrite.
    fn run(mut self) -> Catalog {
        let mut queue: VecDeque<ChunkRequest> = VecDeque::new();
        loop {
            queue.extend(self.requests.try_iter());
            if let Some(request) = next_request(&mut queue) {
                if let Err(err) = self.service(request) {
                    fatal(&format!("chunk loader failed on {request:?}"), err);
                }
                self.shared.in_flight.fetch_sub(1, Ordering::SeqCst);
                continue;
            }
            if self.shared.shutdown.load(Ordering::SeqCst) {
                if self.requests.is_empty() {
                    break;
                }
                continue;
            }
            match self.requests.recv_timeout(LOADER_POLL) {
                Ok(request) => queue.push_back(request),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        log::debug!("chunk loader stopped");
        self.catalog
    }

    fn service(&mut self, request: ChunkRequest) -> Result<(), WorldError> {
        match request {
            ChunkRequest::Load(pos) => self.load(pos),
            ChunkRequest::Unload(pos) => self.unload(pos),
        }
    }

    fn load(&mut self, pos: ChunkPos) -> Result<(), WorldError> {
        {
            let map = self.shared.map.lock();
            match map.entry(pos) {
                Some(ChunkEntry {
                    state: ChunkState::Loading,
                    unload_pending: false,
                }) => {}
                _ => {
                    log::debug!("skipping load of {pos}");
                    return Ok(());
                }
            }
        }

        let from_disk = self.catalog.contains(pos);
        let voxels = if from_disk {
            self.store.load_chunk(pos)?
        } else {
            self.terrain.generate_chunk(pos)
        };
        let chunk = Arc::new(Chunk::new(pos, voxels));
        chunk.build_mesh(&self.shared.materials, &self.shared.renderer)?;

        {
            let mut map = self.shared.map.lock();
            if !map.activate(Arc::clone(&chunk)) {
                chunk.release_mesh(&self.shared.renderer);
                return Ok(());
            }
        }
        self.shared.renderer.lock().refresh_command_lists();
        log::debug!(
            "loaded chunk {pos} ({})",
            if from_disk { "disk" } else { "generated" }
        );
        Ok(())
    }

    fn unload(&mut self, pos: ChunkPos) -> Result<(), WorldError> {
        let chunk = {
            let mut map = self.shared.map.lock();
            match map.entry(pos) {
                None => {
                    log::warn!("unload of {pos}: not in the active map");
                    return Ok(());
                }
                Some(entry) if !entry.unload_pending => {
                    log::debug!("unload of {pos} cancelled");
                    return Ok(());
                }
                Some(_) => {}
            }
            match map.remove(pos).map(|entry| entry.state) {
                Some(ChunkState::Active(chunk)) => chunk,
                _ => {
                    log::debug!("dropped pending load of {pos}");
                    return Ok(());
                }
            }
        };

        chunk.release_mesh(&self.shared.renderer);
        self.shared.renderer.lock().refresh_command_lists();

        let bytes = self.store.save_chunk(pos, &chunk.voxels())?;
        self.catalog.insert(pos);
        log::debug!("unloaded chunk {pos} ({bytes} bytes)");
        Ok(())
    }
}

/// Unloads go first so freed slots are available to the loads behind them.
fn next_request(queue: &mut VecDeque<ChunkRequest>) -> Option<ChunkRequest> {
    match queue
        .iter()
        .position(|r| matches!(r, ChunkRequest::Unload(_)))
    {
        Some(index) => queue.remove(index),
        None => queue.pop_front(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use strata_core::material::{GLASS, STONE};
    use strata_render::MemoryBackend;

    use crate::observer::SharedObserver;

    const SETTLE: Duration = Duration::from_secs(60);

    /// A loader wired to an empty map, driven directly by the test thread.
    fn loader(dir: &Path) -> Loader {
        let (requests, receiver) = crossbeam_channel::unbounded();
        let renderer = ChunkRenderer::new(Box::new(MemoryBackend::new()), 4);
        let shared = Arc::new(Shared {
            map: Mutex::new(ChunkMap::new()),
            renderer: Arc::new(Mutex::new(renderer)),
            materials: Arc::new(MaterialTable::builtin()),
            requests,
            in_flight: AtomicUsize::new(0),
            shutdown: AtomicBool::new(false),
            radius: 0,
        });
        Loader {
            shared,
            requests: receiver,
            store: ChunkStore::new(dir.join("world")),
            catalog: Catalog::new(),
            terrain: TerrainGenerator::new(7),
        }
    }

    fn config(dir: &Path, radius: i32) -> EngineConfig {
        EngineConfig {
            render_distance: radius,
            world_dir: dir.join("world"),
            controller_interval_ms: 10,
            ..EngineConfig::default()
        }
    }

    fn start(config: &EngineConfig, observer: Arc<SharedObserver>) -> StreamingManager {
        StreamingManager::new(
            config,
            Arc::new(MaterialTable::builtin()),
            observer,
            Box::new(MemoryBackend::new()),
        )
        .expect("manager")
    }

    fn window(center: ChunkPos, radius: i32) -> Vec<ChunkPos> {
        let mut positions = Vec::new();
        for x in center.x - radius..=center.x + radius {
            for z in center.z - radius..=center.z + radius {
                positions.push(ChunkPos::new(x, z));
            }
        }
        positions.sort();
        positions
    }

    /// Move the observer into chunk `pos` and wait for the window to settle.
    fn walk_to(manager: &StreamingManager, observer: &SharedObserver, pos: ChunkPos) {
        observer.set_position(pos.origin().as_vec3() + Vec3::new(8.0, 100.0, 8.0));
        manager.set_current_chunk(pos);
        assert!(manager.wait_idle(SETTLE));
    }

    #[test]
    fn test_next_request_prefers_unloads() {
        let mut queue: VecDeque<ChunkRequest> = [
            ChunkRequest::Load(ChunkPos::new(0, 0)),
            ChunkRequest::Unload(ChunkPos::new(5, 5)),
            ChunkRequest::Load(ChunkPos::new(1, 0)),
        ]
        .into_iter()
        .collect();
        assert_eq!(next_request(&mut queue), Some(ChunkRequest::Unload(ChunkPos::new(5, 5))));
        assert_eq!(next_request(&mut queue), Some(ChunkRequest::Load(ChunkPos::new(0, 0))));
        assert_eq!(next_request(&mut queue), Some(ChunkRequest::Load(ChunkPos::new(1, 0))));
        assert_eq!(next_request(&mut queue), None);
    }

    #[test]
    fn test_initial_window_fills() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let observer = Arc::new(SharedObserver::new(Vec3::new(8.0, 100.0, 8.0), Vec3::NEG_Y));
        let manager = start(&config(dir.path(), 1), observer);

        assert!(manager.wait_idle(SETTLE));
        assert_eq!(manager.active_chunks(), window(ChunkPos::new(0, 0), 1));
        let renderer = manager.renderer().lock();
        assert_eq!(renderer.arena().in_use(), 9);
        assert_eq!(renderer.opaque_draws().len(), 9);
    }

    #[test]
    fn test_window_follows_observer() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let observer = Arc::new(SharedObserver::new(Vec3::new(8.0, 100.0, 8.0), Vec3::NEG_Y));
        let manager = start(&config(dir.path(), 1), Arc::clone(&observer));
        assert!(manager.wait_idle(SETTLE));

        for pos in [ChunkPos::new(1, 0), ChunkPos::new(3, -2), ChunkPos::new(2, -2)] {
            walk_to(&manager, &observer, pos);
            assert_eq!(manager.active_chunks(), window(pos, 1));
            assert_eq!(manager.renderer().lock().arena().in_use(), 9);
        }

        // Jump back and forth before the loader catches up.
        observer.set_position(Vec3::new(8.0, 100.0, 8.0));
        manager.set_current_chunk(ChunkPos::new(0, 0));
        observer.set_position(Vec3::new(40.0, 100.0, -24.0));
        manager.set_current_chunk(ChunkPos::new(2, -2));
        assert!(manager.wait_idle(SETTLE));
        assert_eq!(manager.active_chunks(), window(ChunkPos::new(2, -2), 1));
    }

    #[test]
    fn test_edits_persist_across_restart() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let cfg = config(dir.path(), 1);
        let observer = Arc::new(SharedObserver::new(Vec3::new(8.0, 100.0, 8.0), Vec3::NEG_Y));
        let edited = IVec3::new(5, 120, -3);

        {
            let manager = start(&cfg, Arc::clone(&observer));
            assert!(manager.wait_idle(SETTLE));
            assert!(manager.set_block(edited, Voxel::new(GLASS)).expect("edit"));
            manager.shutdown().expect("shutdown");
        }

        let catalog = Catalog::load(&cfg.world_dir.join("saved.txt")).expect("catalog");
        assert_eq!(catalog.len(), 9);
        assert!(catalog.contains(ChunkPos::new(0, -1)));

        let manager = start(&cfg, observer);
        assert!(manager.wait_idle(SETTLE));
        let (pos, local) = world_to_chunk_local(edited);
        let chunk = manager.get_chunk(pos).expect("active");
        assert_eq!(chunk.voxel(local).map(|v| v.material), Some(GLASS));
    }

    #[test]
    fn test_update_block_meshes_new_voxel() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let observer = Arc::new(SharedObserver::new(Vec3::new(8.0, 100.0, 8.0), Vec3::NEG_Y));
        let manager = start(&config(dir.path(), 1), observer);
        assert!(manager.wait_idle(SETTLE));

        let chunk = manager.get_chunk(ChunkPos::new(0, 0)).expect("active");
        let before = chunk.with_faces(|f| f.opaque_count()).expect("mesh");
        let generation = manager.renderer().lock().generation();

        // A floating block well above the terrain shows all six faces.
        assert!(manager.set_block(IVec3::new(4, 150, 4), Voxel::new(STONE)).expect("edit"));
        assert_eq!(chunk.with_faces(|f| f.opaque_count()), Some(before + 6));
        assert!(manager.renderer().lock().generation() > generation);

        // Stacking a second one hides the touching pair.
        assert!(manager.set_block(IVec3::new(4, 151, 4), Voxel::new(STONE)).expect("edit"));
        assert_eq!(chunk.with_faces(|f| f.opaque_count()), Some(before + 10));
        assert!(chunk.with_faces(|f| f.check_invariants()).expect("mesh"));

        assert!(manager.set_block(IVec3::new(4, 151, 4), Voxel::default()).expect("edit"));
        assert_eq!(chunk.with_faces(|f| f.opaque_count()), Some(before + 6));
    }

    #[test]
    fn test_select_remove_and_place() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let observer = Arc::new(SharedObserver::new(Vec3::new(8.0, 100.0, 8.0), Vec3::NEG_Y));
        let manager = start(&config(dir.path(), 1), Arc::clone(&observer));
        assert!(manager.wait_idle(SETTLE));

        // Hang a block across the chunk border from the observer and look at it.
        let target = IVec3::new(-2, 150, 8);
        assert!(manager.set_block(target, Voxel::new(STONE)).expect("edit"));
        observer.set_pose(Vec3::new(0.5, 150.5, 8.5), Vec3::NEG_X);

        let hit = manager
            .get_selected_block(observer.position(), observer.direction())
            .expect("hit");
        assert_eq!(hit.world(), target);
        assert_eq!(hit.chunk, ChunkPos::new(-1, 0));
        assert_eq!(hit.normal, IVec3::X);
        assert!((hit.distance - 1.5).abs() < 1e-5);

        let placed = manager.place_selected(observer.as_ref(), GLASS).expect("place");
        assert_eq!(placed, Some(IVec3::new(-1, 150, 8)));
        let chunk = manager.get_chunk(ChunkPos::new(-1, 0)).expect("active");
        assert_eq!(chunk.voxel(IVec3::new(15, 150, 8)).map(|v| v.material), Some(GLASS));

        // The glass is now nearest; removing it exposes the stone again.
        let removed = manager.remove_selected(observer.as_ref()).expect("remove");
        assert_eq!(removed, Some(IVec3::new(-1, 150, 8)));
        let removed = manager.remove_selected(observer.as_ref()).expect("remove");
        assert_eq!(removed, Some(target));
        assert!(manager
            .get_selected_block(observer.position(), observer.direction())
            .is_none());
    }

    #[test]
    fn test_missing_chunk_edit_is_error() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let observer = Arc::new(SharedObserver::new(Vec3::new(8.0, 100.0, 8.0), Vec3::NEG_Y));
        let manager = start(&config(dir.path(), 0), observer);
        assert!(manager.wait_idle(SETTLE));

        assert!(matches!(
            manager.update_block(ChunkPos::new(4, 4), IVec3::ZERO),
            Err(WorldError::NotActive(_))
        ));
        assert!(!manager.set_block(IVec3::new(100, 10, 100), Voxel::new(STONE)).expect("edit"));
        assert!(!manager.set_block(IVec3::new(0, 256, 0), Voxel::new(STONE)).expect("edit"));
    }

    #[test]
    fn test_unknown_material_edit_is_rejected() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let observer = Arc::new(SharedObserver::new(Vec3::new(8.0, 100.0, 8.0), Vec3::NEG_Y));
        let manager = start(&config(dir.path(), 1), Arc::clone(&observer));
        assert!(manager.wait_idle(SETTLE));

        let chunk = manager.get_chunk(ChunkPos::new(0, 0)).expect("active");
        let before = chunk.with_faces(|f| f.opaque_count()).expect("mesh");

        assert!(matches!(
            manager.set_block(IVec3::new(4, 150, 4), Voxel::new(99)),
            Err(WorldError::Core(CoreError::UnknownMaterial(99)))
        ));
        assert_eq!(chunk.voxel(IVec3::new(4, 150, 4)).map(|v| v.material), Some(AIR));
        assert_eq!(chunk.with_faces(|f| f.opaque_count()), Some(before));

        // Neighbors of the rejected cell still mesh normally.
        assert!(manager.set_block(IVec3::new(4, 151, 4), Voxel::new(STONE)).expect("edit"));
        assert_eq!(chunk.with_faces(|f| f.opaque_count()), Some(before + 6));

        observer.set_pose(Vec3::new(4.5, 155.5, 4.5), Vec3::NEG_Y);
        assert!(matches!(
            manager.place_selected(observer.as_ref(), 99),
            Err(WorldError::Core(CoreError::UnknownMaterial(99)))
        ));
        assert_eq!(chunk.voxel(IVec3::new(4, 152, 4)).map(|v| v.material), Some(AIR));
        let placed = manager.place_selected(observer.as_ref(), GLASS).expect("place");
        assert_eq!(placed, Some(IVec3::new(4, 152, 4)));
        assert!(chunk.with_faces(|f| f.check_invariants()).expect("mesh"));

        // Every saved chunk reloads.
        manager.shutdown().expect("shutdown");
        let manager = start(&config(dir.path(), 1), observer);
        assert!(manager.wait_idle(SETTLE));
        let chunk = manager.get_chunk(ChunkPos::new(0, 0)).expect("active");
        assert_eq!(chunk.voxel(IVec3::new(4, 151, 4)).map(|v| v.material), Some(STONE));
    }

    #[test]
    fn test_selection_from_far_origin_finds_nothing() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let observer = Arc::new(SharedObserver::new(Vec3::new(8.0, 100.0, 8.0), Vec3::NEG_Y));
        let manager = start(&config(dir.path(), 0), observer);
        assert!(manager.wait_idle(SETTLE));

        assert!(manager.get_selected_block(Vec3::new(f32::MAX, 100.0, 0.0), Vec3::NEG_X).is_none());
        assert!(manager.get_selected_block(Vec3::new(-3.0e9, 100.0, -3.0e9), Vec3::X).is_none());
    }

    #[test]
    fn test_unload_of_unmapped_chunk_is_noop() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let mut loader = loader(dir.path());

        loader.unload(ChunkPos::new(7, -3)).expect("unload");

        assert!(loader.shared.map.lock().entry(ChunkPos::new(7, -3)).is_none());
        assert_eq!(loader.catalog.len(), 0);
        assert_eq!(loader.shared.renderer.lock().arena().in_use(), 0);
    }

    #[test]
    fn test_load_skips_removed_placeholder() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let mut loader = loader(dir.path());
        let origin = ChunkPos::new(0, 0);

        let requests = loader.shared.map.lock().plan_window(origin, 0);
        assert_eq!(requests, vec![ChunkRequest::Load(origin)]);
        assert!(loader.shared.map.lock().remove(origin).is_some());

        loader.load(origin).expect("load");

        assert!(loader.shared.map.lock().entry(origin).is_none());
        let renderer = loader.shared.renderer.lock();
        assert_eq!(renderer.arena().in_use(), 0);
        assert!(renderer.opaque_draws().is_empty());
    }

    #[test]
    fn test_load_skips_chunk_leaving_window() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let mut loader = loader(dir.path());
        let (first, second) = (ChunkPos::new(0, 0), ChunkPos::new(5, 5));

        loader.shared.map.lock().plan_window(first, 0);
        let requests = loader.shared.map.lock().plan_window(second, 0);
        assert_eq!(
            requests,
            vec![ChunkRequest::Unload(first), ChunkRequest::Load(second)]
        );

        // The placeholder is marked for unload, so its load does nothing.
        loader.load(first).expect("load");
        assert!(matches!(
            loader.shared.map.lock().entry(first),
            Some(ChunkEntry {
                state: ChunkState::Loading,
                unload_pending: true,
            })
        ));
        assert_eq!(loader.shared.renderer.lock().arena().in_use(), 0);

        // Dropping a placeholder saves nothing.
        loader.unload(first).expect("unload");
        assert!(loader.shared.map.lock().entry(first).is_none());
        assert_eq!(loader.catalog.len(), 0);

        loader.load(second).expect("load");
        assert!(loader.shared.map.lock().active(second).is_some());
        assert_eq!(loader.shared.renderer.lock().arena().in_use(), 1);

        loader.shared.map.lock().plan_window(first, 0);
        loader.unload(second).expect("unload");
        assert!(loader.shared.map.lock().entry(second).is_none());
        assert!(loader.catalog.contains(second));
        assert_eq!(loader.shared.renderer.lock().arena().in_use(), 0);
    }
}
