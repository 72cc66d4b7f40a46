//! Fixtures shared by the unit tests.

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::core::MtResource;
use crate::engine_state::pipeline_context::PipelineContext;
use crate::engine_state::rendering::{
    headless::HeadlessBackend, material::MaterialRequests, meshing::BlockMesher,
};
use crate::engine_state::voxels::{
    block::{colormap::Colormap, registry::BlockRegistry},
    generation::{SurfaceGenerator, WorldGenerator},
    world::World,
};

pub(crate) fn registry() -> Arc<BlockRegistry> {
    Arc::new(BlockRegistry::register_all(Arc::new(Colormap::default_grass())).unwrap())
}

pub(crate) fn mesher(registry: &Arc<BlockRegistry>) -> BlockMesher {
    let mut backend = HeadlessBackend::new();
    let materials = MaterialRequests::request_all(registry, &mut backend)
        .resolve_all()
        .unwrap();
    BlockMesher::new(registry.clone(), Arc::new(materials), 1.0)
}

/// A flat grass plane without trees.
pub(crate) fn surface_generator(registry: &BlockRegistry) -> Arc<dyn WorldGenerator> {
    let grass = registry.by_name("grass").unwrap().default_state();
    Arc::new(SurfaceGenerator::new(grass))
}

/// A context over an empty world, generating flat grass, with default settings.
/// The returned backend shares its scene with the one inside the context.
pub(crate) fn pipeline_context_with_backend() -> (PipelineContext, HeadlessBackend) {
    let registry = registry();
    let backend = HeadlessBackend::new();
    let context = PipelineContext::new(
        MtResource::new(World::new()),
        surface_generator(&registry),
        Arc::new(mesher(&registry)),
        Box::new(backend.clone()),
        &EngineConfig::default(),
    );
    (context, backend)
}

pub(crate) fn pipeline_context() -> PipelineContext {
    pipeline_context_with_backend().0
}
