//! Materials used by chunk submeshes.
//!
//! Every texture referenced by the block registry gets one backend material. The
//! materials are requested once at startup ([`MaterialRequests::request_all`]) and,
//! once resolved, frozen into a [`MaterialLibrary`] which the meshing workers share
//! read-only.

use std::collections::{HashMap, HashSet};

use futures::FutureExt;
use log::{debug, error};

use crate::engine_state::voxels::block::{
    block_side::BlockSide, block_type::BlockType, registry::BlockRegistry, TextureResource,
};
use crate::error::{Result, VoxelError};

use super::{MaterialHandle, RenderBackend, ResourceFuture};

/// Linear RGBA colour.
pub type Color = [f32; 4];

/// The neutral tint colour.
pub const WHITE: Color = [1.0, 1.0, 1.0, 1.0];

/// Material of one submesh: the backend material of a texture layer plus the block's
/// material parameters and tint colour.
#[derive(Clone, Debug, PartialEq)]
pub struct SubmeshMaterial {
    /// Backend material of the texture layer
    pub handle: MaterialHandle,
    /// Metallic parameter of the block type
    pub metallic: f32,
    /// Roughness parameter of the block type
    pub roughness: f32,
    /// Reflectance parameter of the block type
    pub reflectance: f32,
    /// Multiplicative tint, white unless the block's tint hook changes it
    pub color: Color,
}

/// Material loads that were started but may not have finished.
pub struct MaterialRequests {
    resolved: HashMap<TextureResource, MaterialHandle>,
    pending: Vec<(TextureResource, ResourceFuture<MaterialHandle>)>,
}

impl MaterialRequests {
    /// Requests one material per distinct texture used by any registered block.
    pub fn request_all(registry: &BlockRegistry, backend: &mut dyn RenderBackend) -> Self {
        let mut seen = HashSet::new();
        let mut pending = Vec::new();
        for texture in registry
            .all()
            .iter()
            .flat_map(|block| block.textures().iter().flatten())
        {
            if seen.insert(texture.clone()) {
                pending.push((texture.clone(), backend.resolve_material(texture)));
            }
        }
        debug!("Requested {} materials", pending.len());

        MaterialRequests {
            resolved: HashMap::new(),
            pending,
        }
    }

    /// Number of materials still loading.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Collects every load that has finished without blocking.
    ///
    /// Failed loads are logged and dropped, leaving their texture unresolved.
    /// Returns `true` once nothing is pending any more.
    pub fn poll(&mut self) -> bool {
        for (texture, mut future) in std::mem::take(&mut self.pending) {
            match (&mut future).now_or_never() {
                Some(Ok(handle)) => {
                    self.resolved.insert(texture, handle);
                }
                Some(Err(err)) => error!("Failed to load material '{}': {}", texture.name, err),
                None => self.pending.push((texture, future)),
            }
        }
        self.pending.is_empty()
    }

    /// Blocks until every load finished.
    ///
    /// # Errors
    /// Returns the first failed load.
    pub fn resolve_all(mut self) -> Result<MaterialLibrary> {
        let (textures, futures): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending).into_iter().unzip();
        let handles = pollster::block_on(futures::future::join_all(futures));
        for (texture, handle) in textures.into_iter().zip(handles) {
            self.resolved.insert(texture, handle?);
        }
        Ok(self.into_library())
    }

    /// Freezes whatever has been resolved so far. Textures still loading stay
    /// unavailable and make meshing fail with [`VoxelError::ResourceNotReady`].
    pub fn into_library(self) -> MaterialLibrary {
        MaterialLibrary {
            materials: self.resolved,
        }
    }
}

/// Resolved backend materials keyed by texture.
#[derive(Debug, Default)]
pub struct MaterialLibrary {
    materials: HashMap<TextureResource, MaterialHandle>,
}

impl MaterialLibrary {
    /// Number of resolved materials.
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Whether no material is resolved.
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// The backend material of a texture, if it is resolved.
    pub fn handle(&self, texture: &TextureResource) -> Option<MaterialHandle> {
        self.materials.get(texture).copied()
    }

    /// Builds the untinted material of texture layer `layer` of `side` of `block`.
    ///
    /// # Errors
    /// [`VoxelError::Registry`] if the block has no such layer,
    /// [`VoxelError::ResourceNotReady`] if the layer's material has not been resolved.
    pub fn material(
        &self,
        block: &BlockType,
        side: BlockSide,
        layer: usize,
    ) -> Result<SubmeshMaterial> {
        let texture = block.side_textures(side).get(layer).ok_or_else(|| {
            VoxelError::Registry(format!(
                "block '{}' has no texture layer {} on side {:?}",
                block.name(),
                layer,
                side
            ))
        })?;
        let handle = self
            .handle(texture)
            .ok_or_else(|| VoxelError::ResourceNotReady {
                texture: texture.name.clone(),
            })?;

        Ok(SubmeshMaterial {
            handle,
            metallic: block.metallic(),
            roughness: block.roughness(),
            reflectance: block.reflectance(),
            color: WHITE,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::engine_state::rendering::headless::HeadlessBackend;
    use crate::engine_state::voxels::block::colormap::Colormap;

    fn registry() -> BlockRegistry {
        BlockRegistry::register_all(Arc::new(Colormap::default_grass())).unwrap()
    }

    #[test]
    fn one_material_per_distinct_texture() {
        let registry = registry();
        let mut backend = HeadlessBackend::new();
        let requests = MaterialRequests::request_all(&registry, &mut backend);
        assert_eq!(requests.pending_count(), 9);

        let library = requests.resolve_all().unwrap();
        assert_eq!(library.len(), 9);
        assert_eq!(backend.scene().materials.len(), 9);
    }

    #[test]
    fn material_carries_block_parameters() {
        let registry = registry();
        let mut backend = HeadlessBackend::new();
        let library = MaterialRequests::request_all(&registry, &mut backend)
            .resolve_all()
            .unwrap();

        let bedrock = registry.by_name("bedrock").unwrap();
        let material = library.material(bedrock, BlockSide::UP, 0).unwrap();
        assert_eq!(material.metallic, 0.25);
        assert_eq!(material.reflectance, 0.15);
        assert_eq!(material.color, WHITE);

        let grass = registry.by_name("grass").unwrap();
        let overlay = library.material(grass, BlockSide::EAST, 1).unwrap();
        let overlay_texture = TextureResource::transparent("grass_block_side_overlay");
        assert_eq!(Some(overlay.handle), library.handle(&overlay_texture));
        assert!(library.material(grass, BlockSide::UP, 1).is_err());
    }

    #[test]
    fn unresolved_material_is_not_ready() {
        let registry = registry();
        let stone = registry.by_name("stone").unwrap();
        let library = MaterialLibrary::default();
        assert!(matches!(
            library.material(stone, BlockSide::DOWN, 0),
            Err(VoxelError::ResourceNotReady { .. })
        ));
    }

    #[test]
    fn poll_collects_ready_materials() {
        let registry = registry();
        let mut backend = HeadlessBackend::new();
        let mut requests = MaterialRequests::request_all(&registry, &mut backend);
        assert!(requests.poll());
        assert_eq!(requests.into_library().len(), 9);
    }
}
