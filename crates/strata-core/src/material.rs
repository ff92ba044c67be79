use serde::{Deserialize, Serialize};

use crate::constants::OPACITY_EPSILON;
use crate::error::CoreError;
use crate::side::Side;
use crate::types::Voxel;

/// Material id reserved for empty space.
pub const AIR: u32 = 0;
pub const STONE: u32 = 1;
pub const GRASS: u32 = 2;
pub const GLASS: u32 = 3;

/// A rectangle inside the texture atlas, in normalized [0, 1] units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AtlasRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl AtlasRect {
    /// Texture coordinates for the four quad corners, in quad vertex order.
    pub fn corners(&self) -> [[f32; 2]; 4] {
        [
            [self.x + self.w, self.y + self.h],
            [self.x + self.w, self.y],
            [self.x, self.y],
            [self.x, self.y + self.h],
        ]
    }
}

/// One atlas rectangle per texture set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SideTextures {
    pub up: AtlasRect,
    pub down: AtlasRect,
    pub left: AtlasRect,
    pub right: AtlasRect,
    pub front: AtlasRect,
    pub back: AtlasRect,
}

impl SideTextures {
    /// Same rectangle on every side.
    pub fn uniform(rect: AtlasRect) -> Self {
        Self {
            up: rect,
            down: rect,
            left: rect,
            right: rect,
            front: rect,
            back: rect,
        }
    }

    pub fn get(&self, set: Side) -> &AtlasRect {
        match set {
            Side::Up => &self.up,
            Side::Down => &self.down,
            Side::Left => &self.left,
            Side::Right => &self.right,
            Side::Front => &self.front,
            Side::Back => &self.back,
        }
    }
}

/// How a material interacts with face visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpacityClass {
    /// Never produces faces and never hides a neighbor's face.
    Air,
    /// Produces faces in the transparent region and does not hide neighbors.
    Translucent,
    /// Produces faces in the opaque region and hides the neighbor's touching face.
    Opaque,
}

impl OpacityClass {
    pub fn of(opacity: f32) -> Self {
        if opacity < OPACITY_EPSILON {
            OpacityClass::Air
        } else if opacity < 1.0 - OPACITY_EPSILON {
            OpacityClass::Translucent
        } else {
            OpacityClass::Opaque
        }
    }
}

/// A single material definition loaded from RON data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialDef {
    /// Stable id stored in voxels. 0 = air.
    pub id: u32,
    pub name: String,
    /// 0 = fully transparent, 1 = opaque.
    pub opacity: f32,
    /// Atlas rectangles; may be omitted for materials that never render.
    #[serde(default)]
    pub textures: Option<SideTextures>,
}

impl MaterialDef {
    pub fn class(&self) -> OpacityClass {
        OpacityClass::of(self.opacity)
    }
}

/// Pick which texture set of a voxel's material covers the given geometric side.
///
/// The direction axis maps to the front/back sets, the right axis to right/left
/// and the up axis to up/down. The sign of the matching axis component selects
/// between the pair. Returns `None` when no axis of the frame lies along the side.
pub fn resolve_texture_side(voxel: &Voxel, side: Side) -> Option<Side> {
    let axis = side.axis();
    let sign = side.sign();
    let pick = |component: i32, positive: Side, negative: Side| {
        if component == sign {
            positive
        } else {
            negative
        }
    };

    if voxel.direction[axis] != 0 {
        Some(pick(voxel.direction[axis], Side::Front, Side::Back))
    } else if voxel.right[axis] != 0 {
        Some(pick(voxel.right[axis], Side::Right, Side::Left))
    } else if voxel.up[axis] != 0 {
        Some(pick(voxel.up[axis], Side::Up, Side::Down))
    } else {
        None
    }
}

/// Materials indexed by id. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct MaterialTable {
    slots: Vec<Option<MaterialDef>>,
}

impl MaterialTable {
    /// Build a table from definitions, rejecting duplicate ids.
    pub fn from_defs(defs: Vec<MaterialDef>) -> Result<Self, CoreError> {
        let mut slots: Vec<Option<MaterialDef>> = Vec::new();
        for def in defs {
            let idx = def.id as usize;
            if idx >= slots.len() {
                slots.resize(idx + 1, None);
            }
            if slots[idx].is_some() {
                return Err(CoreError::DuplicateMaterial(def.id));
            }
            slots[idx] = Some(def);
        }
        Ok(Self { slots })
    }

    /// Parse a RON list of material definitions.
    pub fn from_ron_str(ron_str: &str) -> Result<Self, CoreError> {
        let options = ron::Options::default();
        let defs: Vec<MaterialDef> = options
            .from_str(ron_str)
            .map_err(|e| CoreError::MaterialParse(e.to_string()))?;
        Self::from_defs(defs)
    }

    /// Read and parse a RON material file.
    pub fn load(path: &std::path::Path) -> Result<Self, CoreError> {
        let text = std::fs::read_to_string(path).map_err(|source| CoreError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_ron_str(&text)
    }

    /// Air, stone, grass and glass on a five-tile atlas strip.
    pub fn builtin() -> Self {
        let tile = |i: u32| AtlasRect {
            x: i as f32 * 0.2,
            y: 0.0,
            w: 0.2,
            h: 1.0,
        };
        let grass_side = tile(1);
        let defs = vec![
            MaterialDef {
                id: AIR,
                name: "Air".into(),
                opacity: 0.0,
                textures: None,
            },
            MaterialDef {
                id: STONE,
                name: "Stone".into(),
                opacity: 1.0,
                textures: Some(SideTextures::uniform(tile(0))),
            },
            MaterialDef {
                id: GRASS,
                name: "Grass".into(),
                opacity: 1.0,
                textures: Some(SideTextures {
                    up: tile(2),
                    down: tile(3),
                    left: grass_side,
                    right: grass_side,
                    front: grass_side,
                    back: grass_side,
                }),
            },
            MaterialDef {
                id: GLASS,
                name: "Glass".into(),
                opacity: 0.99,
                textures: Some(SideTextures::uniform(tile(4))),
            },
        ];
        let slots = defs.into_iter().map(Some).collect();
        Self { slots }
    }

    /// Look up a material by id.
    pub fn get(&self, id: u32) -> Option<&MaterialDef> {
        self.slots.get(id as usize).and_then(|slot| slot.as_ref())
    }

    pub fn opacity(&self, id: u32) -> Result<f32, CoreError> {
        self.get(id)
            .map(|m| m.opacity)
            .ok_or(CoreError::UnknownMaterial(id))
    }

    pub fn class(&self, id: u32) -> Result<OpacityClass, CoreError> {
        self.opacity(id).map(OpacityClass::of)
    }

    /// Texture coordinates for one geometric side of a voxel.
    pub fn tex_coords(&self, voxel: &Voxel, side: Side) -> Result<[[f32; 2]; 4], CoreError> {
        let material = self
            .get(voxel.material)
            .ok_or(CoreError::UnknownMaterial(voxel.material))?;
        let missing = || CoreError::MissingTextures {
            material: voxel.material,
            side,
        };
        let set = resolve_texture_side(voxel, side).ok_or_else(missing)?;
        let textures = material.textures.as_ref().ok_or_else(missing)?;
        Ok(textures.get(set).corners())
    }

    /// Number of defined materials.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
