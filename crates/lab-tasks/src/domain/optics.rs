//! Geometric optics bench
//!
//! Rays and images are produced by the external ray engine and written back
//! through [`OpticsStore::set_rays`] / [`OpticsStore::set_image`]; this module
//! only holds state and task definitions.

use crate::error::{StoreError, TaskError};
use crate::store::{SimulationStore, TaskProgress, TaskTracking};
use crate::task::{Task, TaskList};
use serde::{Deserialize, Serialize};

/// 2D position or direction in canvas units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Object placed in front of the element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Candle,
    Arrow,
    Pencil,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpticalObject {
    pub kind: ObjectKind,
    pub position: Vec2,
    pub height: f64,
    pub width: f64,
}

impl Default for OpticalObject {
    fn default() -> Self {
        Self {
            kind: ObjectKind::Arrow,
            position: Vec2::new(200.0, 300.0),
            height: 80.0,
            width: 20.0,
        }
    }
}

/// Lens or mirror mode of the bench
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenchMode {
    Lens,
    Mirror,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LensShape {
    Convex,
    Concave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MirrorShape {
    Plane,
    Concave,
    Convex,
}

/// Lens or mirror specifics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "element", rename_all = "snake_case")]
pub enum ElementKind {
    Lens {
        shape: LensShape,
        refractive_index: f64,
    },
    Mirror {
        shape: MirrorShape,
    },
}

/// Lens or mirror on the bench
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpticalElement {
    pub id: String,
    pub kind: ElementKind,
    pub position: Vec2,
    pub focal_length: f64,
    pub diameter: f64,
    pub radius_of_curvature: f64,
}

impl OpticalElement {
    /// Default element geometry
    pub const DEFAULT_FOCAL_LENGTH: f64 = 150.0;
    pub const DEFAULT_DIAMETER: f64 = 200.0;
    /// Crown glass
    pub const DEFAULT_REFRACTIVE_INDEX: f64 = 1.5;
    /// Horizontal position of the element axis
    pub const DEFAULT_X: f64 = 500.0;

    /// Lens with default geometry
    #[must_use]
    pub fn lens(id: impl Into<String>, shape: LensShape) -> Self {
        let focal_length = match shape {
            LensShape::Convex => Self::DEFAULT_FOCAL_LENGTH,
            LensShape::Concave => -Self::DEFAULT_FOCAL_LENGTH,
        };
        Self {
            id: id.into(),
            kind: ElementKind::Lens {
                shape,
                refractive_index: Self::DEFAULT_REFRACTIVE_INDEX,
            },
            position: Vec2::new(Self::DEFAULT_X, 300.0),
            focal_length,
            diameter: Self::DEFAULT_DIAMETER,
            radius_of_curvature: 2.0 * Self::DEFAULT_FOCAL_LENGTH,
        }
    }

    /// Mirror with default geometry
    #[must_use]
    pub fn mirror(id: impl Into<String>, shape: MirrorShape) -> Self {
        let focal_length = match shape {
            MirrorShape::Plane => f64::INFINITY,
            MirrorShape::Concave => Self::DEFAULT_FOCAL_LENGTH,
            MirrorShape::Convex => -Self::DEFAULT_FOCAL_LENGTH,
        };
        Self {
            id: id.into(),
            kind: ElementKind::Mirror { shape },
            position: Vec2::new(Self::DEFAULT_X, 300.0),
            focal_length,
            diameter: Self::DEFAULT_DIAMETER,
            radius_of_curvature: 2.0 * focal_length,
        }
    }

    /// Refractive index, lenses only
    #[must_use]
    pub fn refractive_index(&self) -> Option<f64> {
        match self.kind {
            ElementKind::Lens {
                refractive_index, ..
            } => Some(refractive_index),
            ElementKind::Mirror { .. } => None,
        }
    }

    #[must_use]
    pub fn is_lens(&self) -> bool {
        matches!(self.kind, ElementKind::Lens { .. })
    }

    #[must_use]
    pub fn is_lens_shaped(&self, wanted: LensShape) -> bool {
        matches!(self.kind, ElementKind::Lens { shape, .. } if shape == wanted)
    }

    #[must_use]
    pub fn is_mirror_shaped(&self, wanted: MirrorShape) -> bool {
        matches!(self.kind, ElementKind::Mirror { shape } if shape == wanted)
    }
}

/// Partial update of an element
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementPatch {
    pub position: Option<Vec2>,
    pub focal_length: Option<f64>,
    pub diameter: Option<f64>,
    pub refractive_index: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RayKind {
    Principal,
    Focal,
    Parallel,
    Marginal,
}

/// Ray segment produced by the ray engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    pub origin: Vec2,
    pub direction: Vec2,
    pub color: String,
    pub kind: RayKind,
    pub intensity: f64,
}

/// Image formed by the current configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageData {
    pub position: Vec2,
    pub height: f64,
    pub is_real: bool,
    pub is_inverted: bool,
    pub magnification: f64,
}

/// Display toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayToggle {
    Rays,
    FocalPoints,
    VirtualImage,
    Labels,
    Normal,
    RayExtensions,
    Measurements,
    Formula,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct DisplayFlags {
    pub show_rays: bool,
    pub show_focal_points: bool,
    pub show_virtual_image: bool,
    pub show_labels: bool,
    pub show_normal: bool,
    pub show_ray_extensions: bool,
    pub show_measurements: bool,
    pub show_formula: bool,
}

impl Default for DisplayFlags {
    fn default() -> Self {
        Self {
            show_rays: true,
            show_focal_points: true,
            show_virtual_image: true,
            show_labels: true,
            show_normal: true,
            show_ray_extensions: true,
            show_measurements: true,
            show_formula: false,
        }
    }
}

impl DisplayFlags {
    fn flag_mut(&mut self, toggle: DisplayToggle) -> &mut bool {
        match toggle {
            DisplayToggle::Rays => &mut self.show_rays,
            DisplayToggle::FocalPoints => &mut self.show_focal_points,
            DisplayToggle::VirtualImage => &mut self.show_virtual_image,
            DisplayToggle::Labels => &mut self.show_labels,
            DisplayToggle::Normal => &mut self.show_normal,
            DisplayToggle::RayExtensions => &mut self.show_ray_extensions,
            DisplayToggle::Measurements => &mut self.show_measurements,
            DisplayToggle::Formula => &mut self.show_formula,
        }
    }
}

/// Optics bench state
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpticsStore {
    object: OpticalObject,
    elements: Vec<OpticalElement>,
    rays: Vec<Ray>,
    image: Option<ImageData>,
    #[serde(flatten)]
    display: DisplayFlags,
    angle_of_incidence: f64,
    mode: BenchMode,
    #[serde(flatten)]
    progress: TaskProgress,
}

impl Default for OpticsStore {
    fn default() -> Self {
        Self {
            object: OpticalObject::default(),
            elements: Vec::new(),
            rays: Vec::new(),
            image: None,
            display: DisplayFlags::default(),
            angle_of_incidence: 0.0,
            mode: BenchMode::Lens,
            progress: TaskProgress::new(),
        }
    }
}

impl OpticsStore {
    /// Largest accepted angle of incidence, degrees
    pub const MAX_ANGLE: f64 = 90.0;

    /// Create store in its initial state
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn object(&self) -> &OpticalObject {
        &self.object
    }

    #[inline]
    #[must_use]
    pub fn elements(&self) -> &[OpticalElement] {
        &self.elements
    }

    #[inline]
    #[must_use]
    pub fn rays(&self) -> &[Ray] {
        &self.rays
    }

    #[inline]
    #[must_use]
    pub fn image(&self) -> Option<&ImageData> {
        self.image.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn display(&self) -> DisplayFlags {
        self.display
    }

    #[inline]
    #[must_use]
    pub fn angle_of_incidence(&self) -> f64 {
        self.angle_of_incidence
    }

    #[inline]
    #[must_use]
    pub fn mode(&self) -> BenchMode {
        self.mode
    }

    /// First lens on the bench
    #[must_use]
    pub fn first_lens(&self) -> Option<&OpticalElement> {
        self.elements.iter().find(|el| el.is_lens())
    }

    pub fn set_object_position(&mut self, position: Vec2) {
        self.object.position = position;
    }

    /// Set object height
    ///
    /// # Errors
    /// - `StoreError::OutOfRange` for non-positive heights
    pub fn set_object_height(&mut self, height: f64) -> Result<(), StoreError> {
        if height <= 0.0 || !height.is_finite() {
            return Err(StoreError::out_of_range("objectHeight", height, 0.0, f64::MAX));
        }
        self.object.height = height;
        Ok(())
    }

    /// Add element
    ///
    /// # Errors
    /// - `StoreError::DuplicateElement` if the id is taken
    pub fn add_element(&mut self, element: OpticalElement) -> Result<(), StoreError> {
        if self.elements.iter().any(|el| el.id == element.id) {
            return Err(StoreError::DuplicateElement(element.id));
        }
        self.elements.push(element);
        Ok(())
    }

    /// Remove element
    ///
    /// # Errors
    /// - `StoreError::UnknownElement` if no element has this id
    pub fn remove_element(&mut self, id: &str) -> Result<OpticalElement, StoreError> {
        let idx = self
            .elements
            .iter()
            .position(|el| el.id == id)
            .ok_or_else(|| StoreError::UnknownElement(id.to_string()))?;
        Ok(self.elements.remove(idx))
    }

    /// Patch element
    ///
    /// # Errors
    /// - `StoreError::UnknownElement` if no element has this id
    /// - `StoreError::Invalid` when setting a refractive index on a mirror
    /// - `StoreError::OutOfRange` for refractive index below 1
    pub fn update_element(&mut self, id: &str, patch: ElementPatch) -> Result<(), StoreError> {
        let element = self
            .elements
            .iter_mut()
            .find(|el| el.id == id)
            .ok_or_else(|| StoreError::UnknownElement(id.to_string()))?;

        if let Some(n) = patch.refractive_index {
            if n < 1.0 {
                return Err(StoreError::out_of_range("refractiveIndex", n, 1.0, f64::MAX));
            }
            match &mut element.kind {
                ElementKind::Lens {
                    refractive_index, ..
                } => *refractive_index = n,
                ElementKind::Mirror { .. } => {
                    return Err(StoreError::Invalid(format!(
                        "{id} is a mirror and has no refractive index"
                    )))
                }
            }
        }
        if let Some(position) = patch.position {
            element.position = position;
        }
        if let Some(focal_length) = patch.focal_length {
            element.focal_length = focal_length;
        }
        if let Some(diameter) = patch.diameter {
            element.diameter = diameter;
        }
        Ok(())
    }

    pub fn set_rays(&mut self, rays: Vec<Ray>) {
        self.rays = rays;
    }

    pub fn set_image(&mut self, image: Option<ImageData>) {
        self.image = image;
    }

    pub fn toggle(&mut self, toggle: DisplayToggle) {
        let flag = self.display.flag_mut(toggle);
        *flag = !*flag;
    }

    /// Set a display flag explicitly
    pub fn set_display(&mut self, toggle: DisplayToggle, on: bool) {
        *self.display.flag_mut(toggle) = on;
    }

    /// Set angle of incidence in degrees
    ///
    /// # Errors
    /// - `StoreError::OutOfRange` outside `0..=90`
    pub fn set_angle_of_incidence(&mut self, angle: f64) -> Result<(), StoreError> {
        if !(0.0..=Self::MAX_ANGLE).contains(&angle) {
            return Err(StoreError::out_of_range(
                "angleOfIncidence",
                angle,
                0.0,
                Self::MAX_ANGLE,
            ));
        }
        self.angle_of_incidence = angle;
        Ok(())
    }

    /// Switch lens/mirror mode; clears elements
    pub fn set_mode(&mut self, mode: BenchMode) {
        self.mode = mode;
        self.elements.clear();
    }
}

impl TaskTracking for OpticsStore {
    fn progress(&self) -> &TaskProgress {
        &self.progress
    }

    fn progress_mut(&mut self) -> &mut TaskProgress {
        &mut self.progress
    }
}

impl SimulationStore for OpticsStore {
    fn domain(&self) -> &'static str {
        "optics"
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Empty bench in the given mode with the object back at its start position
fn baseline(store: &mut OpticsStore, mode: BenchMode) -> Result<(), StoreError> {
    store.set_mode(mode);
    let object = OpticalObject::default();
    store.set_object_position(object.position);
    store.set_object_height(object.height)?;
    store.set_rays(Vec::new());
    store.set_image(None);
    store.set_display(DisplayToggle::Rays, true);
    store.set_angle_of_incidence(0.0)
}

fn task(id: &str, title: &str) -> Task<OpticsStore> {
    Task::new(id, title)
}

/// Built-in optics tasks
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn tasks() -> Vec<Task<OpticsStore>> {
    vec![
        task("task-1", "Laws of Reflection")
            .with_description("Change object position and observe that angle of reflection equals angle of incidence")
            .with_instructions([
                "Switch to Mirror mode",
                "Add a plane mirror",
                "Move the object up and down to change the angle of incidence",
                "Observe: Angle of reflection always equals angle of incidence",
                "This demonstrates the fundamental law of reflection",
            ])
            .with_hint("Move the object vertically to change the incident angle and observe the reflected rays")
            .with_mode("reflection")
            .with_setup(|s| baseline(s, BenchMode::Lens))
            .with_validation(|s| {
                let mirror = s
                    .elements
                    .iter()
                    .any(|el| el.is_mirror_shaped(MirrorShape::Plane));
                if !mirror || s.mode != BenchMode::Mirror {
                    return false;
                }
                #[allow(clippy::float_cmp)]
                let moved = s.object.height != 100.0;
                s.display.show_rays && !s.rays.is_empty() && moved
            }),
        task("task-2", "Image in a Plane Mirror")
            .with_description("Move the object and observe that image distance equals object distance")
            .with_instructions([
                "Keep the plane mirror in the scene",
                "Move the object closer to and farther from the mirror",
                "Observe: Image distance always equals object distance",
                "The image remains virtual and upright",
                "Try different positions to verify this relationship",
            ])
            .with_hint("Drag the object to different positions and watch the image move accordingly")
            .with_mode("plane_mirror")
            .with_setup(|s| {
                baseline(s, BenchMode::Mirror)?;
                s.add_element(OpticalElement::mirror("mirror-1", MirrorShape::Plane))
            })
            .with_validation(|s| {
                let Some(mirror) = s
                    .elements
                    .iter()
                    .find(|el| el.is_mirror_shaped(MirrorShape::Plane))
                else {
                    return false;
                };
                let Some(image) = s.image else {
                    return false;
                };
                if s.mode != BenchMode::Mirror {
                    return false;
                }
                let object_distance = (mirror.position.x - s.object.position.x).abs();
                let image_distance = (image.position.x - mirror.position.x).abs();
                (object_distance - image_distance).abs() < 20.0 && !image.is_real
            }),
        task("task-3", "Concave vs Convex Mirror")
            .with_description("Compare how concave and convex mirrors form different types of images")
            .with_instructions([
                "First, add a concave mirror and move the object",
                "Observe: Concave mirror can form both real and virtual images",
                "Remove it, then add a convex mirror",
                "Observe: Convex mirror always forms virtual, upright, diminished images",
                "Notice the difference in image characteristics",
            ])
            .with_hint("Try both mirror types and observe how they form different types of images")
            .with_mode("curved_mirrors")
            .with_setup(|s| baseline(s, BenchMode::Mirror))
            .with_validation(|s| {
                let convex = s
                    .elements
                    .iter()
                    .any(|el| el.is_mirror_shaped(MirrorShape::Convex));
                match s.image {
                    Some(image) if convex && s.mode == BenchMode::Mirror => {
                        !image.is_real && !image.is_inverted && image.magnification < 1.0
                    }
                    _ => false,
                }
            }),
        task("task-4", "Refraction of Light")
            .with_description("Change the angle of incidence when light enters from air to glass")
            .with_instructions([
                "Switch to Lens mode",
                "Add a convex lens (represents glass)",
                "Adjust the angle of incidence slider",
                "Observe: Light bends towards the normal when entering denser medium",
                "The greater the angle of incidence, the more bending occurs",
            ])
            .with_hint("Use the angle slider and observe how rays bend when passing through the lens")
            .with_mode("refraction")
            .with_setup(|s| baseline(s, BenchMode::Mirror))
            .with_validation(|s| {
                s.first_lens().is_some()
                    && s.mode == BenchMode::Lens
                    && !s.rays.is_empty()
                    && s.angle_of_incidence > 0.0
            }),
        task("task-5", "Effect of Refractive Index")
            .with_description("Change refractive index and observe how light bending changes")
            .with_instructions([
                "Add a convex lens if not already present",
                "Change the refractive index from 1.3 → 1.5 → 1.7",
                "Observe: Higher refractive index causes greater bending",
                "This is why different materials (water, glass, diamond) bend light differently",
                "Watch how the focal point position changes",
            ])
            .with_hint("Use the Refractive Index slider to change the value and see how rays bend differently")
            .with_mode("refractive_index")
            .with_setup(|s| {
                baseline(s, BenchMode::Lens)?;
                s.add_element(OpticalElement::lens("lens-1", LensShape::Convex))
            })
            .with_validation(|s| {
                let Some(n) = s.first_lens().and_then(OpticalElement::refractive_index) else {
                    return false;
                };
                s.mode == BenchMode::Lens
                    && (n - OpticalElement::DEFAULT_REFRACTIVE_INDEX).abs() > f64::EPSILON
                    && !s.rays.is_empty()
            }),
        task("task-6", "Total Internal Reflection")
            .with_description("Increase angle beyond critical angle to observe total internal reflection")
            .with_instructions([
                "This is an advanced concept (simulated)",
                "With a lens in place, increase the angle of incidence beyond 45°",
                "In real scenarios, light traveling from glass to air can be completely reflected",
                "When angle > critical angle, refraction stops and reflection occurs",
                "This principle is used in optical fibers",
            ])
            .with_hint("Increase the angle of incidence slider above 45° to simulate critical angle conditions")
            .with_mode("total_internal_reflection")
            .with_setup(|s| {
                baseline(s, BenchMode::Lens)?;
                s.add_element(OpticalElement::lens("lens-1", LensShape::Convex))
            })
            .with_validation(|s| {
                s.first_lens().is_some() && s.angle_of_incidence > 45.0 && !s.rays.is_empty()
            }),
        task("task-7", "Image Formation by Lenses")
            .with_description("Compare convex and concave lens image formation")
            .with_instructions([
                "Add a convex lens and move the object to different positions",
                "Observe: Convex lens can form both real and virtual images",
                "When object is beyond focal point: real, inverted image",
                "When object is within focal point: virtual, upright, magnified image",
                "Remove and add concave lens: always forms virtual, upright, diminished image",
            ])
            .with_hint("Try both convex and concave lenses at different object positions")
            .with_mode("lens_images")
            .with_setup(|s| baseline(s, BenchMode::Lens))
            .with_validation(|s| {
                let concave = s
                    .elements
                    .iter()
                    .any(|el| el.is_lens_shaped(LensShape::Concave));
                match s.image {
                    Some(image) if concave && s.mode == BenchMode::Lens => {
                        !image.is_real && !image.is_inverted && image.magnification < 1.0
                    }
                    _ => false,
                }
            }),
        task("task-8", "Magnification")
            .with_description("Change object distance and observe how image size changes")
            .with_instructions([
                "Add a convex lens",
                "Start with object far from lens (beyond 2F)",
                "Observe: Image is diminished (M < 1)",
                "Move object between F and 2F",
                "Observe: Image is magnified (M > 1)",
                "This explains how magnifying glasses and projectors work",
            ])
            .with_hint("Position the object between F and 2F to see magnification greater than 1")
            .with_mode("magnification")
            .with_setup(|s| baseline(s, BenchMode::Lens))
            .with_validation(|s| {
                let Some(lens) = s
                    .elements
                    .iter()
                    .find(|el| el.is_lens_shaped(LensShape::Convex))
                else {
                    return false;
                };
                let Some(image) = s.image else {
                    return false;
                };
                if s.mode != BenchMode::Lens {
                    return false;
                }
                let object_distance = (lens.position.x - s.object.position.x).abs();
                let focal_length = lens.focal_length.abs();
                object_distance > focal_length
                    && object_distance < 2.0 * focal_length
                    && image.magnification > 1.0
            }),
    ]
}

/// Built-in optics task list
///
/// # Errors
/// - `TaskError::DuplicateTask` if the built-in ids collide
pub fn task_list() -> Result<TaskList<OpticsStore>, TaskError> {
    TaskList::new(tasks())
}
