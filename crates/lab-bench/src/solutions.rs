//! Scripted learner actions that complete each built-in task
//!
//! Optics rays and images are written the way the ray engine would report
//! them for the configured geometry.

use lab_tasks::domain::chemistry::{
    ChemistryStore, Chemical, Gas, Indicator, LimeWater, Metal, PopTest, ReactionUpdate, TRANSPARENT,
};
use lab_tasks::domain::optics::{
    BenchMode, ElementPatch, ImageData, LensShape, MirrorShape, OpticalElement, OpticsStore, Ray, RayKind, Vec2,
};
use lab_tasks::{StoreError, TaskId};

/// Actions that solve one task
pub type Solver<S> = fn(&TaskId, &mut S) -> Result<(), StoreError>;

/// Solve a chemistry task; unknown ids leave the store untouched
///
/// # Errors
/// Propagates setter failures.
pub fn chemistry(id: &TaskId, s: &mut ChemistryStore) -> Result<(), StoreError> {
    match id.as_str() {
        "task-1" => {
            s.set_chemical_a(Chemical::Hcl);
            s.set_indicator(Indicator::LitmusBlue);
            s.set_color("#FF0000");
        }
        "task-2" => {
            s.set_metal(Metal::Zn);
            s.set_chemical_a(Chemical::Hcl);
            s.update_state(ReactionUpdate {
                gas_produced: Some(Gas::H2),
                bubbles_active: Some(true),
                is_reacting: Some(true),
                pop_test_result: Some(PopTest::Success),
                ..ReactionUpdate::default()
            })?;
        }
        "task-3" => {
            s.set_chemical_a(Chemical::Na2co3);
            s.set_chemical_b(Chemical::Hcl);
            s.update_state(ReactionUpdate {
                gas_produced: Some(Gas::Co2),
                bubbles_active: Some(true),
                lime_water_test: Some(LimeWater::Milky),
                ..ReactionUpdate::default()
            })?;
        }
        "task-4" => {
            s.set_chemical_b(Chemical::Hcl);
            s.update_state(ReactionUpdate {
                color: Some(TRANSPARENT.to_string()),
                ..ReactionUpdate::default().with_ph(7.0)
            })?;
        }
        "task-5" => {
            s.set_chemical_a(Chemical::Ch3cooh);
            s.set_indicator(Indicator::Universal);
            s.set_ph_value(3.0)?;
        }
        "task-6" => {
            s.set_heat_applied(true);
            s.set_color("#FFFFFF");
        }
        other => tracing::warn!(task = other, "no scripted solution"),
    }
    Ok(())
}

fn parallel_ray() -> Ray {
    Ray {
        origin: Vec2::new(100.0, 260.0),
        direction: Vec2::new(1.0, 0.0),
        color: "#ffd54f".to_string(),
        kind: RayKind::Parallel,
        intensity: 1.0,
    }
}

fn virtual_image(x: f64, magnification: f64) -> ImageData {
    ImageData {
        position: Vec2::new(x, 300.0),
        height: 80.0 * magnification,
        is_real: false,
        is_inverted: false,
        magnification,
    }
}

/// Solve an optics task; unknown ids leave the store untouched
///
/// # Errors
/// Propagates setter failures.
pub fn optics(id: &TaskId, s: &mut OpticsStore) -> Result<(), StoreError> {
    match id.as_str() {
        "task-1" => {
            s.set_mode(BenchMode::Mirror);
            s.add_element(OpticalElement::mirror("mirror-1", MirrorShape::Plane))?;
            s.set_object_height(120.0)?;
            s.set_rays(vec![parallel_ray()]);
        }
        "task-2" => {
            // Object at x=200, mirror at x=500: the image sits as far behind.
            s.set_object_position(Vec2::new(200.0, 300.0));
            s.set_image(Some(virtual_image(800.0, 1.0)));
        }
        "task-3" => {
            s.add_element(OpticalElement::mirror("mirror-1", MirrorShape::Convex))?;
            s.set_image(Some(virtual_image(560.0, 0.4)));
        }
        "task-4" => {
            s.set_mode(BenchMode::Lens);
            s.add_element(OpticalElement::lens("lens-1", LensShape::Convex))?;
            s.set_angle_of_incidence(30.0)?;
            s.set_rays(vec![parallel_ray()]);
        }
        "task-5" => {
            s.update_element(
                "lens-1",
                ElementPatch {
                    refractive_index: Some(1.7),
                    ..ElementPatch::default()
                },
            )?;
            s.set_rays(vec![parallel_ray()]);
        }
        "task-6" => {
            s.set_angle_of_incidence(60.0)?;
            s.set_rays(vec![parallel_ray()]);
        }
        "task-7" => {
            s.add_element(OpticalElement::lens("lens-1", LensShape::Concave))?;
            s.set_image(Some(virtual_image(440.0, 0.6)));
        }
        "task-8" => {
            // 220 units from an f=150 lens: between F and 2F.
            s.add_element(OpticalElement::lens("lens-1", LensShape::Convex))?;
            s.set_object_position(Vec2::new(280.0, 300.0));
            s.set_image(Some(ImageData {
                position: Vec2::new(972.0, 300.0),
                height: -171.0,
                is_real: true,
                is_inverted: true,
                magnification: 2.14,
            }));
        }
        other => tracing::warn!(task = other, "no scripted solution"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lab_tasks::domain::{chemistry as chem, optics as opt};
    use lab_tasks::TaskRunner;

    #[test]
    fn every_chemistry_task_is_solvable() {
        let mut runner = TaskRunner::new(ChemistryStore::new(), chem::task_list().unwrap());
        while let Some(id) = runner.activate_next().unwrap() {
            let done = runner.update(|s| chemistry(&id, s)).unwrap();
            assert!(done, "{id} not completed by its solution");
        }
        assert!(runner.progress().is_finished());
    }

    #[test]
    fn every_optics_task_is_solvable() {
        let mut runner = TaskRunner::new(OpticsStore::new(), opt::task_list().unwrap());
        while let Some(id) = runner.activate_next().unwrap() {
            let done = runner.update(|s| optics(&id, s)).unwrap();
            assert!(done, "{id} not completed by its solution");
        }
        assert!(runner.progress().is_finished());
    }
}
