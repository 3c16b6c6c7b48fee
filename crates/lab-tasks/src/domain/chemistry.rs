//! Acids, bases and salts bench
//!
//! Store plus the built-in task list. The neutralisation predicate checks for
//! pH exactly 7 with a transparent solution; it is kept as configured.

use crate::error::{StoreError, TaskError};
use crate::store::{SimulationStore, TaskProgress, TaskTracking};
use crate::task::{Task, TaskList};
use serde::{Deserialize, Serialize};

/// Transparent liquid colour
pub const TRANSPARENT: &str = "transparent";

/// Which experiment the bench is configured for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentMode {
    Indicators,
    MetalAcid,
    Carbonate,
    Neutralization,
    PhScale,
    SaltHeating,
}

impl ExperimentMode {
    /// Tag used on task definitions
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Indicators => "indicators",
            Self::MetalAcid => "metal_acid",
            Self::Carbonate => "carbonate",
            Self::Neutralization => "neutralization",
            Self::PhScale => "ph_scale",
            Self::SaltHeating => "salt_heating",
        }
    }
}

/// Apparatus on the bench
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Apparatus {
    TestTube,
    Beaker,
    Flask,
    BuretteFlask,
    ChinaDish,
    None,
}

/// Chemicals available to the learner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Chemical {
    Hcl,
    H2so4,
    Naoh,
    Ch3cooh,
    Water,
    Hco3,
    Caco3,
    Na2co3,
    Cuso4,
    Feso4,
    None,
}

/// Metals available to the learner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metal {
    Zn,
    Mg,
    Fe,
    Cu,
    None,
}

/// Indicators available to the learner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    LitmusRed,
    LitmusBlue,
    Phenolphthalein,
    MethylOrange,
    Universal,
    None,
}

/// Gas evolved by the current reaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gas {
    H2,
    Co2,
    None,
}

/// Outcome of the burning-splint test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PopTest {
    Success,
    Failure,
    None,
}

/// Outcome of the lime water test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimeWater {
    Milky,
    Clear,
    None,
}

/// Bulk patch applied by reaction logic
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReactionUpdate {
    pub volume: Option<f64>,
    pub temperature: Option<f64>,
    pub ph_value: Option<f64>,
    pub color: Option<String>,
    pub is_reacting: Option<bool>,
    pub gas_produced: Option<Gas>,
    pub bubbles_active: Option<bool>,
    pub precipitate: Option<bool>,
    pub pop_test_result: Option<PopTest>,
    pub lime_water_test: Option<LimeWater>,
    pub heat_applied: Option<bool>,
    pub stirring: Option<bool>,
}

impl ReactionUpdate {
    /// Patch that clears every reaction flag
    #[must_use]
    pub fn quiescent() -> Self {
        Self {
            gas_produced: Some(Gas::None),
            bubbles_active: Some(false),
            pop_test_result: Some(PopTest::None),
            lime_water_test: Some(LimeWater::None),
            heat_applied: Some(false),
            is_reacting: Some(false),
            ..Self::default()
        }
    }

    /// With pH value
    #[must_use]
    pub fn with_ph(mut self, ph: f64) -> Self {
        self.ph_value = Some(ph);
        self
    }
}

/// Chemistry bench state
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChemistryStore {
    experiment_mode: ExperimentMode,
    apparatus: Apparatus,
    chemical_a: Chemical,
    chemical_b: Chemical,
    metal: Metal,
    indicator: Indicator,
    volume: f64,
    temperature: f64,
    ph_value: f64,
    color: String,
    is_reacting: bool,
    gas_produced: Gas,
    bubbles_active: bool,
    precipitate: bool,
    pop_test_result: PopTest,
    lime_water_test: LimeWater,
    heat_applied: bool,
    stirring: bool,
    #[serde(flatten)]
    progress: TaskProgress,
}

impl Default for ChemistryStore {
    fn default() -> Self {
        Self {
            experiment_mode: ExperimentMode::Indicators,
            apparatus: Apparatus::TestTube,
            chemical_a: Chemical::None,
            chemical_b: Chemical::None,
            metal: Metal::None,
            indicator: Indicator::None,
            volume: 0.0,
            temperature: 25.0,
            ph_value: 7.0,
            color: TRANSPARENT.to_string(),
            is_reacting: false,
            gas_produced: Gas::None,
            bubbles_active: false,
            precipitate: false,
            pop_test_result: PopTest::None,
            lime_water_test: LimeWater::None,
            heat_applied: false,
            stirring: false,
            progress: TaskProgress::new(),
        }
    }
}

impl ChemistryStore {
    /// Create store in its initial state
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Experiment currently set up on the bench
    #[inline]
    #[must_use]
    pub fn experiment_mode(&self) -> ExperimentMode {
        self.experiment_mode
    }

    #[inline]
    #[must_use]
    pub fn apparatus(&self) -> Apparatus {
        self.apparatus
    }

    #[inline]
    #[must_use]
    pub fn chemical_a(&self) -> Chemical {
        self.chemical_a
    }

    #[inline]
    #[must_use]
    pub fn chemical_b(&self) -> Chemical {
        self.chemical_b
    }

    #[inline]
    #[must_use]
    pub fn metal(&self) -> Metal {
        self.metal
    }

    #[inline]
    #[must_use]
    pub fn indicator(&self) -> Indicator {
        self.indicator
    }

    #[inline]
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.volume
    }

    #[inline]
    #[must_use]
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    #[inline]
    #[must_use]
    pub fn ph_value(&self) -> f64 {
        self.ph_value
    }

    #[inline]
    #[must_use]
    pub fn color(&self) -> &str {
        &self.color
    }

    #[inline]
    #[must_use]
    pub fn is_reacting(&self) -> bool {
        self.is_reacting
    }

    #[inline]
    #[must_use]
    pub fn gas_produced(&self) -> Gas {
        self.gas_produced
    }

    #[inline]
    #[must_use]
    pub fn bubbles_active(&self) -> bool {
        self.bubbles_active
    }

    #[inline]
    #[must_use]
    pub fn precipitate(&self) -> bool {
        self.precipitate
    }

    #[inline]
    #[must_use]
    pub fn pop_test_result(&self) -> PopTest {
        self.pop_test_result
    }

    #[inline]
    #[must_use]
    pub fn lime_water_test(&self) -> LimeWater {
        self.lime_water_test
    }

    #[inline]
    #[must_use]
    pub fn heat_applied(&self) -> bool {
        self.heat_applied
    }

    #[inline]
    #[must_use]
    pub fn stirring(&self) -> bool {
        self.stirring
    }

    pub fn set_experiment_mode(&mut self, mode: ExperimentMode) {
        self.experiment_mode = mode;
    }

    pub fn set_apparatus(&mut self, apparatus: Apparatus) {
        self.apparatus = apparatus;
    }

    pub fn set_chemical_a(&mut self, chemical: Chemical) {
        self.chemical_a = chemical;
    }

    pub fn set_chemical_b(&mut self, chemical: Chemical) {
        self.chemical_b = chemical;
    }

    pub fn set_metal(&mut self, metal: Metal) {
        self.metal = metal;
    }

    pub fn set_indicator(&mut self, indicator: Indicator) {
        self.indicator = indicator;
    }

    pub fn set_heat_applied(&mut self, heat: bool) {
        self.heat_applied = heat;
    }

    pub fn set_pop_test_result(&mut self, result: PopTest) {
        self.pop_test_result = result;
    }

    pub fn set_lime_water_test(&mut self, result: LimeWater) {
        self.lime_water_test = result;
    }

    pub fn set_color(&mut self, color: impl Into<String>) {
        self.color = color.into();
    }

    /// Set pH value
    ///
    /// # Errors
    /// - `StoreError::OutOfRange` outside `0..=14`
    pub fn set_ph_value(&mut self, ph: f64) -> Result<(), StoreError> {
        if !(0.0..=14.0).contains(&ph) {
            return Err(StoreError::out_of_range("phValue", ph, 0.0, 14.0));
        }
        self.ph_value = ph;
        Ok(())
    }

    /// Apply a bulk reaction patch
    ///
    /// Ranges are checked before any field changes.
    ///
    /// # Errors
    /// - `StoreError::OutOfRange` for pH outside `0..=14` or volume outside `0..=100`
    pub fn update_state(&mut self, update: ReactionUpdate) -> Result<(), StoreError> {
        if let Some(ph) = update.ph_value {
            if !(0.0..=14.0).contains(&ph) {
                return Err(StoreError::out_of_range("phValue", ph, 0.0, 14.0));
            }
        }
        if let Some(volume) = update.volume {
            if !(0.0..=100.0).contains(&volume) {
                return Err(StoreError::out_of_range("volume", volume, 0.0, 100.0));
            }
        }

        let ReactionUpdate {
            volume,
            temperature,
            ph_value,
            color,
            is_reacting,
            gas_produced,
            bubbles_active,
            precipitate,
            pop_test_result,
            lime_water_test,
            heat_applied,
            stirring,
        } = update;

        if let Some(v) = volume {
            self.volume = v;
        }
        if let Some(v) = temperature {
            self.temperature = v;
        }
        if let Some(v) = ph_value {
            self.ph_value = v;
        }
        if let Some(v) = color {
            self.color = v;
        }
        if let Some(v) = is_reacting {
            self.is_reacting = v;
        }
        if let Some(v) = gas_produced {
            self.gas_produced = v;
        }
        if let Some(v) = bubbles_active {
            self.bubbles_active = v;
        }
        if let Some(v) = precipitate {
            self.precipitate = v;
        }
        if let Some(v) = pop_test_result {
            self.pop_test_result = v;
        }
        if let Some(v) = lime_water_test {
            self.lime_water_test = v;
        }
        if let Some(v) = heat_applied {
            self.heat_applied = v;
        }
        if let Some(v) = stirring {
            self.stirring = v;
        }
        Ok(())
    }
}

impl TaskTracking for ChemistryStore {
    fn progress(&self) -> &TaskProgress {
        &self.progress
    }

    fn progress_mut(&mut self) -> &mut TaskProgress {
        &mut self.progress
    }
}

impl SimulationStore for ChemistryStore {
    fn domain(&self) -> &'static str {
        "chemistry"
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Shared baseline: apparatus chosen, bench emptied, reactions off
fn baseline(
    store: &mut ChemistryStore,
    mode: ExperimentMode,
    apparatus: Apparatus,
) -> Result<(), StoreError> {
    store.set_experiment_mode(mode);
    store.set_apparatus(apparatus);
    store.set_chemical_a(Chemical::None);
    store.set_chemical_b(Chemical::None);
    store.set_indicator(Indicator::None);
    store.set_metal(Metal::None);
    store.set_color(TRANSPARENT);
    store.update_state(ReactionUpdate::quiescent())
}

fn task(id: &str, title: &str) -> Task<ChemistryStore> {
    Task::new(id, title)
}

/// Built-in chemistry tasks
#[must_use]
pub fn tasks() -> Vec<Task<ChemistryStore>> {
    vec![
        task("task-1", "Indicators: Acid or Base?")
            .with_description("Use various indicators to identify whether the solution is an Acid or a Base.")
            .with_instructions([
                "Select HCl or NaOH.",
                "Then dip the Litmus paper or add Phenolphthalein.",
                "Observe the color change.",
            ])
            .with_hint("Acids turn Blue Litmus -> Red. Bases turn Red Litmus -> Blue.")
            .with_mode(ExperimentMode::Indicators.as_str())
            .with_setup(|s| baseline(s, ExperimentMode::Indicators, Apparatus::TestTube))
            .with_validation(|s| {
                s.chemical_a != Chemical::None
                    && s.indicator != Indicator::None
                    && s.color != TRANSPARENT
                    && !s.color.is_empty()
            }),
        task("task-2", "Metals Reacting with Acids")
            .with_description("Observe the reaction between Metals and Acids. Test for Hydrogen gas.")
            .with_instructions([
                "Add Zinc granules to the test tube.",
                "Add HCl.",
                "Bring the flame close to the mouth of the tube.",
            ])
            .with_hint("Active metals react with acid to release H2 gas, which burns with a POP sound.")
            .with_mode(ExperimentMode::MetalAcid.as_str())
            .with_setup(|s| baseline(s, ExperimentMode::MetalAcid, Apparatus::TestTube))
            .with_validation(|s| s.gas_produced == Gas::H2 && s.pop_test_result == PopTest::Success),
        task("task-3", "Reaction with Carbonates")
            .with_description("How do Acids react with Metal Carbonates?")
            .with_instructions([
                "Add Sodium Carbonate to the flask.",
                "Add HCl.",
                "Pass the gas through Lime Water.",
            ])
            .with_hint("Acids + Carbonates -> Salt + H2O + CO2. CO2 turns lime water milky.")
            .with_mode(ExperimentMode::Carbonate.as_str())
            .with_setup(|s| baseline(s, ExperimentMode::Carbonate, Apparatus::Flask))
            .with_validation(|s| s.gas_produced == Gas::Co2 && s.lime_water_test == LimeWater::Milky),
        task("task-4", "Neutralisation Reaction")
            .with_description("Mix an Acid and a Base to form Salt and Water.")
            .with_instructions([
                "Take NaOH in the flask.",
                "Add Phenolphthalein (turns pink).",
                "Slowly add HCl dropwise until color disappears.",
            ])
            .with_hint("When Acid and Base neutralize, the PH becomes 7.")
            .with_mode(ExperimentMode::Neutralization.as_str())
            .with_setup(|s| {
                baseline(s, ExperimentMode::Neutralization, Apparatus::BuretteFlask)?;
                s.set_chemical_a(Chemical::Naoh);
                s.set_indicator(Indicator::Phenolphthalein);
                s.set_color("#FF69B4");
                s.set_ph_value(14.0)
            })
            .with_validation(|s| {
                #[allow(clippy::float_cmp)]
                let neutral = s.ph_value == 7.0;
                neutral && s.color == TRANSPARENT
            }),
        task("task-5", "pH Scale & Strength")
            .with_description("Determine the pH of different solutions using Universal Indicator.")
            .with_instructions([
                "Select different common solutions.",
                "Dip the pH paper and match the color on the pH scale.",
            ])
            .with_hint("Red (pH 1) is strong acid, Violet (pH 14) is strong base. Green is neutral.")
            .with_mode(ExperimentMode::PhScale.as_str())
            .with_setup(|s| {
                baseline(s, ExperimentMode::PhScale, Apparatus::TestTube)?;
                s.set_ph_value(7.0)
            })
            .with_validation(|s| s.chemical_a != Chemical::None && s.indicator == Indicator::Universal),
        task("task-6", "Heating of Salts")
            .with_description("Observe the effect of heat on Hydrated Copper Sulphate.")
            .with_instructions([
                "Heat the blue crystals of Copper Sulphate.",
                "Watch them turn white.",
                "Add water back to restore color.",
            ])
            .with_hint("Blue CuSO4.5H2O loses water on heating to become white CuSO4.")
            .with_mode(ExperimentMode::SaltHeating.as_str())
            .with_setup(|s| {
                baseline(s, ExperimentMode::SaltHeating, Apparatus::ChinaDish)?;
                s.set_chemical_a(Chemical::Cuso4);
                s.set_color("#0000FF");
                Ok(())
            })
            .with_validation(|s| s.color == "#FFFFFF" || s.color == "white"),
    ]
}

/// Built-in chemistry task list
///
/// # Errors
/// - `TaskError::DuplicateTask` if the built-in ids collide
pub fn task_list() -> Result<TaskList<ChemistryStore>, TaskError> {
    TaskList::new(tasks())
}
