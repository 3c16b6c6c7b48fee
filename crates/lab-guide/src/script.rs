//! Guide scripts: what the guide says for each task
//!
//! Spoken narration prefers `voice_instruction` and falls back to
//! `instruction`. Completion text is display-only.

use indexmap::IndexMap;
use lab_tasks::{Task, TaskId};
use serde::{Deserialize, Serialize};

/// Guide lines for one task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideMessage {
    pub instruction: String,
    #[serde(default)]
    pub voice_instruction: Option<String>,
    #[serde(default)]
    pub completion: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

impl GuideMessage {
    #[must_use]
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            voice_instruction: None,
            completion: None,
            hint: None,
        }
    }

    #[must_use]
    pub fn with_voice(mut self, text: impl Into<String>) -> Self {
        self.voice_instruction = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_completion(mut self, text: impl Into<String>) -> Self {
        self.completion = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_hint(mut self, text: impl Into<String>) -> Self {
        self.hint = Some(text.into());
        self
    }

    /// Text to speak, `None` when both variants are blank
    #[must_use]
    pub fn spoken_text(&self) -> Option<&str> {
        self.voice_instruction
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or(Some(self.instruction.as_str()))
            .filter(|t| !t.trim().is_empty())
    }
}

/// Guide lines keyed by task id, in task order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuideScript {
    messages: IndexMap<TaskId, GuideMessage>,
}

impl GuideScript {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a message for a task
    #[must_use]
    pub fn with(mut self, id: impl Into<TaskId>, message: GuideMessage) -> Self {
        self.messages.insert(id.into(), message);
        self
    }

    /// Script derived from task instructions and hints
    #[must_use]
    pub fn from_tasks<S>(tasks: &[Task<S>]) -> Self {
        let messages = tasks
            .iter()
            .map(|task| {
                let mut message = GuideMessage::new(task.instruction_text());
                message.hint.clone_from(&task.hint);
                (task.id.clone(), message)
            })
            .collect();
        Self { messages }
    }

    #[inline]
    #[must_use]
    pub fn get(&self, id: &TaskId) -> Option<&GuideMessage> {
        self.messages.get(id)
    }

    /// Spoken narration for a task, if any
    #[must_use]
    pub fn narration(&self, id: &TaskId) -> Option<&str> {
        self.get(id).and_then(GuideMessage::spoken_text)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Guide script for the chemistry bench
#[must_use]
pub fn chemistry() -> GuideScript {
    GuideScript::new()
        .with(
            "task-1",
            GuideMessage::new("Let's become detectives! Grab a test tube and test if 'Chemical A' is an Acid or Base using Litmus paper or Phenolphthalein.")
                .with_completion("Great job! Blue Litmus turning Red means ACID. Red Litmus turning Blue means BASE. Phenolphthalein turns Pink in Bases!")
                .with_hint("Select a chemical, then select an indicator to see the reaction."),
        )
        .with(
            "task-2",
            GuideMessage::new("Explosive science time! Add Zinc metal to Acid and bring a flame near it. Listen carefully!")
                .with_completion("POP! That sound confirms Hydrogen gas was released. Metals + Acid -> Salt + Hydrogen gas.")
                .with_hint("Select 'Zn' metal and mix with 'HCl'. Then click the Flame icon."),
        )
        .with(
            "task-3",
            GuideMessage::new("Let's make some fizz! React an Acid with a Carbonate and pass the gas through Lime Water.")
                .with_completion("It turned milky! That's the proof of Carbon Dioxide (CO2). Metal Carbonate + Acid -> Salt + Water + CO2.")
                .with_hint("Use Na2CO3 and HCl. Watch the lime water jar."),
        )
        .with(
            "task-4",
            GuideMessage::new("Time for balance! Perform a Neutralisation reaction. Add Acid drop-by-drop to the Base until the Pink color *just* disappears.")
                .with_voice("Time for balance! Perform a neutralisation reaction. Add acid drop by drop to the base until the pink colour just disappears.")
                .with_completion("Perfect balance! Acid + Base -> Salt + Water. The pH is now neutral (7).")
                .with_hint("Add HCl to NaOH + Phenolphthalein slowly. Stop when it's transparent."),
        )
        .with(
            "task-5",
            GuideMessage::new("How strong is it? Use the Universal Indicator and pH paper to find the exact pH value.")
                .with_completion("You've mastered the scale! Red/Orange is Acidic, Green is Neutral, Blue/Violet is Basic.")
                .with_hint("Check the color chart to match the pH value."),
        )
        .with(
            "task-6",
            GuideMessage::new("Let's heat things up! Heat the blue Copper Sulphate crystals. What happens to the water inside?")
                .with_completion("It turned white! You removed the Water of Crystallisation. Add water back to make it blue again!")
                .with_hint("Apply heat using the Bunsen burner control."),
        )
}

/// Guide script for the optics bench
#[must_use]
pub fn optics() -> GuideScript {
    GuideScript::new()
        .with(
            "task-1",
            GuideMessage::new("Hey there! Let's start by exploring how light reflects. Switch to 'Mirror Mode' and drag the object up and down!")
                .with_completion("Awesome! Did you see that? The angle of reflection always equals the angle of incidence. That's the law of reflection!")
                .with_hint("Try moving the object to different heights and watch the ray angles change"),
        )
        .with(
            "task-2",
            GuideMessage::new("Now let's see how distance works. Move the object closer and farther from the mirror.")
                .with_completion("Perfect! Notice how the image distance is always exactly the same as the object distance in a plane mirror.")
                .with_hint("Drag the object horizontally to see the relationship between distances"),
        )
        .with(
            "task-3",
            GuideMessage::new("Time to bend some minds... and mirrors! Try changing the mirror to 'Concave' and see what happens to the image.")
                .with_completion("Whoa! Concave mirrors can flip things upside down depending on where you stand. That's a real image!")
                .with_hint("Try positioning the object at different distances from the mirror"),
        )
        .with(
            "task-4",
            GuideMessage::new("Let's switch gears to Lenses! Change back to 'Lens Mode' and pick a Convex lens. Watch how light bends!")
                .with_completion("You got it! That bending is called Refraction. It happens because light changes speed when it enters the glass.")
                .with_hint("Notice how rays bend toward the normal when entering the lens"),
        )
        .with(
            "task-5",
            GuideMessage::new("Let's change the material! Use the 'Refractive Index' slider to make the lens made of something denser, like diamond!")
                .with_completion("See that? Higher refractive index means more bending. That's why diamonds sparkle so much!")
                .with_hint("Try values like 1.3 (water), 1.5 (glass), and 2.4 (diamond)"),
        )
        .with(
            "task-6",
            GuideMessage::new("This is a tricky one. Increase the angle of incidence really high until the light doesn't escape anymore!")
                .with_completion("BAM! Total Internal Reflection! The light is trapped inside. That's exactly how fiber optic internet cables work!")
                .with_hint("Gradually increase the angle until you see total internal reflection"),
        )
        .with(
            "task-7",
            GuideMessage::new("Let's compare! Try a Concave lens now. Does it ever form a real image?")
                .with_completion("Correct! Concave lenses always make things look smaller and upright. They are virtual images.")
                .with_hint("Compare the image characteristics with those from a convex lens"),
        )
        .with(
            "task-8",
            GuideMessage::new("Final challenge! Make the image HUGE. Place the object between the focal point (F) and 2F of a convex lens.")
                .with_voice("Final challenge! Make the image huge. Place the object between the focal point and twice the focal length of a convex lens.")
                .with_completion("You did it! You're basically building a projector now. Great work completing the Optics Training!")
                .with_hint("Position the object between one and two focal lengths from the lens"),
        )
}
