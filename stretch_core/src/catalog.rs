//! Default catalog of stretch exercises and session presets.
//!
//! This module provides the built-in exercises and preset groupings for the
//! system. The catalog is immutable after load and shared read-only.

use crate::types::*;
use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog_internal);

/// Get a reference to the cached default catalog
///
/// This function returns a reference to the pre-built catalog, avoiding
/// the overhead of rebuilding it on every operation.
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// Builds the default catalog with built-in exercises and presets
///
/// **Note**: For production use, prefer `get_default_catalog()` which returns
/// a cached reference. This function is retained for testing and custom
/// catalog creation.
pub fn build_default_catalog() -> Catalog {
    build_default_catalog_internal()
}

fn exercise(
    id: &str,
    name: &str,
    description: &str,
    duration_seconds: u32,
    category: Category,
    difficulty: Difficulty,
    target_muscles: &[&str],
    instructions: &[&str],
    image_url: Option<&str>,
) -> Exercise {
    Exercise {
        id: id.into(),
        name: name.into(),
        description: description.into(),
        duration_seconds,
        instructions: instructions.iter().map(|s| s.to_string()).collect(),
        category,
        target_muscles: target_muscles.iter().map(|s| s.to_string()).collect(),
        difficulty,
        image_url: image_url.map(|s| s.into()),
        video_url: None,
    }
}

/// Internal function that actually builds the catalog
fn build_default_catalog_internal() -> Catalog {
    let mut exercises = HashMap::new();
    let mut presets = HashMap::new();

    // ========================================================================
    // Exercises
    // ========================================================================

    for ex in [
        exercise(
            "neck-side-stretch",
            "Neck Side Stretch",
            "Gentle stretch for the sides of your neck",
            30,
            Category::Neck,
            Difficulty::Beginner,
            &["Upper trapezius", "Levator scapulae"],
            &[
                "Sit or stand with your spine straight",
                "Slowly tilt your head to the right, bringing your ear toward your shoulder",
                "Hold the stretch and breathe deeply",
                "Return to center and repeat on the left side",
            ],
            Some("https://images.unsplash.com/photo-1571019613454-1cb2f99b2d8b?w=400&h=400&fit=crop&auto=format"),
        ),
        exercise(
            "neck-forward-stretch",
            "Neck Forward Stretch",
            "Stretch for the back of your neck",
            30,
            Category::Neck,
            Difficulty::Beginner,
            &["Upper cervical muscles", "Suboccipital muscles"],
            &[
                "Sit with your back straight",
                "Slowly lower your chin toward your chest",
                "Place your hands gently on the back of your head",
                "Apply light pressure and hold the stretch",
            ],
            None,
        ),
        exercise(
            "shoulder-rolls",
            "Shoulder Rolls",
            "Dynamic movement to loosen shoulder tension",
            45,
            Category::Shoulders,
            Difficulty::Beginner,
            &["Deltoids", "Trapezius", "Rhomboids"],
            &[
                "Stand with feet hip-width apart",
                "Lift your shoulders up toward your ears",
                "Roll them back and down in a circular motion",
                "Repeat 10 times forward, then 10 times backward",
            ],
            Some("https://images.unsplash.com/photo-1544367567-0f2fcb009e0b?w=400&h=400&fit=crop&auto=format"),
        ),
        exercise(
            "cross-body-shoulder-stretch",
            "Cross-Body Shoulder Stretch",
            "Stretch for the posterior deltoid and shoulder capsule",
            60,
            Category::Shoulders,
            Difficulty::Beginner,
            &["Posterior deltoid", "Infraspinatus"],
            &[
                "Bring your right arm across your chest",
                "Use your left hand to gently pull your right arm closer",
                "Hold for 30 seconds",
                "Switch arms and repeat",
            ],
            None,
        ),
        exercise(
            "cat-cow-stretch",
            "Cat-Cow Stretch",
            "Dynamic stretch for spinal mobility",
            60,
            Category::Back,
            Difficulty::Beginner,
            &["Erector spinae", "Multifidus", "Abdominals"],
            &[
                "Get on your hands and knees",
                "Arch your back and look up (Cow pose)",
                "Round your back toward the ceiling (Cat pose)",
                "Continue alternating between positions slowly",
            ],
            Some("https://images.unsplash.com/photo-1506629905877-4d8c9f92ddb0?w=400&h=400&fit=crop&auto=format"),
        ),
        exercise(
            "seated-spinal-twist",
            "Seated Spinal Twist",
            "Gentle twist to improve spinal rotation",
            60,
            Category::Back,
            Difficulty::Beginner,
            &["Obliques", "Erector spinae", "Quadratus lumborum"],
            &[
                "Sit tall in your chair",
                "Place your right hand on your left knee",
                "Slowly twist your torso to the left",
                "Hold for 30 seconds, then repeat on the other side",
            ],
            None,
        ),
        exercise(
            "wrist-circles",
            "Wrist Circles",
            "Improve wrist mobility and circulation",
            30,
            Category::Wrists,
            Difficulty::Beginner,
            &["Wrist flexors", "Wrist extensors"],
            &[
                "Extend your arms in front of you",
                "Make slow circles with your wrists",
                "Circle 10 times in each direction",
                "Keep movements smooth and controlled",
            ],
            None,
        ),
        exercise(
            "prayer-stretch",
            "Prayer Stretch",
            "Stretch for wrist flexors",
            45,
            Category::Wrists,
            Difficulty::Beginner,
            &["Wrist flexors", "Forearm muscles"],
            &[
                "Press your palms together in front of your chest",
                "Lower your hands while keeping palms pressed together",
                "Stop when you feel a gentle stretch in your wrists",
                "Hold the position and breathe deeply",
            ],
            None,
        ),
        exercise(
            "hip-flexor-stretch",
            "Standing Hip Flexor Stretch",
            "Stretch tight hip flexors from prolonged sitting",
            60,
            Category::Hips,
            Difficulty::Intermediate,
            &["Hip flexors", "Psoas", "Rectus femoris"],
            &[
                "Step your right foot forward into a lunge position",
                "Keep your left leg straight behind you",
                "Push your hips forward gently",
                "Hold for 30 seconds, then switch sides",
            ],
            None,
        ),
        exercise(
            "figure-four-stretch",
            "Figure-Four Hip Stretch",
            "Stretch for the piriformis and hip external rotators",
            90,
            Category::Hips,
            Difficulty::Intermediate,
            &["Piriformis", "Glutes", "Hip external rotators"],
            &[
                "Sit in a chair with your back straight",
                "Place your right ankle on your left knee",
                "Gently lean forward until you feel a stretch",
                "Hold for 45 seconds, then switch sides",
            ],
            None,
        ),
        exercise(
            "morning-energizer",
            "Morning Energizer",
            "Full-body wake-up stretch sequence",
            120,
            Category::FullBody,
            Difficulty::Beginner,
            &["Multiple muscle groups"],
            &[
                "Stand tall and reach your arms overhead",
                "Gently lean to each side",
                "Roll your shoulders and neck",
                "Touch your toes with a forward fold",
                "Return to standing with arms overhead",
            ],
            None,
        ),
    ] {
        exercises.insert(ex.id.clone(), ex);
    }

    // ========================================================================
    // Session Presets
    // ========================================================================

    presets.insert(
        "desk".into(),
        SessionPreset {
            name: "Desk Break".into(),
            exercise_ids: vec![
                "neck-side-stretch".into(),
                "shoulder-rolls".into(),
                "wrist-circles".into(),
            ],
        },
    );

    presets.insert(
        "meeting".into(),
        SessionPreset {
            name: "Pre-Meeting Energizer".into(),
            exercise_ids: vec![
                "neck-forward-stretch".into(),
                "shoulder-rolls".into(),
                "seated-spinal-twist".into(),
            ],
        },
    );

    presets.insert(
        "afternoon".into(),
        SessionPreset {
            name: "Afternoon Energy Boost".into(),
            exercise_ids: vec![
                "cat-cow-stretch".into(),
                "hip-flexor-stretch".into(),
                "cross-body-shoulder-stretch".into(),
            ],
        },
    );

    presets.insert(
        "morning".into(),
        SessionPreset {
            name: "Morning Flow".into(),
            exercise_ids: vec![
                "morning-energizer".into(),
                "neck-side-stretch".into(),
                "shoulder-rolls".into(),
            ],
        },
    );

    presets.insert(
        "evening".into(),
        SessionPreset {
            name: "Evening Wind-Down".into(),
            exercise_ids: vec![
                "neck-forward-stretch".into(),
                "seated-spinal-twist".into(),
                "figure-four-stretch".into(),
            ],
        },
    );

    presets.insert(
        "posture".into(),
        SessionPreset {
            name: "Posture Reset".into(),
            exercise_ids: vec![
                "cat-cow-stretch".into(),
                "cross-body-shoulder-stretch".into(),
                "hip-flexor-stretch".into(),
            ],
        },
    );

    Catalog { exercises, presets }
}

impl Catalog {
    /// Look up a single exercise by id
    pub fn exercise_by_id(&self, id: &str) -> Option<&Exercise> {
        self.exercises.get(id)
    }

    /// All exercises in a category, sorted by id for stable output
    pub fn exercises_by_category(&self, category: Category) -> Vec<&Exercise> {
        let mut matches: Vec<_> = self
            .exercises
            .values()
            .filter(|e| e.category == category)
            .collect();
        matches.sort_by(|a, b| a.id.cmp(&b.id));
        matches
    }

    /// Look up a named preset and resolve its exercises in order
    ///
    /// Returns `None` for an unknown preset name. Exercise ids in a valid
    /// catalog always resolve; `validate()` enforces this.
    pub fn preset(&self, key: &str) -> Option<(&SessionPreset, Vec<Exercise>)> {
        let preset = self.presets.get(key)?;
        let exercises = preset
            .exercise_ids
            .iter()
            .filter_map(|id| self.exercises.get(id).cloned())
            .collect();
        Some((preset, exercises))
    }

    /// Pick `count` distinct short exercises at random
    ///
    /// Only exercises at or under `max_duration_seconds` are eligible. The
    /// random source is injected so selection is reproducible under test.
    pub fn random_quick_pick<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        max_duration_seconds: u32,
        count: usize,
    ) -> Vec<Exercise> {
        let mut pool: Vec<&Exercise> = self
            .exercises
            .values()
            .filter(|e| e.duration_seconds <= max_duration_seconds)
            .collect();
        // Stable base order so a seeded rng yields the same pick every run
        pool.sort_by(|a, b| a.id.cmp(&b.id));

        pool.choose_multiple(rng, count)
            .map(|e| (*e).clone())
            .collect()
    }

    /// Validate the catalog for consistency and completeness
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (id, ex) in &self.exercises {
            if id.is_empty() || ex.id.is_empty() {
                errors.push("Exercise has empty ID".to_string());
            }
            if id != &ex.id {
                errors.push(format!(
                    "Exercise key '{}' doesn't match exercise.id '{}'",
                    id, ex.id
                ));
            }
            if ex.name.is_empty() {
                errors.push(format!("Exercise '{}' has empty name", id));
            }
            if ex.duration_seconds == 0 {
                errors.push(format!("Exercise '{}' has zero duration", id));
            }
            if ex.instructions.is_empty() {
                errors.push(format!("Exercise '{}' has no instructions", id));
            }
        }

        for (key, preset) in &self.presets {
            if preset.name.is_empty() {
                errors.push(format!("Preset '{}' has empty name", key));
            }
            if preset.exercise_ids.is_empty() {
                errors.push(format!("Preset '{}' has no exercises", key));
            }
            for id in &preset.exercise_ids {
                if !self.exercises.contains_key(id) {
                    errors.push(format!(
                        "Preset '{}' references non-existent exercise '{}'",
                        key, id
                    ));
                }
            }
        }

        errors
    }

    /// Merge custom exercises from configuration into this catalog
    ///
    /// Custom entries with an id that collides with a built-in exercise
    /// replace it, letting users tune durations or instructions.
    pub fn with_custom(mut self, custom: &[crate::config::CustomExercise]) -> Self {
        for c in custom {
            self.exercises.insert(c.id.clone(), c.to_exercise());
        }
        self
    }
}
