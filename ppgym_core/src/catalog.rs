//! Built-in catalog of workout templates and program rotations.
//!
//! The catalog is immutable: templates are defined here at build time and
//! never created or changed at runtime.

use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Rotation order of the Pedro program (A → B → C → D → E → A ...)
pub const PEDRO_ORDER: &[&str] = &[
    "template-a",
    "template-b",
    "template-c",
    "template-d",
    "template-e",
];

/// Rotation order of the Georgia program (A → B → C → D → A ...)
pub const GEORGIA_ORDER: &[&str] = &[
    "georgia-template-a",
    "georgia-template-b",
    "georgia-template-c",
    "georgia-template-d",
];

impl Program {
    /// Fixed, ordered list of template ids this program cycles through
    pub fn template_order(&self) -> &'static [&'static str] {
        match self {
            Program::Pedro => PEDRO_ORDER,
            Program::Georgia => GEORGIA_ORDER,
        }
    }

    /// Which program's rotation contains the given template id
    pub fn for_template(template_id: &str) -> Option<Program> {
        Program::ALL
            .into_iter()
            .find(|p| p.template_order().iter().any(|id| *id == template_id))
    }
}

/// The complete, ordered list of workout templates
#[derive(Clone, Debug)]
pub struct Catalog {
    templates: Vec<WorkoutTemplate>,
}

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

fn exercise(name: &str, sets: u32, reps: u32, media: Option<&str>) -> TemplateExercise {
    TemplateExercise {
        name: name.into(),
        target_sets: sets,
        target_reps: reps,
        default_weight: 0.0,
        notes: None,
        media_ref: media.map(Into::into),
    }
}

fn with_notes(mut exercise: TemplateExercise, notes: &str) -> TemplateExercise {
    exercise.notes = Some(notes.into());
    exercise
}

fn template(
    id: &str,
    name: &str,
    description: &str,
    category: TemplateCategory,
    exercises: Vec<TemplateExercise>,
) -> WorkoutTemplate {
    WorkoutTemplate {
        id: id.into(),
        name: name.into(),
        description: Some(description.into()),
        category: Some(category),
        exercises,
    }
}

/// Builds the default catalog with both programs' templates
///
/// **Note**: prefer `get_default_catalog()` outside of tests.
pub fn build_default_catalog() -> Catalog {
    let templates = vec![
        // ====================================================================
        // Pedro
        // ====================================================================
        template(
            "template-a",
            "A — Pernas + Core",
            "Treino focado em pernas e fortalecimento do core",
            TemplateCategory::Legs,
            vec![
                exercise("Agachamento livre", 4, 10, Some("treino_A/agachamento-com-barra.gif")),
                exercise("Leg press ou Hack", 3, 11, Some("treino_A/leg-press.gif")),
                exercise(
                    "Afundo / avanço (halter ou barra)",
                    3,
                    10,
                    Some("treino_A/avanco-com-halteras.gif"),
                ),
                exercise("Mesa flexora", 3, 11, Some("treino_A/mesa-flexora.gif")),
                exercise(
                    "Cadeira extensora",
                    3,
                    12,
                    Some("treino_A/cadeira-extensora-extensora.gif"),
                ),
                exercise("Panturrilha em pé", 4, 13, Some("treino_A/panturrilha-pe.gif")),
                exercise("Panturrilha sentado", 2, 13, Some("treino_A/panturrilha-sentado.gif")),
                with_notes(
                    exercise("Prancha", 3, 1, Some("treino_A/core-prancha.jpg")),
                    "30-60s",
                ),
                exercise("Abdominal no cabo", 2, 15, Some("treino_A/abdominal-cabo.gif")),
            ],
        ),
        template(
            "template-b",
            "B — Peito + Tríceps",
            "Treino focado em músculos de empurrar - peito e tríceps",
            TemplateCategory::Push,
            vec![
                exercise("Supino reto", 4, 8, Some("treino_B/supino-reto.gif")),
                exercise("Supino inclinado", 3, 10, Some("treino_B/supino-inclinado.gif")),
                exercise(
                    "Crucifixo (máquina ou halteres)",
                    3,
                    11,
                    Some("treino_B/crucifixo.gif"),
                ),
                exercise("Cross-over", 3, 13, Some("treino_B/cross-over.gif")),
                exercise(
                    "Tríceps pulley (barra ou corda)",
                    3,
                    11,
                    Some("treino_B/tricep-pulley.gif"),
                ),
                exercise(
                    "Tríceps francês / testa",
                    2,
                    9,
                    Some("treino_B/triceps-frances-unilateral.gif"),
                ),
                with_notes(
                    exercise("Dips/paralelas", 2, 1, Some("treino_B/dips-paralelas.gif")),
                    "até a falha técnica",
                ),
            ],
        ),
        template(
            "template-c",
            "C — Costas + Bíceps",
            "Treino focado em músculos de puxar - costas e bíceps",
            TemplateCategory::Pull,
            vec![
                exercise("Puxada frontal pronada", 4, 10, Some("treino_C/puxada-frontal.gif")),
                exercise("Remada baixa ou curvada", 3, 10, Some("treino_C/remada-baixa.gif")),
                exercise("Puxada supinada", 3, 11, Some("treino_C/puxada-supinada.gif")),
                exercise(
                    "Remada unilateral (halter)",
                    2,
                    11,
                    Some("treino_C/remada-unilateral.gif"),
                ),
                exercise(
                    "Face pull / crucifixo invertido",
                    2,
                    13,
                    Some("treino_C/face-pull.gif"),
                ),
                exercise(
                    "Bíceps rosca direta",
                    3,
                    10,
                    Some("treino_C/biceps-rosca-direta.gif"),
                ),
                exercise("Rosca martelo", 2, 11, Some("treino_C/rosca-martelo.gif")),
            ],
        ),
        template(
            "template-d",
            "D — Ombro + Trapézio + Core",
            "Treino focado em ombros, trapézio e core",
            TemplateCategory::Upper,
            vec![
                exercise(
                    "Desenvolvimento militar ou Arnold",
                    4,
                    8,
                    Some("treino_D/desenvolvimento-militar.gif"),
                ),
                exercise("Elevação lateral", 3, 13, Some("treino_D/elevacao-lateral.gif")),
                exercise("Elevação frontal", 2, 11, Some("treino_D/elevacao-frontal.gif")),
                exercise(
                    "Elevação posterior (peck deck invertido ou halter)",
                    2,
                    13,
                    Some("treino_D/elevacao-posterior.gif"),
                ),
                exercise(
                    "Encolhimento (barra ou halteres)",
                    3,
                    11,
                    Some("treino_D/encolhimento.gif"),
                ),
                exercise("Remada alta (barra ou polia)", 2, 11, Some("treino_D/remada-alta.gif")),
                with_notes(
                    exercise("Prancha lateral", 3, 1, Some("treino_D/prancha-lateral.gif")),
                    "30s",
                ),
                exercise("Rotação no cabo", 2, 17, Some("treino_D/rotacao-cabo.gif")),
            ],
        ),
        template(
            "template-e",
            "E — Pernas (variação)",
            "Variação do treino de pernas com exercícios diferentes",
            TemplateCategory::Legs,
            vec![
                exercise(
                    "Front squat ou agachamento com halteres",
                    3,
                    9,
                    Some("treino_E/front-squat.gif"),
                ),
                exercise("Stiff / levantamento terra romeno", 3, 10, Some("treino_E/stiff.gif")),
                exercise("Leg press (variação do ângulo)", 3, 11, Some("treino_E/leg-press.gif")),
                exercise("Mesa flexora", 3, 11, Some("treino_E/mesa-flexora.gif")),
                exercise("Cadeira abdutora/adutora", 3, 13, Some("treino_E/abdutora.gif")),
                exercise(
                    "Panturrilha em pé ou no leg press",
                    4,
                    13,
                    Some("treino_E/panturrilha-pe.gif"),
                ),
                exercise("Panturrilha sentado", 2, 13, Some("treino_E/panturrilha-sentado.gif")),
            ],
        ),
        // ====================================================================
        // Georgia
        // ====================================================================
        template(
            "georgia-template-a",
            "Georgia A — Pernas Completo",
            "Treino completo de pernas da Georgia",
            TemplateCategory::Legs,
            vec![
                exercise("Agachamento livre", 4, 12, Some("treino_A/agachamento-com-barra.gif")),
                exercise("Agachamento Hack", 4, 12, Some("treino_A/leg-press.gif")),
                exercise(
                    "Cadeira extensora",
                    4,
                    10,
                    Some("treino_A/cadeira-extensora-extensora.gif"),
                ),
                exercise("Leg press 45", 4, 10, Some("treino_A/leg-press.gif")),
                exercise("Cadeira adutora", 4, 10, Some("treino_E/abdutora.gif")),
            ],
        ),
        template(
            "georgia-template-b",
            "Georgia B — Ombro/Bíceps/Peito",
            "Treino de ombro, bíceps e peito da Georgia",
            TemplateCategory::Push,
            vec![
                exercise(
                    "Elevação frontal e lateral",
                    4,
                    10,
                    Some("treino_D/elevacao-frontal.gif"),
                ),
                exercise("Bíceps alternado", 4, 10, Some("treino_C/biceps-rosca-direta.gif")),
                exercise(
                    "Desenvolvimento militar alter",
                    4,
                    12,
                    Some("treino_D/desenvolvimento-militar.gif"),
                ),
                exercise("Supino reto", 4, 10, Some("treino_B/supino-reto.gif")),
                exercise("Crucifixo", 4, 10, Some("treino_B/crucifixo.gif")),
                exercise("Pack deck", 4, 10, Some("treino_B/crucifixo.gif")),
                exercise("Bíceps na polia", 4, 10, Some("treino_C/biceps-rosca-direta.gif")),
            ],
        ),
        template(
            "georgia-template-c",
            "Georgia C — Posteriores e Glúteo",
            "Treino de posteriores e glúteo da Georgia",
            TemplateCategory::Legs,
            vec![
                exercise("Stiff com barra", 4, 10, Some("treino_E/stiff.gif")),
                exercise("Terra sumô", 4, 10, Some("treino_E/stiff.gif")),
                exercise("Cadeira flexora", 4, 10, Some("treino_A/mesa-flexora.gif")),
                exercise("Coice na polia", 4, 10, None),
                exercise("Cadeira abdutora", 4, 10, Some("treino_E/abdutora.gif")),
                exercise("Elevação pélvica", 4, 10, None),
            ],
        ),
        template(
            "georgia-template-d",
            "Georgia D — Costas/Tríceps",
            "Treino de costas e tríceps da Georgia",
            TemplateCategory::Pull,
            vec![
                exercise("Puxador frontal p.pronado", 4, 10, Some("treino_C/puxada-frontal.gif")),
                exercise(
                    "Puxador frontal p.supinado",
                    4,
                    12,
                    Some("treino_C/puxada-supinada.gif"),
                ),
                exercise("Remada baixa", 4, 10, Some("treino_C/remada-baixa.gif")),
                exercise("Remada articulada", 4, 10, Some("treino_C/remada-baixa.gif")),
                exercise("Remada unilateral", 4, 10, Some("treino_C/remada-unilateral.gif")),
                exercise(
                    "Tríceps com halter",
                    4,
                    10,
                    Some("treino_B/triceps-frances-unilateral.gif"),
                ),
                exercise("Tríceps polia barra reta", 4, 10, Some("treino_B/tricep-pulley.gif")),
                exercise("Tríceps polia corda", 4, 10, Some("treino_B/tricep-pulley.gif")),
            ],
        ),
    ];

    Catalog { templates }
}

impl Catalog {
    /// Build a catalog from an explicit template list
    pub fn new(templates: Vec<WorkoutTemplate>) -> Self {
        Self { templates }
    }

    /// All templates in definition order
    pub fn templates(&self) -> &[WorkoutTemplate] {
        &self.templates
    }

    /// Look up a template by id
    ///
    /// Surrounding whitespace is ignored and a blank id is simply not found;
    /// turning absence into an error is the caller's job.
    pub fn find_by_id(&self, id: &str) -> Option<&WorkoutTemplate> {
        let id = id.trim();
        if id.is_empty() {
            return None;
        }
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn list_by_category(&self, category: TemplateCategory) -> Vec<&WorkoutTemplate> {
        self.templates
            .iter()
            .filter(|t| t.category == Some(category))
            .collect()
    }

    /// Display name for a template id, falling back to the id itself
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.find_by_id(id).map(|t| t.name.as_str()).unwrap_or(id)
    }

    /// Validate the catalog for consistency and completeness
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        for template in &self.templates {
            if template.id.trim().is_empty() {
                errors.push("Template has empty ID".to_string());
            }
            if !seen.insert(template.id.as_str()) {
                errors.push(format!("Duplicate template ID '{}'", template.id));
            }
            if template.name.is_empty() {
                errors.push(format!("Template '{}' has empty name", template.id));
            }
            if template.exercises.is_empty() {
                errors.push(format!("Template '{}' has no exercises", template.id));
            }

            for exercise in &template.exercises {
                if exercise.name.is_empty() {
                    errors.push(format!("Template '{}' has unnamed exercise", template.id));
                }
                if exercise.target_sets == 0 {
                    errors.push(format!(
                        "Template '{}': '{}' has zero target sets",
                        template.id, exercise.name
                    ));
                }
                if exercise.target_reps == 0 {
                    errors.push(format!(
                        "Template '{}': '{}' has zero target reps",
                        template.id, exercise.name
                    ));
                }
                if !exercise.default_weight.is_finite() || exercise.default_weight < 0.0 {
                    errors.push(format!(
                        "Template '{}': '{}' has invalid default weight {}",
                        template.id, exercise.name, exercise.default_weight
                    ));
                }
            }
        }

        for program in Program::ALL {
            for id in program.template_order() {
                if self.find_by_id(id).is_none() {
                    errors.push(format!(
                        "Program '{}' references non-existent template '{}'",
                        program, id
                    ));
                }
            }
        }

        errors
    }
}
