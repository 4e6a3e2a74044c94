use std::collections::HashSet;

use serde::Serialize;

use super::answers::AnswerSet;
use super::definition::{QuestionDefinition, Section, SelectOption, Unit, VisibilityPredicate};

/// Ordered, validated list of question definitions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct QuestionCatalog {
    questions: Vec<QuestionDefinition>,
}

impl QuestionCatalog {
    /// Build a catalog, rejecting duplicate ids and dependencies that do not point to an
    /// earlier question.
    pub fn new(questions: Vec<QuestionDefinition>) -> Result<Self, CatalogError> {
        if questions.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen: HashSet<&str> = HashSet::new();
        for question in &questions {
            if let Some(dependency) = &question.depends_on {
                if !seen.contains(dependency.question_id.as_str()) {
                    let declared_later = questions
                        .iter()
                        .any(|candidate| candidate.id == dependency.question_id);
                    return Err(if declared_later {
                        CatalogError::ForwardDependency {
                            question_id: question.id.clone(),
                            depends_on: dependency.question_id.clone(),
                        }
                    } else {
                        CatalogError::UnknownDependency {
                            question_id: question.id.clone(),
                            depends_on: dependency.question_id.clone(),
                        }
                    });
                }
            }

            if !seen.insert(question.id.as_str()) {
                return Err(CatalogError::DuplicateId(question.id.clone()));
            }
        }

        Ok(Self { questions })
    }

    pub fn questions(&self) -> &[QuestionDefinition] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, question_id: &str) -> Option<&QuestionDefinition> {
        self.questions.iter().find(|question| question.id == question_id)
    }

    pub fn index_of(&self, question_id: &str) -> Option<usize> {
        self.questions
            .iter()
            .position(|question| question.id == question_id)
    }

    /// Questions eligible for display given `answers`, in catalog order.
    ///
    /// A dependent question is visible when the question it depends on is itself visible and
    /// its current answer satisfies the predicate.
    pub fn visible<'a>(&'a self, answers: &AnswerSet) -> Vec<&'a QuestionDefinition> {
        let mut visible_ids: HashSet<&str> = HashSet::new();
        let mut visible = Vec::with_capacity(self.questions.len());

        for question in &self.questions {
            let shown = match &question.depends_on {
                None => true,
                Some(dependency) => {
                    visible_ids.contains(dependency.question_id.as_str())
                        && dependency
                            .predicate
                            .evaluate(answers.get(&dependency.question_id))
                }
            };

            if shown {
                visible_ids.insert(question.id.as_str());
                visible.push(question);
            }
        }

        visible
    }

    pub fn is_visible(&self, question_id: &str, answers: &AnswerSet) -> bool {
        self.visible(answers)
            .iter()
            .any(|question| question.id == question_id)
    }

    /// Drop answers that belong to questions hidden under the current answers.
    pub fn visible_answers(&self, answers: &AnswerSet) -> AnswerSet {
        let visible: HashSet<&str> = self
            .visible(answers)
            .into_iter()
            .map(|question| question.id.as_str())
            .collect();
        answers.retain_ids(|id| visible.contains(id))
    }

    /// Breast cancer risk intake questionnaire used by the patient portal.
    pub fn breast_cancer_risk() -> Self {
        let questions = vec![
            QuestionDefinition::integer("age", "Quel est votre âge?")
                .with_placeholder("Ex: 35")
                .with_bounds(18.0, 90.0),
            QuestionDefinition::single_select(
                "first_degree_relatives",
                "Votre mère ou l'une de vos sœurs a-t-elle eu un cancer du sein?",
                vec![
                    SelectOption::new("Non, aucune", 0),
                    SelectOption::new("Oui, une (mère OU une sœur)", 1),
                    SelectOption::new(
                        "Oui, deux ou plus (mère ET sœur, ou plusieurs sœurs)",
                        2,
                    ),
                ],
            )
            .with_help("Comptez seulement votre mère et vos sœurs biologiques"),
            QuestionDefinition::single_select(
                "previous_biopsies",
                "Avez-vous déjà eu un examen médical où un médecin a prélevé un petit morceau de votre sein pour l'analyser?",
                vec![
                    SelectOption::new("Non, jamais", 0),
                    SelectOption::new("Oui, une fois", 1),
                    SelectOption::new("Oui, plusieurs fois", 2),
                ],
            )
            .with_help("Si vous n'êtes pas sûre ou ne vous souvenez pas, répondez 'Non'"),
            QuestionDefinition::boolean(
                "atypical_hyperplasia",
                "Si vous avez eu un prélèvement du sein, un médecin vous a-t-il dit que les cellules n'étaient pas tout à fait normales (mais que ce n'était pas un cancer)?",
            )
            .with_help("Si vous n'avez jamais eu de prélèvement ou ne savez pas, répondez 'Non'")
            .depends_on("previous_biopsies", VisibilityPredicate::GreaterThan(0.0)),
            QuestionDefinition::single_select(
                "age_menarche",
                "À quel âge avez-vous eu vos premières règles?",
                vec![
                    SelectOption::new("Avant 12 ans", "<12"),
                    SelectOption::new("Entre 12 et 13 ans", "12-13"),
                    SelectOption::new("14 ans ou plus", "14+"),
                ],
            ),
            QuestionDefinition::single_select(
                "age_first_birth",
                "À quel âge avez-vous eu votre premier enfant?",
                vec![
                    SelectOption::new("Avant 20 ans", "<20"),
                    SelectOption::new("Entre 20 et 24 ans", "20-24"),
                    SelectOption::new("Entre 25 et 29 ans", "25-29"),
                    SelectOption::new("30 ans ou plus", "30+"),
                    SelectOption::new("Je n'ai pas d'enfant", "nulliparous"),
                ],
            ),
            QuestionDefinition::decimal("weight_kg", "Quel est votre poids actuel?")
                .in_section(Section::Lifestyle)
                .with_unit(Unit::Kilograms)
                .with_placeholder("Ex: 65")
                .with_help("En kilogrammes")
                .with_bounds(30.0, 200.0),
            QuestionDefinition::decimal("height_cm", "Quelle est votre taille?")
                .in_section(Section::Lifestyle)
                .with_unit(Unit::Centimeters)
                .with_placeholder("Ex: 170")
                .with_help("En centimètres. Exemple : 1 mètre 70 = 170 cm")
                .with_bounds(100.0, 250.0)
                .depends_on("weight_kg", VisibilityPredicate::Answered),
            QuestionDefinition::integer(
                "alcohol_consumption",
                "Combien de verres d'alcool buvez-vous par semaine?",
            )
            .in_section(Section::Lifestyle)
            .with_placeholder("Ex: 0")
            .with_help("1 verre = 1 verre de vin, 1 bière, ou 1 shot. Si vous ne buvez pas, écrivez 0")
            .with_bounds(0.0, 50.0),
            QuestionDefinition::integer(
                "exercise_minutes_per_week",
                "Combien de minutes par semaine faites-vous de sport ou d'exercice physique?",
            )
            .in_section(Section::Lifestyle)
            .with_placeholder("Ex: 150")
            .with_help("Marche rapide, vélo, natation, course, gym, etc. Si vous ne faites pas de sport, écrivez 0")
            .with_bounds(0.0, 1000.0),
            QuestionDefinition::single_select(
                "smoking_status",
                "Fumez-vous actuellement?",
                vec![
                    SelectOption::new("Non, je n'ai jamais fumé", "never"),
                    SelectOption::new("Non, j'ai arrêté de fumer", "former"),
                    SelectOption::new("Oui, je fume actuellement", "current"),
                ],
            )
            .in_section(Section::Lifestyle)
            .with_help("Le tabac peut augmenter le risque de cancer"),
            QuestionDefinition::boolean(
                "hormone_therapy",
                "Prenez-vous un traitement hormonal pour la ménopause (pilules ou patchs)?",
            )
            .in_section(Section::Lifestyle)
            .with_help("Seulement si vous êtes ménopausée et prenez un traitement hormonal prescrit par un médecin")
            .depends_on("age", VisibilityPredicate::AtLeast(50.0)),
        ];

        Self { questions }
    }
}

impl Default for QuestionCatalog {
    fn default() -> Self {
        Self::breast_cancer_risk()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("a questionnaire needs at least one question")]
    Empty,
    #[error("question id '{0}' is declared more than once")]
    DuplicateId(String),
    #[error("question '{question_id}' depends on unknown question '{depends_on}'")]
    UnknownDependency {
        question_id: String,
        depends_on: String,
    },
    #[error("question '{question_id}' depends on '{depends_on}', which is not declared before it")]
    ForwardDependency {
        question_id: String,
        depends_on: String,
    },
}
