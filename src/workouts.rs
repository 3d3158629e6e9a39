//! Workout definitions - база упражнений для восстановления спины

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// How an exercise is measured
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ExerciseKind {
    Reps,                    // на повторы (мостик, наклоны)
    Timed { seconds: u32 },  // на время (планка, растяжка)
}

fn default_sets() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Exercise {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Target as shown to the user, e.g. "10–12" or "30 сек"
    #[serde(default)]
    pub reps: String,
    #[serde(flatten)]
    pub kind: ExerciseKind,
    #[serde(default = "default_sets")]
    pub sets: u32,
}

impl Exercise {
    pub fn reps(name: &str, description: &str, target: &str, sets: u32) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            reps: target.to_string(),
            kind: ExerciseKind::Reps,
            sets,
        }
    }

    pub fn timed(name: &str, description: &str, seconds: u32, sets: u32) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            reps: format!("{} сек", seconds),
            kind: ExerciseKind::Timed { seconds },
            sets,
        }
    }

    pub fn is_timed(&self) -> bool {
        matches!(self.kind, ExerciseKind::Timed { .. })
    }

    /// Countdown length while exercising, 0 for rep-based exercises
    pub fn duration_secs(&self) -> u32 {
        match self.kind {
            ExerciseKind::Reps => 0,
            ExerciseKind::Timed { seconds } => seconds,
        }
    }

    /// Number of sets, never below one
    pub fn total_sets(&self) -> u32 {
        self.sets.max(1)
    }

    /// Leading rep count of the target text ("10–12 на сторону" -> "10–12")
    pub fn display_target(&self) -> &str {
        let target = self.reps.trim();
        let end = target
            .char_indices()
            .find(|(_, c)| !(c.is_ascii_digit() || *c == '–' || *c == '-'))
            .map(|(i, _)| i)
            .unwrap_or(target.len());
        if end == 0 { "—" } else { &target[..end] }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Workout {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub exercises: Vec<Exercise>,
}

impl Workout {
    /// Rough length of the timed part of the workout, in minutes
    pub fn estimated_minutes(&self) -> u32 {
        let secs: u32 = self
            .exercises
            .iter()
            .map(|e| e.duration_secs() * e.total_sets())
            .sum();
        secs.div_ceil(60)
    }

    /// Recovery stage this workout belongs to ("stage-2" -> 2)
    pub fn stage_id(&self) -> Option<u32> {
        self.id.strip_prefix("stage-")?.parse().ok()
    }

    /// Load extra workouts from a JSON array
    pub fn load_file(path: &Path) -> Result<Vec<Workout>> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading workouts from {}", path.display()))?;
        let workouts: Vec<Workout> = serde_json::from_str(&text)
            .with_context(|| format!("parsing workouts from {}", path.display()))?;

        for w in &workouts {
            if w.exercises.is_empty() {
                bail!("workout '{}' has no exercises", w.id);
            }
            let mut names = HashSet::new();
            if let Some(dup) = w.exercises.iter().find(|e| !names.insert(e.name.as_str())) {
                bail!("workout '{}' lists '{}' twice", w.id, dup.name);
            }
        }
        Ok(workouts)
    }
}

/// Exercise rating left during the rest after an exercise
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackRating {
    Good,  // Помогло
    Hard,  // Слишком сложно
}

impl FeedbackRating {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackRating::Good => "good",
            FeedbackRating::Hard => "hard",
        }
    }

    pub fn name_ru(&self) -> &'static str {
        match self {
            FeedbackRating::Good => "помогло",
            FeedbackRating::Hard => "слишком сложно",
        }
    }
}

impl fmt::Display for FeedbackRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedbackRating {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "good" => Ok(FeedbackRating::Good),
            "hard" => Ok(FeedbackRating::Hard),
            other => bail!("unknown feedback rating '{}'", other),
        }
    }
}

/// Static exercise table entry, turned into an owned [`Exercise`]
#[derive(Debug)]
struct ExerciseDef {
    name: &'static str,
    description: &'static str,
    reps: &'static str,
    kind: ExerciseKind,
    sets: u32,
}

impl From<&ExerciseDef> for Exercise {
    fn from(def: &ExerciseDef) -> Self {
        Exercise {
            name: def.name.to_string(),
            description: def.description.to_string(),
            reps: def.reps.to_string(),
            kind: def.kind,
            sets: def.sets,
        }
    }
}

/// Stage of the recovery plan
#[derive(Debug, Clone)]
pub struct RecoveryStage {
    pub id: u32,
    pub name: &'static str,
    pub goal: &'static str,
    /// Training days needed to move on; None for the open-ended last stage
    pub total_days: Option<u32>,
    exercises: &'static [ExerciseDef],
}

impl RecoveryStage {
    pub fn workout_id(&self) -> String {
        format!("stage-{}", self.id)
    }

    pub fn workout(&self) -> Option<Workout> {
        if self.exercises.is_empty() {
            return None;
        }
        Some(Workout {
            id: self.workout_id(),
            title: format!("Этап {}: {}", self.id, self.name),
            description: self.goal.to_string(),
            exercises: self.exercises.iter().map(Exercise::from).collect(),
        })
    }
}

const TODAY_EXERCISES: &[ExerciseDef] = &[
    ExerciseDef {
        name: "Кошка-корова",
        description: "На четвереньках плавно прогибай и округляй спину вместе с дыханием",
        reps: "10",
        kind: ExerciseKind::Reps,
        sets: 2,
    },
    ExerciseDef {
        name: "Планка на предплечьях",
        description: "Локти под плечами, тело в одну линию, живот подтянут",
        reps: "30 сек",
        kind: ExerciseKind::Timed { seconds: 30 },
        sets: 3,
    },
    ExerciseDef {
        name: "Ягодичный мостик",
        description: "Лёжа на спине, поднимай таз, сжимая ягодицы. Поясница не прогибается",
        reps: "12–15",
        kind: ExerciseKind::Reps,
        sets: 3,
    },
    ExerciseDef {
        name: "Птица-собака",
        description: "На четвереньках вытягивай противоположные руку и ногу, таз неподвижен",
        reps: "10 на сторону",
        kind: ExerciseKind::Reps,
        sets: 2,
    },
    ExerciseDef {
        name: "Боковая планка",
        description: "Опора на предплечье и колени или стопы, бёдра не провисают",
        reps: "20 сек",
        kind: ExerciseKind::Timed { seconds: 20 },
        sets: 2,
    },
    ExerciseDef {
        name: "Растяжка грушевидной мышцы",
        description: "Лёжа на спине, положи лодыжку на колено и подтяни ногу к груди",
        reps: "30 сек",
        kind: ExerciseKind::Timed { seconds: 30 },
        sets: 1,
    },
];

const STAGE_1_EXERCISES: &[ExerciseDef] = &[
    ExerciseDef {
        name: "Диафрагмальное дыхание",
        description: "Лёжа на спине, вдох животом, медленный выдох",
        reps: "60 сек",
        kind: ExerciseKind::Timed { seconds: 60 },
        sets: 1,
    },
    ExerciseDef {
        name: "Наклоны таза",
        description: "Лёжа на спине с согнутыми коленями, прижимай поясницу к полу",
        reps: "10",
        kind: ExerciseKind::Reps,
        sets: 2,
    },
    ExerciseDef {
        name: "Колено к груди",
        description: "Поочерёдно подтягивай колено к груди и удерживай",
        reps: "20 сек",
        kind: ExerciseKind::Timed { seconds: 20 },
        sets: 2,
    },
];

const STAGE_2_EXERCISES: &[ExerciseDef] = &[
    ExerciseDef {
        name: "Птица-собака",
        description: "На четвереньках вытягивай противоположные руку и ногу, таз неподвижен",
        reps: "8 на сторону",
        kind: ExerciseKind::Reps,
        sets: 2,
    },
    ExerciseDef {
        name: "Мёртвый жук",
        description: "Лёжа на спине, поясница прижата, опускай противоположные руку и ногу",
        reps: "8 на сторону",
        kind: ExerciseKind::Reps,
        sets: 2,
    },
    ExerciseDef {
        name: "Ягодичный мостик",
        description: "Лёжа на спине, поднимай таз, сжимая ягодицы",
        reps: "12",
        kind: ExerciseKind::Reps,
        sets: 2,
    },
    ExerciseDef {
        name: "Планка на предплечьях",
        description: "Локти под плечами, тело в одну линию",
        reps: "20 сек",
        kind: ExerciseKind::Timed { seconds: 20 },
        sets: 2,
    },
];

const STAGE_3_EXERCISES: &[ExerciseDef] = &[
    ExerciseDef {
        name: "Боковая планка",
        description: "Опора на предплечье и стопы, бёдра не провисают",
        reps: "30 сек",
        kind: ExerciseKind::Timed { seconds: 30 },
        sets: 2,
    },
    ExerciseDef {
        name: "Планка на предплечьях",
        description: "Локти под плечами, тело в одну линию",
        reps: "45 сек",
        kind: ExerciseKind::Timed { seconds: 45 },
        sets: 3,
    },
    ExerciseDef {
        name: "Супермен",
        description: "Лёжа на животе, приподнимай руки и ноги, взгляд в пол",
        reps: "10–12",
        kind: ExerciseKind::Reps,
        sets: 3,
    },
    ExerciseDef {
        name: "Стульчик у стены",
        description: "Спина прижата к стене, колени над стопами",
        reps: "30 сек",
        kind: ExerciseKind::Timed { seconds: 30 },
        sets: 2,
    },
];

/// План восстановления
pub const RECOVERY_STAGES: &[RecoveryStage] = &[
    RecoveryStage {
        id: 1,
        name: "Острый период",
        goal: "Снять боль и вернуть базовую подвижность",
        total_days: Some(14),
        exercises: STAGE_1_EXERCISES,
    },
    RecoveryStage {
        id: 2,
        name: "Стабилизация",
        goal: "Включить глубокие мышцы кора",
        total_days: Some(21),
        exercises: STAGE_2_EXERCISES,
    },
    RecoveryStage {
        id: 3,
        name: "Укрепление",
        goal: "Нарастить выносливость мышц спины и ягодиц",
        total_days: Some(28),
        exercises: STAGE_3_EXERCISES,
    },
    RecoveryStage {
        id: 4,
        name: "Поддержание",
        goal: "Ежедневная тренировка без ограничений по сроку",
        total_days: None,
        exercises: &[],
    },
];

const SPECIAL_1_EXERCISES: &[ExerciseDef] = &[
    ExerciseDef {
        name: "Диафрагмальное дыхание",
        description: "Лёжа на спине, вдох животом, медленный выдох",
        reps: "60 сек",
        kind: ExerciseKind::Timed { seconds: 60 },
        sets: 1,
    },
    ExerciseDef {
        name: "Наклоны таза",
        description: "Лёжа на спине с согнутыми коленями, прижимай поясницу к полу",
        reps: "10",
        kind: ExerciseKind::Reps,
        sets: 2,
    },
    ExerciseDef {
        name: "Кошка-корова",
        description: "На четвереньках плавно прогибай и округляй спину вместе с дыханием",
        reps: "8",
        kind: ExerciseKind::Reps,
        sets: 2,
    },
];

const SPECIAL_2_EXERCISES: &[ExerciseDef] = &[
    ExerciseDef {
        name: "Кошка-корова",
        description: "На четвереньках плавно прогибай и округляй спину вместе с дыханием",
        reps: "10",
        kind: ExerciseKind::Reps,
        sets: 2,
    },
    ExerciseDef {
        name: "Мёртвый жук",
        description: "Лёжа на спине, поясница прижата, опускай противоположные руку и ногу",
        reps: "8 на сторону",
        kind: ExerciseKind::Reps,
        sets: 2,
    },
    ExerciseDef {
        name: "Ягодичный мостик",
        description: "Лёжа на спине, поднимай таз, сжимая ягодицы",
        reps: "12",
        kind: ExerciseKind::Reps,
        sets: 3,
    },
    ExerciseDef {
        name: "Планка на предплечьях",
        description: "Локти под плечами, тело в одну линию",
        reps: "20 сек",
        kind: ExerciseKind::Timed { seconds: 20 },
        sets: 2,
    },
];

const SPECIAL_3_EXERCISES: &[ExerciseDef] = &[
    ExerciseDef {
        name: "Птица-собака",
        description: "На четвереньках вытягивай противоположные руку и ногу, таз неподвижен",
        reps: "10 на сторону",
        kind: ExerciseKind::Reps,
        sets: 3,
    },
    ExerciseDef {
        name: "Боковая планка",
        description: "Опора на предплечье и стопы, бёдра не провисают",
        reps: "30 сек",
        kind: ExerciseKind::Timed { seconds: 30 },
        sets: 2,
    },
    ExerciseDef {
        name: "Супермен",
        description: "Лёжа на животе, приподнимай руки и ноги, взгляд в пол",
        reps: "12",
        kind: ExerciseKind::Reps,
        sets: 3,
    },
    ExerciseDef {
        name: "Растяжка грушевидной мышцы",
        description: "Лёжа на спине, положи лодыжку на колено и подтяни ногу к груди",
        reps: "30 сек",
        kind: ExerciseKind::Timed { seconds: 30 },
        sets: 1,
    },
];

/// Length of the 30-day course
pub const SPECIAL_PROGRAM_DAYS: u32 = 30;

/// Stage of the 30-day course, chosen by day number
#[derive(Debug)]
pub struct SpecialStage {
    pub id: u32,
    pub name: &'static str,
    pub goal: &'static str,
    /// Days covered, inclusive
    pub days: (u32, u32),
    exercises: &'static [ExerciseDef],
}

pub const SPECIAL_STAGES: &[SpecialStage] = &[
    SpecialStage {
        id: 1,
        name: "Мягкий старт",
        goal: "Научиться дышать животом и чувствовать нейтральную поясницу",
        days: (1, 7),
        exercises: SPECIAL_1_EXERCISES,
    },
    SpecialStage {
        id: 2,
        name: "Стабильный корпус",
        goal: "Включить глубокие мышцы живота и ягодицы",
        days: (8, 20),
        exercises: SPECIAL_2_EXERCISES,
    },
    SpecialStage {
        id: 3,
        name: "Сильная спина",
        goal: "Закрепить результат и нарастить выносливость",
        days: (21, SPECIAL_PROGRAM_DAYS),
        exercises: SPECIAL_3_EXERCISES,
    },
];

const SPECIAL_WORKOUT_PREFIX: &str = "sp-day-";

/// Course stage for a day: 1-7, 8-20, 21 and later
pub fn special_stage_for_day(day: u32) -> &'static SpecialStage {
    SPECIAL_STAGES
        .iter()
        .find(|s| day <= s.days.1)
        .unwrap_or(&SPECIAL_STAGES[SPECIAL_STAGES.len() - 1])
}

/// Workout for one day of the course, id `sp-day-N`
pub fn special_program_workout(day: u32) -> Workout {
    let day = day.clamp(1, SPECIAL_PROGRAM_DAYS);
    let stage = special_stage_for_day(day);
    Workout {
        id: format!("{}{}", SPECIAL_WORKOUT_PREFIX, day),
        title: format!("Курс: день {}", day),
        description: format!("Тренировка для этапа «{}»", stage.name),
        exercises: stage.exercises.iter().map(Exercise::from).collect(),
    }
}

/// Whether `workout_id` is a day of the 30-day course
pub fn is_special_program(workout_id: &str) -> bool {
    workout_id.starts_with(SPECIAL_WORKOUT_PREFIX)
}

/// Symptom with the exercises that ease it
#[derive(Debug)]
pub struct Symptom {
    /// Short ascii key, used in the workout id
    pub key: &'static str,
    pub name: &'static str,
    pub action: &'static str,
    exercises: &'static [&'static str],
}

pub const SYMPTOMS: &[Symptom] = &[
    Symptom {
        key: "lower-back",
        name: "Ноющая боль в пояснице",
        action: "Разгрузить поясницу и мягко вернуть подвижность",
        exercises: &["Наклоны таза", "Колено к груди", "Кошка-корова", "Растяжка грушевидной мышцы"],
    },
    Symptom {
        key: "stiffness",
        name: "Скованность по утрам",
        action: "Разогреть позвоночник плавными движениями",
        exercises: &["Диафрагмальное дыхание", "Кошка-корова", "Колено к груди"],
    },
    Symptom {
        key: "sitting",
        name: "Усталость спины от сидения",
        action: "Включить ягодицы и мышцы кора, которые выключаются на стуле",
        exercises: &["Ягодичный мостик", "Птица-собака", "Мёртвый жук"],
    },
    Symptom {
        key: "leg-pain",
        name: "Тянущая боль в ягодице и ноге",
        action: "Снять напряжение с грушевидной мышцы",
        exercises: &["Растяжка грушевидной мышцы", "Колено к груди", "Ягодичный мостик"],
    },
];

const SYMPTOM_WORKOUT_PREFIX: &str = "symptom-";

/// First definition of an exercise across all built-in tables
fn find_exercise_def(name: &str) -> Option<&'static ExerciseDef> {
    [
        TODAY_EXERCISES,
        STAGE_1_EXERCISES,
        STAGE_2_EXERCISES,
        STAGE_3_EXERCISES,
        SPECIAL_1_EXERCISES,
        SPECIAL_2_EXERCISES,
        SPECIAL_3_EXERCISES,
    ]
    .into_iter()
    .flatten()
    .find(|def| def.name == name)
}

impl Symptom {
    pub fn workout_id(&self) -> String {
        format!("{}{}", SYMPTOM_WORKOUT_PREFIX, self.key)
    }

    /// Unknown exercise names are left out; None when nothing is left
    pub fn workout(&self) -> Option<Workout> {
        let exercises: Vec<Exercise> = self
            .exercises
            .iter()
            .filter_map(|name| find_exercise_def(name))
            .map(Exercise::from)
            .collect();
        if exercises.is_empty() {
            return None;
        }
        Some(Workout {
            id: self.workout_id(),
            title: format!("Симптом: {}", self.name),
            description: self.action.to_string(),
            exercises,
        })
    }
}

pub const TODAY_WORKOUT_ID: &str = "today";

pub fn today_workout() -> Workout {
    Workout {
        id: TODAY_WORKOUT_ID.to_string(),
        title: "Тренировка на сегодня".to_string(),
        description: "Ежедневный комплекс для здоровой спины".to_string(),
        exercises: TODAY_EXERCISES.iter().map(Exercise::from).collect(),
    }
}

/// All built-in workouts: the daily routine, one per recovery stage, one per symptom
pub fn builtin_workouts() -> Vec<Workout> {
    std::iter::once(today_workout())
        .chain(RECOVERY_STAGES.iter().filter_map(|s| s.workout()))
        .chain(SYMPTOMS.iter().filter_map(|s| s.workout()))
        .collect()
}

/// Built-in workouts, today's course workout for `special_day`, then the extra ones.
/// An extra workout replaces a built-in with the same id.
pub fn catalog(extra: Vec<Workout>, special_day: u32) -> Vec<Workout> {
    let mut workouts = builtin_workouts();
    workouts.insert(1, special_program_workout(special_day));
    for w in extra {
        match workouts.iter_mut().find(|b| b.id == w.id) {
            Some(existing) => *existing = w,
            None => workouts.push(w),
        }
    }
    workouts
}

pub fn find_workout<'a>(workouts: &'a [Workout], id: &str) -> Option<&'a Workout> {
    workouts.iter().find(|w| w.id == id)
}

/// First stage whose training days are not yet done, or the last stage
pub fn current_stage(progress: &BTreeMap<u32, u32>) -> &'static RecoveryStage {
    RECOVERY_STAGES
        .iter()
        .find(|s| match s.total_days {
            Some(total) => progress.get(&s.id).copied().unwrap_or(0) < total,
            None => false,
        })
        .unwrap_or(&RECOVERY_STAGES[RECOVERY_STAGES.len() - 1])
}
